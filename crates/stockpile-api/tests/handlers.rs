use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::IntoResponse, response::Response};
use uuid::Uuid;

use stockpile_api::auth::{AppState, AppStateInner};
use stockpile_api::error::ApiError;
use stockpile_api::middleware::CurrentUser;
use stockpile_api::{admin, inventories, items};
use stockpile_db::Database;
use stockpile_gateway::dispatcher::Dispatcher;
use stockpile_types::api::IdBatch;

fn state() -> AppState {
    Arc::new(AppStateInner {
        db: Database::open_in_memory().expect("in-memory db"),
        jwt_secret: "test-secret".into(),
        dispatcher: Dispatcher::new(),
    })
}

fn add_user(state: &AppState, name: &str, is_admin: bool) -> CurrentUser {
    let id = Uuid::new_v4();
    state
        .db
        .create_user(&id.to_string(), name, &format!("{name}@example.com"), "hash")
        .expect("create user");
    if is_admin {
        state.db.set_admin(&[id.to_string()], true).expect("promote");
    }
    CurrentUser {
        id,
        username: name.to_string(),
        is_admin,
    }
}

fn add_inventory(state: &AppState, owner: &CurrentUser, title: &str) -> Uuid {
    let id = Uuid::new_v4();
    state
        .db
        .insert_inventory(&id.to_string(), &owner.id.to_string(), title, None, None, false)
        .expect("create inventory");
    id
}

fn add_item(state: &AppState, inventory: &Uuid, custom_id: &str, creator: &CurrentUser) -> Uuid {
    let id = Uuid::new_v4();
    state
        .db
        .insert_item(
            &id.to_string(),
            &inventory.to_string(),
            custom_id,
            &creator.id.to_string(),
            &[],
        )
        .expect("create item");
    id
}

async fn read_json(resp: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

// -- Inventory bulk delete: partial success --

#[tokio::test]
async fn inventory_bulk_delete_removes_only_the_deletable_subset() {
    let state = state();
    let owner = add_user(&state, "owner", false);
    let other = add_user(&state, "other", false);
    let mine_a = add_inventory(&state, &owner, "tools");
    let mine_b = add_inventory(&state, &owner, "books");
    let foreign = add_inventory(&state, &other, "games");

    let resp = match inventories::bulk_delete(
        State(state.clone()),
        Extension(owner),
        Json(IdBatch {
            ids: vec![mine_a, mine_b, foreign],
        }),
    )
    .await
    {
        Ok(resp) => resp.into_response(),
        Err(err) => panic!("bulk delete failed: {err}"),
    };

    let body = read_json(resp).await;
    assert_eq!(body["deleted"], 2);

    assert!(state.db.get_inventory(&mine_a.to_string()).unwrap().is_none());
    assert!(state.db.get_inventory(&mine_b.to_string()).unwrap().is_none());
    assert!(state.db.get_inventory(&foreign.to_string()).unwrap().is_some());
}

// -- Item bulk delete: all-or-nothing --

#[tokio::test]
async fn item_bulk_delete_with_one_unauthorized_id_deletes_nothing() {
    let state = state();
    let actor = add_user(&state, "actor", false);
    let other = add_user(&state, "other", false);
    let mine = add_inventory(&state, &actor, "tools");
    let foreign = add_inventory(&state, &other, "games");

    // Authorized: actor owns the inventory.
    let in_mine = add_item(&state, &mine, "T-1", &other);
    // Authorized: actor created it.
    let created_by_me = add_item(&state, &foreign, "G-1", &actor);
    // Neither owned nor created.
    let untouchable = add_item(&state, &foreign, "G-2", &other);

    let result = items::delete_items(
        State(state.clone()),
        Extension(actor.clone()),
        Json(IdBatch {
            ids: vec![in_mine, created_by_me, untouchable],
        }),
    )
    .await;
    match result {
        Err(ApiError::Forbidden) => {}
        Err(other) => panic!("expected Forbidden, got {other}"),
        Ok(_) => panic!("expected Forbidden"),
    }

    for id in [in_mine, created_by_me, untouchable] {
        assert!(state.db.get_item(&id.to_string()).unwrap().is_some());
    }

    // Without the unauthorized id the same batch goes through.
    let resp = match items::delete_items(
        State(state.clone()),
        Extension(actor),
        Json(IdBatch {
            ids: vec![in_mine, created_by_me],
        }),
    )
    .await
    {
        Ok(resp) => resp.into_response(),
        Err(err) => panic!("authorized batch failed: {err}"),
    };
    let body = read_json(resp).await;
    assert_eq!(body["deleted"], 2);
    assert!(state.db.get_item(&untouchable.to_string()).unwrap().is_some());
}

// -- Admin batches: self-targeting flags re-auth --

#[tokio::test]
async fn blocking_a_batch_including_self_flags_reauth() {
    let state = state();
    let acting = add_user(&state, "root", true);
    let other = add_user(&state, "other", false);

    let resp = match admin::block(
        State(state.clone()),
        Extension(acting.clone()),
        Json(IdBatch {
            ids: vec![other.id, acting.id],
        }),
    )
    .await
    {
        Ok(resp) => resp.into_response(),
        Err(err) => panic!("block failed: {err}"),
    };

    let body = read_json(resp).await;
    assert_eq!(body["updated"], 2);
    assert_eq!(body["force_reauth"], true);
    assert!(state.db.user_by_id(&acting.id.to_string()).unwrap().unwrap().is_blocked);
}

#[tokio::test]
async fn demoting_a_batch_including_self_flags_reauth() {
    let state = state();
    let acting = add_user(&state, "root", true);
    let peer = add_user(&state, "peer", true);

    let resp = match admin::demote(
        State(state.clone()),
        Extension(acting.clone()),
        Json(IdBatch {
            ids: vec![peer.id, acting.id],
        }),
    )
    .await
    {
        Ok(resp) => resp.into_response(),
        Err(err) => panic!("demote failed: {err}"),
    };

    let body = read_json(resp).await;
    assert_eq!(body["updated"], 2);
    assert_eq!(body["force_reauth"], true);
    assert!(!state.db.user_by_id(&acting.id.to_string()).unwrap().unwrap().is_admin);
}

#[tokio::test]
async fn batches_not_touching_the_actor_do_not_flag_reauth() {
    let state = state();
    let acting = add_user(&state, "root", true);
    let other = add_user(&state, "other", false);

    let resp = match admin::block(
        State(state.clone()),
        Extension(acting),
        Json(IdBatch {
            ids: vec![other.id],
        }),
    )
    .await
    {
        Ok(resp) => resp.into_response(),
        Err(err) => panic!("block failed: {err}"),
    };

    let body = read_json(resp).await;
    assert_eq!(body["updated"], 1);
    assert_eq!(body["force_reauth"], false);
}
