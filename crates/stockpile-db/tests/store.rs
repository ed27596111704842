use uuid::Uuid;

use stockpile_db::{Database, StoreError};
use stockpile_db::queries::inventories::InventoryPatch;

fn db() -> Database {
    Database::open_in_memory().expect("in-memory db")
}

fn add_user(db: &Database, name: &str) -> String {
    let id = Uuid::new_v4().to_string();
    db.create_user(&id, name, &format!("{name}@example.com"), "hash")
        .expect("create user");
    id
}

fn add_inventory(db: &Database, owner: &str, title: &str, public_writable: bool) -> String {
    let id = Uuid::new_v4().to_string();
    db.insert_inventory(&id, owner, title, None, None, public_writable)
        .expect("create inventory");
    id
}

fn add_field(db: &Database, inventory: &str, title: &str, field_type: &str) -> String {
    let id = Uuid::new_v4().to_string();
    db.insert_field(&id, inventory, title, None, field_type, false, 0)
        .expect("create field");
    id
}

// -- Access grants --

#[test]
fn duplicate_grant_is_a_conflict() {
    let db = db();
    let owner = add_user(&db, "owner");
    let friend = add_user(&db, "friend");
    let inv = add_inventory(&db, &owner, "tools", false);

    db.insert_grant(&Uuid::new_v4().to_string(), &inv, &friend)
        .expect("first grant");
    let err = db
        .insert_grant(&Uuid::new_v4().to_string(), &inv, &friend)
        .expect_err("second grant must fail");
    assert!(matches!(err, StoreError::Duplicate(_)));

    assert!(db.has_grant(&inv, &friend).unwrap());
}

#[test]
fn revoking_missing_grant_is_not_found() {
    let db = db();
    let owner = add_user(&db, "owner");
    let stranger = add_user(&db, "stranger");
    let inv = add_inventory(&db, &owner, "tools", false);

    let err = db.delete_grant(&inv, &stranger).expect_err("nothing to revoke");
    assert!(matches!(err, StoreError::NotFound(_)));
}

// -- Schema registry --

#[test]
fn fourth_field_of_a_type_is_rejected() {
    let db = db();
    let owner = add_user(&db, "owner");
    let inv = add_inventory(&db, &owner, "books", false);

    for n in 0..3 {
        add_field(&db, &inv, &format!("text{n}"), "SingleLineText");
    }

    let err = db
        .insert_field(
            &Uuid::new_v4().to_string(),
            &inv,
            "text3",
            None,
            "SingleLineText",
            false,
            0,
        )
        .expect_err("cap is 3 per type");
    assert!(matches!(err, StoreError::FieldTypeCap));

    // A different type is still fine.
    add_field(&db, &inv, "pages", "Number");
    assert_eq!(db.list_fields(&inv).unwrap().len(), 4);
}

#[test]
fn fields_list_in_sort_order() {
    let db = db();
    let owner = add_user(&db, "owner");
    let inv = add_inventory(&db, &owner, "books", false);

    db.insert_field(&Uuid::new_v4().to_string(), &inv, "second", None, "Number", false, 2)
        .unwrap();
    db.insert_field(&Uuid::new_v4().to_string(), &inv, "first", None, "Boolean", false, 1)
        .unwrap();

    let titles: Vec<String> = db
        .list_fields(&inv)
        .unwrap()
        .into_iter()
        .map(|f| f.title)
        .collect();
    assert_eq!(titles, vec!["first", "second"]);
}

#[test]
fn deleting_a_field_cascades_its_values() {
    let db = db();
    let owner = add_user(&db, "owner");
    let inv = add_inventory(&db, &owner, "books", false);
    let field = add_field(&db, &inv, "author", "SingleLineText");

    let item = Uuid::new_v4().to_string();
    db.insert_item(
        &item,
        &inv,
        "b-1",
        &owner,
        &[(field.parse().unwrap(), "Hamilton".to_string())],
    )
    .unwrap();
    assert_eq!(db.list_item_values(&[item.clone()]).unwrap().len(), 1);

    db.delete_field(&field).unwrap();
    assert!(db.list_item_values(&[item]).unwrap().is_empty());

    let err = db.delete_field(&field).expect_err("already gone");
    assert!(matches!(err, StoreError::NotFound(_)));
}

// -- Item store --

#[test]
fn duplicate_custom_id_within_inventory_is_a_conflict() {
    let db = db();
    let owner = add_user(&db, "owner");
    let inv = add_inventory(&db, &owner, "books", false);
    let other = add_inventory(&db, &owner, "tools", false);

    db.insert_item(&Uuid::new_v4().to_string(), &inv, "B-1", &owner, &[])
        .unwrap();
    let err = db
        .insert_item(&Uuid::new_v4().to_string(), &inv, "B-1", &owner, &[])
        .expect_err("custom id taken");
    assert!(matches!(err, StoreError::Duplicate(_)));

    // Same custom id in a different inventory is fine.
    db.insert_item(&Uuid::new_v4().to_string(), &other, "B-1", &owner, &[])
        .unwrap();
}

#[test]
fn item_values_must_reference_own_inventory_fields() {
    let db = db();
    let owner = add_user(&db, "owner");
    let inv = add_inventory(&db, &owner, "books", false);
    let other = add_inventory(&db, &owner, "tools", false);
    let foreign_field = add_field(&db, &other, "weight", "Number");

    let err = db
        .insert_item(
            &Uuid::new_v4().to_string(),
            &inv,
            "B-1",
            &owner,
            &[(foreign_field.parse().unwrap(), "3".to_string())],
        )
        .expect_err("field belongs to another inventory");
    assert!(matches!(err, StoreError::ForeignField { .. }));

    // Nothing was inserted.
    assert!(db.list_items(&inv).unwrap().is_empty());
}

#[test]
fn supplying_the_same_field_twice_in_one_insert_is_a_conflict() {
    let db = db();
    let owner = add_user(&db, "owner");
    let inv = add_inventory(&db, &owner, "books", false);
    let author = add_field(&db, &inv, "author", "SingleLineText");

    let err = db
        .insert_item(
            &Uuid::new_v4().to_string(),
            &inv,
            "B-1",
            &owner,
            &[
                (author.parse().unwrap(), "Adams".to_string()),
                (author.parse().unwrap(), "Hamilton".to_string()),
            ],
        )
        .expect_err("one value row per field");
    assert!(matches!(err, StoreError::Duplicate(_)));

    // The whole insert rolled back.
    assert!(db.list_items(&inv).unwrap().is_empty());
}

#[test]
fn update_item_overwrites_existing_values_and_inserts_new_ones() {
    let db = db();
    let owner = add_user(&db, "owner");
    let inv = add_inventory(&db, &owner, "books", false);
    let author = add_field(&db, &inv, "author", "SingleLineText");
    let pages = add_field(&db, &inv, "pages", "Number");

    let item = Uuid::new_v4().to_string();
    db.insert_item(
        &item,
        &inv,
        "B-1",
        &owner,
        &[(author.parse().unwrap(), "Adams".to_string())],
    )
    .unwrap();

    db.update_item(
        &item,
        Some("B-42"),
        &[
            (author.parse().unwrap(), "Hamilton".to_string()),
            (pages.parse().unwrap(), "224".to_string()),
        ],
    )
    .unwrap();

    let updated = db.get_item(&item).unwrap().expect("item exists");
    assert_eq!(updated.custom_id, "B-42");

    let mut values = db.list_item_values(&[item]).unwrap();
    values.sort_by(|a, b| a.value.cmp(&b.value));
    assert_eq!(values.len(), 2);
    assert_eq!(values[0].value, "224");
    assert_eq!(values[1].value, "Hamilton");
}

#[test]
fn number_fields_accept_arbitrary_text() {
    // Field types are advisory metadata: values are stored as raw text.
    let db = db();
    let owner = add_user(&db, "owner");
    let inv = add_inventory(&db, &owner, "books", false);
    let pages = add_field(&db, &inv, "pages", "Number");

    let item = Uuid::new_v4().to_string();
    db.insert_item(
        &item,
        &inv,
        "B-1",
        &owner,
        &[(pages.parse().unwrap(), "not a number".to_string())],
    )
    .unwrap();

    let values = db.list_item_values(&[item]).unwrap();
    assert_eq!(values[0].value, "not a number");
}

#[test]
fn items_ownership_reports_creator_and_inventory_owner() {
    let db = db();
    let owner = add_user(&db, "owner");
    let contributor = add_user(&db, "contributor");
    let inv = add_inventory(&db, &owner, "books", true);

    let item = Uuid::new_v4().to_string();
    db.insert_item(&item, &inv, "B-1", &contributor, &[]).unwrap();

    let rows = db
        .items_ownership(&[item.clone(), "missing".to_string()])
        .unwrap();
    // Unknown ids are simply absent, so the caller can spot an incomplete batch.
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, item);
    assert_eq!(rows[0].created_by, contributor);
    assert_eq!(rows[0].inventory_owner_id, owner);
}

// -- Concurrency controller --

#[test]
fn stale_version_aborts_without_side_effects() {
    let db = db();
    let owner = add_user(&db, "owner");
    let inv = add_inventory(&db, &owner, "books", false);

    let patch = InventoryPatch {
        title: Some("books v2".to_string()),
        ..Default::default()
    };
    let updated = db.update_inventory(&inv, &patch, Some(1)).unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(updated.title, "books v2");

    // A second editor still holding version 1 loses.
    let stale = InventoryPatch {
        title: Some("books v3".to_string()),
        ..Default::default()
    };
    let err = db
        .update_inventory(&inv, &stale, Some(1))
        .expect_err("stale version");
    assert!(matches!(err, StoreError::VersionConflict));

    let current = db.get_inventory(&inv).unwrap().unwrap();
    assert_eq!(current.title, "books v2");
    assert_eq!(current.version, 2);
}

#[test]
fn version_strictly_increases_and_absent_token_always_wins() {
    let db = db();
    let owner = add_user(&db, "owner");
    let inv = add_inventory(&db, &owner, "books", false);

    let mut last = db.get_inventory(&inv).unwrap().unwrap().version;
    for n in 0..3 {
        let patch = InventoryPatch {
            category: Some(format!("cat{n}")),
            ..Default::default()
        };
        let row = db.update_inventory(&inv, &patch, None).unwrap();
        assert!(row.version > last);
        last = row.version;
    }
}

#[test]
fn patch_preserves_absent_fields() {
    let db = db();
    let owner = add_user(&db, "owner");
    let inv = Uuid::new_v4().to_string();
    db.insert_inventory(&inv, &owner, "books", Some("about books"), Some("media"), false)
        .unwrap();

    let patch = InventoryPatch {
        is_public_writable: Some(true),
        ..Default::default()
    };
    let row = db.update_inventory(&inv, &patch, None).unwrap();
    assert_eq!(row.title, "books");
    assert_eq!(row.description.as_deref(), Some("about books"));
    assert_eq!(row.category.as_deref(), Some("media"));
    assert!(row.is_public_writable);
}

// -- Cascading deletes --

#[test]
fn deleting_an_inventory_cascades_everything_it_owns() {
    let db = db();
    let owner = add_user(&db, "owner");
    let friend = add_user(&db, "friend");
    let inv = add_inventory(&db, &owner, "books", false);
    let field = add_field(&db, &inv, "author", "SingleLineText");

    let item = Uuid::new_v4().to_string();
    db.insert_item(
        &item,
        &inv,
        "B-1",
        &owner,
        &[(field.parse().unwrap(), "Adams".to_string())],
    )
    .unwrap();
    db.insert_grant(&Uuid::new_v4().to_string(), &inv, &friend)
        .unwrap();
    db.toggle_like(&Uuid::new_v4().to_string(), &inv, &friend)
        .unwrap();
    db.insert_comment(&Uuid::new_v4().to_string(), &inv, &friend, "nice")
        .unwrap();

    let deleted = db.delete_inventories(&[inv.clone()]).unwrap();
    assert_eq!(deleted, 1);

    assert!(db.get_inventory(&inv).unwrap().is_none());
    assert!(db.list_items(&inv).unwrap().is_empty());
    assert!(db.list_item_values(&[item]).unwrap().is_empty());
    assert!(db.list_fields(&inv).unwrap().is_empty());
    assert!(db.list_grants(&inv).unwrap().is_empty());
    assert!(db.list_comments(&inv).unwrap().is_empty());
}

// -- Likes --

#[test]
fn toggling_like_twice_restores_original_state() {
    let db = db();
    let owner = add_user(&db, "owner");
    let fan = add_user(&db, "fan");
    let inv = add_inventory(&db, &owner, "books", false);

    let (liked, count) = db
        .toggle_like(&Uuid::new_v4().to_string(), &inv, &fan)
        .unwrap();
    assert!(liked);
    assert_eq!(count, 1);

    let (liked, count) = db
        .toggle_like(&Uuid::new_v4().to_string(), &inv, &fan)
        .unwrap();
    assert!(!liked);
    assert_eq!(count, 0);
}

// -- Admin batch flags --

#[test]
fn batch_flag_updates_report_matched_count() {
    let db = db();
    let a = add_user(&db, "a");
    let b = add_user(&db, "b");

    let n = db
        .set_blocked(&[a.clone(), b.clone(), "missing".to_string()], true)
        .unwrap();
    assert_eq!(n, 2);
    assert!(db.user_by_id(&a).unwrap().unwrap().is_blocked);

    let n = db.set_admin(&[b.clone()], true).unwrap();
    assert_eq!(n, 1);
    assert!(db.user_by_id(&b).unwrap().unwrap().is_admin);

    let n = db.soft_delete_users(&[a.clone()]).unwrap();
    assert_eq!(n, 1);
    // Soft-deleted users disappear from the listing.
    let listed: Vec<String> = db.list_users().unwrap().into_iter().map(|u| u.id).collect();
    assert!(!listed.contains(&a));
    assert!(listed.contains(&b));
}

// -- Listings --

#[test]
fn summary_listing_reflects_viewer_state() {
    let db = db();
    let owner = add_user(&db, "owner");
    let fan = add_user(&db, "fan");
    let inv = add_inventory(&db, &owner, "books", false);

    db.insert_item(&Uuid::new_v4().to_string(), &inv, "B-1", &owner, &[])
        .unwrap();
    db.toggle_like(&Uuid::new_v4().to_string(), &inv, &fan)
        .unwrap();
    db.insert_grant(&Uuid::new_v4().to_string(), &inv, &fan)
        .unwrap();

    let rows = db.list_inventories(&fan).unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.owner_name, "owner");
    assert_eq!(row.items_count, 1);
    assert_eq!(row.likes_count, 1);
    assert!(row.viewer_has_liked);
    assert!(row.viewer_has_grant);

    // Anonymous viewer: empty id never matches anything.
    let rows = db.list_inventories("").unwrap();
    assert!(!rows[0].viewer_has_liked);
    assert!(!rows[0].viewer_has_grant);
}

#[test]
fn writable_listing_covers_public_and_granted() {
    let db = db();
    let owner = add_user(&db, "owner");
    let user = add_user(&db, "user");
    let _private = add_inventory(&db, &owner, "private", false);
    let public = add_inventory(&db, &owner, "public", true);
    let granted = add_inventory(&db, &owner, "granted", false);
    db.insert_grant(&Uuid::new_v4().to_string(), &granted, &user)
        .unwrap();

    let mut ids: Vec<String> = db
        .list_writable_inventories(&user)
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    ids.sort();
    let mut expected = vec![public, granted];
    expected.sort();
    assert_eq!(ids, expected);
}

#[test]
fn search_matches_title_substring_case_insensitively() {
    let db = db();
    let owner = add_user(&db, "owner");
    add_inventory(&db, &owner, "Garage Tools", false);
    add_inventory(&db, &owner, "Books", false);

    let rows = db.search_inventories("tool", "").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Garage Tools");
}
