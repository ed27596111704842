use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use stockpile_api::auth::{self, AppState, AppStateInner};
use stockpile_api::middleware::{optional_auth, require_auth};
use stockpile_api::{access, admin, comments, fields, inventories, items};
use stockpile_gateway::connection;
use stockpile_gateway::dispatcher::Dispatcher;

#[derive(Clone)]
struct GatewayState {
    dispatcher: Dispatcher,
    jwt_secret: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockpile=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("STOCKPILE_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("STOCKPILE_DB_PATH").unwrap_or_else(|_| "stockpile.db".into());
    let host = std::env::var("STOCKPILE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("STOCKPILE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = stockpile_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let dispatcher = Dispatcher::new();
    let app_state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: jwt_secret.clone(),
        dispatcher: dispatcher.clone(),
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(app_state.clone());

    // Read surface: always allowed, anonymous included
    let read_routes = Router::new()
        .route("/inventories", get(inventories::list_inventories))
        .route("/inventories/search", get(inventories::search_inventories))
        .route("/inventories/{id}", get(inventories::get_inventory))
        .route("/inventories/{id}/items", get(items::list_items))
        .route("/inventories/{id}/fields", get(fields::list_fields))
        .route("/inventories/{id}/comments", get(comments::list_comments))
        .layer(middleware::from_fn_with_state(app_state.clone(), optional_auth))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me).put(auth::update_me))
        .route("/inventories", post(inventories::create_inventory))
        .route("/inventories/mine", get(inventories::list_mine))
        .route("/inventories/writable", get(inventories::list_writable))
        .route("/inventories/bulk-delete", post(inventories::bulk_delete))
        .route("/inventories/{id}", put(inventories::update_inventory))
        .route("/inventories/{id}/like", post(inventories::toggle_like))
        .route(
            "/inventories/{id}/access",
            get(access::list_access).post(access::grant_access),
        )
        .route(
            "/inventories/{id}/access/{user_id}",
            delete(access::revoke_access),
        )
        .route("/inventories/{id}/fields", post(fields::create_field))
        .route("/fields/{id}", delete(fields::delete_field))
        .route("/items", post(items::add_item))
        .route("/items/{id}", put(items::update_item))
        .route("/items/delete", post(items::delete_items))
        .route("/inventories/{id}/comments", post(comments::add_comment))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/block", post(admin::block))
        .route("/admin/unblock", post(admin::unblock))
        .route("/admin/promote", post(admin::promote))
        .route("/admin/demote", post(admin::demote))
        .route("/admin/delete", post(admin::delete))
        .layer(middleware::from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state);

    let ws_route = Router::new()
        .route("/gateway", get(ws_upgrade))
        .with_state(GatewayState {
            dispatcher,
            jwt_secret,
        });

    let app = Router::new()
        .merge(public_routes)
        .merge(read_routes)
        .merge(protected_routes)
        .merge(ws_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Stockpile server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn ws_upgrade(State(state): State<GatewayState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        connection::handle_connection(socket, state.dispatcher, state.jwt_secret)
    })
}
