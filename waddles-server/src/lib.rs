use std::sync::Arc;

use serde::Serialize;
use warp::Filter;

use crate::directory::RoomDirectory;
use crate::websocket::ConnectionManager;
use crate::websocket::rate_limiter::RateLimitConfig;

pub mod config;
pub mod directory;
pub mod error;
pub mod websocket;

#[derive(Serialize)]
struct PingResponse {
    #[serde(rename = "type")]
    kind: &'static str,
    timestamp: String,
    connections: usize,
}

pub fn create_routes(
    connection_manager: Arc<ConnectionManager>,
    directory: Arc<RoomDirectory>,
    rate_limit: RateLimitConfig,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let connection_manager_filter = warp::any().map({
        let connection_manager = connection_manager.clone();
        move || connection_manager.clone()
    });

    let directory_filter = warp::any().map({
        let directory = directory.clone();
        move || directory.clone()
    });

    // WebSocket endpoint
    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(connection_manager_filter.clone())
        .and(directory_filter)
        .map(move |ws: warp::ws::Ws, conn_mgr, directory| {
            ws.on_upgrade(move |socket| {
                websocket::handle_connection(socket, conn_mgr, directory, rate_limit)
            })
        });

    // Liveness endpoint
    let ping = warp::path("ping")
        .and(warp::get())
        .and(connection_manager_filter)
        .and_then(handle_ping);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET"]);

    websocket
        .or(ping)
        .with(cors)
        .with(warp::log("waddles"))
}

async fn handle_ping(
    connection_manager: Arc<ConnectionManager>,
) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&PingResponse {
        kind: "pong",
        timestamp: chrono::Utc::now().to_rfc3339(),
        connections: connection_manager.connection_count().await,
    }))
}
