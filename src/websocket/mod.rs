// Transport module: the WebSocket push adapter, the polling HTTP adapter and
// the operational endpoints, all mounted on one axum router.
//
// - handler: WebSocket upgrade handler (entry point)
// - connection: per-socket receive loop and outbound writer task
// - sending: frame serialization
// - polling: stateless `GET/POST /api/lobby` adapter
// - routes: router assembly and `run_server`
// - metrics: `/metrics` endpoint and its bearer-token check

mod connection;
mod handler;
mod metrics;
mod polling;
mod routes;
mod sending;

pub use handler::websocket_handler;
pub use metrics::metrics_handler;
pub use polling::{lobby_action_handler, lobby_query_handler, LobbyActionRequest, LobbyQuery};
pub use routes::{create_router, run_server};
