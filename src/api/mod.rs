//! HTTP API module: the download endpoint plus health and metrics.

pub mod handlers;
pub mod response;
pub mod routes;

pub use handlers::AppState;
pub use response::ApiResponse;
pub use routes::create_router;
