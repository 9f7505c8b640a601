pub mod router;
pub mod routes;

pub use router::{AppState, opsdesk_router};
