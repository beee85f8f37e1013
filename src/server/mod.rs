mod routes;
mod server;
mod types;

pub use server::{ApiServer, SharedGenerator};
pub use types::{ApiResponse, DimensionsRequest};
