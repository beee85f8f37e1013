use std::error::Error;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use axum::{Router, routing::{get, post}};
use tracing::info;

use crate::extract::DimensionGenerator;
use super::routes;

/// Generator shared between request handlers
pub type SharedGenerator = Arc<Mutex<DimensionGenerator>>;

/// API Server keeping one loaded generator in memory
pub struct ApiServer {
    generator: SharedGenerator,
    host: String,
    port: u16,
}

impl ApiServer {
    pub fn new(generator: DimensionGenerator, host: String, port: u16) -> Self {
        info!("Creating new API server on {}:{}", host, port);
        Self {
            generator: Arc::new(Mutex::new(generator)),
            host,
            port,
        }
    }

    /// Routes served by the API.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/v1/health", get(routes::health_check))
            .route("/api/v1/dimensions", post(routes::dimensions))
            .with_state(Arc::clone(&self.generator))
    }

    pub async fn start(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let app = self.router();

        info!("Starting server on {}:{}", self.host, self.port);
        let listener = TcpListener::bind((self.host.as_str(), self.port)).await?;

        info!("Server started successfully");
        axum::serve(listener, app).await?;
        Ok(())
    }
}
