//! Bot server assembly and lifecycle

use crate::error::ServerError;
use crate::handlers;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::info;
use volley_config::ServerConfig;
use volley_http::{Transport, TransportConfig};

/// Shared bot state
#[derive(Clone)]
pub struct AppState {
    /// The key remote orchestrators must present
    pub api_key: Arc<String>,

    /// Held while a scenario is running; one scenario in flight per bot
    pub exec_lock: Arc<Mutex<()>>,

    /// Transport the local generator dispatches through
    pub transport: Transport,
}

impl AppState {
    pub fn new(api_key: String, transport: Transport) -> Self {
        Self {
            api_key: Arc::new(api_key),
            exec_lock: Arc::new(Mutex::new(())),
            transport,
        }
    }
}

/// Build the bot router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::get_version).post(handlers::post_scenario),
        )
        .fallback(handlers::not_found)
        .with_state(state)
}

/// The bot server
pub struct BotServer {
    config: ServerConfig,
    api_key: String,
}

impl BotServer {
    /// Validate the configuration and prepare a server
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ServerError::Config("api key is required".to_string()))?;

        if config.port == 0 {
            return Err(ServerError::Config(format!(
                "invalid port {}",
                config.port
            )));
        }

        Ok(Self { config, api_key })
    }

    /// Bind and serve until shutdown
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = format!("{}:{}", self.config.bind_address, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        self.serve_on(listener).await
    }

    /// Serve on an already-bound listener
    pub async fn serve_on(self, listener: TcpListener) -> Result<(), ServerError> {
        let transport = Transport::new(TransportConfig::default())?;
        let state = AppState::new(self.api_key, transport);

        info!(addr = %listener.local_addr()?, "bot server listening");
        axum::serve(listener, router(state)).await?;

        Ok(())
    }
}
