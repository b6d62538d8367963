//! The `bot` command: run as a remote worker node

use anyhow::Result;
use tracing::info;
use volley_config::VolleyConfig;
use volley_server::BotServer;

pub async fn run(
    api_key: String,
    port: Option<u16>,
    bind: Option<String>,
    config: &VolleyConfig,
) -> Result<()> {
    let mut server_config = config.server.clone().unwrap_or_default();
    server_config.api_key = Some(api_key);
    if let Some(port) = port {
        server_config.port = port;
    }
    if let Some(bind) = bind {
        server_config.bind_address = bind;
    }

    info!(
        addr = %server_config.bind_address,
        port = server_config.port,
        "starting bot"
    );

    BotServer::new(server_config)?.run().await?;
    Ok(())
}
