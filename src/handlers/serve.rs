use crate::cli::TransportKind;
use crate::config::Config;
use crate::server::{McpConfig, McpServer, ServerState};

/// Run the tool server; flags override the `[server]` config section.
pub async fn handle_serve(
    transport: Option<TransportKind>,
    host: Option<String>,
    port: Option<u16>,
    path: Option<String>,
    config: &Config,
) -> crate::Result<()> {
    let mut server_config = McpConfig::from_config(config);
    if let Some(transport) = transport {
        server_config = server_config.transport(transport);
    }
    if let Some(host) = host {
        server_config = server_config.host(host);
    }
    if let Some(port) = port {
        server_config = server_config.port(port);
    }
    if let Some(path) = path {
        server_config = server_config.path(path);
    }

    log::info!("Starting MCP server ({:?} transport)", server_config.transport);
    McpServer::new(server_config, ServerState::from_config(config))
        .run()
        .await
}
