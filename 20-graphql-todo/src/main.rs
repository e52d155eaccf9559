use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use graphql_todo::{
    cli::Cli,
    clock::SystemClock,
    schema::build_schema,
    server::Server,
    service::TodoService,
    store::MemoryStore,
};

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let service = TodoService::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock));
    let schema = build_schema(Arc::new(service), cli.list_policy);

    let listener = TcpListener::bind(cli.listen).await?;
    let server = Server::new(listener, schema);
    info!(list_policy = ?cli.list_policy, "GraphQL server listening on {}", server.local_addr()?);

    if let Err(err) = server.run_until_ctrl_c().await {
        warn!("server exited with error: {err:?}");
        return Err(err);
    }

    Ok(())
}
