use std::net::SocketAddr;

use clap::Parser;

use crate::schema::ListPolicy;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Socket address the GraphQL server binds to. Use port 0 for an ephemeral port.
    #[arg(long, default_value = "127.0.0.1:7008")]
    pub listen: SocketAddr,

    /// Ordering used by `Todo.list`.
    #[arg(long, value_enum, default_value_t = ListPolicy::Cursor)]
    pub list_policy: ListPolicy,
}
