use std::{future::Future, net::SocketAddr};

use anyhow::Result;
use async_graphql::http::GraphiQLSource;
use axum::{
    Json, Router,
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::schema::TodoSchema;

/// Path the playground posts queries to. `/` is served as well.
pub const GRAPHQL_PATH: &str = "/graphql";

pub fn router(schema: TodoSchema) -> Router {
    Router::new()
        .route("/", get(playground).post(graphql))
        .route(GRAPHQL_PATH, get(playground).post(graphql))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(schema)
}

async fn graphql(
    State(schema): State<TodoSchema>,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    Json(schema.execute(request).await)
}

async fn playground() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish())
}

async fn health() -> &'static str {
    "ok"
}

pub struct Server {
    listener: TcpListener,
    schema: TodoSchema,
}

impl Server {
    pub fn new(listener: TcpListener, schema: TodoSchema) -> Self {
        Self { listener, schema }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Server { listener, schema } = self;
        axum::serve(listener, router(schema))
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("server shut down");
        Ok(())
    }

    pub async fn run_until_ctrl_c(self) -> Result<()> {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = ?err, "failed to install ctrl-c handler");
            }
        })
        .await
    }
}
