use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::DateTime;
use graphql_todo::{
    clock::SteppingClock,
    schema::{ListPolicy, build_schema},
    server::{Server, router},
    service::TodoService,
    store::MemoryStore,
};
use serde_json::{Value, json};
use tokio::{net::TcpListener, time::timeout};
use tower::ServiceExt;

fn app(list_policy: ListPolicy) -> Router {
    let start = DateTime::from_timestamp_millis(5_000).expect("valid start time");
    let service = TodoService::new(
        Arc::new(MemoryStore::new()),
        Arc::new(SteppingClock::new(start, 1)),
    );
    router(build_schema(Arc::new(service), list_policy))
}

async fn post_graphql(app: &Router, query: &str, variables: Value) -> Result<Value> {
    let body = json!({ "query": query, "variables": variables });
    let request = Request::post("/graphql")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body)?))?;

    let response = app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let value: Value = serde_json::from_slice(&bytes)?;
    if let Some(errors) = value.get("errors") {
        anyhow::bail!("graphql errors: {errors}");
    }
    value.get("data").cloned().context("response has no data")
}

async fn create(app: &Router, title: &str) -> Result<Value> {
    let data = post_graphql(
        app,
        "mutation($input: TodoInput!) { Todo { create(input: $input) { id title content createdAt updatedAt } } }",
        json!({ "input": { "title": title } }),
    )
    .await?;
    Ok(data["Todo"]["create"].clone())
}

#[tokio::test]
async fn crud_round_trip_over_http() -> Result<()> {
    let app = app(ListPolicy::Cursor);

    let a = create(&app, "A").await?;
    let b = create(&app, "B").await?;
    assert_eq!(a["createdAt"], a["updatedAt"]);
    assert!(a["content"].is_null());
    assert!(a["createdAt"].is_i64(), "dates are epoch millis");

    let data = post_graphql(&app, "{ _version Todo { count } }", json!({})).await?;
    assert_eq!(data["_version"], "1");
    assert_eq!(data["Todo"]["count"], 2);

    let data = post_graphql(
        &app,
        "mutation($id: ID!) { Todo { update(id: $id, input: { title: \"A2\" }) { id title createdAt updatedAt } } }",
        json!({ "id": a["id"] }),
    )
    .await?;
    let updated = &data["Todo"]["update"];
    assert_eq!(updated["id"], a["id"]);
    assert_eq!(updated["title"], "A2");
    assert_eq!(updated["createdAt"], a["createdAt"]);
    assert!(updated["updatedAt"].as_i64() > a["updatedAt"].as_i64());

    let data = post_graphql(
        &app,
        "mutation($id: ID!) { Todo { delete(id: $id) } }",
        json!({ "id": b["id"] }),
    )
    .await?;
    assert_eq!(data["Todo"]["delete"], b["id"]);

    let data = post_graphql(&app, "{ Todo { count list { id title } } }", json!({})).await?;
    assert_eq!(data["Todo"]["count"], 1);
    assert_eq!(data["Todo"]["list"], json!([{ "id": a["id"], "title": "A2" }]));
    Ok(())
}

#[tokio::test]
async fn update_of_unknown_id_is_null_not_an_error() -> Result<()> {
    let app = app(ListPolicy::Cursor);

    let data = post_graphql(
        &app,
        "mutation { Todo { update(id: \"41\", input: { content: \"x\" }) { id } } }",
        json!({}),
    )
    .await?;

    assert!(data["Todo"]["update"].is_null());
    Ok(())
}

#[tokio::test]
async fn list_pages_with_cursor_and_limit() -> Result<()> {
    let app = app(ListPolicy::Cursor);
    let mut ids = Vec::new();
    for title in ["t1", "t2", "t3", "t4", "t5"] {
        ids.push(create(&app, title).await?["id"].clone());
    }

    let data = post_graphql(
        &app,
        "query($cursor: ID) { Todo { list(cursor: $cursor, limit: 2) { title } } }",
        json!({ "cursor": ids[2] }),
    )
    .await?;

    assert_eq!(
        data["Todo"]["list"],
        json!([{ "title": "t2" }, { "title": "t1" }])
    );
    Ok(())
}

#[tokio::test]
async fn missing_required_title_is_rejected_by_schema() -> Result<()> {
    let app = app(ListPolicy::Cursor);

    let result = post_graphql(
        &app,
        "mutation { Todo { create(input: { content: \"no title\" }) { id } } }",
        json!({}),
    )
    .await;

    assert!(result.is_err());
    let data = post_graphql(&app, "{ Todo { count } }", json!({})).await?;
    assert_eq!(data["Todo"]["count"], 0);
    Ok(())
}

#[tokio::test]
async fn playground_and_health_respond() -> Result<()> {
    let app = app(ListPolicy::Insertion);

    let response = app
        .clone()
        .oneshot(Request::get("/").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let html = to_bytes(response.into_body(), usize::MAX).await?;
    assert!(String::from_utf8_lossy(&html).contains("graphiql"));

    let response = app
        .oneshot(Request::get("/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn server_answers_on_a_real_socket_until_shutdown() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let service = TodoService::new(
        Arc::new(MemoryStore::new()),
        Arc::new(graphql_todo::clock::SystemClock),
    );
    let server = Server::new(listener, build_schema(Arc::new(service), ListPolicy::Cursor));
    let addr = server.local_addr()?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(server.run_until(async move {
        let _ = shutdown_rx.await;
    }));

    let mut stream = tokio::net::TcpStream::connect(addr).await?;
    let body = r#"{"query":"{ _version }"}"#;
    let request = format!(
        "POST / HTTP/1.1\r\nhost: {addr}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    tokio::io::AsyncWriteExt::write_all(&mut stream, request.as_bytes()).await?;
    let mut response = String::new();
    timeout(
        Duration::from_secs(3),
        tokio::io::AsyncReadExt::read_to_string(&mut stream, &mut response),
    )
    .await??;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.contains(r#""_version":"1""#), "{response}");

    let _ = shutdown_tx.send(());
    timeout(Duration::from_secs(3), handle).await???;
    Ok(())
}
