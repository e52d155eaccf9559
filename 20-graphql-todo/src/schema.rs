//! GraphQL surface of the todo service.
//!
//! ```graphql
//! { Todo { count list(limit: 2) { id title updatedAt } } }
//! mutation { Todo { create(input: { title: "milk" }) { id createdAt } } }
//! ```

use std::sync::Arc;

use async_graphql::{
    Context, EmptySubscription, ID, InputObject, InputValueError, InputValueResult, Object,
    Result, Scalar, ScalarType, Schema, Value,
};
use chrono::{DateTime, Utc};

use crate::{
    service::{DEFAULT_PAGE_LIMIT, TodoService},
    todo::{NewTodo, Todo, TodoPatch},
};

/// Value reported by the `_version` query.
pub const API_VERSION: &str = "1";

pub type TodoSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// How `Todo.list` orders and slices its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ListPolicy {
    /// Newest `updatedAt` first, paged with `cursor` and `limit`.
    #[default]
    Cursor,
    /// Every todo in creation order; `cursor` and `limit` are ignored.
    Insertion,
}

pub struct ApiContext {
    pub service: Arc<TodoService>,
    pub list_policy: ListPolicy,
}

pub fn build_schema(service: Arc<TodoService>, list_policy: ListPolicy) -> TodoSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(ApiContext {
            service,
            list_policy,
        })
        .finish()
}

/// Timestamp scalar, exchanged as milliseconds since the Unix epoch.
///
/// Input also accepts an RFC 3339 string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Date(pub DateTime<Utc>);

#[Scalar]
impl ScalarType for Date {
    fn parse(value: Value) -> InputValueResult<Self> {
        match value {
            Value::Number(ref millis) => millis
                .as_i64()
                .and_then(DateTime::from_timestamp_millis)
                .map(Date)
                .ok_or_else(|| InputValueError::custom("timestamp out of range")),
            Value::String(ref text) => DateTime::parse_from_rfc3339(text)
                .map(|parsed| Date(parsed.with_timezone(&Utc)))
                .map_err(InputValueError::custom),
            other => Err(InputValueError::expected_type(other)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Number(self.0.timestamp_millis().into())
    }
}

pub struct TodoNode(Todo);

#[Object(name = "Todo")]
impl TodoNode {
    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }

    async fn title(&self) -> &str {
        &self.0.title
    }

    async fn content(&self) -> Option<&str> {
        self.0.content.as_deref()
    }

    async fn created_at(&self) -> Date {
        Date(self.0.created_at)
    }

    async fn updated_at(&self) -> Date {
        Date(self.0.updated_at)
    }
}

#[derive(InputObject)]
pub struct TodoInput {
    pub title: String,
    pub content: Option<String>,
}

impl From<TodoInput> for NewTodo {
    fn from(input: TodoInput) -> Self {
        NewTodo {
            title: input.title,
            content: input.content,
        }
    }
}

#[derive(InputObject)]
#[graphql(name = "TodoPatch")]
pub struct TodoPatchInput {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl From<TodoPatchInput> for TodoPatch {
    fn from(input: TodoPatchInput) -> Self {
        TodoPatch {
            title: input.title,
            content: input.content,
        }
    }
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    #[graphql(name = "_version")]
    async fn version(&self) -> &'static str {
        API_VERSION
    }

    #[graphql(name = "Todo")]
    async fn todo(&self) -> TodoQueries {
        TodoQueries
    }
}

pub struct TodoQueries;

#[Object]
impl TodoQueries {
    async fn count(&self, ctx: &Context<'_>) -> Result<i32> {
        let count = api(ctx)?.service.count()?;
        Ok(i32::try_from(count)?)
    }

    async fn list(
        &self,
        ctx: &Context<'_>,
        cursor: Option<ID>,
        #[graphql(default_with = "DEFAULT_PAGE_LIMIT as i32")] limit: i32,
    ) -> Result<Vec<TodoNode>> {
        let api = api(ctx)?;
        let todos = match api.list_policy {
            ListPolicy::Cursor => {
                let limit = usize::try_from(limit).unwrap_or(0);
                api.service.page(cursor.as_deref().map(String::as_str), limit)?
            }
            ListPolicy::Insertion => api.service.list()?,
        };
        Ok(todos.into_iter().map(TodoNode).collect())
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    #[graphql(name = "Todo")]
    async fn todo(&self) -> TodoOps {
        TodoOps
    }
}

pub struct TodoOps;

#[Object]
impl TodoOps {
    async fn create(&self, ctx: &Context<'_>, input: TodoInput) -> Result<TodoNode> {
        let todo = api(ctx)?.service.create(input.into())?;
        Ok(TodoNode(todo))
    }

    async fn update(
        &self,
        ctx: &Context<'_>,
        id: ID,
        input: TodoPatchInput,
    ) -> Result<Option<TodoNode>> {
        let todo = api(ctx)?.service.update(&id, input.into())?;
        Ok(todo.map(TodoNode))
    }

    async fn delete(&self, ctx: &Context<'_>, id: ID) -> Result<ID> {
        let echoed = api(ctx)?.service.delete(&id)?;
        Ok(ID(echoed))
    }
}

fn api<'a>(ctx: &Context<'a>) -> Result<&'a ApiContext> {
    ctx.data::<ApiContext>()
}
