//! GraphQL API over an in-memory todo store.
//!
//! Each module owns one concern:
//!
//! - [`store`] is the key-value storage abstraction and its in-memory backend.
//! - [`clock`] supplies timestamps, so tests can control time.
//! - [`todo`] defines the todo record and the inputs that create or patch it.
//! - [`service`] implements count, list, page, create, update and delete on
//!   top of a store.
//! - [`schema`] exposes the service as GraphQL queries and mutations.
//! - [`server`] serves the schema over HTTP with axum.
//! - [`cli`] parses the command-line arguments of the binary.

pub mod cli;
pub mod clock;
pub mod schema;
pub mod server;
pub mod service;
pub mod store;
pub mod todo;
