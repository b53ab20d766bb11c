//! GraphQL Gateway Library
//! Re-exports modules for testing and integration

pub mod command;
pub mod config;
pub mod identity;
pub mod middleware;
pub mod routes;
pub mod schema;
