//! HTTP API layer for Course Market.
//!
//! Provides REST endpoints for administrators and users.

pub mod handlers;
mod routes;
mod types;

#[cfg(test)]
mod tests;

pub use routes::build_router;
