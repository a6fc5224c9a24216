//! Domain types for Course Market.
//!
//! This module contains the core business entities and value objects.

mod account;
mod course;

pub use account::*;
pub use course::*;
