//! Authentication module for Course Market.
//!
//! One gate type serves both roles:
//! - Signed token: `Authorization: Bearer <jwt>` signed with the role's key
//! - Direct lookup: `username` / `password` headers checked against the role's store

mod gate;
mod jwt;
mod middleware;
mod password;

pub use gate::*;
pub use jwt::*;
pub use middleware::*;
pub use password::*;
