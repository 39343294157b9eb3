//! Data models for the thesis archive.
//!
//! Wire field names are snake_case, matching the frontend contract.

mod request;
mod thesis;
mod user;

pub use request::*;
pub use thesis::*;
pub use user::*;
