//! The proxy module tree: HTTP surface, request/response mapping, and the
//! upstream session machinery.

pub mod handlers;
pub mod mappers;
pub mod middleware;
pub mod server;
pub mod upstream;

pub use server::{build_router, AppState};
