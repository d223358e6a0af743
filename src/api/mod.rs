//! HTTP serving layer
//!
//! Routes requests to the revision resolver, records each served page with
//! the analytics buffer, and hosts the password-protected admin dashboard.

pub mod admin;
pub mod auth;
pub mod http;
pub mod pages;
pub mod render;
pub mod session;
pub mod state;

pub use http::create_router;
pub use state::AppState;
