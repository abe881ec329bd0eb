//! Credit-metered AI image generation service.
//!
//! Users register, hold a credit balance, and spend one credit per prompt on
//! an image from an external provider. See [`app::build_app`] for the routes.

pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod generator;
pub mod images;
pub mod state;
pub mod store;

pub use error::ApiError;
pub use state::AppState;
