pub mod auth;
pub mod bookmark;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod state;
