pub mod auth;
pub mod client;
pub mod config;
pub mod editor;
pub mod encoding;
pub mod error;
pub mod landing;
pub mod models;
pub mod store;
