// Stagedoor - social backend for musicians and their audiences

// Core types and primitives
pub mod core;

// Entity store - document collections plus the follow edge relation
pub mod store;

// Identity - password hashing, bearer tokens, caller extraction
pub mod auth;

// Domain services - accounts, follow graph, feed, engagement, posts
pub mod services;

// Uploaded media handling
pub mod media;

// HTTP surface
pub mod api;

// Application assembly and common utilities
pub mod app_state;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
