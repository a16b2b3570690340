//! HTTP transport and endpoint bindings

pub mod client;
pub mod content;
pub mod deployments;
pub mod users;

pub use client::HttpClient;
