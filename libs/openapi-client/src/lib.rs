//! Wire models for the Connect publishing API
//!
//! These types mirror request and response bodies exactly as they travel over
//! the wire. Richer domain types live in the `connectapi` crate.

pub mod models;
