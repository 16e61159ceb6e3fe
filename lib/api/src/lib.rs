//! # notex API
//!
//! HTTP surface over the search pipeline and the dictionary store.

pub mod rest;

pub use rest::{AppState, RestApi};
