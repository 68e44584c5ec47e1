//! # Recital Application Library
//!
//! Exposes the HTTP API, backend selection and configuration so that
//! integration tests can build the router without a network listener.

pub mod api;
pub mod backend;
pub mod config;
