//! Client for a remote object-detection API.
//!
//! Layout follows ports and adapters: `domain` holds the wire schema and
//! display state, `application` the use case and its ports, `adapters` the
//! HTTP client, renderer, camera, terminal output and dashboard server.

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
