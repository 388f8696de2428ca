//! trpc-boundary-inspector library: build-time call stamping, wire
//! propagation of boundary metadata, and offline boundary reports.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod runtime;
pub mod server;
