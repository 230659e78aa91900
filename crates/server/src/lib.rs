//! EcoHome server library.
//!
//! JSON API for household water and energy tracking. The binary in
//! `main.rs` wires configuration, tracing and Sentry around [`routes::app`];
//! the CLI reuses the database layer and services directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod timestamp;
