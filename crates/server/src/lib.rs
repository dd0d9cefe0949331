//! Stockpile inventory server library.
//!
//! This crate provides the inventory API as a library, allowing it to be
//! driven in-process by the integration tests and reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
