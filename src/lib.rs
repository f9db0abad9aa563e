// src/lib.rs

//! Gallery sync library
//!
//! Mirrors a remote photo gallery's posts into a local SQLite store and
//! serves cached reads over them.

pub mod cache;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
