//! # bytescore-core
//! Types, scoring math, and data-source traits for ByteScore.
//!
//! Everything here is synchronous and deterministic except the trait
//! definitions in [`traits`], which the engine drives.

pub mod account;
pub mod composer;
pub mod config;
pub mod constants;
pub mod error;
pub mod fallback;
pub mod normalize;
pub mod penalty;
pub mod traits;
pub mod types;
