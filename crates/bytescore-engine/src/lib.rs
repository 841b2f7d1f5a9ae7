//! # bytescore-engine
//! Signal fetchers, the platform history provider, and the scoring facade.

pub mod facade;
pub mod history;
pub mod signals;

pub use facade::{Clock, ScoringEngine};
