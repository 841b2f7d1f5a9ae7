//! Scenario and property test suite for ByteScore.
//!
//! The library half holds in-memory implementations of the data-source
//! traits; the tests themselves live under `tests/`.

pub mod helpers;
