//! # bytescore-rpc
//! JSON-RPC adapters for the ByteScore engine.
//!
//! - [`RpcLedger`](ledger::RpcLedger) reads account activity
//! - [`ProgramHistory`](bytebonds::ProgramHistory) reads ByteBonds repayment history

pub mod bytebonds;
pub mod client;
pub mod ledger;

pub use bytebonds::ProgramHistory;
pub use client::RpcClient;
pub use ledger::RpcLedger;
