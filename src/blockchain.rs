// Thin re-export module: implementation is in `blockchain/core.rs`, split
// into block construction, validation and the ledger itself.

pub mod core;
pub use self::core::*;
