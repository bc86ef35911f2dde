// core.rs splits responsibilities into submodules: block construction and
// hashing, validation, and the locked ledger itself.
pub mod chain;
pub mod ledger;
pub mod validation;

pub use chain::*;
pub use ledger::*;
pub use validation::*;
