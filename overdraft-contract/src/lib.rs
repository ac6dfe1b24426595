//! Overdraft Contract
//!
//! An example smart contract for a GBP current account with an arranged
//! overdraft.
//!
//! # Behaviour
//!
//! 1. **Activation**: schedules `ACCRUE_INTEREST` daily at midnight UTC
//! 2. **Pre-posting**: rejects postings in any denomination but the account's
//! 3. **Post-posting**: charges the overdraft fee when the committed balance
//!    falls below the negative overdraft limit
//! 4. **Scheduled**: accrues one day of interest on a positive balance
//!
//! # Example
//!
//! ```no_run
//! use contracts_api::types::ActivationHookArguments;
//! use contracts_api::{SmartContract, TzDateTime};
//! use overdraft_contract::{MockVault, OverdraftContract};
//!
//! fn main() -> overdraft_contract::Result<()> {
//!     let contract = OverdraftContract::new()?;
//!     let opened = TzDateTime::utc(2024, 1, 1, 9, 0, 0)?;
//!     let vault = MockVault::new("customer_1", opened.clone());
//!
//!     let args = ActivationHookArguments::new(opened)?;
//!     let result = contract.activation_hook(&vault, &args)?;
//!     println!("{:?}", result);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod contract;
pub mod error;
pub mod harness;
pub mod interest;
pub mod parameters;

// Re-exports
pub use contract::OverdraftContract;
pub use error::{Error, Result};
pub use harness::MockVault;
pub use parameters::OverdraftParameters;
