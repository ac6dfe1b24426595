//! Contracts API
//!
//! Typed data model exchanged between a banking smart contract and the host
//! ledger engine, plus the validation layer guarding that boundary.
//!
//! # Architecture
//!
//! - **Validation**: strong typing of dynamic host values, semantic field checks
//! - **Types**: postings, balances, timeseries, schedules, parameters, hook arguments and results
//! - **Contract surface**: the [`Vault`] a hook reads from and the [`SmartContract`] it implements
//! - **Capabilities**: versioned feature sets resolved from [`Config`]
//!
//! # Invariants
//!
//! - Every datetime crossing the boundary is in the named `UTC` zone
//! - Postings in a custom instruction net to zero per balance coordinate
//! - A `bool` never satisfies an integer field
//! - Deserialised host data is never altered

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod capabilities;
pub mod config;
pub mod contract;
pub mod error;
pub mod host;
pub mod types;
pub mod validation;

// Re-exports
pub use capabilities::{ApiVersion, Capability, CapabilitySet, TypesRegistry};
pub use config::Config;
pub use contract::{SmartContract, Vault};
pub use error::{Error, Result};
pub use validation::{require_utc, TzDateTime, Value};
