//! # Cipher Vault Test Contracts
//!
//! Token contracts that misbehave in the ways real tokens do, for driving
//! the vault through its failure paths:
//!
//! - **Reentrant**: calls back into the vault from inside `transfer` /
//!   `transfer_from`, the way hook-bearing token standards do.
//! - **Non-standard**: tokens that return nothing, return `false` instead
//!   of reverting, or revert without a reason.
//! - **Fee-on-transfer**: delivers less than the amount requested and
//!   still reports success.
//!
//! All of them keep their balances in the chain's [`TokenState`], so the
//! chain's frame rollback covers them like any other token.
//!
//! [`TokenState`]: cipher_vault::TokenState

pub mod fee;
pub mod non_standard;
pub mod reentrant;

pub use fee::FeeOnTransferToken;
pub use non_standard::{FailOn, FalseReturnToken, NoReturnToken, SilentRevertToken};
pub use reentrant::{ReentrantToken, ReentryAction, ReentryAttempt};
