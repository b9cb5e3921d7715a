//! Vault core: share ledger, position manager and harvest engine, driven
//! against the collaborator interfaces so it runs the same on-chain and
//! against in-memory doubles.

pub mod harvest;
pub mod ledger;
pub mod position;
pub mod processor;
