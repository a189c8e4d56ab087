//! # kiln-types
//!
//! Shared domain types used across the Kiln workspace: chain identifiers,
//! compiled-artifact records, and name-auction bids.

pub mod bid;
pub mod compilation;

/// Blockchain identifier, as used by the target networks.
pub type ChainId = u64;

/// Lowercase hex content address, as produced by `kiln-hash`.
pub type ContentAddress = String;

/// Chain id assumed for records written before the repository became
/// multi-chain aware.
pub const DEFAULT_CHAIN_ID: ChainId = 1;
