//! Name-auction bid records.

use serde::{Deserialize, Serialize};

use crate::ChainId;

/// A sealed bid submitted to a name auction.
///
/// `value` is a decimal string: auction amounts are 256-bit and exceed the
/// integer range of the storage engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub blockchain_id: ChainId,
    pub bid_hash: String,
    pub simple_name: String,
    pub bidder_address: String,
    pub value: String,
    pub salt: String,
    pub bid_at: u64,
    pub tld: String,
    pub auction_address: String,
}
