//! Name-auction bid ledger.
//!
//! Bids are append-only: rows are never deleted, and the accepted /
//! revealed / removed flags only ever move from false to true. A "removed"
//! bid stays on disk with its flag set; filtering removed bids is a caller
//! concern.

use kiln_types::bid::Bid;
use kiln_types::ChainId;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::Result;

/// One bid row with its state flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BidRow {
    pub bid: Bid,
    pub accepted: bool,
    pub revealed: bool,
    pub removed: bool,
}

/// Append a bid with all flags false. Fails on a duplicate
/// (chain, bid hash) key.
pub fn insert(conn: &Connection, bid: &Bid) -> Result<()> {
    conn.execute(
        "INSERT INTO bids
         (blockchain_id, bid_hash, simple_name, bidder_address, value, salt,
          bid_at, tld, auction_address)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            bid.blockchain_id as i64,
            bid.bid_hash,
            bid.simple_name,
            bid.bidder_address,
            bid.value,
            bid.salt,
            bid.bid_at as i64,
            bid.tld,
            bid.auction_address,
        ],
    )?;
    Ok(())
}

/// Mark a bid accepted. Idempotent; a no-op if the bid does not exist.
pub fn mark_accepted(conn: &Connection, blockchain_id: ChainId, bid_hash: &str) -> Result<()> {
    set_flag(conn, "accepted", blockchain_id, bid_hash)
}

/// Mark a bid revealed. Idempotent; a no-op if the bid does not exist.
pub fn mark_revealed(conn: &Connection, blockchain_id: ChainId, bid_hash: &str) -> Result<()> {
    set_flag(conn, "revealed", blockchain_id, bid_hash)
}

/// Mark a bid removed. The row stays; there is no physical delete.
pub fn mark_removed(conn: &Connection, blockchain_id: ChainId, bid_hash: &str) -> Result<()> {
    set_flag(conn, "removed", blockchain_id, bid_hash)
}

/// Flags only move towards true; `column` comes from the three mark_*
/// wrappers, never from callers.
fn set_flag(conn: &Connection, column: &str, blockchain_id: ChainId, bid_hash: &str) -> Result<()> {
    conn.execute(
        &format!("UPDATE bids SET {column} = 1 WHERE blockchain_id = ?1 AND bid_hash = ?2"),
        rusqlite::params![blockchain_id as i64, bid_hash],
    )?;
    Ok(())
}

/// Fetch one bid by key, flags included.
pub fn select_by_hash(
    conn: &Connection,
    blockchain_id: ChainId,
    bid_hash: &str,
) -> Result<Option<BidRow>> {
    let row = conn
        .query_row(
            &format!("{SELECT_BID} WHERE blockchain_id = ?1 AND bid_hash = ?2"),
            rusqlite::params![blockchain_id as i64, bid_hash],
            row_to_bid,
        )
        .optional()?;
    Ok(row)
}

/// All bids one bidder placed on one name, oldest first.
pub fn select_by_name_and_bidder(
    conn: &Connection,
    blockchain_id: ChainId,
    simple_name: &str,
    bidder_address: &str,
) -> Result<Vec<BidRow>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_BID}
         WHERE blockchain_id = ?1 AND simple_name = ?2 AND bidder_address = ?3
         ORDER BY bid_at, bid_hash"
    ))?;
    let rows = stmt
        .query_map(
            rusqlite::params![blockchain_id as i64, simple_name, bidder_address],
            row_to_bid,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Every bid on one chain, oldest first, removed bids included.
pub fn select_all_for_chain(conn: &Connection, blockchain_id: ChainId) -> Result<Vec<BidRow>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_BID} WHERE blockchain_id = ?1 ORDER BY bid_at, bid_hash"
    ))?;
    let rows = stmt
        .query_map([blockchain_id as i64], row_to_bid)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

const SELECT_BID: &str = "SELECT blockchain_id, bid_hash, simple_name, bidder_address, value,
        salt, bid_at, tld, auction_address, accepted, revealed, removed
 FROM bids";

fn row_to_bid(row: &Row<'_>) -> rusqlite::Result<BidRow> {
    Ok(BidRow {
        bid: Bid {
            blockchain_id: row.get::<_, i64>(0)? as ChainId,
            bid_hash: row.get(1)?,
            simple_name: row.get(2)?,
            bidder_address: row.get(3)?,
            value: row.get(4)?,
            salt: row.get(5)?,
            bid_at: row.get::<_, i64>(6)? as u64,
            tld: row.get(7)?,
            auction_address: row.get(8)?,
        },
        accepted: row.get(9)?,
        revealed: row.get(10)?,
        removed: row.get(11)?,
    })
}
