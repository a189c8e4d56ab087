//! SQL table definitions, current and historical.
//!
//! Each current-version table has its own `CREATE` constant so the
//! migration steps can rebuild a single table with exactly the text a fresh
//! install uses; a migrated store and a fresh store end up shape-identical.

/// Reserved metadata keys.
pub const KEY_SCHEMA_VERSION: &str = "SchemaVersion";
pub const KEY_LAST_TOOL_VERSION: &str = "LastSuccessfulToolVersion";
pub const KEY_API_KEY: &str = "ApiKey";
pub const KEY_BACKUP_DIRECTORY: &str = "BackupDirectory";

/// Repository metadata and settings, including the schema version marker.
pub const CREATE_METADATA: &str = "
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);";

/// Raw contract code, keyed by content address.
pub const CREATE_CODE: &str = "
CREATE TABLE IF NOT EXISTS code (
    base_code_hash TEXT PRIMARY KEY,
    code BLOB NOT NULL
);";

/// Compiled-artifact metadata, keyed by the full-code content address.
pub const CREATE_COMPILATIONS: &str = "
CREATE TABLE IF NOT EXISTS compilations (
    full_code_hash TEXT PRIMARY KEY,
    base_code_hash TEXT NOT NULL REFERENCES code(base_code_hash) ON DELETE CASCADE,
    auxdata BLOB NOT NULL,
    contract_name TEXT,
    source TEXT,
    language TEXT,
    language_version TEXT,
    compiler_version TEXT,
    compiler_options TEXT,
    abi TEXT,
    user_doc TEXT,
    developer_doc TEXT,
    metadata_json TEXT
);
CREATE INDEX IF NOT EXISTS idx_compilations_base ON compilations(base_code_hash);";

/// Per-chain deployment ledger. The chain id is part of the key: the same
/// address can exist independently on different chains.
pub const CREATE_DEPLOYMENTS: &str = "
CREATE TABLE IF NOT EXISTS deployments (
    blockchain_id INTEGER NOT NULL,
    contract_address TEXT NOT NULL,
    base_code_hash TEXT NOT NULL,
    full_code_hash TEXT NOT NULL,
    deployer_address TEXT,
    tx_hash TEXT,
    deployed_at INTEGER,
    constructor_inputs BLOB,
    PRIMARY KEY (blockchain_id, contract_address)
);
CREATE INDEX IF NOT EXISTS idx_deployments_full ON deployments(full_code_hash);";

/// Manually cached ABI definitions, independent of the artifact store.
pub const CREATE_ABI_CACHE: &str = "
CREATE TABLE IF NOT EXISTS abi_cache (
    blockchain_id INTEGER NOT NULL,
    contract_address TEXT NOT NULL,
    abi TEXT NOT NULL,
    PRIMARY KEY (blockchain_id, contract_address)
);";

/// Alias registry. One alias maps to one address; one address may carry
/// several aliases.
pub const CREATE_ALIASES: &str = "
CREATE TABLE IF NOT EXISTS aliases (
    blockchain_id INTEGER NOT NULL,
    alias TEXT NOT NULL,
    address TEXT NOT NULL,
    PRIMARY KEY (blockchain_id, alias)
);
CREATE INDEX IF NOT EXISTS idx_aliases_address ON aliases(address);";

/// Name-auction bid ledger. Rows are never deleted; the three flags only
/// ever move from 0 to 1.
pub const CREATE_BIDS: &str = "
CREATE TABLE IF NOT EXISTS bids (
    blockchain_id INTEGER NOT NULL,
    bid_hash TEXT NOT NULL,
    simple_name TEXT NOT NULL,
    bidder_address TEXT NOT NULL,
    value TEXT NOT NULL,
    salt TEXT NOT NULL,
    bid_at INTEGER NOT NULL,
    tld TEXT NOT NULL,
    auction_address TEXT NOT NULL,
    accepted INTEGER NOT NULL DEFAULT 0,
    revealed INTEGER NOT NULL DEFAULT 0,
    removed INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (blockchain_id, bid_hash)
);
CREATE INDEX IF NOT EXISTS idx_bids_name_bidder ON bids(simple_name, bidder_address);";

/// Current-version tables in dependency order.
pub const CURRENT_TABLES: &[&str] = &[
    CREATE_METADATA,
    CREATE_CODE,
    CREATE_COMPILATIONS,
    CREATE_DEPLOYMENTS,
    CREATE_ABI_CACHE,
    CREATE_ALIASES,
    CREATE_BIDS,
];

/// The version-0 schema, from before the store was multi-chain aware:
/// single-column keys on the per-contract tables, a narrower compilations
/// table, no secondary indexes, and no bid ledger. Retained verbatim so the
/// migration chain can be exercised against a genuine v0 store.
pub const SCHEMA_V0: &str = "
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS code (
    base_code_hash TEXT PRIMARY KEY,
    code BLOB NOT NULL
);
CREATE TABLE IF NOT EXISTS compilations (
    full_code_hash TEXT PRIMARY KEY,
    base_code_hash TEXT NOT NULL REFERENCES code(base_code_hash) ON DELETE CASCADE,
    auxdata BLOB NOT NULL,
    contract_name TEXT,
    source TEXT,
    language TEXT,
    compiler_version TEXT,
    abi TEXT,
    metadata_json TEXT
);
CREATE TABLE IF NOT EXISTS deployments (
    contract_address TEXT PRIMARY KEY,
    base_code_hash TEXT NOT NULL,
    full_code_hash TEXT NOT NULL,
    deployer_address TEXT,
    tx_hash TEXT,
    deployed_at INTEGER,
    constructor_inputs BLOB
);
CREATE TABLE IF NOT EXISTS abi_cache (
    contract_address TEXT PRIMARY KEY,
    abi TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS aliases (
    alias TEXT PRIMARY KEY,
    address TEXT NOT NULL
);";
