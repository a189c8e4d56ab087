//! Integration test: the full artifact lifecycle.
//!
//! Compile-store-deploy-cull across chains, exercising the
//! content-addressed store, the deployment ledger, reconcile merging, the
//! ABI cache fallback, and the settings accessors together.

use kiln_db::queries::{abi_cache, code, compilations, deployments, settings};
use kiln_types::compilation::CompilationRecord;
use serde_json::json;

/// Deployable code: base opcodes plus an auxdata body and its two-byte
/// length trailer.
fn deployable(base: &[u8], auxdata_body: &[u8]) -> Vec<u8> {
    let mut out = base.to_vec();
    out.extend_from_slice(auxdata_body);
    out.extend_from_slice(&(auxdata_body.len() as u16).to_be_bytes());
    out
}

#[test]
fn compile_deploy_cull_across_chains() {
    let conn = kiln_db::open_memory().expect("open");

    let token_code = deployable(b"\x60\x80\x60\x40\x52", b"\xa2\x64ipfs");
    let (base, aux) = kiln_hash::split_auxdata(&token_code);

    // Store the artifact.
    let base_code_hash = code::upsert(&conn, base).expect("code");
    let record = CompilationRecord {
        full_code_hash: kiln_hash::content_address(&token_code),
        base_code_hash: base_code_hash.clone(),
        auxdata: aux.to_vec(),
        contract_name: Some("Token".into()),
        language: Some("Solidity".into()),
        compiler_version: Some("0.8.24".into()),
        abi: Some(json!([{"type": "function", "name": "transfer"}])),
        ..Default::default()
    };
    compilations::upsert(&conn, &record).expect("compilation");

    // Deploy the same artifact on two chains; a sibling artifact stays
    // undeployed.
    deployments::insert(&conn, 1, "0x0a", &token_code, Some("0x99"), None, None, None)
        .expect("mainnet deployment");
    deployments::insert(&conn, 5, "0x0b", &token_code, None, None, None, None)
        .expect("testnet deployment");

    let orphan_code = deployable(b"\x60\x80\x11", b"\xa2\x64scrap");
    let (orphan_base, orphan_aux) = kiln_hash::split_auxdata(&orphan_code);
    let orphan = CompilationRecord {
        full_code_hash: kiln_hash::content_address(&orphan_code),
        base_code_hash: code::upsert(&conn, orphan_base).expect("orphan code"),
        auxdata: orphan_aux.to_vec(),
        ..Default::default()
    };
    compilations::upsert(&conn, &orphan).expect("orphan compilation");

    // The ledger agrees with the content addresses the store derived.
    let deployed = deployments::select_one(&conn, 1, "0x0a")
        .expect("select")
        .expect("present");
    assert_eq!(deployed.full_code_hash, record.full_code_hash);
    assert_eq!(deployed.base_code_hash, record.base_code_hash);

    let everywhere =
        deployments::select_for_code_any_chain(&conn, &record.full_code_hash).expect("set");
    assert_eq!(everywhere.len(), 2);

    // Culling drops only the never-deployed artifact.
    let removed = compilations::cull(&conn).expect("cull");
    assert_eq!(removed, 1);
    assert!(compilations::select(&conn, &record.full_code_hash)
        .expect("select")
        .is_some());
    assert!(compilations::select(&conn, &orphan.full_code_hash)
        .expect("select")
        .is_none());

    // Raw code survives the cull, so the deployment stays reproducible.
    let raw = code::select(&conn, &deployed.base_code_hash)
        .expect("code")
        .expect("present");
    let rederived = kiln_hash::content_address_with_auxdata(&raw, aux);
    assert_eq!(rederived, deployed.full_code_hash);
}

#[test]
fn reconcile_merges_partial_records_before_upsert() {
    let conn = kiln_db::open_memory().expect("open");

    let code_bytes = deployable(b"\x60\x80", b"\xa1");
    let (base, aux) = kiln_hash::split_auxdata(&code_bytes);
    let base_code_hash = code::upsert(&conn, base).expect("code");
    let full_code_hash = kiln_hash::content_address(&code_bytes);

    let from_compiler = CompilationRecord {
        full_code_hash: full_code_hash.clone(),
        base_code_hash: base_code_hash.clone(),
        auxdata: aux.to_vec(),
        compiler_version: Some("0.8.24".into()),
        abi: Some(json!([])),
        ..Default::default()
    };
    let from_source_index = CompilationRecord {
        full_code_hash: full_code_hash.clone(),
        base_code_hash,
        auxdata: aux.to_vec(),
        contract_name: Some("Vault".into()),
        source: Some("contract Vault {}".into()),
        compiler_version: Some("0.8.19".into()),
        ..Default::default()
    };

    // Upsert replaces wholesale, so merge in memory first; the compiler's
    // view wins conflicts.
    let merged = from_compiler.reconcile(&from_source_index);
    compilations::upsert(&conn, &merged).expect("upsert");

    let stored = compilations::select(&conn, &full_code_hash)
        .expect("select")
        .expect("present");
    assert_eq!(stored.compiler_version.as_deref(), Some("0.8.24"));
    assert_eq!(stored.contract_name.as_deref(), Some("Vault"));
    assert_eq!(stored.abi, Some(json!([])));
}

#[test]
fn abi_cache_covers_contracts_without_compilations() {
    let conn = kiln_db::open_memory().expect("open");

    // A contract someone else deployed: no code, no compilation, just a
    // hand-cached ABI.
    let abi = json!([{"type": "function", "name": "withdraw"}]);
    abi_cache::insert(&conn, 1, "0xfe", &abi).expect("cache");

    assert_eq!(
        abi_cache::select(&conn, 1, "0xfe").expect("select"),
        Some(abi)
    );
    assert_eq!(abi_cache::select(&conn, 5, "0xfe").expect("select"), None);
}

#[test]
fn settings_round_trip() {
    let conn = kiln_db::open_memory().expect("open");

    assert_eq!(settings::api_key(&conn).expect("get"), None);
    settings::set_api_key(&conn, "k-etherscan-123").expect("set");
    settings::set_backup_directory(&conn, "/var/backups/kiln").expect("set");

    assert_eq!(
        settings::api_key(&conn).expect("get").as_deref(),
        Some("k-etherscan-123")
    );
    assert_eq!(
        settings::backup_directory(&conn).expect("get").as_deref(),
        Some("/var/backups/kiln")
    );
}
