//! Compiled-artifact metadata records.

use serde::{Deserialize, Serialize};

/// Metadata describing one compilation of a piece of contract code.
///
/// Keyed by `full_code_hash`, the content address of the deployable base
/// code with the compiler's auxdata suffix appended. `base_code_hash`
/// addresses the base code alone and must refer to a stored code record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilationRecord {
    pub full_code_hash: String,
    pub base_code_hash: String,
    /// Compiler-appended metadata suffix, verbatim.
    pub auxdata: Vec<u8>,
    pub contract_name: Option<String>,
    pub source: Option<String>,
    pub language: Option<String>,
    pub language_version: Option<String>,
    pub compiler_version: Option<String>,
    pub compiler_options: Option<String>,
    pub abi: Option<serde_json::Value>,
    pub user_doc: Option<serde_json::Value>,
    pub developer_doc: Option<serde_json::Value>,
    pub metadata_json: Option<String>,
}

impl CompilationRecord {
    /// Field-wise merge of two records describing the same artifact: every
    /// defined field of `self` is kept, gaps are filled from `other`. Where
    /// both sides are defined, `self` wins.
    pub fn reconcile(mut self, other: &Self) -> Self {
        self.contract_name = self.contract_name.or_else(|| other.contract_name.clone());
        self.source = self.source.or_else(|| other.source.clone());
        self.language = self.language.or_else(|| other.language.clone());
        self.language_version = self
            .language_version
            .or_else(|| other.language_version.clone());
        self.compiler_version = self
            .compiler_version
            .or_else(|| other.compiler_version.clone());
        self.compiler_options = self
            .compiler_options
            .or_else(|| other.compiler_options.clone());
        self.abi = self.abi.or_else(|| other.abi.clone());
        self.user_doc = self.user_doc.or_else(|| other.user_doc.clone());
        self.developer_doc = self.developer_doc.or_else(|| other.developer_doc.clone());
        self.metadata_json = self.metadata_json.or_else(|| other.metadata_json.clone());
        self
    }

    /// Like [`CompilationRecord::reconcile`], but where both sides are
    /// defined, `other` wins.
    pub fn reconcile_over(self, other: &Self) -> Self {
        other.clone().reconcile(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: Option<&str>, language: Option<&str>) -> CompilationRecord {
        CompilationRecord {
            full_code_hash: "ff".into(),
            base_code_hash: "bb".into(),
            auxdata: vec![0xa1],
            contract_name: name.map(String::from),
            language: language.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_reconcile_fills_gaps() {
        let a = record(Some("Token"), None);
        let b = record(None, Some("Solidity"));

        let merged = a.reconcile(&b);
        assert_eq!(merged.contract_name.as_deref(), Some("Token"));
        assert_eq!(merged.language.as_deref(), Some("Solidity"));
    }

    #[test]
    fn test_reconcile_prefers_self_on_conflict() {
        let a = record(Some("Token"), None);
        let b = record(Some("Coin"), None);

        let merged = a.reconcile(&b);
        assert_eq!(merged.contract_name.as_deref(), Some("Token"));
    }

    #[test]
    fn test_reconcile_over_prefers_other_on_conflict() {
        let a = record(Some("Token"), None);
        let b = record(Some("Coin"), Some("Solidity"));

        let merged = a.reconcile_over(&b);
        assert_eq!(merged.contract_name.as_deref(), Some("Coin"));
        assert_eq!(merged.language.as_deref(), Some("Solidity"));
    }

    #[test]
    fn test_reconcile_over_keeps_self_where_other_undefined() {
        let a = record(Some("Token"), Some("Vyper"));
        let b = record(None, Some("Solidity"));

        let merged = a.reconcile_over(&b);
        assert_eq!(merged.contract_name.as_deref(), Some("Token"));
        assert_eq!(merged.language.as_deref(), Some("Solidity"));
    }
}
