//! The rules document: an ordered collection of policy rules, resolved
//! against a variable resolver and deduplicated.
//!
//! Validated against a bundled JSON Schema (`schemas/policy_config_1.0.json`,
//! embedded with `rust_embed`) plus `#[serde(deny_unknown_fields)]` as a
//! second line of defense against unknown top-level fields.

use std::collections::HashSet;
use std::sync::OnceLock;

use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PolicyError, Result};
use crate::policy::{Policy, PolicyRule};
use crate::resolver::DynResolver;

#[derive(RustEmbed)]
#[folder = "schemas/"]
struct Schemas;

const SCHEMA_FILE: &str = "policy_config_1.0.json";

fn validator() -> &'static jsonschema::Validator {
    static VALIDATOR: OnceLock<jsonschema::Validator> = OnceLock::new();
    VALIDATOR.get_or_init(|| {
        let bytes = Schemas::get(SCHEMA_FILE)
            .expect("bundled policy_config_1.0.json schema is missing from the binary")
            .data;
        let schema: Value =
            serde_json::from_slice(&bytes).expect("bundled schema is not valid JSON");
        jsonschema::validator_for(&schema).expect("bundled schema is not a valid JSON Schema")
    })
}

/// A policy rules document: `{$schema, policy-rules: [PolicyRule]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesDocument {
    /// The `$schema` URI declared by the document, if any. Informational
    /// only — validation always runs against the bundled schema regardless
    /// of what this field names.
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// The policy rules, in authoring order.
    #[serde(rename = "policy-rules")]
    pub policies: Vec<PolicyRule>,
}

impl RulesDocument {
    /// Parse and validate a rules document from its serialized JSON bytes.
    ///
    /// Validates against the bundled JSON Schema first (covering the full
    /// union condition grammar regardless of what the document itself
    /// declares via `$schema`), then parses with `deny_unknown_fields` as a
    /// second line of defense against unknown top-level fields.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| PolicyError::Document(format!("invalid JSON: {e}")))?;

        let errors: Vec<String> = validator()
            .iter_errors(&value)
            .map(|e| format!("{e} at {}", e.instance_path))
            .collect();
        if !errors.is_empty() {
            return Err(PolicyError::Document(errors.join("\n")));
        }

        serde_json::from_value(value)
            .map_err(|e| PolicyError::Document(format!("schema-valid but unparseable: {e}")))
    }

    /// Resolve every rule against `resolver`, concatenating each rule's
    /// expansion in authoring order, then deduplicate while
    /// preserving first-seen order.
    pub async fn resolve(&self, resolver: &DynResolver) -> Result<Vec<Policy>> {
        let mut out = Vec::new();
        for rule in &self.policies {
            out.extend(rule.expand(resolver).await?);
        }
        Ok(dedup_policies(out))
    }
}

/// Policy equality for dedup purposes: id plus the sorted set of repository
/// ids and their selected bits.
fn policy_key(policy: &Policy) -> (String, Vec<(String, bool)>) {
    let mut repos: Vec<(String, bool)> = policy
        .repositories
        .iter()
        .map(|r| (r.id.clone(), r.selected))
        .collect();
    repos.sort();
    (policy.id.clone(), repos)
}

fn dedup_policies(policies: Vec<Policy>) -> Vec<Policy> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(policies.len());
    for policy in policies {
        if seen.insert(policy_key(&policy)) {
            out.push(policy);
        }
    }
    out
}
