//! A policy rule template, and its expansion into zero or more concrete
//! policies.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::condition::{evaluate_all, Condition};
use crate::error::Result;
use crate::repository::{RepoTemplate, Repository};
use crate::resolver::{DynResolver, Pinned, VariableResolver};
use crate::variable::is_variable;

/// A policy rule as authored in the rules DSL. Every field but
/// `repositories` may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Literal policy id or variable text.
    #[serde(rename = "policy-id", default)]
    pub id: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Originating type, e.g. "funder" or "institution".
    #[serde(default)]
    pub r#type: String,
    /// Repository templates this policy requires deposit into.
    pub repositories: Vec<RepoTemplate>,
    /// Conditions that must all pass for this rule to apply.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// A concrete, applicable policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Resolved policy id.
    pub id: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Originating type, e.g. "funder" or "institution".
    #[serde(rename = "type", default)]
    pub policy_type: String,
    /// Concrete repositories this policy requires deposit into.
    pub repositories: Vec<Repository>,
}

impl PolicyRule {
    /// Expand this rule against `resolver` into zero or more concrete
    /// policies:
    ///
    /// 1. If `id` is a variable, resolve it and recurse once per id with
    ///    the original id variable pinned to that concrete value, so
    ///    sibling expressions referencing the pinned variable collapse to
    ///    the matching branch.
    /// 2. Otherwise expand every repository template.
    /// 3. Evaluate conditions; emit the policy only if they all pass.
    pub fn expand<'a>(
        &'a self,
        resolver: &'a DynResolver,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Policy>>> + Send + 'a>> {
        Box::pin(async move {
            if is_variable(&self.id) {
                let ids = resolver.resolve(&self.id).await?;
                let mut policies = Vec::new();
                for id in ids {
                    let pinned: DynResolver = Pinned::new(resolver.clone(), self.id.clone(), id.clone());
                    let mut substituted = self.clone();
                    substituted.id = id;
                    policies.extend(substituted.expand(&pinned).await?);
                }
                return Ok(policies);
            }

            let mut repositories = Vec::new();
            for template in &self.repositories {
                repositories.extend(template.resolve(resolver).await?);
            }

            if !evaluate_all(&self.conditions, resolver).await? {
                return Ok(Vec::new());
            }

            Ok(vec![Policy {
                id: self.id.clone(),
                description: self.description.clone(),
                policy_type: self.r#type.clone(),
                repositories,
            }])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::fetcher::Fetcher;
    use async_trait::async_trait;
    use serde_json::{Map, Value};
    use std::collections::HashMap;
    use std::sync::Arc;

    struct MapFetcher(HashMap<String, String>);

    #[async_trait]
    impl Fetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<Map<String, Value>> {
            let body = self.0.get(url).expect("unexpected fetch url");
            Ok(serde_json::from_str(body).unwrap())
        }
    }

    fn fixture_resolver() -> DynResolver {
        let submission = "http://example.org/submission";
        let mut entities = HashMap::new();
        entities.insert(
            submission.to_string(),
            r#"{"foo": ["http://example.org/foo/1", "http://example.org/foo/2"]}"#.to_string(),
        );
        entities.insert(
            "http://example.org/foo/1".to_string(),
            r#"{"policy": "http://example.org/policy/1"}"#.to_string(),
        );
        entities.insert(
            "http://example.org/foo/2".to_string(),
            r#"{"policy": "http://example.org/policy/2-good"}"#.to_string(),
        );
        entities.insert(
            "http://example.org/policy/1".to_string(),
            r#"{"repository": ["a", "b"]}"#.to_string(),
        );
        entities.insert(
            "http://example.org/policy/2-good".to_string(),
            r#"{"repository": ["c", "d"]}"#.to_string(),
        );

        let context = Context::new(submission, &HashMap::new(), Arc::new(MapFetcher(entities)));
        Arc::new(context)
    }

    fn fixture_rule() -> PolicyRule {
        serde_json::from_str(
            r#"{
                "description": "Used for unit testing",
                "policy-id": "${submission.foo.policy}",
                "conditions": [
                    {"endsWith": {"${submission.foo.policy}": "good"}}
                ],
                "repositories": [
                    {"repository-id": "${policy.repository}", "selected": true},
                    {"repository-id": "*"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn condition_filters_to_the_matching_branch() {
        let rule = fixture_rule();
        let resolver = fixture_resolver();
        let policies = rule.expand(&resolver).await.unwrap();

        assert_eq!(policies.len(), 1);
        let repos: Vec<_> = policies[0].repositories.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(repos, vec!["c", "d", "*"]);
    }

    #[tokio::test]
    async fn wildcard_template_is_kept_literally() {
        let rule = fixture_rule();
        let resolver = fixture_resolver();
        let policies = rule.expand(&resolver).await.unwrap();
        assert!(policies[0].repositories.iter().any(|r| r.id == "*"));
    }
}
