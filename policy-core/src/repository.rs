//! A deposit target with an opaque identifier and a `selected` flag, and
//! the repository template that expands into zero or more concrete
//! repositories.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::resolver::DynResolver;
use crate::variable::is_variable;

/// The wildcard repository id meaning "any", used as an escape hatch in
/// `one-of` groups. Never appears in the final output.
pub const WILDCARD: &str = "*";

/// A concrete deposit target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Opaque repository identifier, e.g. a PASS repository URI.
    #[serde(rename = "repository-id")]
    pub id: String,
    /// Whether the depositor selected this repository.
    #[serde(default)]
    pub selected: bool,
}

impl Repository {
    /// A repository reference with `selected` defaulted to `false`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            selected: false,
        }
    }
}

/// A repository template as authored in the rules DSL: `id` may be a
/// literal, a variable, or the wildcard `"*"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoTemplate {
    /// Literal id, variable text, or `"*"`.
    #[serde(rename = "repository-id")]
    pub id: String,
    /// Whether the depositor selected this repository.
    #[serde(default)]
    pub selected: bool,
}

impl RepoTemplate {
    /// Expand this template into one concrete [`Repository`] per resolved
    /// id, or a single repository unchanged if `id` is not a variable.
    pub async fn resolve(&self, resolver: &DynResolver) -> Result<Vec<Repository>> {
        if !is_variable(&self.id) {
            return Ok(vec![Repository {
                id: self.id.clone(),
                selected: self.selected,
            }]);
        }

        let ids = resolver.resolve(&self.id).await?;
        Ok(ids
            .into_iter()
            .map(|id| Repository {
                id,
                selected: self.selected,
            })
            .collect())
    }
}
