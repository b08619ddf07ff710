//! The `VariableResolver` abstraction shared by the condition evaluator,
//! the policy/repository template expander, and [`crate::context::Context`]
//! itself, plus the `Pin` operator used to freeze a chosen policy id while
//! resolving its sibling expressions.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Resolves variable text (`${a.b.c}` or a literal) to a list of strings.
#[async_trait]
pub trait VariableResolver: Send + Sync {
    /// Resolve `var_text`. Non-variable text resolves to itself.
    async fn resolve(&self, var_text: &str) -> Result<Vec<String>>;
}

/// A boxed, reference-counted resolver, used wherever ownership must cross
/// an `async fn` boundary or be captured by a derived (pinned) resolver.
pub type DynResolver = Arc<dyn VariableResolver>;

/// Resolves every string to itself — used by the condition evaluator when
/// no resolver is supplied.
pub struct PassThroughResolver;

#[async_trait]
impl VariableResolver for PassThroughResolver {
    async fn resolve(&self, var_text: &str) -> Result<Vec<String>> {
        Ok(vec![var_text.to_string()])
    }
}

/// Returns a shared pass-through resolver.
#[must_use]
pub fn pass_through() -> DynResolver {
    Arc::new(PassThroughResolver)
}

/// A resolver that returns a fixed value for one specific variable text,
/// delegating every other query to `base`.
pub struct Pinned {
    base: DynResolver,
    var_text: String,
    value: String,
}

impl Pinned {
    /// Wrap `base`, binding `var_text` to `value`.
    pub fn new(base: DynResolver, var_text: impl Into<String>, value: impl Into<String>) -> DynResolver {
        Arc::new(Self {
            base,
            var_text: var_text.into(),
            value: value.into(),
        })
    }
}

#[async_trait]
impl VariableResolver for Pinned {
    async fn resolve(&self, var_text: &str) -> Result<Vec<String>> {
        if var_text == self.var_text {
            return Ok(vec![self.value.clone()]);
        }
        self.base.resolve(var_text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl VariableResolver for Echo {
        async fn resolve(&self, var_text: &str) -> Result<Vec<String>> {
            Ok(vec![format!("echo:{var_text}")])
        }
    }

    #[tokio::test]
    async fn pin_returns_fixed_value_for_pinned_variable() {
        let base: DynResolver = Arc::new(Echo);
        let pinned = Pinned::new(base, "${v}", "x");

        assert_eq!(pinned.resolve("${v}").await.unwrap(), vec!["x".to_string()]);
    }

    #[tokio::test]
    async fn pin_delegates_other_queries_to_base() {
        let base: DynResolver = Arc::new(Echo);
        let pinned = Pinned::new(base, "${v}", "x");

        assert_eq!(pinned.resolve("${w}").await.unwrap(), vec!["echo:${w}".to_string()]);
    }
}
