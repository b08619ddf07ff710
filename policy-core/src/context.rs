//! The resolution context: a per-submission memoized store that resolves
//! variable paths to string lists by walking the JSON-LD graph via a
//! [`Fetcher`] collaborator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{PolicyError, Result};
use crate::fetcher::Fetcher;
use crate::resolver::{DynResolver, Pinned, VariableResolver};
use crate::value::{AnnotatedObject, ResolvedValue};
use crate::variable::Variable;

/// The variable name seeded to the submission URI literal.
pub const SUBMISSION_VARIABLE: &str = "submission";
/// The variable name seeded to the request headers, as an annotated object.
pub const HEADER_VARIABLE: &str = "header";

struct Inner {
    submission_uri: String,
    fetcher: Arc<dyn Fetcher>,
    memo: Mutex<HashMap<String, ResolvedValue>>,
}

/// A per-submission, per-request resolution context. Cheap to clone (an
/// `Arc` around shared, mutex-guarded memo state) so that [`Context::pin`]
/// can hand out a derived resolver that still shares this context's cache.
#[derive(Clone)]
pub struct Context(Arc<Inner>);

impl Context {
    /// Build a context for `submission_uri`, seeding `${submission}` and
    /// `${header}` immediately.
    #[must_use]
    pub fn new(
        submission_uri: impl Into<String>,
        headers: &HashMap<String, Vec<String>>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        let submission_uri = submission_uri.into();
        let memo = HashMap::new();
        let this = Self(Arc::new(Inner {
            submission_uri: submission_uri.clone(),
            fetcher,
            memo: Mutex::new(memo),
        }));

        this.set(SUBMISSION_VARIABLE, ResolvedValue::Literal(submission_uri));

        let mut header_object = Map::new();
        for (name, values) in headers {
            let value = match values.as_slice() {
                [single] => Value::String(single.clone()),
                many => Value::Array(many.iter().cloned().map(Value::String).collect()),
            };
            header_object.insert(name.clone(), value);
        }
        this.set(
            HEADER_VARIABLE,
            ResolvedValue::Object(AnnotatedObject {
                src: String::new(),
                object: header_object,
            }),
        );

        this
    }

    /// Bind `var_text` to a fixed `value` in a derived resolver that shares
    /// this context's memo for every other query.
    #[must_use]
    pub fn pin(&self, var_text: impl Into<String>, value: impl Into<String>) -> DynResolver {
        let base: DynResolver = Arc::new(self.clone());
        Pinned::new(base, var_text, value)
    }

    fn get(&self, key: &str) -> Option<ResolvedValue> {
        self.0.memo.lock().unwrap().get(key).cloned()
    }

    fn has(&self, key: &str) -> bool {
        self.0.memo.lock().unwrap().contains_key(key)
    }

    fn set(&self, key: &str, value: ResolvedValue) {
        self.0.memo.lock().unwrap().insert(key.to_string(), value);
    }

    /// Resolve a single step of a variable path given its now-resolved
    /// predecessor.
    fn resolve_part<'a>(
        &'a self,
        part: &'a Variable,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if self.has(part.segment_name()) {
                return Ok(());
            }

            let prev = part.prev();
            if prev.segment_name().is_empty() {
                // ${submission} / ${header} are seeded directly; an unknown
                // root name is left unset, resolving to empty downstream.
                return Ok(());
            }

            match self.get(prev.segment_name()) {
                Some(ResolvedValue::Object(object)) => self.extract_value(part, &object),
                Some(ResolvedValue::Objects(objects)) => self.extract_values(part, &objects),
                Some(ResolvedValue::Literal(s)) => {
                    self.resolve_to_object(&prev, &s).await?;
                    self.resolve_part(part).await
                }
                Some(ResolvedValue::Strings(list)) => {
                    self.resolve_to_objects(&prev, &list).await?;
                    self.resolve_part(part).await
                }
                Some(ResolvedValue::Empty) | None => {
                    self.set(part.segment_name(), ResolvedValue::Empty);
                    self.set(part.segment(), ResolvedValue::Empty);
                    Ok(())
                }
            }
        })
    }

    /// Set `${foo.bar}` to `foo[bar]`, and the shortcut `${bar}` alongside it.
    fn extract_value(&self, part: &Variable, resolved: &AnnotatedObject) -> Result<()> {
        let value = match resolved.object.get(part.segment()) {
            None => ResolvedValue::Empty,
            Some(value) => json_value_to_resolved(part, value)?,
        };
        self.set(part.segment_name(), value.clone());
        self.set(part.segment(), value);
        Ok(())
    }

    /// Append `foo[bar]` to `${foo.bar}` for each `foo` in a list of
    /// annotated objects.
    fn extract_values(&self, part: &Variable, list: &[AnnotatedObject]) -> Result<()> {
        let mut values = Vec::new();
        for object in list {
            match object.object.get(part.segment()) {
                None => {}
                Some(Value::String(s)) => values.push(s.clone()),
                Some(Value::Array(items)) => {
                    for item in items {
                        match item {
                            Value::String(s) => values.push(s.clone()),
                            other => {
                                return Err(PolicyError::resolution(
                                    part.segment_name(),
                                    format!("{} is a list of {:?}, not strings", part.segment_name(), other),
                                ));
                            }
                        }
                    }
                }
                Some(other) => {
                    return Err(PolicyError::resolution(
                        part.segment_name(),
                        format!("{} is a {:?}, not a string", part.segment_name(), other),
                    ));
                }
            }
        }

        let value = if values.is_empty() {
            ResolvedValue::Empty
        } else {
            ResolvedValue::Strings(values)
        };
        self.set(part.segment_name(), value.clone());
        self.set(part.segment(), value);
        Ok(())
    }

    /// Resolve a string to an object: fetch it if it's an `http` URI,
    /// otherwise parse it as a JSON blob.
    async fn resolve_to_object(&self, v: &Variable, s: &str) -> Result<()> {
        let object = self.dereference(s).await?;
        let resolved = AnnotatedObject {
            src: s.to_string(),
            object,
        };
        self.set(v.segment_name(), ResolvedValue::Object(resolved.clone()));
        self.set(v.segment(), ResolvedValue::Object(resolved));
        Ok(())
    }

    /// Resolve each of a list of strings to an object.
    async fn resolve_to_objects(&self, v: &Variable, vals: &[String]) -> Result<()> {
        let mut objects = Vec::with_capacity(vals.len());
        for s in vals {
            let object = self.dereference(s).await?;
            objects.push(AnnotatedObject {
                src: s.clone(),
                object,
            });
        }
        let value = ResolvedValue::Objects(objects);
        self.set(v.segment_name(), value.clone());
        self.set(v.segment(), value);
        Ok(())
    }

    async fn dereference(&self, s: &str) -> Result<Map<String, Value>> {
        if s.starts_with("http") {
            self.0.fetcher.fetch(s).await
        } else {
            serde_json::from_str::<Map<String, Value>>(s)
                .map_err(|e| PolicyError::resolution(s, format!("malformed JSON blob: {e}")))
        }
    }
}

/// Coerce a raw JSON value pulled from an entity's property into the
/// [`ResolvedValue`] tagged variant it represents, or error on a type
/// mismatch.
fn json_value_to_resolved(part: &Variable, value: &Value) -> Result<ResolvedValue> {
    match value {
        Value::String(s) => Ok(ResolvedValue::Literal(s.clone())),
        Value::Null => Ok(ResolvedValue::Empty),
        Value::Array(items) => {
            let mut strings = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => strings.push(s.clone()),
                    other => {
                        return Err(PolicyError::resolution(
                            part.segment_name(),
                            format!("expecting list items to be strings, instead got {other:?}"),
                        ));
                    }
                }
            }
            if strings.is_empty() {
                Ok(ResolvedValue::Empty)
            } else {
                Ok(ResolvedValue::Strings(strings))
            }
        }
        other => Err(PolicyError::resolution(
            part.segment_name(),
            format!("{} is {:?}, cannot parse into a string or list of strings", part.segment_name(), other),
        )),
    }
}

#[async_trait]
impl VariableResolver for Context {
    async fn resolve(&self, var_text: &str) -> Result<Vec<String>> {
        let Some(variable) = Variable::parse(var_text) else {
            return Ok(vec![var_text.to_string()]);
        };

        for step in variable.steps() {
            self.resolve_part(&step).await?;
        }

        let resolved = self.get(variable.full_name()).unwrap_or(ResolvedValue::Empty);
        Ok(resolved.into_string_list())
    }
}
