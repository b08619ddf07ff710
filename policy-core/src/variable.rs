//! Variable tokens of the form `${a.b.c}`, and the cursor that walks a
//! variable's dotted path one segment at a time.

/// Returns true iff `text` is of the form `${...}`.
#[must_use]
pub fn is_variable(text: &str) -> bool {
    text.starts_with("${") && text.ends_with('}')
}

/// One step of a variable path: `segment` is the last dotted component,
/// `segment_name` is the dotted prefix up to and including `segment`, and
/// `full_name` is the complete path. `segment`/`segment_name` are empty for
/// the root (pre-first-shift) state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    segment: String,
    segment_name: String,
    full_name: String,
}

impl Variable {
    /// Parse `${a.b.c}` into a root `Variable` over the path `a.b.c`.
    /// Returns `None` if `text` is not a variable.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        if !is_variable(text) {
            return None;
        }
        let full_name = text
            .strip_prefix("${")
            .and_then(|s| s.strip_suffix('}'))
            .unwrap_or(text)
            .to_string();
        Some(Self {
            segment: String::new(),
            segment_name: String::new(),
            full_name,
        })
    }

    /// The last dotted component of this step, e.g. `"baz"` for `foo.bar.baz`.
    #[must_use]
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// The dotted prefix through this step, e.g. `"foo.bar"`.
    #[must_use]
    pub fn segment_name(&self) -> &str {
        &self.segment_name
    }

    /// The full path, e.g. `"foo.bar.baz"`.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Advance to the next segment of the path. Returns `None` once the
    /// full path has been reached.
    #[must_use]
    pub fn shift(&self) -> Option<Self> {
        let remaining = self
            .full_name
            .strip_prefix(self.segment_name.as_str())
            .unwrap_or(self.full_name.as_str())
            .trim_start_matches('.');

        if remaining.is_empty() {
            return None;
        }

        if self.segment.is_empty() {
            let first = self.full_name.split('.').next().unwrap_or_default();
            return Some(Self {
                segment: first.to_string(),
                segment_name: first.to_string(),
                full_name: self.full_name.clone(),
            });
        }

        let next_part = remaining.split('.').next().unwrap_or_default();
        let segment_name = format!("{}.{}", self.segment_name, next_part);
        Some(Self {
            segment: next_part.to_string(),
            segment_name,
            full_name: self.full_name.clone(),
        })
    }

    /// The step just before this one (one segment shorter).
    #[must_use]
    pub fn prev(&self) -> Self {
        if self.segment.is_empty() {
            return Self {
                segment: String::new(),
                segment_name: String::new(),
                full_name: self.full_name.clone(),
            };
        }

        let trimmed = self
            .segment_name
            .strip_suffix(self.segment.as_str())
            .unwrap_or(self.segment_name.as_str())
            .trim_end_matches('.');

        let segment = trimmed.split('.').next_back().unwrap_or_default();
        Self {
            segment: segment.to_string(),
            segment_name: trimmed.to_string(),
            full_name: self.full_name.clone(),
        }
    }

    /// Iterate every step of the path in order, starting with the first
    /// segment and ending with the full path.
    pub fn steps(&self) -> impl Iterator<Item = Self> + '_ {
        let mut current = self.shift();
        std::iter::from_fn(move || {
            let next = current.clone()?;
            current = next.shift();
            Some(next)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_variable_recognizes_wrapped_tokens() {
        assert!(is_variable("${foo}"));
        assert!(is_variable("${foo.bar.baz}"));
        assert!(!is_variable("$foo.bar.baz"));
        assert!(!is_variable("${foo.bar.baz}xyz"));
        assert!(!is_variable("$foo"));
    }

    #[test]
    fn parse_rejects_non_variables() {
        assert!(Variable::parse("literal").is_none());
        assert!(Variable::parse("$literal").is_none());
    }

    #[test]
    fn steps_iterate_every_dotted_prefix() {
        let v = Variable::parse("${foo.bar.baz}").unwrap();
        let names: Vec<_> = v.steps().map(|s| s.segment_name().to_string()).collect();
        assert_eq!(names, vec!["foo", "foo.bar", "foo.bar.baz"]);

        let segments: Vec<_> = v.steps().map(|s| s.segment().to_string()).collect();
        assert_eq!(segments, vec!["foo", "bar", "baz"]);

        for s in v.steps() {
            assert_eq!(s.full_name(), "foo.bar.baz");
        }
    }

    #[test]
    fn single_segment_path_has_one_step() {
        let v = Variable::parse("${foo}").unwrap();
        let steps: Vec<_> = v.steps().collect();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].segment(), "foo");
        assert_eq!(steps[0].segment_name(), "foo");
    }

    #[test]
    fn prev_steps_back_one_segment() {
        let v = Variable::parse("${foo.bar.baz}").unwrap();
        let steps: Vec<_> = v.steps().collect();
        let last = &steps[2];
        let middle = last.prev();
        assert_eq!(middle.segment_name(), "foo.bar");
        assert_eq!(middle.segment(), "bar");

        let first = middle.prev();
        assert_eq!(first.segment_name(), "foo");
        assert_eq!(first.segment(), "foo");
    }
}
