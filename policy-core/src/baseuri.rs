//! The URI rewriter collaborator: translates a PASS/Fedora URI
//! between its public and private base-URI forms, including
//! relative-path-joining for strings that don't start with `http` at all.

/// Public and private base URIs for a PASS/Fedora repository. Implements
/// both directions of translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUris {
    /// The externally-visible base URI (what clients see).
    pub public: String,
    /// The internal base URI (what the service talks to).
    pub private: String,
}

impl BaseUris {
    /// Construct from a public/private pair.
    #[must_use]
    pub fn new(public: impl Into<String>, private: impl Into<String>) -> Self {
        Self {
            public: public.into(),
            private: private.into(),
        }
    }

    /// Replace this URI's public base with the private one, for talking to
    /// the repository over a private network. Returns `(result, did_replace)`.
    #[must_use]
    pub fn public_with_private(&self, input: &str) -> (String, bool) {
        Self::do_replace(input, &self.public, &self.private)
    }

    /// The inverse of [`Self::public_with_private`]: replace the private
    /// base with the public one, for responses sent back to clients.
    #[must_use]
    pub fn private_with_public(&self, input: &str) -> (String, bool) {
        Self::do_replace(input, &self.private, &self.public)
    }

    fn do_replace(input: &str, a: &str, b: &str) -> (String, bool) {
        if !input.starts_with("http") {
            let joined = format!("{}/{}", b.trim_matches('/'), input.trim_start_matches('/'));
            return (joined, true);
        }

        if !input.starts_with(a) {
            return (input.to_string(), input.starts_with(b));
        }

        let suffix = input[a.len()..].trim_start_matches('/');
        (format!("{}/{}", b.trim_matches('/'), suffix), true)
    }
}
