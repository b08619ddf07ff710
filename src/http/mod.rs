//! The HTTP surface: `/policies`, `/repositories`, and `/health`.

mod health;
mod policies;
mod repositories;
mod router;

pub use router::{create_router, AppState};

use std::collections::HashMap;

use axum::http::HeaderMap;

/// Flatten an axum [`HeaderMap`] into the `HashMap<String, Vec<String>>`
/// shape `policy_core::Context::new` expects, preserving repeated headers.
fn headers_to_map(headers: &HeaderMap) -> HashMap<String, Vec<String>> {
    let mut out: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            out.entry(name.as_str().to_string()).or_default().push(value.to_string());
        }
    }
    out
}
