//! `GET|POST /repositories`: resolve the canonical repository requirements
//! for a submission, reconciled against the repositories its own
//! `effectivePolicies` already name.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::{Form, Json};
use policy_core::error::PolicyError;
use policy_core::resolver::DynResolver;
use policy_core::{requirements, Context, Policy, Repository};
use serde::Deserialize;

use super::headers_to_map;
use super::router::AppState;
use crate::{Error, Result};

/// Error message used when a `submission` query/form value is present but
/// empty.
const EMPTY_SUBMISSION: &str = "no submission value provided";

#[derive(Debug, Deserialize)]
pub struct SubmissionQuery {
    submission: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmissionForm {
    submission: String,
}

#[derive(Debug, Deserialize)]
struct SubmissionEffectivePolicies {
    #[serde(rename = "effectivePolicies", default)]
    effective_policies: Vec<String>,
}

pub async fn repositories_get(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SubmissionQuery>,
) -> Result<impl IntoResponse> {
    find_repositories(&state, &headers, &query.submission).await
}

pub async fn repositories_post(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<SubmissionForm>,
) -> Result<impl IntoResponse> {
    find_repositories(&state, &headers, &form.submission).await
}

async fn find_repositories(
    state: &AppState,
    headers: &HeaderMap,
    public_submission: &str,
) -> Result<impl IntoResponse> {
    if public_submission.is_empty() {
        return Err(Error::BadRequest(EMPTY_SUBMISSION.into()));
    }

    let (private_submission, ok) = state.baseuris.public_with_private(public_submission);
    if !ok {
        return Err(Error::Policy(PolicyError::External(format!(
            "submission URI {public_submission} does not have the expected PASS baseURI"
        ))));
    }

    let context = Context::new(private_submission.as_str(), &headers_to_map(headers), state.fetcher.clone());
    let resolver: DynResolver = Arc::new(context);
    let policies = state.rules.resolve(&resolver).await?;

    let common = reconcile_repositories(state, &private_submission, &policies).await?;

    let result = requirements::analyze(&policies)
        .translate_uris(|uri| state.baseuris.public_with_private(uri))
        .keep(&common)
        .translate_uris(|uri| state.baseuris.private_with_public(uri));

    Ok(Json(result))
}

/// Fetch `submission`'s `effectivePolicies`, match each against the
/// resolved `policies`, and collect the (private, non-wildcard) repository
/// ids named by those matched policies' `Repositories`.
async fn reconcile_repositories(
    state: &AppState,
    submission: &str,
    policies: &[Policy],
) -> Result<Vec<Repository>> {
    let entity = state.fetcher.fetch(submission).await?;
    let effective: SubmissionEffectivePolicies = serde_json::from_value(serde_json::Value::Object(entity))
        .map_err(|e| Error::Policy(PolicyError::External(format!("malformed effectivePolicies: {e}"))))?;

    let known_policies: std::collections::HashMap<String, &Policy> = policies
        .iter()
        .map(|p| (state.baseuris.public_with_private(&p.id).0, p))
        .collect();

    let mut common = Vec::new();
    let mut seen = HashSet::new();

    for effective_policy in &effective.effective_policies {
        let (effective_policy_uri, ok) = state.baseuris.public_with_private(effective_policy);
        if !ok {
            return Err(Error::Policy(PolicyError::External(format!(
                "policy URI {effective_policy} does not start with a public or private PASS baseuri"
            ))));
        }

        let matched = known_policies.get(&effective_policy_uri).ok_or_else(|| {
            Error::Policy(PolicyError::External(format!(
                "effective policy {effective_policy_uri} is not in the list of computed policies"
            )))
        })?;

        for repo in &matched.repositories {
            if repo.id == policy_core::repository::WILDCARD {
                continue;
            }
            let (repo_id, _) = state.baseuris.public_with_private(&repo.id);
            if seen.insert(repo_id.clone()) {
                common.push(Repository::new(repo_id));
            }
        }
    }

    Ok(common)
}
