//! `GET|POST /policies`: resolve the deposit policies applicable to a
//! submission.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::{Form, Json};
use policy_core::resolver::DynResolver;
use policy_core::Context;
use serde::{Deserialize, Serialize};

use super::headers_to_map;
use super::router::AppState;
use crate::{Error, Result};

#[derive(Debug, Deserialize)]
pub struct SubmissionQuery {
    submission: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmissionForm {
    submission: String,
}

/// One policy in the `/policies` response: the public-facing policy id and
/// its originating type.
#[derive(Debug, Serialize)]
struct PolicyResult {
    id: String,
    #[serde(rename = "type")]
    policy_type: String,
}

pub async fn policies_get(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SubmissionQuery>,
) -> Result<impl IntoResponse> {
    find_policies(&state, &headers, &query.submission).await
}

pub async fn policies_post(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<SubmissionForm>,
) -> Result<impl IntoResponse> {
    find_policies(&state, &headers, &form.submission).await
}

async fn find_policies(
    state: &AppState,
    headers: &HeaderMap,
    submission: &str,
) -> Result<impl IntoResponse> {
    if submission.is_empty() {
        return Err(Error::BadRequest("no submission value provided".into()));
    }

    let context = Context::new(submission, &headers_to_map(headers), state.fetcher.clone());
    let resolver: DynResolver = Arc::new(context);
    let policies = state.rules.resolve(&resolver).await?;

    let results: Vec<PolicyResult> = policies
        .into_iter()
        .map(|policy| PolicyResult {
            id: state.baseuris.private_with_public(&policy.id).0,
            policy_type: policy.policy_type,
        })
        .collect();

    Ok(Json(results))
}
