//! Axum route handlers for the Proposal API.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::errors::AppError;
use crate::proposal::generator::generate_proposal;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalRequest {
    pub job_title: String,
    pub job_description: String,
    #[serde(default)]
    pub include_portfolio: bool,
}

/// `{success, proposal}` on success, `{success, error}` on failure.
#[derive(Debug, Serialize, PartialEq)]
pub struct ProposalResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProposalResult {
    pub fn generated(proposal: String) -> Self {
        Self {
            success: true,
            proposal: Some(proposal),
            error: None,
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            success: false,
            proposal: None,
            error: Some(error),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/proposal/generate
///
/// Generation failures are reported in the body with `success: false`;
/// only a malformed request body produces an error status.
pub async fn handle_generate_proposal(
    State(state): State<AppState>,
    payload: Result<Json<ProposalRequest>, JsonRejection>,
) -> Result<Json<ProposalResult>, AppError> {
    let Json(request) = payload?;

    let result = match generate_proposal(
        state.generator.as_ref(),
        &request.job_title,
        &request.job_description,
        request.include_portfolio,
    )
    .await
    {
        Ok(proposal) => ProposalResult::generated(proposal),
        Err(e) => {
            error!("Proposal generation failed: {e}");
            ProposalResult::failed(e.to_string())
        }
    };

    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_deserializes_camel_case() {
        let request: ProposalRequest = serde_json::from_value(json!({
            "jobTitle": "Logo Design",
            "jobDescription": "Need a logo",
            "includePortfolio": true
        }))
        .unwrap();
        assert_eq!(request.job_title, "Logo Design");
        assert_eq!(request.job_description, "Need a logo");
        assert!(request.include_portfolio);
    }

    #[test]
    fn test_include_portfolio_defaults_to_false() {
        let request: ProposalRequest = serde_json::from_value(json!({
            "jobTitle": "Logo Design",
            "jobDescription": "Need a logo"
        }))
        .unwrap();
        assert!(!request.include_portfolio);
    }

    #[test]
    fn test_success_result_omits_error_key() {
        let value = serde_json::to_value(ProposalResult::generated("Hi".to_string())).unwrap();
        assert_eq!(value, json!({"success": true, "proposal": "Hi"}));
    }

    #[test]
    fn test_failure_result_omits_proposal_key() {
        let value = serde_json::to_value(ProposalResult::failed("boom".to_string())).unwrap();
        assert_eq!(value, json!({"success": false, "error": "boom"}));
    }
}
