//! Handlers for validating submissions and describing the rule catalog.

use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use formguard_core::validation::input::Input;
use formguard_core::validation::messages::MessageCatalog;
use formguard_core::validation::result::ValidationResult;
use formguard_core::validation::rules::{RuleSet, RuleSpec, RULE_NAMES};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /api/v1/validate`.
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    /// Submitted key/value data.
    #[serde(default)]
    pub data: Map<String, Value>,
    /// Field name to a pipe-delimited rule string or a list of rules.
    pub rules: IndexMap<String, RuleSpec>,
    /// Message overrides keyed `"<field>_<rule>"` or `"<rule>"`.
    #[serde(default)]
    pub messages: HashMap<String, String>,
    /// Display names used for `:attribute` / `:other`.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub errors: ValidationResult,
}

/// POST /api/v1/validate
///
/// Parse the rule set, evaluate it against `data` and return every failure.
/// Malformed or unknown rules are a 400; failing data is a 200 with
/// `valid: false`.
pub async fn validate(
    State(state): State<AppState>,
    payload: Result<Json<ValidateRequest>, JsonRejection>,
) -> AppResult<Json<DataResponse<ValidateResponse>>> {
    let Json(request) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let rules = RuleSet::from_specs(&request.rules)?;
    let input = Input::new(request.data);
    let catalog = MessageCatalog {
        messages: request.messages,
        attributes: request.attributes,
    };

    let result = if catalog.is_empty() {
        state.validator.validate(&input, &rules).await
    } else {
        state.validator.validate_with(&input, &rules, &catalog).await
    };

    tracing::info!(
        fields = rules.len(),
        valid = result.is_valid(),
        messages = result.message_count(),
        "Validated submission"
    );

    Ok(Json(DataResponse {
        data: ValidateResponse {
            valid: result.is_valid(),
            errors: result,
        },
    }))
}

/// GET /api/v1/validation/rules
///
/// List every rule name the engine accepts.
pub async fn list_rules() -> Json<DataResponse<&'static [&'static str]>> {
    Json(DataResponse { data: RULE_NAMES })
}
