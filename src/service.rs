//! # Generation Service
//!
//! JSON request/response layer for the server-bound entry point. Requests
//! always run under the bounded profile, so a slow seed cannot hold a request
//! past its deadline.

use crate::generation::{GenerationOutcome, GenerationParameters, LevelGenerator};
use crate::{config, PushvaultError, PushvaultResult};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use std::path::Path;
use std::time::Duration;

/// A generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(flatten)]
    pub parameters: GenerationParameters,
    /// Overrides the default server deadline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
}

impl GenerationRequest {
    pub fn new(parameters: GenerationParameters) -> Self {
        Self {
            parameters,
            deadline_ms: None,
        }
    }

    /// Loads a request from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> PushvaultResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Deadline of the request.
    pub fn deadline(&self) -> Duration {
        self.deadline_ms
            .map(Duration::from_millis)
            .unwrap_or(config::SERVER_DEADLINE)
    }

    fn generator(&self) -> LevelGenerator {
        LevelGenerator::bounded(self.deadline())
    }
}

/// Why no level was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoLevelReason {
    Exhausted,
    TimedOut,
}

/// Answer to a [`GenerationRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerationResponse {
    Generated {
        rows: Vec<String>,
        difficulty: u32,
        attempts: u32,
    },
    NoLevel {
        reason: NoLevelReason,
        attempts: u32,
    },
    /// The request broke the parameter contract
    Rejected { message: String },
}

impl From<GenerationOutcome> for GenerationResponse {
    fn from(outcome: GenerationOutcome) -> Self {
        match outcome {
            GenerationOutcome::Succeeded { result, report } => GenerationResponse::Generated {
                rows: result.rows,
                difficulty: result.difficulty,
                attempts: report.attempts,
            },
            GenerationOutcome::Exhausted { report } => GenerationResponse::NoLevel {
                reason: NoLevelReason::Exhausted,
                attempts: report.attempts,
            },
            GenerationOutcome::TimedOut { report } => GenerationResponse::NoLevel {
                reason: NoLevelReason::TimedOut,
                attempts: report.attempts,
            },
        }
    }
}

/// Maps a run result onto a response; contract violations become
/// `Rejected`, any other error propagates.
fn respond(result: PushvaultResult<GenerationOutcome>) -> PushvaultResult<GenerationResponse> {
    match result {
        Ok(outcome) => Ok(outcome.into()),
        Err(PushvaultError::InvalidParameters(message)) => {
            warn!("Rejected generation request: {message}");
            Ok(GenerationResponse::Rejected { message })
        }
        Err(error) => Err(error),
    }
}

/// Serves a request synchronously.
pub fn handle_request(request: &GenerationRequest) -> PushvaultResult<GenerationResponse> {
    info!(
        "Generation request {}x{} with {} boxes, seed {}",
        request.parameters.width,
        request.parameters.height,
        request.parameters.box_count,
        request.parameters.seed
    );
    respond(request.generator().generate_level(&request.parameters))
}

/// Serves a request, yielding to the runtime between slices.
pub async fn handle_request_async(
    request: &GenerationRequest,
) -> PushvaultResult<GenerationResponse> {
    respond(request.generator().generate_async(&request.parameters).await)
}

/// JSON in, JSON out.
///
/// # Errors
///
/// Malformed JSON is an error. Well-formed JSON that breaks the parameter
/// contract yields a `rejected` response instead, including values a field
/// cannot hold such as a negative width.
///
/// # Examples
///
/// ```
/// let request = r#"{"width": 2, "height": 9, "boxes": 1, "seed": 1}"#;
/// let reply = pushvault::service::generate_json(request).unwrap();
/// assert!(reply.contains(r#""status":"rejected""#));
/// ```
pub fn generate_json(request_json: &str) -> PushvaultResult<String> {
    let response = match serde_json::from_str::<GenerationRequest>(request_json) {
        Ok(request) => handle_request(&request)?,
        Err(error) if error.classify() == Category::Data => {
            warn!("Rejected generation request: {error}");
            GenerationResponse::Rejected {
                message: error.to_string(),
            }
        }
        Err(error) => return Err(error.into()),
    };
    Ok(serde_json::to_string(&response)?)
}
