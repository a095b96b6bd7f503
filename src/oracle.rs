//! External schedule oracle: an OpenAI-compatible chat-completions endpoint asked to
//! propose a knockout schedule with as few rounds as possible.

use crate::logic::Schedule;
use crate::models::Team;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ORACLE_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_ORACLE_MODEL: &str = "gpt-3.5-turbo";

const INSTRUCTION: &str = "You schedule single-elimination tournaments for two-player teams. \
Given the JSON list of teams, propose the first round so the whole tournament needs as few \
rounds as possible. A team without an opponent gets a bye (teamB null). Respond with JSON only: \
{\"strategy\": \"knockout\", \"matches\": [{\"round\": 1, \"teamA\": id, \"teamB\": id or null}]}";

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("oracle answered with status {status}")]
    Status { status: u16, body: String },
    #[error("oracle did not answer within {0:?}")]
    Timeout(Duration),
    #[error("oracle response is not a schedule: {0}")]
    Parse(String),
    #[error("oracle schedule rejected: {0}")]
    Malformed(String),
}

/// Anything that can propose a schedule for a team list.
#[async_trait]
pub trait ScheduleOracle: Send + Sync {
    async fn propose_schedule(&self, teams: &[Team]) -> Result<Schedule, OracleError>;
}

#[derive(Clone, Debug)]
pub struct OracleConfig {
    pub url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// HTTP client for the chat-completions oracle.
#[derive(Clone, Debug)]
pub struct ChatCompletionOracle {
    client: Client,
    config: OracleConfig,
}

impl ChatCompletionOracle {
    /// Fails when the HTTP client cannot be built (e.g. no TLS backend available).
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ScheduleOracle for ChatCompletionOracle {
    async fn propose_schedule(&self, teams: &[Team]) -> Result<Schedule, OracleError> {
        let team_list =
            serde_json::to_string(teams).map_err(|e| OracleError::Parse(e.to_string()))?;
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: Some(INSTRUCTION.into()),
                },
                ChatMessage {
                    role: "user".into(),
                    content: Some(team_list),
                },
            ],
            temperature: 0.2,
        };

        debug!("Requesting schedule from {}", self.config.url);
        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout(self.config.timeout)
                } else {
                    OracleError::Transport(e)
                }
            })?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(OracleError::Status {
                status: status.as_u16(),
                body,
            });
        }
        parse_completion(&body)
    }
}

/// Extract the schedule from a chat-completions response body.
///
/// The message content must be the schedule JSON, optionally inside a Markdown code fence.
pub fn parse_completion(body: &str) -> Result<Schedule, OracleError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| OracleError::Parse(e.to_string()))?;
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| OracleError::Parse("no choices in response".into()))?;
    serde_json::from_str(strip_code_fence(&content))
        .map_err(|e| OracleError::Parse(e.to_string()))
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
