//! Carbon coach backed by a hosted language model.
//!
//! Both entry points always produce a usable answer: when no credential is
//! configured, or the service fails or replies off-schema, a fixed offline
//! payload is returned together with a warning.

mod client;
mod profile;
mod report;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use client::{CompletionOptions, complete};

pub use profile::{
    AirTravel, ClothingHabit, CommuteMethod, DietType, EnergySource, FoodSourcing, HomeType,
    LifestyleProfile, MAX_WEEKLY_DISTANCE, TechReplacement,
};
pub use report::{
    ACTION_PLAN_WEEKS, Breakdown, EcoReport, IMPROVEMENT_COUNT, Improvement, WeeklyAction,
    decode_report, fallback_report,
};

pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Most recent conversation turns sent with each chat request.
pub const CHAT_HISTORY_WINDOW: usize = 20;

pub const GREETING: &str = "नमस्ते! Namaste! Hello! I am your Eco-FinTech Assistant. I can speak any Indian language. How can I help you reduce your carbon footprint today?";

pub const OFFLINE_REPLY: &str = "मुझे क्षमा करें (I apologize), the AI API key is missing. I am currently running in offline mock mode. कृपया बाद में पुनः प्रयास करें।";

const CHAT_SYSTEM_PROMPT: &str = "You are a highly professional Eco-FinTech AI assistant. You must converse naturally in ANY Indian language the user prefers (e.g., Hindi, Tamil, Telugu, Bengali, Marathi, etc.) as well as English. Keep answers concise, actionable, and focused on sustainability, carbon footprint reduction, and eco-friendly habits.";

const REPORT_OPTIONS: CompletionOptions = CompletionOptions {
    temperature: 0.3,
    max_tokens: None,
    json_mode: true,
};

const CHAT_OPTIONS: CompletionOptions = CompletionOptions {
    temperature: 0.7,
    max_tokens: Some(300),
    json_mode: false,
};

#[derive(Debug, Error)]
pub enum CoachError {
    #[error("API key not configured")]
    MissingKey,
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("failed to parse response: {0}")]
    Parse(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("response does not match report schema: {0}")]
    Schema(String),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Live,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOutcome {
    pub report: EcoReport,
    pub source: ResponseSource,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatOutcome {
    pub reply: String,
    pub source: ResponseSource,
    pub warning: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CoachConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Coach {
    config: CoachConfig,
    http: reqwest::Client,
}

impl Coach {
    pub fn new(config: CoachConfig) -> Result<Self, CoachError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    pub fn is_live(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub async fn generate_report(&self, profile: &LifestyleProfile) -> ReportOutcome {
        match self.try_generate_report(profile).await {
            Ok((report, warnings)) => ReportOutcome {
                report,
                source: ResponseSource::Live,
                warnings,
            },
            Err(CoachError::MissingKey) => ReportOutcome {
                report: fallback_report(),
                source: ResponseSource::Fallback,
                warnings: vec!["AI API key is missing; showing sample report".to_string()],
            },
            Err(err) => {
                warn!(error = %err, "report generation failed, using fallback report");
                ReportOutcome {
                    report: fallback_report(),
                    source: ResponseSource::Fallback,
                    warnings: vec![format!("API Error: {err}. Using fallback data.")],
                }
            }
        }
    }

    async fn try_generate_report(
        &self,
        profile: &LifestyleProfile,
    ) -> Result<(EcoReport, Vec<String>), CoachError> {
        let api_key = self.config.api_key.as_deref().ok_or(CoachError::MissingKey)?;
        let messages = [ChatMessage::new(Role::User, build_report_prompt(profile))];
        let content = complete(
            &self.http,
            &self.config.endpoint,
            api_key,
            &self.config.model,
            &messages,
            REPORT_OPTIONS,
        )
        .await?;
        debug!(bytes = content.len(), "received report completion");
        decode_report(&content)
    }

    /// Answers the last user turn of `history`. The system prompt is added
    /// here; callers keep only user and assistant turns.
    pub async fn chat(&self, history: &[ChatMessage]) -> ChatOutcome {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return ChatOutcome {
                reply: OFFLINE_REPLY.to_string(),
                source: ResponseSource::Fallback,
                warning: Some(CoachError::MissingKey.to_string()),
            };
        };

        let turns: Vec<&ChatMessage> = history
            .iter()
            .filter(|m| m.role != Role::System)
            .collect();
        let start = turns.len().saturating_sub(CHAT_HISTORY_WINDOW);
        let mut messages = Vec::with_capacity(turns.len() - start + 1);
        messages.push(ChatMessage::new(Role::System, CHAT_SYSTEM_PROMPT));
        messages.extend(turns[start..].iter().map(|m| (*m).clone()));

        match complete(
            &self.http,
            &self.config.endpoint,
            api_key,
            &self.config.model,
            &messages,
            CHAT_OPTIONS,
        )
        .await
        {
            Ok(reply) => ChatOutcome {
                reply,
                source: ResponseSource::Live,
                warning: None,
            },
            Err(err) => {
                warn!(error = %err, "chat completion failed");
                ChatOutcome {
                    reply: format!("System Offline: Unable to process the request due to {err}."),
                    source: ResponseSource::Fallback,
                    warning: Some(err.to_string()),
                }
            }
        }
    }
}

fn build_report_prompt(profile: &LifestyleProfile) -> String {
    format!(
        r#"You are an expert environmental data scientist and sustainability coach.
Analyze the following user lifestyle data and provide a highly personalized carbon footprint analysis.

USER DATA:
- Transport: {transport}
- Diet: {diet}
- Energy: {energy}
- Shopping: {shopping}

Return ONLY a valid JSON object with the exact following structure, no markdown, no extra text:
{{
    "total_carbon_tons": <float, estimated annual CO2 tons>,
    "comparison_to_average": "<string, e.g., '20% below average'>",
    "breakdown": {{
        "Transport": <int, percentage>,
        "Diet": <int, percentage>,
        "Energy": <int, percentage>,
        "Shopping": <int, percentage>
    }},
    "improvements": [
        {{"title": "<string>", "impact": "<string, estimated CO2 saved>", "description": "<string>"}}
    ],
    "action_plan_30_days": [
        {{"week": "Week 1", "focus": "<string>", "action": "<string>"}},
        {{"week": "Week 2", "focus": "<string>", "action": "<string>"}},
        {{"week": "Week 3", "focus": "<string>", "action": "<string>"}},
        {{"week": "Week 4", "focus": "<string>", "action": "<string>"}}
    ]
}}
"improvements" must contain exactly {improvements} items."#,
        transport = profile.transport_line(),
        diet = profile.diet_line(),
        energy = profile.energy_line(),
        shopping = profile.shopping_line(),
        improvements = IMPROVEMENT_COUNT,
    )
}
