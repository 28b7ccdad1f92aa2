//! Flow execution: runs one debate round against the LLM provider.
//!
//! The orchestrator queries each agent on the roster with the enhanced
//! prompt, then runs the validator over every reply, normalizes the
//! validator output, and returns the per-agent validator responses the
//! review step (or the automated regenerate path) feeds into the context
//! manager. Progress is reported through a [`FlowEvent`] channel.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::agents::{normalize_validator_output, AgentError, AgentProfile, AgentResult, PanelRole};
use crate::context::{RawValidationResult, ValidatorPoint, ValidatorResponse};
use crate::llm::{GenerationRequest, LlmProvider, Message};
use crate::round::DEFAULT_MAX_ROUNDS;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the flow orchestrator.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// LLM temperature for panel responses.
    pub temperature: f64,
    /// Maximum tokens per response.
    pub max_tokens: u32,
    /// Model identifier; empty uses the provider's default.
    pub model: String,
    /// Round ceiling mirrored by the round tracker.
    pub max_rounds: u32,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2000,
            model: String::new(),
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

impl FlowConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the LLM temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    /// Sets the max tokens per response.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the round ceiling.
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }
}

// ============================================================================
// Flow Events
// ============================================================================

/// Events emitted while a round executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FlowEvent {
    /// A round has started.
    RoundStarted {
        round: u32,
        agent_count: usize,
        timestamp: DateTime<Utc>,
    },
    /// An agent has replied to the prompt.
    AgentResponded {
        agent_name: String,
        summary: String,
        response_time_ms: u64,
        timestamp: DateTime<Utc>,
    },
    /// The validator finished extracting claims.
    ValidationCompleted {
        round: u32,
        claim_count: usize,
        timestamp: DateTime<Utc>,
    },
    /// The round finished.
    RoundCompleted {
        round: u32,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    /// An error occurred mid-round.
    FlowError {
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl FlowEvent {
    /// Creates a RoundStarted event.
    pub fn round_started(round: u32, agent_count: usize) -> Self {
        Self::RoundStarted {
            round,
            agent_count,
            timestamp: Utc::now(),
        }
    }

    /// Creates an AgentResponded event.
    pub fn agent_responded(
        agent_name: impl Into<String>,
        summary: impl Into<String>,
        response_time_ms: u64,
    ) -> Self {
        Self::AgentResponded {
            agent_name: agent_name.into(),
            summary: summary.into(),
            response_time_ms,
            timestamp: Utc::now(),
        }
    }

    /// Creates a ValidationCompleted event.
    pub fn validation_completed(round: u32, claim_count: usize) -> Self {
        Self::ValidationCompleted {
            round,
            claim_count,
            timestamp: Utc::now(),
        }
    }

    /// Creates a RoundCompleted event.
    pub fn round_completed(round: u32, duration_ms: u64) -> Self {
        Self::RoundCompleted {
            round,
            duration_ms,
            timestamp: Utc::now(),
        }
    }

    /// Creates a FlowError event.
    pub fn flow_error(error: impl Into<String>) -> Self {
        Self::FlowError {
            error: error.into(),
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// Round Run Result
// ============================================================================

/// One agent's reply to the round prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReply {
    pub agent_id: String,
    pub agent_name: String,
    pub content: String,
    pub response_time_ms: u64,
}

/// Everything one round produced.
#[derive(Debug, Clone)]
pub struct RoundRun {
    /// Round number this run executed.
    pub round_number: u32,
    /// Raw panel replies, in roster order.
    pub replies: Vec<AgentReply>,
    /// Per-agent validator output, ready for review.
    pub validator_responses: Vec<ValidatorResponse>,
    /// Flattened raw validation results, for the automated path.
    pub raw_results: Vec<RawValidationResult>,
    /// Wall-clock duration of the round.
    pub duration_ms: u64,
}

// ============================================================================
// Flow Orchestrator
// ============================================================================

/// Executes debate rounds against an LLM provider.
pub struct FlowOrchestrator {
    provider: Arc<dyn LlmProvider>,
    config: FlowConfig,
}

impl FlowOrchestrator {
    /// Creates a new orchestrator.
    pub fn new(provider: Arc<dyn LlmProvider>, config: FlowConfig) -> Self {
        Self { provider, config }
    }

    /// Creates an orchestrator with default configuration.
    pub fn with_defaults(provider: Arc<dyn LlmProvider>) -> Self {
        Self::new(provider, FlowConfig::default())
    }

    /// Creates a new builder.
    pub fn builder() -> FlowOrchestratorBuilder {
        FlowOrchestratorBuilder::new()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Runs one round: every agent replies to the prompt, then the
    /// validator extracts claims from each reply.
    ///
    /// # Errors
    ///
    /// Fails when the roster is empty or an LLM call fails. Validator
    /// *parse* failures never fail the round; normalization substitutes a
    /// placeholder result instead.
    pub async fn run_round(
        &self,
        prompt: &str,
        roster: &[AgentProfile],
        round_number: u32,
        event_tx: &mpsc::Sender<FlowEvent>,
    ) -> AgentResult<RoundRun> {
        if roster.is_empty() {
            let err = AgentError::ConfigurationError("empty agent roster".to_string());
            self.send_event(event_tx, FlowEvent::flow_error(err.to_string()))
                .await;
            return Err(err);
        }

        let round_start = Instant::now();
        self.send_event(event_tx, FlowEvent::round_started(round_number, roster.len()))
            .await;

        let mut replies = Vec::with_capacity(roster.len());
        for agent in roster {
            let reply = self.query_agent(agent, prompt).await?;
            self.send_event(
                event_tx,
                FlowEvent::agent_responded(
                    reply.agent_name.clone(),
                    truncate_summary(&reply.content),
                    reply.response_time_ms,
                ),
            )
            .await;
            replies.push(reply);
        }

        let mut validator_responses = Vec::with_capacity(replies.len());
        let mut raw_results = Vec::new();
        for reply in &replies {
            let raws = self.validate_reply(reply).await?;
            let points: Vec<ValidatorPoint> =
                raws.iter().map(ValidatorPoint::from_raw).collect();

            validator_responses.push(
                ValidatorResponse::new(Uuid::new_v4().to_string(), reply.agent_name.clone())
                    .with_points(points)
                    .with_response_time_ms(reply.response_time_ms),
            );
            raw_results.extend(raws);
        }

        self.send_event(
            event_tx,
            FlowEvent::validation_completed(round_number, raw_results.len()),
        )
        .await;

        let duration_ms = round_start.elapsed().as_millis() as u64;
        self.send_event(event_tx, FlowEvent::round_completed(round_number, duration_ms))
            .await;

        info!(
            round = round_number,
            agents = replies.len(),
            claims = raw_results.len(),
            duration_ms,
            "Round completed"
        );

        Ok(RoundRun {
            round_number,
            replies,
            validator_responses,
            raw_results,
            duration_ms,
        })
    }

    /// Queries one agent with the round prompt.
    async fn query_agent(&self, agent: &AgentProfile, prompt: &str) -> AgentResult<AgentReply> {
        let start = Instant::now();

        let request = GenerationRequest::new(
            self.config.model.clone(),
            vec![
                Message::system(agent.effective_system_prompt()),
                Message::user(prompt),
            ],
        )
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens);

        let response = self.provider.generate(request).await.map_err(AgentError::from)?;

        let content = response
            .first_content()
            .ok_or_else(|| AgentError::ResponseParseError("Empty response from LLM".to_string()))?
            .to_string();

        Ok(AgentReply {
            agent_id: agent.id.clone(),
            agent_name: agent.name.clone(),
            content,
            response_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Runs the validator over one agent's reply.
    async fn validate_reply(&self, reply: &AgentReply) -> AgentResult<Vec<RawValidationResult>> {
        let user_prompt = format!(
            "Panel response from {}:\n\n{}",
            reply.agent_name, reply.content
        );

        let request = GenerationRequest::new(
            self.config.model.clone(),
            vec![
                Message::system(PanelRole::Validator.system_prompt()),
                Message::user(user_prompt),
            ],
        )
        // Validation wants determinism, not creativity.
        .with_temperature(0.0)
        .with_max_tokens(self.config.max_tokens);

        let response = self.provider.generate(request).await.map_err(AgentError::from)?;

        let content = response.first_content().unwrap_or_else(|| {
            warn!(agent = %reply.agent_name, "Validator returned empty response");
            ""
        });

        Ok(normalize_validator_output(content))
    }

    /// Sends an event through the channel; a closed receiver is not an
    /// error, progress reporting is best-effort.
    async fn send_event(&self, event_tx: &mpsc::Sender<FlowEvent>, event: FlowEvent) {
        let _ = event_tx.send(event).await;
    }
}

/// Truncates a reply for event display.
fn truncate_summary(content: &str) -> String {
    const LIMIT: usize = 100;
    if content.chars().count() > LIMIT {
        let truncated: String = content.chars().take(LIMIT).collect();
        format!("{}...", truncated)
    } else {
        content.to_string()
    }
}

// ============================================================================
// Builder Pattern
// ============================================================================

/// Builder for creating a FlowOrchestrator with a fluent API.
pub struct FlowOrchestratorBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    config: FlowConfig,
}

impl FlowOrchestratorBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            provider: None,
            config: FlowConfig::default(),
        }
    }

    /// Sets the LLM provider.
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Sets the LLM temperature.
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.config.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    /// Sets the model identifier.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Sets the round ceiling.
    pub fn max_rounds(mut self, max_rounds: u32) -> Self {
        self.config.max_rounds = max_rounds.max(1);
        self
    }

    /// Builds the orchestrator.
    pub fn build(self) -> AgentResult<FlowOrchestrator> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::ConfigurationError("LLM provider is required".to_string()))?;

        Ok(FlowOrchestrator::new(provider, self.config))
    }
}

impl Default for FlowOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
