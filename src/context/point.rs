//! Data contracts for validator points and responses.
//!
//! A *point* is one atomic claim extracted from an agent's response by the
//! validator. Points are created when a round's validation completes,
//! mutated only by user review (keep/remove toggle, feedback edits), and
//! become immutable once folded into a flow context.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Priority assigned to a validator point during review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointPriority {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for PointPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        write!(f, "{}", name)
    }
}

/// One atomic claim extracted from an agent's response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorPoint {
    /// Unique identifier within the debate thread; the dedup key across
    /// iterations.
    pub id: String,
    /// The claim text.
    pub content: String,
    /// User decision: kept (accepted) or removed (rejected).
    pub is_kept: bool,
    /// Free-text reviewer feedback attached to this point.
    #[serde(default)]
    pub feedback: String,
    /// Validator confidence in the claim, 0-100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    /// Review priority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<PointPriority>,
    /// Free-text category tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ValidatorPoint {
    /// Creates a new point with the given decision.
    pub fn new(id: impl Into<String>, content: impl Into<String>, is_kept: bool) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            is_kept,
            feedback: String::new(),
            confidence: None,
            priority: None,
            category: None,
        }
    }

    /// Attaches reviewer feedback.
    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = feedback.into();
        self
    }

    /// Sets the validator confidence, clamped to 0-100.
    pub fn with_confidence(mut self, confidence: u8) -> Self {
        self.confidence = Some(confidence.min(100));
        self
    }

    /// Sets the review priority.
    pub fn with_priority(mut self, priority: PointPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the category tag.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Maps a raw validation result to a point.
    ///
    /// The id is derived deterministically from the claim text (UUID v5),
    /// so re-validating the same claim yields the same point id and dedups
    /// across iterations. The decision mirrors the validator's verdict.
    pub fn from_raw(raw: &RawValidationResult) -> Self {
        let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, raw.claim.as_bytes()).to_string();
        let content = format!("{}: {} ({}%)", raw.claim, raw.evidence, raw.confidence);

        Self::new(id, content, raw.is_valid)
            .with_feedback(raw.logical_fallacies.join(", "))
            .with_confidence(raw.confidence)
    }
}

/// All points produced by one agent within one round.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorResponse {
    /// Unique identifier for this response.
    pub id: String,
    /// Name of the agent whose output was validated.
    pub agent_name: String,
    /// Extracted points, in extraction order.
    pub points: Vec<ValidatorPoint>,
    /// Overall feedback on the agent's response.
    #[serde(default)]
    pub overall_feedback: String,
    /// Aggregate score the validator gave the response, 0.0-1.0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_score: Option<f64>,
    /// Wall-clock time the agent took to respond.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    /// Expertise tag carried from the agent profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expertise: Option<String>,
}

impl ValidatorResponse {
    /// Creates a new response for the named agent.
    pub fn new(id: impl Into<String>, agent_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            agent_name: agent_name.into(),
            points: Vec::new(),
            overall_feedback: String::new(),
            agent_score: None,
            response_time_ms: None,
            expertise: None,
        }
    }

    /// Sets the extracted points.
    pub fn with_points(mut self, points: Vec<ValidatorPoint>) -> Self {
        self.points = points;
        self
    }

    /// Sets the overall feedback.
    pub fn with_overall_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.overall_feedback = feedback.into();
        self
    }

    /// Sets the aggregate agent score, clamped to 0.0-1.0.
    pub fn with_agent_score(mut self, score: f64) -> Self {
        self.agent_score = Some(score.clamp(0.0, 1.0));
        self
    }

    /// Sets the response time.
    pub fn with_response_time_ms(mut self, ms: u64) -> Self {
        self.response_time_ms = Some(ms);
        self
    }
}

/// Raw validator output: one record per claim, before user review.
///
/// This is the shape the validation step produces. The automated
/// (no-review) path maps these directly into points; the interactive path
/// surfaces them for selection first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawValidationResult {
    /// The atomic claim.
    pub claim: String,
    /// Supporting evidence cited for the claim.
    pub evidence: String,
    /// Validator confidence in the verdict, 0-100.
    pub confidence: u8,
    /// The validator's verdict on the claim.
    pub is_valid: bool,
    /// Logical fallacies detected in the claim's reasoning.
    #[serde(default)]
    pub logical_fallacies: Vec<String>,
}
