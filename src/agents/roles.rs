//! Debate panel roles and agent profiles.
//!
//! A debate runs against a roster of agents. Built-in panel roles carry a
//! distinct perspective shaped by their system prompt; user-defined agents
//! wrap a role with a custom name, expertise tag and optional prompt
//! override.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Roles that agents can take on the debate panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelRole {
    /// Argues the strongest case for the proposition.
    Proponent,
    /// Challenges assumptions and argues the strongest case against.
    Skeptic,
    /// Weighs evidence quantitatively and surfaces trade-offs.
    Analyst,
    /// Reconciles positions and drafts an integrated answer.
    Synthesizer,
    /// Extracts atomic claims from responses and scores their validity.
    Validator,
}

impl PanelRole {
    /// Returns the roles that respond to the debate query. The validator is
    /// excluded: it runs after the panel, over the panel's output.
    pub fn panel() -> Vec<Self> {
        vec![
            Self::Proponent,
            Self::Skeptic,
            Self::Analyst,
            Self::Synthesizer,
        ]
    }

    /// Returns the display name for this role.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Proponent => "Proponent",
            Self::Skeptic => "Skeptic",
            Self::Analyst => "Analyst",
            Self::Synthesizer => "Synthesizer",
            Self::Validator => "Validator",
        }
    }

    /// Returns a brief description of this role's perspective.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Proponent => "Builds the strongest affirmative case",
            Self::Skeptic => "Challenges assumptions and stress-tests claims",
            Self::Analyst => "Weighs evidence and quantifies trade-offs",
            Self::Synthesizer => "Integrates positions into a coherent answer",
            Self::Validator => "Extracts and scores atomic claims",
        }
    }

    /// Returns the system prompt that defines this agent's behavior.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::Proponent => PROPONENT_SYSTEM_PROMPT,
            Self::Skeptic => SKEPTIC_SYSTEM_PROMPT,
            Self::Analyst => ANALYST_SYSTEM_PROMPT,
            Self::Synthesizer => SYNTHESIZER_SYSTEM_PROMPT,
            Self::Validator => VALIDATOR_SYSTEM_PROMPT,
        }
    }
}

impl std::fmt::Display for PanelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A named agent participating in debates.
///
/// Profiles wrap a [`PanelRole`] with user-facing identity. The flow
/// orchestrator addresses agents by profile id; the context manager carries
/// those ids verbatim in `selected_agents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Unique identifier for this agent.
    pub id: String,
    /// Display name shown in responses and reports.
    pub name: String,
    /// The panel role shaping this agent's perspective.
    pub role: PanelRole,
    /// Optional expertise tag (e.g., "education policy").
    pub expertise: Option<String>,
    /// Optional system prompt override replacing the role's default.
    pub system_prompt: Option<String>,
}

impl AgentProfile {
    /// Creates a new agent profile with a generated id.
    pub fn new(name: impl Into<String>, role: PanelRole) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            role,
            expertise: None,
            system_prompt: None,
        }
    }

    /// Sets the expertise tag.
    pub fn with_expertise(mut self, expertise: impl Into<String>) -> Self {
        self.expertise = Some(expertise.into());
        self
    }

    /// Overrides the role's default system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Returns the effective system prompt for this agent.
    ///
    /// The override wins when present; the expertise tag, when set, is
    /// appended so the model argues from that background.
    pub fn effective_system_prompt(&self) -> String {
        let base = self
            .system_prompt
            .clone()
            .unwrap_or_else(|| self.role.system_prompt().to_string());

        match &self.expertise {
            Some(expertise) => format!("{}\n\nYour area of expertise: {}.", base, expertise),
            None => base,
        }
    }

    /// Returns the built-in system roster: one profile per panel role.
    pub fn system_panel() -> Vec<Self> {
        PanelRole::panel()
            .into_iter()
            .map(|role| Self::new(role.display_name(), role))
            .collect()
    }
}

const PROPONENT_SYSTEM_PROMPT: &str = r#"You are the PROPONENT on a debate panel. Build the strongest affirmative case for the question under discussion.

YOUR APPROACH:
- Lead with your most defensible arguments
- Support every claim with concrete evidence or precedent
- Anticipate objections and pre-empt them
- Stay on the question; do not drift into adjacent topics

Respond in clear prose. Make each argument a separate paragraph so the validator can extract your claims cleanly."#;

const SKEPTIC_SYSTEM_PROMPT: &str = r#"You are the SKEPTIC on a debate panel. Challenge the question's premises and build the strongest case against.

YOUR APPROACH:
- Attack the weakest assumptions first
- Name specific failure modes and counter-examples
- Distinguish what is unknown from what is false
- Be adversarial toward claims, not toward people

Respond in clear prose. Make each objection a separate paragraph so the validator can extract your claims cleanly."#;

const ANALYST_SYSTEM_PROMPT: &str = r#"You are the ANALYST on a debate panel. Weigh the evidence on both sides and quantify the trade-offs.

YOUR APPROACH:
- Separate empirical claims from value judgments
- Attach magnitudes and uncertainty where the data allows
- Identify which disagreements are factual and which are definitional
- Flag evidence that both sides are ignoring

Respond in clear prose. Make each finding a separate paragraph so the validator can extract your claims cleanly."#;

const SYNTHESIZER_SYSTEM_PROMPT: &str = r#"You are the SYNTHESIZER on a debate panel. Reconcile the strongest points from all sides into an integrated answer.

YOUR APPROACH:
- Identify where the positions genuinely conflict versus talk past each other
- Preserve the strongest version of each side's argument
- Propose conditions under which each side would be right
- End with a concrete, actionable conclusion

Respond in clear prose. Make each synthesis point a separate paragraph so the validator can extract your claims cleanly."#;

const VALIDATOR_SYSTEM_PROMPT: &str = r#"You are the VALIDATOR for a debate panel. You receive the panel's responses and extract the atomic claims they contain, scoring each for validity.

For every distinct claim in the input, produce one record. Respond with ONLY a JSON array in this exact shape:

[
  {
    "claim": "The atomic claim, one sentence",
    "evidence": "The supporting evidence cited for it, or 'none given'",
    "confidence": 0-100,
    "isValid": true or false,
    "logicalFallacies": ["fallacy name", ...]
  }
]

Rules:
- One record per claim; do not merge distinct claims
- isValid reflects whether the claim is well-supported, not whether you agree
- confidence is your certainty in the isValid judgment
- logicalFallacies lists any reasoning errors; use an empty array when clean
- Output the JSON array only, no commentary"#;
