//! Context accumulation and flow-restart preparation.
//!
//! The [`ContextManager`] owns the accumulated review history of one debate
//! thread: which validator points the user kept or removed across
//! iterations, the iteration counter, and the thread's original question.
//! Each processing call folds new validator output into that history and
//! produces a fresh [`FlowContext`] snapshot; [`ContextManager::prepare_flow_restart`]
//! turns the current snapshot into the restart configuration the flow
//! executor consumes.
//!
//! One manager per debate thread. Multi-session processes key managers by
//! session id through [`crate::session::SessionRegistry`]; there is no
//! global instance.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::point::{RawValidationResult, ValidatorPoint, ValidatorResponse};
use super::prompt::synthesize_prompt;
use crate::error::ContextError;

/// Synthetic agent name used when raw validation results are folded in
/// without a user review step.
const AUTO_VALIDATOR_NAME: &str = "Validator";

// ============================================================================
// Interaction Input
// ============================================================================

/// User-originated review input for one iteration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionInput {
    /// Validator responses under review, one per agent.
    pub validator_responses: Vec<ValidatorResponse>,
    /// The question that started the thread. Empty strings are tolerated;
    /// a stored question is never cleared by one.
    #[serde(default)]
    pub original_question: String,
    /// Latest free-text context correction from the user.
    #[serde(default)]
    pub context_updates: String,
    /// Extra instructions for the next round's query; carried by the
    /// caller, not folded into the context.
    #[serde(default)]
    pub additional_instructions: String,
    /// Agent ids chosen for the next run. Stored verbatim; emptiness is a
    /// UI-level concern, not enforced here.
    #[serde(default)]
    pub selected_agents: Vec<String>,
    /// Full roster the user could choose from, for display.
    #[serde(default)]
    pub available_agents: Vec<String>,
    /// Built-in system agents currently enabled.
    #[serde(default)]
    pub enabled_system_agents: Vec<String>,
}

impl InteractionInput {
    /// Creates an input for the given question.
    pub fn new(original_question: impl Into<String>) -> Self {
        Self {
            original_question: original_question.into(),
            ..Self::default()
        }
    }

    /// Sets the validator responses under review.
    pub fn with_responses(mut self, responses: Vec<ValidatorResponse>) -> Self {
        self.validator_responses = responses;
        self
    }

    /// Sets the context correction text.
    pub fn with_context_updates(mut self, updates: impl Into<String>) -> Self {
        self.context_updates = updates.into();
        self
    }

    /// Sets the agents selected for the next run.
    pub fn with_selected_agents(mut self, agents: Vec<String>) -> Self {
        self.selected_agents = agents;
        self
    }
}

// ============================================================================
// Flow Context
// ============================================================================

/// Accumulated state of one debate thread, snapshotted per iteration.
///
/// Kept and removed points are disjoint by construction: both views are
/// projected from a single decision map keyed by point id, where the most
/// recent decision wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowContext {
    /// Points the user accepted, deduplicated by id, first-seen order.
    pub kept_points: Vec<ValidatorPoint>,
    /// Points the user rejected, deduplicated by id, first-seen order.
    pub removed_points: Vec<ValidatorPoint>,
    /// Agent ids chosen for the next run.
    pub selected_agents: Vec<String>,
    /// Latest user-supplied context correction.
    pub context_updates: String,
    /// Monotonically increasing iteration counter, starting at 1.
    pub iteration_count: u32,
    /// The question that started the thread.
    pub original_question: String,
    /// Creation time of this snapshot.
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Restart Configuration
// ============================================================================

/// Options controlling restart preparation.
#[derive(Debug, Clone, Copy)]
pub struct RestartOptions {
    /// Carry the context's agent selection into the restart config. When
    /// false the config's agent list is empty and the caller must resupply.
    pub preserve_agent_selection: bool,
    /// Include the rejected points in the enhanced prompt.
    pub include_removed_points: bool,
    /// Reset the restart's iteration counter to 1.
    pub reset_iteration_count: bool,
}

impl Default for RestartOptions {
    fn default() -> Self {
        Self {
            preserve_agent_selection: true,
            include_removed_points: false,
            reset_iteration_count: false,
        }
    }
}

impl RestartOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the agent selection is preserved.
    pub fn with_preserve_agent_selection(mut self, preserve: bool) -> Self {
        self.preserve_agent_selection = preserve;
        self
    }

    /// Sets whether rejected points appear in the prompt.
    pub fn with_include_removed_points(mut self, include: bool) -> Self {
        self.include_removed_points = include;
        self
    }

    /// Sets whether the iteration counter resets to 1.
    pub fn with_reset_iteration_count(mut self, reset: bool) -> Self {
        self.reset_iteration_count = reset;
        self
    }
}

/// Metadata carried alongside a restart configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestartMetadata {
    /// The thread's original question.
    pub original_question: String,
    /// The context correction folded into the prompt.
    pub context_updates: String,
    /// Whether the agent selection was carried over.
    pub preserve_agent_selection: bool,
    /// When this configuration was produced.
    pub timestamp: DateTime<Utc>,
}

/// The payload handed to the flow re-execution step.
///
/// Created once per [`ContextManager::prepare_flow_restart`] call and
/// consumed immediately; the engine does not persist it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRestartConfig {
    /// Identifier of the context snapshot this config was derived from,
    /// fresh per call.
    pub context_id: String,
    /// The synthesized prompt that restarts the flow.
    pub enhanced_prompt: String,
    /// Agent ids participating in the restarted flow.
    pub selected_agents: Vec<String>,
    /// Iteration counter carried into the restart.
    pub iteration_count: u32,
    /// Restart metadata.
    pub metadata: RestartMetadata,
}

// ============================================================================
// Context Stats
// ============================================================================

/// Aggregate view of the accumulated state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextStats {
    /// Iterations processed so far.
    pub total_iterations: u32,
    /// Distinct point ids currently kept.
    pub total_kept_points: usize,
    /// Distinct point ids currently removed.
    pub total_removed_points: usize,
    /// Agents selected in the current context.
    pub active_agents: usize,
}

// ============================================================================
// Context Manager
// ============================================================================

/// Accumulates kept/removed decisions across iterations of one debate
/// thread and prepares restart configurations.
#[derive(Debug, Default)]
pub struct ContextManager {
    /// Decision map: point id to its latest point, insertion order =
    /// first-seen order. `is_kept` on the stored point is the decision.
    decisions: IndexMap<String, ValidatorPoint>,
    /// Iterations processed so far; 0 until the first call.
    iteration_count: u32,
    /// The thread's question, adopted on first non-empty sighting.
    original_question: Option<String>,
    /// Most recent context snapshot.
    current: Option<FlowContext>,
}

impl ContextManager {
    /// Creates an empty manager in the uninitialized state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one iteration of user review into the accumulated history.
    ///
    /// All points across all responses are merged into the decision map by
    /// id: an id seen before is updated to this call's decision
    /// (last-write-wins, including duplicates within the same call — the
    /// last occurrence in submission order wins). The iteration counter
    /// increments by 1, starting at 1 on the first call. `context_updates`
    /// and `selected_agents` are stored verbatim.
    ///
    /// Returns the new current context snapshot.
    pub fn process_user_interaction(&mut self, input: InteractionInput) -> FlowContext {
        for response in &input.validator_responses {
            for point in &response.points {
                self.decisions.insert(point.id.clone(), point.clone());
            }
        }

        self.iteration_count += 1;

        // Adopt the question on first sighting; a later non-empty question
        // that differs is an explicit change. Empty input never clears it.
        if !input.original_question.is_empty() {
            match &self.original_question {
                Some(stored) if *stored == input.original_question => {}
                _ => self.original_question = Some(input.original_question.clone()),
            }
        }

        let (kept, removed): (Vec<_>, Vec<_>) = self
            .decisions
            .values()
            .cloned()
            .partition(|point| point.is_kept);

        debug!(
            iteration = self.iteration_count,
            kept = kept.len(),
            removed = removed.len(),
            "Merged interaction into flow context"
        );

        let context = FlowContext {
            kept_points: kept,
            removed_points: removed,
            selected_agents: input.selected_agents,
            context_updates: input.context_updates,
            iteration_count: self.iteration_count,
            original_question: self.original_question.clone().unwrap_or_default(),
            timestamp: Utc::now(),
        };

        self.current = Some(context.clone());
        context
    }

    /// Automated variant of [`Self::process_user_interaction`] with no user
    /// review step, used by the regenerate action.
    ///
    /// Each raw result becomes a point whose decision mirrors the
    /// validator's verdict. Point ids are derived deterministically from the
    /// claim text (UUID v5) so re-validating the same claim across
    /// regenerate cycles dedups. An empty `selected_agent_ids` is carried
    /// forward as-is; fallback resolution is the caller's job.
    pub fn process_validation_data(
        &mut self,
        results: &[RawValidationResult],
        input_question: &str,
        selected_agent_ids: &[String],
    ) -> FlowContext {
        let points: Vec<ValidatorPoint> = results.iter().map(ValidatorPoint::from_raw).collect();

        let response = ValidatorResponse::new(Uuid::new_v4().to_string(), AUTO_VALIDATOR_NAME)
            .with_points(points);

        let input = InteractionInput::new(input_question)
            .with_responses(vec![response])
            .with_selected_agents(selected_agent_ids.to_vec());

        self.process_user_interaction(input)
    }

    /// Produces the restart configuration for the current context.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::NoContext`] before the first interaction has
    /// been processed.
    pub fn prepare_flow_restart(
        &self,
        options: RestartOptions,
    ) -> Result<FlowRestartConfig, ContextError> {
        let context = self.current.as_ref().ok_or(ContextError::NoContext)?;
        Ok(prepare_restart(context, options))
    }

    /// Returns aggregate stats; all zeros before the first interaction.
    pub fn stats(&self) -> ContextStats {
        let kept = self.decisions.values().filter(|p| p.is_kept).count();
        ContextStats {
            total_iterations: self.iteration_count,
            total_kept_points: kept,
            total_removed_points: self.decisions.len() - kept,
            active_agents: self
                .current
                .as_ref()
                .map(|c| c.selected_agents.len())
                .unwrap_or(0),
        }
    }

    /// Serializes the current context to pretty JSON for export.
    ///
    /// The output round-trips losslessly through [`FlowContext`]'s serde
    /// implementation.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::NoContext`] before the first interaction.
    pub fn export_context(&self) -> Result<String, ContextError> {
        let context = self.current.as_ref().ok_or(ContextError::NoContext)?;
        Ok(serde_json::to_string_pretty(context)?)
    }

    /// Returns the current context snapshot, if any.
    pub fn current_context(&self) -> Option<&FlowContext> {
        self.current.as_ref()
    }

    /// Returns the number of iterations processed so far.
    pub fn iteration_count(&self) -> u32 {
        self.iteration_count
    }
}

/// Builds a restart configuration from an explicit context snapshot.
///
/// [`ContextManager::prepare_flow_restart`] delegates here with the current
/// snapshot; callers holding an exported or historical context can prepare
/// a restart from it directly.
pub fn prepare_restart(context: &FlowContext, options: RestartOptions) -> FlowRestartConfig {
    let enhanced_prompt = synthesize_prompt(
        &context.original_question,
        &context.kept_points,
        &context.removed_points,
        &context.context_updates,
        options.include_removed_points,
    );

    let selected_agents = if options.preserve_agent_selection {
        context.selected_agents.clone()
    } else {
        Vec::new()
    };

    let iteration_count = if options.reset_iteration_count {
        1
    } else {
        context.iteration_count
    };

    FlowRestartConfig {
        context_id: Uuid::new_v4().to_string(),
        enhanced_prompt,
        selected_agents,
        iteration_count,
        metadata: RestartMetadata {
            original_question: context.original_question.clone(),
            context_updates: context.context_updates.clone(),
            preserve_agent_selection: options.preserve_agent_selection,
            timestamp: Utc::now(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with(points: Vec<ValidatorPoint>) -> ValidatorResponse {
        ValidatorResponse::new("r1", "Skeptic").with_points(points)
    }

    fn first_round_input() -> InteractionInput {
        InteractionInput::new("Should AI replace teachers?")
            .with_responses(vec![response_with(vec![
                ValidatorPoint::new("p1", "Tutoring scales", true),
                ValidatorPoint::new("p2", "No social learning", false),
                ValidatorPoint::new("p3", "Costs drop", true),
            ])])
            .with_context_updates("Focus on K-12 context")
            .with_selected_agents(vec!["agentA".to_string(), "agentB".to_string()])
    }

    #[test]
    fn test_first_interaction_partitions_points() {
        let mut manager = ContextManager::new();
        let context = manager.process_user_interaction(first_round_input());

        assert_eq!(context.iteration_count, 1);
        let kept_ids: Vec<_> = context.kept_points.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(kept_ids, vec!["p1", "p3"]);
        let removed_ids: Vec<_> = context
            .removed_points
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(removed_ids, vec!["p2"]);
        assert_eq!(context.original_question, "Should AI replace teachers?");
        assert_eq!(context.context_updates, "Focus on K-12 context");
    }

    #[test]
    fn test_latest_decision_wins_across_calls() {
        let mut manager = ContextManager::new();
        manager.process_user_interaction(first_round_input());

        // Round 2 flips p2 to kept and adds p4 as removed.
        let second = InteractionInput::new("Should AI replace teachers?")
            .with_responses(vec![response_with(vec![
                ValidatorPoint::new("p2", "No social learning", true),
                ValidatorPoint::new("p4", "Teachers resist", false),
            ])])
            .with_context_updates("Also consider higher ed");
        let context = manager.process_user_interaction(second);

        assert_eq!(context.iteration_count, 2);
        let kept_ids: Vec<_> = context.kept_points.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(kept_ids, vec!["p1", "p3", "p2"]);
        let removed_ids: Vec<_> = context
            .removed_points
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(removed_ids, vec!["p4"]);
    }

    #[test]
    fn test_no_id_in_both_sets() {
        let mut manager = ContextManager::new();
        manager.process_user_interaction(first_round_input());
        let context = manager.process_user_interaction(
            InteractionInput::new("Q").with_responses(vec![response_with(vec![
                ValidatorPoint::new("p1", "Tutoring scales", false),
            ])]),
        );

        let kept: std::collections::HashSet<_> =
            context.kept_points.iter().map(|p| &p.id).collect();
        for point in &context.removed_points {
            assert!(!kept.contains(&point.id), "{} in both sets", point.id);
        }
        assert!(context.removed_points.iter().any(|p| p.id == "p1"));
    }

    #[test]
    fn test_intra_call_duplicate_last_occurrence_wins() {
        let mut manager = ContextManager::new();
        let input = InteractionInput::new("Q").with_responses(vec![
            response_with(vec![ValidatorPoint::new("p1", "Claim", true)]),
            ValidatorResponse::new("r2", "Analyst")
                .with_points(vec![ValidatorPoint::new("p1", "Claim", false)]),
        ]);
        let context = manager.process_user_interaction(input);

        assert!(context.kept_points.is_empty());
        assert_eq!(context.removed_points.len(), 1);
    }

    #[test]
    fn test_iteration_count_monotonic() {
        let mut manager = ContextManager::new();
        for expected in 1..=4u32 {
            let context = manager.process_user_interaction(InteractionInput::new("Q"));
            assert_eq!(context.iteration_count, expected);
        }
    }

    #[test]
    fn test_original_question_preserved_on_empty() {
        let mut manager = ContextManager::new();
        manager.process_user_interaction(InteractionInput::new("Original question"));
        let context = manager.process_user_interaction(InteractionInput::new(""));
        assert_eq!(context.original_question, "Original question");
    }

    #[test]
    fn test_original_question_explicit_change_adopted() {
        let mut manager = ContextManager::new();
        manager.process_user_interaction(InteractionInput::new("First question"));
        let context = manager.process_user_interaction(InteractionInput::new("Second question"));
        assert_eq!(context.original_question, "Second question");
    }

    #[test]
    fn test_empty_question_does_not_crash() {
        let mut manager = ContextManager::new();
        let context = manager.process_user_interaction(InteractionInput::new(""));
        assert_eq!(context.original_question, "");
        assert_eq!(context.iteration_count, 1);
    }

    #[test]
    fn test_process_validation_data_maps_raw_results() {
        let mut manager = ContextManager::new();
        let results = vec![
            RawValidationResult {
                claim: "Tutoring scales".to_string(),
                evidence: "pilot data".to_string(),
                confidence: 80,
                is_valid: true,
                logical_fallacies: Vec::new(),
            },
            RawValidationResult {
                claim: "Teachers are obsolete".to_string(),
                evidence: "none given".to_string(),
                confidence: 25,
                is_valid: false,
                logical_fallacies: vec!["hasty generalization".to_string()],
            },
        ];
        let agents = vec!["agentA".to_string()];
        let context = manager.process_validation_data(&results, "Q", &agents);

        assert_eq!(context.iteration_count, 1);
        assert_eq!(context.kept_points.len(), 1);
        assert_eq!(context.removed_points.len(), 1);
        assert_eq!(
            context.kept_points[0].content,
            "Tutoring scales: pilot data (80%)"
        );
        assert_eq!(
            context.removed_points[0].feedback,
            "hasty generalization"
        );
        assert_eq!(context.selected_agents, agents);
    }

    #[test]
    fn test_validation_data_ids_deterministic() {
        let raw = RawValidationResult {
            claim: "Same claim".to_string(),
            evidence: "e".to_string(),
            confidence: 50,
            is_valid: true,
            logical_fallacies: Vec::new(),
        };

        let mut manager = ContextManager::new();
        manager.process_validation_data(std::slice::from_ref(&raw), "Q", &[]);
        // Same claim re-validated as invalid flips the same point.
        let flipped = RawValidationResult {
            is_valid: false,
            ..raw
        };
        let context = manager.process_validation_data(&[flipped], "Q", &[]);

        assert!(context.kept_points.is_empty());
        assert_eq!(context.removed_points.len(), 1);
    }

    #[test]
    fn test_validation_data_empty_agents_carried() {
        let mut manager = ContextManager::new();
        let context = manager.process_validation_data(&[], "Q", &[]);
        assert!(context.selected_agents.is_empty());
    }

    #[test]
    fn test_restart_requires_context() {
        let manager = ContextManager::new();
        let result = manager.prepare_flow_restart(RestartOptions::default());
        assert!(matches!(result, Err(ContextError::NoContext)));
    }

    #[test]
    fn test_restart_prompt_contract() {
        let mut manager = ContextManager::new();
        manager.process_user_interaction(first_round_input());

        let config = manager
            .prepare_flow_restart(RestartOptions::default())
            .expect("context exists");

        assert!(config
            .enhanced_prompt
            .starts_with("Should AI replace teachers?"));
        assert!(config.enhanced_prompt.contains("Tutoring scales"));
        assert!(config.enhanced_prompt.contains("Costs drop"));
        assert!(config.enhanced_prompt.contains("Focus on K-12 context"));
        // Removed points excluded by default.
        assert!(!config.enhanced_prompt.contains("No social learning"));
        assert_eq!(config.iteration_count, 1);
        assert_eq!(
            config.selected_agents,
            vec!["agentA".to_string(), "agentB".to_string()]
        );
    }

    #[test]
    fn test_restart_agent_preservation_toggle() {
        let mut manager = ContextManager::new();
        manager.process_user_interaction(first_round_input());

        let dropped = manager
            .prepare_flow_restart(
                RestartOptions::default().with_preserve_agent_selection(false),
            )
            .expect("context exists");
        assert!(dropped.selected_agents.is_empty());
        assert!(!dropped.metadata.preserve_agent_selection);

        let preserved = manager
            .prepare_flow_restart(RestartOptions::default())
            .expect("context exists");
        assert_eq!(preserved.selected_agents.len(), 2);
    }

    #[test]
    fn test_restart_iteration_reset() {
        let mut manager = ContextManager::new();
        manager.process_user_interaction(first_round_input());
        manager.process_user_interaction(InteractionInput::new("Q"));

        let reset = manager
            .prepare_flow_restart(RestartOptions::default().with_reset_iteration_count(true))
            .expect("context exists");
        assert_eq!(reset.iteration_count, 1);

        let carried = manager
            .prepare_flow_restart(RestartOptions::default())
            .expect("context exists");
        assert_eq!(carried.iteration_count, 2);
    }

    #[test]
    fn test_restart_context_ids_unique() {
        let mut manager = ContextManager::new();
        manager.process_user_interaction(first_round_input());

        let a = manager
            .prepare_flow_restart(RestartOptions::default())
            .expect("context exists");
        let b = manager
            .prepare_flow_restart(RestartOptions::default())
            .expect("context exists");
        assert_ne!(a.context_id, b.context_id);
    }

    #[test]
    fn test_restart_includes_removed_when_asked() {
        let mut manager = ContextManager::new();
        manager.process_user_interaction(first_round_input());

        let config = manager
            .prepare_flow_restart(RestartOptions::default().with_include_removed_points(true))
            .expect("context exists");
        assert!(config.enhanced_prompt.contains("No social learning"));
    }

    #[test]
    fn test_prepare_restart_from_explicit_context() {
        let mut manager = ContextManager::new();
        let context = manager.process_user_interaction(first_round_input());

        let config = prepare_restart(&context, RestartOptions::default());
        assert!(config
            .enhanced_prompt
            .starts_with("Should AI replace teachers?"));
        assert_eq!(config.iteration_count, context.iteration_count);
    }

    #[test]
    fn test_stats_zero_before_first_interaction() {
        let manager = ContextManager::new();
        assert_eq!(manager.stats(), ContextStats::default());
    }

    #[test]
    fn test_stats_count_distinct_ids() {
        let mut manager = ContextManager::new();
        manager.process_user_interaction(first_round_input());
        // p2 flips, p4 is new: 4 distinct ids total.
        manager.process_user_interaction(InteractionInput::new("Q").with_responses(vec![
            response_with(vec![
                ValidatorPoint::new("p2", "No social learning", true),
                ValidatorPoint::new("p4", "Teachers resist", false),
            ]),
        ]));

        let stats = manager.stats();
        assert_eq!(stats.total_iterations, 2);
        assert_eq!(stats.total_kept_points + stats.total_removed_points, 4);
        assert_eq!(stats.total_kept_points, 3);
        assert_eq!(stats.total_removed_points, 1);
    }

    #[test]
    fn test_export_round_trip() {
        let mut manager = ContextManager::new();
        manager.process_user_interaction(first_round_input());

        let exported = manager.export_context().expect("context exists");
        let restored: FlowContext = serde_json::from_str(&exported).expect("round-trips");

        let original = manager.current_context().expect("context exists");
        assert_eq!(restored.kept_points, original.kept_points);
        assert_eq!(restored.removed_points, original.removed_points);
        assert_eq!(restored.selected_agents, original.selected_agents);
        assert_eq!(restored.context_updates, original.context_updates);
        assert_eq!(restored.iteration_count, original.iteration_count);
        assert_eq!(restored.original_question, original.original_question);
        assert_eq!(restored.timestamp, original.timestamp);
    }

    #[test]
    fn test_export_requires_context() {
        let manager = ContextManager::new();
        assert!(matches!(
            manager.export_context(),
            Err(ContextError::NoContext)
        ));
    }
}
