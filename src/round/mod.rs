//! Round reconciliation: advance-or-terminate decisions per round.
//!
//! The tracker sits between the UI review step and the context manager. It
//! owns the round counter and the transient per-round review state
//! (selected point ids, feedback text), enforces the max-rounds boundary,
//! and decides whether the loop advances to another round or terminates
//! into report generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

use crate::error::RoundError;

/// Default ceiling on debate rounds per session.
pub const DEFAULT_MAX_ROUNDS: u32 = 5;

/// Status of a debate round, mirroring the persisted round record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl std::fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        };
        write!(f, "{}", name)
    }
}

/// External persistence shape of one round, consumed not owned.
///
/// Only `distributor_query` (the round's question) and `round_number` feed
/// the carryover logic; the rest is carried for the storage collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateRound {
    pub round_number: u32,
    pub session_id: String,
    /// The query posed to the panel this round.
    pub distributor_query: String,
    /// Opaque flow-graph snapshot for the round.
    #[serde(default)]
    pub distributor_response: serde_json::Value,
    pub status: RoundStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl DebateRound {
    /// Creates a pending round record.
    pub fn new(round_number: u32, session_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            round_number,
            session_id: session_id.into(),
            distributor_query: query.into(),
            distributor_response: serde_json::Value::Null,
            status: RoundStatus::Pending,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Marks the round completed now.
    pub fn complete(&mut self) {
        self.status = RoundStatus::Completed;
        self.completed_at = Some(Utc::now());
    }
}

/// The user's decision on a reviewed round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundAction {
    /// Advance to another round with a new query.
    NextRound,
    /// Terminate the loop and generate the final report.
    GenerateReport,
}

/// Outcome of a round feedback submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// The loop advances; the caller collects a new query seeded by the
    /// submitted feedback.
    Advance {
        next_round: u32,
        /// Feedback text carried as the seed for the next round's query.
        query_seed: String,
        /// Point ids the user accepted this round.
        accepted_point_ids: Vec<String>,
    },
    /// The loop terminates; downstream report generation takes over with
    /// the accumulated context.
    Terminate {
        final_round: u32,
        accepted_point_ids: Vec<String>,
    },
}

/// Tracks round progression and transient per-round review state.
#[derive(Debug)]
pub struct RoundTracker {
    current_round: u32,
    max_rounds: u32,
    /// Point ids selected in the in-flight review; cleared on advance.
    selected_point_ids: HashSet<String>,
    /// Feedback text of the in-flight review; cleared on advance.
    feedback: String,
}

impl Default for RoundTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ROUNDS)
    }
}

impl RoundTracker {
    /// Creates a tracker starting at round 1 with the given ceiling.
    pub fn new(max_rounds: u32) -> Self {
        Self {
            current_round: 1,
            max_rounds: max_rounds.max(1),
            selected_point_ids: HashSet::new(),
            feedback: String::new(),
        }
    }

    /// Current round number, 1-indexed.
    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    /// Configured round ceiling.
    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Whether another round may still be started.
    pub fn can_advance(&self) -> bool {
        self.current_round < self.max_rounds
    }

    /// Toggles a point id in the in-flight selection.
    pub fn toggle_point(&mut self, point_id: impl Into<String>) {
        let id = point_id.into();
        if !self.selected_point_ids.remove(&id) {
            self.selected_point_ids.insert(id);
        }
    }

    /// Point ids currently selected in the in-flight review.
    pub fn selected_point_ids(&self) -> &HashSet<String> {
        &self.selected_point_ids
    }

    /// Replaces the in-flight feedback text.
    pub fn set_feedback(&mut self, feedback: impl Into<String>) {
        self.feedback = feedback.into();
    }

    /// Submits the round review and resolves the advance-or-terminate
    /// decision.
    ///
    /// Points absent from `selected_point_ids` are implicitly not accepted;
    /// selection is the sole mechanism for marking a point kept.
    ///
    /// # Errors
    ///
    /// - [`RoundError::EmptySelection`] when no points are selected, for
    ///   both actions: no decision can be reconciled from zero selections.
    /// - [`RoundError::MaxRoundsReached`] when advancing at the ceiling;
    ///   never silently clamped, so callers can force a report decision.
    pub fn submit_round_feedback(
        &mut self,
        feedback: impl Into<String>,
        selected_point_ids: HashSet<String>,
        action: RoundAction,
    ) -> Result<RoundOutcome, RoundError> {
        if selected_point_ids.is_empty() {
            return Err(RoundError::EmptySelection);
        }

        let mut accepted: Vec<String> = selected_point_ids.into_iter().collect();
        accepted.sort();
        let feedback = feedback.into();

        match action {
            RoundAction::NextRound => {
                if !self.can_advance() {
                    return Err(RoundError::MaxRoundsReached {
                        current: self.current_round,
                        max: self.max_rounds,
                    });
                }

                self.current_round += 1;
                self.selected_point_ids.clear();
                self.feedback.clear();

                info!(round = self.current_round, "Advanced to next round");

                Ok(RoundOutcome::Advance {
                    next_round: self.current_round,
                    query_seed: feedback,
                    accepted_point_ids: accepted,
                })
            }
            RoundAction::GenerateReport => {
                info!(round = self.current_round, "Terminating into report");
                Ok(RoundOutcome::Terminate {
                    final_round: self.current_round,
                    accepted_point_ids: accepted,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_ceiling() {
        let tracker = RoundTracker::default();
        assert_eq!(tracker.max_rounds(), 5);
        assert_eq!(tracker.current_round(), 1);
    }

    #[test]
    fn test_empty_selection_rejected_for_both_actions() {
        let mut tracker = RoundTracker::default();
        for action in [RoundAction::NextRound, RoundAction::GenerateReport] {
            let result = tracker.submit_round_feedback("fb", HashSet::new(), action);
            assert!(matches!(result, Err(RoundError::EmptySelection)));
        }
        assert_eq!(tracker.current_round(), 1, "state unchanged on failure");
    }

    #[test]
    fn test_advance_increments_and_clears_transient_state() {
        let mut tracker = RoundTracker::default();
        tracker.toggle_point("p1");
        tracker.set_feedback("draft feedback");

        let outcome = tracker
            .submit_round_feedback("go deeper", selection(&["p1", "p3"]), RoundAction::NextRound)
            .expect("should advance");

        match outcome {
            RoundOutcome::Advance {
                next_round,
                query_seed,
                accepted_point_ids,
            } => {
                assert_eq!(next_round, 2);
                assert_eq!(query_seed, "go deeper");
                assert_eq!(accepted_point_ids, vec!["p1", "p3"]);
            }
            other => panic!("expected Advance, got {:?}", other),
        }
        assert!(tracker.selected_point_ids().is_empty());
        assert_eq!(tracker.current_round(), 2);
    }

    #[test]
    fn test_boundary_enforced_not_clamped() {
        let mut tracker = RoundTracker::new(2);
        tracker
            .submit_round_feedback("fb", selection(&["p1"]), RoundAction::NextRound)
            .expect("round 1 -> 2");

        let result =
            tracker.submit_round_feedback("fb", selection(&["p1"]), RoundAction::NextRound);
        match result {
            Err(RoundError::MaxRoundsReached { current, max }) => {
                assert_eq!(current, 2);
                assert_eq!(max, 2);
            }
            other => panic!("expected MaxRoundsReached, got {:?}", other),
        }
        assert_eq!(tracker.current_round(), 2, "never clamped or advanced");
    }

    #[test]
    fn test_generate_report_allowed_at_boundary() {
        let mut tracker = RoundTracker::new(1);
        let outcome = tracker
            .submit_round_feedback("fb", selection(&["p1"]), RoundAction::GenerateReport)
            .expect("report always allowed with a selection");

        assert_eq!(
            outcome,
            RoundOutcome::Terminate {
                final_round: 1,
                accepted_point_ids: vec!["p1".to_string()],
            }
        );
    }

    #[test]
    fn test_toggle_point_flips_membership() {
        let mut tracker = RoundTracker::default();
        tracker.toggle_point("p1");
        assert!(tracker.selected_point_ids().contains("p1"));
        tracker.toggle_point("p1");
        assert!(!tracker.selected_point_ids().contains("p1"));
    }

    #[test]
    fn test_round_record_lifecycle() {
        let mut round = DebateRound::new(1, "session-1", "Should AI replace teachers?");
        assert_eq!(round.status, RoundStatus::Pending);
        assert!(round.completed_at.is_none());

        round.complete();
        assert_eq!(round.status, RoundStatus::Completed);
        assert!(round.completed_at.is_some());
    }

    #[test]
    fn test_round_status_wire_format() {
        let json = serde_json::to_string(&RoundStatus::InProgress).expect("serializes");
        assert_eq!(json, "\"IN_PROGRESS\"");
    }
}
