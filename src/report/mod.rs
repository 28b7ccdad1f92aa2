//! Final report rendering.
//!
//! When the user terminates the iteration loop, the accumulated flow
//! context becomes a markdown document: the question, the accepted points
//! with their annotations, the rejected points, and the user's context
//! corrections. Rendering is pure string assembly; an optional LLM pass
//! adds an executive summary.

use std::sync::Arc;

use crate::agents::{AgentError, AgentResult};
use crate::context::{FlowContext, ValidatorPoint};
use crate::llm::{GenerationRequest, LlmProvider, Message};
use crate::round::DebateRound;

/// System prompt for the executive summary pass.
const SUMMARY_SYSTEM_PROMPT: &str = r#"You are writing the executive summary of a multi-round debate report.

You receive the debated question and the points the review process accepted. Write 2-4 paragraphs that answer the question based only on the accepted points. Do not introduce new claims. Do not enumerate the points; synthesize them."#;

/// Renders debate outcomes into markdown reports.
#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    /// Include rejected points in the rendered report.
    pub include_rejected: bool,
}

impl ReportBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether rejected points are rendered.
    pub fn with_rejected(mut self, include: bool) -> Self {
        self.include_rejected = include;
        self
    }

    /// Renders the final report for a context and its round history.
    pub fn render(&self, context: &FlowContext, rounds: &[DebateRound]) -> String {
        let mut out = String::new();

        out.push_str("# Debate Report\n\n");
        out.push_str(&format!("**Question:** {}\n\n", context.original_question));
        out.push_str(&format!(
            "**Iterations:** {} · **Rounds run:** {} · **Generated:** {}\n\n",
            context.iteration_count,
            rounds.len(),
            context.timestamp.format("%Y-%m-%d %H:%M UTC")
        ));

        out.push_str("## Accepted Points\n\n");
        if context.kept_points.is_empty() {
            out.push_str("_No points were accepted._\n");
        } else {
            for point in &context.kept_points {
                out.push_str(&render_point(point));
            }
        }

        if self.include_rejected && !context.removed_points.is_empty() {
            out.push_str("\n## Rejected Points\n\n");
            for point in &context.removed_points {
                out.push_str(&render_point(point));
            }
        }

        if !context.context_updates.is_empty() {
            out.push_str("\n## Context Corrections\n\n");
            out.push_str(&context.context_updates);
            out.push('\n');
        }

        if !rounds.is_empty() {
            out.push_str("\n## Round History\n\n");
            for round in rounds {
                out.push_str(&format!(
                    "{}. [{}] {}\n",
                    round.round_number, round.status, round.distributor_query
                ));
            }
        }

        out
    }

    /// Asks the LLM for an executive summary of the accepted points.
    pub async fn executive_summary(
        &self,
        provider: Arc<dyn LlmProvider>,
        context: &FlowContext,
    ) -> AgentResult<String> {
        let points = context
            .kept_points
            .iter()
            .map(|p| format!("- {}", p.content))
            .collect::<Vec<_>>()
            .join("\n");

        let request = GenerationRequest::new(
            "",
            vec![
                Message::system(SUMMARY_SYSTEM_PROMPT),
                Message::user(format!(
                    "Question: {}\n\nAccepted points:\n{}",
                    context.original_question, points
                )),
            ],
        )
        .with_temperature(0.3);

        let response = provider.generate(request).await.map_err(AgentError::from)?;

        response
            .first_content()
            .map(|s| s.to_string())
            .ok_or_else(|| AgentError::ResponseParseError("Empty summary response".to_string()))
    }
}

/// Renders one point as a markdown bullet with its annotations.
fn render_point(point: &ValidatorPoint) -> String {
    let mut line = format!("- {}", point.content);

    let mut annotations = Vec::new();
    if let Some(confidence) = point.confidence {
        annotations.push(format!("confidence {}%", confidence));
    }
    if let Some(priority) = point.priority {
        annotations.push(format!("priority {}", priority));
    }
    if let Some(category) = &point.category {
        annotations.push(category.clone());
    }
    if !annotations.is_empty() {
        line.push_str(&format!(" _({})_", annotations.join(", ")));
    }
    if !point.feedback.is_empty() {
        line.push_str(&format!("\n  - Reviewer note: {}", point.feedback));
    }
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextManager, InteractionInput, PointPriority, ValidatorResponse};
    use crate::round::DebateRound;

    fn sample_context() -> FlowContext {
        let mut manager = ContextManager::new();
        manager.process_user_interaction(
            InteractionInput::new("Should AI replace teachers?")
                .with_responses(vec![ValidatorResponse::new("r1", "Skeptic").with_points(
                    vec![
                        ValidatorPoint::new("p1", "Tutoring scales", true)
                            .with_confidence(80)
                            .with_priority(PointPriority::High),
                        ValidatorPoint::new("p2", "No social learning", false)
                            .with_feedback("needs citation"),
                    ],
                )])
                .with_context_updates("Focus on K-12 context"),
        );
        manager.current_context().expect("context exists").clone()
    }

    #[test]
    fn test_render_contains_core_sections() {
        let context = sample_context();
        let rounds = vec![DebateRound::new(1, "s1", "Should AI replace teachers?")];
        let report = ReportBuilder::new().render(&context, &rounds);

        assert!(report.contains("# Debate Report"));
        assert!(report.contains("Should AI replace teachers?"));
        assert!(report.contains("Tutoring scales"));
        assert!(report.contains("confidence 80%"));
        assert!(report.contains("priority high"));
        assert!(report.contains("Focus on K-12 context"));
        assert!(report.contains("Round History"));
        // Rejected points hidden by default.
        assert!(!report.contains("No social learning"));
    }

    #[test]
    fn test_render_with_rejected() {
        let context = sample_context();
        let report = ReportBuilder::new().with_rejected(true).render(&context, &[]);

        assert!(report.contains("## Rejected Points"));
        assert!(report.contains("No social learning"));
        assert!(report.contains("Reviewer note: needs citation"));
    }

    #[test]
    fn test_render_empty_context() {
        let mut manager = ContextManager::new();
        manager.process_user_interaction(InteractionInput::new("Q"));
        let context = manager.current_context().expect("context exists").clone();

        let report = ReportBuilder::new().render(&context, &[]);
        assert!(report.contains("_No points were accepted._"));
        assert!(!report.contains("Context Corrections"));
    }
}
