//! Enhanced-prompt synthesis.
//!
//! Pure string assembly: the accumulated review history is folded into the
//! prompt that restarts the next round. No dependency on manager state; the
//! caller passes everything explicitly.
//!
//! Contract: the original question appears verbatim at the start, every
//! kept point's content appears verbatim on its own line, and the context
//! updates text appears verbatim when non-empty.

use super::point::ValidatorPoint;

/// Synthesizes the enhanced prompt for a flow restart.
///
/// `kept` and `removed` are expected in first-seen order; that order is
/// preserved in the output.
pub fn synthesize_prompt(
    question: &str,
    kept: &[ValidatorPoint],
    removed: &[ValidatorPoint],
    context_updates: &str,
    include_removed: bool,
) -> String {
    let mut prompt = String::from(question);

    if !kept.is_empty() {
        prompt.push_str("\n\nAccepted points from previous rounds (build on these):\n");
        for point in kept {
            prompt.push_str("- ");
            prompt.push_str(&point.content);
            prompt.push('\n');
        }
    }

    if include_removed && !removed.is_empty() {
        prompt.push_str("\nRejected points (do not repeat these):\n");
        for point in removed {
            prompt.push_str("- [rejected] ");
            prompt.push_str(&point.content);
            prompt.push('\n');
        }
    }

    if !context_updates.is_empty() {
        prompt.push_str("\nUpdated Context:\n");
        prompt.push_str(context_updates);
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kept_points() -> Vec<ValidatorPoint> {
        vec![
            ValidatorPoint::new("p1", "First kept claim", true),
            ValidatorPoint::new("p3", "Third kept claim", true),
        ]
    }

    fn removed_points() -> Vec<ValidatorPoint> {
        vec![ValidatorPoint::new("p2", "Rejected claim", false)]
    }

    #[test]
    fn test_question_leads_verbatim() {
        let prompt = synthesize_prompt(
            "Should AI replace teachers?",
            &kept_points(),
            &[],
            "",
            false,
        );
        assert!(prompt.starts_with("Should AI replace teachers?"));
    }

    #[test]
    fn test_kept_contents_present_verbatim() {
        let prompt = synthesize_prompt("Q", &kept_points(), &[], "", false);
        assert!(prompt.contains("First kept claim"));
        assert!(prompt.contains("Third kept claim"));
    }

    #[test]
    fn test_context_updates_present_verbatim() {
        let prompt = synthesize_prompt("Q", &kept_points(), &[], "Focus on K-12 context", false);
        assert!(prompt.contains("Focus on K-12 context"));
        assert!(prompt.contains("Updated Context"));
    }

    #[test]
    fn test_removed_section_gated() {
        let without = synthesize_prompt("Q", &kept_points(), &removed_points(), "", false);
        assert!(!without.contains("Rejected claim"));

        let with = synthesize_prompt("Q", &kept_points(), &removed_points(), "", true);
        assert!(with.contains("Rejected claim"));
        assert!(with.contains("[rejected]"));
    }

    #[test]
    fn test_bare_question_unchanged() {
        let prompt = synthesize_prompt("Just the question", &[], &[], "", false);
        assert_eq!(prompt, "Just the question");
    }

    #[test]
    fn test_empty_question_does_not_panic() {
        let prompt = synthesize_prompt("", &kept_points(), &[], "update", true);
        assert!(prompt.contains("First kept claim"));
        assert!(prompt.contains("update"));
    }

    #[test]
    fn test_kept_order_preserved() {
        let prompt = synthesize_prompt("Q", &kept_points(), &[], "", false);
        let first = prompt.find("First kept claim").expect("first present");
        let third = prompt.find("Third kept claim").expect("third present");
        assert!(first < third);
    }
}
