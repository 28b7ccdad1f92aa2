//! Normalization of raw validator output.
//!
//! The validator agent is asked for a JSON array of claim records, but LLM
//! output arrives markdown-fenced, prefixed with commentary, or occasionally
//! malformed. The context core must never see malformed validator data, so
//! this layer extracts and parses what it can and falls back to a
//! deterministic placeholder when parsing fails outright.

use serde::Deserialize;
use tracing::warn;

use crate::context::RawValidationResult;

/// Wire shape of one validator claim record, as requested from the LLM.
#[derive(Debug, Deserialize)]
struct WireValidationRecord {
    claim: String,
    #[serde(default)]
    evidence: String,
    #[serde(default)]
    confidence: u8,
    #[serde(rename = "isValid", default)]
    is_valid: bool,
    #[serde(rename = "logicalFallacies", default)]
    logical_fallacies: Vec<String>,
}

impl From<WireValidationRecord> for RawValidationResult {
    fn from(record: WireValidationRecord) -> Self {
        RawValidationResult {
            claim: record.claim,
            evidence: record.evidence,
            confidence: record.confidence.min(100),
            is_valid: record.is_valid,
            logical_fallacies: record.logical_fallacies,
        }
    }
}

/// Normalizes raw validator LLM output into validation results.
///
/// Never fails: on malformed output it returns a single placeholder result
/// flagging the parse failure, so downstream merge logic always has
/// well-formed input to work with.
pub fn normalize_validator_output(content: &str) -> Vec<RawValidationResult> {
    let json = extract_json_array(content);

    match serde_json::from_str::<Vec<WireValidationRecord>>(&json) {
        Ok(records) if !records.is_empty() => {
            records.into_iter().map(RawValidationResult::from).collect()
        }
        Ok(_) => {
            warn!("Validator returned an empty claim list");
            vec![placeholder_result("Validator returned no claims")]
        }
        Err(e) => {
            warn!(error = %e, "Failed to parse validator output, using placeholder");
            vec![placeholder_result(
                "Validator output could not be parsed; manual review required",
            )]
        }
    }
}

/// Deterministic stand-in used when the validator output is unusable.
fn placeholder_result(claim: &str) -> RawValidationResult {
    RawValidationResult {
        claim: claim.to_string(),
        evidence: "none given".to_string(),
        confidence: 0,
        is_valid: false,
        logical_fallacies: Vec::new(),
    }
}

/// Extracts a JSON array from a potentially markdown-wrapped response.
fn extract_json_array(content: &str) -> String {
    // Try to find JSON in markdown code blocks
    if let Some(start) = content.find("```json") {
        let json_start = start + 7; // Skip "```json"
        if let Some(end) = content[json_start..].find("```") {
            return content[json_start..json_start + end].trim().to_string();
        }
    }

    // Try to find a raw JSON array
    if let Some(start) = content.find('[') {
        if let Some(end) = content.rfind(']') {
            if end >= start {
                return content[start..=end].to_string();
            }
        }
    }

    // Return as-is and let the JSON parser surface the error
    content.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_OUTPUT: &str = r#"[
        {"claim": "Class sizes matter", "evidence": "OECD data", "confidence": 80, "isValid": true, "logicalFallacies": []},
        {"claim": "Teachers are obsolete", "evidence": "none given", "confidence": 30, "isValid": false, "logicalFallacies": ["hasty generalization"]}
    ]"#;

    #[test]
    fn test_normalize_raw_json() {
        let results = normalize_validator_output(VALID_OUTPUT);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].claim, "Class sizes matter");
        assert!(results[0].is_valid);
        assert_eq!(results[0].confidence, 80);
        assert!(!results[1].is_valid);
        assert_eq!(results[1].logical_fallacies, vec!["hasty generalization"]);
    }

    #[test]
    fn test_normalize_markdown_wrapped() {
        let wrapped = format!("Here are the claims:\n```json\n{}\n```\nDone.", VALID_OUTPUT);
        let results = normalize_validator_output(&wrapped);
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].claim, "Teachers are obsolete");
    }

    #[test]
    fn test_normalize_surrounding_prose() {
        let with_text = format!("Sure! {} Hope that helps.", VALID_OUTPUT);
        let results = normalize_validator_output(&with_text);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_malformed_output_yields_placeholder() {
        let results = normalize_validator_output("I couldn't extract any claims, sorry!");
        assert_eq!(results.len(), 1);
        assert!(!results[0].is_valid);
        assert_eq!(results[0].confidence, 0);
        assert!(results[0].claim.contains("could not be parsed"));
    }

    #[test]
    fn test_empty_array_yields_placeholder() {
        let results = normalize_validator_output("[]");
        assert_eq!(results.len(), 1);
        assert!(results[0].claim.contains("no claims"));
    }

    #[test]
    fn test_confidence_clamped_to_100() {
        let results =
            normalize_validator_output(r#"[{"claim": "c", "confidence": 100, "isValid": true}]"#);
        assert_eq!(results[0].confidence, 100);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let results = normalize_validator_output(r#"[{"claim": "bare claim"}]"#);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].evidence, "");
        assert!(!results[0].is_valid);
        assert!(results[0].logical_fallacies.is_empty());
    }
}
