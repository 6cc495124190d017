use serde::{Deserialize, Serialize};

/// How an answer was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerMode {
    #[serde(rename = "openai")]
    Model,
    #[serde(rename = "rule-based")]
    RuleBased,
}

/// Answer to a weather question, with the sources that fed it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub mode: AnswerMode,
    pub provenance: Vec<String>,
}

impl AnswerResult {
    pub fn rule_based(answer: String, provenance: &[&str]) -> Self {
        Self {
            answer,
            mode: AnswerMode::RuleBased,
            provenance: provenance.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_wire_names() {
        assert_eq!(serde_json::to_value(AnswerMode::Model).unwrap(), "openai");
        assert_eq!(serde_json::to_value(AnswerMode::RuleBased).unwrap(), "rule-based");
    }

    #[test]
    fn test_rule_based_constructor() {
        let result = AnswerResult::rule_based("ok".into(), &["open-meteo"]);
        assert_eq!(result.mode, AnswerMode::RuleBased);
        assert_eq!(result.provenance, vec!["open-meteo".to_string()]);
    }
}
