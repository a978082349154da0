//! Skill match scoring: overlap between a candidate's attributes and a
//! requirement list, expressed as a 0–100 score with an explanation.
//!
//! Shared by candidate/requisition matching (persisted) and bench matching (read-only).

use serde::{Deserialize, Serialize};

pub const SKILLS_MATCH_REASON: &str = "Skills Match";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub reason: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub score: u8,
    pub explain: Vec<Explanation>,
}

#[cfg(test)]
impl MatchResult {
    pub fn reason(&self, reason: &str) -> Option<&str> {
        self.explain
            .iter()
            .find(|e| e.reason == reason)
            .map(|e| e.value.as_str())
    }
}

/// Scores `candidate` against `required`.
///
/// Every candidate attribute that appears in `required` (exact, case-sensitive)
/// counts once per occurrence, so duplicates on the candidate side can push
/// the ratio past 1.0; the cap at 100 absorbs that. An empty requirement list
/// scores 0: the denominator is floored to 1 and nothing can match.
pub fn compute_match_score(candidate: &[String], required: &[String]) -> MatchResult {
    let matched = candidate
        .iter()
        .filter(|attr| required.contains(attr))
        .count();

    let denominator = required.len().max(1) as f64;
    let ratio = matched as f64 / denominator * 100.0;
    let score = ratio.min(100.0).round() as u8;

    MatchResult {
        score,
        explain: vec![Explanation {
            reason: SKILLS_MATCH_REASON.to_string(),
            value: format!("{matched}/{}", required.len()),
        }],
    }
}
