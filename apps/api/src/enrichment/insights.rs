//! Shapes of AI-derived fields, with the fixed fallback used when a
//! completion cannot be parsed.

use serde::{Deserialize, Serialize};

pub const OPPORTUNITY_FALLBACK_INSIGHT: &str = "Unable to generate AI insights at this time.";
pub const LEAD_FALLBACK_INSIGHT: &str = "Lead scoring unavailable; default score applied.";
pub const CANDIDATE_FALLBACK_SUMMARY: &str =
    "AI summary unavailable. Review the candidate profile manually.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityInsights {
    pub win_probability: i32,
    pub risk_score: i32,
    pub insights: String,
}

impl OpportunityInsights {
    pub fn fallback() -> Self {
        Self {
            win_probability: 50,
            risk_score: 50,
            insights: OPPORTUNITY_FALLBACK_INSIGHT.to_string(),
        }
    }

    pub fn clamped(self) -> Self {
        Self {
            win_probability: self.win_probability.clamp(0, 100),
            risk_score: self.risk_score.clamp(0, 100),
            insights: self.insights,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadScore {
    pub score: i32,
    pub insights: String,
}

impl LeadScore {
    pub fn fallback() -> Self {
        Self {
            score: 50,
            insights: LEAD_FALLBACK_INSIGHT.to_string(),
        }
    }

    pub fn clamped(self) -> Self {
        Self {
            score: self.score.clamp(0, 100),
            insights: self.insights,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
}

impl CandidateSummary {
    pub fn fallback() -> Self {
        Self {
            summary: CANDIDATE_FALLBACK_SUMMARY.to_string(),
            strengths: vec![],
            concerns: vec![],
        }
    }
}

/// Structured resume extraction. Every field is optional in the model's output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedResume {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_years: Option<f64>,
    #[serde(default)]
    pub current_title: Option<String>,
}

pub fn fallback_interview_questions(title: &str) -> Vec<String> {
    vec![
        format!("What drew you to the {title} role?"),
        "Walk us through a recent project you are proud of and your part in it.".to_string(),
        "Describe a difficult problem you solved and how you approached it.".to_string(),
        "How do you keep your skills current?".to_string(),
        "Tell us about a time you disagreed with a teammate and how it was resolved."
            .to_string(),
    ]
}
