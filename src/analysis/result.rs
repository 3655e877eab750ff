//! The analysis result model and its open label sets.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Overall tone of a meeting. Values outside the three known ones are kept
/// verbatim rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Other(String),
}

impl Sentiment {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Positive => "Positive",
            Self::Neutral => "Neutral",
            Self::Negative => "Negative",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for Sentiment {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "positive" => Self::Positive,
            "neutral" => Self::Neutral,
            "negative" => Self::Negative,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for Sentiment {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<Sentiment> for String {
    fn from(sentiment: Sentiment) -> Self {
        match sentiment {
            Sentiment::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Meeting type as labelled by the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MeetingPurpose {
    DailyStandup,
    SprintPlanning,
    SprintRetrospective,
    ProjectReview,
    StakeholderUpdate,
    TeamSync,
    ClientMeeting,
    StrategySession,
    ProductDemo,
    TrainingSession,
    OneOnOne,
    AllHands,
    DesignReview,
    TechnicalDiscussion,
    BudgetPlanning,
    PerformanceReview,
    GeneralDiscussion,
    Other(String),
}

impl MeetingPurpose {
    pub const KNOWN: [MeetingPurpose; 17] = [
        Self::DailyStandup,
        Self::SprintPlanning,
        Self::SprintRetrospective,
        Self::ProjectReview,
        Self::StakeholderUpdate,
        Self::TeamSync,
        Self::ClientMeeting,
        Self::StrategySession,
        Self::ProductDemo,
        Self::TrainingSession,
        Self::OneOnOne,
        Self::AllHands,
        Self::DesignReview,
        Self::TechnicalDiscussion,
        Self::BudgetPlanning,
        Self::PerformanceReview,
        Self::GeneralDiscussion,
    ];

    pub fn label(&self) -> &str {
        match self {
            Self::DailyStandup => "Daily Stand-up",
            Self::SprintPlanning => "Sprint Planning",
            Self::SprintRetrospective => "Sprint Retrospective",
            Self::ProjectReview => "Project Review",
            Self::StakeholderUpdate => "Stakeholder Update",
            Self::TeamSync => "Team Sync",
            Self::ClientMeeting => "Client Meeting",
            Self::StrategySession => "Strategy Session",
            Self::ProductDemo => "Product Demo",
            Self::TrainingSession => "Training Session",
            Self::OneOnOne => "One-on-One",
            Self::AllHands => "All-Hands Meeting",
            Self::DesignReview => "Design Review",
            Self::TechnicalDiscussion => "Technical Discussion",
            Self::BudgetPlanning => "Budget Planning",
            Self::PerformanceReview => "Performance Review",
            Self::GeneralDiscussion => "General Discussion",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for MeetingPurpose {
    fn from(raw: String) -> Self {
        let trimmed = raw.trim();
        Self::KNOWN
            .iter()
            .find(|known| known.label() == trimmed)
            .cloned()
            .unwrap_or(Self::Other(raw))
    }
}

impl From<&str> for MeetingPurpose {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<MeetingPurpose> for String {
    fn from(purpose: MeetingPurpose) -> Self {
        match purpose {
            MeetingPurpose::Other(raw) => raw,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for MeetingPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one successful analysis. Shared behind an `Arc` once
/// published and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub transcript: String,
    pub summary: String,
    pub sentiment: Sentiment,
    pub duration: String,
    pub meeting_purpose: MeetingPurpose,
    pub auto_tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub timestamps: Vec<String>,
    // Older service versions only.
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub action_items: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl AnalysisResult {
    pub fn has_timeline(&self) -> bool {
        !self.timestamps.is_empty()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
