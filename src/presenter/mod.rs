//! Display derivations over a finished analysis.
//!
//! Everything here is a pure function of its input; nothing touches the
//! result it is given.

use std::fmt::Write as _;

use crate::analysis::{AnalysisResult, MeetingPurpose, Sentiment};

pub const DEFAULT_SENTIMENT_ICON: &str = "🤖";
pub const DEFAULT_PURPOSE_ICON: &str = "🎯";

pub fn sentiment_icon(sentiment: &Sentiment) -> &'static str {
    match sentiment {
        Sentiment::Positive => "😊",
        Sentiment::Neutral => "😐",
        Sentiment::Negative => "😕",
        Sentiment::Other(_) => DEFAULT_SENTIMENT_ICON,
    }
}

pub fn purpose_icon(purpose: &MeetingPurpose) -> &'static str {
    match purpose {
        MeetingPurpose::DailyStandup => "🏃‍♂️",
        MeetingPurpose::SprintPlanning => "📋",
        MeetingPurpose::SprintRetrospective => "🔄",
        MeetingPurpose::ProjectReview => "📊",
        MeetingPurpose::StakeholderUpdate => "📢",
        MeetingPurpose::TeamSync => "👥",
        MeetingPurpose::ClientMeeting => "💼",
        MeetingPurpose::StrategySession => "🎯",
        MeetingPurpose::ProductDemo => "🚀",
        MeetingPurpose::TrainingSession => "📚",
        MeetingPurpose::OneOnOne => "🗣️",
        MeetingPurpose::AllHands => "🙌",
        MeetingPurpose::DesignReview => "🎨",
        MeetingPurpose::TechnicalDiscussion => "⚙️",
        MeetingPurpose::BudgetPlanning => "💰",
        MeetingPurpose::PerformanceReview => "📈",
        MeetingPurpose::GeneralDiscussion => "💬",
        MeetingPurpose::Other(_) => DEFAULT_PURPOSE_ICON,
    }
}

/// Fixed tag palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagColor {
    Blue,
    Green,
    Purple,
    Orange,
    Pink,
    Indigo,
    Cyan,
}

impl TagColor {
    pub const PALETTE: [TagColor; 7] = [
        Self::Blue,
        Self::Green,
        Self::Purple,
        Self::Orange,
        Self::Pink,
        Self::Indigo,
        Self::Cyan,
    ];

    /// 256-color terminal foreground.
    pub fn ansi_code(&self) -> u8 {
        match self {
            Self::Blue => 33,
            Self::Green => 34,
            Self::Purple => 135,
            Self::Orange => 208,
            Self::Pink => 205,
            Self::Indigo => 63,
            Self::Cyan => 44,
        }
    }
}

/// Color of a tag. Depends only on the tag text (its length in characters),
/// so a tag always renders the same; different tags may share a color.
pub fn tag_color(tag: &str) -> TagColor {
    TagColor::PALETTE[tag.chars().count() % TagColor::PALETTE.len()]
}

pub fn format_duration(duration: &str) -> String {
    if duration.contains('~') {
        format!("⏱️ {duration} (estimated)")
    } else {
        format!("⏱️ {duration}")
    }
}

/// Tone of the sentiment badge on a history card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTone {
    Good,
    Bad,
    Mixed,
}

pub fn sentiment_badge(sentiment: &Sentiment) -> BadgeTone {
    match sentiment {
        Sentiment::Positive => BadgeTone::Good,
        Sentiment::Negative => BadgeTone::Bad,
        _ => BadgeTone::Mixed,
    }
}

/// Full text view of a result, as shown after an analysis completes.
/// Tags are colored when `color` is set.
pub fn render_result(result: &AnalysisResult, color: bool) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Analysis Results");
    let _ = writeln!(out, "================");
    let _ = writeln!(out, "Duration:  {}", format_duration(&result.duration));
    let _ = writeln!(
        out,
        "Purpose:   {} {}",
        purpose_icon(&result.meeting_purpose),
        result.meeting_purpose
    );
    let _ = writeln!(
        out,
        "Sentiment: {} {}",
        sentiment_icon(&result.sentiment),
        result.sentiment
    );

    let _ = writeln!(out, "\nSummary\n-------\n{}", result.summary);

    let _ = writeln!(out, "\nAuto Tags\n---------");
    let tags: Vec<String> = result
        .auto_tags
        .iter()
        .map(|tag| render_tag(tag, color))
        .collect();
    let _ = writeln!(out, "{}", tags.join(" "));

    let _ = writeln!(out, "\nTranscript\n----------\n{}", result.transcript);

    if result.has_timeline() {
        let _ = writeln!(out, "\nTimestamps\n----------");
        for timestamp in &result.timestamps {
            let _ = writeln!(out, "  • {timestamp}");
        }
    }

    out
}

fn render_tag(tag: &str, color: bool) -> String {
    if color {
        format!("\x1b[38;5;{}m#{}\x1b[0m", tag_color(tag).ansi_code(), tag)
    } else {
        format!("#{tag}")
    }
}
