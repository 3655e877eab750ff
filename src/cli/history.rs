use anyhow::Result;

use crate::cli::args::HistoryCliArgs;
use crate::config::Config;
use crate::history::{self, MeetingHistoryStore, MeetingSummary};
use crate::notification::Notification;
use crate::presenter::{sentiment_badge, BadgeTone};
use crate::report::wrap;

const CARD_WIDTH: usize = 80;
const SUMMARY_LINES: usize = 3;

pub async fn handle_history_command(args: HistoryCliArgs) -> Result<()> {
    let config = Config::load()?;
    let store = MeetingHistoryStore::new(history::build_source(&config.history)?);

    if let Err(e) = store.list().await {
        eprintln!(
            "{}",
            Notification::error(
                "Failed to load meetings",
                "There was an error fetching your past meetings. Please try again."
            )
        );
        return Err(e);
    }

    let term = args.query.as_deref().unwrap_or("").trim();
    let meetings = store.filter(term);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&meetings)?);
        return Ok(());
    }

    if meetings.is_empty() {
        let (title, hint) = empty_state(term);
        println!("{title}");
        println!("{hint}");
        return Ok(());
    }

    println!("Found {} meeting(s):\n", meetings.len());
    for meeting in &meetings {
        print!("{}", render_card(meeting));
        println!("---");
    }

    Ok(())
}

fn empty_state(term: &str) -> (&'static str, &'static str) {
    if term.is_empty() {
        (
            "No meetings yet",
            "Upload and analyze your first meeting to get started",
        )
    } else {
        ("No matching meetings found", "Try adjusting your search terms")
    }
}

fn badge(meeting: &MeetingSummary) -> String {
    let mark = match sentiment_badge(&meeting.sentiment) {
        BadgeTone::Good => '+',
        BadgeTone::Bad => '-',
        BadgeTone::Mixed => '~',
    };
    format!("[{mark} {}]", meeting.sentiment)
}

fn render_card(meeting: &MeetingSummary) -> String {
    let mut card = format!("{}  {}\n", meeting.title, badge(meeting));
    card.push_str(&format!("{}\n", meeting.formatted_date()));

    let lines = wrap(&meeting.summary, CARD_WIDTH);
    let clamped = lines.len() > SUMMARY_LINES;
    for (i, line) in lines.iter().take(SUMMARY_LINES).enumerate() {
        card.push_str(line);
        if clamped && i + 1 == SUMMARY_LINES {
            card.push_str("...");
        }
        card.push('\n');
    }

    card.push_str(&format!("{} actions\n", meeting.action_items_count));
    card
}
