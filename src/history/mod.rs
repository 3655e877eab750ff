//! Past meetings and the client-side search over them.
//!
//! The list comes from a `HistorySource`: the built-in sample meetings until a
//! meetings endpoint is configured.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::analysis::Sentiment;
use crate::config::HistoryConfig;

/// Lightweight listing entry for an analyzed meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingSummary {
    pub id: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub summary: String,
    pub sentiment: Sentiment,
    pub action_items_count: u32,
}

impl MeetingSummary {
    /// Case-insensitive substring match on title or summary. An empty term
    /// matches everything.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        term.is_empty()
            || self.title.to_lowercase().contains(&term)
            || self.summary.to_lowercase().contains(&term)
    }

    /// e.g. `Jan 15, 2024, 10:00 AM`
    pub fn formatted_date(&self) -> String {
        self.date.format("%b %-d, %Y, %I:%M %p").to_string()
    }
}

pub fn filter_meetings(meetings: &[MeetingSummary], term: &str) -> Vec<MeetingSummary> {
    meetings
        .iter()
        .filter(|meeting| meeting.matches(term))
        .cloned()
        .collect()
}

#[async_trait]
pub trait HistorySource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self) -> Result<Vec<MeetingSummary>>;
}

/// Fixed sample meetings, served after a short simulated latency.
pub struct SampleHistorySource {
    latency: Duration,
}

impl SampleHistorySource {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl HistorySource for SampleHistorySource {
    fn name(&self) -> &'static str {
        "sample meetings"
    }

    async fn fetch(&self) -> Result<Vec<MeetingSummary>> {
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
        sample_meetings()
    }
}

pub fn sample_meetings() -> Result<Vec<MeetingSummary>> {
    let samples = [
        (
            "1",
            "Q3 Quarterly Review",
            "2024-01-15T10:00:00Z",
            "Quarterly review meeting focused on Q3 performance analysis and Q4 planning. Key highlights include 15% sales increase and successful product launches.",
            Sentiment::Positive,
            5,
        ),
        (
            "2",
            "Product Roadmap Planning",
            "2024-01-12T14:30:00Z",
            "Strategic discussion about product roadmap for next quarter. Covered feature prioritization, resource allocation, and timeline adjustments.",
            Sentiment::Neutral,
            8,
        ),
        (
            "3",
            "Customer Feedback Review",
            "2024-01-10T09:15:00Z",
            "Analysis of recent customer feedback and support tickets. Identified areas for improvement in user experience and feature gaps.",
            Sentiment::Negative,
            12,
        ),
        (
            "4",
            "Team Standup",
            "2024-01-08T11:00:00Z",
            "Weekly team standup covering sprint progress, blockers, and upcoming deliverables. All team members provided updates on current tasks.",
            Sentiment::Positive,
            3,
        ),
    ];

    samples
        .into_iter()
        .map(|(id, title, date, summary, sentiment, action_items_count)| {
            Ok(MeetingSummary {
                id: id.to_string(),
                title: title.to_string(),
                date: DateTime::parse_from_rfc3339(date)
                    .context("Invalid sample meeting date")?
                    .with_timezone(&Utc),
                summary: summary.to_string(),
                sentiment,
                action_items_count,
            })
        })
        .collect()
}

/// Meetings listed by a remote endpoint returning a JSON array.
pub struct HttpHistorySource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpHistorySource {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl HistorySource for HttpHistorySource {
    fn name(&self) -> &'static str {
        "meetings endpoint"
    }

    async fn fetch(&self) -> Result<Vec<MeetingSummary>> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .context("Failed to fetch past meetings")?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "Failed to fetch past meetings ({}): {}",
                status,
                body
            ));
        }

        serde_json::from_str(&body).context("Failed to parse past meetings response")
    }
}

pub fn build_source(config: &HistoryConfig) -> Result<Box<dyn HistorySource>> {
    Ok(match &config.endpoint {
        Some(endpoint) => Box::new(HttpHistorySource::new(endpoint, config.timeout())?),
        None => Box::new(SampleHistorySource::new(Duration::from_millis(
            config.sample_latency_ms,
        ))),
    })
}

/// Keeps the loading counter raised for as long as a fetch is pending.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Cached meeting list with local filtering.
///
/// Refreshes may overlap; whichever response lands last wins.
pub struct MeetingHistoryStore {
    source: Box<dyn HistorySource>,
    meetings: RwLock<Arc<Vec<MeetingSummary>>>,
    loading: AtomicUsize,
}

impl MeetingHistoryStore {
    pub fn new(source: Box<dyn HistorySource>) -> Self {
        Self {
            source,
            meetings: RwLock::new(Arc::new(Vec::new())),
            loading: AtomicUsize::new(0),
        }
    }

    /// Fetch the list in one round trip and replace the cache with it.
    /// On failure the previous list is kept.
    pub async fn list(&self) -> Result<Vec<MeetingSummary>> {
        let loading = LoadingGuard::enter(&self.loading);
        debug!("Loading past meetings from {}", self.source.name());
        let fetched = self.source.fetch().await;
        drop(loading);

        let meetings = match fetched {
            Ok(meetings) => meetings,
            Err(e) => {
                warn!("Failed to load past meetings: {:#}", e);
                return Err(e);
            }
        };

        info!("Loaded {} past meetings", meetings.len());
        let snapshot = Arc::new(meetings);
        match self.meetings.write() {
            Ok(mut guard) => *guard = Arc::clone(&snapshot),
            Err(poisoned) => *poisoned.into_inner() = Arc::clone(&snapshot),
        }
        Ok(snapshot.as_ref().clone())
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    pub fn meetings(&self) -> Vec<MeetingSummary> {
        self.snapshot().as_ref().clone()
    }

    pub fn filter(&self, term: &str) -> Vec<MeetingSummary> {
        filter_meetings(&self.snapshot(), term)
    }

    fn snapshot(&self) -> Arc<Vec<MeetingSummary>> {
        match self.meetings.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }
}
