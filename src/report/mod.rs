//! Downloadable report for a finished analysis.
//!
//! The report is a paginated plain-text document with a fixed section order:
//! title, duration, purpose, sentiment, summary, tags, transcript.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::analysis::AnalysisResult;
use crate::config::ExportConfig;

pub const REPORT_TITLE: &str = "Meeting Analysis Report";
pub const REPORT_FILE_NAME: &str = "meeting-analysis.txt";
/// Stands in for an empty summary, tag list or transcript.
pub const PLACEHOLDER: &str = "-";

const PAGE_BREAK: char = '\u{000C}';
// Footer line plus the blank line above it.
const FOOTER_LINES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub wrap_width: usize,
    pub lines_per_page: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::from(&ExportConfig::default())
    }
}

impl From<&ExportConfig> for ExportOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            wrap_width: config.wrap_width.max(1),
            lines_per_page: config.lines_per_page.max(FOOTER_LINES + 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub number: usize,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub file_name: String,
    pub pages: Vec<Page>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Pages separated by form feeds, each closed by a page footer.
    pub fn render(&self) -> String {
        let total = self.pages.len();
        self.pages
            .iter()
            .map(|page| {
                let mut text = page.lines.join("\n");
                text.push_str(&format!("\n\nPage {} of {}\n", page.number, total));
                text
            })
            .collect::<Vec<_>>()
            .join(&PAGE_BREAK.to_string())
    }

    /// Write the document into `dir` under its fixed file name.
    pub async fn save(&self, dir: &Path) -> std::io::Result<PathBuf> {
        fs::create_dir_all(dir).await?;
        let path = dir.join(&self.file_name);
        fs::write(&path, self.render()).await?;
        info!("Report saved to {:?} ({} pages)", path, self.page_count());
        Ok(path)
    }
}

struct Line {
    text: String,
    keep_with_next: bool,
}

impl Line {
    fn body(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keep_with_next: false,
        }
    }

    fn heading(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keep_with_next: true,
        }
    }
}

pub struct ReportExporter {
    options: ExportOptions,
}

impl ReportExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn export(&self, result: &AnalysisResult) -> Document {
        let width = self.options.wrap_width.max(1);
        let mut lines = Vec::new();

        lines.push(Line::heading(REPORT_TITLE));
        lines.push(Line::heading("=".repeat(REPORT_TITLE.len().min(width))));
        lines.push(Line::body(""));

        for (label, value) in [
            ("Duration", result.duration.as_str()),
            ("Purpose", result.meeting_purpose.label()),
            ("Sentiment", result.sentiment.as_str()),
        ] {
            for wrapped in wrap(&format!("{label}: {value}"), width) {
                lines.push(Line::body(wrapped));
            }
        }
        lines.push(Line::body(""));

        push_section(&mut lines, "Summary:", &result.summary, width);
        push_section(&mut lines, "Tags:", &result.auto_tags.join(", "), width);
        push_section(&mut lines, "Transcript:", &result.transcript, width);

        Document {
            file_name: REPORT_FILE_NAME.to_string(),
            pages: paginate(lines, self.options.lines_per_page.saturating_sub(FOOTER_LINES)),
        }
    }
}

fn push_section(lines: &mut Vec<Line>, heading: &str, text: &str, width: usize) {
    lines.push(Line::heading(heading));
    let text = if text.trim().is_empty() { PLACEHOLDER } else { text };
    lines.extend(wrap(text, width).into_iter().map(Line::body));
    lines.push(Line::body(""));
}

fn paginate(lines: Vec<Line>, capacity: usize) -> Vec<Page> {
    let capacity = capacity.max(1);
    let mut pages: Vec<Vec<Line>> = Vec::new();
    let mut current: Vec<Line> = Vec::new();

    for line in lines {
        if current.len() == capacity {
            // Do not strand a heading at the bottom of a page.
            let mut carried = Vec::new();
            while current.len() > 1 && current.last().is_some_and(|l| l.keep_with_next) {
                if let Some(last) = current.pop() {
                    carried.insert(0, last);
                }
            }
            pages.push(std::mem::replace(&mut current, carried));
        }
        if current.is_empty() && line.text.is_empty() && !pages.is_empty() {
            continue;
        }
        current.push(line);
    }

    while current.last().is_some_and(|l| l.text.is_empty()) {
        current.pop();
    }
    if !current.is_empty() || pages.is_empty() {
        pages.push(current);
    }

    pages
        .into_iter()
        .enumerate()
        .map(|(i, lines)| Page {
            number: i + 1,
            lines: lines.into_iter().map(|l| l.text).collect(),
        })
        .collect()
}

/// Greedy word wrap. Existing line breaks are kept and words longer than the
/// width are split, so no text is ever dropped.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        let mut line_len = 0;

        for word in paragraph.split_whitespace() {
            let chars: Vec<char> = word.chars().collect();
            let mut chunks = chars.chunks(width).peekable();

            while let Some(chunk) = chunks.next() {
                let needed = if line_len == 0 { chunk.len() } else { line_len + 1 + chunk.len() };
                if needed > width && line_len > 0 {
                    out.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                if line_len > 0 {
                    line.push(' ');
                    line_len += 1;
                }
                line.extend(chunk);
                line_len += chunk.len();

                if chunks.peek().is_some() {
                    out.push(std::mem::take(&mut line));
                    line_len = 0;
                }
            }
        }

        out.push(line);
    }

    if out.is_empty() {
        out.push(String::new());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(transcript: &str, summary: &str) -> AnalysisResult {
        let json = serde_json::json!({
            "transcript": transcript,
            "summary": summary,
            "sentiment": "positive",
            "duration": "~30 min",
            "meetingPurpose": "Design Review",
            "autoTags": ["ux", "mobile", "ux"],
        });
        serde_json::from_value(json).unwrap()
    }

    fn all_lines(doc: &Document) -> Vec<String> {
        doc.pages.iter().flat_map(|p| p.lines.clone()).collect()
    }

    #[test]
    fn test_sections_appear_in_fixed_order() {
        let doc = ReportExporter::new(ExportOptions::default()).export(&result("hi", "short"));
        let rendered = doc.render();

        let order = [
            REPORT_TITLE,
            "Duration: ~30 min",
            "Purpose: Design Review",
            "Sentiment: Positive",
            "Summary:",
            "Tags:",
            "ux, mobile, ux",
            "Transcript:",
        ];
        let mut cursor = 0;
        for needle in order {
            let found = rendered[cursor..]
                .find(needle)
                .unwrap_or_else(|| panic!("{needle} missing or out of order"));
            cursor += found + needle.len();
        }
        assert_eq!(doc.file_name, "meeting-analysis.txt");
    }

    #[test]
    fn test_empty_transcript_renders_placeholder() {
        let doc = ReportExporter::new(ExportOptions::default()).export(&result("", "   "));
        let lines = all_lines(&doc);

        let transcript_at = lines.iter().position(|l| l == "Transcript:").unwrap();
        assert_eq!(lines[transcript_at + 1], PLACEHOLDER);
        let summary_at = lines.iter().position(|l| l == "Summary:").unwrap();
        assert_eq!(lines[summary_at + 1], PLACEHOLDER);
    }

    #[test]
    fn test_long_transcript_wraps_and_paginates_without_loss() {
        let transcript = "word ".repeat(2000);
        let options = ExportOptions {
            wrap_width: 40,
            lines_per_page: 20,
        };
        let doc = ReportExporter::new(options).export(&result(&transcript, "s"));

        assert!(doc.page_count() > 1);
        for page in &doc.pages {
            assert!(page.lines.len() <= 18);
            assert!(page.lines.iter().all(|l| l.chars().count() <= 40));
        }
        let words: usize = all_lines(&doc)
            .iter()
            .flat_map(|l| l.split_whitespace())
            .filter(|w| *w == "word")
            .count();
        assert_eq!(words, 2000);
        let last_footer = format!("Page {} of {}", doc.page_count(), doc.page_count());
        assert!(doc.render().contains(&last_footer));
    }

    #[test]
    fn test_heading_is_not_left_at_page_bottom() {
        let options = ExportOptions {
            wrap_width: 80,
            lines_per_page: 12,
        };
        let doc = ReportExporter::new(options).export(&result("t", "s"));
        for page in &doc.pages {
            let last = page.lines.last().unwrap();
            assert!(!last.ends_with(':') || page.lines.len() == 1, "stranded {last}");
        }
    }

    #[test]
    fn test_tiny_page_and_width_still_export_everything() {
        let options = ExportOptions {
            wrap_width: 0,
            lines_per_page: 1,
        };
        let doc = ReportExporter::new(options).export(&result("ab", "s"));

        assert!(doc.pages.iter().all(|p| p.lines.len() == 1));
        let lines = all_lines(&doc);
        assert_eq!(lines[0], REPORT_TITLE);
        let transcript_at = lines.iter().position(|l| l == "Transcript:").unwrap();
        assert_eq!(lines[transcript_at + 1..], ["a", "b"]);
    }

    #[test]
    fn test_export_is_repeatable_and_does_not_mutate() {
        let input = result("a b c", "summary");
        let before = input.clone();
        let exporter = ReportExporter::new(ExportOptions::default());

        assert_eq!(exporter.export(&input), exporter.export(&input));
        assert_eq!(input, before);
    }

    #[test]
    fn test_wrap_splits_overlong_words() {
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("aa bbbbbb c", 4), vec!["aa", "bbbb", "bb c"]);
    }

    #[test]
    fn test_wrap_keeps_paragraph_breaks() {
        assert_eq!(wrap("one two\n\nthree", 20), vec!["one two", "", "three"]);
        assert_eq!(wrap("", 10), vec![""]);
    }

    #[tokio::test]
    async fn test_save_writes_fixed_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let doc = ReportExporter::new(ExportOptions::default()).export(&result("hello", "s"));

        let path = doc.save(dir.path()).await.unwrap();

        assert_eq!(path, dir.path().join("meeting-analysis.txt"));
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.starts_with(REPORT_TITLE));
        assert!(written.contains("hello"));
    }
}
