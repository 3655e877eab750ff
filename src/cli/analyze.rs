//! CLI handler for analyzing a recording.
//!
//! Selects the file, runs it through the pipeline with a stage spinner, then
//! prints, exports or copies the result.

use anyhow::{anyhow, Context, Result};
use arboard::Clipboard;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::analysis::{
    AnalysisError, AnalysisPipeline, AnalysisResult, HttpAnalysisService, PipelineOptions,
};
use crate::cli::args::{AnalyzeCliArgs, CopyTarget};
use crate::config::Config;
use crate::global;
use crate::media::MediaFile;
use crate::notification::Notification;
use crate::pipeline::PipelineStatusHandle;
use crate::presenter;
use crate::report::{ExportOptions, ReportExporter};

/// Handle the analyze CLI command.
pub async fn handle_analyze_command(args: AnalyzeCliArgs) -> Result<()> {
    let config = Config::load()?;

    let endpoint = args
        .endpoint
        .clone()
        .unwrap_or_else(|| config.service.endpoint.clone());
    let service = HttpAnalysisService::new(&endpoint, config.service.timeout())?;
    let pipeline = AnalysisPipeline::new(
        Box::new(service),
        PipelineStatusHandle::default(),
        PipelineOptions::from(&config.pipeline),
    );

    // 1. Select and validate
    let file = MediaFile::from_path(&args.file)
        .await
        .with_context(|| format!("File not found: {}", args.file.display()))?;
    let notice = pipeline.select(file).await.map_err(surface)?;
    eprintln!("{notice}");

    // 2. Run, following stage events
    let progress = (!args.no_progress).then(|| StageProgress::start(pipeline.status()));
    let outcome = pipeline.submit().await;
    if let Some(progress) = progress {
        progress.finish();
    }
    let result = outcome.map_err(surface)?;

    eprintln!(
        "{}",
        Notification::info(
            "Analysis Complete!",
            "Your meeting has been successfully processed and analyzed."
        )
    );
    if let Some(seconds) = pipeline.status().get().await.elapsed_seconds() {
        eprintln!("Processed in {seconds}s");
    }

    // 3. Output
    if args.json {
        println!("{}", serde_json::to_string_pretty(result.as_ref())?);
    } else {
        let color = !args.no_color && std::io::stdout().is_terminal();
        print!("{}", presenter::render_result(&result, color));
    }

    if let Some(dir) = &args.export {
        let dir = match dir {
            Some(dir) => dir.clone(),
            None => default_export_dir(&config)?,
        };
        let document = ReportExporter::new(ExportOptions::from(&config.export)).export(&result);
        let path = document
            .save(&dir)
            .await
            .context("Failed to write report")?;
        eprintln!(
            "{}",
            Notification::info(
                "Report Downloaded!",
                format!("Your meeting analysis has been saved to {}", path.display())
            )
        );
    }

    if let Some(target) = args.copy {
        copy_to_clipboard(copy_text(&result, target))?;
        eprintln!("{} copied to clipboard!", target.label());
    }

    Ok(())
}

/// Show the failure notice, then hand the error on.
fn surface(err: AnalysisError) -> anyhow::Error {
    eprintln!("{}", err.notification());
    if let Some(hint) = retry_hint(&err) {
        eprintln!("{hint}");
    }
    anyhow::Error::new(err)
}

fn retry_hint(err: &AnalysisError) -> Option<&'static str> {
    err.is_retryable().then_some("Run the same command again to retry.")
}

fn default_export_dir(config: &Config) -> Result<PathBuf> {
    match &config.export.output_dir {
        Some(dir) => Ok(dir.clone()),
        None => global::export_dir(),
    }
}

fn copy_text(result: &AnalysisResult, target: CopyTarget) -> &str {
    match target {
        CopyTarget::Summary => &result.summary,
        CopyTarget::Transcript => &result.transcript,
    }
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard =
        Clipboard::new().map_err(|e| anyhow!("Failed to initialize clipboard: {}", e))?;
    clipboard
        .set_text(text)
        .map_err(|e| anyhow!("Failed to copy to clipboard: {}", e))?;
    Ok(())
}

/// Spinner mirroring the pipeline stage.
struct StageProgress {
    bar: ProgressBar,
    task: JoinHandle<()>,
}

impl StageProgress {
    fn start(status: &PipelineStatusHandle) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(100));

        let mut events = status.subscribe();
        let task_bar = bar.clone();
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if let (Some(message), Some(description)) =
                            (event.to.message(), event.to.description())
                        {
                            task_bar.set_message(format!("{message} {description}"));
                        }
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Self { bar, task }
    }

    fn finish(self) {
        self.task.abort();
        self.bar.finish_and_clear();
    }
}
