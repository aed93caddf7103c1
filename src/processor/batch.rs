//! Concurrent processing of many export files.
//!
//! Each file runs on the blocking pool; concurrency is bounded by
//! `max_concurrent_files`. A failing file is recorded and the batch goes on.

use super::DatasetProcessor;
use crate::config::PipelineConfig;
use crate::error::PrecipError;
use crate::models::{DatasetSummary, ProcessingStats};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tokio::task;
use tracing::{debug, error};

/// Summaries of the files that processed cleanly plus batch statistics
#[derive(Debug, Default)]
pub struct BatchReport {
    pub summaries: Vec<DatasetSummary>,
    pub stats: ProcessingStats,
}

#[derive(Debug, Clone)]
pub struct BatchProcessor {
    processor: DatasetProcessor,
    show_progress: bool,
}

impl BatchProcessor {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            processor: DatasetProcessor::new().with_config(config),
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Process every file and summarize the results
    pub async fn process_files(&self, files: &[PathBuf]) -> BatchReport {
        let start_time = Instant::now();
        let concurrent_limit = self
            .processor
            .config()
            .max_concurrent_files
            .clamp(1, files.len().max(1));
        debug!(
            "Processing {} files with up to {} in flight",
            files.len(),
            concurrent_limit
        );

        let pb = self.progress_bar(files.len() as u64);

        let outcomes: Vec<(PathBuf, Result<DatasetSummary, PrecipError>)> = stream::iter(files)
            .map(|path| {
                let processor = self.processor.clone();
                let pb = pb.clone();
                let path = path.clone();
                async move {
                    if let Some(file_name) = path.file_name() {
                        pb.set_message(format!("Processing: {}", file_name.to_string_lossy()));
                    }

                    let task_path = path.clone();
                    let result = task::spawn_blocking(move || {
                        processor
                            .process_path(&task_path)
                            .and_then(|dataset| dataset.summary(task_path.display().to_string()))
                    })
                    .await
                    .unwrap_or_else(|e| {
                        Err(PrecipError::ProcessingFailed {
                            path: path.clone(),
                            reason: format!("Processing task failed: {}", e),
                        })
                    });

                    pb.inc(1);
                    (path, result)
                }
            })
            .buffer_unordered(concurrent_limit)
            .collect()
            .await;

        pb.finish_with_message("All files processed");

        let mut report = BatchReport::default();
        for (path, result) in outcomes {
            match result {
                Ok(summary) => {
                    report.stats.files_processed += 1;
                    report.stats.total_rows += summary.rows;
                    report.summaries.push(summary);
                }
                Err(e) => {
                    error!("Failed to process {}: {:#}", path.display(), e);
                    report.stats.files_failed += 1;
                    report.stats.failures.push((path, e.to_string()));
                }
            }
        }

        report.summaries.sort_by(|a, b| a.source.cmp(&b.source));
        report.stats.failures.sort();
        report.stats.processing_time_ms = start_time.elapsed().as_millis();
        report
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb
    }
}
