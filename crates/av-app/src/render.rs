//! Render orchestration: walk every camera angle in order, build its
//! prompt, call the backend, persist the image, and record one terminal
//! outcome per angle. A failed angle never aborts its siblings.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use log::{info, warn};

use av_core::job::{CameraAngle, RenderJob, Selector};
use av_core::prompt;

use crate::client::{ApiKey, ImageBackend};
use crate::error::OutputError;
use crate::output;

/// Asks the orchestrator to stop dispatching not-yet-started angles.
/// The in-flight angle always runs to completion and keeps its result.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Terminal state of one camera angle.
#[derive(Debug, Clone, PartialEq)]
pub enum AngleOutcome {
    Succeeded { path: PathBuf },
    Failed { reason: String },
}

/// Outcome of one camera angle, labeled for the final report.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub section: String,
    pub angle: String,
    pub outcome: AngleOutcome,
}

impl GenerationResult {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, AngleOutcome::Succeeded { .. })
    }
}

/// Everything one run produced, in angle order.
#[derive(Debug)]
pub struct RenderReport {
    pub run_dir: PathBuf,
    pub results: Vec<GenerationResult>,
}

impl RenderReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

/// Drives a full job through an [`ImageBackend`], one angle at a time.
pub struct RenderService<B> {
    backend: B,
    out_root: PathBuf,
}

impl<B: ImageBackend> RenderService<B> {
    pub fn new(backend: B, out_root: impl Into<PathBuf>) -> Self {
        Self { backend, out_root: out_root.into() }
    }

    pub fn run(
        &self,
        job: &RenderJob,
        api_key: &ApiKey,
        cancel: &CancelToken,
    ) -> Result<RenderReport, OutputError> {
        self.run_with_progress(job, api_key, cancel, |_| {})
    }

    /// Like [`run`](Self::run); `on_result` fires as each angle reaches a
    /// terminal state, before the next angle starts.
    pub fn run_with_progress(
        &self,
        job: &RenderJob,
        api_key: &ApiKey,
        cancel: &CancelToken,
        mut on_result: impl FnMut(&GenerationResult),
    ) -> Result<RenderReport, OutputError> {
        let run_dir = output::create_run_dir(&self.out_root, Utc::now())?;
        info!("render run started: {} angle(s) -> {}", job.angle_count(), run_dir.display());

        let mut results = Vec::with_capacity(job.angle_count());
        let mut taken_dirs = HashSet::new();
        'sections: for (selector, section) in job.sections() {
            let section_dir = run_dir.join(unique_dir_name(section.label, &mut taken_dirs));
            for (index, angle) in section.angles.iter().enumerate() {
                if cancel.is_cancelled() {
                    info!("run cancelled; remaining angles skipped");
                    break 'sections;
                }

                let outcome =
                    self.render_angle(job, selector, index, angle, api_key, &section_dir);
                match &outcome {
                    AngleOutcome::Succeeded { path } => {
                        info!("{}/{}: saved {}", section.label, angle.name, path.display());
                    }
                    AngleOutcome::Failed { reason } => {
                        warn!("{}/{}: {reason}", section.label, angle.name);
                    }
                }

                let result = GenerationResult {
                    section: section.label.to_string(),
                    angle: angle.name.clone(),
                    outcome,
                };
                on_result(&result);
                results.push(result);
            }
        }

        Ok(RenderReport { run_dir, results })
    }

    fn render_angle(
        &self,
        job: &RenderJob,
        selector: Selector,
        angle_index: usize,
        angle: &CameraAngle,
        api_key: &ApiKey,
        section_dir: &Path,
    ) -> AngleOutcome {
        let request = match prompt::build_request(job, selector, angle_index) {
            Ok(request) => request,
            Err(e) => return AngleOutcome::Failed { reason: e.to_string() },
        };

        let bytes = match self.backend.generate(&request, api_key) {
            Ok(bytes) => bytes,
            Err(e) => return AngleOutcome::Failed { reason: e.to_string() },
        };

        let file_name = output::angle_file_name(angle_index + 1, &angle.name, &bytes);
        match output::write_image(section_dir, &file_name, &bytes) {
            Ok(path) => AngleOutcome::Succeeded { path },
            Err(e) => AngleOutcome::Failed { reason: e.to_string() },
        }
    }
}

fn unique_dir_name(label: &str, taken: &mut HashSet<String>) -> String {
    let base = output::sanitize(label);
    let mut candidate = base.clone();
    let mut counter = 2;
    while !taken.insert(candidate.clone()) {
        candidate = format!("{base}-{counter}");
        counter += 1;
    }
    candidate
}
