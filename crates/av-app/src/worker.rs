//! Runs the render pipeline on its own thread so a presentation layer
//! can keep processing events while the blocking network calls happen.

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread::{self, JoinHandle};

use av_core::job::RenderJob;

use crate::client::{ApiKey, ImageBackend};
use crate::render::{CancelToken, GenerationResult, RenderReport, RenderService};

pub enum WorkerCommand {
    Render { job: RenderJob, api_key: ApiKey },
    Shutdown,
}

pub enum WorkerResponse {
    Status(String),
    AngleDone(GenerationResult),
    Finished(RenderReport),
    Error(String),
}

pub struct RenderWorker {
    command_tx: Sender<WorkerCommand>,
    response_rx: Receiver<WorkerResponse>,
    cancel: CancelToken,
    thread_handle: Option<JoinHandle<()>>,
}

impl RenderWorker {
    pub fn spawn<B: ImageBackend + Send + 'static>(backend: B, out_root: PathBuf) -> Self {
        let (cmd_tx, cmd_rx) = channel::<WorkerCommand>();
        let (resp_tx, resp_rx) = channel::<WorkerResponse>();
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();

        let thread_handle = thread::spawn(move || {
            let service = RenderService::new(backend, out_root);

            loop {
                match cmd_rx.recv() {
                    Ok(WorkerCommand::Render { job, api_key }) => {
                        worker_cancel.reset();
                        let _ = resp_tx.send(WorkerResponse::Status(format!(
                            "rendering {} camera angle(s)",
                            job.angle_count()
                        )));

                        let progress_tx = resp_tx.clone();
                        let outcome = service.run_with_progress(
                            &job,
                            &api_key,
                            &worker_cancel,
                            |result| {
                                let _ = progress_tx.send(WorkerResponse::AngleDone(result.clone()));
                            },
                        );
                        match outcome {
                            Ok(report) => {
                                let _ = resp_tx.send(WorkerResponse::Finished(report));
                            }
                            Err(e) => {
                                let _ = resp_tx.send(WorkerResponse::Error(e.to_string()));
                            }
                        }
                    }
                    Ok(WorkerCommand::Shutdown) => {
                        break;
                    }
                    Err(_) => {
                        // Channel closed, exit
                        break;
                    }
                }
            }
        });

        Self { command_tx: cmd_tx, response_rx: resp_rx, cancel, thread_handle: Some(thread_handle) }
    }

    pub fn render(&self, job: RenderJob, api_key: ApiKey) -> Result<(), String> {
        self.command_tx
            .send(WorkerCommand::Render { job, api_key })
            .map_err(|e| format!("Failed to send job to worker: {e}"))
    }

    /// Stop dispatching angles that have not started yet; the in-flight
    /// angle still completes and is reported.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn try_recv_response(&self) -> Option<WorkerResponse> {
        self.response_rx.try_recv().ok()
    }

    /// Blocking receive, for callers without an event loop of their own.
    pub fn recv_response(&self) -> Option<WorkerResponse> {
        self.response_rx.recv().ok()
    }

    pub fn shutdown(&mut self) {
        let _ = self.command_tx.send(WorkerCommand::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerateError;
    use av_core::builder::{AngleDraft, JobDraft, SectionDraft, build};
    use av_core::prompt::GenerationRequest;

    struct OkBackend;

    impl ImageBackend for OkBackend {
        fn generate(
            &self,
            _request: &GenerationRequest,
            _api_key: &ApiKey,
        ) -> Result<Vec<u8>, GenerateError> {
            Ok(b"\x89PNG\r\n\x1a\n".to_vec())
        }
    }

    #[test]
    fn test_worker_reports_each_angle_then_finishes() {
        let out = tempfile::tempdir().unwrap();
        let mut worker = RenderWorker::spawn(OkBackend, out.path().to_path_buf());

        let job = build(&JobDraft {
            exterior: SectionDraft {
                angles: vec![
                    AngleDraft { name: "front".into(), description: String::new() },
                    AngleDraft { name: "side".into(), description: String::new() },
                ],
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();

        worker.render(job, ApiKey::new("k")).unwrap();

        let mut angles_done = 0;
        let report = loop {
            match worker.recv_response() {
                Some(WorkerResponse::AngleDone(result)) => {
                    assert!(result.succeeded());
                    angles_done += 1;
                }
                Some(WorkerResponse::Finished(report)) => break report,
                Some(WorkerResponse::Status(_)) => {}
                Some(WorkerResponse::Error(e)) => panic!("worker failed: {e}"),
                None => panic!("worker hung up"),
            }
        };

        assert_eq!(angles_done, 2);
        assert_eq!(report.succeeded(), 2);
        worker.shutdown();
    }
}
