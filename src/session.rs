use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::config::LanguagePair;
use crate::error::Error;
use crate::gateway::TranslationGateway;
use crate::worker::{Job, JobId, Worker, WorkerEvent, WorkerOptions, WorkerState};

/// Owns at most one running job for a caller (a window, a CLI run). Starting a
/// new job aborts and disposes of the previous one.
pub struct Session {
    gateway: Arc<dyn TranslationGateway>,
    package: Option<LanguagePair>,
    options: WorkerOptions,
    events: Sender<WorkerEvent>,
    current: Option<Worker>,
    next_job: JobId,
}

impl Session {
    pub fn new(
        gateway: Arc<dyn TranslationGateway>,
        package: Option<LanguagePair>,
        options: WorkerOptions,
    ) -> (Session, Receiver<WorkerEvent>) {
        let (events, receiver) = mpsc::channel();
        let session = Session {
            gateway,
            package,
            options,
            events,
            current: None,
            next_job: 1,
        };
        (session, receiver)
    }

    pub fn package(&self) -> Option<&LanguagePair> {
        self.package.as_ref()
    }

    pub fn set_package(&mut self, package: Option<LanguagePair>) {
        self.package = package;
    }

    pub fn start(&mut self, input: impl Into<PathBuf>) -> Result<JobId, Error> {
        let pair = self.package.clone().ok_or(Error::NoPackageSelected)?;

        if let Some(previous) = self.current.take() {
            previous.abort();
        }

        let id = self.next_job;
        self.next_job += 1;
        let worker = Worker::spawn(
            id,
            Job::new(input, &pair),
            Arc::clone(&self.gateway),
            self.options.clone(),
            self.events.clone(),
        )?;
        log::info!("started job {id} ({pair})");
        self.current = Some(worker);
        Ok(id)
    }

    pub fn current_job(&self) -> Option<JobId> {
        self.current.as_ref().map(Worker::id)
    }

    pub fn state(&self) -> Option<WorkerState> {
        self.current.as_ref().map(Worker::state)
    }

    /// Forwards the caller's save decision to the current job; empty cancels.
    pub fn provide_save_path(&self, path: impl Into<PathBuf>) -> bool {
        match &self.current {
            Some(worker) => worker.provide_save_path(path),
            None => false,
        }
    }

    pub fn abort(&mut self) {
        if let Some(worker) = self.current.take() {
            worker.abort();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.abort();
    }
}
