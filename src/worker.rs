//! One translation job on its own thread.
//!
//! The worker reads and extracts the input, translates it, then asks its caller
//! where to save through [`WorkerEvent::SaveRequested`] and sleeps until
//! [`Worker::provide_save_path`] or [`Worker::abort`] wakes it. Every exit path,
//! panics included, ends with exactly one [`WorkerEvent::Finished`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::config::LanguagePair;
use crate::error::Error;
use crate::format::{self, Source};
use crate::gateway::{self, TranslationGateway};
use crate::model::Extraction;

pub type JobId = u64;

const ABORT_GRACE: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Reading,
    Extracting,
    Translating,
    AwaitingSavePath,
    Writing,
    Succeeded,
    Failed,
    Cancelled,
}

impl WorkerState {
    pub fn is_finished(self) -> bool {
        matches!(self, WorkerState::Succeeded | WorkerState::Failed | WorkerState::Cancelled)
    }
}

#[derive(Clone, Debug)]
pub struct Job {
    pub input: PathBuf,
    pub from_code: String,
    pub to_code: String,
}

impl Job {
    pub fn new(input: impl Into<PathBuf>, pair: &LanguagePair) -> Self {
        Self {
            input: input.into(),
            from_code: pair.from.clone(),
            to_code: pair.to.clone(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct WorkerOptions {
    /// Give up waiting for a save location after this long. `None` waits until aborted.
    pub save_timeout: Option<Duration>,
}

#[derive(Debug)]
pub enum JobOutcome {
    Saved(PathBuf),
    Failed(Error),
    Cancelled,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Saved(_))
    }

    /// The saved path on success, the error text on failure, empty when cancelled.
    pub fn message(&self) -> String {
        match self {
            JobOutcome::Saved(path) => path.display().to_string(),
            JobOutcome::Failed(e) => e.to_string(),
            JobOutcome::Cancelled => String::new(),
        }
    }
}

#[derive(Debug)]
pub enum WorkerEvent {
    SaveRequested {
        job: JobId,
        default_name: String,
        translated_text: String,
    },
    Finished {
        job: JobId,
        outcome: JobOutcome,
    },
}

enum SaveDecision {
    Pending,
    Path(PathBuf),
    Declined,
}

struct Control {
    state: WorkerState,
    save: SaveDecision,
    aborted: bool,
    exited: bool,
}

struct Shared {
    control: Mutex<Control>,
    changed: Condvar,
}

fn undecided(control: &mut Control) -> bool {
    !control.aborted && matches!(control.save, SaveDecision::Pending)
}

impl Shared {
    fn set_state(&self, job: JobId, state: WorkerState) {
        let mut control = self.control.lock();
        log::debug!("job {job}: {:?} -> {state:?}", control.state);
        control.state = state;
        self.changed.notify_all();
    }

    fn checkpoint(&self) -> Result<(), Error> {
        if self.control.lock().aborted {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    fn cancel(&self) {
        let mut control = self.control.lock();
        control.aborted = true;
        self.changed.notify_all();
    }

    fn await_save_path(&self, timeout: Option<Duration>) -> Result<PathBuf, Error> {
        let mut control = self.control.lock();
        match timeout {
            Some(limit) => {
                self.changed.wait_while_for(&mut control, undecided, limit);
            }
            None => self.changed.wait_while(&mut control, undecided),
        }
        if control.aborted {
            return Err(Error::Cancelled);
        }
        match &control.save {
            SaveDecision::Path(path) => Ok(path.clone()),
            SaveDecision::Declined => Err(Error::Cancelled),
            SaveDecision::Pending => {
                log::warn!("no save location chosen in time");
                Err(Error::Cancelled)
            }
        }
    }
}

/// Handle to a running job. Dropping it cancels the job at its next checkpoint.
pub struct Worker {
    id: JobId,
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn(
        id: JobId,
        job: Job,
        gateway: Arc<dyn TranslationGateway>,
        options: WorkerOptions,
        events: Sender<WorkerEvent>,
    ) -> Result<Worker, Error> {
        let shared = Arc::new(Shared {
            control: Mutex::new(Control {
                state: WorkerState::Idle,
                save: SaveDecision::Pending,
                aborted: false,
                exited: false,
            }),
            changed: Condvar::new(),
        });

        let run = JobRun {
            id,
            job,
            gateway,
            options,
            shared: Arc::clone(&shared),
            events,
        };
        let thread = std::thread::Builder::new()
            .name(format!("translate-job-{id}"))
            .spawn(move || run.execute())?;

        Ok(Worker { id, shared, thread: Some(thread) })
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn state(&self) -> WorkerState {
        self.shared.control.lock().state
    }

    /// Answers the save request. An empty path means the user cancelled the save.
    /// Returns false if a decision was already made or the job is over.
    pub fn provide_save_path(&self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        let mut control = self.shared.control.lock();
        if control.exited || !matches!(control.save, SaveDecision::Pending) {
            return false;
        }
        control.save = if path.as_os_str().is_empty() {
            SaveDecision::Declined
        } else {
            SaveDecision::Path(path)
        };
        self.shared.changed.notify_all();
        true
    }

    /// Requests cancellation and waits briefly for the worker to exit. A call into
    /// the engine is never interrupted; it is noticed once that call returns.
    pub fn abort(&self) {
        let mut control = self.shared.control.lock();
        if !control.aborted {
            log::info!("aborting job {}", self.id);
        }
        control.aborted = true;
        self.shared.changed.notify_all();
        if !control.exited {
            self.shared
                .changed
                .wait_while_for(&mut control, |c| !c.exited, ABORT_GRACE);
        }
    }

    /// Blocks until the worker thread has finished.
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("job {} thread panicked outside the job", self.id);
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shared.cancel();
    }
}

struct JobRun {
    id: JobId,
    job: Job,
    gateway: Arc<dyn TranslationGateway>,
    options: WorkerOptions,
    shared: Arc<Shared>,
    events: Sender<WorkerEvent>,
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return s.to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "worker panicked".to_string()
}

impl JobRun {
    fn execute(self) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.run()));
        let outcome = match result {
            Ok(Ok(path)) => JobOutcome::Saved(path),
            Ok(Err(Error::Cancelled)) => JobOutcome::Cancelled,
            Ok(Err(e)) => JobOutcome::Failed(e),
            Err(payload) => JobOutcome::Failed(Error::Internal(panic_message(payload))),
        };

        let state = match &outcome {
            JobOutcome::Saved(path) => {
                log::info!("job {}: saved {}", self.id, path.display());
                WorkerState::Succeeded
            }
            JobOutcome::Failed(e) => {
                log::error!("job {}: {e}", self.id);
                WorkerState::Failed
            }
            JobOutcome::Cancelled => {
                log::info!("job {}: cancelled", self.id);
                WorkerState::Cancelled
            }
        };
        {
            let mut control = self.shared.control.lock();
            control.state = state;
            control.exited = true;
            self.shared.changed.notify_all();
        }

        let _ = self.events.send(WorkerEvent::Finished { job: self.id, outcome });
    }

    fn run(&self) -> Result<PathBuf, Error> {
        let input = &self.job.input;

        self.shared.set_state(self.id, WorkerState::Reading);
        if !input.is_file() {
            return Err(Error::InputNotFound(input.clone()));
        }

        self.shared.set_state(self.id, WorkerState::Extracting);
        let mut source = Source::open(input)?;
        let extraction = source.extract()?;
        log::info!(
            "job {}: {} lines to translate from {}",
            self.id,
            extraction.source_text.split('\n').count(),
            input.display()
        );
        self.shared.checkpoint()?;

        self.shared.set_state(self.id, WorkerState::Translating);
        let translated = self.translate(&extraction.source_text)?;
        self.shared.checkpoint()?;

        self.shared.set_state(self.id, WorkerState::AwaitingSavePath);
        let default_name = format::default_output_name(input, &self.job.to_code);
        let _ = self.events.send(WorkerEvent::SaveRequested {
            job: self.id,
            default_name,
            translated_text: translated.clone(),
        });
        let save_path = self.shared.await_save_path(self.options.save_timeout)?;

        self.shared.set_state(self.id, WorkerState::Writing);
        self.write(&mut source, &extraction, &translated, &save_path)
            .map_err(|e| match e {
                Error::IoFailure(_) => e,
                other => Error::IoFailure(other.to_string()),
            })?;
        Ok(save_path)
    }

    fn translate(&self, text: &str) -> Result<String, Error> {
        let translator =
            gateway::translator_for(self.gateway.as_ref(), &self.job.from_code, &self.job.to_code)?;
        translator.translate(text)
    }

    fn write(
        &self,
        source: &mut Source,
        extraction: &Extraction,
        translated: &str,
        save_path: &Path,
    ) -> Result<(), Error> {
        if format::is_same_file(&self.job.input, save_path) {
            return Err(Error::IoFailure("refusing to overwrite the input file".into()));
        }
        let bytes = source.render(extraction, translated)?;
        std::fs::write(save_path, bytes)?;
        Ok(())
    }
}
