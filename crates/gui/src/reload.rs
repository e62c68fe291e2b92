//! Background model parsing with a supersede policy.
//!
//! A request is the full list of files making up a scene. At most one parse
//! thread runs. A request made while it is busy replaces whatever request
//! was already waiting, and a finished parse that is no longer the newest
//! request is thrown away. The UI therefore only ever sees the most recently
//! requested scene.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::model::{self, LoadError, LoadedModel};

pub type Loader = Arc<dyn Fn(&Path) -> Result<LoadedModel, LoadError> + Send + Sync>;
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Result of the newest reload request
#[derive(Debug)]
pub enum ReloadOutcome {
    Loaded(Vec<LoadedModel>),
    Failed { path: PathBuf, error: LoadError },
}

struct Finished {
    generation: u64,
    result: Result<Vec<LoadedModel>, (PathBuf, LoadError)>,
}

pub struct ReloadWorker {
    loader: Loader,
    waker: Waker,
    tx: Sender<Finished>,
    rx: Receiver<Finished>,
    /// Generation of the newest request
    generation: u64,
    in_flight: Option<u64>,
    queued: Option<(u64, Vec<PathBuf>)>,
}

impl Default for ReloadWorker {
    fn default() -> Self {
        Self::new(Arc::new(|| {}))
    }
}

impl ReloadWorker {
    /// Worker parsing with [`model::load_model`]. `waker` is called from the
    /// parse thread when a result is ready.
    pub fn new(waker: Waker) -> Self {
        Self::with_loader(Arc::new(|path: &Path| model::load_model(path)), waker)
    }

    pub fn with_loader(loader: Loader, waker: Waker) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            loader,
            waker,
            tx,
            rx,
            generation: 0,
            in_flight: None,
            queued: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some() || self.queued.is_some()
    }

    /// Ask for `paths` to be parsed. Supersedes every earlier request.
    pub fn request(&mut self, paths: Vec<PathBuf>) {
        self.generation += 1;
        if self.in_flight.is_some() {
            if self.queued.replace((self.generation, paths)).is_some() {
                tracing::debug!("Queued reload superseded");
            }
        } else {
            self.spawn(self.generation, paths);
        }
    }

    /// Drop the queued request and mark the running one stale. Its thread
    /// still finishes but the result is discarded.
    pub fn cancel(&mut self) {
        self.generation += 1;
        if self.queued.take().is_some() || self.in_flight.is_some() {
            tracing::debug!("Pending reload cancelled");
        }
    }

    fn spawn(&mut self, generation: u64, paths: Vec<PathBuf>) {
        let loader = self.loader.clone();
        let waker = self.waker.clone();
        let tx = self.tx.clone();
        tracing::debug!("Parsing {} file(s) (request {generation})", paths.len());

        let spawned = std::thread::Builder::new()
            .name("model-reload".into())
            .spawn(move || {
                let result = paths
                    .iter()
                    .map(|path| loader(path).map_err(|e| (path.clone(), e)))
                    .collect();
                if tx.send(Finished { generation, result }).is_ok() {
                    waker();
                }
            });
        match spawned {
            Ok(_) => self.in_flight = Some(generation),
            Err(e) => tracing::error!("Failed to start reload thread: {e}"),
        }
    }

    fn finish(&mut self, finished: Finished) -> Option<ReloadOutcome> {
        if self.in_flight == Some(finished.generation) {
            self.in_flight = None;
        }
        let outcome = if finished.generation == self.generation {
            Some(match finished.result {
                Ok(models) => ReloadOutcome::Loaded(models),
                Err((path, error)) => ReloadOutcome::Failed { path, error },
            })
        } else {
            tracing::debug!("Discarding stale parse (request {})", finished.generation);
            None
        };

        if self.in_flight.is_none() {
            if let Some((generation, paths)) = self.queued.take() {
                self.spawn(generation, paths);
            }
        }
        outcome
    }

    /// Non-blocking: the newest finished result, if any
    pub fn poll(&mut self) -> Option<ReloadOutcome> {
        let mut outcome = None;
        while let Ok(finished) = self.rx.try_recv() {
            if let Some(o) = self.finish(finished) {
                outcome = Some(o);
            }
        }
        outcome
    }

    /// Block until the newest request finishes or `timeout` elapses
    pub fn wait(&mut self, timeout: Duration) -> Option<ReloadOutcome> {
        let deadline = Instant::now() + timeout;
        while self.is_busy() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(finished) => {
                    if let Some(outcome) = self.finish(finished) {
                        return Some(outcome);
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return None
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::model::Aabb;

    fn empty_model(path: &Path) -> LoadedModel {
        LoadedModel {
            path: path.to_path_buf(),
            meshes: Vec::new(),
            bounds: Aabb::EMPTY,
        }
    }

    #[test]
    fn test_single_request() {
        let mut worker = ReloadWorker::with_loader(
            Arc::new(|p: &Path| Ok(empty_model(p))),
            Arc::new(|| {}),
        );
        worker.request(vec![PathBuf::from("a.obj"), PathBuf::from("b.obj")]);
        match worker.wait(Duration::from_secs(5)) {
            Some(ReloadOutcome::Loaded(models)) => {
                assert_eq!(models.len(), 2);
                assert_eq!(models[0].path, PathBuf::from("a.obj"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!worker.is_busy());
    }

    #[test]
    fn test_failure_is_reported() {
        let mut worker = ReloadWorker::new(Arc::new(|| {}));
        worker.request(vec![PathBuf::from("/nonexistent/a.obj")]);
        assert!(matches!(
            worker.wait(Duration::from_secs(5)),
            Some(ReloadOutcome::Failed { .. })
        ));
    }

    #[test]
    fn test_newest_request_wins() {
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let gate = Mutex::new(gate_rx);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let log = calls.clone();

        let loader: Loader = Arc::new(move |p: &Path| {
            log.lock().unwrap().push(p.to_path_buf());
            if p == Path::new("first.obj") {
                gate.lock().unwrap().recv().unwrap();
            }
            Ok(empty_model(p))
        });
        let mut worker = ReloadWorker::with_loader(loader, Arc::new(|| {}));

        worker.request(vec![PathBuf::from("first.obj")]);
        worker.request(vec![PathBuf::from("second.obj")]);
        worker.request(vec![PathBuf::from("third.obj")]);
        assert!(worker.poll().is_none());
        gate_tx.send(()).unwrap();

        match worker.wait(Duration::from_secs(5)) {
            Some(ReloadOutcome::Loaded(models)) => {
                assert_eq!(models[0].path, PathBuf::from("third.obj"))
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            *calls.lock().unwrap(),
            vec![PathBuf::from("first.obj"), PathBuf::from("third.obj")]
        );
    }

    #[test]
    fn test_cancel_discards_running_parse() {
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let gate = Mutex::new(gate_rx);
        let loader: Loader = Arc::new(move |p: &Path| {
            gate.lock().unwrap().recv().unwrap();
            Ok(empty_model(p))
        });
        let mut worker = ReloadWorker::with_loader(loader, Arc::new(|| {}));

        worker.request(vec![PathBuf::from("old.obj")]);
        worker.cancel();
        gate_tx.send(()).unwrap();

        assert!(worker.wait(Duration::from_secs(5)).is_none());
        assert!(!worker.is_busy());
    }

    #[test]
    fn test_waker_called() {
        let woken = Arc::new(Mutex::new(0));
        let counter = woken.clone();
        let mut worker = ReloadWorker::with_loader(
            Arc::new(|p: &Path| Ok(empty_model(p))),
            Arc::new(move || *counter.lock().unwrap() += 1),
        );
        worker.request(vec![PathBuf::from("a.obj")]);
        assert!(worker.wait(Duration::from_secs(5)).is_some());

        // the waker runs right after the result is sent
        let deadline = Instant::now() + Duration::from_secs(5);
        while *woken.lock().unwrap() == 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(*woken.lock().unwrap(), 1);
    }
}
