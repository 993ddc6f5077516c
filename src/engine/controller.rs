//! Engine lifecycle controller.
//!
//! # Responsibilities
//! - Start and stop the supervision loop
//! - Hand reload requests to the loop and wait until they are applied
//! - Drive the engine's read cycle at a fixed interval

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::engine::state::{EngineState, LifecycleError};
use crate::engine::{Engine, EngineError};
use crate::observability::metrics;

/// Longest read interval the loop accepts; longer ones are clamped.
pub const MAX_INTERVAL: Duration = Duration::from_secs(crate::config::MAX_INTERVAL_SECS);

enum Signal {
    Stop,
    Reload(PathBuf),
}

struct Supervisor {
    signals: mpsc::Sender<Signal>,
    task: JoinHandle<()>,
    stopping: bool,
}

impl Supervisor {
    fn is_alive(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Supervises the engine through start, read, reload and stop.
pub struct LifecycleController {
    engine: Arc<dyn Engine>,
    state: Arc<watch::Sender<EngineState>>,
    supervisor: Mutex<Option<Supervisor>>,
}

impl LifecycleController {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        let (state, _) = watch::channel(EngineState::Stopped);
        Self {
            engine,
            state: Arc::new(state),
            supervisor: Mutex::new(None),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        *self.state.borrow()
    }

    /// Receiver observing every state transition.
    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.state.subscribe()
    }

    /// Whether a supervision loop exists, including one still initializing.
    pub async fn is_active(&self) -> bool {
        self.supervisor
            .lock()
            .await
            .as_ref()
            .is_some_and(Supervisor::is_alive)
    }

    /// Spawn the supervision loop and return immediately.
    ///
    /// The loop loads `conf_file` into the engine and then moves the state to
    /// `Running`. Must be called from within a Tokio runtime.
    pub async fn start(&self, conf_file: PathBuf, interval: Duration) -> Result<(), LifecycleError> {
        let mut supervisor = self.supervisor.lock().await;
        self.settle_previous(&mut supervisor).await?;

        let interval = interval.min(MAX_INTERVAL);
        tracing::info!(conf_file = ?conf_file, interval_ms = interval.as_millis() as u64, "Starting engine");

        let (signals, rx) = mpsc::channel(1);
        let task = tokio::spawn(supervise(
            Arc::clone(&self.engine),
            Arc::clone(&self.state),
            rx,
            conf_file,
            interval,
        ));
        *supervisor = Some(Supervisor {
            signals,
            task,
            stopping: false,
        });
        Ok(())
    }

    /// Fail with `AlreadyRunning` unless a new loop could be started now.
    pub async fn ensure_startable(&self) -> Result<(), LifecycleError> {
        let mut supervisor = self.supervisor.lock().await;
        self.settle_previous(&mut supervisor).await
    }

    /// Clear out the previous loop: join it when it was told to stop, and
    /// reset the state when it exited without reporting `Stopped`.
    async fn settle_previous(&self, supervisor: &mut Option<Supervisor>) -> Result<(), LifecycleError> {
        if let Some(previous) = supervisor.take() {
            if previous.is_alive() && !previous.stopping {
                *supervisor = Some(previous);
                return Err(LifecycleError::AlreadyRunning);
            }
            if let Err(e) = previous.task.await {
                tracing::error!(error = %e, "Supervision loop terminated abnormally");
            }
        }

        if self.state() != EngineState::Stopped {
            tracing::warn!(state = %self.state(), "Supervision loop gone, resetting state");
            set_state(&self.state, EngineState::Stopped);
        }
        Ok(())
    }

    /// Ask the loop to shut the engine down. Returns once the request is
    /// handed over; a no-op when nothing is running.
    pub async fn stop(&self) {
        let signals = match self.supervisor.lock().await.as_mut() {
            Some(s) if s.is_alive() => {
                s.stopping = true;
                s.signals.clone()
            }
            _ => {
                tracing::debug!("Engine already stopped");
                return;
            }
        };

        tracing::info!("Stopping engine");
        if signals.send(Signal::Stop).await.is_err() {
            tracing::debug!("Supervision loop exited before stop was delivered");
        }
    }

    /// Reload the engine with `conf_file` and wait until the loop is done.
    ///
    /// A reload still in flight is waited out first, so the new file is
    /// always loaded by a fresh reload. Returns `Ok(())` without touching the
    /// engine when it is not running. With `timeout` set, each wait gives up
    /// after it elapses and leaves the loop to finish on its own.
    pub async fn reload(&self, conf_file: PathBuf, timeout: Option<Duration>) -> Result<(), LifecycleError> {
        let signals = match self.supervisor.lock().await.as_ref() {
            Some(s) => s.signals.clone(),
            None => return Ok(()),
        };

        let mut rx = self.state.subscribe();
        loop {
            let claimed = self.state.send_if_modified(|state| {
                if *state == EngineState::Running {
                    *state = EngineState::Reloading;
                    true
                } else {
                    false
                }
            });
            if claimed {
                break;
            }
            if self.state() != EngineState::Reloading {
                tracing::debug!(state = %self.state(), "Engine not running, skipping reload");
                return Ok(());
            }
            tracing::debug!("Previous reload still in progress, waiting");
            settle(&mut rx, timeout).await?;
        }
        metrics::record_engine_state(EngineState::Reloading);

        let started = Instant::now();
        if signals.send(Signal::Reload(conf_file)).await.is_err() {
            set_state(&self.state, EngineState::Stopped);
            return Err(LifecycleError::LoopExited);
        }
        settle(&mut rx, timeout).await?;

        metrics::record_reload(started.elapsed());
        tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "Engine reloaded");
        Ok(())
    }
}

/// Wait until the state leaves `Reloading`, bounded by `timeout`.
async fn settle(rx: &mut watch::Receiver<EngineState>, timeout: Option<Duration>) -> Result<(), LifecycleError> {
    let settled = rx.wait_for(|state| *state != EngineState::Reloading);
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, settled).await {
            Ok(result) => result.map(|_| ()),
            Err(_) => {
                tracing::warn!(timeout_ms = limit.as_millis() as u64, "Engine reload timed out");
                return Err(LifecycleError::ReloadTimedOut(limit));
            }
        },
        None => settled.await.map(|_| ()),
    };
    result.map_err(|_| LifecycleError::LoopExited)
}

fn set_state(state: &watch::Sender<EngineState>, next: EngineState) {
    state.send_replace(next);
    metrics::record_engine_state(next);
}

/// Run one blocking engine operation off the async workers.
async fn call_engine<F>(engine: &Arc<dyn Engine>, op: F) -> Result<(), EngineError>
where
    F: FnOnce(&dyn Engine) -> Result<(), EngineError> + Send + 'static,
{
    let engine = Arc::clone(engine);
    match tokio::task::spawn_blocking(move || op(engine.as_ref())).await {
        Ok(result) => result,
        Err(e) => Err(EngineError::new("call", e.to_string())),
    }
}

async fn supervise(
    engine: Arc<dyn Engine>,
    state: Arc<watch::Sender<EngineState>>,
    mut signals: mpsc::Receiver<Signal>,
    conf_file: PathBuf,
    interval: Duration,
) {
    let init = call_engine(&engine, move |e| {
        e.init_context()?;
        e.load_config(&conf_file)?;
        e.start_all()
    })
    .await;
    if let Err(e) = init {
        tracing::error!(error = %e, "Engine initialization failed");
    }
    set_state(&state, EngineState::Running);

    loop {
        let deadline = Instant::now() + interval;

        if let Err(e) = call_engine(&engine, |e| e.read_all()).await {
            tracing::warn!(error = %e, "Engine read failed");
        }

        loop {
            tokio::select! {
                biased;

                signal = signals.recv() => match signal {
                    Some(Signal::Reload(conf_file)) => {
                        tracing::info!(conf_file = ?conf_file, "Engine reload requested");
                        set_state(&state, EngineState::Reloading);
                        let reload = call_engine(&engine, move |e| {
                            e.shutdown_for_reload()?;
                            e.init_context()?;
                            e.load_config(&conf_file)?;
                            e.reinit_for_reload(&conf_file)
                        })
                        .await;
                        if let Err(e) = reload {
                            tracing::error!(error = %e, "Engine reload failed");
                        }
                        set_state(&state, EngineState::Running);
                    }
                    Some(Signal::Stop) | None => {
                        tracing::info!("Engine stop requested");
                        if let Err(e) = call_engine(&engine, |e| e.shutdown_all()).await {
                            tracing::error!(error = %e, "Engine shutdown failed");
                        }
                        set_state(&state, EngineState::Stopped);
                        return;
                    }
                },
                _ = tokio::time::sleep_until(deadline) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingEngine {
        reads: AtomicUsize,
        loads: AtomicUsize,
        shutdowns: AtomicUsize,
    }

    impl Engine for CountingEngine {
        fn init_context(&self) -> Result<(), EngineError> {
            Ok(())
        }
        fn load_config(&self, _path: &Path) -> Result<(), EngineError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn start_all(&self) -> Result<(), EngineError> {
            Ok(())
        }
        fn read_all(&self) -> Result<(), EngineError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn shutdown_for_reload(&self) -> Result<(), EngineError> {
            Ok(())
        }
        fn reinit_for_reload(&self, _path: &Path) -> Result<(), EngineError> {
            Ok(())
        }
        fn shutdown_all(&self) -> Result<(), EngineError> {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn wait_for_state(controller: &LifecycleController, target: EngineState) {
        let mut rx = controller.subscribe();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| *s == target))
            .await
            .expect("state not reached")
            .unwrap();
    }

    #[tokio::test]
    async fn test_start_reload_stop() {
        let engine = Arc::new(CountingEngine::default());
        let controller = LifecycleController::new(engine.clone());

        controller
            .start(PathBuf::from("/tmp/collectd.conf"), Duration::from_millis(20))
            .await
            .unwrap();
        wait_for_state(&controller, EngineState::Running).await;

        controller
            .reload(PathBuf::from("/tmp/collectd.conf"), Some(Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(controller.state(), EngineState::Running);
        assert_eq!(engine.loads.load(Ordering::SeqCst), 2);

        controller.stop().await;
        wait_for_state(&controller, EngineState::Stopped).await;
        assert_eq!(engine.shutdowns.load(Ordering::SeqCst), 1);
        assert!(engine.reads.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_reads_repeat_every_interval() {
        let engine = Arc::new(CountingEngine::default());
        let controller = LifecycleController::new(engine.clone());

        controller
            .start(PathBuf::from("/tmp/collectd.conf"), Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(engine.reads.load(Ordering::SeqCst) >= 3);
        controller.stop().await;
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let controller = LifecycleController::new(Arc::new(CountingEngine::default()));
        let conf = PathBuf::from("/tmp/collectd.conf");

        controller.start(conf.clone(), Duration::from_secs(10)).await.unwrap();
        assert_eq!(
            controller.start(conf, Duration::from_secs(10)).await,
            Err(LifecycleError::AlreadyRunning)
        );
        controller.stop().await;
    }

    #[tokio::test]
    async fn test_oversized_interval_is_clamped() {
        let engine = Arc::new(CountingEngine::default());
        let controller = LifecycleController::new(engine.clone());
        let conf = PathBuf::from("/tmp/collectd.conf");

        controller.start(conf.clone(), Duration::MAX).await.unwrap();
        wait_for_state(&controller, EngineState::Running).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(controller.is_active().await);

        controller.stop().await;
        wait_for_state(&controller, EngineState::Stopped).await;
        controller.start(conf, Duration::from_secs(10)).await.unwrap();
        wait_for_state(&controller, EngineState::Running).await;
        controller.stop().await;
    }

    #[tokio::test]
    async fn test_start_immediately_after_stop() {
        let engine = Arc::new(CountingEngine::default());
        let controller = LifecycleController::new(engine.clone());
        let conf = PathBuf::from("/tmp/collectd.conf");

        controller.start(conf.clone(), Duration::from_secs(10)).await.unwrap();
        wait_for_state(&controller, EngineState::Running).await;
        controller.stop().await;

        // The previous loop is joined, not reported as still running.
        controller.start(conf, Duration::from_secs(10)).await.unwrap();
        wait_for_state(&controller, EngineState::Running).await;
        assert_eq!(engine.shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(engine.loads.load(Ordering::SeqCst), 2);
        controller.stop().await;
    }

    #[tokio::test]
    async fn test_reload_and_stop_are_noops_when_stopped() {
        let engine = Arc::new(CountingEngine::default());
        let controller = LifecycleController::new(engine.clone());

        controller
            .reload(PathBuf::from("/tmp/collectd.conf"), None)
            .await
            .unwrap();
        controller.stop().await;

        assert_eq!(controller.state(), EngineState::Stopped);
        assert_eq!(engine.loads.load(Ordering::SeqCst), 0);
        assert_eq!(engine.shutdowns.load(Ordering::SeqCst), 0);
        assert!(!controller.is_active().await);
    }
}
