//! Shared fakes and fixtures for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use collectd_sync::config::{RawSettings, StaticPluginSpec};
use collectd_sync::engine::{Engine, EngineError, EngineState};
use collectd_sync::plugins::PluginInstance;
use collectd_sync::render::{RenderContext, RenderError, Renderer};
use collectd_sync::services::{Orchestration, PortBinding, PortPreference, Service, ServiceInstance};
use collectd_sync::Synchronizer;
use tempfile::TempDir;

/// One call made against the fake engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    InitContext,
    LoadConfig(PathBuf),
    StartAll,
    ReadAll,
    ShutdownForReload,
    ReinitForReload(PathBuf),
    ShutdownAll,
}

/// Engine that records every call. Reads are not recorded individually
/// beyond the first to keep call logs readable.
#[derive(Default)]
pub struct FakeEngine {
    calls: Mutex<Vec<EngineCall>>,
    reload_delay: Mutex<Option<Duration>>,
    seen_read: AtomicBool,
}

#[allow(dead_code)]
impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make `reinit_for_reload` block for `delay`.
    pub fn stall_reloads(&self, delay: Duration) {
        *self.reload_delay.lock().unwrap() = Some(delay);
    }

    /// Let later reloads run at full speed again.
    pub fn resume_reloads(&self) {
        *self.reload_delay.lock().unwrap() = None;
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &EngineCall) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: EngineCall) -> Result<(), EngineError> {
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl Engine for FakeEngine {
    fn init_context(&self) -> Result<(), EngineError> {
        self.record(EngineCall::InitContext)
    }

    fn load_config(&self, path: &Path) -> Result<(), EngineError> {
        self.record(EngineCall::LoadConfig(path.to_path_buf()))
    }

    fn start_all(&self) -> Result<(), EngineError> {
        self.record(EngineCall::StartAll)
    }

    fn read_all(&self) -> Result<(), EngineError> {
        if self.seen_read.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.record(EngineCall::ReadAll)
    }

    fn shutdown_for_reload(&self) -> Result<(), EngineError> {
        self.record(EngineCall::ShutdownForReload)
    }

    fn reinit_for_reload(&self, path: &Path) -> Result<(), EngineError> {
        let delay = *self.reload_delay.lock().unwrap();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        self.record(EngineCall::ReinitForReload(path.to_path_buf()))
    }

    fn shutdown_all(&self) -> Result<(), EngineError> {
        self.record(EngineCall::ShutdownAll)
    }
}

/// Renderer that remembers every plugin list it was given.
#[derive(Default)]
pub struct RecordingRenderer {
    rendered: Mutex<Vec<Vec<PluginInstance>>>,
    fail: AtomicBool,
}

#[allow(dead_code)]
impl RecordingRenderer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_next(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn renders(&self) -> usize {
        self.rendered.lock().unwrap().len()
    }

    pub fn last(&self) -> Vec<PluginInstance> {
        self.rendered.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RenderError::Other("forced failure".into()));
        }
        self.rendered.lock().unwrap().push(ctx.plugins.to_vec());
        let names: Vec<_> = ctx.plugins.iter().map(|p| p.name.as_str()).collect();
        Ok(format!("# plugins: {}\n", names.join(",")))
    }
}

/// Temp directory holding a template map and a target conffile.
pub struct Fixture {
    pub dir: TempDir,
}

#[allow(dead_code)]
impl Fixture {
    pub fn new(template_map: &str) -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("templates")).unwrap();
        fs::write(dir.path().join("templates-map.json"), template_map).unwrap();
        Self { dir }
    }

    pub fn conf_file(&self) -> PathBuf {
        self.dir.path().join("collectd.conf")
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.dir.path().join("templates")
    }

    /// Settings declaring a single static `cpu` plugin.
    pub fn settings(&self) -> RawSettings {
        let mut settings = RawSettings {
            templates_dirs: vec![self.templates_dir().to_string_lossy().into_owned()],
            conf_file: self.conf_file().to_string_lossy().into_owned(),
            templates_map: self
                .dir
                .path()
                .join("templates-map.json")
                .to_string_lossy()
                .into_owned(),
            ..Default::default()
        };
        settings.static_plugins.insert(
            "cpu".into(),
            StaticPluginSpec::from([("plugin", serde_json::json!("cpu"))]),
        );
        settings
    }
}

#[allow(dead_code)]
pub fn redis(id: &str, name: &str, private_port: u16) -> ServiceInstance {
    ServiceInstance {
        id: id.into(),
        service: Service {
            name: name.into(),
            kind: "redis".into(),
        },
        port: PortBinding {
            ip: "10.0.0.5".into(),
            private_port,
            public_port: 0,
        },
        orchestration: Orchestration {
            port_pref: PortPreference::Private,
            ..Default::default()
        },
    }
}

#[allow(dead_code)]
pub async fn wait_for_state(sync: &Synchronizer, target: EngineState) {
    let mut rx = sync.state_changes();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| *s == target))
        .await
        .expect("engine state not reached in time")
        .unwrap();
}
