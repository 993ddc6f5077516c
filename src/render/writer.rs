//! Config persistence.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::SyncConfig;
use crate::plugins::PluginInstance;
use crate::render::{EngineGlobals, RenderContext, RenderError, Renderer};

/// Permission bits of the generated config file.
pub const CONF_FILE_MODE: u32 = 0o644;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to write engine config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Renders plugin lists and persists them at the configured path.
pub struct ConfigWriter {
    hostname: String,
    renderer: Arc<dyn Renderer>,
}

impl ConfigWriter {
    /// `hostname` is advertised to the engine; pass an empty string to let
    /// the engine resolve it.
    pub fn new(hostname: impl Into<String>, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            hostname: hostname.into(),
            renderer,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Render `plugins` and replace `config.conf_file` with the result.
    pub fn write(&self, config: &SyncConfig, plugins: &[PluginInstance]) -> Result<(), WriteError> {
        let text = self.render(config, plugins)?;
        write_atomic(&config.conf_file, text.as_bytes())?;

        tracing::info!(
            path = ?config.conf_file,
            plugins = plugins.len(),
            bytes = text.len(),
            "Wrote engine config"
        );
        Ok(())
    }

    /// Render without touching the filesystem.
    pub fn render(&self, config: &SyncConfig, plugins: &[PluginInstance]) -> Result<String, RenderError> {
        let globals = EngineGlobals {
            hostname: self.hostname.clone(),
            interval_secs: config.interval.as_secs(),
        };

        self.renderer.render(&RenderContext {
            plugins_dir: &config.plugins_dir,
            templates_dirs: &config.templates_dirs,
            globals: &globals,
            plugins,
        })
    }
}

/// Write to a sibling temp file, then rename it over `path`.
fn write_atomic(path: &Path, data: &[u8]) -> Result<(), WriteError> {
    let io_err = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(CONF_FILE_MODE);
    }

    let result = (|| -> std::io::Result<()> {
        let mut file = options.open(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(CONF_FILE_MODE))?;
        }
        fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result.map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChangeDetection, TemplateMap};
    use crate::plugins::PluginType;
    use std::collections::BTreeMap;
    use std::time::Duration;
    use tempfile::TempDir;

    struct FixedRenderer(Result<&'static str, &'static str>);

    impl Renderer for FixedRenderer {
        fn render(&self, ctx: &RenderContext<'_>) -> Result<String, RenderError> {
            match self.0 {
                Ok(text) => Ok(format!("{} host={} n={}", text, ctx.globals.hostname, ctx.plugins.len())),
                Err(e) => Err(RenderError::Other(e.to_string())),
            }
        }
    }

    fn config(conf_file: PathBuf) -> SyncConfig {
        SyncConfig {
            templates_dirs: vec![],
            conf_file,
            plugins_dir: PathBuf::new(),
            template_map: TemplateMap::default(),
            static_plugins: BTreeMap::new(),
            interval: Duration::from_secs(10),
            change_detection: ChangeDetection::Positional,
            reload_timeout: None,
        }
    }

    #[test]
    fn test_write_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("collectd.conf");
        fs::write(&path, "old").unwrap();

        let writer = ConfigWriter::new("agent-1", Arc::new(FixedRenderer(Ok("new"))));
        writer
            .write(&config(path.clone()), &[PluginInstance::new(PluginType::Cpu, "cpu")])
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new host=agent-1 n=1");
        assert!(!dir.path().join("collectd.conf.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_sets_fixed_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("collectd.conf");

        let writer = ConfigWriter::new("", Arc::new(FixedRenderer(Ok("x"))));
        writer.write(&config(path.clone()), &[]).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, CONF_FILE_MODE);
    }

    #[test]
    fn test_render_failure_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("collectd.conf");
        fs::write(&path, "old").unwrap();

        let writer = ConfigWriter::new("", Arc::new(FixedRenderer(Err("boom"))));
        let err = writer.write(&config(path.clone()), &[]).unwrap_err();

        assert!(matches!(err, WriteError::Render(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
    }

    #[test]
    fn test_write_failure_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("collectd.conf");

        let writer = ConfigWriter::new("", Arc::new(FixedRenderer(Ok("x"))));
        let err = writer.write(&config(path), &[]).unwrap_err();

        assert!(matches!(err, WriteError::Io { .. }));
        assert!(err.to_string().contains("collectd.conf"));
    }
}
