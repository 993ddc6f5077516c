//! Built-in template renderer.
//!
//! Emits the engine globals followed by every template of every plugin, in
//! plugin order. Templates are plain text with `{{name}}`, `{{type}}`,
//! `{{host}}`, `{{port}}` and `{{dims}}` placeholders, plus
//! `{{config.<key>}}` for scalar entries of the plugin's extra settings.

use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde_json::Value;

use crate::plugins::PluginInstance;
use crate::render::{RenderContext, RenderError, Renderer};

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    pub fn new() -> Self {
        Self
    }

    fn load_template(&self, dirs: &[PathBuf], plugin: &PluginInstance, name: &str) -> Result<String, RenderError> {
        for dir in dirs {
            let path = dir.join(name);
            match fs::read_to_string(&path) {
                Ok(text) => return Ok(text),
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(source) => return Err(RenderError::Io { path, source }),
            }
        }
        Err(RenderError::TemplateNotFound {
            template: name.to_string(),
            plugin: plugin.name.clone(),
        })
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        let mut out = String::new();
        let fmt_err = |e: std::fmt::Error| RenderError::Other(e.to_string());

        if !ctx.globals.hostname.is_empty() {
            writeln!(out, "Hostname \"{}\"", ctx.globals.hostname).map_err(fmt_err)?;
        }
        writeln!(out, "Interval {}", ctx.globals.interval_secs).map_err(fmt_err)?;
        if !ctx.plugins_dir.as_os_str().is_empty() {
            writeln!(out, "PluginDir \"{}\"", ctx.plugins_dir.display()).map_err(fmt_err)?;
        }

        for plugin in ctx.plugins {
            for name in &plugin.templates {
                let template = self.load_template(ctx.templates_dirs, plugin, name)?;
                out.push('\n');
                out.push_str(&substitute(&template, plugin));
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
        }

        Ok(out)
    }
}

fn substitute(template: &str, plugin: &PluginInstance) -> String {
    let mut text = template
        .replace("{{name}}", &plugin.name)
        .replace("{{type}}", plugin.plugin_type.as_str())
        .replace("{{host}}", &plugin.host)
        .replace("{{port}}", &plugin.port.to_string())
        .replace("{{dims}}", &plugin.dims);

    for (key, value) in &plugin.config {
        let scalar = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            // Arrays, objects and nulls have no single textual form.
            _ => continue,
        };
        text = text.replace(&format!("{{{{config.{key}}}}}"), &scalar);
    }
    text
}
