//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::any::Any;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hotlog::config::properties::{PropertyError, PropertySetters};
use hotlog::config::{Catalog, ConfigError, ReloadOutcome};
use hotlog::layout::Template;
use hotlog::target::{Target, TargetBuilder, TargetCapabilities, TargetDescriptor, TargetError};
use hotlog::ConfigurationManager;
use tokio::sync::broadcast;

/// Write `content` to `dir/name`, returning the path.
pub fn write_config(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Single memory target `mem` with the given layout, receiving every level.
pub fn memory_config(layout: &str, reload_delay_ms: u64) -> String {
    format!(
        r#"
[settings]
reload_delay_ms = {reload_delay_ms}

[[targets]]
name = "mem"
type = "memory"
layout = "{layout}"

[[rules]]
write_to = ["mem"]
"#
    )
}

pub fn memory_logs(manager: &ConfigurationManager, name: &str) -> Vec<String> {
    let target = manager.find_target(name).unwrap();
    target
        .as_any()
        .downcast_ref::<hotlog::target::MemoryTarget>()
        .unwrap()
        .logs()
}

/// Wait until a reload outcome matching `accept` arrives.
pub async fn wait_for_reload<F>(rx: &mut broadcast::Receiver<ReloadOutcome>, accept: F) -> ReloadOutcome
where
    F: Fn(&ReloadOutcome) -> bool,
{
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match rx.recv().await {
                Ok(outcome) if accept(&outcome) => return outcome,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("reload channel closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for reload")
}

/// Lines written by every `collect` target, across all generations.
pub type Collected = Arc<Mutex<Vec<String>>>;

#[derive(Debug)]
struct CollectTarget {
    name: String,
    layout: Template,
    lines: Collected,
}

impl Target for CollectTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn layout(&self) -> &Template {
        &self.layout
    }

    fn emit(&self, rendered: &str) -> Result<(), TargetError> {
        self.lines.lock().unwrap().push(rendered.to_string());
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct CollectBuilder {
    layout: Template,
    lines: Collected,
}

impl CollectBuilder {
    const SETTERS: PropertySetters<Self> =
        PropertySetters::new("target type 'collect'", &[("layout", Self::set_layout)]);

    fn set_layout(&mut self, value: &str) -> Result<(), PropertyError> {
        self.layout = Template::compile(value)?;
        Ok(())
    }
}

impl TargetBuilder for CollectBuilder {
    fn set_property(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        Self::SETTERS.apply(self, name, value)
    }

    fn build(self: Box<Self>, name: String) -> Result<Arc<dyn Target>, ConfigError> {
        Ok(Arc::new(CollectTarget {
            name,
            layout: self.layout,
            lines: self.lines,
        }))
    }
}

/// Builtin catalog plus a `collect` target type whose instances all append
/// to the returned buffer.
pub fn collecting_catalog() -> (Catalog, Collected) {
    let lines: Collected = Arc::new(Mutex::new(Vec::new()));
    let mut catalog = Catalog::with_builtins();
    let shared = lines.clone();
    catalog.register_target(
        TargetDescriptor::new(
            "collect",
            TargetCapabilities {
                renders_layout: true,
                buffered: true,
            },
        ),
        move || {
            Box::new(CollectBuilder {
                layout: Template::default(),
                lines: shared.clone(),
            })
        },
    );
    (catalog, lines)
}
