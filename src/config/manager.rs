//! Owner of the published routing table.
//!
//! # Responsibilities
//! - Build the initial table and every reloaded one
//! - Publish new tables with a single atomic store
//! - Run the reload loop fed by the change debouncer
//!
//! # Data Flow
//! ```text
//! file write → ChangeDebouncer (latch) → trigger channel
//!     → reload loop: settle delay → reset latch → spawn_blocking(reload)
//!     → ConfigSource::load → build_routing_table → ArcSwap::swap
//!     → previous table flushed and dropped once no dispatch holds it
//! ```
//!
//! # Design Decisions
//! - A failed reload never replaces the published table
//! - Reloads are serialized by the state lock; dispatch never takes it
//! - The latch is reset before rebuilding so edits made during a reload
//!   trigger another one

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::config::builder::build_routing_table;
use crate::config::catalog::Catalog;
use crate::config::error::ConfigError;
use crate::config::schema::{LoggingConfig, SettingsConfig};
use crate::config::source::{ConfigSource, StaticConfigSource};
use crate::config::watcher::ChangeDebouncer;
use crate::event::{LogEvent, SeverityLevel};
use crate::observability::metrics;
use crate::routing::RoutingTable;
use crate::target::Target;

/// Result of a reload attempt, broadcast to `subscribe_reloads` receivers.
#[derive(Debug, Clone)]
pub enum ReloadOutcome {
    Reloaded { generation: u64 },
    /// The table of `generation` stays published.
    Failed { generation: u64, error: Arc<ConfigError> },
}

struct ReloadState {
    generation: u64,
    settings: SettingsConfig,
    files: Vec<PathBuf>,
}

pub struct ConfigurationManager {
    current: ArcSwap<RoutingTable>,
    catalog: Catalog,
    source: Box<dyn ConfigSource>,
    debouncer: ChangeDebouncer,
    state: Mutex<ReloadState>,
    watching: AtomicBool,
    trigger_rx: Mutex<Option<mpsc::UnboundedReceiver<()>>>,
    reload_tx: broadcast::Sender<ReloadOutcome>,
}

impl ConfigurationManager {
    /// Load the initial configuration from `source`. Fails if it does not
    /// build.
    pub fn new<S>(source: S, catalog: Catalog) -> Result<Self, ConfigError>
    where
        S: ConfigSource + 'static,
    {
        let loaded = source.load()?;
        let table = build_routing_table(&loaded.config, &catalog, 1)?;

        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        let debouncer = ChangeDebouncer::new(move || {
            let _ = trigger_tx.send(());
        });
        let (reload_tx, _) = broadcast::channel(16);

        tracing::info!(
            files = loaded.files.len(),
            targets = loaded.config.targets.len(),
            rules = loaded.config.rules.len(),
            "Logging configuration loaded"
        );
        metrics::set_generation(1);

        Ok(Self {
            current: ArcSwap::from_pointee(table),
            catalog,
            source: Box::new(source),
            debouncer,
            state: Mutex::new(ReloadState {
                generation: 1,
                settings: loaded.config.settings,
                files: loaded.files,
            }),
            watching: AtomicBool::new(false),
            trigger_rx: Mutex::new(Some(trigger_rx)),
            reload_tx,
        })
    }

    /// Manager over an in-memory configuration with the builtin catalog.
    pub fn from_config(config: LoggingConfig) -> Result<Self, ConfigError> {
        Self::new(StaticConfigSource::new(config), Catalog::with_builtins())
    }

    /// Route `event` through the current table. Returns the number of targets
    /// invoked.
    pub fn dispatch(&self, event: &LogEvent) -> usize {
        self.current.load().dispatch(event)
    }

    pub fn is_enabled(&self, level: SeverityLevel, logger: &str) -> bool {
        self.current.load().is_enabled(level, logger)
    }

    /// The currently published table. Holding it keeps that generation alive.
    pub fn snapshot(&self) -> Arc<RoutingTable> {
        self.current.load_full()
    }

    pub fn generation(&self) -> u64 {
        self.current.load().generation()
    }

    pub fn find_target(&self, name: &str) -> Option<Arc<dyn Target>> {
        self.current.load().find_target(name).cloned()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn debouncer(&self) -> &ChangeDebouncer {
        &self.debouncer
    }

    pub fn subscribe_reloads(&self) -> broadcast::Receiver<ReloadOutcome> {
        self.reload_tx.subscribe()
    }

    pub fn flush(&self) {
        self.current.load().flush();
    }

    /// Reload from the source and publish on success.
    pub fn reload(&self) -> ReloadOutcome {
        let mut state = self.lock_state();
        let next = state.generation + 1;

        let result = self.source.load().and_then(|loaded| {
            let table = build_routing_table(&loaded.config, &self.catalog, next)?;
            Ok((loaded, table))
        });

        match result {
            Ok((loaded, table)) => {
                self.publish(&mut state, table, loaded.config.settings, loaded.files)
            }
            Err(error) => self.fail(&state, error),
        }
    }

    /// Replace the configuration programmatically. The source is not
    /// consulted and the watched files do not change.
    pub fn apply(&self, config: &LoggingConfig) -> ReloadOutcome {
        let mut state = self.lock_state();
        let next = state.generation + 1;

        match build_routing_table(config, &self.catalog, next) {
            Ok(table) => {
                let files = state.files.clone();
                self.publish(&mut state, table, config.settings.clone(), files)
            }
            Err(error) => self.fail(&state, error),
        }
    }

    fn publish(
        &self,
        state: &mut ReloadState,
        table: RoutingTable,
        settings: SettingsConfig,
        files: Vec<PathBuf>,
    ) -> ReloadOutcome {
        let generation = table.generation();
        let previous = self.current.swap(Arc::new(table));
        previous.flush();

        let resync = state.files != files || state.settings.auto_reload != settings.auto_reload;
        state.generation = generation;
        state.settings = settings;
        state.files = files;
        if resync {
            self.sync_watches(state);
        }

        metrics::record_reload("success");
        metrics::set_generation(generation);
        tracing::info!(generation, "Logging configuration reloaded");

        let outcome = ReloadOutcome::Reloaded { generation };
        let _ = self.reload_tx.send(outcome.clone());
        outcome
    }

    fn fail(&self, state: &ReloadState, error: ConfigError) -> ReloadOutcome {
        self.source.reload_failed(&error);
        metrics::record_reload("failure");

        let outcome = ReloadOutcome::Failed {
            generation: state.generation,
            error: Arc::new(error),
        };
        let _ = self.reload_tx.send(outcome.clone());
        outcome
    }

    fn sync_watches(&self, state: &ReloadState) {
        self.debouncer.stop_watching();
        if self.watching.load(Ordering::SeqCst) && state.settings.auto_reload {
            self.debouncer.watch(&state.files);
        }
    }

    fn reload_delay(&self) -> Duration {
        Duration::from_millis(self.lock_state().settings.reload_delay_ms)
    }

    fn lock_state(&self) -> MutexGuard<'_, ReloadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `reload` on the blocking pool. Returns `None` if the reload task
    /// panicked or was cancelled; the published table is unchanged then.
    pub async fn reload_in_background(self: &Arc<Self>) -> Option<ReloadOutcome> {
        let manager = Arc::clone(self);
        match tokio::task::spawn_blocking(move || manager.reload()).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!(error = %e, "Reload task failed");
                None
            }
        }
    }

    /// Spawn the reload loop on the current tokio runtime. Returns `None` if
    /// a loop is already running. The loop exits on shutdown and stops every
    /// watch.
    pub fn start_watching(self: &Arc<Self>, mut shutdown: broadcast::Receiver<()>) -> Option<JoinHandle<()>> {
        let mut triggers = self
            .trigger_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;

        self.watching.store(true, Ordering::SeqCst);
        {
            let state = self.lock_state();
            self.sync_watches(&state);
            tracing::info!(
                auto_reload = state.settings.auto_reload,
                files = state.files.len(),
                "Configuration watcher started"
            );
        }

        let manager = Arc::clone(self);
        Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    trigger = triggers.recv() => {
                        if trigger.is_none() {
                            break;
                        }

                        let delay = manager.reload_delay();
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {}
                            _ = shutdown.recv() => break,
                        }

                        manager.debouncer.reset();
                        while triggers.try_recv().is_ok() {}

                        manager.reload_in_background().await;
                    }
                    _ = shutdown.recv() => {
                        tracing::info!("Configuration watcher received shutdown signal, exiting loop");
                        break;
                    }
                }
            }

            manager.watching.store(false, Ordering::SeqCst);
            manager.debouncer.stop_watching();
            *manager.trigger_rx.lock().unwrap_or_else(PoisonError::into_inner) = Some(triggers);
        }))
    }
}

impl fmt::Debug for ConfigurationManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationManager")
            .field("generation", &self.generation())
            .field("watching", &self.watching.load(Ordering::Relaxed))
            .field("debouncer", &self.debouncer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RuleConfig, TargetConfig};
    use crate::target::MemoryTarget;

    fn config(layout: &str) -> LoggingConfig {
        LoggingConfig {
            targets: vec![TargetConfig::new("mem", "memory").with_property("layout", layout)],
            rules: vec![RuleConfig {
                write_to: vec!["mem".into()],
                ..RuleConfig::default()
            }],
            ..LoggingConfig::default()
        }
    }

    fn logs(manager: &ConfigurationManager) -> Vec<String> {
        let target = manager.find_target("mem").unwrap();
        target.as_any().downcast_ref::<MemoryTarget>().unwrap().logs()
    }

    #[test]
    fn test_initial_load() {
        let manager = ConfigurationManager::from_config(config("${message}")).unwrap();
        assert_eq!(manager.generation(), 1);
        assert_eq!(manager.dispatch(&LogEvent::new(SeverityLevel::Info, "app", "hi")), 1);
        assert_eq!(logs(&manager), vec!["hi"]);
    }

    #[test]
    fn test_invalid_initial_config() {
        let mut bad = config("${message}");
        bad.rules[0].write_to = vec!["ghost".into()];
        assert!(matches!(
            ConfigurationManager::from_config(bad),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_apply_publishes_new_generation() {
        let manager = ConfigurationManager::from_config(config("${message}")).unwrap();
        let old = manager.snapshot();
        let mut reloads = manager.subscribe_reloads();

        let outcome = manager.apply(&config("[${level}] ${message}"));
        assert!(matches!(outcome, ReloadOutcome::Reloaded { generation: 2 }));
        assert!(matches!(reloads.try_recv(), Ok(ReloadOutcome::Reloaded { generation: 2 })));

        manager.dispatch(&LogEvent::new(SeverityLevel::Info, "app", "hello"));
        assert_eq!(logs(&manager), vec!["[Info] hello"]);
        assert_eq!(old.generation(), 1);
    }

    #[test]
    fn test_failed_reload_keeps_table() {
        let source = Arc::new(StaticConfigSource::new(config("${message}")));
        let manager = ConfigurationManager::new(SharedSource(source.clone()), Catalog::with_builtins()).unwrap();

        source.set(config("${message"));
        let outcome = manager.reload();
        assert!(matches!(outcome, ReloadOutcome::Failed { generation: 1, .. }));
        assert_eq!(manager.generation(), 1);

        source.set(config("${level}"));
        assert!(matches!(manager.reload(), ReloadOutcome::Reloaded { generation: 2 }));
        manager.dispatch(&LogEvent::new(SeverityLevel::Warn, "app", "x"));
        assert_eq!(logs(&manager), vec!["Warn"]);
    }

    #[test]
    fn test_rejected_property_keeps_table() {
        let source = Arc::new(StaticConfigSource::new(config("old: ${message}")));
        let manager = ConfigurationManager::new(SharedSource(source.clone()), Catalog::with_builtins()).unwrap();

        let mut colored = config("new: ${message}");
        colored.targets[0] = colored.targets[0].clone().with_property("colour", "red");
        source.set(colored);

        match manager.reload() {
            ReloadOutcome::Failed { generation, error } => {
                assert_eq!(generation, 1);
                assert!(matches!(*error, ConfigError::UnsupportedProperty(_)));
            }
            other => panic!("expected a failed reload, got {other:?}"),
        }
        assert_eq!(manager.generation(), 1);

        manager.dispatch(&LogEvent::new(SeverityLevel::Info, "app", "hi"));
        assert_eq!(logs(&manager), vec!["old: hi"]);
    }

    struct SharedSource(Arc<StaticConfigSource>);

    impl ConfigSource for SharedSource {
        fn load(&self) -> Result<crate::config::loader::LoadedConfig, ConfigError> {
            self.0.load()
        }
    }

    /// Loads once, then panics on every later load.
    struct PanicOnReload {
        initial: StaticConfigSource,
        loaded: AtomicBool,
    }

    impl ConfigSource for PanicOnReload {
        fn load(&self) -> Result<crate::config::loader::LoadedConfig, ConfigError> {
            if self.loaded.swap(true, Ordering::SeqCst) {
                panic!("source exploded");
            }
            self.initial.load()
        }
    }

    #[tokio::test]
    async fn test_reload_in_background() {
        let manager = Arc::new(ConfigurationManager::from_config(config("${message}")).unwrap());
        assert!(matches!(
            manager.reload_in_background().await,
            Some(ReloadOutcome::Reloaded { generation: 2 })
        ));

        let source = PanicOnReload {
            initial: StaticConfigSource::new(config("${message}")),
            loaded: AtomicBool::new(false),
        };
        let manager = Arc::new(ConfigurationManager::new(source, Catalog::with_builtins()).unwrap());
        assert!(manager.reload_in_background().await.is_none());
        assert_eq!(manager.generation(), 1);
        assert_eq!(manager.dispatch(&LogEvent::new(SeverityLevel::Info, "app", "still")), 1);
    }

    #[tokio::test]
    async fn test_watch_loop_stops_on_shutdown() {
        let manager = Arc::new(ConfigurationManager::from_config(config("${message}")).unwrap());
        let (tx, rx) = broadcast::channel(1);

        let handle = manager.start_watching(rx).unwrap();
        assert!(manager.start_watching(tx.subscribe()).is_none());

        tx.send(()).unwrap();
        handle.await.unwrap();
        assert!(!manager.debouncer().is_watching());
        assert!(manager.start_watching(tx.subscribe()).is_some());
    }
}
