// src/config.rs
//! Engine configuration: remote API base, notice TTL, recognized active
//! status synonyms, and the default criteria set. Loaded from TOML with env
//! overrides, hot-reloadable in dev via a polling watcher.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};

use serde::Deserialize;
use tracing::{info, warn};

use crate::criteria::{CriteriaSet, Criterion, CriterionKind};
use crate::notice::DEFAULT_NOTICE_TTL_SECS;

// --- env defaults & names ---
pub const DEFAULT_CONFIG_PATH: &str = "config/engine.toml";
pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api";

pub const ENV_CONFIG_PATH: &str = "ENGINE_CONFIG_PATH";
pub const ENV_API_BASE: &str = "STOREFRONT_API_BASE";
pub const ENV_HOT_RELOAD: &str = "ENGINE_HOT_RELOAD";

// Dev logging gate: ENGINE_DEV_LOG=1 AND dev env (debug build or SHUTTLE_ENV in {local,development,dev})
pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var("ENGINE_DEV_LOG").ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// One configured criterion; `etiqueta` falls back to the name.
#[derive(Debug, Clone, Deserialize)]
pub struct CriterionCfg {
    pub nombre: String,
    #[serde(default)]
    pub etiqueta: Option<String>,
    pub tipo: CriterionKind,
    pub peso: u32,
    #[serde(default = "default_true")]
    pub activo: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_notice_ttl")]
    pub notice_ttl_secs: u64,
    /// Status strings treated as "active" besides the empty string.
    #[serde(default = "default_active_states")]
    pub active_states: Vec<String>,
    #[serde(default)]
    pub criteria: Vec<CriterionCfg>,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_notice_ttl() -> u64 {
    DEFAULT_NOTICE_TTL_SECS
}

fn default_active_states() -> Vec<String> {
    ["activo", "active", "disponible", "publicado"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            notice_ttl_secs: default_notice_ttl(),
            active_states: default_active_states(),
            criteria: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load from the resolved config path. A missing file yields defaults
    /// (this service can run purely on env vars); a malformed file is an
    /// error — a half-read config is worse than none.
    pub fn from_toml() -> anyhow::Result<Self> {
        let path = resolve_config_path();
        let mut cfg = match fs::read_to_string(&path) {
            Ok(content) => Self::from_toml_str(&content)?,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "engine config not readable, using defaults");
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let cfg: EngineConfig = toml::from_str(toml_str)?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(base) = std::env::var(ENV_API_BASE) {
            let base = base.trim();
            if !base.is_empty() {
                self.api_base = base.trim_end_matches('/').to_string();
            }
        }
    }

    /// Materialize the configured criteria; an empty section falls back to
    /// the built-in seed.
    pub fn criteria_set(&self) -> CriteriaSet {
        let criteria: Vec<Criterion> = self
            .criteria
            .iter()
            .map(|c| {
                let label = c.etiqueta.clone().unwrap_or_else(|| c.nombre.clone());
                let mut criterion = Criterion::new(&c.nombre, &label, c.tipo, c.peso);
                criterion.active = c.activo;
                criterion
            })
            .collect();
        CriteriaSet::from_criteria(criteria)
    }
}

pub fn resolve_config_path() -> PathBuf {
    std::env::var(ENV_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/* ----------------------------
Thread-safe handle + hot reload
---------------------------- */

#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<EngineConfig>>,
}

impl ConfigHandle {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub fn current(&self) -> EngineConfig {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(_) => EngineConfig::default(),
        }
    }

    pub fn api_base(&self) -> String {
        self.current().api_base
    }

    pub fn active_states(&self) -> Vec<String> {
        self.current().active_states
    }

    pub fn replace(&self, config: EngineConfig) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = config;
        }
    }
}

/// Returns true if we should enable hot reload (dev/local only).
fn hot_reload_enabled() -> bool {
    let want = std::env::var(ENV_HOT_RELOAD)
        .ok()
        .map(|v| v == "1")
        .unwrap_or(false);
    if !want {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Start a simple polling watcher on `path` to hot-reload into the handle.
/// Polls mtime every 2s. Uses only std, no external deps.
pub fn start_hot_reload_thread(handle: ConfigHandle, path: PathBuf) {
    if !hot_reload_enabled() {
        return;
    }

    thread::spawn(move || {
        let poll = Duration::from_secs(2);
        let mut last_mtime: Option<SystemTime> = None;

        loop {
            match fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(mtime) => {
                    let changed = match last_mtime {
                        None => {
                            last_mtime = Some(mtime);
                            false
                        }
                        Some(prev) => mtime > prev,
                    };
                    if changed {
                        if let Ok(content) = fs::read_to_string(&path) {
                            if let Ok(mut fresh) = EngineConfig::from_toml_str(&content) {
                                fresh.apply_env_overrides();
                                info!(path = %path.display(), "engine config reloaded");
                                handle.replace(fresh);
                            }
                        }
                        last_mtime = Some(mtime);
                    }
                }
                Err(_) => {
                    // File missing or unreadable; keep trying.
                }
            }
            thread::sleep(poll);
        }
    });
}
