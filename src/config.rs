use std::{
    env,
    fmt::{Display, Formatter},
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::{
    app::poller::PollerOptions,
    domain::polling::{ConcurrencyPolicy, PollingConfig, POLLING_INTERVAL_MINIMUM_MS},
};

pub const CONFIG_FILE_NAME: &str = "focus-poll.toml";
pub const CONFIG_ENV_VAR: &str = "FOCUS_POLL_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_true")]
    pub run_on_load: bool,
    #[serde(default)]
    pub concurrency_policy: ConcurrencyPolicy,
    #[serde(default)]
    pub polling: PollingConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub command: String,
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

impl Config {
    pub fn poller_options(&self) -> PollerOptions {
        PollerOptions {
            run_on_load: self.run_on_load,
            polling: self.polling,
            concurrency_policy: self.concurrency_policy,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPathSource {
    Flag,
    WorkingDirectory,
    EnvVar,
    Default,
}

impl Display for ConfigPathSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flag => f.write_str("--config"),
            Self::WorkingDirectory => write!(f, "./{CONFIG_FILE_NAME}"),
            Self::EnvVar => f.write_str(CONFIG_ENV_VAR),
            Self::Default => f.write_str("default"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfigPath {
    pub path: PathBuf,
    pub source: ConfigPathSource,
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub resolved_path: ResolvedConfigPath,
}

pub fn parse_config(src: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(src).context("failed to parse config TOML")?;
    validate_config(&cfg)?;
    Ok(cfg)
}

pub fn load_config_with_path(path: Option<&Path>) -> Result<LoadedConfig> {
    let resolved_path = resolve_config_path_with_source(path)?;

    let src = fs::read_to_string(&resolved_path.path).with_context(|| {
        format!(
            "failed to read config: {} (source: {})",
            resolved_path.path.display(),
            resolved_path.source
        )
    })?;
    let config = parse_config(&src)
        .with_context(|| format!("invalid config: {}", resolved_path.path.display()))?;

    Ok(LoadedConfig {
        config,
        resolved_path,
    })
}

pub fn resolve_config_path(path: Option<&Path>) -> Result<PathBuf> {
    resolve_config_path_with_source(path).map(|resolved| resolved.path)
}

pub fn resolve_config_path_with_source(path: Option<&Path>) -> Result<ResolvedConfigPath> {
    if let Some(explicit) = path {
        return Ok(ResolvedConfigPath {
            path: explicit.to_path_buf(),
            source: ConfigPathSource::Flag,
        });
    }

    let local = env::current_dir()
        .context("failed to determine working directory")?
        .join(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(ResolvedConfigPath {
            path: local,
            source: ConfigPathSource::WorkingDirectory,
        });
    }

    if let Some(raw) = env::var_os(CONFIG_ENV_VAR) {
        return Ok(ResolvedConfigPath {
            path: PathBuf::from(raw),
            source: ConfigPathSource::EnvVar,
        });
    }

    Ok(ResolvedConfigPath {
        path: installed_config_path()?,
        source: ConfigPathSource::Default,
    })
}

pub fn installed_config_path() -> Result<PathBuf> {
    let dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not determine home directory"))?;
    Ok(dirs.config_dir().join("focus-poll").join("config.toml"))
}

fn validate_config(cfg: &Config) -> Result<()> {
    if cfg.fetch.command.trim().is_empty() {
        return Err(anyhow!("fetch.command must not be empty"));
    }

    Ok(())
}

/// Settings that parse fine but are unlikely to do what was intended.
pub fn stability_warnings(cfg: &Config) -> Vec<String> {
    let mut warnings = Vec::new();

    if cfg.polling.enabled && !cfg.polling.is_eligible() {
        warnings.push(format!(
            "warning: polling.interval_ms={} is at or below {}ms; polling stays inert",
            cfg.polling.interval_ms, POLLING_INTERVAL_MINIMUM_MS
        ));
    }

    if !cfg.polling.enabled && cfg.polling.interval_ms > 0 {
        warnings.push(format!(
            "warning: polling.interval_ms={} is set but polling.enabled=false",
            cfg.polling.interval_ms
        ));
    }

    if !cfg.run_on_load && !cfg.polling.is_eligible() {
        warnings.push(
            "warning: run_on_load=false and polling is inert; nothing runs until triggered manually"
                .to_string(),
        );
    }

    warnings
}
