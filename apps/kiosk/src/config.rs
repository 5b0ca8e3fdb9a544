use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use floor_client::RefreshPolicy;
use floor_shared::locale::Locale;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub locale: Locale,
    pub data_dir: PathBuf,
    pub processes_poll_secs: u64,
    pub active_fault_poll_secs: u64,
    pub fault_types_stale_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let policy = RefreshPolicy::default();
        Self {
            server_url: "http://127.0.0.1:3000".into(),
            locale: Locale::default(),
            data_dir: PathBuf::from("./data"),
            processes_poll_secs: policy.oven_processes.as_secs(),
            active_fault_poll_secs: policy.active_fault.as_secs(),
            fault_types_stale_secs: policy.fault_types_stale.as_secs(),
        }
    }
}

impl Settings {
    pub fn refresh_policy(&self) -> RefreshPolicy {
        RefreshPolicy {
            oven_processes: Duration::from_secs(self.processes_poll_secs),
            active_fault: Duration::from_secs(self.active_fault_poll_secs),
            fault_types_stale: Duration::from_secs(self.fault_types_stale_secs),
            ..RefreshPolicy::default()
        }
    }
}

/// Defaults, then `path` if it exists, then `FLOOR_*` / `APP__*` variables.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?;
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: HashMap<String, toml::Value> = toml::from_str(raw)?;
    for (key, value) in file_cfg {
        let value = match value {
            toml::Value::String(value) => value,
            toml::Value::Integer(value) => value.to_string(),
            other => bail!("unsupported value for '{key}': {other}"),
        };
        apply(settings, &key, value)?;
    }
    Ok(())
}

fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    for key in [
        "server_url",
        "locale",
        "data_dir",
        "processes_poll_secs",
        "active_fault_poll_secs",
        "fault_types_stale_secs",
    ] {
        let upper = key.to_ascii_uppercase();
        if let Some(v) = lookup(&format!("FLOOR_{upper}")) {
            apply(settings, key, v)?;
        }
        if let Some(v) = lookup(&format!("APP__{upper}")) {
            apply(settings, key, v)?;
        }
    }
    Ok(())
}

fn apply(settings: &mut Settings, key: &str, value: String) -> anyhow::Result<()> {
    match key {
        "server_url" => settings.server_url = value,
        "locale" => settings.locale = Locale::resolve(&value),
        "data_dir" => settings.data_dir = PathBuf::from(value),
        "processes_poll_secs" => settings.processes_poll_secs = parse_secs(key, &value)?,
        "active_fault_poll_secs" => settings.active_fault_poll_secs = parse_secs(key, &value)?,
        "fault_types_stale_secs" => settings.fault_types_stale_secs = parse_secs(key, &value)?,
        _ => tracing::warn!(key, "ignoring unknown setting"),
    }
    Ok(())
}

fn parse_secs(key: &str, value: &str) -> anyhow::Result<u64> {
    let secs = value
        .trim()
        .parse::<u64>()
        .with_context(|| format!("'{key}' must be a whole number of seconds, got '{value}'"))?;
    if secs == 0 {
        bail!("'{key}' must be greater than zero");
    }
    Ok(secs)
}
