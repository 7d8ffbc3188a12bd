//! Deployment settings.
//!
//! Read from `<home>/config.toml` (see [`logops_logging::logops_home`]) or an
//! explicit `--config` path. Every field has a default, and a handful can be
//! overridden from the environment:
//!
//! | Variable | Field |
//! |---|---|
//! | `LOGOPS_PROJECT_DIR` | `project_dir` |
//! | `LOGOPS_LOGS_DIR` | `logs_dir` |
//! | `LOGOPS_LOGS_PARSED_DIR` | `logs_parsed_dir` |
//! | `LOGOPS_HOST_NAME` | `host_name` |
//! | `LOGOPS_IS_DEMO` | `is_demo` |

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Working tree of the deployed project; error files land here.
    pub project_dir: PathBuf,
    pub project_slug: String,
    pub host_name: String,
    /// Raw log files.
    pub logs_dir: PathBuf,
    /// Parser output, one subdirectory per source with per-day directories below.
    pub logs_parsed_dir: PathBuf,
    pub storage_file: PathBuf,
    pub trace_url: String,
    /// Only a demo host may have its logs reset.
    pub is_demo: bool,
    pub max_demo_log_days: u64,
    pub reserved_parsed_dir: String,
    /// Program used to run sub-commands, e.g. `["python3", "manage.py"]`.
    pub manage_program: Vec<String>,
    pub du_command: Vec<String>,
    pub renew_command: Vec<String>,
    pub restart_command: Vec<String>,
    pub git_branch: String,
    pub connect_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let project_dir = logops_logging::logops_home().join("project");
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            storage_file: project_dir.join("storage.json"),
            project_dir,
            project_slug: "logops".to_string(),
            host_name: std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string()),
            logs_dir: home.join("logs"),
            logs_parsed_dir: home.join("logs-parsed"),
            trace_url: "https://localhost".to_string(),
            is_demo: false,
            max_demo_log_days: 14,
            reserved_parsed_dir: "country".to_string(),
            manage_program: vec!["python3".to_string(), "manage.py".to_string()],
            du_command: vec!["du".to_string(), "-sh".to_string()],
            renew_command: vec!["sudo".to_string(), "certbot".to_string(), "renew".to_string()],
            restart_command: vec![
                "sudo".to_string(),
                "service".to_string(),
                "apache24".to_string(),
                "restart".to_string(),
            ],
            git_branch: "master".to_string(),
            connect_timeout_secs: 10,
        }
    }
}

impl Settings {
    /// Default location: `<home>/config.toml`
    pub fn default_path() -> PathBuf {
        logops_logging::logops_home().join("config.toml")
    }

    /// Load settings, apply environment overrides.
    ///
    /// An explicit path must exist. The default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse config file {}. Fix or delete it to use defaults.",
                path.display()
            )
        })
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("LOGOPS_PROJECT_DIR") {
            self.project_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("LOGOPS_LOGS_DIR") {
            self.logs_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("LOGOPS_LOGS_PARSED_DIR") {
            self.logs_parsed_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("LOGOPS_HOST_NAME") {
            self.host_name = v;
        }
        if let Some(v) = lookup("LOGOPS_IS_DEMO") {
            self.is_demo = matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
    }
}
