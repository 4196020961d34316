//! Configuration loading and management
//!
//! Every [`Environment`] has a fixed set of defaults. A TOML file can
//! override any of them, and `--data-dir` on the command line overrides the
//! data directory last.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Log levels accepted in `log_level`
pub const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Testing,
    #[default]
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(Error::InvalidConfig(format!(
                "unknown environment '{other}' (expected development|testing|production)"
            ))),
        }
    }
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub app_name: String,
    pub environment: Environment,
    /// Turns on logging at `log_level` when `RUST_LOG` is unset.
    pub debug: bool,
    pub data_dir: PathBuf,
    /// Informational only; nothing sends notifications.
    pub notifications_enabled: bool,
    pub log_level: String,
    pub items_per_page: usize,
    pub date_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

/// On-disk shape: every key optional, missing keys keep the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    app_name: Option<String>,
    environment: Option<Environment>,
    debug: Option<bool>,
    data_dir: Option<PathBuf>,
    notifications_enabled: Option<bool>,
    log_level: Option<String>,
    items_per_page: Option<usize>,
    date_format: Option<String>,
}

impl Config {
    pub fn for_environment(environment: Environment) -> Self {
        let base = Self {
            app_name: "TaskTrack".to_string(),
            environment,
            debug: false,
            data_dir: PathBuf::from("./data"),
            notifications_enabled: true,
            log_level: "info".to_string(),
            items_per_page: 20,
            date_format: crate::utils::date::ISO_DATE.to_string(),
        };
        match environment {
            Environment::Development => Self {
                debug: true,
                data_dir: PathBuf::from("./data/dev"),
                log_level: "debug".to_string(),
                ..base
            },
            Environment::Testing => Self {
                data_dir: PathBuf::from("./data/test"),
                notifications_enabled: false,
                ..base
            },
            Environment::Production => Self {
                data_dir: PathBuf::from("/opt/tasktrack/data"),
                log_level: "warn".to_string(),
                ..base
            },
        }
    }

    /// Load a TOML file over the production defaults.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_over(path, Environment::default())
    }

    /// Load a TOML file over the defaults of `environment`. An `environment`
    /// key inside the file takes precedence.
    pub fn load_over(path: &Path, environment: Environment) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&content)?;
        let environment = file.environment.unwrap_or(environment);
        let config = file.apply(Self::for_environment(environment));
        config.validate()?;
        Ok(config)
    }

    /// Environment defaults, or the file when one is given.
    pub fn resolve(environment: Environment, path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_over(path, environment),
            None => Ok(Self::for_environment(environment)),
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Tracing filter to fall back on when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &str {
        if self.debug {
            &self.log_level
        } else {
            "off"
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.app_name.trim().is_empty() {
            return Err(Error::InvalidConfig("app_name cannot be empty".to_string()));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("data_dir cannot be empty".to_string()));
        }
        if self.items_per_page == 0 {
            return Err(Error::InvalidConfig(
                "items_per_page must be > 0".to_string(),
            ));
        }
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(Error::InvalidConfig(format!(
                "log_level: invalid level '{}' (expected {})",
                self.log_level,
                LOG_LEVELS.join("|")
            )));
        }
        if self.date_format.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "date_format cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl ConfigFile {
    fn apply(self, mut config: Config) -> Config {
        if let Some(app_name) = self.app_name {
            config.app_name = app_name;
        }
        if let Some(debug) = self.debug {
            config.debug = debug;
        }
        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }
        if let Some(enabled) = self.notifications_enabled {
            config.notifications_enabled = enabled;
        }
        if let Some(level) = self.log_level {
            config.log_level = level.trim().to_ascii_lowercase();
        }
        if let Some(items) = self.items_per_page {
            config.items_per_page = items;
        }
        if let Some(format) = self.date_format {
            config.date_format = format;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.environment, Environment::Production);
        assert_eq!(cfg.app_name, "TaskTrack");
        assert!(!cfg.debug);
        assert_eq!(cfg.data_dir, PathBuf::from("/opt/tasktrack/data"));
        assert_eq!(cfg.log_level, "warn");
        assert_eq!(cfg.items_per_page, 20);
        assert_eq!(cfg.date_format, "%Y-%m-%d");
        assert!(cfg.notifications_enabled);
    }

    #[test]
    fn environment_defaults_differ() {
        let dev = Config::for_environment(Environment::Development);
        assert!(dev.debug);
        assert_eq!(dev.data_dir, PathBuf::from("./data/dev"));
        assert_eq!(dev.log_level, "debug");

        let test = Config::for_environment(Environment::Testing);
        assert!(!test.debug);
        assert!(!test.notifications_enabled);
        assert_eq!(test.data_dir, PathBuf::from("./data/test"));
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tasktrack.toml");
        let content = r#"
environment = "development"
data_dir = "/srv/tasks"
items_per_page = 5
log_level = "INFO"
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.environment, Environment::Development);
        assert!(cfg.debug);
        assert_eq!(cfg.data_dir, PathBuf::from("/srv/tasks"));
        assert_eq!(cfg.items_per_page, 5);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn load_rejects_invalid_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tasktrack.toml");

        fs::write(&path, "items_per_page = 0").expect("write config");
        let err = Config::load(&path).expect_err("zero page size");
        assert!(matches!(err, Error::InvalidConfig(_)));

        fs::write(&path, "log_level = \"loud\"").expect("write config");
        let err = Config::load(&path).expect_err("bad level");
        assert!(matches!(err, Error::InvalidConfig(_)));

        fs::write(&path, "data_dir = \"\"").expect("write config");
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn file_environment_selects_base_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tasktrack.toml");
        fs::write(&path, "environment = \"testing\"").expect("write config");

        let cfg = Config::load_over(&path, Environment::Development).expect("load config");
        assert_eq!(cfg.environment, Environment::Testing);
        assert_eq!(cfg.data_dir, PathBuf::from("./data/test"));
        assert!(!cfg.debug);

        fs::write(&path, "items_per_page = 7").expect("write config");
        let cfg = Config::load_over(&path, Environment::Development).expect("load config");
        assert_eq!(cfg.environment, Environment::Development);
        assert_eq!(cfg.items_per_page, 7);
    }

    #[test]
    fn log_filter_follows_debug() {
        let dev = Config::for_environment(Environment::Development);
        assert_eq!(dev.log_filter(), "debug");

        let mut prod = Config::for_environment(Environment::Production);
        assert_eq!(prod.log_filter(), "off");
        prod.debug = true;
        assert_eq!(prod.log_filter(), "warn");
    }

    #[test]
    fn environment_parsing() {
        assert_eq!(
            "Development".parse::<Environment>().unwrap(),
            Environment::Development
        );
        assert_eq!("test".parse::<Environment>().unwrap(), Environment::Testing);
        assert!(matches!(
            "staging".parse::<Environment>(),
            Err(Error::InvalidConfig(_))
        ));
        assert_eq!(Environment::Production.to_string(), "production");
    }
}
