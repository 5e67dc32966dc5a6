//! Configuration management for rw-cadquery.
//!
//! Parses `rw-cadquery.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! Every entry of `kernel.command` supports environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override docs source directory.
    pub source_dir: Option<PathBuf>,
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override the build-wide `include-source` default.
    pub include_source: Option<bool>,
    /// Override the kernel command line.
    pub kernel_command: Option<Vec<String>>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "rw-cadquery.toml";

/// Viewer library loaded by pages with 3D viewers.
const DEFAULT_VIEWER_SCRIPT: &str = "https://unpkg.com/vtk.js";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Documentation paths (relative strings from TOML).
    docs: DocsConfigRaw,
    /// Directive defaults.
    pub cadquery: CadQueryConfig,
    /// Script evaluation kernel.
    pub kernel: KernelConfig,

    /// Resolved docs configuration (set after loading).
    #[serde(skip)]
    pub docs_resolved: DocsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw docs configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DocsConfigRaw {
    source_dir: Option<String>,
    output_dir: Option<String>,
}

/// Resolved documentation paths.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DocsConfig {
    /// Source directory for markdown files.
    pub source_dir: PathBuf,
    /// Directory receiving rendered pages and exports.
    pub output_dir: PathBuf,
}

/// Directive defaults.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CadQueryConfig {
    /// Whether directives show the script below the model by default.
    pub include_source: bool,
    /// URL of the vtk.js bundle.
    pub viewer_script: String,
}

impl Default for CadQueryConfig {
    fn default() -> Self {
        Self {
            include_source: true,
            viewer_script: DEFAULT_VIEWER_SCRIPT.to_owned(),
        }
    }
}

/// Kernel process configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Program and arguments; the script is written to its stdin.
    pub command: Vec<String>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            command: vec!["python3".to_owned(), "-m".to_owned(), "cq_eval".to_owned()],
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`kernel.command[0]`").
        field: String,
        /// Error message (e.g., "${`CQ_PYTHON`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `rw-cadquery.toml` in the current directory
    /// and its parents, falling back to defaults.
    ///
    /// CLI settings are applied after loading and path resolution.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.docs_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.docs_resolved.output_dir.clone_from(output_dir);
        }
        if let Some(include_source) = settings.include_source {
            self.cadquery.include_source = include_source;
        }
        if let Some(command) = &settings.kernel_command {
            self.kernel.command.clone_from(command);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            docs: DocsConfigRaw::default(),
            cadquery: CadQueryConfig::default(),
            kernel: KernelConfig::default(),
            docs_resolved: DocsConfig {
                source_dir: base.join("docs"),
                output_dir: base.join("site"),
            },
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.kernel.command = expand::expand_all(&config.kernel.command, "kernel.command")?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Some(program) = self.kernel.command.first() else {
            return Err(ConfigError::Validation(
                "kernel.command must name a program".to_owned(),
            ));
        };
        require_non_empty(program, "kernel.command[0]")?;
        require_non_empty(&self.cadquery.viewer_script, "cadquery.viewer_script")?;

        if self.docs_resolved.source_dir == self.docs_resolved.output_dir {
            return Err(ConfigError::Validation(
                "docs.output_dir must differ from docs.source_dir".to_owned(),
            ));
        }

        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.docs_resolved = DocsConfig {
            source_dir: resolve(self.docs.source_dir.as_deref(), "docs"),
            output_dir: resolve(self.docs.output_dir.as_deref(), "site"),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));

        assert_eq!(config.docs_resolved.source_dir, PathBuf::from("/test/docs"));
        assert_eq!(config.docs_resolved.output_dir, PathBuf::from("/test/site"));
        assert!(config.cadquery.include_source);
        assert_eq!(config.cadquery.viewer_script, "https://unpkg.com/vtk.js");
        assert_eq!(config.kernel.command, vec!["python3", "-m", "cq_eval"]);
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();

        assert!(config.cadquery.include_source);
        assert_eq!(config.kernel.command.len(), 3);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[docs]
source_dir = "documentation"
output_dir = "public"

[cadquery]
include_source = false
viewer_script = "_static/vtk.js"

[kernel]
command = ["/opt/cq/bin/python", "eval.py"]
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.docs_resolved,
            DocsConfig {
                source_dir: PathBuf::from("/project/documentation"),
                output_dir: PathBuf::from("/project/public"),
            }
        );
        assert!(!config.cadquery.include_source);
        assert_eq!(config.cadquery.viewer_script, "_static/vtk.js");
        assert_eq!(config.kernel.command, vec!["/opt/cq/bin/python", "eval.py"]);
    }

    #[test]
    fn test_load_from_file_expands_command() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            "[kernel]\ncommand = [\"${RW_CQ_TEST_PYTHON:-python3}\", \"-m\", \"cq_eval\"]\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.kernel.command[0], "python3");
        assert_eq!(config.docs_resolved.source_dir, dir.path().join("docs"));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_explicit_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/rw-cadquery.toml")), None).unwrap_err();

        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[cadquery\n").unwrap();

        assert!(matches!(Config::load(Some(&path), None), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_empty_command_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[kernel]\ncommand = []\n").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("kernel.command"));
    }

    #[test]
    fn test_output_dir_must_differ() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.docs_resolved.output_dir = PathBuf::from("/test/docs");

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            output_dir: Some(PathBuf::from("/tmp/out")),
            include_source: Some(false),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.docs_resolved.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.docs_resolved.source_dir, PathBuf::from("/test/docs"));
        assert!(!config.cadquery.include_source);
        assert_eq!(config.kernel.command[0], "python3");
    }

    #[test]
    fn test_cli_kernel_command_override() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            kernel_command: Some(vec!["cq-eval".to_owned()]),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.kernel.command, vec!["cq-eval"]);
    }
}
