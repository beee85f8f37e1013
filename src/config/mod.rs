// Required external crates for configuration management and serialization
use serde::Deserialize;
use std::path::{Path, PathBuf};
use config::{Config, ConfigError, Environment, File, Map};

use crate::provision::{ArtifactSpec, VerifyPolicy};

/// Configuration for the model artifact and where it lives on disk
#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Directory where the model file is stored
    pub directory: PathBuf,
    /// File name of the model inside `directory`
    pub filename: String,
    /// Remote location the model is fetched from when missing
    pub url: String,
    /// Expected SHA-256 of the model file, hex encoded
    pub sha256: String,
    /// Re-hash an already present model file before trusting it
    #[serde(default)]
    pub verify_existing: bool,
}

/// Configuration for model inference parameters
#[derive(Debug, Deserialize, Clone)]
pub struct InferenceConfig {
    /// Size of the context window for inference
    pub context_size: u32,
    /// Prompt batch size
    pub batch_size: u32,
    /// Number of layers offloaded to the GPU
    pub gpu_layers: u32,
    /// Maximum number of tokens to generate per query
    pub max_tokens: usize,
    /// Memory-map the model file instead of reading it
    #[serde(default = "default_use_mmap")]
    pub use_mmap: bool,
}

fn default_use_mmap() -> bool {
    true
}

/// Configuration for the HTTP server
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

/// Configuration for application logging
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (debug, info, warn, error)
    pub level: String,
    /// Optional log directory; logs go to stderr when unset
    pub file: Option<PathBuf>,
}

/// Main settings struct that contains all configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Model artifact settings
    pub models: ModelConfig,
    /// Inference-related settings
    pub inference: InferenceConfig,
    /// Server-related settings
    pub server: ServerConfig,
    /// Logging-related settings
    pub logging: LoggingConfig,
}

impl Settings {
    /// Loads settings from the `config` directory of the current working directory.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::current_dir()
            .map_err(|e| ConfigError::Message(
                format!("Failed to get current directory: {}", e)
            ))?
            .join("config");

        Self::load_from(&config_dir)
    }

    /// Creates a new Settings instance by loading config from multiple sources
    /// in the following order of precedence (highest to lowest):
    /// 1. Environment variables prefixed with MINEMIND_ (nested keys joined by `__`)
    /// 2. Local config file (local.toml) if present
    /// 3. Default config file (default.toml)
    pub fn load_from(config_dir: &Path) -> Result<Self, ConfigError> {
        Self::load_with_env(config_dir, None)
    }

    /// Same as [`Settings::load_from`], reading `MINEMIND_` variables from `env`
    /// instead of the process environment when given.
    pub fn load_with_env(
        config_dir: &Path,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        if !config_dir.exists() {
            return Err(ConfigError::Message(
                format!("Config directory not found at: {}", config_dir.display())
            ));
        }

        let default_config = config_dir.join("default.toml");
        if !default_config.exists() {
            return Err(ConfigError::Message(
                format!("Default configuration file not found at: {}", default_config.display())
            ));
        }

        let local_config = config_dir.join("local.toml");

        // Convert paths to strings and keep them alive
        let default_config_path = default_config.to_string_lossy();
        let local_config_path = local_config.to_string_lossy();

        let settings = Config::builder()
            .add_source(File::with_name(&default_config_path))
            .add_source(File::with_name(&local_config_path).required(false))
            .add_source(
                Environment::with_prefix("MINEMIND")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        settings.validate()?;

        Ok(settings)
    }

    /// Full path of the model file.
    pub fn model_path(&self) -> PathBuf {
        self.models.directory.join(&self.models.filename)
    }

    /// Describes the model artifact the provisioner has to guarantee.
    pub fn artifact_spec(&self) -> ArtifactSpec {
        ArtifactSpec::new(
            self.models.url.clone(),
            self.model_path(),
            self.models.sha256.clone(),
        )
    }

    /// Policy applied to a model file that is already on disk.
    pub fn verify_policy(&self) -> VerifyPolicy {
        if self.models.verify_existing {
            VerifyPolicy::Reverify
        } else {
            VerifyPolicy::TrustExisting
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.url.trim().is_empty() {
            return Err(ConfigError::Message("models.url must not be empty".to_string()));
        }

        if self.models.filename.trim().is_empty() {
            return Err(ConfigError::Message("models.filename must not be empty".to_string()));
        }

        let sha = self.models.sha256.trim();
        if sha.len() != 64 || !sha.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::Message(
                format!("models.sha256 must be 64 hex characters, got: {:?}", self.models.sha256)
            ));
        }

        if self.inference.context_size == 0 {
            return Err(ConfigError::Message(
                "context_size must be greater than 0".to_string()
            ));
        }

        if self.inference.batch_size == 0 {
            return Err(ConfigError::Message(
                "batch_size must be greater than 0".to_string()
            ));
        }

        if self.inference.max_tokens == 0 {
            return Err(ConfigError::Message(
                "max_tokens must be greater than 0".to_string()
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
            _ => Err(ConfigError::Message(
                format!("Invalid logging level: {}. Must be one of: error, warn, info, debug, trace",
                    self.logging.level)
            )),
        }?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const DEFAULT_TOML: &str = r#"
[models]
directory = "models"
filename = "tiny.gguf"
url = "https://example.invalid/tiny.gguf"
sha256 = "9FECC3B3CD76BBA89D504F29B616EEDF7DA85B96540E490CA5824D3F7D2776A0"

[inference]
context_size = 2048
batch_size = 512
gpu_layers = 1
max_tokens = 256

[server]
host = "127.0.0.1"
port = 7171

[logging]
level = "info"
"#;

    fn write_config(dir: &Path, default: &str, local: Option<&str>) {
        fs::write(dir.join("default.toml"), default).unwrap();
        if let Some(local) = local {
            fs::write(dir.join("local.toml"), local).unwrap();
        }
    }

    #[test]
    fn test_load_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), DEFAULT_TOML, None);

        let settings = Settings::load_from(dir.path()).unwrap();
        assert_eq!(settings.inference.context_size, 2048);
        assert!(settings.inference.use_mmap);
        assert!(!settings.models.verify_existing);
        assert_eq!(settings.verify_policy(), VerifyPolicy::TrustExisting);
        assert_eq!(settings.model_path(), PathBuf::from("models").join("tiny.gguf"));

        let spec = settings.artifact_spec();
        assert_eq!(spec.url, "https://example.invalid/tiny.gguf");
        assert_eq!(spec.path, PathBuf::from("models").join("tiny.gguf"));
    }

    #[test]
    fn test_local_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            DEFAULT_TOML,
            Some("[models]\nverify_existing = true\n\n[inference]\nmax_tokens = 64\n"),
        );

        let settings = Settings::load_from(dir.path()).unwrap();
        assert_eq!(settings.inference.max_tokens, 64);
        assert_eq!(settings.verify_policy(), VerifyPolicy::Reverify);
        assert_eq!(settings.models.filename, "tiny.gguf");
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load_from(&dir.path().join("nope")).unwrap_err();
        assert!(err.to_string().contains("Config directory not found"));
    }

    #[test]
    fn test_rejects_bad_sha() {
        let dir = tempfile::tempdir().unwrap();
        let toml = DEFAULT_TOML.replace(
            "9FECC3B3CD76BBA89D504F29B616EEDF7DA85B96540E490CA5824D3F7D2776A0",
            "not-a-digest",
        );
        write_config(dir.path(), &toml, None);

        let err = Settings::load_from(dir.path()).unwrap_err();
        assert!(err.to_string().contains("sha256"));
    }

    #[test]
    fn test_rejects_bad_level() {
        let dir = tempfile::tempdir().unwrap();
        let toml = DEFAULT_TOML.replace("level = \"info\"", "level = \"loud\"");
        write_config(dir.path(), &toml, None);

        let err = Settings::load_from(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid logging level"));
    }

    #[test]
    fn test_env_overrides_files() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), DEFAULT_TOML, Some("[server]\nport = 8080\n"));

        let env = Map::from([
            ("MINEMIND_SERVER__PORT".to_string(), "9090".to_string()),
            ("MINEMIND_MODELS__VERIFY_EXISTING".to_string(), "true".to_string()),
            ("MINEMIND_INFERENCE__MAX_TOKENS".to_string(), "32".to_string()),
            ("OTHERAPP_SERVER__PORT".to_string(), "1".to_string()),
        ]);
        let settings = Settings::load_with_env(dir.path(), Some(env)).unwrap();

        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.verify_policy(), VerifyPolicy::Reverify);
        assert_eq!(settings.inference.max_tokens, 32);
        assert_eq!(settings.server.host, "127.0.0.1");
    }
}
