//! Configuration structures for the tensor utilities

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};
use crate::tensor::{DType, Tensor, TensorType};

/// Library configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Type of tensors created without a template
    pub default_tensor_type: TensorType,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_tensor_type: TensorType::new(DType::Double),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON or YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Save configuration, as YAML for `.yaml`/`.yml` paths and JSON otherwise
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_tensor_type.namespace().is_empty() {
            return Err(Error::config("Default tensor type needs a namespace"));
        }
        self.logging.validate()
    }

    /// Empty tensor of the default type
    pub fn new_tensor(&self) -> Tensor {
        Tensor::new(self.default_tensor_type.clone())
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext == "yaml" || ext == "yml")
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of plain text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "legacy_nn_utils=info,warn".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Validate the filter directives
    pub fn validate(&self) -> Result<()> {
        if self.level.trim().is_empty() {
            return Err(Error::config("Logging level must not be empty"));
        }
        EnvFilter::try_new(&self.level)
            .map_err(|e| Error::config(format!("Invalid logging level '{}': {}", self.level, e)))?;
        Ok(())
    }
}
