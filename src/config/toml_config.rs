use crate::core::aggregator::{DEFAULT_POWER_UNIT, DEFAULT_WATER_UNIT};
use crate::core::ConfigProvider;
use crate::utils::error::{DesignerError, Result};
use crate::utils::validation::{validate_choice, validate_non_empty_string, validate_path, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const STORE_BACKENDS: [&str; 2] = ["memory", "file"];
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON `CatalogBundle` imported at startup when the store has no modules.
    pub seed_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default = "default_power_unit")]
    pub power_unit: String,
    #[serde(default = "default_water_unit")]
    pub water_unit: String,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            power_unit: default_power_unit(),
            water_unit: default_water_unit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_backend() -> String {
    "file".to_string()
}

fn default_store_path() -> String {
    "./data".to_string()
}

fn default_power_unit() -> String {
    DEFAULT_POWER_UNIT.to_string()
}

fn default_water_unit() -> String {
    DEFAULT_WATER_UNIT.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DesignerError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DesignerError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DesignerError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_choice("store.backend", &self.store.backend, &STORE_BACKENDS)?;
        if self.is_file_backend() {
            validate_path("store.path", &self.store.path)?;
        }

        if let Some(seed) = &self.catalog.seed_file {
            validate_path("catalog.seed_file", seed)?;
        }

        validate_non_empty_string("evaluation.power_unit", &self.evaluation.power_unit)?;
        validate_non_empty_string("evaluation.water_unit", &self.evaluation.water_unit)?;
        if self.evaluation.power_unit == self.evaluation.water_unit {
            return Err(DesignerError::InvalidConfigValueError {
                field: "evaluation.water_unit".to_string(),
                value: self.evaluation.water_unit.clone(),
                reason: "must differ from evaluation.power_unit".to_string(),
            });
        }

        validate_choice("logging.level", &self.logging.level, &LOG_LEVELS)?;

        Ok(())
    }

    pub fn is_file_backend(&self) -> bool {
        self.store.backend == "file"
    }

    pub fn store_path(&self) -> &str {
        &self.store.path
    }

    pub fn seed_file(&self) -> Option<&str> {
        self.catalog.seed_file.as_deref()
    }
}

impl ConfigProvider for TomlConfig {
    fn power_unit(&self) -> &str {
        &self.evaluation.power_unit
    }

    fn water_unit(&self) -> &str {
        &self.evaluation.water_unit
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
