use crate::adapters::gemini::{DEFAULT_FALLBACK_MODEL, DEFAULT_MODEL, GEMINI_API_BASE};
use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DEFAULT_OUTPUT_FILE: &str = "roof_order_output.json";
const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub gemini: GeminiConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub prompt: Option<PromptConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub model: Option<String>,
    pub fallback_model: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("fallback_model", &self.fallback_model)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub filename: Option<String>,
    pub print: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default)]
    pub hints: Vec<HintConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintConfig {
    pub path: String,
    pub hint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_format: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GOOGLE_API_KEY})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("input.path", &self.input.path)?;
        validation::validate_file_extension("input.path", &self.input.path, &["pdf"])?;
        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_non_empty_string("output.filename", self.output_file())?;
        validation::validate_url("gemini.api_base", self.api_base())?;
        validation::validate_non_empty_string("gemini.model", self.model())?;
        validation::validate_range("gemini.timeout_seconds", self.timeout_seconds(), 1, 600)?;

        if let Some(prompt) = &self.prompt {
            for hint in &prompt.hints {
                validation::validate_non_empty_string("prompt.hints.path", &hint.path)?;
                validation::validate_non_empty_string("prompt.hints.hint", &hint.hint)?;
            }
        }

        if let Some(format) = self.monitoring.as_ref().and_then(|m| m.log_format.as_deref()) {
            if !["compact", "json"].contains(&format) {
                return Err(EtlError::InvalidConfigValueError {
                    field: "monitoring.log_format".to_string(),
                    value: format.to_string(),
                    reason: "Unsupported format. Valid formats: compact, json".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.gemini.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    pub fn print_output(&self) -> bool {
        self.output.print.unwrap_or(true)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format.as_deref())
            .map(|f| f == "json")
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn output_file(&self) -> &str {
        self.output.filename.as_deref().unwrap_or(DEFAULT_OUTPUT_FILE)
    }

    fn api_base(&self) -> &str {
        self.gemini.api_base.as_deref().unwrap_or(GEMINI_API_BASE)
    }

    fn api_key(&self) -> Option<&str> {
        // 未被替換的 ${VAR} 視為未設定
        self.gemini
            .api_key
            .as_deref()
            .filter(|key| !key.starts_with("${"))
    }

    fn model(&self) -> &str {
        self.gemini.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    fn fallback_model(&self) -> Option<&str> {
        match self.gemini.fallback_model.as_deref() {
            Some("") => None,
            Some(model) => Some(model),
            None => Some(DEFAULT_FALLBACK_MODEL),
        }
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds())
    }

    fn extra_hints(&self) -> Vec<(String, String)> {
        self.prompt
            .iter()
            .flat_map(|p| p.hints.iter())
            .map(|h| (h.path.clone(), h.hint.clone()))
            .collect()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
