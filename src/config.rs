use crate::error::ConfigError;
use crate::models::ReasoningEffort;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 凭据所在的环境变量
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// 程序配置
///
/// 优先级：命令行参数 > 环境变量（含 `.env.local`）> 配置文件 > 默认值
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- LLM 配置 ---
    /// 可以为空，`validate()` 会拒绝
    pub llm_api_key: String,
    /// OpenAI 兼容端点
    pub llm_api_base_url: String,
    /// 交互模式使用的模型
    pub llm_model_name: String,
    /// 批处理模式使用的模型
    pub batch_model_name: String,
    pub reasoning_effort: Option<ReasoningEffort>,
    // --- 模板存储 ---
    /// 远程模板服务地址
    pub template_store_url: String,
    /// 模板目录（批处理模式读取 `<name>.md`）
    pub templates_dir: PathBuf,
    /// 本地兜底存储目录
    pub fallback_dir: PathBuf,
    // --- 批处理 ---
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// 两个任务之间的冷却时间（秒）
    pub batch_cooldown_secs: u64,
    /// 失败日志，为空时不记录
    pub failure_log_file: Option<PathBuf>,
    // --- 其他 ---
    pub history_file: PathBuf,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai/".to_string(),
            llm_model_name: "gemini-3-pro-preview".to_string(),
            batch_model_name: "gemini-3-flash-preview".to_string(),
            reasoning_effort: Some(ReasoningEffort::Low),
            template_store_url: "http://localhost:3000".to_string(),
            templates_dir: PathBuf::from("templates"),
            fallback_dir: PathBuf::from(".scholar-digest"),
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            batch_cooldown_secs: 10,
            failure_log_file: None,
            history_file: PathBuf::from("temp/history.json"),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 读取配置文件（不存在时使用默认值），再叠加环境变量
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let base = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::FileParseFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            Self::from_toml_str(&raw).map_err(|message| ConfigError::FileParseFailed {
                path: path.display().to_string(),
                message,
            })?
        } else {
            Self::default()
        };
        base.overlay_env()
    }

    /// 只使用默认值和环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().overlay_env()
    }

    fn from_toml_str(raw: &str) -> Result<Self, String> {
        toml::from_str(raw).map_err(|e| e.to_string())
    }

    fn overlay_env(self) -> Result<Self, ConfigError> {
        Ok(Self {
            llm_api_key: env_string(API_KEY_VAR).unwrap_or(self.llm_api_key),
            llm_api_base_url: env_string("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_model_name: env_string("LLM_MODEL_NAME").unwrap_or(self.llm_model_name),
            batch_model_name: env_string("BATCH_MODEL_NAME").unwrap_or(self.batch_model_name),
            reasoning_effort: match env_string("REASONING_EFFORT") {
                Some(v) => parse_reasoning_effort(&v)?,
                None => self.reasoning_effort,
            },
            template_store_url: env_string("TEMPLATE_STORE_URL")
                .unwrap_or(self.template_store_url),
            templates_dir: env_path("TEMPLATES_DIR").unwrap_or(self.templates_dir),
            fallback_dir: env_path("FALLBACK_DIR").unwrap_or(self.fallback_dir),
            input_dir: env_path("INPUT_DIR").unwrap_or(self.input_dir),
            output_dir: env_path("OUTPUT_DIR").unwrap_or(self.output_dir),
            batch_cooldown_secs: env_parsed("BATCH_COOLDOWN_SECS", "u64")?
                .unwrap_or(self.batch_cooldown_secs),
            failure_log_file: env_path("FAILURE_LOG_FILE").or(self.failure_log_file),
            history_file: env_path("HISTORY_FILE").unwrap_or(self.history_file),
            verbose_logging: env_parsed("VERBOSE_LOGGING", "bool")?
                .unwrap_or(self.verbose_logging),
        })
    }

    /// 检查凭据，缺失时在任何任务开始前失败
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm_api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential {
                var_name: API_KEY_VAR.to_string(),
            });
        }
        Ok(())
    }

    pub fn batch_cooldown(&self) -> Duration {
        Duration::from_secs(self.batch_cooldown_secs)
    }
}

fn env_string(var_name: &str) -> Option<String> {
    std::env::var(var_name).ok().filter(|v| !v.trim().is_empty())
}

fn env_path(var_name: &str) -> Option<PathBuf> {
    env_string(var_name).map(PathBuf::from)
}

fn env_parsed<T: std::str::FromStr>(
    var_name: &str,
    expected_type: &str,
) -> Result<Option<T>, ConfigError> {
    match env_string(var_name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
    }
}

fn parse_reasoning_effort(value: &str) -> Result<Option<ReasoningEffort>, ConfigError> {
    if value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: "REASONING_EFFORT".to_string(),
            value: value.to_string(),
            expected_type: "low|medium|high|none".to_string(),
        })
}
