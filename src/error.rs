//! 错误类型
//!
//! 分为三类：配置错误（致命）、摘要错误（单任务级别）、模板错误（只返回给直接调用方）。
//! 批处理循环只会看到 `DigestError`，并在任务边界把它转换成失败记录。

use thiserror::Error;

/// 配置错误，在任何任务开始之前终止进程
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 缺少凭据
    #[error("缺少凭据: 环境变量 {var_name} 未设置")]
    MissingCredential { var_name: String },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件解析失败
    #[error("配置文件 {path} 解析失败: {message}")]
    FileParseFailed { path: String, message: String },
}

/// 单个摘要任务的失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DigestError {
    /// 模型没有返回可用内容
    #[error("模型返回空结果 (任务: {label})")]
    EmptyResponse { label: String },
    /// 网络、鉴权或配额错误
    #[error("模型调用失败 (任务: {label}): {message}")]
    TransportError { label: String, message: String },
    /// 读取输入或写入输出失败
    #[error("文件读写失败 ({path}): {message}")]
    Io { path: String, message: String },
}

impl DigestError {
    /// 错误类别，用于统计与失败日志
    pub fn kind(&self) -> &'static str {
        match self {
            DigestError::EmptyResponse { .. } => "EmptyResponse",
            DigestError::TransportError { .. } => "TransportError",
            DigestError::Io { .. } => "Io",
        }
    }
}

/// 模板操作错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// 保存请求缺少必填字段
    #[error("校验失败: {0}")]
    Validation(String),
    /// 新模板的 id 与内置模板冲突
    #[error("模板 id '{id}' 与内置模板冲突")]
    DefaultCollision { id: String },
    /// 新模板的 id 与已有自定义模板冲突（Reject 策略）
    #[error("模板 id '{id}' 已存在")]
    Duplicate { id: String },
    /// 指定名称的模板不存在
    #[error("模板 '{name}' 不存在，可用模板: {}", available.join(", "))]
    NotFound {
        name: String,
        available: Vec<String>,
    },
}
