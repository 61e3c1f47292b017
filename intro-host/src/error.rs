//! # Error 模块
//!
//! 宿主层错误类型。

use std::path::PathBuf;

use intro_runtime::SequenceError;
use thiserror::Error;

/// 宿主层错误
#[derive(Error, Debug)]
pub enum HostError {
    /// 时间线构建 / 解析失败
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    /// 文件读取失败
    #[error("无法读取 {path:?}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 配置文件解析失败
    #[error("无法解析 {path:?}: {source}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// 输出失败
    #[error("输出失败: {0}")]
    Io(#[from] std::io::Error),

    /// 配置序列化失败
    #[error("配置序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),

    /// 配置无效
    #[error("配置验证失败: {0}")]
    InvalidConfig(String),

    /// 时间线诊断发现错误
    #[error("时间线检查发现 {errors} 个错误")]
    Diagnostics { errors: usize },
}

/// Result 类型别名
pub type HostResult<T> = Result<T, HostError>;
