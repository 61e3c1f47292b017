//! # Error 模块
//!
//! 定义 intro-runtime 中使用的错误类型。

use thiserror::Error;

/// 时间线 / 序列错误
///
/// 全部属于构造期的前置条件错误；序列运行过程中不会产生错误。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SequenceError {
    /// 时间线没有任何阶段
    #[error("时间线 '{timeline}' 没有任何阶段")]
    EmptyTimeline { timeline: String },

    /// 阶段偏移量递减
    #[error(
        "时间线 '{timeline}'：阶段 '{stage}' 的偏移 {offset_ms}ms 早于前一阶段的 {previous_ms}ms"
    )]
    NonMonotonic {
        timeline: String,
        stage: String,
        offset_ms: u64,
        previous_ms: u64,
    },

    /// 无法表示为非负有限秒数的时间值
    #[error("时间线 '{timeline}'：阶段 '{stage}' 的 {field} 无效 - {value}")]
    InvalidTime {
        timeline: String,
        stage: String,
        field: String,
        value: f64,
    },

    /// 无效的效果参数
    #[error("时间线 '{timeline}'：阶段 '{stage}' 的效果无效 - {message}")]
    InvalidEffect {
        timeline: String,
        stage: String,
        message: String,
    },

    /// 日志容量为 0
    #[error("时间线 '{timeline}'：日志容量必须大于 0")]
    ZeroLogCapacity { timeline: String },

    /// 时间线 JSON 格式错误
    #[error("时间线格式错误: {message}")]
    Format { message: String },
}

impl From<serde_json::Error> for SequenceError {
    fn from(e: serde_json::Error) -> Self {
        SequenceError::Format {
            message: e.to_string(),
        }
    }
}

/// Result 类型别名
pub type SequenceResult<T> = Result<T, SequenceError>;
