//! # Log Buffer 模块
//!
//! 滚动日志缓冲区，对应 intro 界面上"只显示最近 N 行"的日志面板。
//!
//! 超出容量时按 FIFO 淘汰最早的一行。

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// 默认容量（最近 7 行）
pub const DEFAULT_LOG_CAPACITY: usize = 7;

/// 固定容量的滚动日志
///
/// 反序列化时容量至少为 1，超出容量的旧行被丢弃。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RollingLogData")]
pub struct RollingLog {
    /// 日志行（按追加顺序）
    lines: VecDeque<String>,
    /// 最大行数
    capacity: usize,
}

/// 序列化形式（未校验）
#[derive(Deserialize)]
struct RollingLogData {
    lines: VecDeque<String>,
    capacity: usize,
}

impl From<RollingLogData> for RollingLog {
    fn from(data: RollingLogData) -> Self {
        let mut log = Self::new(data.capacity);
        for line in data.lines {
            log.push(line);
        }
        log
    }
}

impl Default for RollingLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

impl RollingLog {
    /// 创建指定容量的日志
    ///
    /// 容量至少为 1。
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// 追加一行
    ///
    /// 如果超过容量，移除最早的一行。
    pub fn push(&mut self, line: impl Into<String>) {
        while self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    /// 按追加顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// 最近一行
    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 清空日志
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
