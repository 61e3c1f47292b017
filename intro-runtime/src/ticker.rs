//! # Ticker 模块
//!
//! 周期日志发射器（攻击情报流、威胁计数之类的"滚动日志"）。
//!
//! 第 k 行（k 从 1 开始）的计划时间是 `start + k * every`，
//! 内容按 `lines` 轮转，结果完全确定。

use std::time::Duration;

/// 周期日志
#[derive(Debug, Clone, PartialEq)]
pub struct Ticker {
    /// 标识键（`StopTicker` 以此停止）
    pub key: String,
    lines: Vec<String>,
    every: Duration,
    start: Duration,
    emitted: u128,
}

impl Ticker {
    /// 创建周期日志
    ///
    /// `every` 为 0 或 `lines` 为空的周期日志永远不会发射。
    pub fn new(key: impl Into<String>, lines: Vec<String>, every: Duration, start: Duration) -> Self {
        Self {
            key: key.into(),
            lines,
            every,
            start,
            emitted: 0,
        }
    }

    /// 取出到 `elapsed` 为止应发射、尚未发射的行
    ///
    /// 最多返回最后 `max` 行：更早的行反正会被滚动日志淘汰，
    /// 跳过它们只推进计数。
    pub fn due(&mut self, elapsed: Duration, max: usize) -> Vec<String> {
        if self.every.is_zero() || self.lines.is_empty() {
            return Vec::new();
        }

        let local = elapsed.saturating_sub(self.start);
        let total = local.as_nanos() / self.every.as_nanos();
        if total <= self.emitted {
            return Vec::new();
        }

        let fresh = total - self.emitted;
        let first = self.emitted + fresh.saturating_sub(max as u128);
        let len = self.lines.len() as u128;
        let out = (first..total)
            .map(|k| self.lines[(k % len) as usize].clone())
            .collect();
        self.emitted = total;
        out
    }

    /// 已发射的行数（含被跳过的）
    pub fn emitted(&self) -> u128 {
        self.emitted
    }
}
