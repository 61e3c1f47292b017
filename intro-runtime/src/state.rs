//! # State 模块
//!
//! 序列的生命周期状态、事件，以及效果所修改的界面状态。
//!
//! ## 状态转换
//!
//! ```text
//! Idle ──start──► Running ──终止阶段──► Completed
//!   │                │
//!   │                ├──skip──────► Skipped
//!   └───skip/teardown┴──teardown──► TornDown
//! ```
//!
//! 所有终态都是吸收态。

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::log_buffer::RollingLog;

/// 序列生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceState {
    /// 已创建，未开始
    #[default]
    Idle,
    /// 正在按时间顺序激活阶段
    Running,
    /// 自然完成
    Completed,
    /// 被用户跳过
    Skipped,
    /// 被拆除（不调用完成回调）
    TornDown,
}

impl SequenceState {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Skipped | Self::TornDown)
    }

    /// 完成回调是否已经（或将要）被调用
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Skipped)
    }
}

impl std::fmt::Display for SequenceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
            Self::TornDown => "torn_down",
        };
        f.write_str(name)
    }
}

/// 序列事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceEvent {
    /// 序列开始
    Started,
    /// 阶段激活
    StageEntered {
        index: usize,
        name: String,
        /// 阶段的计划偏移（毫秒）
        at_ms: u64,
    },
    /// 自然完成
    Completed,
    /// 被跳过
    Skipped,
    /// 被拆除
    TornDown,
}

/// 界面状态
///
/// 阶段效果修改的全部外部可见状态：状态文本、数值、打字文本、标记和滚动日志。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntroState {
    pub(crate) status: String,
    pub(crate) values: BTreeMap<String, f32>,
    pub(crate) texts: BTreeMap<String, String>,
    pub(crate) flags: BTreeSet<String>,
    pub(crate) log: RollingLog,
    /// 每个数值键上出现过的渐变端点范围 (min, max)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) ranges: BTreeMap<String, (f32, f32)>,
}

impl IntroState {
    /// 创建空状态
    pub fn new(log_capacity: usize) -> Self {
        Self {
            status: String::new(),
            values: BTreeMap::new(),
            texts: BTreeMap::new(),
            flags: BTreeSet::new(),
            log: RollingLog::new(log_capacity),
            ranges: BTreeMap::new(),
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn value(&self, key: &str) -> Option<f32> {
        self.values.get(key).copied()
    }

    pub fn value_or(&self, key: &str, default: f32) -> f32 {
        self.value(key).unwrap_or(default)
    }

    /// 数值在其量程内的比例（0.0 - 1.0）
    ///
    /// 有过渐变的键以这些渐变端点的并集为量程，其余键按 0 - 100 换算。
    pub fn fraction(&self, key: &str) -> Option<f32> {
        let value = self.value(key)?;
        let fraction = match self.ranges.get(key) {
            Some(&(lo, hi)) if hi > lo => (value - lo) / (hi - lo),
            Some(&(_, hi)) => {
                if value >= hi {
                    1.0
                } else {
                    0.0
                }
            }
            None => value / 100.0,
        };
        Some(fraction.clamp(0.0, 1.0))
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.texts.get(key).map(String::as_str)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.flags.contains(key)
    }

    pub fn log(&self) -> &RollingLog {
        &self.log
    }

    /// 全部数值（按键排序）
    pub fn values(&self) -> impl Iterator<Item = (&str, f32)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// 全部打字文本（按键排序）
    pub fn texts(&self) -> impl Iterator<Item = (&str, &str)> {
        self.texts.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// 全部已打开的标记（按键排序）
    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }

    /// 把渐变端点并入该键的量程
    pub(crate) fn widen_range(&mut self, key: &str, from: f32, to: f32) {
        let (lo, hi) = (from.min(to), from.max(to));
        self.ranges
            .entry(key.to_string())
            .and_modify(|range| *range = (range.0.min(lo), range.1.max(hi)))
            .or_insert((lo, hi));
    }

    pub(crate) fn set_flag(&mut self, key: &str, on: bool) {
        if on {
            self.flags.insert(key.to_string());
        } else {
            self.flags.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_classification() {
        assert!(!SequenceState::Idle.is_terminal());
        assert!(!SequenceState::Running.is_terminal());
        assert!(SequenceState::Completed.is_terminal());
        assert!(SequenceState::Skipped.is_terminal());
        assert!(SequenceState::TornDown.is_terminal());

        assert!(SequenceState::Skipped.is_finished());
        assert!(!SequenceState::TornDown.is_finished());
    }

    #[test]
    fn test_intro_state_accessors() {
        let mut state = IntroState::new(3);
        state.status = "SCANNING...".to_string();
        state.values.insert("scan".to_string(), 42.0);
        state.texts.insert("cmd".to_string(), "ls".to_string());
        state.set_flag("secure", true);

        assert_eq!(state.status(), "SCANNING...");
        assert_eq!(state.value("scan"), Some(42.0));
        assert_eq!(state.value_or("missing", 7.0), 7.0);
        assert_eq!(state.text("cmd"), Some("ls"));
        assert!(state.flag("secure"));

        state.set_flag("secure", false);
        assert!(!state.flag("secure"));
        assert_eq!(state.flags().count(), 0);
    }

    #[test]
    fn test_fraction_uses_ramp_range() {
        let mut state = IntroState::new(3);
        state.widen_range("scan", 0.0, 100.0);
        state.values.insert("scan".to_string(), 1.5);
        assert_eq!(state.fraction("scan"), Some(0.015));

        state.widen_range("fade", 1.0, 0.0);
        state.values.insert("fade".to_string(), 0.5);
        assert_eq!(state.fraction("fade"), Some(0.5));

        // 没有渐变的键按百分比换算
        state.values.insert("plain".to_string(), 25.0);
        assert_eq!(state.fraction("plain"), Some(0.25));
        assert_eq!(state.fraction("missing"), None);
    }

    #[test]
    fn test_ranges_accumulate() {
        let mut state = IntroState::new(3);
        state.widen_range("threat", 0.0, 99.0);
        state.widen_range("threat", 100.0, 0.0);
        state.values.insert("threat".to_string(), 50.0);
        assert_eq!(state.fraction("threat"), Some(0.5));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SequenceState::TornDown.to_string(), "torn_down");
    }
}
