//! # 诊断模块
//!
//! 时间线静态检查，不依赖 IO。
//!
//! ## 设计原则
//!
//! - 纯函数 API，可在无 IO 环境下运行
//! - 诊断分级：Error（必须修复）、Warn（建议修复）、Info（信息提示）
//! - 构造期的致命问题走 [`SequenceError`](crate::SequenceError)，这里只报告可运行但可疑的时间线

use std::collections::HashSet;

use crate::stage::StageEffect;
use crate::timeline::Timeline;

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: DiagnosticLevel,
    /// 时间线 ID
    pub timeline_id: String,
    /// 阶段名（如果可定位）
    pub stage: Option<String>,
    /// 诊断消息
    pub message: String,
}

impl Diagnostic {
    /// 创建错误诊断
    pub fn error(timeline_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Error, timeline_id, message)
    }

    /// 创建警告诊断
    pub fn warn(timeline_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Warn, timeline_id, message)
    }

    /// 创建信息诊断
    pub fn info(timeline_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Info, timeline_id, message)
    }

    fn new(
        level: DiagnosticLevel,
        timeline_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            timeline_id: timeline_id.into(),
            stage: None,
            message: message.into(),
        }
    }

    /// 设置阶段
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.timeline_id)?;
        if let Some(stage) = &self.stage {
            write!(f, "#{}", stage)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default)]
pub struct DiagnosticResult {
    /// 诊断条目列表
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    /// 创建空结果
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// 合并另一个结果
    pub fn merge(&mut self, other: DiagnosticResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    pub fn warn_count(&self) -> usize {
        self.count(DiagnosticLevel::Warn)
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// 分析时间线
///
/// 包含构造时产生的诊断，以及：
/// - 停止从未启动的周期日志
/// - 完成前无法走完的渐变 / 打字效果
/// - 重复的阶段名
pub fn analyze_timeline(timeline: &Timeline) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();
    let id = timeline.id();

    for diagnostic in timeline.diagnostics() {
        result.push(diagnostic.clone());
    }

    let end = timeline.completion_offset();
    let mut started_tickers: HashSet<&str> = HashSet::new();
    let mut seen_names: HashSet<&str> = HashSet::new();

    for stage in timeline.reachable_stages() {
        if !seen_names.insert(stage.name.as_str()) {
            result.push(
                Diagnostic::info(id, format!("阶段名 '{}' 重复", stage.name))
                    .with_stage(&stage.name),
            );
        }

        for effect in &stage.effects {
            match effect {
                StageEffect::Ticker { key, .. } => {
                    started_tickers.insert(key.as_str());
                }
                StageEffect::StopTicker { key } if !started_tickers.contains(key.as_str()) => {
                    result.push(
                        Diagnostic::warn(id, format!("停止了未启动的周期日志 '{}'", key))
                            .with_stage(&stage.name),
                    );
                }
                StageEffect::Ramp { key, duration, .. } | StageEffect::Type { key, duration, .. } => {
                    let finish = stage.offset.saturating_add(*duration);
                    if finish > end {
                        result.push(
                            Diagnostic::warn(
                                id,
                                format!(
                                    "'{}' 在 {}ms 结束，晚于序列完成时间 {}ms",
                                    key,
                                    finish.as_millis(),
                                    end.as_millis()
                                ),
                            )
                            .with_stage(&stage.name),
                        );
                    }
                }
                _ => {}
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Stage;
    use crate::timeline::{OffsetPolicy, Timeline};
    use std::time::Duration;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_clean_timeline() {
        let timeline = Timeline::builder("clean")
            .stage(Stage::at_ms("init", 0).with(StageEffect::status("BOOT")))
            .stage(Stage::at_ms("scan", 1000).with(StageEffect::ramp("scan", 0.0, 100.0, ms(2000))))
            .stage(Stage::at_ms("reveal", 3000).terminal())
            .build()
            .unwrap();

        let result = analyze_timeline(&timeline);
        assert!(result.is_empty(), "{:?}", result.diagnostics);
    }

    #[test]
    fn test_ramp_past_completion() {
        let timeline = Timeline::builder("late")
            .stage(Stage::at_ms("scan", 0).with(StageEffect::ramp("scan", 0.0, 1.0, ms(5000))))
            .stage(Stage::at_ms("done", 3000))
            .build()
            .unwrap();

        let result = analyze_timeline(&timeline);
        assert_eq!(result.warn_count(), 1);
        assert_eq!(result.diagnostics[0].stage.as_deref(), Some("scan"));
    }

    #[test]
    fn test_stop_unknown_ticker() {
        let timeline = Timeline::builder("ticker")
            .stage(Stage::at_ms("a", 0).with(StageEffect::stop_ticker("feed")))
            .build()
            .unwrap();

        let result = analyze_timeline(&timeline);
        assert_eq!(result.warn_count(), 1);
        assert!(result.diagnostics[0].message.contains("feed"));
    }

    #[test]
    fn test_clamped_offset_is_error() {
        let timeline = Timeline::builder("clamped")
            .offset_policy(OffsetPolicy::Clamp)
            .stage(Stage::at_ms("a", 1000))
            .stage(Stage::at_ms("b", 500))
            .build()
            .unwrap();

        let result = analyze_timeline(&timeline);
        assert!(result.has_errors());
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.warn_count(), 0);
    }

    #[test]
    fn test_build_warnings_are_included() {
        let timeline = Timeline::builder("early")
            .stage(Stage::at_ms("a", 0).terminal())
            .stage(Stage::at_ms("b", 500))
            .build()
            .unwrap();

        let result = analyze_timeline(&timeline);
        assert_eq!(result.warn_count(), 1);
        assert!(!result.has_errors());
    }

    #[test]
    fn test_duplicate_names_are_info() {
        let timeline = Timeline::builder("dup")
            .stage(Stage::at_ms("log", 0))
            .stage(Stage::at_ms("log", 100))
            .build()
            .unwrap();

        let result = analyze_timeline(&timeline);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].level, DiagnosticLevel::Info);
    }

    #[test]
    fn test_display() {
        let d = Diagnostic::warn("soc", "something").with_stage("scan");
        assert_eq!(d.to_string(), "[WARN] soc#scan: something");
    }
}
