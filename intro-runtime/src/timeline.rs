//! # Timeline 模块
//!
//! 已校验、不可变的阶段列表。
//!
//! ## 校验规则
//!
//! - 空时间线：总是 [`SequenceError::EmptyTimeline`]
//! - 日志容量为 0：[`SequenceError::ZeroLogCapacity`]
//! - 周期为 0 或没有内容的周期日志、非有限的渐变端点：[`SequenceError::InvalidEffect`]
//! - 偏移递减：取决于 [`OffsetPolicy`]
//!   - `Reject`：[`SequenceError::NonMonotonic`]
//!   - `Clamp`：抬升到前一阶段的偏移，并记录一条错误诊断（`Reject` 下无法加载）
//! - 终止阶段之后还有阶段：记录警告（这些阶段永远不会激活）

use std::time::Duration;

use crate::diagnostic::Diagnostic;
use crate::error::{SequenceError, SequenceResult};
use crate::log_buffer::DEFAULT_LOG_CAPACITY;
use crate::stage::{Stage, StageEffect};

/// 偏移递减时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetPolicy {
    /// 直接报错（开发期快速失败）
    Reject,
    /// 抬升为非递减并给出警告
    Clamp,
}

impl Default for OffsetPolicy {
    /// debug build 拒绝，release build 抬升
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Reject
        } else {
            Self::Clamp
        }
    }
}

/// 时间线
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    id: String,
    stages: Vec<Stage>,
    log_capacity: usize,
    terminal_index: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Timeline {
    /// 创建构建器
    pub fn builder(id: impl Into<String>) -> TimelineBuilder {
        TimelineBuilder::new(id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// 全部阶段（偏移非递减）
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// 会被激活的阶段（到终止阶段为止）
    pub fn reachable_stages(&self) -> &[Stage] {
        &self.stages[..=self.terminal_index]
    }

    pub fn log_capacity(&self) -> usize {
        self.log_capacity
    }

    /// 终止阶段下标
    ///
    /// 第一个标记为 terminal 的阶段；没有标记时为最后一个阶段。
    pub fn terminal_index(&self) -> usize {
        self.terminal_index
    }

    /// 序列自然完成的时间
    pub fn completion_offset(&self) -> Duration {
        self.stages[self.terminal_index].offset
    }

    /// 构建时产生的诊断（偏移抬升、不可达阶段）
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// 校验后的时间线至少有一个阶段
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// 时间线构建器
#[derive(Debug, Clone)]
pub struct TimelineBuilder {
    id: String,
    stages: Vec<Stage>,
    log_capacity: usize,
    policy: OffsetPolicy,
}

impl TimelineBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stages: Vec::new(),
            log_capacity: DEFAULT_LOG_CAPACITY,
            policy: OffsetPolicy::default(),
        }
    }

    /// 追加阶段
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// 批量追加阶段
    pub fn stages(mut self, stages: impl IntoIterator<Item = Stage>) -> Self {
        self.stages.extend(stages);
        self
    }

    /// 设置滚动日志容量
    pub fn log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        self
    }

    /// 设置偏移递减时的处理策略
    pub fn offset_policy(mut self, policy: OffsetPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 校验并构建
    pub fn build(self) -> SequenceResult<Timeline> {
        let Self {
            id,
            mut stages,
            log_capacity,
            policy,
        } = self;

        if stages.is_empty() {
            return Err(SequenceError::EmptyTimeline { timeline: id });
        }
        if log_capacity == 0 {
            return Err(SequenceError::ZeroLogCapacity { timeline: id });
        }

        let mut diagnostics = Vec::new();

        for stage in &stages {
            validate_effects(&id, stage)?;
        }

        let mut previous = Duration::ZERO;
        for stage in &mut stages {
            if stage.offset < previous {
                match policy {
                    OffsetPolicy::Reject => {
                        return Err(SequenceError::NonMonotonic {
                            timeline: id,
                            stage: stage.name.clone(),
                            offset_ms: stage.offset.as_millis() as u64,
                            previous_ms: previous.as_millis() as u64,
                        });
                    }
                    OffsetPolicy::Clamp => {
                        diagnostics.push(
                            Diagnostic::error(
                                &id,
                                format!(
                                    "偏移 {}ms 早于前一阶段，已抬升为 {}ms",
                                    stage.offset.as_millis(),
                                    previous.as_millis()
                                ),
                            )
                            .with_stage(&stage.name),
                        );
                        stage.offset = previous;
                    }
                }
            }
            previous = stage.offset;
        }

        let terminal_index = stages
            .iter()
            .position(|s| s.terminal)
            .unwrap_or(stages.len() - 1);

        let unreachable = stages.len() - 1 - terminal_index;
        if unreachable > 0 {
            diagnostics.push(
                Diagnostic::warn(
                    &id,
                    format!("终止阶段之后的 {} 个阶段永远不会激活", unreachable),
                )
                .with_stage(&stages[terminal_index].name),
            );
        }

        Ok(Timeline {
            id,
            stages,
            log_capacity,
            terminal_index,
            diagnostics,
        })
    }
}

fn validate_effects(timeline: &str, stage: &Stage) -> SequenceResult<()> {
    let invalid = |message: String| SequenceError::InvalidEffect {
        timeline: timeline.to_string(),
        stage: stage.name.clone(),
        message,
    };

    for effect in &stage.effects {
        match effect {
            StageEffect::Ticker { key, every, lines } => {
                if every.is_zero() {
                    return Err(invalid(format!("周期日志 '{}' 的周期为 0", key)));
                }
                if lines.is_empty() {
                    return Err(invalid(format!("周期日志 '{}' 没有内容", key)));
                }
            }
            StageEffect::Ramp { key, from, to, .. } => {
                if !from.is_finite() || !to.is_finite() {
                    return Err(invalid(format!("渐变 '{}' 的端点不是有限数", key)));
                }
            }
            StageEffect::Value { key, value } if !value.is_finite() => {
                return Err(invalid(format!("数值 '{}' 不是有限数", key)));
            }
            _ => {}
        }
    }
    Ok(())
}
