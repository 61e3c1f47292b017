//! # Ramp 模块
//!
//! 进度渐变与打字效果。
//!
//! 两者都以**计划开始时间**（所属阶段的偏移）为基准采样，而不是以 tick
//! 到达的时间为基准，所以 tick 抖动不会累积成误差：在 `start + duration`
//! 或之后采样总是得到终值。

use std::time::Duration;

use crate::easing::Easing;

/// 渐变状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RampState {
    /// 正在播放
    #[default]
    Playing,
    /// 已到达终值
    Finished,
}

/// 数值渐变
///
/// 管理单个 f32 值从 `from` 到 `to` 在 `duration` 时间内的变化。
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRamp {
    /// 目标键
    pub key: String,
    /// 起始值
    pub from: f32,
    /// 终值
    pub to: f32,
    /// 计划开始时间（相对序列开始）
    pub start: Duration,
    /// 时长
    pub duration: Duration,
    /// 缓动函数
    pub easing: Easing,
    state: RampState,
}

impl ProgressRamp {
    pub fn new(
        key: impl Into<String>,
        from: f32,
        to: f32,
        start: Duration,
        duration: Duration,
    ) -> Self {
        Self {
            key: key.into(),
            from,
            to,
            start,
            duration,
            easing: Easing::default(),
            state: RampState::Playing,
        }
    }

    /// 设置缓动函数
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// 归一化进度（0.0 - 1.0，已应用缓动）
    pub fn progress_at(&self, elapsed: Duration) -> f32 {
        let local = elapsed.saturating_sub(self.start);
        if self.duration.is_zero() || local >= self.duration {
            return 1.0;
        }
        self.easing
            .apply(local.as_secs_f32() / self.duration.as_secs_f32())
    }

    /// 在序列时间 `elapsed` 处采样
    ///
    /// 到达结束时间后返回精确的 `to`，并进入 `Finished`。
    pub fn sample(&mut self, elapsed: Duration) -> f32 {
        let progress = self.progress_at(elapsed);
        if progress >= 1.0 {
            self.state = RampState::Finished;
            return self.to;
        }
        self.from + (self.to - self.from) * progress
    }

    pub fn state(&self) -> RampState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == RampState::Finished
    }

    /// 结束时间
    pub fn end(&self) -> Duration {
        self.start.saturating_add(self.duration)
    }
}

/// 打字效果
///
/// 可见字符数 = ⌊进度 × 字符总数⌋，按 `char` 计数。
#[derive(Debug, Clone, PartialEq)]
pub struct Typewriter {
    /// 目标键
    pub key: String,
    text: String,
    char_count: usize,
    ramp: ProgressRamp,
}

impl Typewriter {
    pub fn new(
        key: impl Into<String>,
        text: impl Into<String>,
        start: Duration,
        duration: Duration,
    ) -> Self {
        let key = key.into();
        let text = text.into();
        let char_count = text.chars().count();
        Self {
            ramp: ProgressRamp::new(key.clone(), 0.0, 1.0, start, duration),
            key,
            text,
            char_count,
        }
    }

    /// 在序列时间 `elapsed` 处采样可见文本
    pub fn sample(&mut self, elapsed: Duration) -> &str {
        let progress = self.ramp.sample(elapsed);
        let visible = if self.ramp.is_finished() {
            self.char_count
        } else {
            ((progress * self.char_count as f32).floor() as usize).min(self.char_count)
        };
        match self.text.char_indices().nth(visible) {
            Some((byte, _)) => &self.text[..byte],
            None => &self.text,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.ramp.is_finished()
    }

    pub fn end(&self) -> Duration {
        self.ramp.end()
    }
}
