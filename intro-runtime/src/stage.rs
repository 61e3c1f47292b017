//! # Stage 模块
//!
//! 阶段与阶段效果定义。
//!
//! 阶段是一次性时间线上的一个命名时间点；到达偏移时应用其全部效果。
//! 效果是**声明式**的：它们只描述对 [`IntroState`](crate::IntroState) 的修改，
//! 由序列在单一逻辑线程上按阶段顺序应用。

use std::time::Duration;

use crate::easing::Easing;

/// 阶段效果
#[derive(Debug, Clone, PartialEq)]
pub enum StageEffect {
    /// 设置状态文本
    Status(String),

    /// 向滚动日志追加一行
    Log(String),

    /// 设置 / 清除布尔标记
    Flag { key: String, on: bool },

    /// 立即设置数值（会取消同名渐变）
    Value { key: String, value: f32 },

    /// 数值渐变：`duration` 内从 `from` 变化到 `to`
    Ramp {
        key: String,
        from: f32,
        to: f32,
        duration: Duration,
        easing: Easing,
    },

    /// 打字效果：`duration` 内逐字显示 `text`
    Type {
        key: String,
        text: String,
        duration: Duration,
    },

    /// 周期日志：每隔 `every` 轮流追加 `lines` 中的一行，直到被停止
    Ticker {
        key: String,
        every: Duration,
        lines: Vec<String>,
    },

    /// 停止周期日志
    StopTicker { key: String },
}

impl StageEffect {
    pub fn status(text: impl Into<String>) -> Self {
        Self::Status(text.into())
    }

    pub fn log(line: impl Into<String>) -> Self {
        Self::Log(line.into())
    }

    /// 打开标记
    pub fn flag(key: impl Into<String>) -> Self {
        Self::Flag {
            key: key.into(),
            on: true,
        }
    }

    /// 清除标记
    pub fn clear_flag(key: impl Into<String>) -> Self {
        Self::Flag {
            key: key.into(),
            on: false,
        }
    }

    pub fn value(key: impl Into<String>, value: f32) -> Self {
        Self::Value {
            key: key.into(),
            value,
        }
    }

    /// 线性渐变
    pub fn ramp(key: impl Into<String>, from: f32, to: f32, duration: Duration) -> Self {
        Self::ramp_eased(key, from, to, duration, Easing::Linear)
    }

    /// 带缓动的渐变
    pub fn ramp_eased(
        key: impl Into<String>,
        from: f32,
        to: f32,
        duration: Duration,
        easing: Easing,
    ) -> Self {
        Self::Ramp {
            key: key.into(),
            from,
            to,
            duration,
            easing,
        }
    }

    pub fn type_text(key: impl Into<String>, text: impl Into<String>, duration: Duration) -> Self {
        Self::Type {
            key: key.into(),
            text: text.into(),
            duration,
        }
    }

    pub fn ticker<I, S>(key: impl Into<String>, every: Duration, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Ticker {
            key: key.into(),
            every,
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn stop_ticker(key: impl Into<String>) -> Self {
        Self::StopTicker { key: key.into() }
    }

    /// 效果持续的时长（瞬时效果为 0，周期日志为 `None`）
    pub fn span(&self) -> Option<Duration> {
        match self {
            Self::Ramp { duration, .. } | Self::Type { duration, .. } => Some(*duration),
            Self::Ticker { .. } => None,
            _ => Some(Duration::ZERO),
        }
    }
}

/// 阶段
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    /// 阶段名称（渲染器以此为键）
    pub name: String,
    /// 相对序列开始的激活时间
    pub offset: Duration,
    /// 激活时应用的效果
    pub effects: Vec<StageEffect>,
    /// 到达此阶段即完成序列
    pub terminal: bool,
}

impl Stage {
    /// 创建阶段
    pub fn new(name: impl Into<String>, offset: Duration) -> Self {
        Self {
            name: name.into(),
            offset,
            effects: Vec::new(),
            terminal: false,
        }
    }

    /// 以毫秒偏移创建阶段
    pub fn at_ms(name: impl Into<String>, offset_ms: u64) -> Self {
        Self::new(name, Duration::from_millis(offset_ms))
    }

    /// 添加效果
    pub fn with(mut self, effect: StageEffect) -> Self {
        self.effects.push(effect);
        self
    }

    /// 标记为终止阶段
    pub fn terminal(mut self) -> Self {
        self.terminal = true;
        self
    }
}
