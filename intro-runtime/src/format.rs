//! # Format 模块
//!
//! 时间线的 JSON 文件格式。
//!
//! 时间以**秒**（f64）书写，加载时四舍五入到毫秒：
//!
//! ```json
//! {
//!   "id": "soc",
//!   "log_capacity": 8,
//!   "stages": [
//!     { "name": "watch", "at": 0.0,
//!       "effects": [ { "ticker": { "key": "feed", "every": 0.4, "lines": ["PORT_SCAN"] } } ] },
//!     { "name": "terminal", "at": 2.5, "effects": [ { "flag": { "key": "terminal" } } ] },
//!     { "name": "complete", "at": 8.0, "terminal": true }
//!   ]
//! }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::error::{SequenceError, SequenceResult};
use crate::log_buffer::DEFAULT_LOG_CAPACITY;
use crate::stage::{Stage, StageEffect};
use crate::timeline::{OffsetPolicy, Timeline};

/// 时间线文件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimelineFile {
    pub id: String,
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
    pub stages: Vec<StageFile>,
}

/// 阶段条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageFile {
    pub name: String,
    /// 偏移（秒）
    pub at: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<EffectFile>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub terminal: bool,
}

/// 效果条目（外部标签，如 `{"status": "..."}`）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectFile {
    Status(String),
    Log(String),
    Flag {
        key: String,
        #[serde(default = "default_true")]
        on: bool,
    },
    Value {
        key: String,
        value: f32,
    },
    Ramp {
        key: String,
        from: f32,
        to: f32,
        /// 秒
        duration: f64,
        #[serde(default)]
        easing: Easing,
    },
    Type {
        key: String,
        text: String,
        /// 秒
        duration: f64,
    },
    Ticker {
        key: String,
        /// 秒
        every: f64,
        lines: Vec<String>,
    },
    StopTicker {
        key: String,
    },
}

fn default_log_capacity() -> usize {
    DEFAULT_LOG_CAPACITY
}

fn default_true() -> bool {
    true
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl Timeline {
    /// 从 JSON 文本加载（使用默认偏移策略）
    pub fn from_json(text: &str) -> SequenceResult<Timeline> {
        Self::from_json_with_policy(text, OffsetPolicy::default())
    }

    /// 从 JSON 文本加载，指定偏移策略
    pub fn from_json_with_policy(text: &str, policy: OffsetPolicy) -> SequenceResult<Timeline> {
        let file: TimelineFile = serde_json::from_str(text)?;
        file.into_timeline(policy)
    }

    /// 导出为 JSON 文本
    pub fn to_json(&self) -> SequenceResult<String> {
        Ok(serde_json::to_string_pretty(&TimelineFile::from(self))?)
    }
}

impl TimelineFile {
    /// 转换为已校验的时间线
    pub fn into_timeline(self, policy: OffsetPolicy) -> SequenceResult<Timeline> {
        let id = self.id;
        let mut stages = Vec::with_capacity(self.stages.len());

        for stage in self.stages {
            let offset = seconds(&id, &stage.name, "at", stage.at)?;
            let mut effects = Vec::with_capacity(stage.effects.len());
            for effect in stage.effects {
                effects.push(effect.into_effect(&id, &stage.name)?);
            }
            stages.push(Stage {
                name: stage.name,
                offset,
                effects,
                terminal: stage.terminal,
            });
        }

        Timeline::builder(id)
            .log_capacity(self.log_capacity)
            .offset_policy(policy)
            .stages(stages)
            .build()
    }
}

impl EffectFile {
    fn into_effect(self, timeline: &str, stage: &str) -> SequenceResult<StageEffect> {
        Ok(match self {
            EffectFile::Status(text) => StageEffect::Status(text),
            EffectFile::Log(line) => StageEffect::Log(line),
            EffectFile::Flag { key, on } => StageEffect::Flag { key, on },
            EffectFile::Value { key, value } => StageEffect::Value { key, value },
            EffectFile::Ramp {
                key,
                from,
                to,
                duration,
                easing,
            } => StageEffect::Ramp {
                duration: seconds(timeline, stage, "duration", duration)?,
                key,
                from,
                to,
                easing,
            },
            EffectFile::Type {
                key,
                text,
                duration,
            } => StageEffect::Type {
                duration: seconds(timeline, stage, "duration", duration)?,
                key,
                text,
            },
            EffectFile::Ticker { key, every, lines } => StageEffect::Ticker {
                every: seconds(timeline, stage, "every", every)?,
                key,
                lines,
            },
            EffectFile::StopTicker { key } => StageEffect::StopTicker { key },
        })
    }
}

impl From<&Timeline> for TimelineFile {
    fn from(timeline: &Timeline) -> Self {
        TimelineFile {
            id: timeline.id().to_string(),
            log_capacity: timeline.log_capacity(),
            stages: timeline
                .stages()
                .iter()
                .map(|stage| StageFile {
                    name: stage.name.clone(),
                    at: to_seconds(stage.offset),
                    effects: stage.effects.iter().map(EffectFile::from).collect(),
                    terminal: stage.terminal,
                })
                .collect(),
        }
    }
}

impl From<&StageEffect> for EffectFile {
    fn from(effect: &StageEffect) -> Self {
        match effect.clone() {
            StageEffect::Status(text) => EffectFile::Status(text),
            StageEffect::Log(line) => EffectFile::Log(line),
            StageEffect::Flag { key, on } => EffectFile::Flag { key, on },
            StageEffect::Value { key, value } => EffectFile::Value { key, value },
            StageEffect::Ramp {
                key,
                from,
                to,
                duration,
                easing,
            } => EffectFile::Ramp {
                key,
                from,
                to,
                duration: to_seconds(duration),
                easing,
            },
            StageEffect::Type {
                key,
                text,
                duration,
            } => EffectFile::Type {
                key,
                text,
                duration: to_seconds(duration),
            },
            StageEffect::Ticker { key, every, lines } => EffectFile::Ticker {
                key,
                every: to_seconds(every),
                lines,
            },
            StageEffect::StopTicker { key } => EffectFile::StopTicker { key },
        }
    }
}

/// 秒 → Duration（四舍五入到毫秒）
///
/// 负数、NaN、无穷大都视为无效。
fn seconds(timeline: &str, stage: &str, field: &str, value: f64) -> SequenceResult<Duration> {
    if !value.is_finite() || value < 0.0 {
        return Err(SequenceError::InvalidTime {
            timeline: timeline.to_string(),
            stage: stage.to_string(),
            field: field.to_string(),
            value,
        });
    }
    Ok(Duration::from_millis((value * 1000.0).round() as u64))
}

fn to_seconds(duration: Duration) -> f64 {
    duration.as_millis() as f64 / 1000.0
}
