//! # Easing 模块
//!
//! 进度曲线，用于数值渐变和打字效果的时间插值。
//!
//! 所有曲线在 [0, 1] 上单调不减，且 `apply(0) == 0`、`apply(1) == 1`，
//! 因此渐变值总是单调地到达终值。

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// 缓动函数类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// 线性（匀速）
    #[default]
    Linear,
    /// 二次缓入
    EaseInQuad,
    /// 二次缓出
    EaseOutQuad,
    /// 二次缓入缓出
    EaseInOutQuad,
    /// 三次缓入
    EaseInCubic,
    /// 三次缓出
    EaseOutCubic,
    /// 三次缓入缓出
    EaseInOutCubic,
    /// 正弦缓入缓出
    EaseInOutSine,
}

impl Easing {
    /// 计算缓动值
    ///
    /// # 参数
    /// - `t`: 时间进度 (0.0 - 1.0)，超出范围会被限制
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Easing::Linear => t,
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
        }
    }
}
