//! # Intro Host
//!
//! 开场动画的无界面宿主。
//!
//! ## 架构说明
//!
//! Host 层负责：
//! - 配置加载
//! - 产生时间（实时 / 模拟驱动器）
//! - 采集跳过输入
//! - 把界面状态渲染为终端文本
//!
//! Host 层不包含调度逻辑，阶段的激活、渐变和完成全部由 `intro-runtime` 决定。

pub mod app;
pub mod config;
pub mod driver;
pub mod error;
pub mod render;

pub use app::{
    TimelineSource, check_timeline_file, ensure_no_errors, list_loaders, run_realtime,
    run_simulated,
};
pub use config::{HostConfig, RenderConfig};
pub use driver::{RealtimeDriver, RunReport, SimulatedDriver};
pub use error::{HostError, HostResult};
pub use render::{Frame, FrameRenderer, TextRenderer};
