//! # Intro Runtime
//!
//! 站点开场动画的阶段调度核心。
//!
//! ## 架构概述
//!
//! `intro-runtime` 是纯逻辑核心，不依赖任何 IO、计时器或渲染。
//! 宿主层（Host）按帧推进时间，Runtime 返回事件并更新界面状态：
//!
//! ```text
//! Host                              Runtime
//!   │                                  │
//!   │──── tick(dt) / skip() ─────────►│
//!   │                                  │ 激活到期阶段、推进渐变
//!   │◄─── Vec<SequenceEvent> ─────────│
//!   │◄─── snapshot(): IntroState ─────│
//!   │                                  │
//! ```
//!
//! ## 核心类型
//!
//! - [`Stage`] / [`StageEffect`]：带偏移的阶段及其声明式效果
//! - [`Timeline`]：已校验的阶段列表
//! - [`Sequence`] / [`SequenceHandle`]：一次性、只向前的调度器
//! - [`IntroState`]：效果所修改的界面状态
//!
//! ## 使用示例
//!
//! ```ignore
//! use intro_runtime::{catalog, LoaderKind, SequenceHandle};
//!
//! let timeline = catalog::timeline(LoaderKind::Soc)?;
//! let handle = SequenceHandle::new(timeline, || show_content());
//! handle.start();
//!
//! loop {
//!     for event in handle.tick(frame_dt) {
//!         renderer.on_event(&event);
//!     }
//!     renderer.draw(&handle.snapshot());
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`sequencer`]：调度器与句柄
//! - [`timeline`] / [`stage`]：时间线定义与校验
//! - [`format`]：时间线 JSON 格式
//! - [`ramp`] / [`ticker`] / [`log_buffer`]：渐变、周期日志、滚动日志
//! - [`catalog`]：内置开场动画
//! - [`shell`]：开场动画与正文之间的切换
//! - [`diagnostic`]：时间线静态检查

pub mod catalog;
pub mod diagnostic;
pub mod easing;
pub mod error;
pub mod format;
pub mod log_buffer;
pub mod ramp;
pub mod sequencer;
pub mod shell;
pub mod stage;
pub mod state;
pub mod ticker;
pub mod timeline;

// 重导出核心类型
pub use catalog::{LoaderKind, UnknownLoader};
pub use diagnostic::{Diagnostic, DiagnosticLevel, DiagnosticResult, analyze_timeline};
pub use easing::Easing;
pub use error::{SequenceError, SequenceResult};
pub use format::TimelineFile;
pub use log_buffer::{DEFAULT_LOG_CAPACITY, RollingLog};
pub use ramp::{ProgressRamp, Typewriter};
pub use sequencer::{OnComplete, Sequence, SequenceHandle, skip, start, start_timeline, teardown};
pub use shell::{ScrollState, SiteContext, SitePhase, SiteShell, ThemeMode};
pub use stage::{Stage, StageEffect};
pub use state::{IntroState, SequenceEvent, SequenceState};
pub use ticker::Ticker;
pub use timeline::{OffsetPolicy, Timeline, TimelineBuilder};
