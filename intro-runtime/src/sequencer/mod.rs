//! # Sequencer 模块
//!
//! 基于单一周期 tick 的阶段调度器。
//!
//! ## 使用
//!
//! ```text
//! let handle = sequencer::start(stages, on_complete)?;
//! loop {
//!     handle.tick(frame_dt);   // 驱动器每帧调用
//! }
//! sequencer::skip(&handle);     // 跳过控件
//! sequencer::teardown(&handle); // 宿主卸载
//! ```
//!
//! 所有取消都只是一次状态转换：没有需要逐个清理的计时器。

mod handle;
mod sequence;

pub use handle::SequenceHandle;
pub use sequence::{OnComplete, Sequence};

use crate::error::SequenceResult;
use crate::stage::Stage;
use crate::timeline::Timeline;

/// 校验阶段列表并开始序列
///
/// 使用默认的 [`OffsetPolicy`](crate::OffsetPolicy)。偏移为 0 的阶段在返回前已经激活。
///
/// # 参数
/// - `stages`: 非空、偏移非递减的阶段列表
/// - `on_complete`: 完成回调（至多调用一次）
pub fn start(
    stages: impl IntoIterator<Item = Stage>,
    on_complete: impl FnOnce() + 'static,
) -> SequenceResult<SequenceHandle> {
    let timeline = Timeline::builder("inline").stages(stages).build()?;
    Ok(start_timeline(timeline, on_complete))
}

/// 以已校验的时间线开始序列
pub fn start_timeline(timeline: Timeline, on_complete: impl FnOnce() + 'static) -> SequenceHandle {
    let handle = SequenceHandle::new(timeline, on_complete);
    handle.start();
    handle
}

/// 跳过序列（任何状态下都可以调用）
pub fn skip(handle: &SequenceHandle) {
    handle.skip();
}

/// 拆除序列（任何状态下都可以调用）
pub fn teardown(handle: &SequenceHandle) {
    handle.teardown();
}
