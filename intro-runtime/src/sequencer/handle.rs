//! 共享序列句柄

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use super::sequence::{OnComplete, Sequence};
use crate::state::{IntroState, SequenceEvent, SequenceState};
use crate::timeline::Timeline;

/// 序列句柄
///
/// 跳过控件和驱动器各持一份克隆。完成回调总是在释放内部借用之后调用，
/// 因此回调里可以再次查询（甚至 `skip`）同一个句柄。
#[derive(Debug, Clone)]
pub struct SequenceHandle {
    inner: Rc<RefCell<Sequence>>,
}

impl SequenceHandle {
    /// 创建处于 `Idle` 状态的句柄
    pub fn new(timeline: Timeline, on_complete: impl FnOnce() + 'static) -> Self {
        Self::from_sequence(Sequence::new(timeline, on_complete))
    }

    pub fn from_sequence(sequence: Sequence) -> Self {
        Self {
            inner: Rc::new(RefCell::new(sequence)),
        }
    }

    /// 开始序列，参见 [`Sequence::start`]
    pub fn start(&self) -> bool {
        let (started, callback) = self.inner.borrow_mut().start_deferred();
        invoke(callback);
        started
    }

    /// 推进时间，参见 [`Sequence::tick`]
    pub fn tick(&self, dt: Duration) -> Vec<SequenceEvent> {
        let callback = self.inner.borrow_mut().advance_deferred(dt);
        invoke(callback);
        self.inner.borrow_mut().drain_events()
    }

    /// 跳过序列，参见 [`Sequence::skip`]
    pub fn skip(&self) -> bool {
        let callback = self.inner.borrow_mut().skip_deferred();
        let skipped = callback.is_some();
        invoke(callback);
        skipped
    }

    /// 取走待处理的事件（不推进时间）
    pub fn drain_events(&self) -> Vec<SequenceEvent> {
        self.inner.borrow_mut().drain_events()
    }

    /// 拆除序列，参见 [`Sequence::teardown`]
    pub fn teardown(&self) -> bool {
        self.inner.borrow_mut().teardown()
    }

    pub fn state(&self) -> SequenceState {
        self.inner.borrow().state()
    }

    pub fn elapsed(&self) -> Duration {
        self.inner.borrow().elapsed()
    }

    /// 当前阶段名
    pub fn current_stage_name(&self) -> Option<String> {
        self.inner.borrow().current_stage().map(|s| s.name.clone())
    }

    /// 界面状态快照
    pub fn snapshot(&self) -> IntroState {
        self.inner.borrow().intro().clone()
    }

    /// 以只读方式访问序列
    pub fn with<R>(&self, f: impl FnOnce(&Sequence) -> R) -> R {
        f(&self.inner.borrow())
    }
}

fn invoke(callback: Option<OnComplete>) {
    if let Some(callback) = callback {
        callback();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Stage;
    use std::cell::Cell;

    fn timeline() -> Timeline {
        Timeline::builder("handle")
            .stage(Stage::at_ms("a", 0))
            .stage(Stage::at_ms("b", 1000))
            .build()
            .unwrap()
    }

    #[test]
    fn test_callback_can_query_handle() {
        let slot: Rc<RefCell<Option<SequenceHandle>>> = Rc::new(RefCell::new(None));
        let seen = Rc::new(Cell::new(None));

        let slot_cb = slot.clone();
        let seen_cb = seen.clone();
        let handle = SequenceHandle::new(timeline(), move || {
            if let Some(handle) = slot_cb.borrow().as_ref() {
                seen_cb.set(Some(handle.state()));
                // 回调内再次跳过不会重入
                assert!(!handle.skip());
            }
        });
        *slot.borrow_mut() = Some(handle.clone());

        handle.start();
        handle.tick(Duration::from_millis(1000));
        assert_eq!(seen.get(), Some(SequenceState::Completed));
    }

    #[test]
    fn test_clones_share_state() {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let handle = SequenceHandle::new(timeline(), move || c.set(c.get() + 1));
        let skip_control = handle.clone();

        handle.start();
        assert!(skip_control.skip());
        assert!(!handle.skip());
        assert_eq!(handle.state(), SequenceState::Skipped);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_snapshot_and_current_stage() {
        let handle = SequenceHandle::new(timeline(), || {});
        assert_eq!(handle.current_stage_name(), None);
        handle.start();
        assert_eq!(handle.current_stage_name().as_deref(), Some("a"));
        assert!(handle.snapshot().log().is_empty());
        assert_eq!(handle.with(|s| s.timeline().len()), 2);
    }
}
