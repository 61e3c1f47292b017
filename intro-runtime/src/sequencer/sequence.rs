//! # Sequence 模块
//!
//! 一次性、只向前的阶段序列。
//!
//! ## 执行模型
//!
//! ```text
//! tick(dt) -> Vec<SequenceEvent>
//! ```
//!
//! 1. 累加已过时间
//! 2. 依次激活偏移已被越过的阶段：先把渐变/周期日志推进到该阶段的计划时间，再应用效果
//! 3. 到达终止阶段时进入 `Completed` 并调用完成回调
//! 4. 否则把渐变/周期日志推进到当前时间

use std::time::Duration;

use crate::ramp::{ProgressRamp, Typewriter};
use crate::stage::{Stage, StageEffect};
use crate::state::{IntroState, SequenceEvent, SequenceState};
use crate::ticker::Ticker;
use crate::timeline::Timeline;

/// 完成回调
pub type OnComplete = Box<dyn FnOnce()>;

/// 阶段序列
///
/// 完成回调在整个生命周期内**至多调用一次**：
/// 自然完成或 `skip()` 时调用，`teardown()` 时直接丢弃。
pub struct Sequence {
    timeline: Timeline,
    state: SequenceState,
    elapsed: Duration,
    /// 下一个待激活的阶段
    next_stage: usize,
    /// 当前激活的阶段
    current_stage: Option<usize>,
    intro: IntroState,
    ramps: Vec<ProgressRamp>,
    typewriters: Vec<Typewriter>,
    tickers: Vec<Ticker>,
    on_complete: Option<OnComplete>,
    events: Vec<SequenceEvent>,
}

impl std::fmt::Debug for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequence")
            .field("timeline", &self.timeline.id())
            .field("state", &self.state)
            .field("elapsed", &self.elapsed)
            .field("current_stage", &self.current_stage)
            .finish()
    }
}

impl Sequence {
    /// 创建处于 `Idle` 状态的序列
    pub fn new(timeline: Timeline, on_complete: impl FnOnce() + 'static) -> Self {
        let intro = IntroState::new(timeline.log_capacity());
        Self {
            timeline,
            state: SequenceState::Idle,
            elapsed: Duration::ZERO,
            next_stage: 0,
            current_stage: None,
            intro,
            ramps: Vec::new(),
            typewriters: Vec::new(),
            tickers: Vec::new(),
            on_complete: Some(Box::new(on_complete)),
            events: Vec::new(),
        }
    }

    // ========== 生命周期 ==========

    /// 开始序列
    ///
    /// 偏移为 0 的阶段立即激活。只有 `Idle` 状态下有效。
    ///
    /// # 返回
    /// - `true`: 本次调用使序列开始
    /// - `false`: 序列已经开始或已结束
    pub fn start(&mut self) -> bool {
        let (started, callback) = self.start_deferred();
        run(callback);
        started
    }

    /// 推进时间
    ///
    /// # 返回
    /// 本次（以及之前未取走的）事件
    pub fn tick(&mut self, dt: Duration) -> Vec<SequenceEvent> {
        let callback = self.advance_deferred(dt);
        run(callback);
        self.drain_events()
    }

    /// 跳过序列
    ///
    /// 任何状态下都可以调用：`Idle`/`Running` 时立即进入 `Skipped` 并调用完成回调，
    /// 其余状态下无任何效果。
    pub fn skip(&mut self) -> bool {
        let callback = self.skip_deferred();
        let skipped = callback.is_some();
        run(callback);
        skipped
    }

    /// 拆除序列
    ///
    /// 取消所有待激活的阶段，丢弃完成回调而不调用。
    /// 任何状态下都可以调用，终态下无任何效果。
    pub fn teardown(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = SequenceState::TornDown;
        self.on_complete = None;
        self.clear_motion();
        self.events.push(SequenceEvent::TornDown);
        true
    }

    // ========== 延迟回调版本（供 SequenceHandle 在释放借用后调用回调） ==========

    pub(crate) fn start_deferred(&mut self) -> (bool, Option<OnComplete>) {
        if self.state != SequenceState::Idle {
            return (false, None);
        }
        self.state = SequenceState::Running;
        self.events.push(SequenceEvent::Started);
        (true, self.advance_deferred(Duration::ZERO))
    }

    pub(crate) fn advance_deferred(&mut self, dt: Duration) -> Option<OnComplete> {
        if self.state != SequenceState::Running {
            return None;
        }

        self.elapsed = self.elapsed.saturating_add(dt);

        while let Some(offset) = self.timeline.stages().get(self.next_stage).map(|s| s.offset) {
            if offset > self.elapsed {
                break;
            }

            let index = self.next_stage;
            self.next_stage += 1;

            self.sample_motion(offset);
            self.enter_stage(index);
            self.sample_motion(offset);

            if index == self.timeline.terminal_index() {
                self.state = SequenceState::Completed;
                self.clear_motion();
                self.events.push(SequenceEvent::Completed);
                return self.on_complete.take();
            }
        }

        self.sample_motion(self.elapsed);
        None
    }

    pub(crate) fn skip_deferred(&mut self) -> Option<OnComplete> {
        if self.state.is_terminal() {
            return None;
        }
        self.state = SequenceState::Skipped;
        self.clear_motion();
        self.events.push(SequenceEvent::Skipped);
        self.on_complete.take()
    }

    /// 取走待处理的事件
    pub fn drain_events(&mut self) -> Vec<SequenceEvent> {
        std::mem::take(&mut self.events)
    }

    // ========== 内部 ==========

    fn enter_stage(&mut self, index: usize) {
        let stage = &self.timeline.stages()[index];
        let offset = stage.offset;

        for effect in &stage.effects {
            apply_effect(
                effect,
                offset,
                &mut self.intro,
                &mut self.ramps,
                &mut self.typewriters,
                &mut self.tickers,
            );
        }

        self.current_stage = Some(index);
        self.events.push(SequenceEvent::StageEntered {
            index,
            name: stage.name.clone(),
            at_ms: offset.as_millis() as u64,
        });
    }

    /// 把渐变、打字和周期日志推进到序列时间 `at`
    fn sample_motion(&mut self, at: Duration) {
        for ramp in &mut self.ramps {
            let value = ramp.sample(at);
            self.intro.values.insert(ramp.key.clone(), value);
        }
        self.ramps.retain(|r| !r.is_finished());

        for tw in &mut self.typewriters {
            let text = tw.sample(at).to_string();
            self.intro.texts.insert(tw.key.clone(), text);
        }
        self.typewriters.retain(|t| !t.is_finished());

        let capacity = self.intro.log.capacity();
        for ticker in &mut self.tickers {
            for line in ticker.due(at, capacity) {
                self.intro.log.push(line);
            }
        }
    }

    fn clear_motion(&mut self) {
        self.ramps.clear();
        self.typewriters.clear();
        self.tickers.clear();
    }

    // ========== 查询 ==========

    pub fn state(&self) -> SequenceState {
        self.state
    }

    /// 是否被跳过
    pub fn skipped(&self) -> bool {
        self.state == SequenceState::Skipped
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// 当前激活的阶段
    pub fn current_stage(&self) -> Option<&Stage> {
        self.current_stage.map(|i| &self.timeline.stages()[i])
    }

    /// 界面状态
    pub fn intro(&self) -> &IntroState {
        &self.intro
    }

    /// 整体进度（0.0 - 1.0），以终止阶段偏移为总长
    pub fn progress(&self) -> f32 {
        let total = self.timeline.completion_offset();
        match self.state {
            SequenceState::Completed => 1.0,
            _ if total.is_zero() => 0.0,
            _ => (self.elapsed.as_secs_f32() / total.as_secs_f32()).min(1.0),
        }
    }
}

fn apply_effect(
    effect: &StageEffect,
    offset: Duration,
    intro: &mut IntroState,
    ramps: &mut Vec<ProgressRamp>,
    typewriters: &mut Vec<Typewriter>,
    tickers: &mut Vec<Ticker>,
) {
    match effect {
        StageEffect::Status(text) => intro.status = text.clone(),
        StageEffect::Log(line) => intro.log.push(line.clone()),
        StageEffect::Flag { key, on } => intro.set_flag(key, *on),
        StageEffect::Value { key, value } => {
            ramps.retain(|r| &r.key != key);
            intro.values.insert(key.clone(), *value);
        }
        StageEffect::Ramp {
            key,
            from,
            to,
            duration,
            easing,
        } => {
            // 同一键上的旧渐变被取代
            ramps.retain(|r| &r.key != key);
            intro.values.insert(key.clone(), *from);
            intro.widen_range(key, *from, *to);
            ramps.push(ProgressRamp::new(key.clone(), *from, *to, offset, *duration).with_easing(*easing));
        }
        StageEffect::Type {
            key,
            text,
            duration,
        } => {
            typewriters.retain(|t| &t.key != key);
            intro.texts.insert(key.clone(), String::new());
            typewriters.push(Typewriter::new(key.clone(), text.clone(), offset, *duration));
        }
        StageEffect::Ticker { key, every, lines } => {
            tickers.retain(|t| &t.key != key);
            tickers.push(Ticker::new(key.clone(), lines.clone(), *every, offset));
        }
        StageEffect::StopTicker { key } => tickers.retain(|t| &t.key != key),
    }
}

fn run(callback: Option<OnComplete>) {
    if let Some(callback) = callback {
        callback();
    }
}
