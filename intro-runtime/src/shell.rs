//! # Shell 模块
//!
//! 站点外壳：先播放一个开场动画，完成（或跳过）后切换到正文。
//!
//! 主题和滚动状态放在显式传递的 [`SiteContext`] 里，生命周期跟随外壳。

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sequencer::SequenceHandle;
use crate::state::SequenceEvent;
use crate::timeline::Timeline;

/// 导航栏视为"已滚动"的阈值（像素）
pub const SCROLL_THRESHOLD: f32 = 50.0;

/// 主题
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

/// 滚动状态
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollState {
    offset: f32,
}

impl ScrollState {
    /// 更新滚动位置
    ///
    /// # 返回
    /// `is_scrolled` 是否发生了变化
    pub fn update(&mut self, y: f32) -> bool {
        let before = self.is_scrolled();
        self.offset = y.max(0.0);
        before != self.is_scrolled()
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn is_scrolled(&self) -> bool {
        self.offset > SCROLL_THRESHOLD
    }
}

/// 站点上下文
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteContext {
    pub theme: ThemeMode,
    pub scroll: ScrollState,
}

impl SiteContext {
    pub fn new(theme: ThemeMode) -> Self {
        Self {
            theme,
            scroll: ScrollState::default(),
        }
    }

    /// 切换主题，返回新主题
    pub fn toggle_theme(&mut self) -> ThemeMode {
        self.theme = self.theme.toggled();
        self.theme
    }
}

/// 外壳阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitePhase {
    /// 正在播放开场动画
    Intro,
    /// 正文已渲染
    Content,
    /// 已卸载
    Unmounted,
}

/// 站点外壳
#[derive(Debug)]
pub struct SiteShell {
    context: SiteContext,
    loader: SequenceHandle,
    loader_done: Rc<Cell<bool>>,
    phase: SitePhase,
}

impl SiteShell {
    /// 挂载外壳并开始开场动画
    pub fn mount(timeline: Timeline, context: SiteContext) -> Self {
        let loader_done = Rc::new(Cell::new(false));
        let done = loader_done.clone();
        let loader = SequenceHandle::new(timeline, move || done.set(true));

        let mut shell = Self {
            context,
            loader,
            loader_done,
            phase: SitePhase::Intro,
        };
        shell.loader.start();
        shell.sync_phase();
        shell
    }

    /// 推进开场动画
    pub fn tick(&mut self, dt: Duration) -> Vec<SequenceEvent> {
        if self.phase != SitePhase::Intro {
            return Vec::new();
        }
        let events = self.loader.tick(dt);
        self.sync_phase();
        events
    }

    /// 跳过开场动画
    ///
    /// # 返回
    /// 跳过产生的事件（正文阶段为空）
    pub fn skip(&mut self) -> Vec<SequenceEvent> {
        if self.phase != SitePhase::Intro {
            return Vec::new();
        }
        self.loader.skip();
        self.sync_phase();
        self.loader.drain_events()
    }

    /// 卸载外壳，未完成的开场动画被拆除
    pub fn unmount(&mut self) -> Vec<SequenceEvent> {
        if self.phase == SitePhase::Unmounted {
            return Vec::new();
        }
        self.loader.teardown();
        self.phase = SitePhase::Unmounted;
        self.loader.drain_events()
    }

    fn sync_phase(&mut self) {
        if self.phase == SitePhase::Intro && self.loader_done.get() {
            self.phase = SitePhase::Content;
        }
    }

    pub fn phase(&self) -> SitePhase {
        self.phase
    }

    pub fn loader(&self) -> &SequenceHandle {
        &self.loader
    }

    pub fn context(&self) -> &SiteContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut SiteContext {
        &mut self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{Stage, StageEffect};
    use crate::state::SequenceState;

    fn loader() -> Timeline {
        Timeline::builder("loader")
            .stage(Stage::at_ms("boot", 0).with(StageEffect::status("BOOT")))
            .stage(Stage::at_ms("done", 2000))
            .build()
            .unwrap()
    }

    #[test]
    fn test_content_after_loader() {
        let mut shell = SiteShell::mount(loader(), SiteContext::default());
        assert_eq!(shell.phase(), SitePhase::Intro);

        shell.tick(Duration::from_millis(1999));
        assert_eq!(shell.phase(), SitePhase::Intro);

        // 开场动画期间上下文照常可用
        assert_eq!(shell.context_mut().toggle_theme(), ThemeMode::Light);
        assert!(shell.context_mut().scroll.update(120.0));
        assert!(shell.context().scroll.is_scrolled());

        shell.tick(Duration::from_millis(1));
        assert_eq!(shell.phase(), SitePhase::Content);

        // 进入正文后不再驱动开场动画
        assert!(shell.tick(Duration::from_secs(10)).is_empty());
    }

    #[test]
    fn test_skip_shows_content() {
        let mut shell = SiteShell::mount(loader(), SiteContext::default());
        let events = shell.skip();
        assert_eq!(events.last(), Some(&SequenceEvent::Skipped));
        assert!(shell.skip().is_empty());
        assert_eq!(shell.phase(), SitePhase::Content);
        assert_eq!(shell.loader().state(), SequenceState::Skipped);
    }

    #[test]
    fn test_unmount_tears_down_loader() {
        let mut shell = SiteShell::mount(loader(), SiteContext::default());
        shell.tick(Duration::from_millis(500));
        assert_eq!(shell.unmount(), [SequenceEvent::TornDown]);
        assert!(shell.unmount().is_empty());

        assert_eq!(shell.phase(), SitePhase::Unmounted);
        assert_eq!(shell.loader().state(), SequenceState::TornDown);
        assert!(shell.tick(Duration::from_secs(10)).is_empty());
    }

    #[test]
    fn test_single_stage_loader_finishes_on_mount() {
        let timeline = Timeline::builder("instant")
            .stage(Stage::at_ms("only", 0))
            .build()
            .unwrap();
        let shell = SiteShell::mount(timeline, SiteContext::default());
        assert_eq!(shell.phase(), SitePhase::Content);
    }

    #[test]
    fn test_theme_toggle() {
        let mut context = SiteContext::new(ThemeMode::Dark);
        assert_eq!(context.toggle_theme(), ThemeMode::Light);
        assert_eq!(context.toggle_theme(), ThemeMode::Dark);
    }

    #[test]
    fn test_scroll_threshold() {
        let mut scroll = ScrollState::default();
        assert!(!scroll.update(50.0));
        assert!(!scroll.is_scrolled());
        assert!(scroll.update(50.5));
        assert!(scroll.is_scrolled());
        assert!(!scroll.update(400.0));
        assert!(scroll.update(-10.0));
        assert_eq!(scroll.offset(), 0.0);
    }
}
