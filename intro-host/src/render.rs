//! # Render 模块
//!
//! 文本渲染器：把序列事件和界面状态输出为终端文本。
//!
//! 画面按阶段名决定样式，见 [`stage_marker`]。

use std::io::{self, Write};
use std::time::Duration;

use intro_runtime::{IntroState, SequenceEvent, SiteContext, ThemeMode};

/// 一帧的渲染输入
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub elapsed: Duration,
    /// 当前阶段名
    pub stage: Option<&'a str>,
    pub state: &'a IntroState,
    pub context: &'a SiteContext,
}

/// 帧渲染器
pub trait FrameRenderer {
    /// 处理序列事件
    fn on_event(&mut self, elapsed: Duration, event: &SequenceEvent) -> io::Result<()>;

    /// 绘制一帧
    fn draw(&mut self, frame: &Frame<'_>) -> io::Result<()>;

    /// 开场动画结束、正文出现
    fn show_content(&mut self, context: &SiteContext) -> io::Result<()>;
}

/// 阶段名 → 标记
const STAGE_MARKERS: &[(&str, char)] = &[
    ("scan", '~'),
    ("analysis", '~'),
    ("reconstruct", '~'),
    ("integrity", '~'),
    ("attack", '!'),
    ("detect", '!'),
    ("critical", '!'),
    ("chaos", '!'),
    ("glitch", '!'),
    ("secure", '+'),
    ("verified", '+'),
    ("access", '+'),
    ("authenticated", '+'),
    ("stable", '+'),
    ("welcome", '+'),
    ("reveal", '*'),
    ("complete", '*'),
];

/// 阶段的显示标记
pub fn stage_marker(name: &str) -> char {
    STAGE_MARKERS
        .iter()
        .find(|(key, _)| name.starts_with(key))
        .map(|(_, marker)| *marker)
        .unwrap_or('>')
}

/// 进度条，`fraction` 超出 0..=1 时截断
pub fn bar(fraction: f32, width: usize) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * width as f32).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

fn seconds(elapsed: Duration) -> String {
    format!("{:>7.3}s", elapsed.as_secs_f64())
}

/// 文本渲染器
pub struct TextRenderer<W: Write> {
    out: W,
    bar_width: usize,
    show_frames: bool,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W, bar_width: usize, show_frames: bool) -> Self {
        Self {
            out,
            bar_width,
            show_frames,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FrameRenderer for TextRenderer<W> {
    fn on_event(&mut self, elapsed: Duration, event: &SequenceEvent) -> io::Result<()> {
        match event {
            SequenceEvent::Started => writeln!(self.out, "[{}] 开始", seconds(elapsed)),
            SequenceEvent::StageEntered { name, at_ms, .. } => {
                let at = Duration::from_millis(*at_ms);
                writeln!(self.out, "[{}] {} {}", seconds(at), stage_marker(name), name)
            }
            SequenceEvent::Completed => writeln!(self.out, "[{}] 完成", seconds(elapsed)),
            SequenceEvent::Skipped => writeln!(self.out, "[{}] 已跳过", seconds(elapsed)),
            SequenceEvent::TornDown => writeln!(self.out, "[{}] 已拆除", seconds(elapsed)),
        }
    }

    fn draw(&mut self, frame: &Frame<'_>) -> io::Result<()> {
        if !self.show_frames {
            return Ok(());
        }

        let state = frame.state;
        writeln!(
            self.out,
            "── {} {} ──",
            seconds(frame.elapsed),
            frame.stage.unwrap_or("-")
        )?;
        if !state.status().is_empty() {
            writeln!(self.out, "  {}", state.status())?;
        }
        for (key, value) in state.values() {
            let fraction = state.fraction(key).unwrap_or(0.0);
            writeln!(self.out, "  {:<10} {} {:>6.1}", key, bar(fraction, self.bar_width), value)?;
        }
        for (key, text) in state.texts() {
            writeln!(self.out, "  {:<10} {}_", key, text)?;
        }
        let flags: Vec<&str> = state.flags().collect();
        if !flags.is_empty() {
            writeln!(self.out, "  flags: {}", flags.join(", "))?;
        }
        for line in state.log().iter() {
            writeln!(self.out, "  | {}", line)?;
        }
        Ok(())
    }

    fn show_content(&mut self, context: &SiteContext) -> io::Result<()> {
        let theme = match context.theme {
            ThemeMode::Dark => "dark",
            ThemeMode::Light => "light",
        };
        writeln!(self.out, "== 正文 (theme: {}) ==", theme)?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intro_runtime::{Sequence, Stage, StageEffect, Timeline};

    fn output(renderer: TextRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn test_stage_marker() {
        assert_eq!(stage_marker("scan"), '~');
        assert_eq!(stage_marker("attack"), '!');
        assert_eq!(stage_marker("access"), '+');
        assert_eq!(stage_marker("complete"), '*');
        assert_eq!(stage_marker("boot"), '>');
    }

    #[test]
    fn test_bar() {
        assert_eq!(bar(0.0, 4), "[....]");
        assert_eq!(bar(0.5, 4), "[##..]");
        assert_eq!(bar(1.0, 4), "[####]");
        assert_eq!(bar(2.5, 4), "[####]");
        assert_eq!(bar(-3.0, 4), "[....]");
    }

    #[test]
    fn test_ramp_bar_never_shrinks() {
        let timeline = Timeline::builder("bar")
            .stage(Stage::at_ms("scan", 0).with(StageEffect::ramp(
                "scan",
                0.0,
                100.0,
                Duration::from_millis(1000),
            )))
            .stage(Stage::at_ms("done", 2000))
            .build()
            .unwrap();
        let mut sequence = Sequence::new(timeline, || {});
        sequence.start();

        let mut last = 0;
        for _ in 0..100 {
            sequence.tick(Duration::from_millis(10));
            let fraction = sequence.intro().fraction("scan").unwrap();
            let filled = bar(fraction, 20).matches('#').count();
            assert!(filled >= last, "{} < {}", filled, last);
            last = filled;
        }
        assert_eq!(last, 20);
    }

    #[test]
    fn test_events() {
        let mut renderer = TextRenderer::new(Vec::new(), 10, false);
        renderer.on_event(Duration::ZERO, &SequenceEvent::Started).unwrap();
        renderer
            .on_event(
                Duration::from_millis(1500),
                &SequenceEvent::StageEntered {
                    index: 1,
                    name: "scan".to_string(),
                    at_ms: 1500,
                },
            )
            .unwrap();
        renderer
            .on_event(Duration::from_secs(3), &SequenceEvent::Skipped)
            .unwrap();

        insta::assert_snapshot!(output(renderer), @r"
        [  0.000s] 开始
        [  1.500s] ~ scan
        [  3.000s] 已跳过
        ");
    }

    #[test]
    fn test_frames_hidden_unless_enabled() {
        let state = IntroState::new(3);
        let context = SiteContext::default();
        let frame = Frame {
            elapsed: Duration::ZERO,
            stage: None,
            state: &state,
            context: &context,
        };

        let mut renderer = TextRenderer::new(Vec::new(), 10, false);
        renderer.draw(&frame).unwrap();
        assert!(output(renderer).is_empty());

        let mut renderer = TextRenderer::new(Vec::new(), 10, true);
        renderer.draw(&frame).unwrap();
        assert_eq!(output(renderer), "──   0.000s - ──\n");
    }

    #[test]
    fn test_show_content() {
        let mut renderer = TextRenderer::new(Vec::new(), 10, false);
        renderer
            .show_content(&SiteContext::new(ThemeMode::Light))
            .unwrap();
        assert_eq!(output(renderer), "== 正文 (theme: light) ==\n");
    }
}
