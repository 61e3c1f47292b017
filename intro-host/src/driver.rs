//! # Driver 模块
//!
//! 驱动器负责产生时间：
//!
//! - [`SimulatedDriver`]：固定步长的模拟时钟，不休眠（测试、`simulate` 命令）
//! - [`RealtimeDriver`]：tokio current-thread runtime 上按帧率 tick，
//!   跳过请求经 mpsc 通道进入同一个逻辑线程
//!
//! 两者都只通过 [`SiteShell`] 推进序列，所有效果都在驱动循环里串行执行。

use std::time::Duration;

use intro_runtime::{SequenceEvent, SequenceState, SitePhase, SiteShell};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::HostConfig;
use crate::error::HostResult;
use crate::render::{Frame, FrameRenderer};

/// 一次运行的结果
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// 开场动画的最终状态
    pub outcome: SequenceState,
    /// 外壳的最终阶段
    pub phase: SitePhase,
    /// 序列时间
    pub elapsed: Duration,
    /// 驱动的帧数
    pub frames: u64,
    /// 激活过的阶段名（按顺序）
    pub stages: Vec<String>,
}

/// 驱动循环的公共部分
struct Session<'a> {
    shell: &'a mut SiteShell,
    renderer: &'a mut dyn FrameRenderer,
    elapsed: Duration,
    frames: u64,
    stages: Vec<String>,
}

impl<'a> Session<'a> {
    fn new(shell: &'a mut SiteShell, renderer: &'a mut dyn FrameRenderer) -> Self {
        Self {
            shell,
            renderer,
            elapsed: Duration::ZERO,
            frames: 0,
            stages: Vec::new(),
        }
    }

    fn is_running(&self) -> bool {
        self.shell.phase() == SitePhase::Intro
    }

    /// 推进一帧并渲染
    fn step(&mut self, dt: Duration) -> HostResult<()> {
        self.elapsed = self.elapsed.saturating_add(dt);
        self.frames += 1;
        let events = self.shell.tick(dt);
        self.handle_events(&events)?;

        let state = self.shell.loader().snapshot();
        let stage = self.shell.loader().current_stage_name();
        self.renderer.draw(&Frame {
            elapsed: self.elapsed,
            stage: stage.as_deref(),
            state: &state,
            context: self.shell.context(),
        })?;
        Ok(())
    }

    fn skip(&mut self) -> HostResult<()> {
        if self.is_running() {
            info!(elapsed_ms = self.elapsed.as_millis() as u64, "跳过开场动画");
        }
        let events = self.shell.skip();
        self.handle_events(&events)
    }

    fn handle_events(&mut self, events: &[SequenceEvent]) -> HostResult<()> {
        for event in events {
            if let SequenceEvent::StageEntered { name, at_ms, .. } = event {
                debug!(stage = %name, at_ms = *at_ms, "阶段激活");
                self.stages.push(name.clone());
            }
            self.renderer.on_event(self.elapsed, event)?;
        }
        Ok(())
    }

    fn finish(self) -> HostResult<RunReport> {
        if self.shell.phase() == SitePhase::Content {
            self.renderer.show_content(self.shell.context())?;
        }
        let report = RunReport {
            outcome: self.shell.loader().state(),
            phase: self.shell.phase(),
            elapsed: self.elapsed,
            frames: self.frames,
            stages: self.stages,
        };
        info!(
            outcome = %report.outcome,
            elapsed_ms = report.elapsed.as_millis() as u64,
            frames = report.frames,
            "开场动画结束"
        );
        Ok(report)
    }
}

/// 固定步长的模拟驱动器
#[derive(Debug, Clone)]
pub struct SimulatedDriver {
    step: Duration,
    limit: Duration,
}

impl SimulatedDriver {
    /// 默认最多模拟 10 分钟
    pub fn new(step: Duration) -> Self {
        Self {
            step: step.max(Duration::from_millis(1)),
            limit: Duration::from_secs(600),
        }
    }

    /// 设置模拟时长上限
    pub fn with_limit(mut self, limit: Duration) -> Self {
        self.limit = limit;
        self
    }

    /// 运行到开场动画结束
    ///
    /// # 参数
    /// - `skip_after`: 在该序列时间之后模拟一次跳过
    ///
    /// 超过时长上限时拆除外壳。
    pub fn run(
        &self,
        shell: &mut SiteShell,
        renderer: &mut dyn FrameRenderer,
        skip_after: Option<Duration>,
    ) -> HostResult<RunReport> {
        let mut session = Session::new(shell, renderer);
        session.step(Duration::ZERO)?;

        while session.is_running() {
            if skip_after.is_some_and(|at| session.elapsed >= at) {
                session.skip()?;
                break;
            }
            if session.elapsed >= self.limit {
                warn!(limit_ms = self.limit.as_millis() as u64, "模拟超时，拆除外壳");
                let events = session.shell.unmount();
                session.handle_events(&events)?;
                break;
            }
            session.step(self.step)?;
        }

        session.finish()
    }
}

/// 实时驱动器
#[derive(Debug, Clone)]
pub struct RealtimeDriver {
    period: Duration,
}

impl RealtimeDriver {
    pub fn new(fps: u32) -> Self {
        Self {
            period: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// 按帧率运行到开场动画结束
    ///
    /// `skip_rx` 每收到一条消息就请求一次跳过；通道关闭后不再监听。
    pub async fn run(
        &self,
        shell: &mut SiteShell,
        renderer: &mut dyn FrameRenderer,
        mut skip_rx: mpsc::Receiver<()>,
        skip_after: Option<Duration>,
    ) -> HostResult<RunReport> {
        let mut session = Session::new(shell, renderer);
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut last = Instant::now();
        let mut listening = true;

        while session.is_running() {
            tokio::select! {
                now = interval.tick() => {
                    let dt = now.saturating_duration_since(last);
                    last = now;
                    session.step(dt)?;
                    if skip_after.is_some_and(|at| session.elapsed >= at) {
                        session.skip()?;
                    }
                }
                msg = skip_rx.recv(), if listening => match msg {
                    Some(()) => session.skip()?,
                    None => {
                        debug!("跳过通道已关闭");
                        listening = false;
                    }
                },
            }
        }

        session.finish()
    }
}

/// 从标准输入读取跳过请求
///
/// 空行或配置的跳过键触发跳过；标准输入结束时任务退出，通道随之关闭。
pub fn spawn_stdin_skip(config: &HostConfig, tx: mpsc::Sender<()>) -> JoinHandle<()> {
    let config = config.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if config.is_skip_input(&line) => {
                    if tx.send(()).await.is_err() {
                        break;
                    }
                }
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "读取标准输入失败");
                    break;
                }
            }
        }
    })
}
