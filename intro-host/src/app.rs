//! # App 模块
//!
//! 命令实现：加载时间线、检查、列出和运行开场动画。

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use intro_runtime::{
    DiagnosticResult, LoaderKind, OffsetPolicy, SiteContext, SiteShell, Timeline, analyze_timeline,
    catalog,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::HostConfig;
use crate::driver::{RealtimeDriver, RunReport, SimulatedDriver, spawn_stdin_skip};
use crate::error::{HostError, HostResult};
use crate::render::TextRenderer;

/// 时间线来源
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineSource {
    /// 内置开场动画
    Loader(LoaderKind),
    /// 时间线 JSON 文件
    File(PathBuf),
}

impl TimelineSource {
    /// 由配置决定来源：`timeline_path` 优先于 `loader`
    pub fn from_config(config: &HostConfig) -> Self {
        match &config.timeline_path {
            Some(path) => Self::File(path.clone()),
            None => Self::Loader(config.loader),
        }
    }

    /// 加载时间线
    ///
    /// 构建时产生的警告通过日志输出。
    pub fn load(&self) -> HostResult<Timeline> {
        let timeline = match self {
            Self::Loader(kind) => catalog::timeline(*kind)?,
            Self::File(path) => load_timeline_file(path, OffsetPolicy::default())?,
        };

        for diagnostic in timeline.diagnostics() {
            warn!(timeline = %timeline.id(), "{}", diagnostic);
        }
        info!(
            timeline = %timeline.id(),
            stages = timeline.len(),
            completion_ms = timeline.completion_offset().as_millis() as u64,
            "时间线加载成功"
        );
        Ok(timeline)
    }
}

/// 读取并解析时间线文件
pub fn load_timeline_file(path: &Path, policy: OffsetPolicy) -> HostResult<Timeline> {
    let text = fs::read_to_string(path).map_err(|source| HostError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Timeline::from_json_with_policy(&text, policy)?)
}

/// 检查时间线文件
///
/// 按 `Clamp` 策略加载，使递减的偏移也能作为诊断报告出来。
/// 文件无法读取或解析时返回错误；诊断结果由 [`ensure_no_errors`] 判定。
pub fn check_timeline_file(path: &Path) -> HostResult<DiagnosticResult> {
    let timeline = load_timeline_file(path, OffsetPolicy::Clamp)?;
    Ok(analyze_timeline(&timeline))
}

/// 诊断结果包含错误时返回 [`HostError::Diagnostics`]
pub fn ensure_no_errors(result: &DiagnosticResult) -> HostResult<()> {
    if result.has_errors() {
        return Err(HostError::Diagnostics {
            errors: result.error_count(),
        });
    }
    Ok(())
}

/// 内置开场动画一览
pub fn list_loaders(out: &mut impl Write) -> HostResult<()> {
    for kind in LoaderKind::ALL {
        let timeline = catalog::timeline(kind)?;
        writeln!(
            out,
            "{:<18} {:>2} stages  {:>6.2}s",
            kind.name(),
            timeline.len(),
            timeline.completion_offset().as_secs_f64()
        )?;
    }
    Ok(())
}

fn mount(config: &HostConfig, source: &TimelineSource) -> HostResult<SiteShell> {
    let timeline = source.load()?;
    Ok(SiteShell::mount(timeline, SiteContext::new(config.render.theme)))
}

/// 以模拟时钟运行
pub fn run_simulated(
    config: &HostConfig,
    source: &TimelineSource,
    step: Duration,
    skip_after: Option<Duration>,
    out: impl Write,
) -> HostResult<RunReport> {
    let mut shell = mount(config, source)?;
    let mut renderer = TextRenderer::new(out, config.render.bar_width, config.render.show_frames);
    SimulatedDriver::new(step).run(&mut shell, &mut renderer, skip_after)
}

/// 以实时时钟运行，标准输入作为跳过控件
pub fn run_realtime(
    config: &HostConfig,
    source: &TimelineSource,
    skip_after: Option<Duration>,
    out: impl Write,
) -> HostResult<RunReport> {
    let mut shell = mount(config, source)?;
    let mut renderer = TextRenderer::new(out, config.render.bar_width, config.render.show_frames);
    let driver = RealtimeDriver::new(config.fps);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    info!(fps = config.fps, skip_key = %config.skip_key, "开始播放（回车或跳过键跳过）");
    let report = runtime.block_on(async {
        let (tx, rx) = mpsc::channel(8);
        let stdin = spawn_stdin_skip(config, tx);
        let report = driver.run(&mut shell, &mut renderer, rx, skip_after).await;
        stdin.abort();
        report
    });
    // 标准输入读取可能仍阻塞在后台线程
    runtime.shutdown_background();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use intro_runtime::{SequenceState, SitePhase};

    const TIMELINE: &str = r#"{
        "id": "file",
        "stages": [
            { "name": "boot", "at": 0, "effects": [ { "status": "BOOT" } ] },
            { "name": "done", "at": 0.5 }
        ]
    }"#;

    #[test]
    fn test_source_from_config() {
        let config = HostConfig::default();
        assert_eq!(
            TimelineSource::from_config(&config),
            TimelineSource::Loader(LoaderKind::TimeRewind)
        );

        let config = HostConfig {
            timeline_path: Some(PathBuf::from("a.json")),
            ..HostConfig::default()
        };
        assert_eq!(
            TimelineSource::from_config(&config),
            TimelineSource::File(PathBuf::from("a.json"))
        );
    }

    #[test]
    fn test_load_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.json");
        fs::write(&path, TIMELINE).unwrap();

        let timeline = TimelineSource::File(path).load().unwrap();
        assert_eq!(timeline.id(), "file");
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let err = TimelineSource::File(PathBuf::from("missing/none.json"))
            .load()
            .unwrap_err();
        assert!(matches!(err, HostError::ReadFile { .. }));
    }

    #[test]
    fn test_check_reports_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("early.json");
        fs::write(
            &path,
            r#"{ "id": "early", "stages": [
                { "name": "a", "at": 1, "terminal": true },
                { "name": "b", "at": 2 }
            ] }"#,
        )
        .unwrap();

        let result = check_timeline_file(&path).unwrap();
        assert_eq!(result.warn_count(), 1);
        assert!(ensure_no_errors(&result).is_ok());
    }

    #[test]
    fn test_check_decreasing_offsets_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.json");
        fs::write(
            &path,
            r#"{ "id": "late", "stages": [
                { "name": "b", "at": 2 },
                { "name": "a", "at": 1 }
            ] }"#,
        )
        .unwrap();

        let result = check_timeline_file(&path).unwrap();
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.diagnostics[0].stage.as_deref(), Some("a"));

        let err = ensure_no_errors(&result).unwrap_err();
        assert!(matches!(err, HostError::Diagnostics { errors: 1 }));
    }

    #[test]
    fn test_list_loaders() {
        let mut out = Vec::new();
        list_loaders(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), LoaderKind::ALL.len());
        assert!(text.lines().next().unwrap().starts_with("time-rewind"));
    }

    #[test]
    fn test_run_simulated_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.json");
        fs::write(&path, TIMELINE).unwrap();

        let mut out = Vec::new();
        let report = run_simulated(
            &HostConfig::default(),
            &TimelineSource::File(path),
            Duration::from_millis(100),
            None,
            &mut out,
        )
        .unwrap();

        assert_eq!(report.outcome, SequenceState::Completed);
        assert_eq!(report.phase, SitePhase::Content);
        assert!(String::from_utf8(out).unwrap().ends_with("== 正文 (theme: dark) ==\n"));
    }
}
