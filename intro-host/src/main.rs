//! # intro
//!
//! 开场动画命令行宿主。
//!
//! ## 用法
//!
//! ```bash
//! intro run                          # 按 config.json 播放
//! intro run --loader soc --fps 30
//! intro run --timeline assets/timelines/scenario.json --skip-after 1.5
//! intro simulate --loader zero-day --step-ms 100
//! intro list
//! intro check assets/timelines/soc.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use intro_host::{
    HostConfig, RunReport, TimelineSource, check_timeline_file, ensure_no_errors, list_loaders,
    run_realtime, run_simulated,
};
use intro_runtime::LoaderKind;

#[derive(Parser)]
#[command(name = "intro")]
#[command(about = "站点开场动画 - 无界面宿主")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件（默认：config.json）
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// 覆盖日志级别
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 实时播放（回车跳过）
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// 帧率
        #[arg(long)]
        fps: Option<u32>,

        /// 播放指定秒数后自动跳过
        #[arg(long)]
        skip_after: Option<f64>,

        /// 逐帧输出界面状态
        #[arg(long)]
        frames: bool,
    },

    /// 用模拟时钟播放（不休眠）
    Simulate {
        #[command(flatten)]
        source: SourceArgs,

        /// 模拟步长（毫秒）
        #[arg(long, default_value = "16")]
        step_ms: u64,

        /// 模拟指定秒数后跳过
        #[arg(long)]
        skip_after: Option<f64>,

        /// 逐帧输出界面状态
        #[arg(long)]
        frames: bool,
    },

    /// 列出内置开场动画
    List,

    /// 检查时间线文件
    Check {
        /// 时间线 JSON 文件
        path: PathBuf,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// 内置开场动画
    #[arg(long, conflicts_with = "timeline")]
    loader: Option<LoaderKind>,

    /// 时间线 JSON 文件
    #[arg(long)]
    timeline: Option<PathBuf>,
}

impl SourceArgs {
    fn apply(&self, config: &mut HostConfig) {
        if let Some(kind) = self.loader {
            config.loader = kind;
            config.timeline_path = None;
        }
        if let Some(path) = &self.timeline {
            config.timeline_path = Some(path.clone());
        }
    }
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("❌ {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let read = HostConfig::read(&cli.config);
    let mut config = read
        .as_ref()
        .ok()
        .and_then(Option::as_ref)
        .cloned()
        .unwrap_or_default();
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    let _ = tracing_subscriber::fmt()
        .with_max_level(config.tracing_level())
        .with_writer(std::io::stderr)
        .try_init();
    HostConfig::report(&cli.config, &read);

    match cli.command {
        Commands::Run {
            source,
            fps,
            skip_after,
            frames,
        } => {
            source.apply(&mut config);
            if let Some(fps) = fps {
                config.fps = fps;
            }
            config.render.show_frames |= frames;
            config.validate()?;

            let report = run_realtime(
                &config,
                &TimelineSource::from_config(&config),
                skip_after.map(seconds).transpose()?,
                std::io::stdout(),
            )?;
            print_report(&report);
        }
        Commands::Simulate {
            source,
            step_ms,
            skip_after,
            frames,
        } => {
            source.apply(&mut config);
            config.render.show_frames |= frames;
            config.validate()?;

            let report = run_simulated(
                &config,
                &TimelineSource::from_config(&config),
                Duration::from_millis(step_ms),
                skip_after.map(seconds).transpose()?,
                std::io::stdout(),
            )?;
            print_report(&report);
        }
        Commands::List => {
            list_loaders(&mut std::io::stdout())?;
        }
        Commands::Check { path } => {
            let result = check_timeline_file(&path)
                .with_context(|| format!("检查失败: {}", path.display()))?;
            for diag in &result.diagnostics {
                eprintln!("{}", diag);
            }
            if result.has_errors() {
                eprintln!(
                    "❌ {} 个错误, {} 个警告",
                    result.error_count(),
                    result.warn_count()
                );
            }
            ensure_no_errors(&result)?;
            if result.warn_count() > 0 {
                eprintln!("⚠️  0 个错误, {} 个警告", result.warn_count());
            } else {
                eprintln!("✅ 检查通过，无错误");
            }
        }
    }

    Ok(())
}

fn seconds(value: f64) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("无效的秒数: {value}"))
}

fn print_report(report: &RunReport) {
    eprintln!(
        "─────────────────────────────────────────────────────\n\
         结果: {}  时长: {:.3}s  帧数: {}  阶段: {}",
        report.outcome,
        report.elapsed.as_secs_f64(),
        report.frames,
        report.stages.join(" → ")
    );
}
