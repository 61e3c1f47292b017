//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-runtime`: 运行 intro-runtime 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `timeline-check`: 检查时间线文件（格式、偏移、诊断）
//! - `timeline-export`: 导出内置开场动画的时间线文件

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use intro_runtime::{DiagnosticResult, LoaderKind, OffsetPolicy, Timeline, analyze_timeline, catalog};
use walkdir::WalkDir;

const TIMELINES_DIR: &str = "assets/timelines";

fn run(step: &str, cmd: &mut Command) -> anyhow::Result<()> {
    eprintln!("\n==> {step}");
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{step} failed with {status}");
    }
    Ok(())
}

fn ensure_cargo_llvm_cov_available() -> anyhow::Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["llvm-cov", "--version"]);
    match cmd.status() {
        Ok(s) if s.success() => Ok(()),
        _ => anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        ),
    }
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "check-all" => {
            let mut fmt = Command::new("cargo");
            fmt.args(["fmt", "--all", "--", "--check"]);
            run("cargo fmt --all -- --check", &mut fmt)?;

            let mut clippy = Command::new("cargo");
            clippy.args(["clippy", "--workspace", "--all-targets"]);
            run("cargo clippy --workspace --all-targets", &mut clippy)?;

            let mut test = Command::new("cargo");
            test.args(["test", "--workspace"]);
            run("cargo test --workspace", &mut test)?;
        }
        "cov-runtime" => {
            ensure_cargo_llvm_cov_available()?;

            let mut cov = Command::new("cargo");
            cov.args(["llvm-cov", "-p", "intro-runtime", "--html"]);
            run("cargo llvm-cov -p intro-runtime --html", &mut cov)?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "cov-workspace" => {
            ensure_cargo_llvm_cov_available()?;

            // 排除 xtask，只看运行时与宿主
            let mut cov = Command::new("cargo");
            cov.args(["llvm-cov", "--workspace", "--exclude", "xtask", "--html"]);
            run(
                "cargo llvm-cov --workspace --exclude xtask --html",
                &mut cov,
            )?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "timeline-check" => {
            let path = args.next();
            timeline_check(path.as_deref())?;
        }
        "timeline-export" => {
            let dir = args.next().unwrap_or_else(|| TIMELINES_DIR.to_string());
            timeline_export(Path::new(&dir))?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all        运行 fmt、clippy、test 门禁检查
  cov-runtime      运行 intro-runtime 覆盖率报告
  cov-workspace    运行 workspace 覆盖率报告
  timeline-check   检查时间线文件
  timeline-export  导出内置开场动画

TIMELINE-CHECK:
  cargo xtask timeline-check [path]

  不带参数：检查 assets/timelines/ 下所有 .json 文件
  带路径参数：检查指定文件或目录

  检查内容：
    - JSON 格式与效果参数
    - 偏移是否单调（按 Clamp 策略加载，回退记为警告）
    - 完成前无法走完的效果、未启动的周期日志、重复阶段名

TIMELINE-EXPORT:
  cargo xtask timeline-export [dir]

  把全部内置开场动画写成 <dir>/<name>.json（默认 assets/timelines/）
"#
    );
}

//=============================================================================
// timeline-check 命令实现
//=============================================================================

/// 时间线检查结果
#[derive(Default)]
struct TimelineCheckResult {
    /// 检查的文件数量
    files_checked: usize,
    /// 加载失败数量
    load_errors: usize,
    /// 诊断结果
    diagnostics: DiagnosticResult,
}

fn timeline_check(path: Option<&str>) -> anyhow::Result<()> {
    let files = match path {
        Some(p) => {
            let path = PathBuf::from(p);
            if path.is_file() {
                vec![path]
            } else if path.is_dir() {
                collect_timeline_files(&path)?
            } else {
                anyhow::bail!("路径不存在: {}", p);
            }
        }
        None => {
            let dir = Path::new(TIMELINES_DIR);
            if !dir.exists() {
                anyhow::bail!(
                    "默认时间线目录不存在: {}\n请在 workspace 根目录运行，或指定时间线路径",
                    dir.display()
                );
            }
            collect_timeline_files(dir)?
        }
    };

    if files.is_empty() {
        eprintln!("未找到时间线文件（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个时间线文件...\n", files.len());

    let mut result = TimelineCheckResult::default();
    for file in &files {
        check_timeline_file(file, &mut result);
    }

    print_check_result(&result);

    if result.load_errors > 0 || result.diagnostics.has_errors() {
        anyhow::bail!("时间线检查发现错误");
    }
    Ok(())
}

/// 收集目录下的所有时间线文件（排序后返回）
fn collect_timeline_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn check_timeline_file(file: &Path, result: &mut TimelineCheckResult) {
    let file_id = file.display().to_string();
    result.files_checked += 1;

    let content = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[ERROR] {}: 无法读取文件 - {}", file_id, e);
            result.load_errors += 1;
            return;
        }
    };

    let timeline = match Timeline::from_json_with_policy(&content, OffsetPolicy::Clamp) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("[ERROR] {}: {}", file_id, e);
            result.load_errors += 1;
            return;
        }
    };

    // 文件名与 id 不一致时只提示
    if let Some(stem) = file.file_stem().and_then(|s| s.to_str())
        && stem != timeline.id()
    {
        eprintln!(
            "[INFO] {}: 文件名与时间线 id \"{}\" 不一致",
            file_id,
            timeline.id()
        );
    }

    result.diagnostics.merge(analyze_timeline(&timeline));
}

fn print_check_result(result: &TimelineCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个时间线", result.files_checked);
    eprintln!();

    for diag in &result.diagnostics.diagnostics {
        eprintln!("{}", diag);
    }

    let error_count = result.load_errors + result.diagnostics.error_count();
    let warn_count = result.diagnostics.warn_count();

    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}

//=============================================================================
// timeline-export 命令实现
//=============================================================================

fn timeline_export(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)?;
    for kind in LoaderKind::ALL {
        let timeline = catalog::timeline(kind)?;
        let path = dir.join(format!("{}.json", kind.name()));
        std::fs::write(&path, timeline.to_json()? + "\n")?;
        eprintln!("  {} ({} stages)", path.display(), timeline.len());
    }
    eprintln!("\n✅ 已导出 {} 个时间线", LoaderKind::ALL.len());
    Ok(())
}
