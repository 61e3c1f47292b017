//! # Config 模块
//!
//! 宿主配置管理。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use std::fs;
use std::path::{Path, PathBuf};

use intro_runtime::{LoaderKind, ThemeMode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{HostError, HostResult};

/// 宿主配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// 内置开场动画（未指定 `timeline_path` 时使用）
    #[serde(default)]
    pub loader: LoaderKind,

    /// 自定义时间线文件，优先于 `loader`
    #[serde(default)]
    pub timeline_path: Option<PathBuf>,

    /// 帧率
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// 日志级别（trace/debug/info/warn/error）
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// 触发跳过的输入行（空行总是触发跳过）
    #[serde(default = "default_skip_key")]
    pub skip_key: String,

    /// 渲染配置
    #[serde(default)]
    pub render: RenderConfig,
}

/// 渲染配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// 是否逐帧输出界面状态（否则只输出阶段切换）
    #[serde(default)]
    pub show_frames: bool,

    /// 数值进度条宽度
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,

    /// 初始主题
    #[serde(default)]
    pub theme: ThemeMode,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            show_frames: false,
            bar_width: default_bar_width(),
            theme: ThemeMode::default(),
        }
    }
}

// 默认值函数
fn default_fps() -> u32 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_skip_key() -> String {
    "s".to_string()
}

fn default_bar_width() -> usize {
    20
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            loader: LoaderKind::default(),
            timeline_path: None,
            fps: default_fps(),
            log_level: default_log_level(),
            skip_key: default_skip_key(),
            render: RenderConfig::default(),
        }
    }
}

impl HostConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let read = Self::read(path);
        Self::report(path, &read);
        read.ok().flatten().unwrap_or_default()
    }

    /// 读取配置文件
    ///
    /// # 返回
    /// - `Ok(None)`: 文件不存在
    /// - `Ok(Some(config))`: 读取并解析成功
    /// - `Err(_)`: 读取或解析失败
    pub fn read(path: impl AsRef<Path>) -> HostResult<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| HostError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| HostError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(config))
    }

    /// 记录 [`HostConfig::read`] 的结果
    ///
    /// 日志订阅器就绪之后调用，失败时的警告才不会丢失。
    pub fn report(path: &Path, read: &HostResult<Option<Self>>) {
        match read {
            Ok(Some(_)) => info!(path = ?path, "配置文件加载成功"),
            Ok(None) => info!(path = ?path, "配置文件不存在，使用默认配置"),
            Err(e) => warn!(path = ?path, error = %e, "配置文件无效，使用默认配置"),
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> HostResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> HostResult<()> {
        if self.fps == 0 || self.fps > 240 {
            return Err(HostError::InvalidConfig(format!(
                "帧率必须在 1 - 240 之间，当前为 {}",
                self.fps
            )));
        }

        if self.render.bar_width == 0 {
            return Err(HostError::InvalidConfig("进度条宽度必须大于 0".to_string()));
        }

        if let Some(path) = &self.timeline_path
            && !path.exists()
        {
            return Err(HostError::InvalidConfig(format!(
                "时间线文件不存在: {:?}",
                path
            )));
        }

        Ok(())
    }

    /// 解析日志级别，无法识别时回退到 INFO
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }

    /// 某个输入行是否表示跳过
    pub fn is_skip_input(&self, line: &str) -> bool {
        let line = line.trim();
        line.is_empty() || line.eq_ignore_ascii_case(&self.skip_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_default_config() {
        let config = HostConfig::default();
        assert_eq!(config.loader, LoaderKind::TimeRewind);
        assert_eq!(config.fps, 60);
        assert_eq!(config.render.bar_width, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_field_defaults() {
        let config: HostConfig = serde_json::from_str(r#"{ "loader": "soc", "fps": 30 }"#).unwrap();
        assert_eq!(config.loader, LoaderKind::Soc);
        assert_eq!(config.fps, 30);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.render, RenderConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = HostConfig::load(dir.path().join("config.json"));
        assert_eq!(config, HostConfig::default());
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(HostConfig::load(&path), HostConfig::default());
    }

    #[test]
    fn test_read_reports_unknown_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "loader": "socc", "fps": 30 }"#).unwrap();

        let err = HostConfig::read(&path).unwrap_err();
        assert!(matches!(err, HostError::ParseConfig { .. }));
        assert!(err.to_string().contains("socc"));
        assert!(HostConfig::read(dir.path().join("none.json")).unwrap().is_none());
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_invalid_file_logs_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "loader": "socc" }"#).unwrap();

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let config = tracing::subscriber::with_default(subscriber, || HostConfig::load(&path));
        assert_eq!(config, HostConfig::default());

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("WARN"));
        assert!(logs.contains("配置文件无效，使用默认配置"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = HostConfig {
            loader: LoaderKind::ZeroDay,
            fps: 24,
            render: RenderConfig {
                show_frames: true,
                theme: ThemeMode::Light,
                ..RenderConfig::default()
            },
            ..HostConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(HostConfig::load(&path), config);
    }

    #[test]
    fn test_validate_fps() {
        let config = HostConfig {
            fps: 0,
            ..HostConfig::default()
        };
        assert!(matches!(config.validate(), Err(HostError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_missing_timeline() {
        let config = HostConfig {
            timeline_path: Some(PathBuf::from("does/not/exist.json")),
            ..HostConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_skip_input() {
        let config = HostConfig::default();
        assert!(config.is_skip_input(""));
        assert!(config.is_skip_input(" S \n"));
        assert!(!config.is_skip_input("quit"));
    }

    #[test]
    fn test_tracing_level() {
        let mut config = HostConfig::default();
        assert_eq!(config.tracing_level(), tracing::Level::INFO);
        config.log_level = "debug".to_string();
        assert_eq!(config.tracing_level(), tracing::Level::DEBUG);
        config.log_level = "loud".to_string();
        assert_eq!(config.tracing_level(), tracing::Level::INFO);
    }
}
