// 全局配置结构，放在 models 以便在库和二进制之间共享
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_BROWSER_NAME: &str = "Google Chrome";
pub const DEFAULT_LAUNCHER_PROGRAM: &str = "open";

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// 解析字符串为日志级别
    pub fn parse(level_str: &str) -> Result<Self, String> {
        match level_str.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!("无效的日志级别: {}", level_str)),
        }
    }
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// 日志输出目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Console,
    File,
    Both,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LogConfig {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub output: LogOutput,
    /// 日志目录（None 时使用 ~/.opin/logs）
    #[serde(default)]
    pub file_path: Option<String>,
}

/// OPin 全局配置（~/.opin/config.json）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// 浏览器在 `open -a` 中使用的应用名称
    #[serde(default = "default_browser_name")]
    pub browser_name: String,
    /// 启动器程序，macOS 下为 `open`
    #[serde(default = "default_launcher_program")]
    pub launcher_program: String,
    /// 上次同步成功的浏览器支持目录
    #[serde(default)]
    pub chrome_support_dir: Option<PathBuf>,
    /// Profile 存储文件路径（None 时使用 ~/.opin/profiles.json）
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    #[serde(default)]
    pub log_config: LogConfig,
}

fn default_browser_name() -> String {
    DEFAULT_BROWSER_NAME.to_string()
}

fn default_launcher_program() -> String {
    DEFAULT_LAUNCHER_PROGRAM.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            browser_name: default_browser_name(),
            launcher_program: default_launcher_program(),
            chrome_support_dir: None,
            store_path: None,
            log_config: LogConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"chrome_support_dir": "/tmp/chrome"}"#).unwrap();
        assert_eq!(config.browser_name, "Google Chrome");
        assert_eq!(config.launcher_program, "open");
        assert_eq!(config.chrome_support_dir, Some(PathBuf::from("/tmp/chrome")));
        assert_eq!(config.log_config, LogConfig::default());
    }

    #[test]
    fn log_level_parse() {
        assert_eq!(LogLevel::parse("DEBUG").unwrap(), LogLevel::Debug);
        assert!(LogLevel::parse("verbose").is_err());
    }

    #[test]
    fn log_config_lowercase_serde() {
        let config: LogConfig =
            serde_json::from_str(r#"{"level":"warn","format":"json","output":"both"}"#).unwrap();
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.output, LogOutput::Both);
        assert!(config.file_path.is_none());
    }
}
