//! 统一错误类型定义
//!
//! 使用 `thiserror` 定义路由核心的错误分类，应用层（CLI、配置、日志）通过 `anyhow` 兼容。

use std::path::PathBuf;
use thiserror::Error;

/// 浏览器支持目录访问失败
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// 目录不存在或不是目录
    #[error("目录不存在: {0}")]
    Missing(PathBuf),

    /// 无法读取目录（权限不足等）
    #[error("无法访问目录: {path}: {source}")]
    AccessDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 未能确定目录位置
    #[error("无法确定浏览器支持目录: {0}")]
    Unresolved(String),
}

/// 单个 Profile 的 Preferences 文件无法读取或解析
#[derive(Error, Debug)]
pub enum PreferencesParseError {
    #[error("读取 Preferences 失败: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("解析 Preferences 失败: {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Profile 存储持久化失败
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("存储文件 I/O 错误: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("存储序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("并发错误: {0}")]
    Concurrency(String),
}

/// 启动浏览器进程失败
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("无法启动进程 {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("进程 {program} 退出异常 (code={code:?}): {stderr}")]
    ExitStatus {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("启动任务执行失败: {0}")]
    Join(String),
}

/// 路由核心的统一错误类型
#[derive(Error, Debug)]
pub enum RouterError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    /// 资源未找到
    #[error("未找到 Profile: {0}")]
    NotFound(String),
}

pub type RouterResult<T> = std::result::Result<T, RouterError>;

impl DirectoryError {
    pub fn access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::AccessDenied {
            path: path.into(),
            source,
        }
    }
}

impl StoreError {
    /// 从 `std::io::Error` 和路径创建 I/O 错误
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
