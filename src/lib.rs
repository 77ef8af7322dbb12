// lib.rs - 暴露路由核心给 CLI 和菜单宿主使用

pub mod core;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::models::*;
pub use crate::services::{
    render_choices, sync_profiles, BrowserTarget, ChromeSupportDirectory, DirectoryAccess,
    FixedDirectory, LaunchOutcome, Launcher, LineOutcome, ListenHost, ListenSummary,
    PreferencesDocument, ProfileScanner, ProfileStore, Router, Session, SyncReport,
};

// 重新导出常用类型
pub use anyhow::{Context, Result};

pub use crate::core::{
    init_logger, update_log_level, DirectoryError, PreferencesParseError, ProcessError,
    RouterError, RouterResult, StoreError,
};
