//! URL 路由：持有当前选中的 Profile，为每个 URL 构造启动命令

use crate::models::{AppConfig, LaunchCommand, RoutingSelection};
use std::sync::RwLock;

/// 浏览器启动目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserTarget {
    /// 启动器程序（macOS 下为 `open`）
    pub program: String,
    /// 浏览器应用名称
    pub browser: String,
}

impl Default for BrowserTarget {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl BrowserTarget {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            program: config.launcher_program.clone(),
            browser: config.browser_name.clone(),
        }
    }
}

/// 路由器
///
/// 选择值不会与 Profile 存储校验：同步后已消失的目录名仍会原样用于启动命令。
#[derive(Debug, Default)]
pub struct Router {
    target: BrowserTarget,
    selection: RwLock<RoutingSelection>,
}

impl Router {
    pub fn new(target: BrowserTarget) -> Self {
        Self {
            target,
            selection: RwLock::new(RoutingSelection::NoRouting),
        }
    }

    pub fn with_selection(target: BrowserTarget, selection: RoutingSelection) -> Self {
        Self {
            target,
            selection: RwLock::new(selection),
        }
    }

    pub fn target(&self) -> &BrowserTarget {
        &self.target
    }

    /// 替换当前选择
    pub fn set_selection(&self, selection: RoutingSelection) {
        // 选择值是整体替换的纯数据，锁中毒时直接沿用内部值
        let mut guard = self
            .selection
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        tracing::info!(from = %guard.tag(), to = %selection.tag(), "路由目标已切换");
        *guard = selection;
    }

    pub fn selection(&self) -> RoutingSelection {
        self.selection
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// 为 URL 构造启动命令（纯函数，无 I/O）
    ///
    /// URL 原样透传，不做解析或改写。
    pub fn build_launch_command(&self, url: &str) -> LaunchCommand {
        let selection = self
            .selection
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        LaunchCommand {
            program: self.target.program.clone(),
            browser: self.target.browser.clone(),
            profile_directory: selection.profile_id().map(str::to_string),
            url: url.to_string(),
        }
    }
}
