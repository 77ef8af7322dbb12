//! 浏览器 Profile 扫描
//!
//! 读取浏览器支持目录下的 `Profile*` 子目录，解析各自的 `Preferences` 文件，
//! 得到 (账号邮箱, 目录名) 对。
//!
//! 约定：
//! - 仅匹配以 `Profile` 开头的目录，`Default` 目录不参与扫描（沿用既有行为）
//! - 单个 Profile 解析失败只记录日志并跳过，不影响其余 Profile
//! - 只读访问，不修改任何 Profile 目录

use crate::core::error::{DirectoryError, PreferencesParseError};
use crate::models::Profile;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Profile 目录名前缀
pub const PROFILE_DIR_PREFIX: &str = "Profile";
/// 每个 Profile 目录下的偏好设置文件名
pub const PREFERENCES_FILE: &str = "Preferences";

/// `Preferences` 文件中路由关心的部分，其余字段忽略
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesDocument {
    #[serde(default)]
    pub profile: Option<ProfileSection>,
    #[serde(default)]
    pub account_info: Option<Vec<AccountInfo>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileSection {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub email: Option<String>,
}

impl PreferencesDocument {
    /// 读取并解析 `Preferences` 文件
    pub fn load(path: &Path) -> Result<Self, PreferencesParseError> {
        let content = fs::read(path).map_err(|source| PreferencesParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&content).map_err(|source| PreferencesParseError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 第一个账号的邮箱；缺失或为空时返回 None
    pub fn account_email(&self) -> Option<&str> {
        self.account_info
            .as_ref()?
            .first()?
            .email
            .as_deref()
            .filter(|email| !email.is_empty())
    }

    pub fn profile_name(&self) -> Option<&str> {
        self.profile.as_ref()?.name.as_deref()
    }
}

/// Profile 扫描器
#[derive(Debug, Clone)]
pub struct ProfileScanner {
    prefix: String,
    preferences_file: String,
}

impl Default for ProfileScanner {
    fn default() -> Self {
        Self {
            prefix: PROFILE_DIR_PREFIX.to_string(),
            preferences_file: PREFERENCES_FILE.to_string(),
        }
    }
}

impl ProfileScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// 扫描根目录，返回按目录名排序的 Profile 列表
    ///
    /// 根目录不存在或不可读时返回 `DirectoryError`；单个 Profile 的失败不会中断扫描。
    pub fn scan(&self, root: &Path) -> Result<Vec<Profile>, DirectoryError> {
        if !root.is_dir() {
            return Err(DirectoryError::Missing(root.to_path_buf()));
        }

        let entries = fs::read_dir(root).map_err(|e| DirectoryError::access(root, e))?;

        let mut profiles = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(root = ?root, error = %e, "读取目录项失败，已跳过");
                    continue;
                }
            };

            let Some(profile_id) = self.candidate_id(&entry.path()) else {
                continue;
            };

            match self.read_candidate(&entry.path(), &profile_id) {
                Ok(Some(profile)) => profiles.push(profile),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(profile_id = %profile_id, error = %e, "Profile 解析失败，已跳过");
                }
            }
        }

        profiles.sort_by(|a, b| a.profile_id.cmp(&b.profile_id));

        tracing::info!(root = ?root, count = profiles.len(), "Profile 扫描完成");
        Ok(profiles)
    }

    /// 匹配前缀的子目录返回其目录名
    fn candidate_id(&self, path: &Path) -> Option<String> {
        if !path.is_dir() {
            return None;
        }
        let name = path.file_name()?.to_str()?;
        name.starts_with(&self.prefix).then(|| name.to_string())
    }

    fn preferences_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.preferences_file)
    }

    /// 解析单个 Profile；没有邮箱的 Profile 返回 Ok(None)
    fn read_candidate(
        &self,
        dir: &Path,
        profile_id: &str,
    ) -> Result<Option<Profile>, PreferencesParseError> {
        let document = PreferencesDocument::load(&self.preferences_path(dir))?;

        match document.account_email() {
            Some(email) => {
                tracing::debug!(
                    profile_id = %profile_id,
                    name = ?document.profile_name(),
                    email = %email,
                    "发现 Profile"
                );
                Ok(Some(Profile::new(email, profile_id)))
            }
            None => {
                tracing::debug!(profile_id = %profile_id, "Profile 未登录账号，已跳过");
                Ok(None)
            }
        }
    }
}
