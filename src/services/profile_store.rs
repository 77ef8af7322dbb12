//! Profile 存储：账号邮箱 → Profile 目录名
//!
//! 存储文件结构（默认 ~/.opin/profiles.json）：
//!
//! ```json
//! {
//!   "version": 1,
//!   "synced_at": "2026-10-18T08:00:00Z",
//!   "profiles": [ { "account_email": "a@x.com", "profile_id": "Profile 1" } ]
//! }
//! ```
//!
//! 每次同步整体替换，从不增量修改。替换持有写锁完成落盘后才切换内存内容，
//! 读者要么看到旧集合，要么看到新集合。

use crate::core::error::{RouterError, RouterResult, StoreError};
use crate::models::Profile;
use crate::utils::file_helpers::{lock_exclusive, write_atomic};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

const STORE_VERSION: u32 = 1;

/// 落盘格式
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct StoreFile {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    synced_at: Option<DateTime<Utc>>,
    #[serde(default)]
    profiles: Vec<Profile>,
}

#[derive(Debug, Default)]
struct StoreState {
    profiles: Vec<Profile>,
    synced_at: Option<DateTime<Utc>>,
}

/// Profile 存储
///
/// 内容按 `profile_id` 升序保存，`account_email` 唯一。
#[derive(Debug)]
pub struct ProfileStore {
    /// None 表示纯内存存储
    path: Option<PathBuf>,
    state: RwLock<StoreState>,
}

impl ProfileStore {
    /// 创建不落盘的存储
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(StoreState::default()),
        }
    }

    /// 打开存储文件；文件不存在时为空存储
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let state = match load_file(&path)? {
            Some(file) => StoreState {
                profiles: normalize(file.profiles),
                synced_at: file.synced_at,
            },
            None => StoreState::default(),
        };

        tracing::debug!(path = ?path, count = state.profiles.len(), "Profile 存储已加载");

        Ok(Self {
            path: Some(path),
            state: RwLock::new(state),
        })
    }

    /// 整体替换存储内容
    ///
    /// 重复邮箱（忽略大小写）以后出现者为准；邮箱为空的条目丢弃。
    /// 落盘失败时内存和磁盘均保持旧内容。
    pub fn replace_all(&self, profiles: Vec<Profile>) -> Result<(), StoreError> {
        let profiles = normalize(profiles);
        let synced_at = Utc::now();

        let mut state = self.write_state()?;

        if let Some(path) = &self.path {
            let file = StoreFile {
                version: STORE_VERSION,
                synced_at: Some(synced_at),
                profiles: profiles.clone(),
            };
            save_file(path, &file)?;
        }

        tracing::info!(count = profiles.len(), "Profile 存储已替换");
        state.profiles = profiles;
        state.synced_at = Some(synced_at);
        Ok(())
    }

    /// 当前全部 Profile（按 `profile_id` 排序）
    pub fn all(&self) -> Result<Vec<Profile>, StoreError> {
        Ok(self.read_state()?.profiles.clone())
    }

    /// 按目录名查找
    pub fn resolve(&self, profile_id: &str) -> RouterResult<Profile> {
        self.read_state()?
            .profiles
            .iter()
            .find(|p| p.profile_id == profile_id)
            .cloned()
            .ok_or_else(|| RouterError::NotFound(profile_id.to_string()))
    }

    /// 按账号邮箱查找（忽略大小写）
    pub fn find_by_email(&self, email: &str) -> Result<Option<Profile>, StoreError> {
        Ok(self
            .read_state()?
            .profiles
            .iter()
            .find(|p| p.account_email.eq_ignore_ascii_case(email))
            .cloned())
    }

    pub fn last_synced_at(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.read_state()?.synced_at)
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read_state()?.profiles.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, StoreState>, StoreError> {
        self.state
            .read()
            .map_err(|e| StoreError::Concurrency(e.to_string()))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, StoreState>, StoreError> {
        self.state
            .write()
            .map_err(|e| StoreError::Concurrency(e.to_string()))
    }
}

/// 去重（同邮箱后者覆盖前者）并按目录名排序
///
/// 邮箱比较忽略 ASCII 大小写，与 `find_by_email` 一致；保留后者的原始写法。
fn normalize(profiles: Vec<Profile>) -> Vec<Profile> {
    let mut by_email: HashMap<String, Profile> = HashMap::new();
    for profile in profiles {
        if profile.account_email.is_empty() {
            tracing::warn!(profile_id = %profile.profile_id, "邮箱为空的 Profile 不会被保存");
            continue;
        }
        let key = profile.account_email.to_ascii_lowercase();
        if let Some(previous) = by_email.insert(key, profile) {
            tracing::warn!(
                email = %previous.account_email,
                replaced = %previous.profile_id,
                "重复的账号邮箱，以后扫描到的 Profile 为准"
            );
        }
    }

    let mut profiles: Vec<Profile> = by_email.into_values().collect();
    profiles.sort_by(|a, b| {
        a.profile_id
            .cmp(&b.profile_id)
            .then_with(|| a.account_email.cmp(&b.account_email))
    });
    profiles
}

fn load_file(path: &Path) -> Result<Option<StoreFile>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    let file: StoreFile = serde_json::from_str(&content)?;
    Ok(Some(file))
}

fn save_file(path: &Path, file: &StoreFile) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(file)?;

    // 锁在 _lock drop 时自动释放
    let _lock = lock_exclusive(path).map_err(|e| StoreError::io(path, e))?;
    write_atomic(path, json.as_bytes()).map_err(|e| StoreError::io(path, e))
}
