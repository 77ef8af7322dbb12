//! Profile 同步：目录授权 → 扫描 → 整体替换存储
//!
//! 目录访问失败或存储写入失败都会中止同步，存储保留同步前的内容。

use crate::core::error::{DirectoryError, RouterResult};
use crate::models::AppConfig;
use crate::services::profile_store::ProfileStore;
use crate::services::scanner::ProfileScanner;
use crate::utils::config::remember_support_dir;
use std::path::{Path, PathBuf};

/// 浏览器支持目录的提供方
pub trait DirectoryAccess {
    /// 返回已授权、可读的根目录
    fn root(&self) -> Result<PathBuf, DirectoryError>;

    /// 同步成功后回调，可用于记住目录
    fn remember(&self, _root: &Path) {}
}

/// 固定路径
#[derive(Debug, Clone)]
pub struct FixedDirectory(pub PathBuf);

impl DirectoryAccess for FixedDirectory {
    fn root(&self) -> Result<PathBuf, DirectoryError> {
        ensure_dir(&self.0)
    }
}

/// Chrome 支持目录
///
/// 查找顺序：显式指定 → 配置中记住的目录 → `~/Library/Application Support/Google/Chrome`。
#[derive(Debug, Clone, Default)]
pub struct ChromeSupportDirectory {
    explicit: Option<PathBuf>,
    remembered: Option<PathBuf>,
}

impl ChromeSupportDirectory {
    pub fn new(explicit: Option<PathBuf>, config: &AppConfig) -> Self {
        Self {
            explicit,
            remembered: config.chrome_support_dir.clone(),
        }
    }

    /// macOS 下 Chrome 的默认支持目录
    pub fn default_location() -> Option<PathBuf> {
        dirs::home_dir().map(|home| {
            home.join("Library")
                .join("Application Support")
                .join("Google")
                .join("Chrome")
        })
    }
}

impl DirectoryAccess for ChromeSupportDirectory {
    fn root(&self) -> Result<PathBuf, DirectoryError> {
        let candidate = self
            .explicit
            .clone()
            .or_else(|| self.remembered.clone())
            .or_else(Self::default_location)
            .ok_or_else(|| DirectoryError::Unresolved("无法获取用户主目录".to_string()))?;
        ensure_dir(&candidate)
    }

    fn remember(&self, root: &Path) {
        if let Err(e) = remember_support_dir(root) {
            tracing::warn!(root = ?root, error = %e, "记住浏览器支持目录失败");
        }
    }
}

fn ensure_dir(path: &Path) -> Result<PathBuf, DirectoryError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(path.to_path_buf()),
        Ok(_) => Err(DirectoryError::Missing(path.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(DirectoryError::Missing(path.to_path_buf()))
        }
        Err(e) => Err(DirectoryError::access(path, e)),
    }
}

/// 同步结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub root: PathBuf,
    /// 扫描得到的 Profile 数
    pub discovered: usize,
    /// 写入存储的 Profile 数（重复邮箱合并后可能更少）
    pub stored: usize,
}

/// 重新扫描浏览器目录并整体替换存储
pub fn sync_profiles(
    access: &dyn DirectoryAccess,
    scanner: &ProfileScanner,
    store: &ProfileStore,
) -> RouterResult<SyncReport> {
    let root = access.root().map_err(|e| {
        tracing::warn!(error = %e, "无法访问浏览器支持目录，同步中止");
        e
    })?;

    let profiles = scanner.scan(&root)?;
    let discovered = profiles.len();

    store.replace_all(profiles).map_err(|e| {
        tracing::error!(error = %e, "写入 Profile 存储失败，保留原有内容");
        e
    })?;
    let stored = store.len()?;

    access.remember(&root);

    tracing::info!(root = ?root, discovered, stored, "Profile 同步完成");
    Ok(SyncReport {
        root,
        discovered,
        stored,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::RouterError;
    use crate::models::Profile;
    use crate::utils::file_helpers::temp_path;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn write_profile(root: &Path, dir: &str, email: &str) {
        let path = root.join(dir);
        fs::create_dir_all(&path).unwrap();
        fs::write(
            path.join("Preferences"),
            format!(r#"{{"profile":{{"name":"{dir}"}},"account_info":[{{"email":"{email}"}}]}}"#),
        )
        .unwrap();
    }

    struct DeniedDirectory;

    impl DirectoryAccess for DeniedDirectory {
        fn root(&self) -> Result<PathBuf, DirectoryError> {
            Err(DirectoryError::access(
                "/protected",
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            ))
        }
    }

    #[test]
    fn sync_replaces_store_contents() {
        let root = TempDir::new().unwrap();
        write_profile(root.path(), "Profile 1", "a@x.com");
        write_profile(root.path(), "Profile 2", "b@x.com");
        let store = ProfileStore::in_memory();
        store
            .replace_all(vec![Profile::new("gone@x.com", "Profile 9")])
            .unwrap();

        let report = sync_profiles(
            &FixedDirectory(root.path().to_path_buf()),
            &ProfileScanner::new(),
            &store,
        )
        .unwrap();

        assert_eq!(report.discovered, 2);
        assert_eq!(report.stored, 2);
        assert_eq!(
            store.all().unwrap(),
            vec![
                Profile::new("a@x.com", "Profile 1"),
                Profile::new("b@x.com", "Profile 2"),
            ]
        );
    }

    #[test]
    fn sync_collapses_duplicate_emails() {
        let root = TempDir::new().unwrap();
        write_profile(root.path(), "Profile 1", "same@x.com");
        write_profile(root.path(), "Profile 2", "same@x.com");
        let store = ProfileStore::in_memory();

        let report = sync_profiles(
            &FixedDirectory(root.path().to_path_buf()),
            &ProfileScanner::new(),
            &store,
        )
        .unwrap();

        assert_eq!(report.discovered, 2);
        assert_eq!(report.stored, 1);
        assert_eq!(store.all().unwrap()[0].profile_id, "Profile 2");
    }

    #[test]
    fn directory_error_leaves_store_unchanged() {
        let store = ProfileStore::in_memory();
        let before = vec![Profile::new("keep@x.com", "Profile 1")];
        store.replace_all(before.clone()).unwrap();

        let err = sync_profiles(&DeniedDirectory, &ProfileScanner::new(), &store).unwrap_err();

        assert!(matches!(err, RouterError::Directory(_)));
        assert_eq!(store.all().unwrap(), before);
    }

    #[test]
    fn missing_root_leaves_store_unchanged() {
        let root = TempDir::new().unwrap();
        let store = ProfileStore::in_memory();
        let before = vec![Profile::new("keep@x.com", "Profile 1")];
        store.replace_all(before.clone()).unwrap();

        let err = sync_profiles(
            &FixedDirectory(root.path().join("missing")),
            &ProfileScanner::new(),
            &store,
        )
        .unwrap_err();

        assert!(matches!(err, RouterError::Directory(DirectoryError::Missing(_))));
        assert_eq!(store.all().unwrap(), before);
    }

    #[test]
    fn store_error_aborts_sync_and_keeps_contents() {
        let root = TempDir::new().unwrap();
        write_profile(root.path(), "Profile 1", "new@x.com");
        let data = TempDir::new().unwrap();
        let path = data.path().join("profiles.json");
        let store = ProfileStore::open(&path).unwrap();
        let before = vec![Profile::new("keep@x.com", "Profile 5")];
        store.replace_all(before.clone()).unwrap();
        fs::create_dir(temp_path(&path)).unwrap();

        let err = sync_profiles(
            &FixedDirectory(root.path().to_path_buf()),
            &ProfileScanner::new(),
            &store,
        )
        .unwrap_err();

        assert!(matches!(err, RouterError::Store(_)));
        assert_eq!(store.all().unwrap(), before);
    }

    #[test]
    #[serial]
    fn chrome_directory_prefers_explicit_then_remembered() {
        let config_dir = TempDir::new().unwrap();
        std::env::set_var(crate::utils::config::CONFIG_DIR_ENV, config_dir.path());

        let explicit = TempDir::new().unwrap();
        let remembered = TempDir::new().unwrap();
        let config = AppConfig {
            chrome_support_dir: Some(remembered.path().to_path_buf()),
            ..AppConfig::default()
        };

        let access = ChromeSupportDirectory::new(Some(explicit.path().to_path_buf()), &config);
        assert_eq!(access.root().unwrap(), explicit.path());

        let access = ChromeSupportDirectory::new(None, &config);
        assert_eq!(access.root().unwrap(), remembered.path());

        // 同步成功后目录写入配置
        let store = ProfileStore::in_memory();
        let access = ChromeSupportDirectory::new(Some(explicit.path().to_path_buf()), &config);
        sync_profiles(&access, &ProfileScanner::new(), &store).unwrap();
        let saved = crate::utils::config::load_config().unwrap();
        assert_eq!(saved.chrome_support_dir.as_deref(), Some(explicit.path()));

        std::env::remove_var(crate::utils::config::CONFIG_DIR_ENV);
    }
}
