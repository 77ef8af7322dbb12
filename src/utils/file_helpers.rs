//! 文件操作辅助函数
//!
//! 提供原子写入和文件锁，保证读者永远看不到写了一半的文件。

use fs2::FileExt;
use std::fs::{self, File};
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// 在完整文件名后追加后缀（`profiles.json` → `profiles.json.lock`）
///
/// 不替换扩展名，目标文件本身以 `.tmp` / `.lock` 结尾时也不会与之重名。
fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// 与目标文件同目录的锁文件路径
pub fn lock_path(path: &Path) -> PathBuf {
    sibling_with_suffix(path, ".lock")
}

/// 原子写入使用的临时文件路径
pub fn temp_path(path: &Path) -> PathBuf {
    sibling_with_suffix(path, ".tmp")
}

/// 获取目标文件的排他锁（阻塞等待其他写操作完成）
///
/// 锁在返回的 `File` drop 时自动释放。
pub fn lock_exclusive(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let lock_file = File::create(lock_path(path))?;
    lock_file.lock_exclusive()?;
    Ok(lock_file)
}

/// 原子写入文件
///
/// 先写入同目录临时文件并 fsync，再 rename 覆盖目标。
/// 任一步骤失败时目标文件保持原样。
pub fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path(path);
    let result = (|| {
        let mut file = File::create(&tmp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        set_private_permissions(&tmp_path)?;
        fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

#[cfg(unix)]
fn set_private_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn set_private_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
