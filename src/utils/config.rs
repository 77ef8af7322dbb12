use crate::models::AppConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// 覆盖配置目录的环境变量（测试和便携安装使用）
pub const CONFIG_DIR_ENV: &str = "OPIN_CONFIG_DIR";

const CONFIG_FILE: &str = "config.json";
const STORE_FILE: &str = "profiles.json";

/// OPin 配置目录 (~/.opin)，若不存在则创建
pub fn config_dir() -> Result<PathBuf, String> {
    let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let home_dir = dirs::home_dir().ok_or("Failed to get home directory")?;
            home_dir.join(".opin")
        }
    };
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    Ok(config_dir)
}

/// 全局配置文件路径
pub fn global_config_path() -> Result<PathBuf, String> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Profile 存储文件路径（配置优先，其次 ~/.opin/profiles.json）
pub fn store_path(config: &AppConfig) -> Result<PathBuf, String> {
    match &config.store_path {
        Some(path) => Ok(path.clone()),
        None => Ok(config_dir()?.join(STORE_FILE)),
    }
}

/// 读取全局配置（若文件不存在返回 Ok(None)）
pub fn read_global_config() -> Result<Option<AppConfig>, String> {
    let config_path = global_config_path()?;
    if !config_path.exists() {
        return Ok(None);
    }

    let content =
        fs::read_to_string(&config_path).map_err(|e| format!("Failed to read config: {}", e))?;
    let config: AppConfig =
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(config))
}

/// 读取全局配置，不存在时使用默认值
pub fn load_config() -> Result<AppConfig, String> {
    Ok(read_global_config()?.unwrap_or_default())
}

/// 写入全局配置，并设置权限
pub fn write_global_config(config: &AppConfig) -> Result<(), String> {
    let config_path = global_config_path()?;
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    fs::write(&config_path, json).map_err(|e| format!("Failed to write config: {}", e))?;
    set_private_permissions(&config_path)
}

/// 记住上次同步成功的浏览器支持目录，下次同步无需重新指定
pub fn remember_support_dir(dir: &Path) -> Result<(), String> {
    let mut config = load_config()?;
    if config.chrome_support_dir.as_deref() == Some(dir) {
        return Ok(());
    }
    config.chrome_support_dir = Some(dir.to_path_buf());
    write_global_config(&config)?;
    tracing::debug!(dir = ?dir, "已记住浏览器支持目录");
    Ok(())
}

#[cfg(unix)]
fn set_private_permissions(path: &Path) -> Result<(), String> {
    use std::os::unix::fs::PermissionsExt;
    let metadata =
        fs::metadata(path).map_err(|e| format!("Failed to get file metadata: {}", e))?;
    let mut perms = metadata.permissions();
    perms.set_mode(0o600);
    fs::set_permissions(path, perms).map_err(|e| format!("Failed to set file permissions: {}", e))
}

#[cfg(not(unix))]
fn set_private_permissions(_path: &Path) -> Result<(), String> {
    Ok(())
}
