//! 核心基础设施层：错误类型与日志

pub mod error;
pub mod logger;

pub use error::{
    DirectoryError, PreferencesParseError, ProcessError, RouterError, RouterResult, StoreError,
};
pub use logger::{init_logger, update_log_level};
