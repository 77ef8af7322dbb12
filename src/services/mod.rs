// 服务层模块
//
// - scanner: 扫描浏览器 Profile 目录
// - profile_store: 账号邮箱 → Profile 目录名的持久化映射
// - router: 当前路由目标与启动命令构造
// - launcher: 外部进程启动
// - sync: 扫描 + 整体替换存储
// - session: 组装以上组件供宿主调用
// - listen: 常驻模式的逐行指令处理

pub mod launcher;
pub mod listen;
pub mod profile_store;
pub mod router;
pub mod scanner;
pub mod session;
pub mod sync;

pub use launcher::{LaunchOutcome, Launcher};
pub use listen::{render_choices, LineOutcome, ListenHost, ListenSummary};
pub use profile_store::ProfileStore;
pub use router::{BrowserTarget, Router};
pub use scanner::{PreferencesDocument, ProfileScanner};
pub use session::{Choice, Session, UrlLaunch};
pub use sync::{sync_profiles, ChromeSupportDirectory, DirectoryAccess, FixedDirectory, SyncReport};
