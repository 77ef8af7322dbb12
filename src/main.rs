use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use opin::core::init_logger;
use opin::models::{AppConfig, LogLevel};
use opin::utils::config::load_config;
use opin::{render_choices, ChromeSupportDirectory, ListenHost, Session};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::BufReader;

/// opin - 把 URL 路由到指定的 Chrome Profile
#[derive(Parser)]
#[command(name = "opin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 覆盖配置中的日志级别（error/warn/info/debug/trace）
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 重新扫描 Chrome 支持目录并替换已保存的 Profile
    Sync {
        /// Chrome 支持目录（默认使用上次同步的目录或系统默认位置）
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,
    },
    /// 列出可选的路由目标
    List,
    /// 在指定 Profile 中打开 URL
    Open {
        /// Profile 目录名、账号邮箱或 `---`（不路由）
        #[arg(short, long, env = "OPIN_PROFILE", value_name = "PROFILE")]
        profile: Option<String>,

        #[arg(required = true, value_name = "URL")]
        urls: Vec<String>,
    },
    /// 常驻模式：从标准输入逐行读取指令
    ///
    /// select <profile> / open <url> / sync [dir] / list / status / log <level> / quit
    Listen {
        /// 初始路由目标
        #[arg(short, long, env = "OPIN_PROFILE", value_name = "PROFILE")]
        profile: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = load_config().map_err(|e| anyhow!(e))?;
    if let Some(level) = &cli.log_level {
        config.log_config.level = LogLevel::parse(level).map_err(|e| anyhow!(e))?;
    }

    if let Err(e) = init_logger(&config.log_config) {
        // 日志系统不可用时使用 eprintln!
        eprintln!("WARNING: Failed to initialize logging system: {}", e);
    }

    let session = Session::from_config(&config)?;

    match cli.command {
        Commands::Sync { root } => run_sync(&session, &config, root),
        Commands::List => run_list(&session),
        Commands::Open { profile, urls } => run_open(&session, profile.as_deref(), urls).await,
        Commands::Listen { profile } => run_listen(&session, &config, profile.as_deref()).await,
    }
}

fn run_sync(session: &Session, config: &AppConfig, root: Option<PathBuf>) -> Result<ExitCode> {
    let access = ChromeSupportDirectory::new(root, config);
    let report = session.sync(&access)?;
    println!(
        "Synced {} profile(s) from {} ({} discovered)",
        report.stored,
        report.root.display(),
        report.discovered
    );
    Ok(ExitCode::SUCCESS)
}

fn run_list(session: &Session) -> Result<ExitCode> {
    for line in render_choices(session)? {
        println!("{line}");
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_open(session: &Session, profile: Option<&str>, urls: Vec<String>) -> Result<ExitCode> {
    if let Some(profile) = profile {
        session.select(profile)?;
    }

    let mut failed = false;
    for launch in session.open_urls(urls).await {
        if let Err(e) = launch.result {
            eprintln!("Failed to open {}: {}", launch.url, e);
            failed = true;
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// 常驻模式：标准输入逐行读取指令，输入结束后等待已投递的 URL 全部启动
async fn run_listen(session: &Session, config: &AppConfig, profile: Option<&str>) -> Result<ExitCode> {
    if let Some(profile) = profile {
        session.select(profile)?;
    }

    let mut host = ListenHost::new(session.clone(), config.clone());
    let input = BufReader::new(tokio::io::stdin());
    let summary = host
        .run(input, &mut std::io::stdout(), &mut std::io::stderr())
        .await?;

    Ok(if summary.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
