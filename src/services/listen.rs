//! 常驻模式：逐行读取指令，驱动会话
//!
//! 指令：`select <profile>` / `open <url>` / `sync [dir]` / `list` / `status` /
//! `log <level>` / `quit`。
//!
//! `open` 立即返回，启动在后台任务中进行，结果完成后输出。
//! 输入结束或收到 `quit` 后，先等待已投递的 URL 全部启动完成再返回。

use crate::core::error::StoreError;
use crate::core::logger::update_log_level;
use crate::models::{AppConfig, LogLevel};
use crate::services::session::{Session, UrlLaunch};
use crate::services::sync::{ChromeSupportDirectory, FixedDirectory};
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::{JoinError, JoinSet};

/// 单行指令（或一次后台启动）的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// 写到标准输出
    Reply(String),
    /// 写到标准错误
    Failed(String),
    /// URL 已投递，结果稍后输出
    Dispatched,
    /// 空行
    Ignored,
    Quit,
}

/// 常驻模式结束时的启动统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenSummary {
    pub opened: usize,
    pub failed: usize,
}

enum Event {
    Line(io::Result<Option<String>>),
    Launched(Result<UrlLaunch, JoinError>),
}

/// 常驻模式宿主
pub struct ListenHost {
    session: Session,
    config: AppConfig,
    launches: JoinSet<UrlLaunch>,
    summary: ListenSummary,
}

impl ListenHost {
    pub fn new(session: Session, config: AppConfig) -> Self {
        Self {
            session,
            config,
            launches: JoinSet::new(),
            summary: ListenSummary::default(),
        }
    }

    /// 尚未完成的后台启动数
    pub fn pending(&self) -> usize {
        self.launches.len()
    }

    pub fn summary(&self) -> ListenSummary {
        self.summary
    }

    /// 处理一行指令
    ///
    /// `open` 会在当前 tokio 运行时中派生启动任务，需在运行时内调用。
    pub fn handle_line(&mut self, line: &str) -> LineOutcome {
        let line = line.trim();
        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        match command {
            "" => LineOutcome::Ignored,
            "quit" | "exit" => LineOutcome::Quit,
            "status" => self.status(),
            "list" => match render_choices(&self.session) {
                Ok(lines) => LineOutcome::Reply(lines.join("\n")),
                Err(e) => LineOutcome::Failed(format!("list failed: {e}")),
            },
            "select" => match self.session.select(arg) {
                Ok(selection) => LineOutcome::Reply(format!("routing to {selection}")),
                Err(e) => LineOutcome::Failed(format!("select failed: {e}")),
            },
            "sync" => {
                let result = if arg.is_empty() {
                    self.session
                        .sync(&ChromeSupportDirectory::new(None, &self.config))
                } else {
                    self.session.sync(&FixedDirectory(PathBuf::from(arg)))
                };
                match result {
                    Ok(report) => LineOutcome::Reply(format!(
                        "synced {} profile(s) from {}",
                        report.stored,
                        report.root.display()
                    )),
                    Err(e) => LineOutcome::Failed(format!("sync failed: {e}")),
                }
            }
            "log" => {
                let result = LogLevel::parse(arg)
                    .map_err(anyhow::Error::msg)
                    .and_then(|level| update_log_level(level).map(|()| level));
                match result {
                    Ok(level) => LineOutcome::Reply(format!("log level {}", level.as_str())),
                    Err(e) => LineOutcome::Failed(format!("log failed: {e}")),
                }
            }
            "open" if arg.is_empty() => LineOutcome::Failed("open requires a URL".to_string()),
            "open" => {
                // 命令此刻按当前目标构造，之后的 select 不影响这个 URL
                self.launches.spawn(self.session.deliver(arg));
                LineOutcome::Dispatched
            }
            other => LineOutcome::Failed(format!("unknown command: {other}")),
        }
    }

    /// 等待下一个后台启动完成；没有待完成的启动时返回 None
    pub async fn next_launch(&mut self) -> Option<LineOutcome> {
        let joined = self.launches.join_next().await?;
        Some(self.record(joined))
    }

    /// 逐行读取 `input` 直到结束或 `quit`，然后等待所有已投递的启动
    pub async fn run<R, O, E>(
        &mut self,
        input: R,
        out: &mut O,
        err: &mut E,
    ) -> io::Result<ListenSummary>
    where
        R: AsyncBufRead + Unpin,
        O: Write,
        E: Write,
    {
        tracing::info!(selection = %self.session.router().selection(), "进入常驻模式");

        let mut lines = input.lines();
        loop {
            let event = tokio::select! {
                line = lines.next_line() => Event::Line(line),
                Some(joined) = self.launches.join_next(), if !self.launches.is_empty() => {
                    Event::Launched(joined)
                }
            };

            let outcome = match event {
                Event::Line(line) => match line? {
                    Some(line) => self.handle_line(&line),
                    None => break,
                },
                Event::Launched(joined) => self.record(joined),
            };
            if outcome == LineOutcome::Quit {
                break;
            }
            emit(&outcome, out, err)?;
        }

        if !self.launches.is_empty() {
            tracing::debug!(pending = self.launches.len(), "等待后台启动完成");
        }
        while let Some(outcome) = self.next_launch().await {
            emit(&outcome, out, err)?;
        }

        tracing::info!(
            opened = self.summary.opened,
            failed = self.summary.failed,
            "退出常驻模式"
        );
        Ok(self.summary)
    }

    fn status(&self) -> LineOutcome {
        let router = self.session.router();
        let store = self.session.store();
        match store.len().and_then(|count| Ok((count, store.last_synced_at()?))) {
            Ok((count, synced_at)) => LineOutcome::Reply(format!(
                "routing to {} in {} ({} profile(s), last sync {}, {} pending)",
                router.selection(),
                router.target().browser,
                count,
                synced_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string()),
                self.pending()
            )),
            Err(e) => LineOutcome::Failed(format!("status failed: {e}")),
        }
    }

    fn record(&mut self, joined: Result<UrlLaunch, JoinError>) -> LineOutcome {
        match joined {
            Ok(UrlLaunch {
                result: Ok(outcome),
                ..
            }) => {
                self.summary.opened += 1;
                LineOutcome::Reply(format!("opened {}", outcome.command_line))
            }
            Ok(UrlLaunch { url, result: Err(e) }) => {
                self.summary.failed += 1;
                tracing::warn!(url = %url, error = %e, "URL 启动失败");
                LineOutcome::Failed(format!("Failed to open {url}: {e}"))
            }
            Err(e) => {
                self.summary.failed += 1;
                tracing::error!(error = %e, "启动任务异常结束");
                LineOutcome::Failed(format!("launch task failed: {e}"))
            }
        }
    }
}

/// 选择器选项的文本形式，当前目标以 `*` 标记
pub fn render_choices(session: &Session) -> Result<Vec<String>, StoreError> {
    let selection = session.router().selection();
    Ok(session
        .choices()?
        .into_iter()
        .map(|choice| {
            let marker = if choice.value == selection.tag() { "*" } else { " " };
            format!("{marker} {}\t{}", choice.value, choice.label)
        })
        .collect())
}

fn emit<O: Write, E: Write>(outcome: &LineOutcome, out: &mut O, err: &mut E) -> io::Result<()> {
    match outcome {
        LineOutcome::Reply(text) => {
            writeln!(out, "{text}")?;
            out.flush()
        }
        LineOutcome::Failed(text) => writeln!(err, "{text}"),
        LineOutcome::Dispatched | LineOutcome::Ignored | LineOutcome::Quit => Ok(()),
    }
}
