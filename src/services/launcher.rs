//! 浏览器启动器
//!
//! 以 `open -na "<Browser>" --args [--profile-directory=<id>] <url>` 的形式启动浏览器。
//! 只等待启动器程序自身退出，浏览器进程独立运行。

use crate::core::error::ProcessError;
use crate::models::LaunchCommand;
use crate::utils::command::run_command;

/// 一次成功启动的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOutcome {
    /// 规范形式的命令行，用于日志和展示
    pub command_line: String,
    pub exit_code: Option<i32>,
    pub stdout: String,
}

/// 启动器：无共享可变状态，可并发调用
#[derive(Debug, Clone, Copy, Default)]
pub struct Launcher;

impl Launcher {
    pub fn new() -> Self {
        Self
    }

    /// 启动并等待启动器程序退出
    pub fn launch(&self, command: &LaunchCommand) -> Result<LaunchOutcome, ProcessError> {
        let command_line = command.to_string();
        tracing::info!(command = %command_line, "启动浏览器");

        let result = run_command(&command.program, &command.args()).map_err(|source| {
            tracing::error!(program = %command.program, error = %source, "启动器无法运行");
            ProcessError::Spawn {
                program: command.program.clone(),
                source,
            }
        })?;

        if !result.success {
            tracing::error!(
                program = %command.program,
                exit_code = ?result.exit_code,
                stderr = %result.stderr,
                "启动器退出异常"
            );
            return Err(ProcessError::ExitStatus {
                program: command.program.clone(),
                code: result.exit_code,
                stderr: result.stderr,
            });
        }

        Ok(LaunchOutcome {
            command_line,
            exit_code: result.exit_code,
            stdout: result.stdout,
        })
    }

    /// 在阻塞线程池中启动（异步）
    pub async fn launch_async(&self, command: LaunchCommand) -> Result<LaunchOutcome, ProcessError> {
        let launcher = *self;
        tokio::task::spawn_blocking(move || launcher.launch(&command))
            .await
            .unwrap_or_else(|e| Err(ProcessError::Join(e.to_string())))
    }
}
