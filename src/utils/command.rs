use std::io;
use std::process::{Command, Output, Stdio};

/// 命令执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl CommandResult {
    pub fn from_output(output: Output) -> Self {
        CommandResult {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            exit_code: output.status.code(),
        }
    }
}

/// 直接以参数列表执行程序（不经过 shell），等待其退出
///
/// 启动失败（程序不存在、无权限）返回 `Err`，退出码由调用方判断。
pub fn run_command(program: &str, args: &[String]) -> io::Result<CommandResult> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()?;
    Ok(CommandResult::from_output(output))
}
