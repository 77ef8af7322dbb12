use serde::{Deserialize, Serialize};
use std::fmt;

/// 选择器中“不路由”选项使用的标记
pub const NO_ROUTING_TAG: &str = "---";

/// 一个浏览器 Profile：对外以账号邮箱标识，对内以目录名标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Profile {
    pub account_email: String,
    pub profile_id: String,
}

impl Profile {
    pub fn new(account_email: impl Into<String>, profile_id: impl Into<String>) -> Self {
        Self {
            account_email: account_email.into(),
            profile_id: profile_id.into(),
        }
    }
}

/// 当前接收 URL 的 Profile（或不路由）
///
/// 仅存在于进程内存中，重启后回到 `NoRouting`。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RoutingSelection {
    #[default]
    NoRouting,
    Profile(String),
}

impl RoutingSelection {
    pub fn profile(profile_id: impl Into<String>) -> Self {
        Self::Profile(profile_id.into())
    }

    pub fn profile_id(&self) -> Option<&str> {
        match self {
            RoutingSelection::NoRouting => None,
            RoutingSelection::Profile(id) => Some(id),
        }
    }

    /// 解析选择器标记：空串和 `---` 表示不路由，其余原样作为 Profile 目录名
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim();
        if tag.is_empty() || tag == NO_ROUTING_TAG {
            RoutingSelection::NoRouting
        } else {
            RoutingSelection::Profile(tag.to_string())
        }
    }

    pub fn tag(&self) -> &str {
        self.profile_id().unwrap_or(NO_ROUTING_TAG)
    }
}

impl fmt::Display for RoutingSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// 一次启动请求对应的外部命令，每次按需构造，不做存储
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    /// 启动器程序（macOS 下为 `open`）
    pub program: String,
    /// 浏览器应用名称，如 `Google Chrome`
    pub browser: String,
    /// `--profile-directory` 参数值，None 表示不指定 Profile
    pub profile_directory: Option<String>,
    pub url: String,
}

impl LaunchCommand {
    /// 传给启动器程序的参数列表
    ///
    /// 不经过 shell，浏览器收到的 `--profile-directory=<id>` 和 URL 与输入完全一致。
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-na".to_string(),
            self.browser.clone(),
            "--args".to_string(),
        ];
        if let Some(profile) = &self.profile_directory {
            args.push(format!("--profile-directory={profile}"));
        }
        args.push(self.url.clone());
        args
    }
}

/// 渲染为 `open -na "<Browser>" --args --profile-directory="<id>" <url>` 的规范形式
impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -na \"{}\" --args", self.program, self.browser)?;
        if let Some(profile) = &self.profile_directory {
            write!(f, " --profile-directory=\"{profile}\"")?;
        }
        write!(f, " {}", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(profile: Option<&str>, url: &str) -> LaunchCommand {
        LaunchCommand {
            program: "open".to_string(),
            browser: "Google Chrome".to_string(),
            profile_directory: profile.map(str::to_string),
            url: url.to_string(),
        }
    }

    #[test]
    fn display_with_profile() {
        let cmd = command(Some("Profile 7"), "http://example.com");
        assert_eq!(
            cmd.to_string(),
            r#"open -na "Google Chrome" --args --profile-directory="Profile 7" http://example.com"#
        );
    }

    #[test]
    fn display_without_profile() {
        let cmd = command(None, "http://example.com");
        assert_eq!(
            cmd.to_string(),
            r#"open -na "Google Chrome" --args http://example.com"#
        );
    }

    #[test]
    fn args_keep_url_verbatim() {
        let url = r#"https://example.com/a b?q="x"&y='z'"#;
        let cmd = command(Some("Profile 2"), url);
        assert_eq!(
            cmd.args(),
            vec![
                "-na",
                "Google Chrome",
                "--args",
                "--profile-directory=Profile 2",
                url,
            ]
        );
    }

    #[test]
    fn selection_from_tag() {
        assert_eq!(RoutingSelection::from_tag("---"), RoutingSelection::NoRouting);
        assert_eq!(RoutingSelection::from_tag(""), RoutingSelection::NoRouting);
        assert_eq!(
            RoutingSelection::from_tag("Profile 1"),
            RoutingSelection::profile("Profile 1")
        );
        assert_eq!(RoutingSelection::NoRouting.to_string(), "---");
        assert_eq!(RoutingSelection::profile("Profile 4").tag(), "Profile 4");
    }
}
