//! 运行期会话：把存储、路由器和启动器组装在一起，供 CLI / 菜单宿主调用

use crate::core::error::{ProcessError, RouterError, RouterResult, StoreError};
use crate::models::{AppConfig, RoutingSelection, NO_ROUTING_TAG};
use crate::services::launcher::{LaunchOutcome, Launcher};
use crate::services::profile_store::ProfileStore;
use crate::services::router::{BrowserTarget, Router};
use crate::services::scanner::ProfileScanner;
use crate::services::sync::{sync_profiles, DirectoryAccess, SyncReport};
use crate::utils::config::store_path;
use anyhow::{anyhow, Context};
use futures_util::future::join_all;
use std::future::Future;
use std::sync::Arc;

/// 选择器中“不路由”选项的标签
pub const NO_ROUTING_LABEL: &str = "Don't route";

/// 选择器中的一项：标签为账号邮箱，值为 Profile 目录名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub value: String,
}

/// 一个 URL 的启动结果
#[derive(Debug)]
pub struct UrlLaunch {
    pub url: String,
    pub result: Result<LaunchOutcome, ProcessError>,
}

#[derive(Debug, Clone)]
pub struct Session {
    store: Arc<ProfileStore>,
    router: Arc<Router>,
    launcher: Launcher,
    scanner: ProfileScanner,
}

impl Session {
    pub fn new(store: Arc<ProfileStore>, router: Arc<Router>) -> Self {
        Self {
            store,
            router,
            launcher: Launcher::new(),
            scanner: ProfileScanner::new(),
        }
    }

    /// 按全局配置打开存储并创建路由器
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let path = store_path(config).map_err(|e| anyhow!(e))?;
        let store = ProfileStore::open(&path)
            .with_context(|| format!("打开 Profile 存储失败: {path:?}"))?;
        let router = Router::new(BrowserTarget::from_config(config));
        Ok(Self::new(Arc::new(store), Arc::new(router)))
    }

    pub fn store(&self) -> &Arc<ProfileStore> {
        &self.store
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// 选择器选项：“不路由”在前，其后为存储中的全部 Profile
    pub fn choices(&self) -> Result<Vec<Choice>, StoreError> {
        let mut choices = vec![Choice {
            label: NO_ROUTING_LABEL.to_string(),
            value: NO_ROUTING_TAG.to_string(),
        }];
        choices.extend(self.store.all()?.into_iter().map(|p| Choice {
            label: p.account_email,
            value: p.profile_id,
        }));
        Ok(choices)
    }

    /// 设置路由目标
    ///
    /// 接受 `---`（不路由）、账号邮箱（通过存储解析）或 Profile 目录名（原样使用）。
    pub fn select(&self, input: &str) -> RouterResult<RoutingSelection> {
        let input = input.trim();
        let selection = if input.contains('@') {
            let profile = self
                .store
                .find_by_email(input)?
                .ok_or_else(|| RouterError::NotFound(input.to_string()))?;
            RoutingSelection::Profile(profile.profile_id)
        } else {
            let selection = RoutingSelection::from_tag(input);
            if let Some(id) = selection.profile_id() {
                if self.store.resolve(id).is_err() {
                    tracing::warn!(profile_id = %id, "所选 Profile 不在存储中，仍按目录名路由");
                }
            }
            selection
        };

        self.router.set_selection(selection.clone());
        Ok(selection)
    }

    /// 在当前路由目标中打开 URL
    pub fn open_url(&self, url: &str) -> Result<LaunchOutcome, ProcessError> {
        let command = self.router.build_launch_command(url);
        self.launcher.launch(&command)
    }

    /// 投递一个 URL
    ///
    /// 启动命令在调用时按当前路由目标构造，之后切换目标不影响已投递的 URL。
    /// 返回的 future 不借用会话，可交给 `JoinSet` 等独立执行。
    pub fn deliver(
        &self,
        url: impl Into<String>,
    ) -> impl Future<Output = UrlLaunch> + Send + 'static {
        let url = url.into();
        let command = self.router.build_launch_command(&url);
        let launcher = self.launcher;
        async move {
            let result = launcher.launch_async(command).await;
            UrlLaunch { url, result }
        }
    }

    /// 并发打开多个 URL，每个结果单独返回，互不影响
    pub async fn open_urls(&self, urls: Vec<String>) -> Vec<UrlLaunch> {
        join_all(urls.into_iter().map(|url| self.deliver(url))).await
    }

    /// 重新扫描并替换存储
    pub fn sync(&self, access: &dyn DirectoryAccess) -> RouterResult<SyncReport> {
        sync_profiles(access, &self.scanner, &self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Profile;
    use crate::services::sync::FixedDirectory;
    use std::fs;
    use tempfile::TempDir;

    fn session_with(profiles: Vec<Profile>, program: &str) -> Session {
        let store = ProfileStore::in_memory();
        store.replace_all(profiles).unwrap();
        let router = Router::new(BrowserTarget {
            program: program.to_string(),
            browser: "Google Chrome".to_string(),
        });
        Session::new(Arc::new(store), Arc::new(router))
    }

    #[test]
    fn choices_start_with_no_routing() {
        let session = session_with(vec![Profile::new("a@x.com", "Profile 1")], "true");

        let choices = session.choices().unwrap();

        assert_eq!(
            choices,
            vec![
                Choice {
                    label: "Don't route".to_string(),
                    value: "---".to_string(),
                },
                Choice {
                    label: "a@x.com".to_string(),
                    value: "Profile 1".to_string(),
                },
            ]
        );
    }

    #[test]
    fn select_by_email_resolves_profile_id() {
        let session = session_with(vec![Profile::new("a@x.com", "Profile 1")], "true");

        let selection = session.select("a@x.com").unwrap();

        assert_eq!(selection, RoutingSelection::profile("Profile 1"));
        assert_eq!(session.router().selection(), selection);
    }

    #[test]
    fn select_unknown_email_is_not_found() {
        let session = session_with(vec![], "true");

        let err = session.select("nobody@x.com").unwrap_err();

        assert!(matches!(err, RouterError::NotFound(_)));
        assert_eq!(session.router().selection(), RoutingSelection::NoRouting);
    }

    #[test]
    fn select_unknown_profile_id_is_kept_verbatim() {
        let session = session_with(vec![], "true");

        let selection = session.select("Profile 8").unwrap();

        assert_eq!(selection, RoutingSelection::profile("Profile 8"));
    }

    #[test]
    fn select_sentinel_clears_routing() {
        let session = session_with(vec![Profile::new("a@x.com", "Profile 1")], "true");
        session.select("Profile 1").unwrap();

        session.select("---").unwrap();

        assert_eq!(session.router().selection(), RoutingSelection::NoRouting);
    }

    #[cfg(unix)]
    #[test]
    fn open_url_uses_current_selection() {
        let session = session_with(vec![], "echo");
        session.select("Profile 3").unwrap();

        let outcome = session.open_url("http://example.com").unwrap();

        assert!(outcome.stdout.contains("--profile-directory=Profile 3"));
        assert!(outcome.stdout.ends_with("http://example.com"));
    }

    #[test]
    fn failed_launch_is_reported_not_fatal() {
        let session = session_with(vec![], "/nonexistent/opin-open");

        let result = session.open_url("http://example.com");

        assert!(matches!(result, Err(ProcessError::Spawn { .. })));
        // 失败后会话仍可继续使用
        assert!(session.select("Profile 1").is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn open_urls_reports_every_url() {
        let session = session_with(vec![], "echo");
        session.select("Profile 2").unwrap();

        let results = session
            .open_urls(vec!["http://a.example".to_string(), "http://b.example".to_string()])
            .await;

        assert_eq!(results.len(), 2);
        for launch in &results {
            let outcome = launch.result.as_ref().unwrap();
            assert!(outcome.stdout.ends_with(&launch.url));
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn delivered_url_keeps_selection_at_delivery_time() {
        let session = session_with(vec![], "echo");
        session.select("Profile 1").unwrap();

        let pending = session.deliver("http://example.com");
        session.select("---").unwrap();
        let launch = pending.await;

        let outcome = launch.result.unwrap();
        assert!(outcome.stdout.contains("--profile-directory=Profile 1"));
    }

    #[test]
    fn sync_then_choices_reflect_directory() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("Profile 1");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Preferences"), r#"{"account_info":[{"email":"a@x.com"}]}"#).unwrap();
        fs::create_dir_all(root.path().join("Profile 2")).unwrap();
        fs::create_dir_all(root.path().join("Default")).unwrap();
        let session = session_with(vec![], "true");

        session
            .sync(&FixedDirectory(root.path().to_path_buf()))
            .unwrap();

        let values: Vec<_> = session.choices().unwrap().into_iter().map(|c| c.value).collect();
        assert_eq!(values, vec!["---", "Profile 1"]);
    }
}
