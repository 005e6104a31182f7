#[cfg(test)]
mod tests {
    use appimage_updater::api::direct::filename_from_url;
    use appimage_updater::api::dynamic::extract_appimage_links;
    use appimage_updater::api::github::owner_repo;
    use appimage_updater::api::sourceforge::extract_appimage_paths;
    use appimage_updater::api::{resolve_auth_token, Repository};
    use appimage_updater::libs::config::{
        ApplicationConfig, ConfigStore, GlobalConfig, ResolvedApp, SourceType,
    };
    use appimage_updater::libs::data_storage::DataStorage;
    use appimage_updater::libs::http::HttpFacility;
    use appimage_updater::libs::release::{Asset, Release};
    use url::Url;

    #[test]
    fn owner_repo_parsing() {
        let url = Url::parse("https://github.com/FreeCAD/FreeCAD").unwrap();
        assert_eq!(
            owner_repo(&url),
            Some(("FreeCAD".to_string(), "FreeCAD".to_string()))
        );

        let with_git = Url::parse("https://github.com/probonopd/appimagetool.git").unwrap();
        assert_eq!(
            owner_repo(&with_git),
            Some(("probonopd".to_string(), "appimagetool".to_string()))
        );

        let extra = Url::parse("https://github.com/owner/repo/releases/tag/v1.0").unwrap();
        assert_eq!(
            owner_repo(&extra),
            Some(("owner".to_string(), "repo".to_string()))
        );

        let bare = Url::parse("https://github.com/").unwrap();
        assert_eq!(owner_repo(&bare), None);
    }

    #[test]
    fn sourceforge_listing_extraction() {
        let html = r#"
            <a href="/projects/myproj/files/MyApp-1.2.0-x86_64.AppImage/download" title="d">link</a>
            <a href="/projects/myproj/files/MyApp-1.1.0-x86_64.AppImage/download">older</a>
            <a href="/projects/myproj/files/readme.txt/download">docs</a>
            <a href="/projects/myproj/files/MyApp-1.2.0-x86_64.AppImage/download">duplicate</a>
        "#;
        let paths = extract_appimage_paths(html);
        assert_eq!(
            paths,
            vec![
                "/projects/myproj/files/MyApp-1.2.0-x86_64.AppImage".to_string(),
                "/projects/myproj/files/MyApp-1.1.0-x86_64.AppImage".to_string(),
            ]
        );
    }

    #[test]
    fn dynamic_page_link_extraction() {
        let base = Url::parse("https://example.com/download/").unwrap();
        let html = r#"
            <a href="files/Tool-2.0.AppImage">download</a>
            <a href="https://cdn.example.com/Tool-2.0-arm64.AppImage">arm</a>
            <a href='files/Tool-2.0.AppImage'>duplicate</a>
            <a href="setup.exe">windows</a>
        "#;
        let links = extract_appimage_links(html, &base);
        let rendered: Vec<String> = links.iter().map(|u| u.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "https://example.com/download/files/Tool-2.0.AppImage".to_string(),
                "https://cdn.example.com/Tool-2.0-arm64.AppImage".to_string(),
            ]
        );
    }

    #[test]
    fn page_without_appimage_links_yields_nothing() {
        let base = Url::parse("https://example.com/download").unwrap();
        let html = r#"<a href="setup.exe">x</a><a href="tool.dmg">y</a>"#;
        assert!(extract_appimage_links(html, &base).is_empty());
    }

    #[test]
    fn direct_filename_resolution() {
        assert_eq!(
            filename_from_url("https://example.com/dl/Tool-1.0.AppImage"),
            Some("Tool-1.0.AppImage".to_string())
        );
        assert_eq!(
            filename_from_url("https://example.com/dl/Tool.AppImage?token=abc"),
            Some("Tool.AppImage".to_string())
        );
        assert_eq!(filename_from_url("https://example.com/"), None);
    }

    #[test]
    fn checksum_assets_attach_by_template() {
        let mut release = Release {
            tag: "1.0".to_string(),
            published_at: None,
            is_prerelease: false,
            assets: vec![
                Asset::new("Tool-1.0.AppImage", "https://example.com/Tool-1.0.AppImage"),
                Asset::new(
                    "Tool-1.0.AppImage-SHA256.txt",
                    "https://example.com/Tool-1.0.AppImage-SHA256.txt",
                ),
                Asset::new("Other-1.0.AppImage", "https://example.com/Other-1.0.AppImage"),
            ],
        };
        release.attach_checksums("{filename}-SHA256.txt");
        let tool = &release.assets[0];
        assert_eq!(
            tool.checksum.as_ref().map(|c| c.name.as_str()),
            Some("Tool-1.0.AppImage-SHA256.txt")
        );
        // No matching checksum file for the other asset.
        assert!(release.assets[2].checksum.is_none());
        // The checksum file itself gets no checksum attached.
        assert!(release.assets[1].checksum.is_none());
    }

    #[test]
    fn checksum_attachment_is_case_insensitive() {
        let mut release = Release {
            tag: "1.0".to_string(),
            published_at: None,
            is_prerelease: false,
            assets: vec![
                Asset::new("Tool.AppImage", "https://example.com/Tool.AppImage"),
                Asset::new(
                    "tool.appimage-sha256.txt",
                    "https://example.com/tool.appimage-sha256.txt",
                ),
            ],
        };
        release.attach_checksums("{filename}-SHA256.txt");
        assert!(release.assets[0].checksum.is_some());
    }

    fn resolved_app(url: &str, source_type: Option<SourceType>, direct: bool) -> ResolvedApp {
        let temp = tempfile::tempdir().unwrap();
        let store = ConfigStore::with_storage(DataStorage::with_base(temp.path()));
        let mut app = ApplicationConfig::new("Probe", url);
        app.source_type = source_type;
        app.direct = direct;
        app.pattern = Some(r"(?i).*\.AppImage$".to_string());
        store.add_app(&app).unwrap();
        let snapshot = store.load().unwrap();
        snapshot.resolve(snapshot.find("Probe").unwrap()).unwrap()
    }

    /// Known hosts and explicit source types construct without probing, and
    /// every constructed client recognizes its own URL.
    #[tokio::test]
    async fn factory_detects_known_hosts_without_probing() {
        let temp = tempfile::tempdir().unwrap();
        let storage = DataStorage::with_base(temp.path());
        let global = GlobalConfig::default();
        let http = std::sync::Arc::new(HttpFacility::new(&global).unwrap());

        let cases = [
            ("https://github.com/FreeCAD/FreeCAD", None, false, SourceType::GithubApi),
            ("https://gitlab.com/group/project", None, false, SourceType::GitlabApi),
            (
                "https://sourceforge.net/projects/myproj/files/",
                None,
                false,
                SourceType::SourceForge,
            ),
            (
                "https://example.com/dl/Tool-1.0.AppImage",
                None,
                true,
                SourceType::Direct,
            ),
            (
                "https://example.com/download",
                Some(SourceType::Dynamic),
                false,
                SourceType::Dynamic,
            ),
        ];
        for (url, source_type, direct, expected) in cases {
            let app = resolved_app(url, source_type, direct);
            let repository = Repository::for_app(&http, &app, &global, &storage)
                .await
                .unwrap();
            assert_eq!(repository.source_type(), expected, "{url}");
            // Either the variant recognizes the URL or it was explicitly
            // requested / forced.
            assert!(
                repository.detect_url(url) || source_type.is_some() || direct,
                "{url} not recognized by {expected:?}"
            );
        }
    }

    #[test]
    fn github_urls_normalize_to_owner_repo() {
        let url = Url::parse("https://github.com/owner/repo/releases/tag/v1.0").unwrap();
        assert_eq!(
            appimage_updater::api::github::GitHubClient::normalize_url(&url),
            Some("https://github.com/owner/repo".to_string())
        );
    }

    /// Token resolution order in one test to avoid env-var races between
    /// parallel tests.
    #[test]
    fn auth_token_resolution_order() {
        let temp = tempfile::tempdir().unwrap();
        let storage = DataStorage::with_base(temp.path());
        let mut global = GlobalConfig::default();
        global.auth_token = Some("from-config".to_string());

        std::env::remove_var("GITHUB_TOKEN");
        std::env::remove_var("APPIMAGE_UPDATER_MYAPP_TOKEN");

        // Last resort: the embedded global token.
        assert_eq!(
            resolve_auth_token(SourceType::GithubApi, "MyApp", &storage, &global),
            Some("from-config".to_string())
        );

        // The token sidecar file beats the embedded token.
        std::fs::write(temp.path().join(".github_token"), "from-file\n").unwrap();
        assert_eq!(
            resolve_auth_token(SourceType::GithubApi, "MyApp", &storage, &global),
            Some("from-file".to_string())
        );

        // The app-scoped variable beats the file.
        std::env::set_var("APPIMAGE_UPDATER_MYAPP_TOKEN", "from-app-env");
        assert_eq!(
            resolve_auth_token(SourceType::GithubApi, "MyApp", &storage, &global),
            Some("from-app-env".to_string())
        );

        // The platform variable beats everything.
        std::env::set_var("GITHUB_TOKEN", "from-env");
        assert_eq!(
            resolve_auth_token(SourceType::GithubApi, "MyApp", &storage, &global),
            Some("from-env".to_string())
        );

        // Non-forge sources never authenticate.
        assert_eq!(
            resolve_auth_token(SourceType::Dynamic, "MyApp", &storage, &global),
            None
        );

        std::env::remove_var("GITHUB_TOKEN");
        std::env::remove_var("APPIMAGE_UPDATER_MYAPP_TOKEN");
    }
}
