#[cfg(test)]
mod tests {
    use appimage_updater::libs::config::{
        ApplicationConfig, ChecksumAlgorithm, ChecksumConfig, ConfigStore, GlobalConfig,
    };
    use appimage_updater::libs::data_storage::DataStorage;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct StoreTestContext {
        temp_dir: TempDir,
    }

    impl StoreTestContext {
        fn store(&self) -> ConfigStore {
            ConfigStore::with_storage(DataStorage::with_base(self.temp_dir.path()))
        }
    }

    impl TestContext for StoreTestContext {
        fn setup() -> Self {
            StoreTestContext {
                temp_dir: tempfile::tempdir().unwrap(),
            }
        }
    }

    fn sample_app(name: &str) -> ApplicationConfig {
        let mut app = ApplicationConfig::new(name, "https://github.com/example/app");
        app.pattern = Some(r"(?i)App.*\.AppImage(\.(|current|old[0-9]*))?$".to_string());
        app
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn missing_global_config_yields_defaults(ctx: &mut StoreTestContext) {
        let snapshot = ctx.store().load().unwrap();
        assert_eq!(snapshot.global, GlobalConfig::default());
        assert!(snapshot.apps.is_empty());
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn global_config_round_trips(ctx: &mut StoreTestContext) {
        let store = ctx.store();
        let mut global = GlobalConfig::default();
        global.concurrent_downloads = 5;
        global.timeout_seconds = 60;
        global.defaults.rotation_enabled = true;
        global.defaults.retain_count = 4;
        store.save_global(&global).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.global, global);
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn app_config_round_trips(ctx: &mut StoreTestContext) {
        let store = ctx.store();
        let mut app = sample_app("FreeCAD");
        app.prerelease = Some(true);
        app.retain_count = Some(2);
        app.checksum = Some(ChecksumConfig {
            enabled: true,
            algorithm: ChecksumAlgorithm::Sha1,
            pattern: "{filename}.sha1".to_string(),
            required: true,
        });
        store.add_app(&app).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.apps.len(), 1);
        assert_eq!(loaded.apps[0], app);
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn duplicate_names_are_rejected_case_insensitively(ctx: &mut StoreTestContext) {
        let store = ctx.store();
        store.add_app(&sample_app("FreeCAD")).unwrap();
        let err = store.add_app(&sample_app("freecad")).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn invalid_pattern_is_rejected(ctx: &mut StoreTestContext) {
        let store = ctx.store();
        let mut app = sample_app("Broken");
        app.pattern = Some("([unclosed".to_string());
        let err = store.add_app(&app).unwrap_err();
        assert!(err.to_string().contains("invalid pattern"));
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn rotation_without_symlink_is_rejected(ctx: &mut StoreTestContext) {
        let store = ctx.store();
        let mut app = sample_app("NoLink");
        app.rotation_enabled = Some(true);
        let err = store.add_app(&app).unwrap_err();
        assert!(err.to_string().contains("symlink"));
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn symlink_must_end_with_appimage(ctx: &mut StoreTestContext) {
        let store = ctx.store();
        let mut app = sample_app("BadLink");
        app.rotation_enabled = Some(true);
        app.symlink_path = Some("/opt/bin/app.link".to_string());
        let err = store.add_app(&app).unwrap_err();
        assert!(err.to_string().contains(".AppImage"));
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn shared_symlink_paths_are_rejected_at_save(ctx: &mut StoreTestContext) {
        let store = ctx.store();
        let mut first = sample_app("First");
        first.rotation_enabled = Some(true);
        first.symlink_path = Some("/opt/bin/shared.AppImage".to_string());
        store.add_app(&first).unwrap();

        let mut second = sample_app("Second");
        second.rotation_enabled = Some(true);
        second.symlink_path = Some("/opt/bin/shared.AppImage".to_string());
        let err = store.add_app(&second).unwrap_err();
        assert!(err.to_string().contains("already used"));
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn remove_app_deletes_the_document(ctx: &mut StoreTestContext) {
        let store = ctx.store();
        store.add_app(&sample_app("Gone")).unwrap();
        store.remove_app("gone").unwrap();
        assert!(store.load().unwrap().apps.is_empty());
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn remove_unknown_app_fails(ctx: &mut StoreTestContext) {
        let err = ctx.store().remove_app("nope").unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn malformed_document_fails_load(ctx: &mut StoreTestContext) {
        let store = ctx.store();
        let apps_dir = ctx.temp_dir.path().join("apps");
        std::fs::create_dir_all(&apps_dir).unwrap();
        std::fs::write(apps_dir.join("bad.json"), "{not json").unwrap();
        assert!(store.load().is_err());
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn retain_count_bounds_are_enforced(ctx: &mut StoreTestContext) {
        let store = ctx.store();
        let mut app = sample_app("TooMany");
        app.retain_count = Some(11);
        assert!(store.add_app(&app).is_err());

        let mut global = GlobalConfig::default();
        global.concurrent_downloads = 0;
        assert!(store.save_global(&global).is_err());
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn resolution_merges_global_defaults(ctx: &mut StoreTestContext) {
        let store = ctx.store();
        let mut global = GlobalConfig::default();
        global.defaults.prerelease = true;
        global.defaults.retain_count = 7;
        global.defaults.download_dir = Some(ctx.temp_dir.path().join("dl").display().to_string());
        store.save_global(&global).unwrap();
        store.add_app(&sample_app("Merged")).unwrap();

        let snapshot = store.load().unwrap();
        let resolved = snapshot.resolve(&snapshot.apps[0]).unwrap();
        assert!(resolved.prerelease);
        assert_eq!(resolved.retain_count, 7);
        // auto_subdir appends the app name under the global root.
        assert_eq!(
            resolved.download_dir,
            ctx.temp_dir.path().join("dl").join("Merged")
        );
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn explicit_values_override_defaults(ctx: &mut StoreTestContext) {
        let store = ctx.store();
        let mut global = GlobalConfig::default();
        global.defaults.prerelease = true;
        store.save_global(&global).unwrap();

        let mut app = sample_app("Explicit");
        app.prerelease = Some(false);
        app.retain_count = Some(2);
        app.download_dir = Some(ctx.temp_dir.path().join("elsewhere").display().to_string());
        store.add_app(&app).unwrap();

        let snapshot = store.load().unwrap();
        let resolved = snapshot.resolve(snapshot.find("Explicit").unwrap()).unwrap();
        assert!(!resolved.prerelease);
        assert_eq!(resolved.retain_count, 2);
        assert_eq!(resolved.download_dir, ctx.temp_dir.path().join("elsewhere"));
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn relative_download_dir_resolves_against_global_root(ctx: &mut StoreTestContext) {
        let store = ctx.store();
        let mut global = GlobalConfig::default();
        global.defaults.download_dir = Some(ctx.temp_dir.path().join("root").display().to_string());
        store.save_global(&global).unwrap();

        let mut app = sample_app("Relative");
        app.download_dir = Some("nested/dir".to_string());
        store.add_app(&app).unwrap();

        let snapshot = store.load().unwrap();
        let resolved = snapshot.resolve(snapshot.find("Relative").unwrap()).unwrap();
        assert_eq!(
            resolved.download_dir,
            ctx.temp_dir.path().join("root").join("nested/dir")
        );
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn default_pattern_is_derived_from_the_name(ctx: &mut StoreTestContext) {
        let store = ctx.store();
        let mut app = ApplicationConfig::new("MyTool", "https://example.com/MyTool.AppImage");
        app.direct = true;
        store.add_app(&app).unwrap();

        let snapshot = store.load().unwrap();
        let resolved = snapshot.resolve(snapshot.find("MyTool").unwrap()).unwrap();
        assert!(resolved.pattern.is_match("MyTool-1.2.3.AppImage"));
        assert!(resolved.pattern.is_match("MyTool-1.2.3.AppImage.current"));
    }
}
