#[cfg(test)]
mod tests {
    use appimage_updater::libs::config::{ApplicationConfig, ConfigStore, GlobalConfig};
    use appimage_updater::libs::data_storage::DataStorage;
    use appimage_updater::libs::orchestrator::{glob_to_regex, Orchestrator, RunOutcome};
    use appimage_updater::libs::outcome::{CheckResult, CheckStatus, DownloadResult};
    use tempfile::TempDir;
    use test_context::{test_context, AsyncTestContext};

    struct OrchestratorTestContext {
        temp_dir: TempDir,
    }

    impl OrchestratorTestContext {
        fn store(&self) -> ConfigStore {
            ConfigStore::with_storage(DataStorage::with_base(self.temp_dir.path()))
        }

        fn add_disabled_app(&self, name: &str) {
            let mut app = ApplicationConfig::new(name, "https://github.com/example/app");
            app.pattern = Some(r"(?i)App.*\.AppImage$".to_string());
            app.enabled = false;
            self.store().add_app(&app).unwrap();
        }
    }

    impl AsyncTestContext for OrchestratorTestContext {
        async fn setup() -> Self {
            OrchestratorTestContext {
                temp_dir: tempfile::tempdir().unwrap(),
            }
        }
    }

    #[test]
    fn glob_filters_translate() {
        let matcher = glob_to_regex("Free*").unwrap();
        assert!(matcher.is_match("FreeCAD"));
        assert!(matcher.is_match("freecad"));
        assert!(!matcher.is_match("LibreCAD"));

        let single = glob_to_regex("Tool?").unwrap();
        assert!(single.is_match("Tool1"));
        assert!(!single.is_match("Tool12"));

        // No wildcards means an exact, case-insensitive match.
        let exact = glob_to_regex("OrcaSlicer").unwrap();
        assert!(exact.is_match("orcaslicer"));
        assert!(!exact.is_match("OrcaSlicerPlus"));

        // Regex metacharacters in names are taken literally.
        let dotted = glob_to_regex("app.name").unwrap();
        assert!(dotted.is_match("app.name"));
        assert!(!dotted.is_match("appxname"));
    }

    #[test]
    fn exit_code_reflects_the_worst_failure() {
        let mut outcome = RunOutcome::default();
        assert_eq!(outcome.exit_code(), 0);

        outcome
            .checks
            .push(CheckResult::error("a", "Transport error: connection refused"));
        assert_eq!(outcome.exit_code(), 2);

        outcome
            .downloads
            .push(DownloadResult::failure("b", "Rotation failed: rename"));
        assert_eq!(outcome.exit_code(), 3);
    }

    #[test]
    fn exit_code_treats_config_errors_as_general_failures() {
        let mut outcome = RunOutcome::default();
        outcome
            .checks
            .push(CheckResult::error("a", "Invalid configuration: bad pattern"));
        assert_eq!(outcome.exit_code(), 1);
    }

    #[test]
    fn up_to_date_results_do_not_fail_the_run() {
        let mut outcome = RunOutcome::default();
        outcome.checks.push(CheckResult {
            app_name: "a".to_string(),
            current_version: Some("1.0".to_string()),
            latest_version: Some("1.0".to_string()),
            status: CheckStatus::UpToDate,
            error: None,
        });
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(outcome.updates_available(), 0);
    }

    #[test_context(OrchestratorTestContext)]
    #[tokio::test]
    async fn disabled_apps_are_reported_without_network_access(
        ctx: &mut OrchestratorTestContext,
    ) {
        ctx.store().save_global(&GlobalConfig::default()).unwrap();
        ctx.add_disabled_app("Sleeping");
        let snapshot = ctx.store().load().unwrap();
        let storage = DataStorage::with_base(ctx.temp_dir.path());

        let orchestrator = Orchestrator::new(snapshot, storage).unwrap();
        let outcome = orchestrator.run(&[], false).await.unwrap();
        assert_eq!(outcome.checks.len(), 1);
        assert_eq!(outcome.checks[0].status, CheckStatus::Disabled);
        assert!(outcome.downloads.is_empty());
    }

    #[test_context(OrchestratorTestContext)]
    #[tokio::test]
    async fn filters_narrow_the_run(ctx: &mut OrchestratorTestContext) {
        ctx.store().save_global(&GlobalConfig::default()).unwrap();
        ctx.add_disabled_app("Alpha");
        ctx.add_disabled_app("Beta");
        let snapshot = ctx.store().load().unwrap();
        let storage = DataStorage::with_base(ctx.temp_dir.path());

        let orchestrator = Orchestrator::new(snapshot, storage).unwrap();
        let outcome = orchestrator
            .run(&["alp*".to_string()], true)
            .await
            .unwrap();
        assert_eq!(outcome.checks.len(), 1);
        assert_eq!(outcome.checks[0].app_name, "Alpha");
    }

    #[test_context(OrchestratorTestContext)]
    #[tokio::test]
    async fn unmatched_filter_yields_no_results(ctx: &mut OrchestratorTestContext) {
        ctx.store().save_global(&GlobalConfig::default()).unwrap();
        ctx.add_disabled_app("Alpha");
        let snapshot = ctx.store().load().unwrap();
        let storage = DataStorage::with_base(ctx.temp_dir.path());

        let orchestrator = Orchestrator::new(snapshot, storage).unwrap();
        let outcome = orchestrator
            .run(&["nothing".to_string()], true)
            .await
            .unwrap();
        assert!(outcome.checks.is_empty());
    }

    #[test_context(OrchestratorTestContext)]
    #[tokio::test]
    async fn cancelled_runs_mark_unfinished_apps(ctx: &mut OrchestratorTestContext) {
        ctx.store().save_global(&GlobalConfig::default()).unwrap();
        ctx.add_disabled_app("Alpha");
        let snapshot = ctx.store().load().unwrap();
        let storage = DataStorage::with_base(ctx.temp_dir.path());

        // A disabled app is still reported as disabled even under
        // cancellation; the cancel handle itself must not panic.
        let orchestrator = Orchestrator::new(snapshot, storage).unwrap();
        orchestrator.cancel_handle().cancel();
        let outcome = orchestrator.run(&[], false).await.unwrap();
        assert_eq!(outcome.checks.len(), 1);
        assert_eq!(outcome.checks[0].status, CheckStatus::Disabled);
    }
}
