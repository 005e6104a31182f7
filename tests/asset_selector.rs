#[cfg(test)]
mod tests {
    use appimage_updater::libs::host::{Architecture, DistroFamily, Host};
    use appimage_updater::libs::release::{Asset, Release};
    use appimage_updater::libs::selector::{
        arch_score, platform_score, score_assets, select_asset, InteractiveSelector, PickFirst,
    };
    use chrono::{TimeZone, Utc};
    use regex::Regex;

    fn host() -> Host {
        Host::new(Architecture::X86_64, DistroFamily::Debian)
    }

    fn release(assets: Vec<Asset>) -> Release {
        Release {
            tag: "1.0.0".to_string(),
            published_at: None,
            is_prerelease: false,
            assets,
        }
    }

    fn asset(name: &str) -> Asset {
        Asset::new(name, format!("https://example.com/{name}"))
    }

    fn any_pattern() -> Regex {
        Regex::new(r"(?i).*\.(zip|AppImage|deb|tar\.gz)$").unwrap()
    }

    #[test]
    fn exact_architecture_beats_alias() {
        let exact = asset("tool-x86_64.AppImage");
        let alias = asset("tool-amd64.AppImage");
        assert_eq!(arch_score(&exact, &host()), 100);
        assert_eq!(arch_score(&alias, &host()), 80);
    }

    #[test]
    fn foreign_architecture_scores_zero() {
        let arm = asset("tool-aarch64.AppImage");
        assert_eq!(arch_score(&arm, &host()), 0);
    }

    #[test]
    fn absent_architecture_is_generic() {
        let generic = asset("tool.AppImage");
        assert_eq!(arch_score(&generic, &host()), 50);
    }

    #[test]
    fn platform_scoring() {
        assert_eq!(platform_score(&asset("tool-linux.AppImage")), 100);
        assert_eq!(platform_score(&asset("tool-windows.zip")), 0);
        assert_eq!(platform_score(&asset("tool-macos.zip")), 0);
        assert_eq!(platform_score(&asset("tool.AppImage")), 50);
    }

    #[test]
    fn incompatible_assets_are_never_selected() {
        let release = release(vec![
            asset("tool-windows-x86_64.zip"),
            asset("tool-linux-aarch64.AppImage"),
            asset("tool-linux-x86_64.AppImage"),
        ]);
        let selected = select_asset(&release, &any_pattern(), &host(), &PickFirst).unwrap();
        assert_eq!(selected.name, "tool-linux-x86_64.AppImage");

        // Invariant: nothing with a zero arch or platform score survives.
        for scored in score_assets(&release, &any_pattern(), &host()) {
            if scored.asset.name == selected.name {
                assert!(scored.arch_score > 0 && scored.platform_score > 0);
            }
        }
    }

    #[test]
    fn appimage_is_preferred_over_native_package() {
        let release = release(vec![
            asset("tool-linux-x86_64.deb"),
            asset("tool-linux-x86_64.AppImage"),
        ]);
        let selected = select_asset(&release, &any_pattern(), &host(), &PickFirst).unwrap();
        assert_eq!(selected.name, "tool-linux-x86_64.AppImage");
    }

    #[test]
    fn native_package_beats_generic_archive() {
        let release = release(vec![
            asset("tool-linux-x86_64.tar.gz"),
            asset("tool-linux-x86_64.deb"),
        ]);
        let selected = select_asset(&release, &any_pattern(), &host(), &PickFirst).unwrap();
        assert_eq!(selected.name, "tool-linux-x86_64.deb");
    }

    #[test]
    fn newer_asset_wins_ties() {
        let mut older = asset("tool-linux-x86_64.old-build.AppImage");
        older.created_at = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let mut newer = asset("tool-linux-x86_64.new-build.AppImage");
        newer.created_at = Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        let release = release(vec![older, newer]);
        let pattern = Regex::new(r"(?i).*\.AppImage$").unwrap();
        let selected = select_asset(&release, &pattern, &host(), &PickFirst).unwrap();
        assert_eq!(selected.name, "tool-linux-x86_64.new-build.AppImage");
    }

    #[test]
    fn ties_delegate_to_the_interactive_selector() {
        struct PickLast;
        impl InteractiveSelector for PickLast {
            fn pick(&self, candidates: &[Asset]) -> Option<Asset> {
                candidates.last().cloned()
            }
        }
        let release = release(vec![
            asset("tool-a-linux-x86_64.AppImage"),
            asset("tool-b-linux-x86_64.AppImage"),
        ]);
        let pattern = Regex::new(r"(?i).*\.AppImage$").unwrap();
        let selected = select_asset(&release, &pattern, &host(), &PickLast).unwrap();
        assert_eq!(selected.name, "tool-b-linux-x86_64.AppImage");
    }

    #[test]
    fn no_pattern_match_fails() {
        let release = release(vec![asset("tool-linux-x86_64.AppImage")]);
        let pattern = Regex::new(r"^OtherTool.*\.AppImage$").unwrap();
        let err = select_asset(&release, &pattern, &host(), &PickFirst).unwrap_err();
        assert!(err.to_string().contains("No release asset"));
    }

    #[test]
    fn only_incompatible_assets_fails() {
        let release = release(vec![
            asset("tool-windows-x86_64.zip"),
            asset("tool-darwin-arm64.zip"),
        ]);
        let err = select_asset(&release, &any_pattern(), &host(), &PickFirst).unwrap_err();
        assert!(err.to_string().contains("No release asset"));
    }

    #[test]
    fn format_scores_follow_the_distro_family() {
        let debian = Host::new(Architecture::X86_64, DistroFamily::Debian);
        let redhat = Host::new(Architecture::X86_64, DistroFamily::RedHat);
        assert_eq!(debian.format_score("appimage"), 70);
        assert_eq!(debian.format_score("deb"), 65);
        assert_eq!(debian.format_score("rpm"), 0);
        assert_eq!(redhat.format_score("rpm"), 65);
        assert_eq!(redhat.format_score("deb"), 0);
        assert_eq!(debian.format_score("tar.gz"), 50);
        assert_eq!(debian.format_score("zip"), 45);
        assert_eq!(debian.format_score("exe"), 0);
    }
}
