#[cfg(test)]
mod tests {
    use appimage_updater::libs::pattern::{
        pattern_from_filenames, pattern_from_name, pattern_from_releases,
    };
    use appimage_updater::libs::release::{Asset, Release};
    use regex::Regex;

    fn release(tag: &str, prerelease: bool, assets: &[&str]) -> Release {
        Release {
            tag: tag.to_string(),
            published_at: None,
            is_prerelease: prerelease,
            assets: assets
                .iter()
                .map(|name| Asset::new(*name, format!("https://example.com/{name}")))
                .collect(),
        }
    }

    /// The generated pattern must match every training filename and the
    /// same filename with any rotation suffix appended.
    fn assert_covers(pattern: &str, names: &[&str]) {
        let regex = Regex::new(pattern).unwrap();
        for name in names {
            assert!(regex.is_match(name), "{pattern} should match {name}");
            for suffix in [".current", ".old", ".old2", ".old11"] {
                let rotated = format!("{name}{suffix}");
                assert!(regex.is_match(&rotated), "{pattern} should match {rotated}");
            }
        }
    }

    #[test]
    fn derives_pattern_from_versioned_appimages() {
        let names = [
            "FreeCAD-0.21.2-Linux-x86_64.AppImage",
            "FreeCAD-0.21.1-Linux-x86_64.AppImage",
            "FreeCAD-0.21.0-Linux-x86_64.AppImage",
        ];
        let pattern = pattern_from_filenames(&names);
        assert_covers(&pattern, &names);
        // A newer release with the same naming scheme keeps matching.
        assert_covers(&pattern, &["FreeCAD-0.22.0-Linux-x86_64.AppImage"]);
    }

    #[test]
    fn pattern_is_case_insensitive() {
        let pattern = pattern_from_filenames(&["MyApp-1.0.AppImage"]);
        let regex = Regex::new(&pattern).unwrap();
        assert!(regex.is_match("myapp-2.0.appimage"));
    }

    #[test]
    fn underscore_and_hyphen_are_interchangeable() {
        let pattern = pattern_from_filenames(&["Bambu_Studio-1.0.0.AppImage"]);
        let regex = Regex::new(&pattern).unwrap();
        assert!(regex.is_match("Bambu_Studio-2.0.0.AppImage"));
        assert!(regex.is_match("Bambu-Studio-2.0.0.AppImage"));
    }

    #[test]
    fn date_stamped_names_generalize() {
        let names = [
            "nightly-2024.01.15-x86_64.AppImage",
            "nightly-2024.02.20-x86_64.AppImage",
        ];
        let pattern = pattern_from_filenames(&names);
        assert_covers(&pattern, &names);
    }

    #[test]
    fn stable_appimage_group_is_preferred() {
        let releases = vec![
            release("1.1.0-rc1", true, &["Tool-1.1.0-rc1.AppImage"]),
            release("1.0.0", false, &["Tool-1.0.0.AppImage", "Tool-1.0.0.zip"]),
        ];
        let pattern = pattern_from_releases(&releases).unwrap();
        assert_covers(&pattern, &["Tool-1.0.0.AppImage"]);
    }

    #[test]
    fn zip_group_is_used_when_no_appimages_exist() {
        let releases = vec![release(
            "PR-8017",
            false,
            &["BambuStudio_ubuntu-24.04_PR-8017.zip"],
        )];
        let pattern = pattern_from_releases(&releases).unwrap();
        assert_covers(&pattern, &["BambuStudio_ubuntu-24.04_PR-8017.zip"]);
    }

    #[test]
    fn prerelease_group_is_the_last_resort() {
        let releases = vec![release("2.0-beta", true, &["Beta-2.0.AppImage"])];
        let pattern = pattern_from_releases(&releases).unwrap();
        assert_covers(&pattern, &["Beta-2.0.AppImage"]);
    }

    #[test]
    fn no_matching_assets_yields_none() {
        let releases = vec![release("1.0", false, &["tool-1.0.exe", "tool-1.0.dmg"])];
        assert!(pattern_from_releases(&releases).is_none());
    }

    #[test]
    fn name_fallback_matches_rotated_files() {
        let pattern = pattern_from_name("OrcaSlicer");
        assert_covers(
            &pattern,
            &["OrcaSlicer_Linux_V2.0.0.AppImage", "OrcaSlicer.zip"],
        );
    }

    #[test]
    fn regex_special_characters_are_escaped() {
        let pattern = pattern_from_filenames(&["app+plus (beta).AppImage"]);
        assert!(Regex::new(&pattern).is_ok());
    }
}
