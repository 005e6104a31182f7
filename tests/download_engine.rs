#[cfg(test)]
mod tests {
    use appimage_updater::libs::config::ChecksumAlgorithm;
    use appimage_updater::libs::download::{
        extract_appimage_from_zip, hash_file, make_executable, parse_checksum_file,
    };
    use appimage_updater::libs::error::UpdateError;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct EngineTestContext {
        temp_dir: TempDir,
    }

    impl EngineTestContext {
        fn dir(&self) -> &Path {
            self.temp_dir.path()
        }

        fn write_zip(&self, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
            let path = self.dir().join(name);
            let file = std::fs::File::create(&path).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated);
            for (entry_name, data) in entries {
                zip.start_file(*entry_name, options).unwrap();
                zip.write_all(data).unwrap();
            }
            zip.finish().unwrap();
            path
        }
    }

    impl TestContext for EngineTestContext {
        fn setup() -> Self {
            EngineTestContext {
                temp_dir: tempfile::tempdir().unwrap(),
            }
        }
    }

    #[test]
    fn checksum_file_with_hash_filename_lines() {
        let text = "\
0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef  Tool-1.0.AppImage
fedcba9876543210fedcba9876543210fedcba9876543210fedcba9876543210  Other-1.0.AppImage
";
        assert_eq!(
            parse_checksum_file(text, "Tool-1.0.AppImage"),
            Some("0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef".to_string())
        );
        assert_eq!(
            parse_checksum_file(text, "Other-1.0.AppImage"),
            Some("fedcba9876543210fedcba9876543210fedcba9876543210fedcba9876543210".to_string())
        );
        assert_eq!(parse_checksum_file(text, "Missing.AppImage"), None);
    }

    #[test]
    fn checksum_file_with_binary_marker() {
        let text = "abcdef0123456789 *Tool.AppImage\n";
        assert_eq!(
            parse_checksum_file(text, "Tool.AppImage"),
            Some("abcdef0123456789".to_string())
        );
    }

    #[test]
    fn single_line_checksum_applies_to_any_asset() {
        // A single `<hash> <other name>` line is assumed to describe the
        // downloaded asset even when the recorded name differs.
        let text = "abcdef0123456789  some-upstream-name.zip\n";
        assert_eq!(
            parse_checksum_file(text, "local-name.zip"),
            Some("abcdef0123456789".to_string())
        );
    }

    #[test]
    fn bare_hash_document() {
        assert_eq!(
            parse_checksum_file("ABCDEF0123456789\n", "anything.AppImage"),
            Some("abcdef0123456789".to_string())
        );
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let text = "\n# sha256 sums\nabcdef0123456789  Tool.AppImage\n\n";
        assert_eq!(
            parse_checksum_file(text, "Tool.AppImage"),
            Some("abcdef0123456789".to_string())
        );
    }

    #[test]
    fn non_hex_content_is_rejected() {
        assert_eq!(parse_checksum_file("not-a-hash  Tool.AppImage\n", "Tool.AppImage"), None);
    }

    #[test_context(EngineTestContext)]
    #[test]
    fn hash_file_produces_known_digests(ctx: &mut EngineTestContext) {
        let path = ctx.dir().join("hello.bin");
        std::fs::write(&path, b"Hello, World!").unwrap();
        assert_eq!(
            hash_file(&path, ChecksumAlgorithm::Sha256).unwrap(),
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
        assert_eq!(
            hash_file(&path, ChecksumAlgorithm::Sha1).unwrap(),
            "0a0a9f2a6772942557ab5355d76af442f8f65e01"
        );
        assert_eq!(
            hash_file(&path, ChecksumAlgorithm::Md5).unwrap(),
            "65a8e27d8879283831b664bd8b7f0ad4"
        );
    }

    #[test_context(EngineTestContext)]
    #[test]
    fn zip_with_one_appimage_extracts_and_removes_archive(ctx: &mut EngineTestContext) {
        let zip_path = ctx.write_zip(
            "bundle.zip",
            &[
                ("README.txt", b"docs".as_slice()),
                ("Bambu_Studio.AppImage", b"elf-bytes".as_slice()),
            ],
        );
        let extracted = extract_appimage_from_zip(&zip_path, ctx.dir()).unwrap();
        assert_eq!(extracted, ctx.dir().join("Bambu_Studio.AppImage"));
        assert_eq!(std::fs::read(&extracted).unwrap(), b"elf-bytes");
        assert!(!zip_path.exists(), "archive is deleted after extraction");
    }

    #[test_context(EngineTestContext)]
    #[test]
    fn nested_appimage_is_flattened(ctx: &mut EngineTestContext) {
        let zip_path = ctx.write_zip(
            "nested.zip",
            &[("inner/dir/Tool.AppImage", b"elf".as_slice())],
        );
        let extracted = extract_appimage_from_zip(&zip_path, ctx.dir()).unwrap();
        // Intermediate directory components collapse away.
        assert_eq!(extracted, ctx.dir().join("Tool.AppImage"));
    }

    #[test_context(EngineTestContext)]
    #[test]
    fn appimage_match_is_case_insensitive(ctx: &mut EngineTestContext) {
        let zip_path = ctx.write_zip("case.zip", &[("tool.appimage", b"elf".as_slice())]);
        let extracted = extract_appimage_from_zip(&zip_path, ctx.dir()).unwrap();
        assert!(extracted.ends_with("tool.appimage"));
    }

    #[test_context(EngineTestContext)]
    #[test]
    fn first_of_multiple_appimages_is_extracted(ctx: &mut EngineTestContext) {
        let zip_path = ctx.write_zip(
            "multi.zip",
            &[
                ("First.AppImage", b"first".as_slice()),
                ("Second.AppImage", b"second".as_slice()),
            ],
        );
        let extracted = extract_appimage_from_zip(&zip_path, ctx.dir()).unwrap();
        assert_eq!(extracted, ctx.dir().join("First.AppImage"));
        assert_eq!(std::fs::read(&extracted).unwrap(), b"first");
    }

    #[test_context(EngineTestContext)]
    #[test]
    fn zip_without_appimage_is_preserved_and_listed(ctx: &mut EngineTestContext) {
        let zip_path = ctx.write_zip(
            "empty.zip",
            &[
                ("setup.exe", b"pe".as_slice()),
                ("docs/readme.md", b"md".as_slice()),
            ],
        );
        let err = extract_appimage_from_zip(&zip_path, ctx.dir()).unwrap_err();
        match err {
            UpdateError::NoAppImageInArchive { listing, .. } => {
                assert!(listing.contains(&"setup.exe".to_string()));
                assert!(listing.contains(&"docs/readme.md".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(zip_path.exists(), "archive must stay in place");
    }

    #[cfg(unix)]
    #[test_context(EngineTestContext)]
    #[test]
    fn make_executable_sets_the_user_exec_bit(ctx: &mut EngineTestContext) {
        use std::os::unix::fs::PermissionsExt;
        let path = ctx.dir().join("tool.AppImage");
        std::fs::write(&path, b"elf").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        make_executable(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o100, 0o100);
    }
}
