//! Host introspection: architecture, distribution family, and the package
//! formats this machine can use.
//!
//! Detection runs once per process and the snapshot is passed to the asset
//! selector, which scores release artifacts against it. The tool refuses to
//! run anywhere but linux since AppImages are a linux-only format.

use crate::libs::error::UpdateError;
use std::env;
use std::fs;
use std::sync::OnceLock;

/// Normalized CPU architectures with the alias spellings seen in release
/// asset filenames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    X86_64,
    Arm64,
    Armv7,
    I686,
}

impl Architecture {
    /// Canonical token for this architecture.
    pub fn canonical(&self) -> &'static str {
        match self {
            Architecture::X86_64 => "x86_64",
            Architecture::Arm64 => "arm64",
            Architecture::Armv7 => "armv7",
            Architecture::I686 => "i686",
        }
    }

    /// Alias spellings that identify the same architecture in filenames.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Architecture::X86_64 => &["amd64", "x64"],
            Architecture::Arm64 => &["aarch64"],
            Architecture::Armv7 => &["armv7l", "armhf"],
            Architecture::I686 => &["i386", "x86"],
        }
    }

    /// Resolves any known spelling (canonical or alias) to an architecture.
    pub fn normalize(token: &str) -> Option<Architecture> {
        let token = token.to_lowercase();
        for arch in [
            Architecture::X86_64,
            Architecture::Arm64,
            Architecture::Armv7,
            Architecture::I686,
        ] {
            if arch.canonical() == token || arch.aliases().contains(&token.as_str()) {
                return Some(arch);
            }
        }
        None
    }

    /// Every architecture token the vocabulary knows, longest first so that
    /// substring scans match `x86_64` before `x86`.
    pub fn all_tokens() -> &'static [&'static str] {
        &[
            "x86_64", "aarch64", "amd64", "armv7l", "armhf", "arm64", "armv7", "i686", "i386",
            "x64", "x86",
        ]
    }
}

/// Operating-system tokens that appear in release asset filenames.
pub const PLATFORM_TOKENS: &[(&str, &str)] = &[
    ("linux", "linux"),
    ("darwin", "darwin"),
    ("macos", "darwin"),
    ("osx", "darwin"),
    ("windows", "windows"),
    ("win64", "windows"),
    ("win32", "windows"),
];

/// Linux distribution families, used to weight native package formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistroFamily {
    Debian,
    RedHat,
    Suse,
    Arch,
    Other,
}

impl DistroFamily {
    /// Classifies an os-release `ID`/`ID_LIKE` token.
    fn from_token(token: &str) -> Option<DistroFamily> {
        match token {
            "debian" | "ubuntu" | "linuxmint" | "pop" | "elementary" => Some(DistroFamily::Debian),
            "rhel" | "fedora" | "centos" | "rocky" | "almalinux" => Some(DistroFamily::RedHat),
            "suse" | "opensuse" | "opensuse-leap" | "opensuse-tumbleweed" | "sles" => {
                Some(DistroFamily::Suse)
            }
            "arch" | "manjaro" | "endeavouros" => Some(DistroFamily::Arch),
            _ => None,
        }
    }
}

/// Immutable snapshot of the machine the updater is running on.
#[derive(Debug, Clone, Copy)]
pub struct Host {
    pub architecture: Architecture,
    pub distro_family: DistroFamily,
}

static HOST: OnceLock<Host> = OnceLock::new();

impl Host {
    /// Detects the host, refusing to run on non-linux platforms.
    pub fn detect() -> Result<Host, UpdateError> {
        if env::consts::OS != "linux" {
            return Err(UpdateError::PlatformUnsupported(env::consts::OS.to_string()));
        }
        let architecture = Architecture::normalize(env::consts::ARCH)
            .unwrap_or(Architecture::X86_64);
        let distro_family = detect_distro_family(
            &fs::read_to_string("/etc/os-release").unwrap_or_default(),
        );
        Ok(Host {
            architecture,
            distro_family,
        })
    }

    /// Process-wide snapshot; detection runs on first access.
    pub fn snapshot() -> Result<&'static Host, UpdateError> {
        if let Some(host) = HOST.get() {
            return Ok(host);
        }
        let detected = Host::detect()?;
        Ok(HOST.get_or_init(|| detected))
    }

    /// Constructs a host snapshot directly, for tests and scoring helpers.
    pub fn new(architecture: Architecture, distro_family: DistroFamily) -> Host {
        Host {
            architecture,
            distro_family,
        }
    }

    /// Format weight for an asset file extension on this host.
    ///
    /// AppImages always win, the native package of the distro family comes
    /// next, generic archives trail, anything else is incompatible.
    pub fn format_score(&self, extension: &str) -> u32 {
        let ext = extension.to_lowercase();
        match ext.as_str() {
            "appimage" => 70,
            "deb" if self.distro_family == DistroFamily::Debian => 65,
            "rpm" if matches!(self.distro_family, DistroFamily::RedHat | DistroFamily::Suse) => 65,
            "tar.gz" | "tar.xz" | "tgz" => 50,
            "zip" => 45,
            _ => 0,
        }
    }
}

/// Parses `/etc/os-release` content into a distribution family.
///
/// `ID` is consulted first, then each `ID_LIKE` entry.
pub fn detect_distro_family(os_release: &str) -> DistroFamily {
    let mut id = None;
    let mut id_like = Vec::new();
    for line in os_release.lines() {
        if let Some(value) = line.strip_prefix("ID=") {
            id = Some(value.trim_matches('"').to_lowercase());
        } else if let Some(value) = line.strip_prefix("ID_LIKE=") {
            id_like = value
                .trim_matches('"')
                .split_whitespace()
                .map(|s| s.to_lowercase())
                .collect();
        }
    }
    if let Some(id) = id {
        if let Some(family) = DistroFamily::from_token(&id) {
            return family;
        }
    }
    for token in id_like {
        if let Some(family) = DistroFamily::from_token(&token) {
            return family;
        }
    }
    DistroFamily::Other
}
