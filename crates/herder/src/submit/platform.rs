//! Platform-string normalization.
//!
//! Maps free-form descriptions like "Win 7 32-bit" or "mac OS X 10.10" to
//! the attribute triple the results UI expects. The table is ordered; the
//! first matching pattern wins.

use std::sync::LazyLock;

use regex::Regex;

/// Normalized platform attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformAttributes {
    pub os_name: &'static str,
    pub platform: &'static str,
    pub architecture: &'static str,
}

macro_rules! entry {
    ($pattern:expr, $os:expr, $platform:expr, $arch:expr) => {
        (
            Regex::new($pattern).unwrap(),
            PlatformAttributes {
                os_name: $os,
                platform: $platform,
                architecture: $arch,
            },
        )
    };
}

static PLATFORMS: LazyLock<Vec<(Regex, PlatformAttributes)>> = LazyLock::new(|| {
    vec![
        entry!(
            r"(?i)^(mac|OS X).*(10\.10|yosemite)",
            "mac",
            "osx-10-10",
            "x86_64"
        ),
        entry!(
            r"(?i)^(mac|OS X).*(10\.9|mavericks)",
            "mac",
            "osx-10-9",
            "x86_64"
        ),
        entry!(
            r"(?i)^(mac|OS X).*(10\.8|mountain lion)",
            "mac",
            "osx-10-8",
            "x86_64"
        ),
        entry!(r"(?i)^(mac|OS X).*(10\.7|lion)", "mac", "osx-10-7", "x86_64"),
        entry!(
            r"(?i)^(mac|OS X).*(10\.6|snow[ ]?leopard)",
            "mac",
            "osx-10-6",
            "x86_64"
        ),
        entry!(
            r"(?i)^win(dows)?.*(5\.1|xp).*32",
            "win",
            "windowsxp",
            "x86"
        ),
        entry!(
            r"(?i)^win(dows)?.*(6\.2|8).*64",
            "win",
            "windows8-64",
            "x86_64"
        ),
        entry!(
            r"(?i)^win(dows)?.*(6\.2|8).*32",
            "win",
            "windows8-32",
            "x86"
        ),
        entry!(
            r"(?i)^win(dows)?.*(6\.1|7).*32",
            "win",
            "windows7-32",
            "x86"
        ),
        entry!(
            r"(?i)^win(dows)?.*(6\.1|7).*64",
            "win",
            "windows7-64",
            "x86_64"
        ),
        entry!(r"(?i)^(linux|ubuntu).*64", "linux", "linux64", "x86_64"),
        entry!(r"(?i)^(linux|ubuntu).*32", "linux", "linux32", "x86"),
    ]
});

/// Look up the normalized attributes for a platform description, if any
/// pattern recognizes it.
pub fn platform_attributes(description: &str) -> Option<PlatformAttributes> {
    PLATFORMS
        .iter()
        .find(|(pattern, _)| pattern.is_match(description))
        .map(|(_, attributes)| *attributes)
}
