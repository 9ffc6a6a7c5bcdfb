//! Build variants supported by the packager.

use clap::ValueEnum;
use std::fmt;

/// The kind of distribution to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum PackageType {
    /// Reduced-dependency package built from the skinny subdirectory.
    Skinny,
    /// Full package built with the release manifest swapped in.
    Release,
    /// Full package built from the manifest as committed.
    #[default]
    Dev,
}

impl PackageType {
    /// Return the lowercase name used on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skinny => "skinny",
            Self::Release => "release",
            Self::Dev => "dev",
        }
    }

    /// Returns `true` when the build runs from the skinny subdirectory.
    #[must_use]
    pub const fn is_skinny(self) -> bool {
        matches!(self, Self::Skinny)
    }

    /// Returns `true` when the release manifest replaces the primary one.
    #[must_use]
    pub const fn uses_release_manifest(self) -> bool {
        matches!(self, Self::Release)
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_is_dev() {
        assert_eq!(PackageType::default(), PackageType::Dev);
    }

    #[rstest]
    #[case::skinny(PackageType::Skinny, true, false)]
    #[case::release(PackageType::Release, false, true)]
    #[case::dev(PackageType::Dev, false, false)]
    fn variant_flags(
        #[case] package_type: PackageType,
        #[case] skinny: bool,
        #[case] release_manifest: bool,
    ) {
        assert_eq!(package_type.is_skinny(), skinny);
        assert_eq!(package_type.uses_release_manifest(), release_manifest);
    }

    #[test]
    fn display_matches_cli_value() {
        for variant in PackageType::value_variants() {
            let value = variant
                .to_possible_value()
                .expect("variants are not skipped");
            assert_eq!(value.get_name(), variant.to_string());
        }
    }
}
