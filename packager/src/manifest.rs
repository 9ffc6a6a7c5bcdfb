//! Release manifest swapping.

use crate::config::LayoutConfig;
use crate::error::{PackagerError, Result};
use crate::package_type::PackageType;
use camino::Utf8Path;
use std::fs;

/// Overwrites the primary manifest with the release template for release
/// builds. Other package types leave the manifest untouched.
///
/// Returns `true` when the manifest was overwritten. The caller is expected
/// to hold a [`crate::restore::RestoreGuard`] covering the manifest.
///
/// # Errors
///
/// Returns [`PackagerError::ManifestSwap`] if the template cannot be read or
/// the manifest cannot be written.
pub fn apply_release_manifest(
    project_root: &Utf8Path,
    layout: &LayoutConfig,
    package_type: PackageType,
) -> Result<bool> {
    if !package_type.uses_release_manifest() {
        return Ok(false);
    }

    let template = project_root.join(&layout.release_manifest);
    let manifest = project_root.join(&layout.manifest);
    let swap_error = |source| PackagerError::ManifestSwap {
        template: template.clone(),
        manifest: manifest.clone(),
        source,
    };

    let contents = fs::read(&template).map_err(swap_error)?;
    fs::write(&manifest, contents).map_err(swap_error)?;
    log::debug!("copied {template} over {manifest}");

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{COMMITTED_MANIFEST, FakeProject, RELEASE_MANIFEST};
    use rstest::rstest;

    #[test]
    fn release_overwrites_manifest_with_template() {
        let project = FakeProject::new();

        let swapped =
            apply_release_manifest(project.root(), &LayoutConfig::default(), PackageType::Release)
                .expect("swap succeeds");

        assert!(swapped);
        assert_eq!(project.read("pyproject.toml"), RELEASE_MANIFEST);
        assert_eq!(project.read("pyproject.release.toml"), RELEASE_MANIFEST);
    }

    #[rstest]
    #[case::dev(PackageType::Dev)]
    #[case::skinny(PackageType::Skinny)]
    fn other_variants_leave_manifest_alone(#[case] package_type: PackageType) {
        let project = FakeProject::new();

        let swapped = apply_release_manifest(project.root(), &LayoutConfig::default(), package_type)
            .expect("no-op succeeds");

        assert!(!swapped);
        assert_eq!(project.read("pyproject.toml"), COMMITTED_MANIFEST);
    }

    #[test]
    fn missing_template_is_reported() {
        let project = FakeProject::new();
        std::fs::remove_file(project.root().join("pyproject.release.toml")).expect("remove template");

        let err =
            apply_release_manifest(project.root(), &LayoutConfig::default(), PackageType::Release)
                .expect_err("missing template must fail");

        assert!(matches!(err, PackagerError::ManifestSwap { ref template, .. }
            if template.ends_with("pyproject.release.toml")));
        assert_eq!(project.read("pyproject.toml"), COMMITTED_MANIFEST);
    }
}
