// src/package/builder.rs
//! Chaincode package builder
//!
//! Serializes a chaincode source tree into a single gzip-compressed tar.
//! Sources resolve under a deployment root as `<root>/src/<path>`, and are
//! archived under the same `src/<path>/` prefix.
//!
//! Output is reproducible: files are visited in sorted order and every
//! header carries a fixed mtime, zero ownership and a normalized mode, so
//! building an unchanged tree twice yields identical bytes (and therefore
//! the same payload hash in the registry).

use super::build_root::BuildRoot;
use super::{ChaincodePackage, PackageSource};
use crate::error::{Error, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Fixed modification time stamped on every archive entry (2024-01-01 00:00:00 UTC)
pub const PACKAGE_MTIME: u64 = 1704067200;

/// Builds installable packages from source paths or raw bytes
#[derive(Debug, Clone)]
pub struct PackageBuilder {
    root: PathBuf,
}

impl PackageBuilder {
    /// Create a builder resolving sources under `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a builder from the current value of a shared build root
    pub fn from_build_root(build_root: &BuildRoot) -> Result<Self> {
        build_root
            .current()
            .map(Self::new)
            .ok_or_else(|| Error::Packaging("no deployment root configured".to_string()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the source directory for a logical path
    ///
    /// An empty `explicit_spec` derives `<root>/src/<path>`. Otherwise the
    /// spec names the source directory itself, absolute or relative to the root.
    pub fn resolve_source_dir(&self, path: &str, explicit_spec: &str) -> Result<PathBuf> {
        if explicit_spec.is_empty() {
            let logical = validate_logical_path(path)?;
            Ok(self.root.join("src").join(logical))
        } else {
            let spec = Path::new(explicit_spec);
            if spec.is_absolute() {
                Ok(spec.to_path_buf())
            } else {
                Ok(self.root.join(spec))
            }
        }
    }

    /// Package the sources for `path`
    pub fn build_from_path(&self, path: &str, explicit_spec: &str) -> Result<ChaincodePackage> {
        let logical = validate_logical_path(path)?;
        let source_dir = self.resolve_source_dir(path, explicit_spec)?;

        if !source_dir.is_dir() {
            return Err(Error::Packaging(format!(
                "cannot resolve chaincode path {} (looked in {})",
                path,
                source_dir.display()
            )));
        }

        let files = collect_source_files(&source_dir)?;
        if files.is_empty() {
            return Err(Error::Packaging(format!(
                "no source files found for {} in {}",
                path,
                source_dir.display()
            )));
        }

        let prefix = Path::new("src").join(logical);
        let payload = write_archive(&source_dir, &prefix, &files)?;

        debug!(
            "Packaged {} from {} ({} files, {} bytes)",
            path,
            source_dir.display(),
            files.len(),
            payload.len()
        );

        Ok(ChaincodePackage {
            path: path.to_string(),
            payload,
            source: PackageSource::Path {
                source_dir,
                file_count: files.len(),
            },
        })
    }

    /// Wrap a caller-supplied payload
    pub fn build_from_bytes(payload: Vec<u8>) -> Result<ChaincodePackage> {
        if payload.is_empty() {
            return Err(Error::Packaging("chaincode package is empty".to_string()));
        }

        Ok(ChaincodePackage {
            path: String::new(),
            payload,
            source: PackageSource::Bytes,
        })
    }
}

/// Reject logical paths that are empty or could escape the deployment root
fn validate_logical_path(path: &str) -> Result<&Path> {
    if path.is_empty() {
        return Err(Error::Packaging("chaincode path is empty".to_string()));
    }

    let logical = Path::new(path);
    let escapes = logical
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(Error::Packaging(format!(
            "chaincode path must be relative to the deployment root: {path}"
        )));
    }

    Ok(logical)
}

/// Regular files under `source_dir`, sorted by path
///
/// Symlinks are followed and archived with their target's content; a
/// dangling link or a link cycle is a packaging error.
fn collect_source_files(source_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(source_dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            Error::Packaging(format!("failed to walk {}: {}", source_dir.display(), e))
        })?;

        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn write_archive(source_dir: &Path, prefix: &Path, files: &[PathBuf]) -> Result<Vec<u8>> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut archive = tar::Builder::new(encoder);

    for file in files {
        let relative = file
            .strip_prefix(source_dir)
            .map_err(|_| Error::Packaging(format!("{} not under source directory", file.display())))?;
        let content = fs::read(file)
            .map_err(|e| Error::Packaging(format!("failed to read {}: {}", file.display(), e)))?;

        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_mode(normalized_mode(file)?);
        header.set_size(content.len() as u64);
        header.set_mtime(PACKAGE_MTIME);
        header.set_uid(0);
        header.set_gid(0);

        archive
            .append_data(&mut header, prefix.join(relative), content.as_slice())
            .map_err(|e| Error::Packaging(format!("failed to archive {}: {}", file.display(), e)))?;
    }

    let encoder = archive
        .into_inner()
        .map_err(|e| Error::Packaging(format!("failed to finish archive: {e}")))?;
    encoder
        .finish()
        .map_err(|e| Error::Packaging(format!("failed to compress archive: {e}")))
}

/// 0o755 for anything executable, 0o644 otherwise
#[cfg(unix)]
fn normalized_mode(file: &Path) -> Result<u32> {
    use std::os::unix::fs::PermissionsExt;

    let mode = fs::metadata(file)
        .map_err(|e| Error::Packaging(format!("failed to stat {}: {}", file.display(), e)))?
        .permissions()
        .mode();
    Ok(if mode & 0o111 != 0 { 0o755 } else { 0o644 })
}

#[cfg(not(unix))]
fn normalized_mode(_file: &Path) -> Result<u32> {
    Ok(0o644)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::TempDir;

    fn write_source(root: &Path, path: &str, files: &[(&str, &str)]) {
        let dir = root.join("src").join(path);
        for (name, content) in files {
            let file = dir.join(name);
            fs::create_dir_all(file.parent().unwrap()).unwrap();
            fs::write(file, content).unwrap();
        }
    }

    fn entry_names(payload: &[u8]) -> Vec<String> {
        let mut archive = tar::Archive::new(GzDecoder::new(payload));
        archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_build_from_path() {
        let temp_dir = TempDir::new().unwrap();
        write_source(
            temp_dir.path(),
            "github.com/example_cc",
            &[("example_cc.go", "package main"), ("lib/util.go", "package lib")],
        );

        let builder = PackageBuilder::new(temp_dir.path());
        let package = builder.build_from_path("github.com/example_cc", "").unwrap();

        assert_eq!(package.path, "github.com/example_cc");
        assert!(matches!(package.source, PackageSource::Path { file_count: 2, .. }));
        assert_eq!(
            entry_names(package.payload()),
            vec![
                "src/github.com/example_cc/example_cc.go",
                "src/github.com/example_cc/lib/util.go",
            ]
        );
    }

    #[test]
    fn test_build_is_reproducible() {
        let temp_dir = TempDir::new().unwrap();
        write_source(temp_dir.path(), "cc", &[("main.go", "package main")]);

        let builder = PackageBuilder::new(temp_dir.path());
        let first = builder.build_from_path("cc", "").unwrap();

        // Touching the file must not change the package
        fs::write(temp_dir.path().join("src/cc/main.go"), "package main").unwrap();
        let second = builder.build_from_path("cc", "").unwrap();

        assert_eq!(first.payload, second.payload);
    }

    #[test]
    fn test_archive_content_matches_source() {
        let temp_dir = TempDir::new().unwrap();
        write_source(temp_dir.path(), "cc", &[("main.go", "package main\n")]);

        let package = PackageBuilder::new(temp_dir.path())
            .build_from_path("cc", "")
            .unwrap();

        let mut archive = tar::Archive::new(GzDecoder::new(package.payload()));
        let mut entry = archive.entries().unwrap().next().unwrap().unwrap();
        assert_eq!(entry.header().mtime().unwrap(), PACKAGE_MTIME);
        assert_eq!(entry.header().mode().unwrap(), 0o644);

        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, "package main\n");
    }

    #[test]
    fn test_explicit_spec_overrides_resolution() {
        let temp_dir = TempDir::new().unwrap();
        let elsewhere = temp_dir.path().join("checkout");
        fs::create_dir_all(&elsewhere).unwrap();
        fs::write(elsewhere.join("cc.go"), "package main").unwrap();

        let builder = PackageBuilder::new(temp_dir.path().join("gopath"));
        let package = builder
            .build_from_path("github.com/example_cc", elsewhere.to_str().unwrap())
            .unwrap();

        assert_eq!(
            entry_names(package.payload()),
            vec!["src/github.com/example_cc/cc.go"]
        );
    }

    #[test]
    fn test_missing_path_is_packaging_error() {
        let temp_dir = TempDir::new().unwrap();
        let builder = PackageBuilder::new(temp_dir.path());

        let err = builder.build_from_path("github.com/missing", "").unwrap_err();
        assert!(err.is_packaging());
    }

    #[test]
    fn test_empty_source_is_packaging_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("src/empty_cc/sub")).unwrap();

        let err = PackageBuilder::new(temp_dir.path())
            .build_from_path("empty_cc", "")
            .unwrap_err();
        assert!(err.is_packaging());
    }

    #[test]
    fn test_escaping_path_rejected() {
        let builder = PackageBuilder::new("/opt/gopath");

        assert!(builder.build_from_path("../etc", "").unwrap_err().is_packaging());
        assert!(builder.build_from_path("/etc", "").unwrap_err().is_packaging());
        assert!(builder.build_from_path("", "").unwrap_err().is_packaging());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_sources_are_archived() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        write_source(temp_dir.path(), "linkcc", &[("main.go", "package main")]);
        fs::write(src.join("shared.go"), "package shared").unwrap();
        std::os::unix::fs::symlink("../shared.go", src.join("linkcc/helper.go")).unwrap();

        let package = PackageBuilder::new(temp_dir.path())
            .build_from_path("linkcc", "")
            .unwrap();

        assert_eq!(
            entry_names(package.payload()),
            vec!["src/linkcc/helper.go", "src/linkcc/main.go"]
        );

        let mut archive = tar::Archive::new(GzDecoder::new(package.payload()));
        let mut helper = archive.entries().unwrap().next().unwrap().unwrap();
        assert_eq!(helper.header().entry_type(), tar::EntryType::Regular);
        let mut content = String::new();
        helper.read_to_string(&mut content).unwrap();
        assert_eq!(content, "package shared");
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_packaging_error() {
        let temp_dir = TempDir::new().unwrap();
        write_source(temp_dir.path(), "brokencc", &[("main.go", "package main")]);
        std::os::unix::fs::symlink(
            "missing.go",
            temp_dir.path().join("src/brokencc/helper.go"),
        )
        .unwrap();

        let err = PackageBuilder::new(temp_dir.path())
            .build_from_path("brokencc", "")
            .unwrap_err();
        assert!(err.is_packaging());
    }

    fn build_redirected(root: &BuildRoot, dir: &Path, path: &str) -> Result<ChaincodePackage> {
        let _guard = root.redirect(dir);
        PackageBuilder::from_build_root(root)?.build_from_path(path, "")
    }

    #[test]
    fn test_failed_build_restores_build_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = BuildRoot::new("/opt/gopath");

        let err = build_redirected(&root, temp_dir.path(), "github.com/missing").unwrap_err();
        assert!(err.is_packaging());
        assert_eq!(root.current(), Some(PathBuf::from("/opt/gopath")));

        // A later build through the same root still succeeds
        write_source(temp_dir.path(), "cc", &[("main.go", "package main")]);
        build_redirected(&root, temp_dir.path(), "cc").unwrap();
        assert_eq!(root.current(), Some(PathBuf::from("/opt/gopath")));
    }

    #[test]
    fn test_build_from_bytes() {
        let package = PackageBuilder::build_from_bytes(b"prebuilt".to_vec()).unwrap();
        assert_eq!(package.source, PackageSource::Bytes);
        assert_eq!(package.payload(), b"prebuilt");

        let err = PackageBuilder::build_from_bytes(Vec::new()).unwrap_err();
        assert!(err.is_packaging());
    }

    #[test]
    fn test_from_build_root() {
        let root = BuildRoot::empty();
        assert!(PackageBuilder::from_build_root(&root).unwrap_err().is_packaging());

        let guard = root.redirect("/opt/deploy");
        let builder = PackageBuilder::from_build_root(&root).unwrap();
        drop(guard);

        assert_eq!(builder.root(), Path::new("/opt/deploy"));
    }
}
