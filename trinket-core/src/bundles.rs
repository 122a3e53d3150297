//! Bundle resolution - mapping glob descriptors to files on disk

use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use wax::{CandidatePath, Glob, Pattern};

use crate::config::BundleDescriptor;
use crate::error::LoaderError;

/// Files resolved for one bundle, relative to the working directory
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBundle {
    /// Bundle name (the default bundle name for a single-pattern descriptor)
    pub name: String,
    /// Matching files, relative to the working directory, in match order
    pub files: Vec<PathBuf>,
}

/// Maps a bundle descriptor to the files it matches under a working
/// directory.
///
/// The loader depends on this seam rather than a concrete glob engine, so
/// tests and embedders can supply their own file discovery.
pub trait BundleResolver: Send + Sync {
    /// Resolve every bundle in the descriptor. For a `Single` descriptor
    /// the one returned bundle carries `default_bundle_name`. Returned
    /// order is the load order.
    fn resolve(
        &self,
        cwd: &Path,
        descriptor: &BundleDescriptor,
        default_bundle_name: &str,
    ) -> Result<Vec<ResolvedBundle>, LoaderError>;
}

/// Glob-backed resolver walking the working directory.
///
/// Files are walked in sorted order and matched against each pattern with
/// forward-slash-normalized relative paths, so resolution order is
/// deterministic across platforms.
#[derive(Debug, Default)]
pub struct GlobResolver;

impl GlobResolver {
    pub fn new() -> Self {
        Self
    }

    fn walk_files(cwd: &Path) -> Result<Vec<String>, LoaderError> {
        if !cwd.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(cwd).sort_by_file_name() {
            let entry = entry.map_err(|e| LoaderError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(cwd) else {
                continue;
            };
            // Normalize to forward slashes for platform-independent matching
            files.push(rel.to_string_lossy().replace('\\', "/"));
        }
        Ok(files)
    }

    /// Match patterns in order against the walked file list. Matches are
    /// concatenated per pattern; a file matching twice keeps its first
    /// position.
    fn match_patterns(patterns: &[String], files: &[String]) -> Result<Vec<PathBuf>, LoaderError> {
        let mut matched = Vec::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| LoaderError::Discovery {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            for file in files {
                let candidate = CandidatePath::from(file.as_str());
                if glob.matched(&candidate).is_some() {
                    let path = PathBuf::from(file);
                    if !matched.contains(&path) {
                        matched.push(path);
                    }
                }
            }
        }
        Ok(matched)
    }
}

impl BundleResolver for GlobResolver {
    fn resolve(
        &self,
        cwd: &Path,
        descriptor: &BundleDescriptor,
        default_bundle_name: &str,
    ) -> Result<Vec<ResolvedBundle>, LoaderError> {
        let files = Self::walk_files(cwd)?;

        let mut resolved = Vec::new();
        match descriptor {
            BundleDescriptor::Single(pattern) => {
                resolved.push(ResolvedBundle {
                    name: default_bundle_name.to_string(),
                    files: Self::match_patterns(std::slice::from_ref(pattern), &files)?,
                });
            }
            BundleDescriptor::Named(bundles) => {
                for (name, patterns) in bundles {
                    resolved.push(ResolvedBundle {
                        name: name.clone(),
                        files: Self::match_patterns(patterns.as_slice(), &files)?,
                    });
                }
            }
        }
        Ok(resolved)
    }
}

/// Fixed, in-memory resolver for tests and embedders that know their
/// files up front
#[derive(Debug, Default)]
pub struct StaticResolver {
    bundles: Vec<ResolvedBundle>,
}

impl StaticResolver {
    pub fn new(bundles: Vec<ResolvedBundle>) -> Self {
        Self { bundles }
    }
}

impl BundleResolver for StaticResolver {
    fn resolve(
        &self,
        _cwd: &Path,
        _descriptor: &BundleDescriptor,
        _default_bundle_name: &str,
    ) -> Result<Vec<ResolvedBundle>, LoaderError> {
        Ok(self.bundles.clone())
    }
}

/// Restrict a resolved listing to one bundle.
///
/// An unknown bundle name yields an empty listing, not an error.
pub fn filter_bundles(resolved: Vec<ResolvedBundle>, bundle: Option<&str>) -> Vec<ResolvedBundle> {
    match bundle {
        Some(name) => resolved.into_iter().filter(|b| b.name == name).collect(),
        None => resolved,
    }
}
