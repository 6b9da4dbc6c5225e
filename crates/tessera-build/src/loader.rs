use crate::args::ParsedArgs;
use crate::error::{BuildError, BuildResult};
use crate::graph::PackageGraph;
use crate::manifest::{Manifest, MANIFEST_FILE};
use indexmap::IndexMap;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tessera_ssa::{Lazy, SsaError};
use tessera_types::{PackageTypes, SourcePackage, TypeTable, UNSAFE_PACKAGE};

/// Import path of the runtime support package.
pub const RUNTIME_PACKAGE: &str = "tessera/runtime";
/// Import path of the foreign object support package.
pub const FOREIGN_PACKAGE: &str = "tessera/py";

/// Produces type-checked packages for the driver.
pub trait PackageLoader {
    /// Loads the packages matched by the patterns in `args` and everything
    /// they import. Matched packages become the graph's roots.
    fn load(&mut self, types: &mut TypeTable, args: &ParsedArgs) -> BuildResult<PackageGraph>;

    /// The runtime support package, produced on first use.
    fn runtime(&self) -> Lazy<PackageTypes>;

    /// The foreign object support package, produced on first use.
    fn foreign(&self) -> Lazy<PackageTypes>;
}

/// Loads packages from `tessera.pkg.toml` manifests under a root directory.
///
/// Patterns are directories relative to the root (`.` is the root itself,
/// `dir/...` everything below `dir`) or import paths.
#[derive(Debug, Clone)]
pub struct ManifestLoader {
    root: PathBuf,
    /// Import path to manifest directory and contents.
    index: IndexMap<String, (PathBuf, Manifest)>,
}

impl ManifestLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ManifestLoader { root: root.into(), index: IndexMap::new() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads every manifest below `root`.
    fn scan(root: &Path) -> BuildResult<IndexMap<String, (PathBuf, Manifest)>> {
        let mut index: IndexMap<String, (PathBuf, Manifest)> = IndexMap::new();
        let mut dirs = vec![root.to_path_buf()];
        while let Some(dir) = dirs.pop() {
            let manifest_path = dir.join(MANIFEST_FILE);
            if manifest_path.is_file() {
                let manifest = Manifest::read(&manifest_path)?;
                if let Some((other, _)) = index.get(&manifest.path) {
                    return Err(BuildError::load(format!(
                        "package {} is declared in both {} and {}",
                        manifest.path,
                        other.display(),
                        dir.display()
                    )));
                }
                index.insert(manifest.path.clone(), (dir.clone(), manifest));
            }
            let entries = std::fs::read_dir(&dir).map_err(|source| BuildError::io(&dir, source))?;
            let mut children = Vec::new();
            for entry in entries {
                let entry = entry.map_err(|source| BuildError::io(&dir, source))?;
                let path = entry.path();
                let hidden = entry.file_name().to_string_lossy().starts_with('.');
                if path.is_dir() && !hidden {
                    children.push(path);
                }
            }
            // Deterministic order regardless of the file system.
            children.sort();
            dirs.extend(children.into_iter().rev());
        }
        Ok(index)
    }

    fn matches(&self, pattern: &str) -> BuildResult<Vec<String>> {
        if let Some(prefix) = pattern.strip_suffix("...") {
            let base = self.root.join(prefix.trim_end_matches('/'));
            let matched = self
                .index
                .iter()
                .filter(|(_, (dir, _))| dir.starts_with(&base))
                .map(|(path, _)| path.clone())
                .collect::<Vec<_>>();
            if matched.is_empty() {
                return Err(BuildError::load(format!("no packages match pattern `{}`", pattern)));
            }
            return Ok(matched);
        }
        let dir = self.root.join(pattern);
        if let Some((path, _)) = self.index.iter().find(|(_, (pkg_dir, _))| same_dir(pkg_dir, &dir)) {
            return Ok(vec![path.clone()]);
        }
        if self.index.contains_key(pattern) {
            return Ok(vec![pattern.to_string()]);
        }
        Err(BuildError::load(format!("no package matches pattern `{}`", pattern)))
    }

    fn support_package(&self, path: &str) -> Lazy<PackageTypes> {
        match self.index.get(path) {
            Some((_, manifest)) => {
                let manifest = manifest.clone();
                Lazy::pending(move |table: &mut TypeTable| {
                    log::debug!("loading support package {}", manifest.path);
                    manifest
                        .declare(table)
                        .map_err(|err| SsaError::invariant(format!("support package {}: {}", manifest.path, err)))
                })
            }
            None => Lazy::Empty,
        }
    }
}

impl PackageLoader for ManifestLoader {
    fn load(&mut self, types: &mut TypeTable, args: &ParsedArgs) -> BuildResult<PackageGraph> {
        if let Some(dir) = args.flag_value("-C") {
            self.root = self.root.join(dir);
        }
        self.index = Self::scan(&self.root)?;
        log::info!("found {} package manifests under {}", self.index.len(), self.root.display());

        let mut graph = PackageGraph::new();
        let mut queue = VecDeque::new();
        for pattern in args.patterns_or_default() {
            for path in self.matches(&pattern)? {
                graph.add_root(&path);
                queue.push_back(path);
            }
        }
        while let Some(path) = queue.pop_front() {
            if graph.contains(&path) {
                continue;
            }
            let pkg = if path == UNSAFE_PACKAGE {
                SourcePackage::new(PackageTypes::new(UNSAFE_PACKAGE, UNSAFE_PACKAGE), PathBuf::new())
            } else {
                let (dir, manifest) = self
                    .index
                    .get(&path)
                    .ok_or_else(|| BuildError::load(format!("cannot find package {}", path)))?;
                manifest.to_package(dir, types)?
            };
            queue.extend(pkg.imports.iter().filter(|import| !graph.contains(import)).cloned());
            graph.insert(pkg);
        }
        Ok(graph)
    }

    fn runtime(&self) -> Lazy<PackageTypes> {
        self.support_package(RUNTIME_PACKAGE)
    }

    fn foreign(&self) -> Lazy<PackageTypes> {
        self.support_package(FOREIGN_PACKAGE)
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    a.components().eq(b.components())
}
