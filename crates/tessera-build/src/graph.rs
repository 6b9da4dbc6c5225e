use crate::error::{BuildError, BuildResult};
use fxhash::FxHashSet;
use indexmap::IndexMap;
use tessera_types::SourcePackage;

/// Loaded packages keyed by import path, with the roots named on the command
/// line.
#[derive(Debug, Clone, Default)]
pub struct PackageGraph {
    roots: Vec<String>,
    packages: IndexMap<String, SourcePackage>,
}

impl PackageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pkg: SourcePackage) {
        self.packages.insert(pkg.path().to_string(), pkg);
    }

    /// Marks a loaded package as a root. Roots keep their first-seen order.
    pub fn add_root(&mut self, path: &str) {
        if !self.roots.iter().any(|root| root == path) {
            self.roots.push(path.to_string());
        }
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn get(&self, path: &str) -> Option<&SourcePackage> {
        self.packages.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.packages.contains_key(path)
    }

    pub fn packages(&self) -> impl Iterator<Item = &SourcePackage> {
        self.packages.values()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// `from` and everything it imports, dependencies before dependents,
    /// each package once.
    pub fn visit<'g>(&'g self, from: &[String]) -> BuildResult<Vec<&'g SourcePackage>> {
        let mut seen = FxHashSet::default();
        let mut order = Vec::with_capacity(self.packages.len());
        for root in from {
            self.visit_one(root, &mut seen, &mut order)?;
        }
        Ok(order)
    }

    fn visit_one<'g>(
        &'g self,
        path: &str,
        seen: &mut FxHashSet<&'g str>,
        order: &mut Vec<&'g SourcePackage>,
    ) -> BuildResult<()> {
        let pkg = self
            .packages
            .get(path)
            .ok_or_else(|| BuildError::load(format!("package {} is not loaded", path)))?;
        if !seen.insert(pkg.path()) {
            return Ok(());
        }
        for import in &pkg.imports {
            self.visit_one(import, seen, order)?;
        }
        order.push(pkg);
        Ok(())
    }
}
