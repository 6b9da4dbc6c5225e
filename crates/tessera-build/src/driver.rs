use crate::args::{parse_args, ParsedArgs};
use crate::config::BuildConfig;
use crate::error::BuildResult;
use crate::graph::PackageGraph;
use crate::link::{link_args, Toolchain};
use crate::loader::PackageLoader;
use crate::lower::lower_package;
use crate::mode::Mode;
use fxhash::FxHashSet;
use std::path::PathBuf;
use tessera_ssa::{DebugConfig, Program};

/// What one build run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// The effective mode after promotion.
    pub mode: Mode,
    /// Lowered packages, dependencies first.
    pub lowered: Vec<String>,
    /// Ill-typed packages that were not lowered.
    pub skipped: Vec<String>,
    pub ir_files: Vec<PathBuf>,
    pub executables: Vec<PathBuf>,
    /// Exit codes of the programs run, in link order.
    pub runs: Vec<(PathBuf, Option<i32>)>,
}

impl BuildReport {
    fn new(mode: Mode) -> Self {
        BuildReport {
            mode,
            lowered: Vec::new(),
            skipped: Vec::new(),
            ir_files: Vec::new(),
            executables: Vec::new(),
            runs: Vec::new(),
        }
    }
}

/// Drives a build: load, lower in dependency order, emit IR, link and run.
pub struct Driver<L, T> {
    loader: L,
    toolchain: T,
    config: BuildConfig,
}

impl<L: PackageLoader, T: Toolchain> Driver<L, T> {
    pub fn new(loader: L, toolchain: T, config: BuildConfig) -> Self {
        Driver { loader, toolchain, config }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    /// Builds the packages named by `args` (flags, then patterns).
    pub fn build(&mut self, args: &[String]) -> BuildResult<BuildReport> {
        let args = parse_args(args)?;
        let mut prog = Program::new(self.config.target.clone(), DebugConfig { instructions: args.verbose });
        let graph = self.loader.load(prog.types_mut(), &args)?;
        prog.set_runtime(self.loader.runtime());
        prog.set_foreign(self.loader.foreign());

        let mode = self.config.mode.resolve(graph.roots().len());
        log::info!("{}: {} packages, {} roots", mode, graph.len(), graph.roots().len());
        let mut report = BuildReport::new(mode);
        // Packages that call into the foreign runtime, directly or through an import.
        let mut foreign_users = FxHashSet::default();

        for pkg in graph.visit(graph.roots())? {
            if pkg.is_unsafe() {
                continue;
            }
            if pkg.ill_typed {
                log::warn!("cannot build SSA for package {}", pkg.path());
                report.skipped.push(pkg.path().to_string());
                continue;
            }
            if args.verbose {
                eprintln!("{}", pkg.path());
            }
            let imports_use_foreign = pkg.imports.iter().any(|path| foreign_users.contains(path.as_str()));
            let lowered = lower_package(&mut prog, pkg, imports_use_foreign)?;
            if imports_use_foreign || lowered.prog().needs_foreign_init() {
                log::debug!("package {} needs the foreign runtime", pkg.path());
                foreign_users.insert(pkg.path());
            }
            if mode.needs_ll_file() {
                let file = pkg.ir_file();
                lowered.write_ir(&file)?;
                report.ir_files.push(file);
            }
            report.lowered.push(pkg.path().to_string());
        }

        if mode != Mode::Build {
            self.link_roots(&graph, &args, &mut report)?;
        }
        Ok(report)
    }

    fn link_roots(&mut self, graph: &PackageGraph, args: &ParsedArgs, report: &mut BuildReport) -> BuildResult<()> {
        for root in graph.roots() {
            let closure = graph.visit(std::slice::from_ref(root))?;
            let Some(pkg) = closure.last().filter(|pkg| pkg.is_main()) else {
                continue;
            };
            if let Some(bad) = closure.iter().find(|pkg| pkg.ill_typed) {
                log::warn!("not linking {}: package {} was not built", pkg.path(), bad.path());
                continue;
            }

            let app = self.config.output_path(pkg.path());
            if args.verbose {
                eprintln!("# {}", pkg.path());
            }
            self.toolchain.link(&app, &link_args(&app, &closure))?;
            report.executables.push(app.clone());

            if report.mode == Mode::Run {
                let code = self.toolchain.run(&app, &self.config.run_args)?;
                report.runs.push((app, code));
            }
        }
        Ok(())
    }
}
