// Manifest trees and a toolchain that records instead of spawning.
#![allow(dead_code)]

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tessera_build::{BuildConfig, BuildError, BuildResult, Manifest, Mode, Toolchain, MANIFEST_FILE};
use tessera_layout::TargetData;
use tessera_ssa::{DebugConfig, Lazy, Program, SsaError};
use tessera_types::{SourcePackage, TypeTable};

pub const RUNTIME_MANIFEST: &str = r#"
path = "tessera/runtime"
name = "runtime"

[[types]]
name = "String"
underlying = "struct{data unsafe.Pointer; len int}"

[[types]]
name = "Interface"
underlying = "struct{tab unsafe.Pointer; data unsafe.Pointer}"

[[types]]
name = "Slice"
underlying = "struct{data unsafe.Pointer; len int; cap int}"

[[types]]
name = "Map"
underlying = "struct{h unsafe.Pointer}"

[[funcs]]
name = "PrintString"
sig = "func(string)"
"#;

pub const FOREIGN_MANIFEST: &str = r#"
path = "tessera/py"
name = "py"

[[types]]
name = "Object"
underlying = "struct{refcnt int; typ unsafe.Pointer}"
"#;

pub const GREET_MANIFEST: &str = r#"
path = "example.com/greet"
name = "greet"

[[funcs]]
name = "Greeting"
sig = "func() string"
body = [{ op = "return", values = [{ str = "hi" }] }]
"#;

pub const HELLO_MANIFEST: &str = r#"
path = "example.com/hello"
name = "main"
imports = ["example.com/greet", "unsafe"]

[[funcs]]
name = "main"
sig = "func()"
body = [
  { op = "call", dst = 0, callee = { func = { symbol = "example.com/greet.Greeting", sig = "func() string" } } },
  { op = "call", callee = { runtime = "PrintString" }, args = [{ value = 0 }] },
]
"#;

pub const PYUTIL_MANIFEST: &str = r#"
path = "example.com/pyutil"
name = "pyutil"

[[funcs]]
name = "Run"
sig = "func()"
body = [
  { op = "import_foreign_module", dst = 0, path = "os" },
  { op = "foreign_call", dst = 1, callee = { value = 0 }, sig = "func() *tessera/py.Object" },
]
"#;

pub const PYAPP_MANIFEST: &str = r#"
path = "example.com/pyapp"
name = "main"
imports = ["example.com/pyutil"]

[[funcs]]
name = "main"
sig = "func()"
body = [{ op = "call", callee = { func = { symbol = "example.com/pyutil.Run", sig = "func()" } } }]
"#;

pub fn target() -> TargetData {
    TargetData::parse("x86_64-unknown-linux-gnu").unwrap()
}

pub fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// Writes `text` as the manifest of directory `rel` under `root`.
pub fn write_manifest(root: &Path, rel: &str, text: &str) {
    let dir = root.join(rel);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(MANIFEST_FILE), text).unwrap();
}

/// Both support packages plus `greet` and the `hello` program.
pub fn hello_tree(root: &Path) {
    write_manifest(root, "support/runtime", RUNTIME_MANIFEST);
    write_manifest(root, "support/py", FOREIGN_MANIFEST);
    write_manifest(root, "greet", GREET_MANIFEST);
    write_manifest(root, "hello", HELLO_MANIFEST);
}

/// A configuration that links into `bin`.
pub fn config(mode: Mode, bin: &Path) -> BuildConfig {
    let bin = bin.to_string_lossy().into_owned();
    BuildConfig::with_env(mode, target(), move |key| (key == "TESSERA_BIN").then(|| bin.clone())).unwrap()
}

fn support(text: &'static str) -> Lazy<tessera_types::PackageTypes> {
    Lazy::pending(move |table: &mut TypeTable| {
        Manifest::parse(text, Path::new(MANIFEST_FILE))
            .and_then(|manifest| manifest.declare(table))
            .map_err(|err| SsaError::invariant(err.to_string()))
    })
}

/// A program with both support packages available.
pub fn program() -> Program {
    let mut prog = Program::new(target(), DebugConfig::default());
    prog.set_runtime(support(RUNTIME_MANIFEST));
    prog.set_foreign(support(FOREIGN_MANIFEST));
    prog
}

/// Parses a manifest into a package of `prog`'s type table.
pub fn package(prog: &mut Program, text: &str) -> SourcePackage {
    Manifest::parse(text, Path::new(MANIFEST_FILE))
        .unwrap()
        .to_package(Path::new("out"), prog.types_mut())
        .unwrap()
}

#[derive(Debug, Default)]
pub struct RecordingToolchain {
    pub links: Vec<(PathBuf, Vec<OsString>)>,
    pub runs: Vec<(PathBuf, Vec<String>)>,
    pub fail_link: bool,
}

impl Toolchain for RecordingToolchain {
    fn link(&mut self, app: &Path, args: &[OsString]) -> BuildResult<()> {
        if self.fail_link {
            return Err(BuildError::Link { app: app.to_path_buf(), message: "undefined symbol".to_string() });
        }
        self.links.push((app.to_path_buf(), args.to_vec()));
        Ok(())
    }

    fn run(&mut self, app: &Path, args: &[String]) -> BuildResult<Option<i32>> {
        self.runs.push((app.to_path_buf(), args.to_vec()));
        Ok(Some(0))
    }
}
