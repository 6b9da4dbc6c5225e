use crate::error::{BuildError, BuildResult};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use tessera_types::SourcePackage;

/// External tools the driver hands its output to.
pub trait Toolchain {
    /// Links an executable. `args` is the complete argument list, output
    /// path included.
    fn link(&mut self, app: &Path, args: &[OsString]) -> BuildResult<()>;

    /// Runs a linked program with inherited stdio and returns its exit
    /// code, or `None` if it was killed by a signal.
    fn run(&mut self, app: &Path, args: &[String]) -> BuildResult<Option<i32>>;
}

/// Links with `clang`, which accepts textual IR directly.
#[derive(Debug, Clone)]
pub struct Clang {
    program: OsString,
}

impl Clang {
    pub fn new() -> Self {
        Clang { program: "clang".into() }
    }

    /// Uses another clang-compatible driver.
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Clang { program: program.into() }
    }
}

impl Default for Clang {
    fn default() -> Self {
        Self::new()
    }
}

impl Toolchain for Clang {
    fn link(&mut self, app: &Path, args: &[OsString]) -> BuildResult<()> {
        if let Some(dir) = app.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| BuildError::io(dir, source))?;
        }
        log::debug!("{} {:?}", self.program.to_string_lossy(), args);
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|err| BuildError::Link { app: app.to_path_buf(), message: err.to_string() })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BuildError::Link { app: app.to_path_buf(), message: stderr.trim().to_string() });
        }
        Ok(())
    }

    fn run(&mut self, app: &Path, args: &[String]) -> BuildResult<Option<i32>> {
        let status = Command::new(app)
            .args(args)
            .status()
            .map_err(|source| BuildError::Exec { app: app.to_path_buf(), source })?;
        Ok(status.code())
    }
}

/// Linker arguments for `app`: the IR file of every package in `closure`,
/// which must hold the program's full import closure.
pub fn link_args(app: &Path, closure: &[&SourcePackage]) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-o".into(), app.into(), "-Wno-override-module".into()];
    args.extend(closure.iter().filter(|pkg| !pkg.is_unsafe()).map(|pkg| pkg.ir_file().into_os_string()));
    args
}
