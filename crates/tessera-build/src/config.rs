use crate::error::{BuildError, BuildResult};
use crate::mode::Mode;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tessera_layout::TargetData;

/// Name of the optional project configuration file.
pub const CONFIG_FILE: &str = "tessera.toml";

/// Settings of one build run.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Where linked programs are written.
    pub bin_path: PathBuf,
    /// Suffix of linked programs: `.exe` on Windows targets, else empty.
    pub app_ext: String,
    /// Explicit output file; overrides `bin_path` when set.
    pub out_file: Option<PathBuf>,
    /// Arguments passed to the program in run mode.
    pub run_args: Vec<String>,
    pub mode: Mode,
    pub target: TargetData,
}

/// `tessera.toml` contents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub build: BuildSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    pub bin: Option<PathBuf>,
    pub target: Option<String>,
}

impl BuildConfig {
    /// Configuration for the host, with the bin directory taken from the
    /// environment.
    pub fn new(mode: Mode) -> BuildResult<Self> {
        Self::with_env(mode, TargetData::host()?, |key| std::env::var(key).ok())
    }

    /// Like [`BuildConfig::new`] for an explicit target and environment.
    ///
    /// The bin directory is `TESSERA_BIN`, else `$TESSERA_ROOT/bin`, else
    /// `./bin`.
    pub fn with_env(mode: Mode, target: TargetData, env: impl Fn(&str) -> Option<String>) -> BuildResult<Self> {
        let bin_path = match env("TESSERA_BIN").filter(|bin| !bin.is_empty()) {
            Some(bin) => PathBuf::from(bin),
            None => match env("TESSERA_ROOT").filter(|root| !root.is_empty()) {
                Some(root) => Path::new(&root).join("bin"),
                None => PathBuf::from("bin"),
            },
        };
        Ok(BuildConfig {
            bin_path,
            app_ext: target.exe_suffix().to_string(),
            out_file: None,
            run_args: Vec::new(),
            mode,
            target,
        })
    }

    /// Applies overrides from a configuration file, if it exists.
    pub fn load(mut self, path: &Path) -> BuildResult<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(self),
            Err(source) => return Err(BuildError::io(path, source)),
        };
        let file: ConfigFile = toml::from_str(&text)
            .map_err(|err| BuildError::Config { path: path.to_path_buf(), message: err.message().to_string() })?;
        if let Some(target) = file.build.target {
            self.target = TargetData::parse(&target)?;
            self.app_ext = self.target.exe_suffix().to_string();
        }
        if let Some(bin) = file.build.bin {
            // Relative to the file that names it.
            self.bin_path = match path.parent() {
                Some(dir) if bin.is_relative() => dir.join(bin),
                _ => bin,
            };
        }
        Ok(self)
    }

    /// Where the program of package `pkg_path` is linked to.
    pub fn output_path(&self, pkg_path: &str) -> PathBuf {
        if let Some(out) = &self.out_file {
            return out.clone();
        }
        let trimmed = pkg_path.trim_end_matches('/');
        let base = trimmed.rsplit('/').next().unwrap_or(trimmed);
        self.bin_path.join(format!("{}{}", base, self.app_ext))
    }
}
