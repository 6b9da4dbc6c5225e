use std::fmt;

/// What a build run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Lower every package; write and link nothing.
    #[default]
    Build,
    /// Write IR files and link each `main` root into the bin directory.
    Install,
    /// Like `Install`, then execute the linked program.
    Run,
}

impl Mode {
    /// Whether IR files are written in this mode.
    pub fn needs_ll_file(self) -> bool {
        self != Mode::Build
    }

    /// The effective mode for a run that loaded `roots` root packages.
    /// Building a single package installs it.
    pub fn resolve(self, roots: usize) -> Mode {
        match self {
            Mode::Build if roots == 1 => Mode::Install,
            mode => mode,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Build => "build",
            Mode::Install => "install",
            Mode::Run => "run",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_root_build_installs() {
        assert_eq!(Mode::Build.resolve(1), Mode::Install);
        assert_eq!(Mode::Build.resolve(2), Mode::Build);
        assert_eq!(Mode::Build.resolve(0), Mode::Build);
        assert_eq!(Mode::Run.resolve(1), Mode::Run);
        assert_eq!(Mode::Install.resolve(3), Mode::Install);
    }

    #[test]
    fn test_ll_files_only_outside_build() {
        assert!(!Mode::Build.needs_ll_file());
        assert!(Mode::Install.needs_ll_file());
        assert!(Mode::Run.needs_ll_file());
    }
}
