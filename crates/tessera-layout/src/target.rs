use crate::LayoutError;
use std::fmt;
use std::str::FromStr;
use target_lexicon::{OperatingSystem, PointerWidth, Triple};

/// The opaque target descriptor: a triple plus what is derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetData {
    triple: Triple,
    pointer_width: PointerWidth,
    datalayout: Option<String>,
}

impl TargetData {
    pub fn new(triple: Triple) -> Result<Self, LayoutError> {
        let pointer_width = triple
            .pointer_width()
            .map_err(|()| LayoutError::UnsupportedTarget(triple.to_string()))?;
        Ok(TargetData { triple, pointer_width, datalayout: None })
    }

    pub fn host() -> Result<Self, LayoutError> {
        Self::new(Triple::host())
    }

    pub fn parse(triple: &str) -> Result<Self, LayoutError> {
        let triple = Triple::from_str(triple).map_err(|_| LayoutError::UnsupportedTarget(triple.to_string()))?;
        Self::new(triple)
    }

    /// Sets the datalayout string written into emitted modules. Without one
    /// the toolchain's default for the triple applies.
    pub fn with_datalayout(mut self, datalayout: impl Into<String>) -> Self {
        self.datalayout = Some(datalayout.into());
        self
    }

    pub fn triple(&self) -> &Triple {
        &self.triple
    }

    pub fn datalayout(&self) -> Option<&str> {
        self.datalayout.as_deref()
    }

    pub fn pointer_bits(&self) -> u32 {
        u32::from(self.pointer_width.bits())
    }

    pub fn pointer_bytes(&self) -> u64 {
        u64::from(self.pointer_width.bytes())
    }

    pub fn is_windows(&self) -> bool {
        self.triple.operating_system == OperatingSystem::Windows
    }

    /// File name suffix of linked executables.
    pub fn exe_suffix(&self) -> &'static str {
        if self.is_windows() {
            ".exe"
        } else {
            ""
        }
    }
}

impl fmt::Display for TargetData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.triple)
    }
}
