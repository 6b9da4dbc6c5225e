//! Build flag parsing.
//!
//! Flags come first and patterns after: the first argument that does not
//! start with `-` ends the flags, and everything from there on is a pattern.
//! Only whitelisted flags are accepted. Flags that take a value consume the
//! following argument.

use crate::error::{BuildError, BuildResult};

/// Accepted flags and whether each takes a value.
pub const BUILD_FLAGS: &[(&str, bool)] = &[
    ("-C", true),
    ("-a", false),
    ("-n", false),
    ("-p", true),
    ("-race", false),
    ("-cover", false),
    ("-covermode", true),
    ("-v", false),
    ("-work", false),
    ("-x", false),
    ("-tags", true),
    ("-pkgdir", true),
];

/// Pattern used when none is given.
pub const DEFAULT_PATTERN: &str = ".";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    pub flags: Vec<String>,
    pub patterns: Vec<String>,
    pub verbose: bool,
}

impl ParsedArgs {
    /// The patterns, or the current directory when there are none.
    pub fn patterns_or_default(&self) -> Vec<String> {
        if self.patterns.is_empty() {
            vec![DEFAULT_PATTERN.to_string()]
        } else {
            self.patterns.clone()
        }
    }

    /// Value of the last occurrence of a value-taking flag.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.flags
            .windows(2)
            .rev()
            .find(|pair| pair[0] == flag)
            .map(|pair| pair[1].as_str())
    }
}

/// Splits `args` into flags and patterns.
pub fn parse_args(args: &[String]) -> BuildResult<ParsedArgs> {
    let mut verbose = false;
    let mut i = 0;
    while i < args.len() {
        if !args[i].starts_with('-') {
            return Ok(ParsedArgs { flags: args[..i].to_vec(), patterns: args[i..].to_vec(), verbose });
        }
        i = check_flag(args, i, Some(&mut verbose))?;
    }
    Ok(ParsedArgs { flags: args.to_vec(), patterns: Vec::new(), verbose })
}

/// Index of the first non-flag argument, if any.
pub fn skip_flag_args(args: &[String]) -> BuildResult<Option<usize>> {
    let mut i = 0;
    while i < args.len() {
        if !args[i].starts_with('-') {
            return Ok(Some(i));
        }
        i = check_flag(args, i, None)?;
    }
    Ok(None)
}

/// Validates the flag at `i` and returns the index of the next argument.
fn check_flag(args: &[String], i: usize, verbose: Option<&mut bool>) -> BuildResult<usize> {
    let flag = args[i].as_str();
    let takes_value = BUILD_FLAGS
        .iter()
        .find(|(name, _)| *name == flag)
        .map(|(_, takes_value)| *takes_value)
        .ok_or_else(|| BuildError::UnknownFlag { flag: flag.to_string(), supported: supported_flags() })?;
    if takes_value {
        return Ok(i + 2);
    }
    if flag == "-v" {
        if let Some(verbose) = verbose {
            *verbose = true;
        }
    }
    Ok(i + 1)
}

fn supported_flags() -> String {
    BUILD_FLAGS.iter().map(|(name, _)| *name).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_value_flag_at_end_consumes_nothing_more() {
        let parsed = parse_args(&strings(&["-x", "-tags"])).unwrap();
        assert_eq!(parsed.flags, strings(&["-x", "-tags"]));
        assert!(parsed.patterns.is_empty());
        assert_eq!(parsed.patterns_or_default(), strings(&["."]));
    }

    #[test]
    fn test_flag_value() {
        let parsed = parse_args(&strings(&["-C", "a", "-C", "b", "./x"])).unwrap();
        assert_eq!(parsed.flag_value("-C"), Some("b"));
        assert_eq!(parsed.flag_value("-tags"), None);
    }
}
