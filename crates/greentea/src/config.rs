//! Run configuration parsed from the command line.

use crate::format::{self, Indent};

/// Options for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Emit ANSI colours.
    pub color: bool,
    /// Only list the registered tests, don't run them.
    pub list: bool,
    /// Indent unit to apply before the tree is built.
    pub indent: Option<Indent>,
    /// Maximum number of stack frames reported per error.
    pub max_frames: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            color: format::use_color(),
            list: false,
            indent: None,
            max_frames: 16,
        }
    }
}

impl RunConfig {
    /// Parse from the process args (compatible with `cargo test -- <args>`).
    pub fn from_args() -> Self {
        Self::parse(std::env::args().skip(1))
    }

    /// Parse from an explicit argument list (without the binary name).
    ///
    /// Recognised: `--list`, `--color`, `--no-color`, `--indent=<n|tab>`,
    /// `--max-frames=<n>`. Everything else is ignored.
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = RunConfig::default();
        for arg in args {
            let arg = arg.as_ref();
            match arg {
                "--list" => config.list = true,
                "--color" => config.color = true,
                "--no-color" => config.color = false,
                _ => {
                    if let Some(value) = arg.strip_prefix("--indent=") {
                        match Indent::parse(value) {
                            Some(indent) => config.indent = Some(indent),
                            None => tracing::warn!(value, "ignoring unparsable --indent"),
                        }
                    } else if let Some(value) = arg.strip_prefix("--max-frames=") {
                        match value.parse() {
                            Ok(n) => config.max_frames = n,
                            Err(_) => tracing::warn!(value, "ignoring unparsable --max-frames"),
                        }
                    }
                    // unknown flags and positional filters are ignored
                }
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let config = RunConfig::parse(Vec::<String>::new());
        assert!(!config.list);
        assert_eq!(config.indent, None);
        assert_eq!(config.max_frames, 16);
    }

    #[test]
    fn test_parse_flags() {
        let config = RunConfig::parse([
            "--list",
            "--no-color",
            "--indent=4",
            "--max-frames=3",
            "--nocapture",
            "some_filter",
        ]);
        assert!(config.list);
        assert!(!config.color);
        assert_eq!(config.indent, Some(Indent::Spaces(4)));
        assert_eq!(config.max_frames, 3);
    }

    #[test]
    fn test_parse_indent_tab_and_garbage() {
        let config = RunConfig::parse(["--indent=tab", "--color"]);
        assert_eq!(config.indent, Some(Indent::Tab));
        assert!(config.color);

        let config = RunConfig::parse(["--indent=wide", "--max-frames=x"]);
        assert_eq!(config.indent, None);
        assert_eq!(config.max_frames, 16);
    }
}
