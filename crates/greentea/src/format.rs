//! Indentation and colouring of report lines.

/// One level of indentation in the report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Indent {
    /// A single tab character.
    #[default]
    Tab,
    /// `n` spaces.
    Spaces(usize),
    /// Any literal unit.
    Custom(String),
}

impl Indent {
    pub fn unit(&self) -> String {
        match self {
            Indent::Tab => "\t".to_string(),
            Indent::Spaces(n) => " ".repeat(*n),
            Indent::Custom(unit) => unit.clone(),
        }
    }

    /// Parse `tab` or a number of spaces.
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("tab") {
            return Some(Indent::Tab);
        }
        value.parse::<usize>().ok().map(Indent::Spaces)
    }
}

impl From<usize> for Indent {
    fn from(spaces: usize) -> Self {
        Indent::Spaces(spaces)
    }
}

impl From<&str> for Indent {
    fn from(unit: &str) -> Self {
        Indent::Custom(unit.to_string())
    }
}

impl From<String> for Indent {
    fn from(unit: String) -> Self {
        Indent::Custom(unit)
    }
}

/// How a single test concluded, without its error payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Passed,
    Pending,
    Failed,
}

// ============================================================================
// ANSI color helpers
// ============================================================================

/// Builds indentation prefixes and (optionally) coloured fragments.
#[derive(Debug, Clone)]
pub struct Formatter {
    unit: String,
    color: bool,
}

impl Formatter {
    pub fn new(indent: &Indent, color: bool) -> Self {
        Formatter {
            unit: indent.unit(),
            color,
        }
    }

    /// `depth + extra` repetitions of the indent unit.
    pub fn indent(&self, depth: usize, extra: usize) -> String {
        self.unit.repeat(depth + extra)
    }

    pub fn symbol(&self, kind: OutcomeKind) -> String {
        match kind {
            OutcomeKind::Passed => self.green("✓"),
            OutcomeKind::Pending => self.yellow("-"),
            OutcomeKind::Failed => self.red("✗"),
        }
    }

    fn paint(&self, code: &str, s: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{s}\x1b[0m")
        } else {
            s.to_string()
        }
    }

    pub fn green(&self, s: &str) -> String {
        self.paint("32", s)
    }

    pub fn red(&self, s: &str) -> String {
        self.paint("31", s)
    }

    pub fn yellow(&self, s: &str) -> String {
        self.paint("33", s)
    }

    pub fn bold(&self, s: &str) -> String {
        self.paint("1", s)
    }

    pub fn dim(&self, s: &str) -> String {
        self.paint("2", s)
    }
}

/// Colour is on unless `NO_COLOR` is set or stdout is not a terminal.
pub fn use_color() -> bool {
    // https://no-color.org/
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::io::IsTerminal::is_terminal(&std::io::stdout())
}
