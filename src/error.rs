use std::error;
use std::fmt;

/// What went wrong while scanning or parsing a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input does not follow the JSON grammar.
    Syntax,
    /// A token appeared where the grammar does not allow it.
    Token,
    /// Raw control character inside a string.
    CtrlChar,
    /// Unknown backslash escape inside a string.
    Escape,
    /// Input bytes are not valid UTF-8.
    Utf8,
    /// Broken `\uXXXX` escape or unpaired surrogate.
    Utf16,
    /// Nesting exceeded the configured maximum depth.
    Depth,
}

impl ErrorKind {
    pub fn description(self) -> &'static str {
        match self {
            ErrorKind::Syntax => "syntax",
            ErrorKind::Token => "token",
            ErrorKind::CtrlChar => "control character",
            ErrorKind::Escape => "escape",
            ErrorKind::Utf8 => "UTF-8",
            ErrorKind::Utf16 => "UTF-16",
            ErrorKind::Depth => "maximal depth exceeded",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// 1-based source span of a token or error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub first_line: u32,
    pub first_column: u32,
    pub last_line: u32,
    pub last_column: u32,
}

/// A scan or parse failure with its source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    kind: ErrorKind,
    location: Location,
}

impl ParseError {
    pub(crate) fn new(kind: ErrorKind, location: Location) -> ParseError {
        ParseError { kind, location }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn location(&self) -> Location {
        self.location
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error at {}:{}",
            self.kind, self.location.first_line, self.location.first_column
        )
    }
}

impl error::Error for ParseError {}
