use crate::Span;
use std::fmt::{self, Debug, Display};

#[cfg(test)]
#[path = "./error_tests.rs"]
mod tests;

/// Error produced when a document is not valid TOML.
///
/// Carries the reason, the byte span in the source, and the 1-based line
/// and column of the span start. Columns count bytes, not characters.
#[derive(Debug, Clone)]
pub struct Error {
    /// The error kind.
    pub kind: ErrorKind,
    /// The byte span where the error occurs.
    pub span: Span,
    /// 1-based line of the span start.
    pub line: usize,
    /// 1-based byte column of the span start.
    pub column: usize,
}

impl std::error::Error for Error {}

impl Error {
    pub(crate) fn new(kind: ErrorKind, span: Span, source: &str) -> Self {
        let (line, column) = line_col(source, span.start as usize);
        Self {
            kind,
            span,
            line,
            column,
        }
    }
}

/// Computes the 1-based line and byte column for an offset, in one pass
/// over the preceding source.
pub(crate) fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let prefix = &source.as_bytes()[..offset];
    let line = prefix.iter().filter(|&&b| b == b'\n').count() + 1;
    let column = match prefix.iter().rposition(|&b| b == b'\n') {
        Some(newline) => offset - newline,
        None => offset + 1,
    };
    (line, column)
}

/// The reasons a TOML document can fail to parse.
///
/// The set of variants is not part of the stability contract and the
/// rendered messages even less so; match on these for tests and tooling,
/// never on `Display` output.
#[derive(Clone)]
pub enum ErrorKind {
    /// EOF was reached when looking for a value.
    UnexpectedEof,

    /// The input is larger than the maximum supported size of 4GiB.
    FileTooLarge,

    /// The byte input was not valid UTF-8.
    InvalidUtf8,

    /// The byte input started with a UTF-8 byte-order mark, which TOML
    /// documents do not carry.
    ByteOrderMark,

    /// An invalid character not allowed in a string was found.
    InvalidCharInString(char),

    /// An invalid character was found as an escape.
    InvalidEscape(char),

    /// An invalid character was found in a hex escape.
    InvalidHexEscape(char),

    /// An invalid escape value was specified in a hex escape in a string.
    ///
    /// Valid values are Unicode scalar values; surrogates are not.
    InvalidEscapeValue(u32),

    /// An unexpected character was encountered, typically when looking for
    /// a value.
    Unexpected(char),

    /// EOF was found before the string terminator.
    UnterminatedString,

    /// A number failed to parse.
    InvalidNumber,

    /// A token shaped like a date or time had an impossible field, such as
    /// month 13 or hour 24.
    InvalidDatetime,

    /// A structural limit was exceeded.
    OutOfRange(&'static str),

    /// Wanted one sort of token, but found another.
    Wanted {
        /// Expected token type.
        expected: &'static str,
        /// Actually found token type.
        found: &'static str,
    },

    /// A duplicate table definition was found.
    DuplicateTable {
        /// The name of the duplicate table.
        name: String,
    },

    /// Duplicate key in a table.
    DuplicateKey {
        /// The duplicate key.
        key: String,
    },

    /// A previously defined table was redefined as an array.
    RedefineAsArray,

    /// Multiline strings are not allowed for keys.
    MultilineStringKey,

    /// Dotted key attempted to extend something that is not extendable.
    DottedKeyInvalidType,

    /// A later line attempted to extend a value sealed by an inline
    /// table or array literal.
    FrozenNamespace {
        /// The key naming the sealed value.
        key: String,
    },

    /// The `parse_float` hook returned a table or an array.
    IllegalFloatValue,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::UnexpectedEof => "unexpected-eof",
            Self::FileTooLarge => "file-too-large",
            Self::InvalidUtf8 => "invalid-utf8",
            Self::ByteOrderMark => "byte-order-mark",
            Self::InvalidCharInString(..) => "invalid-char-in-string",
            Self::InvalidEscape(..) => "invalid-escape",
            Self::InvalidHexEscape(..) => "invalid-hex-escape",
            Self::InvalidEscapeValue(..) => "invalid-escape-value",
            Self::Unexpected(..) => "unexpected",
            Self::UnterminatedString => "unterminated-string",
            Self::InvalidNumber => "invalid-number",
            Self::InvalidDatetime => "invalid-datetime",
            Self::OutOfRange(..) => "out-of-range",
            Self::Wanted { .. } => "wanted",
            Self::DuplicateTable { .. } => "duplicate-table",
            Self::DuplicateKey { .. } => "duplicate-key",
            Self::RedefineAsArray => "redefine-as-array",
            Self::MultilineStringKey => "multiline-string-key",
            Self::DottedKeyInvalidType => "dotted-key-invalid-type",
            Self::FrozenNamespace { .. } => "frozen-namespace",
            Self::IllegalFloatValue => "illegal-float-value",
        };
        f.write_str(text)
    }
}

impl Debug for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

struct Escape(char);

impl fmt::Display for Escape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use std::fmt::Write as _;

        if self.0.is_whitespace() || self.0.is_control() {
            for esc in self.0.escape_default() {
                f.write_char(esc)?;
            }
            Ok(())
        } else {
            f.write_char(self.0)
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::UnexpectedEof => f.write_str("unexpected eof encountered")?,
            ErrorKind::FileTooLarge => f.write_str("file is too large (maximum 4GiB)")?,
            ErrorKind::InvalidUtf8 => f.write_str("input is not valid UTF-8")?,
            ErrorKind::ByteOrderMark => {
                f.write_str("byte-order mark found; TOML documents have none")?;
            }
            ErrorKind::InvalidCharInString(c) => {
                write!(f, "invalid character in string: `{}`", Escape(*c))?;
            }
            ErrorKind::InvalidEscape(c) => {
                write!(f, "invalid escape character in string: `{}`", Escape(*c))?;
            }
            ErrorKind::InvalidHexEscape(c) => {
                write!(f, "invalid hex escape character in string: `{}`", Escape(*c))?;
            }
            ErrorKind::InvalidEscapeValue(c) => write!(f, "invalid escape value: `{c}`")?,
            ErrorKind::Unexpected(c) => {
                write!(f, "unexpected character found: `{}`", Escape(*c))?;
            }
            ErrorKind::UnterminatedString => f.write_str("unterminated string")?,
            ErrorKind::InvalidNumber => f.write_str("invalid number")?,
            ErrorKind::InvalidDatetime => f.write_str("invalid date or time")?,
            ErrorKind::OutOfRange(what) => write!(f, "out of range of '{what}'")?,
            ErrorKind::Wanted { expected, found } => {
                write!(f, "expected {expected}, found {found}")?;
            }
            ErrorKind::DuplicateTable { name } => {
                write!(f, "redefinition of table `{name}`")?;
            }
            ErrorKind::DuplicateKey { key } => write!(f, "duplicate key: `{key}`")?,
            ErrorKind::RedefineAsArray => f.write_str("table redefined as array")?,
            ErrorKind::MultilineStringKey => {
                f.write_str("multiline strings are not allowed for key")?;
            }
            ErrorKind::DottedKeyInvalidType => {
                f.write_str("dotted key attempted to extend a non-extendable type")?;
            }
            ErrorKind::FrozenNamespace { key } => {
                write!(f, "cannot extend `{key}`, it was defined by an inline literal")?;
            }
            ErrorKind::IllegalFloatValue => {
                f.write_str("the float hook returned a table or array")?;
            }
        }
        write!(f, " (at line {}, column {})", self.line, self.column)
    }
}

#[cfg(feature = "reporting")]
#[cfg_attr(docsrs, doc(cfg(feature = "reporting")))]
impl Error {
    /// Converts this [`Error`] into a [`codespan_reporting::diagnostic::Diagnostic`].
    pub fn to_diagnostic<FileId: Copy + PartialEq>(
        &self,
        fid: FileId,
    ) -> codespan_reporting::diagnostic::Diagnostic<FileId> {
        use codespan_reporting::diagnostic::{Diagnostic, Label};

        let diag = Diagnostic::error().with_code(self.kind.to_string());

        match &self.kind {
            ErrorKind::Unexpected(c) => diag.with_labels(vec![
                Label::primary(fid, self.span)
                    .with_message(format!("unexpected character '{}'", Escape(*c))),
            ]),
            ErrorKind::InvalidCharInString(c) => diag.with_labels(vec![
                Label::primary(fid, self.span)
                    .with_message(format!("invalid character '{}' in string", Escape(*c))),
            ]),
            ErrorKind::InvalidEscape(c) => diag.with_labels(vec![
                Label::primary(fid, self.span)
                    .with_message(format!("invalid escape character '{}' in string", Escape(*c))),
            ]),
            ErrorKind::InvalidHexEscape(c) => diag.with_labels(vec![
                Label::primary(fid, self.span)
                    .with_message(format!("invalid hex escape '{}'", Escape(*c))),
            ]),
            ErrorKind::InvalidEscapeValue(_) => diag.with_labels(vec![
                Label::primary(fid, self.span).with_message("invalid escape value"),
            ]),
            ErrorKind::InvalidNumber => diag.with_labels(vec![
                Label::primary(fid, self.span).with_message("unable to parse number"),
            ]),
            ErrorKind::InvalidDatetime => diag.with_labels(vec![
                Label::primary(fid, self.span).with_message("impossible date or time"),
            ]),
            ErrorKind::OutOfRange(what) => diag
                .with_message(format!("out of range of '{what}'"))
                .with_labels(vec![Label::primary(fid, self.span)]),
            ErrorKind::Wanted { expected, .. } => diag.with_labels(vec![
                Label::primary(fid, self.span).with_message(format!("expected {expected}")),
            ]),
            ErrorKind::MultilineStringKey => diag.with_labels(vec![
                Label::primary(fid, self.span).with_message("multiline keys are not allowed"),
            ]),
            ErrorKind::UnterminatedString => diag.with_labels(vec![
                Label::primary(fid, self.span).with_message("eof reached before string terminator"),
            ]),
            ErrorKind::DuplicateTable { name } => diag
                .with_message(format!("redefinition of table `{name}`"))
                .with_labels(vec![
                    Label::primary(fid, self.span).with_message("duplicate table"),
                ]),
            ErrorKind::DuplicateKey { key } => diag
                .with_message(format!("duplicate key `{key}`"))
                .with_labels(vec![
                    Label::primary(fid, self.span).with_message("duplicate key"),
                ]),
            ErrorKind::FrozenNamespace { key } => diag
                .with_message(format!("`{key}` was sealed by an inline literal"))
                .with_labels(vec![
                    Label::primary(fid, self.span).with_message("attempted to extend here"),
                ]),
            ErrorKind::DottedKeyInvalidType => diag.with_message(self.to_string()).with_labels(
                vec![Label::primary(fid, self.span).with_message("attempted to extend here")],
            ),
            ErrorKind::RedefineAsArray => diag
                .with_message(self.to_string())
                .with_labels(vec![Label::primary(fid, self.span)]),
            ErrorKind::IllegalFloatValue => diag
                .with_message("the float hook returned a table or array")
                .with_labels(vec![Label::primary(fid, self.span)]),
            ErrorKind::UnexpectedEof => diag
                .with_message("unexpected end of file")
                .with_labels(vec![Label::primary(fid, self.span)]),
            ErrorKind::FileTooLarge => diag
                .with_message("file is too large (maximum 4GiB)")
                .with_labels(vec![Label::primary(fid, self.span)]),
            ErrorKind::InvalidUtf8 => diag
                .with_message("input is not valid UTF-8")
                .with_labels(vec![Label::primary(fid, self.span)]),
            ErrorKind::ByteOrderMark => diag
                .with_message("byte-order mark found at the start of the document")
                .with_labels(vec![Label::primary(fid, self.span)]),
        }
    }
}
