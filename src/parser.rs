#[cfg(test)]
#[path = "./parser_tests.rs"]
mod tests;

use crate::{
    Span,
    array::Array,
    error::{Error, ErrorKind},
    table::Table,
    time,
    value::Value,
};

const MAX_RECURSION_DEPTH: i16 = 256;

/// Spans are `u32` byte offsets, which caps the input size.
const MAX_SIZE: usize = u32::MAX as usize;

// When a method returns Err(ParseError), the full error details have already
// been written into Parser::error_kind / Parser::error_span.
#[derive(Copy, Clone)]
struct ParseError;

/// The float conversion hook.
///
/// Receives the exact lexical form of each float in the document — sign
/// preserved, underscores removed, including the `inf` and `nan` spellings —
/// and produces the [`Value`] that ends up in the tree. The hook is called
/// exactly once per float and must not return [`Value::Table`] or
/// [`Value::Array`]; doing so fails the parse.
pub type ParseFloat = dyn Fn(&str) -> Value;

/// The default float hook: IEEE-754 double precision.
pub fn default_parse_float(text: &str) -> Value {
    // The lexer only hands over valid TOML floats, all of which `f64` parses.
    Value::Float(text.parse().expect("lexer produced an unparsable float"))
}

/// A single key part with its source span, as read from the document.
struct Key {
    name: String,
    span: Span,
}

/// Which construct a dotted-key walk is serving. The three contexts share
/// one walker but differ in what pre-existing nodes they may pass through.
#[derive(Copy, Clone, PartialEq)]
enum Descend {
    /// Intermediate segment of a `[table]` or `[[array]]` header. May pass
    /// through existing tables and the last entry of an array of tables;
    /// missing tables are created implicitly and stay promotable.
    Header,
    /// Intermediate segment of a dotted key on a key/value line. Claims
    /// every table it passes through, closing it to later headers.
    KeyValue,
    /// Intermediate segment of a dotted key inside an inline table.
    InlineTable,
}

struct Parser<'a> {
    src: &'a str,
    /// `src` as raw bytes; all cursor movement happens here.
    bytes: &'a [u8],
    cursor: usize,
    parse_float: &'a ParseFloat,

    /// Namespace opened by the most recent header line, as a key path from
    /// the root. Key/value lines resolve it again on every line, which
    /// lands in the latest entry of any array of tables along the way.
    header_path: Vec<String>,

    // Error context -- populated just before returning ParseError
    error_span: Span,
    error_kind: Option<ErrorKind>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, parse_float: &'a ParseFloat) -> Self {
        Parser {
            src,
            bytes: src.as_bytes(),
            cursor: 0,
            parse_float,
            header_path: Vec::new(),
            error_span: Span::new(0, 0),
            error_kind: None,
        }
    }

    #[cold]
    fn set_error(&mut self, start: usize, end: Option<usize>, kind: ErrorKind) -> ParseError {
        self.error_span = Span::new(start as u32, end.unwrap_or(start + 1) as u32);
        self.error_kind = Some(kind);
        ParseError
    }

    fn take_error(&mut self) -> Error {
        let kind = self
            .error_kind
            .take()
            .expect("take_error called without error");
        Error::new(kind, self.error_span, self.src)
    }

    /// Slice of the source text. All positions handed in here sit on ASCII
    /// bytes (quotes, digits, punctuation), hence on UTF-8 boundaries.
    #[inline]
    fn str_slice(&self, start: usize, end: usize) -> &'a str {
        let src = self.src;
        &src[start..end]
    }

    #[inline]
    fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.cursor).copied()
    }

    #[inline]
    fn peek_byte_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.cursor + offset).copied()
    }

    #[inline]
    fn eat_byte(&mut self, b: u8) -> bool {
        if self.peek_byte() == Some(b) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    #[cold]
    fn expected_error(&mut self, b: u8) -> ParseError {
        let start = self.cursor;
        let (found, end) = self.scan_token_desc_and_end();
        self.set_error(
            start,
            Some(end),
            ErrorKind::Wanted {
                expected: byte_describe(b),
                found,
            },
        )
    }

    fn expect_byte(&mut self, b: u8) -> Result<(), ParseError> {
        if self.eat_byte(b) {
            Ok(())
        } else {
            Err(self.expected_error(b))
        }
    }

    fn eat_whitespace(&mut self) {
        while let Some(b' ' | b'\t') = self.peek_byte() {
            self.cursor += 1;
        }
    }

    /// Skips whitespace and returns the byte that stopped the skip.
    fn eat_whitespace_to(&mut self) -> Option<u8> {
        while let Some(b) = self.peek_byte() {
            if b == b' ' || b == b'\t' {
                self.cursor += 1;
            } else {
                return Some(b);
            }
        }
        None
    }

    fn eat_newline(&mut self) -> bool {
        match self.peek_byte() {
            Some(b'\n') => {
                self.cursor += 1;
                true
            }
            Some(b'\r') if self.peek_byte_at(1) == Some(b'\n') => {
                self.cursor += 2;
                true
            }
            _ => false,
        }
    }

    fn eat_newline_or_eof(&mut self) -> Result<(), ParseError> {
        if self.peek_byte().is_none() || self.eat_newline() {
            Ok(())
        } else {
            let start = self.cursor;
            let (found, end) = self.scan_token_desc_and_end();
            Err(self.set_error(
                start,
                Some(end),
                ErrorKind::Wanted {
                    expected: "newline",
                    found,
                },
            ))
        }
    }

    /// Consumes a `#` comment through its terminating newline (or EOF).
    /// Control characters other than tab are not allowed in comments.
    fn eat_comment(&mut self) -> Result<bool, ParseError> {
        if !self.eat_byte(b'#') {
            return Ok(false);
        }
        while let Some(0x09 | 0x20..=0x7E | 0x80..) = self.peek_byte() {
            self.cursor += 1;
        }
        self.eat_newline_or_eof().map(|()| true)
    }

    /// Inside arrays, whitespace, newlines and comments can all be skipped.
    fn eat_array_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek_byte() {
                Some(b' ' | b'\t' | b'\n') => self.cursor += 1,
                Some(b'\r') if self.peek_byte_at(1) == Some(b'\n') => self.cursor += 2,
                Some(b'#') => {
                    self.eat_comment()?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// Scan forward from the current position to determine the description
    /// and end position of the "token" at the cursor, for error messages.
    fn scan_token_desc_and_end(&self) -> (&'static str, usize) {
        let Some(b) = self.peek_byte() else {
            return ("eof", self.bytes.len());
        };
        match b {
            b'\n' => ("a newline", self.cursor + 1),
            b'\r' => ("a carriage return", self.cursor + 1),
            b' ' | b'\t' => {
                let mut end = self.cursor + 1;
                while end < self.bytes.len()
                    && (self.bytes[end] == b' ' || self.bytes[end] == b'\t')
                {
                    end += 1;
                }
                ("whitespace", end)
            }
            b'#' => ("a comment", self.cursor + 1),
            b'=' => ("an equals", self.cursor + 1),
            b'.' => ("a period", self.cursor + 1),
            b',' => ("a comma", self.cursor + 1),
            b':' => ("a colon", self.cursor + 1),
            b'+' => ("a plus", self.cursor + 1),
            b'{' => ("a left brace", self.cursor + 1),
            b'}' => ("a right brace", self.cursor + 1),
            b'[' => ("a left bracket", self.cursor + 1),
            b']' => ("a right bracket", self.cursor + 1),
            b'\'' | b'"' => ("a string", self.cursor + 1),
            _ if is_keylike_byte(b) => {
                let mut end = self.cursor + 1;
                while end < self.bytes.len() && is_keylike_byte(self.bytes[end]) {
                    end += 1;
                }
                ("an identifier", end)
            }
            _ => ("a character", self.cursor + 1),
        }
    }

    fn read_keylike(&mut self) -> &'a str {
        let start = self.cursor;
        while let Some(b) = self.peek_byte() {
            if !is_keylike_byte(b) {
                break;
            }
            self.cursor += 1;
        }
        self.str_slice(start, self.cursor)
    }

    fn read_table_key(&mut self) -> Result<Key, ParseError> {
        let Some(b) = self.peek_byte() else {
            return Err(self.set_error(
                self.bytes.len(),
                None,
                ErrorKind::Wanted {
                    expected: "a table key",
                    found: "eof",
                },
            ));
        };
        match b {
            b'"' | b'\'' => {
                let start = self.cursor;
                self.cursor += 1;
                let (name, multiline) = self.read_string(start, b)?;
                if multiline {
                    return Err(self.set_error(
                        start,
                        Some(self.cursor),
                        ErrorKind::MultilineStringKey,
                    ));
                }
                Ok(Key {
                    name,
                    span: Span::new(start as u32, self.cursor as u32),
                })
            }
            b if is_keylike_byte(b) => {
                let start = self.cursor;
                let name = self.read_keylike().to_string();
                Ok(Key {
                    name,
                    span: Span::new(start as u32, self.cursor as u32),
                })
            }
            _ => {
                let start = self.cursor;
                let (found, end) = self.scan_token_desc_and_end();
                Err(self.set_error(
                    start,
                    Some(end),
                    ErrorKind::Wanted {
                        expected: "a table key",
                        found,
                    },
                ))
            }
        }
    }

    /// Reads a string. `start` is the byte offset of the opening quote and
    /// the cursor must be positioned right after it. Returns the decoded
    /// content and whether the string was a multi-line one.
    fn read_string(&mut self, start: usize, delim: u8) -> Result<(String, bool), ParseError> {
        let mut multiline = false;
        if self.eat_byte(delim) {
            if self.eat_byte(delim) {
                multiline = true;
            } else {
                return Ok((String::new(), false));
            }
        }
        if multiline {
            // A newline immediately after the opening delimiter is trimmed.
            self.eat_newline();
        }
        self.read_string_body(start, multiline, delim)
    }

    /// Advance the cursor past bytes that need no special handling inside a
    /// string: stops at the delimiter, a backslash, or any control byte.
    fn skip_string_plain(&mut self, delim: u8) {
        while let Some(&b) = self.bytes.get(self.cursor) {
            if b == delim || b == b'\\' || b == 0x7F || (b < 0x20 && b != 0x09) {
                return;
            }
            self.cursor += 1;
        }
    }

    fn read_string_body(
        &mut self,
        start: usize,
        multiline: bool,
        delim: u8,
    ) -> Result<(String, bool), ParseError> {
        let mut out = String::new();
        let mut flush_from = self.cursor;
        loop {
            self.skip_string_plain(delim);

            let i = self.cursor;
            let Some(&b) = self.bytes.get(i) else {
                return Err(self.set_error(start, None, ErrorKind::UnterminatedString));
            };
            self.cursor = i + 1;

            match b {
                b'\r' => {
                    if self.peek_byte() == Some(b'\n') {
                        if !multiline {
                            return Err(self.set_error(
                                i,
                                None,
                                ErrorKind::InvalidCharInString('\n'),
                            ));
                        }
                        // A CRLF pair contributes a single LF to the value.
                        out.push_str(self.str_slice(flush_from, i));
                        out.push('\n');
                        self.cursor = i + 2;
                        flush_from = self.cursor;
                    } else if multiline && delim == b'\'' {
                        // A bare CR is content in multi-line literal strings.
                    } else {
                        return Err(self.set_error(i, None, ErrorKind::InvalidCharInString('\r')));
                    }
                }
                b'\n' => {
                    if !multiline {
                        return Err(self.set_error(i, None, ErrorKind::InvalidCharInString('\n')));
                    }
                }
                d if d == delim => {
                    if multiline {
                        if !self.eat_byte(delim) {
                            continue;
                        }
                        if !self.eat_byte(delim) {
                            continue;
                        }
                        // Up to two extra delimiters directly before the
                        // closing triple belong to the string.
                        let mut end = i;
                        if self.eat_byte(delim) {
                            end += 1;
                        }
                        if self.eat_byte(delim) {
                            end += 1;
                        }
                        out.push_str(self.str_slice(flush_from, end));
                        return Ok((out, true));
                    }
                    out.push_str(self.str_slice(flush_from, i));
                    return Ok((out, false));
                }
                b'\\' if delim == b'"' => {
                    out.push_str(self.str_slice(flush_from, i));
                    self.read_basic_escape(&mut out, start, multiline)?;
                    flush_from = self.cursor;
                }
                // A backslash in a literal string: a benign stop from
                // skip_string_plain, it is plain content.
                0x20..=0x7E => {}
                _ => {
                    return Err(self.set_error(i, None, ErrorKind::InvalidCharInString(b as char)));
                }
            }
        }
    }

    fn read_basic_escape(
        &mut self,
        out: &mut String,
        string_start: usize,
        multi: bool,
    ) -> Result<(), ParseError> {
        let i = self.cursor;
        let Some(&b) = self.bytes.get(i) else {
            return Err(self.set_error(string_start, None, ErrorKind::UnterminatedString));
        };
        self.cursor = i + 1;
        match b {
            b'"' => out.push('"'),
            b'\\' => out.push('\\'),
            b'b' => out.push('\u{0008}'),
            b'f' => out.push('\u{000C}'),
            b'n' => out.push('\n'),
            b'r' => out.push('\r'),
            b't' => out.push('\t'),
            b'u' => {
                let ch = self.read_hex(4, string_start, i)?;
                out.push(ch);
            }
            b'U' => {
                let ch = self.read_hex(8, string_start, i)?;
                out.push(ch);
            }
            b' ' | b'\t' | b'\n' | b'\r' if multi => {
                // Line continuation: the backslash, the rest of its line
                // (which must be whitespace) and any following whitespace or
                // newlines are dropped from the value.
                let c = if b == b'\r' && self.peek_byte() == Some(b'\n') {
                    self.cursor += 1;
                    '\n'
                } else if b == b'\r' {
                    return Err(self.set_error(i, None, ErrorKind::InvalidCharInString('\r')));
                } else {
                    b as char
                };
                if c != '\n' {
                    loop {
                        match self.peek_byte() {
                            Some(b' ' | b'\t') => self.cursor += 1,
                            Some(b'\n') => {
                                self.cursor += 1;
                                break;
                            }
                            Some(b'\r') if self.peek_byte_at(1) == Some(b'\n') => {
                                self.cursor += 2;
                                break;
                            }
                            _ => {
                                return Err(self.set_error(i, None, ErrorKind::InvalidEscape(c)));
                            }
                        }
                    }
                }
                loop {
                    match self.peek_byte() {
                        Some(b' ' | b'\t' | b'\n') => self.cursor += 1,
                        Some(b'\r') if self.peek_byte_at(1) == Some(b'\n') => self.cursor += 2,
                        _ => break,
                    }
                }
            }
            _ => {
                self.cursor -= 1;
                let found = self.next_char_for_error();
                return Err(self.set_error(self.cursor, None, ErrorKind::InvalidEscape(found)));
            }
        }
        Ok(())
    }

    fn read_hex(
        &mut self,
        n: usize,
        string_start: usize,
        escape_start: usize,
    ) -> Result<char, ParseError> {
        let mut value: u32 = 0;
        for _ in 0..n {
            let Some(&byte) = self.bytes.get(self.cursor) else {
                return Err(self.set_error(string_start, None, ErrorKind::UnterminatedString));
            };
            let Some(digit) = (byte as char).to_digit(16) else {
                let found = self.next_char_for_error();
                return Err(self.set_error(
                    self.cursor,
                    None,
                    ErrorKind::InvalidHexEscape(found),
                ));
            };
            value = (value << 4) | digit;
            self.cursor += 1;
        }
        // Surrogates and out-of-range values are not scalar values.
        match char::from_u32(value) {
            Some(ch) => Ok(ch),
            None => Err(self.set_error(
                escape_start,
                Some(escape_start + n),
                ErrorKind::InvalidEscapeValue(value),
            )),
        }
    }

    fn next_char_for_error(&self) -> char {
        self.src
            .get(self.cursor..)
            .and_then(|s| s.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    /// Parses one complete value starting at the cursor.
    fn value(&mut self, depth_remaining: i16) -> Result<Value, ParseError> {
        let at = self.cursor;
        let Some(byte) = self.peek_byte() else {
            return Err(self.set_error(self.bytes.len(), None, ErrorKind::UnexpectedEof));
        };
        let sign = match byte {
            b'"' | b'\'' => {
                self.cursor += 1;
                let (text, _) = self.read_string(at, byte)?;
                return Ok(Value::String(text));
            }
            b'{' => {
                self.cursor += 1;
                let mut table = Table::new();
                self.inline_table_contents(&mut table, depth_remaining - 1)?;
                let mut value = Value::Table(table);
                value.freeze();
                return Ok(value);
            }
            b'[' => {
                self.cursor += 1;
                let mut array = Array::new();
                self.array_contents(&mut array, depth_remaining - 1)?;
                let mut value = Value::Array(array);
                value.freeze();
                return Ok(value);
            }
            b't' => {
                return if self.bytes[self.cursor..].starts_with(b"true") {
                    self.cursor += 4;
                    Ok(Value::Boolean(true))
                } else {
                    let (found, end) = self.scan_token_desc_and_end();
                    Err(self.set_error(
                        at,
                        Some(end),
                        ErrorKind::Wanted {
                            expected: "the literal `true`",
                            found,
                        },
                    ))
                };
            }
            b'f' => {
                return if self.bytes[self.cursor..].starts_with(b"false") {
                    self.cursor += 5;
                    Ok(Value::Boolean(false))
                } else {
                    let (found, end) = self.scan_token_desc_and_end();
                    Err(self.set_error(
                        at,
                        Some(end),
                        ErrorKind::Wanted {
                            expected: "the literal `false`",
                            found,
                        },
                    ))
                };
            }
            b'-' => {
                self.cursor += 1;
                0
            }
            b'+' => {
                self.cursor += 1;
                1
            }
            _ => 2,
        };

        let token = self.read_keylike();
        let end = self.cursor;

        if token == "inf" || token == "nan" {
            // The sign character, if any, is part of the lexical form.
            let src = self.src;
            return self.finish_float(at, &src[at..end]);
        }

        if let [b'0'..=b'9', ..] = token.as_bytes() {
            self.number(at, end, token, sign)
        } else if byte == b'\r' {
            Err(self.set_error(at, None, ErrorKind::Unexpected('\r')))
        } else {
            Err(self.set_error(at, Some(self.cursor), ErrorKind::InvalidNumber))
        }
    }

    /// Parses a numeric or date/time token. `token` is the leading keylike
    /// run, `sign` is 0 for `-`, 1 for `+`, 2 for unsigned.
    fn number(
        &mut self,
        start: usize,
        end: usize,
        token: &'a str,
        sign: u8,
    ) -> Result<Value, ParseError> {
        // Base-prefixed integers (0x, 0o, 0b). TOML forbids signs on these,
        // so only match the unsigned form.
        if sign == 2 {
            if let [b'0', format, rest @ ..] = token.as_bytes() {
                let parsed = match format {
                    b'x' => Some(radix_integer(rest, 16)),
                    b'o' => Some(radix_integer(rest, 8)),
                    b'b' => Some(radix_integer(rest, 2)),
                    _ => None,
                };
                if let Some(parsed) = parsed {
                    return match parsed {
                        Some(value) => Ok(Value::Integer(value)),
                        None => {
                            Err(self.set_error(start, Some(end), ErrorKind::InvalidNumber))
                        }
                    };
                }
            }
        }

        if self.eat_byte(b'.') {
            return match self.peek_byte() {
                Some(b) if is_keylike_byte(b) => {
                    let after = self.read_keylike();
                    self.float(start, token, Some(after), sign)
                }
                _ => Err(self.set_error(start, Some(self.cursor), ErrorKind::InvalidNumber)),
            };
        }

        if sign == 2 && time::looks_temporal(&self.bytes[start..]) {
            return match time::munch(&self.bytes[start..]) {
                Some((consumed, temporal)) => {
                    self.cursor = start + consumed;
                    Ok(Value::from(temporal))
                }
                // Shaped like a date or time, but with impossible fields.
                None => Err(self.set_error(start, Some(end), ErrorKind::InvalidDatetime)),
            };
        }

        if let Some(value) = decimal_integer(token.as_bytes(), sign == 0) {
            return Ok(Value::Integer(value));
        }

        if token.bytes().any(|b| b == b'e' || b == b'E') {
            return self.float(start, token, None, sign);
        }

        Err(self.set_error(start, Some(end), ErrorKind::InvalidNumber))
    }

    /// Assembles the lexical form of a float (underscores removed, sign
    /// preserved), validates its shape, and runs it through the hook.
    ///
    /// `token` is everything up to an optional `.`, `after_decimal` the
    /// keylike run after it.
    fn float(
        &mut self,
        start: usize,
        token: &'a str,
        after_decimal: Option<&'a str>,
        sign: u8,
    ) -> Result<Value, ParseError> {
        // Leading zeros in the integer part are not permitted (00.5, -01.0).
        if let [b'0', b'0'..=b'9' | b'_', ..] = token.as_bytes() {
            return Err(self.set_error(start, Some(self.cursor), ErrorKind::InvalidNumber));
        }

        let mut lexical = String::with_capacity(token.len() + 8);
        match sign {
            0 => lexical.push('-'),
            1 => lexical.push('+'),
            _ => {}
        }
        if !push_stripping_underscores(&mut lexical, token.as_bytes()) {
            return Err(self.set_error(start, Some(self.cursor), ErrorKind::InvalidNumber));
        }

        let mut last = token;
        if let Some(after) = after_decimal {
            lexical.push('.');
            if !push_stripping_underscores(&mut lexical, after.as_bytes()) {
                return Err(self.set_error(start, Some(self.cursor), ErrorKind::InvalidNumber));
            }
            last = after;
        }

        // When the keylike token ends with e/E, a '+' and the exponent
        // digits arrive as separate tokens ('-' is keylike, so "1e-5" stays
        // in one token and needs no special handling).
        if matches!(last.as_bytes().last(), Some(b'e' | b'E')) {
            if self.eat_byte(b'+') {
                lexical.push('+');
            }
            match self.peek_byte() {
                Some(b) if is_keylike_byte(b) && b != b'-' => {
                    let digits = self.read_keylike();
                    if !push_stripping_underscores(&mut lexical, digits.as_bytes()) {
                        return Err(self.set_error(
                            start,
                            Some(self.cursor),
                            ErrorKind::InvalidNumber,
                        ));
                    }
                }
                _ => {
                    return Err(self.set_error(start, Some(self.cursor), ErrorKind::InvalidNumber));
                }
            }
        }

        if !is_valid_float(lexical.as_bytes()) {
            return Err(self.set_error(start, Some(self.cursor), ErrorKind::InvalidNumber));
        }
        self.finish_float(start, &lexical)
    }

    /// Runs the hook on a validated lexical float and rejects forbidden
    /// return types.
    fn finish_float(&mut self, start: usize, lexical: &str) -> Result<Value, ParseError> {
        let value = (self.parse_float)(lexical);
        if matches!(value, Value::Table(_) | Value::Array(_)) {
            return Err(self.set_error(start, Some(self.cursor), ErrorKind::IllegalFloatValue));
        }
        Ok(value)
    }

    fn array_contents(
        &mut self,
        out: &mut Array,
        depth_remaining: i16,
    ) -> Result<(), ParseError> {
        if depth_remaining < 0 {
            return Err(self.set_error(
                self.cursor,
                None,
                ErrorKind::OutOfRange("max recursion depth"),
            ));
        }
        loop {
            self.eat_array_trivia()?;
            if self.eat_byte(b']') {
                return Ok(());
            }
            let value = self.value(depth_remaining)?;
            out.push(value);
            self.eat_array_trivia()?;
            if !self.eat_byte(b',') {
                break;
            }
        }
        self.eat_array_trivia()?;
        self.expect_byte(b']')
    }

    fn inline_table_contents(
        &mut self,
        out: &mut Table,
        depth_remaining: i16,
    ) -> Result<(), ParseError> {
        if depth_remaining < 0 {
            return Err(self.set_error(
                self.cursor,
                None,
                ErrorKind::OutOfRange("max recursion depth"),
            ));
        }
        // Newlines are not permitted between the structural tokens of an
        // inline table, and there is no trailing comma.
        self.eat_whitespace();
        if self.eat_byte(b'}') {
            return Ok(());
        }
        loop {
            let mut table_ref: &mut Table = &mut *out;
            let mut key = self.read_table_key()?;
            self.eat_whitespace();
            while self.eat_byte(b'.') {
                self.eat_whitespace();
                table_ref = self.descend(table_ref, key, Descend::InlineTable)?;
                key = self.read_table_key()?;
                self.eat_whitespace();
            }
            self.expect_byte(b'=')?;
            self.eat_whitespace();
            let mut value = self.value(depth_remaining)?;
            // Seal early so a later dotted pair cannot reach inside it.
            value.freeze();
            self.insert_value(table_ref, key, value)?;
            self.eat_whitespace();
            if self.eat_byte(b'}') {
                return Ok(());
            }
            self.expect_byte(b',')?;
            self.eat_whitespace();
        }
    }

    /// One step of dotted-key navigation: enter `key` within `table`,
    /// creating a missing table or vetting an existing node per `policy`.
    fn descend<'t>(
        &mut self,
        table: &'t mut Table,
        key: Key,
        policy: Descend,
    ) -> Result<&'t mut Table, ParseError> {
        let span = key.span;
        let Some(idx) = table.find_index(&key.name) else {
            let mut sub = Table::new();
            if policy == Descend::KeyValue {
                sub.set_dotted();
            }
            return Ok(table.insert_table(key.name, sub));
        };
        match table.value_at_mut(idx) {
            Value::Table(sub) => {
                if sub.is_frozen() {
                    return Err(self.set_error(
                        span.start as usize,
                        Some(span.end as usize),
                        ErrorKind::FrozenNamespace { key: key.name },
                    ));
                }
                if policy != Descend::Header && sub.is_explicit() {
                    // Tables opened with `[header]` syntax cannot be
                    // extended by dotted keys.
                    return Err(self.set_error(
                        span.start as usize,
                        Some(span.end as usize),
                        ErrorKind::DottedKeyInvalidType,
                    ));
                }
                if policy == Descend::KeyValue {
                    sub.set_dotted();
                }
                Ok(sub)
            }
            Value::Array(array) => {
                if policy == Descend::Header && array.is_array_of_tables() {
                    // Headers pass through an array of tables by extending
                    // its most recently appended entry.
                    match array.last_mut() {
                        Some(Value::Table(last)) => Ok(last),
                        // An array of tables holds at least one table by
                        // construction.
                        _ => unreachable!("array of tables without a table entry"),
                    }
                } else if array.is_frozen() {
                    Err(self.set_error(
                        span.start as usize,
                        Some(span.end as usize),
                        ErrorKind::FrozenNamespace { key: key.name },
                    ))
                } else {
                    match policy {
                        Descend::Header => Err(self.set_error(
                            span.start as usize,
                            Some(span.end as usize),
                            ErrorKind::DuplicateKey { key: key.name },
                        )),
                        _ => Err(self.set_error(
                            span.start as usize,
                            Some(span.end as usize),
                            ErrorKind::DottedKeyInvalidType,
                        )),
                    }
                }
            }
            _ => match policy {
                Descend::Header => Err(self.set_error(
                    span.start as usize,
                    Some(span.end as usize),
                    ErrorKind::DuplicateKey { key: key.name },
                )),
                _ => Err(self.set_error(
                    span.start as usize,
                    Some(span.end as usize),
                    ErrorKind::DottedKeyInvalidType,
                )),
            },
        }
    }

    /// Handles the final segment of a `[a.b.c]` header.
    fn define_table(
        &mut self,
        parent: &mut Table,
        key: Key,
        header: Span,
    ) -> Result<(), ParseError> {
        let Some(idx) = parent.find_index(&key.name) else {
            let mut table = Table::new();
            table.set_explicit();
            parent.insert(key.name, Value::Table(table));
            return Ok(());
        };
        match parent.value_at_mut(idx) {
            Value::Table(table) => {
                if table.is_frozen() {
                    Err(self.set_error(
                        key.span.start as usize,
                        Some(key.span.end as usize),
                        ErrorKind::FrozenNamespace { key: key.name },
                    ))
                } else if table.is_explicit() {
                    Err(self.set_error(
                        header.start as usize,
                        Some(header.end as usize),
                        ErrorKind::DuplicateTable { name: key.name },
                    ))
                } else if table.is_dotted() {
                    // Implicitly created by a key/value line; closed to
                    // headers. Header-implicit tables take the other branch
                    // and are promoted.
                    Err(self.set_error(
                        key.span.start as usize,
                        Some(key.span.end as usize),
                        ErrorKind::DuplicateKey { key: key.name },
                    ))
                } else {
                    table.set_explicit();
                    Ok(())
                }
            }
            Value::Array(array) if array.is_frozen() => Err(self.set_error(
                key.span.start as usize,
                Some(key.span.end as usize),
                ErrorKind::FrozenNamespace { key: key.name },
            )),
            _ => Err(self.set_error(
                key.span.start as usize,
                Some(key.span.end as usize),
                ErrorKind::DuplicateKey { key: key.name },
            )),
        }
    }

    /// Handles the final segment of a `[[a.b.c]]` header: appends a fresh
    /// entry to the named array of tables, creating the array on first use.
    fn define_array_entry(
        &mut self,
        parent: &mut Table,
        key: Key,
        header: Span,
    ) -> Result<(), ParseError> {
        let Some(idx) = parent.find_index(&key.name) else {
            let mut array = Array::new();
            array.set_array_of_tables();
            array.push(Value::Table(new_array_member()));
            parent.insert(key.name, Value::Array(array));
            return Ok(());
        };
        match parent.value_at_mut(idx) {
            Value::Array(array) if array.is_array_of_tables() => {
                array.push(Value::Table(new_array_member()));
                Ok(())
            }
            // A literal array cannot be extended by headers.
            Value::Array(_) => Err(self.set_error(
                header.start as usize,
                Some(header.end as usize),
                ErrorKind::FrozenNamespace { key: key.name },
            )),
            Value::Table(_) => Err(self.set_error(
                header.start as usize,
                Some(header.end as usize),
                ErrorKind::RedefineAsArray,
            )),
            _ => Err(self.set_error(
                key.span.start as usize,
                Some(key.span.end as usize),
                ErrorKind::DuplicateKey { key: key.name },
            )),
        }
    }

    /// Insert a value into a table, checking for duplicates.
    fn insert_value(
        &mut self,
        table: &mut Table,
        key: Key,
        value: Value,
    ) -> Result<(), ParseError> {
        if table.contains_key(&key.name) {
            return Err(self.set_error(
                key.span.start as usize,
                Some(key.span.end as usize),
                ErrorKind::DuplicateKey { key: key.name },
            ));
        }
        table.insert(key.name, value);
        Ok(())
    }

    /// Walks the current header namespace down from the root, entering the
    /// most recent entry of any array of tables on the way.
    fn open_namespace<'t>(&self, root: &'t mut Table) -> &'t mut Table {
        let mut current = root;
        for segment in &self.header_path {
            // The path was fully validated when its header line was
            // processed, so every step exists and is a table or an array
            // of tables.
            let value = current
                .get_mut(segment)
                .expect("header namespace disappeared");
            current = match value {
                Value::Table(table) => table,
                Value::Array(array) => match array.last_mut() {
                    Some(Value::Table(table)) => table,
                    _ => unreachable!("array of tables without a table entry"),
                },
                _ => unreachable!("header namespace is not a table"),
            };
        }
        current
    }

    fn process_table_header(&mut self, root: &mut Table) -> Result<(), ParseError> {
        let header_start = self.cursor;
        self.expect_byte(b'[')?;
        let is_array = self.eat_byte(b'[');
        self.eat_whitespace();

        let mut path: Vec<String> = Vec::new();
        let mut key = self.read_table_key()?;
        let mut current: &mut Table = root;
        while self.eat_whitespace_to() == Some(b'.') {
            self.cursor += 1;
            self.eat_whitespace();
            path.push(key.name.clone());
            current = self.descend(current, key, Descend::Header)?;
            key = self.read_table_key()?;
        }
        self.expect_byte(b']')?;
        if is_array {
            self.expect_byte(b']')?;
        }
        let header = Span::new(header_start as u32, self.cursor as u32);

        self.eat_whitespace();
        if !self.eat_comment()? {
            self.eat_newline_or_eof()?;
        }

        path.push(key.name.clone());
        if is_array {
            self.define_array_entry(current, key, header)?;
        } else {
            self.define_table(current, key, header)?;
        }
        self.header_path = path;
        Ok(())
    }

    fn process_key_value(&mut self, root: &mut Table) -> Result<(), ParseError> {
        let mut table = self.open_namespace(root);

        let mut key = self.read_table_key()?;
        self.eat_whitespace();
        while self.eat_byte(b'.') {
            self.eat_whitespace();
            table = self.descend(table, key, Descend::KeyValue)?;
            key = self.read_table_key()?;
            self.eat_whitespace();
        }

        self.expect_byte(b'=')?;
        self.eat_whitespace();
        let value = self.value(MAX_RECURSION_DEPTH)?;

        self.eat_whitespace();
        if !self.eat_comment()? {
            self.eat_newline_or_eof()?;
        }

        self.insert_value(table, key, value)
    }

    fn parse_document(&mut self, root: &mut Table) -> Result<(), ParseError> {
        loop {
            self.eat_whitespace();
            if self.eat_comment()? {
                continue;
            }
            if self.eat_newline() {
                continue;
            }
            match self.peek_byte() {
                None => break,
                Some(b'[') => self.process_table_header(root)?,
                Some(b'\r') => {
                    return Err(self.set_error(self.cursor, None, ErrorKind::Unexpected('\r')));
                }
                Some(_) => self.process_key_value(root)?,
            }
        }
        Ok(())
    }
}

fn new_array_member() -> Table {
    let mut table = Table::new();
    table.set_explicit();
    table.set_array_member();
    table
}

/// Parses a TOML document into a [`Table`] using the default float
/// representation ([`f64`]).
///
/// ```
/// let table = toml_tree::parse("key = 'value'")?;
/// assert_eq!(table.get("key").and_then(|v| v.as_str()), Some("value"));
/// # Ok::<(), toml_tree::Error>(())
/// ```
pub fn parse(source: &str) -> Result<Table, Error> {
    parse_with_float(source, &default_parse_float)
}

/// Parses a TOML document, converting floats through the given hook.
///
/// The hook receives each float's lexical form with underscores removed and
/// the sign preserved, and decides its in-tree representation; returning
/// [`Value::Table`] or [`Value::Array`] fails the parse.
///
/// ```
/// use toml_tree::Value;
///
/// // Keep floats in their exact source spelling.
/// let table = toml_tree::parse_with_float(
///     "precision = 0.982_492",
///     &|text| Value::String(text.to_owned()),
/// )?;
/// assert_eq!(
///     table.get("precision").and_then(|v| v.as_str()),
///     Some("0.982492"),
/// );
/// # Ok::<(), toml_tree::Error>(())
/// ```
pub fn parse_with_float(source: &str, parse_float: &ParseFloat) -> Result<Table, Error> {
    if source.len() >= MAX_SIZE {
        return Err(Error::new(ErrorKind::FileTooLarge, Span::new(0, 0), source));
    }
    let mut root = Table::new();
    let mut parser = Parser::new(source, parse_float);
    match parser.parse_document(&mut root) {
        Ok(()) => Ok(root),
        Err(ParseError) => Err(parser.take_error()),
    }
}

/// Parses a TOML document from UTF-8 bytes.
///
/// The bytes must be valid UTF-8 and must not begin with a byte-order
/// mark; TOML documents carry neither.
pub fn parse_bytes(source: &[u8]) -> Result<Table, Error> {
    if source.starts_with(b"\xef\xbb\xbf") {
        return Err(Error {
            kind: ErrorKind::ByteOrderMark,
            span: Span::new(0, 3),
            line: 1,
            column: 1,
        });
    }
    match std::str::from_utf8(source) {
        Ok(text) => parse(text),
        Err(err) => {
            let at = err.valid_up_to();
            let prefix = std::str::from_utf8(&source[..at]).unwrap_or("");
            let (line, column) = crate::error::line_col(prefix, at);
            Err(Error {
                kind: ErrorKind::InvalidUtf8,
                span: Span::new(at as u32, (at + 1).min(source.len()) as u32),
                line,
                column,
            })
        }
    }
}

#[inline]
fn is_keylike_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn byte_describe(b: u8) -> &'static str {
    match b {
        b'\n' => "a newline",
        b' ' | b'\t' => "whitespace",
        b'=' => "an equals",
        b'.' => "a period",
        b',' => "a comma",
        b':' => "a colon",
        b'+' => "a plus",
        b'{' => "a left brace",
        b'}' => "a right brace",
        b'[' => "a left bracket",
        b']' => "a right bracket",
        b'\'' | b'"' => "a string",
        _ if is_keylike_byte(b) => "an identifier",
        _ => "a character",
    }
}

/// Parses a decimal integer token. Underscores must sit between digits,
/// leading zeros are rejected, and the value must fit `i64` after the sign
/// is applied (so `-9223372036854775808` parses and its positive twin does
/// not).
fn decimal_integer(bytes: &[u8], negative: bool) -> Option<i64> {
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    let mut acc: u64 = 0;
    let mut prev_underscore = true;
    for &b in bytes {
        if b == b'_' {
            if prev_underscore {
                return None;
            }
            prev_underscore = true;
            continue;
        }
        if !b.is_ascii_digit() {
            return None;
        }
        prev_underscore = false;
        acc = acc.checked_mul(10)?.checked_add((b - b'0') as u64)?;
    }
    if prev_underscore {
        return None;
    }
    let limit = if negative {
        i64::MAX as u64 + 1
    } else {
        i64::MAX as u64
    };
    if acc > limit {
        return None;
    }
    Some(if negative {
        (acc as i64).wrapping_neg()
    } else {
        acc as i64
    })
}

/// Parses the body of a base-prefixed integer (after `0x`, `0o` or `0b`).
fn radix_integer(bytes: &[u8], radix: u32) -> Option<i64> {
    let mut acc: u64 = 0;
    let mut prev_underscore = true;
    for &b in bytes {
        if b == b'_' {
            if prev_underscore {
                return None;
            }
            prev_underscore = true;
            continue;
        }
        let digit = (b as char).to_digit(radix)?;
        prev_underscore = false;
        acc = acc
            .checked_mul(radix as u64)?
            .checked_add(digit as u64)?;
    }
    if prev_underscore {
        return None;
    }
    if acc > i64::MAX as u64 {
        return None;
    }
    Some(acc as i64)
}

/// Copies `bytes` into `out`, dropping underscores. An underscore must be
/// flanked by ASCII digits.
fn push_stripping_underscores(out: &mut String, bytes: &[u8]) -> bool {
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'_' {
            let prev_digit = i > 0 && bytes[i - 1].is_ascii_digit();
            let next_digit = bytes.get(i + 1).is_some_and(|b| b.is_ascii_digit());
            if !prev_digit || !next_digit {
                return false;
            }
            continue;
        }
        out.push(b as char);
    }
    true
}

/// Validates the complete lexical form of a TOML float with underscores
/// already removed: optional sign, integer part without leading zeros, then
/// a fraction, an exponent, or both.
fn is_valid_float(bytes: &[u8]) -> bool {
    let mut rest = bytes;
    if let [b'+' | b'-', tail @ ..] = rest {
        rest = tail;
    }
    let Some((first, mut tail)) = rest.split_first() else {
        return false;
    };
    if !first.is_ascii_digit() {
        return false;
    }
    if *first == b'0' && tail.first().is_some_and(|b| b.is_ascii_digit()) {
        return false;
    }
    while tail.first().is_some_and(|b| b.is_ascii_digit()) {
        tail = &tail[1..];
    }
    let mut has_float_part = false;
    if let [b'.', more @ ..] = tail {
        if !more.first().is_some_and(|b| b.is_ascii_digit()) {
            return false;
        }
        tail = more;
        while tail.first().is_some_and(|b| b.is_ascii_digit()) {
            tail = &tail[1..];
        }
        has_float_part = true;
    }
    if let [b'e' | b'E', more @ ..] = tail {
        let mut exp = more;
        if let [b'+' | b'-', after_sign @ ..] = exp {
            exp = after_sign;
        }
        if !exp.first().is_some_and(|b| b.is_ascii_digit()) {
            return false;
        }
        while exp.first().is_some_and(|b| b.is_ascii_digit()) {
            exp = &exp[1..];
        }
        tail = exp;
        has_float_part = true;
    }
    tail.is_empty() && has_float_part
}
