//! Reader for the JavaScript literal subset Doxygen writes into its search
//! files, tracking the source span of every value.
//!
//! Per-character index files hold a single `var searchData = [...];`
//! assignment made of nested arrays, quoted strings and integer flags.
//! `searchdata.js` adds object literals keyed by integers. Anything outside
//! that subset is rejected rather than evaluated.

use crate::error::{FormatError, FormatErrorKind};

/// Deepest array/object nesting accepted. Doxygen tables are four deep.
pub const MAX_DEPTH: usize = 64;

/// Byte span in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span for values that were constructed rather than parsed
    pub fn synthetic() -> Self {
        Self {
            start: usize::MAX,
            end: usize::MAX,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.start == usize::MAX
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::synthetic()
    }
}

/// The kind of literal value
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralKind {
    /// A single- or double-quoted string, escapes resolved
    String(String),
    /// An integer
    Int(i64),
    /// `[a, b, ...]`
    Array(Vec<Literal>),
    /// `{key: value, ...}`; keys keep their source order
    Object(Vec<(String, Literal)>),
}

/// A literal value with source span
#[derive(Debug, Clone)]
pub struct Literal {
    pub kind: LiteralKind,
    pub span: Span,
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Literal {
    pub fn with_span(kind: LiteralKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            LiteralKind::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match &self.kind {
            LiteralKind::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Literal]> {
        match &self.kind {
            LiteralKind::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, Literal)]> {
        match &self.kind {
            LiteralKind::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Short name of the value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            LiteralKind::String(_) => "a string",
            LiteralKind::Int(_) => "an integer",
            LiteralKind::Array(_) => "an array",
            LiteralKind::Object(_) => "an object",
        }
    }
}

/// A top-level `var name = value;` statement
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub value: Literal,
}

/// Parser for search-index literals
pub struct Parser<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Parser {
            input,
            chars: input.char_indices().peekable(),
            current_pos: 0,
            depth: 0,
        }
    }

    /// Parse a single literal, optionally followed by `;`, and nothing else.
    pub fn parse(&mut self) -> Result<Literal, FormatError> {
        let value = self.parse_value()?;
        self.skip_trivia()?;
        if self.peek_char() == Some(';') {
            self.advance();
            self.skip_trivia()?;
        }
        if let Some(ch) = self.peek_char() {
            return Err(self.error_here(FormatErrorKind::TrailingInput(ch)));
        }
        Ok(value)
    }

    /// Parse a sequence of `var name = literal;` statements.
    pub fn parse_assignments(&mut self) -> Result<Vec<Assignment>, FormatError> {
        let mut statements = Vec::new();

        loop {
            self.skip_trivia()?;
            if self.is_at_end() {
                break;
            }
            statements.push(self.parse_assignment()?);
        }

        Ok(statements)
    }

    fn parse_assignment(&mut self) -> Result<Assignment, FormatError> {
        let mut name = self.parse_identifier()?;
        if matches!(name.as_str(), "var" | "let" | "const") {
            self.skip_trivia()?;
            name = self.parse_identifier()?;
        }

        self.skip_trivia()?;
        self.expect('=', "'='")?;
        let value = self.parse_value()?;

        self.skip_trivia()?;
        if self.peek_char() == Some(';') {
            self.advance();
        }

        Ok(Assignment { name, value })
    }

    fn parse_value(&mut self) -> Result<Literal, FormatError> {
        self.skip_trivia()?;
        match self.peek_char() {
            None => Err(self.error_here(FormatErrorKind::UnexpectedEof)),
            Some('[') => self.parse_array(),
            Some('{') => self.parse_object(),
            Some('\'' | '"') => self.parse_string(),
            Some(ch) if ch == '-' || ch.is_ascii_digit() => self.parse_int(),
            Some(found) => Err(self.error_here(FormatErrorKind::UnexpectedChar {
                found,
                expected: "a value",
            })),
        }
    }

    fn parse_array(&mut self) -> Result<Literal, FormatError> {
        let start_pos = self.current_pos;
        self.enter_nested()?;
        self.expect('[', "'['")?;
        let mut items = Vec::new();

        loop {
            self.skip_trivia()?;
            match self.peek_char() {
                None => return Err(self.error_from(FormatErrorKind::UnclosedArray, start_pos)),
                Some(']') => {
                    self.advance();
                    break;
                }
                Some(_) => {}
            }

            items.push(self.parse_value()?);

            if items.len() % 1000 == 0 {
                log::trace!(
                    "Parsed {} items in array at position {start_pos}",
                    items.len()
                );
            }

            self.skip_trivia()?;
            match self.peek_char() {
                Some(',') => self.advance(),
                Some(']') => {}
                None => return Err(self.error_from(FormatErrorKind::UnclosedArray, start_pos)),
                Some(found) => {
                    return Err(self.error_here(FormatErrorKind::UnexpectedChar {
                        found,
                        expected: "',' or ']'",
                    }));
                }
            }
        }

        self.depth -= 1;
        Ok(Literal::with_span(
            LiteralKind::Array(items),
            Span::new(start_pos, self.current_pos),
        ))
    }

    fn parse_object(&mut self) -> Result<Literal, FormatError> {
        let start_pos = self.current_pos;
        self.enter_nested()?;
        self.expect('{', "'{'")?;
        let mut fields = Vec::new();

        loop {
            self.skip_trivia()?;
            match self.peek_char() {
                None => return Err(self.error_from(FormatErrorKind::UnclosedObject, start_pos)),
                Some('}') => {
                    self.advance();
                    break;
                }
                Some(_) => {}
            }

            let key = self.parse_object_key()?;
            self.skip_trivia()?;
            self.expect(':', "':'")?;
            let value = self.parse_value()?;
            fields.push((key, value));

            self.skip_trivia()?;
            match self.peek_char() {
                Some(',') => self.advance(),
                Some('}') => {}
                None => return Err(self.error_from(FormatErrorKind::UnclosedObject, start_pos)),
                Some(found) => {
                    return Err(self.error_here(FormatErrorKind::UnexpectedChar {
                        found,
                        expected: "',' or '}'",
                    }));
                }
            }
        }

        self.depth -= 1;
        Ok(Literal::with_span(
            LiteralKind::Object(fields),
            Span::new(start_pos, self.current_pos),
        ))
    }

    fn parse_object_key(&mut self) -> Result<String, FormatError> {
        match self.peek_char() {
            Some('\'' | '"') => {
                let key = self.parse_string()?;
                Ok(key.as_str().unwrap_or_default().to_string())
            }
            Some(ch) if ch == '-' || ch.is_ascii_digit() => {
                let key = self.parse_int()?;
                Ok(key.as_int().unwrap_or_default().to_string())
            }
            _ => self.parse_identifier(),
        }
    }

    fn parse_identifier(&mut self) -> Result<String, FormatError> {
        let start = self.current_pos;
        match self.peek_char() {
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' || ch == '$' => self.advance(),
            Some(found) => {
                return Err(self.error_here(FormatErrorKind::UnexpectedChar {
                    found,
                    expected: "an identifier",
                }));
            }
            None => return Err(self.error_here(FormatErrorKind::UnexpectedEof)),
        }
        while let Some(ch) = self.peek_char() {
            if !(ch.is_ascii_alphanumeric() || ch == '_' || ch == '$') {
                break;
            }
            self.advance();
        }
        Ok(self.input[start..self.current_pos].to_string())
    }

    fn parse_int(&mut self) -> Result<Literal, FormatError> {
        let start = self.current_pos;
        if self.peek_char() == Some('-') {
            self.advance();
        }
        // Consume the whole token so "1.5" or "0x1" are reported as one bad number
        while let Some(ch) = self.peek_char() {
            if !(ch.is_ascii_alphanumeric() || ch == '.') {
                break;
            }
            self.advance();
        }

        let text = &self.input[start..self.current_pos];
        let span = Span::new(start, self.current_pos);
        match text.parse::<i64>() {
            Ok(n) => Ok(Literal::with_span(LiteralKind::Int(n), span)),
            Err(_) => Err(FormatError::new(
                FormatErrorKind::InvalidNumber(text.to_string()),
                span,
                Some(self.input),
            )),
        }
    }

    fn parse_string(&mut self) -> Result<Literal, FormatError> {
        let start_pos = self.current_pos;
        let quote = match self.peek_char() {
            Some(q @ ('\'' | '"')) => q,
            Some(found) => {
                return Err(self.error_here(FormatErrorKind::UnexpectedChar {
                    found,
                    expected: "a quote",
                }));
            }
            None => return Err(self.error_here(FormatErrorKind::UnexpectedEof)),
        };
        self.advance();
        let mut result = String::new();

        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    return Err(self.error_from(FormatErrorKind::UnterminatedString, start_pos));
                }
                Some(ch) if ch == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    self.parse_escape(&mut result, start_pos)?;
                }
                Some(ch) => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Ok(Literal::with_span(
            LiteralKind::String(result),
            Span::new(start_pos, self.current_pos),
        ))
    }

    /// Resolve the escape following a backslash and append it to `out`.
    fn parse_escape(&mut self, out: &mut String, string_start: usize) -> Result<(), FormatError> {
        let escape_start = self.current_pos.saturating_sub(1);
        let Some(ch) = self.peek_char() else {
            return Err(self.error_from(FormatErrorKind::UnterminatedString, string_start));
        };
        self.advance();

        match ch {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            // Line continuation
            '\n' => {}
            'x' => {
                let code = self.read_hex(2, escape_start)?;
                out.push(self.char_from(code, escape_start)?);
            }
            'u' => {
                let code = self.read_unicode_escape(escape_start)?;
                out.push(self.char_from(code, escape_start)?);
            }
            // Identity escapes: \\ \' \" \/ and anything else
            other => out.push(other),
        }
        Ok(())
    }

    fn read_unicode_escape(&mut self, escape_start: usize) -> Result<u32, FormatError> {
        if self.peek_char() == Some('{') {
            self.advance();
            let mut code: u32 = 0;
            let mut digits = 0;
            while let Some(d) = self.peek_char().and_then(|c| c.to_digit(16)) {
                code = code.saturating_mul(16).saturating_add(d);
                digits += 1;
                self.advance();
            }
            if digits == 0 || self.peek_char() != Some('}') {
                return Err(self.error_from(FormatErrorKind::InvalidEscape, escape_start));
            }
            self.advance();
            return Ok(code);
        }

        let high = self.read_hex(4, escape_start)?;
        if !(0xD800..=0xDBFF).contains(&high) {
            return Ok(high);
        }

        // High surrogate: the low half must follow as another \uXXXX
        if !self.input[self.current_pos..].starts_with("\\u") {
            return Err(self.error_from(FormatErrorKind::InvalidEscape, escape_start));
        }
        self.advance();
        self.advance();
        let low = self.read_hex(4, escape_start)?;
        if !(0xDC00..=0xDFFF).contains(&low) {
            return Err(self.error_from(FormatErrorKind::InvalidEscape, escape_start));
        }
        Ok(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
    }

    fn read_hex(&mut self, digits: usize, escape_start: usize) -> Result<u32, FormatError> {
        let mut value = 0u32;
        for _ in 0..digits {
            match self.peek_char().and_then(|c| c.to_digit(16)) {
                Some(d) => {
                    value = value * 16 + d;
                    self.advance();
                }
                None => return Err(self.error_from(FormatErrorKind::InvalidEscape, escape_start)),
            }
        }
        Ok(value)
    }

    fn char_from(&self, code: u32, escape_start: usize) -> Result<char, FormatError> {
        char::from_u32(code).ok_or_else(|| self.error_from(FormatErrorKind::InvalidEscape, escape_start))
    }

    /// Skip whitespace plus `//` and `/* */` comments.
    fn skip_trivia(&mut self) -> Result<(), FormatError> {
        loop {
            let rest = &self.input[self.current_pos..];
            if rest.starts_with("//") {
                while let Some(ch) = self.peek_char() {
                    self.advance();
                    if ch == '\n' {
                        break;
                    }
                }
            } else if rest.starts_with("/*") {
                let start = self.current_pos;
                match rest[2..].find("*/") {
                    Some(close) => {
                        let end = start + 2 + close + 2;
                        while self.current_pos < end {
                            self.advance();
                        }
                    }
                    None => {
                        return Err(self.error_from(FormatErrorKind::UnterminatedComment, start));
                    }
                }
            } else if self.peek_char().is_some_and(char::is_whitespace) {
                self.advance();
            } else {
                return Ok(());
            }
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn advance(&mut self) {
        if let Some((pos, ch)) = self.chars.next() {
            self.current_pos = pos + ch.len_utf8();
        }
    }

    fn expect(&mut self, expected: char, description: &'static str) -> Result<(), FormatError> {
        match self.peek_char() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(found) => Err(self.error_here(FormatErrorKind::UnexpectedChar {
                found,
                expected: description,
            })),
            None => Err(self.error_here(FormatErrorKind::UnexpectedEof)),
        }
    }

    fn is_at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    /// Error spanning the next character (or the empty span at EOF).
    fn enter_nested(&mut self) -> Result<(), FormatError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error_here(FormatErrorKind::TooDeep(MAX_DEPTH)));
        }
        self.depth += 1;
        Ok(())
    }

    fn error_here(&mut self, kind: FormatErrorKind) -> FormatError {
        let start = self.current_pos;
        let end = start + self.peek_char().map(char::len_utf8).unwrap_or(0);
        FormatError::new(kind, Span::new(start, end), Some(self.input))
    }

    /// Error spanning from `start` to the current position.
    fn error_from(&self, kind: FormatErrorKind, start: usize) -> FormatError {
        FormatError::new(
            kind,
            Span::new(start, self.current_pos.max(start + 1)),
            Some(self.input),
        )
    }
}

/// Parse a bare literal.
pub fn parse(input: &str) -> Result<Literal, FormatError> {
    log::trace!("Parsing literal from {} bytes of input", input.len());
    let result = Parser::new(input).parse();
    if let Err(e) = &result {
        log::trace!("Failed to parse literal: {e}");
    }
    result
}

/// Parse a script made of `var name = literal;` statements.
pub fn parse_assignments(input: &str) -> Result<Vec<Assignment>, FormatError> {
    log::trace!("Parsing assignments from {} bytes of input", input.len());
    let result = Parser::new(input).parse_assignments();
    match &result {
        Ok(statements) => log::trace!("Parsed {} assignments", statements.len()),
        Err(e) => log::trace!("Failed to parse assignments: {e}"),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string(s: &str) -> LiteralKind {
        LiteralKind::String(s.to_string())
    }

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse("'hello'").unwrap().kind, string("hello"));
        assert_eq!(parse("\"hello\"").unwrap().kind, string("hello"));
        assert_eq!(parse("1").unwrap().kind, LiteralKind::Int(1));
        assert_eq!(parse("-42").unwrap().kind, LiteralKind::Int(-42));
    }

    #[test]
    fn test_parse_string_escapes() {
        assert_eq!(parse(r"'it\'s'").unwrap().kind, string("it's"));
        assert_eq!(parse(r#""a\"b""#).unwrap().kind, string("a\"b"));
        assert_eq!(parse(r"'back\\slash'").unwrap().kind, string("back\\slash"));
        assert_eq!(parse(r"'\x7e'").unwrap().kind, string("~"));
        assert_eq!(parse(r"'ü'").unwrap().kind, string("ü"));
        assert_eq!(parse(r"'\u{1F525}'").unwrap().kind, string("🔥"));
        assert_eq!(parse(r"'🔥'").unwrap().kind, string("🔥"));
        assert_eq!(parse(r"'a\/b'").unwrap().kind, string("a/b"));
    }

    #[test]
    fn test_parse_bad_escapes() {
        assert_eq!(
            parse(r"'\x7'").unwrap_err().kind,
            FormatErrorKind::InvalidEscape
        );
        assert_eq!(
            parse(r"'\ud83d'").unwrap_err().kind,
            FormatErrorKind::InvalidEscape
        );
        assert_eq!(
            parse(r"'\u{}'").unwrap_err().kind,
            FormatErrorKind::InvalidEscape
        );
    }

    #[test]
    fn test_parse_nested_arrays() {
        let parsed = parse("['_7ekey',['~Key',['../a.html#x',1,'esapi::Key']]]").unwrap();
        let items = parsed.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_str(), Some("_7ekey"));

        let body = items[1].as_array().unwrap();
        assert_eq!(body[0].as_str(), Some("~Key"));
        let target = body[1].as_array().unwrap();
        assert_eq!(target[1].as_int(), Some(1));
        assert_eq!(target[2].as_str(), Some("esapi::Key"));
    }

    #[test]
    fn test_trailing_comma_and_comments() {
        let input = r#"
        // generated file
        [
          1, /* inline */ 2,
          3,
        ];
        "#;
        let parsed = parse(input).unwrap();
        let ints: Vec<_> = parsed
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Literal::as_int)
            .collect();
        assert_eq!(ints, vec![1, 2, 3]);
    }

    #[test]
    fn test_parse_object() {
        let parsed = parse("{ 0: \"all\", 'one': 1, two: [] }").unwrap();
        let fields = parsed.as_object().unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].0, "0");
        assert_eq!(fields[0].1.as_str(), Some("all"));
        assert_eq!(fields[1].0, "one");
        assert_eq!(fields[2].0, "two");
        assert_eq!(fields[2].1.kind, LiteralKind::Array(vec![]));
    }

    #[test]
    fn test_parse_assignments() {
        let input = "var searchData=\n[\n  ['a',['A',['a.html',1,'']]]\n];\n\nvar other = {1: 'x'};";
        let statements = parse_assignments(input).unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].name, "searchData");
        assert!(statements[0].value.as_array().is_some());
        assert_eq!(statements[1].name, "other");
        assert!(statements[1].value.as_object().is_some());
    }

    #[test]
    fn test_span_tracking() {
        let input = "['_7ecipher', 'x']";
        let parsed = parse(input).unwrap();
        assert_eq!(parsed.span, Span::new(0, input.len()));

        let items = parsed.as_array().unwrap();
        assert_eq!(&input[items[0].span.start..items[0].span.end], "'_7ecipher'");
        assert_eq!(&input[items[1].span.start..items[1].span.end], "'x'");
    }

    #[test]
    fn test_unterminated_string() {
        let err = parse("['abc").unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::UnterminatedString);
        assert_eq!(err.span.start, 1);

        let err = parse("['abc\n']").unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::UnterminatedString);
    }

    #[test]
    fn test_unclosed_array() {
        let err = parse("[1, [2, 3]").unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::UnclosedArray);
        assert_eq!(err.span.start, 0);
    }

    #[test]
    fn test_missing_separator() {
        let err = parse("[1 2]").unwrap_err();
        assert_eq!(
            err.kind,
            FormatErrorKind::UnexpectedChar {
                found: '2',
                expected: "',' or ']'"
            }
        );
        let pos = err.position.unwrap();
        assert_eq!((pos.line, pos.column), (1, 4));
    }

    #[test]
    fn test_rejects_non_literals() {
        let err = parse("[foo]").unwrap_err();
        assert_eq!(
            err.kind,
            FormatErrorKind::UnexpectedChar {
                found: 'f',
                expected: "a value"
            }
        );
        assert_eq!(
            parse("[1.5]").unwrap_err().kind,
            FormatErrorKind::InvalidNumber("1.5".into())
        );
    }

    #[test]
    fn test_trailing_input() {
        assert_eq!(
            parse("[1]; [2]").unwrap_err().kind,
            FormatErrorKind::TrailingInput('[')
        );
    }

    #[test]
    fn test_unterminated_comment() {
        assert_eq!(
            parse("[1] /* open").unwrap_err().kind,
            FormatErrorKind::UnterminatedComment
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse("   ").unwrap_err().kind, FormatErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_nesting_limit() {
        let at_limit = "[".repeat(MAX_DEPTH) + &"]".repeat(MAX_DEPTH);
        assert!(parse(&at_limit).is_ok());

        let deep = "[".repeat(200_000) + &"]".repeat(200_000);
        let err = parse(&deep).unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::TooDeep(MAX_DEPTH));
        assert_eq!(err.position.map(|p| p.column), Some(MAX_DEPTH + 1));

        let objects = "{a:".repeat(MAX_DEPTH + 1);
        assert_eq!(
            parse(&objects).unwrap_err().kind,
            FormatErrorKind::TooDeep(MAX_DEPTH)
        );
    }

    #[test]
    fn test_empty_input_error_has_position() {
        let err = parse("").unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::UnexpectedEof);
        assert_eq!(err.span, Span::new(0, 0));
        assert_eq!(err.position.map(|p| (p.line, p.column)), Some((1, 1)));
    }
}

