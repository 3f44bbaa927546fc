//! Dialect-aware statement splitting.
//!
//! A character-level scanner walks the batch, skipping over quoted regions
//! and comments so that statement terminators inside them are never taken as
//! boundaries. The scanner works the same over an in-memory string or an
//! incremental reader; the streaming variant keeps only the current
//! statement in memory, so arbitrarily large dump files can be split.

use std::io::{BufRead, BufReader, Read};

use crate::classifier;
use crate::dialect::Dialect;
use crate::error::Error;

/// A single statement split from a multi-statement batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitStatement {
    pub text: String,
    /// 1-based line number of the line the statement ends on. Non-decreasing
    /// within a batch.
    pub last_line: usize,
    /// The statement carries no executable content, e.g. `/* comment */;`
    /// or a bare `;`. Empty statements are dropped from results but still
    /// advance line accounting.
    pub is_empty: bool,
}

/// Splits a batch into individually executable statements.
///
/// For the MySQL family, `DELIMITER` directives are consumed: they disappear
/// from the result and every statement terminated with a non-`;` active
/// delimiter is rewritten to end in `;`. Oracle statements lose trailing
/// whitespace and semicolons. Whitespace/comment-only statements are
/// dropped.
pub fn split(dialect: Dialect, text: &str) -> Result<Vec<SplitStatement>, Error> {
    let mut scanner = Scanner::from_str(text);
    collect(dialect, &mut scanner, true, |_| Ok(()))
}

/// Splits a batch without delimiter normalization: `DELIMITER` directives
/// appear in the result as ordinary statements and custom-delimited
/// statements keep their original terminator. Still honors the active
/// delimiter when locating boundaries.
pub fn split_raw(dialect: Dialect, text: &str) -> Result<Vec<SplitStatement>, Error> {
    let mut scanner = Scanner::from_str(text);
    collect(dialect, &mut scanner, false, |_| Ok(()))
}

/// Streaming variant of [`split`]: reads the source incrementally and
/// invokes `on_statement` for every statement as soon as its boundary is
/// found, then returns the full list. Results are identical to the batch
/// variant on the same input.
pub fn split_stream<R, F>(dialect: Dialect, src: R, on_statement: F) -> Result<Vec<SplitStatement>, Error>
where
    R: Read,
    F: FnMut(&SplitStatement) -> Result<(), Error>,
{
    let mut reader = BufReader::new(src);
    let mut scanner = Scanner::from_reader(&mut reader);
    collect(dialect, &mut scanner, true, on_statement)
}

fn collect<F>(
    dialect: Dialect,
    scanner: &mut Scanner<'_>,
    normalize: bool,
    mut on_statement: F,
) -> Result<Vec<SplitStatement>, Error>
where
    F: FnMut(&SplitStatement) -> Result<(), Error>,
{
    let mut result = Vec::new();
    let normalize = normalize && dialect.is_mysql_family();
    // The active delimiter as seen by the rewrite pass; the scanner tracks
    // its own copy for boundary detection.
    let mut active_delimiter = String::from(";");
    scanner.run(dialect, &mut |stmt| {
        let stmt = if normalize {
            if classifier::is_delimiter_directive(&stmt.text) {
                active_delimiter = classifier::extract_delimiter(&stmt.text)?;
                return Ok(());
            }
            if active_delimiter != ";" {
                let trimmed = stmt
                    .text
                    .strip_suffix(active_delimiter.as_str())
                    .unwrap_or(&stmt.text);
                SplitStatement {
                    text: format!("{};", trimmed),
                    ..stmt
                }
            } else {
                stmt
            }
        } else {
            stmt
        };
        if stmt.is_empty {
            return Ok(());
        }
        let stmt = if dialect == Dialect::Oracle {
            SplitStatement {
                text: stmt.text.trim_end_matches([' ', '\n', '\t', ';']).to_string(),
                ..stmt
            }
        } else {
            stmt
        };
        on_statement(&stmt)?;
        result.push(stmt);
        Ok(())
    })?;
    Ok(result)
}

struct Scanner<'a> {
    buf: Vec<char>,
    /// Cursor into `buf`; the current statement always starts at index 0.
    pos: usize,
    line: usize,
    has_content: bool,
    delimiter: Vec<char>,
    reader: Option<&'a mut dyn BufRead>,
    eof: bool,
}

impl<'a> Scanner<'a> {
    fn from_str(text: &str) -> Self {
        Scanner {
            buf: text.chars().collect(),
            pos: 0,
            line: 1,
            has_content: false,
            delimiter: vec![';'],
            reader: None,
            eof: true,
        }
    }

    fn from_reader(reader: &'a mut dyn BufRead) -> Self {
        Scanner {
            buf: Vec::new(),
            pos: 0,
            line: 1,
            has_content: false,
            delimiter: vec![';'],
            reader: Some(reader),
            eof: false,
        }
    }

    fn fill_to(&mut self, index: usize) -> Result<(), Error> {
        while self.buf.len() <= index && !self.eof {
            match self.reader.as_mut() {
                None => self.eof = true,
                Some(reader) => {
                    let mut chunk = String::new();
                    if reader.read_line(&mut chunk)? == 0 {
                        self.eof = true;
                    } else {
                        self.buf.extend(chunk.chars());
                    }
                }
            }
        }
        Ok(())
    }

    fn peek(&mut self, offset: usize) -> Result<Option<char>, Error> {
        let index = self.pos + offset;
        self.fill_to(index)?;
        Ok(self.buf.get(index).copied())
    }

    fn advance(&mut self) {
        if let Some(&c) = self.buf.get(self.pos) {
            if c == '\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
    }

    fn emit(&mut self, is_empty: bool) -> SplitStatement {
        let text: String = self.buf[..self.pos].iter().collect();
        self.buf.drain(..self.pos);
        self.pos = 0;
        self.has_content = false;
        SplitStatement {
            text,
            last_line: self.line,
            is_empty,
        }
    }

    fn matches_delimiter(&mut self) -> Result<bool, Error> {
        for i in 0..self.delimiter.len() {
            let expected = self.delimiter[i];
            if self.peek(i)? != Some(expected) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn at_keyword(&mut self, word: &str) -> Result<bool, Error> {
        let mut len = 0;
        for expected in word.chars() {
            match self.peek(len)? {
                Some(c) if c.eq_ignore_ascii_case(&expected) => len += 1,
                _ => return Ok(false),
            }
        }
        match self.peek(len)? {
            Some(c) if c.is_alphanumeric() || c == '_' => Ok(false),
            _ => Ok(true),
        }
    }

    fn run(
        &mut self,
        dialect: Dialect,
        sink: &mut dyn FnMut(SplitStatement) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let mysql = dialect.is_mysql_family();
        let postgres = dialect.is_postgres_family();
        loop {
            // A DELIMITER directive is only recognized where a statement has
            // not started yet; it runs to the end of its line and changes
            // the terminator for the rest of the scan.
            if mysql && !self.has_content && self.at_keyword("DELIMITER")? {
                self.consume_to_line_end()?;
                let directive = self.emit(false);
                self.delimiter = classifier::extract_delimiter(&directive.text)?.chars().collect();
                sink(directive)?;
                continue;
            }
            if self.matches_delimiter()? {
                let is_empty = !self.has_content;
                for _ in 0..self.delimiter.len() {
                    self.advance();
                }
                sink(self.emit(is_empty))?;
                continue;
            }
            match self.peek(0)? {
                None => {
                    if self.pos > 0 {
                        let is_empty = !self.has_content;
                        sink(self.emit(is_empty))?;
                    }
                    return Ok(());
                }
                Some('\'') => {
                    self.has_content = true;
                    self.scan_quoted('\'', mysql)?;
                }
                Some('"') => {
                    self.has_content = true;
                    self.scan_quoted('"', mysql)?;
                }
                Some('`') if mysql => {
                    self.has_content = true;
                    self.scan_quoted('`', false)?;
                }
                Some('#') if mysql => self.consume_to_line_end()?,
                Some('-') if self.peek(1)? == Some('-') => {
                    // MySQL only treats `--` as a comment opener when
                    // whitespace (or the end of input) follows.
                    let third = self.peek(2)?;
                    if !mysql || !matches!(third, Some(c) if !c.is_whitespace()) {
                        self.consume_to_line_end()?;
                    } else {
                        self.has_content = true;
                        self.advance();
                    }
                }
                Some('/') if self.peek(1)? == Some('*') => self.scan_block_comment(postgres)?,
                Some('$') if postgres => {
                    self.has_content = true;
                    if !self.scan_dollar_quoted()? {
                        self.advance();
                    }
                }
                Some(c) => {
                    if !c.is_whitespace() {
                        self.has_content = true;
                    }
                    self.advance();
                }
            }
        }
    }

    /// Consumes up to, but not including, the next newline.
    fn consume_to_line_end(&mut self) -> Result<(), Error> {
        while let Some(c) = self.peek(0)? {
            if c == '\n' {
                break;
            }
            self.advance();
        }
        Ok(())
    }

    fn scan_quoted(&mut self, quote: char, backslash_escapes: bool) -> Result<(), Error> {
        self.advance();
        loop {
            match self.peek(0)? {
                None => {
                    return Err(Error::MalformedInput(format!(
                        "unterminated quoted region opened with {:?} at line {}",
                        quote, self.line
                    )))
                }
                Some(c) if c == quote => {
                    self.advance();
                    // A doubled quote stays inside the region.
                    if self.peek(0)? == Some(quote) {
                        self.advance();
                    } else {
                        return Ok(());
                    }
                }
                Some('\\') if backslash_escapes => {
                    self.advance();
                    if self.peek(0)?.is_some() {
                        self.advance();
                    }
                }
                Some(_) => self.advance(),
            }
        }
    }

    fn scan_block_comment(&mut self, nested: bool) -> Result<(), Error> {
        self.advance();
        self.advance();
        let mut depth = 1usize;
        loop {
            match self.peek(0)? {
                None => {
                    return Err(Error::MalformedInput(format!(
                        "unterminated block comment at line {}",
                        self.line
                    )))
                }
                Some('*') if self.peek(1)? == Some('/') => {
                    self.advance();
                    self.advance();
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some('/') if nested && self.peek(1)? == Some('*') => {
                    self.advance();
                    self.advance();
                    depth += 1;
                }
                Some(_) => self.advance(),
            }
        }
    }

    /// Attempts to scan a `$tag$ ... $tag$` region. Returns false without
    /// consuming anything when the cursor is not at a valid opener, so a
    /// lone `$` passes through as ordinary text.
    fn scan_dollar_quoted(&mut self) -> Result<bool, Error> {
        let mut tag = Vec::new();
        let mut i = 1;
        loop {
            match self.peek(i)? {
                Some('$') => break,
                Some(c) if c.is_alphanumeric() || c == '_' => {
                    tag.push(c);
                    i += 1;
                }
                _ => return Ok(false),
            }
        }
        let opener_len = tag.len() + 2;
        for _ in 0..opener_len {
            self.advance();
        }
        'scan: loop {
            match self.peek(0)? {
                None => {
                    return Err(Error::MalformedInput(format!(
                        "unterminated dollar-quoted string at line {}",
                        self.line
                    )))
                }
                Some('$') => {
                    for (j, &t) in tag.iter().enumerate() {
                        if self.peek(j + 1)? != Some(t) {
                            self.advance();
                            continue 'scan;
                        }
                    }
                    if self.peek(tag.len() + 1)? != Some('$') {
                        self.advance();
                        continue;
                    }
                    for _ in 0..opener_len {
                        self.advance();
                    }
                    return Ok(true);
                }
                Some(_) => self.advance(),
            }
        }
    }
}
