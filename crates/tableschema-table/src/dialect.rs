use serde::{Deserialize, Serialize};

use crate::errors::DialectError;

/// CSV dialect description as it appears in a data package resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CsvDialectConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csvddf_version: Option<String>,
    pub delimiter: String,
    pub double_quote: bool,
    pub line_terminator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub null_sequence: Option<String>,
    pub quote_char: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escape_char: Option<String>,
    pub skip_initial_space: bool,
    pub header: bool,
    pub case_sensitive_header: bool,
}

impl Default for CsvDialectConfig {
    fn default() -> Self {
        Self {
            csvddf_version: None,
            delimiter: ",".to_string(),
            double_quote: true,
            line_terminator: "\r\n".to_string(),
            null_sequence: None,
            quote_char: "\"".to_string(),
            escape_char: None,
            skip_initial_space: true,
            header: true,
            case_sensitive_header: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineTerminator {
    #[default]
    CrLf,
    LfCr,
    Lf,
    Cr,
}

impl LineTerminator {
    fn parse(value: &str) -> Result<Self, DialectError> {
        match value {
            "\r\n" => Ok(Self::CrLf),
            "\n\r" => Ok(Self::LfCr),
            "\n" => Ok(Self::Lf),
            "\r" => Ok(Self::Cr),
            other => Err(DialectError::UnsupportedLineTerminator(other.to_string())),
        }
    }

    /// Byte that ends a physical line when reading.
    pub fn line_end(self) -> u8 {
        match self {
            Self::Cr => b'\r',
            _ => b'\n',
        }
    }
}

/// Validated dialect used to split lines into fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvDialect {
    pub delimiter: char,
    pub quote_char: char,
    pub double_quote: bool,
    pub escape_char: Option<char>,
    pub skip_initial_space: bool,
    pub header: bool,
    pub case_sensitive_header: bool,
    pub line_terminator: LineTerminator,
}

impl Default for CsvDialect {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote_char: '"',
            double_quote: true,
            escape_char: None,
            skip_initial_space: true,
            header: true,
            case_sensitive_header: false,
            line_terminator: LineTerminator::CrLf,
        }
    }
}

/// Fields collected so far for a record whose enclosed field continues on the next line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRow {
    fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    Complete(Vec<String>),
    Open(PendingRow),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldState {
    /// Before the first character of a field.
    Unstarted,
    Enclosed,
    /// After the closing quote of an enclosed field.
    Closed,
    Unenclosed,
}

impl CsvDialect {
    pub fn new(config: CsvDialectConfig) -> Result<Self, DialectError> {
        if config.null_sequence.is_some() {
            return Err(DialectError::NullSequenceUnsupported);
        }
        let delimiter = single_char(&config.delimiter)
            .ok_or_else(|| DialectError::InvalidDelimiter(config.delimiter.clone()))?;
        let quote_char = single_char(&config.quote_char)
            .ok_or_else(|| DialectError::InvalidQuoteChar(config.quote_char.clone()))?;
        let escape_char = match &config.escape_char {
            None => None,
            Some(escape) => Some(
                single_char(escape).ok_or_else(|| DialectError::InvalidEscapeChar(escape.clone()))?,
            ),
        };

        Ok(Self {
            delimiter,
            quote_char,
            double_quote: config.double_quote,
            escape_char,
            skip_initial_space: config.skip_initial_space,
            header: config.header,
            case_sensitive_header: config.case_sensitive_header,
            line_terminator: LineTerminator::parse(&config.line_terminator)?,
        })
    }

    /// Split one complete line into raw field strings.
    ///
    /// An enclosed field left open at the end of the line is returned as it
    /// stands, without its closing quote.
    pub fn parse_row(&self, line: &str) -> Result<Vec<String>, DialectError> {
        match self.parse_line(line, None)? {
            ParsedLine::Complete(fields) => Ok(fields),
            ParsedLine::Open(pending) => Ok(pending.fields),
        }
    }

    /// Parse one physical line, continuing `pending` when the previous line
    /// ended inside an enclosed field.
    pub fn parse_line(
        &self,
        line: &str,
        pending: Option<PendingRow>,
    ) -> Result<ParsedLine, DialectError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let chars: Vec<char> = line.chars().collect();

        let (mut fields, mut state) = match pending {
            Some(PendingRow { mut fields }) => {
                if let Some(last) = fields.last_mut() {
                    last.push('\n');
                }
                (fields, FieldState::Enclosed)
            }
            None if chars.is_empty() => return Ok(ParsedLine::Complete(Vec::new())),
            None => (Vec::new(), FieldState::Unstarted),
        };
        // skipInitialSpace drops whitespace before a field starts; quoted content is never trimmed
        let mut skipped_space = false;

        let mut pos = 0;
        while pos < chars.len() {
            let c = chars[pos];
            match state {
                FieldState::Unstarted => {
                    if c == self.delimiter {
                        fields.push(String::new());
                        skipped_space = false;
                    } else if c == self.quote_char {
                        fields.push(String::new());
                        state = FieldState::Enclosed;
                    } else if Some(c) == self.escape_char {
                        fields.push(escaped(&chars, pos)?.to_string());
                        state = FieldState::Unenclosed;
                        pos += 1;
                    } else if self.skip_initial_space && c.is_whitespace() {
                        skipped_space = true;
                    } else {
                        fields.push(c.to_string());
                        state = FieldState::Unenclosed;
                    }
                }
                FieldState::Enclosed => {
                    let field = current(&mut fields);
                    if c == self.quote_char {
                        if self.double_quote && chars.get(pos + 1) == Some(&self.quote_char) {
                            field.push(c);
                            pos += 1;
                        } else {
                            state = FieldState::Closed;
                        }
                    } else if Some(c) == self.escape_char {
                        field.push(escaped(&chars, pos)?);
                        pos += 1;
                    } else {
                        field.push(c);
                    }
                }
                FieldState::Closed => {
                    if c == self.delimiter {
                        state = FieldState::Unstarted;
                        skipped_space = false;
                    } else if !c.is_whitespace() {
                        return Err(DialectError::TextAfterClosingQuote);
                    }
                }
                FieldState::Unenclosed => {
                    if c == self.delimiter {
                        state = FieldState::Unstarted;
                        skipped_space = false;
                    } else if c == self.quote_char {
                        return Err(DialectError::QuoteInUnenclosedField);
                    } else if Some(c) == self.escape_char {
                        current(&mut fields).push(escaped(&chars, pos)?);
                        pos += 1;
                    } else {
                        current(&mut fields).push(c);
                    }
                }
            }
            pos += 1;
        }

        match state {
            FieldState::Enclosed => Ok(ParsedLine::Open(PendingRow { fields })),
            FieldState::Unstarted if skipped_space || fields.is_empty() => {
                fields.push(String::new());
                Ok(ParsedLine::Complete(fields))
            }
            FieldState::Unstarted => Err(DialectError::TrailingDelimiter),
            FieldState::Closed | FieldState::Unenclosed => Ok(ParsedLine::Complete(fields)),
        }
    }

    /// Render fields as one line (without terminator) that `parse_row` reads back unchanged.
    pub fn format_row<S: AsRef<str>>(&self, fields: &[S]) -> String {
        let delimiter = self.delimiter.to_string();
        fields
            .iter()
            .map(|field| self.format_field(field.as_ref()))
            .collect::<Vec<_>>()
            .join(&delimiter)
    }

    fn format_field(&self, value: &str) -> String {
        let needs_quotes = value.is_empty()
            || (self.skip_initial_space && value.starts_with(char::is_whitespace))
            || value.chars().any(|c| {
                c == self.delimiter
                    || c == self.quote_char
                    || c == '\r'
                    || c == '\n'
                    || Some(c) == self.escape_char
            });
        if !needs_quotes {
            return value.to_string();
        }

        let mut out = String::with_capacity(value.len() + 2);
        out.push(self.quote_char);
        for c in value.chars() {
            if c == self.quote_char {
                match (self.double_quote, self.escape_char) {
                    (true, _) => out.push(self.quote_char),
                    (false, Some(escape)) => out.push(escape),
                    (false, None) => {}
                }
            } else if Some(c) == self.escape_char {
                out.push(c);
            }
            out.push(c);
        }
        out.push(self.quote_char);
        out
    }
}

fn single_char(value: &str) -> Option<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn escaped(chars: &[char], pos: usize) -> Result<char, DialectError> {
    chars
        .get(pos + 1)
        .copied()
        .ok_or(DialectError::EscapeAtEndOfLine)
}

fn current(fields: &mut Vec<String>) -> &mut String {
    if fields.is_empty() {
        fields.push(String::new());
    }
    let last = fields.len() - 1;
    &mut fields[last]
}
