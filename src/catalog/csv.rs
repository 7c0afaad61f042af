//! Delimited text codec for the movie file
//!
//! Row format:
//! - Fields separated by `,`, rows by `\n` (a preceding `\r` is dropped)
//! - Fields holding `,`, `"`, `\r` or `\n` are wrapped in `"` with inner
//!   quotes doubled
//! - Quoted fields may span lines
//! - Blank lines are skipped
//!
//! Anything else (stray quote in a bare field, text after a closing quote,
//! unterminated quoted field) is rejected rather than guessed at.

use super::errors::{CatalogError, CatalogResult};

const DELIMITER: char = ',';
const QUOTE: char = '"';

/// A decoded row and the line it started on (1-based)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Decodes a whole document into rows.
pub fn parse_document(input: &str) -> CatalogResult<Vec<Row>> {
    let mut rows = Vec::new();
    let mut chars = input.chars().peekable();

    let mut line = 1;
    let mut row_start = 1;
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    // True once the current field was opened with a quote and closed again
    let mut was_quoted = false;
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                QUOTE if chars.peek() == Some(&QUOTE) => {
                    chars.next();
                    field.push(QUOTE);
                }
                QUOTE => {
                    in_quotes = false;
                    was_quoted = true;
                }
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            DELIMITER => {
                fields.push(std::mem::take(&mut field));
                was_quoted = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                push_row(&mut rows, row_start, std::mem::take(&mut fields));
                was_quoted = false;
                line += 1;
                row_start = line;
            }
            QUOTE if field.is_empty() && !was_quoted => in_quotes = true,
            QUOTE => {
                return Err(CatalogError::storage(format!(
                    "line {}: unexpected quote inside unquoted field",
                    line
                )));
            }
            _ if was_quoted => {
                return Err(CatalogError::storage(format!(
                    "line {}: unexpected character after closing quote",
                    line
                )));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(CatalogError::storage(format!(
            "line {}: unterminated quoted field",
            row_start
        )));
    }

    if !field.is_empty() || was_quoted || !fields.is_empty() {
        fields.push(field);
        push_row(&mut rows, row_start, fields);
    }

    Ok(rows)
}

fn push_row(rows: &mut Vec<Row>, line: usize, fields: Vec<String>) {
    // A bare newline yields a single empty field
    if fields.len() == 1 && fields[0].is_empty() {
        return;
    }
    rows.push(Row { line, fields });
}

/// Encodes one row, newline-terminated.
pub fn encode_row<S: AsRef<str>>(fields: &[S]) -> String {
    let mut out = String::with_capacity(128);
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(DELIMITER);
        }
        encode_field(&mut out, field.as_ref());
    }
    out.push('\n');
    out
}

fn encode_field(out: &mut String, field: &str) {
    let needs_quotes = field
        .chars()
        .any(|c| c == DELIMITER || c == QUOTE || c == '\n' || c == '\r');

    if !needs_quotes {
        out.push_str(field);
        return;
    }

    out.push(QUOTE);
    for c in field.chars() {
        if c == QUOTE {
            out.push(QUOTE);
        }
        out.push(c);
    }
    out.push(QUOTE);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(rows: &[Row]) -> Vec<Vec<&str>> {
        rows.iter()
            .map(|r| r.fields.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn test_plain_rows() {
        let rows = parse_document("a,b,c\n1,2,3\n").unwrap();
        assert_eq!(fields(&rows), vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
        assert_eq!(rows[1].line, 2);
    }

    #[test]
    fn test_quoted_fields_with_delimiters_and_quotes() {
        let rows = parse_document("\"Drama, Crime\",\"He said \"\"hi\"\"\"\n").unwrap();
        assert_eq!(fields(&rows), vec![vec!["Drama, Crime", "He said \"hi\""]]);
    }

    #[test]
    fn test_quoted_field_spanning_lines() {
        let rows = parse_document("x,\"line one\nline two\"\ny,z\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fields[1], "line one\nline two");
        assert_eq!(rows[1].line, 3);
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let rows = parse_document("a,b\r\n\r\n1,2\r\n\n").unwrap();
        assert_eq!(fields(&rows), vec![vec!["a", "b"], vec!["1", "2"]]);
    }

    #[test]
    fn test_missing_trailing_newline() {
        let rows = parse_document("a,b\n1,\"2\"").unwrap();
        assert_eq!(fields(&rows), vec![vec!["a", "b"], vec!["1", "2"]]);
    }

    #[test]
    fn test_empty_fields_preserved() {
        let rows = parse_document("a,,c\n,\n").unwrap();
        assert_eq!(fields(&rows), vec![vec!["a", "", "c"], vec!["", ""]]);
    }

    #[test]
    fn test_malformed_quotes_rejected() {
        assert!(parse_document("a,b\"c\n").is_err());
        assert!(parse_document("\"abc\"d,e\n").is_err());
        assert!(parse_document("\"never closed\n").is_err());
    }

    #[test]
    fn test_encode_quotes_only_when_needed() {
        assert_eq!(encode_row(&["tt1", "Up", "2009"]), "tt1,Up,2009\n");
        assert_eq!(
            encode_row(&["Animation, Adventure", "say \"hi\""]),
            "\"Animation, Adventure\",\"say \"\"hi\"\"\"\n"
        );
    }

    #[test]
    fn test_encoded_row_decodes_back() {
        let original = vec!["a,b", "\"q\"", "multi\nline", "", "plain"];
        let rows = parse_document(&encode_row(&original)).unwrap();
        assert_eq!(fields(&rows), vec![original]);
    }
}
