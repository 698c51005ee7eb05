//! SQL text preprocessing.
//!
//! Queries arrive as free text from the client. Before they reach
//! `EXPLAIN` they are checked to be a single read-only statement, and a
//! fingerprint of their normalised form is computed so repeated analyses of
//! the same query can be grouped.
//!
//! The scanner is lexical: it only knows enough about
//! PostgreSQL syntax (quoted literals, quoted identifiers, dollar quoting and
//! comments) to tell statement text apart from text that must not be touched.

use crate::error::AppError;
use sha2::{Digest, Sha256};

/// Statement keywords accepted as the start of a query.
const READ_KEYWORDS: [&str; 4] = ["select", "with", "values", "table"];

/// Statements a `WITH` clause may contain that write data.
const WRITE_KEYWORDS: [&str; 4] = ["insert", "update", "delete", "merge"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentKind {
    Code,
    Quoted,
    Comment,
}

#[derive(Debug)]
struct Segment<'a> {
    kind: SegmentKind,
    text: &'a str,
}

/// Split SQL into code, quoted and comment segments.
///
/// Unterminated quotes and comments extend to the end of the input; the
/// planner reports those properly.
fn segments(sql: &str) -> Vec<Segment<'_>> {
    let bytes = sql.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let end = match bytes[i] {
            b'\'' | b'"' => {
                let escapes = bytes[i] == b'\'' && is_escape_string_prefix(bytes, i);
                Some((SegmentKind::Quoted, quoted_end(bytes, i, bytes[i], escapes)))
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                let end = bytes[i..]
                    .iter()
                    .position(|&b| b == b'\n')
                    .map_or(bytes.len(), |p| i + p + 1);
                Some((SegmentKind::Comment, end))
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                Some((SegmentKind::Comment, block_comment_end(bytes, i)))
            }
            b'$' if i == 0 || !is_ident_byte(bytes[i - 1]) => {
                dollar_quote_end(sql, i).map(|end| (SegmentKind::Quoted, end))
            }
            _ => None,
        };

        match end {
            Some((kind, end)) => {
                push(&mut out, sql, SegmentKind::Code, start, i);
                push(&mut out, sql, kind, i, end);
                i = end;
                start = end;
            }
            None => i += 1,
        }
    }
    push(&mut out, sql, SegmentKind::Code, start, bytes.len());
    out
}

fn push<'a>(
    out: &mut Vec<Segment<'a>>,
    sql: &'a str,
    kind: SegmentKind,
    from: usize,
    to: usize,
) {
    if to > from {
        out.push(Segment {
            kind,
            text: &sql[from..to],
        });
    }
}

/// Bytes that can continue an unquoted identifier.
fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

/// `E'...'` strings treat backslash as an escape character.
fn is_escape_string_prefix(bytes: &[u8], open: usize) -> bool {
    open > 0
        && matches!(bytes[open - 1], b'E' | b'e')
        && (open < 2 || !is_ident_byte(bytes[open - 2]))
}

/// End (exclusive) of a `'...'` or `"..."` run starting at `open`, honouring
/// doubled quotes and, in escape strings, backslash escapes.
fn quoted_end(bytes: &[u8], open: usize, quote: u8, escapes: bool) -> usize {
    let mut i = open + 1;
    while i < bytes.len() {
        if escapes && bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn block_comment_end(bytes: &[u8], open: usize) -> usize {
    // PostgreSQL block comments nest
    let mut depth = 0usize;
    let mut i = open;
    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'/', b'*') => {
                depth += 1;
                i += 2;
            }
            (b'*', b'/') => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return i;
                }
            }
            _ => i += 1,
        }
    }
    bytes.len()
}

/// End of a `$tag$ ... $tag$` string starting at `open`, or `None` when the
/// `$` does not open one (e.g. a `$1` parameter).
fn dollar_quote_end(sql: &str, open: usize) -> Option<usize> {
    let rest = &sql[open + 1..];
    let tag_len = rest.find('$')?;
    let tag = &rest[..tag_len];
    let valid_tag = tag
        .chars()
        .enumerate()
        .all(|(n, c)| c == '_' || c.is_ascii_alphabetic() || (n > 0 && c.is_ascii_digit()));
    if !valid_tag {
        return None;
    }

    let delimiter = &sql[open..open + tag_len + 2];
    let body_start = open + delimiter.len();
    Some(
        sql[body_start..]
            .find(delimiter)
            .map_or(sql.len(), |p| body_start + p + delimiter.len()),
    )
}

/// Remove trailing semicolons and whitespace.
fn strip_trailing_semicolons(sql: &str) -> &str {
    sql.trim_end_matches(|c: char| c == ';' || c.is_whitespace())
}

/// Validate a user-supplied query and return it cleaned for `EXPLAIN`.
///
/// # Rules
///
/// - must not be empty (after trimming and dropping trailing semicolons)
/// - must be a single statement (`;` outside literals and comments)
/// - must start with `SELECT`, `WITH`, `VALUES` or `TABLE`
///
/// # Errors
///
/// `AppError::InvalidQuery` describing the first rule broken.
pub fn validate_query(sql: &str) -> Result<String, AppError> {
    let cleaned = strip_trailing_semicolons(sql.trim());
    if cleaned.is_empty() {
        return Err(AppError::InvalidQuery("Query is empty".to_string()));
    }

    let segments = segments(cleaned);

    if segments
        .iter()
        .any(|s| s.kind == SegmentKind::Code && s.text.contains(';'))
    {
        return Err(AppError::InvalidQuery(
            "Only a single statement can be analyzed".to_string(),
        ));
    }

    let keyword = segments
        .iter()
        .filter(|s| s.kind != SegmentKind::Comment)
        .flat_map(|s| s.text.split_whitespace())
        .next()
        .map(|word| {
            word.trim_start_matches('(')
                .split(|c: char| !c.is_ascii_alphabetic())
                .next()
                .unwrap_or_default()
                .to_ascii_lowercase()
        })
        .unwrap_or_default();

    if keyword.is_empty() {
        return Err(AppError::InvalidQuery("Query is empty".to_string()));
    }
    if keyword == "explain" {
        return Err(AppError::InvalidQuery(
            "Submit the query itself; it is explained automatically".to_string(),
        ));
    }
    if !READ_KEYWORDS.contains(&keyword.as_str()) {
        return Err(AppError::InvalidQuery(format!(
            "Only read queries can be analyzed, got '{}'",
            keyword.to_ascii_uppercase()
        )));
    }
    if keyword == "with" {
        if let Some(write) = data_modifying_cte(&segments) {
            return Err(AppError::InvalidQuery(format!(
                "Only read queries can be analyzed, got '{}' in a WITH clause",
                write.to_ascii_uppercase()
            )));
        }
    }

    Ok(cleaned.to_string())
}

/// First write keyword opening a parenthesised statement, as in
/// `WITH d AS (DELETE FROM orders RETURNING *) SELECT * FROM d`.
fn data_modifying_cte(segments: &[Segment<'_>]) -> Option<String> {
    // Last significant character seen outside comments
    let mut previous = None;

    for segment in segments {
        match segment.kind {
            SegmentKind::Comment => continue,
            SegmentKind::Quoted => {
                previous = Some('\'');
                continue;
            }
            SegmentKind::Code => {}
        }

        let bytes = segment.text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            if b.is_ascii_alphabetic() || b == b'_' {
                let end = bytes[i..]
                    .iter()
                    .position(|&c| !is_ident_byte(c))
                    .map_or(bytes.len(), |p| i + p);
                let word = segment.text[i..end].to_ascii_lowercase();
                if previous == Some('(') && WRITE_KEYWORDS.contains(&word.as_str()) {
                    return Some(word);
                }
                previous = Some('a');
                i = end;
            } else {
                if !b.is_ascii_whitespace() {
                    previous = Some(b as char);
                }
                i += 1;
            }
        }
    }
    None
}

/// Terminate a validated statement with `;`.
///
/// The terminator goes on its own line when the statement ends in a `--`
/// comment, which would otherwise swallow it.
pub fn terminate_statement(sql: &str) -> String {
    let ends_in_line_comment = segments(sql).last().is_some_and(|s| {
        s.kind == SegmentKind::Comment && s.text.starts_with("--") && !s.text.ends_with('\n')
    });
    if ends_in_line_comment {
        format!("{sql}\n;")
    } else {
        format!("{sql};")
    }
}

/// Normalise query text for fingerprinting.
///
/// Outside literals: comments are dropped, whitespace runs collapse to a
/// single space and letters are lowercased. Literal and quoted identifier
/// text is kept as is.
pub fn normalize_query(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut pending_space = false;

    for segment in segments(sql) {
        match segment.kind {
            SegmentKind::Quoted => {
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                out.push_str(segment.text);
            }
            SegmentKind::Comment => pending_space = true,
            SegmentKind::Code => {
                for c in segment.text.chars() {
                    if c.is_whitespace() {
                        pending_space = true;
                    } else {
                        if pending_space && !out.is_empty() {
                            out.push(' ');
                        }
                        pending_space = false;
                        out.extend(c.to_lowercase());
                    }
                }
            }
        }
    }

    strip_trailing_semicolons(&out).to_string()
}

/// SHA-256 hex digest of the normalised query.
pub fn fingerprint(sql: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_query(sql).as_bytes());
    hex::encode(hasher.finalize())
}

/// Quote an identifier the way PostgreSQL's `quote_ident` does when forced.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
