//! Canonical statement fingerprints for the MySQL family.
//!
//! The pipeline is a port of pt-query-digest's fingerprint routine (by way
//! of its Go port): an ordered list of text transforms that abstract literal
//! values, whitespace, comments, and cosmetic orderings while keeping the
//! statement shape. Rule order is load-bearing; later rules assume earlier
//! ones already fired. Do not reorder.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dialect::Dialect;
use crate::error::Error;

static MYSQLDUMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\ASELECT /\*!40001 SQL_NO_CACHE \*/ \* FROM ").unwrap());
static PERCONA_TOOLKIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\*\w+\.\w+:[0-9]/[0-9]\*/").unwrap());
static ADMIN_COMMAND: Lazy<Regex> = Lazy::new(|| Regex::new(r"\Aadministrator command: ").unwrap());
static CALL_STATEMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\A\s*(call\s+\S+)\(").unwrap());
static MULTI_VALUE_INSERT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)((?:INSERT|REPLACE)(?: IGNORE)?\s+INTO.+?VALUES\s*\(.*?\))\s*,\s*\(").unwrap()
});
static MULTI_LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static ONE_LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"--.*$").unwrap());
static USE_STATEMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\Ause \S+\z").unwrap());
static ESCAPED_SINGLE_QUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([^\\])(\\')").unwrap());
static ESCAPED_DOUBLE_QUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"([^\\])(\\")"#).unwrap());
static DOUBLE_BACKSLASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\\\").unwrap());
static LEADING_ESCAPED_SINGLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\'").unwrap());
static LEADING_ESCAPED_DOUBLE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\\""#).unwrap());
static DOUBLE_QUOTED_STRING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([^\\])(".*?[^\\]?")"#).unwrap());
static SINGLE_QUOTED_STRING: Lazy<Regex> = Lazy::new(|| Regex::new(r"([^\\])('.*?[^\\]?')").unwrap());
static BOOLEAN_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bfalse\b|\btrue\b").unwrap());
static MD5_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"([._-])[a-f0-9]{32}").unwrap());
static NUMERIC_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[0-9+-][0-9a-f.xb+-]*").unwrap());
static NUMERIC_RESIDUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[xb+-]\?").unwrap());
static NUMERIC_RESIDUE_WITH_DOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[xb.+-]\?").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static NULL_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bnull\b").unwrap());
static IN_VALUES_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(in|values?)(?:[\s,]*\([\s?,]*\))+").unwrap());
static UNION_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s(union all|union)\s").unwrap());
static LIMIT_CLAUSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\blimit \?(?:, ?\?| offset \?)?").unwrap());
static ORDER_BY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\border by ").unwrap());
static TRAILING_ASC: Lazy<Regex> = Lazy::new(|| Regex::new(r"(.+?)\s+asc").unwrap());

/// Returns the fingerprint of a single SQL statement. Only defined for the
/// MySQL dialect family.
pub fn fingerprint(dialect: Dialect, sql: &str) -> Result<String, Error> {
    if !dialect.is_mysql_family() {
        return Err(Error::UnsupportedEngine(dialect));
    }
    mysql_fingerprint(sql)
}

fn mysql_fingerprint(sql: &str) -> Result<String, Error> {
    // Queries generated by mysqldump and Percona Toolkit, and administrator
    // commands, keep a fixed fingerprint.
    if MYSQLDUMP.is_match(sql) {
        return Ok("mysqldump".to_string());
    }
    if PERCONA_TOOLKIT.is_match(sql) {
        return Ok("percona-toolkit".to_string());
    }
    if ADMIN_COMMAND.is_match(sql) {
        return Ok(sql.to_string());
    }
    // Stored procedure calls reduce to the procedure name.
    if let Some(caps) = CALL_STATEMENT.captures(sql) {
        return Ok(caps[1].to_lowercase());
    }

    // Collapse multi-row INSERT/REPLACE down to the first value tuple.
    let mut query = match MULTI_VALUE_INSERT.captures(sql) {
        Some(caps) => caps[1].to_string(),
        None => sql.to_string(),
    };

    // Remove multi-line and single-line comments.
    query = MULTI_LINE_COMMENT.replace_all(&query, "").to_string();
    query = ONE_LINE_COMMENT.replace_all(&query, "").to_string();

    // Abstract the database name in USE statements.
    query = USE_STATEMENT.replace_all(&query, "use ?").to_string();

    // Drop escaped quotes, then abstract quoted string literals.
    query = ESCAPED_SINGLE_QUOTE.replace_all(&query, "${1}").to_string();
    query = ESCAPED_DOUBLE_QUOTE.replace_all(&query, "${1}").to_string();
    query = DOUBLE_BACKSLASH.replace_all(&query, "").to_string();
    query = LEADING_ESCAPED_SINGLE.replace_all(&query, "").to_string();
    query = LEADING_ESCAPED_DOUBLE.replace_all(&query, "").to_string();
    query = DOUBLE_QUOTED_STRING.replace_all(&query, "${1}?").to_string();
    query = SINGLE_QUOTED_STRING.replace_all(&query, "${1}?").to_string();

    // Abstract boolean literals.
    query = BOOLEAN_LITERAL.replace_all(&query, "?").to_string();

    // Abstract MD5-shaped hex values following a separator.
    if MD5_LITERAL.is_match(&query) {
        query = MD5_LITERAL.replace_all(&query, "${1}?").to_string();
    }

    // Abstract numeric literals.
    if NUMERIC_LITERAL.is_match(&query) {
        query = NUMERIC_LITERAL.replace_all(&query, "?").to_string();
    }

    // Clean up sign and hex/binary prefix characters left next to a `?`.
    // The original applies the dot-stripping variant only when the narrower
    // pattern has no match anywhere; preserved for behavioral parity.
    if NUMERIC_RESIDUE.is_match(&query) {
        query = NUMERIC_RESIDUE.replace_all(&query, "?").to_string();
    } else {
        query = NUMERIC_RESIDUE_WITH_DOT.replace_all(&query, "?").to_string();
    }

    // Collapse whitespace and lower-case.
    query = query.trim().to_string();
    query = query.trim_end_matches(['\n', '\r', '\x0c', ' ']).to_string();
    query = WHITESPACE_RUN.replace_all(&query, " ").to_string();
    query = query.to_lowercase();

    // Abstract NULL.
    query = NULL_LITERAL.replace_all(&query, "?").to_string();

    // Collapse IN and VALUES lists of placeholders.
    query = IN_VALUES_LIST.replace_all(&query, "${1}(?+)").to_string();

    query = collapse_union(query)?;

    // Collapse LIMIT clauses.
    query = LIMIT_CLAUSE.replace_all(&query, "limit ?").to_string();

    // Remove redundant ASC qualifiers after ORDER BY.
    if ORDER_BY.is_match(&query) {
        while TRAILING_ASC.is_match(&query) {
            query = TRAILING_ASC.replace_all(&query, "${1}").to_string();
        }
    }

    Ok(query)
}

/// Collapses runs of identical UNION branches into a single branch followed
/// by a `/*repeat union*/` marker.
///
/// The text is split on the union separators into parts P0..Pn; a sentinel
/// part distinct from any real part (all comments are gone by now) is
/// appended so the final run is flushed like any other. A part equal to the
/// head of the current run is skipped; when a run ends after a single part
/// the separator is re-emitted, when it ends after repeats the repeat marker
/// replaces them.
fn collapse_union(query: String) -> Result<String, Error> {
    let mut parts: Vec<&str> = UNION_SEPARATOR.split(&query).collect();
    if parts.len() == 1 {
        return Ok(query);
    }
    parts.push("/*Sentinel Node*/");
    let separators: Vec<&str> = UNION_SEPARATOR
        .find_iter(&query)
        .map(|m| m.as_str())
        .collect();
    if parts.len() != separators.len() + 2 {
        return Err(Error::MalformedInput(format!(
            "find {} parts, but {} separators",
            parts.len() - 1,
            separators.len()
        )));
    }
    let sentinel = parts.len() - 1;
    let mut start = 0;
    let mut collapsed = String::from(parts[start]);
    for (i, part) in parts.iter().enumerate().skip(1) {
        if *part == parts[start] {
            continue;
        }
        if i == start + 1 {
            // The run ended after a single part; keep its separator.
            if i != sentinel {
                collapsed.push_str(separators[i - 1]);
            }
        } else {
            // A repeat run ended; the marker carries the separator between
            // the last two repeated parts.
            collapsed.push_str(" /*repeat");
            collapsed.push_str(separators[i - 2]);
            collapsed.push_str("*/");
        }
        start = i;
        if i != sentinel {
            collapsed.push_str(parts[start]);
        }
    }
    Ok(collapsed)
}
