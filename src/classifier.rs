//! Regex rules flagging statements that downstream MySQL-family engines
//! cannot execute: trigger/event/function/procedure DDL and the `DELIMITER`
//! directive emitted by dump tools.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dialect::Dialect;
use crate::error::Error;
use crate::splitter;

const UNSUPPORTED_OBJECTS: [&str; 4] = ["TRIGGER", "EVENT", "FUNCTION", "PROCEDURE"];

static UNSUPPORTED_DDL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    UNSUPPORTED_OBJECTS
        .iter()
        .flat_map(|object| {
            [
                Regex::new(&format!(
                    r"(?i)^\s*CREATE\s+(DEFINER=(`(.)+`|(.)+)@(`(.)+`|(.)+)(\s)+)?{object}\s+"
                ))
                .unwrap(),
                Regex::new(&format!(r"(?i)^\s*DROP\s+{object}\s+")).unwrap(),
            ]
        })
        .collect()
});

static DELIMITER_DIRECTIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*DELIMITER\s+").unwrap());

static DELIMITER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*DELIMITER\s+(?P<token>[^\s\\]+)\s*").unwrap());

/// Returns true for `CREATE [DEFINER=...] {TRIGGER|EVENT|FUNCTION|PROCEDURE}`
/// and `DROP {TRIGGER|EVENT|FUNCTION|PROCEDURE}` statements.
pub fn is_unsupported_ddl(stmt: &str) -> bool {
    UNSUPPORTED_DDL_PATTERNS.iter().any(|re| re.is_match(stmt))
}

/// Returns true for a `DELIMITER <token>` directive.
pub fn is_delimiter_directive(stmt: &str) -> bool {
    DELIMITER_DIRECTIVE.is_match(stmt)
}

/// Parses the token of a `DELIMITER <token>` directive.
pub fn extract_delimiter(stmt: &str) -> Result<String, Error> {
    DELIMITER_TOKEN
        .captures(stmt)
        .and_then(|caps| caps.name("token"))
        .map(|token| token.as_str().to_string())
        .ok_or_else(|| Error::MalformedInput(format!("cannot extract delimiter from {:?}", stmt)))
}

/// Splits `batch` with the MySQL-family scanner and partitions the resulting
/// statements into those a MySQL-compatible engine cannot execute
/// (unsupported DDL and delimiter directives) and a newline-joined blob of
/// the rest.
pub fn partition_unsupported(dialect: Dialect, batch: &str) -> Result<(Vec<String>, String), Error> {
    if !dialect.is_mysql_family() {
        return Err(Error::UnsupportedEngine(dialect));
    }
    let mut unsupported = Vec::new();
    let mut supported = String::new();
    for stmt in splitter::split_raw(dialect, batch)? {
        if is_unsupported_ddl(&stmt.text) || is_delimiter_directive(&stmt.text) {
            unsupported.push(stmt.text);
        } else {
            supported.push_str(&stmt.text);
            supported.push('\n');
        }
    }
    Ok((unsupported, supported))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_ddl() {
        assert!(is_unsupported_ddl("DROP TRIGGER my_trigger;"));
        assert!(is_unsupported_ddl("  create procedure p() BEGIN END"));
        assert!(is_unsupported_ddl(
            "CREATE DEFINER=`admin`@`localhost` FUNCTION f() RETURNS INT RETURN 1"
        ));
        assert!(is_unsupported_ddl("CREATE DEFINER=admin@localhost EVENT e ON SCHEDULE EVERY 1 DAY DO SELECT 1"));
        assert!(!is_unsupported_ddl("CREATE TABLE t (a INT)"));
        assert!(!is_unsupported_ddl("DROP TABLE t"));
        assert!(!is_unsupported_ddl("SELECT 'DROP TRIGGER x'"));
    }

    #[test]
    fn test_delimiter_directive() {
        assert!(is_delimiter_directive("DELIMITER $$"));
        assert!(is_delimiter_directive("  delimiter //"));
        assert!(!is_delimiter_directive("SELECT 1"));
        assert_eq!(extract_delimiter("DELIMITER $$").unwrap(), "$$");
        assert_eq!(extract_delimiter("  delimiter ;;  ").unwrap(), ";;");
        assert_eq!(
            extract_delimiter("DELIMITER"),
            Err(Error::MalformedInput(
                "cannot extract delimiter from \"DELIMITER\"".to_string()
            ))
        );
    }

    #[test]
    fn test_partition_unsupported() {
        let batch = "CREATE TABLE t (a INT);\nDROP TRIGGER tr;\nINSERT INTO t VALUES (1);";
        let (unsupported, supported) = partition_unsupported(Dialect::TiDb, batch).unwrap();
        assert_eq!(unsupported, vec!["\nDROP TRIGGER tr;"]);
        assert_eq!(supported, "CREATE TABLE t (a INT);\n\nINSERT INTO t VALUES (1);\n");
    }

    #[test]
    fn test_partition_keeps_delimiter_directives_out() {
        let batch = "DELIMITER $$\nCREATE PROCEDURE p() BEGIN SELECT 1; END$$\nDELIMITER ;";
        let (unsupported, supported) = partition_unsupported(Dialect::MySql, batch).unwrap();
        assert_eq!(unsupported.len(), 3);
        assert!(is_delimiter_directive(&unsupported[0]));
        assert!(is_unsupported_ddl(&unsupported[1]));
        assert!(is_delimiter_directive(&unsupported[2]));
        assert_eq!(supported, "");
    }

    #[test]
    fn test_partition_rejects_other_families() {
        assert_eq!(
            partition_unsupported(Dialect::Postgres, "SELECT 1;"),
            Err(Error::UnsupportedEngine(Dialect::Postgres))
        );
    }
}
