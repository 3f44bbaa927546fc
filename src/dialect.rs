//! The closed set of SQL engines this crate knows how to handle.
//!
//! Dialects are grouped into three families that share lexical rules: the
//! MySQL family (backtick identifiers, `#` comments, custom statement
//! delimiters), the Postgres family (dollar-quoted strings, nested block
//! comments), and the standard family (Oracle, MSSQL).

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    MySql,
    TiDb,
    MariaDb,
    OceanBase,
    Postgres,
    Redshift,
    Oracle,
    MsSql,
}

impl Dialect {
    pub fn is_mysql_family(self) -> bool {
        matches!(
            self,
            Dialect::MySql | Dialect::TiDb | Dialect::MariaDb | Dialect::OceanBase
        )
    }

    pub fn is_postgres_family(self) -> bool {
        matches!(self, Dialect::Postgres | Dialect::Redshift)
    }

    pub fn is_standard_family(self) -> bool {
        matches!(self, Dialect::Oracle | Dialect::MsSql)
    }

    /// The sqlparser dialect used when a statement needs a full parse.
    /// sqlparser has no Oracle dialect, so Oracle falls back to generic.
    pub fn parser_dialect(self) -> Box<dyn sqlparser::dialect::Dialect> {
        use sqlparser::dialect;
        match self {
            Dialect::MySql | Dialect::TiDb | Dialect::MariaDb | Dialect::OceanBase => {
                Box::new(dialect::MySqlDialect {})
            }
            Dialect::Postgres => Box::new(dialect::PostgreSqlDialect {}),
            Dialect::Redshift => Box::new(dialect::RedshiftSqlDialect {}),
            Dialect::Oracle => Box::new(dialect::GenericDialect {}),
            Dialect::MsSql => Box::new(dialect::MsSqlDialect {}),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::MySql => "MYSQL",
            Dialect::TiDb => "TIDB",
            Dialect::MariaDb => "MARIADB",
            Dialect::OceanBase => "OCEANBASE",
            Dialect::Postgres => "POSTGRES",
            Dialect::Redshift => "REDSHIFT",
            Dialect::Oracle => "ORACLE",
            Dialect::MsSql => "MSSQL",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(Dialect::MySql),
            "tidb" => Ok(Dialect::TiDb),
            "mariadb" => Ok(Dialect::MariaDb),
            "oceanbase" => Ok(Dialect::OceanBase),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "redshift" => Ok(Dialect::Redshift),
            "oracle" => Ok(Dialect::Oracle),
            "mssql" => Ok(Dialect::MsSql),
            _ => Err(Error::MalformedInput(format!("unknown dialect: {:?}", s))),
        }
    }
}
