//! Helpers shared by unit and integration tests.

use crate::dialect::Dialect;

pub fn all_dialects() -> Vec<Dialect> {
    vec![
        Dialect::MySql,
        Dialect::TiDb,
        Dialect::MariaDb,
        Dialect::OceanBase,
        Dialect::Postgres,
        Dialect::Redshift,
        Dialect::Oracle,
        Dialect::MsSql,
    ]
}

pub fn mysql_family_dialects() -> Vec<Dialect> {
    all_dialects()
        .into_iter()
        .filter(|d| d.is_mysql_family())
        .collect()
}

pub fn non_mysql_family_dialects() -> Vec<Dialect> {
    all_dialects()
        .into_iter()
        .filter(|d| !d.is_mysql_family())
        .collect()
}
