//! Table and database extraction over a parsed statement tree.
//!
//! The walk is an exhaustive match over the statement shapes that can
//! reference tables, so adding a shape to the rules below is a compile-time
//! concern rather than a runtime surprise. Traversal is depth-first
//! pre-order; duplicates are kept, emission order is the traversal order.

use std::collections::BTreeSet;
use std::fmt;

use sqlparser::ast::{
    Expr, ObjectName, Query, Select, SelectItem, SetExpr, Statement, TableFactor, TableWithJoins,
    With,
};
use sqlparser::parser::Parser;

use crate::dialect::Dialect;
use crate::error::Error;

/// A table referenced by a statement. An empty schema means the table
/// resolves against the current/default database.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableReference {
    pub schema: String,
    pub name: String,
}

impl TableReference {
    fn from_object_name(object_name: &ObjectName) -> Self {
        let mut idents = object_name.0.iter().rev();
        let name = idents.next().map(|i| i.value.clone()).unwrap_or_default();
        let schema = idents.next().map(|i| i.value.clone()).unwrap_or_default();
        TableReference { schema, name }
    }

    fn from_alias(alias: &str) -> Self {
        TableReference {
            schema: String::new(),
            name: alias.to_string(),
        }
    }
}

impl fmt::Display for TableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.schema.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.schema, self.name)
        }
    }
}

/// Parses `sql` with the dialect's parser and collects every table
/// referenced by the batch, in traversal order.
///
/// With `prefer_alias`, aliased table sources are reported under their alias
/// (with an empty schema) instead of their original identity; privilege
/// checks want the original name, expression analysis wants the alias.
pub fn extract_tables(
    dialect: Dialect,
    sql: &str,
    prefer_alias: bool,
) -> Result<Vec<TableReference>, Error> {
    let statements = Parser::parse_sql(dialect.parser_dialect().as_ref(), sql)?;
    let mut tables = Vec::new();
    for statement in &statements {
        collect_statement(statement, prefer_alias, &mut tables);
    }
    Ok(tables)
}

/// Collects table references from a single already-parsed statement.
pub fn extract_tables_from_statement(
    statement: &Statement,
    prefer_alias: bool,
) -> Vec<TableReference> {
    let mut tables = Vec::new();
    collect_statement(statement, prefer_alias, &mut tables);
    tables
}

/// Returns the sorted distinct set of non-empty database names referenced by
/// the batch. Only defined for the MySQL dialect family.
pub fn extract_databases(dialect: Dialect, sql: &str) -> Result<Vec<String>, Error> {
    if !dialect.is_mysql_family() {
        return Err(Error::UnsupportedEngine(dialect));
    }
    let mut databases = BTreeSet::new();
    for table in extract_tables(dialect, sql, false)? {
        if !table.schema.is_empty() {
            databases.insert(table.schema);
        }
    }
    Ok(databases.into_iter().collect())
}

fn collect_statement(statement: &Statement, prefer_alias: bool, out: &mut Vec<TableReference>) {
    match statement {
        Statement::Query(query) => collect_query(query, prefer_alias, out),
        Statement::Insert {
            table_name, source, ..
        } => {
            out.push(TableReference::from_object_name(table_name));
            if let Some(source) = source {
                collect_query(source, prefer_alias, out);
            }
        }
        Statement::Update {
            table,
            assignments,
            from,
            selection,
            ..
        } => {
            collect_table_with_joins(table, prefer_alias, out);
            for assignment in assignments {
                collect_expr(&assignment.value, prefer_alias, out);
            }
            if let Some(from) = from {
                collect_table_with_joins(from, prefer_alias, out);
            }
            if let Some(selection) = selection {
                collect_expr(selection, prefer_alias, out);
            }
        }
        Statement::Delete {
            tables,
            from,
            using,
            selection,
            ..
        } => {
            for table in from {
                collect_table_with_joins(table, prefer_alias, out);
            }
            if let Some(using) = using {
                for table in using {
                    collect_table_with_joins(table, prefer_alias, out);
                }
            }
            for name in tables {
                out.push(TableReference::from_object_name(name));
            }
            if let Some(selection) = selection {
                collect_expr(selection, prefer_alias, out);
            }
        }
        _ => {}
    }
}

fn collect_query(query: &Query, prefer_alias: bool, out: &mut Vec<TableReference>) {
    match &*query.body {
        SetExpr::Select(select) => {
            collect_select(select, query.with.as_ref(), prefer_alias, out)
        }
        body => {
            collect_set_expr(body, prefer_alias, out);
            if let Some(with) = &query.with {
                collect_ctes(with, prefer_alias, out);
            }
        }
    }
}

/// SELECT rules: FROM-clause tables, WHERE subqueries, each CTE's query,
/// then subqueries projected directly as select items.
fn collect_select(
    select: &Select,
    with: Option<&With>,
    prefer_alias: bool,
    out: &mut Vec<TableReference>,
) {
    for table in &select.from {
        collect_table_with_joins(table, prefer_alias, out);
    }
    if let Some(selection) = &select.selection {
        collect_expr(selection, prefer_alias, out);
    }
    if let Some(with) = with {
        collect_ctes(with, prefer_alias, out);
    }
    for item in &select.projection {
        let expr = match item {
            SelectItem::UnnamedExpr(expr) => expr,
            SelectItem::ExprWithAlias { expr, .. } => expr,
            _ => continue,
        };
        if let Expr::Subquery(subquery) = expr {
            collect_query(subquery, prefer_alias, out);
        }
    }
}

fn collect_ctes(with: &With, prefer_alias: bool, out: &mut Vec<TableReference>) {
    for cte in &with.cte_tables {
        collect_query(&cte.query, prefer_alias, out);
    }
}

/// Set operations are flattened: each side contributes in order, however
/// deeply the operations nest.
fn collect_set_expr(body: &SetExpr, prefer_alias: bool, out: &mut Vec<TableReference>) {
    match body {
        SetExpr::Select(select) => collect_select(select, None, prefer_alias, out),
        SetExpr::Query(query) => collect_query(query, prefer_alias, out),
        SetExpr::SetOperation { left, right, .. } => {
            collect_set_expr(left, prefer_alias, out);
            collect_set_expr(right, prefer_alias, out);
        }
        SetExpr::Insert(statement) | SetExpr::Update(statement) => {
            collect_statement(statement, prefer_alias, out)
        }
        SetExpr::Values(_) | SetExpr::Table(_) => {}
    }
}

fn collect_table_with_joins(
    table: &TableWithJoins,
    prefer_alias: bool,
    out: &mut Vec<TableReference>,
) {
    collect_table_factor(&table.relation, prefer_alias, out);
    for join in &table.joins {
        collect_table_factor(&join.relation, prefer_alias, out);
    }
}

fn collect_table_factor(factor: &TableFactor, prefer_alias: bool, out: &mut Vec<TableReference>) {
    match factor {
        TableFactor::Table { name, alias, .. } => match alias {
            Some(alias) if prefer_alias => out.push(TableReference::from_alias(&alias.name.value)),
            _ => out.push(TableReference::from_object_name(name)),
        },
        // A derived table contributes the first table reference found in the
        // inner SELECT's FROM clause; under `prefer_alias` the alias stands
        // in for it.
        TableFactor::Derived {
            subquery, alias, ..
        } => {
            if let SetExpr::Select(inner) = &*subquery.body {
                let mut inner_tables = Vec::new();
                for table in &inner.from {
                    collect_table_with_joins(table, prefer_alias, &mut inner_tables);
                }
                if let Some(first) = inner_tables.into_iter().next() {
                    match alias {
                        Some(alias) if prefer_alias => {
                            out.push(TableReference::from_alias(&alias.name.value))
                        }
                        _ => out.push(first),
                    }
                }
            }
        }
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => collect_table_with_joins(table_with_joins, prefer_alias, out),
        _ => {}
    }
}

/// Subquery-bearing expressions recurse into their subquery: `IN (SELECT…)`,
/// `EXISTS (SELECT…)`, and the right operand of a binary comparison. The
/// recursion is deliberately shallow, matching the reference traversal.
fn collect_expr(expr: &Expr, prefer_alias: bool, out: &mut Vec<TableReference>) {
    match expr {
        Expr::InSubquery { subquery, .. } => collect_query(subquery, prefer_alias, out),
        Expr::Exists { subquery, .. } => collect_query(subquery, prefer_alias, out),
        Expr::BinaryOp { right, .. } => {
            if let Expr::Subquery(subquery) = &**right {
                collect_query(subquery, prefer_alias, out);
            }
        }
        Expr::Subquery(subquery) => collect_query(subquery, prefer_alias, out),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(schema: &str, name: &str) -> TableReference {
        TableReference {
            schema: schema.to_string(),
            name: name.to_string(),
        }
    }

    fn extract(sql: &str, prefer_alias: bool) -> Vec<TableReference> {
        extract_tables(Dialect::MySql, sql, prefer_alias).unwrap()
    }

    #[test]
    fn test_simple_select() {
        assert_eq!(extract("SELECT a FROM t1", false), vec![table("", "t1")]);
        assert_eq!(
            extract("SELECT a FROM db1.t1", false),
            vec![table("db1", "t1")]
        );
    }

    #[test]
    fn test_join_and_where_subquery() {
        assert_eq!(
            extract(
                "SELECT a FROM t1 JOIN t2 ON t1.id = t2.id WHERE b = (SELECT c FROM t3)",
                false
            ),
            vec![table("", "t1"), table("", "t2"), table("", "t3")]
        );
    }

    #[test]
    fn test_in_and_exists_subqueries() {
        assert_eq!(
            extract("SELECT a FROM t1 WHERE b IN (SELECT b FROM t2)", false),
            vec![table("", "t1"), table("", "t2")]
        );
        assert_eq!(
            extract("SELECT a FROM t1 WHERE EXISTS (SELECT 1 FROM t2)", false),
            vec![table("", "t1"), table("", "t2")]
        );
    }

    #[test]
    fn test_projection_subquery() {
        assert_eq!(
            extract("SELECT (SELECT max(b) FROM t2) AS m FROM t1", false),
            vec![table("", "t1"), table("", "t2")]
        );
    }

    #[test]
    fn test_cte() {
        assert_eq!(
            extract(
                "WITH cte AS (SELECT a FROM t2) SELECT a FROM t1",
                false
            ),
            vec![table("", "t1"), table("", "t2")]
        );
    }

    #[test]
    fn test_derived_table_alias_preference() {
        let sql = "SELECT * FROM a JOIN (SELECT * FROM b) AS x ON a.id = x.id";
        assert_eq!(extract(sql, false), vec![table("", "a"), table("", "b")]);
        assert_eq!(extract(sql, true), vec![table("", "a"), table("", "x")]);
    }

    #[test]
    fn test_top_level_alias_preference() {
        let sql = "SELECT * FROM db1.t1 AS one";
        assert_eq!(extract(sql, false), vec![table("db1", "t1")]);
        assert_eq!(extract(sql, true), vec![table("", "one")]);
    }

    #[test]
    fn test_union_flattened() {
        assert_eq!(
            extract(
                "SELECT a FROM t1 UNION SELECT a FROM t2 UNION ALL SELECT a FROM t3",
                false
            ),
            vec![table("", "t1"), table("", "t2"), table("", "t3")]
        );
    }

    #[test]
    fn test_insert() {
        assert_eq!(
            extract("INSERT INTO t1 (a) VALUES (1)", false),
            vec![table("", "t1")]
        );
        assert_eq!(
            extract("INSERT INTO t1 SELECT a FROM t2", false),
            vec![table("", "t1"), table("", "t2")]
        );
    }

    #[test]
    fn test_update() {
        assert_eq!(
            extract(
                "UPDATE t1 SET a = (SELECT max(a) FROM t2) WHERE b = (SELECT c FROM t3)",
                false
            ),
            vec![table("", "t1"), table("", "t2"), table("", "t3")]
        );
    }

    #[test]
    fn test_delete() {
        assert_eq!(extract("DELETE FROM t1", false), vec![table("", "t1")]);
        assert_eq!(
            extract(
                "DELETE t1, t2 FROM t1 INNER JOIN t2 WHERE t1.a = t2.a",
                false
            ),
            vec![
                table("", "t1"),
                table("", "t2"),
                table("", "t1"),
                table("", "t2")
            ]
        );
    }

    #[test]
    fn test_duplicates_kept_in_traversal_order() {
        assert_eq!(
            extract("SELECT a FROM t1 JOIN t1 AS other ON t1.id = other.id", false),
            vec![table("", "t1"), table("", "t1")]
        );
    }

    #[test]
    fn test_extract_databases() {
        let sql = "SELECT * FROM db2.t1 JOIN db1.t2 ON db2.t1.id = db1.t2.id; \
                   INSERT INTO db1.t3 VALUES (1); SELECT * FROM plain";
        assert_eq!(
            extract_databases(Dialect::MySql, sql).unwrap(),
            vec!["db1".to_string(), "db2".to_string()]
        );
    }

    #[test]
    fn test_extract_databases_unsupported_engine() {
        assert_eq!(
            extract_databases(Dialect::Postgres, "SELECT 1"),
            Err(Error::UnsupportedEngine(Dialect::Postgres))
        );
    }

    #[test]
    fn test_extraction_failure_bubbles() {
        assert!(matches!(
            extract_tables(Dialect::MySql, "SELECT FROM WHERE", false),
            Err(Error::ExtractionFailure(_))
        ));
    }
}
