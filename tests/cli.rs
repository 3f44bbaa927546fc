#[cfg(test)]
mod tests {
    use assert_cmd::Command;
    use predicates::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sql_slicer_cmd() -> Command {
        Command::cargo_bin("sql-slicer").unwrap()
    }

    mod split {
        use super::*;

        #[test]
        fn test_split() {
            sql_slicer_cmd()
                .arg("split")
                .arg("SELECT 1; SELECT 2;")
                .assert()
                .success()
                .stdout("SELECT 1;\n SELECT 2;\n")
                .stderr("");
        }

        #[test]
        fn test_split_with_dialect() {
            sql_slicer_cmd()
                .arg("split")
                .arg("--dialect")
                .arg("oracle")
                .arg("SELECT 1; SELECT 2;")
                .assert()
                .success()
                .stdout("SELECT 1\n SELECT 2\n")
                .stderr("");
        }

        #[test]
        fn test_split_from_file() {
            let mut temp_file = NamedTempFile::new().unwrap();
            temp_file.write_all(b"SELECT 1; SELECT 2;").unwrap();
            sql_slicer_cmd()
                .arg("split")
                .arg("--file")
                .arg(temp_file.path())
                .assert()
                .success()
                .stdout("SELECT 1;\n SELECT 2;\n")
                .stderr("");
        }
    }

    mod fingerprint {
        use super::*;

        #[test]
        fn test_fingerprint() {
            sql_slicer_cmd()
                .arg("fingerprint")
                .arg("SELECT * FROM t1 WHERE id = 1")
                .assert()
                .success()
                .stdout("select * from t1 where id = ?\n")
                .stderr("");
        }

        #[test]
        fn test_fingerprint_rejects_postgres() {
            sql_slicer_cmd()
                .arg("fingerprint")
                .arg("--dialect")
                .arg("postgres")
                .arg("SELECT 1")
                .assert()
                .failure()
                .stderr(predicate::str::contains(
                    "engine type is not supported: POSTGRES",
                ));
        }
    }

    mod extract_tables {
        use super::*;

        #[test]
        fn test_extract_tables() {
            sql_slicer_cmd()
                .arg("extract-tables")
                .arg("SELECT a FROM t1 JOIN t2 ON t1.id = t2.id")
                .assert()
                .success()
                .stdout("t1\nt2\n")
                .stderr("");
        }

        #[test]
        fn test_extract_tables_prefer_alias() {
            sql_slicer_cmd()
                .arg("extract-tables")
                .arg("--prefer-alias")
                .arg("SELECT * FROM a JOIN (SELECT * FROM b) AS x ON a.id = x.id")
                .assert()
                .success()
                .stdout("a\nx\n")
                .stderr("");
        }
    }

    mod extract_databases {
        use super::*;

        #[test]
        fn test_extract_databases() {
            sql_slicer_cmd()
                .arg("extract-databases")
                .arg("SELECT * FROM db2.t1 JOIN db1.t2 ON db2.t1.id = db1.t2.id")
                .assert()
                .success()
                .stdout("db1\ndb2\n")
                .stderr("");
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn test_unknown_dialect() {
            sql_slicer_cmd()
                .arg("split")
                .arg("--dialect")
                .arg("sqlite")
                .arg("SELECT 1;")
                .assert()
                .failure()
                .stderr(predicate::str::contains("unknown dialect"));
        }

        #[test]
        fn test_missing_source() {
            sql_slicer_cmd().arg("split").assert().failure();
        }
    }
}
