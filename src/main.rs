use clap::{ArgGroup, Parser, Subcommand};
use std::process::ExitCode;

use sql_slicer::dialect::Dialect;
use sql_slicer::error::Error;

#[derive(Debug, Parser)]
#[command(name = "sql-slicer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser, Debug)]
#[clap(group(ArgGroup::new("source").args(&["sql", "file"]).required(true)))]
struct CommonOptions {
    /// The subject SQL to operate on
    #[clap(value_parser, group = "source")]
    sql: Option<String>,
    /// The dialect of the input SQL
    #[clap(short, long, default_value = "mysql")]
    dialect: String,
    /// The file containing the SQL to operate on
    #[clap(short, long, value_parser, group = "source")]
    file: Option<String>,
}

#[derive(Parser, Debug)]
struct ExtractTablesOptions {
    #[clap(flatten)]
    common_options: CommonOptions,
    /// Report aliased tables under their alias instead of their real name
    #[clap(long)]
    prefer_alias: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split a SQL batch into statements
    Split(CommonOptions),
    /// Compute the fingerprint of a MySQL-family query
    Fingerprint(CommonOptions),
    /// Extract tables referenced by SQL
    ExtractTables(ExtractTablesOptions),
    /// Extract databases referenced by MySQL-family SQL
    ExtractDatabases(CommonOptions),
}

impl Commands {
    fn common_options(&self) -> &CommonOptions {
        match self {
            Commands::Split(opts)
            | Commands::Fingerprint(opts)
            | Commands::ExtractDatabases(opts) => opts,
            Commands::ExtractTables(opts) => &opts.common_options,
        }
    }

    fn execute(&self) -> Result<Vec<String>, Error> {
        let opts = self.common_options();
        let dialect: Dialect = opts.dialect.parse()?;
        let sql = match (&opts.sql, &opts.file) {
            (Some(sql), _) => sql.clone(),
            (None, Some(file)) => std::fs::read_to_string(file)
                .map_err(|e| Error::MalformedInput(format!("failed to read file {}: {}", file, e)))?,
            (None, None) => unreachable!("clap enforces the source group"),
        };
        match self {
            Commands::Split(_) => Ok(sql_slicer::split(dialect, &sql)?
                .into_iter()
                .map(|stmt| stmt.text)
                .collect()),
            Commands::Fingerprint(_) => Ok(vec![sql_slicer::fingerprint(dialect, &sql)?]),
            Commands::ExtractTables(opts) => {
                Ok(sql_slicer::extract_tables(dialect, &sql, opts.prefer_alias)?
                    .into_iter()
                    .map(|table| table.to_string())
                    .collect())
            }
            Commands::ExtractDatabases(_) => sql_slicer::extract_databases(dialect, &sql),
        }
    }
}

fn main() -> ExitCode {
    let args = Cli::parse();

    match args.command.execute() {
        Ok(result) => {
            for r in result {
                println!("{}", r);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
