use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

use tag_import::common::logging::{init_logger, LogLevel};
use tag_import::{ImportConfig, ImportOutcome};

/// Imports a channel/device/tag configuration export into the `tags` table
#[derive(Parser, Debug)]
#[command(name = "tag-import")]
struct Args {
    /// JSON settings file, options given here override its values
    #[arg(long = "config")]
    config_file: Option<PathBuf>,
    /// Exported JSON document to import
    #[arg(env = "TAG_IMPORT_FILE")]
    file_path: Option<PathBuf>,
    /// Data directory holding the database files
    #[arg(long = "server", env = "TAG_IMPORT_SERVER")]
    server: Option<PathBuf>,
    #[arg(long = "database", env = "TAG_IMPORT_DATABASE")]
    database: Option<String>,
    #[arg(long = "default-database")]
    default_database: Option<String>,
    /// SQLite VFS used to open the databases
    #[arg(long = "driver", env = "TAG_IMPORT_DRIVER")]
    driver: Option<String>,
    #[arg(long = "batch-size")]
    batch_size: Option<usize>,
    #[arg(long = "sample-size")]
    sample_size: Option<usize>,
    #[arg(long = "log-level", value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
    #[arg(long = "log-file", default_value = "")]
    log_file: String,
}

impl Args {
    fn into_config(self) -> anyhow::Result<ImportConfig> {
        let mut config = match &self.config_file {
            Some(path) => ImportConfig::from_file(path)?,
            None => ImportConfig::default(),
        };

        if let Some(file_path) = self.file_path {
            config.file_path = file_path;
        }
        if let Some(server) = self.server {
            config.server = server;
        }
        if let Some(database) = self.database {
            config.database = database;
        }
        if let Some(default_database) = self.default_database {
            config.default_database = default_database;
        }
        if self.driver.is_some() {
            config.driver = self.driver;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(sample_size) = self.sample_size {
            config.sample_size = sample_size;
        }

        config.validate()?;
        Ok(config)
    }
}

//With logging disabled errors still have to reach the operator
fn report_error(logging: bool, out: &mut impl Write, message: &str) {
    if logging {
        error!("{}", message);
    } else {
        let _ = writeln!(out, "{}", message);
    }
}

fn main() {
    let args = Args::parse();
    let logging = args.log_level != LogLevel::No;

    //We have to keep the worker_guard alive
    let _worker_guard = if logging {
        init_logger(args.log_level.clone(), args.log_file.clone()).unwrap_or_else(|e| {
            eprintln!("Couldn't init logger: {}", e);
            std::process::exit(1);
        })
    } else {
        None
    };

    let config = args.into_config().unwrap_or_else(|e| {
        report_error(logging, &mut std::io::stderr(), &format!("Wrong config:\n{}", e));
        std::process::exit(1);
    });

    let start = Instant::now();

    match tag_import::run(&config) {
        Ok(ImportOutcome::NothingToImport) => {}
        Ok(ImportOutcome::Imported { summary, .. }) => {
            info!("\n{}", summary);
            info!("ALL DONE in {:.1} seconds", start.elapsed().as_secs_f64());
        }
        Err(e) => {
            report_error(logging, &mut std::io::stderr(), &e.to_string());
            std::process::exit(1);
        }
    }
}
