use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{self, filter::EnvFilter};

use refactor_engine::{
    EngineConfig, FsEditor, FsEditorOptions, RefactoringCatalog, Selection, ast::Position,
};

/// Format-preserving JavaScript refactorings from the command line
#[derive(Parser, Debug)]
#[command(name = "refactor-engine")]
#[command(about = "Run JavaScript refactorings that keep the surrounding formatting")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Workspace root that relative paths and cross-file lookups start from
    #[arg(
        short = 'd',
        long = "root-dir",
        global = true,
        help = "Workspace root (default: current directory)",
        value_name = "PATH"
    )]
    root_directory: Option<PathBuf>,

    /// Configuration file to use instead of the discovered one
    #[arg(long = "config", global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Maximum file size to process (in bytes)
    #[arg(long = "max-file-size", global = true, help = "Maximum file size to process in bytes")]
    max_file_size: Option<u64>,

    /// Maximum number of concurrent file reads
    #[arg(long = "max-concurrency", global = true)]
    max_concurrency: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the available refactorings
    List {
        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run one refactoring on a file
    Run {
        /// Refactoring key, as printed by `list`
        key: String,

        /// File to refactor
        #[arg(long, value_name = "PATH")]
        file: PathBuf,

        /// 1-based `LINE:COL` cursor or `LINE:COL-LINE:COL` range
        #[arg(long, value_parser = parse_selection)]
        selection: Selection,

        /// Answer to a prompt; repeat for several prompts
        #[arg(long = "answer", value_name = "TEXT")]
        answers: Vec<String>,

        /// New parameter order as old indices, e.g. `2,0,1`
        #[arg(long, value_delimiter = ',')]
        order: Option<Vec<usize>>,

        /// Print the resulting code instead of writing files
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::debug!("Arguments: {:?}", args);
    let config = create_config_from_args(&args)?;
    let catalog = RefactoringCatalog::with_defaults();

    match args.command {
        Commands::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&catalog.summary())?);
            } else {
                for info in catalog.summary() {
                    println!("{}\t{}", info.key, info.title);
                }
            }
        }
        Commands::Run {
            key,
            file,
            selection,
            answers,
            order,
            dry_run,
        } => {
            let options = FsEditorOptions {
                answers,
                order,
                dry_run,
            };
            let editor = FsEditor::open(config, &file, selection, options)
                .await
                .with_context(|| format!("Failed to open {}", file.display()))?;
            let report = catalog
                .run(&key, &editor)
                .await
                .ok_or_else(|| anyhow!("Unknown refactoring '{key}', see `refactor-engine list`"))??;

            if dry_run {
                for (path, code) in editor.written().await {
                    println!("// {}", path.display());
                    print!("{code}");
                }
            }
            if let Some(error) = report.error {
                eprintln!("{error}");
                std::process::exit(1);
            }
            tracing::info!("Done, {} writes", report.writes);
        }
    }
    Ok(())
}

/// Create an EngineConfig from command line arguments
fn create_config_from_args(args: &Args) -> Result<EngineConfig> {
    let root_directory = match &args.root_directory {
        Some(root) => root.clone(),
        // Default to current working directory
        None => std::env::current_dir()?,
    };

    let mut config = match &args.config {
        Some(path) => {
            let mut config = EngineConfig::from_file(path)?;
            config.root_directory = root_directory;
            config
        }
        None => EngineConfig::discover(&root_directory)?,
    };
    if let Some(max_file_size) = args.max_file_size {
        config.max_file_size = max_file_size;
    }
    if let Some(max_concurrency) = args.max_concurrency {
        config.max_concurrency = max_concurrency;
    }
    Ok(config)
}

/// `3:5` or `3:5-4:1`, 1-based as editors show them
fn parse_selection(value: &str) -> Result<Selection, String> {
    let position = |text: &str| -> Result<Position, String> {
        let (line, character) = text
            .split_once(':')
            .ok_or_else(|| format!("expected LINE:COL, got '{text}'"))?;
        let number = |part: &str| -> Result<usize, String> {
            match part.trim().parse::<usize>() {
                Ok(0) | Err(_) => Err(format!("'{part}' is not a 1-based number")),
                Ok(n) => Ok(n - 1),
            }
        };
        Ok(Position::new(number(line)?, number(character)?))
    };
    match value.split_once('-') {
        Some((start, end)) => Ok(Selection::new(position(start)?, position(end)?)),
        None => {
            let cursor = position(value)?;
            Ok(Selection::new(cursor, cursor))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cursor() {
        assert_eq!(parse_selection("3:5").unwrap(), Selection::cursor_at(2, 4));
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_selection("1:1-2:3").unwrap(), Selection::from_coords(0, 0, 1, 2));
    }

    #[test]
    fn test_parse_rejects_zero_and_garbage() {
        assert!(parse_selection("0:1").is_err());
        assert!(parse_selection("abc").is_err());
    }
}
