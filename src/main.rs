//! `csvavro` command-line front end.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use csvavro::{Compression, ConvertOptions, Direction, expand_inputs, run};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "csvavro")]
#[command(about = "Convert between delimited text files and Avro container files")]
#[command(version)]
struct Cli {
    /// Input files or glob patterns, followed by the output file
    #[arg(required = true, num_args = 2.., value_name = "INPUT... OUTPUT")]
    paths: Vec<String>,

    /// Convert Avro containers to text instead of text to a container
    #[arg(short, long)]
    reverse: bool,

    /// Overwrite the output file if it exists
    #[arg(short = 'f', long)]
    overwrite: bool,

    /// Append to the output file if it exists
    #[arg(short, long)]
    append: bool,

    /// Avro JSON schema file
    #[arg(short, long, env = "CSVAVRO_SCHEMA")]
    schema: Option<PathBuf>,

    /// Record name for the written schema
    #[arg(short = 'n', long = "name")]
    record_name: Option<String>,

    /// Deflate-compress container blocks
    #[arg(short, long)]
    compress: bool,

    /// Field delimiter; escapes such as \t or \x1f are accepted
    #[arg(short, long)]
    delimiter: Option<String>,

    /// Text has (or should get) a header row
    #[arg(long, action = ArgAction::SetTrue, overrides_with = "no_header")]
    header: bool,

    /// Text has no header row (or should get none)
    #[arg(long, action = ArgAction::SetTrue, overrides_with = "header")]
    no_header: bool,
}

impl Cli {
    fn header(&self) -> Option<bool> {
        match (self.header, self.no_header) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    fn options(&self) -> ConvertOptions {
        ConvertOptions {
            overwrite: self.overwrite,
            append: self.append,
            schema: self.schema.clone(),
            record_name: self.record_name.clone(),
            compression: if self.compress {
                Compression::Deflate
            } else {
                Compression::None
            },
            delimiter: self.delimiter.clone(),
            header: self.header(),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let (output, inputs) = cli
        .paths
        .split_last()
        .context("expected at least one input and an output")?;
    let inputs = expand_inputs(inputs)?;
    let output = PathBuf::from(output);
    let direction = if cli.reverse {
        Direction::ToText
    } else {
        Direction::ToContainer
    };

    let summary = run(direction, &inputs, &output, &cli.options())
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(
        files = summary.files,
        records = summary.records,
        output = %output.display(),
        "done"
    );
    Ok(())
}
