// blockwire command line interface
// Encode/decode block metadata and normalize row files into columnar blocks

use anyhow::Context;
use blockwire_core::{Block, BlockMetadata, BlockwireConfig, LoggingConfig, Schema, Value};
use clap::{Parser, Subcommand};
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "blockwire")]
#[command(about = "Inspect block metadata and build columnar blocks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (TOML or YAML)
    #[arg(long, short, global = true)]
    config: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode block metadata and print it as hex
    EncodeMetadata {
        /// Mark the block as holding overflow rows
        #[arg(long)]
        overflows: bool,

        /// Aggregation bucket number (-1 = not applicable)
        #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
        bucket_num: i32,
    },

    /// Decode hex-encoded block metadata and print it as JSON
    DecodeMetadata {
        hex: String,
    },

    /// Build a block from a JSON file of rows and print its columns
    Normalize {
        /// Schema file (JSON array of {"name", "data_type"})
        #[arg(long, short)]
        schema: Option<String>,

        /// Rows file (JSON array of objects or arrays)
        #[arg(long, short)]
        rows: String,

        /// Validate row kinds and cell types
        #[arg(long)]
        types_check: bool,
    },

    /// Build a block from a JSON file of columns and print its rows
    Rows {
        #[arg(long, short)]
        schema: String,

        /// Columns file (JSON array of arrays)
        #[arg(long)]
        columns: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    init_logging(&config.logging)?;
    debug!(?config, "loaded configuration");

    match cli.command {
        Commands::EncodeMetadata { overflows, bucket_num } => {
            let metadata = BlockMetadata::new(overflows, bucket_num);
            println!("{}", hex::encode(metadata.to_bytes()));
        }
        Commands::DecodeMetadata { hex: encoded } => {
            let bytes = hex::decode(encoded.trim()).context("metadata is not valid hex")?;
            let metadata = BlockMetadata::from_bytes(&bytes).context("failed to decode block metadata")?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        Commands::Normalize { schema, rows, types_check } => {
            let schema = schema.as_deref().map(read_schema).transpose()?;
            let rows: Vec<JsonValue> = read_json(&rows)?;
            let types_check = types_check || config.block.types_check;

            let block = Block::from_json_rows(schema, &rows, None, types_check)
                .context("failed to normalize rows")?;
            info!(
                rows = block.row_count(),
                columns = block.column_count(),
                "normalized block"
            );

            let output = json!({
                "row_count": block.row_count(),
                "column_count": block.column_count(),
                "columns": block.columns().iter().map(|c| values_to_json(c)).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Rows { schema, columns } => {
            let schema = read_schema(&schema)?;
            let raw: Vec<Vec<JsonValue>> = read_json(&columns)?;
            let columns = typed_columns(&schema, &raw);

            let block = Block::from_columns(schema, columns, BlockMetadata::default())
                .context("columns do not form a valid block")?;
            let rows: Vec<JsonValue> = block.rows().iter().map(|r| values_to_json(r)).collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<BlockwireConfig> {
    let mut config = match &cli.config {
        Some(path) => BlockwireConfig::from_file(path)?,
        None => BlockwireConfig::from_env(),
    };

    if let Some(level) = &cli.log_level {
        config.logging.level = level.to_lowercase();
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    config.validate()?;
    Ok(config)
}

fn init_logging(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&logging.level)
        .with_context(|| format!("invalid log level '{}'", logging.level))?;

    // Logs go to stderr so stdout stays machine-readable
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path))
}

fn read_schema(path: &str) -> anyhow::Result<Schema> {
    read_json(path)
}

fn typed_columns(schema: &Schema, raw: &[Vec<JsonValue>]) -> Vec<Vec<Value>> {
    raw.iter()
        .enumerate()
        .map(|(j, column)| match schema.fields.get(j) {
            Some(field) => column
                .iter()
                .map(|v| Value::from_json_typed(v, &field.data_type))
                .collect::<Vec<_>>(),
            None => column.iter().map(Value::from_json).collect::<Vec<_>>(),
        })
        .collect()
}

fn values_to_json(values: &[Value]) -> JsonValue {
    JsonValue::Array(values.iter().map(Value::to_json).collect())
}
