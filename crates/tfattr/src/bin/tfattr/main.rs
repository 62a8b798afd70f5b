mod cli;

use anyhow::Context;
use std::path::{Path, PathBuf};
use tfattr::schema::Schema;
use tfattr::{AttributePath, Error, WireValue};

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("TFATTR_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let command_result = enter_directories(&cli.directory).and_then(|()| match cli.command {
        cli::Command::Lower(lower_cli) => lower(lower_cli),
        cli::Command::Resolve(resolve_cli) => resolve(resolve_cli),
        cli::Command::Decode(decode_cli) => decode(decode_cli),
    });

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn lower(cli: cli::LowerCommand) -> anyhow::Result<()> {
    let schema = load(&cli.schema.schema)?;
    let ty = schema.attribute_type()?;

    output(&cli.output, &ty)
}

pub fn resolve(cli: cli::ResolveCommand) -> anyhow::Result<()> {
    let schema = load(&cli.schema.schema)?;
    let path: AttributePath = cli.path.parse()?;

    match schema.attribute_at_path(&path) {
        Ok(attribute) => output(&cli.output, attribute),
        Err(Error::PathInsideAtomicAttribute { .. }) | Err(Error::PathNotAttribute { .. }) => {
            tracing::debug!(%path, "no attribute at path, resolving type");
            let ty = schema.attribute_type_at_path(&path)?;
            output(&cli.output, &ty)
        }
        Err(e) => Err(e.into()),
    }
}

pub fn decode(cli: cli::DecodeCommand) -> anyhow::Result<()> {
    let schema = load(&cli.schema.schema)?;
    let ty = schema.attribute_type()?;

    let input = match &cli.input {
        Some(file_path) => std::fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read {}", file_path.display()))?,
        None => std::io::read_to_string(std::io::stdin())?,
    };
    let json: serde_json::Value = serde_json::from_str(&input).context("Invalid json document")?;

    let wire = WireValue::from_json(&ty.wire_type(), &json)?;
    let value = ty.value_from_wire(&wire)?;
    let encoded = value.to_wire()?;
    anyhow::ensure!(encoded == wire, "Document changed while decoding and encoding it");

    match cli.output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), &encoded)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), &encoded.to_json())?,
    };

    Ok(())
}

/// Applies every -C/--directory in order, each one relative to the previous
fn enter_directories(directories: &[PathBuf]) -> anyhow::Result<()> {
    for directory in directories {
        let cwd = directory
            .canonicalize()
            .with_context(|| format!("No such directory {} (-C)", directory.display()))?;
        std::env::set_current_dir(&cwd)
            .with_context(|| format!("Can't enter directory {}", cwd.display()))?;

        tracing::debug!(directory = %cwd.display(), "Entered directory");
    }

    Ok(())
}

/// Loads and validates a schema document, the format follows the file extension
fn load(path: &Path) -> anyhow::Result<Schema> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema {}", path.display()))?;

    let schema: Schema = match path.extension().and_then(|extension| extension.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Invalid schema {}", path.display()))?,
        _ => serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid schema {}", path.display()))?,
    };
    schema.validate()?;

    tracing::debug!(schema=%path.display(), version = schema.version, "Loaded schema");
    Ok(schema)
}

fn output<T: serde::Serialize + ?Sized>(output: &cli::OutputArgs, value: &T) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), value)?,
    };

    Ok(())
}
