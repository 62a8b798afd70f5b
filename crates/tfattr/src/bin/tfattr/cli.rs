//! tfattr cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt;
use std::path::PathBuf;

/// Inspect attribute schemas and decode documents against them
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory that schema and input paths are relative to
    ///
    /// Repeatable, every directory is entered relative to the previous one.
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the type a schema lowers to
    Lower(LowerCommand),

    /// Print the attribute at a path
    ///
    /// Prints the type instead if the path points inside a plain attribute
    Resolve(ResolveCommand),

    /// Decode a json document against a schema
    ///
    /// Reads json from stdin unless --input-file is given. The document is decoded,
    /// encoded again and printed. Unknown values are written as {"$unknown": true}.
    Decode(DecodeCommand),
}

#[derive(Parser, Debug)]
pub struct SchemaArgs {
    /// Schema document (.yaml, .yml or .json)
    #[clap(short = 's', long = "schema")]
    pub schema: PathBuf,
}

#[derive(Parser, Debug)]
pub struct LowerCommand {
    #[clap(flatten)]
    pub schema: SchemaArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct ResolveCommand {
    #[clap(flatten)]
    pub schema: SchemaArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    /// Attribute path, e.g. disks[0].size or labels["env"]
    pub path: String,
}

#[derive(Parser, Debug)]
pub struct DecodeCommand {
    #[clap(flatten)]
    pub schema: SchemaArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    /// Read the json document from a file
    #[clap(short = 'i', long = "input-file")]
    pub input: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    /// How types, attributes and values are printed
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Default, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// json, numbers keep all their digits when decoding
    Json,
    #[default]
    Yaml,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_possible_value() {
            Some(value) => f.write_str(value.get_name()),
            None => Ok(()),
        }
    }
}
