//! Defines the command-line arguments and subcommands for the mecha CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "mecha",
    version,
    about = "A data-driven compiler for Minecraft function files."
)]
pub struct MechaArgs {
    /// Raise the log level (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse, transform, lint and serialize function files.
    Compile(CompileArgs),
    /// List the command prototypes generated from the grammar.
    Prototypes {
        /// Extra command tree JSON files merged over the bundled grammar.
        #[arg(long = "grammar")]
        grammars: Vec<PathBuf>,
        /// Only list prototypes whose identifier starts with this prefix.
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show the Abstract Syntax Tree (AST) of a function file.
    Ast {
        /// The function file to parse.
        #[arg(required = true)]
        file: PathBuf,
        #[arg(long = "grammar")]
        grammars: Vec<PathBuf>,
        /// Treat indented blocks after a trailing `:` as nested commands.
        #[arg(long)]
        multiline: bool,
        /// Keep comments in the tree.
        #[arg(long)]
        keep_comments: bool,
    },
}

#[derive(Debug, Args)]
pub struct CompileArgs {
    /// Function files or directories searched for `.mcfunction` files.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
    /// YAML or JSON compiler options.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Extra command tree JSON files merged over the bundled grammar.
    #[arg(long = "grammar")]
    pub grammars: Vec<PathBuf>,
    /// Write compiled functions under this directory instead of stdout.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
    /// Exit with an error if compiling would change any file.
    #[arg(long)]
    pub check: bool,
    /// Print a diff between each file and its compiled output.
    #[arg(long)]
    pub diff: bool,
    #[arg(long)]
    pub multiline: bool,
    /// Render diagnostics as rich reports.
    #[arg(long)]
    pub fancy: bool,
}
