//! The mecha Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::path::{Path, PathBuf};
use std::{fs, process};

use thiserror::Error;
use tracing::{debug, info};

use crate::cli::args::{Command, CompileArgs, MechaArgs};
use crate::config::{CompilerOptions, ConfigError};
use crate::database::SourceFile;
use crate::diagnostics::Diagnostic;
use crate::engine::{EngineError, Mecha};
use crate::grammar::{load_grammar, CommandSpec, GrammarError};
use crate::syntax::{ParseOptions, Parser};

pub mod args;
pub mod discovery;
pub mod output;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// The main entry point for the CLI.
pub fn run(args: MechaArgs) {
    // Dispatch to the appropriate subcommand handler.
    let result = match args.command {
        Command::Compile(compile) => handle_compile(&compile),
        Command::Prototypes { grammars, filter } => handle_prototypes(&grammars, filter.as_deref()),
        Command::Ast {
            file,
            grammars,
            multiline,
            keep_comments,
        } => handle_ast(
            &file,
            &grammars,
            ParseOptions {
                multiline,
                keep_comments,
            },
        ),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    }
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn load_spec(grammars: &[PathBuf]) -> Result<CommandSpec, CliError> {
    let trees = grammars
        .iter()
        .map(|path| load_grammar(path))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CommandSpec::with_grammars(&trees, true)?)
}

/// Handles the `compile` subcommand. Returns `false` when the build failed
/// or `--check` found files that would change.
fn handle_compile(args: &CompileArgs) -> Result<bool, CliError> {
    let mut options = match &args.config {
        Some(path) => CompilerOptions::load(path)?,
        None => CompilerOptions::default(),
    };
    options.multiline |= args.multiline;
    options.grammars.extend(args.grammars.iter().cloned());
    let mut mecha = Mecha::new(options)?;

    let files = discovery::discover_function_files(&args.paths)?;
    info!(files = files.len(), "compiling");
    let count = files.len();
    for path in files {
        let mut file = SourceFile::new(read(&path)?).with_filename(path.display().to_string());
        if let Some(name) = discovery::resource_name(&path) {
            file = file.with_resource_name(name);
        }
        mecha.add(file);
    }

    let result = mecha.run();
    let database = &mecha.database;
    let source_of = |diagnostic: &Diagnostic| {
        diagnostic
            .file
            .and_then(|handle| database.get(handle))
            .and_then(|unit| unit.source.as_deref())
    };
    let report = match result {
        Ok(report) => report,
        Err(error) => {
            output::print_diagnostics(&error.diagnostics, source_of, args.fancy);
            output::print_summary(&error.diagnostics, count);
            return Ok(false);
        }
    };
    output::print_diagnostics(&report.diagnostics, source_of, args.fancy);

    let mut unchanged = true;
    let single = report.outputs.len() == 1;
    for compiled in &report.outputs {
        let name = compiled
            .file
            .filename
            .clone()
            .or_else(|| compiled.file.resource_name.clone())
            .unwrap_or_else(|| compiled.handle.to_string());

        let original = database.get(compiled.handle).and_then(|unit| unit.source.as_deref());
        if let Some(text) = original {
            if text != compiled.file.text {
                unchanged = false;
                if args.diff {
                    output::print_file_diff(&name, text, &compiled.file.text);
                }
                if args.check {
                    println!("would change: {name}");
                }
            }
        }
        if args.check || args.diff {
            continue;
        }

        match &args.out_dir {
            Some(out_dir) => {
                let target = output_path(out_dir, &compiled.file);
                write_output(&target, &compiled.file.text)?;
                debug!(path = %target.display(), "wrote function");
            }
            None if single => print!("{}", compiled.file.text),
            None => print!("==> {name} <==\n{}", compiled.file.text),
        }
    }

    Ok(!args.check || unchanged)
}

/// Units with a resource name land at `data/<namespace>/function/<path>.mcfunction`,
/// others keep their file name.
fn output_path(out_dir: &Path, file: &SourceFile) -> PathBuf {
    if let Some((namespace, path)) = file.resource_name.as_deref().and_then(|name| name.split_once(':')) {
        return out_dir
            .join("data")
            .join(namespace)
            .join("function")
            .join(format!("{path}.{}", discovery::FUNCTION_EXTENSION));
    }
    let name = file
        .filename
        .as_deref()
        .and_then(|filename| Path::new(filename).file_name())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("output.{}", discovery::FUNCTION_EXTENSION)));
    out_dir.join(name)
}

fn write_output(path: &Path, text: &str) -> Result<(), CliError> {
    let error = |source| CliError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(error)?;
    }
    fs::write(path, text).map_err(error)
}

/// Handles the `prototypes` subcommand.
fn handle_prototypes(grammars: &[PathBuf], filter: Option<&str>) -> Result<bool, CliError> {
    let spec = load_spec(grammars)?;
    print!("{}", output::format_prototypes(&spec, filter));
    Ok(true)
}

/// Handles the `ast` subcommand.
fn handle_ast(path: &Path, grammars: &[PathBuf], options: ParseOptions) -> Result<bool, CliError> {
    let spec = load_spec(grammars)?;
    let parser = Parser::new(std::sync::Arc::new(spec), options);
    let text = read(path)?;
    match parser.parse(&text) {
        Ok(tree) => {
            print!("{}", output::format_ast(&tree));
            Ok(true)
        }
        Err(error) => {
            let diagnostic = error
                .into_diagnostic()
                .with_filename(path.display().to_string());
            output::print_diagnostics(&diagnostic.into(), |_| Some(text.as_str()), false);
            Ok(false)
        }
    }
}
