//! Comet compiler CLI
//!
//! Main entry point for the `cometc` command.

use clap::{Parser, Subcommand};
use miette::{NamedSource, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "cometc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "The Comet programming language to C transpiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Transpile a Comet source file to C
    Build {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (defaults to the input path with a .c extension)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Emit an intermediate representation instead of C
        #[arg(long, value_enum)]
        emit: Option<EmitType>,
    },

    /// Analyze a Comet source file without emitting C
    Check {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Show the parsed AST
        #[arg(long)]
        show_ast: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum EmitType {
    /// Token stream (JSON)
    Tokens,
    /// Abstract syntax tree (JSON)
    Ast,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Build {
            input,
            output,
            emit,
        } => build(&input, output.as_deref(), emit),
        Commands::Check { input, show_ast } => check(&input, show_ast),
    }
}

fn read_source(input: &Path) -> Result<String> {
    std::fs::read_to_string(input)
        .map_err(|e| miette::miette!("Failed to read {}: {}", input.display(), e))
}

/// Attach the source file so errors render with a labelled snippet
fn report(error: comet::CompileError, input: &Path, source: &str) -> miette::Report {
    miette::Report::new(error)
        .with_source_code(NamedSource::new(input.to_string_lossy(), source.to_string()))
}

fn print_hints(hints: &[comet::Hint]) {
    for hint in hints {
        eprintln!("hint: {} @ {}", hint.message, hint.trace);
    }
}

fn build(input: &Path, output: Option<&Path>, emit: Option<EmitType>) -> Result<()> {
    let source = read_source(input)?;

    if let Some(emit) = emit {
        match emit {
            EmitType::Tokens => {
                let tokens = comet::tokenize(&source).map_err(|e| report(e, input, &source))?;
                let json = serde_json::to_string_pretty(&tokens)
                    .map_err(|e| miette::miette!("Failed to serialize tokens: {}", e))?;
                println!("{json}");
            }
            EmitType::Ast => {
                let ast = comet::parse(&source).map_err(|e| report(e, input, &source))?;
                let json = serde_json::to_string_pretty(&ast)
                    .map_err(|e| miette::miette!("Failed to serialize AST: {}", e))?;
                println!("{json}");
            }
        }
        return Ok(());
    }

    let transpiled = comet::transpile(&source).map_err(|e| report(e, input, &source))?;
    print_hints(&transpiled.hints);

    let output_path = match output {
        Some(path) => path.to_path_buf(),
        None => input.with_extension("c"),
    };

    std::fs::write(&output_path, transpiled.c_source)
        .map_err(|e| miette::miette!("Failed to write {}: {}", output_path.display(), e))?;

    tracing::info!("Wrote {}", output_path.display());
    Ok(())
}

fn check(input: &Path, show_ast: bool) -> Result<()> {
    let source = read_source(input)?;

    let (ast, _scopes, hints) = comet::analyze(&source).map_err(|e| report(e, input, &source))?;
    print_hints(&hints);

    if show_ast {
        let json = serde_json::to_string_pretty(&ast)
            .map_err(|e| miette::miette!("Failed to serialize AST: {}", e))?;
        println!("{json}");
    }

    println!("All checks passed: {}", input.display());
    Ok(())
}
