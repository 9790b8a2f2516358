use clap::Parser;
use nestlang::cli::{frame_counted, generate_completions, Args, Commands, EmitMode};
use nestlang::config::AppConfig;
use nestlang::diagnostic::render_diagnostics;
use nestlang::{interpreter, lexer};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, Level};

/// Sentinel written to stdout whenever the program fails to lex, parse or run.
const FAILURE_SENTINEL: &str = "ERROR";

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Program(#[from] nestlang::Error),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

fn main() {
    let args = Args::parse();

    if let Some(Commands::Complete { shell }) = args.command {
        generate_completions(shell);
        return;
    }

    let config = AppConfig::from_args(&args);
    init_tracing(&config);

    let input = match read_input(args.file.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            error_message(&config, &e);
            std::process::exit(1);
        }
    };
    debug!(bytes = input.len(), counted = config.counted, "read program input");

    let source = if config.counted {
        frame_counted(&input)
    } else {
        input
    };

    let result = match config.emit {
        EmitMode::Tokens => emit_tokens(&source, &config),
        EmitMode::Ast => emit_ast(&source, &config),
        EmitMode::Run => execute(&source, &config),
    };

    match result {
        Ok(()) => {}
        Err(CliError::Program(e)) => {
            println!("{}", FAILURE_SENTINEL);
            if config.verbose {
                let file_name = args
                    .file
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<stdin>".to_string());
                let rendered = render_diagnostics(&source, &file_name, &[e.to_diagnostic()], config.color_enabled);
                eprint!("{}", rendered);
            }
            std::process::exit(1);
        }
        Err(CliError::Io(e)) => {
            error_message(&config, &format!("Error writing output: {}", e));
            std::process::exit(1);
        }
    }
}

fn init_tracing(config: &AppConfig) {
    let level = if config.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_ansi(config.color_enabled)
        .with_target(false)
        .init();
}

fn read_input(file: Option<&Path>) -> Result<String, String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e)),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| format!("Failed to read stdin: {}", e))?;
            Ok(buffer)
        }
    }
}

fn emit_tokens(source: &str, config: &AppConfig) -> Result<(), CliError> {
    let tokens = lexer::tokenize_with_limits(source, config.limits).map_err(nestlang::Error::from)?;
    if config.json {
        return write_json(&tokens);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for spanned in &tokens {
        writeln!(out, "{}", spanned.token)?;
    }
    Ok(())
}

fn emit_ast(source: &str, config: &AppConfig) -> Result<(), CliError> {
    let tokens = lexer::tokenize_with_limits(source, config.limits).map_err(nestlang::Error::from)?;
    let program = interpreter::parse(&tokens).map_err(nestlang::Error::from)?;
    if config.json {
        return write_json(&program);
    }

    writeln!(io::stdout(), "{:#?}", program)?;
    Ok(())
}

/// Run the program. Printed output is buffered so that stdout carries
/// either the program's line or the failure sentinel, never both.
fn execute(source: &str, config: &AppConfig) -> Result<(), CliError> {
    let mut output = Vec::new();
    interpreter::run_program(source, config.limits, &mut output)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    out.write_all(&output)?;
    out.flush()?;
    Ok(())
}

fn write_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).map_err(io::Error::from)?;
    writeln!(out)?;
    Ok(())
}

fn error_message(config: &AppConfig, message: &str) {
    if config.color_enabled {
        eprintln!("{}", message.red().bold());
    } else {
        eprintln!("{}", message);
    }
}
