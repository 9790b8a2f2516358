use crate::config::Limits;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "nestlang")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interpreter for the nestlang toy language", long_about = None)]
pub struct Args {
    /// Program file; standard input is read when omitted
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// First input line holds a line count N; only the next N lines are the program
    #[arg(long = "counted")]
    pub counted: bool,

    #[arg(long = "emit", value_name = "STAGE", value_enum, default_value_t = EmitMode::Run)]
    pub emit: EmitMode,

    /// Emit tokens or the syntax tree as JSON
    #[arg(long = "json")]
    pub json: bool,

    #[arg(long = "max-nesting", value_name = "N", default_value_t = Limits::DEFAULT_MAX_NESTING)]
    pub max_nesting: usize,

    #[arg(long = "max-call-depth", value_name = "N", default_value_t = Limits::DEFAULT_MAX_CALL_DEPTH)]
    pub max_call_depth: usize,

    #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print shell completions
    Complete {
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}

/// How far down the pipeline to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmitMode {
    Tokens,
    Ast,
    Run,
}

#[derive(Debug, Clone, Copy)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "Invalid color choice: {}. Must be 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = Args::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, &bin_name, &mut io::stdout());
}

/// Unwrap `--counted` input: the first line holds a count N and the program
/// is the N lines after it. A first line that is not a number counts as 0.
pub fn frame_counted(input: &str) -> String {
    let mut lines = input.lines();
    let count = lines
        .next()
        .and_then(|line| line.trim().parse::<usize>().ok())
        .unwrap_or(0);

    lines.take(count).fold(String::new(), |mut program, line| {
        program.push_str(line);
        program.push('\n');
        program
    })
}
