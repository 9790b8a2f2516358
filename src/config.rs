use crate::cli::{Args, ColorChoice, EmitMode};

/// Hard limits on how deep a program may nest, so that pathological input
/// fails cleanly instead of overflowing the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of simultaneously open `function`/`if`/`loop` bodies.
    pub max_nesting: usize,
    /// Maximum depth of nested function calls at run time.
    pub max_call_depth: usize,
}

impl Limits {
    pub const DEFAULT_MAX_NESTING: usize = 64;
    pub const DEFAULT_MAX_CALL_DEPTH: usize = 512;

    const BASE_STACK: usize = 1 << 20;
    const STACK_PER_BLOCK: usize = 32 << 10;
    const STACK_PER_CALL: usize = 64 << 10;

    /// Stack reserved for one run, large enough that both limits trip
    /// before the stack runs out, even in unoptimized builds.
    pub fn stack_size(&self) -> usize {
        Self::BASE_STACK
            .saturating_add(self.max_nesting.saturating_mul(Self::STACK_PER_BLOCK))
            .saturating_add(self.max_call_depth.saturating_mul(Self::STACK_PER_CALL))
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_nesting: Self::DEFAULT_MAX_NESTING,
            max_call_depth: Self::DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

pub struct AppConfig {
    pub color_enabled: bool,
    pub verbose: bool,
    pub emit: EmitMode,
    pub json: bool,
    pub counted: bool,
    pub limits: Limits,
}

impl AppConfig {
    pub fn from_args(args: &Args) -> Self {
        let color_enabled = match args.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => atty::is(atty::Stream::Stderr) && atty::is(atty::Stream::Stdout),
        };

        AppConfig {
            color_enabled,
            verbose: args.verbose,
            emit: args.emit,
            json: args.json,
            counted: args.counted,
            limits: Limits {
                max_nesting: args.max_nesting,
                max_call_depth: args.max_call_depth,
            },
        }
    }
}
