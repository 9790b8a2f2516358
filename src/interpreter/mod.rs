pub mod control_flow;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod parser;

pub use control_flow::ControlFlow;
pub use environment::{Environment, FunctionTable, VariableStore};
pub use error::ExecutionError;
pub use evaluator::{parse_and_run, parse_and_run_with_diagnostics, run_program, Interpreter};
pub use parser::{parse, ParseError, ParserCursor, TokenParser};
