use super::control_flow::ControlFlow;
use super::environment::{Environment, VariableStore};
use super::error::ExecutionError;
use super::parser::parse;
use crate::ast::{Chain, ComparisonOp, ExprNode, LogicalOp, ModificationOp, Stmt, ValueNode};
use crate::config::Limits;
use crate::diagnostic::Diagnostic;
use crate::error::Error;
use crate::lexer::tokenize_with_limits;
use std::io::Write;
use std::panic;
use std::rc::Rc;
use std::thread;
use tracing::{debug, trace};

fn apply_modification(op: ModificationOp, current: i64, operand: i64) -> i64 {
    match op {
        ModificationOp::Add => current.wrapping_add(operand),
        ModificationOp::Subtract => current.wrapping_sub(operand),
        ModificationOp::Multiply => current.wrapping_mul(operand),
        ModificationOp::Assign => operand,
    }
}

/// Tree-walking interpreter. Function bodies are borrowed from the program,
/// so one interpreter runs one program.
pub struct Interpreter<'ast, W: Write> {
    env: Environment<'ast>,
    output: W,
    limits: Limits,
    call_depth: usize,
    halted: bool,
}

impl<'ast, W: Write> Interpreter<'ast, W> {
    pub fn new(output: W) -> Self {
        Self::with_limits(output, Limits::default())
    }

    pub fn with_limits(output: W, limits: Limits) -> Self {
        Self {
            env: Environment::new(),
            output,
            limits,
            call_depth: 0,
            halted: false,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn variables(&self) -> &VariableStore {
        &self.env.variables
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn run(&mut self, program: &'ast Chain) -> Result<(), ExecutionError> {
        debug!(statements = program.len(), "running program");
        self.execute_chain(program)?;
        debug!(
            halted = self.halted,
            variables = self.env.variables.len(),
            functions = self.env.functions.len(),
            "program finished"
        );
        Ok(())
    }

    fn execute_chain(&mut self, chain: &'ast Chain) -> Result<ControlFlow, ExecutionError> {
        for statement in &chain.statements {
            if self.halted {
                return Ok(ControlFlow::Halt);
            }
            if self.execute_statement(statement)? == ControlFlow::Halt {
                return Ok(ControlFlow::Halt);
            }
        }
        Ok(ControlFlow::Next)
    }

    fn execute_statement(&mut self, statement: &'ast Stmt) -> Result<ControlFlow, ExecutionError> {
        trace!(depth = self.call_depth, ?statement, "execute");
        match statement {
            Stmt::Print => {
                self.print()?;
                Ok(ControlFlow::Halt)
            }
            Stmt::Delete { name } => {
                self.env
                    .variables
                    .remove(name)
                    .ok_or_else(|| ExecutionError::undefined_variable(name.to_string()))?;
                Ok(ControlFlow::Next)
            }
            Stmt::Call { name } => self.call(name),
            Stmt::Modify { op, name, value } => {
                let operand = self.evaluate_value(value)?;
                match op {
                    ModificationOp::Assign => self.env.variables.assign(Rc::clone(name), operand),
                    op => {
                        let current = self
                            .env
                            .variables
                            .get_mut(name)
                            .ok_or_else(|| ExecutionError::undefined_variable(name.to_string()))?;
                        *current = apply_modification(*op, *current, operand);
                    }
                }
                Ok(ControlFlow::Next)
            }
            Stmt::FunctionDeclaration { name, body } => {
                let replaced = self.env.functions.declare(Rc::clone(name), body);
                debug!(function = %name, replaced, "declared function");
                Ok(ControlFlow::Next)
            }
            Stmt::Condition { condition, body } => {
                if self.evaluate_expression(condition)? {
                    self.execute_chain(body)
                } else {
                    Ok(ControlFlow::Next)
                }
            }
            Stmt::Loop { count, body } => {
                let count = self.evaluate_value(count)?;
                for _ in 0..count.max(0) {
                    if self.halted || self.execute_chain(body)? == ControlFlow::Halt {
                        return Ok(ControlFlow::Halt);
                    }
                }
                Ok(ControlFlow::Next)
            }
        }
    }

    fn call(&mut self, name: &str) -> Result<ControlFlow, ExecutionError> {
        let body = self
            .env
            .functions
            .get(name)
            .ok_or_else(|| ExecutionError::undefined_function(name))?;

        if self.call_depth >= self.limits.max_call_depth {
            return Err(ExecutionError::CallDepthExceeded {
                limit: self.limits.max_call_depth,
            });
        }

        self.call_depth += 1;
        let result = self.execute_chain(body);
        self.call_depth -= 1;
        result
    }

    /// Write every variable in declaration order and stop the program.
    fn print(&mut self) -> Result<(), ExecutionError> {
        self.halted = true;
        debug!(variables = self.env.variables.len(), "print halts the program");
        if self.env.variables.is_empty() {
            return Ok(());
        }

        let line = self
            .env
            .variables
            .iter()
            .map(|(_, value)| value.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(self.output, "{}", line)?;
        self.output.flush()?;
        Ok(())
    }

    pub fn evaluate_value(&self, value: &ValueNode) -> Result<i64, ExecutionError> {
        match value {
            ValueNode::Number(n) => Ok(*n),
            ValueNode::Identifier(name) => self
                .env
                .variables
                .get(name)
                .ok_or_else(|| ExecutionError::undefined_variable(name.to_string())),
        }
    }

    /// Both operands of `and`/`or` are evaluated, so an undefined variable
    /// on either side is always an error.
    pub fn evaluate_expression(&self, expression: &ExprNode) -> Result<bool, ExecutionError> {
        match expression {
            ExprNode::Comparison { op, left, right } => {
                let left = self.evaluate_value(left)?;
                let right = self.evaluate_value(right)?;
                Ok(match op {
                    ComparisonOp::Equals => left == right,
                    ComparisonOp::NotEquals => left != right,
                })
            }
            ExprNode::Logical { op, left, right } => {
                let left = self.evaluate_expression(left)?;
                let right = self.evaluate_expression(right)?;
                Ok(match op {
                    LogicalOp::Or => left || right,
                    LogicalOp::And => left && right,
                })
            }
        }
    }
}

/// Lex, parse and run `source`, writing any printed line to `output`.
///
/// The whole pipeline runs on a scoped thread whose stack is sized from
/// `limits`, so deep input stops at a limit rather than overflowing the
/// caller's stack.
pub fn run_program<W: Write + Send>(source: &str, limits: Limits, output: W) -> Result<(), Error> {
    thread::scope(|scope| {
        let worker = thread::Builder::new()
            .name("nestlang-run".to_string())
            .stack_size(limits.stack_size())
            .spawn_scoped(scope, move || run_on_current_thread(source, limits, output))
            .map_err(ExecutionError::Spawn)?;
        worker.join().unwrap_or_else(|payload| panic::resume_unwind(payload))
    })
}

fn run_on_current_thread<W: Write>(source: &str, limits: Limits, output: W) -> Result<(), Error> {
    let tokens = tokenize_with_limits(source, limits)?;
    let program = parse(&tokens)?;
    let mut interpreter = Interpreter::with_limits(output, limits);
    interpreter.run(&program)?;
    Ok(())
}

pub fn parse_and_run(source: &str) -> Result<String, Error> {
    let mut output = Vec::new();
    run_program(source, Limits::default(), &mut output)?;
    Ok(String::from_utf8_lossy(&output).into_owned())
}

pub fn parse_and_run_with_diagnostics(source: &str, limits: Limits) -> Result<String, Vec<Diagnostic>> {
    let mut output = Vec::new();
    match run_program(source, limits, &mut output) {
        Ok(()) => Ok(String::from_utf8_lossy(&output).into_owned()),
        Err(e) => Err(vec![e.to_diagnostic()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> String {
        parse_and_run(source).expect("program failed")
    }

    fn run_err(source: &str) -> ExecutionError {
        match parse_and_run(source) {
            Err(Error::Execution(e)) => e,
            other => panic!("expected an execution error, got {:?}", other),
        }
    }

    #[test]
    fn test_print_in_declaration_order() {
        assert_eq!(run("x = 3\ny = 5\nprint\n"), "3 5\n");
        assert_eq!(run("x=1\ny=2\nx=9\nprint\n"), "9 2\n");
    }

    #[test]
    fn test_print_without_variables_writes_nothing() {
        assert_eq!(run("print\n"), "");
    }

    #[test]
    fn test_no_print_no_output() {
        assert_eq!(run("x = 1\n"), "");
    }

    #[test]
    fn test_print_halts_everything_after_it() {
        assert_eq!(run("x = 1\nprint\nx = 2\nprint\n"), "1\n");
        assert_eq!(run("if 1==1 then print\nx = 9\nprint\n"), "");
        assert_eq!(run("if 1==2 then print\nx=9\nprint\n"), "9\n");
    }

    #[test]
    fn test_print_inside_loop_stops_the_loop() {
        assert_eq!(run("x = 0\nloop 5 do x add 1 if $x == 2 then print\nx = 100\nprint\n"), "2\n");
    }

    #[test]
    fn test_print_inside_function_stops_the_caller() {
        assert_eq!(run("f function x = 1 print\nf()\nx = 2\nprint\n"), "1\n");
    }

    #[test]
    fn test_arithmetic_wraps() {
        assert_eq!(run("x = 9223372036854775807\nx add 1\nprint\n"), "-9223372036854775808\n");
        assert_eq!(run("x = 7\nx sub 10\ny = -3\ny mult $x\nprint\n"), "-3 9\n");
    }

    #[test]
    fn test_loop_count_is_evaluated_once() {
        assert_eq!(run("n = 3\nx = 0\nloop $n do n add 1 x add 1\nprint\n"), "6 3\n");
    }

    #[test]
    fn test_negative_loop_count_runs_zero_times() {
        assert_eq!(run("x = 0\nloop -2 do x add 1\nprint\n"), "0\n");
    }

    #[test]
    fn test_function_redeclaration_last_wins() {
        assert_eq!(run("f function x = 1\nf function x = 2\nf()\nprint\n"), "2\n");
    }

    #[test]
    fn test_function_declared_inside_function() {
        assert_eq!(run("f function g function x = 7\nf()\ng()\nprint\n"), "7\n");
    }

    #[test]
    fn test_recursion() {
        let source = "n = 5\nx = 0\nf function if $n != 0 then n sub 1 x add 2 f()\nf()\nprint\n";
        assert_eq!(run(source), "0 10\n");
    }

    #[test]
    fn test_delete_then_reassign_appends() {
        assert_eq!(run("x = 1\ny = 2\ndelete x\nx = 3\nprint\n"), "2 3\n");
    }

    #[test]
    fn test_undefined_variable_errors() {
        assert!(matches!(run_err("x = $y\n"), ExecutionError::UndefinedVariable { name } if name == "y"));
        assert!(matches!(run_err("x add 1\n"), ExecutionError::UndefinedVariable { .. }));
        assert!(matches!(run_err("delete x\n"), ExecutionError::UndefinedVariable { .. }));
        assert!(matches!(run_err("x = 1\ndelete x\nx add 1\n"), ExecutionError::UndefinedVariable { .. }));
        assert!(matches!(run_err("loop $n do print\n"), ExecutionError::UndefinedVariable { .. }));
    }

    #[test]
    fn test_undefined_function_error() {
        assert!(matches!(run_err("f()\n"), ExecutionError::UndefinedFunction { name } if name == "f"));
    }

    #[test]
    fn test_logical_operators_do_not_short_circuit() {
        assert!(matches!(
            run_err("if 1 == 2 and $missing == 1 then print\n"),
            ExecutionError::UndefinedVariable { .. }
        ));
        assert!(matches!(
            run_err("if 1 == 1 or $missing == 1 then print\n"),
            ExecutionError::UndefinedVariable { .. }
        ));
    }

    #[test]
    fn test_logical_operators() {
        assert_eq!(run("x = 1\nif $x == 1 and $x != 2 then x = 5\nprint\n"), "5\n");
        assert_eq!(run("x = 1\nif $x == 2 or $x == 3 then x = 5\nprint\n"), "1\n");
    }

    #[test]
    fn test_error_after_output_does_not_happen() {
        assert_eq!(run("x = 1\nprint\ndelete nothing\n"), "1\n");
    }

    #[test]
    fn test_call_depth_limit() {
        let limits = Limits { max_call_depth: 3, ..Limits::default() };
        let mut output = Vec::new();
        let result = run_program("f function f()\nf()\n", limits, &mut output);
        assert!(matches!(
            result,
            Err(Error::Execution(ExecutionError::CallDepthExceeded { limit: 3 }))
        ));
    }

    #[test]
    fn test_interpreter_state_after_run() {
        let tokens = tokenize_with_limits("a = 1\nb = 2\ndelete a\nprint\n", Limits::default()).unwrap();
        let program = parse(&tokens).unwrap();
        let mut interpreter = Interpreter::new(Vec::new());
        interpreter.run(&program).unwrap();
        assert!(interpreter.is_halted());
        assert_eq!(interpreter.variables().iter().collect::<Vec<_>>(), vec![("b", 2)]);
        assert_eq!(interpreter.into_output(), b"2\n".to_vec());
    }

    #[test]
    fn test_diagnostics_carry_codes() {
        let diagnostics = parse_and_run_with_diagnostics("f()\n", Limits::default()).unwrap_err();
        assert_eq!(diagnostics[0].code.as_deref(), Some("E0202"));
        let diagnostics = parse_and_run_with_diagnostics("x = \n", Limits::default()).unwrap_err();
        assert_eq!(diagnostics[0].code.as_deref(), Some("E0001"));
    }
}
