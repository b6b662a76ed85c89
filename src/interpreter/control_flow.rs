//! Control Flow Execution
//!
//! Handles control flow constructs:
//! - if/elif/else
//! - for loops
//! - C-style for loops
//! - while loops
//! - until loops
//! - case statements
//! - break/continue

use regex_lite::Regex;

use crate::ast::types::{CaseTerminator as AstCaseTerminator, StatementNode};
use crate::interpreter::conditionals::match_pattern;
use crate::interpreter::errors::{
    ControlFlowError, ExecutionLimitError, InterpreterError, LimitType,
};
use crate::interpreter::helpers::condition::ConditionResult;
use crate::interpreter::helpers::loop_helpers::{handle_loop_error, LoopAction};
use crate::interpreter::types::{ExecResult, InterpreterState};

/// Validate that a variable name is a valid identifier.
/// Returns true if valid, false otherwise.
pub fn is_valid_identifier(name: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();
    re.is_match(name)
}

/// Accumulated output from a loop or conditional construct.
#[derive(Debug, Clone, Default)]
pub struct ForResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ForResult {
    pub fn new(stdout: String, stderr: String, exit_code: i32) -> Self {
        Self { stdout, stderr, exit_code }
    }

    fn append(&mut self, stdout: &str, stderr: &str) {
        self.stdout.push_str(stdout);
        self.stderr.push_str(stderr);
    }
}

/// Execute an `if`/`elif`/`else` chain.
///
/// `clauses` is a list of (condition statements, body statements) pairs, one
/// per `if`/`elif` branch. The first clause whose condition exits 0 has its
/// body executed; if none match, `else_body` runs (if present).
pub fn execute_if<C, S>(
    state: &mut InterpreterState,
    clauses: &[(Vec<&StatementNode>, Vec<&StatementNode>)],
    else_body: Option<&[&StatementNode]>,
    mut eval_condition: C,
    mut exec_stmt: S,
) -> Result<ConditionResult, InterpreterError>
where
    C: FnMut(&mut InterpreterState, &StatementNode) -> Result<ConditionResult, InterpreterError>,
    S: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    let mut stdout = String::new();
    let mut stderr = String::new();

    for (condition, body) in clauses {
        let prev_in_condition = state.in_condition;
        state.in_condition = true;
        let mut cond_exit = 0;
        let mut cond_err = None;
        for stmt in condition {
            match eval_condition(state, stmt) {
                Ok(r) => {
                    stdout.push_str(&r.stdout);
                    stderr.push_str(&r.stderr);
                    cond_exit = r.exit_code;
                }
                Err(e) => {
                    cond_err = Some(e);
                    break;
                }
            }
        }
        state.in_condition = prev_in_condition;

        if let Some(mut e) = cond_err {
            prepend_error_output(&mut e, &stdout, &stderr);
            return Err(e);
        }

        if cond_exit == 0 {
            for stmt in body {
                match exec_stmt(state, stmt) {
                    Ok(r) => {
                        stdout.push_str(&r.stdout);
                        stderr.push_str(&r.stderr);
                        return Ok(ConditionResult::new(stdout, stderr, r.exit_code));
                    }
                    Err(mut e) => {
                        prepend_error_output(&mut e, &stdout, &stderr);
                        return Err(e);
                    }
                }
            }
            return Ok(ConditionResult::new(stdout, stderr, 0));
        }
    }

    if let Some(body) = else_body {
        for stmt in body {
            match exec_stmt(state, stmt) {
                Ok(r) => {
                    stdout.push_str(&r.stdout);
                    stderr.push_str(&r.stderr);
                    return Ok(ConditionResult::new(stdout, stderr, r.exit_code));
                }
                Err(mut e) => {
                    prepend_error_output(&mut e, &stdout, &stderr);
                    return Err(e);
                }
            }
        }
    }

    Ok(ConditionResult::new(stdout, stderr, 0))
}

/// Execute a `for VAR in WORDS; do ...; done` loop.
pub fn execute_for<S>(
    state: &mut InterpreterState,
    variable: &str,
    words: &[String],
    body: &[&StatementNode],
    max_iterations: u64,
    mut exec_stmt: S,
) -> Result<ForResult, InterpreterError>
where
    S: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    let mut result = ForResult::default();
    let prev_loop_depth = state.loop_depth;
    state.loop_depth += 1;

    let mut iterations: u64 = 0;

    for word in words {
        iterations += 1;
        if iterations > max_iterations {
            state.loop_depth = prev_loop_depth;
            return Err(InterpreterError::ExecutionLimit(ExecutionLimitError::new(
                format!("loop exceeded maximum iterations ({})", max_iterations),
                LimitType::Iterations,
                result.stdout,
                result.stderr,
            )));
        }

        state.env.insert(variable.to_string(), word.clone());

        match run_body(state, body, &mut exec_stmt) {
            Ok(exit_code) => {
                result.exit_code = exit_code;
            }
            Err(e) => {
                let handled = handle_loop_error(e, result.stdout, result.stderr, state.loop_depth);
                result.stdout = handled.stdout;
                result.stderr = handled.stderr;
                match handled.action {
                    LoopAction::Break => {
                        state.loop_depth = prev_loop_depth;
                        return Ok(ForResult::new(result.stdout, result.stderr, result.exit_code));
                    }
                    LoopAction::Continue => continue,
                    LoopAction::Rethrow => {
                        state.loop_depth = prev_loop_depth;
                        return Err(handled.error.unwrap());
                    }
                    LoopAction::Error => {
                        state.loop_depth = prev_loop_depth;
                        return Ok(ForResult::new(
                            result.stdout,
                            result.stderr,
                            handled.exit_code.unwrap_or(1),
                        ));
                    }
                }
            }
        }
    }

    state.loop_depth = prev_loop_depth;
    Ok(result)
}

/// Execute a `while COND; do ...; done` loop.
pub fn execute_while<C, S>(
    state: &mut InterpreterState,
    condition: &[&StatementNode],
    body: &[&StatementNode],
    max_iterations: u64,
    eval_condition: C,
    exec_stmt: S,
) -> Result<ForResult, InterpreterError>
where
    C: FnMut(&mut InterpreterState, &StatementNode) -> Result<ConditionResult, InterpreterError>,
    S: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    run_while_loop(state, condition, body, max_iterations, true, eval_condition, exec_stmt)
}

/// Execute an `until COND; do ...; done` loop (runs while COND is false).
pub fn execute_until<C, S>(
    state: &mut InterpreterState,
    condition: &[&StatementNode],
    body: &[&StatementNode],
    max_iterations: u64,
    eval_condition: C,
    exec_stmt: S,
) -> Result<ForResult, InterpreterError>
where
    C: FnMut(&mut InterpreterState, &StatementNode) -> Result<ConditionResult, InterpreterError>,
    S: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    run_while_loop(state, condition, body, max_iterations, false, eval_condition, exec_stmt)
}

fn run_while_loop<C, S>(
    state: &mut InterpreterState,
    condition: &[&StatementNode],
    body: &[&StatementNode],
    max_iterations: u64,
    run_while_true: bool,
    mut eval_condition: C,
    mut exec_stmt: S,
) -> Result<ForResult, InterpreterError>
where
    C: FnMut(&mut InterpreterState, &StatementNode) -> Result<ConditionResult, InterpreterError>,
    S: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    let mut result = ForResult::default();
    let prev_loop_depth = state.loop_depth;
    state.loop_depth += 1;

    let mut iterations: u64 = 0;

    loop {
        iterations += 1;
        if iterations > max_iterations {
            state.loop_depth = prev_loop_depth;
            return Err(InterpreterError::ExecutionLimit(ExecutionLimitError::new(
                format!("loop exceeded maximum iterations ({})", max_iterations),
                LimitType::Iterations,
                result.stdout,
                result.stderr,
            )));
        }

        let prev_in_condition = state.in_condition;
        state.in_condition = true;
        let mut cond_exit = 0;
        let mut cond_err = None;
        for stmt in condition {
            match eval_condition(state, stmt) {
                Ok(r) => {
                    result.append(&r.stdout, &r.stderr);
                    cond_exit = r.exit_code;
                }
                Err(e) => {
                    cond_err = Some(e);
                    break;
                }
            }
        }
        state.in_condition = prev_in_condition;

        if let Some(mut e) = cond_err {
            state.loop_depth = prev_loop_depth;
            prepend_error_output(&mut e, &result.stdout, &result.stderr);
            return Err(e);
        }

        let continue_looping = if run_while_true { cond_exit == 0 } else { cond_exit != 0 };
        if !continue_looping {
            break;
        }

        match run_body(state, body, &mut exec_stmt) {
            Ok(exit_code) => {
                result.exit_code = exit_code;
            }
            Err(e) => {
                let handled = handle_loop_error(e, result.stdout, result.stderr, state.loop_depth);
                result.stdout = handled.stdout;
                result.stderr = handled.stderr;
                match handled.action {
                    LoopAction::Break => break,
                    LoopAction::Continue => continue,
                    LoopAction::Rethrow => {
                        state.loop_depth = prev_loop_depth;
                        return Err(handled.error.unwrap());
                    }
                    LoopAction::Error => {
                        state.loop_depth = prev_loop_depth;
                        return Ok(ForResult::new(
                            result.stdout,
                            result.stderr,
                            handled.exit_code.unwrap_or(1),
                        ));
                    }
                }
            }
        }
    }

    state.loop_depth = prev_loop_depth;
    Ok(result)
}

/// Run a loop body (list of statements), returning the exit code of the last
/// one executed, or propagating any control-flow error it raises.
fn run_body<S>(
    state: &mut InterpreterState,
    body: &[&StatementNode],
    exec_stmt: &mut S,
) -> Result<i32, InterpreterError>
where
    S: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    let mut exit_code = 0;
    for stmt in body {
        let r = exec_stmt(state, stmt)?;
        exit_code = r.exit_code;
    }
    Ok(exit_code)
}

fn prepend_error_output(error: &mut InterpreterError, stdout: &str, stderr: &str) {
    match error {
        InterpreterError::Break(e) => e.prepend_output(stdout, stderr),
        InterpreterError::Continue(e) => e.prepend_output(stdout, stderr),
        InterpreterError::Return(e) => e.prepend_output(stdout, stderr),
        InterpreterError::Errexit(e) => e.prepend_output(stdout, stderr),
        InterpreterError::Exit(e) => e.prepend_output(stdout, stderr),
        InterpreterError::ExecutionLimit(e) => e.prepend_output(stdout, stderr),
        InterpreterError::SubshellExit(e) => e.prepend_output(stdout, stderr),
        _ => {}
    }
}

/// Execute a `case WORD in PATTERN) BODY ;; ... esac` statement.
///
/// `items` is a list of (already-expanded patterns, body statements, terminator)
/// triples in source order. The first item with a matching pattern has its body
/// executed; `;;` stops there, `;&` falls through to the next body unconditionally,
/// and `;;&` continues trying to match subsequent patterns.
pub fn execute_case<S>(
    state: &mut InterpreterState,
    word_value: &str,
    items: &[(Vec<String>, Vec<&StatementNode>, AstCaseTerminator)],
    nocasematch: bool,
    extglob: bool,
    mut exec_stmt: S,
) -> Result<ExecResult, InterpreterError>
where
    S: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    let mut stdout = String::new();
    let mut stderr = String::new();
    let mut exit_code = 0;
    let mut matched = false;

    let mut idx = 0;
    while idx < items.len() {
        let (patterns, body, terminator) = &items[idx];
        let is_match = matched
            || patterns
                .iter()
                .any(|p| match_pattern(word_value, p, nocasematch, extglob));

        if !is_match {
            idx += 1;
            continue;
        }

        matched = true;
        for stmt in body {
            match exec_stmt(state, stmt) {
                Ok(r) => {
                    stdout.push_str(&r.stdout);
                    stderr.push_str(&r.stderr);
                    exit_code = r.exit_code;
                }
                Err(mut e) => {
                    prepend_error_output(&mut e, &stdout, &stderr);
                    return Err(e);
                }
            }
        }

        match terminator {
            AstCaseTerminator::DoubleSemi => break,
            AstCaseTerminator::SemiAnd => {
                // Unconditional fall-through: run the next body without
                // re-checking its patterns.
                matched = true;
                idx += 1;
                continue;
            }
            AstCaseTerminator::SemiSemiAnd => {
                // Keep matching subsequent patterns normally.
                matched = false;
                idx += 1;
                continue;
            }
        }
    }

    Ok(ExecResult::new(stdout, stderr, exit_code))
}

/// Case statement terminator types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseTerminator {
    /// ;; - stop, no fall-through
    Break,
    /// ;& - unconditional fall-through (execute next body without pattern check)
    FallThrough,
    /// ;;& - continue pattern matching (check next case patterns)
    ContinueMatching,
}

impl CaseTerminator {
    /// Parse a terminator string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            ";;" => Some(CaseTerminator::Break),
            ";&" => Some(CaseTerminator::FallThrough),
            ";;&" => Some(CaseTerminator::ContinueMatching),
            _ => None,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseTerminator::Break => ";;",
            CaseTerminator::FallThrough => ";&",
            CaseTerminator::ContinueMatching => ";;&",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("foo"));
        assert!(is_valid_identifier("_bar"));
        assert!(is_valid_identifier("foo123"));
        assert!(is_valid_identifier("_123"));
        assert!(!is_valid_identifier("123foo"));
        assert!(!is_valid_identifier("foo-bar"));
        assert!(!is_valid_identifier("foo bar"));
        assert!(!is_valid_identifier(""));
    }

    #[test]
    fn test_case_terminator() {
        assert_eq!(CaseTerminator::from_str(";;"), Some(CaseTerminator::Break));
        assert_eq!(CaseTerminator::from_str(";&"), Some(CaseTerminator::FallThrough));
        assert_eq!(CaseTerminator::from_str(";;&"), Some(CaseTerminator::ContinueMatching));
        assert_eq!(CaseTerminator::from_str("invalid"), None);

        assert_eq!(CaseTerminator::Break.as_str(), ";;");
        assert_eq!(CaseTerminator::FallThrough.as_str(), ";&");
        assert_eq!(CaseTerminator::ContinueMatching.as_str(), ";;&");
    }
}
