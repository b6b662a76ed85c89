//! Execution Engine
//!
//! The core execution engine that ties all interpreter components together.
//! Implements the full AST execution chain:
//!
//! execute_script -> execute_statement -> execute_pipeline -> execute_command

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::ast::types::{
    CaseTerminator as AstCaseTerminator, CommandNode, CompoundCommandNode, CondBinaryOperator,
    ConditionalExpressionNode, CondUnaryOperator, PipelineNode, ScriptNode, SimpleCommandNode,
    StatementNode, StatementOperator, WordNode,
};
use crate::commands::{Command as RegistryCommand, CommandContext, CommandRegistry, CommandResult as RegistryCommandResult, ExecFn, FetchFn};
use crate::fs::FileSystem as AsyncFileSystem;
use crate::interpreter::arithmetic::evaluate_arithmetic;
use crate::interpreter::builtin_dispatch::{dispatch_builtin, BuiltinDispatchContext};
use crate::interpreter::command_resolution::{
    build_command_path, is_executable_mode, is_path_command, split_path, DEFAULT_PATH,
};
use crate::interpreter::conditionals::{match_pattern, parse_numeric, posix_ere_to_regex};
use crate::interpreter::control_flow::{execute_case, execute_for, execute_if, execute_while, execute_until, ForResult};
use crate::interpreter::errors::{ErrexitError, ExecutionLimitError, InterpreterError, LimitType};
use crate::interpreter::functions::execute_function_def;
use crate::interpreter::helpers::condition::ConditionResult;
use crate::interpreter::helpers::loop_helpers::{handle_loop_error, LoopAction};
use crate::interpreter::helpers::numeric_compare::compare_numeric_str;
use crate::interpreter::helpers::string_tests::evaluate_string_test_str;
use crate::interpreter::helpers::variable_tests::{evaluate_nameref_test, evaluate_variable_test};
use crate::interpreter::interpreter::{
    build_exported_env, check_command_limit, should_trigger_errexit, update_exit_code,
    FileSystem as SyncFileSystem,
};
use crate::interpreter::pipeline_execution::{execute_pipeline, PipelineOptions, PipelineState, set_pipestatus};
use crate::interpreter::redirections::apply_redirections;
use crate::interpreter::simple_command_assignments::process_assignments;
use crate::interpreter::subshell_group::{execute_group, execute_subshell, prepare_subshell};
use crate::interpreter::types::{ExecResult, ExecutionLimits, InterpreterContext, InterpreterState};
use crate::interpreter::word_expansion::{expand_word, expand_word_with_glob, CommandSubstFn};
use regex_lite::Regex;

/// Bridges the sync tree-walking interpreter to the async `Command` registry
/// (`src/commands/`), the sandboxed stand-in for external-process dispatch.
pub struct CommandBridge<'a> {
    /// The set of registered external-command implementations.
    pub registry: &'a CommandRegistry,
    /// Async filesystem handle, as `Command::execute` expects.
    pub fs: Arc<dyn AsyncFileSystem>,
    /// Runtime handle used to block on `Command::execute` from sync code.
    pub handle: tokio::runtime::Handle,
    /// Caller-supplied raw HTTP transport, opt-in (see `src/network/`).
    /// `None` means every network command fails closed.
    pub fetch_fn: Option<FetchFn>,
}

/// The execution engine that ties all interpreter components together.
pub struct ExecutionEngine<'a> {
    /// Execution limits (max commands, recursion depth, iterations)
    pub limits: &'a ExecutionLimits,
    /// Sync filesystem interface
    pub fs: &'a dyn SyncFileSystem,
    /// Optional bridge to the external-command registry. `None` means
    /// command resolution falls straight through to VFS PATH search.
    pub commands: Option<CommandBridge<'a>>,
}

impl<'a> ExecutionEngine<'a> {
    /// Create a new execution engine with no command registry wired in.
    pub fn new(limits: &'a ExecutionLimits, fs: &'a dyn SyncFileSystem) -> Self {
        Self { limits, fs, commands: None }
    }

    /// Create a new execution engine with the external-command registry wired in.
    pub fn with_commands(
        limits: &'a ExecutionLimits,
        fs: &'a dyn SyncFileSystem,
        commands: CommandBridge<'a>,
    ) -> Self {
        Self { limits, fs, commands: Some(commands) }
    }

    /// Execute a complete script (list of statements).
    pub fn execute_script(
        &self,
        state: &mut InterpreterState,
        ast: &ScriptNode,
    ) -> Result<ExecResult, InterpreterError> {
        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;

        for statement in &ast.statements {
            match self.execute_statement(state, statement) {
                Ok(result) => {
                    stdout.push_str(&result.stdout);
                    stderr.push_str(&result.stderr);
                    exit_code = result.exit_code;
                    update_exit_code(state, exit_code);
                }
                Err(InterpreterError::Exit(e)) => {
                    // ExitError propagates up to terminate the script
                    let mut err = e;
                    err.prepend_output(&stdout, &stderr);
                    return Err(InterpreterError::Exit(err));
                }
                Err(InterpreterError::ExecutionLimit(e)) => {
                    // ExecutionLimitError must always propagate
                    return Err(InterpreterError::ExecutionLimit(e));
                }
                Err(InterpreterError::Errexit(e)) => {
                    // Errexit terminates the script
                    stdout.push_str(&e.stdout);
                    stderr.push_str(&e.stderr);
                    exit_code = e.exit_code;
                    return Ok(ExecResult::new(stdout, stderr, exit_code));
                }
                Err(InterpreterError::Break(mut e)) => {
                    // Break/continue outside loops - silently continue
                    e.prepend_output(&stdout, &stderr);
                    stdout = e.stdout.clone();
                    stderr = e.stderr.clone();
                    continue;
                }
                Err(InterpreterError::Continue(mut e)) => {
                    e.prepend_output(&stdout, &stderr);
                    stdout = e.stdout.clone();
                    stderr = e.stderr.clone();
                    continue;
                }
                Err(InterpreterError::Return(mut e)) => {
                    // Return outside function - propagate
                    e.prepend_output(&stdout, &stderr);
                    return Err(InterpreterError::Return(e));
                }
                Err(e) => {
                    // Other errors - convert to result
                    stderr.push_str(&format!("{}\n", e));
                    exit_code = 1;
                }
            }
        }

        Ok(ExecResult::new(stdout, stderr, exit_code))
    }

    /// Execute a single statement (list of pipelines with && || operators).
    pub fn execute_statement(
        &self,
        state: &mut InterpreterState,
        stmt: &StatementNode,
    ) -> Result<ExecResult, InterpreterError> {
        // Handle deferred syntax errors
        if let Some(ref err) = stmt.deferred_error {
            return Ok(ExecResult::new(
                String::new(),
                format!("bash: syntax error near unexpected token `{}'\n", err.token),
                2,
            ));
        }

        // noexec mode (set -n): parse but don't execute
        if state.options.noexec {
            return Ok(ExecResult::ok());
        }

        // Reset errexit_safe at start of each statement
        state.errexit_safe = Some(false);

        let mut stdout = String::new();
        let mut stderr = String::new();

        // verbose mode (set -v): print source before execution
        if state.options.verbose {
            if let Some(ref source) = stmt.source_text {
                stderr.push_str(source);
                stderr.push('\n');
            }
        }

        let mut exit_code = 0;
        let mut last_executed_index: i32 = -1;
        let mut last_pipeline_negated = false;

        for (i, pipeline) in stmt.pipelines.iter().enumerate() {
            // Check && / || short-circuit
            if i > 0 {
                let op = &stmt.operators[i - 1];
                match op {
                    StatementOperator::And => {
                        if exit_code != 0 {
                            continue;
                        }
                    }
                    StatementOperator::Or => {
                        if exit_code == 0 {
                            continue;
                        }
                    }
                    StatementOperator::Semi => {
                        // Always execute
                    }
                }
            }

            let result = self.execute_pipeline_node(state, pipeline)?;
            stdout.push_str(&result.stdout);
            stderr.push_str(&result.stderr);
            exit_code = result.exit_code;
            last_executed_index = i as i32;
            last_pipeline_negated = pipeline.negated;

            update_exit_code(state, exit_code);
        }

        // Check errexit
        let was_short_circuited = last_executed_index < (stmt.pipelines.len() as i32 - 1);
        let inner_was_safe = state.errexit_safe.unwrap_or(false);

        if should_trigger_errexit(state, exit_code, was_short_circuited, last_pipeline_negated)
            && !inner_was_safe
        {
            return Err(InterpreterError::Errexit(ErrexitError::new(
                exit_code, stdout, stderr,
            )));
        }

        Ok(ExecResult::new(stdout, stderr, exit_code))
    }

    /// Execute a pipeline (list of commands connected by |).
    pub fn execute_pipeline_node(
        &self,
        state: &mut InterpreterState,
        pipeline: &PipelineNode,
    ) -> Result<ExecResult, InterpreterError> {
        let mut pipe_state = PipelineState::new();
        let pipe_stderr = pipeline.pipe_stderr.clone().unwrap_or_default();

        let options = PipelineOptions {
            pipefail: state.options.pipefail,
            lastpipe: state.shopt_options.lastpipe,
            runs_in_subshell: false,
            time_pipeline: pipeline.timed,
            time_posix_format: pipeline.time_posix,
        };

        // We need to pass state through the closure, but execute_pipeline
        // takes ownership of the closure. Use a RefCell pattern.
        use std::cell::RefCell;
        let state_cell = RefCell::new(state);

        let result = execute_pipeline(
            &mut pipe_state,
            &pipeline.commands,
            &pipe_stderr,
            &options,
            |cmd, stdin| {
                let state = &mut *state_cell.borrow_mut();
                self.execute_command(state, cmd, stdin)
            },
        )?;

        // Get state back
        let state = state_cell.into_inner();

        // Set PIPESTATUS
        set_pipestatus(&mut state.env, &result.exit_codes);

        let mut exec_result = result.to_exec_result();

        // Handle negation
        if pipeline.negated {
            exec_result.exit_code = if exec_result.exit_code == 0 { 1 } else { 0 };
        }

        Ok(exec_result)
    }

    /// Execute a single command.
    pub fn execute_command(
        &self,
        state: &mut InterpreterState,
        cmd: &CommandNode,
        stdin: &str,
    ) -> Result<ExecResult, InterpreterError> {
        // Check command limit
        if let Some(msg) = check_command_limit(state, self.limits) {
            return Err(InterpreterError::ExecutionLimit(
                crate::interpreter::errors::ExecutionLimitError::simple(
                    msg,
                    crate::interpreter::errors::LimitType::Commands,
                ),
            ));
        }

        match cmd {
            CommandNode::Simple(simple) => self.execute_simple_command(state, simple, stdin),
            CommandNode::Compound(compound) => {
                self.execute_compound_command(state, compound, stdin)
            }
            CommandNode::FunctionDef(func_def) => {
                let current_source = state.current_source.clone();
                execute_function_def(state, func_def, current_source.as_deref())
                    .map_err(InterpreterError::Exit)
            }
        }
    }

    /// Execute a simple command (name + args + redirections).
    pub fn execute_simple_command(
        &self,
        state: &mut InterpreterState,
        cmd: &SimpleCommandNode,
        stdin: &str,
    ) -> Result<ExecResult, InterpreterError> {
        // Set line number for $LINENO
        if let Some(line) = cmd.line {
            state.current_line = line as u32;
        }

        let expanded_owned;
        let cmd: &SimpleCommandNode = if state.shopt_options.expand_aliases {
            use crate::interpreter::alias_expansion::{expand_alias, AliasExpansionContext, AliasExpansionResult};
            let ctx = AliasExpansionContext { env: &state.env };
            let mut stack = std::collections::HashSet::new();
            match expand_alias(&ctx, cmd, &mut stack) {
                AliasExpansionResult::Expanded(new_node) => {
                    expanded_owned = new_node;
                    &expanded_owned
                }
                AliasExpansionResult::ComplexAlias(full_command) => {
                    return self.run_script_text(state, &full_command, &[], Some(stdin));
                }
                AliasExpansionResult::ParseError(msg) => {
                    return Ok(ExecResult::new(String::new(), format!("bash: alias: {}\n", msg), 2));
                }
                AliasExpansionResult::NoExpansion => cmd,
            }
        } else {
            cmd
        };

        let command_subst = |body: &ScriptNode, st: &mut InterpreterState| match self.execute_script(st, body) {
            Ok(result) => result,
            Err(e) => ExecResult::new(String::new(), e.to_string(), 1),
        };
        let expand_word_fn = |state: &mut InterpreterState, word: &WordNode| {
            expand_word(state, word, Some(&command_subst)).value
        };
        let assignments = process_assignments(state, cmd, expand_word_fn);
        if let Some(error) = assignments.error {
            return Ok(error);
        }

        // Get command name
        let cmd_name = match &cmd.name {
            Some(word) => expand_word(state, word, Some(&command_subst)).value,
            None => {
                // Assignment-only command: the assignments above already landed in state.env.
                return Ok(ExecResult::ok());
            }
        };

        // Expand arguments
        let mut args: Vec<String> = Vec::new();
        for arg in &cmd.args {
            let result = expand_word_with_glob(state, arg, Some(&command_subst), Some(self.fs));
            if let Some(words) = result.split_words {
                args.extend(words);
            } else {
                args.push(result.value);
            }
        }
        let quoted_args: Vec<bool> = vec![false; args.len()];

        let result = match cmd_name.as_str() {
            "eval" => self.run_eval(state, &args, stdin),
            "source" | "." => self.run_source(state, &args),
            _ => self.run_named_command(state, &cmd_name, &args, &quoted_args, stdin, false, false, -1),
        };

        // Prefix assignments (FOO=bar cmd) only apply for the duration of this command.
        if cmd.name.is_some() && !assignments.temp_assignments.is_empty() {
            for (key, saved) in assignments.temp_assignments {
                match saved {
                    Some(value) => {
                        state.env.insert(key, value);
                    }
                    None => {
                        state.env.remove(&key);
                    }
                }
            }
        }

        let result = result?;
        Ok(apply_redirections(
            state,
            self.fs,
            result,
            &cmd.redirections,
            None,
            expand_word_fn,
        ))
    }

    fn run_eval(
        &self,
        state: &mut InterpreterState,
        args: &[String],
        stdin: &str,
    ) -> Result<ExecResult, InterpreterError> {
        use crate::interpreter::builtins::{
            eval_parse_error, handle_eval_parse, prepare_eval_stdin, restore_eval_stdin,
        };

        match handle_eval_parse(args) {
            Err((_, stderr, code)) => Ok(ExecResult::new(String::new(), stderr, code)),
            Ok(None) => Ok(ExecResult::ok()),
            Ok(Some(cmd)) => {
                let saved = prepare_eval_stdin(state, cmd.stdin.as_deref().or(Some(stdin)));
                let result = match crate::parser::parse(&cmd.command) {
                    Ok(ast) => self.execute_script(state, &ast),
                    Err(e) => Ok(eval_parse_error(&e.to_string())),
                };
                restore_eval_stdin(state, saved);
                result
            }
        }
    }

    fn run_source(
        &self,
        state: &mut InterpreterState,
        args: &[String],
    ) -> Result<ExecResult, InterpreterError> {
        use crate::interpreter::builtins::{
            handle_source_parse, prepare_source_state, resolve_source_paths,
            restore_source_state, source_file_not_found, source_parse_error,
        };

        let cmd = match handle_source_parse(args) {
            Err((_, stderr, code)) => return Ok(ExecResult::new(String::new(), stderr, code)),
            Ok(cmd) => cmd,
        };

        let path_env = state.env.get("PATH").cloned();
        let candidates = resolve_source_paths(&state.cwd, &cmd.filename, path_env.as_deref());
        let found = candidates.into_iter().find(|p| self.fs.is_file(p));

        let path = match found {
            Some(p) => p,
            None => return Ok(source_file_not_found(&cmd.filename)),
        };
        let content = match self.fs.read_file(&path) {
            Ok(c) => c,
            Err(_) => return Ok(source_file_not_found(&cmd.filename)),
        };
        let ast = match crate::parser::parse(&content) {
            Ok(ast) => ast,
            Err(e) => return Ok(source_parse_error(&cmd.filename, &e.to_string())),
        };

        let saved = prepare_source_state(state, &cmd);
        let result = self.execute_script(state, &ast);
        restore_source_state(state, saved);
        result
    }

    /// Run a named command: dispatch to a builtin/function, falling back to
    /// resolving and executing an external script from the virtual filesystem.
    fn run_named_command(
        &self,
        state: &mut InterpreterState,
        name: &str,
        args: &[String],
        quoted_args: &[bool],
        stdin: &str,
        skip_functions: bool,
        use_default_path: bool,
        stdin_source_fd: i32,
    ) -> Result<ExecResult, InterpreterError> {
        let run_command = |state: &mut InterpreterState,
                            name: &str,
                            args: &[String],
                            quoted: &[bool],
                            stdin: &str,
                            skip_fn: bool,
                            use_path: bool,
                            fd: i32| {
            self.run_named_command(state, name, args, quoted, stdin, skip_fn, use_path, fd)
        };
        let execute_user_script = |state: &mut InterpreterState,
                                    script: &str,
                                    args: &[String],
                                    stdin: Option<&str>| {
            self.run_script_text(state, script, args, stdin)
        };
        let execute_function_body = |state: &mut InterpreterState,
                                      body: &CompoundCommandNode,
                                      stdin: &str| {
            self.execute_compound_command(state, body, stdin)
        };

        let dispatch_ctx = BuiltinDispatchContext {
            run_command: &run_command,
            build_exported_env: &build_exported_env,
            execute_user_script: &execute_user_script,
            execute_function_body: &execute_function_body,
            limits: self.limits,
            fs: self.fs,
        };

        if let Some(result) = dispatch_builtin(
            state,
            &dispatch_ctx,
            name,
            args,
            quoted_args,
            stdin,
            skip_functions,
            use_default_path,
            stdin_source_fd,
        ) {
            return result;
        }

        if let Some(result) = self.run_registered_command(state, name, args, stdin) {
            return Ok(result);
        }

        self.execute_external(state, name, args, stdin, use_default_path)
    }

    /// Command-registry resolution step (spec step 5, between builtins and
    /// VFS PATH search): look `name` up in the wired `CommandBridge`, if
    /// any, and invoke it synchronously via `block_in_place`.
    fn run_registered_command(
        &self,
        state: &mut InterpreterState,
        name: &str,
        args: &[String],
        stdin: &str,
    ) -> Option<ExecResult> {
        let bridge = self.commands.as_ref()?;
        let command = bridge.registry.get(name)?;

        let limits = self.limits.clone();
        let handle_for_exec = bridge.handle.clone();
        let exec_fn: ExecFn = Arc::new(move |cmd_str, _stdin, cwd, env, fs| {
            let limits = limits.clone();
            let handle = handle_for_exec.clone();
            Box::pin(async move {
                let sync_fs = crate::interpreter::sync_fs_adapter::SyncFsAdapter::new(fs, handle);
                let engine = ExecutionEngine::new(&limits, &sync_fs);
                let mut sub_state = InterpreterState::default();
                sub_state.cwd = cwd;
                sub_state.env = env;
                let result = match crate::parser::parse(&cmd_str) {
                    Ok(ast) => engine
                        .execute_script(&mut sub_state, &ast)
                        .unwrap_or_else(|e| ExecResult::new(String::new(), format!("{}\n", e), 1)),
                    Err(e) => ExecResult::new(String::new(), format!("bash: {}\n", e), 2),
                };
                RegistryCommandResult::with_exit_code(result.stdout, result.stderr, result.exit_code)
            }) as Pin<Box<dyn Future<Output = RegistryCommandResult> + Send>>
        });

        let ctx = CommandContext {
            args: args.to_vec(),
            stdin: stdin.to_string(),
            cwd: state.cwd.clone(),
            env: state.env.clone(),
            fs: bridge.fs.clone(),
            exec_fn: Some(exec_fn),
            fetch_fn: bridge.fetch_fn.clone(),
        };

        let handle = bridge.handle.clone();
        let result =
            tokio::task::block_in_place(|| handle.block_on(command.execute(ctx)));
        Some(ExecResult::new(result.stdout, result.stderr, result.exit_code))
    }

    /// Resolve and run `name` as a script read from the virtual filesystem,
    /// the sandboxed analogue of spawning an external process.
    fn execute_external(
        &self,
        state: &mut InterpreterState,
        name: &str,
        args: &[String],
        stdin: &str,
        use_default_path: bool,
    ) -> Result<ExecResult, InterpreterError> {
        let path = match self.resolve_command_path(state, name, use_default_path) {
            Some(p) => p,
            None => {
                return Ok(ExecResult::new(
                    String::new(),
                    format!("bash: {}: command not found\n", name),
                    127,
                ));
            }
        };

        let content = match self.fs.read_file(&path) {
            Ok(c) => c,
            Err(_) => {
                return Ok(ExecResult::new(
                    String::new(),
                    format!("bash: {}: cannot execute: required file not found\n", name),
                    126,
                ));
            }
        };

        let saved = prepare_subshell(state, Some(stdin));
        let result = self.run_script_text(state, &content, args, None);
        saved.restore(state);
        result
    }

    /// Parse and execute bash source text against `state`, the way `eval`,
    /// `source`, and external-script resolution all need to.
    fn run_script_text(
        &self,
        state: &mut InterpreterState,
        script: &str,
        args: &[String],
        stdin: Option<&str>,
    ) -> Result<ExecResult, InterpreterError> {
        let ast = match crate::parser::parse(script) {
            Ok(ast) => ast,
            Err(e) => {
                return Ok(ExecResult::new(String::new(), format!("bash: {}\n", e), 2));
            }
        };

        let saved_positional = if !args.is_empty() {
            Some(self.set_positional_params(state, args))
        } else {
            None
        };
        let saved_stdin = state.group_stdin.clone();
        if let Some(s) = stdin {
            state.group_stdin = Some(s.to_string());
        }

        let result = self.execute_script(state, &ast);

        state.group_stdin = saved_stdin;
        if let Some(saved) = saved_positional {
            self.restore_positional_params(state, saved);
        }
        result
    }

    fn set_positional_params(
        &self,
        state: &mut InterpreterState,
        args: &[String],
    ) -> HashMap<String, Option<String>> {
        let mut saved = HashMap::new();
        for i in 1..=9 {
            let key = i.to_string();
            saved.insert(key.clone(), state.env.get(&key).cloned());
        }
        saved.insert("#".to_string(), state.env.get("#").cloned());

        state.env.insert("#".to_string(), args.len().to_string());
        for (i, arg) in args.iter().enumerate() {
            if i < 9 {
                state.env.insert((i + 1).to_string(), arg.clone());
            }
        }
        for i in (args.len() + 1).max(1)..=9 {
            state.env.remove(&i.to_string());
        }
        saved
    }

    fn restore_positional_params(
        &self,
        state: &mut InterpreterState,
        saved: HashMap<String, Option<String>>,
    ) {
        for (key, value) in saved {
            match value {
                Some(v) => {
                    state.env.insert(key, v);
                }
                None => {
                    state.env.remove(&key);
                }
            }
        }
    }

    /// Resolve a command name to a virtual-filesystem path via PATH search,
    /// the sandboxed equivalent of `execvp`'s lookup.
    fn resolve_command_path(
        &self,
        state: &InterpreterState,
        name: &str,
        use_default_path: bool,
    ) -> Option<String> {
        if is_path_command(name) {
            let path = if name.starts_with('/') {
                name.to_string()
            } else {
                self.fs.resolve_path(&state.cwd, name)
            };
            return if self.fs.is_file(&path) { Some(path) } else { None };
        }

        let path_env = if use_default_path {
            DEFAULT_PATH.to_string()
        } else {
            state.env.get("PATH").cloned().unwrap_or_else(|| DEFAULT_PATH.to_string())
        };

        for dir in split_path(&path_env) {
            let candidate = build_command_path(dir, name);
            if self.fs.is_file(&candidate) {
                if let Ok(stat) = self.fs.stat(&candidate) {
                    if !is_executable_mode(stat.mode) {
                        continue;
                    }
                }
                return Some(candidate);
            }
        }
        None
    }

    /// Evaluate a `[[ ... ]]` conditional expression tree.
    ///
    /// Shares comparison semantics with `test`/`[` (see `conditionals.rs`) but
    /// works over the parsed AST instead of a flat argument vector, and
    /// performs glob-pattern matching for `==`/`!=` the way `[[ ]]` does.
    fn eval_cond_expr(
        &self,
        state: &mut InterpreterState,
        expr: &ConditionalExpressionNode,
    ) -> Result<bool, String> {
        let nocasematch = state.shopt_options.nocasematch;
        let extglob = state.shopt_options.extglob;
        let command_subst = |body: &ScriptNode, st: &mut InterpreterState| match self.execute_script(st, body) {
            Ok(result) => result,
            Err(e) => ExecResult::new(String::new(), e.to_string(), 1),
        };

        match expr {
            ConditionalExpressionNode::Word(word_node) => {
                let value = expand_word(state, &word_node.word, Some(&command_subst)).value;
                Ok(!value.is_empty())
            }
            ConditionalExpressionNode::Group(group) => self.eval_cond_expr(state, &group.expression),
            ConditionalExpressionNode::Not(not_node) => {
                Ok(!self.eval_cond_expr(state, &not_node.operand)?)
            }
            ConditionalExpressionNode::And(and_node) => {
                Ok(self.eval_cond_expr(state, &and_node.left)? && self.eval_cond_expr(state, &and_node.right)?)
            }
            ConditionalExpressionNode::Or(or_node) => {
                Ok(self.eval_cond_expr(state, &or_node.left)? || self.eval_cond_expr(state, &or_node.right)?)
            }
            ConditionalExpressionNode::Unary(unary) => self.eval_cond_unary(state, unary.operator, &unary.operand),
            ConditionalExpressionNode::Binary(binary) => {
                let lhs = expand_word(state, &binary.left, Some(&command_subst)).value;
                let rhs = expand_word(state, &binary.right, Some(&command_subst)).value;
                Ok(self.eval_cond_binary(&state.cwd, binary.operator, &lhs, &rhs, nocasematch, extglob))
            }
        }
    }

    fn eval_cond_unary(
        &self,
        state: &mut InterpreterState,
        operator: CondUnaryOperator,
        operand: &WordNode,
    ) -> Result<bool, String> {
        let command_subst = |body: &ScriptNode, st: &mut InterpreterState| match self.execute_script(st, body) {
            Ok(result) => result,
            Err(e) => ExecResult::new(String::new(), e.to_string(), 1),
        };
        if operator == CondUnaryOperator::V {
            let name = expand_word(state, operand, Some(&command_subst)).value;
            let (is_set, _) = evaluate_variable_test(state, &state.env.clone(), &name, Some(state.current_line as i32));
            return Ok(is_set);
        }
        if operator == CondUnaryOperator::UpperR {
            let name = expand_word(state, operand, Some(&command_subst)).value;
            return Ok(evaluate_nameref_test(state, &name));
        }
        if operator == CondUnaryOperator::Z {
            let value = expand_word(state, operand, Some(&command_subst)).value;
            return Ok(evaluate_string_test_str("-z", &value).unwrap_or(false));
        }
        if operator == CondUnaryOperator::LowerN {
            let value = expand_word(state, operand, Some(&command_subst)).value;
            return Ok(evaluate_string_test_str("-n", &value).unwrap_or(false));
        }
        if operator == CondUnaryOperator::LowerO {
            let name = expand_word(state, operand, Some(&command_subst)).value;
            return Ok(crate::interpreter::conditionals::evaluate_shell_option(state, &name));
        }

        let path = expand_word(state, operand, Some(&command_subst)).value;
        let resolved = if path.starts_with('/') {
            path
        } else {
            self.fs.resolve_path(&state.cwd, &path)
        };

        Ok(match operator {
            CondUnaryOperator::E | CondUnaryOperator::A => self.fs.exists(&resolved),
            CondUnaryOperator::F => self.fs.is_file(&resolved),
            CondUnaryOperator::D => self.fs.is_dir(&resolved),
            CondUnaryOperator::S => self
                .fs
                .stat(&resolved)
                .map(|s| s.size > 0)
                .unwrap_or(false),
            CondUnaryOperator::L | CondUnaryOperator::H => self
                .fs
                .stat(&resolved)
                .map(|s| s.is_symlink)
                .unwrap_or(false),
            CondUnaryOperator::R | CondUnaryOperator::W => self.fs.exists(&resolved),
            CondUnaryOperator::X => self
                .fs
                .stat(&resolved)
                .map(|s| is_executable_mode(s.mode) || s.is_dir)
                .unwrap_or(false),
            // -b, -c, -g, -k, -p, -t, -u, -G, -O, -N: require metadata this
            // sandbox's virtual filesystem doesn't model; conservatively false.
            CondUnaryOperator::B
            | CondUnaryOperator::C
            | CondUnaryOperator::G
            | CondUnaryOperator::K
            | CondUnaryOperator::P
            | CondUnaryOperator::T
            | CondUnaryOperator::U
            | CondUnaryOperator::UpperG
            | CondUnaryOperator::UpperO
            | CondUnaryOperator::UpperS
            | CondUnaryOperator::N => false,
            CondUnaryOperator::V | CondUnaryOperator::UpperR | CondUnaryOperator::Z | CondUnaryOperator::LowerN | CondUnaryOperator::LowerO => {
                unreachable!("handled above")
            }
        })
    }

    fn eval_cond_binary(
        &self,
        cwd: &str,
        operator: CondBinaryOperator,
        lhs: &str,
        rhs: &str,
        nocasematch: bool,
        extglob: bool,
    ) -> bool {
        match operator {
            CondBinaryOperator::Eq | CondBinaryOperator::EqEq => match_pattern(lhs, rhs, nocasematch, extglob),
            CondBinaryOperator::Ne => !match_pattern(lhs, rhs, nocasematch, extglob),
            CondBinaryOperator::Match => {
                let pattern = posix_ere_to_regex(rhs);
                Regex::new(&pattern).map(|re| re.is_match(lhs)).unwrap_or(false)
            }
            CondBinaryOperator::Lt => lhs < rhs,
            CondBinaryOperator::Gt => lhs > rhs,
            CondBinaryOperator::NumEq => compare_numeric_str("-eq", parse_numeric(lhs), parse_numeric(rhs)).unwrap_or(false),
            CondBinaryOperator::NumNe => compare_numeric_str("-ne", parse_numeric(lhs), parse_numeric(rhs)).unwrap_or(false),
            CondBinaryOperator::NumLt => compare_numeric_str("-lt", parse_numeric(lhs), parse_numeric(rhs)).unwrap_or(false),
            CondBinaryOperator::NumLe => compare_numeric_str("-le", parse_numeric(lhs), parse_numeric(rhs)).unwrap_or(false),
            CondBinaryOperator::NumGt => compare_numeric_str("-gt", parse_numeric(lhs), parse_numeric(rhs)).unwrap_or(false),
            CondBinaryOperator::NumGe => compare_numeric_str("-ge", parse_numeric(lhs), parse_numeric(rhs)).unwrap_or(false),
            CondBinaryOperator::Nt | CondBinaryOperator::Ot | CondBinaryOperator::Ef => {
                self.eval_cond_file_binary(cwd, operator, lhs, rhs)
            }
        }
    }

    fn eval_cond_file_binary(&self, cwd: &str, operator: CondBinaryOperator, lhs: &str, rhs: &str) -> bool {
        let resolve = |p: &str| -> String {
            if p.starts_with('/') {
                p.to_string()
            } else {
                self.fs.resolve_path(cwd, p)
            }
        };
        let left = resolve(lhs);
        let right = resolve(rhs);
        match operator {
            CondBinaryOperator::Nt => match (self.fs.stat(&left), self.fs.stat(&right)) {
                (Ok(l), Ok(r)) => l.mtime > r.mtime,
                (Ok(_), Err(_)) => true,
                _ => false,
            },
            CondBinaryOperator::Ot => match (self.fs.stat(&left), self.fs.stat(&right)) {
                (Ok(l), Ok(r)) => l.mtime < r.mtime,
                (Err(_), Ok(_)) => true,
                _ => false,
            },
            CondBinaryOperator::Ef => left == right && self.fs.exists(&left),
            _ => unreachable!("handled by caller"),
        }
    }

    /// Execute a compound command (if, for, while, etc.).
    pub fn execute_compound_command(
        &self,
        state: &mut InterpreterState,
        compound: &CompoundCommandNode,
        stdin: &str,
    ) -> Result<ExecResult, InterpreterError> {
        match compound {
            CompoundCommandNode::If(if_node) => {
                // Build clauses for execute_if
                let clauses: Vec<(Vec<&StatementNode>, Vec<&StatementNode>)> = if_node
                    .clauses
                    .iter()
                    .map(|c| {
                        (
                            c.condition.iter().collect(),
                            c.body.iter().collect(),
                        )
                    })
                    .collect();

                let else_body: Option<Vec<&StatementNode>> =
                    if_node.else_body.as_ref().map(|b| b.iter().collect());

                let result = execute_if(
                    state,
                    &clauses,
                    else_body.as_deref(),
                    |state, stmt| {
                        let res = self.execute_statement(state, stmt)?;
                        Ok(ConditionResult {
                            stdout: res.stdout,
                            stderr: res.stderr,
                            exit_code: res.exit_code,
                        })
                    },
                    |state, stmt| self.execute_statement(state, stmt),
                )?;

                Ok(ExecResult::new(result.stdout, result.stderr, result.exit_code))
            }

            CompoundCommandNode::For(for_node) => {
                // Expand words
                let mut words: Vec<String> = Vec::new();
                let command_subst = |body: &ScriptNode, st: &mut InterpreterState| match self.execute_script(st, body) {
                    Ok(result) => result,
                    Err(e) => ExecResult::new(String::new(), e.to_string(), 1),
                };
                if let Some(ref word_list) = for_node.words {
                    for word in word_list {
                        let result = expand_word_with_glob(state, word, Some(&command_subst), Some(self.fs));
                        if let Some(split) = result.split_words {
                            words.extend(split);
                        } else {
                            words.push(result.value);
                        }
                    }
                } else {
                    // Default to positional parameters
                    let argc: usize = state.env.get("#")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0);
                    for i in 1..=argc {
                        if let Some(val) = state.env.get(&i.to_string()) {
                            words.push(val.clone());
                        }
                    }
                }

                let body: Vec<&StatementNode> = for_node.body.iter().collect();

                let result = execute_for(
                    state,
                    &for_node.variable,
                    &words,
                    &body,
                    self.limits.max_iterations,
                    |state, stmt| self.execute_statement(state, stmt),
                )?;

                Ok(ExecResult::new(result.stdout, result.stderr, result.exit_code))
            }

            CompoundCommandNode::While(while_node) => {
                let condition: Vec<&StatementNode> = while_node.condition.iter().collect();
                let body: Vec<&StatementNode> = while_node.body.iter().collect();

                let result = execute_while(
                    state,
                    &condition,
                    &body,
                    self.limits.max_iterations,
                    |state, stmt| {
                        let res = self.execute_statement(state, stmt)?;
                        Ok(ConditionResult {
                            stdout: res.stdout,
                            stderr: res.stderr,
                            exit_code: res.exit_code,
                        })
                    },
                    |state, stmt| self.execute_statement(state, stmt),
                )?;

                Ok(ExecResult::new(result.stdout, result.stderr, result.exit_code))
            }

            CompoundCommandNode::Until(until_node) => {
                let condition: Vec<&StatementNode> = until_node.condition.iter().collect();
                let body: Vec<&StatementNode> = until_node.body.iter().collect();

                let result = execute_until(
                    state,
                    &condition,
                    &body,
                    self.limits.max_iterations,
                    |state, stmt| {
                        let res = self.execute_statement(state, stmt)?;
                        Ok(ConditionResult {
                            stdout: res.stdout,
                            stderr: res.stderr,
                            exit_code: res.exit_code,
                        })
                    },
                    |state, stmt| self.execute_statement(state, stmt),
                )?;

                Ok(ExecResult::new(result.stdout, result.stderr, result.exit_code))
            }

            CompoundCommandNode::Case(case_node) => {
                let command_subst = |body: &ScriptNode, st: &mut InterpreterState| match self.execute_script(st, body) {
                    Ok(result) => result,
                    Err(e) => ExecResult::new(String::new(), e.to_string(), 1),
                };
                let word_value = expand_word_with_glob(state, &case_node.word, Some(&command_subst), None).value;
                let nocasematch = state.shopt_options.nocasematch;
                let extglob = state.shopt_options.extglob;

                let mut expanded_items: Vec<(Vec<String>, Vec<&StatementNode>, AstCaseTerminator)> =
                    Vec::with_capacity(case_node.items.len());
                for item in &case_node.items {
                    let mut patterns = Vec::with_capacity(item.patterns.len());
                    for pattern_word in &item.patterns {
                        patterns.push(expand_word(state, pattern_word, Some(&command_subst)).value);
                    }
                    let body: Vec<&StatementNode> = item.body.iter().collect();
                    expanded_items.push((patterns, body, item.terminator));
                }

                execute_case(
                    state,
                    &word_value,
                    &expanded_items,
                    nocasematch,
                    extglob,
                    |state, stmt| self.execute_statement(state, stmt),
                )
            }

            CompoundCommandNode::Subshell(subshell_node) => {
                execute_subshell(
                    state,
                    &subshell_node.body,
                    Some(stdin),
                    |state, stmt| self.execute_statement(state, stmt),
                )
            }

            CompoundCommandNode::Group(group_node) => {
                execute_group(
                    state,
                    &group_node.body,
                    Some(stdin),
                    |state, stmt| self.execute_statement(state, stmt),
                )
            }

            CompoundCommandNode::ArithmeticCommand(arith) => {
                use crate::interpreter::arithmetic::evaluate_arithmetic;
                use crate::interpreter::types::InterpreterContext;

                let mut ctx = InterpreterContext::new(state, self.limits);
                match evaluate_arithmetic(&mut ctx, &arith.expression.expression, false, None) {
                    Ok(value) => {
                        // Arithmetic command: exit 0 if non-zero, exit 1 if zero
                        let exit_code = if value != 0 { 0 } else { 1 };
                        Ok(ExecResult::new(String::new(), String::new(), exit_code))
                    }
                    Err(e) => {
                        Ok(ExecResult::new(
                            String::new(),
                            format!("bash: {}\n", e),
                            1,
                        ))
                    }
                }
            }

            CompoundCommandNode::ConditionalCommand(cond) => {
                match self.eval_cond_expr(state, &cond.expression) {
                    Ok(true) => Ok(ExecResult::ok()),
                    Ok(false) => Ok(ExecResult::new(String::new(), String::new(), 1)),
                    Err(msg) => Ok(ExecResult::new(String::new(), format!("bash: {}\n", msg), 2)),
                }
            }

            CompoundCommandNode::CStyleFor(cfor) => {
                let mut result = ForResult::default();
                let prev_loop_depth = state.loop_depth;
                state.loop_depth += 1;

                let eval_arith = |state: &mut InterpreterState, limits: &ExecutionLimits, expr: &crate::ast::types::ArithmeticExpressionNode| {
                    let mut ctx = InterpreterContext::new(state, limits);
                    evaluate_arithmetic(&mut ctx, &expr.expression, false, None)
                };

                if let Some(ref init) = cfor.init {
                    if let Err(e) = eval_arith(state, self.limits, init) {
                        state.loop_depth = prev_loop_depth;
                        return Ok(ExecResult::new(String::new(), format!("bash: {}\n", e), 1));
                    }
                }

                let mut iterations: u64 = 0;
                let body: Vec<&StatementNode> = cfor.body.iter().collect();

                let outcome: Result<(), InterpreterError> = 'cfor: loop {
                    iterations += 1;
                    if iterations > self.limits.max_iterations {
                        state.loop_depth = prev_loop_depth;
                        return Err(InterpreterError::ExecutionLimit(ExecutionLimitError::new(
                            format!("loop exceeded maximum iterations ({})", self.limits.max_iterations),
                            LimitType::Iterations,
                            result.stdout,
                            result.stderr,
                        )));
                    }

                    let keep_going = match &cfor.condition {
                        Some(cond) => match eval_arith(state, self.limits, cond) {
                            Ok(v) => v != 0,
                            Err(e) => {
                                break Err(InterpreterError::Errexit(ErrexitError::new(
                                    1,
                                    std::mem::take(&mut result.stdout),
                                    format!("{}bash: {}\n", result.stderr, e),
                                )));
                            }
                        },
                        None => true,
                    };
                    if !keep_going {
                        break Ok(());
                    }

                    let mut should_break = false;
                    for stmt in &body {
                        match self.execute_statement(state, stmt) {
                            Ok(r) => {
                                result.stdout.push_str(&r.stdout);
                                result.stderr.push_str(&r.stderr);
                                result.exit_code = r.exit_code;
                            }
                            Err(e) => {
                                let handled = handle_loop_error(
                                    e,
                                    std::mem::take(&mut result.stdout),
                                    std::mem::take(&mut result.stderr),
                                    state.loop_depth,
                                );
                                result.stdout = handled.stdout;
                                result.stderr = handled.stderr;
                                match handled.action {
                                    LoopAction::Break => {
                                        should_break = true;
                                        break;
                                    }
                                    LoopAction::Continue => break,
                                    LoopAction::Rethrow => {
                                        break 'cfor Err(handled.error.unwrap());
                                    }
                                    LoopAction::Error => {
                                        result.exit_code = handled.exit_code.unwrap_or(1);
                                        should_break = true;
                                        break;
                                    }
                                }
                            }
                        }
                    }
                    if should_break {
                        break Ok(());
                    }

                    if let Some(ref update) = cfor.update {
                        if let Err(e) = eval_arith(state, self.limits, update) {
                            break Err(InterpreterError::Errexit(ErrexitError::new(
                                1,
                                std::mem::take(&mut result.stdout),
                                format!("{}bash: {}\n", result.stderr, e),
                            )));
                        }
                    }
                };

                state.loop_depth = prev_loop_depth;
                outcome?;
                Ok(ExecResult::new(result.stdout, result.stderr, result.exit_code))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{InMemoryFs, FileSystem as AsyncFileSystem};
    use crate::interpreter::sync_fs_adapter::SyncFsAdapter;
    use std::sync::Arc;

    fn make_engine_and_state() -> (ExecutionEngine<'static>, InterpreterState, Arc<InMemoryFs>) {
        let fs = Arc::new(InMemoryFs::new());
        let limits = Box::leak(Box::new(ExecutionLimits::default()));

        // We need a static reference for the test, so we leak the adapter
        let handle = tokio::runtime::Handle::current();
        let adapter = Box::leak(Box::new(SyncFsAdapter::new(fs.clone(), handle)));

        let engine = ExecutionEngine::new(limits, adapter);
        let state = InterpreterState::default();

        (engine, state, fs)
    }

    fn make_engine_with_registry() -> (ExecutionEngine<'static>, InterpreterState, Arc<InMemoryFs>) {
        let fs = Arc::new(InMemoryFs::new());
        let limits = Box::leak(Box::new(ExecutionLimits::default()));

        let handle = tokio::runtime::Handle::current();
        let adapter = Box::leak(Box::new(SyncFsAdapter::new(fs.clone(), handle.clone())));
        let registry = Box::leak(Box::new(crate::commands::create_default_registry()));

        let bridge = CommandBridge {
            registry,
            fs: fs.clone(),
            handle,
            fetch_fn: None,
        };
        let engine = ExecutionEngine::with_commands(limits, adapter, bridge);
        let state = InterpreterState::default();

        (engine, state, fs)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_registry_dispatches_external_command() {
        let (engine, mut state, fs) = make_engine_with_registry();
        fs.write_file("/tmp/greeting.txt", b"hi there\n").await.unwrap();

        let ast = crate::parser::parse("cat /tmp/greeting.txt").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();

        assert_eq!(result.stdout, "hi there\n");
        assert_eq!(result.exit_code, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unregistered_command_falls_through_to_not_found() {
        let (engine, mut state, _fs) = make_engine_with_registry();

        let ast = crate::parser::parse("totally_not_a_real_command").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();

        assert_eq!(result.exit_code, 127);
        assert!(result.stderr.contains("command not found"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_execute_echo() {
        let (engine, mut state, _fs) = make_engine_and_state();

        let ast = crate::parser::parse("echo hello world").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();

        assert_eq!(result.stdout, "hello world\n");
        assert_eq!(result.exit_code, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_execute_variable_expansion() {
        let (engine, mut state, _fs) = make_engine_and_state();
        state.env.insert("NAME".to_string(), "world".to_string());

        let ast = crate::parser::parse("echo hello $NAME").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();

        assert_eq!(result.stdout, "hello world\n");
        assert_eq!(result.exit_code, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_execute_true_false() {
        let (engine, mut state, _fs) = make_engine_and_state();

        let ast = crate::parser::parse("true").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.exit_code, 0);

        let ast = crate::parser::parse("false").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.exit_code, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_execute_and_or() {
        let (engine, mut state, _fs) = make_engine_and_state();

        // true && echo yes
        let ast = crate::parser::parse("true && echo yes").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "yes\n");

        // false && echo no (should not print)
        let ast = crate::parser::parse("false && echo no").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "");

        // false || echo fallback
        let ast = crate::parser::parse("false || echo fallback").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "fallback\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_execute_if() {
        let (engine, mut state, _fs) = make_engine_and_state();

        let ast = crate::parser::parse("if true; then echo yes; fi").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "yes\n");

        let ast = crate::parser::parse("if false; then echo no; else echo else; fi").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "else\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_execute_for() {
        let (engine, mut state, _fs) = make_engine_and_state();

        let ast = crate::parser::parse("for i in a b c; do echo $i; done").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "a\nb\nc\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_execute_while() {
        let (engine, mut state, _fs) = make_engine_and_state();
        state.env.insert("x".to_string(), "3".to_string());

        // Simple while that would loop - but we need arithmetic for decrement
        // For now just test basic structure
        let ast = crate::parser::parse("while false; do echo loop; done").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "");
        assert_eq!(result.exit_code, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_execute_subshell() {
        let (engine, mut state, _fs) = make_engine_and_state();
        state.env.insert("X".to_string(), "original".to_string());

        // Subshell should not affect parent
        let ast = crate::parser::parse("(X=modified; echo $X); echo $X").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        // Note: assignment in subshell not fully implemented yet
        // Just verify subshell executes
        assert!(result.stdout.contains("original"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_execute_group() {
        let (engine, mut state, _fs) = make_engine_and_state();

        let ast = crate::parser::parse("{ echo a; echo b; }").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "a\nb\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_execute_pwd_cd() {
        let fs = Arc::new(InMemoryFs::new());
        let limits = Box::leak(Box::new(ExecutionLimits::default()));

        // Create directory structure using async API directly
        fs.mkdir("/home", &crate::fs::MkdirOptions { recursive: false }).await.unwrap();
        fs.mkdir("/home/user", &crate::fs::MkdirOptions { recursive: false }).await.unwrap();

        // Now create the sync adapter
        let handle = tokio::runtime::Handle::current();
        let adapter = Box::leak(Box::new(SyncFsAdapter::new(fs.clone(), handle)));

        let engine = ExecutionEngine::new(limits, adapter);
        let mut state = InterpreterState::default();

        state.cwd = "/".to_string();
        state.env.insert("PWD".to_string(), "/".to_string());

        let ast = crate::parser::parse("pwd").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "/\n");

        let ast = crate::parser::parse("cd /home/user && pwd").unwrap();
        let result = engine.execute_script(&mut state, &ast).unwrap();
        assert_eq!(result.stdout, "/home/user\n");
    }
}
