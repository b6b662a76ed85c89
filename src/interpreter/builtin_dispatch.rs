//! Builtin Command Dispatch
//!
//! Handles dispatch of built-in shell commands like export, unset, cd, etc.
//! Separated from interpreter.rs for modularity.

use std::collections::HashMap;
use crate::ast::types::CompoundCommandNode;
use crate::interpreter::builtins::{
    handle_break, handle_cd, handle_compgen, handle_complete, handle_compopt, handle_continue,
    handle_declare, handle_dirs, handle_exit, handle_export, handle_getopts, handle_hash,
    handle_help, handle_let, handle_local, handle_mapfile, handle_popd, handle_pushd,
    handle_read, handle_readonly, handle_return, handle_set, handle_shift, handle_shopt,
    handle_unset, BuiltinResult,
};
use crate::commands::{Command as RegistryCommand, CommandContext};
use crate::fs::InMemoryFs;
use crate::interpreter::conditionals::evaluate_test_expression;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::functions::call_function;
use crate::interpreter::helpers::result::{OK, failure, test_result};
use crate::interpreter::helpers::shell_constants::SHELL_BUILTINS;
use crate::interpreter::helpers::sync_poll::block_on_ready;
use crate::interpreter::types::{ExecResult, ExecutionLimits, InterpreterState};
use std::sync::Arc;

/// Run one of the `Command` impls that are real shell builtins (`echo`,
/// `printf`, `pwd`) rather than external-registry entries. None of these
/// ever actually suspend inside `execute`, so polling once is safe; `fs`
/// is a throwaway in-memory filesystem since none of them touch it on the
/// paths reachable here (`pwd -P`'s realpath lookup just falls back to
/// `cwd`, matching its own no-such-path behavior).
fn run_builtin_command(cmd: &dyn RegistryCommand, args: &[String], cwd: &str) -> ExecResult {
    let ctx = CommandContext {
        args: args.to_vec(),
        stdin: String::new(),
        cwd: cwd.to_string(),
        env: HashMap::new(),
        fs: Arc::new(InMemoryFs::new()),
        exec_fn: None,
        fetch_fn: None,
    };
    let result = block_on_ready(cmd.execute(ctx));
    ExecResult::new(result.stdout, result.stderr, result.exit_code)
}

/// Type for the function that runs a named command recursively (used by
/// `exec`, `command`, and `builtin`). Takes the interpreter state explicitly
/// rather than capturing it, since dispatch may recurse into itself.
pub type RunCommandFn<'a> = &'a dyn Fn(
    &mut InterpreterState,
    &str,           // command_name
    &[String],      // args
    &[bool],        // quoted_args
    &str,           // stdin
    bool,           // skip_functions
    bool,           // use_default_path
    i32,            // stdin_source_fd
) -> Result<ExecResult, InterpreterError>;

/// Type for the function that builds exported environment.
pub type BuildExportedEnvFn<'a> = &'a dyn Fn(&InterpreterState) -> HashMap<String, String>;

/// Type for the function that executes user scripts (eval, source).
pub type ExecuteUserScriptFn<'a> =
    &'a dyn Fn(&mut InterpreterState, &str, &[String], Option<&str>) -> Result<ExecResult, InterpreterError>;

/// Type for the function that runs a called function's compound-command body.
pub type ExecuteFunctionBodyFn<'a> =
    &'a dyn Fn(&mut InterpreterState, &CompoundCommandNode, &str) -> Result<ExecResult, InterpreterError>;

/// Dispatch context containing dependencies needed for builtin dispatch.
///
/// Deliberately does NOT hold `&mut InterpreterState` itself - state is
/// threaded explicitly through `dispatch_builtin`'s own parameter so that
/// `run_command`/`execute_function_body` can recurse into state without a
/// `RefCell` double-borrow.
pub struct BuiltinDispatchContext<'a> {
    pub run_command: RunCommandFn<'a>,
    pub build_exported_env: BuildExportedEnvFn<'a>,
    pub execute_user_script: ExecuteUserScriptFn<'a>,
    pub execute_function_body: ExecuteFunctionBodyFn<'a>,
    pub limits: &'a ExecutionLimits,
    /// Sync filesystem handle, so `test`/`[` can resolve file-test operators
    /// (`-e`, `-f`, `-d`, ...) the same way `[[ ]]` does in the execution engine.
    pub fs: &'a dyn crate::interpreter::interpreter::FileSystem,
}

fn exec_of(r: BuiltinResult) -> ExecResult {
    ExecResult::new(r.stdout, r.stderr, r.exit_code)
}

/// Dispatch a command to the appropriate builtin handler or external command.
/// Returns None if the command should be handled by external command resolution.
///
/// The outer `Option` signals "not a builtin, try external resolution"; the
/// inner `Result` carries control-flow errors (break/continue/return/exit)
/// the same way normal command execution does.
pub fn dispatch_builtin(
    state: &mut InterpreterState,
    dispatch_ctx: &BuiltinDispatchContext,
    command_name: &str,
    args: &[String],
    _quoted_args: &[bool],
    stdin: &str,
    skip_functions: bool,
    _use_default_path: bool,
    stdin_source_fd: i32,
) -> Option<Result<ExecResult, InterpreterError>> {
    // Special builtins (cannot be overridden by functions, participate in control flow)
    match command_name {
        "export" => return Some(Ok(exec_of(handle_export(state, args)))),
        "exit" => {
            return Some(match handle_exit(state, args) {
                Ok(infallible) => match infallible {},
                Err(e) => Err(e),
            });
        }
        "set" => return Some(handle_set(state, args).map(exec_of)),
        "break" => return Some(handle_break(state, args).map(exec_of)),
        "continue" => return Some(handle_continue(state, args).map(exec_of)),
        "return" => return Some(handle_return(state, args).map(exec_of)),
        "shift" => return Some(handle_shift(state, args).map(exec_of)),
        "shopt" => return Some(Ok(exec_of(handle_shopt(state, args)))),
        "help" => return Some(Ok(exec_of(handle_help(args)))),
        "readonly" => return Some(Ok(exec_of(handle_readonly(state, args)))),
        "declare" | "typeset" => return Some(Ok(exec_of(handle_declare(state, args)))),
        "local" => return Some(Ok(handle_local(state, args))),
        "unset" => return Some(Ok(handle_unset(state, args))),
        _ => {}
    }

    // User-defined functions override most builtins (except special ones above)
    if !skip_functions {
        if let Some(func) = state.functions.get(command_name).cloned() {
            let call_line = Some(state.current_line);
            let max_call_depth = dispatch_ctx.limits.max_recursion_depth;
            let body = (*func.body).clone();
            return Some(call_function(
                state,
                &func,
                args,
                stdin,
                call_line,
                max_call_depth,
                |state, stdin| (dispatch_ctx.execute_function_body)(state, &body, stdin),
            ));
        }
    }

    // Simple builtins (can be overridden by functions)
    match command_name {
        ":" | "true" => return Some(Ok(OK)),
        "false" => return Some(Ok(test_result(false))),
        "echo" => return Some(Ok(run_builtin_command(&crate::commands::echo::EchoCommand, args, &state.cwd))),
        "printf" => return Some(Ok(run_builtin_command(&crate::commands::printf::PrintfCommand, args, &state.cwd))),
        "pwd" => return Some(Ok(run_builtin_command(&crate::commands::pwd::PwdCommand, args, &state.cwd))),
        "cd" => return Some(Ok(handle_cd(state, args))),
        "read" => return Some(Ok(exec_of(handle_read(state, args, stdin, stdin_source_fd)))),
        "mapfile" | "readarray" => return Some(Ok(exec_of(handle_mapfile(state, args, stdin)))),
        "getopts" => return Some(Ok(exec_of(handle_getopts(state, args)))),
        "hash" => return Some(Ok(exec_of(handle_hash(state, args)))),
        "let" => return Some(Ok(exec_of(handle_let(state, args)))),
        "pushd" => return Some(Ok(exec_of(handle_pushd(state, args)))),
        "popd" => return Some(Ok(exec_of(handle_popd(state, args)))),
        "dirs" => return Some(Ok(exec_of(handle_dirs(state, args)))),
        "compgen" => return Some(Ok(exec_of(handle_compgen(state, args)))),
        "complete" => return Some(Ok(exec_of(handle_complete(state, args)))),
        "compopt" => return Some(Ok(exec_of(handle_compopt(state, args)))),
        "command" => return Some(handle_command_builtin(state, dispatch_ctx, args, stdin)),
        "builtin" => return Some(handle_builtin_builtin(state, dispatch_ctx, args, stdin)),
        "exec" => {
            if args.is_empty() {
                return Some(Ok(OK));
            }
            let cmd = &args[0];
            let rest: Vec<String> = args[1..].to_vec();
            return Some((dispatch_ctx.run_command)(state, cmd, &rest, &[], stdin, false, false, -1));
        }
        "wait" => return Some(Ok(OK)),
        "[" | "test" => {
            let mut test_args = args.to_vec();
            if command_name == "[" {
                if test_args.last().map(|s| s.as_str()) != Some("]") {
                    return Some(Ok(failure("[: missing `]'\n")));
                }
                test_args.pop();
            }
            return Some(Ok(exec_of(handle_test(state, &test_args, dispatch_ctx.fs))));
        }
        _ => {}
    }

    // Return None to indicate command should be handled by external resolution
    None
}

/// Handle the 'command' builtin
fn handle_command_builtin(
    state: &mut InterpreterState,
    dispatch_ctx: &BuiltinDispatchContext,
    args: &[String],
    stdin: &str,
) -> Result<ExecResult, InterpreterError> {
    if args.is_empty() {
        return Ok(OK);
    }

    let mut use_default_path = false;
    let mut verbose_describe = false;
    let mut show_path = false;
    let mut cmd_args = args.to_vec();

    while !cmd_args.is_empty() && cmd_args[0].starts_with('-') {
        let opt = &cmd_args[0];
        if opt == "--" {
            cmd_args.remove(0);
            break;
        }
        for ch in opt[1..].chars() {
            match ch {
                'p' => use_default_path = true,
                'V' => verbose_describe = true,
                'v' => show_path = true,
                _ => {}
            }
        }
        cmd_args.remove(0);
    }

    if cmd_args.is_empty() {
        return Ok(OK);
    }

    if show_path || verbose_describe {
        return Ok(handle_command_v(state, &cmd_args, show_path, verbose_describe));
    }

    let cmd = &cmd_args[0];
    let rest: Vec<String> = cmd_args[1..].to_vec();
    (dispatch_ctx.run_command)(state, cmd, &rest, &[], stdin, true, use_default_path, -1)
}

/// Handle the 'builtin' builtin
fn handle_builtin_builtin(
    state: &mut InterpreterState,
    dispatch_ctx: &BuiltinDispatchContext,
    args: &[String],
    stdin: &str,
) -> Result<ExecResult, InterpreterError> {
    if args.is_empty() {
        return Ok(OK);
    }

    let mut cmd_args = args.to_vec();
    if cmd_args[0] == "--" {
        cmd_args.remove(0);
        if cmd_args.is_empty() {
            return Ok(OK);
        }
    }

    let cmd = &cmd_args[0];

    if !SHELL_BUILTINS.contains(cmd.as_str()) {
        return Ok(failure(format!("bash: builtin: {}: not a shell builtin\n", cmd)));
    }

    let rest: Vec<String> = cmd_args[1..].to_vec();
    (dispatch_ctx.run_command)(state, cmd, &rest, &[], stdin, true, false, -1)
}

fn handle_command_v(
    state: &InterpreterState,
    names: &[String],
    show_path: bool,
    verbose_describe: bool,
) -> ExecResult {
    let mut stdout = String::new();
    let mut exit_code = 0;

    for name in names {
        if SHELL_BUILTINS.contains(name.as_str()) {
            if verbose_describe {
                stdout.push_str(&format!("{} is a shell builtin\n", name));
            } else {
                stdout.push_str(&format!("{}\n", name));
            }
        } else if state.functions.contains_key(name) {
            if verbose_describe {
                stdout.push_str(&format!("{} is a function\n", name));
            } else {
                stdout.push_str(&format!("{}\n", name));
            }
        } else {
            exit_code = 1;
        }
    }

    ExecResult::new(stdout, String::new(), exit_code)
}

/// Evaluate `test`/`[` arguments as a full POSIX conditional expression.
fn handle_test(state: &InterpreterState, args: &[String], fs: &dyn crate::interpreter::interpreter::FileSystem) -> BuiltinResult {
    match evaluate_test_expression(state, args, fs) {
        Ok(true) => BuiltinResult::ok(),
        Ok(false) => BuiltinResult { stdout: String::new(), stderr: String::new(), exit_code: 1 },
        Err(msg) => BuiltinResult::failure(&msg, 2),
    }
}
