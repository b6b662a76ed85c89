// src/commands/awk/command.rs
//
// `Command`-trait wrapper over the AWK engine (lexer/parser/interpreter in
// this module) - mirrors how `sed`/`grep` expose a hand-rolled engine as a
// single external command.

use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandResult};
use super::context::AwkContext;
use super::interpreter::AwkInterpreter;
use super::parser::parse as parse_program;

pub struct AwkCommand;

#[async_trait]
impl Command for AwkCommand {
    fn name(&self) -> &'static str {
        "awk"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut field_sep: Option<String> = None;
        let mut assignments: Vec<(String, String)> = Vec::new();
        let mut program_text: Option<String> = None;
        let mut files: Vec<String> = Vec::new();

        let args = &ctx.args;
        let mut i = 0;
        while i < args.len() {
            let arg = &args[i];
            if program_text.is_none() {
                if arg == "-F" {
                    i += 1;
                    match args.get(i) {
                        Some(v) => field_sep = Some(v.clone()),
                        None => return CommandResult::error("awk: option requires an argument -- 'F'\n".to_string()),
                    }
                } else if let Some(rest) = arg.strip_prefix("-F") {
                    field_sep = Some(rest.to_string());
                } else if arg == "-v" {
                    i += 1;
                    match args.get(i) {
                        Some(v) => {
                            if let Some((k, val)) = v.split_once('=') {
                                assignments.push((k.to_string(), val.to_string()));
                            }
                        }
                        None => return CommandResult::error("awk: option requires an argument -- 'v'\n".to_string()),
                    }
                } else if let Some(rest) = arg.strip_prefix("-v") {
                    if let Some((k, val)) = rest.split_once('=') {
                        assignments.push((k.to_string(), val.to_string()));
                    }
                } else {
                    program_text = Some(arg.clone());
                }
            } else {
                files.push(arg.clone());
            }
            i += 1;
        }

        let program_text = match program_text {
            Some(p) => p,
            None => return CommandResult::error("usage: awk [-F fs][-v var=value] 'prog' [file ...]\n".to_string()),
        };

        let program = match parse_program(&program_text) {
            Ok(p) => p,
            Err(e) => return CommandResult::with_exit_code(String::new(), format!("awk: {}\n", e), 2),
        };

        let mut awk_ctx = match &field_sep {
            Some(fs) => AwkContext::with_fs(fs),
            None => AwkContext::new(),
        };
        for (k, v) in assignments {
            awk_ctx.vars.insert(k, v);
        }
        for (k, v) in &ctx.env {
            awk_ctx.environ.insert(k.clone(), v.clone());
        }

        let input = if files.is_empty() {
            ctx.stdin.clone()
        } else {
            let mut combined = String::new();
            for file in &files {
                let path = ctx.fs.resolve_path(&ctx.cwd, file);
                match ctx.fs.read_file(&path).await {
                    Ok(content) => combined.push_str(&content),
                    Err(e) => return CommandResult::with_exit_code(
                        String::new(),
                        format!("awk: can't open file {}: {}\n", file, e),
                        2,
                    ),
                }
            }
            combined
        };

        let mut interpreter = AwkInterpreter::new(awk_ctx, program);
        interpreter.execute_begin();
        if !interpreter.get_context().should_exit {
            for line in input.lines() {
                interpreter.execute_line(line);
                if interpreter.get_context().should_exit {
                    break;
                }
            }
        }
        interpreter.execute_end();

        CommandResult::with_exit_code(
            interpreter.get_output().to_string(),
            String::new(),
            interpreter.get_exit_code(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFs;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn make_ctx(args: Vec<&str>, stdin: &str) -> CommandContext {
        CommandContext {
            args: args.into_iter().map(String::from).collect(),
            stdin: stdin.to_string(),
            cwd: "/home/user".to_string(),
            env: HashMap::new(),
            fs: Arc::new(InMemoryFs::new()),
            exec_fn: None,
            fetch_fn: None,
        }
    }

    #[tokio::test]
    async fn prints_second_field() {
        let ctx = make_ctx(vec!["{ print $2 }"], "a b c\nd e f\n");
        let result = AwkCommand.execute(ctx).await;
        assert_eq!(result.stdout, "b\ne\n");
        assert_eq!(result.exit_code, 0);
    }

    #[tokio::test]
    async fn respects_custom_field_separator() {
        let ctx = make_ctx(vec!["-F", ":", "{ print $1 }"], "root:x:0\nuser:x:1\n");
        let result = AwkCommand.execute(ctx).await;
        assert_eq!(result.stdout, "root\nuser\n");
    }

    #[tokio::test]
    async fn applies_v_assignment() {
        let ctx = make_ctx(vec!["-v", "greeting=hi", "BEGIN { print greeting }"], "");
        let result = AwkCommand.execute(ctx).await;
        assert_eq!(result.stdout, "hi\n");
    }

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let ctx = make_ctx(vec![], "");
        let result = AwkCommand.execute(ctx).await;
        assert_eq!(result.exit_code, 1);
    }
}
