// src/commands/dirname/mod.rs
use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct DirnameCommand;

#[async_trait]
impl Command for DirnameCommand {
    fn name(&self) -> &'static str {
        "dirname"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let args = &ctx.args;

        if args.iter().any(|a| a == "--help") {
            return CommandResult::success(
                "Usage: dirname [OPTION] NAME...\n\n\
                 Strip last component from file name.\n\n\
                 Options:\n\
                       --help       display this help and exit\n".to_string()
            );
        }

        let names: Vec<&String> = args.iter().filter(|a| !a.starts_with('-')).collect();

        if names.is_empty() {
            return CommandResult::error("dirname: missing operand\n".to_string());
        }

        let results: Vec<String> = names
            .iter()
            .map(|name| {
                // 移除尾部斜杠
                let clean_name = name.trim_end_matches('/');
                match clean_name.rfind('/') {
                    None => ".".to_string(),
                    Some(0) => "/".to_string(),
                    Some(pos) => clean_name[..pos].to_string(),
                }
            })
            .collect();

        CommandResult::success(format!("{}\n", results.join("\n")))
    }
}
