// src/commands/tail/mod.rs
use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};
use crate::commands::utils::{parse_head_tail_args, process_head_tail_files, get_tail, HeadTailParseResult};

pub struct TailCommand;

#[async_trait]
impl Command for TailCommand {
    fn name(&self) -> &'static str {
        "tail"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        if ctx.args.iter().any(|a| a == "--help") {
            return CommandResult::success(
                "Usage: tail [OPTION]... [FILE]...\n\n\
                 Print the last 10 lines of each FILE to standard output.\n\n\
                 Options:\n\
                   -c, --bytes=NUM    print the last NUM bytes\n\
                   -n, --lines=NUM    print the last NUM lines (default 10)\n\
                   -n +NUM            print starting from line NUM\n\
                   -q, --quiet        never print headers giving file names\n\
                   -v, --verbose      always print headers giving file names\n\
                       --help         display this help and exit\n".to_string()
            );
        }

        let opts = match parse_head_tail_args(&ctx.args, "tail") {
            HeadTailParseResult::Ok(o) => o,
            HeadTailParseResult::Err(e) => return e,
        };

        let lines = opts.lines;
        let bytes = opts.bytes;
        let from_line = opts.from_line;

        process_head_tail_files(&ctx, &opts, "tail", |content| {
            get_tail(content, lines, bytes, from_line)
        }).await
    }
}
