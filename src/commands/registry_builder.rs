//! Builds the default `CommandRegistry`, mirroring the original's
//! `create_command_registry()` (`examples/original_source/src/just_bash/commands/__init__.py`):
//! every external-command implementation the crate ships is registered
//! under its own name so command resolution (spec step 5) can find it.

use super::registry::CommandRegistry;

/// Build a registry containing every command implementation in this crate.
///
/// A host embedding the interpreter can start from this and add or remove
/// entries (`CommandRegistry::register`) rather than being stuck with a
/// fixed set, matching how the original's registry is itself replaceable.
pub fn create_default_registry() -> CommandRegistry {
    let mut reg = CommandRegistry::new();

    reg.register(Box::new(super::basename::BasenameCommand));
    reg.register(Box::new(super::cat::CatCommand));
    reg.register(Box::new(super::cp::CpCommand));
    reg.register(Box::new(super::dirname::DirnameCommand));
    reg.register(Box::new(super::head::HeadCommand));
    reg.register(Box::new(super::ls::LsCommand));
    reg.register(Box::new(super::mkdir::MkdirCommand));
    reg.register(Box::new(super::mv::MvCommand));
    reg.register(Box::new(super::rm::RmCommand));
    reg.register(Box::new(super::tail::TailCommand));
    reg.register(Box::new(super::touch::TouchCommand));
    reg.register(Box::new(super::wc::WcCommand));

    reg.register(Box::new(super::alias_cmd::AliasCommand));
    reg.register(Box::new(super::awk::AwkCommand));
    reg.register(Box::new(super::base64_cmd::Base64Command));
    reg.register(Box::new(super::bash_cmd::BashCommand));
    reg.register(Box::new(super::bash_cmd::ShCommand));
    reg.register(Box::new(super::chmod::ChmodCommand));
    reg.register(Box::new(super::clear_cmd::ClearCommand));
    reg.register(Box::new(super::column_cmd::ColumnCommand));
    reg.register(Box::new(super::comm_cmd::CommCommand));
    reg.register(Box::new(super::curl::CurlCommand));
    reg.register(Box::new(super::cut::CutCommand));
    reg.register(Box::new(super::date::DateCommand));
    reg.register(Box::new(super::diff_cmd::DiffCommand));
    reg.register(Box::new(super::du_cmd::DuCommand));
    reg.register(Box::new(super::echo::EchoCommand));
    reg.register(Box::new(super::env::EnvCommand));
    reg.register(Box::new(super::env::PrintenvCommand));
    reg.register(Box::new(super::expand_cmd::ExpandCommand));
    reg.register(Box::new(super::expr_cmd::ExprCommand));
    reg.register(Box::new(super::file_cmd::FileCommand));
    reg.register(Box::new(super::find::FindCommand));
    reg.register(Box::new(super::fold_cmd::FoldCommand));
    reg.register(Box::new(super::grep::GrepCommand));
    reg.register(Box::new(super::gzip::GzipCommand));
    reg.register(Box::new(super::gzip::GunzipCommand));
    reg.register(Box::new(super::gzip::ZcatCommand));
    reg.register(Box::new(super::help_cmd::HelpCommand));
    reg.register(Box::new(super::history_cmd::HistoryCommand));
    reg.register(Box::new(super::hostname_cmd::HostnameCommand));
    reg.register(Box::new(super::html_to_markdown_cmd::HtmlToMarkdownCommand));
    reg.register(Box::new(super::join::JoinCommand));
    reg.register(Box::new(super::jq::JqCommand));
    reg.register(Box::new(super::ln::LnCommand));
    reg.register(Box::new(super::md5sum::Md5sumCommand));
    reg.register(Box::new(super::md5sum::Sha1sumCommand));
    reg.register(Box::new(super::md5sum::Sha256sumCommand));
    reg.register(Box::new(super::nl::NlCommand));
    reg.register(Box::new(super::od_cmd::OdCommand));
    reg.register(Box::new(super::paste::PasteCommand));
    reg.register(Box::new(super::printf::PrintfCommand));
    reg.register(Box::new(super::pwd::PwdCommand));
    reg.register(Box::new(super::readlink_cmd::ReadlinkCommand));
    reg.register(Box::new(super::rev_cmd::RevCommand));
    reg.register(Box::new(super::rg_cmd::RgCommand));
    reg.register(Box::new(super::rmdir_cmd::RmdirCommand));
    reg.register(Box::new(super::sed::SedCommand));
    reg.register(Box::new(super::seq::SeqCommand));
    reg.register(Box::new(super::sleep_cmd::SleepCommand));
    reg.register(Box::new(super::sort::SortCommand));
    reg.register(Box::new(super::split_cmd::SplitCommand));
    reg.register(Box::new(super::stat_cmd::StatCommand));
    reg.register(Box::new(super::strings_cmd::StringsCommand));
    reg.register(Box::new(super::tac_cmd::TacCommand));
    reg.register(Box::new(super::tar::TarCommand));
    reg.register(Box::new(super::tee::TeeCommand));
    reg.register(Box::new(super::test_cmd::TestCommand));
    reg.register(Box::new(super::test_cmd::BracketCommand));
    reg.register(Box::new(super::time_cmd::TimeCommand));
    reg.register(Box::new(super::timeout_cmd::TimeoutCommand));
    reg.register(Box::new(super::tr::TrCommand));
    reg.register(Box::new(super::tree_cmd::TreeCommand));
    reg.register(Box::new(super::true_cmd::TrueCommand));
    reg.register(Box::new(super::true_cmd::FalseCommand));
    reg.register(Box::new(super::unalias_cmd::UnaliasCommand));
    reg.register(Box::new(super::uniq::UniqCommand));
    reg.register(Box::new(super::which_cmd::WhichCommand));
    reg.register(Box::new(super::whoami_cmd::WhoamiCommand));
    reg.register(Box::new(super::xan_cmd::XanCommand));
    reg.register(Box::new(super::xargs::XargsCommand));
    reg.register(Box::new(super::yq::YqCommand));

    reg
}
