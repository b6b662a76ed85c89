//! Word Expansion
//!
//! Main entry point for shell word expansion.
//!
//! Orchestrates the fixed expansion order from the `expansion/` submodules:
//! brace expansion, tilde expansion, parameter/command/arithmetic expansion,
//! word splitting, and pathname expansion. This module is the glue the
//! execution engine calls into; the actual per-operator logic lives in
//! `expansion/*`.

use crate::ast::types::{
    ArithmeticExpansionPart, ArithmeticExpressionNode, BraceItem, BraceRangeValue, CaseDirection,
    CommandSubstitutionPart, DoubleQuotedPart, EscapedPart, GlobPart, InnerParameterOperation,
    LiteralPart, ParameterExpansionPart, ParameterOperation, PatternAnchor, ScriptNode,
    SingleQuotedPart, TransformOperator, WordNode, WordPart,
};
use crate::interpreter::arithmetic::evaluate_arithmetic;
use crate::interpreter::expansion::{
    apply_case_modification, apply_pattern_removal_op, apply_pattern_replacement_op,
    apply_substring_op, apply_transform_op, expand_brace_range, get_array_keys,
    get_parameter_length, get_var_names_with_prefix_op, get_variable, handle_nameref_array_expansion,
    handle_simple_array_expansion, parse_array_reference, pattern_to_regex, ParameterOpContext,
    RangeValue, should_use_alternative, should_use_default,
};
use crate::interpreter::helpers::get_ifs;
use crate::interpreter::interpreter::FileSystem as SyncFileSystem;
use crate::interpreter::types::{ExecResult, ExecutionLimits, InterpreterContext, InterpreterState};

// Re-export commonly used expansion functions
pub use crate::interpreter::expansion::analysis::*;
pub use crate::interpreter::expansion::brace_range::*;
pub use crate::interpreter::expansion::glob_escape::*;
pub use crate::interpreter::expansion::pattern::*;
pub use crate::interpreter::expansion::pattern_removal::*;
pub use crate::interpreter::expansion::quoting::*;
pub use crate::interpreter::expansion::tilde::*;
pub use crate::interpreter::expansion::variable::*;
pub use crate::interpreter::expansion::word_split::*;

/// Result of word expansion.
#[derive(Debug, Clone)]
pub struct WordExpansionResult {
    /// The expanded string value
    pub value: String,
    /// Whether the expansion produced multiple words (from word splitting,
    /// brace expansion, or `"${arr[@]}"` splicing)
    pub split_words: Option<Vec<String>>,
    /// Any stderr output from command substitutions
    pub stderr: String,
    /// Exit code from command substitutions (if any)
    pub exit_code: Option<i32>,
}

impl WordExpansionResult {
    /// Create a simple result with just a value.
    pub fn simple(value: String) -> Self {
        Self { value, split_words: None, stderr: String::new(), exit_code: None }
    }

    /// Create a result with split words.
    pub fn with_split(value: String, words: Vec<String>) -> Self {
        Self { value, split_words: Some(words), stderr: String::new(), exit_code: None }
    }
}

/// Options for word expansion.
#[derive(Debug, Clone, Default)]
pub struct WordExpansionOptions {
    /// Whether we're inside double quotes
    pub in_double_quotes: bool,
    /// Whether to perform word splitting
    pub do_word_split: bool,
    /// Whether to perform glob expansion
    pub do_glob: bool,
    /// Whether to preserve empty fields
    pub preserve_empty: bool,
    /// Whether extglob is enabled
    pub extglob: bool,
}

/// Callback type for command substitution execution.
///
/// The runtime provides this callback to run a parsed command-substitution
/// body (`$(...)`/backtick) against the real interpreter state.
pub type CommandSubstitutionFn = Box<dyn Fn(&ScriptNode, &mut InterpreterState) -> ExecResult + Send + Sync>;

/// Borrowed callback type for command substitution, used by call sites that
/// already hold a `&mut InterpreterState` and don't need to box the closure.
pub type CommandSubstFn<'a> = &'a dyn Fn(&ScriptNode, &mut InterpreterState) -> ExecResult;

/// Expand a word for use as a command name or other non-splitting context
/// (assignment right-hand sides, case patterns, ...).
///
/// Brace expansion and `"${arr[@]}"` splicing can still produce more than one
/// field; when they do, the extra fields show up in `split_words` even though
/// IFS splitting itself does not run.
pub fn expand_word(
    state: &mut InterpreterState,
    word: &WordNode,
    command_subst: Option<CommandSubstFn>,
) -> WordExpansionResult {
    let options = WordExpansionOptions::default();
    expand_word_core(state, word, &options, command_subst, None)
}

/// Expand a word the way bash expands command arguments: brace/tilde/
/// parameter/command/arithmetic expansion, IFS word splitting when unquoted,
/// followed by pathname expansion against `fs` when provided.
pub fn expand_word_with_glob(
    state: &mut InterpreterState,
    word: &WordNode,
    command_subst: Option<CommandSubstFn>,
    fs: Option<&dyn SyncFileSystem>,
) -> WordExpansionResult {
    let options = WordExpansionOptions { do_word_split: true, do_glob: true, ..WordExpansionOptions::default() };
    expand_word_core(state, word, &options, command_subst, fs)
}

/// Expand a word without glob expansion (parameter/command/arithmetic
/// expansion plus optional IFS splitting, per `options`).
pub fn expand_word_no_glob(
    state: &InterpreterState,
    word: &WordNode,
    options: &WordExpansionOptions,
) -> WordExpansionResult {
    // Callers of this entry point only have a shared `&InterpreterState`
    // (e.g. tests exercising pure parameter expansion), so arithmetic side
    // effects and assignment-default writes can't be observed here. Real
    // call sites from the execution engine go through `expand_word_core`
    // via `expand_word`/`expand_word_with_glob` instead.
    let mut state = state.clone();
    expand_word_core(&mut state, word, options, None, None)
}

struct PartExpansion {
    value: String,
    splittable: bool,
    quoted: bool,
    stderr: String,
    exit_code: Option<i32>,
}

/// Core expansion pipeline shared by every public entry point: brace
/// expansion, then (per brace alternative) array splicing or per-part
/// expansion + IFS splitting, then pathname expansion.
fn expand_word_core(
    state: &mut InterpreterState,
    word: &WordNode,
    options: &WordExpansionOptions,
    command_subst: Option<CommandSubstFn>,
    fs: Option<&dyn SyncFileSystem>,
) -> WordExpansionResult {
    let alternatives = expand_braces_in_word(word);

    let mut whole_values: Vec<String> = Vec::with_capacity(alternatives.len());
    let mut all_fields: Vec<String> = Vec::new();
    let mut stderr = String::new();
    let mut exit_code = None;

    for alt in &alternatives {
        if let Some(arr) = handle_simple_array_expansion(state, &alt.parts)
            .or_else(|| handle_nameref_array_expansion(state, &alt.parts))
        {
            whole_values.push(arr.values.join(" "));
            all_fields.extend(arr.values);
            continue;
        }

        let mut whole = String::new();
        let mut segments: Vec<WordSplitSegment> = Vec::with_capacity(alt.parts.len());
        for part in &alt.parts {
            let expanded = expand_part(state, part, options, command_subst);
            whole.push_str(&expanded.value);
            segments.push(WordSplitSegment {
                value: expanded.value,
                is_splittable: expanded.splittable,
                is_quoted: expanded.quoted,
            });
            if !expanded.stderr.is_empty() {
                stderr.push_str(&expanded.stderr);
            }
            if expanded.exit_code.is_some() {
                exit_code = expanded.exit_code;
            }
        }

        let mut fields = if options.do_word_split && !is_word_fully_quoted(alt) {
            smart_word_split(&segments, get_ifs(&state.env)).words
        } else {
            vec![whole.clone()]
        };

        if options.do_glob {
            if let Some(fs) = fs {
                if !is_word_fully_quoted(alt) && word_has_glob_pattern(alt, options.extglob) {
                    fields = fields
                        .into_iter()
                        .flat_map(|field| glob_expand_field(fs, &state.cwd, field))
                        .collect();
                }
            }
        }

        whole_values.push(whole);
        all_fields.extend(fields);
    }

    let value = whole_values.join(" ");
    let split_words = if all_fields.len() != 1 || all_fields.first() != Some(&value) {
        Some(all_fields)
    } else {
        None
    };

    WordExpansionResult { value, split_words, stderr, exit_code }
}

/// Expand a single glob-eligible field against `fs`, falling back to the
/// literal field when it matches nothing (bash's default, non-`nullglob`
/// behavior).
fn glob_expand_field(fs: &dyn SyncFileSystem, cwd: &str, field: String) -> Vec<String> {
    if !has_glob_pattern(&field, false) {
        return vec![unescape_glob_pattern(&field)];
    }
    match fs.glob(&field, cwd) {
        Ok(mut matches) if !matches.is_empty() => {
            matches.sort();
            matches
        }
        _ => vec![unescape_glob_pattern(&field)],
    }
}

/// Expand a word into a single concatenated string (no splitting, no glob).
/// Used for the nested words inside parameter-expansion operations (default
/// values, patterns, replacements).
fn expand_word_to_string(
    state: &mut InterpreterState,
    word: &WordNode,
    command_subst: Option<CommandSubstFn>,
) -> (String, String, Option<i32>) {
    let options = WordExpansionOptions { in_double_quotes: true, ..WordExpansionOptions::default() };
    let mut value = String::new();
    let mut stderr = String::new();
    let mut exit_code = None;
    for part in &word.parts {
        let expanded = expand_part(state, part, &options, command_subst);
        value.push_str(&expanded.value);
        if !expanded.stderr.is_empty() {
            stderr.push_str(&expanded.stderr);
        }
        if expanded.exit_code.is_some() {
            exit_code = expanded.exit_code;
        }
    }
    (value, stderr, exit_code)
}

/// Expand every brace-expansion alternative of a word into its own
/// `WordNode`, handling nested braces and multiple brace groups in the same
/// word (`{a,b}{1,2}`) via cartesian product.
fn expand_braces_in_word(word: &WordNode) -> Vec<WordNode> {
    let Some(idx) = word.parts.iter().position(|p| matches!(p, WordPart::BraceExpansion(_))) else {
        return vec![word.clone()];
    };
    let WordPart::BraceExpansion(brace) = &word.parts[idx] else { unreachable!() };

    let mut substitutions: Vec<Vec<WordPart>> = Vec::new();
    for item in &brace.items {
        match item {
            BraceItem::Word { word: item_word } => {
                for variant in expand_braces_in_word(item_word) {
                    substitutions.push(variant.parts);
                }
            }
            BraceItem::Range { start, end, step, start_str, end_str } => {
                let range = expand_brace_range(
                    to_range_value(start),
                    to_range_value(end),
                    *step,
                    start_str.as_deref(),
                    end_str.as_deref(),
                );
                match range {
                    Ok(result) => match result.expanded {
                        Some(values) => {
                            for v in values {
                                substitutions.push(vec![WordPart::Literal(LiteralPart { value: v })]);
                            }
                        }
                        None => {
                            substitutions.push(vec![WordPart::Literal(LiteralPart { value: result.literal })]);
                        }
                    },
                    Err(_) => {
                        substitutions.push(vec![WordPart::Literal(LiteralPart { value: String::new() })]);
                    }
                }
            }
        }
    }

    let mut results = Vec::new();
    for sub in substitutions {
        let mut new_parts = Vec::with_capacity(word.parts.len() - 1 + sub.len());
        new_parts.extend_from_slice(&word.parts[..idx]);
        new_parts.extend(sub);
        new_parts.extend_from_slice(&word.parts[idx + 1..]);
        results.extend(expand_braces_in_word(&WordNode { parts: new_parts }));
    }
    results
}

fn to_range_value(v: &BraceRangeValue) -> RangeValue {
    match v {
        BraceRangeValue::Number(n) => RangeValue::Numeric(*n),
        BraceRangeValue::Char(c) => RangeValue::Char(*c),
    }
}

/// Expand a single word part.
fn expand_part(
    state: &mut InterpreterState,
    part: &WordPart,
    options: &WordExpansionOptions,
    command_subst: Option<CommandSubstFn>,
) -> PartExpansion {
    match part {
        WordPart::Literal(LiteralPart { value }) => {
            PartExpansion { value: value.clone(), splittable: false, quoted: false, stderr: String::new(), exit_code: None }
        }
        WordPart::SingleQuoted(SingleQuotedPart { value }) => {
            PartExpansion { value: value.clone(), splittable: false, quoted: true, stderr: String::new(), exit_code: None }
        }
        WordPart::Escaped(EscapedPart { value }) => {
            PartExpansion { value: value.clone(), splittable: false, quoted: true, stderr: String::new(), exit_code: None }
        }
        WordPart::TildeExpansion(tilde) => {
            let tilde_str = match &tilde.user {
                Some(u) => format!("~{}", u),
                None => "~".to_string(),
            };
            let value = if options.in_double_quotes { tilde_str } else { apply_tilde_expansion(state, &tilde_str) };
            PartExpansion { value, splittable: false, quoted: false, stderr: String::new(), exit_code: None }
        }
        WordPart::DoubleQuoted(DoubleQuotedPart { parts }) => {
            let inner_options = WordExpansionOptions { in_double_quotes: true, ..options.clone() };
            let mut value = String::new();
            let mut stderr = String::new();
            let mut exit_code = None;
            for inner in parts {
                let expanded = expand_part(state, inner, &inner_options, command_subst);
                value.push_str(&expanded.value);
                if !expanded.stderr.is_empty() {
                    stderr.push_str(&expanded.stderr);
                }
                if expanded.exit_code.is_some() {
                    exit_code = expanded.exit_code;
                }
            }
            PartExpansion { value, splittable: false, quoted: true, stderr, exit_code }
        }
        WordPart::ParameterExpansion(param) => {
            let (value, stderr, exit_code) = expand_parameter(state, param, options.in_double_quotes, options.extglob, command_subst);
            PartExpansion { value, splittable: !options.in_double_quotes, quoted: options.in_double_quotes, stderr, exit_code }
        }
        WordPart::CommandSubstitution(CommandSubstitutionPart { body, .. }) => {
            let (value, stderr, exit_code) = match command_subst {
                Some(exec) => {
                    let result = exec(body, state);
                    (result.stdout.trim_end_matches('\n').to_string(), result.stderr, Some(result.exit_code))
                }
                None => (String::new(), String::new(), None),
            };
            PartExpansion { value, splittable: !options.in_double_quotes, quoted: options.in_double_quotes, stderr, exit_code }
        }
        WordPart::ArithmeticExpansion(ArithmeticExpansionPart { expression, .. }) => {
            let value = eval_arith_expr(state, &expression.expression).to_string();
            PartExpansion { value, splittable: !options.in_double_quotes, quoted: options.in_double_quotes, stderr: String::new(), exit_code: None }
        }
        WordPart::Glob(GlobPart { pattern }) => {
            PartExpansion { value: pattern.clone(), splittable: false, quoted: false, stderr: String::new(), exit_code: None }
        }
        WordPart::BraceExpansion(brace) => {
            // Only reached when brace expansion occurs inside a context that
            // didn't run `expand_braces_in_word` first (e.g. nested inside a
            // DoubleQuoted part, where bash does not brace-expand). Fall back
            // to the first alternative's literal text.
            let value = brace
                .items
                .first()
                .map(|item| match item {
                    BraceItem::Word { word } => word.parts.iter().map(|p| literal_fallback(p)).collect(),
                    BraceItem::Range { start_str, end_str, start, end, .. } => {
                        let s = start_str.clone().unwrap_or_else(|| start.to_string());
                        let e = end_str.clone().unwrap_or_else(|| end.to_string());
                        format!("{{{}..{}}}", s, e)
                    }
                })
                .unwrap_or_default();
            PartExpansion { value, splittable: false, quoted: false, stderr: String::new(), exit_code: None }
        }
        WordPart::ProcessSubstitution(_) => {
            PartExpansion { value: String::new(), splittable: false, quoted: false, stderr: String::new(), exit_code: None }
        }
    }
}

fn literal_fallback(part: &WordPart) -> String {
    match part {
        WordPart::Literal(l) => l.value.clone(),
        WordPart::SingleQuoted(s) => s.value.clone(),
        WordPart::Escaped(e) => e.value.clone(),
        _ => String::new(),
    }
}

fn eval_arith_expr(state: &mut InterpreterState, expr: &crate::ast::types::ArithExpr) -> i64 {
    let limits = ExecutionLimits::default();
    let mut ctx = InterpreterContext::new(state, &limits);
    evaluate_arithmetic(&mut ctx, expr, true, None).unwrap_or(0)
}

fn eval_arith_node(state: &mut InterpreterState, node: &ArithmeticExpressionNode) -> i64 {
    eval_arith_expr(state, &node.expression)
}

/// Array-target parameter like `arr[@]`/`arr[*]`: returns the array name and
/// whether it used `*` (joined with IFS) rather than `@` (kept separate).
fn array_target(parameter: &str) -> Option<(String, bool)> {
    parse_array_reference(parameter)
}

/// Dispatch a `${parameter...}`/`$parameter` expansion through the real
/// operation handlers in `expansion/*`.
fn expand_parameter(
    state: &mut InterpreterState,
    param: &ParameterExpansionPart,
    in_double_quotes: bool,
    extglob: bool,
    command_subst: Option<CommandSubstFn>,
) -> (String, String, Option<i32>) {
    match &param.operation {
        None => (get_variable(state, &param.parameter), String::new(), None),
        Some(ParameterOperation::Inner(inner)) => {
            expand_inner_op(state, &param.parameter, inner, in_double_quotes, extglob, command_subst)
        }
        Some(ParameterOperation::Indirection(ind)) => {
            expand_indirection(state, &param.parameter, ind, in_double_quotes, extglob, command_subst)
        }
        Some(ParameterOperation::ArrayKeys(ak)) => {
            let ifs = get_ifs(&state.env).chars().next().map(|c| c.to_string()).unwrap_or_default();
            let keys = get_array_keys(state, &ak.array, ak.star);
            let value = if ak.star { keys.join(&ifs) } else { keys.join(" ") };
            (value, String::new(), None)
        }
        Some(ParameterOperation::VarNamePrefix(vp)) => {
            let names = get_var_names_with_prefix_op(state, &vp.prefix, vp.star);
            (names.join(" "), String::new(), None)
        }
    }
}

fn expand_inner_op(
    state: &mut InterpreterState,
    parameter: &str,
    op: &InnerParameterOperation,
    in_double_quotes: bool,
    extglob: bool,
    command_subst: Option<CommandSubstFn>,
) -> (String, String, Option<i32>) {
    let ctx = ParameterOpContext::new(state, parameter, in_double_quotes);
    match op {
        InnerParameterOperation::DefaultValue(d) => {
            if should_use_default(&ctx, d.check_empty) {
                expand_word_to_string(state, &d.word, command_subst)
            } else {
                (ctx.value, String::new(), None)
            }
        }
        InnerParameterOperation::AssignDefault(d) => {
            if should_use_default(&ctx, d.check_empty) {
                let (value, stderr, exit_code) = expand_word_to_string(state, &d.word, command_subst);
                state.env.insert(parameter.to_string(), value.clone());
                (value, stderr, exit_code)
            } else {
                (ctx.value, String::new(), None)
            }
        }
        InnerParameterOperation::ErrorIfUnset(e) => {
            if should_use_default(&ctx, e.check_empty) {
                let message = match &e.word {
                    Some(word) => expand_word_to_string(state, word, command_subst).0,
                    None => "parameter null or not set".to_string(),
                };
                (String::new(), format!("{}: {}\n", parameter, message), Some(1))
            } else {
                (ctx.value, String::new(), None)
            }
        }
        InnerParameterOperation::UseAlternative(a) => {
            if should_use_alternative(&ctx, a.check_empty) {
                expand_word_to_string(state, &a.word, command_subst)
            } else {
                (String::new(), String::new(), None)
            }
        }
        InnerParameterOperation::Length(_) => (get_parameter_length(state, parameter).to_string(), String::new(), None),
        InnerParameterOperation::LengthSliceError(_) => {
            (String::new(), format!("{}: substring expression < 0\n", parameter), Some(1))
        }
        InnerParameterOperation::BadSubstitution(b) => {
            (String::new(), format!("{}: bad substitution\n", b.text), Some(1))
        }
        InnerParameterOperation::Substring(s) => {
            let offset = eval_arith_node(state, &s.offset);
            let length = s.length.as_ref().map(|l| eval_arith_node(state, l));
            match apply_substring_op(&ctx.value, offset, length) {
                Ok(value) => (value, String::new(), None),
                Err(_) => (String::new(), String::new(), None),
            }
        }
        InnerParameterOperation::PatternRemoval(p) => {
            let (pattern, _, _) = expand_word_to_string(state, &p.pattern, command_subst);
            let regex = pattern_to_regex(&pattern, p.greedy, extglob);
            (apply_pattern_removal_op(&ctx.value, &regex, p.side, p.greedy), String::new(), None)
        }
        InnerParameterOperation::PatternReplacement(p) => {
            let (pattern, _, _) = expand_word_to_string(state, &p.pattern, command_subst);
            let replacement = match &p.replacement {
                Some(word) => expand_word_to_string(state, word, command_subst).0,
                None => String::new(),
            };
            let regex = pattern_to_regex(&pattern, true, extglob);
            let (anchor_start, anchor_end) = match p.anchor {
                Some(PatternAnchor::Start) => (true, false),
                Some(PatternAnchor::End) => (false, true),
                None => (false, false),
            };
            (
                apply_pattern_replacement_op(&ctx.value, &regex, &replacement, p.all, anchor_start, anchor_end),
                String::new(),
                None,
            )
        }
        InnerParameterOperation::CaseModification(c) => {
            let op_str = match (c.direction, c.all) {
                (CaseDirection::Upper, true) => "^^",
                (CaseDirection::Upper, false) => "^",
                (CaseDirection::Lower, true) => ",,",
                (CaseDirection::Lower, false) => ",",
            };
            (apply_case_modification(&ctx.value, op_str), String::new(), None)
        }
        InnerParameterOperation::Transform(t) => {
            let op_str = match t.operator {
                TransformOperator::Q => "Q",
                TransformOperator::P => "P",
                TransformOperator::A => "a",
                TransformOperator::LowerA => "a",
                TransformOperator::E => "E",
                TransformOperator::K => "K",
                TransformOperator::LowerK => "k",
                TransformOperator::LowerU => "u",
                TransformOperator::U => "U",
                TransformOperator::L => "L",
            };
            (apply_transform_op(state, parameter, &ctx.value, op_str), String::new(), None)
        }
    }
}

/// `${!ref}` indirect expansion: `ref`'s value names the variable (or
/// `arr[@]`/`arr[*]` array reference) to actually expand.
fn expand_indirection(
    state: &mut InterpreterState,
    parameter: &str,
    ind: &crate::ast::types::IndirectionOp,
    in_double_quotes: bool,
    extglob: bool,
    command_subst: Option<CommandSubstFn>,
) -> (String, String, Option<i32>) {
    let ref_name = get_variable(state, parameter);
    if ref_name.is_empty() {
        return (String::new(), String::new(), None);
    }
    if let Some((array_name, is_star)) = array_target(&ref_name) {
        let joined = get_variable(state, &format!("{}[{}]", array_name, if is_star { "*" } else { "@" }));
        return (joined, String::new(), None);
    }
    match &ind.inner_op {
        Some(inner) => expand_inner_op(state, &ref_name, inner, in_double_quotes, extglob, command_subst),
        None => (get_variable(state, &ref_name), String::new(), None),
    }
}

/// Check if a word is "fully quoted" - meaning glob characters should be treated literally.
///
/// A word is fully quoted if all its parts are either:
/// - SingleQuoted
/// - DoubleQuoted (entirely quoted variable expansion like "$pat")
/// - Escaped characters
pub fn is_word_fully_quoted(word: &WordNode) -> bool {
    use crate::interpreter::helpers::word_parts::is_quoted_part;

    // Empty word is considered quoted (matches empty pattern literally)
    if word.parts.is_empty() {
        return true;
    }

    // Check if we have any unquoted parts with actual content
    for part in &word.parts {
        if !is_quoted_part(part) {
            return false;
        }
    }
    true
}

/// Check if a word contains any glob patterns.
pub fn word_has_glob_pattern(word: &WordNode, extglob: bool) -> bool {
    use crate::interpreter::expansion::glob_escape::has_glob_pattern;

    for part in &word.parts {
        match part {
            WordPart::Glob(_) => return true,
            WordPart::Literal(lit) => {
                if has_glob_pattern(&lit.value, extglob) {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// Check if a word contains command substitution.
pub fn word_has_command_substitution(word: &WordNode) -> bool {
    for part in &word.parts {
        if matches!(part, WordPart::CommandSubstitution(_)) {
            return true;
        }
        if let WordPart::DoubleQuoted(dq) = part {
            for inner in &dq.parts {
                if matches!(inner, WordPart::CommandSubstitution(_)) {
                    return true;
                }
            }
        }
    }
    false
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::CommandSubstitutionPart;

    fn make_literal_word(s: &str) -> WordNode {
        WordNode { parts: vec![WordPart::Literal(LiteralPart { value: s.to_string() })] }
    }

    fn make_var_word(name: &str) -> WordNode {
        WordNode {
            parts: vec![WordPart::ParameterExpansion(ParameterExpansionPart {
                parameter: name.to_string(),
                operation: None,
            })],
        }
    }

    #[test]
    fn test_expand_word_literal() {
        let mut state = InterpreterState::default();
        let word = make_literal_word("hello");
        let result = expand_word(&mut state, &word, None);
        assert_eq!(result.value, "hello");
    }

    #[test]
    fn test_expand_word_variable() {
        let mut state = InterpreterState::default();
        state.env.insert("FOO".to_string(), "bar".to_string());
        let word = make_var_word("FOO");
        let result = expand_word(&mut state, &word, None);
        assert_eq!(result.value, "bar");
    }

    #[test]
    fn test_expand_word_unset_variable() {
        let mut state = InterpreterState::default();
        let word = make_var_word("UNSET");
        let result = expand_word(&mut state, &word, None);
        assert_eq!(result.value, "");
    }

    #[test]
    fn test_is_word_fully_quoted_empty() {
        let word = WordNode { parts: vec![] };
        assert!(is_word_fully_quoted(&word));
    }

    #[test]
    fn test_is_word_fully_quoted_single_quoted() {
        let word = WordNode { parts: vec![WordPart::SingleQuoted(SingleQuotedPart { value: "hello".to_string() })] };
        assert!(is_word_fully_quoted(&word));
    }

    #[test]
    fn test_is_word_fully_quoted_literal() {
        let word = make_literal_word("hello");
        assert!(!is_word_fully_quoted(&word));
    }

    #[test]
    fn test_word_has_glob_pattern() {
        let word = WordNode { parts: vec![WordPart::Glob(GlobPart { pattern: "*.txt".to_string() })] };
        assert!(word_has_glob_pattern(&word, false));

        let word = make_literal_word("hello");
        assert!(!word_has_glob_pattern(&word, false));
    }

    #[test]
    fn test_word_has_command_substitution() {
        let word = WordNode {
            parts: vec![WordPart::CommandSubstitution(CommandSubstitutionPart {
                body: ScriptNode { statements: vec![] },
                legacy: false,
            })],
        };
        assert!(word_has_command_substitution(&word));

        let word = make_literal_word("hello");
        assert!(!word_has_command_substitution(&word));
    }

    #[test]
    fn test_expand_word_command_substitution() {
        let mut state = InterpreterState::default();
        let word = WordNode {
            parts: vec![WordPart::CommandSubstitution(CommandSubstitutionPart {
                body: ScriptNode { statements: vec![] },
                legacy: false,
            })],
        };
        let exec: CommandSubstFn = &|_body, _state| ExecResult::new("hi\n".to_string(), String::new(), 0);
        let result = expand_word(&mut state, &word, Some(exec));
        assert_eq!(result.value, "hi");
    }

    #[test]
    fn test_expand_parameter_default_value() {
        use crate::ast::types::{DefaultValueOp, InnerParameterOperation, ParameterOperation};

        let mut state = InterpreterState::default();
        let word = WordNode {
            parts: vec![WordPart::ParameterExpansion(ParameterExpansionPart {
                parameter: "x".to_string(),
                operation: Some(ParameterOperation::Inner(InnerParameterOperation::DefaultValue(DefaultValueOp {
                    word: make_literal_word("fallback"),
                    check_empty: true,
                }))),
            })],
        };
        let result = expand_word(&mut state, &word, None);
        assert_eq!(result.value, "fallback");
    }

    #[test]
    fn test_expand_parameter_length() {
        use crate::ast::types::{InnerParameterOperation, LengthOp, ParameterOperation};

        let mut state = InterpreterState::default();
        state.env.insert("x".to_string(), "hello".to_string());
        let word = WordNode {
            parts: vec![WordPart::ParameterExpansion(ParameterExpansionPart {
                parameter: "x".to_string(),
                operation: Some(ParameterOperation::Inner(InnerParameterOperation::Length(LengthOp))),
            })],
        };
        let result = expand_word(&mut state, &word, None);
        assert_eq!(result.value, "5");
    }

    #[test]
    fn test_expand_parameter_pattern_removal() {
        use crate::ast::types::{InnerParameterOperation, ParameterOperation, PatternRemovalOp, PatternRemovalSide};

        let mut state = InterpreterState::default();
        state.env.insert("x".to_string(), "foo.txt".to_string());
        let word = WordNode {
            parts: vec![WordPart::ParameterExpansion(ParameterExpansionPart {
                parameter: "x".to_string(),
                operation: Some(ParameterOperation::Inner(InnerParameterOperation::PatternRemoval(PatternRemovalOp {
                    pattern: make_literal_word(".txt"),
                    side: PatternRemovalSide::Suffix,
                    greedy: false,
                }))),
            })],
        };
        let result = expand_word(&mut state, &word, None);
        assert_eq!(result.value, "foo");
    }

    #[test]
    fn test_expand_parameter_substring() {
        use crate::ast::types::{ArithExpr, ArithNumberNode, InnerParameterOperation, ParameterOperation, SubstringOp};

        let mut state = InterpreterState::default();
        state.env.insert("x".to_string(), "hello world".to_string());
        let offset = ArithmeticExpressionNode {
            expression: ArithExpr::Number(ArithNumberNode { value: 6 }),
            original_text: None,
        };
        let word = WordNode {
            parts: vec![WordPart::ParameterExpansion(ParameterExpansionPart {
                parameter: "x".to_string(),
                operation: Some(ParameterOperation::Inner(InnerParameterOperation::Substring(SubstringOp {
                    offset,
                    length: None,
                }))),
            })],
        };
        let result = expand_word(&mut state, &word, None);
        assert_eq!(result.value, "world");
    }

    #[test]
    fn test_expand_array_at_splices_into_multiple_fields() {
        let mut state = InterpreterState::default();
        state.env.insert("arr_0".to_string(), "one".to_string());
        state.env.insert("arr_1".to_string(), "two".to_string());

        let word = WordNode {
            parts: vec![WordPart::DoubleQuoted(DoubleQuotedPart {
                parts: vec![WordPart::ParameterExpansion(ParameterExpansionPart {
                    parameter: "arr[@]".to_string(),
                    operation: None,
                })],
            })],
        };
        let result = expand_word_with_glob(&mut state, &word, None, None);
        assert_eq!(result.split_words, Some(vec!["one".to_string(), "two".to_string()]));
    }

    #[test]
    fn test_expand_word_with_glob_splits_on_ifs() {
        let mut state = InterpreterState::default();
        state.env.insert("x".to_string(), "a b c".to_string());
        let word = make_var_word("x");
        let result = expand_word_with_glob(&mut state, &word, None, None);
        assert_eq!(result.split_words, Some(vec!["a".to_string(), "b".to_string(), "c".to_string()]));
    }

    #[test]
    fn test_brace_expansion_produces_multiple_fields() {
        let word = WordNode {
            parts: vec![WordPart::BraceExpansion(crate::ast::types::BraceExpansionPart {
                items: vec![
                    BraceItem::Word { word: make_literal_word("a") },
                    BraceItem::Word { word: make_literal_word("b") },
                ],
            })],
        };
        let mut state = InterpreterState::default();
        let result = expand_word(&mut state, &word, None);
        assert_eq!(result.split_words, Some(vec!["a".to_string(), "b".to_string()]));
    }
}
