//! HTML-entity preprocessing for LLM-generated script text.
//!
//! A concession to LLM outputs that sometimes HTML-escape shell operators
//! (`&amp;&amp;` instead of `&&`). Applied before lexing when
//! `BashOptions.unescape_html` is set; never touches single-quoted content,
//! since there the entity text is presumably meant literally.

const ENTITIES: &[(&str, char)] = &[
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&amp;", '&'),
    ("&quot;", '"'),
    ("&#39;", '\''),
];

/// Replace HTML entities with their ASCII equivalents outside single-quoted
/// regions of `script`.
pub fn unescape_html_entities(script: &str) -> String {
    let mut result = String::with_capacity(script.len());
    let mut in_single_quote = false;
    let chars: Vec<char> = script.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            in_single_quote = !in_single_quote;
            result.push(c);
            i += 1;
            continue;
        }

        if !in_single_quote && c == '&' {
            let rest: String = chars[i..].iter().take(6).collect();
            if let Some(&(entity, replacement)) = ENTITIES.iter().find(|(e, _)| rest.starts_with(e)) {
                result.push(replacement);
                i += entity.chars().count();
                continue;
            }
        }

        result.push(c);
        i += 1;
    }

    result
}
