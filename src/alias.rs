//! Placeholder alias expansion for path templates.
//!
//! Config paths may carry placeholder tokens (`<lang>`, `<density>`, ...).
//! Each alias maps one token to one or more replacement values, and
//! [`resolve`] expands a template into every combination of those values.
//!
//! ## Expansion order
//!
//! The result order is deterministic: aliases are applied in order of their
//! *leftmost* occurrence in the template (ties broken by their order in the
//! alias list), and the value combinations are emitted depth-first. For
//!
//! ```text
//! template: "<root>/images/<dir>/<language>/test.jpg"
//! <root>     = myHome
//! <dir>      = mum, dad
//! <language> = en, de
//! ```
//!
//! the result is:
//!
//! ```text
//! myHome/images/mum/en/test.jpg
//! myHome/images/mum/de/test.jpg
//! myHome/images/dad/en/test.jpg
//! myHome/images/dad/de/test.jpg
//! ```
//!
//! Token syntax is free-form — an alias name is any substring, and every
//! occurrence of it is substituted at once. Degenerate alias sets can
//! therefore produce duplicate outputs; those are preserved, not deduped.

/// A named placeholder token and its ordered replacement values.
///
/// Invariant: `values` is never empty once the config is normalized — a
/// scalar JSON value is coerced to a one-element list on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasDef {
    /// Placeholder token as it appears in templates, e.g. `<lang>`.
    pub name: String,
    /// Replacement values, order-significant.
    pub values: Vec<String>,
}

impl AliasDef {
    pub fn new(name: &str, values: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// Expand `text` into all placeholder-substituted variants.
///
/// Aliases whose token does not occur in `text` are ignored. If none occur,
/// the result is `vec![text]`. Substitution replaces *all* occurrences of a
/// token in one step, so a token appearing twice yields the same value in
/// both positions within a single variant.
pub fn resolve(text: &str, aliases: &[AliasDef]) -> Vec<String> {
    // Leftmost occurrence first; stable sort keeps the alias-list order for
    // tokens starting at the same index (substring-of-substring tokens).
    let mut applicable: Vec<&AliasDef> = aliases.iter().filter(|a| text.contains(&a.name)).collect();
    applicable.sort_by_key(|a| text.find(&a.name));

    if applicable.is_empty() {
        return vec![text.to_string()];
    }

    let mut results = Vec::new();
    expand(text, &applicable, 0, &mut results);
    results
}

/// Depth-first walk of the value combinations for `aliases[index..]`.
fn expand(text: &str, aliases: &[&AliasDef], index: usize, results: &mut Vec<String>) {
    for value in &aliases[index].values {
        let substituted = text.replace(&aliases[index].name, value);
        if index + 1 == aliases.len() {
            results.push(substituted);
        } else {
            expand(&substituted, aliases, index + 1, results);
        }
    }
}
