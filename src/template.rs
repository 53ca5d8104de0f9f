//! Placeholder extraction and substitution for prompt content.
//!
//! A placeholder is `{{` followed by one or more characters other than `}`,
//! closed by `}}`. The captured name is trimmed, so `{{ topic }}` and
//! `{{topic}}` refer to the same variable. Nesting is not supported: the
//! first `}` after an opening `{{` ends the name.
//!
//! Both entry points are pure and total. Malformed input never fails, it just
//! contains no placeholders.

use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Bullet that prefixes each variable in the copy legend.
pub const LEGEND_BULLET: &str = "• ";
/// Marker shown next to each variable in the copy legend.
pub const LEGEND_BLANK: &str = "____";

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{([^}]+)\}\}").expect("placeholder pattern is valid"))
}

/// Return the unique placeholder names in `content`, in order of first
/// occurrence.
///
/// Accepts `&str` or `Option<&str>`; absent or empty content yields an empty
/// list.
pub fn extract_variables<'a>(content: impl Into<Option<&'a str>>) -> Vec<String> {
    let Some(content) = content.into() else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut variables = Vec::new();
    for caps in placeholder_regex().captures_iter(content) {
        let name = caps[1].trim();
        if seen.insert(name.to_string()) {
            variables.push(name.to_string());
        }
    }
    variables
}

/// Values bound to variable names for one compile.
///
/// Names are trimmed on insert so lookups agree with [`extract_variables`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    values: BTreeMap<String, String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind every name to the empty string.
    ///
    /// Compiling against a blank binding clears all of those placeholders.
    pub fn blank<S: AsRef<str>>(names: &[S]) -> Self {
        let mut bindings = Self::new();
        for name in names {
            bindings.insert(name.as_ref(), "");
        }
        bindings
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.trim().to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name.trim()).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Overlay `other` on top of `self`, replacing values for shared names.
    pub fn merge(&mut self, other: &Bindings) {
        for (name, value) in &other.values {
            self.values.insert(name.clone(), value.clone());
        }
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bindings = Bindings::new();
        for (name, value) in iter {
            bindings.insert(name.as_ref(), value);
        }
        bindings
    }
}

/// Substitute bound values into `content`.
///
/// Every occurrence of a bound placeholder is replaced; placeholders without
/// a binding are copied through untouched. Names are looked up as literal
/// strings and values are inserted verbatim, so neither is ever interpreted
/// as pattern syntax. Substitution is a single pass: a value that itself
/// contains `{{...}}` is not expanded again.
pub fn compile(content: &str, bindings: &Bindings) -> String {
    placeholder_regex()
        .replace_all(content, |caps: &Captures| match bindings.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Text to copy when a prompt is copied without explicit values.
///
/// Content with variables gets a legend listing each one, then a blank line,
/// then the untouched content. Content without variables is returned as is.
pub fn copy_preview(content: &str) -> String {
    let variables = extract_variables(content);
    if variables.is_empty() {
        return content.to_string();
    }

    let legend: Vec<String> = variables
        .iter()
        .map(|name| format!("{}{}: {}", LEGEND_BULLET, name, LEGEND_BLANK))
        .collect();
    format!("{}\n\n{}", legend.join("\n"), content)
}
