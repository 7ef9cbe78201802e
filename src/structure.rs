#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Heuristic checks that a Python-style submission uses the constructs a
//! level asks for (a function, a loop, ...).

use std::collections::BTreeMap;

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Searched constructs and the patterns that detect them.
    static ref PATTERNS: Vec<(&'static str, Regex)> = [
        ("def", r"def\s+\w+\s*\("),
        ("class", r"class\s+\w+\s*:"),
        ("for", r"for\s+.+ in "),
        ("while", r"while\s+.+:"),
        ("if", r"if\s+.+:"),
        ("import", r"import\s+\w+"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("valid regex")))
    .collect();
}

/// Label used when reporting a missing construct.
fn label(structure: &str) -> &str {
    match structure {
        "def" => "function definition",
        "class" => "class definition",
        "for" => "for loop",
        "while" => "while loop",
        "loop" => "loop",
        "if" => "conditional statement",
        "import" => "import statement",
        other => other,
    }
}

/// Whether `code` contains each requested construct.
///
/// Keys are the concrete constructs searched for; `loop` searches both `for`
/// and `while`. Unknown names are not searched and have no key.
pub fn check_structures<S: AsRef<str>>(code: &str, required: &[S]) -> BTreeMap<String, bool> {
    let wanted = |name: &str| {
        required.iter().any(|r| {
            let r: &str = r.as_ref();
            r == name || (r == "loop" && matches!(name, "for" | "while"))
        })
    };

    PATTERNS
        .iter()
        .filter(|(name, _)| wanted(name))
        .map(|(name, re)| (name.to_string(), re.is_match(code)))
        .collect()
}

/// Constructs from `required` that `code` lacks, in request order.
fn missing<'a, S: AsRef<str>>(code: &str, required: &'a [S]) -> Vec<&'a str> {
    let found = check_structures(code, required);
    let has = |name: &str| found.get(name).copied().unwrap_or(false);
    required
        .iter()
        .filter_map(|r| {
            let name: &str = r.as_ref();
            let absent = match name {
                "loop" => !has("for") && !has("while"),
                other => !has(other),
            };
            absent.then_some(name)
        })
        .collect()
}

/// Whether `code` contains every construct in `required`.
pub fn validate_required_structures<S: AsRef<str>>(code: &str, required: &[S]) -> bool {
    missing(code, required).is_empty()
}

/// A sentence naming the missing constructs, or an empty string when
/// nothing is missing.
pub fn missing_structures_message<S: AsRef<str>>(code: &str, required: &[S]) -> String {
    let missing = missing(code, required);
    if missing.is_empty() {
        return String::new();
    }
    format!(
        "Missing required structures: {}",
        missing.into_iter().map(label).join(", ")
    )
}
