use std::sync::LazyLock;

use regex::Regex;

static DECLARATION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(\blocal\s+)?\bfunction\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(")
        .inspect_err(|e| tracing::error!(error = %e, "function declaration pattern does not compile"))
        .ok()
});

/// Names of global functions declared in `source`, in declaration order.
///
/// This is a lexical scan, not a parse: declarations inside comments or
/// strings are picked up too, and functions assigned any other way
/// (`name = function() end`, `function t.name()`) are missed. `local`
/// functions are skipped since they are never globals.
pub fn discover(source: &str) -> Vec<String> {
    let Some(re) = DECLARATION.as_ref() else {
        return Vec::new();
    };

    let mut names: Vec<String> = Vec::new();
    for caps in re.captures_iter(source) {
        if caps.get(1).is_some() {
            continue;
        }
        let Some(name) = caps.get(2).map(|m| m.as_str()) else {
            continue;
        };
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}
