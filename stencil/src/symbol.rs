//! Symbol substitution: literal find/replace of operator answers into paths and template text.
//!
//! Keys are plain tokens (e.g. `$NAME$`, `{{class}}`), never patterns, so a key containing
//! regex metacharacters matches only its own literal text.

use std::path::Path;

use indexmap::IndexMap;

/// Placeholder replaced by the workspace root when recipes are loaded.
pub const WORKSPACE_SYMBOL: &str = "${workspace}";

/// Ordered mapping from symbol name to replacement value.
///
/// Built fresh for every recipe run from the operator's answers. Inserting a key that already
/// exists overwrites its value and keeps its original position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymbolMap {
    entries: IndexMap<String, String>,
}

impl SymbolMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `symbol` to `value`, returning the previous value when the key was already present.
    pub fn insert(&mut self, symbol: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(symbol.into(), value.into())
    }

    pub fn get(&self, symbol: &str) -> Option<&str> {
        self.entries.get(symbol).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for SymbolMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = SymbolMap::new();
        map.extend(iter);
        map
    }
}

impl<K, V> Extend<(K, V)> for SymbolMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// Replaces every literal occurrence of each symbol in `text` with its value.
///
/// When `allow_list` is non-empty only symbols named in it are replaced. Symbols are applied
/// in map order, each over the output of the previous one. Empty text yields an empty string.
pub fn substitute(text: &str, symbols: &SymbolMap, allow_list: &[String]) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut out = text.to_string();
    for (key, value) in symbols.iter() {
        // An empty pattern would match between every character.
        if key.is_empty() {
            continue;
        }
        if !allow_list.is_empty() && !allow_list.iter().any(|allowed| allowed == key) {
            continue;
        }
        if out.contains(key) {
            out = out.replace(key, value);
        }
    }
    out
}

/// Replaces [`WORKSPACE_SYMBOL`] in `path` with `workspace_root`.
///
/// Returns `path` unchanged when no root is known or the placeholder is absent.
pub fn resolve_workspace_root(path: &str, workspace_root: Option<&Path>) -> String {
    match workspace_root {
        Some(root) if path.contains(WORKSPACE_SYMBOL) => {
            path.replace(WORKSPACE_SYMBOL, &root.to_string_lossy())
        }
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols() -> SymbolMap {
        [("$NAME$", "Widget"), ("$DIR$", "src/widgets")]
            .into_iter()
            .collect()
    }

    #[test]
    fn text_without_symbols_is_unchanged() {
        let text = "fn main() {}\n// nothing to see";
        assert_eq!(substitute(text, &symbols(), &[]), text);
    }

    #[test]
    fn replaces_every_occurrence_of_every_symbol() {
        let out = substitute("$DIR$/$NAME$.rs holds $NAME$", &symbols(), &[]);
        assert_eq!(out, "src/widgets/Widget.rs holds Widget");
    }

    #[test]
    fn substitution_is_idempotent_once_applied() {
        let once = substitute("struct $NAME$; // $DIR$", &symbols(), &[]);
        let twice = substitute(&once, &symbols(), &[]);
        assert_eq!(once, twice);
    }

    #[test]
    fn allow_list_restricts_replaced_keys() {
        let allow = vec!["$NAME$".to_string()];
        let out = substitute("$DIR$/$NAME$", &symbols(), &allow);
        assert_eq!(out, "$DIR$/Widget");
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let map: SymbolMap = [("(.*)", "x"), ("a+b", "y")].into_iter().collect();
        assert_eq!(substitute("aab (.*) a+b", &map, &[]), "aab x y");
    }

    #[test]
    fn empty_text_and_empty_key_are_harmless() {
        let map: SymbolMap = [("", "boom"), ("k", "v")].into_iter().collect();
        assert_eq!(substitute("", &map, &[]), "");
        assert_eq!(substitute("key", &map, &[]), "vey");
    }

    #[test]
    fn later_insert_overwrites_value_in_place() {
        let mut map = SymbolMap::new();
        map.insert("a", "1");
        map.insert("b", "2");
        assert_eq!(map.insert("a", "3"), Some("1".to_string()));
        let keys: Vec<_> = map.iter().collect();
        assert_eq!(keys, vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn workspace_root_is_resolved_when_known() {
        let root = Path::new("/work/project");
        assert_eq!(
            resolve_workspace_root("${workspace}/src/${workspace}", Some(root)),
            "/work/project/src//work/project"
        );
        assert_eq!(resolve_workspace_root("${workspace}/src", None), "${workspace}/src");
        assert_eq!(resolve_workspace_root("plain/path", Some(root)), "plain/path");
    }
}
