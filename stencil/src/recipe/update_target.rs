//! Update targets: splice compiled template text into an existing file at a matched line.
//!
//! The insertion point comes from one forward scan over the file's lines:
//!
//! - Without a stop condition, the first line matching `insertAtLineMatching` wins.
//! - With a stop condition, scanning continues past matches and halts at the first line
//!   matching `stopSearchAtLineMatching`; the last match seen (that line included) wins.
//! - `before` inserts at the matched line, `after` at the line following it.
//! - No match at all is a failure and the file is left untouched.

use std::path::PathBuf;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::schema::{decode, entry_name, non_empty, parse_list, Reasons};
use super::{ApplyContext, LoadOptions};
use crate::error::{SchemaError, TargetError};
use crate::symbol::{resolve_workspace_root, substitute, SymbolMap};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUpdateTarget {
    name: Option<String>,
    path: Option<String>,
    insert_criteria: Option<RawInsertCriteria>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInsertCriteria {
    position: Option<String>,
    match_mode: Option<String>,
    insert_at_line_matching: Option<String>,
    stop_search_at_line_matching: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertPosition {
    Before,
    After,
}

impl InsertPosition {
    fn parse(text: &str) -> Option<Self> {
        match text {
            "before" => Some(Self::Before),
            "after" => Some(Self::After),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchMode {
    /// Line contains the text literally.
    String,
    /// Line matches the regular expression anywhere.
    Regex,
}

impl MatchMode {
    fn parse(text: &str) -> Option<Self> {
        match text {
            "string" | "useString" => Some(Self::String),
            "regex" | "useRegex" => Some(Self::Regex),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertCriteria {
    pub position: InsertPosition,
    pub match_mode: MatchMode,
    pub insert_at_line_matching: String,
    pub stop_search_at_line_matching: Option<String>,
}

#[derive(Clone, Debug)]
enum LineMatcher {
    Literal(String),
    Pattern(Regex),
    /// Regex text that only compiles once its symbols are substituted. Matches nothing.
    Deferred,
}

impl LineMatcher {
    fn new(mode: MatchMode, text: &str) -> Result<Self, regex::Error> {
        Ok(match mode {
            MatchMode::String => LineMatcher::Literal(text.to_string()),
            MatchMode::Regex => LineMatcher::Pattern(Regex::new(text)?),
        })
    }

    /// Builds the matcher at load time.
    ///
    /// A regex that fails to compile as written is accepted when it compiles with every known
    /// symbol replaced by a plain word; it is then compiled for real after substitution.
    fn load(mode: MatchMode, text: &str, symbols: &[String]) -> Result<Self, regex::Error> {
        let err = match LineMatcher::new(mode, text) {
            Ok(matcher) => return Ok(matcher),
            Err(e) => e,
        };
        let mut trial = text.to_string();
        let mut replaced = false;
        for symbol in symbols.iter().filter(|s| !s.is_empty()) {
            if trial.contains(symbol.as_str()) {
                trial = trial.replace(symbol.as_str(), "symbol");
                replaced = true;
            }
        }
        if !replaced {
            return Err(err);
        }
        LineMatcher::new(mode, &trial).map(|_| LineMatcher::Deferred)
    }

    fn is_deferred(&self) -> bool {
        matches!(self, LineMatcher::Deferred)
    }

    fn is_match(&self, line: &str) -> bool {
        match self {
            LineMatcher::Literal(text) => line.contains(text.as_str()),
            LineMatcher::Pattern(re) => re.is_match(line),
            LineMatcher::Deferred => false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct UpdateTarget {
    pub name: String,
    pub path: String,
    pub insert_criteria: InsertCriteria,
    line_matcher: LineMatcher,
    stop_matcher: Option<LineMatcher>,
}

impl UpdateTarget {
    pub fn from_value(value: &Value, options: &LoadOptions) -> Result<UpdateTarget, SchemaError> {
        Self::from_value_with_symbols(value, options, &[])
    }

    /// Like [`from_value`](Self::from_value), but regex match strings may contain any of
    /// `symbols` even where the raw token is not valid regex syntax (e.g. `{{NAME}}`).
    pub fn from_value_with_symbols(
        value: &Value,
        options: &LoadOptions,
        symbols: &[String],
    ) -> Result<UpdateTarget, SchemaError> {
        let raw: RawUpdateTarget = decode("update target", value)?;
        let mut reasons = Reasons::new();
        let name = reasons.require("name", raw.name);
        let path = reasons.require("path", raw.path);

        let Some(criteria) = raw.insert_criteria else {
            reasons.push("missing 'insertCriteria'");
            return Err(reasons.into_error("update target", entry_name(value)));
        };

        let position = reasons.require("insertCriteria.position", criteria.position);
        let position = InsertPosition::parse(&position).unwrap_or_else(|| {
            if !position.is_empty() {
                reasons.push(format!("'position' must be 'before' or 'after', got '{}'", position));
            }
            InsertPosition::Before
        });
        let mode = reasons.require("insertCriteria.matchMode", criteria.match_mode);
        let match_mode = MatchMode::parse(&mode).unwrap_or_else(|| {
            if !mode.is_empty() {
                reasons.push(format!("'matchMode' must be 'string' or 'regex', got '{}'", mode));
            }
            MatchMode::String
        });
        let insert_at = reasons.require(
            "insertCriteria.insertAtLineMatching",
            criteria.insert_at_line_matching,
        );
        let stop_at = non_empty(criteria.stop_search_at_line_matching);

        let line_matcher = LineMatcher::load(match_mode, &insert_at, symbols).unwrap_or_else(|e| {
            reasons.push(format!("invalid 'insertAtLineMatching': {}", e));
            LineMatcher::Literal(String::new())
        });
        let stop_matcher = stop_at.as_deref().and_then(|stop| {
            LineMatcher::load(match_mode, stop, symbols)
                .map_err(|e| reasons.push(format!("invalid 'stopSearchAtLineMatching': {}", e)))
                .ok()
        });

        let root = options.workspace_root.as_deref();
        reasons.into_result("update target", entry_name(value), || UpdateTarget {
            name,
            path: resolve_workspace_root(&path, root),
            insert_criteria: InsertCriteria {
                position,
                match_mode,
                insert_at_line_matching: insert_at,
                stop_search_at_line_matching: stop_at,
            },
            line_matcher,
            stop_matcher,
        })
    }

    /// Converts every valid entry; `symbols` are the recipe's input symbols.
    pub fn parse(values: &[Value], options: &LoadOptions, symbols: &[String]) -> Vec<UpdateTarget> {
        parse_list(values, |v| UpdateTarget::from_value_with_symbols(v, options, symbols))
    }

    /// Substitutes symbols into the path and both match strings, in place.
    ///
    /// Matchers are rebuilt when substitution changed their text or when they were deferred at
    /// load; a regex that does not compile after substitution is an error.
    pub fn transform_symbols(&mut self, symbols: &SymbolMap) -> Result<(), TargetError> {
        self.path = substitute(&self.path, symbols, &[]);
        let mode = self.insert_criteria.match_mode;

        let insert_at = substitute(&self.insert_criteria.insert_at_line_matching, symbols, &[]);
        if insert_at != self.insert_criteria.insert_at_line_matching || self.line_matcher.is_deferred()
        {
            self.line_matcher = compile_matcher(mode, &insert_at)?;
            self.insert_criteria.insert_at_line_matching = insert_at;
        }
        if let Some(stop) = &self.insert_criteria.stop_search_at_line_matching {
            let substituted = substitute(stop, symbols, &[]);
            let deferred = self.stop_matcher.as_ref().is_some_and(LineMatcher::is_deferred);
            if &substituted != stop || deferred {
                self.stop_matcher = Some(compile_matcher(mode, &substituted)?);
                self.insert_criteria.stop_search_at_line_matching = Some(substituted);
            }
        }
        Ok(())
    }

    /// Index at which new content is inserted into `lines`, or `None` when no line matches.
    pub fn find_insert_index<S: AsRef<str>>(&self, lines: &[S]) -> Option<usize> {
        let mut found = None;
        for (index, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            if self.line_matcher.is_match(line) {
                found = Some(index);
                if self.stop_matcher.is_none() {
                    break;
                }
            }
            if let Some(stop) = &self.stop_matcher {
                if stop.is_match(line) {
                    break;
                }
            }
        }
        found.map(|index| match self.insert_criteria.position {
            InsertPosition::Before => index,
            InsertPosition::After => index + 1,
        })
    }

    /// Returns `original` with `content` inserted as one block at the insert index.
    ///
    /// Line endings of `original` are normalized to `\n`; `content` is inserted verbatim.
    pub fn splice(&self, original: &str, content: &str) -> Option<String> {
        let normalized = original.replace("\r\n", "\n");
        let mut lines: Vec<&str> = normalized.split('\n').collect();
        let index = self.find_insert_index(&lines)?;
        lines.insert(index, content);
        Some(lines.join("\n"))
    }

    /// Opens the file for edit (when a VCS collaborator is configured), inserts `content` and
    /// rewrites the file. Each call inserts again; the operation is not idempotent.
    pub async fn generate(
        &mut self,
        content: &str,
        symbols: &SymbolMap,
        ctx: &ApplyContext<'_>,
    ) -> Result<PathBuf, TargetError> {
        self.transform_symbols(symbols)?;
        let path = PathBuf::from(&self.path);

        if let Some(vcs) = ctx.vcs {
            vcs.prepare_for_edit(&path, ctx.changelist)
                .await
                .map_err(|source| TargetError::Vcs {
                    operation: "open for edit",
                    path: path.clone(),
                    source,
                })?;
        }

        let original = ctx
            .fs
            .read_to_string(&path)
            .await
            .map_err(|source| TargetError::Read {
                path: path.clone(),
                source,
            })?;
        let updated = self
            .splice(&original, content)
            .ok_or_else(|| TargetError::NoInsertPoint {
                path: path.clone(),
                pattern: self.insert_criteria.insert_at_line_matching.clone(),
            })?;
        ctx.fs
            .write(&path, &updated)
            .await
            .map_err(|source| TargetError::Write {
                path: path.clone(),
                source,
            })?;
        tracing::info!(target_name = %self.name, path = %path.display(), "updated file");
        Ok(path)
    }
}

fn compile_matcher(mode: MatchMode, text: &str) -> Result<LineMatcher, TargetError> {
    LineMatcher::new(mode, text).map_err(|source| TargetError::Pattern {
        pattern: text.to_string(),
        source,
    })
}
