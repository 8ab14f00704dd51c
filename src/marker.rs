//! Annotation markers embedded in fixture files.
//!
//! A marker is a `//` line comment whose first word is one of the five
//! recognized tags, followed by double-quoted arguments:
//!
//! ```text
//! func Foo() {} // item "Foo" "Foo" "func Foo()" "func"
//! // diag "x declared and not used"
//! var x int
//! f.Ba // complete "Bar" "Baz"
//! // format
//! // godef "use_site" "decl_site"
//! ```
//!
//! A trailing marker anchors to its own line: the anchor point is the column
//! just past the last code character (where a completion cursor would sit).
//! A standalone marker anchors to the next line that is neither blank nor a
//! comment-only line; the anchor point is that line's first non-blank
//! column. `item` markers anchor to a token instead of a point: the first
//! whole-word occurrence of the alias name on the anchor line, falling back
//! to the line's first identifier.
//!
//! Comments whose first word is not a recognized tag are plain comments and
//! are ignored. A recognized tag with malformed arguments is a fatal fixture
//! error; a broken fixture must never produce a verdict.

use rustc_hash::FxHashMap;
use std::path::Path;
use tower_lsp::lsp_types::CompletionItemKind;

use crate::error::HarnessError;
use crate::types::{completion_kind, SourcePosition, SourceRange};

const TAGS: [&str; 5] = ["item", "diag", "complete", "format", "godef"];

/// One parsed annotation, with its positional arguments already resolved
/// against the fixture text. Alias references (`complete`, `godef`) stay
/// symbolic until the second extraction pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Marker {
    /// `item "name"` declares an alias for the anchored token; the
    /// four-argument form additionally describes a completion item.
    Item {
        alias: String,
        spec: Option<ItemSpec>,
        range: SourceRange,
    },
    /// `diag "message"`; an empty message means "no diagnostics in this
    /// file".
    Diag {
        position: SourcePosition,
        message: String,
    },
    /// `complete "a1" .. "an"`: completion at the anchor point must return
    /// the items declared for those aliases, in order.
    Complete {
        position: SourcePosition,
        aliases: Vec<String>,
    },
    /// `format`: this file is format-checked against the reference
    /// formatter.
    Format { position: SourcePosition },
    /// `godef "src" "target"`: definition at `src`'s range start must
    /// resolve to `target`'s range.
    GoDef {
        position: SourcePosition,
        source_alias: String,
        target_alias: String,
    },
}

/// The completion-item half of a four-argument `item` marker.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSpec {
    pub label: String,
    pub detail: String,
    pub kind: CompletionItemKind,
}

/// Alias table built during the first extraction pass; read-only afterwards.
#[derive(Debug, Default)]
pub struct AliasTable {
    map: FxHashMap<String, SourceRange>,
}

impl AliasTable {
    pub fn get(&self, name: &str) -> Option<&SourceRange> {
        self.map.get(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Pass 1: register every `item` alias. Must complete over the whole tree
/// before any alias reference is resolved, since `complete` and `godef` may
/// reference aliases declared later (or in other files). Duplicate names are
/// a fatal fixture error: silent shadowing would let a typo produce a
/// misleading verdict.
pub fn register_aliases(markers: &[Marker]) -> Result<AliasTable, HarnessError> {
    let mut table = AliasTable::default();
    for marker in markers {
        if let Marker::Item { alias, range, .. } = marker {
            if let Some(previous) = table.map.insert(alias.clone(), range.clone()) {
                return Err(HarnessError::fixture(
                    range.file(),
                    range.start.line,
                    format!(
                        "duplicate alias \"{alias}\" (first declared at {})",
                        previous.start
                    ),
                ));
            }
        }
    }
    tracing::debug!("registered {} aliases", table.len());
    Ok(table)
}

/// Parses every marker in one exported fixture file.
pub fn parse_file(path: &Path, text: &str) -> Result<Vec<Marker>, HarnessError> {
    let lines: Vec<&str> = text.lines().collect();
    let mut markers = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let Some((code, tag, rest)) = split_marker(line) else {
            continue;
        };
        let line_no = (idx + 1) as u32;
        let args = parse_args(rest)
            .map_err(|reason| HarnessError::fixture(path, line_no, format!("{tag}: {reason}")))?;
        let anchor = resolve_anchor(path, &lines, idx, code)?;
        markers.push(build_marker(path, line_no, tag, args, anchor)?);
    }

    tracing::debug!("{}: {} markers", path.display(), markers.len());
    Ok(markers)
}

/// Where a marker's expectation attaches in the fixture.
struct Anchor {
    /// 1-based anchor line.
    line: u32,
    /// Code text of the anchor line (any trailing comment removed).
    text: String,
    /// 1-based anchor point column.
    column: u32,
}

fn build_marker(
    path: &Path,
    marker_line: u32,
    tag: &str,
    args: Vec<String>,
    anchor: Anchor,
) -> Result<Marker, HarnessError> {
    let argc = args.len();
    let arity_err = |expected: &str| {
        HarnessError::fixture(
            path,
            marker_line,
            format!("{tag} takes {expected}, got {argc} argument(s)"),
        )
    };
    let position = SourcePosition::new(path, anchor.line, anchor.column);

    match tag {
        "item" => {
            if args.len() != 1 && args.len() != 4 {
                return Err(arity_err("1 (alias) or 4 (alias, label, detail, kind) arguments"));
            }
            let alias = args[0].clone();
            let range = alias_range(path, marker_line, &anchor, &alias)?;
            let spec = if args.len() == 4 {
                let kind = completion_kind(&args[3]).ok_or_else(|| {
                    HarnessError::fixture(
                        path,
                        marker_line,
                        format!("unknown completion kind \"{}\"", args[3]),
                    )
                })?;
                Some(ItemSpec {
                    label: args[1].clone(),
                    detail: args[2].clone(),
                    kind,
                })
            } else {
                None
            };
            Ok(Marker::Item { alias, spec, range })
        }
        "diag" => {
            if args.len() != 1 {
                return Err(arity_err("exactly 1 argument (message)"));
            }
            Ok(Marker::Diag {
                position,
                message: args.into_iter().next().unwrap_or_default(),
            })
        }
        "complete" => Ok(Marker::Complete {
            position,
            aliases: args,
        }),
        "format" => {
            if !args.is_empty() {
                return Err(arity_err("no arguments"));
            }
            Ok(Marker::Format { position })
        }
        "godef" => {
            if args.len() != 2 {
                return Err(arity_err("exactly 2 arguments (source alias, target alias)"));
            }
            let mut args = args.into_iter();
            let source_alias = args.next().unwrap_or_default();
            let target_alias = args.next().unwrap_or_default();
            Ok(Marker::GoDef {
                position,
                source_alias,
                target_alias,
            })
        }
        _ => unreachable!("split_marker only yields recognized tags"),
    }
}

/// The span an `item` alias names: the alias itself when it occurs as a
/// whole word on the anchor line, else the line's first identifier.
fn alias_range(
    path: &Path,
    marker_line: u32,
    anchor: &Anchor,
    alias: &str,
) -> Result<SourceRange, HarnessError> {
    let (start, len) = find_word(&anchor.text, alias)
        .map(|at| (at, alias.len()))
        .or_else(|| first_identifier(&anchor.text))
        .ok_or_else(|| {
            HarnessError::fixture(
                path,
                marker_line,
                format!("no token on line {} to anchor alias \"{alias}\" to", anchor.line),
            )
        })?;
    let start_col = (start + 1) as u32;
    Ok(SourceRange::new(
        SourcePosition::new(path, anchor.line, start_col),
        SourcePosition::new(path, anchor.line, start_col + len as u32),
    ))
}

fn resolve_anchor(
    path: &Path,
    lines: &[&str],
    marker_idx: usize,
    code: &str,
) -> Result<Anchor, HarnessError> {
    if !code.trim().is_empty() {
        // Trailing marker: point sits just past the last code character.
        return Ok(Anchor {
            line: (marker_idx + 1) as u32,
            text: code.to_string(),
            column: (code.trim_end().len() + 1) as u32,
        });
    }

    for (offset, candidate) in lines[marker_idx + 1..].iter().enumerate() {
        let trimmed = candidate.trim_start();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }
        let text = match candidate.find("//") {
            Some(at) => &candidate[..at],
            None => candidate,
        };
        let first_code = candidate.len() - trimmed.len();
        return Ok(Anchor {
            line: (marker_idx + 1 + offset + 1) as u32,
            text: text.to_string(),
            column: (first_code + 1) as u32,
        });
    }

    Err(HarnessError::fixture(
        path,
        (marker_idx + 1) as u32,
        "standalone marker has no following code line to anchor to",
    ))
}

/// Recognizes a marker comment on `line`. Every `//` occurrence is tried so
/// that a `//` inside a string literal earlier on the line does not hide a
/// real marker after it.
fn split_marker(line: &str) -> Option<(&str, &str, &str)> {
    for (at, _) in line.match_indices("//") {
        let body = line[at + 2..].trim_start();
        let Some(tag) = body.split_whitespace().next() else {
            continue;
        };
        if TAGS.contains(&tag) {
            return Some((&line[..at], tag, &body[tag.len()..]));
        }
    }
    None
}

/// Parses the whitespace-separated, double-quoted argument list after a tag.
/// No escape sequences; anything that is not a quoted string is malformed.
fn parse_args(rest: &str) -> Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut remaining = rest.trim_start();
    while !remaining.is_empty() {
        let Some(body) = remaining.strip_prefix('"') else {
            let token: String = remaining.split_whitespace().next().unwrap_or("").to_string();
            return Err(format!("expected quoted argument, found `{token}`"));
        };
        let Some(close) = body.find('"') else {
            return Err("unterminated string argument".to_string());
        };
        args.push(body[..close].to_string());
        remaining = body[close + 1..].trim_start();
    }
    Ok(args)
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Byte offset of the first whole-word occurrence of `word` in `text`.
fn find_word(text: &str, word: &str) -> Option<usize> {
    if word.is_empty() {
        return None;
    }
    let bytes = text.as_bytes();
    let mut from = 0;
    while let Some(at) = text[from..].find(word).map(|i| from + i) {
        let before_ok = at == 0 || !is_ident_byte(bytes[at - 1]);
        let end = at + word.len();
        let after_ok = end >= bytes.len() || !is_ident_byte(bytes[end]);
        if before_ok && after_ok {
            return Some(at);
        }
        from = at + 1;
    }
    None
}

/// Byte offset and length of the first identifier-like token in `text`.
fn first_identifier(text: &str) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_alphabetic() || b == b'_' {
            let start = i;
            while i < bytes.len() && is_ident_byte(bytes[i]) {
                i += 1;
            }
            return Some((start, i - start));
        }
        if is_ident_byte(b) {
            // Digit run that is not an identifier start: skip it whole.
            while i < bytes.len() && is_ident_byte(bytes[i]) {
                i += 1;
            }
        } else {
            i += 1;
        }
    }
    None
}
