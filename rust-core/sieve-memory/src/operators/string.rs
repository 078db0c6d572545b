// SPDX-License-Identifier: PMPL-1.0-or-later
//! Pattern and substring operators over the textual form of a value.

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

use regex::RegexBuilder;

use sieve_core::operators as names;
use sieve_core::{OperatorError, Value};

use crate::operator::{required, MemoryOperator};

/// Source, case-insensitive flag and dot-matches-newline flag.
type PatternKey = (String, bool, bool);

/// Compiled condition patterns, so a search compiles each pattern once
/// rather than once per record.
static PATTERNS: LazyLock<Mutex<HashMap<PatternKey, regex::Regex>>> = LazyLock::new(Default::default);

const PATTERN_CACHE_LIMIT: usize = 256;

fn compiled(source: String, case_insensitive: bool, dot_all: bool) -> Result<regex::Regex, regex::Error> {
    let key = (source, case_insensitive, dot_all);
    if let Some(regex) = PATTERNS.lock().ok().and_then(|cache| cache.get(&key).cloned()) {
        return Ok(regex);
    }

    let regex = RegexBuilder::new(&key.0)
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(dot_all)
        .build()?;
    if let Ok(mut cache) = PATTERNS.lock() {
        if cache.len() >= PATTERN_CACHE_LIMIT {
            cache.clear();
        }
        cache.insert(key, regex.clone());
    }
    Ok(regex)
}

/// Translate an SQL LIKE pattern into an anchored regex. `%` matches any
/// run of characters and `_` exactly one; everything else is literal.
fn like_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    for ch in pattern.chars() {
        match ch {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    out.push('$');
    out
}

/// `like`, `not_like` and `ilike`.
pub struct Like {
    name: &'static str,
    negated: bool,
    case_insensitive: bool,
}

impl Like {
    pub const ALL: [Like; 3] = [
        Like {
            name: names::LIKE,
            negated: false,
            case_insensitive: false,
        },
        Like {
            name: names::NOT_LIKE,
            negated: true,
            case_insensitive: false,
        },
        Like {
            name: names::ILIKE,
            negated: false,
            case_insensitive: true,
        },
    ];
}

impl MemoryOperator for Like {
    fn name(&self) -> &str {
        self.name
    }

    fn evaluate(&self, field: &Value, value: Option<&Value>, _value_type: Option<&str>) -> Result<bool, OperatorError> {
        // NULL LIKE anything is unknown, which never matches.
        if field.is_null() {
            return Ok(false);
        }
        let pattern = required(value, self.name)?.to_string();
        let regex = compiled(like_pattern(&pattern), self.case_insensitive, true)
            .map_err(|e| OperatorError::InvalidArgument(e.to_string()))?;
        Ok(regex.is_match(&field.to_string()) != self.negated)
    }
}

#[derive(Clone, Copy)]
enum Position {
    Anywhere,
    Start,
    End,
}

/// `contains`, `startswith`, `endswith` and their case-insensitive forms.
pub struct Substring {
    name: &'static str,
    position: Position,
    case_insensitive: bool,
}

impl Substring {
    pub const ALL: [Substring; 6] = [
        Substring {
            name: names::CONTAINS,
            position: Position::Anywhere,
            case_insensitive: false,
        },
        Substring {
            name: names::ICONTAINS,
            position: Position::Anywhere,
            case_insensitive: true,
        },
        Substring {
            name: names::STARTSWITH,
            position: Position::Start,
            case_insensitive: false,
        },
        Substring {
            name: names::ISTARTSWITH,
            position: Position::Start,
            case_insensitive: true,
        },
        Substring {
            name: names::ENDSWITH,
            position: Position::End,
            case_insensitive: false,
        },
        Substring {
            name: names::IENDSWITH,
            position: Position::End,
            case_insensitive: true,
        },
    ];
}

impl MemoryOperator for Substring {
    fn name(&self) -> &str {
        self.name
    }

    fn evaluate(&self, field: &Value, value: Option<&Value>, _value_type: Option<&str>) -> Result<bool, OperatorError> {
        if field.is_null() {
            return Ok(false);
        }
        let (mut haystack, mut needle) = (field.to_string(), required(value, self.name)?.to_string());
        if self.case_insensitive {
            haystack = haystack.to_lowercase();
            needle = needle.to_lowercase();
        }
        Ok(match self.position {
            Position::Anywhere => haystack.contains(&needle),
            Position::Start => haystack.starts_with(&needle),
            Position::End => haystack.ends_with(&needle),
        })
    }
}

/// `regex` and `iregex`: unanchored search. An invalid pattern never matches.
pub struct Regex {
    name: &'static str,
    case_insensitive: bool,
}

impl Regex {
    pub const CASE_SENSITIVE: Regex = Regex {
        name: names::REGEX,
        case_insensitive: false,
    };
    pub const CASE_INSENSITIVE: Regex = Regex {
        name: names::IREGEX,
        case_insensitive: true,
    };
}

impl MemoryOperator for Regex {
    fn name(&self) -> &str {
        self.name
    }

    fn evaluate(&self, field: &Value, value: Option<&Value>, _value_type: Option<&str>) -> Result<bool, OperatorError> {
        if field.is_null() {
            return Ok(false);
        }
        let pattern = required(value, self.name)?.to_string();
        match compiled(pattern, self.case_insensitive, false) {
            Ok(regex) => Ok(regex.is_match(&field.to_string())),
            Err(_) => Ok(false),
        }
    }
}
