//! The accessor-name grammar and parser.
//!
//! An accessor name like `getAllByAgeOrderByNameDescLimit10From5` encodes a
//! whole query. This module matches such names against an ordered table of
//! patterns and extracts an [`AccessorDescriptor`]: the operation kind plus
//! the normalized field, ordering, and windowing tokens.
//!
//! Precedence is the order of [`PATTERNS`]; several patterns are prefixes
//! of others (`getAllByColumns` vs `getAllBy<Fields>`), so the first match
//! wins and the table order is part of the contract.

use crate::normalize::{normalize, split_fields};
use regex::Regex;
use rowgate_core::{Direction, Error, Result, SortKey};
use std::sync::LazyLock;

/// The operation a parsed accessor name denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorKind {
    /// Single row by equality conditions (or a raw condition)
    GetOne,
    /// All rows by equality conditions (or a raw condition, or none)
    GetAll,
    /// Single row by `LIKE` conditions
    GetLike,
    /// All rows by `LIKE` conditions
    GetAllLike,
    /// Count all rows
    Count,
    /// Count non-null values of one column — never a filter
    CountBy,
    /// Count distinct values of one column — never a filter
    CountDistinctBy,
    /// Delete rows by equality conditions
    RemoveBy,
}

impl AccessorKind {
    /// Whether results of this operation are records that belong in the
    /// identity map.
    pub const fn is_get(self) -> bool {
        matches!(
            self,
            AccessorKind::GetOne
                | AccessorKind::GetAll
                | AccessorKind::GetLike
                | AccessorKind::GetAllLike
        )
    }

    /// Whether conditions bind with `LIKE` instead of equality.
    pub const fn is_like(self) -> bool {
        matches!(self, AccessorKind::GetLike | AccessorKind::GetAllLike)
    }

    /// Whether this is one of the count operations.
    pub const fn is_count(self) -> bool {
        matches!(
            self,
            AccessorKind::Count | AccessorKind::CountBy | AccessorKind::CountDistinctBy
        )
    }

    /// Whether a single row (rather than a list) is returned.
    pub const fn is_single(self) -> bool {
        matches!(self, AccessorKind::GetOne | AccessorKind::GetLike)
    }
}

/// A parsed accessor name: operation kind plus normalized tokens.
///
/// An empty `fields` list means the caller supplies a raw condition as the
/// first positional argument (the `getAll` / `…ByColumns` family).
#[derive(Debug, Clone, PartialEq)]
pub struct AccessorDescriptor {
    /// The accessor name as supplied, kept for error reporting.
    pub accessor: String,
    pub kind: AccessorKind,
    /// Normalized column names, in the order they bind to arguments.
    pub fields: Vec<String>,
    /// Normalized ordering keys.
    pub order: Vec<SortKey>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

struct AccessorPattern {
    regex: Regex,
    kind: AccessorKind,
}

/// `<Fields>` capture: one or more capitalized words. Lazy, so optional
/// `OrderBy…`/`Limit…` suffixes are peeled off the right of the name.
const FIELDS: &str = r"(?P<fields>[A-Z][a-zA-Z0-9]+?)";

/// Optional `OrderBy<Fields>` and `Limit<N>[From<M>]` suffixes, anchored.
const SUFFIX: &str =
    r"(?:OrderBy(?P<order>[A-Z][a-zA-Z0-9]+?))?(?:Limit(?P<limit>[0-9]+)(?:From(?P<offset>[0-9]+))?)?$";

/// The grammar, in priority order. First match wins.
static PATTERNS: LazyLock<Vec<AccessorPattern>> = LazyLock::new(|| {
    let rule = |pattern: String, kind: AccessorKind| AccessorPattern {
        regex: Regex::new(&pattern).expect("accessor pattern table regex"),
        kind,
    };
    vec![
        rule(format!("^getAll{SUFFIX}"), AccessorKind::GetAll),
        rule(format!("^getByColumns{SUFFIX}"), AccessorKind::GetOne),
        rule(format!("^getAllByColumns{SUFFIX}"), AccessorKind::GetAll),
        rule(format!("^getBy{FIELDS}{SUFFIX}"), AccessorKind::GetOne),
        rule(format!("^getAllBy{FIELDS}{SUFFIX}"), AccessorKind::GetAll),
        rule(format!("^getLike{FIELDS}{SUFFIX}"), AccessorKind::GetLike),
        rule(
            format!("^getAllLike{FIELDS}{SUFFIX}"),
            AccessorKind::GetAllLike,
        ),
        rule("^count$".to_string(), AccessorKind::Count),
        rule(format!("^countBy{FIELDS}$"), AccessorKind::CountBy),
        rule(
            format!("^countDistinctBy{FIELDS}$"),
            AccessorKind::CountDistinctBy,
        ),
        rule(format!("^removeBy{FIELDS}{SUFFIX}"), AccessorKind::RemoveBy),
    ]
});

/// Parse an accessor name into a descriptor.
///
/// Fails with [`Error::UnrecognizedAccessor`] when no grammar rule matches.
pub fn parse(name: &str) -> Result<AccessorDescriptor> {
    for pattern in PATTERNS.iter() {
        let Some(caps) = pattern.regex.captures(name) else {
            continue;
        };

        let fields = caps
            .name("fields")
            .map(|m| split_fields(m.as_str()))
            .unwrap_or_default();
        let order = caps
            .name("order")
            .map(|m| split_order(m.as_str()))
            .unwrap_or_default();
        let limit = parse_number(name, caps.name("limit"))?;
        let offset = parse_number(name, caps.name("offset"))?;

        return Ok(AccessorDescriptor {
            accessor: name.to_string(),
            kind: pattern.kind,
            fields,
            order,
            limit,
            offset,
        });
    }

    Err(Error::UnrecognizedAccessor {
        name: name.to_string(),
    })
}

/// Split an `OrderBy` token list; a trailing `Desc` on a token flips the
/// direction of that key.
fn split_order(list: &str) -> Vec<SortKey> {
    list.split("And")
        .map(|token| match token.strip_suffix("Desc") {
            Some(rest) => SortKey {
                column: normalize(rest),
                direction: Direction::Desc,
            },
            None => SortKey {
                column: normalize(token),
                direction: Direction::Asc,
            },
        })
        .collect()
}

fn parse_number(name: &str, m: Option<regex::Match<'_>>) -> Result<Option<u64>> {
    match m {
        None => Ok(None),
        // the capture is all digits; only overflow can fail, and a limit
        // that large does not name a real accessor
        Some(m) => m.as_str().parse().map(Some).map_err(|_| {
            Error::UnrecognizedAccessor {
                name: name.to_string(),
            }
        }),
    }
}
