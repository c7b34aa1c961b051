//! Compiling descriptors plus call arguments into query specs.
//!
//! [`build`] is deterministic and touches no backend: it zips a parsed
//! [`AccessorDescriptor`] with the positional call arguments and produces
//! the [`QuerySpec`] a [`rowgate_core::StorageBackend`] executes.

use crate::accessor::{AccessorDescriptor, AccessorKind};
use rowgate_core::{
    ArgumentCountError, Clause, CompareOp, Error, Predicate, QuerySpec, Result, TypeError, Value,
};

/// One positional call argument.
///
/// Almost always a plain [`Value`] that binds to a field parsed from the
/// accessor name. The `getAll`/`getByColumns`/`getAllByColumns` accessors
/// instead take a single [`Arg::Condition`]: a raw [`Predicate`] passed
/// through to the backend untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A value bound to the matching parsed field.
    Value(Value),
    /// A raw where-condition (escape hatch for the `…Columns` accessors).
    Condition(Predicate),
}

impl From<Value> for Arg {
    fn from(v: Value) -> Self {
        Arg::Value(v)
    }
}

impl From<Predicate> for Arg {
    fn from(p: Predicate) -> Self {
        Arg::Condition(p)
    }
}

impl From<bool> for Arg {
    fn from(v: bool) -> Self {
        Arg::Value(Value::Bool(v))
    }
}

impl From<i32> for Arg {
    fn from(v: i32) -> Self {
        Arg::Value(Value::Int(i64::from(v)))
    }
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Arg::Value(Value::Int(v))
    }
}

impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Arg::Value(Value::Float(v))
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::Value(Value::Text(v.to_string()))
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Arg::Value(Value::Text(v))
    }
}

/// Build a query spec from a parsed descriptor and the call arguments.
///
/// For equality and `LIKE` accessors the Nth parsed field binds to the Nth
/// argument; a length mismatch fails with
/// [`Error::ArgumentCount`] before anything is bound. The count accessors
/// accept no arguments at all: `countBy`/`countDistinctBy` name the column
/// that is *counted*, never a filter.
pub fn build(desc: &AccessorDescriptor, args: Vec<Arg>) -> Result<QuerySpec> {
    let predicate = if desc.kind.is_count() {
        if !args.is_empty() {
            return Err(argument_count(desc, 0, args.len()));
        }
        Predicate::All
    } else if desc.fields.is_empty() {
        raw_condition(desc, args)?
    } else {
        zip_clauses(desc, args)?
    };

    let counted = match desc.kind {
        AccessorKind::CountBy | AccessorKind::CountDistinctBy => {
            if desc.fields.len() != 1 {
                return Err(Error::Type(TypeError {
                    expected: "a single counted column",
                    actual: format!("{} fields", desc.fields.len()),
                    context: Some(desc.accessor.clone()),
                }));
            }
            Some(desc.fields[0].clone())
        }
        _ => None,
    };

    Ok(QuerySpec {
        predicate,
        order: desc.order.clone(),
        limit: desc.limit,
        offset: desc.offset,
        counted,
        distinct: desc.kind == AccessorKind::CountDistinctBy,
    })
}

/// The `…Columns` family: the optional single argument *is* the condition.
fn raw_condition(desc: &AccessorDescriptor, args: Vec<Arg>) -> Result<Predicate> {
    if args.len() > 1 {
        return Err(argument_count(desc, 1, args.len()));
    }
    match args.into_iter().next() {
        None => Ok(Predicate::All),
        Some(Arg::Condition(predicate)) => Ok(predicate),
        Some(Arg::Value(v)) => Err(Error::Type(TypeError {
            expected: "a condition argument",
            actual: format!("a {} value", v.type_name()),
            context: Some(desc.accessor.clone()),
        })),
    }
}

/// Zip parsed fields with arguments into AND-conjoined clauses.
fn zip_clauses(desc: &AccessorDescriptor, args: Vec<Arg>) -> Result<Predicate> {
    if args.len() != desc.fields.len() {
        return Err(argument_count(desc, desc.fields.len(), args.len()));
    }

    let op = if desc.kind.is_like() {
        CompareOp::Like
    } else {
        CompareOp::Eq
    };

    let mut clauses = Vec::with_capacity(args.len());
    for (field, arg) in desc.fields.iter().zip(args) {
        let value = match arg {
            Arg::Value(v) => v,
            Arg::Condition(_) => {
                return Err(Error::Type(TypeError {
                    expected: "a plain value",
                    actual: "a condition argument".to_string(),
                    context: Some(desc.accessor.clone()),
                }));
            }
        };
        clauses.push(Clause {
            column: field.clone(),
            op,
            value,
        });
    }
    Ok(Predicate::Clauses(clauses))
}

fn argument_count(desc: &AccessorDescriptor, expected: usize, supplied: usize) -> Error {
    Error::ArgumentCount(ArgumentCountError {
        accessor: desc.accessor.clone(),
        expected,
        supplied,
    })
}
