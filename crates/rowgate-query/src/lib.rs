//! Accessor-name grammar and query-spec compiler for Rowgate.
//!
//! `rowgate-query` is the **naming-convention layer**. It turns accessor
//! names like `getAllByAgeOrderByNameDescLimit10From5` into backend-agnostic
//! query specs:
//!
//! - [`normalize`] converts capitalized field tokens to column names.
//! - [`parse`] matches a name against the ordered grammar and extracts an
//!   [`AccessorDescriptor`].
//! - [`build`] zips the descriptor with positional [`Arg`]s into a
//!   [`rowgate_core::QuerySpec`].
//! - [`AccessorCache`] memoizes parsed descriptors per distinct name.
//!
//! The resulting specs execute through the `StorageBackend` trait from
//! `rowgate-core`. Most users go through the `rowgate` facade crate's
//! `Repository`, which drives this pipeline on every dynamic call.

pub mod accessor;
pub mod cache;
pub mod normalize;
pub mod spec;

pub use accessor::{AccessorDescriptor, AccessorKind, parse};
pub use cache::AccessorCache;
pub use normalize::{normalize, split_fields};
pub use spec::{Arg, build};

/// Build an argument list for a dynamic accessor call.
///
/// Each element is converted with [`Arg::from`], so plain values and raw
/// [`rowgate_core::Predicate`] conditions can be mixed as the accessor
/// requires.
///
/// # Example
///
/// ```
/// use rowgate_query::{Arg, args};
///
/// let list = args!["admin", true];
/// assert_eq!(list.len(), 2);
/// assert!(matches!(list[0], Arg::Value(_)));
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Arg::from($arg)),+]
    };
}
