//! Field-token normalization.

/// Convert a capitalized field token into its backend column name.
///
/// The first character is lower-cased; every other uppercase letter gets an
/// underscore inserted before it and is lower-cased. Consecutive capitals
/// each get their own underscore — `"ID"` becomes `"i_d"`, not `"id"`.
/// That quirk is load-bearing: accessor names are written against the
/// column names this function produces, so it is replicated exactly.
///
/// Normalizing an already-normalized name is a no-op.
///
/// # Examples
///
/// ```
/// use rowgate_query::normalize;
///
/// assert_eq!(normalize("UserName"), "user_name");
/// assert_eq!(normalize("ID"), "i_d");
/// assert_eq!(normalize("user_name"), "user_name");
/// ```
#[must_use]
pub fn normalize(token: &str) -> String {
    let mut out = String::with_capacity(token.len() + 4);
    for (i, ch) in token.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Split an `And`-joined field list and normalize each token, in order.
///
/// ```
/// use rowgate_query::split_fields;
///
/// assert_eq!(split_fields("NameAndStatus"), vec!["name", "status"]);
/// ```
#[must_use]
pub fn split_fields(list: &str) -> Vec<String> {
    list.split("And").map(normalize).collect()
}
