//! Joining SQL fragments into statements.
//!
//! Generators build statements as an ordered list of fragments, some of which
//! are only present under a condition. [`join_sql_fragments`] drops the absent
//! and blank ones and joins the rest with single spaces, without putting a
//! space before `;`, `,` or `)` or after `(`.

use std::borrow::Cow;

/// One piece of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment<'a> {
    /// Literal SQL text.
    Text(Cow<'a, str>),

    /// A nested group, joined recursively.
    Group(Vec<Fragment<'a>>),

    /// Nothing (a condition that did not apply).
    Empty,
}

impl<'a> From<&'a str> for Fragment<'a> {
    fn from(s: &'a str) -> Self {
        Fragment::Text(Cow::Borrowed(s))
    }
}

impl From<String> for Fragment<'static> {
    fn from(s: String) -> Self {
        Fragment::Text(Cow::Owned(s))
    }
}

impl<'a, T: Into<Fragment<'a>>> From<Option<T>> for Fragment<'a> {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Fragment::Empty, Into::into)
    }
}

impl<'a> From<Vec<Fragment<'a>>> for Fragment<'a> {
    fn from(group: Vec<Fragment<'a>>) -> Self {
        Fragment::Group(group)
    }
}

/// Build a `Vec<Fragment>` from heterogeneous fragment-like expressions.
///
/// ```
/// use querygen::fragments;
/// use querygen::core::fragments::join_sql_fragments;
///
/// let if_exists = true;
/// let sql = join_sql_fragments(fragments![
///     "DROP INDEX",
///     if_exists.then_some("IF EXISTS"),
///     "\"users_email\"",
/// ]);
/// assert_eq!(sql, "DROP INDEX IF EXISTS \"users_email\"");
/// ```
#[macro_export]
macro_rules! fragments {
    ($($fragment:expr),* $(,)?) => {
        vec![$($crate::core::fragments::Fragment::from($fragment)),*]
    };
}

fn flatten<'a>(fragments: &'a [Fragment<'_>], out: &mut Vec<&'a str>) {
    for fragment in fragments {
        match fragment {
            Fragment::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed);
                }
            }
            Fragment::Group(group) => flatten(group, out),
            Fragment::Empty => {}
        }
    }
}

fn wants_no_leading_space(part: &str) -> bool {
    part.starts_with(';') || part.starts_with(',') || part.starts_with(')')
}

/// Join fragments into one statement.
pub fn join_sql_fragments(fragments: Vec<Fragment<'_>>) -> String {
    let mut parts = Vec::new();
    flatten(&fragments, &mut parts);

    let mut sql = String::new();
    let mut skip_next_space = true;
    for part in parts {
        if !skip_next_space && !wants_no_leading_space(part) {
            sql.push(' ');
        }
        sql.push_str(part);
        skip_next_space = part.ends_with('(');
    }
    sql
}

/// Join statements into a single batch.
///
/// Each non-blank statement is trimmed and its trailing semicolons are
/// normalized to exactly one. Statements are separated by a single space.
/// Statement bodies are not rewritten, so literals keep their whitespace.
pub fn join_statements<I, S>(statements: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    statements
        .into_iter()
        .filter_map(|stmt| {
            let body = stmt
                .as_ref()
                .trim()
                .trim_end_matches(|c: char| c == ';' || c.is_whitespace());
            if body.is_empty() {
                None
            } else {
                Some(format!("{};", body))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
