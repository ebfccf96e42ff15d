//! Merge rules shared by every [`ResponsePipeline`](super::ResponsePipeline)
//! adapter.

use axum_extra::extract::cookie::Cookie;

/// Group `(name, value)` pairs by name.
///
/// Names appear in order of first occurrence; values keep their call order.
pub fn group_by_name<I, K, V>(pairs: I) -> Vec<(String, Vec<String>)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();

    for (name, value) in pairs {
        let name = name.into();
        match groups.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, values)) => values.push(value.into()),
            None => groups.push((name, vec![value.into()])),
        }
    }

    groups
}

/// Merge `incoming` cookies into `existing`.
///
/// A cookie whose name is already present overwrites that slot, otherwise it
/// is appended. Duplicates inside `existing` collapse the same way.
pub fn merge_cookies<I>(existing: Vec<Cookie<'static>>, incoming: I) -> Vec<Cookie<'static>>
where
    I: IntoIterator<Item = Cookie<'static>>,
{
    let mut merged: Vec<Cookie<'static>> = Vec::with_capacity(existing.len());

    for cookie in existing.into_iter().chain(incoming) {
        match merged.iter_mut().find(|c| c.name() == cookie.name()) {
            Some(slot) => *slot = cookie,
            None => merged.push(cookie),
        }
    }

    merged
}
