use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

/// Session data attached to a response: one value per key.
///
/// Unlike headers, writing a key again replaces its value rather than
/// accumulating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session(BTreeMap<String, String>);

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }

    /// Override-or-insert every pair; the last value for a key wins.
    pub fn insert_all<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.0
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
    }

    pub fn remove_all<I, K>(&mut self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        for key in keys {
            self.0.remove(key.as_ref());
        }
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl<K, V> FromIterator<(K, V)> for Session
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut session = Session::new();
        session.insert_all(iter);
        session
    }
}

impl<'a> IntoIterator for &'a Session {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Session> for BTreeMap<String, String> {
    fn from(session: Session) -> Self {
        session.0
    }
}
