use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

/// Ordered, multi-valued collection with case-insensitive name lookups, the
/// shape HTTP headers and query strings arrive in. Names keep the spelling
/// they were inserted with.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaseInsensitiveMultiMap {
    entries: Vec<(String, String)>,
}

impl CaseInsensitiveMultiMap {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Chainable insert, handy when building fixtures.
    pub fn add(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Every (name, value) pair in insertion order, duplicates included.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Value of the last occurrence of `name`, the one a flattened view keeps.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl<K, V> FromIterator<(K, V)> for CaseInsensitiveMultiMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

// Accepts `{"name": "value"}` as well as `{"name": ["v1", "v2"]}`.
impl<'de> Deserialize<'de> for CaseInsensitiveMultiMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Values {
            One(String),
            Many(Vec<String>),
        }

        struct MultiMapVisitor;

        impl<'de> Visitor<'de> for MultiMapVisitor {
            type Value = CaseInsensitiveMultiMap;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of names to a string or a list of strings")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut map = CaseInsensitiveMultiMap::default();
                while let Some((name, values)) = access.next_entry::<String, Values>()? {
                    match values {
                        Values::One(value) => map.insert(name, value),
                        Values::Many(values) => {
                            for value in values {
                                map.insert(name.clone(), value);
                            }
                        }
                    }
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(MultiMapVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::CaseInsensitiveMultiMap;

    #[test]
    fn lookups_ignore_case_and_take_the_last_value() {
        let map = CaseInsensitiveMultiMap::empty()
            .add("User-Agent", "first")
            .add("user-agent", "second")
            .add("Accept", "*/*");

        assert_eq!(map.get("USER-AGENT"), Some("second"));
        assert_eq!(map.get("accept"), Some("*/*"));
        assert_eq!(map.get("referer"), None);
    }

    #[test]
    fn lookup_does_not_borrow_the_name_past_the_call() {
        let map = CaseInsensitiveMultiMap::empty().add("Referer", "https://a.example");

        let found = {
            let name = String::from("referer");
            map.get(&name)
        };
        assert_eq!(found, Some("https://a.example"));
    }

    #[test]
    fn entries_keep_insertion_order_and_spelling() {
        let map: CaseInsensitiveMultiMap =
            vec![("b", "1"), ("A", "2"), ("b", "3")].into_iter().collect();

        assert_eq!(
            map.entries().collect::<Vec<_>>(),
            vec![("b", "1"), ("A", "2"), ("b", "3")]
        );
    }

    #[test]
    fn deserializes_single_and_repeated_values() {
        let map: CaseInsensitiveMultiMap =
            serde_json::from_str(r#"{"Accept":"*/*","X-Seen":["a","b"]}"#).unwrap();

        assert_eq!(map.get("accept"), Some("*/*"));
        assert_eq!(
            map.entries().filter(|(name, _)| *name == "X-Seen").count(),
            2
        );
        assert_eq!(map.get("x-seen"), Some("b"));

        assert!(serde_json::from_str::<CaseInsensitiveMultiMap>(r#"{"n":1}"#).is_err());
    }
}
