use crate::base::neterror::NetError;
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use std::str::FromStr;

/// A header multimap that strictly preserves insertion order.
///
/// Names compare case-insensitively. A name may carry several values;
/// `set` replaces every value of a name in place, `add` appends another one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedHeaderMap {
    headers: Vec<(HeaderName, HeaderValue)>,
}

fn parse_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), NetError> {
    let name = HeaderName::from_str(name).map_err(|_| NetError::InvalidHeader)?;
    let value = HeaderValue::from_str(value).map_err(|_| NetError::InvalidHeader)?;
    Ok((name, value))
}

impl OrderedHeaderMap {
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
        }
    }

    /// Set a header from strings, replacing any existing values.
    pub fn insert(&mut self, name: &str, value: &str) -> Result<(), NetError> {
        let (name, value) = parse_pair(name, value)?;
        self.set(name, value);
        Ok(())
    }

    /// Append a header value from strings, keeping existing values.
    pub fn append(&mut self, name: &str, value: &str) -> Result<(), NetError> {
        let (name, value) = parse_pair(name, value)?;
        self.add(name, value);
        Ok(())
    }

    /// Replace all values of `name` with `value`.
    ///
    /// The new value takes the position of the first existing entry, so
    /// overriding a header does not reorder the request.
    pub fn set(&mut self, name: HeaderName, value: HeaderValue) {
        match self.headers.iter().position(|(n, _)| *n == name) {
            Some(idx) => {
                self.headers[idx].1 = value;
                let mut seen = 0usize;
                self.headers.retain(|(n, _)| {
                    if *n != name {
                        return true;
                    }
                    seen += 1;
                    seen == 1
                });
            }
            None => self.headers.push((name, value)),
        }
    }

    /// Replace all values of `name` with `values`. An empty list removes the header.
    pub fn set_all(&mut self, name: HeaderName, values: Vec<HeaderValue>) {
        let mut values = values.into_iter();
        match values.next() {
            Some(first) => {
                self.set(name.clone(), first);
                for value in values {
                    self.add(name.clone(), value);
                }
            }
            None => self.remove(name.as_str()),
        }
    }

    /// Append a value for `name`.
    pub fn add(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.push((name, value));
    }

    pub fn remove(&mut self, name: &str) {
        self.headers
            .retain(|(n, _)| !n.as_str().eq_ignore_ascii_case(name));
    }

    pub fn contains(&self, name: impl AsRef<str>) -> bool {
        self.get(name).is_some()
    }

    /// First value of `name`.
    pub fn get(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        let name = name.as_ref();
        self.headers
            .iter()
            .find(|(n, _)| n.as_str().eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// First value of `name` as a string, if it is visible ASCII.
    pub fn get_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.get(name).and_then(|v| v.to_str().ok())
    }

    /// All values of `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a HeaderValue> + 'a {
        self.headers
            .iter()
            .filter(move |(n, _)| n.as_str().eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.headers.iter().map(|(n, v)| (n, v))
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Consumes the map and returns a standard http::HeaderMap.
    ///
    /// http::HeaderMap groups values by name, so interleaved names lose their
    /// relative order; values of a single name keep theirs.
    pub fn to_header_map(self) -> HeaderMap {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in self.headers {
            map.append(name, value);
        }
        map
    }
}

impl From<&HeaderMap> for OrderedHeaderMap {
    fn from(map: &HeaderMap) -> Self {
        Self {
            headers: map.iter().map(|(n, v)| (n.clone(), v.clone())).collect(),
        }
    }
}
