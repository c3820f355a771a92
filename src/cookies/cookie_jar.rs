//! Session cookie jar.
//!
//! The platform's web flows are driven with an explicit `Cookie` header per request rather than
//! through browser cookie semantics, so the jar is a flat `name → value` map. Attributes such as
//! `Path`, `Domain` or `Expires` are parsed away and ignored.
//!
//! ## Merge semantics
//! - Union: new values overwrite existing cookies with the same name; nothing is pruned.
//! - Merging the same `Set-Cookie` value twice yields the same jar.
//! - Each protocol step merges only the names it is responsible for, and only once the step has
//!   succeeded (see [`SessionCookieJar::take`]).
//!
use std::collections::{BTreeMap, HashMap};

use http::header::SET_COOKIE;
use http::HeaderMap;

/// In-memory cookie jar for a single session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCookieJar {
    entries: BTreeMap<String, String>,
}

impl SessionCookieJar {
    /// Creates an empty cookie jar.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Merges every cookie in `cookies`, overwriting same-named entries.
    pub fn merge(&mut self, cookies: impl IntoIterator<Item = (String, String)>) {
        self.entries.extend(cookies);
    }

    /// Picks `names` out of the `Set-Cookie` headers in `headers`.
    ///
    /// Returns the picked cookies, or the list of names the response did not set. The jar is
    /// not touched; merge the result once the step is known to have succeeded.
    pub fn take(headers: &HeaderMap, names: &[&str]) -> Result<Vec<(String, String)>, Vec<String>> {
        let mut received = parse_set_cookie(headers);
        let mut picked = Vec::with_capacity(names.len());
        let mut missing = Vec::new();

        for name in names {
            match received.remove(*name) {
                Some(value) => picked.push((name.to_string(), value)),
                None => missing.push(name.to_string()),
            }
        }

        if missing.is_empty() {
            Ok(picked)
        } else {
            Err(missing)
        }
    }

    pub fn contains_all(&self, names: &[&str]) -> bool {
        names.iter().all(|n| self.entries.contains_key(*n))
    }

    /// `Cookie` header value for `names`. Names the jar does not hold are skipped.
    pub fn header_for(&self, names: &[&str]) -> String {
        names
            .iter()
            .filter_map(|n| self.entries.get(*n).map(|v| format!("{n}={v}")))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// `Cookie` header value carrying every cookie in the jar.
    pub fn header_all(&self) -> String {
        self.entries
            .iter()
            .map(|(n, v)| format!("{n}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes all cookies from the jar.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Collects `name → value` from every `Set-Cookie` header.
///
/// A single header may also hold several cookies joined by `,`. Segments without a `name=value`
/// pair before their first `;` (e.g. the tail of an `Expires` date) are skipped. The last
/// occurrence of a name wins.
pub fn parse_set_cookie(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();

    for header in headers.get_all(SET_COOKIE) {
        let Ok(header_str) = header.to_str() else {
            continue;
        };

        for segment in header_str.split(',') {
            let pair = segment.split(';').next().unwrap_or_default();
            if let Some((name, value)) = pair.split_once('=') {
                let name = name.trim();
                if name.is_empty() || name.contains(char::is_whitespace) {
                    continue;
                }
                cookies.insert(name.to_string(), value.trim().to_string());
            }
        }
    }

    cookies
}
