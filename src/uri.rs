//! Channel URI - resource identifiers and the routing table
//!
//! Format: `content://<authority>/<segment>/<segment>...`
//!
//! Examples:
//! - `content://com.example.chanbase/channels` (the collection)
//! - `content://com.example.chanbase/channels/3` (one channel)

use crate::contract;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A parsed content URI.
///
/// Only the authority and the path are kept; query strings and fragments
/// are rejected at parse time. Empty path segments are dropped, so a
/// trailing slash does not change the identity of a URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelUri {
    authority: String,
    segments: Vec<String>,
}

impl ChannelUri {
    /// Create a URI from an authority and path segments
    pub fn new<S: Into<String>>(authority: impl Into<String>, segments: impl IntoIterator<Item = S>) -> Self {
        Self {
            authority: authority.into(),
            segments: segments
                .into_iter()
                .map(Into::<String>::into)
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Parse a URI string
    ///
    /// Expected format: `content://<authority>[/<path>]`
    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix(contract::SCHEME)
            .and_then(|s| s.strip_prefix("://"))
            .ok_or_else(|| Error::InvalidUri(format!("URI must start with {}://: {}", contract::SCHEME, uri)))?;

        if rest.contains(['?', '#']) {
            return Err(Error::InvalidUri(format!("query and fragment are not supported: {}", uri)));
        }

        let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
        if authority.is_empty() {
            return Err(Error::InvalidUri(format!("URI must name an authority: {}", uri)));
        }

        Ok(Self::new(authority, path.split('/')))
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn path_segments(&self) -> &[String] {
        &self.segments
    }

    /// Return a copy with one more path segment
    pub fn with_appended_path(&self, segment: impl Into<String>) -> Self {
        let mut uri = self.clone();
        let segment = segment.into();
        if !segment.is_empty() {
            uri.segments.push(segment);
        }
        uri
    }

    /// Return a copy with a numeric id appended as the last segment
    pub fn with_appended_id(&self, id: i64) -> Self {
        self.with_appended_path(id.to_string())
    }

    /// The last path segment as a row id, if it is a non-negative integer
    pub fn parse_id(&self) -> Option<i64> {
        self.segments.last().and_then(|s| parse_number_segment(s))
    }

    /// Whether `self` names `other` or a URI underneath it
    pub fn is_prefix_of(&self, other: &ChannelUri) -> bool {
        self.authority == other.authority && other.segments.starts_with(&self.segments)
    }

    /// Convert to URI string
    pub fn to_uri_string(&self) -> String {
        let mut out = format!("{}://{}", contract::SCHEME, self.authority);
        for segment in &self.segments {
            out.push('/');
            out.push_str(segment);
        }
        out
    }
}

impl fmt::Display for ChannelUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uri_string())
    }
}

impl FromStr for ChannelUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for ChannelUri {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_uri_string())
    }
}

impl<'de> Deserialize<'de> for ChannelUri {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ChannelUri::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// `#` segments: ASCII digits only, must fit in an i64
fn parse_number_segment(segment: &str) -> Option<i64> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Code a route resolves to when registered with the matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteCode {
    /// The whole channel collection
    Channels,
    /// One channel, addressed by the numeric segment of the template
    ChannelId,
}

/// Result of matching a URI against the routing table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    Channels,
    ChannelId(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `#`: a decimal integer
    Number,
    /// `*`: any single segment
    Any,
}

#[derive(Debug, Clone)]
struct Route {
    authority: String,
    segments: Vec<Segment>,
    code: RouteCode,
}

impl Route {
    /// Returns the value of the last `#` segment on success (0 when none)
    fn matches(&self, uri: &ChannelUri) -> Option<i64> {
        if self.authority != uri.authority || self.segments.len() != uri.segments.len() {
            return None;
        }

        let mut number = None;
        for (template, actual) in self.segments.iter().zip(&uri.segments) {
            match template {
                Segment::Literal(lit) if lit == actual => {}
                Segment::Literal(_) => return None,
                Segment::Number => number = Some(parse_number_segment(actual)?),
                Segment::Any => {}
            }
        }
        Some(number.unwrap_or(0))
    }
}

/// Routing table from `(authority, path template)` to a [`RouteCode`].
///
/// Templates are `/`-separated; `#` matches an integer segment and `*`
/// matches any segment. Routes are tried in registration order.
#[derive(Debug, Clone, Default)]
pub struct UriMatcher {
    routes: Vec<Route>,
}

impl UriMatcher {
    /// Create an empty matcher
    pub fn new() -> Self {
        Self::default()
    }

    /// The matcher used by the channel provider:
    /// `channels` → [`RouteCode::Channels`], `channels/#` → [`RouteCode::ChannelId`]
    pub fn for_channels() -> Self {
        let mut matcher = Self::new();
        matcher.add_uri(contract::CONTENT_AUTHORITY, contract::PATH_CHANNELS, RouteCode::Channels);
        matcher.add_uri(
            contract::CONTENT_AUTHORITY,
            &format!("{}/#", contract::PATH_CHANNELS),
            RouteCode::ChannelId,
        );
        matcher
    }

    /// Register a path template under an authority
    pub fn add_uri(&mut self, authority: &str, path_template: &str, code: RouteCode) {
        let segments = path_template
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s {
                "#" => Segment::Number,
                "*" => Segment::Any,
                lit => Segment::Literal(lit.to_string()),
            })
            .collect();

        self.routes.push(Route {
            authority: authority.to_string(),
            segments,
            code,
        });
    }

    /// Resolve a URI to a route, `None` if nothing matches
    pub fn match_uri(&self, uri: &ChannelUri) -> Option<Match> {
        self.routes.iter().find_map(|route| {
            let number = route.matches(uri)?;
            Some(match route.code {
                RouteCode::Channels => Match::Channels,
                RouteCode::ChannelId => Match::ChannelId(number),
            })
        })
    }
}
