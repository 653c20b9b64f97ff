use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// Logical kind of a canonical record, serialized as the endpoint path it
/// originates from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Auction,
    Amp,
    Video,
    CookieSync,
    Setuid,
    Event,
    Unknown,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::Auction,
        EventKind::Amp,
        EventKind::Video,
        EventKind::CookieSync,
        EventKind::Setuid,
        EventKind::Event,
        EventKind::Unknown,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            EventKind::Auction => "/openrtb2/auction",
            EventKind::Amp => "/openrtb2/amp",
            EventKind::Video => "/openrtb2/video",
            EventKind::CookieSync => "/cookie_sync",
            EventKind::Setuid => "/setuid",
            EventKind::Event => "/event",
            EventKind::Unknown => "unknown",
        }
    }

    /// Resolves a path back to its kind. Anything unrecognized is `Unknown`.
    pub fn from_path(path: &str) -> EventKind {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.path() == path)
            .unwrap_or(EventKind::Unknown)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for EventKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(EventKind::from_path(s))
    }
}

impl Serialize for EventKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.path())
    }
}
