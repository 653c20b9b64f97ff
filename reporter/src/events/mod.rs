//! Auction lifecycle events as the host hands them to the reporter.

use std::collections::BTreeMap;
use std::fmt;

use http::Method;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::record::EventKind;

mod multimap;

pub use multimap::CaseInsensitiveMultiMap;

/// Request metadata captured by the host for endpoints served over HTTP.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequestContext {
    #[serde(default)]
    pub headers: CaseInsensitiveMultiMap,
    pub query_params: Option<CaseInsensitiveMultiMap>,
    pub remote_host: Option<String>,
    pub body: Option<String>,
    pub scheme: Option<String>,
    #[serde(default, deserialize_with = "deserialize_method")]
    pub http_method: Option<Method>,
    pub absolute_uri: Option<String>,
}

fn deserialize_method<'de, D>(deserializer: D) -> Result<Option<Method>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    value
        .map(|name| {
            Method::from_bytes(name.to_ascii_uppercase().as_bytes())
                .map_err(serde::de::Error::custom)
        })
        .transpose()
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionContext {
    /// Upstream OpenRTB bid request, kept untyped.
    pub bid_request: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionEvent {
    pub http_context: Option<HttpRequestContext>,
    pub auction_context: Option<AuctionContext>,
    pub bid_response: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEvent {
    pub http_context: Option<HttpRequestContext>,
    pub auction_context: Option<AuctionContext>,
    pub bid_response: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmpEvent {
    pub http_context: Option<HttpRequestContext>,
    pub auction_context: Option<AuctionContext>,
    pub bid_response: Option<Value>,
    pub targeting: Option<BTreeMap<String, Value>>,
    pub origin: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsersyncMethodType {
    Iframe,
    Redirect,
}

impl fmt::Display for UsersyncMethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsersyncMethodType::Iframe => write!(f, "iframe"),
            UsersyncMethodType::Redirect => write!(f, "redirect"),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersyncInfo {
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub method: Option<UsersyncMethodType>,
    #[serde(rename = "supportCORS")]
    pub support_cors: Option<bool>,
    pub status: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidderUsersyncStatus {
    pub bidder: Option<String>,
    pub no_cookie: Option<bool>,
    pub usersync: Option<UsersyncInfo>,
    pub error: Option<String>,
    #[serde(alias = "response_time_ms")]
    pub response_time_ms: Option<u64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieSyncEvent {
    #[serde(default)]
    pub bidder_status: Vec<BidderUsersyncStatus>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetuidEvent {
    pub bidder: Option<String>,
    pub uid: Option<String>,
    pub success: Option<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Win,
    Imp,
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationType::Win => write!(f, "win"),
            NotificationType::Imp => write!(f, "imp"),
        }
    }
}

/// Win or impression notification posted back by a rendered creative.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub notification_type: Option<NotificationType>,
    pub bid_id: Option<String>,
    pub bidder: Option<String>,
    /// Epoch milliseconds.
    pub timestamp: Option<i64>,
    pub integration: Option<String>,
    pub http_context: Option<HttpRequestContext>,
}

/// Everything the host may report. `Unrecognized` holds any shape outside the
/// known set so it can still be captured.
#[derive(Clone, Debug)]
pub enum AnalyticsEvent {
    Auction(AuctionEvent),
    Amp(AmpEvent),
    Video(VideoEvent),
    CookieSync(CookieSyncEvent),
    Setuid(SetuidEvent),
    Notification(NotificationEvent),
    Unrecognized(Value),
}

impl AnalyticsEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            AnalyticsEvent::Auction(_) => EventKind::Auction,
            AnalyticsEvent::Amp(_) => EventKind::Amp,
            AnalyticsEvent::Video(_) => EventKind::Video,
            AnalyticsEvent::CookieSync(_) => EventKind::CookieSync,
            AnalyticsEvent::Setuid(_) => EventKind::Setuid,
            AnalyticsEvent::Notification(_) => EventKind::Event,
            AnalyticsEvent::Unrecognized(_) => EventKind::Unknown,
        }
    }

    /// Decodes a JSON envelope whose `event` member names the kind path.
    /// `null` means no event at all; an unknown path, a missing tag or a body
    /// that does not fit the tagged shape is kept whole as `Unrecognized`.
    pub fn from_json(value: Value) -> Option<AnalyticsEvent> {
        if value.is_null() {
            return None;
        }

        let kind = value
            .get("event")
            .and_then(Value::as_str)
            .map(EventKind::from_path)
            .unwrap_or(EventKind::Unknown);

        let decoded = match kind {
            EventKind::Auction => AuctionEvent::deserialize(&value).map(AnalyticsEvent::Auction),
            EventKind::Amp => AmpEvent::deserialize(&value).map(AnalyticsEvent::Amp),
            EventKind::Video => VideoEvent::deserialize(&value).map(AnalyticsEvent::Video),
            EventKind::CookieSync => {
                CookieSyncEvent::deserialize(&value).map(AnalyticsEvent::CookieSync)
            }
            EventKind::Setuid => SetuidEvent::deserialize(&value).map(AnalyticsEvent::Setuid),
            EventKind::Event => {
                NotificationEvent::deserialize(&value).map(AnalyticsEvent::Notification)
            }
            EventKind::Unknown => return Some(AnalyticsEvent::Unrecognized(value)),
        };

        match decoded {
            Ok(event) => Some(event),
            Err(e) => {
                debug!(kind = %kind, error = %e, "envelope does not fit its tag, keeping it raw");
                Some(AnalyticsEvent::Unrecognized(value))
            }
        }
    }
}
