//! The canonical record emitted once per event.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::context::RequestContext;
use crate::sanitize::{BidRequestSummary, BidResponseSummary};

mod kind;

pub use kind::EventKind;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_request: Option<BidRequestSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_response: Option<BidResponseSummary>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmpDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_request: Option<BidRequestSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_response: Option<BidResponseSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targeting: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UserSync {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub sync_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BidderSyncStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bidder: Option<String>,
    #[serde(rename = "noCookie", skip_serializing_if = "Option::is_none")]
    pub no_cookie: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usersync: Option<UserSync>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieSyncDetails {
    pub bidder_status: Vec<BidderSyncStatus>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SetuidDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bidder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bidder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnknownDetails {
    /// Raw dump of the input, `None` when there was no input at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unknown_event: Option<Value>,
}

/// The kind-specific field group of a record. Exactly one group exists per
/// record, so fields of other kinds can never leak in.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventDetails {
    Auction(AuctionDetails),
    Amp(AmpDetails),
    Video(AuctionDetails),
    CookieSync(CookieSyncDetails),
    Setuid(SetuidDetails),
    Notification(NotificationDetails),
    Unknown(UnknownDetails),
}

impl EventDetails {
    pub fn kind(&self) -> EventKind {
        match self {
            EventDetails::Auction(_) => EventKind::Auction,
            EventDetails::Amp(_) => EventKind::Amp,
            EventDetails::Video(_) => EventKind::Video,
            EventDetails::CookieSync(_) => EventKind::CookieSync,
            EventDetails::Setuid(_) => EventKind::Setuid,
            EventDetails::Notification(_) => EventKind::Event,
            EventDetails::Unknown(_) => EventKind::Unknown,
        }
    }
}

/// One normalized, append-only log record. Built once by [`CanonicalEvent::assemble`]
/// and read through accessors afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CanonicalEvent {
    #[serde(rename = "type")]
    kind: EventKind,
    #[serde(flatten)]
    context: Option<RequestContext>,
    #[serde(flatten)]
    details: EventDetails,
}

impl CanonicalEvent {
    /// Merges the kind-specific group with the request context, if any.
    pub fn assemble(details: EventDetails, context: Option<RequestContext>) -> CanonicalEvent {
        CanonicalEvent {
            kind: details.kind(),
            context,
            details,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn context(&self) -> Option<&RequestContext> {
        self.context.as_ref()
    }
}
