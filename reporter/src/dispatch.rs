use std::collections::BTreeMap;

use serde_json::Value;

use crate::api::ReporterError;
use crate::events::{
    AmpEvent, AnalyticsEvent, AuctionContext, BidderUsersyncStatus, CookieSyncEvent,
    HttpRequestContext, NotificationEvent, SetuidEvent,
};
use crate::record::{
    AmpDetails, AuctionDetails, BidderSyncStatus, CookieSyncDetails, EventDetails,
    NotificationDetails, SetuidDetails, UnknownDetails, UserSync,
};
use crate::sanitize;

/// Routes an event to its kind-specific field group. No input at all and
/// unrecognized shapes both land in the unknown group; only a payload that
/// cannot be projected fails.
pub fn classify(event: Option<&AnalyticsEvent>) -> Result<EventDetails, ReporterError> {
    let Some(event) = event else {
        return Ok(EventDetails::Unknown(UnknownDetails::default()));
    };

    let details = match event {
        AnalyticsEvent::Auction(auction) => EventDetails::Auction(auction_details(
            auction.auction_context.as_ref(),
            auction.bid_response.as_ref(),
        )?),
        AnalyticsEvent::Video(video) => EventDetails::Video(auction_details(
            video.auction_context.as_ref(),
            video.bid_response.as_ref(),
        )?),
        AnalyticsEvent::Amp(amp) => EventDetails::Amp(amp_details(amp)?),
        AnalyticsEvent::CookieSync(sync) => EventDetails::CookieSync(cookie_sync_details(sync)),
        AnalyticsEvent::Setuid(setuid) => EventDetails::Setuid(setuid_details(setuid)),
        AnalyticsEvent::Notification(notification) => {
            EventDetails::Notification(notification_details(notification))
        }
        AnalyticsEvent::Unrecognized(raw) => {
            tracing::debug!(event = %raw, "handling unknown event type");
            EventDetails::Unknown(UnknownDetails {
                unknown_event: Some(raw.clone()),
            })
        }
    };

    Ok(details)
}

/// The request context of the variants served over HTTP. Cookie sync and
/// setuid never carry one.
pub fn http_context(event: &AnalyticsEvent) -> Option<&HttpRequestContext> {
    match event {
        AnalyticsEvent::Auction(auction) => auction.http_context.as_ref(),
        AnalyticsEvent::Amp(amp) => amp.http_context.as_ref(),
        AnalyticsEvent::Video(video) => video.http_context.as_ref(),
        AnalyticsEvent::Notification(notification) => notification.http_context.as_ref(),
        AnalyticsEvent::CookieSync(_)
        | AnalyticsEvent::Setuid(_)
        | AnalyticsEvent::Unrecognized(_) => None,
    }
}

fn auction_details(
    auction_context: Option<&AuctionContext>,
    bid_response: Option<&Value>,
) -> Result<AuctionDetails, ReporterError> {
    let bid_request = auction_context.and_then(|context| context.bid_request.as_ref());

    Ok(AuctionDetails {
        bid_request: sanitize::bid_request(bid_request)?,
        bid_response: sanitize::bid_response(bid_response)?,
    })
}

fn amp_details(amp: &AmpEvent) -> Result<AmpDetails, ReporterError> {
    let AuctionDetails {
        bid_request,
        bid_response,
    } = auction_details(amp.auction_context.as_ref(), amp.bid_response.as_ref())?;

    let targeting = amp.targeting.as_ref().map(|targeting| {
        targeting
            .iter()
            .map(|(key, value)| (key.clone(), as_text(value)))
            .collect::<BTreeMap<_, _>>()
    });

    Ok(AmpDetails {
        bid_request,
        bid_response,
        targeting,
        origin: amp.origin.clone(),
    })
}

/// Text form of a targeting value: scalars as their JSON text (strings
/// unquoted), containers as the empty string.
fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(_) | Value::Object(_) => String::new(),
    }
}

fn cookie_sync_details(sync: &CookieSyncEvent) -> CookieSyncDetails {
    CookieSyncDetails {
        bidder_status: sync.bidder_status.iter().map(bidder_sync_status).collect(),
    }
}

fn bidder_sync_status(status: &BidderUsersyncStatus) -> BidderSyncStatus {
    BidderSyncStatus {
        bidder: status.bidder.clone(),
        no_cookie: status.no_cookie,
        usersync: status.usersync.as_ref().map(|usersync| UserSync {
            url: usersync.url.clone(),
            sync_type: usersync.method.map(|method| method.to_string()),
            status: usersync.status.clone(),
        }),
        error: status.error.clone(),
        response_time_ms: status.response_time_ms,
    }
}

fn setuid_details(setuid: &SetuidEvent) -> SetuidDetails {
    SetuidDetails {
        bidder: setuid.bidder.clone(),
        uid: setuid.uid.clone(),
        success: setuid.success,
    }
}

fn notification_details(notification: &NotificationEvent) -> NotificationDetails {
    NotificationDetails {
        bid_id: notification.bid_id.clone(),
        timestamp: notification.timestamp,
        notification_type: notification.notification_type.map(|kind| kind.to_string()),
        bidder: notification.bidder.clone(),
        integration: notification.integration.clone(),
    }
}
