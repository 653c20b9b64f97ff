//! Flattens the HTTP request context carried by auction, AMP, video and
//! notification events into single-valued record fields.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::events::{CaseInsensitiveMultiMap, HttpRequestContext};

const REFERER_HEADER: &str = "Referer";
const USER_AGENT_HEADER: &str = "User-Agent";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub headers: BTreeMap<String, String>,
    pub query_params: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absolute_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer_header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Returns `None` when the event carried no context, which is normal for
/// cookie sync and setuid.
pub fn extract(http: Option<&HttpRequestContext>) -> Option<RequestContext> {
    let http = http?;

    let headers = flatten(&http.headers);
    let query_params = http.query_params.as_ref().map(flatten).unwrap_or_default();

    let referer_header = http.headers.get(REFERER_HEADER).map(str::to_owned);
    let user_agent = http.headers.get(USER_AGENT_HEADER).map(str::to_owned);

    Some(RequestContext {
        remote_host: http.remote_host.clone(),
        http_method: http.http_method.as_ref().map(|method| method.to_string()),
        absolute_uri: http.absolute_uri.clone(),
        scheme: http.scheme.clone(),
        body: http.body.clone(),
        referer_header,
        user_agent,
        headers,
        query_params,
    })
}

/// Collapses a multi-map into one value per name. Names compare
/// case-insensitively and the last occurrence wins, spelling included.
pub fn flatten(map: &CaseInsensitiveMultiMap) -> BTreeMap<String, String> {
    let mut winners: HashMap<String, (&str, &str)> = HashMap::new();
    for (name, value) in map.entries() {
        winners.insert(name.to_ascii_lowercase(), (name, value));
    }

    winners
        .into_values()
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .collect()
}
