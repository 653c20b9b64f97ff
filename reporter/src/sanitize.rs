//! Projects upstream OpenRTB bid requests and responses onto a fixed set of
//! top-level keys. Nested objects are carried as untyped JSON so upstream
//! schema changes below the top level never break the projection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ReporterError;

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct BidRequestSummary {
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imp: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
    #[serde(
        default,
        deserialize_with = "lenient::integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub test: Option<i32>,
    #[serde(
        default,
        deserialize_with = "lenient::integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub at: Option<i32>,
    #[serde(
        default,
        deserialize_with = "lenient::integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub tmax: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cur: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bcat: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badv: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bapp: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regs: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct BidResponseSummary {
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seatbid: Option<Vec<Value>>,
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub bidid: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub cur: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub customdata: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub nbr: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}

pub fn bid_request(
    payload: Option<&Value>,
) -> Result<Option<BidRequestSummary>, ReporterError> {
    project(payload, "BidRequestSummary")
}

pub fn bid_response(
    payload: Option<&Value>,
) -> Result<Option<BidResponseSummary>, ReporterError> {
    project(payload, "BidResponseSummary")
}

// Unknown top-level keys are skipped by serde. Scalars are coerced where the
// value is unambiguous; anything else on a kept key is a conversion fault.
fn project<'a, T>(
    payload: Option<&'a Value>,
    target: &'static str,
) -> Result<Option<T>, ReporterError>
where
    T: Deserialize<'a>,
{
    match payload {
        None | Some(Value::Null) => Ok(None),
        Some(value) => T::deserialize(value)
            .map(Some)
            .map_err(|source| ReporterError::Conversion { target, source }),
    }
}

// Upstream exchanges drift between `500`, `500.0` and `"500"`, or send ids as
// numbers. These accept every spelling that denotes the same scalar.
mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(other) => Err(D::Error::custom(format!(
                "expected a string, found {other}"
            ))),
        }
    }

    pub fn integer<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => return Ok(None),
            Some(value) => value,
        };

        let integer = match &value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => i32::try_from(i).ok(),
                None => n.as_f64().and_then(whole),
            },
            Value::String(s) => s.trim().parse::<i32>().ok(),
            _ => None,
        };

        integer
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a 32-bit integer, found {value}")))
    }

    fn whole(f: f64) -> Option<i32> {
        let in_range = f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX);
        (f.fract() == 0.0 && in_range).then_some(f as i32)
    }
}

#[cfg(test)]
mod tests {
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn keeps_allow_listed_request_keys() {
        let payload = json!({
            "id": "req-1",
            "imp": [{"id": "1", "banner": {"w": 300, "h": 250}}],
            "site": {"page": "https://news.example", "publisher": {"id": "pub"}},
            "device": {"ua": "agent", "ip": "1.2.3.4"},
            "user": {"buyeruid": "u"},
            "test": 1,
            "at": 1,
            "tmax": 500,
            "cur": ["USD"],
            "bcat": ["IAB25"],
            "badv": ["bad.example"],
            "bapp": [],
            "source": {"tid": "t"},
            "regs": {"coppa": 0},
            "metric": [{"type": "viewability", "value": 0.7}],
            "ext": {"prebid": {"debug": true}},
            "wseat": ["dropped"],
            "allimps": 0
        });

        let summary = bid_request(Some(&payload)).unwrap().unwrap();
        assert_eq!(summary.id.as_deref(), Some("req-1"));
        assert_eq!(summary.tmax, Some(500));
        assert_eq!(summary.cur, Some(vec!["USD".to_string()]));

        let mut expected = payload.clone();
        let object = expected.as_object_mut().unwrap();
        object.remove("wseat");
        object.remove("allimps");
        assert_json_eq!(serde_json::to_value(&summary).unwrap(), expected);
    }

    #[test]
    fn keeps_allow_listed_response_keys() {
        let payload = json!({
            "id": "test-id",
            "bidid": "test-bid-id",
            "seatbid": [{"seat": "appnexus", "bid": [{"id": "b", "price": 1.5}]}],
            "cur": "USD",
            "customdata": "abc",
            "nbr": 2,
            "ext": {"debug": {}},
            "responsetimemillis": {"appnexus": 40}
        });

        let summary = bid_response(Some(&payload)).unwrap().unwrap();
        assert_eq!(summary.id.as_deref(), Some("test-id"));
        assert_eq!(summary.bidid.as_deref(), Some("test-bid-id"));
        assert_eq!(summary.nbr, Some(2));
        assert_eq!(summary.seatbid.as_ref().map(Vec::len), Some(1));
        assert!(!serde_json::to_string(&summary)
            .unwrap()
            .contains("responsetimemillis"));
    }

    #[test]
    fn all_unknown_keys_give_an_empty_summary() {
        let payload = json!({"foo": 1, "bar": {"baz": true}});

        assert_eq!(
            bid_request(Some(&payload)).unwrap(),
            Some(BidRequestSummary::default())
        );
        assert_eq!(
            bid_response(Some(&payload)).unwrap(),
            Some(BidResponseSummary::default())
        );
        assert_eq!(
            serde_json::to_string(&BidResponseSummary::default()).unwrap(),
            "{}"
        );
    }

    #[test]
    fn absent_or_null_payload_is_unset() {
        assert_eq!(bid_request(None).unwrap(), None);
        assert_eq!(bid_response(Some(&Value::Null)).unwrap(), None);
    }

    #[test]
    fn nested_trees_are_not_validated() {
        let payload = json!({"imp": [42, "not an imp", {"id": null}], "site": []});
        let summary = bid_request(Some(&payload)).unwrap().unwrap();
        assert_eq!(summary.imp, Some(vec![json!(42), json!("not an imp"), json!({"id": null})]));
        assert_eq!(summary.site, Some(json!([])));
    }

    #[test]
    fn type_mismatch_on_a_kept_key_is_a_conversion_fault() {
        let payload = json!({"id": "req", "tmax": "fast"});
        let err = bid_request(Some(&payload)).unwrap_err();
        assert!(matches!(
            err,
            ReporterError::Conversion {
                target: "BidRequestSummary",
                ..
            }
        ));

        let not_an_object = json!("just a string");
        assert!(bid_response(Some(&not_an_object)).is_err());
    }

    #[test]
    fn scalars_are_coerced_across_spellings() {
        let request = json!({"id": 42, "tmax": 500.0, "at": "2", "test": 0});
        let summary = bid_request(Some(&request)).unwrap().unwrap();
        assert_eq!(summary.id.as_deref(), Some("42"));
        assert_eq!(summary.tmax, Some(500));
        assert_eq!(summary.at, Some(2));
        assert_eq!(summary.test, Some(0));

        let response = json!({"id": 7, "bidid": true, "nbr": 2.0, "cur": null});
        let summary = bid_response(Some(&response)).unwrap().unwrap();
        assert_eq!(summary.id.as_deref(), Some("7"));
        assert_eq!(summary.bidid.as_deref(), Some("true"));
        assert_eq!(summary.nbr, Some(2));
        assert_eq!(summary.cur, None);
    }

    #[test]
    fn ambiguous_scalars_are_still_conversion_faults() {
        for payload in [
            json!({"tmax": 500.5}),
            json!({"tmax": 4_000_000_000_i64}),
            json!({"tmax": [500]}),
            json!({"id": {"value": "r"}}),
        ] {
            assert!(
                matches!(
                    bid_request(Some(&payload)),
                    Err(ReporterError::Conversion { .. })
                ),
                "{payload}"
            );
        }
    }
}
