//! Gateway webhook verification and event decoding.
//!
//! Signatures arrive as `Stripe-Signature: t=<unix>,v1=<hex>[,v1=<hex>...]`
//! and cover `"{t}.{raw body}"` with HMAC-SHA256.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use super::PaymentError;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Maximum accepted age of a signed payload, in seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEventData {
    pub object: serde_json::Value,
}

impl WebhookEvent {
    /// Id of the payment intent the event refers to, when the object is one.
    pub fn payment_intent_id(&self) -> Option<&str> {
        let object = &self.data.object;
        match object.get("object").and_then(|o| o.as_str()) {
            Some("payment_intent") => object.get("id").and_then(|id| id.as_str()),
            _ => None,
        }
    }
}

pub fn verify_signature(
    payload: &str,
    header: &str,
    secret: &str,
    now: i64,
    tolerance_secs: i64,
) -> Result<(), PaymentError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                timestamp = Some(value.parse().map_err(|_| {
                    PaymentError::InvalidSignature("invalid timestamp".to_string())
                })?)
            }
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| PaymentError::InvalidSignature("missing timestamp".to_string()))?;
    if signatures.is_empty() {
        return Err(PaymentError::InvalidSignature(
            "missing v1 signature".to_string(),
        ));
    }
    if (now - timestamp).abs() > tolerance_secs {
        return Err(PaymentError::InvalidSignature(
            "timestamp outside tolerance".to_string(),
        ));
    }

    let expected = sign(payload, secret, timestamp)?;
    if signatures
        .iter()
        .any(|candidate| constant_time_compare(&expected, candidate))
    {
        Ok(())
    } else {
        Err(PaymentError::InvalidSignature(
            "signature mismatch".to_string(),
        ))
    }
}

/// Hex HMAC over `"{timestamp}.{payload}"`.
pub fn sign(payload: &str, secret: &str, timestamp: i64) -> Result<String, PaymentError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::InvalidSignature(e.to_string()))?;
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

pub fn parse_event(payload: &str) -> Result<WebhookEvent, PaymentError> {
    serde_json::from_str(payload).map_err(|e| PaymentError::Response(e.to_string()))
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const BODY: &str = r#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"id":"pi_1","object":"payment_intent"}}}"#;

    fn header_for(body: &str, ts: i64) -> String {
        format!("t={ts},v1={}", sign(body, SECRET, ts).unwrap())
    }

    #[test]
    fn accepts_valid_signature() {
        let header = header_for(BODY, 1_700_000_000);
        assert!(verify_signature(BODY, &header, SECRET, 1_700_000_010, 300).is_ok());
    }

    #[test]
    fn accepts_any_matching_v1_entry() {
        let good = sign(BODY, SECRET, 1_700_000_000).unwrap();
        let header = format!("t=1700000000,v1=deadbeef,v0=abc,v1={good}");
        assert!(verify_signature(BODY, &header, SECRET, 1_700_000_000, 300).is_ok());
    }

    #[test]
    fn rejects_tampered_body() {
        let header = header_for(BODY, 1_700_000_000);
        let tampered = BODY.replace("pi_1", "pi_2");
        let result = verify_signature(&tampered, &header, SECRET, 1_700_000_000, 300);
        assert!(matches!(result, Err(PaymentError::InvalidSignature(_))));
    }

    #[test]
    fn rejects_stale_timestamp() {
        let header = header_for(BODY, 1_700_000_000);
        let result = verify_signature(BODY, &header, SECRET, 1_700_000_301, 300);
        assert!(matches!(result, Err(PaymentError::InvalidSignature(_))));
    }

    #[test]
    fn rejects_malformed_header() {
        assert!(verify_signature(BODY, "garbage", SECRET, 0, 300).is_err());
        assert!(verify_signature(BODY, "t=abc,v1=00", SECRET, 0, 300).is_err());
        assert!(verify_signature(BODY, "t=0", SECRET, 0, 300).is_err());
    }

    #[test]
    fn extracts_payment_intent_id() {
        let event = parse_event(BODY).unwrap();
        assert_eq!(event.event_type, "payment_intent.succeeded");
        assert_eq!(event.payment_intent_id(), Some("pi_1"));
    }
}
