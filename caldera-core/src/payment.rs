use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;

pub const SIGNATURE_HEADER: &str = "stripe-signature";
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("signature header is malformed")]
    MalformedHeader,
    #[error("no v1 signature matches the payload")]
    Mismatch,
    #[error("signature timestamp is outside the tolerance window")]
    TimestampOutOfRange,
    #[error("signing secret is unusable")]
    InvalidKey,
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"`.
pub fn compute_signature(payload: &[u8], timestamp: i64, secret: &str) -> Result<String, SignatureError> {
    Ok(hex::encode(mac_for(payload, timestamp, secret)?.finalize().into_bytes()))
}

/// Builds a `t=..,v1=..` header value for the given payload.
pub fn signature_header(payload: &[u8], timestamp: i64, secret: &str) -> Result<String, SignatureError> {
    Ok(format!("t={},v1={}", timestamp, compute_signature(payload, timestamp, secret)?))
}

/// Verifies a provider signature header against the raw request body.
///
/// The header carries one timestamp and one or more `v1` signatures; any
/// matching signature is accepted. Comparison is constant-time.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<Vec<u8>> = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                timestamp = Some(value.parse().map_err(|_| SignatureError::MalformedHeader)?);
            }
            "v1" => {
                // Undecodable entries can never match; skip them.
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
    if signatures.is_empty() {
        return Err(SignatureError::Mismatch);
    }

    let mac = mac_for(payload, timestamp, secret)?;
    let matched = signatures
        .iter()
        .any(|candidate| mac.clone().verify_slice(candidate).is_ok());
    if !matched {
        return Err(SignatureError::Mismatch);
    }

    if tolerance_secs > 0 && (now - timestamp).abs() > tolerance_secs {
        return Err(SignatureError::TimestampOutOfRange);
    }
    Ok(())
}

fn mac_for(payload: &[u8], timestamp: i64, secret: &str) -> Result<HmacSha256, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidKey)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// The subset of a payment provider event we act on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: PaymentEventData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentEventData {
    pub object: PaymentObject,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentObject {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentEvent {
    /// Transaction reference from metadata: `tx_ref` first, then `transaction_reference`.
    pub fn transaction_reference(&self) -> Option<&str> {
        let metadata = &self.data.object.metadata;
        metadata
            .get("tx_ref")
            .or_else(|| metadata.get("transaction_reference"))
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}
