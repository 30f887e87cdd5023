//! Payload normalization.
//!
//! Turns the loosely structured JSON returned by the analysis service into
//! a [`NormalizedReport`]. Every section and field is optional: anything
//! missing or of the wrong shape falls back to an empty/zero default and is
//! logged. The only rejection is a payload that is not a JSON object.

use crate::error::ReportError;
use crate::models::{Account, NormalizedReport, Ring, Summary};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Parse payload text and normalize it.
pub fn parse_payload(text: &str) -> Result<NormalizedReport, ReportError> {
    let raw: Value = serde_json::from_str(text).map_err(ReportError::InvalidJson)?;
    normalize(&raw)
}

/// Normalize a raw payload into the canonical report.
pub fn normalize(raw: &Value) -> Result<NormalizedReport, ReportError> {
    let object = raw.as_object().ok_or(ReportError::MalformedPayload {
        found: value_kind(raw),
    })?;

    let suspicious_accounts = section(object, "suspicious_accounts")
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| normalize_account(index, entry))
        .collect::<Vec<_>>();

    let fraud_rings = section(object, "fraud_rings")
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| normalize_ring(index, entry))
        .collect::<Vec<_>>();

    let summary = match object.get("summary") {
        None | Some(Value::Null) => Summary::default(),
        Some(Value::Object(fields)) => normalize_summary(fields),
        Some(other) => {
            warn!("Ignoring summary of type {}", value_kind(other));
            Summary::default()
        }
    };

    debug!(
        "Normalized payload: {} accounts, {} rings",
        suspicious_accounts.len(),
        fraud_rings.len()
    );

    Ok(NormalizedReport {
        suspicious_accounts,
        fraud_rings,
        summary,
    })
}

/// Fetch an array section, treating absence and wrong types as empty.
fn section<'a>(object: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    match object.get(key) {
        None | Some(Value::Null) => &[],
        Some(Value::Array(items)) => items.as_slice(),
        Some(other) => {
            warn!("Ignoring {} of type {}", key, value_kind(other));
            &[]
        }
    }
}

fn normalize_account(index: usize, entry: &Value) -> Option<Account> {
    let Some(fields) = entry.as_object() else {
        warn!("Skipping suspicious_accounts[{}]: not an object", index);
        return None;
    };

    let Some(account_id) = fields.get("account_id").and_then(identifier) else {
        warn!("Skipping suspicious_accounts[{}]: no account_id", index);
        return None;
    };

    let mut detected_patterns: Vec<String> = Vec::new();
    for pattern in string_list(fields.get("detected_patterns")) {
        if !detected_patterns.contains(&pattern) {
            detected_patterns.push(pattern);
        }
    }

    Some(Account {
        account_id,
        suspicion_score: number(fields.get("suspicion_score")).unwrap_or(0.0),
        detected_patterns,
        ring_id: fields.get("ring_id").and_then(identifier),
    })
}

fn normalize_ring(index: usize, entry: &Value) -> Option<Ring> {
    let Some(fields) = entry.as_object() else {
        warn!("Skipping fraud_rings[{}]: not an object", index);
        return None;
    };

    let member_accounts = string_list(fields.get("member_accounts"));
    let member_count = count(fields.get("member_count")).unwrap_or(member_accounts.len() as u64);

    Some(Ring {
        ring_id: fields
            .get("ring_id")
            .and_then(identifier)
            .unwrap_or_default(),
        pattern_type: fields
            .get("pattern_type")
            .and_then(identifier)
            .unwrap_or_default(),
        member_accounts,
        member_count,
        risk_score: number(fields.get("risk_score")).unwrap_or(0.0),
    })
}

fn normalize_summary(fields: &Map<String, Value>) -> Summary {
    Summary {
        total_accounts_analyzed: count(fields.get("total_accounts_analyzed")).unwrap_or(0),
        suspicious_accounts_flagged: count(fields.get("suspicious_accounts_flagged")).unwrap_or(0),
        fraud_rings_detected: count(fields.get("fraud_rings_detected")).unwrap_or(0),
        total_transactions: count(fields.get("total_transactions")),
        merchant_accounts_detected: count(fields.get("merchant_accounts_detected")),
        normal_accounts: count(fields.get("normal_accounts")),
        repeat_offenders: count(fields.get("repeat_offenders")),
        single_ring_members: count(fields.get("single_ring_members")),
        processing_time_seconds: number(fields.get("processing_time_seconds")),
    }
}

/// Strings are taken verbatim; numeric ids are rendered as text.
fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A finite number, accepting numeric strings.
fn number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Null => return None,
        other => {
            debug!("Ignoring non-numeric value of type {}", value_kind(other));
            None
        }
    };
    parsed.filter(|n| n.is_finite())
}

/// A non-negative whole number. Negative or fractional values are rejected.
fn count(value: Option<&Value>) -> Option<u64> {
    if let Some(Value::Number(n)) = value {
        if let Some(whole) = n.as_u64() {
            return Some(whole);
        }
    }
    let n = number(value)?;
    if n >= 0.0 && n.fract() == 0.0 && n <= u64::MAX as f64 {
        Some(n as u64)
    } else {
        warn!("Ignoring invalid count {}", n);
        None
    }
}

/// A list of identifiers. A bare string counts as a one-element list.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(identifier).collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_full_payload() {
        let raw = json!({
            "suspicious_accounts": [
                {"account_id": "A", "suspicion_score": 92.5, "detected_patterns": ["cycle", "fan_in"], "ring_id": "R1"}
            ],
            "fraud_rings": [
                {"ring_id": "R1", "pattern_type": "cycle", "member_accounts": ["A", "B", "C"], "member_count": 3, "risk_score": 88.0}
            ],
            "summary": {"total_accounts_analyzed": 40, "suspicious_accounts_flagged": 1, "fraud_rings_detected": 1}
        });

        let report = normalize(&raw).unwrap();
        assert_eq!(report.suspicious_accounts.len(), 1);
        assert_eq!(report.suspicious_accounts[0].ring_id.as_deref(), Some("R1"));
        assert_eq!(report.fraud_rings[0].member_accounts, vec!["A", "B", "C"]);
        assert_eq!(report.summary.total_accounts_analyzed, 40);
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        for raw in [
            json!({}),
            json!({"summary": {"total_accounts_analyzed": 5}}),
            json!({"fraud_rings": [], "summary": null}),
            json!({"suspicious_accounts": [{"account_id": "X"}]}),
        ] {
            let report = normalize(&raw).unwrap();
            if raw.get("fraud_rings").is_none() {
                assert!(report.fraud_rings.is_empty());
            }
            if raw.get("suspicious_accounts").is_none() {
                assert!(report.suspicious_accounts.is_empty());
            }
            if raw.get("summary").map_or(true, Value::is_null) {
                assert_eq!(report.summary, Summary::default());
            }
        }
    }

    #[test]
    fn test_non_object_is_malformed() {
        for raw in [json!([1, 2]), json!("text"), json!(null), json!(42)] {
            assert!(matches!(
                normalize(&raw),
                Err(ReportError::MalformedPayload { .. })
            ));
        }
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(matches!(
            parse_payload("not json"),
            Err(ReportError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_member_count_preserved_or_derived() {
        let raw = json!({"fraud_rings": [
            {"ring_id": "R1", "member_accounts": ["A", "B"], "member_count": 7},
            {"ring_id": "R2", "member_accounts": ["A", "B", "C"]}
        ]});
        let report = normalize(&raw).unwrap();
        assert_eq!(report.fraud_rings[0].member_count, 7);
        assert_eq!(report.fraud_rings[1].member_count, 3);
    }

    #[test]
    fn test_declared_ring_id_kept_verbatim() {
        let raw = json!({"suspicious_accounts": [
            {"account_id": "A", "ring_id": "None"},
            {"account_id": "B", "ring_id": null},
            {"account_id": "C"}
        ]});
        let report = normalize(&raw).unwrap();
        assert_eq!(report.suspicious_accounts[0].ring_id.as_deref(), Some("None"));
        assert_eq!(report.suspicious_accounts[1].ring_id, None);
        assert_eq!(report.suspicious_accounts[2].ring_id, None);
    }

    #[test]
    fn test_lenient_field_coercion() {
        let raw = json!({
            "suspicious_accounts": [
                {"account_id": 1001, "suspicion_score": "75.5", "detected_patterns": ["x", "x", "y"]},
                {"suspicion_score": 10},
                "garbage"
            ],
            "fraud_rings": [{"member_accounts": [1, "B", null], "risk_score": "bad"}],
            "summary": {"total_accounts_analyzed": 12.0, "fraud_rings_detected": -3}
        });
        let report = normalize(&raw).unwrap();

        assert_eq!(report.suspicious_accounts.len(), 1);
        let account = &report.suspicious_accounts[0];
        assert_eq!(account.account_id, "1001");
        assert_eq!(account.suspicion_score, 75.5);
        assert_eq!(account.detected_patterns, vec!["x", "y"]);

        let ring = &report.fraud_rings[0];
        assert_eq!(ring.ring_id, "");
        assert_eq!(ring.member_accounts, vec!["1", "B"]);
        assert_eq!(ring.risk_score, 0.0);

        assert_eq!(report.summary.total_accounts_analyzed, 12);
        assert_eq!(report.summary.fraud_rings_detected, 0);
    }

    #[test]
    fn test_summary_extras() {
        let raw = json!({"summary": {
            "total_transactions": 500,
            "repeat_offenders": 2,
            "processing_time_seconds": 1.25
        }});
        let summary = normalize(&raw).unwrap().summary;
        assert_eq!(summary.total_transactions, Some(500));
        assert_eq!(summary.repeat_offenders, Some(2));
        assert_eq!(summary.processing_time_seconds, Some(1.25));
        assert_eq!(summary.normal_accounts, None);
    }

    #[test]
    fn test_wrong_section_types_default() {
        let raw = json!({"fraud_rings": {"R1": []}, "suspicious_accounts": "none", "summary": []});
        let report = normalize(&raw).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.summary, Summary::default());
    }
}
