//! Tabular projections of a report.
//!
//! Three pure views: rings, suspicious accounts and repeat offenders. Each
//! row carries its display tier. Member lists are passed through whole;
//! shortening them for display is up to the renderer.

use crate::analysis::round_to_tenth;
use crate::models::{Account, NormalizedReport, RepeatOffender, RiskTier, Ring};
use serde::Serialize;

/// Rows of a table, or the explicit absence of rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "rows", rename_all = "lowercase")]
pub enum TableView<R> {
    Empty,
    Rows(Vec<R>),
}

impl<R> TableView<R> {
    pub fn from_rows(rows: Vec<R>) -> Self {
        if rows.is_empty() {
            TableView::Empty
        } else {
            TableView::Rows(rows)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, TableView::Empty)
    }

    pub fn rows(&self) -> &[R] {
        match self {
            TableView::Empty => &[],
            TableView::Rows(rows) => rows.as_slice(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RingRow {
    pub ring_id: String,
    pub pattern_type: String,
    pub member_count: u64,
    pub risk_score: f64,
    pub tier: RiskTier,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountRow {
    pub account_id: String,
    pub suspicion_score: f64,
    pub tier: RiskTier,
    pub detected_patterns: Vec<String>,
    pub ring_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeatOffenderRow {
    pub account_id: String,
    pub ring_count: usize,
    pub ring_ids: Vec<String>,
    pub pattern_types: Vec<String>,
    /// Average risk rounded to one decimal.
    pub avg_risk_score: f64,
    /// Tier of the rounded average, so the label always agrees with the number shown.
    pub tier: RiskTier,
}

pub fn rings_view(rings: &[Ring]) -> TableView<RingRow> {
    TableView::from_rows(
        rings
            .iter()
            .map(|ring| RingRow {
                ring_id: ring.ring_id.clone(),
                pattern_type: ring.pattern_type.clone(),
                member_count: ring.member_count,
                risk_score: ring.risk_score,
                tier: RiskTier::from_score(ring.risk_score),
                members: ring.member_accounts.clone(),
            })
            .collect(),
    )
}

pub fn accounts_view(accounts: &[Account]) -> TableView<AccountRow> {
    TableView::from_rows(
        accounts
            .iter()
            .map(|account| AccountRow {
                account_id: account.account_id.clone(),
                suspicion_score: account.suspicion_score,
                tier: RiskTier::from_score(account.suspicion_score),
                detected_patterns: account.detected_patterns.clone(),
                ring_id: account.ring_id.clone(),
            })
            .collect(),
    )
}

pub fn repeat_offenders_view(offenders: &[RepeatOffender]) -> TableView<RepeatOffenderRow> {
    TableView::from_rows(
        offenders
            .iter()
            .map(|offender| {
                let avg = round_to_tenth(offender.avg_risk_score);
                RepeatOffenderRow {
                    account_id: offender.account_id.clone(),
                    ring_count: offender.ring_count,
                    ring_ids: offender.ring_ids.clone(),
                    pattern_types: offender.pattern_types.clone(),
                    avg_risk_score: avg,
                    tier: RiskTier::from_score(avg),
                }
            })
            .collect(),
    )
}

/// All three views of one report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTables {
    pub rings: TableView<RingRow>,
    pub accounts: TableView<AccountRow>,
    pub repeat_offenders: TableView<RepeatOffenderRow>,
}

impl ReportTables {
    pub fn project(report: &NormalizedReport, offenders: &[RepeatOffender]) -> Self {
        Self {
            rings: rings_view(&report.fraud_rings),
            accounts: accounts_view(&report.suspicious_accounts),
            repeat_offenders: repeat_offenders_view(offenders),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(id: &str, members: &[&str], score: f64) -> Ring {
        Ring {
            ring_id: id.to_string(),
            pattern_type: "cycle".to_string(),
            member_accounts: members.iter().map(|m| m.to_string()).collect(),
            member_count: members.len() as u64,
            risk_score: score,
        }
    }

    #[test]
    fn test_empty_views_are_explicit() {
        assert!(rings_view(&[]).is_empty());
        assert!(accounts_view(&[]).is_empty());
        assert!(repeat_offenders_view(&[]).is_empty());
        assert_eq!(rings_view(&[]).rows().len(), 0);
    }

    #[test]
    fn test_rings_view_keeps_all_members() {
        let view = rings_view(&[ring("R1", &["A", "B", "C", "D", "E"], 81.0)]);
        assert!(!view.is_empty());
        let row = &view.rows()[0];
        assert_eq!(row.members.len(), 5);
        assert_eq!(row.tier, RiskTier::High);
    }

    #[test]
    fn test_ring_tier_boundaries() {
        let view = rings_view(&[
            ring("R1", &["A"], 80.0),
            ring("R2", &["A"], 80.1),
            ring("R3", &["A"], 50.0),
        ]);
        let tiers: Vec<RiskTier> = view.rows().iter().map(|r| r.tier).collect();
        assert_eq!(tiers, vec![RiskTier::Medium, RiskTier::High, RiskTier::Low]);
    }

    #[test]
    fn test_accounts_view() {
        let accounts = vec![Account {
            account_id: "ACC_9".to_string(),
            suspicion_score: 55.0,
            detected_patterns: vec!["fan_in".to_string()],
            ring_id: Some("None".to_string()),
        }];
        let view = accounts_view(&accounts);
        assert_eq!(view.rows().len(), 1);
        assert_eq!(view.rows()[0].tier, RiskTier::Medium);
        assert_eq!(view.rows()[0].ring_id.as_deref(), Some("None"));
    }

    #[test]
    fn test_repeat_offender_row_rounds_before_tiering() {
        let offender = RepeatOffender {
            account_id: "A".to_string(),
            ring_count: 2,
            ring_ids: vec!["R1".to_string(), "R2".to_string()],
            pattern_types: vec!["cycle".to_string()],
            avg_risk_score: 80.04,
        };
        let view = repeat_offenders_view(&[offender]);
        let row = &view.rows()[0];
        assert_eq!(row.avg_risk_score, 80.0);
        assert_eq!(row.tier, RiskTier::Medium);
    }

    #[test]
    fn test_project_report() {
        let report = NormalizedReport {
            fraud_rings: vec![ring("R1", &["A", "B"], 90.0), ring("R2", &["A"], 50.0)],
            ..Default::default()
        };
        let offenders = crate::analysis::compute_repeat_offenders(&report.fraud_rings);
        let tables = ReportTables::project(&report, &offenders);

        assert_eq!(tables.rings.rows().len(), 2);
        assert!(tables.accounts.is_empty());
        assert_eq!(tables.repeat_offenders.rows()[0].avg_risk_score, 70.0);
    }

    #[test]
    fn test_empty_view_serializes_state() {
        let json = serde_json::to_string(&accounts_view(&[])).unwrap();
        assert_eq!(json, r#"{"state":"empty"}"#);
    }
}
