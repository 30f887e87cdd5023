//! Application state.
//!
//! A [`Session`] holds at most one current report and its layout. Loading a
//! new payload replaces both; a rejected payload leaves them untouched.

use crate::analysis::{account_tiers, compute_repeat_offenders, ring_tiers, TierBreakdown};
use crate::error::ReportError;
use crate::graph::{build_scene, GraphScene, Layout, LayoutParams};
use crate::ingest::{normalize, parse_payload};
use crate::models::{NormalizedReport, RepeatOffender};
use crate::report::{write_export, ReportDocument, ReportTables};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

/// A normalized report with everything derived from it.
#[derive(Debug, Clone)]
pub struct LoadedReport {
    pub report: NormalizedReport,
    pub repeat_offenders: Vec<RepeatOffender>,
    pub tables: ReportTables,
    pub ring_tiers: TierBreakdown,
    pub account_tiers: TierBreakdown,
    pub loaded_at: DateTime<Utc>,
}

/// The graph scene of the current report.
#[derive(Debug, Clone)]
pub struct CurrentLayout {
    pub scene: GraphScene,
    pub positions: Layout,
}

pub struct Session {
    params: LayoutParams,
    report: Option<LoadedReport>,
    layout: Option<CurrentLayout>,
}

impl Session {
    pub fn new(params: LayoutParams) -> Self {
        Self {
            params,
            report: None,
            layout: None,
        }
    }

    /// Normalize `raw`, derive its views and scene, and make it current.
    pub fn load_report(&mut self, raw: &Value) -> Result<&LoadedReport, ReportError> {
        let report = normalize(raw)?;
        Ok(self.install(report))
    }

    /// Parse payload text, then load it.
    pub fn load_text(&mut self, text: &str) -> Result<&LoadedReport, ReportError> {
        let report = parse_payload(text)?;
        Ok(self.install(report))
    }

    fn install(&mut self, report: NormalizedReport) -> &LoadedReport {
        let repeat_offenders = compute_repeat_offenders(&report.fraud_rings);
        let tables = ReportTables::project(&report, &repeat_offenders);
        let (scene, positions) = build_scene(&report, &self.params);

        info!(
            "Loaded report: {} rings, {} suspicious accounts, {} repeat offenders",
            report.fraud_rings.len(),
            report.suspicious_accounts.len(),
            repeat_offenders.len()
        );

        let loaded = LoadedReport {
            ring_tiers: ring_tiers(&report.fraud_rings),
            account_tiers: account_tiers(&report.suspicious_accounts),
            report,
            repeat_offenders,
            tables,
            loaded_at: Utc::now(),
        };

        self.layout = Some(CurrentLayout { scene, positions });
        self.report.insert(loaded)
    }

    pub fn current_report(&self) -> Option<&LoadedReport> {
        self.report.as_ref()
    }

    pub fn current_layout(&self) -> Option<&CurrentLayout> {
        self.layout.as_ref()
    }

    /// Renderable view of the current report.
    pub fn document<'a>(
        &'a self,
        source: &'a str,
        processing_time: Option<f64>,
    ) -> Option<ReportDocument<'a>> {
        let loaded = self.report.as_ref()?;
        let layout = self.layout.as_ref()?;
        Some(ReportDocument {
            source,
            generated_at: loaded.loaded_at,
            summary: &loaded.report.summary,
            tables: &loaded.tables,
            scene: &layout.scene,
            ring_tiers: loaded.ring_tiers,
            account_tiers: loaded.account_tiers,
            processing_time: processing_time
                .or(loaded.report.summary.processing_time_seconds),
        })
    }

    /// Export the current report into `dir`. `Ok(None)` when nothing is loaded.
    pub fn export_current(&self, dir: &Path) -> anyhow::Result<Option<PathBuf>> {
        match self.report.as_ref() {
            Some(loaded) => write_export(&loaded.report, dir, Utc::now()).map(Some),
            None => Ok(None),
        }
    }

    #[allow(dead_code)] // Used when a front end resets between reports
    pub fn clear(&mut self) {
        self.report = None;
        self.layout = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(ring_id: &str) -> Value {
        json!({
            "suspicious_accounts": [{"account_id": "A", "suspicion_score": 90}],
            "fraud_rings": [
                {"ring_id": ring_id, "pattern_type": "cycle", "member_accounts": ["A", "B"], "risk_score": 90},
                {"ring_id": "R9", "pattern_type": "fan_in", "member_accounts": ["A", "C"], "risk_score": 50}
            ],
            "summary": {"total_accounts_analyzed": 3}
        })
    }

    #[test]
    fn test_load_report_derives_everything() {
        let mut session = Session::new(LayoutParams::default());
        let loaded = session.load_report(&payload("R1")).unwrap();

        assert_eq!(loaded.repeat_offenders.len(), 1);
        assert_eq!(loaded.repeat_offenders[0].avg_risk_score, 70.0);
        assert_eq!(loaded.tables.rings.rows().len(), 2);
        assert_eq!(loaded.ring_tiers.high, 1);

        let layout = session.current_layout().unwrap();
        assert_eq!(layout.scene.nodes.len(), 3);
        assert_eq!(layout.positions.len(), 3);
    }

    #[test]
    fn test_sample_service_result() {
        let mut session = Session::new(LayoutParams::default());
        let loaded = session
            .load_text(include_str!("../fixtures/sample_result.json"))
            .unwrap();

        assert_eq!(loaded.report.suspicious_accounts.len(), 4);
        assert_eq!(loaded.report.summary.total_transactions, Some(1250));
        assert_eq!(loaded.report.suspicious_accounts[3].ring_id.as_deref(), Some("None"));

        assert_eq!(loaded.repeat_offenders.len(), 1);
        assert_eq!(loaded.repeat_offenders[0].account_id, "ACC_1003");
        assert_eq!(loaded.repeat_offenders[0].ring_ids, vec!["RING_001", "RING_002"]);

        assert_eq!(
            loaded.account_tiers,
            TierBreakdown {
                high: 2,
                medium: 1,
                low: 1
            }
        );

        let layout = session.current_layout().unwrap();
        assert_eq!(layout.scene.nodes.len(), 8);
        assert_eq!(layout.scene.edges.len(), 3 + 10);
        assert!(!layout.scene.synthetic);
    }

    #[test]
    fn test_last_write_wins() {
        let mut session = Session::new(LayoutParams::default());
        session.load_report(&payload("R1")).unwrap();
        session.load_report(&payload("R2")).unwrap();

        let current = session.current_report().unwrap();
        assert_eq!(current.report.fraud_rings[0].ring_id, "R2");
    }

    #[test]
    fn test_rejected_payload_keeps_current() {
        let mut session = Session::new(LayoutParams::default());
        session.load_report(&payload("R1")).unwrap();

        assert!(session.load_report(&json!([])).is_err());
        assert!(session.load_text("{broken").is_err());

        assert_eq!(
            session.current_report().unwrap().report.fraud_rings[0].ring_id,
            "R1"
        );
        assert!(session.current_layout().is_some());
    }

    #[test]
    fn test_document_prefers_client_timing() {
        let mut session = Session::new(LayoutParams::default());
        session
            .load_text(r#"{"summary": {"processing_time_seconds": 2.5}}"#)
            .unwrap();

        assert_eq!(
            session.document("x", None).unwrap().processing_time,
            Some(2.5)
        );
        assert_eq!(
            session.document("x", Some(4.0)).unwrap().processing_time,
            Some(4.0)
        );
    }

    #[test]
    fn test_export_current() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut session = Session::new(LayoutParams::default());
        assert!(session.export_current(dir.path()).unwrap().is_none());

        session.load_report(&payload("R1")).unwrap();
        let path = session.export_current(dir.path()).unwrap().unwrap();
        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            parse_payload(&written).unwrap(),
            session.current_report().unwrap().report
        );
    }

    #[test]
    fn test_clear() {
        let mut session = Session::new(LayoutParams::default());
        assert!(session.document("x", None).is_none());
        session.load_report(&payload("R1")).unwrap();
        session.clear();
        assert!(session.current_report().is_none());
        assert!(session.current_layout().is_none());
    }
}
