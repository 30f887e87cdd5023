//! Data models for the report client.
//!
//! This module contains the canonical report representation produced by
//! normalization, plus the derived structures (repeat offenders, graph
//! nodes and edges) computed from it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Display bucket derived from a 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    /// Score of 50 or below
    Low,
    /// Score above 50, up to and including 80
    Medium,
    /// Score above 80
    High,
}

impl RiskTier {
    /// Classify a score. Both thresholds are strict, so 80 is medium and 50 is low.
    pub fn from_score(score: f64) -> Self {
        if score > 80.0 {
            RiskTier::High
        } else if score > 50.0 {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    /// CSS class used by the HTML surface.
    pub fn css_class(&self) -> &'static str {
        match self {
            RiskTier::Low => "score-low",
            RiskTier::Medium => "score-medium",
            RiskTier::High => "score-high",
        }
    }

    /// Returns an emoji representation of the tier.
    pub fn emoji(&self) -> &'static str {
        match self {
            RiskTier::Low => "🟢",
            RiskTier::Medium => "🟡",
            RiskTier::High => "🔴",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTier::Low => write!(f, "Low"),
            RiskTier::Medium => write!(f, "Medium"),
            RiskTier::High => write!(f, "High"),
        }
    }
}

/// An account flagged by the analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Opaque account identifier, unique within a report.
    pub account_id: String,
    /// Suspicion score in the 0-100 range.
    pub suspicion_score: f64,
    /// Detected pattern tags, first occurrence order, no duplicates.
    pub detected_patterns: Vec<String>,
    /// Ring id declared by the service. Kept verbatim, even the literal `"None"`,
    /// and never reconciled with the ring member lists.
    pub ring_id: Option<String>,
}

/// A group of accounts flagged together for a coordinated pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    pub ring_id: String,
    pub pattern_type: String,
    /// Member ids in service order. The same account may appear in several rings.
    pub member_accounts: Vec<String>,
    /// Declared member count. Only derived from the list when the service omits it.
    pub member_count: u64,
    pub risk_score: f64,
}

/// Headline counters for a report.
///
/// The three core counters are independent of each other and of the lists;
/// nothing cross-checks them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_accounts_analyzed: u64,
    pub suspicious_accounts_flagged: u64,
    pub fraud_rings_detected: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_transactions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_accounts_detected: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal_accounts: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_offenders: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_ring_members: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_seconds: Option<f64>,
}

/// The canonical report. Field order here is the field order of exports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedReport {
    pub suspicious_accounts: Vec<Account>,
    pub fraud_rings: Vec<Ring>,
    pub summary: Summary,
}

impl NormalizedReport {
    /// True when there is nothing to tabulate. Not an error.
    pub fn is_empty(&self) -> bool {
        self.suspicious_accounts.is_empty() && self.fraud_rings.is_empty()
    }
}

/// An account that belongs to two or more distinct rings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatOffender {
    pub account_id: String,
    /// Number of distinct ring ids containing the account.
    pub ring_count: usize,
    /// Distinct ring ids, in the order the rings were listed.
    pub ring_ids: Vec<String>,
    /// Distinct pattern types of those rings.
    pub pattern_types: Vec<String>,
    /// Mean risk score over the distinct rings, unrounded.
    pub avg_risk_score: f64,
}

/// A point in scene space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Distance from the scene origin.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// How a graph node is drawn. Suspicious wins over ring membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeClass {
    Normal,
    RingMember,
    Suspicious,
}

impl NodeClass {
    /// Node fill color as a hex string.
    pub fn color(&self) -> &'static str {
        match self {
            NodeClass::Normal => "#666666",
            NodeClass::RingMember => "#ffaa00",
            NodeClass::Suspicious => "#ff3b3b",
        }
    }
}

/// A positioned account in the 3D scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub account_id: String,
    pub position: Position3D,
    pub class: NodeClass,
    pub color: String,
}

/// Two accounts listed in the same ring. Pairs repeat when they share several rings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub ring_id: String,
}
