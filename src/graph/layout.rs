//! Deterministic 3D layout.
//!
//! Accounts are spread over a sphere with a golden-angle (Fibonacci)
//! distribution, flattened on Y. The radius grows with the node count up to
//! a cap. Positions depend only on the input order, never on time.

use crate::config::LayoutConfig;
use crate::models::{NormalizedReport, Position3D};
use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

/// Layout constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub radius_cap: f64,
    pub node_spacing: f64,
    pub y_scale: f64,
    /// Maximum number of placeholder nodes for the empty-report fallback.
    pub fallback_limit: u64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            radius_cap: 250.0,
            node_spacing: 15.0,
            y_scale: 0.5,
            fallback_limit: 10,
        }
    }
}

impl From<&LayoutConfig> for LayoutParams {
    fn from(config: &LayoutConfig) -> Self {
        Self {
            radius_cap: config.radius_cap,
            node_spacing: config.node_spacing,
            y_scale: config.y_scale,
            fallback_limit: config.fallback_limit,
        }
    }
}

impl LayoutParams {
    /// Sphere radius for `count` nodes.
    pub fn radius(&self, count: usize) -> f64 {
        (count as f64 * self.node_spacing).min(self.radius_cap)
    }
}

/// Positions keyed by account id, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    positions: Vec<(String, Position3D)>,
    index: HashMap<String, usize>,
    radius: f64,
}

impl Layout {
    pub fn get(&self, account_id: &str) -> Option<Position3D> {
        self.index.get(account_id).map(|&i| self.positions[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Position3D)> {
        self.positions.iter().map(|(id, p)| (id.as_str(), *p))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

/// Place `accounts` on the flattened sphere.
///
/// For node `i` of `n`:
/// `phi = acos(2i/n - 1)`, `theta = pi * (1 + sqrt 5) * i`, and
/// `(r sin(phi) cos(theta), r sin(phi) sin(theta) * y_scale, r cos(phi))`.
///
/// Callers must pass ids in a stable order and without duplicates; a repeated
/// id keeps its first position.
pub fn layout(accounts: &[String], params: &LayoutParams) -> Layout {
    let n = accounts.len();
    let radius = params.radius(n);
    let golden = PI * (1.0 + 5.0_f64.sqrt());

    let mut positions = Vec::with_capacity(n);
    let mut index = HashMap::with_capacity(n);

    for (i, account) in accounts.iter().enumerate() {
        let t = i as f64;
        let phi = (2.0 * (t / n as f64) - 1.0).acos();
        let theta = golden * t;

        let position = Position3D::new(
            radius * phi.sin() * theta.cos(),
            radius * phi.sin() * theta.sin() * params.y_scale,
            radius * phi.cos(),
        );

        index.entry(account.clone()).or_insert(positions.len());
        positions.push((account.clone(), position));
    }

    Layout {
        positions,
        index,
        radius,
    }
}

/// The accounts to draw, in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountSet {
    pub ids: Vec<String>,
    /// True when `ids` are placeholders, not real accounts.
    pub synthetic: bool,
}

/// Collect graph accounts: suspicious accounts first, then ring members.
/// Suspicious accounts with an empty id are not drawn.
///
/// When neither source yields an account but the summary reports a positive
/// number of analyzed accounts, placeholder ids `ACC_001`.. are produced, at
/// most `min(fallback_limit, total_accounts_analyzed)`, and the set is marked
/// synthetic.
pub fn collect_accounts(report: &NormalizedReport, params: &LayoutParams) -> AccountSet {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut ids: Vec<String> = Vec::new();

    let suspicious = report
        .suspicious_accounts
        .iter()
        .map(|a| a.account_id.as_str())
        .filter(|id| !id.is_empty());
    let members = report
        .fraud_rings
        .iter()
        .flat_map(|r| r.member_accounts.iter().map(String::as_str));

    for id in suspicious.chain(members) {
        if seen.insert(id) {
            ids.push(id.to_string());
        }
    }

    if !ids.is_empty() {
        return AccountSet {
            ids,
            synthetic: false,
        };
    }

    let total = report.summary.total_accounts_analyzed;
    if total == 0 {
        return AccountSet::default();
    }

    let count = params.fallback_limit.min(total);
    AccountSet {
        ids: (1..=count).map(|i| format!("ACC_{:03}", i)).collect(),
        synthetic: true,
    }
}
