//! Ring aggregation and statistics.
//!
//! This module derives repeat-offender statistics and tier counts from a
//! normalized report.

use crate::models::{Account, RepeatOffender, RiskTier, Ring};
use std::collections::HashMap;

/// Per-account accumulator while walking the rings.
#[derive(Debug, Default)]
struct Membership {
    ring_ids: Vec<String>,
    pattern_types: Vec<String>,
    scores: Vec<f64>,
}

/// Find accounts listed in two or more distinct rings.
///
/// Rings are walked in input order. A ring id already recorded for an account
/// is not counted again, so an account listed twice in one ring (or in two
/// rings sharing an id) counts once. Output is sorted by ring count, highest
/// first; ties keep first-appearance order.
pub fn compute_repeat_offenders(rings: &[Ring]) -> Vec<RepeatOffender> {
    let mut order: Vec<&str> = Vec::new();
    let mut memberships: HashMap<&str, Membership> = HashMap::new();

    for ring in rings {
        for account in &ring.member_accounts {
            let entry = memberships.entry(account.as_str()).or_insert_with(|| {
                order.push(account.as_str());
                Membership::default()
            });

            if !entry.ring_ids.contains(&ring.ring_id) {
                entry.ring_ids.push(ring.ring_id.clone());
                entry.pattern_types.push(ring.pattern_type.clone());
                entry.scores.push(ring.risk_score);
            }
        }
    }

    let mut offenders: Vec<RepeatOffender> = order
        .into_iter()
        .filter_map(|account| {
            let membership = memberships.remove(account)?;
            if membership.ring_ids.len() < 2 {
                return None;
            }

            let avg_risk_score =
                membership.scores.iter().sum::<f64>() / membership.scores.len() as f64;

            let mut pattern_types: Vec<String> = Vec::new();
            for pattern in membership.pattern_types {
                if !pattern_types.contains(&pattern) {
                    pattern_types.push(pattern);
                }
            }

            Some(RepeatOffender {
                account_id: account.to_string(),
                ring_count: membership.ring_ids.len(),
                ring_ids: membership.ring_ids,
                pattern_types,
                avg_risk_score,
            })
        })
        .collect();

    // Vec::sort_by_key is stable.
    offenders.sort_by_key(|o| std::cmp::Reverse(o.ring_count));

    offenders
}

/// Round to one decimal place, half away from zero.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Counts of rows per risk tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierBreakdown {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl TierBreakdown {
    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }

    /// The highest tier with at least one entry.
    pub fn worst(&self) -> Option<RiskTier> {
        if self.high > 0 {
            Some(RiskTier::High)
        } else if self.medium > 0 {
            Some(RiskTier::Medium)
        } else if self.low > 0 {
            Some(RiskTier::Low)
        } else {
            None
        }
    }

    fn add(&mut self, tier: RiskTier) {
        match tier {
            RiskTier::High => self.high += 1,
            RiskTier::Medium => self.medium += 1,
            RiskTier::Low => self.low += 1,
        }
    }
}

/// Bucket scores into tiers.
pub fn tier_breakdown(scores: impl IntoIterator<Item = f64>) -> TierBreakdown {
    let mut breakdown = TierBreakdown::default();
    for score in scores {
        breakdown.add(RiskTier::from_score(score));
    }
    breakdown
}

/// Tier counts over ring risk scores.
pub fn ring_tiers(rings: &[Ring]) -> TierBreakdown {
    tier_breakdown(rings.iter().map(|r| r.risk_score))
}

/// Tier counts over account suspicion scores.
pub fn account_tiers(accounts: &[Account]) -> TierBreakdown {
    tier_breakdown(accounts.iter().map(|a| a.suspicion_score))
}

/// Number of rings per pattern type, most common first.
pub fn pattern_distribution(rings: &[Ring]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for ring in rings {
        match counts.iter_mut().find(|(p, _)| *p == ring.pattern_type) {
            Some((_, n)) => *n += 1,
            None => counts.push((ring.pattern_type.clone(), 1)),
        }
    }
    counts.sort_by_key(|(_, n)| std::cmp::Reverse(*n));
    counts
}
