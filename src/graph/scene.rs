//! Graph scene assembly: node classes, ring edges and render-time motion.

use super::layout::{collect_accounts, layout, Layout, LayoutParams};
use crate::models::{GraphEdge, GraphNode, NodeClass, NormalizedReport, Position3D, Ring};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Everything an external 3D renderer needs for one report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphScene {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Nodes are placeholders, not real accounts.
    pub synthetic: bool,
    pub radius: f64,
}

impl GraphScene {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Class lookup for one report.
pub struct Classifier<'a> {
    suspicious: HashSet<&'a str>,
    ring_members: HashSet<&'a str>,
}

impl<'a> Classifier<'a> {
    pub fn new(report: &'a NormalizedReport) -> Self {
        Self {
            suspicious: report
                .suspicious_accounts
                .iter()
                .map(|a| a.account_id.as_str())
                .collect(),
            ring_members: report
                .fraud_rings
                .iter()
                .flat_map(|r| r.member_accounts.iter().map(String::as_str))
                .collect(),
        }
    }

    /// Suspicious overrides ring member, which overrides normal.
    pub fn classify(&self, account_id: &str) -> NodeClass {
        if self.suspicious.contains(account_id) {
            NodeClass::Suspicious
        } else if self.ring_members.contains(account_id) {
            NodeClass::RingMember
        } else {
            NodeClass::Normal
        }
    }
}

/// Every pair of members within each ring, by list position `i < j`.
///
/// A ring of `k` members yields `k * (k - 1) / 2` edges. Pairs that share
/// several rings appear once per ring.
pub fn derive_edges(rings: &[Ring]) -> Vec<GraphEdge> {
    let mut edges = Vec::new();
    for ring in rings {
        let members = &ring.member_accounts;
        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                edges.push(GraphEdge {
                    source: members[i].clone(),
                    target: members[j].clone(),
                    ring_id: ring.ring_id.clone(),
                });
            }
        }
    }
    edges
}

/// Lay out and classify every account of a report.
pub fn build_scene(report: &NormalizedReport, params: &LayoutParams) -> (GraphScene, Layout) {
    let accounts = collect_accounts(report, params);
    let positions = layout(&accounts.ids, params);
    let classifier = Classifier::new(report);

    let nodes: Vec<GraphNode> = positions
        .iter()
        .map(|(id, position)| {
            let class = classifier.classify(id);
            GraphNode {
                account_id: id.to_string(),
                position,
                class,
                color: class.color().to_string(),
            }
        })
        .collect();

    let edges = derive_edges(&report.fraud_rings);

    debug!(
        "Built scene: {} nodes, {} edges, radius {:.1}{}",
        nodes.len(),
        edges.len(),
        positions.radius(),
        if accounts.synthetic { " (synthetic)" } else { "" }
    );

    let scene = GraphScene {
        nodes,
        edges,
        synthetic: accounts.synthetic,
        radius: positions.radius(),
    };

    (scene, positions)
}

/// Vertical bob applied by a renderer at draw time, never stored in the layout.
#[allow(dead_code)] // Used by renderers consuming the scene document
pub fn float_offset(index: usize, elapsed_ms: f64) -> f64 {
    (elapsed_ms * 0.002 + index as f64 * 0.5).sin() * 5.0
}

/// Control point for drawing an edge as an arc: the midpoint lifted by `lift` on Y.
pub fn arc_midpoint(a: Position3D, b: Position3D, lift: f64) -> Position3D {
    Position3D::new(
        (a.x + b.x) * 0.5,
        (a.y + b.y) * 0.5 + lift,
        (a.z + b.z) * 0.5,
    )
}

/// Y lift of an edge arc's control point.
pub const ARC_LIFT: f64 = 30.0;

/// An edge with its endpoints resolved, ready to draw as an arc.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneEdge<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub ring_id: &'a str,
    pub from: Position3D,
    pub to: Position3D,
    pub control: Position3D,
}

/// Serializable scene handed to an external renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneDocument<'a> {
    pub synthetic: bool,
    pub radius: f64,
    pub nodes: &'a [GraphNode],
    pub edges: Vec<SceneEdge<'a>>,
}

/// Resolve edge endpoints against the layout. Edges touching an unplaced
/// account are left out.
pub fn scene_document<'a>(scene: &'a GraphScene, positions: &Layout) -> SceneDocument<'a> {
    let edges = scene
        .edges
        .iter()
        .filter_map(|edge| {
            let from = positions.get(&edge.source)?;
            let to = positions.get(&edge.target)?;
            Some(SceneEdge {
                source: &edge.source,
                target: &edge.target,
                ring_id: &edge.ring_id,
                from,
                to,
                control: arc_midpoint(from, to, ARC_LIFT),
            })
        })
        .collect();

    SceneDocument {
        synthetic: scene.synthetic,
        radius: scene.radius,
        nodes: &scene.nodes,
        edges,
    }
}
