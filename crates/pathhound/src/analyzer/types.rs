//! Path analysis data model.
//!
//! Field names serialize in camelCase so that JSON output keeps the
//! established `graphs` / `mostUsedRelationships` shape.

use serde::Serialize;

/// A node on an attack path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PathNode {
    /// Node name.
    pub id: String,
}

/// One hop of an attack path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PathLink {
    /// Node the relationship leaves.
    pub source: String,
    /// Node the relationship enters.
    pub target: String,
    /// Relationship type.
    pub relationship: String,
}

/// A load-bearing hop: removing it disconnects the path's endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Actionable {
    /// Relationship type.
    pub relationship_name: String,
    /// Node the relationship leaves.
    pub from_node: String,
    /// Node the relationship enters.
    pub to_node: String,
}

/// A discovered attack path and its load-bearing hops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathGraph {
    /// Nodes from start to end.
    pub nodes: Vec<PathNode>,
    /// Hops in path order.
    pub links: Vec<PathLink>,
    /// Hops whose removal breaks the path, in path order.
    pub actionables: Vec<Actionable>,
}

impl PathGraph {
    /// First node name.
    #[must_use]
    pub fn start(&self) -> &str {
        self.nodes.first().map_or("", |node| node.id.as_str())
    }

    /// Last node name.
    #[must_use]
    pub fn target(&self) -> &str {
        self.nodes.last().map_or("", |node| node.id.as_str())
    }
}

/// How many retained paths pass through a `(target, relationship)` hop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipUsage {
    /// Node the relationship enters.
    pub target_node: String,
    /// Relationship type.
    pub relationship_type: String,
    /// Number of retained paths with at least one such hop.
    pub count: usize,
}

/// Outcome of an attack-path analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathResult {
    /// Retained paths, longest first.
    pub graphs: Vec<PathGraph>,
    /// Relationship ranking, most used first.
    pub most_used_relationships: Vec<RelationshipUsage>,
}

/// One busiest-path ranking entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusiestPath {
    /// Number of distinct principals inheriting the start node's path.
    pub count: u64,
    /// Start node name.
    pub name: String,
}

/// A path as returned by a discovery query, before edge checks.
///
/// `relationships` and `relationship_ids` each hold one entry per hop, so
/// they are one shorter than `nodes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DiscoveredPath {
    pub nodes: Vec<String>,
    pub relationships: Vec<String>,
    pub relationship_ids: Vec<i64>,
}

impl DiscoveredPath {
    pub(crate) fn new(
        nodes: Vec<String>,
        relationships: Vec<String>,
        relationship_ids: Vec<i64>,
    ) -> Option<Self> {
        let hops = nodes.len().checked_sub(1)?;
        if hops == 0 || relationships.len() != hops || relationship_ids.len() != hops {
            return None;
        }
        Some(Self {
            nodes,
            relationships,
            relationship_ids,
        })
    }

    pub(crate) fn links(&self) -> impl Iterator<Item = (usize, PathLink)> + '_ {
        self.relationships
            .iter()
            .enumerate()
            .map(|(hop, relationship)| {
                (
                    hop,
                    PathLink {
                        source: self.nodes[hop].clone(),
                        target: self.nodes[hop + 1].clone(),
                        relationship: relationship.clone(),
                    },
                )
            })
    }
}
