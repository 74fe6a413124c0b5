//! Query text used by path analysis.
//!
//! Labels and relationship types come from [`Conventions`] (validated as
//! identifiers on load) because the engine does not accept parameters in
//! patterns. Node names and the privileged-group prefix are always bound
//! parameters.

use crate::config::Conventions;
use crate::job::{BusiestMode, NodeClass};

/// Columns every discovery query returns.
const PATH_PROJECTION: &str = "RETURN [x IN nodes(p) | x.name] AS nodes, \
     [r IN relationships(p) | type(r)] AS relationships, \
     [r IN relationships(p) | id(r)] AS relationship_ids";

/// Shortest paths from every node of `class` to a privileged group.
///
/// Parameters: `$prefix`.
pub(crate) fn discover_from_class(class: NodeClass, conventions: &Conventions) -> String {
    format!(
        "MATCH p = shortestPath((n:{start})-[*1..]->(m:{target})) \
         WHERE m.name STARTS WITH $prefix AND n <> m \
         {PATH_PROJECTION}",
        start = class.label(),
        target = conventions.target_label,
    )
}

/// Shortest paths from one named node to a privileged group.
///
/// Parameters: `$start`, `$prefix`.
pub(crate) fn discover_from_named(conventions: &Conventions) -> String {
    format!(
        "MATCH p = shortestPath((n {{name: $start}})-[*1..]->(m:{target})) \
         WHERE m.name STARTS WITH $prefix AND n <> m \
         {PATH_PROJECTION}",
        target = conventions.target_label,
    )
}

/// Shortest path between two named nodes.
///
/// Parameters: `$start`, `$end`.
pub(crate) fn discover_between() -> String {
    format!(
        "MATCH p = shortestPath((n {{name: $start}})-[*1..]->(m {{name: $end}})) \
         WHERE n <> m \
         {PATH_PROJECTION}"
    )
}

/// Whether `$start` still reaches `$end` once relationship
/// `$relationship_id` is excluded.
pub(crate) const EDGE_BYPASS: &str = "MATCH (n {name: $start}), (m {name: $end}) \
     OPTIONAL MATCH p = shortestPath((n)-[*1..]->(m)) \
     WHERE none(rel IN relationships(p) WHERE id(rel) = $relationship_id) \
     RETURN p IS NOT NULL AS bypassed";

/// Start nodes of shortest paths into a privileged group.
///
/// Parameters: `$prefix`.
pub(crate) fn busiest_starts(mode: BusiestMode, conventions: &Conventions) -> String {
    let function = match mode {
        BusiestMode::Short => "shortestPath",
        BusiestMode::All => "allShortestPaths",
    };
    format!(
        "MATCH p = {function}((n)-[*1..]->(m:{target})) \
         WHERE m.name STARTS WITH $prefix AND n <> m \
         RETURN n.name AS start",
        target = conventions.target_label,
    )
}

/// Distinct principals inheriting access through the structural nodes on
/// `$start`'s shortest path into a privileged group.
///
/// Parameters: `$start`, `$prefix`.
pub(crate) fn blast_radius(conventions: &Conventions) -> String {
    format!(
        "MATCH p = shortestPath((s {{name: $start}})-[*1..]->(d:{target})) \
         WHERE d.name STARTS WITH $prefix AND s <> d \
         UNWIND nodes(p) AS path_node \
         WITH path_node WHERE path_node:{structural} \
         MATCH (path_node)<-[:{membership}*1..]-(u:{principal}) \
         RETURN count(DISTINCT u) AS principals",
        target = conventions.target_label,
        structural = conventions.structural_label,
        membership = conventions.membership_relationship,
        principal = conventions.principal_label,
    )
}
