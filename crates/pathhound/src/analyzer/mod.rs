//! PathAnalyzer: attack-path discovery and busiest-path ranking.
//!
//! All traversal happens in the graph engine. The analyzer issues a
//! discovery query, then one bypass query per hop, and does the rest
//! (filtering, de-duplication, ranking) locally.

mod queries;
pub mod types;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, trace};

pub use types::{
    Actionable, BusiestPath, PathGraph, PathLink, PathNode, PathResult, RelationshipUsage,
};
use types::DiscoveredPath;

use crate::config::Conventions;
use crate::job::{BusiestMode, NodeSelector};
use crate::session::{GraphSession, Params, QueryResult, SessionError, params};

/// Errors raised during path analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A query issued by the analyzer failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A query answered with records the analyzer cannot interpret.
    #[error("malformed path data: {0}")]
    MalformedPath(String),
}

type Result<T> = std::result::Result<T, AnalysisError>;

/// Runs path analyses against a [`GraphSession`].
#[derive(Debug)]
pub struct PathAnalyzer<'a, S: ?Sized> {
    session: &'a S,
    conventions: &'a Conventions,
}

impl<'a, S: GraphSession + ?Sized> PathAnalyzer<'a, S> {
    /// Create an analyzer over `session`.
    pub fn new(session: &'a S, conventions: &'a Conventions) -> Self {
        Self {
            session,
            conventions,
        }
    }

    /// Find attack paths from `start` and their load-bearing hops.
    ///
    /// With `end` unset the target is any privileged group. Paths with no
    /// load-bearing hop are dropped, shorter paths covered by a longer one
    /// to the same target are dropped, and the rest are sorted longest
    /// first (ties by start name, then node sequence).
    ///
    /// # Errors
    ///
    /// Any failed query or uninterpretable record fails the whole analysis.
    pub fn analyze_path(&self, start: &NodeSelector, end: Option<&str>) -> Result<PathResult> {
        let (query, bound) = self.discovery_query(start, end);
        debug!(%start, end = end.unwrap_or("<privileged>"), "Discovering attack paths");
        let discovered = parse_paths(&self.run(&query, &bound)?)?;
        info!(paths = discovered.len(), "Discovered candidate paths");

        let mut checked: HashMap<(String, String, i64), bool> = HashMap::new();
        let mut graphs = Vec::with_capacity(discovered.len());

        for path in &discovered {
            let source = &path.nodes[0];
            let target = &path.nodes[path.nodes.len() - 1];
            let mut actionables = Vec::new();

            for (hop, link) in path.links() {
                let id = path.relationship_ids[hop];
                let key = (source.clone(), target.clone(), id);
                let load_bearing = match checked.get(&key) {
                    Some(known) => *known,
                    None => {
                        let answer = self.is_load_bearing(source, target, id)?;
                        checked.insert(key, answer);
                        answer
                    }
                };
                if load_bearing {
                    actionables.push(Actionable {
                        relationship_name: link.relationship.clone(),
                        from_node: link.source.clone(),
                        to_node: link.target.clone(),
                    });
                }
            }

            if actionables.is_empty() {
                trace!(%source, %target, "Path has no load-bearing hop");
                continue;
            }

            graphs.push(PathGraph {
                nodes: path
                    .nodes
                    .iter()
                    .map(|id| PathNode { id: id.clone() })
                    .collect(),
                links: path.links().map(|(_, link)| link).collect(),
                actionables,
            });
        }

        let mut graphs = drop_covered_paths(graphs);
        graphs.sort_by(|a, b| {
            b.nodes
                .len()
                .cmp(&a.nodes.len())
                .then_with(|| a.start().cmp(b.start()))
                .then_with(|| a.nodes.cmp(&b.nodes))
        });
        let most_used_relationships = rank_relationships(&graphs);

        info!(
            paths = graphs.len(),
            bypass_checks = checked.len(),
            "Attack path analysis complete"
        );
        Ok(PathResult {
            graphs,
            most_used_relationships,
        })
    }

    /// Rank start nodes by how many principals share their path into a
    /// privileged group.
    ///
    /// Sorted by count descending, then name ascending; `limit` truncates
    /// after sorting.
    ///
    /// # Errors
    ///
    /// Any failed query or uninterpretable record fails the whole ranking.
    pub fn find_busiest_path(
        &self,
        mode: BusiestMode,
        limit: Option<usize>,
    ) -> Result<Vec<BusiestPath>> {
        let prefix = params([("prefix", json!(self.conventions.privileged_group_prefix))]);
        let starts = self.run(&queries::busiest_starts(mode, self.conventions), &prefix)?;

        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for record in starts.records() {
            let name = record
                .get_str("start")
                .ok_or_else(|| AnalysisError::MalformedPath("start node has no name".to_string()))?;
            if seen.insert(name) {
                names.push(name.to_string());
            }
        }
        info!(%mode, starts = names.len(), "Counting principals per start node");

        let query = queries::blast_radius(self.conventions);
        let mut ranking = Vec::with_capacity(names.len());
        for name in names {
            let bound = params([
                ("start", json!(name)),
                ("prefix", json!(self.conventions.privileged_group_prefix)),
            ]);
            let result = self.run(&query, &bound)?;
            let count = result
                .records()
                .next()
                .and_then(|record| record.get("principals").and_then(Value::as_u64))
                .ok_or_else(|| {
                    AnalysisError::MalformedPath(format!("no principal count for {name}"))
                })?;
            trace!(start = %name, count, "Counted principals");
            ranking.push(BusiestPath { count, name });
        }

        sort_busiest(&mut ranking);
        if let Some(limit) = limit {
            ranking.truncate(limit);
        }
        Ok(ranking)
    }

    fn discovery_query(&self, start: &NodeSelector, end: Option<&str>) -> (String, Params) {
        let prefix = json!(self.conventions.privileged_group_prefix);
        match (start, end) {
            (NodeSelector::Class(class), _) => (
                queries::discover_from_class(*class, self.conventions),
                params([("prefix", prefix)]),
            ),
            (NodeSelector::Named(name), None) => (
                queries::discover_from_named(self.conventions),
                params([("start", json!(name)), ("prefix", prefix)]),
            ),
            (NodeSelector::Named(name), Some(end)) => (
                queries::discover_between(),
                params([("start", json!(name)), ("end", json!(end))]),
            ),
        }
    }

    fn is_load_bearing(&self, start: &str, end: &str, relationship_id: i64) -> Result<bool> {
        let bound = params([
            ("start", json!(start)),
            ("end", json!(end)),
            ("relationship_id", json!(relationship_id)),
        ]);
        let result = self.run(queries::EDGE_BYPASS, &bound)?;
        if result.is_empty() {
            return Err(AnalysisError::MalformedPath(format!(
                "bypass check for {start} -> {end} returned no record"
            )));
        }
        let bypassed = result
            .records()
            .any(|record| record.get("bypassed").and_then(Value::as_bool) == Some(true));
        Ok(!bypassed)
    }

    fn run(&self, query: &str, bound: &Params) -> Result<QueryResult> {
        debug!(query, params = ?bound, "Running analysis query");
        let result = self.session.run(query, bound)?;
        trace!(records = result.len(), "Analysis query returned");
        Ok(result)
    }
}

fn parse_paths(result: &QueryResult) -> Result<Vec<DiscoveredPath>> {
    result
        .records()
        .enumerate()
        .map(|(index, record)| {
            let nodes = string_list(record.get("nodes"))
                .ok_or_else(|| malformed(index, "nodes must be a list of names"))?;
            let relationships = string_list(record.get("relationships"))
                .ok_or_else(|| malformed(index, "relationships must be a list of types"))?;
            let ids = record
                .get("relationship_ids")
                .and_then(Value::as_array)
                .and_then(|ids| ids.iter().map(Value::as_i64).collect::<Option<Vec<_>>>())
                .ok_or_else(|| malformed(index, "relationship_ids must be a list of integers"))?;
            DiscoveredPath::new(nodes, relationships, ids)
                .ok_or_else(|| malformed(index, "hop counts do not match node count"))
        })
        .collect()
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    value?
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

fn malformed(index: usize, reason: &str) -> AnalysisError {
    AnalysisError::MalformedPath(format!("path {index}: {reason}"))
}

/// Drop exact duplicates, and any path whose node sequence is a proper
/// suffix of a longer retained path (same target, start already covered
/// by the longer path).
fn drop_covered_paths(graphs: Vec<PathGraph>) -> Vec<PathGraph> {
    let mut unique: Vec<PathGraph> = Vec::with_capacity(graphs.len());
    for graph in graphs {
        if !unique.iter().any(|kept| kept.nodes == graph.nodes) {
            unique.push(graph);
        }
    }

    let covered: Vec<bool> = unique
        .iter()
        .map(|shorter| {
            unique.iter().any(|longer| {
                longer.nodes.len() > shorter.nodes.len() && longer.nodes.ends_with(&shorter.nodes)
            })
        })
        .collect();

    unique
        .into_iter()
        .zip(covered)
        .filter_map(|(graph, covered)| (!covered).then_some(graph))
        .collect()
}

/// Count retained paths per `(target, relationship)` hop, most used first.
fn rank_relationships(graphs: &[PathGraph]) -> Vec<RelationshipUsage> {
    let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for graph in graphs {
        let hops: BTreeSet<(&str, &str)> = graph
            .links
            .iter()
            .map(|link| (link.target.as_str(), link.relationship.as_str()))
            .collect();
        for hop in hops {
            *counts.entry(hop).or_default() += 1;
        }
    }

    let mut usage: Vec<RelationshipUsage> = counts
        .into_iter()
        .map(|((target, relationship), count)| RelationshipUsage {
            target_node: target.to_string(),
            relationship_type: relationship.to_string(),
            count,
        })
        .collect();
    // BTreeMap order already breaks ties by target, then relationship.
    usage.sort_by(|a, b| b.count.cmp(&a.count));
    usage
}

fn sort_busiest(ranking: &mut [BusiestPath]) {
    ranking.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
}
