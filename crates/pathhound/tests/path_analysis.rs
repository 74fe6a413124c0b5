//! Attack-path discovery and busiest-path ranking against fixture graphs.

mod common;

use common::{FixturePath, busiest_session, param_str, path_session};
use pathhound::analyzer::{Actionable, BusiestPath};
use pathhound::config::Conventions;
use pathhound::session::{FixtureSession, SessionError};
use pathhound::{AnalysisError, BusiestMode, NodeClass, NodeSelector, PathAnalyzer};
use rstest::rstest;
use serde_json::json;

const DA: &str = "DOMAIN ADMINS@CORP.LOCAL";

// === Attack-path discovery ===

#[test]
fn computer_with_single_admin_edge_has_one_actionable() {
    let session = path_session(
        vec![FixturePath::new(&["PC1.CORP.LOCAL", DA], &["AdminTo"], &[1])],
        &[],
    );
    let conventions = Conventions::default();

    let result = PathAnalyzer::new(&session, &conventions)
        .analyze_path(&NodeSelector::Class(NodeClass::Computer), None)
        .expect("analysis succeeds");

    assert_eq!(result.graphs.len(), 1);
    assert_eq!(
        result.graphs[0].actionables,
        vec![Actionable {
            relationship_name: "AdminTo".to_string(),
            from_node: "PC1.CORP.LOCAL".to_string(),
            to_node: DA.to_string(),
        }]
    );
    assert_eq!(result.most_used_relationships.len(), 1);
    assert_eq!(result.most_used_relationships[0].count, 1);

    let calls = session.calls();
    let discovery = &calls[0];
    assert!(discovery.query.contains("(n:Computer)"));
    assert_eq!(discovery.params.get("prefix"), Some(&json!("DOMAIN ADMINS@")));
}

#[test]
fn bypassable_edges_are_not_actionable() {
    let session = path_session(
        vec![FixturePath::new(
            &["ALICE@CORP.LOCAL", "HELPDESK@CORP.LOCAL", DA],
            &["MemberOf", "GenericAll"],
            &[10, 11],
        )],
        &[11],
    );
    let conventions = Conventions::default();

    let result = PathAnalyzer::new(&session, &conventions)
        .analyze_path(&NodeSelector::Class(NodeClass::User), None)
        .expect("analysis succeeds");

    let actionables = &result.graphs[0].actionables;
    assert_eq!(actionables.len(), 1);
    assert_eq!(actionables[0].relationship_name, "MemberOf");
    assert_eq!(result.graphs[0].links.len(), 2);
}

#[test]
fn paths_without_load_bearing_edges_are_dropped() {
    let session = path_session(
        vec![
            FixturePath::new(&["BOB@CORP.LOCAL", DA], &["GenericWrite"], &[20]),
            FixturePath::new(&["PC2.CORP.LOCAL", DA], &["AdminTo"], &[21]),
        ],
        &[20],
    );
    let conventions = Conventions::default();

    let result = PathAnalyzer::new(&session, &conventions)
        .analyze_path(&NodeSelector::Class(NodeClass::User), None)
        .expect("analysis succeeds");

    assert_eq!(result.graphs.len(), 1);
    assert_eq!(result.graphs[0].start(), "PC2.CORP.LOCAL");
}

#[test]
fn shorter_path_covered_by_longer_one_is_dropped_and_longest_sorts_first() {
    let session = path_session(
        vec![
            FixturePath::new(&["IT@CORP.LOCAL", DA], &["MemberOf"], &[2]),
            FixturePath::new(&["CAROL@CORP.LOCAL", DA], &["GenericAll"], &[3]),
            FixturePath::new(
                &["ALICE@CORP.LOCAL", "IT@CORP.LOCAL", DA],
                &["MemberOf", "MemberOf"],
                &[1, 2],
            ),
        ],
        &[],
    );
    let conventions = Conventions::default();

    let result = PathAnalyzer::new(&session, &conventions)
        .analyze_path(&NodeSelector::Class(NodeClass::User), None)
        .expect("analysis succeeds");

    let starts: Vec<&str> = result.graphs.iter().map(|g| g.start()).collect();
    assert_eq!(starts, vec!["ALICE@CORP.LOCAL", "CAROL@CORP.LOCAL"]);
    let ranking: Vec<(&str, &str, usize)> = result
        .most_used_relationships
        .iter()
        .map(|usage| {
            (
                usage.target_node.as_str(),
                usage.relationship_type.as_str(),
                usage.count,
            )
        })
        .collect();
    assert_eq!(
        ranking,
        vec![
            (DA, "GenericAll", 1),
            (DA, "MemberOf", 1),
            ("IT@CORP.LOCAL", "MemberOf", 1),
        ]
    );
}

#[test]
fn analysis_is_idempotent() {
    let paths = || {
        vec![
            FixturePath::new(&["B@CORP.LOCAL", DA], &["AdminTo"], &[5]),
            FixturePath::new(&["A@CORP.LOCAL", DA], &["AdminTo"], &[6]),
            FixturePath::new(&["C@CORP.LOCAL", "G@CORP.LOCAL", DA], &["MemberOf", "Owns"], &[7, 8]),
        ]
    };
    let conventions = Conventions::default();

    let first_session = path_session(paths(), &[8]);
    let second_session = path_session(paths(), &[8]);
    let first = PathAnalyzer::new(&first_session, &conventions)
        .analyze_path(&NodeSelector::Class(NodeClass::User), None)
        .expect("first run");
    let second = PathAnalyzer::new(&second_session, &conventions)
        .analyze_path(&NodeSelector::Class(NodeClass::User), None)
        .expect("second run");

    assert_eq!(first, second);
    let starts: Vec<&str> = first.graphs.iter().map(|g| g.start()).collect();
    assert_eq!(starts, vec!["C@CORP.LOCAL", "A@CORP.LOCAL", "B@CORP.LOCAL"]);
}

#[test]
fn node_names_are_bound_as_parameters() {
    let session = path_session(
        vec![FixturePath::new(&["ALICE@CORP.LOCAL\"}) DETACH DELETE (x", DA], &["AdminTo"], &[1])],
        &[],
    );
    let conventions = Conventions::default();

    PathAnalyzer::new(&session, &conventions)
        .analyze_path(
            &NodeSelector::Named("ALICE@CORP.LOCAL\"}) DETACH DELETE (x".to_string()),
            Some(DA),
        )
        .expect("analysis succeeds");

    for call in session.calls() {
        assert!(!call.query.contains("DETACH DELETE"), "name leaked into {}", call.query);
    }
    let calls = session.calls();
    let discovery = &calls[0];
    assert_eq!(param_str(&discovery.params, "end"), DA);
}

#[test]
fn query_failure_fails_the_whole_analysis() {
    let session = FixtureSession::new(|query, _| {
        if query.contains("AS bypassed") {
            Err(SessionError::Timeout(std::time::Duration::from_secs(300)))
        } else {
            Ok(common::table(
                &["nodes", "relationships", "relationship_ids"],
                vec![vec![json!(["PC1", "DA"]), json!(["AdminTo"]), json!([1])]],
            ))
        }
    });
    let conventions = Conventions::default();

    let error = PathAnalyzer::new(&session, &conventions)
        .analyze_path(&NodeSelector::Class(NodeClass::Computer), None)
        .expect_err("timeout propagates");

    assert!(matches!(
        error,
        AnalysisError::Session(SessionError::Timeout(_))
    ));
}

#[test]
fn custom_conventions_reach_the_queries() {
    let session = path_session(vec![], &[]);
    let conventions = Conventions::from_yaml(
        "privileged_group_prefix: \"ENTERPRISE ADMINS@\"\ntarget_label: AZGroup\n",
    )
    .expect("valid conventions");

    let result = PathAnalyzer::new(&session, &conventions)
        .analyze_path(&NodeSelector::Class(NodeClass::User), None)
        .expect("analysis succeeds");

    assert!(result.graphs.is_empty());
    let calls = session.calls();
    let discovery = &calls[0];
    assert!(discovery.query.contains("(m:AZGroup)"));
    assert_eq!(param_str(&discovery.params, "prefix"), "ENTERPRISE ADMINS@");
}

// === Busiest-path ranking ===

#[test]
fn busiest_paths_rank_by_count_then_name() {
    let session = busiest_session(
        &["U1@CORP.LOCAL", "U2@CORP.LOCAL", "U1@CORP.LOCAL", "G3@CORP.LOCAL"],
        &[("U1@CORP.LOCAL", 3), ("U2@CORP.LOCAL", 7), ("G3@CORP.LOCAL", 3)],
    );
    let conventions = Conventions::default();

    let ranking = PathAnalyzer::new(&session, &conventions)
        .find_busiest_path(BusiestMode::All, None)
        .expect("ranking succeeds");

    assert_eq!(
        ranking,
        vec![
            BusiestPath { count: 7, name: "U2@CORP.LOCAL".to_string() },
            BusiestPath { count: 3, name: "G3@CORP.LOCAL".to_string() },
            BusiestPath { count: 3, name: "U1@CORP.LOCAL".to_string() },
        ]
    );
    let counting_calls = session
        .calls()
        .iter()
        .filter(|call| call.query.contains("AS principals"))
        .count();
    assert_eq!(counting_calls, 3, "duplicate start nodes are counted once");
}

#[test]
fn busiest_limit_truncates_after_sorting() {
    let session = busiest_session(
        &["A", "B", "C"],
        &[("A", 1), ("B", 9), ("C", 5)],
    );
    let conventions = Conventions::default();

    let ranking = PathAnalyzer::new(&session, &conventions)
        .find_busiest_path(BusiestMode::Short, Some(2))
        .expect("ranking succeeds");

    let names: Vec<&str> = ranking.iter().map(|entry| entry.name.as_str()).collect();
    assert_eq!(names, vec!["B", "C"]);
    assert!(session.calls()[0].query.contains("= shortestPath("));
}

#[rstest]
#[case::text(Some(json!("garbage")))]
#[case::negative(Some(json!(-3)))]
#[case::fraction(Some(json!(2.5)))]
#[case::no_record(None)]
fn uninterpretable_principal_count_fails_the_ranking(#[case] count: Option<serde_json::Value>) {
    let session = FixtureSession::new(move |query, _| {
        if query.contains("RETURN n.name AS start") {
            Ok(common::table(&["start"], vec![vec![json!("U1")]]))
        } else {
            let rows = count.iter().map(|value| vec![value.clone()]).collect();
            Ok(common::table(&["principals"], rows))
        }
    });
    let conventions = Conventions::default();

    let error = PathAnalyzer::new(&session, &conventions)
        .find_busiest_path(BusiestMode::Short, None)
        .expect_err("garbled count is not a ranking");

    assert!(matches!(error, AnalysisError::MalformedPath(_)), "got {error:?}");
}
