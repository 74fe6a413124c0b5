//! End-to-end batch runs: task list in, delivered reports out.

mod common;

use std::io::Write as _;
use std::path::Path;

use common::{syntax_error, table};
use pathhound::config::{Conventions, TaskConfig};
use pathhound::deliver::{HtmlTemplate, ResultDeliverer};
use pathhound::job::{Job, JobKind, OutputFormat};
use pathhound::session::FixtureSession;
use pathhound::{DeliveryError, JobError, JobOutcome, JobRunner, tasks};
use proptest::prelude::*;
use serde_json::json;
use tempfile::{NamedTempFile, TempDir};

const USERS_QUERY: &str = "MATCH (n:User) RETURN n.name";

fn users_session() -> FixtureSession {
    FixtureSession::new(|query, _| {
        if query == USERS_QUERY {
            Ok(table(
                &["n.name"],
                vec![vec![json!("A")], vec![json!("B")], vec![json!("C")]],
            ))
        } else if query.starts_with("MATCH") {
            Ok(table(&["c.name"], vec![vec![json!("PC1")]]))
        } else {
            Err(syntax_error(query))
        }
    })
}

fn build_from_lines(lines: &[&str]) -> Vec<Job> {
    let mut file = NamedTempFile::new().expect("create temp file");
    for line in lines {
        writeln!(file, "{line}").expect("write task line");
    }
    let config = TaskConfig {
        task_file: Some(file.path().to_path_buf()),
        ..TaskConfig::default()
    };
    tasks::build(&config).expect("task list builds").jobs
}

fn run(
    session: &FixtureSession,
    dir: &TempDir,
    jobs: &[Job],
) -> (pathhound::BatchOutcome, String) {
    let conventions = Conventions::default();
    let deliverer = ResultDeliverer::new(dir.path(), HtmlTemplate::default(), Vec::new());
    let mut runner = JobRunner::new(session, &conventions, deliverer);
    let outcome = runner.run(jobs);
    let printed = String::from_utf8(runner.into_deliverer().into_stdout()).expect("utf8 output");
    (outcome, printed)
}

#[test]
fn domain_users_scenario_prints_three_rows() {
    let jobs = build_from_lines(&[r#"["Domain Users","STDOUT","","MATCH (n:User) RETURN n.name"]"#]);
    let dir = TempDir::new().expect("create temp dir");

    let (outcome, printed) = run(&users_session(), &dir, &jobs);

    assert_eq!(outcome.delivered(), 1);
    assert!(printed.contains("n.name\n------\nA\nB\nC\n"), "got: {printed}");
    assert_eq!(outcome.manifest.entries()[0].row_count, 3);
}

#[test]
fn malformed_query_fails_and_next_job_still_delivers() {
    let jobs = build_from_lines(&[
        r#"["Broken","CSV","broken.csv","RETRN n"]"#,
        r#"["Users","CSV","users.csv","MATCH (n:User) RETURN n.name"]"#,
    ]);
    let dir = TempDir::new().expect("create temp dir");

    let (outcome, _) = run(&users_session(), &dir, &jobs);

    assert_eq!(outcome.attempted(), 2);
    assert_eq!(outcome.delivered(), 1);
    match &outcome.outcomes[0] {
        JobOutcome::Failed(failure) => {
            assert_eq!(failure.title, "Broken");
            assert_eq!(failure.error.kind(), "query");
        }
        JobOutcome::Delivered { .. } => panic!("broken query should fail"),
    }
    assert!(outcome.outcomes[1].is_delivered());
    assert!(!dir.path().join("broken.csv").exists());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("users.csv")).expect("users.csv"),
        "n.name\nA\nB\nC\n"
    );
}

#[test]
fn report_index_lists_prior_jobs_in_order() {
    let jobs = build_from_lines(&[
        r#"["Domain Users","HTML","users.html","MATCH (n:User) RETURN n.name"]"#,
        r#"["Computers","CSV","computers.csv","MATCH (c:Computer) RETURN c.name"]"#,
        r#"["Index","HTML","index.html","REPORT-INDEX"]"#,
        r#"["Late","CSV","late.csv","MATCH (n:User) RETURN n.name"]"#,
    ]);
    let dir = TempDir::new().expect("create temp dir");

    let (outcome, _) = run(&users_session(), &dir, &jobs);
    assert_eq!(outcome.delivered(), 4);

    let index = std::fs::read_to_string(dir.path().join("index.html")).expect("index written");
    assert_eq!(index.matches("<tr><td>").count(), 2);
    assert_eq!(index.matches("<a href=").count(), 2);
    let users = index.find("users.html").expect("users link");
    let computers = index.find("computers.csv").expect("computers link");
    assert!(users < computers);
    assert!(!index.contains("late.csv"));

    let index_entry = &outcome.manifest.entries()[2];
    assert_eq!(index_entry.row_count, 2);
    assert_eq!(index_entry.format, OutputFormat::Html);
}

#[test]
fn zip_tasks_archives_files_so_far_without_manifest_entry() {
    let jobs = build_from_lines(&[
        r#"["Users","HTMLCSV","users","MATCH (n:User) RETURN n.name"]"#,
        r#"["Console","STDOUT","","MATCH (n:User) RETURN n.name"]"#,
        r#"{"type":"zip_tasks","title":"Bundle","path":"bundle.zip"}"#,
    ]);
    let dir = TempDir::new().expect("create temp dir");

    let (outcome, _) = run(&users_session(), &dir, &jobs);

    assert_eq!(outcome.delivered(), 3);
    assert_eq!(outcome.manifest.len(), 2);
    let archive = zip::ZipArchive::new(
        std::fs::File::open(dir.path().join("bundle.zip")).expect("archive written"),
    )
    .expect("valid zip");
    let mut names: Vec<&str> = archive.file_names().collect();
    names.sort_unstable();
    assert_eq!(names, vec!["users.csv", "users.html"]);
}

#[test]
fn delivery_failure_is_contained() {
    let dir = TempDir::new().expect("create temp dir");
    // A regular file where the output subdirectory should be.
    std::fs::write(dir.path().join("blocked"), "").expect("write blocker");
    let jobs = vec![
        Job::new(
            "Blocked",
            OutputFormat::Csv,
            "blocked/users.csv",
            JobKind::Query {
                query: USERS_QUERY.to_string(),
            },
        )
        .expect("valid job"),
        Job::new(
            "Users",
            OutputFormat::Json,
            "users.json",
            JobKind::Query {
                query: USERS_QUERY.to_string(),
            },
        )
        .expect("valid job"),
    ];

    let (outcome, _) = run(&users_session(), &dir, &jobs);

    assert_eq!(outcome.delivered(), 1);
    let failure = outcome.failures().next().expect("one failure");
    assert_eq!(failure.error.kind(), "delivery");
    assert!(dir.path().join("users.json").is_file());
}

#[test]
fn query_without_records_has_nothing_to_tabulate() {
    let session = FixtureSession::new(|_, _| Ok(table(&["n.name"], vec![])));
    let dir = TempDir::new().expect("create temp dir");
    let nobody = |format: OutputFormat, output: &str| {
        Job::new(
            "Nobody",
            format,
            output,
            JobKind::Query {
                query: "MATCH (n:Nobody) RETURN n.name".to_string(),
            },
        )
        .expect("valid job")
    };
    let jobs = vec![nobody(OutputFormat::Csv, "nobody.csv"), nobody(OutputFormat::Stdout, "")];

    let (outcome, printed) = run(&session, &dir, &jobs);

    let failure = outcome.failures().next().expect("CSV job fails");
    assert_eq!(failure.index, 0);
    assert!(matches!(
        failure.error,
        JobError::Delivery(DeliveryError::NothingToTabulate { .. })
    ));
    assert!(!dir.path().join("nobody.csv").exists());

    assert_eq!(outcome.delivered(), 1);
    assert!(printed.contains("(no records)"), "got: {printed}");
    assert_eq!(outcome.manifest.entries()[0].row_count, 0);
}

#[test]
fn empty_batch_delivers_nothing() {
    let dir = TempDir::new().expect("create temp dir");
    let (outcome, printed) = run(&users_session(), &dir, &[]);

    assert_eq!(outcome.attempted(), 0);
    assert_eq!(outcome.delivered(), 0);
    assert!(outcome.manifest.is_empty());
    assert!(printed.is_empty());
}

#[test]
fn index_on_empty_manifest_still_renders() {
    let dir = TempDir::new().expect("create temp dir");
    let jobs = vec![
        Job::new("Index", OutputFormat::Html, "index.html", JobKind::ReportIndex)
            .expect("valid job"),
    ];

    let (outcome, _) = run(&users_session(), &dir, &jobs);

    assert_eq!(outcome.delivered(), 1);
    let index = std::fs::read_to_string(dir.path().join("index.html")).expect("index written");
    assert!(index.contains("<th>Further Details</th>"));
    assert_eq!(index.matches("<tr><td>").count(), 0);
}

fn query_job(index: usize, fails: bool) -> Job {
    let query = if fails { "RETRN".to_string() } else { USERS_QUERY.to_string() };
    Job::new(
        format!("job {index}"),
        OutputFormat::Csv,
        Path::new(&format!("job-{index}.csv")),
        JobKind::Query { query },
    )
    .expect("valid job")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn every_job_is_accounted_for_once(failures in prop::collection::vec(any::<bool>(), 0..12)) {
        let dir = TempDir::new().expect("create temp dir");
        let jobs: Vec<Job> = failures
            .iter()
            .enumerate()
            .map(|(index, fails)| query_job(index, *fails))
            .collect();

        let (outcome, _) = run(&users_session(), &dir, &jobs);

        let failed = outcome.failures().count();
        prop_assert_eq!(outcome.delivered() + failed, jobs.len());
        prop_assert_eq!(failed, failures.iter().filter(|f| **f).count());
        prop_assert_eq!(outcome.manifest.len(), outcome.delivered());
        let indices: Vec<usize> = outcome
            .outcomes
            .iter()
            .map(|o| match o {
                JobOutcome::Delivered { index, .. } => *index,
                JobOutcome::Failed(failure) => failure.index,
            })
            .collect();
        prop_assert_eq!(indices, (0..jobs.len()).collect::<Vec<_>>());
    }
}
