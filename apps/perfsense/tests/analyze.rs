use perfsense::augment::{parse_json_reply, InsightProvider, RemoteInsight};
use perfsense::config::resolve_effective;
use perfsense::scan::{run_scan, ScanOptions};
use perfsense::syntax::SourceLanguage;
use perfsense::{analyze_source, AnalyzeOptions, Severity};
use std::fs;
use tempfile::tempdir;

fn ts() -> AnalyzeOptions<'static> {
    AnalyzeOptions {
        language: SourceLanguage::TypeScript,
        ..AnalyzeOptions::default()
    }
}

#[test]
fn promise_all_over_map_is_reported_once_at_its_line() {
    let src = "const a = 1;\nconst rows = Promise.all(ids.map(id => load(id)));\n";
    let res = analyze_source(src, &ts());
    assert_eq!(res.issues.len(), 1);
    assert_eq!(res.issues[0].code, "PROMISE_ALL_MAP");
    assert_eq!(res.issues[0].severity, Severity::Warning);
    assert_eq!(res.issues[0].line, Some(2));
}

#[test]
fn awaited_map_is_a_critical_n_plus_one() {
    let res = analyze_source("async function g() { await users.map(u => u.id); }", &ts());
    assert_eq!(res.issues.len(), 1);
    assert_eq!(res.issues[0].title, "N+1 Query Pattern Detected");
    assert_eq!(res.issues[0].severity, Severity::Critical);
    assert_eq!(res.issues[0].impact, Some(70));
}

#[test]
fn metrics_scale_with_critical_count() {
    let src = (0..5)
        .map(|i| format!("async function f{i}() {{ await xs.map(g); }}\n"))
        .collect::<String>();
    let res = analyze_source(&src, &ts());
    assert_eq!(res.issues.len(), 5);
    assert_eq!(res.metrics.database_load, 7.5);
    assert_eq!(res.metrics.network_requests, 75.0);
    assert_eq!(res.metrics.potential_improvement, 80.0);
    assert!(res
        .recommendations
        .iter()
        .any(|r| r.title == "Implement Request Batching"));
    assert!(res
        .recommendations
        .iter()
        .any(|r| r.title == "Optimize Database Queries"));
}

#[test]
fn garbage_never_panics() {
    for src in ["", "}}}{{{", "await (", "\u{0}\u{1}", "<div>{</div>"] {
        let res = analyze_source(src, &AnalyzeOptions::default());
        if res.issues.iter().any(|i| i.code == "ANALYSIS_ERROR") {
            assert_eq!(res.metrics.database_load, 0.0);
            assert_eq!(res.metrics.network_requests, 0.0);
        }
    }
}

struct ReplyInsight(&'static str);

impl InsightProvider for ReplyInsight {
    fn insights(&self, _source: &str) -> RemoteInsight {
        parse_json_reply(self.0)
    }
}

#[test]
fn remote_reply_flows_into_result() {
    let provider = ReplyInsight(
        r#"Sure! {"loadTimeImpact": 6.5, "databaseEfficiency": 0, "potentialImprovement": "35%",
            "issues": [{"type": "warning", "title": "Chatty API", "message": "Too many calls"}]}"#,
    );
    let opts = AnalyzeOptions {
        insight: Some(&provider),
        ..ts()
    };
    let res = analyze_source("async function g() { await users.map(load); }", &opts);
    assert_eq!(res.issues.len(), 2);
    assert_eq!(res.issues[1].title, "Chatty API");
    assert_eq!(res.issues[1].description, "Too many calls");
    assert_eq!(res.metrics.load_time, 6.5);
    // zero remote value keeps the local figure
    assert_eq!(res.metrics.database_load, 1.5);
    assert_eq!(res.metrics.potential_improvement, 35.0);
}

#[test]
fn configured_patterns_drive_the_scan() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join(".git")).unwrap();
    fs::create_dir_all(root.join("web/pages")).unwrap();
    fs::write(
        root.join("perfsense.toml"),
        "output = \"json\"\n[analyze]\npatterns = [\"web/**/*.tsx\"]\n",
    )
    .unwrap();
    fs::write(
        root.join("web/pages/list.tsx"),
        "export default async function List() {\n  const rows = await ids.map(fetchRow);\n  return <ul>{rows}</ul>;\n}\n",
    )
    .unwrap();
    fs::write(root.join("web/ignored.ts"), "await xs.map(f);\n").unwrap();

    let eff = resolve_effective(root.to_str(), None, &[], None);
    assert_eq!(eff.output, "json");
    let res = run_scan(&eff.repo_root, &eff.patterns, &ScanOptions::default());
    assert_eq!(res.summary.files, 1);
    assert_eq!(res.files[0].file, "web/pages/list.tsx");
    assert_eq!(res.summary.critical, 1);
    assert_eq!(res.files[0].result.issues[0].line, Some(2));
}
