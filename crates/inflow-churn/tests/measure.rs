use std::path::Path;

use git2::{Repository, Signature, Time};
use inflow_churn::{aggregate, mine_numstat, ChurnReport, MiningOptions};

fn commit_all(repo: &Repository, files: &[(&str, &str)], when: i64) {
    let workdir = repo.workdir().unwrap();
    let mut index = repo.index().unwrap();
    for (path, content) in files {
        let full = workdir.join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(&full, content).unwrap();
        index.add_path(Path::new(path)).unwrap();
    }
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::new("bob", "bob@example.com", &Time::new(when, 0)).unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, "work", &tree, &parents)
        .unwrap();
}

#[test]
fn repository_churn_report_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();

    commit_all(
        &repo,
        &[
            ("README.md", "# demo\n"),
            ("src/lib.rs", "fn a() {}\nfn b() {}\n"),
            ("src/net/client.rs", "struct C;\n"),
        ],
        1_700_000_000,
    );
    commit_all(
        &repo,
        &[("src/lib.rs", "fn a() {}\nfn c() {}\nfn d() {}\n")],
        1_700_000_100,
    );

    let entries = mine_numstat(dir.path(), &MiningOptions::default()).unwrap();
    let report = aggregate(&entries);

    // lib.rs: +2 then (-1, +2)
    let lib = report.files["src/lib.rs"];
    assert_eq!((lib.added, lib.removed, lib.total_churn), (4, 1, 5));
    assert_eq!(report.modules["src"].total_churn, 5);
    assert_eq!(report.modules["src/net"].total_churn, 1);
    assert_eq!(report.modules["."].total_churn, 1);

    let top = report.top_files(1);
    assert_eq!(top[0].0, "src/lib.rs");

    let out = dir.path().join("churn_results.json");
    report.save_json(&out).unwrap();
    let reloaded: ChurnReport =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(reloaded, report);
}
