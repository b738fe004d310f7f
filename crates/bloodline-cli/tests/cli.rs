use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("bloodline").unwrap();
        cmd.env("BLOODLINE_CONFIG", self.dir.path().join("config.toml"))
            .env_remove("RUST_LOG")
            .arg("--data-dir")
            .arg(self.dir.path().join("data"));
        cmd
    }

    fn import(&self, json: &str) {
        let file = self.dir.path().join("herd.json");
        std::fs::write(&file, json).unwrap();
        self.cmd()
            .arg("import")
            .arg(&file)
            .assert()
            .success()
            .stdout(predicate::str::contains("Imported"));
    }
}

const HERD: &str = r#"[
  {"id": "sire", "name": "Storm Warden", "sex": "male", "stats": {"speed": 80, "stamina": 60}},
  {"id": "dam", "name": "Quiet Meadow", "sex": "female", "stats": {"speed": 65, "stamina": 75}},
  {"id": "foal", "name": "Little Gale", "sex": "male", "sire_id": "sire", "dam_id": "dam",
   "traits": {"positive": ["brave", "confident", "social"]}}
]"#;

#[test]
fn test_help() {
    Command::cargo_bin("bloodline")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("inbreeding"))
        .stdout(predicate::str::contains("compat"));
}

#[test]
fn test_horse_add_and_get() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["horse", "add", "Comet", "--id", "comet", "--sex", "mare"])
        .args(["--stat", "speed=72", "--positive", "calm"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added horse: Comet (comet)"));

    let output = sandbox
        .cmd()
        .args(["--format", "json", "horse", "get", "comet"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let horse: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(horse["name"], "Comet");
    assert_eq!(horse["sex"], "female");
    assert_eq!(horse["traits"]["positive"][0], "calm");
}

#[test]
fn test_get_missing_horse_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["horse", "get", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_import_then_inbreeding() {
    let sandbox = Sandbox::new();
    sandbox.import(HERD);

    let output = sandbox
        .cmd()
        .args(["-f", "json", "inbreeding", "foal", "dam"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!((result["coefficient"].as_f64().unwrap() - 0.25).abs() < 1e-9);
    assert_eq!(result["common_ancestors"][0]["animal_id"], "dam");
}

#[test]
fn test_import_rejects_existing_without_merge() {
    let sandbox = Sandbox::new();
    sandbox.import(HERD);

    let file = sandbox.dir.path().join("herd.json");
    sandbox
        .cmd()
        .arg("import")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--merge"));

    sandbox
        .cmd()
        .arg("import")
        .arg(&file)
        .arg("--merge")
        .assert()
        .success();
}

#[test]
fn test_diversity_empty_database() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .cmd()
        .args(["--format", "json", "diversity"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["population_size"], 0);
}

#[test]
fn test_traits_reports_emergent_property() {
    let sandbox = Sandbox::new();
    sandbox.import(HERD);

    sandbox
        .cmd()
        .args(["traits", "foal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bold Companion"))
        .stdout(predicate::str::contains("confidence cluster"));
}

#[test]
fn test_traits_partial_override_keeps_recorded_stress() {
    let sandbox = Sandbox::new();
    sandbox.import(
        r#"[{"id": "h", "name": "Ember", "traits": {"positive": ["brave"]},
             "behavior": {"stress_level": 90, "bond_score": 20}}]"#,
    );

    let stability = |extra: &[&str]| {
        let output = sandbox
            .cmd()
            .args(["-f", "json", "traits", "h"])
            .args(extra)
            .output()
            .unwrap();
        assert!(output.status.success());
        let graph: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        graph["graph"]["stability"].clone()
    };

    let recorded = stability(&[]);
    let bonded = stability(&["--bond", "80"]);
    let recorded_penalty = recorded["stress_penalty"].as_f64().unwrap();
    assert!((recorded_penalty - 0.27).abs() < 1e-9);
    assert!((bonded["stress_penalty"].as_f64().unwrap() - recorded_penalty).abs() < 1e-9);
    assert!(bonded["protective_factors"]
        .as_array()
        .unwrap()
        .iter()
        .any(|f| f == "Strong handler bond"));

    let calmed = stability(&["--stress", "10"]);
    assert!((calmed["stress_penalty"].as_f64().unwrap() - 0.03).abs() < 1e-9);
}

#[test]
fn test_compat_scores_pair() {
    let sandbox = Sandbox::new();
    sandbox.import(HERD);

    let output = sandbox
        .cmd()
        .args(["-f", "json", "compat", "sire", "dam"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["inbreeding_coefficient"], 0.0);
    let score = result["score"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&score));
}

#[test]
fn test_compat_with_itself_fails() {
    let sandbox = Sandbox::new();
    sandbox.import(HERD);

    sandbox
        .cmd()
        .args(["compat", "foal", "foal"])
        .assert()
        .failure();
}

#[test]
fn test_config_path_honors_env() {
    let sandbox = Sandbox::new();
    let expected = sandbox.dir.path().join("config.toml");

    sandbox
        .cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.to_string_lossy().as_ref()));

    sandbox
        .cmd()
        .args(["config", "set", "default_depth", "6"])
        .assert()
        .success();
    sandbox
        .cmd()
        .args(["config", "get", "default_depth"])
        .assert()
        .success()
        .stdout(predicate::str::contains("6"));
}

#[test]
fn test_config_list_shows_resolved_analysis() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Lineage depth: 4"))
        .stdout(predicate::str::contains("Compatibility depth: 5"))
        .stdout(predicate::str::contains("Trait catalog: built-in"));

    let catalog = sandbox.dir.path().join("catalog.toml");
    std::fs::write(
        &catalog,
        r#"
[[emergent_rules]]
name = "Trail Boss"
requires = ["calm", "brave"]
strength = 0.6
polarity = "beneficial"
"#,
    )
    .unwrap();
    sandbox
        .cmd()
        .args(["config", "set", "catalog_path"])
        .arg(&catalog)
        .assert()
        .success();
    sandbox
        .cmd()
        .args(["config", "set", "default_depth", "7"])
        .assert()
        .success();

    sandbox
        .cmd()
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Lineage depth: 7"))
        .stdout(predicate::str::contains("0 synergy clusters, 0 conflict pairs, 1 emergent rules"));
}

#[test]
fn test_completions() {
    Command::cargo_bin("bloodline")
        .unwrap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bloodline"));
}
