//! End-to-end tests for the `pm` binary.
//!
//! Every test runs against its own database and home directory, with
//! embeddings disabled and no reachable generator, so search uses text
//! matching and nothing touches the network.

use assert_cmd::Command;
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn initialized() -> Self {
        let sandbox = Self::new();
        sandbox.pm().arg("init").assert().success();
        sandbox
    }

    fn db(&self) -> PathBuf {
        self.dir.path().join("data").join("projmem.db")
    }

    fn pm(&self) -> Command {
        let mut cmd = Command::cargo_bin("pm").unwrap();
        cmd.env("HOME", self.dir.path())
            .env("PM_EMBEDDINGS_ENABLED", "false")
            .env("OLLAMA_ENDPOINT", "http://127.0.0.1:9")
            .env("PM_ACTOR", "tester")
            .env_remove("PM_TEST_DB")
            .env_remove("PROJMEM_DB")
            .env_remove("OPENAI_API_KEY")
            .env_remove("HF_TOKEN")
            .env_remove("PM_GENERATION_PROVIDER")
            .env_remove("RUST_LOG")
            .arg("--db")
            .arg(self.db());
        cmd
    }

    /// Run with `--json`, assert success and parse stdout.
    fn json(&self, args: &[&str]) -> Value {
        let output = self.pm().arg("--json").args(args).output().unwrap();
        assert!(
            output.status.success(),
            "pm {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    /// Run with `--json`, assert the exit code and parse the stderr error.
    fn json_err(&self, args: &[&str], code: i32) -> Value {
        let output = self.pm().arg("--json").args(args).output().unwrap();
        assert_eq!(
            output.status.code(),
            Some(code),
            "pm {args:?}: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stderr).unwrap()
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }
}

#[test]
fn init_twice_requires_force() {
    let sandbox = Sandbox::new();
    let out = sandbox.json(&["init"]);
    assert_eq!(out["recreated"], false);
    assert!(sandbox.db().exists());

    let err = sandbox.json_err(&["init"], 2);
    assert_eq!(err["error"]["code"], "ALREADY_INITIALIZED");

    let out = sandbox.json(&["init", "--force"]);
    assert_eq!(out["recreated"], true);
}

#[test]
fn commands_before_init_fail_cleanly() {
    let sandbox = Sandbox::new();
    let err = sandbox.json_err(&["project", "list"], 2);
    assert_eq!(err["error"]["code"], "NOT_INITIALIZED");
    assert!(err["error"]["hint"].as_str().unwrap().contains("pm init"));
}

#[test]
fn project_lifecycle() {
    let sandbox = Sandbox::initialized();
    let created = sandbox.json(&["project", "create", "Backend", "-d", "API services"]);
    assert!(created["id"].as_str().unwrap().starts_with("proj_"));

    let err = sandbox.json_err(&["project", "create", "backend"], 4);
    assert_eq!(err["error"]["category"], "invalid_input");

    let list = sandbox.json(&["project", "list"]);
    assert_eq!(list["count"], 1);

    let shown = sandbox.json(&["project", "show", "BACKEND"]);
    assert_eq!(shown["id"], created["id"]);
    assert_eq!(shown["decision_count"], 0);

    let err = sandbox.json_err(&["project", "show", "Frontend"], 3);
    assert_eq!(err["error"]["code"], "PROJECT_NOT_FOUND");
}

#[test]
fn decisions_are_found_by_text_without_a_provider() {
    let sandbox = Sandbox::initialized();
    sandbox.json(&["project", "create", "Backend"]);

    let added = sandbox.json(&[
        "decision", "add", "Cache invalidation via TTL", "-p", "Backend",
        "--reason", "Simpler than event-driven purging",
    ]);
    assert_eq!(added["embedded"], false);
    assert_eq!(added["embedding_state"], "missing");
    sandbox.json(&["decision", "add", "Use Postgres", "-p", "Backend"]);

    let outcome = sandbox.json(&["search", "cache", "-p", "Backend"]);
    assert_eq!(outcome["mode"], "text");
    let results = outcome["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["decision"]["title"], "Cache invalidation via TTL");
    assert_eq!(results[0]["score"], 1.0);
    assert!(outcome["answer"].is_null());

    let err = sandbox.json_err(&["search", "   ", "-p", "Backend"], 4);
    assert_eq!(err["error"]["code"], "REQUIRED_FIELD");

    let err = sandbox.json_err(&["search", "cache", "-p", "Backend", "-l", "0"], 4);
    assert_eq!(err["error"]["code"], "INVALID_ARGUMENT");
}

#[test]
fn decision_update_and_delete() {
    let sandbox = Sandbox::initialized();
    sandbox.json(&["project", "create", "Backend"]);
    let added = sandbox.json(&["decision", "add", "Use Redis", "-p", "Backend", "-d", "For sessions"]);
    let id = added["id"].as_str().unwrap();

    let updated = sandbox.json(&["decision", "update", id, "--description", ""]);
    assert!(updated["description"].is_null());
    assert_eq!(updated["title"], "Use Redis");

    sandbox.json_err(&["decision", "update", id], 4);

    sandbox.json(&["decision", "delete", id]);
    let err = sandbox.json_err(&["decision", "show", id], 3);
    assert_eq!(err["error"]["code"], "DECISION_NOT_FOUND");
}

#[test]
fn embedding_a_decision_needs_a_provider() {
    let sandbox = Sandbox::initialized();
    let err = sandbox.json_err(&["decision", "embed"], 9);
    assert_eq!(err["error"]["code"], "PROVIDER_NOT_CONFIGURED");
    assert_eq!(err["error"]["category"], "service_unavailable");
}

#[test]
fn task_import_merges_by_title() {
    let sandbox = Sandbox::initialized();
    sandbox.json(&["project", "create", "Backend"]);
    sandbox.json(&["task", "add", "Fix login bug", "-p", "Backend"]);

    let file = sandbox.write(
        "tasks.json",
        r#"[{"title": "fix login bug.", "status": "done"}, "Write docs", {"status": "done"}]"#,
    );
    let file = file.to_str().unwrap();

    let stats = sandbox.json(&["task", "import", "-p", "Backend", "--file", file]);
    assert_eq!(stats["created"], 1);
    assert_eq!(stats["updated"], 1);
    assert_eq!(stats["skipped"], 0);
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["mode"], "merge");

    let again = sandbox.json(&["task", "import", "-p", "Backend", "--file", file]);
    assert_eq!(again["created"], 0);
    assert_eq!(again["skipped"], 2);

    let done = sandbox.json(&["task", "list", "-p", "Backend", "--status", "completed"]);
    assert_eq!(done["count"], 1);
    assert_eq!(done["tasks"][0]["title"], "Fix login bug");
}

#[test]
fn task_import_reads_stdin_in_create_new_mode() {
    let sandbox = Sandbox::initialized();
    sandbox.json(&["project", "create", "Backend"]);

    let output = sandbox
        .pm()
        .args(["--json", "task", "import", "-p", "Backend", "--file", "-", "--mode", "create_new"])
        .write_stdin(r#"["Ship v2", "ship v2"]"#)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stats: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["created"], 2);
    assert_eq!(stats["mode"], "create_new");
}

#[test]
fn task_import_rejects_non_arrays() {
    let sandbox = Sandbox::initialized();
    sandbox.json(&["project", "create", "Backend"]);
    let file = sandbox.write("task.json", r#"{"title": "Not a list"}"#);

    let err = sandbox.json_err(&["task", "import", "-p", "Backend", "--file", file.to_str().unwrap()], 4);
    assert_eq!(err["error"]["code"], "INVALID_ARGUMENT");
}

#[test]
fn task_status_flags_are_validated() {
    let sandbox = Sandbox::initialized();
    sandbox.json(&["project", "create", "Backend"]);
    let task = sandbox.json(&["task", "add", "Deploy", "-p", "Backend", "--priority", "urgent"]);
    assert_eq!(task["priority"], "high");
    let id = task["id"].as_str().unwrap();

    let updated = sandbox.json(&["task", "update", id, "--status", "wip"]);
    assert_eq!(updated["status"], "in_progress");

    let err = sandbox.json_err(&["task", "update", id, "--status", "someday"], 4);
    assert_eq!(err["error"]["code"], "INVALID_ARGUMENT");
}

#[test]
fn extraction_without_generator_is_service_unavailable() {
    let sandbox = Sandbox::initialized();
    sandbox.json(&["project", "create", "Backend"]);
    let recording = sandbox.json(&[
        "recording", "add", "Standup", "-p", "Backend", "--transcript", "We need to rotate the API keys.",
    ]);
    let id = recording["id"].as_str().unwrap();

    let shown = sandbox.json(&["recording", "show", id]);
    assert_eq!(shown["kind"], "voice");

    let err = sandbox.json_err(&["task", "extract", "--recording", id], 9);
    assert_eq!(err["error"]["code"], "PROVIDER_NOT_CONFIGURED");

    let err = sandbox.json_err(&["task", "extract", "--recording", "rec_missing"], 3);
    assert_eq!(err["error"]["code"], "RECORDING_NOT_FOUND");
}

#[test]
fn version_and_completions() {
    let sandbox = Sandbox::new();
    let version = sandbox.json(&["version"]);
    assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));

    let output = sandbox.pm().args(["completions", "bash"]).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("pm"));
}
