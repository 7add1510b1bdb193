use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use serde_json::json;
use tempfile::TempDir;

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_prefvault"))
}

/// An isolated HOME with its own XDG directories.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    fn initialized() -> Self {
        let sandbox = Self::new();
        sandbox.run_ok(&["init"]);
        sandbox
    }

    fn keyfile(&self) -> PathBuf {
        self.dir
            .path()
            .join("config")
            .join("prefvault")
            .join("prefvault.key")
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(bin());
        cmd.args(args)
            .env("HOME", self.dir.path())
            .env("XDG_CONFIG_HOME", self.dir.path().join("config"))
            .env("XDG_DATA_HOME", self.dir.path().join("data"))
            .env_remove("PREFVAULT_ENCRYPTION_KEY")
            .env_remove("PREFVAULT_CONFIG")
            .env_remove("PREFVAULT_DB")
            .env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command(args).output().expect("run prefvault")
    }

    fn run_with_key(&self, key: &str, args: &[&str]) -> Output {
        self.command(args)
            .env("PREFVAULT_ENCRYPTION_KEY", key)
            .output()
            .expect("run prefvault")
    }

    fn run_ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "{:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).expect("utf8 stdout")
    }

    fn add_user(&self, id: &str) {
        let username = format!("user-{}", id);
        let email = format!("{}@example.com", id);
        self.run_ok(&["user", "add", &username, &email, "--id", id]);
    }

    fn prefs_json(&self, user_id: &str) -> serde_json::Value {
        let stdout = self.run_ok(&["prefs", "get", user_id, "--json"]);
        serde_json::from_str(&stdout).expect("prefs get --json prints JSON")
    }
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_put_then_get_json() {
    let sandbox = Sandbox::initialized();
    sandbox.add_user("u1");

    sandbox.run_ok(&[
        "prefs",
        "put",
        "u1",
        r#"{"order_created": true, "newsletter": false}"#,
    ]);

    assert_eq!(
        sandbox.prefs_json("u1"),
        json!({"order_created": true, "newsletter": false})
    );
}

#[test]
fn test_get_without_saved_preferences_is_empty_object() {
    let sandbox = Sandbox::initialized();
    sandbox.add_user("u1");

    assert_eq!(sandbox.prefs_json("u1"), json!({}));
    assert_eq!(sandbox.prefs_json("nobody"), json!({}));
}

#[test]
fn test_second_put_replaces_whole_mapping() {
    let sandbox = Sandbox::initialized();
    sandbox.add_user("u1");

    let first = sandbox.run_ok(&["prefs", "put", "u1", r#"{"a": true, "b": true}"#]);
    assert!(first.contains("Saved"));
    let second = sandbox.run_ok(&["prefs", "put", "u1", r#"{"c": false}"#]);
    assert!(second.contains("Replaced"));

    assert_eq!(sandbox.prefs_json("u1"), json!({"c": false}));
    assert_eq!(sandbox.run_ok(&["-q", "status"]).trim(), "1 1");
}

#[test]
fn test_set_overlays_flags() {
    let sandbox = Sandbox::initialized();
    sandbox.add_user("u1");
    sandbox.run_ok(&["prefs", "put", "u1", r#"{"a": true, "b": true}"#]);

    sandbox.run_ok(&["prefs", "set", "u1", "b=false", "c=true"]);

    assert_eq!(
        sandbox.prefs_json("u1"),
        json!({"a": true, "b": false, "c": true})
    );
}

#[test]
fn test_put_reads_wrapped_payload_from_stdin() {
    let sandbox = Sandbox::initialized();
    sandbox.add_user("u1");

    let mut child = sandbox
        .command(&["prefs", "put", "u1", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn prefvault");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(br#"{"preferences": {"digest": true}}"#)
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait");
    assert!(output.status.success(), "{}", stderr(&output));

    assert_eq!(sandbox.prefs_json("u1"), json!({"digest": true}));
}

#[test]
fn test_put_for_unknown_user_exits_not_found() {
    let sandbox = Sandbox::initialized();

    let output = sandbox.run(&["prefs", "put", "ghost", r#"{"a": true}"#]);

    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("User not found: ghost"));
    assert_eq!(sandbox.run_ok(&["-q", "status"]).trim(), "0 0");
}

#[test]
fn test_invalid_payload_exits_invalid_input() {
    let sandbox = Sandbox::initialized();
    sandbox.add_user("u1");

    for payload in [r#"{"a": 1}"#, "[true]", "not json"] {
        let output = sandbox.run(&["prefs", "put", "u1", payload]);
        assert_eq!(output.status.code(), Some(4), "payload {}", payload);
    }
    assert_eq!(sandbox.prefs_json("u1"), json!({}));
}

#[test]
fn test_duplicate_user_exits_invalid_input() {
    let sandbox = Sandbox::initialized();
    sandbox.add_user("u1");

    let output = sandbox.run(&["user", "add", "someone", "else@example.com", "--id", "u1"]);

    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_missing_keyfile_exits_config_error() {
    let sandbox = Sandbox::initialized();
    sandbox.add_user("u1");
    std::fs::remove_file(sandbox.keyfile()).expect("remove keyfile");

    let output = sandbox.run(&["prefs", "get", "u1"]);

    assert_eq!(output.status.code(), Some(5));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_prefs_before_init_exits_config_error() {
    let sandbox = Sandbox::new();

    let output = sandbox.run(&["prefs", "get", "u1"]);

    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("PREFVAULT_ENCRYPTION_KEY"));
}

#[test]
fn test_user_commands_before_init_exit_not_found() {
    let sandbox = Sandbox::new();

    let output = sandbox.run(&["user", "show", "u1"]);

    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("prefvault init"));
}

#[test]
fn test_short_env_key_exits_config_error() {
    let sandbox = Sandbox::initialized();

    let output = sandbox.run_with_key("c2hvcnQ=", &["prefs", "get", "u1"]);

    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("32 bytes"));
}

#[test]
fn test_wrong_key_load_failure_is_opaque() {
    let sandbox = Sandbox::initialized();
    sandbox.add_user("u1");
    sandbox.run_ok(&["prefs", "put", "u1", r#"{"a": true}"#]);
    let other_key = sandbox.run_ok(&["keygen"]).trim().to_string();

    let output = sandbox.run_with_key(&other_key, &["prefs", "get", "u1"]);

    assert_eq!(output.status.code(), Some(7));
    assert!(output.stdout.is_empty());
    assert!(stderr(&output).contains("Error: Failed to load notification preferences."));

    // The keyfile still opens the record.
    assert_eq!(sandbox.prefs_json("u1"), json!({"a": true}));
}

#[test]
fn test_keygen_prints_base64_key() {
    let sandbox = Sandbox::new();

    let first = sandbox.run_ok(&["keygen"]).trim().to_string();
    let second = sandbox.run_ok(&["keygen"]).trim().to_string();

    assert_eq!(first.len(), 44);
    assert!(first.ends_with('='));
    assert_ne!(first, second);
}

#[test]
fn test_init_keeps_existing_keyfile() {
    let sandbox = Sandbox::initialized();
    let key_before = std::fs::read_to_string(sandbox.keyfile()).expect("read keyfile");

    let output = sandbox.run(&["init"]);
    assert_eq!(output.status.code(), Some(4));

    let stdout = sandbox.run_ok(&["init", "--force"]);
    assert!(stdout.contains("(existing)"));
    let key_after = std::fs::read_to_string(sandbox.keyfile()).expect("read keyfile");
    assert_eq!(key_before, key_after);
}

#[test]
fn test_user_remove_drops_preferences() {
    let sandbox = Sandbox::initialized();
    sandbox.add_user("u1");
    sandbox.run_ok(&["prefs", "put", "u1", r#"{"a": true}"#]);

    sandbox.run_ok(&["user", "remove", "u1"]);

    assert_eq!(sandbox.run_ok(&["-q", "status"]).trim(), "0 0");
    let output = sandbox.run(&["user", "show", "u1"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_user_show_json() {
    let sandbox = Sandbox::initialized();
    sandbox.add_user("u1");

    let stdout = sandbox.run_ok(&["user", "show", "u1", "--json"]);
    let user: serde_json::Value = serde_json::from_str(&stdout).expect("json");

    assert_eq!(user["id"], "u1");
    assert_eq!(user["username"], "user-u1");
    assert_eq!(user["email"], "u1@example.com");
}
