//! End-to-end tests for the harness binary
//!
//! These drive the real `pairtest` binary against the `mock_pair` stand-in
//! subject over loopback TCP. Each test gets its own port and environment
//! root so the tests can run in parallel.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

/// Test context with per-test paths and config
struct TestContext {
    temp_dir: PathBuf,
    scenario_dir: PathBuf,
    config_path: PathBuf,
}

impl TestContext {
    /// Create a new test context bound to its own loopback port.
    fn new(test_name: &str, port: u16) -> Self {
        let temp_dir = std::env::temp_dir().join("pairtest-tests").join(test_name);

        // Clean up any previous test artifacts
        let _ = fs::remove_dir_all(&temp_dir);
        fs::create_dir_all(&temp_dir).expect("create temp dir");

        let scenario_dir = temp_dir.join("scenarios");
        fs::create_dir_all(&scenario_dir).expect("create scenario dir");

        let mock_bin = env!("CARGO_BIN_EXE_mock_pair");
        let env_root = temp_dir.join("env");

        let config = format!(
            r#"
[subject]
binary = "{mock_bin}"
config = "config.toml"
listen_addr = "127.0.0.1:{port}"
connect_addr = "127.0.0.1:{port}"
identity = "alice"

[sender]
seed = 40
layers = 3
key_lifetime = 3

[timing]
settle_ms = 300
read_timeout_secs = 10

[paths]
env_root = "{env_root}"

[soak]
iterations = 5
payload_len = 64
"#,
            env_root = env_root.display(),
        );

        let config_path = temp_dir.join("harness.toml");
        fs::write(&config_path, config).expect("write config");

        Self {
            temp_dir,
            scenario_dir,
            config_path,
        }
    }

    /// Write a scenario file with exact bytes (terminators included).
    fn write_scenario(&self, name: &str, contents: &[u8]) {
        fs::write(self.scenario_dir.join(name), contents).expect("write scenario");
    }

    /// Run the harness binary with the per-test config.
    fn run_harness(&self, args: &[&str]) -> HarnessOutput {
        let output = Command::new(env!("CARGO_BIN_EXE_pairtest"))
            .arg("--config")
            .arg(&self.config_path)
            .args(args)
            .current_dir(&self.temp_dir)
            .output()
            .expect("run harness");

        HarnessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
        }
    }

    fn scenario_dir_str(&self) -> String {
        self.scenario_dir.display().to_string()
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.temp_dir);
    }
}

#[derive(Debug)]
struct HarnessOutput {
    stdout: String,
    stderr: String,
    success: bool,
}

// ============== Tests ==============

#[test]
fn consecutive_asserts_pass_with_one_receiver() {
    let ctx = TestContext::new("green_path", 47841);

    // A fresh receiver counts deliveries from 1 and echoes each probe.
    ctx.write_scenario(
        "basic.scenario",
        b"1;alice;verified;1\r\n2;alice;verified;2\r\n3;alice;verified;3\r\n",
    );

    let out = ctx.run_harness(&["run", &ctx.scenario_dir_str()]);
    assert!(
        out.success,
        "expected pass\nstdout: {}\nstderr: {}",
        out.stdout, out.stderr
    );
    assert!(out.stdout.contains("1 passed"), "stdout: {}", out.stdout);
}

#[test]
fn skip_tears_down_and_respawns_the_receiver() {
    let ctx = TestContext::new("reconnect", 47842);

    // Step 2 runs with the receiver gone; the respawned receiver's first
    // delivery is probe 3, so its own counter restarts at 1.
    ctx.write_scenario(
        "reconnect.scenario",
        b"1;alice;verified;1\r\nskip;receiver offline\r\n1;alice;verified;3\r\n",
    );

    let out = ctx.run_harness(&["run", &ctx.scenario_dir_str()]);
    assert!(
        out.success,
        "expected pass\nstdout: {}\nstderr: {}",
        out.stdout, out.stderr
    );
}

#[test]
fn mismatch_reports_step_expected_and_actual() {
    let ctx = TestContext::new("mismatch", 47843);

    ctx.write_scenario(
        "mismatch.scenario",
        b"1;alice;verified;1\r\n2;alice;verified;999\r\n",
    );

    let out = ctx.run_harness(&["run", &ctx.scenario_dir_str()]);
    assert!(!out.success, "expected failure\nstdout: {}", out.stdout);
    assert!(out.stdout.contains("Step 2"), "stdout: {}", out.stdout);
    assert!(out.stdout.contains("999"), "stdout: {}", out.stdout);
    assert!(
        out.stdout.contains("2;alice;verified;2"),
        "stdout: {}",
        out.stdout
    );
    assert!(
        out.stderr.contains("1 of 1 scenarios failed"),
        "stderr: {}",
        out.stderr
    );
}

#[test]
fn scenarios_run_in_file_name_order() {
    let ctx = TestContext::new("ordering", 47844);

    ctx.write_scenario("b_second.scenario", b"1;alice;verified;1\r\n");
    ctx.write_scenario("a_first.scenario", b"1;alice;verified;1\r\n");

    let out = ctx.run_harness(&["run", &ctx.scenario_dir_str()]);
    assert!(
        out.success,
        "expected pass\nstdout: {}\nstderr: {}",
        out.stdout, out.stderr
    );

    let first = out.stdout.find("a_first").expect("a_first in output");
    let second = out.stdout.find("b_second").expect("b_second in output");
    assert!(first < second, "stdout: {}", out.stdout);
    assert!(out.stdout.contains("2 passed"), "stdout: {}", out.stdout);
}

#[test]
fn empty_scenario_directory_is_an_error() {
    let ctx = TestContext::new("empty_dir", 47845);

    let out = ctx.run_harness(&["run", &ctx.scenario_dir_str()]);
    assert!(!out.success);
    assert!(out.stderr.contains(".scenario"), "stderr: {}", out.stderr);
}

#[test]
fn malformed_scenario_fails_before_any_spawn() {
    let ctx = TestContext::new("malformed", 47846);

    ctx.write_scenario("bad.scenario", b"1;alice\r\n");

    let out = ctx.run_harness(&["run", &ctx.scenario_dir_str()]);
    assert!(!out.success);
    assert!(
        out.stderr.contains("line 1"),
        "stderr: {}\nstdout: {}",
        out.stderr,
        out.stdout
    );
}

#[test]
fn soak_delivers_every_random_payload() {
    let ctx = TestContext::new("soak", 47847);

    let out = ctx.run_harness(&["soak", "--iterations", "3", "--payload-len", "32"]);
    assert!(
        out.success,
        "expected pass\nstdout: {}\nstderr: {}",
        out.stdout, out.stderr
    );
}

#[test]
fn json_summary_is_machine_readable() {
    let ctx = TestContext::new("json_summary", 47848);

    ctx.write_scenario("basic.scenario", b"1;alice;verified;1\r\n");

    let out = ctx.run_harness(&["run", "--json", &ctx.scenario_dir_str()]);
    assert!(
        out.success,
        "expected pass\nstdout: {}\nstderr: {}",
        out.stdout, out.stderr
    );

    let json_start = out.stdout.find('{').expect("json object in output");
    let report: serde_json::Value =
        serde_json::from_str(&out.stdout[json_start..]).expect("valid JSON summary");
    assert_eq!(report["passed"], 1);
    assert_eq!(report["failed"], 0);
    assert_eq!(report["scenarios"][0]["name"], "basic");
}
