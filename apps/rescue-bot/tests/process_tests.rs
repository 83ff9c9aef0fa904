//! rescue-bot 进程级测试：退出码与日志输出

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn scenario_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn rescue_bot(scenario: &NamedTempFile) -> Command {
    let mut cmd = Command::cargo_bin("rescue-bot").unwrap();
    cmd.env("RESCUE_BOT_SCENARIO", scenario.path()).env("RUST_LOG", "info");
    cmd
}

#[test]
fn test_survivor_run_exits_successfully() {
    let scenario = scenario_file(
        r#"
        [[phase]]
        ticks = 2

        [[phase]]
        ticks = 4
        front = 0.35
        front_objects = ["SurvivorObstacle"]
        "#,
    );

    rescue_bot(&scenario)
        .assert()
        .success()
        .stderr(predicate::str::contains("--- SURVIVOR DETECTED ---"))
        .stderr(predicate::str::contains("Emitter: sent 'SURVIVOR_FOUND'"))
        .stderr(predicate::str::contains("Supervisor receiver: received 'SURVIVOR_FOUND'"))
        .stderr(predicate::str::contains("Run complete"));
}

#[test]
fn test_missing_wheel_motor_exits_with_failure() {
    let scenario = scenario_file(
        r#"
        [devices]
        right_motor = false

        [[phase]]
        ticks = 3
        "#,
    );

    rescue_bot(&scenario)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing mandatory actuator 'right wheel motor'"));
}

#[test]
fn test_unreadable_scenario_exits_with_failure() {
    let mut cmd = Command::cargo_bin("rescue-bot").unwrap();
    cmd.env("RESCUE_BOT_SCENARIO", "/nonexistent/rescue-bot/arena.toml")
        .env("RUST_LOG", "info")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to load scenario"));
}

#[test]
fn test_malformed_scenario_exits_with_failure() {
    let scenario = scenario_file("[[phase]]\nticks = \"many\"\n");

    rescue_bot(&scenario)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse scenario"));
}

fn stderr_of(scenario: &NamedTempFile) -> String {
    let output = rescue_bot(scenario).output().unwrap();
    assert!(output.status.success());
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_telemetry_and_state_change_lines() {
    let scenario = scenario_file(
        r#"
        [[phase]]
        ticks = 17

        [[phase]]
        ticks = 2
        front = 0.1
        left = 0.1
        right = 0.5

        [[phase]]
        ticks = 2
        accel = [5.0, 0.0, 9.81]

        [[phase]]
        ticks = 2
        "#,
    );
    let stderr = stderr_of(&scenario);

    // 23 个 tick：计数器 0, 8, 16 各输出一次
    let telemetry = stderr.lines().filter(|l| l.contains("telemetry")).count();
    assert_eq!(telemetry, 3);

    for message in [
        "STATE CHANGE: Obstacle Detected (Front DS). Avoiding.",
        "STATE CHANGE: Robot Tilted! Halting.",
        "STATE CHANGE: Clear. Resuming Search.",
    ] {
        let count = stderr.lines().filter(|l| l.contains(message)).count();
        assert_eq!(count, 1, "{message}");
    }
    // 初始状态就是搜索，第一个 tick 不算状态变化
    assert_eq!(stderr.matches("STATE CHANGE:").count(), 3);
}

#[test]
fn test_missing_emitter_is_reported_once() {
    let scenario = scenario_file(
        r#"
        [devices]
        emitter = false

        [[phase]]
        ticks = 2

        [[phase]]
        ticks = 3
        front = 0.35
        front_objects = ["SurvivorObstacle"]
        "#,
    );
    let stderr = stderr_of(&scenario);

    assert_eq!(stderr.matches("Cannot send survivor signal").count(), 1);
    assert!(!stderr.contains("survivor signal dropped"));
    assert!(!stderr.contains("Emitter: sent"));
    assert!(stderr.contains("STATE CHANGE: Survivor Detected!"));
}
