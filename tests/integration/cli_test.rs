use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Runs the binary inside `home` so no user config or `.env` leaks in.
fn run_arena_in(home: &Path, args: &[&str], env_vars: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_arena"));
    cmd.args(args)
        .current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("BACKEND_URL")
        .env_remove("NEXT_PUBLIC_BACKEND_URL")
        .env_remove("NEXT_PUBLIC_WS_URL")
        .env_remove("ARENA_PORT")
        .env_remove("ARENA_LOG_LEVEL")
        .env_remove("RUST_LOG");
    for (key, value) in env_vars {
        cmd.env(key, value);
    }
    cmd.output().expect("Failed to execute arena command")
}

fn run_arena(args: &[&str]) -> Output {
    let home = TempDir::new().unwrap();
    run_arena_in(home.path(), args, &[])
}

fn output_to_string(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr_to_string(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    output_to_string(output)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("each line should be JSON"))
        .collect()
}

mod version_command_tests {
    use super::*;

    #[test]
    fn test_version_command_basic() {
        let output = run_arena(&["version"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success(), "version command should succeed");
        assert!(stdout.contains("arena"));
        assert!(stdout.contains("0.1.0"));
    }

    #[test]
    fn test_version_command_detailed() {
        let output = run_arena(&["version", "--detailed"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success());
        assert!(stdout.contains("Version Information"));
        for name in ["PM Agent", "Dev Agent", "UX Agent", "QA Agent"] {
            assert!(stdout.contains(name), "detailed version should list {}", name);
        }
    }

    #[test]
    fn test_version_ignores_broken_config() {
        let home = TempDir::new().unwrap();
        let output = run_arena_in(home.path(), &["version"], &[("BACKEND_URL", "ftp://nope")]);
        assert!(output.status.success());
    }
}

mod help_command_tests {
    use super::*;

    #[test]
    fn test_help_command() {
        let output = run_arena(&["--help"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success());
        for command in ["serve", "roster", "run", "watch", "intake", "build", "config"] {
            assert!(stdout.contains(command), "help should mention {}", command);
        }
    }

    #[test]
    fn test_invalid_command() {
        let output = run_arena(&["invalid-command"]);
        assert!(!output.status.success());
    }

    #[test]
    fn test_verbose_flag_accepted() {
        let output = run_arena(&["-v", "version"]);
        assert!(output.status.success());
    }
}

mod roster_command_tests {
    use super::*;

    #[test]
    fn test_roster_json() {
        let output = run_arena(&["roster", "Build a pet social app", "--format", "json"]);
        assert!(output.status.success(), "stderr: {}", stderr_to_string(&output));

        let roster: serde_json::Value = serde_json::from_str(&output_to_string(&output)).unwrap();
        let agents = roster["agents"].as_array().unwrap();
        let roles: Vec<&str> = agents.iter().map(|a| a["role"].as_str().unwrap()).collect();
        assert_eq!(roles, vec!["PM", "Dev", "UX", "QA"]);
        assert_eq!(roster["nodes"].as_array().unwrap().len(), 4);
        assert_eq!(roster["links"].as_array().unwrap().len(), 3);
        assert!(roster["links"]
            .as_array()
            .unwrap()
            .iter()
            .all(|l| l["source"] == agents[0]["id"]));
    }

    #[test]
    fn test_roster_text() {
        let output = run_arena(&["roster", "Build a pet social app"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success());
        assert!(stdout.contains("PM Agent"));
        assert!(stdout.contains("QA Agent"));
    }
}

mod run_command_tests {
    use super::*;

    #[test]
    fn test_offline_run_json_events() {
        let output = run_arena(&[
            "run",
            "Build a pet social app",
            "--offline",
            "--fast",
            "--format",
            "json",
        ]);
        assert!(output.status.success(), "stderr: {}", stderr_to_string(&output));

        let events = json_lines(&output);
        let names: Vec<&str> = events.iter().map(|e| e["event"].as_str().unwrap()).collect();

        assert_eq!(names.first(), Some(&"agents_generated"));
        assert_eq!(names[1], "debate_start");
        assert_eq!(names.iter().filter(|n| **n == "message").count(), 8);
        assert_eq!(&names[names.len() - 2..], &["plan_ready", "debate_end"]);

        let plan = &events[names.len() - 2]["data"];
        assert_eq!(plan["projectName"], "Build a pet social app...");
    }

    #[test]
    fn test_offline_run_text() {
        let output = run_arena(&["run", "Ship a todo list", "--offline", "--fast"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success());
        assert!(stdout.contains("Debate started"));
        assert!(stdout.contains("8 messages from 4 agents"));
    }

    #[test]
    fn test_run_against_unreachable_server() {
        let output = run_arena(&["run", "brief", "--server", "http://127.0.0.1:9"]);
        let stderr = stderr_to_string(&output);

        assert!(!output.status.success());
        assert!(stderr.contains("E4001"), "stderr: {}", stderr);
    }
}

mod config_command_tests {
    use super::*;

    #[test]
    fn test_config_init_writes_file() {
        let home = TempDir::new().unwrap();
        let target = home.path().join("arena.toml");
        let target_str = target.to_str().unwrap();

        let output = run_arena_in(home.path(), &["config", "--init", "--path", target_str], &[]);
        assert!(output.status.success(), "stderr: {}", stderr_to_string(&output));

        let written = std::fs::read_to_string(&target).unwrap();
        assert!(written.contains("[server]"));
        assert!(written.contains("[debate]"));

        // a second init without --force leaves the file alone
        std::fs::write(&target, "# edited\n[server]\nport = 4100\n").unwrap();
        let output = run_arena_in(home.path(), &["config", "--init", "--path", target_str], &[]);
        assert!(output.status.success());
        assert!(output_to_string(&output).contains("already exists"));
        assert!(std::fs::read_to_string(&target).unwrap().starts_with("# edited"));
    }

    #[test]
    fn test_config_reads_local_file() {
        let home = TempDir::new().unwrap();
        std::fs::write(home.path().join("arena.toml"), "[server]\nport = 4100\n").unwrap();

        let output = run_arena_in(home.path(), &["config"], &[]);
        assert!(output.status.success(), "stderr: {}", stderr_to_string(&output));
        assert!(output_to_string(&output).contains("4100"));
    }

    #[test]
    fn test_backend_url_env_override() {
        let home = TempDir::new().unwrap();
        let output = run_arena_in(
            home.path(),
            &["config"],
            &[("BACKEND_URL", "http://planner.internal:9000")],
        );

        assert!(output.status.success());
        let stdout = output_to_string(&output);
        assert!(stdout.contains("http://planner.internal:9000"));
        assert!(stdout.contains("ws://planner.internal:9000/ws/projects/tech-plan"));
    }

    #[test]
    fn test_config_init_force_repairs_broken_file() {
        let home = TempDir::new().unwrap();
        let target = home.path().join("arena.toml");
        std::fs::write(&target, "[debate]\nrounds = 0\n").unwrap();

        let broken = run_arena_in(home.path(), &["config"], &[]);
        assert!(!broken.status.success());
        assert!(stderr_to_string(&broken).contains("E1004"));

        let target_str = target.to_str().unwrap();
        let output = run_arena_in(
            home.path(),
            &["config", "--init", "--force", "--path", target_str],
            &[],
        );
        assert!(output.status.success(), "stderr: {}", stderr_to_string(&output));

        let repaired = run_arena_in(home.path(), &["config"], &[]);
        assert!(repaired.status.success(), "stderr: {}", stderr_to_string(&repaired));
    }

    #[test]
    fn test_rust_log_filters_do_not_break_config() {
        let home = TempDir::new().unwrap();
        for filter in ["off", "info,hyper", "arena_core"] {
            let output = run_arena_in(home.path(), &["roster", "x"], &[("RUST_LOG", filter)]);
            assert!(
                output.status.success(),
                "RUST_LOG={} failed: {}",
                filter,
                stderr_to_string(&output)
            );
        }
    }

    #[test]
    fn test_invalid_log_filter_in_config_fails() {
        let home = TempDir::new().unwrap();
        let output = run_arena_in(
            home.path(),
            &["roster", "x"],
            &[("ARENA_LOG_LEVEL", "arena_core=loud")],
        );

        assert!(!output.status.success());
        assert!(stderr_to_string(&output).contains("logging.level"));
    }

    #[test]
    fn test_invalid_backend_url_fails() {
        let home = TempDir::new().unwrap();
        let output = run_arena_in(home.path(), &["roster", "x"], &[("BACKEND_URL", "ftp://nope")]);
        let stderr = stderr_to_string(&output);

        assert!(!output.status.success());
        assert!(stderr.contains("E1004"), "stderr: {}", stderr);
        assert!(stderr.contains("backend.url"));
    }
}
