use std::process::{Command, Output};

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_parser-ana"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run parser-ana")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// Successful parses
// ---------------------------------------------------------------------------

#[test]
fn prints_model_without_subcommand() {
    let out = run_cli(&["--model", "weights.pt"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "weights.pt\n");
}

#[test]
fn train_accepts_single_dash_learning_rate() {
    let out = run_cli(&["--model", "weights.pt", "train", "-lr", "0.1"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "weights.pt\n");
}

#[test]
fn valid_accepts_out_and_batchsize() {
    let out = run_cli(&[
        "--model",
        "weights.pt",
        "valid",
        "--batchsize",
        "32",
        "--out",
        "/tmp/r.json",
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "weights.pt\n");
}

#[test]
fn info_logging_goes_to_stderr() {
    let out = Command::new(env!("CARGO_BIN_EXE_parser-ana"))
        .args(["--model", "weights.pt", "train", "-lr", "0.1"])
        .env("RUST_LOG", "info")
        .output()
        .expect("failed to run parser-ana");

    assert!(out.status.success());
    assert_eq!(stdout(&out), "weights.pt\n");
    assert!(stderr(&out).contains("train selected"), "stderr: {}", stderr(&out));
}

// ---------------------------------------------------------------------------
// Help
// ---------------------------------------------------------------------------

#[test]
fn help_exits_zero_and_lists_subcommands() {
    let out = run_cli(&["--help"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("--model"), "help: {text}");
    assert!(text.contains("train"), "help: {text}");
    assert!(text.contains("valid"), "help: {text}");
    assert!(text.contains("examples:"), "help: {text}");
}

#[test]
fn subcommand_help_lists_local_flags() {
    let out = run_cli(&["--model", "weights.pt", "valid", "--help"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("--out"), "help: {text}");
    assert!(text.contains("--batchsize"), "help: {text}");
}

// ---------------------------------------------------------------------------
// Usage errors
// ---------------------------------------------------------------------------

#[test]
fn missing_model_exits_two() {
    let out = run_cli(&["train", "-lr", "0.1"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stdout(&out).is_empty());
    assert!(stderr(&out).contains("--model"), "stderr: {}", stderr(&out));
}

#[test]
fn valid_without_out_exits_two() {
    let out = run_cli(&["--model", "weights.pt", "valid"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("--out"), "stderr: {}", stderr(&out));
}

#[test]
fn unknown_subcommand_exits_two() {
    let out = run_cli(&["--model", "weights.pt", "bogus"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("bogus"), "stderr: {}", stderr(&out));
}

#[test]
fn non_integer_batchsize_exits_two() {
    let out = run_cli(&["--model", "weights.pt", "train", "--batchsize", "big", "-lr", "1"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("big"), "stderr: {}", stderr(&out));
}
