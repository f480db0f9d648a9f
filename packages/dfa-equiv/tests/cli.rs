use std::{
    io::Write,
    process::{Command, Output, Stdio},
};

fn run_with_stdin(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_dfa-equiv"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("should start the dfa-equiv binary");

    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(input.as_bytes())
        .expect("should write the batch to stdin");

    child.wait_with_output().expect("should wait for dfa-equiv")
}

#[test]
fn prints_one_line_per_case() {
    let input = "2\n3\na b\n\n1 2\n1 2\n1 2\n2\na\n1\n1\n1\n";
    let output = run_with_stdin(&[], input);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "(0, 1) (0, 2) (1, 2)\n\n"
    );
    assert!(output.stderr.is_empty());
}

#[test]
fn malformed_case_keeps_earlier_results_and_fails() {
    // the second case has a transition to a state that does not exist
    let input = "2\n2\na\n\n1\n0\n1\na\n\n5\n";
    let output = run_with_stdin(&[], input);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "(0, 1)\n");

    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<_> = stderr.lines().filter(|line| !line.is_empty()).collect();
    assert_eq!(
        lines,
        vec![
            "error: malformed automaton in test case 2 (line 10): transition of state 0 on symbol 0 targets state 5, but there are only 1 states"
        ]
    );
}

#[test]
fn invalid_header_prints_nothing() {
    let output = run_with_stdin(&[], "several\n");

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid test case count on line 1"));
}

#[test]
fn json_output_with_witnesses() {
    let input = "1\n3\na\n2\n2\n2\n2\n";
    let output = run_with_stdin(&["--format", "json", "--witnesses", "-s", "rescan"], input);

    assert!(output.status.success());

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be valid json");
    assert_eq!(json[0]["equivalent_pairs"], serde_json::json!([[0, 1]]));
    assert_eq!(json[0]["witnesses"][0]["pair"], serde_json::json!([0, 2]));
    assert_eq!(json[0]["witnesses"][0]["word"], serde_json::json!([]));
}
