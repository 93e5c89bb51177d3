use std::process::Command;

use vector_driver::PASS_SENTINEL;

fn vector_driver(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_vector-driver"))
        .args(args)
        .output()
        .expect("failed to launch vector-driver")
}

#[test]
fn test_thread_backend_exits_successfully() {
    let output = vector_driver(&["--backend", "threads", "--participants", "3"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().filter(|l| *l == PASS_SENTINEL).count(), 1);
    assert_eq!(stdout.lines().filter(|l| l.starts_with("Norm of x = ")).count(), 3);
}

#[test]
fn test_empty_thread_world_exits_with_failure() {
    let output = vector_driver(&["--backend", "threads", "--participants", "0"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!String::from_utf8_lossy(&output.stdout).contains(PASS_SENTINEL));
}
