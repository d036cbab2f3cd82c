//! End-to-end sessions driving the binary over stdin.

use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

struct Session {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Receiver<String>,
    stderr: Receiver<String>,
}

fn forward_lines<R: Read + Send + 'static>(stream: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in BufReader::new(stream).lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

impl Session {
    fn start(extra: &[&str]) -> Self {
        let bin = env!("CARGO_BIN_EXE_robot_fleet");
        let mut child = Command::new(bin)
            .args(["--step-delay-ms", "0", "--no-grid"])
            .args(extra)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to start binary");
        let stdin = child.stdin.take();
        let stdout = forward_lines(child.stdout.take().expect("stdout"));
        let stderr = forward_lines(child.stderr.take().expect("stderr"));
        Self {
            child,
            stdin,
            stdout,
            stderr,
        }
    }

    fn send(&mut self, line: &str) {
        let stdin = self.stdin.as_mut().expect("stdin open");
        writeln!(stdin, "{line}").expect("write command");
        stdin.flush().expect("flush command");
    }

    fn finish(mut self) {
        drop(self.stdin.take());
        let status = self.child.wait().expect("wait for binary");
        assert!(status.success(), "binary exited with {status:?}");
    }
}

fn expect_line(lines: &Receiver<String>, needle: &str) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match lines.recv_timeout(remaining) {
            Ok(line) if line.contains(needle) => return,
            Ok(_) => continue,
            Err(err) => panic!("no line containing {needle:?}: {err}"),
        }
    }
}

#[test]
fn create_move_kill_and_quit() {
    let mut session = Session::start(&[]);
    expect_line(&session.stdout, "Enter your commands below");

    session.send("n");
    expect_line(&session.stdout, "INFO: New unit created (1 total).");

    session.send("1");
    expect_line(&session.stdout, "INFO: Enter directive for unit 1.");
    session.send("r 3");
    expect_line(&session.stdout, "INFO: Unit 1 stopped at [3;0]");

    session.send("1 p");
    expect_line(&session.stdout, "INFO: Unit 1 position: [3;0]");

    session.send("1 k");
    expect_line(&session.stdout, "INFO: Unit 1 was terminated.");
    session.send("s");
    expect_line(&session.stdout, "INFO: Active units: (0 total).");

    session.send("1 p");
    expect_line(
        &session.stderr,
        "ERROR: This unit is inaccessible, because it was terminated.",
    );

    session.send("q");
    expect_line(&session.stdout, "INFO: Goodbye.");
    session.finish();
}

#[test]
fn wall_stops_unit_and_end_of_input_exits() {
    let mut session = Session::start(&["--max-x", "2"]);
    session.send("n");
    session.send("1 r 5");
    expect_line(&session.stderr, "WARNING: Unit 1 reached the wall at [2;0]");
    expect_line(&session.stdout, "INFO: Unit 1 stopped at [2;0]");

    session.send("wiggle");
    expect_line(&session.stderr, "ERROR: Unrecognized common command \"wiggle\".");
    session.send("1 x");
    expect_line(&session.stderr, "ERROR: Unrecognized command \"x\".");

    session.finish();
}
