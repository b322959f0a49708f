//! Integration Tests


use std::fs;
use std::time::{Duration, Instant};

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use crate::workdir::WorkDir;

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Extracts `<pid>` from the first `background pid is <pid>` line.
fn background_pid(stdout: &str) -> i32 {
    let marker = "background pid is ";
    let start = stdout.find(marker).expect("no background pid line") + marker.len();
    stdout[start..]
        .split_whitespace()
        .next()
        .and_then(|pid| pid.parse().ok())
        .expect("background pid is not a number")
}

#[test]
fn status_is_zero_at_startup() {
    let work = WorkDir::new();
    let output = work.run(&["status", "exit"]);
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("exit value 0\n"));
}

#[test]
fn false_sets_exit_value_one() {
    let work = WorkDir::new();
    let output = work.run(&["false", "status", "exit"]);
    let stdout = stdout_of(&output);
    assert!(stdout.contains("exit value 1\n"), "stdout was: {}", stdout);
    assert!(!stdout.contains("terminated"), "stdout was: {}", stdout);
}

#[test]
fn redirect_output_then_input() {
    let work = WorkDir::new();
    work.create("a.txt", "a");
    work.create("b.txt", "b");

    let output = work.run(&["ls > out.txt", "wc -l < out.txt", "exit"]);
    let listing = fs::read_to_string(work.path().join("out.txt")).unwrap();
    assert_eq!(listing, "a.txt\nb.txt\nout.txt\n");

    let stdout = stdout_of(&output);
    assert!(stdout.contains("3\n"), "stdout was: {}", stdout);
    assert!(!stderr_of(&output).contains("cannot open"));
}

#[test]
fn missing_input_file_is_reported() {
    let work = WorkDir::new();
    let output = work.run(&["wc -l < missing.txt", "status", "exit"]);
    assert!(stderr_of(&output).contains("wc: cannot open missing.txt for input"));
    assert!(stdout_of(&output).contains("exit value 1\n"));
}

#[test]
fn unknown_command_fails_in_child() {
    let work = WorkDir::new();
    let output = work.run(&["smallsh-no-such-command arg", "status", "exit"]);
    assert!(output.status.success());
    assert!(stderr_of(&output).contains("smallsh-no-such-command: "));
    assert!(stdout_of(&output).contains("exit value 1\n"));
}

#[test]
fn blank_lines_and_comments_are_ignored() {
    let work = WorkDir::new();
    let output = work.run(&["", "   ", "# false", "status", "exit"]);
    assert_eq!(stderr_of(&output), "");
    assert!(stdout_of(&output).contains("exit value 0\n"));
}

#[test]
fn invalid_utf8_line_does_not_stop_the_shell() {
    let work = WorkDir::new();
    let output = work.run_bytes(b"echo \xff\xfe\nfalse\nstatus\nexit\n");
    assert!(output.status.success());
    assert!(!stderr_of(&output).contains("valid UTF-8"));

    let stdout = stdout_of(&output);
    assert!(stdout.contains("\u{fffd}\u{fffd}\n"), "stdout was: {}", stdout);
    assert!(stdout.contains("exit value 1\n"), "stdout was: {}", stdout);
}

#[test]
fn syntax_error_does_not_stop_the_shell() {
    let work = WorkDir::new();
    let output = work.run(&["cat <", "false", "status", "exit"]);
    assert!(stderr_of(&output).contains("syntax error"));
    assert!(stdout_of(&output).contains("exit value 1\n"));
}

#[test]
fn signal_termination_is_reported_immediately_and_by_status() {
    let work = WorkDir::new();
    work.create("self_kill.sh", "kill -TERM $$\n");

    let output = work.run(&["sh self_kill.sh", "status", "exit"]);
    let stdout = stdout_of(&output);
    assert_eq!(
        stdout.matches("terminated by signal 15\n").count(),
        2,
        "stdout was: {}",
        stdout
    );
}

#[test]
fn background_job_is_reported_once_after_it_finishes() {
    let work = WorkDir::new();
    let output = work.run(&["sleep 1 &", "", "sleep 2", "status", "exit"]);
    let stdout = stdout_of(&output);

    let pid = background_pid(&stdout);
    let started = format!("background pid is {}\n", pid);
    let done = format!("background pid {} is done: exit value 0\n", pid);
    assert_eq!(stdout.matches(&done).count(), 1, "stdout was: {}", stdout);
    assert!(stdout.find(&started).unwrap() < stdout.find(&done).unwrap());
}

#[test]
fn background_status_does_not_change_last_status() {
    let work = WorkDir::new();
    let output = work.run(&["false &", "sleep 1", "true", "status", "exit"]);
    let stdout = stdout_of(&output);
    let pid = background_pid(&stdout);
    assert!(stdout.contains(&format!("background pid {} is done: exit value 1\n", pid)));
    assert!(stdout.ends_with("exit value 0\n: "), "stdout was: {}", stdout);
}

#[test]
fn cd_without_argument_goes_home() {
    let work = WorkDir::new();
    let output = work.run(&["cd", "pwd", "exit"]);
    let home = work.home().canonicalize().unwrap();
    let stdout = stdout_of(&output);
    assert!(
        stdout.contains(&format!("{}\n", home.display())),
        "stdout was: {}",
        stdout
    );
}

#[test]
fn cd_to_missing_directory_is_reported() {
    let work = WorkDir::new();
    let output = work.run(&["cd nonexistent-path", "pwd", "exit"]);
    assert!(stderr_of(&output).contains("cd: nonexistent-path: "));

    let cwd = work.path().canonicalize().unwrap();
    assert!(stdout_of(&output).contains(&format!("{}\n", cwd.display())));
}

#[test]
fn cd_with_argument_changes_directory_for_children() {
    let work = WorkDir::new();
    fs::create_dir(work.path().join("sub")).unwrap();
    let output = work.run(&["cd sub &", "ls > here.txt", "exit"]);
    assert!(!stdout_of(&output).contains("background pid is"));
    assert!(work.path().join("sub").join("here.txt").exists());
}

#[test]
fn end_of_input_exits_cleanly() {
    let work = WorkDir::new();
    let output = work.run(&["true"]);
    assert!(output.status.success());
}

#[cfg(target_os = "linux")]
#[test]
fn exit_terminates_background_jobs() {
    let work = WorkDir::new();
    let output = work.run(&["sleep 30 &", "exit"]);
    assert!(output.status.success());
    let pid = background_pid(&stdout_of(&output));

    // The orphaned job is gone, or a zombie waiting for its new parent.
    let stat_path = format!("/proc/{}/stat", pid);
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let terminated = match fs::read_to_string(&stat_path) {
            Err(_) => true,
            Ok(stat) => {
                let state = stat.rsplit(')').next().and_then(|rest| rest.split_whitespace().next());
                state == Some("Z") || state == Some("X") || !stat.contains("(sleep)")
            }
        };
        if terminated {
            break;
        }
        assert!(Instant::now() < deadline, "background job {} survived exit", pid);
        std::thread::sleep(Duration::from_millis(50));
    }
}

#[test]
fn command_string_runs_without_prompt() {
    let work = WorkDir::new();
    let output = work.command(&["-c", "echo hello"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "hello\n");
}

#[test]
fn script_file_runs_each_line() {
    let work = WorkDir::new();
    let script = work.create("script.smallsh", "# a comment\nfalse\nstatus\necho done > done.txt\n");
    let output = work.command(&[script]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "exit value 1\n");
    assert_eq!(fs::read_to_string(work.path().join("done.txt")).unwrap(), "done\n");
}

#[test]
fn unreadable_script_file_fails() {
    let work = WorkDir::new();
    let output = work.command(&["no-such-script"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("no-such-script"));
}

#[test]
fn version_flag() {
    let work = WorkDir::new();
    let output = work.command(&["--version"]).output().unwrap();
    assert!(output.status.success());
    assert!(stdout_of(&output).starts_with("smallsh version "));
}

#[test]
fn sigtstp_toggles_foreground_only_mode() {
    let work = WorkDir::new();
    let mut session = work.spawn();
    let pid = Pid::from_raw(session.pid());

    // Handlers are installed before the first prompt is printed.
    session.send_line("status");
    session.wait_for("exit value 0\n: ");

    signal::kill(pid, Signal::SIGTSTP).unwrap();
    session.wait_for("\nEntering foreground-only mode (& is now ignored)\n: ");
    session.send_line("true &");
    session.send_line("status");
    session.wait_for_count("exit value 0\n", 2);
    assert!(!session.seen.contains("background pid is"), "stdout: {}", session.seen);

    signal::kill(pid, Signal::SIGTSTP).unwrap();
    session.wait_for("\nExiting foreground-only mode\n: ");
    session.send_line("true &");
    session.wait_for("background pid is ");

    session.send_line("exit");
    let (status, _) = session.finish();
    assert!(status.success());
}

#[test]
fn sigint_redraws_prompt_without_exiting() {
    let work = WorkDir::new();
    let mut session = work.spawn();
    let pid = Pid::from_raw(session.pid());

    // Wait for the prompt itself so the redraw is not mixed into it.
    session.send_line("status");
    session.wait_for("exit value 0\n: ");

    signal::kill(pid, Signal::SIGINT).unwrap();
    session.wait_for_count("\n: ", 2);
    session.send_line("echo alive");
    session.wait_for("alive\n");

    session.send_line("exit");
    let (status, _) = session.finish();
    assert!(status.success());
}
