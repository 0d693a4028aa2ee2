// src/system/executor.rs

use crate::{
    core::launcher,
    models::{LaunchSpec, ScriptMode, ScriptOutcome},
};
use std::io::Read;
use std::process::{Child, Command as StdCommand, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// How often a captured run is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long a timed-out run waits for its output reader to finish.
const READER_GRACE: Duration = Duration::from_millis(500);

/// Ways running a script can fail.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// The argument string has unbalanced quotes or a dangling escape.
    #[error("Command could not be parsed: {0}")]
    CommandParse(String),
    /// The executable is blank.
    #[error("No command specified to run.")]
    EmptyCommand,
    /// The process could not be started or waited on.
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, std::io::Error),
    /// Captured standard output was not UTF-8.
    #[error("Command '{command}' produced output that was not valid UTF-8")]
    InvalidUtf8Output {
        /// The full command line.
        command: String,
        /// The decoding failure.
        #[source]
        source: std::string::FromUtf8Error,
    },
    /// The run exceeded its timeout and was killed.
    #[error("Command '{command}' did not finish within {} seconds and was stopped.", .timeout.as_secs())]
    TimedOut {
        /// The full command line.
        command: String,
        /// The limit that elapsed.
        timeout: Duration,
    },
}

/// The full command line of a spec, for messages and logs.
pub fn describe(spec: &LaunchSpec) -> String {
    format!("{} {}", spec.executable_path, spec.argument_string)
        .trim()
        .to_string()
}

/// Runs a script as described by `spec` and maps the result for the launcher.
///
/// `FullOutput` runs interactively. The other modes capture standard output and
/// honour `timeout`, if one is given.
pub fn run_launch_spec(
    spec: &LaunchSpec,
    timeout: Option<Duration>,
) -> Result<ScriptOutcome, ExecutionError> {
    if spec.mode.captures_output() {
        let output = execute_and_capture_output(spec, timeout)?;
        Ok(launcher::outcome_for(spec.mode, Some(&output)))
    } else {
        execute_interactive(spec)?;
        Ok(launcher::outcome_for(ScriptMode::FullOutput, None))
    }
}

fn build_command(spec: &LaunchSpec, command_line: &str) -> Result<StdCommand, ExecutionError> {
    let program = spec.executable_path.trim();
    if program.is_empty() {
        return Err(ExecutionError::EmptyCommand);
    }
    let args = shlex::split(&spec.argument_string)
        .ok_or_else(|| ExecutionError::CommandParse(command_line.to_string()))?;

    let mut command = StdCommand::new(program);
    command
        .args(args)
        .current_dir(dunce::simplified(&spec.working_directory));
    Ok(command)
}

/// Runs the command with the terminal attached and waits for it to exit.
pub fn execute_interactive(spec: &LaunchSpec) -> Result<(), ExecutionError> {
    let command_line = describe(spec);
    log::debug!("Running interactively: {}", command_line);

    let status = build_command(spec, &command_line)?
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| ExecutionError::CommandFailed(command_line.clone(), e))?;

    if !status.success() {
        log::warn!("'{}' exited with {}.", command_line, status);
    }
    Ok(())
}

/// Runs the command and captures its standard output.
/// Stderr is passed through to the user's terminal.
///
/// Blocks until the child exits. When `timeout` elapses first, the child is
/// killed and `ExecutionError::TimedOut` is returned. A non-zero exit status
/// is logged but the captured output is still returned.
pub fn execute_and_capture_output(
    spec: &LaunchSpec,
    timeout: Option<Duration>,
) -> Result<String, ExecutionError> {
    let command_line = describe(spec);
    log::debug!("Running with captured output: {}", command_line);

    let mut child = build_command(spec, &command_line)?
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| ExecutionError::CommandFailed(command_line.clone(), e))?;

    // Drain stdout on a separate thread so a chatty child never blocks on a full pipe.
    let mut stdout = child.stdout.take();
    let reader = thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(stdout) = stdout.as_mut() {
            stdout.read_to_end(&mut buffer)?;
        }
        Ok::<_, std::io::Error>(buffer)
    });

    if let Err(e) = wait_with_timeout(&mut child, timeout, &command_line) {
        join_reader_within(reader, READER_GRACE);
        return Err(e);
    }

    let bytes = reader
        .join()
        .map_err(|_| {
            ExecutionError::CommandFailed(
                command_line.clone(),
                std::io::Error::other("output reader thread panicked"),
            )
        })?
        .map_err(|e| ExecutionError::CommandFailed(command_line.clone(), e))?;

    String::from_utf8(bytes).map_err(|e| ExecutionError::InvalidUtf8Output {
        command: command_line,
        source: e,
    })
}

/// Joins the output reader if it finishes within `grace`.
///
/// A grandchild that inherited stdout keeps the pipe open after the child is
/// killed. The reader then stays blocked until that process exits, so it is
/// left detached rather than holding up the caller.
fn join_reader_within<T>(reader: thread::JoinHandle<T>, grace: Duration) {
    let started = Instant::now();
    while !reader.is_finished() && started.elapsed() < grace {
        thread::sleep(POLL_INTERVAL);
    }
    if reader.is_finished() {
        reader.join().ok();
    } else {
        log::debug!("Output pipe still held open after timeout; leaving the reader detached.");
    }
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
    command_line: &str,
) -> Result<(), ExecutionError> {
    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    log::warn!("'{}' exited with {}.", command_line, status);
                }
                return Ok(());
            }
            Ok(None) => {
                if let Some(limit) = timeout.filter(|limit| started.elapsed() >= *limit) {
                    log::debug!(
                        "Timeout reached, killing child process (PID: {})...",
                        child.id()
                    );
                    if let Err(e) = child.kill() {
                        log::warn!("Failed to kill child process {}: {}", child.id(), e);
                    }
                    child.wait().ok();
                    return Err(ExecutionError::TimedOut {
                        command: command_line.to_string(),
                        timeout: limit,
                    });
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                return Err(ExecutionError::CommandFailed(command_line.to_string(), e));
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::models::CommandResult;
    use std::path::PathBuf;

    fn spec(argument_string: &str, mode: ScriptMode) -> LaunchSpec {
        LaunchSpec {
            executable_path: "sh".to_string(),
            argument_string: argument_string.to_string(),
            working_directory: std::env::temp_dir(),
            mode,
        }
    }

    #[test]
    fn test_capture_returns_stdout() {
        let output =
            execute_and_capture_output(&spec(r#"-c "echo one; echo two""#, ScriptMode::Compact), None)
                .unwrap();
        assert_eq!(output, "one\ntwo\n");
    }

    #[test]
    fn test_silent_outcome_uses_last_line() {
        let outcome =
            run_launch_spec(&spec(r#"-c "echo first; echo last""#, ScriptMode::Silent), None).unwrap();
        assert_eq!(outcome.result, CommandResult::ShowToast("last".to_string()));
    }

    #[test]
    fn test_non_zero_exit_still_returns_output() {
        let output =
            execute_and_capture_output(&spec(r#"-c "echo partial; exit 3""#, ScriptMode::Inline), None)
                .unwrap();
        assert_eq!(output.trim(), "partial");
    }

    #[test]
    fn test_working_directory_is_used() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut spec = spec(r#"-c "pwd""#, ScriptMode::Compact);
        spec.working_directory = dunce::canonicalize(dir.path()).unwrap();

        let output = execute_and_capture_output(&spec, None).unwrap();
        assert_eq!(
            PathBuf::from(output.trim()),
            dunce::canonicalize(dir.path()).unwrap()
        );
    }

    #[test]
    fn test_timeout_kills_child() {
        let result = execute_and_capture_output(
            &spec(r#"-c "sleep 5""#, ScriptMode::Compact),
            Some(Duration::from_millis(200)),
        );
        assert!(matches!(result, Err(ExecutionError::TimedOut { .. })));
    }

    #[test]
    fn test_timeout_returns_while_grandchild_holds_the_pipe() {
        let started = Instant::now();
        let result = execute_and_capture_output(
            &spec(r#"-c "sleep 5 & echo started; sleep 5""#, ScriptMode::Compact),
            Some(Duration::from_millis(200)),
        );
        assert!(matches!(result, Err(ExecutionError::TimedOut { .. })));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn test_reader_is_joined_when_it_finishes_in_time() {
        let reader = thread::spawn(|| 7);
        join_reader_within(reader, Duration::from_secs(1));

        let stuck = thread::spawn(|| thread::sleep(Duration::from_secs(2)));
        let started = Instant::now();
        join_reader_within(stuck, Duration::from_millis(100));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_missing_program_and_bad_quoting() {
        let mut missing = spec("", ScriptMode::Compact);
        missing.executable_path = "scriptdeck-no-such-binary".to_string();
        assert!(matches!(
            execute_and_capture_output(&missing, None),
            Err(ExecutionError::CommandFailed(..))
        ));

        assert!(matches!(
            execute_and_capture_output(&spec(r#"-c "unterminated"#, ScriptMode::Compact), None),
            Err(ExecutionError::CommandParse(_))
        ));

        let mut empty = spec("", ScriptMode::Compact);
        empty.executable_path = "  ".to_string();
        assert!(matches!(
            execute_and_capture_output(&empty, None),
            Err(ExecutionError::EmptyCommand)
        ));
    }
}
