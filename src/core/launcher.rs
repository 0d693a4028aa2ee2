// src/core/launcher.rs

use crate::{
    constants::{DEFAULT_SHELL, DEFAULT_SUCCESS_MESSAGE},
    core::paths,
    models::{CommandResult, LaunchSpec, ScriptLanguage, ScriptMetadata, ScriptMode, ScriptOutcome, Settings},
};
use std::path::{Path, PathBuf};

/// How a language's interpreter is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interpreter {
    /// A fixed executable followed by fixed flags and the quoted script path.
    Fixed {
        executable: &'static str,
        flags: &'static str,
    },
    /// The user's `bashPath`, followed by `-c` and the quoted script path.
    ConfiguredShell,
}

fn interpreter_for(language: ScriptLanguage) -> Interpreter {
    let windows = cfg!(target_os = "windows");
    match language {
        ScriptLanguage::PowerShell => Interpreter::Fixed {
            executable: if windows { "pwsh.exe" } else { "pwsh" },
            flags: "-noprofile -nologo -File",
        },
        ScriptLanguage::Python => Interpreter::Fixed {
            executable: if windows { "python.exe" } else { "python3" },
            flags: "",
        },
        ScriptLanguage::Bash => Interpreter::ConfiguredShell,
    }
}

/// Wraps a string in double quotes, escaping backslashes and internal double
/// quotes so the executor's POSIX split yields the value back unchanged.
pub fn wrap_value(value: &str) -> String {
    format!(
        "\"{}\"",
        value.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

/// Splits a shell command line such as `wsl -- bash` into its executable and
/// the (trimmed) flags that follow it. An empty command falls back to `bash`.
pub fn split_shell_command(command: &str) -> (String, String) {
    let command = command.trim();
    match command.split_once(' ') {
        Some((executable, flags)) => (executable.to_string(), flags.trim().to_string()),
        None if command.is_empty() => (DEFAULT_SHELL.to_string(), String::new()),
        None => (command.to_string(), String::new()),
    }
}

/// Builds everything needed to run `metadata` with the given argument values.
///
/// Empty argument values are skipped; the rest are appended in order, each quoted.
pub fn build_launch_spec(metadata: &ScriptMetadata, args: &[String], settings: &Settings) -> LaunchSpec {
    let script = wrap_value(&metadata.script_file_path.to_string_lossy());

    let (executable_path, mut parts) = match interpreter_for(metadata.language()) {
        Interpreter::Fixed { executable, flags } => (executable.to_string(), vec![flags.to_string()]),
        Interpreter::ConfiguredShell => {
            let (executable, flags) = split_shell_command(&settings.bash_path);
            (executable, vec![flags, "-c".to_string()])
        }
    };
    parts.push(script);
    parts.extend(args.iter().filter(|arg| !arg.is_empty()).map(|arg| wrap_value(arg)));
    parts.retain(|part| !part.is_empty());

    LaunchSpec {
        executable_path,
        argument_string: parts.join(" "),
        working_directory: resolve_working_directory(metadata),
        mode: metadata.mode,
    }
}

/// Picks the directory a script runs in.
///
/// A non-empty `currentDirectoryPath` wins: `~` and environment variables are
/// expanded and relative values are taken from the script's own directory.
/// Without it the script's directory is used.
pub fn resolve_working_directory(metadata: &ScriptMetadata) -> PathBuf {
    let script_dir = metadata
        .script_directory()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    match metadata
        .current_directory_path
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
    {
        Some(raw) => {
            let expanded = paths::expand_user_path(raw);
            if expanded.is_absolute() {
                expanded
            } else {
                script_dir.join(expanded)
            }
        }
        None => script_dir,
    }
}

/// The last non-blank line of a script's output, trimmed.
pub fn last_output_line(output: &str) -> Option<&str> {
    output.lines().map(str::trim).filter(|line| !line.is_empty()).last()
}

/// Maps a finished run to what the launcher should do next.
///
/// `output` is the captured standard output; it is `None` for interactive runs.
pub fn outcome_for(mode: ScriptMode, output: Option<&str>) -> ScriptOutcome {
    let last_line = output.and_then(last_output_line).map(str::to_string);

    match mode {
        ScriptMode::FullOutput => ScriptOutcome {
            result: CommandResult::Dismiss,
            toast: None,
            inline_subtitle: None,
        },
        // Any output at all earns a toast, even when every line is blank.
        ScriptMode::Compact => ScriptOutcome {
            result: CommandResult::KeepOpen,
            toast: output
                .filter(|text| !text.is_empty())
                .map(|_| last_line.unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string())),
            inline_subtitle: None,
        },
        ScriptMode::Silent => ScriptOutcome {
            result: CommandResult::ShowToast(
                last_line.unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string()),
            ),
            toast: None,
            inline_subtitle: None,
        },
        ScriptMode::Inline => ScriptOutcome {
            result: CommandResult::KeepOpen,
            toast: None,
            inline_subtitle: last_line,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata_parser::parse_script_text;

    fn metadata(path: &str, language: ScriptLanguage, text: &str) -> ScriptMetadata {
        parse_script_text(Path::new(path), language, text.to_string()).unwrap()
    }

    fn settings(bash_path: &str) -> Settings {
        Settings {
            bash_path: bash_path.to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_bash_uses_configured_shell() {
        let m = metadata("/scripts/foo.sh", ScriptLanguage::Bash, "# @raycast.title Foo\n");
        let spec = build_launch_spec(&m, &[], &settings("wsl -- bash"));

        assert_eq!(spec.executable_path, "wsl");
        assert_eq!(spec.argument_string, r#"-- bash -c "/scripts/foo.sh""#);
        assert_eq!(spec.working_directory, PathBuf::from("/scripts"));
        assert_eq!(spec.mode, ScriptMode::FullOutput);
    }

    #[test]
    fn test_bash_without_flags_and_empty_setting() {
        let m = metadata("/scripts/foo.sh", ScriptLanguage::Bash, "# @raycast.title Foo\n");

        let spec = build_launch_spec(&m, &[], &settings("/usr/bin/bash"));
        assert_eq!(spec.executable_path, "/usr/bin/bash");
        assert_eq!(spec.argument_string, r#"-c "/scripts/foo.sh""#);

        let spec = build_launch_spec(&m, &[], &settings("   "));
        assert_eq!(spec.executable_path, "bash");
    }

    #[test]
    fn test_powershell_and_python_use_fixed_interpreters() {
        let ps = metadata("/s/run.ps1", ScriptLanguage::PowerShell, "# @raycast.title R\n");
        let spec = build_launch_spec(&ps, &[], &settings("bash"));
        assert!(spec.executable_path.starts_with("pwsh"));
        assert_eq!(spec.argument_string, r#"-noprofile -nologo -File "/s/run.ps1""#);

        let py = metadata("/s/run.py", ScriptLanguage::Python, "# @raycast.title R\n");
        let spec = build_launch_spec(&py, &[], &settings("bash"));
        assert!(spec.executable_path.starts_with("python"));
        assert_eq!(spec.argument_string, r#""/s/run.py""#);
    }

    #[test]
    fn test_extra_arguments_are_quoted_and_empty_ones_skipped() {
        let m = metadata("/s/run.py", ScriptLanguage::Python, "# @raycast.mode compact\n");
        let args = vec![
            "first".to_string(),
            String::new(),
            "say \"hi\"".to_string(),
        ];
        let spec = build_launch_spec(&m, &args, &settings("bash"));

        assert_eq!(spec.argument_string, r#""/s/run.py" "first" "say \"hi\"""#);
        assert_eq!(spec.mode, ScriptMode::Compact);
    }

    #[test]
    fn test_argument_string_splits_back_into_original_values() {
        let py = metadata(r"\\server\share\run.py", ScriptLanguage::Python, "# @raycast.title R\n");
        let args = vec![
            r"C:\temp\".to_string(),
            r"a\\b".to_string(),
            "say \"hi\" \\ bye".to_string(),
            "$HOME `pwd`".to_string(),
        ];
        let spec = build_launch_spec(&py, &args, &settings("bash"));

        let mut expected = vec![r"\\server\share\run.py".to_string()];
        expected.extend(args);
        assert_eq!(shlex::split(&spec.argument_string), Some(expected));
    }

    #[test]
    fn test_wrap_value_escapes_backslashes_before_quotes() {
        assert_eq!(wrap_value(r"C:\temp\"), r#""C:\\temp\\""#);
        assert_eq!(wrap_value(r#"a"b"#), r#""a\"b""#);
    }

    #[test]
    fn test_working_directory_honours_current_directory_path() {
        let absolute = metadata(
            "/s/a.sh",
            ScriptLanguage::Bash,
            "# @raycast.currentDirectoryPath /tmp/work\n",
        );
        assert_eq!(resolve_working_directory(&absolute), PathBuf::from("/tmp/work"));

        let relative = metadata(
            "/s/a.sh",
            ScriptLanguage::Bash,
            "# @raycast.currentDirectoryPath out/build\n",
        );
        assert_eq!(resolve_working_directory(&relative), PathBuf::from("/s/out/build"));

        let home = metadata("/s/a.sh", ScriptLanguage::Bash, "# @raycast.currentDirectoryPath ~\n");
        if let Some(home_dir) = dirs::home_dir() {
            assert_eq!(resolve_working_directory(&home), home_dir);
        }

        let unset = metadata("/s/a.sh", ScriptLanguage::Bash, "# @raycast.title A\n");
        assert_eq!(resolve_working_directory(&unset), PathBuf::from("/s"));
    }

    #[test]
    fn test_split_shell_command() {
        assert_eq!(
            split_shell_command("wsl --  bash "),
            ("wsl".to_string(), "--  bash".to_string())
        );
        assert_eq!(split_shell_command("zsh"), ("zsh".to_string(), String::new()));
        assert_eq!(split_shell_command(""), ("bash".to_string(), String::new()));
    }

    #[test]
    fn test_last_output_line() {
        assert_eq!(last_output_line("one\ntwo\n\n  \n"), Some("two"));
        assert_eq!(last_output_line("  done  "), Some("done"));
        assert_eq!(last_output_line("\n\n"), None);
    }

    #[test]
    fn test_outcome_per_mode() {
        assert_eq!(
            outcome_for(ScriptMode::FullOutput, None).result,
            CommandResult::Dismiss
        );

        let compact = outcome_for(ScriptMode::Compact, Some("a\nb\n"));
        assert_eq!(compact.result, CommandResult::KeepOpen);
        assert_eq!(compact.toast.as_deref(), Some("b"));
        assert!(outcome_for(ScriptMode::Compact, Some("")).toast.is_none());
        assert_eq!(
            outcome_for(ScriptMode::Compact, Some("\n\n")).toast.as_deref(),
            Some(DEFAULT_SUCCESS_MESSAGE)
        );

        assert_eq!(
            outcome_for(ScriptMode::Silent, Some("saved\n")).result,
            CommandResult::ShowToast("saved".to_string())
        );
        assert_eq!(
            outcome_for(ScriptMode::Silent, Some("")).result,
            CommandResult::ShowToast(DEFAULT_SUCCESS_MESSAGE.to_string())
        );

        let inline = outcome_for(ScriptMode::Inline, Some("42 open PRs\n"));
        assert_eq!(inline.result, CommandResult::KeepOpen);
        assert_eq!(inline.inline_subtitle.as_deref(), Some("42 open PRs"));
    }
}
