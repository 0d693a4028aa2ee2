// src/models.rs

use crate::constants::{DEFAULT_SHELL, MAX_ARGUMENTS};
use crate::core::fingerprint;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// --- SCRIPT LANGUAGE ---

/// The interpreter family a script belongs to. Fixed when the script is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptLanguage {
    /// `.sh` scripts, run through the configured shell.
    Bash,
    /// `.ps1` scripts.
    PowerShell,
    /// `.py` scripts.
    Python,
}

impl ScriptLanguage {
    /// Every supported language, in display order.
    pub const ALL: [Self; 3] = [Self::Bash, Self::PowerShell, Self::Python];

    /// The file extension (without the dot) that identifies this language.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Bash => "sh",
            Self::PowerShell => "ps1",
            Self::Python => "py",
        }
    }

    /// Matches an extension case-insensitively.
    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|language| language.extension().eq_ignore_ascii_case(extension))
    }

    /// Derives the language from a path's extension, if it is a recognized script.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|extension| extension.to_str())
            .and_then(Self::from_extension)
    }

    /// The presentation label for this language.
    pub fn tag(self) -> LanguageTag {
        match self {
            Self::Bash => LanguageTag {
                text: "bash",
                icon: "bash",
            },
            Self::PowerShell => LanguageTag {
                text: "ps1",
                icon: "pwsh",
            },
            Self::Python => LanguageTag {
                text: "py",
                icon: "python",
            },
        }
    }
}

/// A short label plus an icon identifier, shown next to each listed script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageTag {
    /// The visible label.
    pub text: &'static str,
    /// Icon identifier for the label.
    pub icon: &'static str,
}

// --- PRESENTATION MODE ---

/// How a script's output reaches the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptMode {
    /// Interactive run with the whole output visible; the launcher is dismissed.
    #[default]
    FullOutput,
    /// Output captured; the last line is shown as a toast while the launcher stays open.
    Compact,
    /// Output captured; the last line is shown as a HUD after the launcher closes.
    Silent,
    /// Output captured; the last line replaces the command's subtitle.
    Inline,
}

impl ScriptMode {
    /// Maps a `mode` directive value. Matching is case-sensitive and anything
    /// unrecognized falls back to `FullOutput`.
    pub fn from_directive(value: &str) -> Self {
        match value {
            "fullOutput" => Self::FullOutput,
            "compact" => Self::Compact,
            "silent" => Self::Silent,
            "inline" => Self::Inline,
            _ => Self::FullOutput,
        }
    }

    /// The directive spelling of this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullOutput => "fullOutput",
            Self::Compact => "compact",
            Self::Silent => "silent",
            Self::Inline => "inline",
        }
    }

    /// Whether running in this mode captures standard output.
    pub fn captures_output(self) -> bool {
        !matches!(self, Self::FullOutput)
    }
}

// --- ARGUMENTS ---

fn default_argument_type() -> String {
    "text".to_string()
}

/// One positional argument declared by `argument1`..`argument3`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScriptArgument {
    /// `text`, `password` or `dropdown`.
    #[serde(rename = "type", default = "default_argument_type")]
    pub kind: String,
    /// Hint shown in the empty input.
    #[serde(default)]
    pub placeholder: String,
    /// Whether the script runs without a value.
    #[serde(default)]
    pub optional: bool,
    /// Whether the value is percent-encoded before it is passed on.
    #[serde(default)]
    pub percent_encoded: bool,
    /// Choices for `dropdown` arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<ArgumentOption>>,
}

impl ScriptArgument {
    /// The legacy form: a bare placeholder for a required text argument.
    pub fn plain_text(placeholder: &str) -> Self {
        Self {
            kind: default_argument_type(),
            placeholder: placeholder.to_string(),
            optional: false,
            percent_encoded: false,
            data: None,
        }
    }
}

/// A dropdown entry for arguments of type `dropdown`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ArgumentOption {
    /// What the user sees.
    pub title: String,
    /// What the script receives.
    pub value: String,
}

// --- SCRIPT METADATA ---

/// Everything known about one discovered script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptMetadata {
    /// Absolute path; the identity of the record.
    pub script_file_path: PathBuf,
    language: ScriptLanguage,
    /// Full file contents, loaded once.
    pub script_body: String,
    /// Content hash of `script_body`.
    pub fingerprint: String,
    /// `schemaVersion`
    pub schema_version: Option<String>,
    /// `title`; scripts without one are not listed.
    pub title: Option<String>,
    /// `mode`
    pub mode: ScriptMode,
    /// `packageName`
    pub package_name: Option<String>,
    /// `icon`
    pub icon: Option<String>,
    /// `iconDark`
    pub icon_dark: Option<String>,
    /// `currentDirectoryPath`
    pub current_directory_path: Option<String>,
    /// `needsConfirmation`
    pub needs_confirmation: bool,
    /// `refreshTime`, unparsed.
    pub refresh_time: Option<String>,
    /// `argument1`..`argument3`, by slot.
    pub arguments: [Option<ScriptArgument>; MAX_ARGUMENTS],
    /// `author`
    pub author: Option<String>,
    /// `authorURL`
    pub author_url: Option<String>,
    /// `description`
    pub description: Option<String>,
}

impl ScriptMetadata {
    /// Creates a record with no declared fields.
    pub fn new(script_file_path: PathBuf, language: ScriptLanguage, script_body: String) -> Self {
        let fingerprint = fingerprint::content_fingerprint(script_body.as_bytes());
        Self {
            script_file_path,
            language,
            script_body,
            fingerprint,
            schema_version: None,
            title: None,
            mode: ScriptMode::default(),
            package_name: None,
            icon: None,
            icon_dark: None,
            current_directory_path: None,
            needs_confirmation: false,
            refresh_time: None,
            arguments: Default::default(),
            author: None,
            author_url: None,
            description: None,
        }
    }

    /// The language derived from the file extension.
    pub fn language(&self) -> ScriptLanguage {
        self.language
    }

    /// The label shown next to the script.
    pub fn language_tag(&self) -> LanguageTag {
        self.language.tag()
    }

    /// Only scripts with a non-empty title are listed.
    pub fn is_listable(&self) -> bool {
        self.title.as_deref().is_some_and(|title| !title.is_empty())
    }

    /// The title, or an empty string.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    /// The directory containing the script.
    pub fn script_directory(&self) -> Option<&Path> {
        self.script_file_path.parent()
    }

    /// The declared arguments, skipping empty slots.
    pub fn declared_arguments(&self) -> impl Iterator<Item = (usize, &ScriptArgument)> {
        self.arguments
            .iter()
            .enumerate()
            .filter_map(|(slot, argument)| argument.as_ref().map(|argument| (slot, argument)))
    }
}

// --- SETTINGS ---

/// One monitored root directory.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScriptDirectoryInfo {
    /// Absolute path of the root.
    pub full_path: PathBuf,
}

impl ScriptDirectoryInfo {
    /// Wraps `full_path` as given.
    pub fn new(full_path: impl Into<PathBuf>) -> Self {
        Self {
            full_path: full_path.into(),
        }
    }

    /// The last segment of the path, or the whole path when it has none.
    pub fn display_name(&self) -> String {
        self.full_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.full_path.display().to_string())
    }
}

fn default_bash_path() -> String {
    if cfg!(target_os = "windows") {
        "wsl -- bash".to_string()
    } else {
        DEFAULT_SHELL.to_string()
    }
}

/// Process-wide settings persisted as JSON.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Interpreter command line for bash-family scripts, e.g. `wsl -- bash`.
    #[serde(default = "default_bash_path")]
    pub bash_path: String,
    /// Monitored roots, in scan order.
    #[serde(default)]
    pub directories: Vec<ScriptDirectoryInfo>,
    /// Upper bound for captured runs. `None` waits for the script to exit.
    #[serde(default)]
    pub launch_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bash_path: default_bash_path(),
            directories: Vec::new(),
            launch_timeout_secs: None,
        }
    }
}

// --- LAUNCH & PRESENTATION ---

/// Everything the process launcher needs to run one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    /// The interpreter to start.
    pub executable_path: String,
    /// Flags, the quoted script path and quoted argument values.
    pub argument_string: String,
    /// Where the interpreter starts.
    pub working_directory: PathBuf,
    /// Decides whether output is captured.
    pub mode: ScriptMode,
}

/// What the launcher UI should do after a command ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Close the launcher.
    Dismiss,
    /// Stay open.
    KeepOpen,
    /// Close and show the message.
    ShowToast(String),
}

/// The result of running a script, as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutcome {
    /// What the launcher does next.
    pub result: CommandResult,
    /// Transient notification shown while the launcher stays open.
    pub toast: Option<String>,
    /// New subtitle for inline scripts.
    pub inline_subtitle: Option<String>,
}

/// Resolved icons for both themes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IconInfo {
    /// Icon for light themes.
    pub light: String,
    /// Icon for dark themes.
    pub dark: String,
}

/// The fields a listing shows for one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItemView {
    /// The script's title.
    pub title: String,
    /// Package name, or the parent directory name.
    pub subtitle: String,
    /// Language labels.
    pub tags: Vec<LanguageTag>,
    /// Markdown: description followed by the fenced script body.
    pub details: String,
}

// --- REGISTRY NOTIFICATIONS ---

/// Change notifications emitted by the command registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// The registry was rebuilt from scratch.
    Reloaded {
        /// Scripts now registered.
        count: usize,
    },
    /// A script was added.
    Inserted {
        /// The added script.
        path: PathBuf,
    },
    /// A script was removed.
    Removed {
        /// The removed script.
        path: PathBuf,
    },
    /// The set of monitored roots changed.
    DirectoriesChanged {
        /// The new roots.
        directories: Vec<ScriptDirectoryInfo>,
    },
}
