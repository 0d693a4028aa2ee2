//! # Metadata Parser
//!
//! Reads the `# @raycast.<key> <value>` directives embedded in a script's comments
//! into a [`ScriptMetadata`] record.
//!
//! The parser is deliberately tolerant: unknown keys are ignored, an unknown
//! `mode` falls back to `fullOutput`, and a malformed argument is kept as a plain
//! placeholder. The one exception is `needsConfirmation`, whose value must be a
//! boolean literal; anything else rejects the whole file.

use crate::{
    constants::DIRECTIVE_PREFIX,
    core::arguments,
    models::{ScriptLanguage, ScriptMetadata, ScriptMode},
};
use log::{debug, trace};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Represents errors that invalidate a single script file.
#[derive(Error, Debug)]
pub enum ParseError {
    /// A boolean directive did not hold `true` or `false`.
    #[error("Invalid boolean '{value}' for '{key}' in '{path}'.")]
    InvalidBoolean {
        /// The script being parsed.
        path: PathBuf,
        /// The directive key.
        key: String,
        /// The offending value.
        value: String,
    },
}

/// Parses a script whose language is derived from its extension.
///
/// Files with an unrecognized extension yield `Ok(None)`.
pub fn parse_script_path(path: &Path) -> Result<Option<ScriptMetadata>, ParseError> {
    match ScriptLanguage::from_path(path) {
        Some(language) => parse_script_file(path, language),
        None => Ok(None),
    }
}

/// Reads and parses one script file.
///
/// # Returns
/// * `Ok(None)` when the path is empty, the file cannot be read, or it is empty.
/// * `Ok(Some(metadata))` otherwise, even when no directive was found.
///
/// # Errors
/// Returns `ParseError::InvalidBoolean` for a malformed `needsConfirmation`.
pub fn parse_script_file(
    path: &Path,
    language: ScriptLanguage,
) -> Result<Option<ScriptMetadata>, ParseError> {
    if path.as_os_str().is_empty() {
        return Ok(None);
    }

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Skipping script '{}': {}", path.display(), e);
            return Ok(None);
        }
    };
    if bytes.is_empty() {
        debug!("Skipping empty script '{}'.", path.display());
        return Ok(None);
    }

    let text = String::from_utf8_lossy(&bytes).into_owned();
    parse_script_text(path, language, text).map(Some)
}

/// Parses already-loaded script contents.
pub fn parse_script_text(
    path: &Path,
    language: ScriptLanguage,
    text: String,
) -> Result<ScriptMetadata, ParseError> {
    let mut metadata = ScriptMetadata::new(path.to_path_buf(), language, text);

    let body = std::mem::take(&mut metadata.script_body);
    for (key, value) in directives(&body) {
        apply_directive(&mut metadata, key, value)?;
    }
    metadata.script_body = body;

    Ok(metadata)
}

/// Yields `(key, value)` for every directive line, in file order.
fn directives(text: &str) -> impl Iterator<Item = (&str, &str)> {
    text.split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .filter_map(|line| line.strip_prefix(DIRECTIVE_PREFIX))
        .filter_map(|rest| rest.split_once(' '))
        .map(|(key, value)| (key.trim(), value.trim()))
}

fn apply_directive(
    metadata: &mut ScriptMetadata,
    key: &str,
    value: &str,
) -> Result<(), ParseError> {
    let text = || Some(value.to_string());

    match key {
        "schemaVersion" => metadata.schema_version = text(),
        "title" => metadata.title = text(),
        "mode" => metadata.mode = ScriptMode::from_directive(value),
        "packageName" => metadata.package_name = text(),
        "icon" => metadata.icon = text(),
        "iconDark" => metadata.icon_dark = text(),
        "currentDirectoryPath" => metadata.current_directory_path = text(),
        "needsConfirmation" => {
            metadata.needs_confirmation =
                parse_bool(value).ok_or_else(|| ParseError::InvalidBoolean {
                    path: metadata.script_file_path.clone(),
                    key: key.to_string(),
                    value: value.to_string(),
                })?;
        }
        "refreshTime" => metadata.refresh_time = text(),
        "author" => metadata.author = text(),
        "authorURL" => metadata.author_url = text(),
        "description" => metadata.description = text(),
        "argument1" | "argument2" | "argument3" => {
            let slot = argument_slot(key);
            if let Some(target) = slot.and_then(|slot| metadata.arguments.get_mut(slot)) {
                *target = arguments::decode_argument(value);
            }
        }
        _ => trace!("Ignoring unknown directive '{}'.", key),
    }
    Ok(())
}

/// `argument1` lives in slot 0, and so on.
fn argument_slot(key: &str) -> Option<usize> {
    key.strip_prefix("argument")
        .and_then(|digit| digit.parse::<usize>().ok())
        .and_then(|position| position.checked_sub(1))
}

fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
