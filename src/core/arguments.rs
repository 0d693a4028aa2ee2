// src/core/arguments.rs

use crate::models::ScriptArgument;
use log::trace;

/// Decodes the value of an `argumentN` directive.
///
/// The value is normally a JSON object such as
/// `{ "type": "text", "placeholder": "Query", "optional": true }`. Older scripts
/// put a bare placeholder there instead, so anything that does not decode is
/// kept verbatim as the placeholder of a required text argument.
///
/// Blank input and a JSON `null` leave the slot empty. Decoding never fails.
pub fn decode_argument(raw: &str) -> Option<ScriptArgument> {
    if raw.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<Option<ScriptArgument>>(raw) {
        Ok(argument) => argument,
        Err(e) => {
            trace!("Argument '{}' is not JSON ({}); using it as a placeholder.", raw, e);
            Some(ScriptArgument::plain_text(raw))
        }
    }
}
