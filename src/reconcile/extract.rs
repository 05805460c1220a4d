//! Task extraction from recording transcripts.
//!
//! The generator is asked for a JSON array of `{title, status, priority}`.
//! Models often wrap the array in prose or code fences, so the reply is
//! scanned for the first `[` that starts a well-formed JSON array.

use std::fmt::Write as _;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::generation::BoxedGenerator;
use crate::model::{Recording, RecordingKind};

/// Build the extraction prompt for a transcript.
#[must_use]
pub fn build_extraction_prompt(transcript: &str, kind: RecordingKind) -> String {
    let source = match kind {
        RecordingKind::Voice => "a transcribed voice note",
        RecordingKind::Ocr => "text read from an image",
    };

    let mut prompt = format!(
        "Below is {source} from a software project. List the concrete action items it mentions.\n\
         Reply with a JSON array only. Each element is an object with:\n\
         - \"title\": a short imperative task title\n\
         - \"status\": one of \"pending\", \"in_progress\", \"done\"\n\
         - \"priority\": one of \"low\", \"medium\", \"high\"\n\
         Mark an item done only if the text says it is finished. \
         Reply with [] if there are no action items.\n\n"
    );
    let _ = writeln!(prompt, "Text:\n{}\n", transcript.trim());
    prompt.push_str("JSON:");
    prompt
}

/// Find the first JSON array in a generator reply.
///
/// # Errors
///
/// Returns `Generation` if the reply contains no JSON array.
pub fn parse_task_array(reply: &str) -> Result<Value> {
    for (start, _) in reply.match_indices('[') {
        let mut stream = serde_json::Deserializer::from_str(&reply[start..]).into_iter::<Value>();
        if let Some(Ok(value @ Value::Array(_))) = stream.next() {
            return Ok(value);
        }
    }
    Err(Error::Generation(
        "reply did not contain a JSON array of tasks".into(),
    ))
}

/// Ask the generator for the action items in a recording.
///
/// # Errors
///
/// Returns `Generation` if the call fails or the reply cannot be parsed.
pub async fn extract_tasks(generator: &BoxedGenerator, recording: &Recording) -> Result<Value> {
    let prompt = build_extraction_prompt(&recording.transcript, recording.kind);
    let reply = generator.generate(&prompt).await?;
    debug!(recording = %recording.id, chars = reply.len(), "Extraction reply received");

    let entries = parse_task_array(&reply)?;
    info!(
        recording = %recording.id,
        generator = %generator.info().name,
        count = entries.as_array().map_or(0, Vec::len),
        "Extracted tasks"
    );
    Ok(entries)
}
