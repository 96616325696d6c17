//! npm `package.json`
//!
//! The document is parsed with key order preserved and re-serialised with the
//! indentation it was written with. A file whose pin already matches is
//! returned untouched, so formatting is never churned by a no-op run.

use super::ManifestEdit;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Serializer, Value};

/// Sections that may pin the package
const DEPENDENCY_SECTIONS: [&str; 3] = ["dependencies", "devDependencies", "peerDependencies"];

/// Pin `package` to `version` in every dependency section that lists it
///
/// `Ok(None)` means no section mentions the package.
pub fn set_version(content: &str, package: &str, version: &str) -> Result<Option<ManifestEdit>, String> {
  let mut doc: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
  let root = doc
    .as_object_mut()
    .ok_or_else(|| "top-level value is not an object".to_string())?;

  let mut found = false;
  let mut changed = false;
  let mut previous = None;

  for section in DEPENDENCY_SECTIONS {
    let Some(current) = root
      .get_mut(section)
      .and_then(Value::as_object_mut)
      .and_then(|deps| deps.get_mut(package))
    else {
      continue;
    };

    found = true;
    if previous.is_none() {
      previous = current.as_str().map(strip_range);
    }
    if current.as_str() != Some(version) {
      *current = Value::String(version.to_string());
      changed = true;
    }
  }

  if !found {
    return Ok(None);
  }
  if !changed {
    return Ok(Some(ManifestEdit::unchanged(content, previous)));
  }

  let indent = detect_indent(content);
  let mut buf = Vec::with_capacity(content.len());
  let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(indent.as_bytes()));
  doc.serialize(&mut serializer).map_err(|e| e.to_string())?;

  let mut updated = String::from_utf8(buf).map_err(|e| e.to_string())?;
  if content.ends_with('\n') {
    updated.push('\n');
  }

  Ok(Some(ManifestEdit::new(content, updated, previous)))
}

/// Version with any npm range operator removed (`^2.17.0` -> `2.17.0`)
fn strip_range(spec: &str) -> String {
  spec.trim().trim_start_matches(['^', '~', '=']).trim().to_string()
}

/// Indentation of the first indented line, two spaces by default
fn detect_indent(content: &str) -> String {
  content
    .lines()
    .map(|line| {
      line
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect::<String>()
    })
    .find(|indent| !indent.is_empty())
    .unwrap_or_else(|| "  ".to_string())
}
