//! pip requirements files
//!
//! Only the version specifier of the matching requirement changes. Name
//! spelling, extras, environment markers, comments, indentation and line
//! endings are carried over byte for byte.

use super::ManifestEdit;
use regex::Regex;
use std::sync::LazyLock;

static NAME_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-_.]+").expect("static regex is valid"));

/// PEP 503 normalised project name
pub fn normalize_name(name: &str) -> String {
  NAME_SEPARATORS.replace_all(name, "-").to_lowercase()
}

/// A requirement string after pinning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
  pub text: String,
  /// Exact version pinned before (`==x` or `===x`), if any
  pub previous: Option<String>,
}

/// Pin one requirement string to `version` if it names `package`
///
/// Returns `None` for comments, option lines (`-r`, `-e`, `--hash`) and
/// requirements on other projects.
pub fn rewrite_requirement(requirement: &str, package: &str, version: &str) -> Option<Rewritten> {
  let body = requirement.trim_start();
  let lead = &requirement[..requirement.len() - body.len()];

  if body.is_empty() || body.starts_with('#') || body.starts_with('-') {
    return None;
  }

  let name_end = body
    .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    .unwrap_or(body.len());
  if name_end == 0 {
    return None;
  }

  let name = &body[..name_end];
  if normalize_name(name) != normalize_name(package) {
    return None;
  }

  let rest = &body[name_end..];
  let extras_len = if rest.trim_start().starts_with('[') {
    rest.find(']').map(|i| i + 1).unwrap_or(0)
  } else {
    0
  };
  let extras = &rest[..extras_len];
  let after = &rest[extras_len..];

  let end = specifier_end(after);
  let specifier = &after[..end];
  let spec_trimmed = specifier.trim_end();
  let separator = &specifier[spec_trimmed.len()..];
  let tail = &after[end..];

  Some(Rewritten {
    text: format!("{}{}{}=={}{}{}", lead, name, extras, version, separator, tail),
    previous: exact_pin(spec_trimmed),
  })
}

/// Byte offset where the version specifier stops: a marker (`;`), a comment,
/// a line continuation or a per-requirement option such as `--hash`
fn specifier_end(after: &str) -> usize {
  let bytes = after.as_bytes();
  for (i, &b) in bytes.iter().enumerate() {
    let preceded_by_space = i > 0 && bytes[i - 1].is_ascii_whitespace();
    match b {
      b';' | b'\\' => return i,
      b'#' if preceded_by_space => return i,
      b'-' if preceded_by_space && bytes.get(i + 1) == Some(&b'-') => return i,
      _ => {}
    }
  }
  after.len()
}

fn exact_pin(specifier: &str) -> Option<String> {
  let spec = specifier.trim();
  let pinned = spec.strip_prefix("===").or_else(|| spec.strip_prefix("=="))?.trim();
  if pinned.is_empty() || pinned.contains([',', '*']) {
    return None;
  }
  Some(pinned.to_string())
}

/// Pin `package` to `version` in a requirements file
///
/// Every matching line is rewritten. Returns `None` when no line names the
/// package.
pub fn set_version(content: &str, package: &str, version: &str) -> Option<ManifestEdit> {
  let mut found = false;
  let mut previous = None;
  let mut updated = String::with_capacity(content.len() + version.len());

  for line in content.split_inclusive('\n') {
    let (text, eol) = split_line_ending(line);
    match rewrite_requirement(text, package, version) {
      Some(rewritten) => {
        found = true;
        if previous.is_none() {
          previous = rewritten.previous;
        }
        updated.push_str(&rewritten.text);
      }
      None => updated.push_str(text),
    }
    updated.push_str(eol);
  }

  if !found {
    return None;
  }
  Some(ManifestEdit::new(content, updated, previous))
}

fn split_line_ending(line: &str) -> (&str, &str) {
  if let Some(text) = line.strip_suffix("\r\n") {
    (text, "\r\n")
  } else if let Some(text) = line.strip_suffix('\n') {
    (text, "\n")
  } else {
    (line, "")
  }
}
