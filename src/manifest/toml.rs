//! `pyproject.toml` manifests
//!
//! Uses `toml_edit` so that comments, ordering and whitespace survive:
//!
//! - `[project] dependencies = ["richie==2.17.0"]`
//! - `[project.optional-dependencies] <group> = ["richie==2.17.0"]`
//! - `[tool.poetry.dependencies] richie = "2.17.0"` (or `{ version = "2.17.0" }`)

use super::ManifestEdit;
use super::requirements::{normalize_name, rewrite_requirement};
use toml_edit::{Array, DocumentMut, Item, Value};

/// Pin `package` to `version` wherever the document declares it
///
/// `Ok(None)` means the package is not declared.
pub fn set_version(content: &str, package: &str, version: &str) -> Result<Option<ManifestEdit>, String> {
  let mut doc: DocumentMut = content.parse().map_err(|e: toml_edit::TomlError| e.to_string())?;
  let mut found = false;
  let mut previous = None;

  if let Some(project) = doc.get_mut("project").and_then(Item::as_table_like_mut) {
    if let Some(deps) = project.get_mut("dependencies").and_then(Item::as_array_mut) {
      pin_requirements(deps, package, version, &mut found, &mut previous);
    }
    if let Some(groups) = project
      .get_mut("optional-dependencies")
      .and_then(Item::as_table_like_mut)
    {
      for (_, group) in groups.iter_mut() {
        if let Some(deps) = group.as_array_mut() {
          pin_requirements(deps, package, version, &mut found, &mut previous);
        }
      }
    }
  }

  if let Some(deps) = doc
    .get_mut("tool")
    .and_then(|tool| tool.get_mut("poetry"))
    .and_then(|poetry| poetry.get_mut("dependencies"))
    .and_then(Item::as_table_like_mut)
  {
    let wanted = normalize_name(package);
    let key = deps
      .iter()
      .map(|(key, _)| key.to_string())
      .find(|key| normalize_name(key) == wanted);

    if let Some(item) = key.and_then(|key| deps.get_mut(&key)) {
      found = true;
      let pinned = poetry_version_mut(item)
        .and_then(|value| set_string(value, version))
        .ok_or_else(|| format!("unsupported dependency specification for '{}' in [tool.poetry.dependencies]", package))?;
      if previous.is_none() {
        previous = Some(pinned.trim_start_matches(['^', '~', '=']).to_string());
      }
    }
  }

  if !found {
    return Ok(None);
  }

  let updated = doc.to_string();
  if updated == content {
    return Ok(Some(ManifestEdit::unchanged(content, previous)));
  }
  Ok(Some(ManifestEdit::new(content, updated, previous)))
}

/// Rewrite PEP 508 strings in an array, keeping each element's decoration
fn pin_requirements(deps: &mut Array, package: &str, version: &str, found: &mut bool, previous: &mut Option<String>) {
  for index in 0..deps.len() {
    let Some(requirement) = deps.get(index).and_then(Value::as_str).map(str::to_owned) else {
      continue;
    };
    let Some(rewritten) = rewrite_requirement(&requirement, package, version) else {
      continue;
    };

    *found = true;
    if previous.is_none() {
      *previous = rewritten.previous.clone();
    }
    if rewritten.text != requirement {
      deps.replace(index, rewritten.text);
    }
  }
}

/// The value holding a Poetry version, whether written inline or as a table
fn poetry_version_mut(item: &mut Item) -> Option<&mut Value> {
  match item {
    Item::Value(Value::InlineTable(table)) => table.get_mut("version"),
    Item::Value(value) => Some(value),
    Item::Table(table) => table.get_mut("version").and_then(Item::as_value_mut),
    _ => None,
  }
}

/// Replace a string value in place, returning the old string
fn set_string(value: &mut Value, version: &str) -> Option<String> {
  let old = value.as_str()?.to_string();
  if old != version {
    let decor = value.decor().clone();
    *value = Value::from(version);
    *value.decor_mut() = decor;
  }
  Some(old)
}
