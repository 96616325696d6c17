//! Keep-a-Changelog maintenance
//!
//! Upgrades are announced in the `## [Unreleased]` section of each site's
//! changelog under a `### <section>` subsection:
//!
//! ```markdown
//! ## [Unreleased]
//!
//! ### Changed
//!
//! - Upgrade to Richie 2.18.0
//! ```
//!
//! Running the same upgrade twice leaves the file untouched. Upgrading again
//! before a release replaces the previous upgrade line instead of stacking
//! a second one.

/// Subsection order used by Keep a Changelog
const SECTION_ORDER: [&str; 6] = ["added", "changed", "deprecated", "removed", "fixed", "security"];

/// Add (or refresh) the upgrade entry for `version`
///
/// `template` is the entry text with a `{version}` placeholder. The returned
/// string equals `content` when the entry is already present. Line endings
/// and trailing blank lines of `content` are kept.
pub fn upsert_entry(content: &str, section: &str, template: &str, version: &str) -> String {
  let entry = format!("- {}", template.replace("{version}", version));
  let previous_prefix = template
    .split_once("{version}")
    .map(|(prefix, _)| format!("- {}", prefix))
    .filter(|prefix| prefix.len() > 2);

  let layout = Layout::of(content);
  let mut lines: Vec<String> = content.lines().map(String::from).collect();
  let unreleased = find_or_insert_unreleased(&mut lines);
  let section_end = next_heading(&lines, unreleased + 1, "## ").unwrap_or(lines.len());
  let heading = format!("### {}", section);

  let existing = lines[unreleased + 1..section_end]
    .iter()
    .position(|line| line.trim_end().eq_ignore_ascii_case(&heading))
    .map(|offset| offset + unreleased + 1);

  match existing {
    Some(start) => {
      let end = next_heading(&lines, start + 1, "### ")
        .filter(|end| *end < section_end)
        .unwrap_or(section_end);

      if lines[start + 1..end].iter().any(|line| line.trim_end() == entry) {
        return content.to_string();
      }

      if let Some(prefix) = &previous_prefix
        && let Some(offset) = lines[start + 1..end].iter().position(|line| line.starts_with(prefix.as_str()))
      {
        lines[start + 1 + offset] = entry;
        return layout.finish(lines);
      }

      let mut at = start + 1;
      while at < end && lines[at].trim().is_empty() {
        at += 1;
      }
      lines.insert(at, entry);
      if let Some(next) = lines.get(at + 1)
        && !next.trim().is_empty()
        && !next.starts_with("- ")
      {
        lines.insert(at + 1, String::new());
      }
    }
    None => {
      let rank = section_rank(section);
      let at = lines[unreleased + 1..section_end]
        .iter()
        .position(|line| line.starts_with("### ") && section_rank(&line[4..]) > rank)
        .map(|offset| offset + unreleased + 1)
        .unwrap_or(section_end);

      let mut block = vec![heading, String::new(), entry, String::new()];
      if at > 0 && !lines[at - 1].trim().is_empty() {
        block.insert(0, String::new());
      }
      lines.splice(at..at, block);
    }
  }

  layout.finish(lines)
}

fn is_unreleased_heading(line: &str) -> bool {
  line.starts_with("## ") && line.to_ascii_lowercase().contains("unreleased")
}

/// Index of the Unreleased heading, inserting one before the first release
/// heading (or at the end) when the changelog has none
fn find_or_insert_unreleased(lines: &mut Vec<String>) -> usize {
  if let Some(index) = lines.iter().position(|line| is_unreleased_heading(line)) {
    return index;
  }

  let mut at = next_heading(lines, 0, "## ").unwrap_or(lines.len());
  if at > 0 && !lines[at - 1].trim().is_empty() {
    lines.insert(at, String::new());
    at += 1;
  }
  lines.splice(at..at, ["## [Unreleased]".to_string(), String::new()]);
  at
}

fn next_heading(lines: &[String], from: usize, marker: &str) -> Option<usize> {
  lines
    .iter()
    .skip(from)
    .position(|line| line.starts_with(marker))
    .map(|offset| offset + from)
}

fn section_rank(name: &str) -> usize {
  let name = name.trim().to_ascii_lowercase();
  SECTION_ORDER
    .iter()
    .position(|known| *known == name)
    .unwrap_or(SECTION_ORDER.len())
}

/// Line ending and trailing blank lines of the original file
struct Layout {
  eol: &'static str,
  trailing_blank: usize,
}

impl Layout {
  fn of(content: &str) -> Self {
    Self {
      eol: if content.contains("\r\n") { "\r\n" } else { "\n" },
      trailing_blank: content.lines().rev().take_while(|line| line.trim().is_empty()).count(),
    }
  }

  fn finish(&self, mut lines: Vec<String>) -> String {
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
      lines.pop();
    }
    let mut output = lines.join(self.eol);
    for _ in 0..=self.trailing_blank {
      output.push_str(self.eol);
    }
    output
  }
}
