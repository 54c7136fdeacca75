//! Diffs between environment lists and rendered documents.

use k8s_openapi::api::core::v1::EnvVar;
use similar::{ChangeTag, TextDiff};
use std::collections::BTreeMap;

const IN_OLD: u8 = 0b001;
const IN_NEW: u8 = 0b010;
const EQUAL: u8 = 0b100;

/// Entry names grouped by what happened to them, each sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvDiff {
    pub changed: Vec<String>,
    pub removed: Vec<String>,
    pub added: Vec<String>,
}

impl EnvDiff {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty() && self.added.is_empty()
    }
}

/// Classify every entry name of `old` and `new`.
pub fn diff_env(old: &[EnvVar], new: &[EnvVar]) -> EnvDiff {
    let mut codes: BTreeMap<&str, u8> = BTreeMap::new();

    for entry in old {
        *codes.entry(entry.name.as_str()).or_default() |= IN_OLD;
    }

    for entry in new {
        let code = codes.entry(entry.name.as_str()).or_default();
        *code |= IN_NEW;

        if *code & IN_OLD != 0 {
            let same = old
                .iter()
                .find(|o| o.name == entry.name)
                .is_some_and(|o| o.value == entry.value && o.value_from == entry.value_from);
            if same {
                *code |= EQUAL;
            }
        }
    }

    let mut diff = EnvDiff::default();
    for (name, code) in codes {
        if code & EQUAL != 0 {
            continue;
        }
        match code {
            IN_OLD => diff.removed.push(name.to_string()),
            IN_NEW => diff.added.push(name.to_string()),
            _ => diff.changed.push(name.to_string()),
        }
    }

    diff
}

/// Line diff of two documents, removed lines prefixed with `-` and added ones with `+`.
pub fn render_text_diff(old: &str, new: &str) -> String {
    let mut out = String::new();

    for change in TextDiff::from_lines(old, new).iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        out.push_str(sign);
        out.push_str(change.value());
        if change.missing_newline() {
            out.push('\n');
        }
    }

    out
}
