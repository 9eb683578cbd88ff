use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::Diff2d;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Change {
    Added,
    Removed,
    Changed,
    Unchanged,
}

impl Change {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Changed => "changed",
            Self::Unchanged => "unchanged",
        }
    }

    pub fn marker(&self) -> char {
        match self {
            Self::Added => '+',
            Self::Removed => '-',
            Self::Changed => '~',
            Self::Unchanged => ' ',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffRow {
    pub id: String,
    pub change: Change,
    pub before: Option<String>,
    pub after: Option<String>,
}

/// Compare the two panels item by item, keyed by id.
///
/// Rows follow the `after` order; items only present in `before` come last,
/// in their original order.
pub fn compare(diff: &Diff2d) -> Vec<DiffRow> {
    let before: HashMap<&str, &str> = diff
        .before
        .items
        .iter()
        .map(|item| (item.id.as_str(), item.text.as_str()))
        .collect();

    let mut rows: Vec<DiffRow> = diff
        .after
        .items
        .iter()
        .map(|item| {
            let old = before.get(item.id.as_str()).copied();
            let change = match old {
                None => Change::Added,
                Some(text) if text == item.text => Change::Unchanged,
                Some(_) => Change::Changed,
            };
            DiffRow {
                id: item.id.clone(),
                change,
                before: old.map(str::to_string),
                after: Some(item.text.clone()),
            }
        })
        .collect();

    let kept: HashSet<&str> = diff.after.items.iter().map(|i| i.id.as_str()).collect();
    rows.extend(
        diff.before
            .items
            .iter()
            .filter(|item| !kept.contains(item.id.as_str()))
            .map(|item| DiffRow {
                id: item.id.clone(),
                change: Change::Removed,
                before: Some(item.text.clone()),
                after: None,
            }),
    );

    rows
}
