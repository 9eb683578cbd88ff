use serde::{Deserialize, Serialize};

use super::{CreatePageInput, CreateResourceInput, CreateTopicInput};

/// Content exported from the CMS, imported with `fsd seed`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentBundle {
    #[serde(default)]
    pub topics: Vec<CreateTopicInput>,
    #[serde(default)]
    pub resources: Vec<CreateResourceInput>,
    #[serde(default)]
    pub pages: Vec<CreatePageInput>,
}

/// Counts of records written by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub topics: usize,
    pub resources: usize,
    pub pages: usize,
}
