//! Exercise records and the per-load exercise pool.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Group assigned to records that carry no group of their own.
pub const DEFAULT_GROUP: &str = "full";

/// Trim and lowercase a raw field value.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// One exercise as loaded from the exercises table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    /// Normalized muscle group. Empty only for placeholders.
    pub group: String,
    pub name: String,
    #[serde(default)]
    pub how_to: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl ExerciseRecord {
    /// Build an enabled record, normalizing the group.
    pub fn new(name: impl Into<String>, group: &str) -> Self {
        let group = normalize(group);
        Self {
            group: if group.is_empty() {
                DEFAULT_GROUP.to_string()
            } else {
                group
            },
            name: name.into(),
            how_to: String::new(),
            image_url: String::new(),
            enabled: true,
        }
    }

    pub fn with_how_to(mut self, how_to: impl Into<String>) -> Self {
        self.how_to = how_to.into();
        self
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = image_url.into();
        self
    }

    /// Synthetic exercise attached to non-work blocks.
    pub fn placeholder(name: &str, how_to: &str) -> Self {
        Self {
            group: String::new(),
            name: name.to_string(),
            how_to: how_to.to_string(),
            image_url: String::new(),
            enabled: true,
        }
    }

    /// Uniqueness key: `(name, group)`.
    pub fn key(&self) -> ExerciseKey {
        ExerciseKey {
            name: self.name.clone(),
            group: self.group.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExerciseKey {
    pub name: String,
    pub group: String,
}

/// Enabled exercises for one load cycle, replaced wholesale on reload.
#[derive(Debug, Clone, Default)]
pub struct ExercisePool {
    records: Vec<ExerciseRecord>,
}

impl ExercisePool {
    /// Keep only enabled, named records.
    pub fn new(records: Vec<ExerciseRecord>) -> Self {
        let records = records
            .into_iter()
            .filter(|r| r.enabled && !r.name.trim().is_empty())
            .collect();
        Self { records }
    }

    pub fn records(&self) -> &[ExerciseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct groups present in the pool, sorted.
    pub fn groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = self
            .by_group()
            .into_keys()
            .filter(|g| !g.is_empty())
            .collect();
        groups.sort();
        groups
    }

    /// Records partitioned by group, in load order within each group.
    pub fn by_group(&self) -> BTreeMap<String, Vec<ExerciseRecord>> {
        let mut map: BTreeMap<String, Vec<ExerciseRecord>> = BTreeMap::new();
        for record in &self.records {
            map.entry(record.group.clone())
                .or_default()
                .push(record.clone());
        }
        map
    }

    /// Records in `group`.
    pub fn in_group(&self, group: &str) -> Vec<ExerciseRecord> {
        self.records
            .iter()
            .filter(|r| r.group == group)
            .cloned()
            .collect()
    }

    /// Pool without the records of `group`.
    pub fn excluding_group(&self, group: &str) -> Self {
        Self {
            records: self
                .records
                .iter()
                .filter(|r| r.group != group)
                .cloned()
                .collect(),
        }
    }

    /// Number of distinct `(name, group)` keys, optionally within one group.
    pub fn unique_count(&self, group: Option<&str>) -> usize {
        let mut keys: Vec<ExerciseKey> = self
            .records
            .iter()
            .filter(|r| group.map_or(true, |g| r.group == g))
            .map(ExerciseRecord::key)
            .collect();
        keys.sort();
        keys.dedup();
        keys.len()
    }
}
