use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

pub const DEFAULT_REQUIRED_LEVEL: &str = "intermediate";
pub const IMPORTANCE_RANGE: RangeInclusive<u8> = 1..=5;

/// A skill required by a job role, as stored alongside the role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRoleSkill {
    pub name: String,
    /// 1 (nice to have) – 5 (critical)
    pub importance: u8,
    #[serde(default, alias = "requiredLevel")]
    pub required_level: Option<String>,
}

impl JobRoleSkill {
    pub fn has_valid_importance(&self) -> bool {
        IMPORTANCE_RANGE.contains(&self.importance)
    }

    /// Required proficiency, falling back to `intermediate` when unset or blank.
    pub fn level(&self) -> &str {
        self.required_level
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_REQUIRED_LEVEL)
    }
}
