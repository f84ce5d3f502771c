//! Renewal intervals per material.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Interval used for materials that are not listed in a policy.
pub const DEFAULT_INTERVAL_MONTHS: u32 = 6;

/// Maps each material to the number of months after first issue before it is
/// due for reissue.
///
/// A deserialized `materials` table is layered over the default table, so a
/// config only lists the materials it adds or changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialPolicy {
    #[serde(default = "default_interval_months")]
    pub default_interval_months: u32,
    #[serde(default = "default_materials", deserialize_with = "merge_with_defaults")]
    pub materials: BTreeMap<String, u32>,
}

fn default_materials() -> BTreeMap<String, u32> {
    [
        ("Safety Shoes", 7),
        ("Hard Hat", 6),
        ("Vest", 6),
        ("Uniform", 12),
        ("Eye Wear", 1),
        ("Raincoat", 12),
    ]
    .into_iter()
    .map(|(name, months)| (name.to_string(), months))
    .collect()
}

fn merge_with_defaults<'de, D>(deserializer: D) -> Result<BTreeMap<String, u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = BTreeMap::<String, u32>::deserialize(deserializer)?;
    let mut materials = default_materials();
    materials.extend(overrides);
    Ok(materials)
}

fn default_interval_months() -> u32 {
    DEFAULT_INTERVAL_MONTHS
}

impl Default for MaterialPolicy {
    fn default() -> Self {
        Self {
            default_interval_months: default_interval_months(),
            materials: default_materials(),
        }
    }
}

impl MaterialPolicy {
    /// Build a policy from explicit intervals, keeping the 6-month fallback.
    pub fn new<I, S>(materials: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        Self {
            default_interval_months: DEFAULT_INTERVAL_MONTHS,
            materials: materials.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Interval for `material`, falling back to the default for unknown names.
    pub fn interval_months(&self, material: &str) -> u32 {
        self.materials
            .get(material)
            .copied()
            .unwrap_or(self.default_interval_months)
    }

    pub fn is_known(&self, material: &str) -> bool {
        self.materials.contains_key(material)
    }

    /// Known material names, sorted.
    pub fn material_names(&self) -> impl Iterator<Item = &str> {
        self.materials.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table() {
        let policy = MaterialPolicy::default();
        assert_eq!(policy.interval_months("Safety Shoes"), 7);
        assert_eq!(policy.interval_months("Eye Wear"), 1);
        assert_eq!(policy.interval_months("Uniform"), 12);
        assert_eq!(policy.material_names().count(), 6);
    }

    #[test]
    fn unknown_material_falls_back() {
        let policy = MaterialPolicy::default();
        assert!(!policy.is_known("Gloves"));
        assert_eq!(policy.interval_months("Gloves"), 6);
        // Lookup is exact.
        assert_eq!(policy.interval_months("hard hat"), 6);
    }

    #[test]
    fn deserializes_partial_toml() {
        let policy: MaterialPolicy = toml::from_str("default_interval_months = 3").unwrap();
        assert_eq!(policy.interval_months("Gloves"), 3);
        assert_eq!(policy.interval_months("Vest"), 6);
    }

    #[test]
    fn listed_materials_extend_the_default_table() {
        let policy: MaterialPolicy = toml::from_str(
            r#"
[materials]
"Hard Hat" = 3
Gloves = 2
"#,
        )
        .unwrap();
        assert_eq!(policy.interval_months("Hard Hat"), 3);
        assert_eq!(policy.interval_months("Gloves"), 2);
        assert_eq!(policy.interval_months("Safety Shoes"), 7);
        assert_eq!(policy.interval_months("Eye Wear"), 1);
        assert_eq!(policy.interval_months("Uniform"), 12);
        assert_eq!(policy.material_names().count(), 7);
    }
}
