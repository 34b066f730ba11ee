//! Named workout configurations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::plan::TimingSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PresetKey {
    /// The user's own values.
    #[default]
    #[serde(rename = "custom")]
    Custom,
    #[serde(rename = "keops")]
    Keops,
    #[serde(rename = "30x30x4")]
    ThirtyByThirtyFour,
    #[serde(rename = "30x30x6")]
    ThirtyByThirtySix,
    #[serde(rename = "cambalache")]
    Cambalache,
    #[serde(rename = "area51")]
    Area51,
    #[serde(rename = "tabata")]
    Tabata,
}

impl PresetKey {
    pub fn all() -> &'static [PresetKey] {
        &[
            PresetKey::Keops,
            PresetKey::ThirtyByThirtyFour,
            PresetKey::ThirtyByThirtySix,
            PresetKey::Cambalache,
            PresetKey::Area51,
            PresetKey::Tabata,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PresetKey::Custom => "custom",
            PresetKey::Keops => "keops",
            PresetKey::ThirtyByThirtyFour => "30x30x4",
            PresetKey::ThirtyByThirtySix => "30x30x6",
            PresetKey::Cambalache => "cambalache",
            PresetKey::Area51 => "area51",
            PresetKey::Tabata => "tabata",
        }
    }

    /// The preset's values, `None` for `Custom`.
    pub fn preset(&self) -> Option<Preset> {
        let even = |slot, work, sets| vec![TimingSpec::with_work(slot, work); sets];
        let circuit = |label, n, sets, set_timings| Preset {
            key: *self,
            label,
            total_minutes: 12.0,
            exercise_count: n,
            set_count: sets,
            default_rest_seconds: 30,
            set_timings,
            excluded_group: None,
            structure: Structure::Circuit,
        };

        match self {
            PresetKey::Custom => None,
            PresetKey::Keops => Some(circuit(
                "Keops",
                4,
                3,
                vec![
                    TimingSpec::with_work(60, 30),
                    TimingSpec::with_work(60, 35),
                    TimingSpec::with_work(60, 45),
                ],
            )),
            PresetKey::ThirtyByThirtyFour => Some(circuit("30x30x4", 4, 3, even(60, 30, 3))),
            PresetKey::ThirtyByThirtySix => Some(circuit("30x30x6", 6, 2, even(60, 30, 2))),
            PresetKey::Cambalache => Some(circuit("Cambalache", 12, 1, even(90, 60, 1))),
            PresetKey::Area51 => Some(Preset {
                excluded_group: Some("full"),
                ..circuit("Area 51", 6, 1, even(120, 90, 1))
            }),
            PresetKey::Tabata => Some(Preset {
                structure: Structure::Tabata,
                ..circuit("Tabata", 6, 3, Vec::new())
            }),
        }
    }
}

impl fmt::Display for PresetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresetKey {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        std::iter::once(&PresetKey::Custom)
            .chain(PresetKey::all())
            .find(|p| p.as_str() == key)
            .copied()
            .ok_or(ConfigurationError::UnknownPreset(s.to_string()))
    }
}

/// How a preset turns its selection into blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Structure {
    Circuit,
    /// Fixed 20/10 structure over three paired sets.
    Tabata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preset {
    pub key: PresetKey,
    pub label: &'static str,
    pub total_minutes: f64,
    pub exercise_count: usize,
    pub set_count: usize,
    pub default_rest_seconds: u32,
    /// Empty for Tabata, whose timings are fixed.
    pub set_timings: Vec<TimingSpec>,
    /// Group removed from the pool before selection.
    pub excluded_group: Option<&'static str>,
    pub structure: Structure,
}

/// Every preset, in menu order.
pub fn catalog() -> Vec<Preset> {
    PresetKey::all().iter().filter_map(PresetKey::preset).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_all_presets() {
        let presets = catalog();
        assert_eq!(presets.len(), 6);
        assert!(presets
            .iter()
            .filter(|p| p.structure == Structure::Circuit)
            .all(|p| p.set_timings.len() == p.set_count));
    }

    #[test]
    fn keops_ramps_work() {
        let keops = PresetKey::Keops.preset().unwrap();
        let works: Vec<u32> = keops.set_timings.iter().map(|t| t.work).collect();
        assert_eq!(works, vec![30, 35, 45]);
        assert!(keops.set_timings.iter().all(TimingSpec::is_valid));
    }

    #[test]
    fn area51_excludes_full() {
        let p = PresetKey::Area51.preset().unwrap();
        assert_eq!(p.excluded_group, Some("full"));
        assert_eq!(p.set_timings, vec![TimingSpec { slot: 120, work: 90, rest: 30 }]);
    }

    #[test]
    fn parse_keys() {
        assert_eq!("30x30x6".parse::<PresetKey>().unwrap(), PresetKey::ThirtyByThirtySix);
        assert_eq!(" Tabata ".parse::<PresetKey>().unwrap(), PresetKey::Tabata);
        assert_eq!("custom".parse::<PresetKey>().unwrap(), PresetKey::Custom);
        assert!("hiit".parse::<PresetKey>().is_err());
        assert!(PresetKey::Custom.preset().is_none());
    }

    #[test]
    fn serde_uses_menu_keys() {
        let json = serde_json::to_string(&PresetKey::ThirtyByThirtyFour).unwrap();
        assert_eq!(json, "\"30x30x4\"");
        let key: PresetKey = serde_json::from_str("\"area51\"").unwrap();
        assert_eq!(key, PresetKey::Area51);
    }
}
