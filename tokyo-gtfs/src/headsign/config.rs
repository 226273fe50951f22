//! Configuration for headsign generation.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::domain::Names;

/// Names of the two directions of a loop line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoopDirections {
    /// Direction 0.
    pub outbound: Names,
    /// Direction 1.
    pub inbound: Names,
}

impl LoopDirections {
    pub fn get(&self, direction: u8) -> Option<&Names> {
        match direction {
            0 => Some(&self.outbound),
            1 => Some(&self.inbound),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HeadsignConfig {
    /// Destination names replacing stop names, keyed by stop id suffix.
    pub stop_overrides: BTreeMap<String, Names>,

    /// Routes running in a loop, whose headsigns name the direction.
    pub loop_lines: BTreeMap<String, LoopDirections>,
}

impl HeadsignConfig {
    /// Override for a stop, if its id ends with a configured suffix.
    pub fn override_for(&self, stop_id: &str) -> Option<&Names> {
        self.stop_overrides
            .iter()
            .find(|(suffix, _)| stop_id.ends_with(suffix.as_str()))
            .map(|(_, names)| names)
    }
}

impl Default for HeadsignConfig {
    fn default() -> Self {
        let narita = Names {
            ja: "成田空港".into(),
            en: "Narita Airport".into(),
            ko: "나리타 공항".into(),
            zh_hans: "成田机场".into(),
            zh_hant: "成田機場".into(),
        };
        let yamanote = LoopDirections {
            outbound: Names {
                ja: "外回り".into(),
                en: "Outer Loop".into(),
                ko: "외선순환".into(),
                zh_hans: "外环".into(),
                zh_hant: "外環".into(),
            },
            inbound: Names {
                ja: "内回り".into(),
                en: "Inner Loop".into(),
                ko: "내선순환".into(),
                zh_hans: "内环".into(),
                zh_hant: "內環".into(),
            },
        };

        Self {
            stop_overrides: BTreeMap::from([(".NaritaAirportTerminal1".to_string(), narita)]),
            loop_lines: BTreeMap::from([("JR-East.Yamanote".to_string(), yamanote)]),
        }
    }
}
