//! Configuration for block simplification.

use serde::Deserialize;

/// Rules for merging consecutive trips of a block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SimplifyConfig {
    /// Routes whose consecutive trips are merged even when their short
    /// names or headsigns differ.
    pub always_merge: Vec<String>,

    /// Trip id prefixes preferred as the surviving trip of a merge.
    /// Earlier tiers win over later ones.
    pub preferred_base_tiers: Vec<Vec<String>>,
}

impl SimplifyConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(always_merge: Vec<String>, preferred_base_tiers: Vec<Vec<String>>) -> Self {
        Self {
            always_merge,
            preferred_base_tiers,
        }
    }

    pub fn always_merges(&self, route: &str) -> bool {
        self.always_merge.iter().any(|r| r == route)
    }

    /// Priority of a trip as the base of a merge. Higher wins.
    ///
    /// Trips in a preferred tier rank above all others. Outside the tiers,
    /// trips without "Branch" in their id rank above branch trips.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokyo_gtfs::simplify::SimplifyConfig;
    ///
    /// let config = SimplifyConfig::default();
    /// assert!(config.base_score("JR-East.ShonanShinjuku.2201M") > config.base_score("JR-East.Yokosuka.2001M"));
    /// assert!(config.base_score("JR-East.Yokosuka.2001M") > config.base_score("JR-East.SobuRapid.2001M"));
    /// assert!(config.base_score("JR-East.SobuRapid.2001M") > config.base_score("JR-East.SobuRapidBranch.2001M"));
    /// ```
    pub fn base_score(&self, trip_id: &str) -> usize {
        let tiers = self.preferred_base_tiers.len();
        let tier = self
            .preferred_base_tiers
            .iter()
            .position(|prefixes| prefixes.iter().any(|p| trip_id.starts_with(p.as_str())));

        match tier {
            Some(idx) => 2 + (tiers - idx),
            None if !trip_id.contains("Branch") => 1,
            None => 0,
        }
    }
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            always_merge: vec!["JR-East.NaritaExpress".into(), "JR-East.Musashino".into()],
            // N'EX trains also call on the Yokosuka line
            preferred_base_tiers: vec![
                vec!["JR-East.ShonanShinjuku.".into()],
                vec![
                    "JR-East.Yokosuka.".into(),
                    "JR-East.Tsurumi.".into(),
                    "JR-East.Musashino.".into(),
                    "Tobu.TobuSkytree.".into(),
                ],
            ],
        }
    }
}
