use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown grind type '{0}'")]
pub struct UnknownGrindType(pub String);

/// Brew method the grind is meant for.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrindType {
    Turkish,
    Espresso,
    Moka,
    #[default]
    Filter,
    PourOver,
    FrenchPress,
    ColdBrew,
}

impl GrindType {
    pub const ALL: [GrindType; 7] = [
        GrindType::Turkish,
        GrindType::Espresso,
        GrindType::Moka,
        GrindType::Filter,
        GrindType::PourOver,
        GrindType::FrenchPress,
        GrindType::ColdBrew,
    ];

    /// Target particle-size window for this brew method.
    pub fn targets(self) -> GrindTypeTargets {
        // (target_min, target_max, fines, boulders) in microns
        let (lo, hi, fines, boulders) = match self {
            GrindType::Turkish => (50.0, 200.0, 30.0, 400.0),
            GrindType::Espresso => (180.0, 380.0, 100.0, 600.0),
            GrindType::Moka => (360.0, 660.0, 150.0, 900.0),
            GrindType::Filter => (600.0, 900.0, 200.0, 1200.0),
            GrindType::PourOver => (500.0, 800.0, 200.0, 1100.0),
            GrindType::FrenchPress => (900.0, 1300.0, 300.0, 1600.0),
            GrindType::ColdBrew => (1100.0, 1500.0, 400.0, 1800.0),
        };
        GrindTypeTargets {
            grind_type: self,
            target_min_microns: lo,
            target_max_microns: hi,
            fines_threshold_microns: fines,
            boulders_threshold_microns: boulders,
        }
    }

    /// Snake-case identifier, identical to the serde form.
    pub fn key(self) -> &'static str {
        match self {
            GrindType::Turkish => "turkish",
            GrindType::Espresso => "espresso",
            GrindType::Moka => "moka",
            GrindType::Filter => "filter",
            GrindType::PourOver => "pour_over",
            GrindType::FrenchPress => "french_press",
            GrindType::ColdBrew => "cold_brew",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            GrindType::Turkish => "Turkish",
            GrindType::Espresso => "Espresso",
            GrindType::Moka => "Moka Pot",
            GrindType::Filter => "Filter",
            GrindType::PourOver => "Pour Over",
            GrindType::FrenchPress => "French Press",
            GrindType::ColdBrew => "Cold Brew",
        }
    }
}

impl fmt::Display for GrindType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for GrindType {
    type Err = UnknownGrindType;

    /// Accepts the snake-case key, case-insensitively, with `-` for `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        GrindType::ALL
            .into_iter()
            .find(|g| g.key() == key)
            .ok_or_else(|| UnknownGrindType(s.to_string()))
    }
}

/// Size window a detector classifies particles against.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrindTypeTargets {
    pub grind_type: GrindType,
    pub target_min_microns: f32,
    pub target_max_microns: f32,
    /// Particles below this size count as fines.
    pub fines_threshold_microns: f32,
    /// Particles above this size count as boulders.
    pub boulders_threshold_microns: f32,
}

impl GrindTypeTargets {
    #[inline]
    pub fn in_target(&self, size_microns: f32) -> bool {
        size_microns >= self.target_min_microns && size_microns <= self.target_max_microns
    }

    #[inline]
    pub fn is_fine(&self, size_microns: f32) -> bool {
        size_microns < self.fines_threshold_microns
    }

    #[inline]
    pub fn is_boulder(&self, size_microns: f32) -> bool {
        size_microns > self.boulders_threshold_microns
    }
}

impl Default for GrindTypeTargets {
    fn default() -> Self {
        GrindType::default().targets()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_grind_type_has_ordered_targets() {
        for g in GrindType::ALL {
            let t = g.targets();
            assert_eq!(t.grind_type, g);
            assert!(t.fines_threshold_microns < t.target_min_microns, "{g}");
            assert!(t.target_min_microns < t.target_max_microns, "{g}");
            assert!(t.target_max_microns < t.boulders_threshold_microns, "{g}");
        }
    }

    #[test]
    fn grind_type_serializes_snake_case() {
        let json = serde_json::to_string(&GrindType::FrenchPress).expect("ser");
        assert_eq!(json, "\"french_press\"");
        let back: GrindType = serde_json::from_str("\"cold_brew\"").expect("de");
        assert_eq!(back, GrindType::ColdBrew);
    }

    #[test]
    fn parses_keys() {
        for g in GrindType::ALL {
            assert_eq!(g.key().parse::<GrindType>(), Ok(g));
            let json = serde_json::to_string(&g).expect("ser");
            assert_eq!(json, format!("\"{}\"", g.key()));
        }
        assert_eq!("Pour-Over".parse::<GrindType>(), Ok(GrindType::PourOver));
        assert_eq!(
            "latte".parse::<GrindType>(),
            Err(UnknownGrindType("latte".to_string()))
        );
    }
}
