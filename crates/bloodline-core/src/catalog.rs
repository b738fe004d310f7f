//! Hand-authored trait rule tables
//!
//! Synergy clusters, conflict pairs, dominance tiers and emergent-property
//! rules are plain data. [`TraitCatalog::builtin`] carries the shipped
//! tables; [`TraitCatalog::from_toml_str`] loads a replacement.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Traits that reinforce each other when two or more are present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyCluster {
    pub name: String,
    pub traits: Vec<String>,
    pub strength: f64,
    pub amplification: f64,
}

/// Two traits that suppress each other when both are present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictPair {
    pub first: String,
    pub second: String,
    pub strength: f64,
    pub suppression: f64,
}

/// Fixed expression tiers, strongest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DominanceLevel {
    Dominant,
    Strong,
    Moderate,
    Weak,
}

impl DominanceLevel {
    pub fn default_score(&self) -> f64 {
        match self {
            Self::Dominant => 0.9,
            Self::Strong => 0.6,
            Self::Moderate => 0.3,
            Self::Weak => 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominanceTier {
    pub level: DominanceLevel,
    pub score: f64,
    pub traits: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Beneficial,
    Detrimental,
}

/// A named effect that fires when every required trait is present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergentRule {
    pub name: String,
    pub requires: Vec<String>,
    pub strength: f64,
    pub polarity: Polarity,
    #[serde(default)]
    pub description: String,
}

/// The complete, immutable rule set used by the interaction matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitCatalog {
    #[serde(default)]
    pub synergy_clusters: Vec<SynergyCluster>,
    #[serde(default)]
    pub conflict_pairs: Vec<ConflictPair>,
    #[serde(default)]
    pub dominance_tiers: Vec<DominanceTier>,
    #[serde(default)]
    pub emergent_rules: Vec<EmergentRule>,
    /// Tier for traits no table mentions
    #[serde(default = "default_level")]
    pub default_level: DominanceLevel,
}

fn default_level() -> DominanceLevel {
    DominanceLevel::Moderate
}

impl Default for TraitCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn names(traits: &[&str]) -> Vec<String> {
    traits.iter().map(|t| t.to_string()).collect()
}

fn cluster(name: &str, traits: &[&str], strength: f64, amplification: f64) -> SynergyCluster {
    SynergyCluster {
        name: name.to_string(),
        traits: names(traits),
        strength,
        amplification,
    }
}

fn conflict(first: &str, second: &str, strength: f64, suppression: f64) -> ConflictPair {
    ConflictPair {
        first: first.to_string(),
        second: second.to_string(),
        strength,
        suppression,
    }
}

fn tier(level: DominanceLevel, traits: &[&str]) -> DominanceTier {
    DominanceTier {
        level,
        score: level.default_score(),
        traits: names(traits),
    }
}

fn rule(
    name: &str,
    requires: &[&str],
    strength: f64,
    polarity: Polarity,
    description: &str,
) -> EmergentRule {
    EmergentRule {
        name: name.to_string(),
        requires: names(requires),
        strength,
        polarity,
        description: description.to_string(),
    }
}

impl TraitCatalog {
    /// The shipped rule tables
    pub fn builtin() -> Self {
        use DominanceLevel::*;
        use Polarity::*;

        Self {
            synergy_clusters: vec![
                cluster("confidence", &["brave", "confident", "bold", "fearless"], 0.8, 1.3),
                cluster("intellect", &["intelligent", "curious", "focused", "quick_learner"], 0.7, 1.25),
                cluster("composure", &["calm", "patient", "gentle", "steady"], 0.75, 1.2),
                cluster("athleticism", &["athletic", "energetic", "agile", "resilient"], 0.7, 1.2),
                cluster("sociability", &["social", "affectionate", "cooperative", "trusting"], 0.65, 1.15),
            ],
            conflict_pairs: vec![
                conflict("brave", "fearful", 0.9, 0.6),
                conflict("confident", "nervous", 0.8, 0.5),
                conflict("bold", "spooky", 0.8, 0.5),
                conflict("calm", "reactive", 0.8, 0.5),
                conflict("patient", "impatient", 0.75, 0.45),
                conflict("energetic", "lazy", 0.7, 0.4),
                conflict("focused", "distracted", 0.7, 0.4),
                conflict("social", "aloof", 0.7, 0.4),
                conflict("cooperative", "stubborn", 0.65, 0.4),
                conflict("trusting", "suspicious", 0.6, 0.35),
            ],
            dominance_tiers: vec![
                tier(Dominant, &["confident", "bold", "brave", "aggressive", "stubborn", "fearless"]),
                tier(Strong, &["intelligent", "athletic", "energetic", "social", "independent", "fearful"]),
                tier(Moderate, &["calm", "patient", "curious", "focused", "gentle", "cooperative", "nervous", "reactive"]),
                tier(Weak, &["lazy", "spooky", "distracted", "aloof", "trusting", "affectionate"]),
            ],
            emergent_rules: vec![
                rule(
                    "Natural Leadership",
                    &["confident", "intelligent", "social"],
                    0.8,
                    Beneficial,
                    "Takes the lead in a herd and steadies younger horses",
                ),
                rule(
                    "Bold Companion",
                    &["brave", "confident", "social"],
                    0.7,
                    Beneficial,
                    "Reassures nervous stablemates in new surroundings",
                ),
                rule(
                    "Quick Study",
                    &["intelligent", "curious", "focused"],
                    0.75,
                    Beneficial,
                    "Picks up new training exercises unusually fast",
                ),
                rule(
                    "Steady Mount",
                    &["calm", "patient", "gentle"],
                    0.7,
                    Beneficial,
                    "Reliable under inexperienced riders",
                ),
                rule(
                    "Born Athlete",
                    &["athletic", "energetic", "resilient"],
                    0.8,
                    Beneficial,
                    "Recovers quickly and peaks late in competition",
                ),
                rule(
                    "Volatile Temperament",
                    &["fearful", "nervous", "reactive"],
                    0.7,
                    Detrimental,
                    "Prone to bolting under pressure",
                ),
                rule(
                    "Shut Down",
                    &["stubborn", "lazy", "aloof"],
                    0.5,
                    Detrimental,
                    "Resists handling and training",
                ),
            ],
            default_level: default_level(),
        }
    }

    /// Parse and validate a catalog from TOML
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let catalog: Self = toml::from_str(source)
            .map_err(|e| Error::Validation(format!("Invalid trait catalog: {}", e)))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Internal(format!("Cannot encode trait catalog: {}", e)))
    }

    /// Check strengths and table shapes
    pub fn validate(&self) -> Result<()> {
        let unit = |what: &str, v: f64| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(Error::Validation(format!("{} must be within 0-1 (got {})", what, v)))
            }
        };

        for c in &self.synergy_clusters {
            if c.traits.len() < 2 {
                return Err(Error::Validation(format!(
                    "Synergy cluster '{}' needs at least two traits",
                    c.name
                )));
            }
            unit("Synergy strength", c.strength)?;
            if c.amplification < 1.0 {
                return Err(Error::Validation(format!(
                    "Amplification of '{}' must be at least 1",
                    c.name
                )));
            }
        }
        for p in &self.conflict_pairs {
            if p.first == p.second {
                return Err(Error::Validation(format!(
                    "Conflict pair '{}' names the same trait twice",
                    p.first
                )));
            }
            unit("Conflict strength", p.strength)?;
            unit("Suppression", p.suppression)?;
        }
        for t in &self.dominance_tiers {
            unit("Dominance score", t.score)?;
        }
        for r in &self.emergent_rules {
            if r.requires.is_empty() {
                return Err(Error::Validation(format!(
                    "Emergent rule '{}' requires no traits",
                    r.name
                )));
            }
            unit("Emergent strength", r.strength)?;
        }
        Ok(())
    }

    /// Tier and score of a trait; unlisted traits fall into `default_level`
    pub fn dominance_of(&self, name: &str) -> (DominanceLevel, f64) {
        self.dominance_tiers
            .iter()
            .find(|t| t.traits.iter().any(|n| n == name))
            .map(|t| (t.level, t.score))
            .unwrap_or_else(|| {
                let score = self
                    .dominance_tiers
                    .iter()
                    .find(|t| t.level == self.default_level)
                    .map(|t| t.score)
                    .unwrap_or_else(|| self.default_level.default_score());
                (self.default_level, score)
            })
    }
}
