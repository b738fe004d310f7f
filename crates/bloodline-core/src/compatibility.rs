//! Weighted breeding compatibility score

use crate::animal::{Animal, AnimalId, Stats, TraitSet};
use crate::diversity::{DiversityAnalyzer, DiversityReport};
use crate::inbreeding::{InbreedingResult, RiskLevel, CRITICAL_THRESHOLD};
use crate::interaction::TraitInteractionGraph;
use serde::{Deserialize, Serialize};

pub const TRAIT_WEIGHT: f64 = 0.35;
pub const DIVERSITY_WEIGHT: f64 = 0.25;
pub const STAT_WEIGHT: f64 = 0.25;
pub const TEMPERAMENT_WEIGHT: f64 = 0.15;

/// Coefficient multiplier for the inbreeding penalty
pub const PENALTY_MULTIPLIER: f64 = 4.0;
/// The penalty never removes more than 80% of the score
pub const MAX_PENALTY: f64 = 0.8;

/// Score used when the two animals share no stats
const NEUTRAL_STAT_SCORE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationTier {
    Avoid,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl RecommendationTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::Excellent
        } else if score >= 75.0 {
            Self::Good
        } else if score >= 60.0 {
            Self::Fair
        } else if score >= 40.0 {
            Self::Poor
        } else {
            Self::Avoid
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
            Self::Avoid => "avoid",
        }
    }
}

impl std::fmt::Display for RecommendationTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-factor scores, each 0-100
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityFactors {
    /// Jaccard overlap of the two trait sets, 0-1
    pub trait_overlap: f64,
    pub trait_compatibility: f64,
    pub diversity_impact: f64,
    pub stat_complementarity: f64,
    pub temperament: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityResult {
    pub first: AnimalId,
    pub second: AnimalId,
    /// Final score after the inbreeding penalty, 0-100
    pub score: f64,
    /// Weighted factor sum before the penalty
    pub raw_score: f64,
    pub factors: CompatibilityFactors,
    pub inbreeding_coefficient: f64,
    pub inbreeding_risk: RiskLevel,
    /// Fraction of the raw score removed, 0-0.8
    pub inbreeding_penalty: f64,
    pub tier: RecommendationTier,
    pub notes: Vec<String>,
}

/// Everything the scorer needs about one candidate pair
pub struct PairAnalysis<'a> {
    pub first: &'a Animal,
    pub second: &'a Animal,
    pub inbreeding: &'a InbreedingResult,
    pub first_traits: &'a TraitInteractionGraph,
    pub second_traits: &'a TraitInteractionGraph,
    /// Ambient population; without it diversity impact is genetic distance alone
    pub population: Option<&'a DiversityReport>,
}

/// Combines inbreeding, diversity and trait analyses into one score
pub struct CompatibilityScorer;

impl CompatibilityScorer {
    pub fn score(pair: &PairAnalysis<'_>) -> CompatibilityResult {
        let trait_overlap = Self::trait_overlap(&pair.first.traits, &pair.second.traits);
        let factors = CompatibilityFactors {
            trait_overlap,
            trait_compatibility: Self::trait_score(trait_overlap),
            diversity_impact: Self::diversity_impact(pair.first, pair.second, pair.population),
            stat_complementarity: Self::stat_score(&pair.first.stats, &pair.second.stats),
            temperament: 100.0
                * (pair.first_traits.harmony + pair.second_traits.harmony)
                / 2.0,
        };

        let raw_score = (TRAIT_WEIGHT * factors.trait_compatibility
            + DIVERSITY_WEIGHT * factors.diversity_impact
            + STAT_WEIGHT * factors.stat_complementarity
            + TEMPERAMENT_WEIGHT * factors.temperament)
            .clamp(0.0, 100.0);

        let coefficient = pair.inbreeding.coefficient;
        let inbreeding_penalty = Self::inbreeding_penalty(coefficient);
        let score = (raw_score * (1.0 - inbreeding_penalty)).clamp(0.0, 100.0);

        let tier = if coefficient > CRITICAL_THRESHOLD {
            RecommendationTier::Avoid
        } else {
            RecommendationTier::from_score(score)
        };

        tracing::debug!(
            "Compatibility {} x {}: raw={:.1}, penalty={:.2}, score={:.1} ({})",
            pair.first.id,
            pair.second.id,
            raw_score,
            inbreeding_penalty,
            score,
            tier
        );

        CompatibilityResult {
            first: pair.first.id.clone(),
            second: pair.second.id.clone(),
            score,
            raw_score,
            notes: notes(&factors, pair.inbreeding, inbreeding_penalty, tier),
            factors,
            inbreeding_coefficient: coefficient,
            inbreeding_risk: pair.inbreeding.risk,
            inbreeding_penalty,
            tier,
        }
    }

    /// |A ∩ B| / |A ∪ B| over all categories; two empty sets overlap 0
    pub fn trait_overlap(a: &TraitSet, b: &TraitSet) -> f64 {
        let (a, b) = (a.all(), b.all());
        let union = a.union(&b).count();
        if union == 0 {
            return 0.0;
        }
        a.intersection(&b).count() as f64 / union as f64
    }

    /// Complementary beats identical or disjoint
    pub fn trait_score(overlap: f64) -> f64 {
        if overlap < 0.2 {
            40.0
        } else if overlap < 0.4 {
            70.0
        } else if overlap <= 0.7 {
            85.0
        } else if overlap < 0.9 {
            65.0
        } else {
            50.0
        }
    }

    /// Mean per-stat band score over the stats both animals have
    pub fn stat_score(a: &Stats, b: &Stats) -> f64 {
        let scores: Vec<f64> = a
            .iter()
            .filter_map(|(stat, x)| b.get(stat).map(|y| stat_band((x - y).abs())))
            .collect();
        if scores.is_empty() {
            return NEUTRAL_STAT_SCORE;
        }
        scores.iter().sum::<f64>() / scores.len() as f64
    }

    /// 100 × genetic distance, blended with trait rarity when a population
    /// report is available
    pub fn diversity_impact(a: &Animal, b: &Animal, population: Option<&DiversityReport>) -> f64 {
        let distance = DiversityAnalyzer::genetic_distance(a, b);
        let Some(report) = population.filter(|r| r.population_size > 0) else {
            return (100.0 * distance).clamp(0.0, 100.0);
        };

        let (ta, tb) = (a.traits.all(), b.traits.all());
        let traits: Vec<&str> = ta.union(&tb).copied().collect();
        let rarity = if traits.is_empty() {
            0.0
        } else {
            traits
                .iter()
                .map(|t| {
                    report
                        .trait_frequencies
                        .get(*t)
                        .map(|f| 1.0 - f.carrier_share)
                        .unwrap_or(1.0)
                })
                .sum::<f64>()
                / traits.len() as f64
        };

        (100.0 * (0.6 * distance + 0.4 * rarity)).clamp(0.0, 100.0)
    }

    pub fn inbreeding_penalty(coefficient: f64) -> f64 {
        (coefficient * PENALTY_MULTIPLIER).clamp(0.0, MAX_PENALTY)
    }
}

fn stat_band(difference: f64) -> f64 {
    if difference < 10.0 {
        60.0
    } else if difference <= 25.0 {
        90.0
    } else if difference <= 40.0 {
        70.0
    } else {
        45.0
    }
}

fn notes(
    factors: &CompatibilityFactors,
    inbreeding: &InbreedingResult,
    penalty: f64,
    tier: RecommendationTier,
) -> Vec<String> {
    let mut notes = Vec::new();

    if inbreeding.coefficient > CRITICAL_THRESHOLD {
        notes.push(format!(
            "Inbreeding coefficient {:.3} exceeds {}; pairing is not advised",
            inbreeding.coefficient, CRITICAL_THRESHOLD
        ));
    } else if penalty > 0.0 {
        notes.push(format!(
            "Shared ancestry reduces the score by {:.0}%",
            penalty * 100.0
        ));
    }

    if factors.trait_overlap < 0.2 {
        notes.push("Trait sets barely overlap; offspring temperament is hard to predict".to_string());
    } else if factors.trait_overlap >= 0.9 {
        notes.push("Trait sets are nearly identical; little new variation".to_string());
    }
    if factors.stat_complementarity >= 80.0 {
        notes.push("Stats complement each other well".to_string());
    }
    if factors.temperament < 40.0 {
        notes.push("Both temperaments carry unresolved trait conflicts".to_string());
    }
    if tier >= RecommendationTier::Good {
        notes.push(format!("Recommended pairing ({})", tier));
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animal::Stat;
    use crate::inbreeding::InbreedingCalculator;
    use crate::interaction::TraitInteractionMatrix;
    use crate::lineage::Lineage;

    fn traits(names: &[&str]) -> TraitSet {
        names.iter().fold(TraitSet::new(), |set, t| set.with_positive(*t))
    }

    fn unrelated(a: &str, b: &str) -> InbreedingResult {
        InbreedingCalculator::from_lineages(
            &Lineage::new(AnimalId::new(a), 4),
            &Lineage::new(AnimalId::new(b), 4),
        )
    }

    fn with_coefficient(a: &str, b: &str, coefficient: f64) -> InbreedingResult {
        InbreedingResult {
            coefficient,
            risk: RiskLevel::from_coefficient(coefficient),
            ..unrelated(a, b)
        }
    }

    fn score(first: &Animal, second: &Animal, inbreeding: &InbreedingResult) -> CompatibilityResult {
        let matrix = TraitInteractionMatrix::default();
        let g1 = matrix.analyze(&first.traits, None).unwrap();
        let g2 = matrix.analyze(&second.traits, None).unwrap();
        CompatibilityScorer::score(&PairAnalysis {
            first,
            second,
            inbreeding,
            first_traits: &g1,
            second_traits: &g2,
            population: None,
        })
    }

    #[test]
    fn test_trait_score_peaks_at_moderate_overlap() {
        let base = traits(&["brave", "calm", "social", "curious"]);
        let disjoint = traits(&["lazy", "aloof", "spooky", "stubborn"]);
        let half = traits(&["brave", "calm", "lazy", "aloof"]);

        let none = CompatibilityScorer::trait_overlap(&base, &disjoint);
        let some = CompatibilityScorer::trait_overlap(&base, &half);
        let full = CompatibilityScorer::trait_overlap(&base, &base);
        assert_eq!(none, 0.0);
        assert!((some - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(full, 1.0);

        let (low, mid, high) = (
            CompatibilityScorer::trait_score(none),
            CompatibilityScorer::trait_score(0.5),
            CompatibilityScorer::trait_score(full),
        );
        assert!(low < mid && mid > high);
        assert_eq!(mid, 85.0);
        assert_eq!(CompatibilityScorer::trait_score(some), 70.0);
    }

    #[test]
    fn test_stat_bands() {
        let mut a = Stats::new();
        let mut b = Stats::new();
        assert_eq!(CompatibilityScorer::stat_score(&a, &b), NEUTRAL_STAT_SCORE);

        a.insert(Stat::Speed, 50.0);
        b.insert(Stat::Speed, 65.0);
        assert_eq!(CompatibilityScorer::stat_score(&a, &b), 90.0);

        a.insert(Stat::Stamina, 50.0);
        b.insert(Stat::Stamina, 52.0);
        assert_eq!(CompatibilityScorer::stat_score(&a, &b), 75.0);

        // Unshared stats are ignored
        a.insert(Stat::Focus, 10.0);
        assert_eq!(CompatibilityScorer::stat_score(&a, &b), 75.0);

        assert_eq!(stat_band(40.0), 70.0);
        assert_eq!(stat_band(41.0), 45.0);
    }

    #[test]
    fn test_penalty_is_capped() {
        assert_eq!(CompatibilityScorer::inbreeding_penalty(0.0), 0.0);
        assert_eq!(CompatibilityScorer::inbreeding_penalty(0.1), 0.4);
        assert_eq!(CompatibilityScorer::inbreeding_penalty(0.5), MAX_PENALTY);
    }

    #[test]
    fn test_tiers() {
        assert_eq!(RecommendationTier::from_score(95.0), RecommendationTier::Excellent);
        assert_eq!(RecommendationTier::from_score(75.0), RecommendationTier::Good);
        assert_eq!(RecommendationTier::from_score(60.0), RecommendationTier::Fair);
        assert_eq!(RecommendationTier::from_score(40.0), RecommendationTier::Poor);
        assert_eq!(RecommendationTier::from_score(39.9), RecommendationTier::Avoid);
    }

    #[test]
    fn test_unrelated_pair_scores_without_penalty() {
        let a = Animal::new("a", "A")
            .with_traits(traits(&["brave", "confident", "calm"]))
            .with_stat(Stat::Speed, 60.0);
        let b = Animal::new("b", "B")
            .with_traits(traits(&["brave", "patient", "curious"]))
            .with_stat(Stat::Speed, 80.0);

        let result = score(&a, &b, &unrelated("a", "b"));
        assert_eq!(result.inbreeding_penalty, 0.0);
        assert_eq!(result.score, result.raw_score);
        assert!(result.score > 0.0 && result.score <= 100.0);
        assert_eq!(result.factors.stat_complementarity, 90.0);
        assert_eq!(result.tier, RecommendationTier::from_score(result.score));
    }

    #[test]
    fn test_critical_inbreeding_forces_avoid() {
        let a = Animal::new("a", "A").with_traits(traits(&["calm", "patient"]));
        let b = Animal::new("b", "B").with_traits(traits(&["calm", "gentle"]));

        let result = score(&a, &b, &with_coefficient("a", "b", 0.3));
        assert_eq!(result.tier, RecommendationTier::Avoid);
        assert_eq!(result.inbreeding_penalty, MAX_PENALTY);
        assert!((result.score - result.raw_score * 0.2).abs() < 1e-9);
        assert!(result.notes[0].contains("not advised"));
    }

    #[test]
    fn test_population_rarity_raises_diversity_impact() {
        let a = Animal::new("a", "A").with_traits(traits(&["swimmer"]));
        let b = Animal::new("b", "B").with_traits(traits(&["jumper"]));
        let common: Vec<Animal> = (0..4)
            .map(|i| Animal::new(format!("h{}", i), "Herd").with_traits(traits(&["calm"])))
            .collect();
        let report = DiversityAnalyzer::analyze(&common);

        let alone = CompatibilityScorer::diversity_impact(&a, &b, None);
        let in_herd = CompatibilityScorer::diversity_impact(&a, &b, Some(&report));
        // distance 0.5 alone; both traits are absent from the herd
        assert!((alone - 50.0).abs() < 1e-9);
        assert!((in_herd - 70.0).abs() < 1e-9);
    }
}
