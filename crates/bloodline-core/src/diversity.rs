//! Population-level genetic diversity statistics
//!
//! Everything here is a deterministic gameplay heuristic over trait tags and
//! stats, not population-genetics inference. All functions are pure over a
//! population snapshot and return zeroed values instead of failing on empty
//! or degenerate input.

use crate::animal::{Animal, AnimalId, Sex, Stat};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Share of carriers above which a trait is a bottleneck
pub const TRAIT_BOTTLENECK_SHARE: f64 = 0.75;
/// Share of carriers at or above which a trait bottleneck is severe
pub const TRAIT_BOTTLENECK_HIGH: f64 = 0.90;
/// Share of descendants above which a founder is a bottleneck
pub const FOUNDER_BOTTLENECK_SHARE: f64 = 0.50;
/// Share of descendants above which a founder bottleneck is severe
pub const FOUNDER_BOTTLENECK_HIGH: f64 = 0.75;

/// How often a trait occurs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitFrequency {
    /// Animals carrying the trait (any category)
    pub count: usize,
    /// count / population size
    pub carrier_share: f64,
    /// count / all trait occurrences; the p_i of the indices
    pub proportion: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiversityIndices {
    pub shannon: f64,
    pub simpson: f64,
    pub expected_heterozygosity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatSummary {
    pub samples: usize,
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Summary of pairwise genetic distance across the population
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceSummary {
    pub pair_count: usize,
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectivePopulation {
    pub actual_size: usize,
    pub males: usize,
    pub females: usize,
    /// 4·Nm·Nf / (Nm + Nf), rounded to the nearest animal
    pub effective_size: u32,
    /// effective_size / actual_size
    pub ratio: f64,
}

impl EffectivePopulation {
    pub fn from_counts(actual_size: usize, males: usize, females: usize) -> Self {
        let effective_size = if males > 0 && females > 0 {
            let (m, f) = (males as f64, females as f64);
            (4.0 * m * f / (m + f)).round() as u32
        } else {
            0
        };
        let ratio = if actual_size > 0 {
            effective_size as f64 / actual_size as f64
        } else {
            0.0
        };
        Self {
            actual_size,
            males,
            females,
            effective_size,
            ratio,
        }
    }
}

/// Genetic weight of a founder animal within the population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FounderInfluence {
    pub animal_id: AnimalId,
    pub offspring: usize,
    pub descendants: usize,
    /// descendants / animals with at least one parent in the set
    pub descendant_share: f64,
    pub founder_bonus: f64,
    pub diversity_bonus: f64,
    /// Blended influence in [0, 1]
    pub influence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BottleneckKind {
    Trait,
    Founder,
}

/// An over-represented trait or founder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    pub kind: BottleneckKind,
    /// Trait name or founder id
    pub subject: String,
    /// Carrier share (traits) or descendant share (founders), 0-1
    pub frequency: f64,
    pub severity: Severity,
    pub recommendation: String,
}

/// Diversity of a population snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiversityReport {
    pub population_size: usize,
    pub trait_frequencies: BTreeMap<String, TraitFrequency>,
    pub indices: DiversityIndices,
    pub stat_summary: BTreeMap<Stat, StatSummary>,
    pub genetic_distance: DistanceSummary,
    /// 0-100
    pub diversity_score: f64,
    pub effective_population: EffectivePopulation,
    pub founders: Vec<FounderInfluence>,
    pub bottlenecks: Vec<Bottleneck>,
    pub recommendations: Vec<String>,
}

impl DiversityReport {
    /// The defined report for an empty population
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Population diversity analysis
pub struct DiversityAnalyzer;

impl DiversityAnalyzer {
    /// Analyze a set of distinct animals
    pub fn analyze(animals: &[Animal]) -> DiversityReport {
        tracing::debug!("Analyzing diversity of {} animals", animals.len());

        if animals.is_empty() {
            return DiversityReport::empty();
        }

        let trait_frequencies = Self::trait_frequencies(animals);
        let indices = Self::indices(&trait_frequencies);
        let diversity_score = Self::diversity_score(&indices);
        let founders = Self::founders(animals, &trait_frequencies);
        let effective_population = Self::effective_population(animals);

        let mut bottlenecks = Self::trait_bottlenecks(&trait_frequencies);
        bottlenecks.extend(Self::founder_bottlenecks(&founders));

        let recommendations =
            Self::recommendations(diversity_score, &effective_population, &bottlenecks);

        DiversityReport {
            population_size: animals.len(),
            stat_summary: Self::stat_summary(animals),
            genetic_distance: Self::distance_summary(animals),
            trait_frequencies,
            indices,
            diversity_score,
            effective_population,
            founders,
            bottlenecks,
            recommendations,
        }
    }

    /// Carrier counts for every trait, all three categories pooled
    pub fn trait_frequencies(animals: &[Animal]) -> BTreeMap<String, TraitFrequency> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for animal in animals {
            for name in animal.traits.all() {
                *counts.entry(name.to_string()).or_default() += 1;
            }
        }

        let occurrences: usize = counts.values().sum();
        let population = animals.len();

        counts
            .into_iter()
            .map(|(name, count)| {
                let frequency = TraitFrequency {
                    count,
                    carrier_share: ratio(count, population),
                    proportion: ratio(count, occurrences),
                };
                (name, frequency)
            })
            .collect()
    }

    /// Shannon, Simpson and expected heterozygosity over trait proportions
    pub fn indices(frequencies: &BTreeMap<String, TraitFrequency>) -> DiversityIndices {
        if frequencies.is_empty() {
            return DiversityIndices::default();
        }

        let shannon: f64 = frequencies
            .values()
            .map(|f| f.proportion)
            .filter(|p| *p > 0.0)
            .map(|p| -p * p.log2())
            .sum();
        let sum_squares: f64 = frequencies.values().map(|f| f.proportion.powi(2)).sum();
        let simpson = (1.0 - sum_squares).max(0.0);

        DiversityIndices {
            shannon: shannon.max(0.0),
            simpson,
            expected_heterozygosity: simpson,
        }
    }

    /// 100 × [0.4·min(H/4, 1) + 0.3·Simpson + 0.3·He]
    pub fn diversity_score(indices: &DiversityIndices) -> f64 {
        let score = 100.0
            * (0.4 * (indices.shannon / 4.0).min(1.0)
                + 0.3 * indices.simpson
                + 0.3 * indices.expected_heterozygosity);
        score.clamp(0.0, 100.0)
    }

    /// Mean / variance / standard deviation per stat (population variance)
    pub fn stat_summary(animals: &[Animal]) -> BTreeMap<Stat, StatSummary> {
        let mut samples: BTreeMap<Stat, Vec<f64>> = BTreeMap::new();
        for animal in animals {
            for (stat, value) in &animal.stats {
                samples.entry(*stat).or_default().push(*value);
            }
        }

        samples
            .into_iter()
            .map(|(stat, values)| {
                let n = values.len() as f64;
                let mean = values.iter().sum::<f64>() / n;
                let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let summary = StatSummary {
                    samples: values.len(),
                    mean,
                    variance,
                    std_dev: variance.sqrt(),
                    min: values.iter().copied().fold(f64::INFINITY, f64::min),
                    max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                };
                (stat, summary)
            })
            .collect()
    }

    /// Distance between two animals in [0, 1]: mean of trait and stat distance
    pub fn genetic_distance(a: &Animal, b: &Animal) -> f64 {
        (trait_distance(a, b) + stat_distance(a, b)) / 2.0
    }

    pub fn distance_summary(animals: &[Animal]) -> DistanceSummary {
        let mut summary = DistanceSummary {
            min: f64::INFINITY,
            ..Default::default()
        };
        let mut total = 0.0;

        for (i, a) in animals.iter().enumerate() {
            for b in &animals[i + 1..] {
                let distance = Self::genetic_distance(a, b);
                summary.pair_count += 1;
                summary.min = summary.min.min(distance);
                summary.max = summary.max.max(distance);
                total += distance;
            }
        }

        if summary.pair_count == 0 {
            return DistanceSummary::default();
        }
        summary.average = total / summary.pair_count as f64;
        summary
    }

    pub fn effective_population(animals: &[Animal]) -> EffectivePopulation {
        let males = animals.iter().filter(|a| a.sex == Some(Sex::Male)).count();
        let females = animals.iter().filter(|a| a.sex == Some(Sex::Female)).count();
        EffectivePopulation::from_counts(animals.len(), males, females)
    }

    /// Founders are animals with no parent in the set, or with two or more
    /// offspring in the set.
    pub fn founders(
        animals: &[Animal],
        frequencies: &BTreeMap<String, TraitFrequency>,
    ) -> Vec<FounderInfluence> {
        let present: HashSet<&AnimalId> = animals.iter().map(|a| &a.id).collect();
        let by_id: HashMap<&AnimalId, &Animal> = animals.iter().map(|a| (&a.id, a)).collect();

        let mut offspring: HashMap<&AnimalId, usize> = HashMap::new();
        for animal in animals {
            for parent in animal.parents().filter(|p| present.contains(p)) {
                *offspring.entry(parent).or_default() += 1;
            }
        }

        // In-set ancestors of every animal
        let mut descendants: HashMap<&AnimalId, usize> = HashMap::new();
        let mut with_parents = 0;
        for animal in animals {
            let ancestors = in_set_ancestors(animal, &by_id);
            if !ancestors.is_empty() {
                with_parents += 1;
            }
            for ancestor in ancestors {
                *descendants.entry(ancestor).or_default() += 1;
            }
        }

        let mut founders: Vec<FounderInfluence> = animals
            .iter()
            .filter_map(|animal| {
                let rooted = !animal.parents().any(|p| present.contains(p));
                let children = offspring.get(&animal.id).copied().unwrap_or(0);
                if !rooted && children < 2 {
                    return None;
                }

                let descendant_count = descendants.get(&animal.id).copied().unwrap_or(0);
                let descendant_share = ratio(descendant_count, with_parents);
                let founder_bonus = if rooted { 0.2 } else { 0.1 };

                let traits = animal.traits.all();
                let rare = traits
                    .iter()
                    .filter(|t| {
                        frequencies
                            .get(**t)
                            .map(|f| f.carrier_share < 0.5)
                            .unwrap_or(false)
                    })
                    .count();
                let diversity_bonus = (0.2 * ratio(rare, traits.len())).min(0.2);

                Some(FounderInfluence {
                    animal_id: animal.id.clone(),
                    offspring: children,
                    descendants: descendant_count,
                    descendant_share,
                    founder_bonus,
                    diversity_bonus,
                    influence: (0.6 * descendant_share + founder_bonus + diversity_bonus)
                        .clamp(0.0, 1.0),
                })
            })
            .collect();

        founders.sort_by(|a, b| {
            b.influence
                .partial_cmp(&a.influence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.animal_id.cmp(&b.animal_id))
        });
        founders
    }

    fn trait_bottlenecks(frequencies: &BTreeMap<String, TraitFrequency>) -> Vec<Bottleneck> {
        frequencies
            .iter()
            .filter(|(_, f)| f.carrier_share > TRAIT_BOTTLENECK_SHARE)
            .map(|(name, f)| Bottleneck {
                kind: BottleneckKind::Trait,
                subject: name.clone(),
                frequency: f.carrier_share,
                severity: if f.carrier_share >= TRAIT_BOTTLENECK_HIGH {
                    Severity::High
                } else {
                    Severity::Medium
                },
                recommendation: format!(
                    "Trait '{}' is carried by {:.0}% of the population; breed with animals lacking it to diversify",
                    name,
                    f.carrier_share * 100.0
                ),
            })
            .collect()
    }

    fn founder_bottlenecks(founders: &[FounderInfluence]) -> Vec<Bottleneck> {
        founders
            .iter()
            .filter(|f| f.descendant_share > FOUNDER_BOTTLENECK_SHARE)
            .map(|f| Bottleneck {
                kind: BottleneckKind::Founder,
                subject: f.animal_id.to_string(),
                frequency: f.descendant_share,
                severity: if f.descendant_share > FOUNDER_BOTTLENECK_HIGH {
                    Severity::High
                } else {
                    Severity::Medium
                },
                recommendation: format!(
                    "Founder {} appears in {:.0}% of pedigrees; introduce outside bloodlines",
                    f.animal_id,
                    f.descendant_share * 100.0
                ),
            })
            .collect()
    }

    fn recommendations(
        score: f64,
        effective: &EffectivePopulation,
        bottlenecks: &[Bottleneck],
    ) -> Vec<String> {
        let mut advice = Vec::new();
        if score < 40.0 {
            advice.push("Genetic diversity is low; introduce horses from new bloodlines".to_string());
        } else if score < 70.0 {
            advice.push("Diversity is moderate; favour outcrosses in upcoming pairings".to_string());
        }
        if effective.actual_size > 1 && effective.ratio < 0.5 {
            advice.push(
                "Effective population is small relative to herd size; balance the breeding sex ratio"
                    .to_string(),
            );
        }
        if bottlenecks.iter().any(|b| b.severity == Severity::High) {
            advice.push("Severe bottlenecks detected; prioritise diversification".to_string());
        }
        if advice.is_empty() {
            advice.push("Population diversity is healthy".to_string());
        }
        advice
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Normalized Hamming distance over the union of both trait sets
fn trait_distance(a: &Animal, b: &Animal) -> f64 {
    let left = a.traits.all();
    let right = b.traits.all();
    let union = left.union(&right).count();
    let differing = left.symmetric_difference(&right).count();
    ratio(differing, union)
}

/// Mean absolute stat difference over shared stats, normalized to [0, 1]
fn stat_distance(a: &Animal, b: &Animal) -> f64 {
    let diffs: Vec<f64> = a
        .stats
        .iter()
        .filter_map(|(stat, value)| b.stats.get(stat).map(|other| (value - other).abs() / 100.0))
        .collect();
    if diffs.is_empty() {
        return 0.0;
    }
    (diffs.iter().sum::<f64>() / diffs.len() as f64).clamp(0.0, 1.0)
}

fn in_set_ancestors<'a>(
    animal: &'a Animal,
    by_id: &HashMap<&'a AnimalId, &'a Animal>,
) -> BTreeSet<&'a AnimalId> {
    let mut seen = BTreeSet::new();
    let mut stack: Vec<&AnimalId> = animal.parents().collect();
    while let Some(id) = stack.pop() {
        let Some(&parent) = by_id.get(id) else {
            continue;
        };
        if parent.id == animal.id || !seen.insert(&parent.id) {
            continue;
        }
        stack.extend(parent.parents());
    }
    seen
}
