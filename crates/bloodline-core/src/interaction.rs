//! Trait interaction modeling: synergy, conflict, dominance, emergent
//! properties and temperament stability

use crate::animal::{AnimalId, BehaviorState, TraitCategory, TraitSet};
use crate::catalog::{DominanceLevel, Polarity, TraitCatalog};
use crate::error::Result;
use crate::limits;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Bounds of the environmental dominance modifier
pub const MODIFIER_MIN: f64 = 0.5;
pub const MODIFIER_MAX: f64 = 1.5;

/// Change in stability between first and last snapshot that counts as a trend
const TREND_EPSILON: f64 = 0.01;

/// A trait present on the animal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitNode {
    pub name: String,
    pub category: TraitCategory,
    pub level: DominanceLevel,
    pub base_score: f64,
    /// Environmental modifier, within [0.5, 1.5]
    pub modifier: f64,
    /// base_score × modifier
    pub dominance_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyEdge {
    pub cluster: String,
    pub first: String,
    pub second: String,
    pub strength: f64,
    pub amplification: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictEdge {
    pub first: String,
    pub second: String,
    pub strength: f64,
    pub suppression: f64,
}

/// Traits ordered by how strongly they express
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DominanceRanking {
    pub primary: Option<String>,
    /// Up to two runners-up
    pub secondary: Vec<String>,
    pub recessive: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergentProperty {
    pub name: String,
    pub traits: Vec<String>,
    pub strength: f64,
    pub polarity: Polarity,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StabilityAssessment {
    /// Overall temperament stability in [0, 1]
    pub overall: f64,
    pub synergy_bonus: f64,
    pub conflict_penalty: f64,
    pub stress_penalty: f64,
    pub risk_factors: Vec<String>,
    pub protective_factors: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Interaction analysis of one animal's traits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitInteractionGraph {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animal_id: Option<AnimalId>,
    pub nodes: Vec<TraitNode>,
    pub synergies: Vec<SynergyEdge>,
    pub conflicts: Vec<ConflictEdge>,
    pub dominance: DominanceRanking,
    /// (normalized synergy − normalized conflict + 1) / 2, in [0, 1]
    pub harmony: f64,
    pub emergent_properties: Vec<EmergentProperty>,
    pub stability: StabilityAssessment,
}

impl TraitInteractionGraph {
    pub fn has_synergy(&self, a: &str, b: &str) -> bool {
        self.synergies
            .iter()
            .any(|e| (e.first == a && e.second == b) || (e.first == b && e.second == a))
    }

    pub fn has_conflict(&self, a: &str, b: &str) -> bool {
        self.conflicts
            .iter()
            .any(|e| (e.first == a && e.second == b) || (e.first == b && e.second == a))
    }

    pub fn emergent(&self, name: &str) -> Option<&EmergentProperty> {
        self.emergent_properties.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StabilityTrend {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalSnapshot {
    pub week: u32,
    pub age_days: u32,
    /// age / 365, capped at 1
    pub maturity: f64,
    pub synergy_strength: f64,
    pub conflict_strength: f64,
    pub stability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalProjection {
    pub window_days: u32,
    pub start_age_days: u32,
    pub snapshots: Vec<TemporalSnapshot>,
    pub trend: StabilityTrend,
}

/// Evaluates trait sets against a [`TraitCatalog`]
#[derive(Debug, Clone)]
pub struct TraitInteractionMatrix {
    catalog: Arc<TraitCatalog>,
}

impl Default for TraitInteractionMatrix {
    fn default() -> Self {
        Self::new(Arc::new(TraitCatalog::builtin()))
    }
}

impl TraitInteractionMatrix {
    pub fn new(catalog: Arc<TraitCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &TraitCatalog {
        &self.catalog
    }

    /// Build the interaction graph for a trait set
    pub fn analyze(
        &self,
        traits: &TraitSet,
        environment: Option<&BehaviorState>,
    ) -> Result<TraitInteractionGraph> {
        limits::validate_traits(traits)?;
        if let Some(env) = environment {
            limits::validate_environment(env)?;
        }
        tracing::debug!(
            "Analyzing trait interactions: {} traits, environment={}",
            traits.len(),
            environment.is_some()
        );

        let present = traits.all();
        let nodes = self.nodes(traits, environment);
        let synergies = self.synergies(&present);
        let conflicts = self.conflicts(&present);
        let harmony = harmony(
            normalized(synergies.iter().map(|e| e.strength), present.len()),
            normalized(conflicts.iter().map(|e| e.strength), present.len()),
        );
        let emergent_properties = self.emergent(&present);
        let stability = assess_stability(&synergies, &conflicts, &emergent_properties, environment);

        Ok(TraitInteractionGraph {
            animal_id: None,
            dominance: rank(&nodes),
            nodes,
            synergies,
            conflicts,
            harmony,
            emergent_properties,
            stability,
        })
    }

    /// Simulate weekly snapshots as the animal matures over `window_days`
    pub fn project(
        &self,
        traits: &TraitSet,
        age_days: u32,
        window_days: u32,
    ) -> Result<TemporalProjection> {
        limits::validate_traits(traits)?;
        limits::validate_projection_window(window_days)?;

        let present = traits.all();
        let synergy = normalized(
            self.synergies(&present).iter().map(|e| e.strength),
            present.len(),
        );
        let conflict = normalized(
            self.conflicts(&present).iter().map(|e| e.strength),
            present.len(),
        );

        let snapshots: Vec<TemporalSnapshot> = (0..=window_days / 7)
            .map(|week| {
                let age = age_days.saturating_add(week * 7);
                let maturity = (age as f64 / 365.0).min(1.0);
                let synergy_strength = synergy * (0.5 + 0.5 * maturity);
                let conflict_strength = conflict * (1.0 - 0.5 * maturity);
                TemporalSnapshot {
                    week,
                    age_days: age,
                    maturity,
                    synergy_strength,
                    conflict_strength,
                    stability: harmony(synergy_strength, conflict_strength),
                }
            })
            .collect();

        let trend = match (snapshots.first(), snapshots.last()) {
            (Some(first), Some(last)) if last.stability - first.stability > TREND_EPSILON => {
                StabilityTrend::Improving
            }
            (Some(first), Some(last)) if first.stability - last.stability > TREND_EPSILON => {
                StabilityTrend::Declining
            }
            _ => StabilityTrend::Stable,
        };

        Ok(TemporalProjection {
            window_days,
            start_age_days: age_days,
            snapshots,
            trend,
        })
    }

    fn nodes(&self, traits: &TraitSet, environment: Option<&BehaviorState>) -> Vec<TraitNode> {
        traits
            .iter()
            .map(|(name, category)| {
                let (level, base_score) = self.catalog.dominance_of(name);
                let modifier = environment_modifier(category, environment);
                TraitNode {
                    name: name.to_string(),
                    category,
                    level,
                    base_score,
                    modifier,
                    dominance_score: base_score * modifier,
                }
            })
            .collect()
    }

    fn synergies(&self, present: &BTreeSet<&str>) -> Vec<SynergyEdge> {
        let mut edges = Vec::new();
        for cluster in &self.catalog.synergy_clusters {
            let members: Vec<&String> = cluster
                .traits
                .iter()
                .filter(|t| present.contains(t.as_str()))
                .collect();
            for (i, first) in members.iter().enumerate() {
                for second in &members[i + 1..] {
                    edges.push(SynergyEdge {
                        cluster: cluster.name.clone(),
                        first: (*first).clone(),
                        second: (*second).clone(),
                        strength: cluster.strength,
                        amplification: cluster.amplification,
                    });
                }
            }
        }
        edges
    }

    fn conflicts(&self, present: &BTreeSet<&str>) -> Vec<ConflictEdge> {
        self.catalog
            .conflict_pairs
            .iter()
            .filter(|p| present.contains(p.first.as_str()) && present.contains(p.second.as_str()))
            .map(|p| ConflictEdge {
                first: p.first.clone(),
                second: p.second.clone(),
                strength: p.strength,
                suppression: p.suppression,
            })
            .collect()
    }

    /// Rules fire only when every required trait is present
    fn emergent(&self, present: &BTreeSet<&str>) -> Vec<EmergentProperty> {
        self.catalog
            .emergent_rules
            .iter()
            .filter(|r| r.requires.iter().all(|t| present.contains(t.as_str())))
            .map(|r| EmergentProperty {
                name: r.name.clone(),
                traits: r.requires.clone(),
                strength: r.strength,
                polarity: r.polarity,
                description: r.description.clone(),
            })
            .collect()
    }
}

/// Stress suppresses positive traits and feeds negative ones; a strong bond
/// does the opposite. Hidden traits surface slightly under stress.
fn environment_modifier(category: TraitCategory, environment: Option<&BehaviorState>) -> f64 {
    let Some(env) = environment else {
        return 1.0;
    };
    let stress = env.stress_level / 100.0;
    let bond = env.bond_score / 100.0;

    let modifier = match category {
        TraitCategory::Positive => 1.0 - 0.4 * stress + 0.3 * bond,
        TraitCategory::Negative => 1.0 + 0.5 * stress - 0.3 * bond,
        TraitCategory::Hidden => 1.0 + 0.2 * stress,
    };
    modifier.clamp(MODIFIER_MIN, MODIFIER_MAX)
}

fn rank(nodes: &[TraitNode]) -> DominanceRanking {
    let mut ordered: Vec<&TraitNode> = nodes.iter().collect();
    ordered.sort_by(|a, b| {
        b.dominance_score
            .partial_cmp(&a.dominance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut names = ordered.into_iter().map(|n| n.name.clone());
    DominanceRanking {
        primary: names.next(),
        secondary: names.by_ref().take(2).collect(),
        recessive: names.collect(),
    }
}

/// Total edge strength relative to the number of possible trait pairs
fn normalized(strengths: impl Iterator<Item = f64>, trait_count: usize) -> f64 {
    let pairs = (trait_count * trait_count.saturating_sub(1) / 2).max(1);
    (strengths.sum::<f64>() / pairs as f64).clamp(0.0, 1.0)
}

fn harmony(synergy: f64, conflict: f64) -> f64 {
    ((synergy - conflict + 1.0) / 2.0).clamp(0.0, 1.0)
}

fn assess_stability(
    synergies: &[SynergyEdge],
    conflicts: &[ConflictEdge],
    emergent: &[EmergentProperty],
    environment: Option<&BehaviorState>,
) -> StabilityAssessment {
    let synergy_bonus = (0.1 * synergies.len() as f64).min(0.3);
    let conflict_penalty = (0.1 * conflicts.len() as f64).min(0.4);
    let stress = environment.map(|e| e.stress_level).unwrap_or(0.0);
    let bond = environment.map(|e| e.bond_score);
    let stress_penalty = 0.3 * stress / 100.0;
    let overall = (0.5 + synergy_bonus - conflict_penalty - stress_penalty).clamp(0.0, 1.0);

    let mut risk_factors: Vec<String> = conflicts
        .iter()
        .map(|c| format!("Conflict between {} and {}", c.first, c.second))
        .collect();
    if stress > 60.0 {
        risk_factors.push(format!("High stress level ({:.0})", stress));
    }
    risk_factors.extend(
        emergent
            .iter()
            .filter(|p| p.polarity == Polarity::Detrimental)
            .map(|p| p.name.clone()),
    );

    let clusters: BTreeSet<&str> = synergies.iter().map(|s| s.cluster.as_str()).collect();
    let mut protective_factors: Vec<String> = clusters
        .into_iter()
        .map(|c| format!("{} cluster synergy", c))
        .collect();
    if bond.is_some_and(|b| b >= 70.0) {
        protective_factors.push("Strong handler bond".to_string());
    }
    protective_factors.extend(
        emergent
            .iter()
            .filter(|p| p.polarity == Polarity::Beneficial)
            .map(|p| p.name.clone()),
    );

    let mut recommendations = Vec::new();
    if !conflicts.is_empty() {
        recommendations
            .push("Use consistent, low-pressure training to ease conflicting traits".to_string());
    }
    if stress > 60.0 {
        recommendations.push("Reduce stress with regular turnout and a fixed routine".to_string());
    }
    if bond.is_some_and(|b| b < 30.0) {
        recommendations.push("Schedule extra grooming sessions to build trust".to_string());
    }
    if overall < 0.4 {
        recommendations.push("Temperament is unstable; monitor closely before competition".to_string());
    }
    if recommendations.is_empty() {
        recommendations.push("Temperament is stable; maintain the current routine".to_string());
    }

    StabilityAssessment {
        overall,
        synergy_bonus,
        conflict_penalty,
        stress_penalty,
        risk_factors,
        protective_factors,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn traits(positive: &[&str]) -> TraitSet {
        positive
            .iter()
            .fold(TraitSet::new(), |set, t| set.with_positive(*t))
    }

    fn matrix() -> TraitInteractionMatrix {
        TraitInteractionMatrix::default()
    }

    #[test]
    fn test_confidence_cluster_scenario() {
        let graph = matrix()
            .analyze(&traits(&["brave", "confident", "social"]), None)
            .unwrap();

        assert!(graph.has_synergy("brave", "confident"));
        assert!(graph
            .synergies
            .iter()
            .all(|e| e.cluster == "confidence"));
        assert!(!graph.emergent_properties.is_empty());
        assert!(graph.emergent("Bold Companion").is_some());
        // Natural Leadership needs "intelligent" as well
        assert!(graph.emergent("Natural Leadership").is_none());
    }

    #[test]
    fn test_emergent_requires_every_trait() {
        let graph = matrix()
            .analyze(&traits(&["confident", "intelligent", "social", "calm"]), None)
            .unwrap();
        let leadership = graph.emergent("Natural Leadership").unwrap();
        assert_eq!(leadership.strength, 0.8);
        assert_eq!(leadership.polarity, Polarity::Beneficial);
    }

    #[test]
    fn test_conflicts_lower_harmony() {
        let set = TraitSet::new()
            .with_positive("brave")
            .with_negative("fearful")
            .with_positive("calm")
            .with_negative("reactive");
        let graph = matrix().analyze(&set, None).unwrap();

        assert!(graph.has_conflict("brave", "fearful"));
        assert!(graph.has_conflict("calm", "reactive"));
        assert!(graph.synergies.is_empty());
        assert!(graph.harmony < 0.5);
        assert_eq!(graph.stability.risk_factors.len(), 2);
    }

    #[test]
    fn test_harmony_values() {
        let m = matrix();
        let empty = m.analyze(&TraitSet::new(), None).unwrap();
        assert_eq!(empty.harmony, 0.5);
        assert!(empty.dominance.primary.is_none());

        // Three confidence traits: 3 edges of 0.8 over 3 pairs
        let united = m.analyze(&traits(&["brave", "bold", "confident"]), None).unwrap();
        assert!((united.harmony - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_dominance_ranking() {
        let set = traits(&["lazy", "brave", "intelligent", "calm", "curious"]);
        let graph = matrix().analyze(&set, None).unwrap();

        assert_eq!(graph.dominance.primary.as_deref(), Some("brave"));
        assert_eq!(graph.dominance.secondary, vec!["intelligent", "calm"]);
        assert_eq!(graph.dominance.recessive, vec!["curious", "lazy"]);
    }

    #[test]
    fn test_environment_modifier_is_bounded() {
        let set = TraitSet::new().with_positive("brave").with_negative("fearful");
        let stressed = BehaviorState::new(100.0, 0.0);
        let graph = matrix().analyze(&set, Some(&stressed)).unwrap();

        for node in &graph.nodes {
            assert!(node.modifier >= MODIFIER_MIN && node.modifier <= MODIFIER_MAX);
        }
        let brave = graph.nodes.iter().find(|n| n.name == "brave").unwrap();
        let fearful = graph.nodes.iter().find(|n| n.name == "fearful").unwrap();
        assert!((brave.modifier - 0.6).abs() < 1e-12);
        assert_eq!(fearful.modifier, 1.5);
        assert!(graph.stability.stress_penalty > 0.29);
        assert!(graph
            .stability
            .risk_factors
            .iter()
            .any(|r| r.starts_with("High stress")));
    }

    #[test]
    fn test_stability_assessment() {
        let calm = BehaviorState::new(0.0, 90.0);
        let graph = matrix()
            .analyze(&traits(&["calm", "patient", "gentle"]), Some(&calm))
            .unwrap();

        // 3 synergies -> +0.3, no conflicts, no stress
        assert!((graph.stability.overall - 0.8).abs() < 1e-12);
        assert!(graph
            .stability
            .protective_factors
            .contains(&"Strong handler bond".to_string()));
        assert!(graph
            .stability
            .protective_factors
            .contains(&"Steady Mount".to_string()));
    }

    #[test]
    fn test_rejects_malformed_input() {
        let overlapping = TraitSet::new().with_positive("calm").with_negative("calm");
        assert!(matches!(
            matrix().analyze(&overlapping, None),
            Err(Error::Validation(_))
        ));

        let bad_env = BehaviorState::new(150.0, 10.0);
        assert!(matrix().analyze(&TraitSet::new(), Some(&bad_env)).is_err());
    }

    #[test]
    fn test_temporal_projection_improves_with_maturity() {
        let set = TraitSet::new()
            .with_positive("brave")
            .with_positive("confident")
            .with_negative("nervous");
        let projection = matrix().project(&set, 60, 84).unwrap();

        assert_eq!(projection.snapshots.len(), 13);
        assert_eq!(projection.trend, StabilityTrend::Improving);

        let first = &projection.snapshots[0];
        let last = projection.snapshots.last().unwrap();
        assert!(last.synergy_strength > first.synergy_strength);
        assert!(last.conflict_strength < first.conflict_strength);
        assert!(last.maturity <= 1.0);
    }

    #[test]
    fn test_temporal_projection_mature_is_stable() {
        let set = traits(&["brave", "confident"]);
        let projection = matrix().project(&set, 2000, 56).unwrap();
        assert_eq!(projection.trend, StabilityTrend::Stable);
        assert!(projection.snapshots.iter().all(|s| s.maturity == 1.0));

        assert!(matrix().project(&set, 10, 10_000).is_err());
    }

    #[test]
    fn test_temporal_projection_conflicts_only() {
        // With no synergies, maturity only shrinks conflicts: still improving
        let set = TraitSet::new().with_positive("brave").with_negative("fearful");
        let projection = matrix().project(&set, 0, 28).unwrap();
        assert_eq!(projection.trend, StabilityTrend::Improving);

        // A single-trait horse has nothing to project
        let lone = matrix().project(&traits(&["calm"]), 0, 28).unwrap();
        assert_eq!(lone.trend, StabilityTrend::Stable);
    }
}
