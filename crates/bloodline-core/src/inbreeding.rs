//! Inbreeding coefficient via common-ancestor path analysis

use crate::animal::AnimalId;
use crate::error::Result;
use crate::limits;
use crate::lineage::{Lineage, LineageBuilder};
use crate::provider::FetchScope;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Coefficient above which a pairing is critical
pub const CRITICAL_THRESHOLD: f64 = 0.25;
/// Coefficient above which a pairing is high risk
pub const HIGH_THRESHOLD: f64 = 0.125;
/// Coefficient above which a pairing is medium risk
pub const MEDIUM_THRESHOLD: f64 = 0.0625;

/// Qualitative inbreeding risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_coefficient(coefficient: f64) -> Self {
        if coefficient > CRITICAL_THRESHOLD {
            Self::Critical
        } else if coefficient > HIGH_THRESHOLD {
            Self::High
        } else if coefficient > MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Breeding advice for this tier
    pub fn recommendations(&self) -> Vec<String> {
        let advice: &[&str] = match self {
            Self::Low => &["Genetic relationship is acceptable for breeding"],
            Self::Medium => &[
                "Moderate shared ancestry; monitor offspring for inherited weaknesses",
                "Prefer an outcross if a comparable partner is available",
            ],
            Self::High => &[
                "High shared ancestry; breeding is not recommended",
                "Look for a partner from an unrelated bloodline",
            ],
            Self::Critical => &[
                "Critical inbreeding risk; do not breed this pair",
                "Offspring would have a high chance of inherited defects",
                "Introduce unrelated bloodlines before breeding either animal within this line",
            ],
        };
        advice.iter().map(|s| s.to_string()).collect()
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generations at which one shared occurrence was found on each side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathPair {
    pub first_generation: u32,
    pub second_generation: u32,
}

impl PathPair {
    /// 0.5^(g1 + g2 + 1)
    pub fn contribution(&self) -> f64 {
        0.5_f64.powi((self.first_generation + self.second_generation + 1) as i32)
    }
}

/// A shared ancestor and what it adds to the coefficient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonAncestor {
    pub animal_id: AnimalId,
    pub contribution: f64,
    pub paths: Vec<PathPair>,
    /// Smallest g1 + g2 over all path pairs
    pub closest_generation: u32,
}

/// Outcome of comparing two pedigrees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InbreedingResult {
    pub first: AnimalId,
    pub second: AnimalId,
    pub depth: u32,
    /// Summed path contributions, clamped to [0, 1]
    pub coefficient: f64,
    pub risk: RiskLevel,
    pub common_ancestors: Vec<CommonAncestor>,
    pub recommendations: Vec<String>,
}

impl InbreedingResult {
    pub fn is_related(&self) -> bool {
        !self.common_ancestors.is_empty()
    }
}

/// Computes relatedness between two candidate parents
pub struct InbreedingCalculator {
    builder: LineageBuilder,
}

impl InbreedingCalculator {
    pub fn new(depth: u32) -> Result<Self> {
        Ok(Self {
            builder: LineageBuilder::new(depth)?,
        })
    }

    /// Build both pedigrees and compare them
    pub async fn compute(
        &self,
        scope: &FetchScope<'_>,
        first: &AnimalId,
        second: &AnimalId,
    ) -> Result<InbreedingResult> {
        limits::validate_pair(first, second)?;
        tracing::debug!(
            "Computing inbreeding: {} x {}, depth={}",
            first,
            second,
            self.builder.max_depth()
        );

        let (left, right) = self.builder.build_pair(scope, first, second).await?;
        let result = Self::from_lineages(&left, &right);

        tracing::debug!(
            "Inbreeding {} x {} = {:.4} ({})",
            first,
            second,
            result.coefficient,
            result.risk
        );
        Ok(result)
    }

    /// Compare two already-built pedigrees.
    ///
    /// Every pair of occurrences of the same animal contributes
    /// `0.5^(g1 + g2 + 1)`; paths are not deduplicated. Only pairs where both
    /// sides are generation 0 are skipped, so a root that appears as an
    /// ancestor of the other root counts (parent x offspring = 0.25).
    pub fn from_lineages(first: &Lineage, second: &Lineage) -> InbreedingResult {
        let mut shared: BTreeMap<&AnimalId, Vec<PathPair>> = BTreeMap::new();

        for left in &first.nodes {
            for right in second.occurrences(&left.animal_id) {
                if left.generation == 0 && right.generation == 0 {
                    continue;
                }
                shared.entry(&left.animal_id).or_default().push(PathPair {
                    first_generation: left.generation,
                    second_generation: right.generation,
                });
            }
        }

        let mut common_ancestors: Vec<CommonAncestor> = shared
            .into_iter()
            .map(|(id, paths)| CommonAncestor {
                animal_id: id.clone(),
                contribution: paths.iter().map(PathPair::contribution).sum(),
                closest_generation: paths
                    .iter()
                    .map(|p| p.first_generation + p.second_generation)
                    .min()
                    .unwrap_or(0),
                paths,
            })
            .collect();

        common_ancestors.sort_by(|a, b| {
            b.contribution
                .partial_cmp(&a.contribution)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.animal_id.cmp(&b.animal_id))
        });

        let raw: f64 = common_ancestors.iter().map(|a| a.contribution).sum();
        let coefficient = raw.clamp(0.0, 1.0);
        let risk = RiskLevel::from_coefficient(coefficient);

        InbreedingResult {
            first: first.root.clone(),
            second: second.root.clone(),
            depth: first.max_depth.max(second.max_depth),
            coefficient,
            risk,
            common_ancestors,
            recommendations: risk.recommendations(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animal::Animal;
    use crate::error::Error;
    use crate::provider::testing::StubProvider;

    fn stud_book() -> StubProvider {
        StubProvider::new(vec![
            // Founders
            Animal::new("gs", "Grand Sire"),
            Animal::new("gd", "Grand Dam"),
            Animal::new("x", "Outsider"),
            Animal::new("y", "Outsider Two"),
            // Full siblings
            Animal::new("sib1", "Sibling One").with_sire("gs").with_dam("gd"),
            Animal::new("sib2", "Sibling Two").with_sire("gs").with_dam("gd"),
            // Half sibling through the sire
            Animal::new("half", "Half Sibling").with_sire("gs").with_dam("x"),
            // Offspring of sib1
            Animal::new("kid", "Kid").with_sire("sib1").with_dam("y"),
            // Unrelated
            Animal::new("u1", "Unrelated One").with_sire("x"),
            Animal::new("u2", "Unrelated Two").with_dam("y"),
        ])
    }

    async fn compute(a: &str, b: &str, depth: u32) -> Result<InbreedingResult> {
        let provider = stud_book();
        let scope = FetchScope::new(&provider);
        InbreedingCalculator::new(depth)?
            .compute(&scope, &AnimalId::new(a), &AnimalId::new(b))
            .await
    }

    #[tokio::test]
    async fn test_parent_offspring_is_quarter() {
        // x is a founder, so the only shared path is x itself at (0, 1)
        let result = compute("x", "u1", 4).await.unwrap();

        assert!((result.coefficient - 0.25).abs() < 1e-12);
        assert_eq!(result.risk, RiskLevel::High);
        assert_eq!(result.common_ancestors.len(), 1);
        assert_eq!(result.common_ancestors[0].animal_id, AnimalId::new("x"));
        assert_eq!(
            result.common_ancestors[0].paths,
            vec![PathPair {
                first_generation: 0,
                second_generation: 1
            }]
        );
    }

    #[tokio::test]
    async fn test_paths_through_parent_are_additive() {
        // sib1 at (0, 1) plus gs and gd at (1, 2) each
        let result = compute("sib1", "kid", 4).await.unwrap();

        assert!((result.coefficient - 0.375).abs() < 1e-12);
        assert_eq!(result.risk, RiskLevel::Critical);
        assert_eq!(result.common_ancestors.len(), 3);
        assert_eq!(result.common_ancestors[0].animal_id, AnimalId::new("sib1"));
    }

    #[tokio::test]
    async fn test_parent_offspring_depth_one() {
        let result = compute("kid", "sib1", 1).await.unwrap();
        assert!((result.coefficient - 0.25).abs() < 1e-12);
        assert_eq!(result.common_ancestors.len(), 1);
    }

    #[tokio::test]
    async fn test_full_siblings() {
        let result = compute("sib1", "sib2", 3).await.unwrap();

        // gs and gd each at (1, 1): 2 * 0.5^3
        assert!((result.coefficient - 0.25).abs() < 1e-12);
        assert_eq!(result.common_ancestors.len(), 2);
        assert!(result.is_related());
    }

    #[tokio::test]
    async fn test_half_siblings() {
        let result = compute("sib1", "half", 3).await.unwrap();
        assert!((result.coefficient - 0.125).abs() < 1e-12);
        assert_eq!(result.risk, RiskLevel::Medium);
        assert_eq!(result.common_ancestors[0].closest_generation, 2);
    }

    #[tokio::test]
    async fn test_symmetric() {
        for (a, b) in [("sib1", "kid"), ("sib1", "half"), ("kid", "sib2"), ("u1", "u2")] {
            let forward = compute(a, b, 4).await.unwrap();
            let backward = compute(b, a, 4).await.unwrap();

            assert!((forward.coefficient - backward.coefficient).abs() < 1e-12);
            assert_eq!(forward.risk, backward.risk);
            let ids = |r: &InbreedingResult| {
                r.common_ancestors
                    .iter()
                    .map(|c| c.animal_id.clone())
                    .collect::<Vec<_>>()
            };
            assert_eq!(ids(&forward), ids(&backward));
        }
    }

    #[tokio::test]
    async fn test_unrelated_is_zero() {
        let result = compute("u1", "u2", 5).await.unwrap();
        assert_eq!(result.coefficient, 0.0);
        assert_eq!(result.risk, RiskLevel::Low);
        assert!(!result.is_related());
    }

    #[tokio::test]
    async fn test_shared_ancestor_beyond_depth_is_ignored() {
        // kid -> sib1 -> gs is two links; half -> gs is one
        let shallow = compute("kid", "half", 1).await.unwrap();
        assert_eq!(shallow.coefficient, 0.0);

        let deep = compute("kid", "half", 2).await.unwrap();
        assert!((deep.coefficient - 0.0625).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_self_comparison_is_validation_error() {
        let err = compute("sib1", "sib1", 3).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_errors() {
        assert!(matches!(
            compute("sib1", "nobody", 3).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            compute("sib1", "sib2", 0).await,
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_risk_thresholds() {
        assert_eq!(RiskLevel::from_coefficient(0.3), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_coefficient(0.25), RiskLevel::High);
        assert_eq!(RiskLevel::from_coefficient(0.125), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_coefficient(0.0625), RiskLevel::Low);
        assert_eq!(RiskLevel::from_coefficient(0.0), RiskLevel::Low);
        assert!(!RiskLevel::Critical.recommendations().is_empty());
    }

    #[test]
    fn test_coefficient_is_clamped() {
        // Heavy collapse: the same ancestor on every path of both sides
        let mut left = Lineage::new(AnimalId::new("l"), 3);
        let mut right = Lineage::new(AnimalId::new("r"), 3);
        for _ in 0..40 {
            left.push_parent(0, crate::lineage::ParentLine::Sire, AnimalId::new("z"))
                .unwrap();
            right.push_parent(0, crate::lineage::ParentLine::Dam, AnimalId::new("z"))
                .unwrap();
        }
        let result = InbreedingCalculator::from_lineages(&left, &right);
        assert_eq!(result.coefficient, 1.0);
        assert_eq!(result.risk, RiskLevel::Critical);
    }
}
