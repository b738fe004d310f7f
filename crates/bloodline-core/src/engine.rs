//! Analysis entry points over an [`AnimalProvider`]

use crate::animal::{Animal, AnimalId, BehaviorState};
use crate::compatibility::{CompatibilityResult, CompatibilityScorer, PairAnalysis};
use crate::config::AnalysisConfig;
use crate::diversity::{DiversityAnalyzer, DiversityReport};
use crate::error::{Error, Result};
use crate::inbreeding::{InbreedingCalculator, InbreedingResult};
use crate::interaction::{TemporalProjection, TraitInteractionGraph, TraitInteractionMatrix};
use crate::limits;
use crate::lineage::{LineageBuilder, LineageView};
use crate::provider::{AnimalProvider, FetchScope};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// Age assumed for animals without a recorded birth date
pub const ADULT_AGE_DAYS: u32 = 365;

/// Runs every analysis against one provider.
///
/// Each call opens its own [`FetchScope`]; nothing is cached between calls.
pub struct GeneticsEngine<P: AnimalProvider> {
    provider: P,
    config: AnalysisConfig,
    matrix: TraitInteractionMatrix,
}

impl<P: AnimalProvider> GeneticsEngine<P> {
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, AnalysisConfig::default())
    }

    pub fn with_config(provider: P, config: AnalysisConfig) -> Self {
        let matrix = TraitInteractionMatrix::new(Arc::new(config.catalog.clone()));
        Self {
            provider,
            config,
            matrix,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn scope(&self) -> FetchScope<'_> {
        FetchScope::new(&self.provider).with_timeout(self.config.fetch_timeout())
    }

    /// Pedigrees of one or more roots, built concurrently
    pub async fn build_lineage(
        &self,
        roots: &[AnimalId],
        max_depth: Option<u32>,
    ) -> Result<LineageView> {
        if roots.is_empty() {
            return Err(Error::Validation(
                "At least one root animal is required".to_string(),
            ));
        }
        let builder = LineageBuilder::new(max_depth.unwrap_or(self.config.default_depth))?;
        let scope = self.scope();
        builder.build_view(&scope, roots).await
    }

    pub async fn compute_inbreeding(
        &self,
        first: &AnimalId,
        second: &AnimalId,
        max_depth: Option<u32>,
    ) -> Result<InbreedingResult> {
        let calculator =
            InbreedingCalculator::new(max_depth.unwrap_or(self.config.default_depth))?;
        let scope = self.scope();
        calculator.compute(&scope, first, second).await
    }

    /// Diversity of the given animals. Duplicate ids count once; an unknown
    /// id fails the whole call.
    pub async fn analyze_diversity(&self, ids: &[AnimalId]) -> Result<DiversityReport> {
        let mut seen = HashSet::new();
        let unique: Vec<AnimalId> = ids.iter().filter(|id| seen.insert(*id)).cloned().collect();
        limits::validate_population(unique.len())?;
        for id in &unique {
            limits::validate_animal_id(id)?;
        }
        if unique.is_empty() {
            return Ok(DiversityReport::empty());
        }

        let scope = self.scope();
        let animals = fetch_population(&scope, &unique).await?;
        Ok(DiversityAnalyzer::analyze(&animals))
    }

    /// Trait interactions of one animal. An explicit environment overrides
    /// the animal's recorded behavior state.
    pub async fn analyze_trait_interactions(
        &self,
        id: &AnimalId,
        environment: Option<BehaviorState>,
    ) -> Result<TraitInteractionGraph> {
        limits::validate_animal_id(id)?;
        let scope = self.scope();
        let animal = scope.require(id).await?;
        self.interactions_of(&animal, environment.as_ref())
    }

    /// Weekly stability projection starting at the animal's age on `as_of`
    pub async fn project_trait_stability(
        &self,
        id: &AnimalId,
        window_days: u32,
        as_of: DateTime<Utc>,
    ) -> Result<TemporalProjection> {
        limits::validate_animal_id(id)?;
        let scope = self.scope();
        let animal = scope.require(id).await?;
        let age = animal
            .born_at
            .map(|_| animal.age_days(as_of))
            .unwrap_or(ADULT_AGE_DAYS);
        self.matrix.project(&animal.traits, age, window_days)
    }

    /// Score a pairing against every animal in both pedigrees
    pub async fn score_compatibility(
        &self,
        first: &AnimalId,
        second: &AnimalId,
    ) -> Result<CompatibilityResult> {
        self.score_pair(first, second, None).await
    }

    /// Score a pairing against an explicit ambient population
    pub async fn score_compatibility_in(
        &self,
        first: &AnimalId,
        second: &AnimalId,
        population: &[AnimalId],
    ) -> Result<CompatibilityResult> {
        self.score_pair(first, second, Some(population)).await
    }

    async fn score_pair(
        &self,
        first: &AnimalId,
        second: &AnimalId,
        population: Option<&[AnimalId]>,
    ) -> Result<CompatibilityResult> {
        limits::validate_pair(first, second)?;
        tracing::debug!("Scoring compatibility: {} x {}", first, second);

        let builder = LineageBuilder::new(self.config.compatibility_depth)?;
        let scope = self.scope();
        let view = builder
            .build_view(&scope, &[first.clone(), second.clone()])
            .await?;
        let (Some(left), Some(right)) = (view.lineage(first), view.lineage(second)) else {
            return Err(Error::Internal("Lineage missing for scored pair".to_string()));
        };
        let inbreeding = InbreedingCalculator::from_lineages(left, right);

        let ambient: Vec<Animal> = match population {
            Some(ids) => {
                let mut seen = HashSet::new();
                let unique: Vec<AnimalId> =
                    ids.iter().filter(|id| seen.insert(*id)).cloned().collect();
                limits::validate_population(unique.len())?;
                fetch_population(&scope, &unique).await?
            }
            None => view.animals.values().cloned().collect(),
        };
        let report = DiversityAnalyzer::analyze(&ambient);

        let first_animal = scope.require(first).await?;
        let second_animal = scope.require(second).await?;
        let first_traits = self.interactions_of(&first_animal, None)?;
        let second_traits = self.interactions_of(&second_animal, None)?;

        Ok(CompatibilityScorer::score(&PairAnalysis {
            first: &first_animal,
            second: &second_animal,
            inbreeding: &inbreeding,
            first_traits: &first_traits,
            second_traits: &second_traits,
            population: Some(&report),
        }))
    }

    fn interactions_of(
        &self,
        animal: &Animal,
        environment: Option<&BehaviorState>,
    ) -> Result<TraitInteractionGraph> {
        let environment = environment.or(animal.behavior.as_ref());
        let mut graph = self.matrix.analyze(&animal.traits, environment)?;
        graph.animal_id = Some(animal.id.clone());
        Ok(graph)
    }
}

/// Fetch every id in one batch; any id the provider lacks is `NotFound`
async fn fetch_population(scope: &FetchScope<'_>, ids: &[AnimalId]) -> Result<Vec<Animal>> {
    let animals = scope.fetch_many(ids).await?;
    if animals.len() < ids.len() {
        let found: HashSet<&AnimalId> = animals.iter().map(|a| &a.id).collect();
        if let Some(missing) = ids.iter().find(|id| !found.contains(id)) {
            return Err(Error::NotFound(missing.to_string()));
        }
    }
    Ok(animals)
}
