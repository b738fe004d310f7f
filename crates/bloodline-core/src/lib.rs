//! Bloodline Core - Genetics engine for horse breeding
//!
//! This crate provides pedigree construction, inbreeding coefficients,
//! population diversity, trait interaction modeling and breeding
//! compatibility scoring over any [`AnimalProvider`].

pub mod animal;
pub mod catalog;
pub mod compatibility;
pub mod config;
pub mod diversity;
pub mod engine;
pub mod error;
pub mod inbreeding;
pub mod interaction;
pub mod limits;
pub mod lineage;
pub mod provider;

pub use animal::{Animal, AnimalId, BehaviorState, Sex, Stat, Stats, TraitCategory, TraitSet};
pub use catalog::{DominanceLevel, Polarity, TraitCatalog};
pub use compatibility::{CompatibilityFactors, CompatibilityResult, CompatibilityScorer, RecommendationTier};
pub use config::AnalysisConfig;
pub use diversity::{Bottleneck, DiversityAnalyzer, DiversityReport, EffectivePopulation, FounderInfluence};
pub use engine::GeneticsEngine;
pub use error::{Error, Result};
pub use inbreeding::{CommonAncestor, InbreedingCalculator, InbreedingResult, RiskLevel};
pub use interaction::{
    StabilityTrend, TemporalProjection, TraitInteractionGraph, TraitInteractionMatrix,
};
pub use lineage::{Lineage, LineageBuilder, LineageNode, LineageView, ParentLine};
pub use provider::{AnimalProvider, FetchScope, FetchStats};
