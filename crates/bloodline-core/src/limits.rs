//! Input validation limits for analysis requests

use crate::animal::{AnimalId, BehaviorState, Stats, TraitSet};

/// Maximum pedigree depth a caller may request (12 generations)
pub const MAX_LINEAGE_DEPTH: u32 = 12;

/// Maximum number of animals in one diversity analysis (5000)
pub const MAX_POPULATION_SIZE: usize = 5000;

/// Maximum length of a single trait tag (64 chars)
pub const MAX_TRAIT_LEN: usize = 64;

/// Maximum traits per category (50)
pub const MAX_TRAITS_PER_CATEGORY: usize = 50;

/// Upper bound of every stat and environment value
pub const MAX_STAT_VALUE: f64 = 100.0;

/// Maximum temporal projection window (two years)
pub const MAX_PROJECTION_DAYS: u32 = 730;

/// Validation error type
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    DepthTooSmall { depth: u32 },
    DepthTooLarge { depth: u32, max: u32 },
    SelfComparison { id: String },
    EmptyAnimalId,
    EmptyTrait,
    TraitTooLong { len: usize, max: usize },
    TooManyTraits { count: usize, max: usize },
    OverlappingTrait { name: String },
    StatOutOfRange { stat: String, value: f64 },
    EnvironmentOutOfRange { field: &'static str, value: f64 },
    TooManyAnimals { count: usize, max: usize },
    ProjectionTooLong { days: u32, max: u32 },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DepthTooSmall { depth } => {
                write!(f, "Lineage depth must be at least 1 (got {})", depth)
            }
            Self::DepthTooLarge { depth, max } => {
                write!(f, "Lineage depth too large: {} (max {})", depth, max)
            }
            Self::SelfComparison { id } => {
                write!(f, "Cannot compare animal {} with itself", id)
            }
            Self::EmptyAnimalId => write!(f, "Animal id cannot be empty"),
            Self::EmptyTrait => write!(f, "Trait tag cannot be empty"),
            Self::TraitTooLong { len, max } => {
                write!(f, "Trait tag too long: {} chars (max {})", len, max)
            }
            Self::TooManyTraits { count, max } => {
                write!(f, "Too many traits in one category: {} (max {})", count, max)
            }
            Self::OverlappingTrait { name } => {
                write!(f, "Trait '{}' appears in more than one category", name)
            }
            Self::StatOutOfRange { stat, value } => {
                write!(f, "Stat {} out of range: {} (expected 0-100)", stat, value)
            }
            Self::EnvironmentOutOfRange { field, value } => {
                write!(f, "{} out of range: {} (expected 0-100)", field, value)
            }
            Self::TooManyAnimals { count, max } => {
                write!(f, "Too many animals in population: {} (max {})", count, max)
            }
            Self::ProjectionTooLong { days, max } => {
                write!(f, "Projection window too long: {} days (max {})", days, max)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a requested pedigree depth
pub fn validate_depth(depth: u32) -> Result<(), ValidationError> {
    if depth < 1 {
        return Err(ValidationError::DepthTooSmall { depth });
    }
    if depth > MAX_LINEAGE_DEPTH {
        return Err(ValidationError::DepthTooLarge {
            depth,
            max: MAX_LINEAGE_DEPTH,
        });
    }
    Ok(())
}

/// Validate that two animals being compared are distinct
pub fn validate_pair(first: &AnimalId, second: &AnimalId) -> Result<(), ValidationError> {
    validate_animal_id(first)?;
    validate_animal_id(second)?;
    if first == second {
        return Err(ValidationError::SelfComparison {
            id: first.to_string(),
        });
    }
    Ok(())
}

/// Validate an animal id
pub fn validate_animal_id(id: &AnimalId) -> Result<(), ValidationError> {
    if id.as_str().trim().is_empty() {
        return Err(ValidationError::EmptyAnimalId);
    }
    Ok(())
}

/// Validate a single trait tag
pub fn validate_trait(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyTrait);
    }
    if name.len() > MAX_TRAIT_LEN {
        return Err(ValidationError::TraitTooLong {
            len: name.len(),
            max: MAX_TRAIT_LEN,
        });
    }
    Ok(())
}

/// Validate a trait set: tags are well-formed and the three categories are disjoint
pub fn validate_traits(traits: &TraitSet) -> Result<(), ValidationError> {
    for category in [&traits.positive, &traits.negative, &traits.hidden] {
        if category.len() > MAX_TRAITS_PER_CATEGORY {
            return Err(ValidationError::TooManyTraits {
                count: category.len(),
                max: MAX_TRAITS_PER_CATEGORY,
            });
        }
        for name in category {
            validate_trait(name)?;
        }
    }

    let overlap = traits
        .positive
        .intersection(&traits.negative)
        .chain(traits.positive.intersection(&traits.hidden))
        .chain(traits.negative.intersection(&traits.hidden))
        .next();
    if let Some(name) = overlap {
        return Err(ValidationError::OverlappingTrait { name: name.clone() });
    }
    Ok(())
}

/// Validate that every stat is within 0-100
pub fn validate_stats(stats: &Stats) -> Result<(), ValidationError> {
    for (stat, value) in stats {
        if !(0.0..=MAX_STAT_VALUE).contains(value) {
            return Err(ValidationError::StatOutOfRange {
                stat: stat.to_string(),
                value: *value,
            });
        }
    }
    Ok(())
}

/// Validate environment / behavioral state inputs
pub fn validate_environment(state: &BehaviorState) -> Result<(), ValidationError> {
    if !(0.0..=MAX_STAT_VALUE).contains(&state.stress_level) {
        return Err(ValidationError::EnvironmentOutOfRange {
            field: "stress_level",
            value: state.stress_level,
        });
    }
    if !(0.0..=MAX_STAT_VALUE).contains(&state.bond_score) {
        return Err(ValidationError::EnvironmentOutOfRange {
            field: "bond_score",
            value: state.bond_score,
        });
    }
    Ok(())
}

/// Validate population size
pub fn validate_population(count: usize) -> Result<(), ValidationError> {
    if count > MAX_POPULATION_SIZE {
        return Err(ValidationError::TooManyAnimals {
            count,
            max: MAX_POPULATION_SIZE,
        });
    }
    Ok(())
}

/// Validate temporal projection window
pub fn validate_projection_window(days: u32) -> Result<(), ValidationError> {
    if days > MAX_PROJECTION_DAYS {
        return Err(ValidationError::ProjectionTooLong {
            days,
            max: MAX_PROJECTION_DAYS,
        });
    }
    Ok(())
}
