//! Animal records as read from the data provider

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use ulid::Ulid;

/// Unique identifier for an animal
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnimalId(pub String);

impl AnimalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh, time-ordered id for a newly registered animal
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AnimalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AnimalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AnimalId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Biological sex, used for effective population size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl std::str::FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" | "stallion" | "colt" | "gelding" | "m" => Ok(Self::Male),
            "female" | "mare" | "filly" | "f" => Ok(Self::Female),
            other => Err(format!("Unknown sex: {}", other)),
        }
    }
}

/// The fixed set of numeric attributes every horse may carry (0-100)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Speed,
    Stamina,
    Agility,
    Balance,
    Precision,
    Intelligence,
    Boldness,
    Flexibility,
    Obedience,
    Focus,
}

impl Stat {
    pub const ALL: [Stat; 10] = [
        Stat::Speed,
        Stat::Stamina,
        Stat::Agility,
        Stat::Balance,
        Stat::Precision,
        Stat::Intelligence,
        Stat::Boldness,
        Stat::Flexibility,
        Stat::Obedience,
        Stat::Focus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stat::Speed => "speed",
            Stat::Stamina => "stamina",
            Stat::Agility => "agility",
            Stat::Balance => "balance",
            Stat::Precision => "precision",
            Stat::Intelligence => "intelligence",
            Stat::Boldness => "boldness",
            Stat::Flexibility => "flexibility",
            Stat::Obedience => "obedience",
            Stat::Focus => "focus",
        }
    }
}

impl std::fmt::Display for Stat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Stat::ALL
            .into_iter()
            .find(|stat| stat.as_str() == lower)
            .ok_or_else(|| format!("Unknown stat: {}", s))
    }
}

/// Stat values keyed by stat
pub type Stats = BTreeMap<Stat, f64>;

/// Which of the three disjoint trait categories a tag belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraitCategory {
    Positive,
    Negative,
    Hidden,
}

/// Trait tags grouped by category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitSet {
    #[serde(default)]
    pub positive: BTreeSet<String>,
    #[serde(default)]
    pub negative: BTreeSet<String>,
    #[serde(default)]
    pub hidden: BTreeSet<String>,
}

impl TraitSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_positive(mut self, name: impl Into<String>) -> Self {
        self.positive.insert(name.into());
        self
    }

    pub fn with_negative(mut self, name: impl Into<String>) -> Self {
        self.negative.insert(name.into());
        self
    }

    pub fn with_hidden(mut self, name: impl Into<String>) -> Self {
        self.hidden.insert(name.into());
        self
    }

    /// All traits across the three categories
    pub fn all(&self) -> BTreeSet<&str> {
        self.iter().map(|(name, _)| name).collect()
    }

    /// Iterate every trait with its category
    pub fn iter(&self) -> impl Iterator<Item = (&str, TraitCategory)> + '_ {
        self.positive
            .iter()
            .map(|t| (t.as_str(), TraitCategory::Positive))
            .chain(self.negative.iter().map(|t| (t.as_str(), TraitCategory::Negative)))
            .chain(self.hidden.iter().map(|t| (t.as_str(), TraitCategory::Hidden)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.category_of(name).is_some()
    }

    pub fn category_of(&self, name: &str) -> Option<TraitCategory> {
        if self.positive.contains(name) {
            Some(TraitCategory::Positive)
        } else if self.negative.contains(name) {
            Some(TraitCategory::Negative)
        } else if self.hidden.contains(name) {
            Some(TraitCategory::Hidden)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.positive.len() + self.negative.len() + self.hidden.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Optional behavioral state consumed by the trait interaction matrix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BehaviorState {
    /// Current stress, 0 (relaxed) to 100 (panicked)
    pub stress_level: f64,

    /// Bond with handler/groom, 0 to 100
    pub bond_score: f64,
}

impl BehaviorState {
    pub fn new(stress_level: f64, bond_score: f64) -> Self {
        Self {
            stress_level,
            bond_score,
        }
    }
}

impl Default for BehaviorState {
    fn default() -> Self {
        Self {
            stress_level: 0.0,
            bond_score: 50.0,
        }
    }
}

/// A horse as supplied by the data provider (read-only to this crate)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    /// Unique identifier
    pub id: AnimalId,

    /// Display name
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,

    /// Sire-line parent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sire_id: Option<AnimalId>,

    /// Dam-line parent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dam_id: Option<AnimalId>,

    #[serde(default)]
    pub stats: Stats,

    #[serde(default)]
    pub traits: TraitSet,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<BehaviorState>,

    /// Foaling date, used to derive age
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub born_at: Option<DateTime<Utc>>,
}

impl Animal {
    /// Create a new animal with no parents, stats or traits
    pub fn new(id: impl Into<AnimalId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sex: None,
            sire_id: None,
            dam_id: None,
            stats: Stats::new(),
            traits: TraitSet::default(),
            behavior: None,
            born_at: None,
        }
    }

    pub fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = Some(sex);
        self
    }

    pub fn with_sire(mut self, sire: impl Into<AnimalId>) -> Self {
        self.sire_id = Some(sire.into());
        self
    }

    pub fn with_dam(mut self, dam: impl Into<AnimalId>) -> Self {
        self.dam_id = Some(dam.into());
        self
    }

    pub fn with_stat(mut self, stat: Stat, value: f64) -> Self {
        self.stats.insert(stat, value);
        self
    }

    pub fn with_traits(mut self, traits: TraitSet) -> Self {
        self.traits = traits;
        self
    }

    pub fn with_positive_trait(mut self, name: impl Into<String>) -> Self {
        self.traits.positive.insert(name.into());
        self
    }

    pub fn with_negative_trait(mut self, name: impl Into<String>) -> Self {
        self.traits.negative.insert(name.into());
        self
    }

    pub fn with_hidden_trait(mut self, name: impl Into<String>) -> Self {
        self.traits.hidden.insert(name.into());
        self
    }

    pub fn with_behavior(mut self, behavior: BehaviorState) -> Self {
        self.behavior = Some(behavior);
        self
    }

    pub fn with_born_at(mut self, born_at: DateTime<Utc>) -> Self {
        self.born_at = Some(born_at);
        self
    }

    /// Parent ids in (sire, dam) order, skipping missing links
    pub fn parents(&self) -> impl Iterator<Item = &AnimalId> {
        self.sire_id.iter().chain(self.dam_id.iter())
    }

    pub fn has_parent(&self, id: &AnimalId) -> bool {
        self.parents().any(|p| p == id)
    }

    /// Age in whole days at `as_of`; unknown birth dates count as newborn
    pub fn age_days(&self, as_of: DateTime<Utc>) -> u32 {
        self.born_at
            .map(|born| (as_of - born).num_days().max(0) as u32)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_animal_builder() {
        let animal = Animal::new("h1", "Storm Chaser")
            .with_sex(Sex::Male)
            .with_sire("s1")
            .with_dam("d1")
            .with_stat(Stat::Speed, 82.0)
            .with_positive_trait("brave");

        assert_eq!(animal.id.as_str(), "h1");
        assert_eq!(animal.parents().count(), 2);
        assert!(animal.has_parent(&AnimalId::new("d1")));
        assert_eq!(animal.stats.get(&Stat::Speed), Some(&82.0));
        assert!(animal.traits.contains("brave"));
    }

    #[test]
    fn test_trait_set_categories() {
        let traits = TraitSet::new()
            .with_positive("calm")
            .with_negative("stubborn")
            .with_hidden("curious");

        assert_eq!(traits.len(), 3);
        assert_eq!(traits.category_of("stubborn"), Some(TraitCategory::Negative));
        assert_eq!(traits.category_of("curious"), Some(TraitCategory::Hidden));
        assert_eq!(traits.category_of("lazy"), None);
        assert_eq!(traits.all().len(), 3);
    }

    #[test]
    fn test_age_days() {
        let now = Utc::now();
        let foal = Animal::new("f", "Foal").with_born_at(now - Duration::days(200));
        assert_eq!(foal.age_days(now), 200);
        assert_eq!(Animal::new("x", "Unknown").age_days(now), 0);
    }

    #[test]
    fn test_parse_sex_and_stat() {
        assert_eq!("Mare".parse::<Sex>(), Ok(Sex::Female));
        assert_eq!("stallion".parse::<Sex>(), Ok(Sex::Male));
        assert!("unicorn".parse::<Sex>().is_err());
        assert_eq!("Speed".parse::<Stat>(), Ok(Stat::Speed));
    }

    #[test]
    fn test_animal_json_shape() {
        let json = r#"{
            "id": "h7",
            "name": "Juniper",
            "sex": "female",
            "stats": {"speed": 71, "focus": 64},
            "traits": {"positive": ["calm"], "hidden": ["curious"]}
        }"#;
        let animal: Animal = serde_json::from_str(json).unwrap();

        assert_eq!(animal.id, AnimalId::new("h7"));
        assert_eq!(animal.sex, Some(Sex::Female));
        assert_eq!(animal.stats.get(&Stat::Focus), Some(&64.0));
        assert!(animal.traits.negative.is_empty());
        assert!(animal.sire_id.is_none());
    }
}
