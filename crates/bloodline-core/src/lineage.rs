//! Pedigree construction and generational organization
//!
//! A pedigree is stored as an arena of [`LineageNode`]s. The same ancestor
//! reached through different parent lines gets one node per path, which is
//! what lets the inbreeding calculator see pedigree collapse.

use crate::animal::{Animal, AnimalId};
use crate::error::Result;
use crate::limits;
use crate::provider::{FetchScope, FetchStats};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Index of a node inside its lineage arena
pub type NodeId = usize;

/// Which parent link was followed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentLine {
    Sire,
    Dam,
}

/// One occurrence of an animal in a pedigree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageNode {
    /// Position in the arena
    pub node_id: NodeId,

    pub animal_id: AnimalId,

    /// Links away from the root (0 = the root itself)
    pub generation: u32,

    /// Parent-line choices taken from the root to reach this node
    pub path: Vec<ParentLine>,

    /// Root this occurrence was reached from
    pub root: AnimalId,

    /// Offspring node this one was reached through (None for the root)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offspring: Option<NodeId>,
}

/// Pedigree statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageStats {
    pub total_nodes: usize,
    pub unique_ancestors: usize,
    /// Ancestors reachable through more than one path
    pub collapsed_ancestors: usize,
    pub max_generation_reached: u32,
    /// Parent links that pointed at records the provider did not return
    pub missing_links: usize,
    /// Links skipped because the ancestor already sits on the path below it
    pub cyclic_links: usize,
}

/// The pedigree of one root animal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lineage {
    pub root: AnimalId,
    pub max_depth: u32,
    pub nodes: Vec<LineageNode>,

    /// Node ids grouped by generation; index 0 holds the root
    pub generations: Vec<Vec<NodeId>>,

    by_animal: HashMap<AnimalId, Vec<NodeId>>,

    pub stats: LineageStats,
}

impl Lineage {
    /// Start a pedigree containing only the root
    pub fn new(root: AnimalId, max_depth: u32) -> Self {
        let mut lineage = Self {
            root: root.clone(),
            max_depth,
            nodes: Vec::new(),
            generations: Vec::new(),
            by_animal: HashMap::new(),
            stats: LineageStats::default(),
        };
        lineage.insert(root, 0, Vec::new(), None);
        lineage
    }

    /// Record `parent` as reached from `offspring` via `line`.
    /// Returns `None` when `offspring` is not a node of this lineage.
    pub fn push_parent(
        &mut self,
        offspring: NodeId,
        line: ParentLine,
        parent: AnimalId,
    ) -> Option<NodeId> {
        let child = self.nodes.get(offspring)?;
        let generation = child.generation + 1;
        let mut path = child.path.clone();
        path.push(line);
        Some(self.insert(parent, generation, path, Some(offspring)))
    }

    fn insert(
        &mut self,
        animal_id: AnimalId,
        generation: u32,
        path: Vec<ParentLine>,
        offspring: Option<NodeId>,
    ) -> NodeId {
        let node_id = self.nodes.len();
        self.by_animal
            .entry(animal_id.clone())
            .or_default()
            .push(node_id);

        let slot = generation as usize;
        if self.generations.len() <= slot {
            self.generations.resize_with(slot + 1, Vec::new);
        }
        self.generations[slot].push(node_id);

        self.nodes.push(LineageNode {
            node_id,
            animal_id,
            generation,
            path,
            root: self.root.clone(),
            offspring,
        });
        node_id
    }

    pub fn node(&self, id: NodeId) -> Option<&LineageNode> {
        self.nodes.get(id)
    }

    /// Every occurrence of an animal, one per distinct path
    pub fn occurrences<'a>(&'a self, id: &AnimalId) -> impl Iterator<Item = &'a LineageNode> + 'a {
        self.by_animal
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&node_id| &self.nodes[node_id])
    }

    pub fn contains(&self, id: &AnimalId) -> bool {
        self.by_animal.contains_key(id)
    }

    /// Nodes at a given generation
    pub fn generation(&self, generation: u32) -> impl Iterator<Item = &LineageNode> {
        self.generations
            .get(generation as usize)
            .into_iter()
            .flatten()
            .map(move |&node_id| &self.nodes[node_id])
    }

    /// Deepest generation that holds at least one node
    pub fn depth_reached(&self) -> u32 {
        self.generations.len().saturating_sub(1) as u32
    }

    /// Distinct animals in the pedigree, root included
    pub fn animal_ids(&self) -> BTreeSet<&AnimalId> {
        self.by_animal.keys().collect()
    }

    /// Distinct ancestors (generation >= 1)
    pub fn ancestor_ids(&self) -> BTreeSet<&AnimalId> {
        self.nodes
            .iter()
            .filter(|n| n.generation >= 1)
            .map(|n| &n.animal_id)
            .collect()
    }

    /// Ancestors reachable through more than one path
    pub fn collapsed_ancestors(&self) -> Vec<&AnimalId> {
        let mut collapsed: Vec<&AnimalId> = self
            .by_animal
            .iter()
            .filter(|(_, nodes)| nodes.len() > 1)
            .map(|(id, _)| id)
            .collect();
        collapsed.sort();
        collapsed
    }

    /// Whether `id` already appears on the chain from `node` down to the root
    fn on_chain(&self, mut node: NodeId, id: &AnimalId) -> bool {
        loop {
            let current = &self.nodes[node];
            if &current.animal_id == id {
                return true;
            }
            match current.offspring {
                Some(next) => node = next,
                None => return false,
            }
        }
    }

    fn finish(&mut self) {
        self.stats.total_nodes = self.nodes.len();
        self.stats.unique_ancestors = self.ancestor_ids().len();
        self.stats.collapsed_ancestors = self.collapsed_ancestors().len();
        self.stats.max_generation_reached = self.depth_reached();
    }
}

/// Pedigrees for one or more roots plus the animal snapshot they were built from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageView {
    pub lineages: Vec<Lineage>,

    /// Every animal seen while building, keyed by id
    pub animals: BTreeMap<AnimalId, Animal>,

    pub fetch: FetchStats,
}

impl LineageView {
    pub fn lineage(&self, root: &AnimalId) -> Option<&Lineage> {
        self.lineages.iter().find(|l| &l.root == root)
    }

    pub fn animal(&self, id: &AnimalId) -> Option<&Animal> {
        self.animals.get(id)
    }

    /// Distinct animals per generation across all roots
    pub fn generation_ids(&self) -> Vec<BTreeSet<AnimalId>> {
        let depth = self
            .lineages
            .iter()
            .map(|l| l.generations.len())
            .max()
            .unwrap_or(0);
        let mut grouped = vec![BTreeSet::new(); depth];
        for lineage in &self.lineages {
            for node in &lineage.nodes {
                grouped[node.generation as usize].insert(node.animal_id.clone());
            }
        }
        grouped
    }
}

/// Walks parent links breadth-first, one batched fetch per generation
#[derive(Debug, Clone, Copy)]
pub struct LineageBuilder {
    max_depth: u32,
}

impl LineageBuilder {
    pub fn new(max_depth: u32) -> Result<Self> {
        limits::validate_depth(max_depth)?;
        Ok(Self { max_depth })
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Build the pedigree of a single root
    pub async fn build(&self, scope: &FetchScope<'_>, root: &AnimalId) -> Result<Lineage> {
        limits::validate_animal_id(root)?;
        tracing::debug!("Building lineage: root={}, depth={}", root, self.max_depth);

        let root_animal = scope.require(root).await?;
        let mut lineage = Lineage::new(root.clone(), self.max_depth);
        let mut frontier: Vec<(NodeId, Animal)> = vec![(0, root_animal)];

        for generation in 1..=self.max_depth {
            let mut links: Vec<(NodeId, ParentLine, AnimalId)> = Vec::new();
            for (node_id, animal) in &frontier {
                if let Some(sire) = &animal.sire_id {
                    links.push((*node_id, ParentLine::Sire, sire.clone()));
                }
                if let Some(dam) = &animal.dam_id {
                    links.push((*node_id, ParentLine::Dam, dam.clone()));
                }
            }
            if links.is_empty() {
                break;
            }

            let ids: Vec<AnimalId> = links.iter().map(|(_, _, id)| id.clone()).collect();
            let fetched: HashMap<AnimalId, Animal> = scope
                .fetch_many_lenient(&ids)
                .await?
                .into_iter()
                .map(|a| (a.id.clone(), a))
                .collect();

            let mut next = Vec::with_capacity(links.len());
            for (offspring, line, parent_id) in links {
                let Some(parent) = fetched.get(&parent_id) else {
                    lineage.stats.missing_links += 1;
                    continue;
                };
                if lineage.on_chain(offspring, &parent_id) {
                    tracing::warn!(
                        "Skipping cyclic parent link {} in lineage of {}",
                        parent_id,
                        root
                    );
                    lineage.stats.cyclic_links += 1;
                    continue;
                }
                if let Some(node_id) = lineage.push_parent(offspring, line, parent_id) {
                    next.push((node_id, parent.clone()));
                }
            }

            tracing::trace!(
                "Generation {} of {}: {} nodes",
                generation,
                root,
                next.len()
            );
            frontier = next;
        }

        lineage.finish();
        tracing::debug!(
            "Lineage of {} has {} nodes, {} unique ancestors",
            root,
            lineage.stats.total_nodes,
            lineage.stats.unique_ancestors
        );
        Ok(lineage)
    }

    /// Build two pedigrees concurrently over one shared scope
    pub async fn build_pair(
        &self,
        scope: &FetchScope<'_>,
        first: &AnimalId,
        second: &AnimalId,
    ) -> Result<(Lineage, Lineage)> {
        futures::try_join!(self.build(scope, first), self.build(scope, second))
    }

    /// Build pedigrees for every root and collect the animal snapshot
    pub async fn build_view(&self, scope: &FetchScope<'_>, roots: &[AnimalId]) -> Result<LineageView> {
        let lineages =
            futures::future::try_join_all(roots.iter().map(|root| self.build(scope, root))).await?;

        let mut animals = BTreeMap::new();
        for lineage in &lineages {
            for id in lineage.animal_ids() {
                if let Some(animal) = scope.get_cached(id) {
                    animals.insert(id.clone(), animal);
                }
            }
        }

        Ok(LineageView {
            lineages,
            animals,
            fetch: scope.stats(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::provider::testing::StubProvider;

    // Pedigree with a collapse on "gs":
    //
    //   gs ─┬─> s ─┐
    //       └─> d ─┴─> foal
    fn collapsed_herd() -> StubProvider {
        StubProvider::new(vec![
            Animal::new("gs", "Grand Sire"),
            Animal::new("s", "Sire").with_sire("gs"),
            Animal::new("d", "Dam").with_sire("gs"),
            Animal::new("foal", "Foal").with_sire("s").with_dam("d"),
        ])
    }

    #[tokio::test]
    async fn test_preserves_duplicate_paths() {
        let provider = collapsed_herd();
        let scope = FetchScope::new(&provider);
        let lineage = LineageBuilder::new(3)
            .unwrap()
            .build(&scope, &AnimalId::new("foal"))
            .await
            .unwrap();

        let occurrences: Vec<_> = lineage.occurrences(&AnimalId::new("gs")).collect();
        assert_eq!(occurrences.len(), 2);
        assert!(occurrences.iter().all(|n| n.generation == 2));
        assert_eq!(
            occurrences[0].path,
            vec![ParentLine::Sire, ParentLine::Sire]
        );
        assert_eq!(occurrences[1].path, vec![ParentLine::Dam, ParentLine::Sire]);

        assert_eq!(lineage.stats.total_nodes, 5);
        assert_eq!(lineage.stats.unique_ancestors, 3);
        assert_eq!(lineage.stats.collapsed_ancestors, 1);
        assert_eq!(lineage.collapsed_ancestors(), vec![&AnimalId::new("gs")]);
    }

    #[tokio::test]
    async fn test_generation_index_and_batching() {
        let provider = collapsed_herd();
        let scope = FetchScope::new(&provider);
        let lineage = LineageBuilder::new(5)
            .unwrap()
            .build(&scope, &AnimalId::new("foal"))
            .await
            .unwrap();

        assert_eq!(lineage.depth_reached(), 2);
        assert_eq!(lineage.generation(0).count(), 1);
        assert_eq!(lineage.generation(1).count(), 2);
        assert_eq!(lineage.generation(2).count(), 2);

        // root + generation 1 + generation 2 ("gs" fetched once)
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_depth_is_respected() {
        let provider = collapsed_herd();
        let scope = FetchScope::new(&provider);
        let lineage = LineageBuilder::new(1)
            .unwrap()
            .build(&scope, &AnimalId::new("foal"))
            .await
            .unwrap();

        assert_eq!(lineage.depth_reached(), 1);
        assert!(!lineage.contains(&AnimalId::new("gs")));
    }

    #[tokio::test]
    async fn test_missing_parent_terminates_branch() {
        let provider = StubProvider::new(vec![
            Animal::new("foal", "Foal").with_sire("ghost").with_dam("d"),
            Animal::new("d", "Dam"),
        ]);
        let scope = FetchScope::new(&provider);
        let lineage = LineageBuilder::new(3)
            .unwrap()
            .build(&scope, &AnimalId::new("foal"))
            .await
            .unwrap();

        assert_eq!(lineage.stats.missing_links, 1);
        assert!(lineage.contains(&AnimalId::new("d")));
        assert!(!lineage.contains(&AnimalId::new("ghost")));
    }

    #[tokio::test]
    async fn test_unavailable_generation_is_truncated() {
        let provider = collapsed_herd().failing_on("gs");
        let scope = FetchScope::new(&provider);
        let lineage = LineageBuilder::new(3)
            .unwrap()
            .build(&scope, &AnimalId::new("foal"))
            .await
            .unwrap();

        assert_eq!(lineage.depth_reached(), 1);
        assert_eq!(scope.stats().truncated, 1);
    }

    #[tokio::test]
    async fn test_cyclic_records_do_not_loop() {
        let provider = StubProvider::new(vec![
            Animal::new("a", "A").with_sire("b"),
            Animal::new("b", "B").with_sire("a"),
        ]);
        let scope = FetchScope::new(&provider);
        let lineage = LineageBuilder::new(6)
            .unwrap()
            .build(&scope, &AnimalId::new("a"))
            .await
            .unwrap();

        assert_eq!(lineage.stats.total_nodes, 2);
        assert_eq!(lineage.stats.cyclic_links, 1);
    }

    #[tokio::test]
    async fn test_unknown_root_and_bad_depth() {
        let provider = collapsed_herd();
        let scope = FetchScope::new(&provider);

        let err = LineageBuilder::new(2)
            .unwrap()
            .build(&scope, &AnimalId::new("nobody"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        assert!(matches!(LineageBuilder::new(0), Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_view_shares_snapshot() {
        let provider = collapsed_herd();
        let scope = FetchScope::new(&provider);
        let view = LineageBuilder::new(3)
            .unwrap()
            .build_view(&scope, &[AnimalId::new("s"), AnimalId::new("d")])
            .await
            .unwrap();

        assert_eq!(view.lineages.len(), 2);
        assert_eq!(view.animals.len(), 3);

        let generations = view.generation_ids();
        assert_eq!(generations[0].len(), 2);
        assert_eq!(generations[1].len(), 1);
        assert!(view.lineage(&AnimalId::new("d")).is_some());
    }

    #[test]
    fn test_push_parent_rejects_foreign_node() {
        let mut lineage = Lineage::new(AnimalId::new("foal"), 3);
        let sire = lineage
            .push_parent(0, ParentLine::Sire, AnimalId::new("s"))
            .unwrap();
        assert_eq!(lineage.node(sire).unwrap().generation, 1);

        assert!(lineage
            .push_parent(42, ParentLine::Dam, AnimalId::new("d"))
            .is_none());
        assert!(!lineage.contains(&AnimalId::new("d")));
    }
}
