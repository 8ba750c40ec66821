//! Lineage edges — the flattened ancestry table
//!
//! Each edge says that `ancestor_id` sits `generation` steps above
//! `animal_id`. Within a generation `sequence` is the Ahnentafel slot: the
//! dam of slot `s` lives in slot `2s` of the next generation and the sire in
//! `2s + 1`, so generation 1 is always `[dam, sire]`.

use super::animal::{AncestryReader, Animal, AnimalId};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipType {
    Maternal,
    Paternal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageEdge {
    pub animal_id: AnimalId,
    pub ancestor_id: AnimalId,
    pub generation: u32,
    pub sequence: u32,
    /// Whether the ancestor is the dam or the sire of the animal one generation below it
    pub relationship: RelationshipType,
}

/// Flatten an animal's ancestry into lineage edges, generation by generation
pub fn expand_lineage<R>(reader: &R, animal: AnimalId, max_generations: u32) -> Vec<LineageEdge>
where
    R: AncestryReader + ?Sized,
{
    let mut edges = Vec::new();
    // (slot, animal) pairs of the current generation
    let mut frontier: Vec<(u32, AnimalId)> = vec![(0, animal)];
    for generation in 1..=max_generations.min(31) {
        let mut next = Vec::new();
        for &(slot, child) in &frontier {
            let [dam, sire] = reader.parents(child);
            for (offset, parent, relationship) in [
                (0, dam, RelationshipType::Maternal),
                (1, sire, RelationshipType::Paternal),
            ] {
                let Some(parent) = parent else { continue };
                if parent == animal {
                    warn!("Animal {} appears in its own ancestry, stopping that branch", animal);
                    continue;
                }
                let sequence = slot * 2 + offset;
                edges.push(LineageEdge {
                    animal_id: animal,
                    ancestor_id: parent,
                    generation,
                    sequence,
                    relationship,
                });
                next.push((sequence, parent));
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }
    edges
}

/// An `AncestryReader` over an externally supplied lineage table
#[derive(Debug, Clone, Default)]
pub struct LineageIndex {
    animals: HashMap<AnimalId, Animal>,
    parents: HashMap<AnimalId, [Option<AnimalId>; 2]>,
}

impl LineageIndex {
    /// Rebuild parent links from lineage rows.
    ///
    /// Rows with generation 0 are malformed and skipped. When rows disagree
    /// about a parent, the row from the lowest animal id wins, then the
    /// shallowest generation.
    pub fn new(
        animals: impl IntoIterator<Item = Animal>,
        edges: impl IntoIterator<Item = LineageEdge>,
    ) -> Self {
        let animals: HashMap<AnimalId, Animal> = animals.into_iter().map(|a| (a.id, a)).collect();
        let mut by_animal: BTreeMap<AnimalId, BTreeMap<(u32, u32), AnimalId>> = BTreeMap::new();
        for edge in edges {
            if edge.generation == 0 {
                warn!(
                    "Lineage row {} -> {} has generation 0, skipping",
                    edge.animal_id, edge.ancestor_id
                );
                continue;
            }
            by_animal
                .entry(edge.animal_id)
                .or_default()
                .insert((edge.generation, edge.sequence), edge.ancestor_id);
        }

        let mut parents: HashMap<AnimalId, [Option<AnimalId>; 2]> = HashMap::new();
        for (&animal, slots) in &by_animal {
            for (&(generation, sequence), &ancestor) in slots {
                let child = if generation == 1 {
                    Some(animal)
                } else {
                    slots.get(&(generation - 1, sequence / 2)).copied()
                };
                if let Some(child) = child {
                    let entry = parents.entry(child).or_insert([None, None]);
                    let side = (sequence % 2) as usize;
                    entry[side].get_or_insert(ancestor);
                }
            }
        }
        Self { animals, parents }
    }

    fn parent(&self, animal: AnimalId, side: usize) -> Option<Animal> {
        let id = self.parents.get(&animal)?[side]?;
        self.animals.get(&id).cloned()
    }
}

impl AncestryReader for LineageIndex {
    fn dam(&self, animal: AnimalId) -> Option<Animal> {
        self.parent(animal, 0)
    }

    fn sire(&self, animal: AnimalId) -> Option<Animal> {
        self.parent(animal, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pedigree::Sex;

    fn animal(id: AnimalId, sex: Sex, dam: Option<AnimalId>, sire: Option<AnimalId>) -> Animal {
        Animal {
            id,
            name: format!("A{}", id),
            species_id: 1,
            sex,
            dam_id: dam,
            sire_id: sire,
        }
    }

    struct Herd(HashMap<AnimalId, Animal>);

    impl AncestryReader for Herd {
        fn dam(&self, id: AnimalId) -> Option<Animal> {
            self.0.get(&self.0.get(&id)?.dam_id?).cloned()
        }
        fn sire(&self, id: AnimalId) -> Option<Animal> {
            self.0.get(&self.0.get(&id)?.sire_id?).cloned()
        }
    }

    fn three_generations() -> Vec<Animal> {
        vec![
            animal(1, Sex::Female, None, None),
            animal(2, Sex::Male, None, None),
            animal(3, Sex::Female, Some(1), Some(2)),
            animal(4, Sex::Male, None, None),
            animal(5, Sex::Female, Some(3), Some(4)),
        ]
    }

    #[test]
    fn test_expand_lineage_slots() {
        let herd = Herd(three_generations().into_iter().map(|a| (a.id, a)).collect());
        let edges = expand_lineage(&herd, 5, 6);
        assert_eq!(edges.len(), 4);

        let slot = |g: u32, s: u32| edges.iter().find(|e| e.generation == g && e.sequence == s).map(|e| e.ancestor_id);
        assert_eq!(slot(1, 0), Some(3));
        assert_eq!(slot(1, 1), Some(4));
        assert_eq!(slot(2, 0), Some(1));
        assert_eq!(slot(2, 1), Some(2));
        assert!(edges.iter().filter(|e| e.generation == 2).all(|e| e.animal_id == 5));
    }

    #[test]
    fn test_expand_respects_depth() {
        let herd = Herd(three_generations().into_iter().map(|a| (a.id, a)).collect());
        let edges = expand_lineage(&herd, 5, 1);
        assert_eq!(edges.len(), 2);
    }

    #[test]
    fn test_index_rebuilds_parents_from_deep_edges() {
        let animals = three_generations();
        let herd = Herd(animals.iter().cloned().map(|a| (a.id, a)).collect());
        // only the youngest animal's lineage rows are supplied
        let edges = expand_lineage(&herd, 5, 6);
        let index = LineageIndex::new(animals, edges);

        assert_eq!(index.dam(5).unwrap().id, 3);
        assert_eq!(index.sire(5).unwrap().id, 4);
        assert_eq!(index.dam(3).unwrap().id, 1);
        assert_eq!(index.sire(3).unwrap().id, 2);
        assert!(index.dam(1).is_none());
    }

    #[test]
    fn test_generation_zero_rows_skipped() {
        let animals = three_generations();
        let edges = vec![
            LineageEdge { animal_id: 5, ancestor_id: 1, generation: 0, sequence: 0, relationship: RelationshipType::Maternal },
            LineageEdge { animal_id: 5, ancestor_id: 3, generation: 1, sequence: 0, relationship: RelationshipType::Maternal },
            LineageEdge { animal_id: 5, ancestor_id: 4, generation: 1, sequence: 1, relationship: RelationshipType::Paternal },
        ];
        let index = LineageIndex::new(animals, edges);

        assert_eq!(index.dam(5).unwrap().id, 3);
        assert_eq!(index.sire(5).unwrap().id, 4);
        assert!(index.dam(3).is_none());
    }

    #[test]
    fn test_conflicting_rows_resolve_by_animal_order() {
        let animals = vec![
            animal(1, Sex::Female, None, None),
            animal(7, Sex::Female, None, None),
            animal(3, Sex::Female, None, None),
            animal(10, Sex::Male, Some(3), None),
            animal(20, Sex::Male, Some(3), None),
        ];
        let row = |animal_id, ancestor_id, generation, sequence| LineageEdge {
            animal_id,
            ancestor_id,
            generation,
            sequence,
            relationship: RelationshipType::Maternal,
        };
        // animal 10 says 3's dam is 1, animal 20 says it is 7
        let forward = vec![row(10, 3, 1, 0), row(10, 1, 2, 0), row(20, 3, 1, 0), row(20, 7, 2, 0)];
        let mut backward = forward.clone();
        backward.reverse();

        for edges in [forward, backward] {
            let index = LineageIndex::new(animals.clone(), edges);
            assert_eq!(index.dam(3).unwrap().id, 1);
            assert_eq!(index.dam(20).unwrap().id, 3);
        }
    }
}
