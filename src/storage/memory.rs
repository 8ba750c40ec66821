//! In-memory store with a checksummed JSON snapshot
//!
//! Every insert runs its uniqueness check and write under the same `&mut self`
//! borrow, so two writers can never both pass the check. Share it across
//! threads behind a `Mutex`.

use super::{AnimalDirectory, GeneticsStore};
use crate::error::{EntityKind, GeneticsError, GeneticsResult};
use crate::genotype::{Genotype, GenotypeDraft, GenotypeId};
use crate::labels::{AnimalTrait, NewTraitLabel, TraitLabel, TraitLabelId, TraitLabelStore, TraitType, TraitTypeId};
use crate::locus::{
    Allele, AlleleId, Chromosome, ChromosomeId, ChromosomePair, Gene, GeneId, InheritancePattern,
    NewAllele, NewChromosome, NewGene, PairId, Species, SpeciesId,
};
use crate::pedigree::{AncestryReader, Animal, AnimalId, NewAnimal};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMetadata {
    pub created_at: DateTime<Utc>,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub total_writes: u64,
}

impl Default for StoreMetadata {
    fn default() -> Self {
        Self {
            created_at: Utc::now(),
            last_saved_at: None,
            total_writes: 0,
        }
    }
}

/// On-disk envelope: the store as JSON plus its SHA-256
#[derive(Serialize, Deserialize)]
struct Snapshot {
    checksum: String,
    store: serde_json::Value,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    next_id: u64,
    species: BTreeMap<SpeciesId, Species>,
    chromosomes: BTreeMap<ChromosomeId, Chromosome>,
    pairs: BTreeMap<PairId, ChromosomePair>,
    genes: BTreeMap<GeneId, Gene>,
    alleles: BTreeMap<AlleleId, Allele>,
    genotypes: BTreeMap<GenotypeId, Genotype>,
    animals: BTreeMap<AnimalId, Animal>,
    trait_types: BTreeMap<TraitTypeId, TraitType>,
    trait_labels: BTreeMap<TraitLabelId, TraitLabel>,
    animal_traits: Vec<AnimalTrait>,
    pub metadata: StoreMetadata,
    #[serde(skip)]
    path: Option<PathBuf>,
}

fn checksum(json: &str) -> String {
    hex::encode(Sha256::digest(json.as_bytes()))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a snapshot, or start empty when the file does not exist yet.
    ///
    /// A snapshot whose checksum does not match its content is rejected.
    pub fn open(path: impl AsRef<Path>) -> GeneticsResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            info!("No store at {}, starting empty", path.display());
            return Ok(Self {
                path: Some(path),
                ..Self::default()
            });
        }
        let data = std::fs::read_to_string(&path)?;
        let snapshot: Snapshot = serde_json::from_str(&data)?;
        let body = serde_json::to_string(&snapshot.store)?;
        let actual = checksum(&body);
        if actual != snapshot.checksum {
            return Err(GeneticsError::Integrity(format!(
                "snapshot {} checksum mismatch: expected {}, got {}",
                path.display(),
                snapshot.checksum,
                actual
            )));
        }
        let mut store: MemoryStore = serde_json::from_value(snapshot.store)?;
        store.path = Some(path);
        info!(
            "Loaded store: {} genes, {} alleles, {} genotypes, {} animals",
            store.genes.len(),
            store.alleles.len(),
            store.genotypes.len(),
            store.animals.len()
        );
        Ok(store)
    }

    /// Write the snapshot back to the path it was opened from
    pub fn save(&mut self) -> GeneticsResult<()> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| GeneticsError::invalid("path", "store was not opened from a file"))?;
        self.save_to(path)
    }

    pub fn save_to(&mut self, path: impl AsRef<Path>) -> GeneticsResult<()> {
        self.metadata.last_saved_at = Some(Utc::now());
        let store = serde_json::to_value(&*self)?;
        let body = serde_json::to_string(&store)?;
        let snapshot = Snapshot {
            checksum: checksum(&body),
            store,
        };
        std::fs::write(path.as_ref(), serde_json::to_string_pretty(&snapshot)?)?;
        Ok(())
    }

    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.metadata.total_writes += 1;
        self.next_id
    }

    /// Register an animal. Parents must already be known.
    pub fn add_animal(&mut self, new: NewAnimal) -> GeneticsResult<Animal> {
        if new.name.trim().is_empty() {
            return Err(GeneticsError::MissingField("name"));
        }
        if !self.species.contains_key(&new.species_id) {
            return Err(GeneticsError::not_found(EntityKind::Species, new.species_id));
        }
        for parent in [new.dam_id, new.sire_id].into_iter().flatten() {
            if !self.animals.contains_key(&parent) {
                return Err(GeneticsError::not_found(EntityKind::Animal, parent));
            }
        }
        let animal = Animal {
            id: self.allocate(),
            name: new.name,
            species_id: new.species_id,
            sex: new.sex,
            dam_id: new.dam_id,
            sire_id: new.sire_id,
        };
        self.animals.insert(animal.id, animal.clone());
        Ok(animal)
    }

    pub fn animals(&self) -> impl Iterator<Item = &Animal> {
        self.animals.values()
    }
}

impl GeneticsStore for MemoryStore {
    fn insert_species(&mut self, common_name: &str, scientific_name: &str) -> GeneticsResult<Species> {
        let species = Species {
            id: self.allocate(),
            common_name: common_name.to_string(),
            scientific_name: scientific_name.to_string(),
        };
        self.species.insert(species.id, species.clone());
        Ok(species)
    }

    fn species(&self, id: SpeciesId) -> Option<Species> {
        self.species.get(&id).cloned()
    }

    fn all_species(&self) -> Vec<Species> {
        self.species.values().cloned().collect()
    }

    fn insert_chromosome(&mut self, new: NewChromosome) -> GeneticsResult<Chromosome> {
        if self
            .chromosomes
            .values()
            .any(|c| c.species_id == new.species_id && c.number == new.number)
        {
            return Err(GeneticsError::DuplicateChromosome {
                species_id: new.species_id,
                number: new.number,
            });
        }
        let chromosome = Chromosome {
            id: self.allocate(),
            species_id: new.species_id,
            name: new.name,
            number: new.number,
            arm: new.arm,
            region: new.region,
            description: new.description,
        };
        self.chromosomes.insert(chromosome.id, chromosome.clone());
        Ok(chromosome)
    }

    fn chromosome(&self, id: ChromosomeId) -> Option<Chromosome> {
        self.chromosomes.get(&id).cloned()
    }

    fn chromosomes_for_species(&self, species: SpeciesId) -> Vec<Chromosome> {
        let mut found: Vec<Chromosome> = self
            .chromosomes
            .values()
            .filter(|c| c.species_id == species)
            .cloned()
            .collect();
        found.sort_by_key(|c| c.number);
        found
    }

    fn insert_chromosome_pair(
        &mut self,
        species: SpeciesId,
        maternal: ChromosomeId,
        paternal: ChromosomeId,
        pattern: InheritancePattern,
    ) -> GeneticsResult<ChromosomePair> {
        let pair = ChromosomePair {
            id: self.allocate(),
            species_id: species,
            maternal_chromosome_id: maternal,
            paternal_chromosome_id: paternal,
            inheritance_pattern: pattern,
        };
        self.pairs.insert(pair.id, pair.clone());
        Ok(pair)
    }

    fn update_chromosome_pair(&mut self, id: PairId, pattern: InheritancePattern) -> GeneticsResult<ChromosomePair> {
        let pair = self
            .pairs
            .get_mut(&id)
            .ok_or_else(|| GeneticsError::not_found(EntityKind::ChromosomePair, id))?;
        pair.inheritance_pattern = pattern;
        let updated = pair.clone();
        self.metadata.total_writes += 1;
        Ok(updated)
    }

    fn chromosome_pair(&self, id: PairId) -> Option<ChromosomePair> {
        self.pairs.get(&id).cloned()
    }

    fn chromosome_pairs(&self) -> Vec<ChromosomePair> {
        self.pairs.values().cloned().collect()
    }

    fn insert_gene(&mut self, new: NewGene) -> GeneticsResult<Gene> {
        if let Some(occupant) = self
            .genes
            .values()
            .find(|g| g.pair_id == new.pair_id && g.position == new.position)
        {
            return Err(GeneticsError::DuplicatePosition {
                pair_id: new.pair_id,
                position: new.position,
                occupant: occupant.name.clone(),
            });
        }
        if self.genes.values().any(|g| g.name == new.name) {
            return Err(GeneticsError::DuplicateGeneName(new.name));
        }
        let gene = Gene {
            id: self.allocate(),
            pair_id: new.pair_id,
            name: new.name,
            common_name: new.common_name,
            position: new.position,
            category: new.category,
            impact_level: new.impact_level,
            expression_age: new.expression_age,
            penetrance: new.penetrance,
            expressivity: new.expressivity,
            requires_monitoring: new.requires_monitoring,
        };
        self.genes.insert(gene.id, gene.clone());
        Ok(gene)
    }

    fn gene(&self, id: GeneId) -> Option<Gene> {
        self.genes.get(&id).cloned()
    }

    fn genes(&self) -> Vec<Gene> {
        self.genes.values().cloned().collect()
    }

    fn insert_allele(&mut self, new: NewAllele) -> GeneticsResult<Allele> {
        let siblings = self.alleles.values().filter(|a| a.gene_id == new.gene_id);
        for existing in siblings {
            if existing.symbol == new.symbol {
                return Err(GeneticsError::DuplicateSymbol {
                    gene_id: new.gene_id,
                    symbol: new.symbol,
                });
            }
            if new.is_wild_type && existing.is_wild_type {
                return Err(GeneticsError::SecondWildType {
                    gene_id: new.gene_id,
                    existing: existing.symbol.clone(),
                });
            }
        }
        let allele = Allele {
            id: self.allocate(),
            gene_id: new.gene_id,
            symbol: new.symbol,
            name: new.name,
            is_wild_type: new.is_wild_type,
            phenotype: new.phenotype,
            risk_level: new.risk_level,
            management_notes: new.management_notes,
        };
        self.alleles.insert(allele.id, allele.clone());
        Ok(allele)
    }

    fn allele(&self, id: AlleleId) -> Option<Allele> {
        self.alleles.get(&id).cloned()
    }

    fn alleles_for_gene(&self, gene: GeneId) -> Vec<Allele> {
        self.alleles.values().filter(|a| a.gene_id == gene).cloned().collect()
    }

    fn upsert_genotype(&mut self, draft: GenotypeDraft) -> GeneticsResult<Genotype> {
        let existing = self
            .genotypes
            .values_mut()
            .find(|g| g.animal_id == draft.animal_id && g.pair_id == draft.pair_id);
        if let Some(genotype) = existing {
            genotype.maternal_allele_id = draft.maternal_allele_id;
            genotype.paternal_allele_id = draft.paternal_allele_id;
            genotype.updated_at = Some(Utc::now());
            let updated = genotype.clone();
            self.metadata.total_writes += 1;
            return Ok(updated);
        }
        let genotype = Genotype {
            id: self.allocate(),
            animal_id: draft.animal_id,
            pair_id: draft.pair_id,
            maternal_allele_id: draft.maternal_allele_id,
            paternal_allele_id: draft.paternal_allele_id,
            assigned_at: Utc::now(),
            updated_at: None,
        };
        self.genotypes.insert(genotype.id, genotype.clone());
        Ok(genotype)
    }

    fn genotype(&self, animal: AnimalId, pair: PairId) -> Option<Genotype> {
        self.genotypes
            .values()
            .find(|g| g.animal_id == animal && g.pair_id == pair)
            .cloned()
    }

    fn genotypes_for_animal(&self, animal: AnimalId) -> Vec<Genotype> {
        self.genotypes
            .values()
            .filter(|g| g.animal_id == animal)
            .cloned()
            .collect()
    }
}

impl AnimalDirectory for MemoryStore {
    fn animal(&self, id: AnimalId) -> Option<Animal> {
        self.animals.get(&id).cloned()
    }
}

impl AncestryReader for MemoryStore {
    fn dam(&self, animal: AnimalId) -> Option<Animal> {
        let dam = self.animals.get(&animal)?.dam_id?;
        self.animals.get(&dam).cloned()
    }

    fn sire(&self, animal: AnimalId) -> Option<Animal> {
        let sire = self.animals.get(&animal)?.sire_id?;
        self.animals.get(&sire).cloned()
    }
}

impl TraitLabelStore for MemoryStore {
    fn insert_trait_type(&mut self, name: &str) -> GeneticsResult<TraitType> {
        if self.trait_types.values().any(|t| t.name.eq_ignore_ascii_case(name)) {
            return Err(GeneticsError::invalid("trait type", format!("'{}' already exists", name)));
        }
        let trait_type = TraitType {
            id: self.allocate(),
            name: name.to_string(),
        };
        self.trait_types.insert(trait_type.id, trait_type.clone());
        Ok(trait_type)
    }

    fn trait_type(&self, id: TraitTypeId) -> Option<TraitType> {
        self.trait_types.get(&id).cloned()
    }

    fn insert_trait_label(&mut self, new: NewTraitLabel) -> GeneticsResult<TraitLabel> {
        if self.trait_labels.values().any(|t| {
            t.species_id == new.species_id
                && t.trait_type_id == new.trait_type_id
                && t.name.eq_ignore_ascii_case(&new.name)
        }) {
            return Err(GeneticsError::invalid(
                "trait",
                format!("'{}' already exists for this species and type", new.name),
            ));
        }
        let label = TraitLabel {
            id: self.allocate(),
            species_id: new.species_id,
            trait_type_id: new.trait_type_id,
            name: new.name,
            description: new.description,
        };
        self.trait_labels.insert(label.id, label.clone());
        Ok(label)
    }

    fn trait_label(&self, id: TraitLabelId) -> Option<TraitLabel> {
        self.trait_labels.get(&id).cloned()
    }

    fn trait_labels_for_species(&self, species: SpeciesId) -> Vec<TraitLabel> {
        self.trait_labels
            .values()
            .filter(|t| t.species_id == species)
            .cloned()
            .collect()
    }

    fn insert_animal_trait(&mut self, animal: AnimalId, label: TraitLabelId) -> GeneticsResult<AnimalTrait> {
        let link = AnimalTrait {
            animal_id: animal,
            trait_id: label,
        };
        if !self.animal_traits.contains(&link) {
            self.animal_traits.push(link.clone());
            self.metadata.total_writes += 1;
        }
        Ok(link)
    }

    fn trait_labels_for_animal(&self, animal: AnimalId) -> Vec<TraitLabel> {
        self.animal_traits
            .iter()
            .filter(|link| link.animal_id == animal)
            .filter_map(|link| self.trait_labels.get(&link.trait_id).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pedigree::Sex;

    fn test_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mendel-store-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn populated() -> MemoryStore {
        let mut store = MemoryStore::new();
        let species = store.insert_species("Cat", "Felis catus").unwrap();
        let queen = store.add_animal(NewAnimal::new("Queen", species.id, Sex::Female)).unwrap();
        let tom = store.add_animal(NewAnimal::new("Tom", species.id, Sex::Male)).unwrap();
        store
            .add_animal(NewAnimal::new("Kitten", species.id, Sex::Female).with_parents(Some(queen.id), Some(tom.id)))
            .unwrap();
        store
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = test_dir();
        let path = dir.join("store.json");

        let mut store = populated();
        store.save_to(&path).unwrap();

        let loaded = MemoryStore::open(&path).unwrap();
        assert_eq!(loaded.animals().count(), 3);
        let kitten = loaded.animals().find(|a| a.name == "Kitten").unwrap();
        assert_eq!(loaded.dam(kitten.id).unwrap().name, "Queen");
        assert_eq!(loaded.sire(kitten.id).unwrap().name, "Tom");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_tampered_snapshot_rejected() {
        let dir = test_dir();
        let path = dir.join("store.json");
        populated().save_to(&path).unwrap();

        let data = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, data.replace("Kitten", "Kitteh")).unwrap();

        let err = MemoryStore::open(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataIntegrity);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_open_missing_then_save() {
        let dir = test_dir();
        let path = dir.join("fresh.json");
        let mut store = MemoryStore::open(&path).unwrap();
        store.insert_species("Horse", "Equus caballus").unwrap();
        store.save().unwrap();
        assert_eq!(MemoryStore::open(&path).unwrap().all_species().len(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_add_animal_requires_known_parents() {
        let mut store = MemoryStore::new();
        let species = store.insert_species("Cat", "Felis catus").unwrap();
        let err = store
            .add_animal(NewAnimal::new("Orphan", species.id, Sex::Male).with_parents(Some(999), None))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
