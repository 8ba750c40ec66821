//! Store capabilities consumed by the engine
//!
//! The engine never owns persistence. Every logical operation is handed the
//! store it works against, and the store is responsible for making each
//! insert's uniqueness check and write a single step. `MemoryStore` is the
//! in-process reference implementation, persisted as a checksummed JSON
//! snapshot.

mod memory;

pub use memory::{MemoryStore, StoreMetadata};

use crate::error::GeneticsResult;
use crate::genotype::{Genotype, GenotypeDraft};
use crate::locus::{
    Allele, AlleleId, Chromosome, ChromosomeId, ChromosomePair, Gene, GeneId,
    InheritancePattern, NewAllele, NewChromosome, NewGene, PairId, Species, SpeciesId,
};
use crate::pedigree::{Animal, AnimalId};

/// Persistence for locus registry and genotype records
///
/// Insert methods must reject duplicates atomically:
/// - `(species, number)` for chromosomes
/// - `(pair, position)` and `name` for genes
/// - `(gene, symbol)` and a second wild-type for alleles
/// - `(animal, pair)` for genotypes, where a second write updates in place
pub trait GeneticsStore {
    fn insert_species(&mut self, common_name: &str, scientific_name: &str) -> GeneticsResult<Species>;
    fn species(&self, id: SpeciesId) -> Option<Species>;
    fn all_species(&self) -> Vec<Species>;

    fn insert_chromosome(&mut self, new: NewChromosome) -> GeneticsResult<Chromosome>;
    fn chromosome(&self, id: ChromosomeId) -> Option<Chromosome>;
    fn chromosomes_for_species(&self, species: SpeciesId) -> Vec<Chromosome>;

    fn insert_chromosome_pair(
        &mut self,
        species: SpeciesId,
        maternal: ChromosomeId,
        paternal: ChromosomeId,
        pattern: InheritancePattern,
    ) -> GeneticsResult<ChromosomePair>;
    fn update_chromosome_pair(
        &mut self,
        id: PairId,
        pattern: InheritancePattern,
    ) -> GeneticsResult<ChromosomePair>;
    fn chromosome_pair(&self, id: PairId) -> Option<ChromosomePair>;
    fn chromosome_pairs(&self) -> Vec<ChromosomePair>;

    fn insert_gene(&mut self, new: NewGene) -> GeneticsResult<Gene>;
    fn gene(&self, id: GeneId) -> Option<Gene>;
    fn genes(&self) -> Vec<Gene>;

    fn insert_allele(&mut self, new: NewAllele) -> GeneticsResult<Allele>;
    fn allele(&self, id: AlleleId) -> Option<Allele>;
    fn alleles_for_gene(&self, gene: GeneId) -> Vec<Allele>;

    fn upsert_genotype(&mut self, draft: GenotypeDraft) -> GeneticsResult<Genotype>;
    fn genotype(&self, animal: AnimalId, pair: PairId) -> Option<Genotype>;
    fn genotypes_for_animal(&self, animal: AnimalId) -> Vec<Genotype>;

    fn gene_by_name(&self, name: &str) -> Option<Gene> {
        self.genes().into_iter().find(|g| g.name == name)
    }

    fn genes_for_pair(&self, pair: PairId) -> Vec<Gene> {
        let mut genes: Vec<Gene> = self.genes().into_iter().filter(|g| g.pair_id == pair).collect();
        genes.sort_by_key(|g| g.position);
        genes
    }

    fn allele_by_symbol(&self, gene: GeneId, symbol: &str) -> Option<Allele> {
        self.alleles_for_gene(gene).into_iter().find(|a| a.symbol == symbol)
    }
}

/// Animal identity source
pub trait AnimalDirectory {
    fn animal(&self, id: AnimalId) -> Option<Animal>;
}
