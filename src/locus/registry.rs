//! Locus Registry — chromosomes, pairs, genes and alleles
//!
//! The registry validates references and closed-set values, then hands the
//! write to the store, which owns the uniqueness check. It borrows the store
//! for the lifetime of one logical unit of work.

use super::types::*;
use crate::error::{EntityKind, GeneticsError, GeneticsResult};
use crate::storage::GeneticsStore;
use log::info;

pub struct LocusRegistry<'a, S: GeneticsStore + ?Sized> {
    store: &'a mut S,
}

fn required(value: &str, field: &'static str) -> GeneticsResult<()> {
    if value.trim().is_empty() {
        Err(GeneticsError::MissingField(field))
    } else {
        Ok(())
    }
}

impl<'a, S: GeneticsStore + ?Sized> LocusRegistry<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    pub fn create_species(&mut self, common_name: &str, scientific_name: &str) -> GeneticsResult<Species> {
        required(common_name, "common_name")?;
        let species = self.store.insert_species(common_name.trim(), scientific_name.trim())?;
        info!("Registered species {} ({})", species.common_name, species.id);
        Ok(species)
    }

    pub fn list_species(&self) -> Vec<Species> {
        self.store.all_species()
    }

    /// Register a chromosome. Fails if the species already has one with the same number.
    pub fn create_chromosome(&mut self, new: NewChromosome) -> GeneticsResult<Chromosome> {
        required(&new.name, "name")?;
        self.require_species(new.species_id)?;
        let chromosome = self.store.insert_chromosome(new)?;
        info!(
            "Registered chromosome {} (#{}) for species {}",
            chromosome.name, chromosome.number, chromosome.species_id
        );
        Ok(chromosome)
    }

    pub fn chromosomes_for_species(&self, species: SpeciesId) -> Vec<Chromosome> {
        self.store.chromosomes_for_species(species)
    }

    /// Pair two existing chromosomes of one species under an inheritance pattern.
    ///
    /// The pattern string must name one of the closed set of patterns.
    pub fn create_chromosome_pair(
        &mut self,
        maternal: ChromosomeId,
        paternal: ChromosomeId,
        pattern: &str,
    ) -> GeneticsResult<ChromosomePair> {
        let pattern: InheritancePattern = pattern.parse()?;
        let m = self.require_chromosome(maternal)?;
        let p = self.require_chromosome(paternal)?;
        if m.species_id != p.species_id {
            return Err(GeneticsError::CrossSpecies(format!(
                "maternal chromosome {} is species {}, paternal chromosome {} is species {}",
                m.id, m.species_id, p.id, p.species_id
            )));
        }
        let pair = self.store.insert_chromosome_pair(m.species_id, m.id, p.id, pattern)?;
        info!("Created chromosome pair {} ({}) from {} + {}", pair.id, pattern, m.name, p.name);
        Ok(pair)
    }

    /// The explicit update path for a pair's inheritance pattern
    pub fn update_inheritance_pattern(&mut self, pair: PairId, pattern: &str) -> GeneticsResult<ChromosomePair> {
        let pattern: InheritancePattern = pattern.parse()?;
        let updated = self.store.update_chromosome_pair(pair, pattern)?;
        info!("Chromosome pair {} now {}", pair, pattern);
        Ok(updated)
    }

    pub fn chromosome_pairs(&self) -> Vec<ChromosomePair> {
        self.store.chromosome_pairs()
    }

    /// Place a gene on a pair. Fails if the position on that pair is taken.
    pub fn create_gene(&mut self, new: NewGene) -> GeneticsResult<Gene> {
        required(&new.name, "name")?;
        self.require_pair(new.pair_id)?;
        let gene = self.store.insert_gene(new)?;
        info!(
            "Registered gene {} at position {} on pair {} ({}, {})",
            gene.name, gene.position, gene.pair_id, gene.category, gene.impact_level
        );
        Ok(gene)
    }

    pub fn genes_for_pair(&self, pair: PairId) -> Vec<Gene> {
        self.store.genes_for_pair(pair)
    }

    pub fn gene_by_name(&self, name: &str) -> Option<Gene> {
        self.store.gene_by_name(name)
    }

    pub fn genes_by(&self, category: GeneCategory, impact: ImpactLevel) -> Vec<Gene> {
        self.store
            .genes()
            .into_iter()
            .filter(|g| g.category == category && g.impact_level == impact)
            .collect()
    }

    pub fn monitored_genes(&self) -> Vec<Gene> {
        self.store.genes().into_iter().filter(|g| g.requires_monitoring).collect()
    }

    /// Add an allele to a gene.
    ///
    /// Symbols are unique per gene and a gene carries at most one wild-type.
    pub fn create_allele(&mut self, new: NewAllele) -> GeneticsResult<Allele> {
        required(&new.symbol, "symbol")?;
        required(&new.name, "name")?;
        let gene = self.require_gene(new.gene_id)?;
        let allele = self.store.insert_allele(new)?;
        info!(
            "Registered allele {} ({}) for gene {}{}",
            allele.symbol,
            allele.name,
            gene.name,
            if allele.is_wild_type { " [wild-type]" } else { "" }
        );
        Ok(allele)
    }

    pub fn alleles_for_gene(&self, gene: GeneId) -> Vec<Allele> {
        self.store.alleles_for_gene(gene)
    }

    /// Look up an allele by symbol. An unknown symbol is `Ok(None)`;
    /// an unknown gene is an error.
    pub fn allele_by_symbol(&self, gene: GeneId, symbol: &str) -> GeneticsResult<Option<Allele>> {
        self.require_gene(gene)?;
        Ok(self.store.allele_by_symbol(gene, symbol))
    }

    pub fn wild_type(&self, gene: GeneId) -> Option<Allele> {
        self.store.alleles_for_gene(gene).into_iter().find(|a| a.is_wild_type)
    }

    fn require_species(&self, id: SpeciesId) -> GeneticsResult<Species> {
        self.store
            .species(id)
            .ok_or_else(|| GeneticsError::not_found(EntityKind::Species, id))
    }

    fn require_chromosome(&self, id: ChromosomeId) -> GeneticsResult<Chromosome> {
        self.store
            .chromosome(id)
            .ok_or_else(|| GeneticsError::not_found(EntityKind::Chromosome, id))
    }

    fn require_pair(&self, id: PairId) -> GeneticsResult<ChromosomePair> {
        self.store
            .chromosome_pair(id)
            .ok_or_else(|| GeneticsError::not_found(EntityKind::ChromosomePair, id))
    }

    fn require_gene(&self, id: GeneId) -> GeneticsResult<Gene> {
        self.store
            .gene(id)
            .ok_or_else(|| GeneticsError::not_found(EntityKind::Gene, id))
    }
}
