//! Locus Registry — where genes live and which alleles they have
//!
//! Chromosomes belong to a species, pairs join a maternal and a paternal
//! chromosome under an inheritance pattern, genes sit at a unique position on
//! a pair, and alleles are the variants of a gene.

mod registry;
mod types;

pub use registry::LocusRegistry;
pub use types::{
    Allele, AlleleId, Chromosome, ChromosomeArm, ChromosomeId, ChromosomePair, Gene,
    GeneCategory, GeneId, ImpactLevel, InheritancePattern, NewAllele, NewChromosome, NewGene,
    PairId, RiskLevel, Species, SpeciesId,
};
