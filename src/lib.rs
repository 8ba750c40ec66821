//! Mendel — breeding genetics engine
//!
//! Registers the genetic architecture of a species (chromosomes, pairs,
//! genes, alleles), records per-animal genotypes, predicts offspring
//! genotype and phenotype odds, computes Wright's coefficient of inbreeding
//! over a pedigree, and assesses whether two animals make a suitable pair.

pub mod breeding;
pub mod config;
pub mod error;
pub mod genotype;
pub mod labels;
pub mod locus;
pub mod pedigree;
pub mod storage;

pub use breeding::{validate_breeding_pair, BreedingAssessment, OffspringEngine, OffspringReport};
pub use config::BreedingConfig;
pub use error::{GeneticsError, GeneticsResult};
pub use locus::LocusRegistry;
pub use pedigree::InbreedingCalculator;
pub use storage::{GeneticsStore, MemoryStore};
