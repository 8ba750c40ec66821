//! Breeding — offspring odds, litter simulation and pairing assessment

mod compatibility;
mod litter;
mod offspring;

pub use compatibility::{validate_breeding_pair, BreedingAssessment, Blocker, CompatibilityValidator, Risk};
pub use litter::{simulate_litter, tally, SimulatedOffspring};
pub use offspring::{
    calculate_offspring_probabilities, predict_locus, CombinedPhenotype, GeneOdds, GenePrediction,
    GeneProbabilities, GenotypeOutcome, LocusDistribution, OffspringEngine, OffspringReport,
    ParentAlleles, PhenotypeClass, MAX_COMBINED_PHENOTYPES,
};
