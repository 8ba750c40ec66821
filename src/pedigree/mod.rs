//! Pedigree — animal identity, ancestry traversal and inbreeding
//!
//! The pedigree graph belongs to the external animal store; this module only
//! reads it through `AncestryReader`.

mod animal;
mod inbreeding;
mod lineage;

pub use animal::{AncestryReader, Animal, AnimalId, NewAnimal, Sex};
pub use inbreeding::{AncestorContribution, InbreedingCalculator, InbreedingReport};
pub use lineage::{expand_lineage, LineageEdge, LineageIndex, RelationshipType};
