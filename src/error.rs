//! Error types for the breeding engine
//!
//! Registry and genotype mutations surface every failure to the caller.
//! Calculators never fail for missing pedigree or genotype data; they
//! report "unknown" or zero instead, so nothing here models that case.

use std::fmt;

/// Entity kinds used in not-found reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Species,
    Chromosome,
    ChromosomePair,
    Gene,
    Allele,
    Animal,
    TraitType,
    Trait,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Species => "species",
            EntityKind::Chromosome => "chromosome",
            EntityKind::ChromosomePair => "chromosome pair",
            EntityKind::Gene => "gene",
            EntityKind::Allele => "allele",
            EntityKind::Animal => "animal",
            EntityKind::TraitType => "trait type",
            EntityKind::Trait => "trait",
        };
        f.write_str(name)
    }
}

/// Coarse classification of a [`GeneticsError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input the caller can correct
    Validation,
    /// A referenced entity does not exist
    NotFound,
    /// An invariant the stored data must hold was about to be broken
    DataIntegrity,
    /// Snapshot I/O or serialization
    Storage,
}

/// Main error type for registry, genotype and store operations
#[derive(Debug, thiserror::Error)]
pub enum GeneticsError {
    #[error("Chromosome {number} already exists for species {species_id}")]
    DuplicateChromosome { species_id: u64, number: u32 },

    #[error("Position {position} on chromosome pair {pair_id} is already occupied by gene '{occupant}'")]
    DuplicatePosition {
        pair_id: u64,
        position: i32,
        occupant: String,
    },

    #[error("Gene name '{0}' is already registered")]
    DuplicateGeneName(String),

    #[error("Allele symbol '{symbol}' already exists for gene {gene_id}")]
    DuplicateSymbol { gene_id: u64, symbol: String },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Unknown {kind} value: '{value}'")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("Allele {allele_id} belongs to gene {gene_id}, which is not on chromosome pair {pair_id}")]
    CrossLocusMismatch {
        pair_id: u64,
        allele_id: u64,
        gene_id: u64,
    },

    #[error("Maternal allele {maternal_allele_id} and paternal allele {paternal_allele_id} belong to different genes")]
    MixedGenes {
        maternal_allele_id: u64,
        paternal_allele_id: u64,
    },

    #[error("Species mismatch: {0}")]
    CrossSpecies(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("Gene {gene_id} already has a wild-type allele ('{existing}')")]
    SecondWildType { gene_id: u64, existing: String },

    #[error("Data integrity violation: {0}")]
    Integrity(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for engine operations
pub type GeneticsResult<T> = Result<T, GeneticsError>;

impl GeneticsError {
    /// Create a not-found error
    pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Create an unknown closed-set value error
    pub fn unknown(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownVariant {
            kind,
            value: value.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GeneticsError::DuplicateChromosome { .. }
            | GeneticsError::DuplicatePosition { .. }
            | GeneticsError::DuplicateGeneName(_)
            | GeneticsError::DuplicateSymbol { .. }
            | GeneticsError::MissingField(_)
            | GeneticsError::UnknownVariant { .. }
            | GeneticsError::CrossLocusMismatch { .. }
            | GeneticsError::MixedGenes { .. }
            | GeneticsError::CrossSpecies(_)
            | GeneticsError::InvalidValue { .. } => ErrorKind::Validation,
            GeneticsError::NotFound { .. } => ErrorKind::NotFound,
            GeneticsError::SecondWildType { .. } | GeneticsError::Integrity(_) => {
                ErrorKind::DataIntegrity
            }
            GeneticsError::Io(_) | GeneticsError::Serialization(_) => ErrorKind::Storage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let e = GeneticsError::DuplicatePosition {
            pair_id: 1,
            position: 4,
            occupant: "MC1R".into(),
        };
        assert_eq!(e.kind(), ErrorKind::Validation);
        assert_eq!(
            GeneticsError::not_found(EntityKind::Gene, 7).kind(),
            ErrorKind::NotFound
        );
        let wt = GeneticsError::SecondWildType {
            gene_id: 2,
            existing: "+".into(),
        };
        assert_eq!(wt.kind(), ErrorKind::DataIntegrity);
    }

    #[test]
    fn test_not_found_message() {
        let e = GeneticsError::not_found(EntityKind::ChromosomePair, 12);
        assert_eq!(e.to_string(), "chromosome pair 12 not found");
    }
}
