//! Animal identity and the ancestry capability the calculators walk

use crate::error::GeneticsError;
use crate::locus::SpeciesId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type AnimalId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Unknown,
}

impl Sex {
    /// Whether two animals can form a dam/sire pair
    pub fn is_opposite(&self, other: Sex) -> bool {
        matches!(
            (self, other),
            (Sex::Male, Sex::Female) | (Sex::Female, Sex::Male)
        )
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Unknown => "unknown",
        })
    }
}

impl FromStr for Sex {
    type Err = GeneticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" | "sire" => Ok(Sex::Male),
            "female" | "f" | "dam" => Ok(Sex::Female),
            "unknown" | "u" => Ok(Sex::Unknown),
            _ => Err(GeneticsError::unknown("sex", s)),
        }
    }
}

/// An animal as supplied by the external animal store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    pub id: AnimalId,
    pub name: String,
    pub species_id: SpeciesId,
    pub sex: Sex,
    pub dam_id: Option<AnimalId>,
    pub sire_id: Option<AnimalId>,
}

/// Request to register an animal with a store
#[derive(Debug, Clone)]
pub struct NewAnimal {
    pub name: String,
    pub species_id: SpeciesId,
    pub sex: Sex,
    pub dam_id: Option<AnimalId>,
    pub sire_id: Option<AnimalId>,
}

impl NewAnimal {
    pub fn new(name: impl Into<String>, species_id: SpeciesId, sex: Sex) -> Self {
        Self {
            name: name.into(),
            species_id,
            sex,
            dam_id: None,
            sire_id: None,
        }
    }

    pub fn with_parents(mut self, dam: Option<AnimalId>, sire: Option<AnimalId>) -> Self {
        self.dam_id = dam;
        self.sire_id = sire;
        self
    }
}

/// Read-only view of the pedigree graph
pub trait AncestryReader {
    fn dam(&self, animal: AnimalId) -> Option<Animal>;
    fn sire(&self, animal: AnimalId) -> Option<Animal>;

    /// Both parents as ids, dam first
    fn parents(&self, animal: AnimalId) -> [Option<AnimalId>; 2] {
        [
            self.dam(animal).map(|a| a.id),
            self.sire(animal).map(|a| a.id),
        ]
    }
}

impl<T: AncestryReader + ?Sized> AncestryReader for &T {
    fn dam(&self, animal: AnimalId) -> Option<Animal> {
        (**self).dam(animal)
    }

    fn sire(&self, animal: AnimalId) -> Option<Animal> {
        (**self).sire(animal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sex_parsing() {
        assert_eq!("F".parse::<Sex>().unwrap(), Sex::Female);
        assert_eq!(" male ".parse::<Sex>().unwrap(), Sex::Male);
        assert!("hermaphrodite".parse::<Sex>().is_err());
    }

    #[test]
    fn test_opposite_sex() {
        assert!(Sex::Male.is_opposite(Sex::Female));
        assert!(!Sex::Female.is_opposite(Sex::Female));
        assert!(!Sex::Unknown.is_opposite(Sex::Male));
    }
}
