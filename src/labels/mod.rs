//! Trait labels — the coarse phenotype annotation layer
//!
//! Species-scoped labels ("Black", "Long coat") grouped by a trait type
//! ("Color", "Coat Type") and attached directly to animals. This layer is
//! independent of the gene/allele model and nothing here is derived from
//! genotypes.

use crate::error::{EntityKind, GeneticsError, GeneticsResult};
use crate::locus::SpeciesId;
use crate::pedigree::AnimalId;
use crate::storage::{AnimalDirectory, GeneticsStore};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type TraitTypeId = u64;
pub type TraitLabelId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitType {
    pub id: TraitTypeId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitLabel {
    pub id: TraitLabelId,
    pub species_id: SpeciesId,
    pub trait_type_id: TraitTypeId,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTraitLabel {
    pub species_id: SpeciesId,
    pub trait_type_id: TraitTypeId,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalTrait {
    pub animal_id: AnimalId,
    pub trait_id: TraitLabelId,
}

/// Persistence for the label layer
pub trait TraitLabelStore {
    fn insert_trait_type(&mut self, name: &str) -> GeneticsResult<TraitType>;
    fn trait_type(&self, id: TraitTypeId) -> Option<TraitType>;
    fn insert_trait_label(&mut self, new: NewTraitLabel) -> GeneticsResult<TraitLabel>;
    fn trait_label(&self, id: TraitLabelId) -> Option<TraitLabel>;
    fn trait_labels_for_species(&self, species: SpeciesId) -> Vec<TraitLabel>;
    /// Attaching the same label twice is a no-op
    fn insert_animal_trait(&mut self, animal: AnimalId, label: TraitLabelId) -> GeneticsResult<AnimalTrait>;
    fn trait_labels_for_animal(&self, animal: AnimalId) -> Vec<TraitLabel>;
}

pub fn create_trait_type<S>(store: &mut S, name: &str) -> GeneticsResult<TraitType>
where
    S: TraitLabelStore + ?Sized,
{
    if name.trim().is_empty() {
        return Err(GeneticsError::MissingField("name"));
    }
    store.insert_trait_type(name.trim())
}

pub fn create_trait<S>(store: &mut S, new: NewTraitLabel) -> GeneticsResult<TraitLabel>
where
    S: TraitLabelStore + GeneticsStore + ?Sized,
{
    if new.name.trim().is_empty() {
        return Err(GeneticsError::MissingField("name"));
    }
    if store.species(new.species_id).is_none() {
        return Err(GeneticsError::not_found(EntityKind::Species, new.species_id));
    }
    if store.trait_type(new.trait_type_id).is_none() {
        return Err(GeneticsError::not_found(EntityKind::TraitType, new.trait_type_id));
    }
    let label = store.insert_trait_label(new)?;
    info!("Registered trait '{}' for species {}", label.name, label.species_id);
    Ok(label)
}

/// Attach a label to an animal of the same species
pub fn assign_trait<S>(store: &mut S, animal: AnimalId, label: TraitLabelId) -> GeneticsResult<AnimalTrait>
where
    S: TraitLabelStore + AnimalDirectory + ?Sized,
{
    let found = store
        .animal(animal)
        .ok_or_else(|| GeneticsError::not_found(EntityKind::Animal, animal))?;
    let trait_label = store
        .trait_label(label)
        .ok_or_else(|| GeneticsError::not_found(EntityKind::Trait, label))?;
    if found.species_id != trait_label.species_id {
        return Err(GeneticsError::CrossSpecies(format!(
            "trait '{}' belongs to species {}, animal {} is species {}",
            trait_label.name, trait_label.species_id, found.id, found.species_id
        )));
    }
    store.insert_animal_trait(animal, label)
}

/// Trait type name → label names carried by the animal
pub fn traits_by_type<S>(store: &S, animal: AnimalId) -> BTreeMap<String, Vec<String>>
where
    S: TraitLabelStore + ?Sized,
{
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for label in store.trait_labels_for_animal(animal) {
        let type_name = store
            .trait_type(label.trait_type_id)
            .map(|t| t.name)
            .unwrap_or_else(|| "Unclassified".to_string());
        grouped.entry(type_name).or_default().push(label.name);
    }
    for names in grouped.values_mut() {
        names.sort();
    }
    grouped
}
