//! Genotype Store — which allele each animal carries on each chromosome pair
//!
//! A genotype records the allele inherited on the maternal copy and the one
//! inherited on the paternal copy. There is at most one record per
//! (animal, chromosome pair); assigning again overwrites it.

use crate::error::{EntityKind, GeneticsError, GeneticsResult};
use crate::locus::{Allele, AlleleId, Gene, PairId};
use crate::pedigree::AnimalId;
use crate::storage::{AnimalDirectory, GeneticsStore};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type GenotypeId = u64;

/// Gene name → (maternal allele name, paternal allele name)
pub type GeneMap = BTreeMap<String, (String, String)>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genotype {
    pub id: GenotypeId,
    pub animal_id: AnimalId,
    pub pair_id: PairId,
    pub maternal_allele_id: AlleleId,
    pub paternal_allele_id: AlleleId,
    pub assigned_at: DateTime<Utc>,
    /// Set when an existing assignment was overwritten
    pub updated_at: Option<DateTime<Utc>>,
}

/// A validated genotype write handed to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenotypeDraft {
    pub animal_id: AnimalId,
    pub pair_id: PairId,
    pub maternal_allele_id: AlleleId,
    pub paternal_allele_id: AlleleId,
}

/// Caller request to assign a genotype
pub type AssignGenotypeRequest = GenotypeDraft;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zygosity {
    Homozygous,
    Heterozygous,
}

/// A genotype resolved down to its gene and allele records
#[derive(Debug, Clone, PartialEq)]
pub struct GeneCall {
    pub gene: Gene,
    pub maternal: Allele,
    pub paternal: Allele,
}

impl GeneCall {
    pub fn zygosity(&self) -> Zygosity {
        if self.maternal.id == self.paternal.id {
            Zygosity::Homozygous
        } else {
            Zygosity::Heterozygous
        }
    }

    /// Symbols in maternal/paternal order, e.g. "+/a"
    pub fn label(&self) -> String {
        format!("{}/{}", self.maternal.symbol, self.paternal.symbol)
    }
}

/// Validate and record a genotype, updating the existing record for the
/// same (animal, pair) instead of creating a second one.
pub fn assign_genotype<S>(store: &mut S, request: AssignGenotypeRequest) -> GeneticsResult<Genotype>
where
    S: GeneticsStore + AnimalDirectory + ?Sized,
{
    let animal = store
        .animal(request.animal_id)
        .ok_or_else(|| GeneticsError::not_found(EntityKind::Animal, request.animal_id))?;
    let pair = store
        .chromosome_pair(request.pair_id)
        .ok_or_else(|| GeneticsError::not_found(EntityKind::ChromosomePair, request.pair_id))?;
    if animal.species_id != pair.species_id {
        return Err(GeneticsError::CrossSpecies(format!(
            "animal {} is species {}, chromosome pair {} is species {}",
            animal.id, animal.species_id, pair.id, pair.species_id
        )));
    }

    let maternal = locus_allele(store, request.pair_id, request.maternal_allele_id)?;
    let paternal = locus_allele(store, request.pair_id, request.paternal_allele_id)?;
    if maternal.gene_id != paternal.gene_id {
        return Err(GeneticsError::MixedGenes {
            maternal_allele_id: maternal.id,
            paternal_allele_id: paternal.id,
        });
    }

    let genotype = store.upsert_genotype(request)?;
    info!(
        "Assigned genotype {}/{} to animal {} on pair {}",
        maternal.symbol, paternal.symbol, animal.id, pair.id
    );
    Ok(genotype)
}

/// Resolve an allele and check that its gene sits on the given pair
fn locus_allele<S>(store: &S, pair_id: PairId, allele_id: AlleleId) -> GeneticsResult<Allele>
where
    S: GeneticsStore + ?Sized,
{
    let allele = store
        .allele(allele_id)
        .ok_or_else(|| GeneticsError::not_found(EntityKind::Allele, allele_id))?;
    let gene = store
        .gene(allele.gene_id)
        .ok_or_else(|| GeneticsError::not_found(EntityKind::Gene, allele.gene_id))?;
    if gene.pair_id != pair_id {
        return Err(GeneticsError::CrossLocusMismatch {
            pair_id,
            allele_id,
            gene_id: gene.id,
        });
    }
    Ok(allele)
}

/// Resolve one stored genotype to its gene and alleles.
///
/// Returns `None` if any referenced record has disappeared from the store.
pub fn resolve_genotype<S>(store: &S, genotype: &Genotype) -> Option<GeneCall>
where
    S: GeneticsStore + ?Sized,
{
    let maternal = store.allele(genotype.maternal_allele_id)?;
    let paternal = store.allele(genotype.paternal_allele_id)?;
    let gene = store.gene(maternal.gene_id)?;
    Some(GeneCall {
        gene,
        maternal,
        paternal,
    })
}

/// Every genotype of an animal resolved to gene and alleles, keyed by gene name
pub fn gene_calls_for_animal<S>(store: &S, animal: AnimalId) -> BTreeMap<String, GeneCall>
where
    S: GeneticsStore + ?Sized,
{
    store
        .genotypes_for_animal(animal)
        .iter()
        .filter_map(|g| resolve_genotype(store, g))
        .map(|call| (call.gene.name.clone(), call))
        .collect()
}

/// Gene name → (maternal allele name, paternal allele name) for one animal.
///
/// An animal without genotypes yields an empty map.
pub fn gene_map_for_animal<S>(store: &S, animal: AnimalId) -> GeneMap
where
    S: GeneticsStore + ?Sized,
{
    gene_calls_for_animal(store, animal)
        .into_iter()
        .map(|(gene, call)| (gene, (call.maternal.name, call.paternal.name)))
        .collect()
}
