//! Offspring Probability Engine
//!
//! Enumerates the allele combinations a pairing can produce at each locus
//! and collapses them to phenotype classes where the inheritance pattern
//! allows. The chromosome pair is the unit of assortment: distributions are
//! multiplied across pairs and never across loci that share one.

use crate::error::{EntityKind, GeneticsError, GeneticsResult};
use crate::genotype::{gene_calls_for_animal, GeneCall};
use crate::locus::{Allele, Gene, InheritancePattern, PairId};
use crate::pedigree::{Animal, AnimalId, Sex};
use crate::storage::{AnimalDirectory, GeneticsStore};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Expressed outcome relative to the wild-type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhenotypeClass {
    /// No variant allele
    Clear,
    /// Carries a variant allele that is not expressed
    Carrier,
    /// Expresses the variant phenotype
    Affected,
}

impl fmt::Display for PhenotypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PhenotypeClass::Clear => "clear",
            PhenotypeClass::Carrier => "carrier",
            PhenotypeClass::Affected => "affected",
        })
    }
}

/// One parent's two copies at a locus
#[derive(Debug, Clone, PartialEq)]
pub struct ParentAlleles {
    pub maternal: Allele,
    pub paternal: Allele,
}

impl ParentAlleles {
    pub fn new(maternal: Allele, paternal: Allele) -> Self {
        Self { maternal, paternal }
    }

    fn both(&self) -> [&Allele; 2] {
        [&self.maternal, &self.paternal]
    }
}

impl From<&GeneCall> for ParentAlleles {
    fn from(call: &GeneCall) -> Self {
        Self::new(call.maternal.clone(), call.paternal.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenotypeOutcome {
    /// Allele symbols, wild-type first. One symbol for hemizygous and
    /// mitochondrial outcomes.
    pub alleles: Vec<String>,
    pub probability: f64,
    pub phenotype: Option<PhenotypeClass>,
}

impl GenotypeOutcome {
    pub fn label(&self) -> String {
        self.alleles.join("/")
    }
}

/// Offspring distribution at one locus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocusDistribution {
    pub genotypes: Vec<GenotypeOutcome>,
    /// Empty when the locus cannot be collapsed to phenotypes
    /// (polygenic pattern, or no wild-type allele registered)
    pub phenotypes: BTreeMap<PhenotypeClass, f64>,
    /// X-linked locus evaluated without an offspring sex
    pub requires_offspring_sex: bool,
}

impl LocusDistribution {
    pub fn is_collapsed(&self) -> bool {
        !self.phenotypes.is_empty()
    }

    /// Probability of expressing the variant phenotype, if known
    pub fn affected_probability(&self) -> Option<f64> {
        if !self.is_collapsed() {
            return None;
        }
        Some(self.phenotypes.get(&PhenotypeClass::Affected).copied().unwrap_or(0.0))
    }

    pub fn total_probability(&self) -> f64 {
        self.genotypes.iter().map(|g| g.probability).sum()
    }
}

/// Variant-count rule: recessive loci need every copy to be a variant,
/// dominant loci need one; a single copy is always expressed.
fn classify(pattern: InheritancePattern, alleles: &[&Allele]) -> PhenotypeClass {
    let variants = alleles.iter().filter(|a| !a.is_wild_type).count();
    if variants == 0 {
        PhenotypeClass::Clear
    } else if alleles.len() == 1 || pattern.is_dominant() || variants == alleles.len() {
        PhenotypeClass::Affected
    } else {
        PhenotypeClass::Carrier
    }
}

/// Compute the offspring distribution at one locus.
///
/// `sex` conditions X-linked loci: sons receive only the dam's X, daughters
/// the dam's X plus the sire's maternal copy. Without it X-linked loci use
/// the autosomal enumeration and flag `requires_offspring_sex`.
pub fn predict_locus(
    pattern: InheritancePattern,
    dam: &ParentAlleles,
    sire: &ParentAlleles,
    sex: Option<Sex>,
    has_wild_type: bool,
) -> LocusDistribution {
    let sex = sex.filter(|s| *s != Sex::Unknown);
    let combinations: Vec<(Vec<&Allele>, f64)> = match (pattern, sex) {
        (InheritancePattern::Mitochondrial, _) => vec![(vec![&dam.maternal], 1.0)],
        (p, Some(Sex::Male)) if p.is_x_linked() => {
            dam.both().into_iter().map(|a| (vec![a], 0.5)).collect()
        }
        (p, Some(Sex::Female)) if p.is_x_linked() => dam
            .both()
            .into_iter()
            .map(|a| (vec![a, &sire.maternal], 0.5))
            .collect(),
        _ => {
            let mut all = Vec::with_capacity(4);
            for m in dam.both() {
                for p in sire.both() {
                    all.push((vec![m, p], 0.25));
                }
            }
            all
        }
    };

    let collapse = has_wild_type && pattern != InheritancePattern::Polygenic;
    let mut genotypes: Vec<GenotypeOutcome> = Vec::new();
    let mut phenotypes: BTreeMap<PhenotypeClass, f64> = BTreeMap::new();
    for (mut alleles, probability) in combinations {
        alleles.sort_by(|a, b| (!a.is_wild_type, &a.symbol).cmp(&(!b.is_wild_type, &b.symbol)));
        let symbols: Vec<String> = alleles.iter().map(|a| a.symbol.clone()).collect();
        let phenotype = collapse.then(|| classify(pattern, &alleles));
        if let Some(class) = phenotype {
            *phenotypes.entry(class).or_insert(0.0) += probability;
        }
        match genotypes.iter_mut().find(|g| g.alleles == symbols) {
            Some(existing) => existing.probability += probability,
            None => genotypes.push(GenotypeOutcome {
                alleles: symbols,
                probability,
                phenotype,
            }),
        }
    }
    genotypes.sort_by(|a, b| b.probability.total_cmp(&a.probability).then_with(|| a.alleles.cmp(&b.alleles)));

    LocusDistribution {
        genotypes,
        phenotypes,
        requires_offspring_sex: pattern.is_x_linked() && sex.is_none(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeneProbabilities {
    /// At least one parent has no genotype recorded for the gene
    Unknown { missing: Vec<AnimalId> },
    Known(LocusDistribution),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenePrediction {
    pub gene: Gene,
    pub pattern: InheritancePattern,
    pub probabilities: GeneProbabilities,
    /// Non-wild-type alleles carried by either parent at this gene
    pub variant_alleles: Vec<Allele>,
}

impl GenePrediction {
    pub fn distribution(&self) -> Option<&LocusDistribution> {
        match &self.probabilities {
            GeneProbabilities::Known(dist) => Some(dist),
            GeneProbabilities::Unknown { .. } => None,
        }
    }
}

/// Per-gene odds as handed to callers: genotype label → probability, or
/// unknown when a parent has no genotype recorded for the gene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneOdds {
    Unknown,
    Known(BTreeMap<String, f64>),
}

impl GeneOdds {
    pub fn known(&self) -> Option<&BTreeMap<String, f64>> {
        match self {
            GeneOdds::Known(odds) => Some(odds),
            GeneOdds::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, GeneOdds::Unknown)
    }
}

/// Largest joint phenotype table `combined_phenotypes` will build
pub const MAX_COMBINED_PHENOTYPES: usize = 4096;

/// One joint phenotype across all collapsible loci
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedPhenotype {
    pub classes: BTreeMap<String, PhenotypeClass>,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffspringReport {
    pub dam_id: AnimalId,
    pub sire_id: AnimalId,
    pub offspring_sex: Option<Sex>,
    /// Keyed by gene name
    pub genes: BTreeMap<String, GenePrediction>,
}

impl OffspringReport {
    /// Gene name → odds for every gene either parent is typed at
    pub fn probability_map(&self) -> BTreeMap<String, GeneOdds> {
        self.genes
            .iter()
            .map(|(name, pred)| {
                let odds = match pred.distribution() {
                    Some(dist) => GeneOdds::Known(dist.genotypes.iter().map(|g| (g.label(), g.probability)).collect()),
                    None => GeneOdds::Unknown,
                };
                (name.clone(), odds)
            })
            .collect()
    }

    /// Gene name → phenotype class → probability, for collapsible genes
    pub fn phenotype_map(&self) -> BTreeMap<String, BTreeMap<String, f64>> {
        self.genes
            .iter()
            .filter_map(|(name, pred)| {
                let dist = pred.distribution().filter(|d| d.is_collapsed())?;
                let odds = dist.phenotypes.iter().map(|(c, p)| (c.to_string(), *p)).collect();
                Some((name.clone(), odds))
            })
            .collect()
    }

    pub fn unknown_genes(&self) -> Vec<&str> {
        self.genes
            .iter()
            .filter(|(_, pred)| pred.distribution().is_none())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Joint phenotype distribution across chromosome pairs.
    ///
    /// Pairs assort independently so their distributions multiply. An
    /// animal has one genotype per pair, so at most one gene per pair has
    /// known odds and linked loci never enter the product together.
    ///
    /// Empty when the table would exceed `MAX_COMBINED_PHENOTYPES` rows.
    pub fn combined_phenotypes(&self) -> Vec<CombinedPhenotype> {
        let mut factors: BTreeMap<PairId, (&str, &BTreeMap<PhenotypeClass, f64>)> = BTreeMap::new();
        for (name, pred) in &self.genes {
            let Some(dist) = pred.distribution().filter(|d| d.is_collapsed()) else {
                continue;
            };
            factors.entry(pred.gene.pair_id).or_insert((name.as_str(), &dist.phenotypes));
        }

        let mut rows: usize = 1;
        for (_, odds) in factors.values() {
            let classes = odds.values().filter(|p| **p > 0.0).count().max(1);
            rows = rows.saturating_mul(classes);
        }
        if rows > MAX_COMBINED_PHENOTYPES {
            warn!(
                "Combined phenotype table for {} loci would have {} rows, limit is {}",
                factors.len(),
                rows,
                MAX_COMBINED_PHENOTYPES
            );
            return Vec::new();
        }

        let mut combined = vec![CombinedPhenotype {
            classes: BTreeMap::new(),
            probability: 1.0,
        }];
        for (name, odds) in factors.values() {
            let mut next = Vec::with_capacity(combined.len() * odds.len());
            for partial in &combined {
                for (class, p) in odds.iter() {
                    if *p <= 0.0 {
                        continue;
                    }
                    let mut classes = partial.classes.clone();
                    classes.insert(name.to_string(), *class);
                    next.push(CombinedPhenotype {
                        classes,
                        probability: partial.probability * p,
                    });
                }
            }
            combined = next;
        }
        if combined.len() == 1 && combined[0].classes.is_empty() {
            return Vec::new();
        }
        combined.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        combined
    }
}

/// Runs offspring predictions against a store
pub struct OffspringEngine<'a, S: GeneticsStore + AnimalDirectory + ?Sized> {
    store: &'a S,
}

impl<'a, S: GeneticsStore + AnimalDirectory + ?Sized> OffspringEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Predict offspring of two animals.
    ///
    /// The female is used as dam; when the sexes do not settle it the first
    /// animal is the dam. Genes that only one parent is genotyped for are
    /// reported as unknown, never defaulted to wild-type.
    pub fn predict(&self, first: AnimalId, second: AnimalId, sex: Option<Sex>) -> GeneticsResult<OffspringReport> {
        let a = self.require_animal(first)?;
        let b = self.require_animal(second)?;
        if a.species_id != b.species_id {
            return Err(GeneticsError::CrossSpecies(format!(
                "animal {} is species {}, animal {} is species {}",
                a.id, a.species_id, b.id, b.species_id
            )));
        }
        let (dam, sire) = match (a.sex, b.sex) {
            (Sex::Male, Sex::Female) => (b, a),
            (Sex::Female, Sex::Male) => (a, b),
            _ => {
                debug!("Sexes of {} and {} do not fix dam and sire, using {} as dam", a.id, b.id, a.id);
                (a, b)
            }
        };

        let dam_calls = gene_calls_for_animal(self.store, dam.id);
        let sire_calls = gene_calls_for_animal(self.store, sire.id);
        let names: BTreeSet<&String> = dam_calls.keys().chain(sire_calls.keys()).collect();

        let mut genes = BTreeMap::new();
        for name in names {
            let dam_call = dam_calls.get(name);
            let sire_call = sire_calls.get(name);
            let gene = match dam_call.or(sire_call) {
                Some(call) => call.gene.clone(),
                None => continue,
            };
            let pair = self
                .store
                .chromosome_pair(gene.pair_id)
                .ok_or_else(|| GeneticsError::not_found(EntityKind::ChromosomePair, gene.pair_id))?;

            let mut variant_alleles: Vec<Allele> = Vec::new();
            for call in [dam_call, sire_call].into_iter().flatten() {
                for allele in [&call.maternal, &call.paternal] {
                    if !allele.is_wild_type && !variant_alleles.iter().any(|v| v.id == allele.id) {
                        variant_alleles.push(allele.clone());
                    }
                }
            }

            let probabilities = match (dam_call, sire_call) {
                (Some(d), Some(s)) => {
                    let has_wild_type = self.store.alleles_for_gene(gene.id).iter().any(|a| a.is_wild_type);
                    GeneProbabilities::Known(predict_locus(
                        pair.inheritance_pattern,
                        &ParentAlleles::from(d),
                        &ParentAlleles::from(s),
                        sex,
                        has_wild_type,
                    ))
                }
                _ => {
                    let mut missing = Vec::new();
                    if dam_call.is_none() {
                        missing.push(dam.id);
                    }
                    if sire_call.is_none() {
                        missing.push(sire.id);
                    }
                    GeneProbabilities::Unknown { missing }
                }
            };
            genes.insert(
                name.clone(),
                GenePrediction {
                    gene,
                    pattern: pair.inheritance_pattern,
                    probabilities,
                    variant_alleles,
                },
            );
        }

        Ok(OffspringReport {
            dam_id: dam.id,
            sire_id: sire.id,
            offspring_sex: sex,
            genes,
        })
    }

    fn require_animal(&self, id: AnimalId) -> GeneticsResult<Animal> {
        self.store
            .animal(id)
            .ok_or_else(|| GeneticsError::not_found(EntityKind::Animal, id))
    }
}

/// Gene name → odds for a pairing. Genes typed in only one parent are
/// reported as `GeneOdds::Unknown`.
pub fn calculate_offspring_probabilities<S>(
    store: &S,
    first: AnimalId,
    second: AnimalId,
) -> GeneticsResult<BTreeMap<String, GeneOdds>>
where
    S: GeneticsStore + AnimalDirectory + ?Sized,
{
    Ok(OffspringEngine::new(store).predict(first, second, None)?.probability_map())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype::{assign_genotype, GenotypeDraft};
    use crate::locus::{LocusRegistry, NewAllele, NewChromosome, NewGene, RiskLevel};
    use crate::pedigree::NewAnimal;
    use crate::storage::MemoryStore;

    const EPS: f64 = 1e-9;

    fn allele(id: u64, symbol: &str, wild: bool) -> Allele {
        Allele {
            id,
            gene_id: 1,
            symbol: symbol.into(),
            name: symbol.into(),
            is_wild_type: wild,
            phenotype: String::new(),
            risk_level: RiskLevel::None,
            management_notes: None,
        }
    }

    fn wt() -> Allele {
        allele(1, "+", true)
    }

    fn var() -> Allele {
        allele(2, "a", false)
    }

    fn odds(dist: &LocusDistribution, label: &str) -> f64 {
        dist.genotypes
            .iter()
            .find(|g| g.label() == label)
            .map(|g| g.probability)
            .unwrap_or(0.0)
    }

    #[test]
    fn test_carrier_by_affected_recessive() {
        let dam = ParentAlleles::new(wt(), var());
        let sire = ParentAlleles::new(var(), var());
        let dist = predict_locus(InheritancePattern::AutosomalRecessive, &dam, &sire, None, true);

        assert_eq!(dist.genotypes.len(), 2);
        assert!((odds(&dist, "a/a") - 0.5).abs() < EPS);
        assert!((odds(&dist, "+/a") - 0.5).abs() < EPS);
        assert!((dist.total_probability() - 1.0).abs() < EPS);
        assert!((dist.phenotypes[&PhenotypeClass::Affected] - 0.5).abs() < EPS);
        assert!((dist.phenotypes[&PhenotypeClass::Carrier] - 0.5).abs() < EPS);
        assert!(!dist.requires_offspring_sex);
    }

    #[test]
    fn test_carrier_cross_dominant_vs_recessive() {
        let dam = ParentAlleles::new(wt(), var());
        let sire = ParentAlleles::new(var(), wt());

        let rec = predict_locus(InheritancePattern::AutosomalRecessive, &dam, &sire, None, true);
        assert!((odds(&rec, "+/+") - 0.25).abs() < EPS);
        assert!((odds(&rec, "+/a") - 0.5).abs() < EPS);
        assert!((rec.affected_probability().unwrap() - 0.25).abs() < EPS);

        let dom = predict_locus(InheritancePattern::AutosomalDominant, &dam, &sire, None, true);
        assert!((dom.affected_probability().unwrap() - 0.75).abs() < EPS);
        assert!(!dom.phenotypes.contains_key(&PhenotypeClass::Carrier));
    }

    #[test]
    fn test_mitochondrial_follows_dam() {
        let dam = ParentAlleles::new(var(), wt());
        for sire in [ParentAlleles::new(wt(), wt()), ParentAlleles::new(var(), var())] {
            let dist = predict_locus(InheritancePattern::Mitochondrial, &dam, &sire, None, true);
            assert_eq!(dist.genotypes.len(), 1);
            assert_eq!(dist.genotypes[0].alleles, vec!["a".to_string()]);
            assert_eq!(dist.genotypes[0].probability, 1.0);
            assert_eq!(dist.affected_probability(), Some(1.0));
        }
    }

    #[test]
    fn test_x_linked_by_sex() {
        // carrier dam, clear sire
        let dam = ParentAlleles::new(wt(), var());
        let sire = ParentAlleles::new(wt(), wt());
        let pattern = InheritancePattern::XLinkedRecessive;

        let sons = predict_locus(pattern, &dam, &sire, Some(Sex::Male), true);
        assert!((sons.affected_probability().unwrap() - 0.5).abs() < EPS);
        assert!(sons.genotypes.iter().all(|g| g.alleles.len() == 1));

        let daughters = predict_locus(pattern, &dam, &sire, Some(Sex::Female), true);
        assert_eq!(daughters.affected_probability(), Some(0.0));
        assert!((daughters.phenotypes[&PhenotypeClass::Carrier] - 0.5).abs() < EPS);

        let unsexed = predict_locus(pattern, &dam, &sire, None, true);
        assert!(unsexed.requires_offspring_sex);
        assert!((unsexed.total_probability() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_polygenic_and_missing_wild_type_not_collapsed() {
        let dam = ParentAlleles::new(wt(), var());
        let sire = ParentAlleles::new(wt(), var());
        let poly = predict_locus(InheritancePattern::Polygenic, &dam, &sire, None, true);
        assert!(!poly.is_collapsed());
        assert!(poly.affected_probability().is_none());
        assert_eq!(poly.genotypes.len(), 3);
        assert!(poly.genotypes.iter().all(|g| g.phenotype.is_none()));

        let no_wt = predict_locus(InheritancePattern::AutosomalRecessive, &dam, &sire, None, false);
        assert!(!no_wt.is_collapsed());
    }

    struct Kennel {
        store: MemoryStore,
        dam: AnimalId,
        sire: AnimalId,
        pup: AnimalId,
    }

    /// Two genes on separate autosomal-recessive pairs, one on a dominant pair
    fn kennel() -> Kennel {
        let mut store = MemoryStore::new();
        let mut reg = LocusRegistry::new(&mut store);
        let dog = reg.create_species("Dog", "Canis familiaris").unwrap();
        let mut alleles = Vec::new();
        for (number, pattern, gene) in [(1, "autosomal-recessive", "G"), (2, "autosomal-recessive", "H"), (3, "autosomal-dominant", "D")] {
            let c = reg
                .create_chromosome(NewChromosome { species_id: dog.id, name: format!("chr{}", number), number, ..Default::default() })
                .unwrap();
            let pair = reg.create_chromosome_pair(c.id, c.id, pattern).unwrap();
            let g = reg.create_gene(NewGene::new(pair.id, gene, 1)).unwrap();
            let w = reg.create_allele(NewAllele::new(g.id, "+", "Normal").wild_type()).unwrap();
            let v = reg.create_allele(NewAllele::new(g.id, "a", "Variant")).unwrap();
            alleles.push((pair.id, w.id, v.id));
        }
        let dam = store.add_animal(NewAnimal::new("Dam", dog.id, Sex::Female)).unwrap().id;
        let sire = store.add_animal(NewAnimal::new("Sire", dog.id, Sex::Male)).unwrap().id;
        let pup = store.add_animal(NewAnimal::new("Pup", dog.id, Sex::Male)).unwrap().id;

        let set = |store: &mut MemoryStore, animal, (pair, m, p)| {
            assign_genotype(store, GenotypeDraft { animal_id: animal, pair_id: pair, maternal_allele_id: m, paternal_allele_id: p }).unwrap();
        };
        let (g, h, d) = (alleles[0], alleles[1], alleles[2]);
        set(&mut store, dam, (g.0, g.1, g.2));
        set(&mut store, sire, (g.0, g.2, g.2));
        set(&mut store, dam, (h.0, h.1, h.2));
        set(&mut store, sire, (h.0, h.1, h.2));
        // only the sire is typed at D
        set(&mut store, sire, (d.0, d.2, d.1));
        Kennel { store, dam, sire, pup }
    }

    #[test]
    fn test_engine_orders_by_sex_and_reports_unknown() {
        let k = kennel();
        let engine = OffspringEngine::new(&k.store);
        let report = engine.predict(k.sire, k.dam, None).unwrap();
        assert_eq!(report.dam_id, k.dam);
        assert_eq!(report.sire_id, k.sire);

        assert_eq!(report.unknown_genes(), vec!["D"]);
        match &report.genes["D"].probabilities {
            GeneProbabilities::Unknown { missing } => assert_eq!(missing, &vec![k.dam]),
            other => panic!("expected unknown, got {:?}", other),
        }

        let map = report.probability_map();
        assert!(map["D"].is_unknown());
        for odds in map.values().filter_map(GeneOdds::known) {
            assert!((odds.values().sum::<f64>() - 1.0).abs() < EPS);
        }
        assert!((map["H"].known().unwrap()["+/a"] - 0.5).abs() < EPS);
    }

    #[test]
    fn test_combined_phenotypes_multiply_across_pairs() {
        let k = kennel();
        let report = OffspringEngine::new(&k.store).predict(k.dam, k.sire, None).unwrap();
        let combined = report.combined_phenotypes();

        // G: carrier/affected 1/2 each; H: clear 1/4, carrier 1/2, affected 1/4
        assert_eq!(combined.len(), 6);
        let total: f64 = combined.iter().map(|c| c.probability).sum();
        assert!((total - 1.0).abs() < EPS);
        let both_affected = combined
            .iter()
            .find(|c| c.classes["G"] == PhenotypeClass::Affected && c.classes["H"] == PhenotypeClass::Affected)
            .unwrap();
        assert!((both_affected.probability - 0.125).abs() < EPS);
    }

    #[test]
    fn test_untyped_parent_gives_empty_report() {
        let k = kennel();
        let report = OffspringEngine::new(&k.store).predict(k.dam, k.pup, None).unwrap();
        let map = report.probability_map();
        assert_eq!(map.len(), 2);
        assert!(map.values().all(GeneOdds::is_unknown));
        assert_eq!(report.unknown_genes().len(), 2);
        assert!(report.combined_phenotypes().is_empty());
    }

    #[test]
    fn test_cross_species_rejected() {
        let mut k = kennel();
        let cat = k.store.insert_species("Cat", "Felis catus").unwrap();
        let tom = k.store.add_animal(NewAnimal::new("Tom", cat.id, Sex::Male)).unwrap();
        let err = calculate_offspring_probabilities(&k.store, k.dam, tom.id).unwrap_err();
        assert!(matches!(err, GeneticsError::CrossSpecies(_)));
    }

    #[test]
    fn test_carrier_by_affected_through_store() {
        let k = kennel();
        let map = calculate_offspring_probabilities(&k.store, k.dam, k.sire).unwrap();
        let g = map["G"].known().unwrap();
        assert_eq!(g.len(), 2);
        assert!((g["a/a"] - 0.5).abs() < EPS);
        assert!((g["+/a"] - 0.5).abs() < EPS);

        let report = OffspringEngine::new(&k.store).predict(k.dam, k.sire, None).unwrap();
        for outcome in &report.genes["G"].distribution().unwrap().genotypes {
            let expected = match outcome.label().as_str() {
                "a/a" => PhenotypeClass::Affected,
                "+/a" => PhenotypeClass::Carrier,
                other => panic!("unexpected genotype {}", other),
            };
            assert_eq!(outcome.phenotype, Some(expected));
        }
    }

    #[test]
    fn test_one_sided_genotype_reported_unknown() {
        let k = kennel();
        // the dam is untyped at D, the sire is typed
        let map = calculate_offspring_probabilities(&k.store, k.dam, k.sire).unwrap();
        assert_eq!(map["D"], GeneOdds::Unknown);

        // the pup is untyped everywhere, so every gene the dam carries is unknown
        let map = calculate_offspring_probabilities(&k.store, k.dam, k.pup).unwrap();
        assert!(map.contains_key("G"));
        assert!(map.values().all(GeneOdds::is_unknown));
    }

    #[test]
    fn test_combined_phenotypes_capped() {
        let dam = ParentAlleles::new(wt(), var());
        let sire = ParentAlleles::new(wt(), var());
        let pattern = InheritancePattern::AutosomalRecessive;
        let mut genes = BTreeMap::new();
        // nine independent 1:2:1 loci give 3^9 joint rows
        for pair in 1..=9u64 {
            let name = format!("G{}", pair);
            let gene = Gene {
                id: pair,
                pair_id: pair,
                name: name.clone(),
                common_name: name.clone(),
                position: 1,
                category: crate::locus::GeneCategory::Physical,
                impact_level: crate::locus::ImpactLevel::Cosmetic,
                expression_age: None,
                penetrance: None,
                expressivity: None,
                requires_monitoring: false,
            };
            genes.insert(
                name,
                GenePrediction {
                    gene,
                    pattern,
                    probabilities: GeneProbabilities::Known(predict_locus(pattern, &dam, &sire, None, true)),
                    variant_alleles: Vec::new(),
                },
            );
        }
        let mut report = OffspringReport { dam_id: 1, sire_id: 2, offspring_sex: None, genes };
        assert!(report.combined_phenotypes().is_empty());

        // seven loci (2187 rows) stay under the limit
        report.genes.remove("G8");
        report.genes.remove("G9");
        let combined = report.combined_phenotypes();
        assert_eq!(combined.len(), 2187);
        let total: f64 = combined.iter().map(|c| c.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}
