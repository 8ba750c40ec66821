//! Litter simulation — draw individual offspring from a prediction

use super::offspring::{OffspringReport, PhenotypeClass};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedOffspring {
    pub index: usize,
    /// Gene name → genotype label
    pub genotypes: BTreeMap<String, String>,
    /// Gene name → phenotype class, for collapsible loci
    pub phenotypes: BTreeMap<String, PhenotypeClass>,
}

/// Sample `size` offspring. Each locus with known odds is drawn
/// independently; genes reported as unknown are left out.
pub fn simulate_litter<R: Rng + ?Sized>(
    report: &OffspringReport,
    size: usize,
    rng: &mut R,
) -> Vec<SimulatedOffspring> {
    (0..size)
        .map(|index| {
            let mut genotypes = BTreeMap::new();
            let mut phenotypes = BTreeMap::new();
            for (name, pred) in &report.genes {
                let Some(dist) = pred.distribution() else { continue };
                let Some(last) = dist.genotypes.last() else { continue };
                let roll: f64 = rng.gen();
                let mut cumulative = 0.0;
                let drawn = dist
                    .genotypes
                    .iter()
                    .find(|g| {
                        cumulative += g.probability;
                        roll < cumulative
                    })
                    .unwrap_or(last);
                genotypes.insert(name.clone(), drawn.label());
                if let Some(class) = drawn.phenotype {
                    phenotypes.insert(name.clone(), class);
                }
            }
            SimulatedOffspring {
                index,
                genotypes,
                phenotypes,
            }
        })
        .collect()
}

/// Gene name → genotype label → count across a litter
pub fn tally(litter: &[SimulatedOffspring]) -> BTreeMap<String, BTreeMap<String, usize>> {
    let mut counts: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    for pup in litter {
        for (gene, label) in &pup.genotypes {
            *counts.entry(gene.clone()).or_default().entry(label.clone()).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breeding::offspring::{predict_locus, GenePrediction, GeneProbabilities, ParentAlleles};
    use crate::locus::{Allele, GeneCategory, Gene, ImpactLevel, InheritancePattern, RiskLevel};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

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

    fn report(dam: ParentAlleles, sire: ParentAlleles) -> OffspringReport {
        let pattern = InheritancePattern::AutosomalRecessive;
        let gene = Gene {
            id: 1,
            pair_id: 1,
            name: "G".into(),
            common_name: "G".into(),
            position: 1,
            category: GeneCategory::Physical,
            impact_level: ImpactLevel::Cosmetic,
            expression_age: None,
            penetrance: None,
            expressivity: None,
            requires_monitoring: false,
        };
        let dist = predict_locus(pattern, &dam, &sire, None, true);
        let mut genes = BTreeMap::new();
        genes.insert(
            "G".to_string(),
            GenePrediction {
                gene,
                pattern,
                probabilities: GeneProbabilities::Known(dist),
                variant_alleles: Vec::new(),
            },
        );
        OffspringReport {
            dam_id: 1,
            sire_id: 2,
            offspring_sex: None,
            genes,
        }
    }

    #[test]
    fn test_certain_outcome() {
        let wt = allele(1, "+", true);
        let r = report(ParentAlleles::new(wt.clone(), wt.clone()), ParentAlleles::new(wt.clone(), wt));
        let mut rng = StdRng::seed_from_u64(7);
        let litter = simulate_litter(&r, 5, &mut rng);
        assert_eq!(litter.len(), 5);
        assert!(litter.iter().all(|p| p.genotypes["G"] == "+/+"));
        assert!(litter.iter().all(|p| p.phenotypes["G"] == PhenotypeClass::Clear));
    }

    #[test]
    fn test_large_litter_tracks_odds() {
        let (wt, var) = (allele(1, "+", true), allele(2, "a", false));
        let r = report(ParentAlleles::new(wt.clone(), var.clone()), ParentAlleles::new(var.clone(), var));
        let mut rng = StdRng::seed_from_u64(42);
        let litter = simulate_litter(&r, 4_000, &mut rng);
        let counts = tally(&litter);

        let affected = counts["G"]["a/a"] as f64 / 4_000.0;
        assert!((affected - 0.5).abs() < 0.05, "affected share {}", affected);
        assert!(!counts["G"].contains_key("+/+"));
    }
}
