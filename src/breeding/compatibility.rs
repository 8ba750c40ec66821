//! Breeding Compatibility Validator
//!
//! Evaluates one candidate pairing in four steps: input validation, a risk
//! scan over critical genes, an inbreeding check, and the verdict. Only the
//! first step can block a pairing; risks and warnings are advisory.

use super::offspring::{GenePrediction, OffspringEngine, OffspringReport};
use crate::config::BreedingConfig;
use crate::error::{EntityKind, GeneticsError, GeneticsResult};
use crate::locus::ImpactLevel;
use crate::pedigree::{AncestryReader, Animal, AnimalId, InbreedingCalculator, InbreedingReport, Sex};
use crate::storage::{AnimalDirectory, GeneticsStore};
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A condition that makes a pairing impossible
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Blocker {
    IncompatibleSpeciesOrSex { reason: String },
}

/// Chance that offspring express a critical variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub gene: String,
    pub description: String,
    pub probability: f64,
    pub management_recommendation: String,
    /// Set for X-linked genes, where the odds differ between sons and daughters
    pub offspring_sex: Option<Sex>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreedingAssessment {
    pub assessment_id: String,
    pub first: AnimalId,
    pub second: AnimalId,
    pub is_compatible: bool,
    pub blocker: Option<Blocker>,
    pub inbreeding: Option<InbreedingReport>,
    pub warnings: Vec<String>,
    pub risks: Vec<Risk>,
    pub evaluated_at: DateTime<Utc>,
}

impl BreedingAssessment {
    fn new(first: AnimalId, second: AnimalId) -> Self {
        Self {
            assessment_id: Uuid::new_v4().to_string(),
            first,
            second,
            is_compatible: true,
            blocker: None,
            inbreeding: None,
            warnings: Vec::new(),
            risks: Vec::new(),
            evaluated_at: Utc::now(),
        }
    }

    fn block(mut self, reason: String) -> Self {
        self.warnings.push(format!("Pairing blocked: {}", reason));
        self.blocker = Some(Blocker::IncompatibleSpeciesOrSex { reason });
        self.is_compatible = false;
        self
    }

    pub fn is_blocked_by_species_or_sex(&self) -> bool {
        matches!(self.blocker, Some(Blocker::IncompatibleSpeciesOrSex { .. }))
    }

    pub fn summary(&self) -> String {
        format!(
            "Pairing {} x {} | {} | inbreeding {} | {} warnings | {} risks",
            self.first,
            self.second,
            if self.is_compatible { "compatible" } else { "BLOCKED" },
            self.inbreeding
                .as_ref()
                .map(|r| format!("{:.2}%", r.percent()))
                .unwrap_or_else(|| "n/a".to_string()),
            self.warnings.len(),
            self.risks.len()
        )
    }
}

const NO_MANAGEMENT_NOTES: &str = "No management notes recorded; consult a veterinarian before breeding.";

pub struct CompatibilityValidator<'a, S>
where
    S: GeneticsStore + AnimalDirectory + AncestryReader + ?Sized,
{
    store: &'a S,
    config: &'a BreedingConfig,
}

impl<'a, S> CompatibilityValidator<'a, S>
where
    S: GeneticsStore + AnimalDirectory + AncestryReader + ?Sized,
{
    pub fn new(store: &'a S, config: &'a BreedingConfig) -> Self {
        Self { store, config }
    }

    /// Evaluate a candidate pairing.
    ///
    /// Unknown animal ids are errors. Everything else yields an assessment;
    /// a species or sex mismatch comes back with `is_compatible = false`.
    pub fn validate(&self, first: AnimalId, second: AnimalId) -> GeneticsResult<BreedingAssessment> {
        let a = self.require_animal(first)?;
        let b = self.require_animal(second)?;
        let assessment = BreedingAssessment::new(first, second);

        if let Some(reason) = self.pairing_blocker(&a, &b) {
            info!("Pairing {} x {} blocked: {}", first, second, reason);
            return Ok(assessment.block(reason));
        }

        let mut assessment = assessment;
        let report = OffspringEngine::new(self.store).predict(first, second, None)?;
        self.scan_risks(&report, &mut assessment)?;

        let inbreeding = InbreedingCalculator::new(self.store)
            .with_max_generations(self.config.max_generations)
            .report(first, second);
        if inbreeding.coefficient > self.config.inbreeding_threshold {
            assessment.warnings.push(format!(
                "Inbreeding coefficient {:.2}% exceeds threshold {:.2}%",
                inbreeding.percent(),
                self.config.inbreeding_threshold * 100.0
            ));
        }
        if inbreeding.truncated {
            debug!(
                "Pedigree of {} x {} extends past {} generations",
                first, second, self.config.max_generations
            );
        }
        assessment.inbreeding = Some(inbreeding);

        info!("{}", assessment.summary());
        Ok(assessment)
    }

    fn pairing_blocker(&self, a: &Animal, b: &Animal) -> Option<String> {
        if a.id == b.id {
            return Some(format!("animal {} cannot be paired with itself", a.id));
        }
        if a.species_id != b.species_id {
            return Some(format!(
                "{} is species {}, {} is species {}",
                a.name, a.species_id, b.name, b.species_id
            ));
        }
        let unknown = a.sex == Sex::Unknown || b.sex == Sex::Unknown;
        if unknown {
            if self.config.block_unknown_sex {
                return Some(format!("sex of {} or {} is unknown", a.name, b.name));
            }
            return None;
        }
        if !a.sex.is_opposite(b.sex) {
            return Some(format!("{} and {} are both {}", a.name, b.name, a.sex));
        }
        None
    }

    fn scan_risks(&self, report: &OffspringReport, assessment: &mut BreedingAssessment) -> GeneticsResult<()> {
        let mut sexed: Option<[OffspringReport; 2]> = None;
        for (name, pred) in &report.genes {
            if pred.gene.impact_level != ImpactLevel::Critical {
                continue;
            }
            let Some(dist) = pred.distribution() else {
                assessment.warnings.push(format!(
                    "Risk for critical gene {} cannot be assessed: no genotype recorded for one of the animals",
                    name
                ));
                continue;
            };
            if !dist.is_collapsed() {
                assessment.warnings.push(format!(
                    "Risk for critical gene {} cannot be assessed: {} locus has no phenotype rule",
                    name, pred.pattern
                ));
                continue;
            }

            if pred.pattern.is_x_linked() {
                if sexed.is_none() {
                    let engine = OffspringEngine::new(self.store);
                    sexed = Some([
                        engine.predict(report.dam_id, report.sire_id, Some(Sex::Male))?,
                        engine.predict(report.dam_id, report.sire_id, Some(Sex::Female))?,
                    ]);
                }
                if let Some(reports) = &sexed {
                    for (sex, sexed_report) in [Sex::Male, Sex::Female].into_iter().zip(reports.iter()) {
                        let Some(sexed_pred) = sexed_report.genes.get(name) else { continue };
                        if let Some(risk) = risk_for(sexed_pred, Some(sex)) {
                            assessment.risks.push(risk);
                        }
                    }
                }
            } else if let Some(risk) = risk_for(pred, None) {
                assessment.risks.push(risk);
            }
        }
        Ok(())
    }

    fn require_animal(&self, id: AnimalId) -> GeneticsResult<Animal> {
        self.store
            .animal(id)
            .ok_or_else(|| GeneticsError::not_found(EntityKind::Animal, id))
    }
}

fn risk_for(pred: &GenePrediction, sex: Option<Sex>) -> Option<Risk> {
    let probability = pred.distribution()?.affected_probability()?;
    if probability <= 0.0 {
        return None;
    }
    let phenotype = pred
        .variant_alleles
        .iter()
        .map(|a| if a.phenotype.is_empty() { a.name.as_str() } else { a.phenotype.as_str() })
        .collect::<Vec<_>>()
        .join(" / ");
    let notes: Vec<&str> = pred
        .variant_alleles
        .iter()
        .filter_map(|a| a.management_notes.as_deref())
        .filter(|n| !n.trim().is_empty())
        .collect();
    let recipients = match sex {
        Some(Sex::Male) => "male offspring",
        Some(Sex::Female) => "female offspring",
        _ => "offspring",
    };
    Some(Risk {
        gene: pred.gene.name.clone(),
        description: format!(
            "{} ({}): {:.1}% of {} expected to express {}",
            pred.gene.common_name,
            pred.pattern,
            probability * 100.0,
            recipients,
            if phenotype.is_empty() { "the variant phenotype" } else { phenotype.as_str() }
        ),
        probability,
        management_recommendation: if notes.is_empty() {
            NO_MANAGEMENT_NOTES.to_string()
        } else {
            notes.join(" ")
        },
        offspring_sex: sex,
    })
}

/// Validate a pairing with the given configuration
pub fn validate_breeding_pair<S>(
    store: &S,
    config: &BreedingConfig,
    first: AnimalId,
    second: AnimalId,
) -> GeneticsResult<BreedingAssessment>
where
    S: GeneticsStore + AnimalDirectory + AncestryReader + ?Sized,
{
    CompatibilityValidator::new(store, config).validate(first, second)
}
