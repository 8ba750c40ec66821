//! Registry records and the closed value sets they are tagged with

use crate::error::GeneticsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type SpeciesId = u64;
pub type ChromosomeId = u64;
pub type PairId = u64;
pub type GeneId = u64;
pub type AlleleId = u64;

/// Normalise a boundary string before matching it against a closed set
fn normalise(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace(['_', ' '], "-")
}

/// How a chromosome pair passes its loci to offspring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InheritancePattern {
    AutosomalDominant,
    AutosomalRecessive,
    XLinkedDominant,
    XLinkedRecessive,
    Mitochondrial,
    Polygenic,
}

impl InheritancePattern {
    pub const ALL: [InheritancePattern; 6] = [
        InheritancePattern::AutosomalDominant,
        InheritancePattern::AutosomalRecessive,
        InheritancePattern::XLinkedDominant,
        InheritancePattern::XLinkedRecessive,
        InheritancePattern::Mitochondrial,
        InheritancePattern::Polygenic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InheritancePattern::AutosomalDominant => "autosomal-dominant",
            InheritancePattern::AutosomalRecessive => "autosomal-recessive",
            InheritancePattern::XLinkedDominant => "x-linked-dominant",
            InheritancePattern::XLinkedRecessive => "x-linked-recessive",
            InheritancePattern::Mitochondrial => "mitochondrial",
            InheritancePattern::Polygenic => "polygenic",
        }
    }

    /// Whether a single non-wild-type allele is enough for expression
    pub fn is_dominant(&self) -> bool {
        matches!(
            self,
            InheritancePattern::AutosomalDominant | InheritancePattern::XLinkedDominant
        )
    }

    pub fn is_x_linked(&self) -> bool {
        matches!(
            self,
            InheritancePattern::XLinkedDominant | InheritancePattern::XLinkedRecessive
        )
    }
}

impl fmt::Display for InheritancePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InheritancePattern {
    type Err = GeneticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalise(s);
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| GeneticsError::unknown("inheritance pattern", s))
    }
}

/// Broad grouping of what a gene affects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeneCategory {
    Physical,
    Medical,
    Behavioral,
    Other,
}

impl fmt::Display for GeneCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GeneCategory::Physical => "physical",
            GeneCategory::Medical => "medical",
            GeneCategory::Behavioral => "behavioral",
            GeneCategory::Other => "other",
        })
    }
}

impl FromStr for GeneCategory {
    type Err = GeneticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "physical" => Ok(GeneCategory::Physical),
            "medical" => Ok(GeneCategory::Medical),
            "behavioral" | "behavioural" => Ok(GeneCategory::Behavioral),
            "other" => Ok(GeneCategory::Other),
            _ => Err(GeneticsError::unknown("gene category", s)),
        }
    }
}

/// How much a gene's variant phenotype matters to the animal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImpactLevel {
    Cosmetic,
    Moderate,
    Critical,
}

impl fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImpactLevel::Cosmetic => "cosmetic",
            ImpactLevel::Moderate => "moderate",
            ImpactLevel::Critical => "critical",
        })
    }
}

impl FromStr for ImpactLevel {
    type Err = GeneticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "cosmetic" => Ok(ImpactLevel::Cosmetic),
            "moderate" => Ok(ImpactLevel::Moderate),
            "critical" => Ok(ImpactLevel::Critical),
            _ => Err(GeneticsError::unknown("impact level", s)),
        }
    }
}

/// Health risk carried by an allele
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskLevel::None => "none",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        })
    }
}

impl FromStr for RiskLevel {
    type Err = GeneticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "none" => Ok(RiskLevel::None),
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Err(GeneticsError::unknown("risk level", s)),
        }
    }
}

/// Chromosome arm designator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChromosomeArm {
    P,
    Q,
}

impl fmt::Display for ChromosomeArm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChromosomeArm::P => "p",
            ChromosomeArm::Q => "q",
        })
    }
}

impl FromStr for ChromosomeArm {
    type Err = GeneticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "p" => Ok(ChromosomeArm::P),
            "q" => Ok(ChromosomeArm::Q),
            _ => Err(GeneticsError::unknown("chromosome arm", s)),
        }
    }
}

/// Root scope for chromosomes and trait labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub id: SpeciesId,
    pub common_name: String,
    pub scientific_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chromosome {
    pub id: ChromosomeId,
    pub species_id: SpeciesId,
    pub name: String,
    /// Ordinal, unique per species
    pub number: u32,
    pub arm: Option<ChromosomeArm>,
    /// Region or band sub-location, e.g. "21.3"
    pub region: Option<String>,
    pub description: Option<String>,
}

/// Request to register a chromosome
#[derive(Debug, Clone, Default)]
pub struct NewChromosome {
    pub species_id: SpeciesId,
    pub name: String,
    pub number: u32,
    pub arm: Option<ChromosomeArm>,
    pub region: Option<String>,
    pub description: Option<String>,
}

/// A maternal and a paternal chromosome treated as one unit of assortment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromosomePair {
    pub id: PairId,
    pub species_id: SpeciesId,
    pub maternal_chromosome_id: ChromosomeId,
    pub paternal_chromosome_id: ChromosomeId,
    pub inheritance_pattern: InheritancePattern,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    pub id: GeneId,
    pub pair_id: PairId,
    /// Registry-wide unique name, e.g. "MC1R"
    pub name: String,
    pub common_name: String,
    /// Locus on the pair, unique within the pair
    pub position: i32,
    pub category: GeneCategory,
    pub impact_level: ImpactLevel,
    pub expression_age: Option<String>,
    pub penetrance: Option<String>,
    pub expressivity: Option<String>,
    pub requires_monitoring: bool,
}

/// Request to register a gene
#[derive(Debug, Clone)]
pub struct NewGene {
    pub pair_id: PairId,
    pub name: String,
    pub common_name: String,
    pub position: i32,
    pub category: GeneCategory,
    pub impact_level: ImpactLevel,
    pub expression_age: Option<String>,
    pub penetrance: Option<String>,
    pub expressivity: Option<String>,
    pub requires_monitoring: bool,
}

impl NewGene {
    /// A cosmetic physical gene with no descriptors set
    pub fn new(pair_id: PairId, name: impl Into<String>, position: i32) -> Self {
        let name = name.into();
        Self {
            pair_id,
            common_name: name.clone(),
            name,
            position,
            category: GeneCategory::Physical,
            impact_level: ImpactLevel::Cosmetic,
            expression_age: None,
            penetrance: None,
            expressivity: None,
            requires_monitoring: false,
        }
    }

    pub fn critical(mut self) -> Self {
        self.category = GeneCategory::Medical;
        self.impact_level = ImpactLevel::Critical;
        self.requires_monitoring = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allele {
    pub id: AlleleId,
    pub gene_id: GeneId,
    /// Unique within the gene, e.g. "+", "a", "Cb"
    pub symbol: String,
    pub name: String,
    pub is_wild_type: bool,
    pub phenotype: String,
    pub risk_level: RiskLevel,
    pub management_notes: Option<String>,
}

/// Request to register an allele
#[derive(Debug, Clone)]
pub struct NewAllele {
    pub gene_id: GeneId,
    pub symbol: String,
    pub name: String,
    pub is_wild_type: bool,
    pub phenotype: String,
    pub risk_level: RiskLevel,
    pub management_notes: Option<String>,
}

impl NewAllele {
    pub fn new(gene_id: GeneId, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            gene_id,
            symbol: symbol.into(),
            name: name.into(),
            is_wild_type: false,
            phenotype: String::new(),
            risk_level: RiskLevel::None,
            management_notes: None,
        }
    }

    pub fn wild_type(mut self) -> Self {
        self.is_wild_type = true;
        self
    }

    pub fn with_phenotype(mut self, phenotype: impl Into<String>) -> Self {
        self.phenotype = phenotype.into();
        self
    }

    pub fn with_risk(mut self, risk: RiskLevel, notes: impl Into<String>) -> Self {
        self.risk_level = risk;
        self.management_notes = Some(notes.into());
        self
    }
}
