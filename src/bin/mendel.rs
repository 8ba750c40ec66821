//! Mendel CLI — breeding genetics over a local JSON store
//!
//! Commands:
//!   mendel species     — register or list species
//!   mendel chromosome  — register a chromosome
//!   mendel pair        — pair two chromosomes under an inheritance pattern
//!   mendel gene        — register a gene on a pair
//!   mendel allele      — register an allele of a gene
//!   mendel animal      — register an animal
//!   mendel genotype    — assign an animal's genotype on a pair
//!   mendel offspring   — offspring genotype and phenotype odds
//!   mendel coi         — coefficient of inbreeding for a pairing
//!   mendel validate    — full breeding compatibility assessment
//!   mendel demo        — run a self-contained demo

use mendel_core::breeding::{simulate_litter, tally, OffspringEngine, OffspringReport};
use mendel_core::config::BreedingConfig;
use mendel_core::error::{GeneticsError, GeneticsResult};
use mendel_core::genotype::{assign_genotype, gene_calls_for_animal, GenotypeDraft};
use mendel_core::labels::{assign_trait, create_trait, create_trait_type, traits_by_type, NewTraitLabel};
use mendel_core::locus::{
    GeneCategory, ImpactLevel, LocusRegistry, NewAllele, NewChromosome, NewGene, RiskLevel,
};
use mendel_core::pedigree::{expand_lineage, AnimalId, InbreedingCalculator, NewAnimal, Sex};
use mendel_core::storage::{GeneticsStore, MemoryStore};
use mendel_core::validate_breeding_pair;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::env;
use std::str::FromStr;

const STORE_FILE: &str = "mendel-store.json";
const CONFIG_FILE: &str = "mendel-config.json";

fn print_usage() {
    println!(
        r#"
Mendel v0.1 — Breeding Genetics Engine

Usage: mendel <command> [options]

Commands:
  species    [<common-name> <scientific-name>]                 Register or list species
  chromosome <species> <number> <name>                         Register a chromosome
  pair       <maternal-chr> <paternal-chr> <pattern>           Create a chromosome pair
  pattern    <pair> <pattern>                                  Change a pair's inheritance pattern
  gene       <pair> <name> <position> [category] [impact]      Register a gene
  allele     <gene> <symbol> <name> [wild|variant] [risk] [notes...]
  genes                                                        List genes and their alleles
  animal     <name> <species> <sex> [dam|-] [sire|-]           Register an animal
  genotype   <animal> <pair> <maternal-allele> <paternal-allele>
  genemap    <animal>                                          Show an animal's genotypes
  offspring  <animal-a> <animal-b> [male|female]               Offspring odds per gene
  litter     <animal-a> <animal-b> <size> [seed]               Simulate a litter
  coi        <animal-a> <animal-b>                             Coefficient of inbreeding
  lineage    <animal> [generations]                            Ancestry table
  validate   <animal-a> <animal-b>                             Breeding compatibility assessment
  trait-type <name>                                            Register a trait type
  trait      <species> <trait-type> <name>                     Register a trait label
  tag        <animal> <trait>                                  Attach a trait to an animal
  traits     <animal>                                          List an animal's traits
  demo                                                         Run a self-contained demo

Patterns: autosomal-dominant, autosomal-recessive, x-linked-dominant,
          x-linked-recessive, mitochondrial, polygenic

Store: {store}   Config: {config} (optional)
"#,
        store = STORE_FILE,
        config = CONFIG_FILE
    );
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    let rest = &args[2..];
    let result = match args[1].as_str() {
        "species" => cmd_species(rest),
        "chromosome" => cmd_chromosome(rest),
        "pair" => cmd_pair(rest),
        "pattern" => cmd_pattern(rest),
        "gene" => cmd_gene(rest),
        "allele" => cmd_allele(rest),
        "genes" => cmd_genes(),
        "animal" => cmd_animal(rest),
        "genotype" => cmd_genotype(rest),
        "genemap" => cmd_genemap(rest),
        "offspring" => cmd_offspring(rest),
        "litter" => cmd_litter(rest),
        "coi" => cmd_coi(rest),
        "lineage" => cmd_lineage(rest),
        "validate" => cmd_validate(rest),
        "trait-type" => cmd_trait_type(rest),
        "trait" => cmd_trait(rest),
        "tag" => cmd_tag(rest),
        "traits" => cmd_traits(rest),
        "demo" => cmd_demo(),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("  Error ({:?}): {}", e.kind(), e);
        std::process::exit(1);
    }
}

/// Positional argument parsed into `T`
fn arg<T: FromStr>(args: &[String], index: usize, field: &'static str) -> GeneticsResult<T> {
    let raw = args.get(index).ok_or(GeneticsError::MissingField(field))?;
    raw.parse()
        .map_err(|_| GeneticsError::invalid(field, format!("cannot parse '{}'", raw)))
}

/// Optional parent id; "-" or absent means unknown
fn parent_arg(args: &[String], index: usize, field: &'static str) -> GeneticsResult<Option<AnimalId>> {
    match args.get(index).map(|s| s.as_str()) {
        None | Some("-") => Ok(None),
        Some(_) => arg(args, index, field).map(Some),
    }
}

fn load_store() -> GeneticsResult<MemoryStore> {
    MemoryStore::open(STORE_FILE)
}

fn save_store(store: &mut MemoryStore) -> GeneticsResult<()> {
    store.save()?;
    println!("  Saved to {}", STORE_FILE);
    Ok(())
}

fn load_config() -> GeneticsResult<BreedingConfig> {
    BreedingConfig::load_or_default(CONFIG_FILE)
}

fn cmd_species(args: &[String]) -> GeneticsResult<()> {
    let mut store = load_store()?;
    if args.is_empty() {
        let species = LocusRegistry::new(&mut store).list_species();
        if species.is_empty() {
            println!("\n  No species. Use 'mendel species <common> <scientific>' or 'mendel demo'.");
        }
        for s in species {
            println!("  [{}] {} ({})", s.id, s.common_name, s.scientific_name);
        }
        return Ok(());
    }
    let common: String = arg(args, 0, "common_name")?;
    let scientific = args.get(1).cloned().unwrap_or_default();
    let species = LocusRegistry::new(&mut store).create_species(&common, &scientific)?;
    println!("\n  Created species [{}] {}", species.id, species.common_name);
    save_store(&mut store)
}

fn cmd_chromosome(args: &[String]) -> GeneticsResult<()> {
    let mut store = load_store()?;
    let new = NewChromosome {
        species_id: arg(args, 0, "species_id")?,
        number: arg(args, 1, "number")?,
        name: arg(args, 2, "name")?,
        ..Default::default()
    };
    let chromosome = LocusRegistry::new(&mut store).create_chromosome(new)?;
    println!("\n  Created chromosome [{}] {} (#{})", chromosome.id, chromosome.name, chromosome.number);
    save_store(&mut store)
}

fn cmd_pair(args: &[String]) -> GeneticsResult<()> {
    let mut store = load_store()?;
    let pattern: String = arg(args, 2, "inheritance_pattern")?;
    let pair = LocusRegistry::new(&mut store).create_chromosome_pair(
        arg(args, 0, "maternal_chromosome_id")?,
        arg(args, 1, "paternal_chromosome_id")?,
        &pattern,
    )?;
    println!("\n  Created pair [{}] {}", pair.id, pair.inheritance_pattern);
    save_store(&mut store)
}

fn cmd_pattern(args: &[String]) -> GeneticsResult<()> {
    let mut store = load_store()?;
    let pattern: String = arg(args, 1, "inheritance_pattern")?;
    let pair = LocusRegistry::new(&mut store).update_inheritance_pattern(arg(args, 0, "pair_id")?, &pattern)?;
    println!("\n  Pair [{}] is now {}", pair.id, pair.inheritance_pattern);
    save_store(&mut store)
}

fn cmd_gene(args: &[String]) -> GeneticsResult<()> {
    let mut store = load_store()?;
    let mut new = NewGene::new(arg(args, 0, "pair_id")?, arg::<String>(args, 1, "name")?, arg(args, 2, "position")?);
    if let Some(category) = args.get(3) {
        new.category = category.parse::<GeneCategory>()?;
    }
    if let Some(impact) = args.get(4) {
        new.impact_level = impact.parse::<ImpactLevel>()?;
        new.requires_monitoring = new.impact_level == ImpactLevel::Critical;
    }
    let gene = LocusRegistry::new(&mut store).create_gene(new)?;
    println!(
        "\n  Created gene [{}] {} at position {} ({}, {})",
        gene.id, gene.name, gene.position, gene.category, gene.impact_level
    );
    save_store(&mut store)
}

fn cmd_allele(args: &[String]) -> GeneticsResult<()> {
    let mut store = load_store()?;
    let mut new = NewAllele::new(
        arg(args, 0, "gene_id")?,
        arg::<String>(args, 1, "symbol")?,
        arg::<String>(args, 2, "name")?,
    );
    match args.get(3).map(|s| s.as_str()) {
        None | Some("variant") => {}
        Some("wild") => new = new.wild_type(),
        Some(other) => return Err(GeneticsError::unknown("allele kind", other)),
    }
    if let Some(risk) = args.get(4) {
        let notes = args[5..].join(" ");
        new.risk_level = risk.parse::<RiskLevel>()?;
        if !notes.is_empty() {
            new.management_notes = Some(notes);
        }
    }
    let allele = LocusRegistry::new(&mut store).create_allele(new)?;
    println!(
        "\n  Created allele [{}] {} ({}){}",
        allele.id,
        allele.symbol,
        allele.name,
        if allele.is_wild_type { " wild-type" } else { "" }
    );
    save_store(&mut store)
}

fn cmd_genes() -> GeneticsResult<()> {
    let store = load_store()?;
    let genes = store.genes();
    if genes.is_empty() {
        println!("\n  No genes registered.");
        return Ok(());
    }
    println!("\n  Genes ({}):", genes.len());
    println!("  {}", "-".repeat(72));
    for gene in genes {
        let pattern = store
            .chromosome_pair(gene.pair_id)
            .map(|p| p.inheritance_pattern.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!(
            "  [{}] {:<12} pair {} pos {} | {} | {} | {}",
            gene.id, gene.name, gene.pair_id, gene.position, pattern, gene.category, gene.impact_level
        );
        for allele in store.alleles_for_gene(gene.id) {
            println!(
                "      [{}] {:<4} {}{}",
                allele.id,
                allele.symbol,
                allele.name,
                if allele.is_wild_type { " (wild-type)" } else { "" }
            );
        }
    }
    Ok(())
}

fn cmd_animal(args: &[String]) -> GeneticsResult<()> {
    let mut store = load_store()?;
    let sex: Sex = args.get(2).ok_or(GeneticsError::MissingField("sex"))?.parse()?;
    let new = NewAnimal::new(arg::<String>(args, 0, "name")?, arg(args, 1, "species_id")?, sex)
        .with_parents(parent_arg(args, 3, "dam_id")?, parent_arg(args, 4, "sire_id")?);
    let animal = store.add_animal(new)?;
    println!("\n  Created animal [{}] {} ({})", animal.id, animal.name, animal.sex);
    save_store(&mut store)
}

fn cmd_genotype(args: &[String]) -> GeneticsResult<()> {
    let mut store = load_store()?;
    let draft = GenotypeDraft {
        animal_id: arg(args, 0, "animal_id")?,
        pair_id: arg(args, 1, "pair_id")?,
        maternal_allele_id: arg(args, 2, "maternal_allele_id")?,
        paternal_allele_id: arg(args, 3, "paternal_allele_id")?,
    };
    let genotype = assign_genotype(&mut store, draft)?;
    println!(
        "\n  Genotype [{}] animal {} pair {}: {}/{}",
        genotype.id, genotype.animal_id, genotype.pair_id, genotype.maternal_allele_id, genotype.paternal_allele_id
    );
    save_store(&mut store)
}

fn cmd_genemap(args: &[String]) -> GeneticsResult<()> {
    let store = load_store()?;
    let animal: AnimalId = arg(args, 0, "animal_id")?;
    let calls = gene_calls_for_animal(&store, animal);
    if calls.is_empty() {
        println!("\n  Animal {} has no genotypes recorded.", animal);
        return Ok(());
    }
    println!("\n  Gene map for animal {}:", animal);
    for (name, call) in calls {
        println!(
            "  {:<12} {:<8} {:?} ({} / {})",
            name,
            call.label(),
            call.zygosity(),
            call.maternal.name,
            call.paternal.name
        );
    }
    Ok(())
}

fn print_offspring(report: &OffspringReport) {
    println!("\n  Dam {} x Sire {}", report.dam_id, report.sire_id);
    for (name, pred) in &report.genes {
        println!("  {} ({})", name, pred.pattern);
        let Some(dist) = pred.distribution() else {
            println!("      unknown: no genotype recorded for one of the parents");
            continue;
        };
        for outcome in &dist.genotypes {
            println!(
                "      {:<8} {:>6.2}%{}",
                outcome.label(),
                outcome.probability * 100.0,
                outcome.phenotype.map(|c| format!("  {}", c)).unwrap_or_default()
            );
        }
        if dist.requires_offspring_sex {
            println!("      (x-linked: pass male|female for sex-specific odds)");
        }
    }
    let combined = report.combined_phenotypes();
    if combined.len() > 1 {
        println!("\n  Combined phenotypes:");
        for c in combined {
            let classes: Vec<String> = c.classes.iter().map(|(g, class)| format!("{}={}", g, class)).collect();
            println!("      {:>6.2}%  {}", c.probability * 100.0, classes.join(", "));
        }
    }
}

fn cmd_offspring(args: &[String]) -> GeneticsResult<()> {
    let store = load_store()?;
    let sex = args.get(2).map(|s| s.parse::<Sex>()).transpose()?;
    let report = OffspringEngine::new(&store).predict(arg(args, 0, "animal_a")?, arg(args, 1, "animal_b")?, sex)?;
    print_offspring(&report);
    Ok(())
}

fn cmd_litter(args: &[String]) -> GeneticsResult<()> {
    let store = load_store()?;
    let size: usize = arg(args, 2, "size")?;
    let seed: u64 = match args.get(3) {
        Some(_) => arg(args, 3, "seed")?,
        None => rand::random(),
    };
    let report = OffspringEngine::new(&store).predict(arg(args, 0, "animal_a")?, arg(args, 1, "animal_b")?, None)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let litter = simulate_litter(&report, size, &mut rng);
    println!("\n  Simulated litter of {} (seed {}):", size, seed);
    for pup in &litter {
        let genotypes: Vec<String> = pup.genotypes.iter().map(|(g, l)| format!("{}={}", g, l)).collect();
        println!("  #{:<3} {}", pup.index + 1, genotypes.join("  "));
    }
    for (gene, counts) in tally(&litter) {
        let parts: Vec<String> = counts.iter().map(|(l, n)| format!("{} x{}", l, n)).collect();
        println!("  {:<12} {}", gene, parts.join(", "));
    }
    Ok(())
}

fn cmd_coi(args: &[String]) -> GeneticsResult<()> {
    let store = load_store()?;
    let config = load_config()?;
    let report = InbreedingCalculator::new(&store)
        .with_max_generations(config.max_generations)
        .report(arg(args, 0, "animal_a")?, arg(args, 1, "animal_b")?);
    println!("\n  Coefficient of inbreeding: {:.4} ({:.2}%)", report.coefficient, report.percent());
    for c in &report.contributions {
        println!(
            "  ancestor {:<6} paths {:<3} shortest loop {:<3} F_A {:.4} -> {:.4}",
            c.ancestor_id, c.path_pairs, c.shortest_loop, c.ancestor_coefficient, c.contribution
        );
    }
    if report.truncated {
        println!("  (pedigree extends past {} generations; deeper ancestry ignored)", config.max_generations);
    }
    Ok(())
}

fn cmd_lineage(args: &[String]) -> GeneticsResult<()> {
    let store = load_store()?;
    let config = load_config()?;
    let animal: AnimalId = arg(args, 0, "animal_id")?;
    let depth: u32 = match args.get(1) {
        Some(_) => arg(args, 1, "generations")?,
        None => config.max_generations,
    };
    let edges = expand_lineage(&store, animal, depth);
    if edges.is_empty() {
        println!("\n  No known ancestors for animal {}.", animal);
        return Ok(());
    }
    println!("\n  Lineage of animal {}:", animal);
    for edge in edges {
        println!(
            "  gen {:<2} slot {:<4} {:?} ancestor {}",
            edge.generation, edge.sequence, edge.relationship, edge.ancestor_id
        );
    }
    Ok(())
}

fn cmd_validate(args: &[String]) -> GeneticsResult<()> {
    let store = load_store()?;
    let config = load_config()?;
    let assessment = validate_breeding_pair(&store, &config, arg(args, 0, "animal_a")?, arg(args, 1, "animal_b")?)?;
    println!("\n  Assessment {}", assessment.assessment_id);
    println!("  {}", assessment.summary());
    for w in &assessment.warnings {
        println!("  warning: {}", w);
    }
    for r in &assessment.risks {
        println!("  risk: {}", r.description);
        println!("        {}", r.management_recommendation);
    }
    Ok(())
}

fn cmd_trait_type(args: &[String]) -> GeneticsResult<()> {
    let mut store = load_store()?;
    let name: String = arg(args, 0, "name")?;
    let kind = create_trait_type(&mut store, &name)?;
    println!("\n  Created trait type [{}] {}", kind.id, kind.name);
    save_store(&mut store)
}

fn cmd_trait(args: &[String]) -> GeneticsResult<()> {
    let mut store = load_store()?;
    let label = create_trait(
        &mut store,
        NewTraitLabel {
            species_id: arg(args, 0, "species_id")?,
            trait_type_id: arg(args, 1, "trait_type_id")?,
            name: arg(args, 2, "name")?,
            description: None,
        },
    )?;
    println!("\n  Created trait [{}] {}", label.id, label.name);
    save_store(&mut store)
}

fn cmd_tag(args: &[String]) -> GeneticsResult<()> {
    let mut store = load_store()?;
    let tagged = assign_trait(&mut store, arg(args, 0, "animal_id")?, arg(args, 1, "trait_id")?)?;
    println!("\n  Animal {} tagged with trait {}", tagged.animal_id, tagged.trait_id);
    save_store(&mut store)
}

fn cmd_traits(args: &[String]) -> GeneticsResult<()> {
    let store = load_store()?;
    let animal: AnimalId = arg(args, 0, "animal_id")?;
    let grouped = traits_by_type(&store, animal);
    if grouped.is_empty() {
        println!("\n  Animal {} has no traits.", animal);
    }
    for (kind, names) in grouped {
        println!("  {:<12} {}", kind, names.join(", "));
    }
    Ok(())
}

/// Build a small kennel in memory and walk through every engine
fn cmd_demo() -> GeneticsResult<()> {
    println!("\n  === Mendel demo ===");
    let mut store = MemoryStore::new();
    let config = BreedingConfig::default();

    let (dog, pra, pra_wild, pra_variant, coat, coat_b, coat_bb) = {
        let mut reg = LocusRegistry::new(&mut store);
        let dog = reg.create_species("Dog", "Canis familiaris")?;
        let chr1 = reg.create_chromosome(NewChromosome { species_id: dog.id, name: "CFA1".into(), number: 1, ..Default::default() })?;
        let chr11 = reg.create_chromosome(NewChromosome { species_id: dog.id, name: "CFA11".into(), number: 11, ..Default::default() })?;
        let pra = reg.create_chromosome_pair(chr1.id, chr1.id, "autosomal-recessive")?;
        let coat = reg.create_chromosome_pair(chr11.id, chr11.id, "autosomal-recessive")?;

        let pra_gene = reg.create_gene(NewGene::new(pra.id, "PRA-prcd", 1).critical())?;
        let pra_wild = reg.create_allele(NewAllele::new(pra_gene.id, "+", "Normal").wild_type())?;
        let pra_variant = reg.create_allele(
            NewAllele::new(pra_gene.id, "a", "prcd")
                .with_phenotype("progressive retinal atrophy")
                .with_risk(RiskLevel::High, "Breed affected or carrier animals only to DNA-clear mates."),
        )?;
        let coat_gene = reg.create_gene(NewGene::new(coat.id, "TYRP1", 1))?;
        let coat_b = reg.create_allele(NewAllele::new(coat_gene.id, "B", "Black").wild_type())?;
        let coat_bb = reg.create_allele(NewAllele::new(coat_gene.id, "b", "Brown").with_phenotype("liver coat"))?;
        (dog, pra.id, pra_wild.id, pra_variant.id, coat.id, coat_b.id, coat_bb.id)
    };
    println!("  Registered {} with {} genes", dog.common_name, store.genes().len());

    let gran = store.add_animal(NewAnimal::new("Gran", dog.id, Sex::Female))?;
    let gramps = store.add_animal(NewAnimal::new("Gramps", dog.id, Sex::Male))?;
    let bess = store.add_animal(NewAnimal::new("Bess", dog.id, Sex::Female).with_parents(Some(gran.id), Some(gramps.id)))?;
    let max = store.add_animal(NewAnimal::new("Max", dog.id, Sex::Male).with_parents(Some(gran.id), Some(gramps.id)))?;
    let rex = store.add_animal(NewAnimal::new("Rex", dog.id, Sex::Male))?;

    for (animal, pair, m, p) in [
        (bess.id, pra, pra_wild, pra_variant),
        (max.id, pra, pra_variant, pra_variant),
        (rex.id, pra, pra_variant, pra_variant),
        (bess.id, coat, coat_b, coat_bb),
        (rex.id, coat, coat_b, coat_bb),
    ] {
        assign_genotype(&mut store, GenotypeDraft { animal_id: animal, pair_id: pair, maternal_allele_id: m, paternal_allele_id: p })?;
    }

    println!("\n  --- Offspring: Bess x Rex ---");
    let report = OffspringEngine::new(&store).predict(bess.id, rex.id, None)?;
    print_offspring(&report);

    println!("\n  --- Litter of 6 ---");
    let mut rng = StdRng::seed_from_u64(2024);
    for pup in simulate_litter(&report, 6, &mut rng) {
        let genotypes: Vec<String> = pup.genotypes.iter().map(|(g, l)| format!("{}={}", g, l)).collect();
        println!("  #{} {}", pup.index + 1, genotypes.join("  "));
    }

    for (label, mate) in [("Bess x Max (full siblings)", max.id), ("Bess x Rex (unrelated)", rex.id)] {
        println!("\n  --- Assessment: {} ---", label);
        let assessment = validate_breeding_pair(&store, &config, bess.id, mate)?;
        println!("  {}", assessment.summary());
        for w in &assessment.warnings {
            println!("  warning: {}", w);
        }
        for r in &assessment.risks {
            println!("  risk: {}", r.description);
        }
    }

    let blocked = validate_breeding_pair(&store, &config, max.id, rex.id)?;
    println!("\n  Max x Rex: {}", blocked.summary());
    println!("\n  === Demo complete ===");
    Ok(())
}
