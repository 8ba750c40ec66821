//! Inbreeding coefficient by path counting
//!
//! For a candidate mating of P1 and P2, every common ancestor A found within
//! the generation budget contributes `(1/2)^(L1 + L2 + 1) * (1 + F_A)` for
//! each pair of paths P1→A and P2→A that meet only at A. `F_A` is computed
//! the same way from A's own dam and sire with one generation less budget,
//! so the recursion always terminates. Branches beyond the budget, unknown
//! parents and cycles contribute nothing.

use super::animal::{AncestryReader, AnimalId};
use crate::config::DEFAULT_MAX_GENERATIONS;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One ancestor's share of the coefficient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AncestorContribution {
    pub ancestor_id: AnimalId,
    /// Number of qualifying path pairs through this ancestor
    pub path_pairs: usize,
    /// Shortest combined path length `L1 + L2`
    pub shortest_loop: u32,
    /// The ancestor's own coefficient used in the terms
    pub ancestor_coefficient: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InbreedingReport {
    pub first: AnimalId,
    pub second: AnimalId,
    /// In [0, 1]
    pub coefficient: f64,
    /// Largest contribution first
    pub contributions: Vec<AncestorContribution>,
    /// Known ancestry extended beyond the generation budget
    pub truncated: bool,
}

impl InbreedingReport {
    pub fn percent(&self) -> f64 {
        self.coefficient * 100.0
    }
}

/// A route from a starting animal up to one of its ancestors, both ends included
struct AncestorPath {
    nodes: Vec<AnimalId>,
}

impl AncestorPath {
    fn ancestor(&self) -> AnimalId {
        self.nodes[self.nodes.len() - 1]
    }

    fn length(&self) -> u32 {
        (self.nodes.len() - 1) as u32
    }

    /// Paths may only share their common ancestor
    fn meets_only_at_end(&self, other: &AncestorPath) -> bool {
        let ours = &self.nodes[..self.nodes.len() - 1];
        let theirs = &other.nodes[..other.nodes.len() - 1];
        !ours.iter().any(|n| theirs.contains(n))
    }
}

/// Walk state for one calculation
#[derive(Default)]
struct Walk {
    memo: HashMap<(AnimalId, u32), f64>,
    truncated: bool,
}

pub struct InbreedingCalculator<'a, R: AncestryReader + ?Sized> {
    reader: &'a R,
    max_generations: u32,
}

impl<'a, R: AncestryReader + ?Sized> InbreedingCalculator<'a, R> {
    pub fn new(reader: &'a R) -> Self {
        Self {
            reader,
            max_generations: DEFAULT_MAX_GENERATIONS,
        }
    }

    pub fn with_max_generations(mut self, generations: u32) -> Self {
        self.max_generations = generations;
        self
    }

    /// Coefficient of a hypothetical offspring of `first` and `second`
    pub fn coefficient(&self, first: AnimalId, second: AnimalId) -> f64 {
        self.report(first, second).coefficient
    }

    /// An animal's own coefficient, i.e. that of its dam mated to its sire.
    ///
    /// Zero when either parent is unknown.
    pub fn self_coefficient(&self, animal: AnimalId) -> f64 {
        match self.reader.parents(animal) {
            [Some(dam), Some(sire)] => self.coefficient(dam, sire),
            _ => 0.0,
        }
    }

    pub fn report(&self, first: AnimalId, second: AnimalId) -> InbreedingReport {
        let mut walk = Walk::default();
        let mut contributions = self.contributions(first, second, self.max_generations, &mut walk);
        contributions.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));
        let coefficient = contributions
            .iter()
            .map(|c| c.contribution)
            .sum::<f64>()
            .clamp(0.0, 1.0);
        debug!(
            "Inbreeding {} x {}: {:.4} from {} common ancestors{}",
            first,
            second,
            coefficient,
            contributions.len(),
            if walk.truncated { " (truncated)" } else { "" }
        );
        InbreedingReport {
            first,
            second,
            coefficient,
            contributions,
            truncated: walk.truncated,
        }
    }

    fn contributions(
        &self,
        first: AnimalId,
        second: AnimalId,
        budget: u32,
        walk: &mut Walk,
    ) -> Vec<AncestorContribution> {
        let left = self.paths_from(first, budget, walk);
        let right = self.paths_from(second, budget, walk);

        let mut right_by_ancestor: HashMap<AnimalId, Vec<&AncestorPath>> = HashMap::new();
        for path in &right {
            right_by_ancestor.entry(path.ancestor()).or_default().push(path);
        }

        let mut by_ancestor: HashMap<AnimalId, AncestorContribution> = HashMap::new();
        for l in &left {
            let Some(matches) = right_by_ancestor.get(&l.ancestor()) else {
                continue;
            };
            for r in matches {
                if !l.meets_only_at_end(r) {
                    continue;
                }
                let ancestor = l.ancestor();
                let f_a = self.ancestor_coefficient(ancestor, budget.saturating_sub(1), walk);
                let loop_len = l.length() + r.length();
                let term = 0.5f64.powi(loop_len as i32 + 1) * (1.0 + f_a);
                let entry = by_ancestor.entry(ancestor).or_insert(AncestorContribution {
                    ancestor_id: ancestor,
                    path_pairs: 0,
                    shortest_loop: loop_len,
                    ancestor_coefficient: f_a,
                    contribution: 0.0,
                });
                entry.path_pairs += 1;
                entry.shortest_loop = entry.shortest_loop.min(loop_len);
                entry.contribution += term;
            }
        }
        by_ancestor.into_values().collect()
    }

    fn ancestor_coefficient(&self, ancestor: AnimalId, budget: u32, walk: &mut Walk) -> f64 {
        let [dam, sire] = self.reader.parents(ancestor);
        let (Some(dam), Some(sire)) = (dam, sire) else {
            return 0.0;
        };
        if budget == 0 {
            walk.truncated = true;
            return 0.0;
        }
        if let Some(&f) = walk.memo.get(&(ancestor, budget)) {
            return f;
        }
        let f = self
            .contributions(dam, sire, budget, walk)
            .iter()
            .map(|c| c.contribution)
            .sum::<f64>()
            .clamp(0.0, 1.0);
        walk.memo.insert((ancestor, budget), f);
        f
    }

    /// Every path from `start` up to `depth` generations, including the empty
    /// path ending at `start` itself. Iterative, with an explicit stack.
    fn paths_from(&self, start: AnimalId, depth: u32, walk: &mut Walk) -> Vec<AncestorPath> {
        let mut paths = Vec::new();
        let mut stack = vec![vec![start]];
        while let Some(nodes) = stack.pop() {
            let here = nodes[nodes.len() - 1];
            let generation = (nodes.len() - 1) as u32;
            let parents = self.reader.parents(here);
            if generation >= depth {
                if parents.iter().any(Option::is_some) {
                    walk.truncated = true;
                }
            } else {
                for parent in parents.into_iter().flatten() {
                    if nodes.contains(&parent) {
                        warn!("Pedigree cycle through animal {}, ignoring that branch", parent);
                        continue;
                    }
                    let mut extended = nodes.clone();
                    extended.push(parent);
                    stack.push(extended);
                }
            }
            paths.push(AncestorPath { nodes });
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pedigree::{Animal, Sex};

    const EPS: f64 = 1e-12;

    /// Pedigree keyed by id, parents as (dam, sire)
    struct Pedigree(HashMap<AnimalId, (Option<AnimalId>, Option<AnimalId>)>);

    impl Pedigree {
        fn new(rows: &[(AnimalId, Option<AnimalId>, Option<AnimalId>)]) -> Self {
            Self(rows.iter().map(|&(id, d, s)| (id, (d, s))).collect())
        }

        fn stub(&self, id: AnimalId) -> Animal {
            let (dam_id, sire_id) = self.0.get(&id).copied().unwrap_or((None, None));
            Animal {
                id,
                name: id.to_string(),
                species_id: 1,
                sex: Sex::Unknown,
                dam_id,
                sire_id,
            }
        }
    }

    impl AncestryReader for Pedigree {
        fn dam(&self, id: AnimalId) -> Option<Animal> {
            self.0.get(&id)?.0.map(|d| self.stub(d))
        }
        fn sire(&self, id: AnimalId) -> Option<Animal> {
            self.0.get(&id)?.1.map(|s| self.stub(s))
        }
    }

    #[test]
    fn test_unrelated_is_zero() {
        let ped = Pedigree::new(&[
            (1, None, None),
            (2, None, None),
            (3, None, None),
            (4, None, None),
            (10, Some(1), Some(2)),
            (11, Some(3), Some(4)),
        ]);
        let calc = InbreedingCalculator::new(&ped);
        let report = calc.report(10, 11);
        assert_eq!(report.coefficient, 0.0);
        assert!(report.contributions.is_empty());
        assert!(!report.truncated);
    }

    #[test]
    fn test_no_pedigree_at_all() {
        let ped = Pedigree::new(&[]);
        let calc = InbreedingCalculator::new(&ped);
        assert_eq!(calc.coefficient(100, 200), 0.0);
        assert_eq!(calc.self_coefficient(100), 0.0);
    }

    #[test]
    fn test_full_siblings() {
        let ped = Pedigree::new(&[
            (1, None, None),
            (2, None, None),
            (10, Some(1), Some(2)),
            (11, Some(1), Some(2)),
        ]);
        let calc = InbreedingCalculator::new(&ped);
        assert!((calc.coefficient(10, 11) - 0.25).abs() < EPS);
    }

    #[test]
    fn test_full_siblings_with_known_grandparents() {
        // grandparents are reachable from both sibs but only through the shared parents
        let ped = Pedigree::new(&[
            (1, Some(5), Some(6)),
            (2, Some(7), Some(8)),
            (10, Some(1), Some(2)),
            (11, Some(1), Some(2)),
        ]);
        let calc = InbreedingCalculator::new(&ped);
        let report = calc.report(10, 11);
        assert!((report.coefficient - 0.25).abs() < EPS);
        assert_eq!(report.contributions.len(), 2);
    }

    #[test]
    fn test_half_siblings() {
        let ped = Pedigree::new(&[
            (10, Some(1), Some(2)),
            (11, Some(3), Some(2)),
        ]);
        let calc = InbreedingCalculator::new(&ped);
        assert!((calc.coefficient(10, 11) - 0.125).abs() < EPS);
    }

    #[test]
    fn test_parent_offspring() {
        let ped = Pedigree::new(&[(10, Some(1), Some(2))]);
        let calc = InbreedingCalculator::new(&ped);
        let report = calc.report(10, 2);
        assert!((report.coefficient - 0.25).abs() < EPS);
        assert_eq!(report.contributions[0].ancestor_id, 2);
        assert_eq!(report.contributions[0].shortest_loop, 1);
    }

    #[test]
    fn test_first_cousins() {
        let ped = Pedigree::new(&[
            (3, Some(1), Some(2)),
            (4, Some(1), Some(2)),
            (10, Some(3), Some(20)),
            (11, Some(21), Some(4)),
        ]);
        let calc = InbreedingCalculator::new(&ped);
        assert!((calc.coefficient(10, 11) - 0.0625).abs() < EPS);
    }

    #[test]
    fn test_inbred_common_ancestor() {
        // 3 is itself the product of a full-sib mating (F = 0.25); 10 and 11 are half-sibs through 3
        let ped = Pedigree::new(&[
            (5, Some(1), Some(2)),
            (6, Some(1), Some(2)),
            (3, Some(5), Some(6)),
            (10, Some(3), Some(30)),
            (11, Some(3), Some(31)),
        ]);
        let calc = InbreedingCalculator::new(&ped);
        assert!((calc.self_coefficient(3) - 0.25).abs() < EPS);
        let report = calc.report(10, 11);
        assert!((report.coefficient - 0.125 * 1.25).abs() < EPS);
        assert!((report.contributions[0].ancestor_coefficient - 0.25).abs() < EPS);
    }

    #[test]
    fn test_self_coefficient_of_sib_mating_offspring() {
        let ped = Pedigree::new(&[
            (10, Some(1), Some(2)),
            (11, Some(1), Some(2)),
            (20, Some(10), Some(11)),
        ]);
        let calc = InbreedingCalculator::new(&ped);
        assert!((calc.self_coefficient(20) - 0.25).abs() < EPS);
        assert_eq!(calc.self_coefficient(1), 0.0);
    }

    #[test]
    fn test_cycle_terminates() {
        // 1 and 2 are recorded as each other's dam
        let ped = Pedigree::new(&[
            (1, Some(2), None),
            (2, Some(1), None),
            (10, Some(1), None),
            (11, Some(2), None),
        ]);
        let calc = InbreedingCalculator::new(&ped);
        let f = calc.coefficient(10, 11);
        assert!((0.0..=1.0).contains(&f));
    }

    #[test]
    fn test_depth_budget_truncates() {
        // common ancestor 1 sits three generations above both animals
        let ped = Pedigree::new(&[
            (2, Some(1), None),
            (3, Some(1), None),
            (4, Some(2), None),
            (5, Some(3), None),
            (10, Some(4), None),
            (11, Some(5), None),
        ]);
        let deep = InbreedingCalculator::new(&ped);
        assert!((deep.coefficient(10, 11) - 0.5f64.powi(7)).abs() < EPS);

        let shallow = InbreedingCalculator::new(&ped).with_max_generations(2);
        let report = shallow.report(10, 11);
        assert_eq!(report.coefficient, 0.0);
        assert!(report.truncated);
    }
}
