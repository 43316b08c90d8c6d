//! Dense coverage state used while generating.
//!
//! One table per t-subset of positions, one cell per value combination,
//! addressed in mixed radix so that cell order equals enumeration order.

use crate::constraint::ExclusionSet;
use crate::obligation::{Combinations, Obligation};
use crate::rng::SeededRng;
use crate::space::ParameterSpace;
use crate::submodel::{Submodel, extra_subsets};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Uncovered,
    Covered,
    /// Blocked by an exclusion or found to have no exclusion-free row.
    Excluded,
}

#[derive(Debug, Clone)]
struct SubsetTable {
    positions: Vec<usize>,
    strides: Vec<usize>,
    cells: Vec<Cell>,
    uncovered: usize,
}

impl SubsetTable {
    fn new(space: &ParameterSpace, positions: Vec<usize>) -> Self {
        let mut strides = vec![1; positions.len()];
        for i in (0..positions.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * space.value_count(positions[i + 1]);
        }
        let size = positions.iter().map(|&p| space.value_count(p)).product();
        Self {
            positions,
            strides,
            cells: vec![Cell::Uncovered; size],
            uncovered: size,
        }
    }

    fn index(&self, row: &[usize]) -> usize {
        self.positions
            .iter()
            .zip(&self.strides)
            .map(|(&p, &s)| row[p] * s)
            .sum()
    }

    fn decode(&self, mut idx: usize) -> Obligation {
        let values = self
            .strides
            .iter()
            .map(|&s| {
                let v = idx / s;
                idx %= s;
                v
            })
            .collect();
        Obligation::new(self.positions.clone(), values)
    }
}

/// Handle to one obligation cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CellRef {
    table: usize,
    cell: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct CoverageTracker {
    tables: Vec<SubsetTable>,
    touching: Vec<Vec<usize>>,
    total: u64,
    remaining: u64,
    excluded: u64,
}

impl CoverageTracker {
    /// Model t-subsets first, then the submodels' extra subsets. Caller has
    /// already checked that the obligation count fits the configured limit.
    pub(crate) fn new(
        space: &ParameterSpace,
        order: usize,
        submodels: &[Submodel],
        exclusions: &ExclusionSet,
    ) -> Self {
        let tables: Vec<SubsetTable> = Combinations::new(space.len(), order)
            .chain(extra_subsets(order, submodels))
            .map(|positions| SubsetTable::new(space, positions))
            .collect();
        let mut touching = vec![Vec::new(); space.len()];
        for (t, table) in tables.iter().enumerate() {
            for &p in &table.positions {
                touching[p].push(t);
            }
        }
        let total = tables.iter().map(|t| t.cells.len() as u64).sum();
        let mut tracker = Self {
            tables,
            touching,
            total,
            remaining: total,
            excluded: 0,
        };
        if !exclusions.is_empty() {
            for t in 0..tracker.tables.len() {
                for c in 0..tracker.tables[t].cells.len() {
                    if exclusions.blocks_obligation(&tracker.tables[t].decode(c)) {
                        tracker.exclude(CellRef { table: t, cell: c });
                    }
                }
            }
        }
        tracker
    }

    pub(crate) fn total(&self) -> u64 {
        self.total
    }

    pub(crate) fn remaining(&self) -> u64 {
        self.remaining
    }

    pub(crate) fn excluded(&self) -> u64 {
        self.excluded
    }

    /// Number of uncovered obligations `row` would satisfy.
    pub(crate) fn score(&self, row: &[usize]) -> usize {
        self.tables
            .iter()
            .filter(|t| t.cells[t.index(row)] == Cell::Uncovered)
            .count()
    }

    /// [`Self::score`] restricted to subsets containing `position`.
    pub(crate) fn score_touching(&self, row: &[usize], position: usize) -> usize {
        self.touching[position]
            .iter()
            .filter(|&&t| {
                let table = &self.tables[t];
                table.cells[table.index(row)] == Cell::Uncovered
            })
            .count()
    }

    /// Mark everything `row` satisfies as covered; returns how many were new.
    pub(crate) fn mark(&mut self, row: &[usize]) -> usize {
        let mut newly = 0;
        for table in &mut self.tables {
            let idx = table.index(row);
            if table.cells[idx] == Cell::Uncovered {
                table.cells[idx] = Cell::Covered;
                table.uncovered -= 1;
                newly += 1;
            }
        }
        self.remaining -= newly as u64;
        newly
    }

    pub(crate) fn exclude(&mut self, at: CellRef) {
        let table = &mut self.tables[at.table];
        if table.cells[at.cell] == Cell::Uncovered {
            table.cells[at.cell] = Cell::Excluded;
            table.uncovered -= 1;
            self.remaining -= 1;
            self.excluded += 1;
        }
    }

    pub(crate) fn is_uncovered(&self, at: CellRef) -> bool {
        self.tables[at.table].cells[at.cell] == Cell::Uncovered
    }

    pub(crate) fn obligation(&self, at: CellRef) -> Obligation {
        self.tables[at.table].decode(at.cell)
    }

    /// Uniformly chosen uncovered obligation, or `None` when done.
    pub(crate) fn random_uncovered(&self, rng: &mut SeededRng) -> Option<CellRef> {
        if self.remaining == 0 {
            return None;
        }
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        let mut nth = rng.below(remaining);
        for (t, table) in self.tables.iter().enumerate() {
            if nth >= table.uncovered {
                nth -= table.uncovered;
                continue;
            }
            let cell = table
                .cells
                .iter()
                .enumerate()
                .filter(|(_, c)| **c == Cell::Uncovered)
                .nth(nth)
                .map(|(i, _)| i)?;
            return Some(CellRef { table: t, cell });
        }
        None
    }

    /// Snapshot of every uncovered cell, in enumeration order.
    pub(crate) fn uncovered_cells(&self) -> Vec<CellRef> {
        self.tables
            .iter()
            .enumerate()
            .flat_map(|(t, table)| {
                table
                    .cells
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| **c == Cell::Uncovered)
                    .map(move |(cell, _)| CellRef { table: t, cell })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obligation::Obligations;

    #[test]
    fn cell_order_matches_enumeration() {
        let space = ParameterSpace::new(&[2, 3, 2]).unwrap();
        let tracker = CoverageTracker::new(&space, 2, &[], &ExclusionSet::empty(&space));
        let decoded: Vec<_> = tracker
            .uncovered_cells()
            .into_iter()
            .map(|c| tracker.obligation(c))
            .collect();
        let enumerated: Vec<_> = Obligations::new(&space, 2).unwrap().collect();
        assert_eq!(decoded, enumerated);
        assert_eq!(tracker.total(), 16);
    }

    #[test]
    fn marking_counts_new_cells_once() {
        let space = ParameterSpace::new(&[2, 2, 2]).unwrap();
        let mut tracker = CoverageTracker::new(&space, 2, &[], &ExclusionSet::empty(&space));
        assert_eq!(tracker.score(&[0, 1, 0]), 3);
        assert_eq!(tracker.mark(&[0, 1, 0]), 3);
        assert_eq!(tracker.mark(&[0, 1, 0]), 0);
        assert_eq!(tracker.score(&[0, 1, 1]), 2);
        assert_eq!(tracker.score_touching(&[0, 1, 1], 2), 2);
        assert_eq!(tracker.score_touching(&[0, 1, 1], 0), 1);
        assert_eq!(tracker.remaining(), 9);
    }

    #[test]
    fn exclusions_are_pre_marked() {
        let space = ParameterSpace::new(&[2, 2]).unwrap();
        let exclusions = ExclusionSet::new(&space, &[vec![(0, 1)]]).unwrap();
        let tracker = CoverageTracker::new(&space, 2, &[], &exclusions);
        assert_eq!(tracker.total(), 4);
        assert_eq!(tracker.excluded(), 2);
        assert_eq!(tracker.remaining(), 2);
    }

    #[test]
    fn random_uncovered_only_returns_open_cells() {
        let space = ParameterSpace::new(&[3, 3]).unwrap();
        let mut tracker = CoverageTracker::new(&space, 2, &[], &ExclusionSet::empty(&space));
        let mut rng = SeededRng::new(11);
        while let Some(at) = tracker.random_uncovered(&mut rng) {
            assert!(tracker.is_uncovered(at));
            let ob = tracker.obligation(at);
            let row: Vec<usize> = ob.values().to_vec();
            assert_eq!(tracker.mark(&row), 1);
        }
        assert_eq!(tracker.remaining(), 0);
    }

    #[test]
    fn submodel_subsets_get_their_own_tables() {
        let space = ParameterSpace::new(&[2, 2, 2]).unwrap();
        let triple = Submodel::new(&space, &[0, 1, 2], 3).unwrap();
        let mut tracker =
            CoverageTracker::new(&space, 2, &[triple], &ExclusionSet::empty(&space));
        assert_eq!(tracker.total(), 12 + 8);
        assert_eq!(tracker.score(&[1, 0, 1]), 4);
        assert_eq!(tracker.score_touching(&[1, 0, 1], 1), 3);
        tracker.mark(&[1, 0, 1]);
        let last = tracker.uncovered_cells().pop().unwrap();
        assert_eq!(tracker.obligation(last).positions(), &[0, 1, 2]);
    }
}
