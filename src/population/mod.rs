//! Bounded FIFO population of dendritic cells.
//!
//! The distinguishing DCA mechanic lives here: every tick, the *current*
//! record's contribution is added to every still-live cell before a new cell
//! is created, so late-arriving evidence is retroactively folded into all
//! open cells. The per-tick pass over the population is O(capacity) per
//! input record, which is intentional for the bounded-population design.

use std::collections::VecDeque;
use std::ops::AddAssign;

/// Cumulative per-cell sums. Which fields are meaningful depends on the
/// configured decision rule; the others simply stay at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Accumulators {
    /// Co-stimulatory strength (dDCA and classic DCA)
    pub csm: f64,
    /// Signed maturation sum whose sign decides the dDCA verdict
    pub k: f64,
    /// Running `danger - safe` sum for the majority-live rule
    pub context: f64,
    /// Semi-mature evidence (classic DCA)
    pub semi: f64,
    /// Mature evidence (classic DCA)
    pub mature: f64,
}

impl AddAssign for Accumulators {
    fn add_assign(&mut self, rhs: Self) {
        self.csm += rhs.csm;
        self.k += rhs.k;
        self.context += rhs.context;
        self.semi += rhs.semi;
        self.mature += rhs.mature;
    }
}

/// One dendritic cell, created exactly once per record.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Antigen of the creation record
    pub antigen: String,
    pub acc: Accumulators,
}

/// FIFO collection of at most `capacity` live cells.
///
/// The population exclusively owns its cells; a retired cell is handed back
/// by value and no longer referenced here.
#[derive(Debug)]
pub struct CellPopulation {
    cells: VecDeque<Cell>,
    capacity: usize,
}

impl CellPopulation {
    pub fn new(capacity: usize) -> Self {
        Self {
            cells: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Advance the population by one record: expose every live cell to this
    /// record's contribution, create the record's own cell seeded with that
    /// same contribution, then evict the oldest cell once over capacity.
    ///
    /// Returns the retiring cell, or `None` while the population is still
    /// filling up.
    pub fn tick(&mut self, antigen: &str, contribution: Accumulators) -> Option<Cell> {
        for cell in &mut self.cells {
            cell.acc += contribution;
        }
        self.cells.push_back(Cell {
            antigen: antigen.to_string(),
            acc: contribution,
        });
        if self.cells.len() > self.capacity {
            self.cells.pop_front()
        } else {
            None
        }
    }
}
