//! Tableau rows and the row pool.
//!
//! A row with a basic variable reads `basic = constant + Σ coeff·var`. A row
//! without one is a pending constraint and reads `0 = constant + Σ coeff·var`.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use linea_core::{near_zero, RowId, VariableId};
use smallvec::SmallVec;

/// How a term update changed the set of variables in a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TermChange {
    Inserted,
    Updated,
    Removed,
    Unchanged,
}

/// One linear equation of the tableau.
#[derive(Debug, Clone)]
pub struct Row {
    id: RowId,
    pub(crate) basic: Option<VariableId>,
    terms: SmallVec<[(VariableId, f64); 8]>,
    pub(crate) constant: f64,
}

impl Row {
    fn new(id: RowId) -> Self {
        Self {
            id,
            basic: None,
            terms: SmallVec::new(),
            constant: 0.0,
        }
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    /// Variable defined by this row, if attached to the tableau.
    pub fn basic(&self) -> Option<VariableId> {
        self.basic
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Non-basic terms in insertion order.
    pub fn terms(&self) -> &[(VariableId, f64)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn coefficient(&self, var: VariableId) -> f64 {
        self.position(var).map_or(0.0, |pos| self.terms[pos].1)
    }

    pub fn contains(&self, var: VariableId) -> bool {
        self.position(var).is_some()
    }

    fn position(&self, var: VariableId) -> Option<usize> {
        self.terms.iter().position(|(v, _)| *v == var)
    }

    /// Add `coeff` to the coefficient of `var`, pruning it if it cancels out.
    pub(crate) fn add_term(&mut self, var: VariableId, coeff: f64) -> TermChange {
        if near_zero(coeff) {
            return TermChange::Unchanged;
        }
        match self.position(var) {
            Some(pos) => {
                let value = &mut self.terms[pos].1;
                *value += coeff;
                if near_zero(*value) {
                    self.terms.swap_remove(pos);
                    TermChange::Removed
                } else {
                    TermChange::Updated
                }
            }
            None => {
                self.terms.push((var, coeff));
                TermChange::Inserted
            }
        }
    }

    /// Overwrite the coefficient of `var`.
    pub(crate) fn set_term(&mut self, var: VariableId, coeff: f64) -> TermChange {
        match self.position(var) {
            Some(pos) if near_zero(coeff) => {
                self.terms.swap_remove(pos);
                TermChange::Removed
            }
            Some(pos) => {
                self.terms[pos].1 = coeff;
                TermChange::Updated
            }
            None if near_zero(coeff) => TermChange::Unchanged,
            None => {
                self.terms.push((var, coeff));
                TermChange::Inserted
            }
        }
    }

    pub(crate) fn remove_term(&mut self, var: VariableId) -> Option<f64> {
        let pos = self.position(var)?;
        Some(self.terms.swap_remove(pos).1)
    }

    /// Flip the sign of the whole equation.
    pub(crate) fn negate(&mut self) {
        self.constant = -self.constant;
        for (_, coeff) in &mut self.terms {
            *coeff = -*coeff;
        }
    }

    /// Solve `0 = constant + Σ` for `var`, which must appear in the row.
    ///
    /// Afterwards the row reads `var = constant' + Σ'` with `var` no longer
    /// among the terms.
    pub(crate) fn solve_for(&mut self, var: VariableId) {
        let coeff = self.remove_term(var).unwrap_or(1.0);
        let multiplier = -1.0 / coeff;
        self.constant *= multiplier;
        for (_, c) in &mut self.terms {
            *c *= multiplier;
        }
    }

    /// Turn `lhs = constant + Σ` into `rhs = ...`, with `lhs` moved into the terms.
    pub(crate) fn solve_for_pair(&mut self, lhs: VariableId, rhs: VariableId) {
        self.set_term(lhs, -1.0);
        self.solve_for(rhs);
    }

    fn clear(&mut self) {
        self.basic = None;
        self.terms.clear();
        self.constant = 0.0;
    }
}

/// Arena allocator and recycler for rows.
///
/// Rows being pivoted are temporarily taken out of their slot with
/// [`RowPool::take`] and put back with [`RowPool::restore`] or
/// [`RowPool::recycle`], which keeps their term buffers alive.
#[derive(Debug)]
pub struct RowPool {
    slots: Vec<Row>,
    live: Vec<bool>,
    free: BinaryHeap<Reverse<u32>>,
    live_count: usize,
    high_water: usize,
    growths: u64,
}

impl RowPool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            live: Vec::with_capacity(capacity),
            free: BinaryHeap::new(),
            live_count: 0,
            high_water: 0,
            growths: 0,
        }
    }

    /// Take a slot for a new, empty row.
    pub fn acquire(&mut self) -> RowId {
        let index = match self.free.pop() {
            Some(Reverse(index)) => index,
            None => {
                if self.slots.len() == self.slots.capacity() {
                    let extra = self.slots.capacity().max(8);
                    self.slots.reserve_exact(extra);
                    self.live.reserve_exact(extra);
                    self.growths += 1;
                }
                let index = self.slots.len() as u32;
                self.slots.push(Row::new(RowId(index)));
                self.live.push(false);
                index
            }
        };
        self.slots[index as usize].clear();
        self.live[index as usize] = true;
        self.live_count += 1;
        self.high_water = self.high_water.max(self.live_count);
        RowId(index)
    }

    /// Move a row out of its slot, leaving an empty placeholder behind.
    pub(crate) fn take(&mut self, id: RowId) -> Row {
        std::mem::replace(&mut self.slots[id.index()], Row::new(id))
    }

    /// Put a previously taken row back into its slot.
    pub(crate) fn restore(&mut self, row: Row) {
        let index = row.id.index();
        self.slots[index] = row;
    }

    /// Put a taken row back and release its slot.
    pub(crate) fn recycle(&mut self, row: Row) {
        let id = row.id;
        self.restore(row);
        self.release(id);
    }

    pub fn release(&mut self, id: RowId) {
        let index = id.index();
        if !self.live.get(index).copied().unwrap_or(false) {
            return;
        }
        self.slots[index].clear();
        self.live[index] = false;
        self.live_count -= 1;
        self.free.push(Reverse(id.0));
    }

    /// Release every slot. Capacity is kept.
    pub fn reset(&mut self) {
        for (slot, live) in self.slots.iter_mut().zip(self.live.iter_mut()) {
            slot.clear();
            *live = false;
        }
        self.free.clear();
        self.free.extend((0..self.slots.len() as u32).map(Reverse));
        self.live_count = 0;
    }

    pub fn get(&self, id: RowId) -> Option<&Row> {
        if self.live.get(id.index()).copied().unwrap_or(false) {
            self.slots.get(id.index())
        } else {
            None
        }
    }

    pub fn live_count(&self) -> usize {
        self.live_count
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    pub fn high_water_mark(&self) -> usize {
        self.high_water
    }

    pub fn growths(&self) -> u64 {
        self.growths
    }
}

impl std::ops::Index<RowId> for RowPool {
    type Output = Row;

    fn index(&self, id: RowId) -> &Row {
        &self.slots[id.index()]
    }
}

impl std::ops::IndexMut<RowId> for RowPool {
    fn index_mut(&mut self, id: RowId) -> &mut Row {
        &mut self.slots[id.index()]
    }
}
