//! Variables and the variable pool.
//!
//! Variables live in a slot arena owned by one solver. A released slot is
//! reused lowest-id-first, so a given sequence of acquisitions always yields
//! the same ids no matter what was allocated before the last reset.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use linea_core::{RowId, Strength, StrengthVector, VariableId, VariableKind};
use smallvec::SmallVec;

/// A typed unknown participating in the tableau.
#[derive(Debug, Clone)]
pub struct Variable {
    id: VariableId,
    name: Option<String>,
    kind: VariableKind,
    strength: Strength,
    strength_vector: StrengthVector,
    computed_value: f32,
    is_final_value: bool,
    /// Live constraints whose rows folded the pinned value into their constant.
    fold_count: u32,
    /// Row defining this variable while it is basic.
    pub(crate) definition_row: Option<RowId>,
    /// Rows in which this variable appears as a non-basic term.
    pub(crate) row_refs: SmallVec<[RowId; 4]>,
}

impl Variable {
    fn new(id: VariableId) -> Self {
        Self {
            id,
            name: None,
            kind: VariableKind::External,
            strength: Strength::None,
            strength_vector: StrengthVector::ZERO,
            computed_value: 0.0,
            is_final_value: false,
            fold_count: 0,
            definition_row: None,
            row_refs: SmallVec::new(),
        }
    }

    pub fn id(&self) -> VariableId {
        self.id
    }

    /// Debug name, if the caller supplied a prefix.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    /// Tier penalized by this variable. Only meaningful for error variables.
    pub fn strength(&self) -> Strength {
        self.strength
    }

    /// Per-tier penalty applied to the objective while this variable is positive.
    pub fn strength_vector(&self) -> &StrengthVector {
        &self.strength_vector
    }

    /// Last resolved value, or the pinned value for final variables.
    pub fn computed_value(&self) -> f32 {
        self.computed_value
    }

    /// Whether the value is pinned outside the simplex.
    pub fn is_final_value(&self) -> bool {
        self.is_final_value
    }

    /// Number of live constraints compiled while this variable was pinned.
    ///
    /// Those rows hold the pinned value as a constant, so the variable
    /// cannot move while the count is non-zero.
    pub fn fold_count(&self) -> u32 {
        self.fold_count
    }

    pub fn is_basic(&self) -> bool {
        self.definition_row.is_some()
    }

    pub fn definition_row(&self) -> Option<RowId> {
        self.definition_row
    }

    /// Rows currently referencing this variable as a non-basic term.
    pub fn row_refs(&self) -> &[RowId] {
        &self.row_refs
    }

    /// Name for diagnostics: the debug name or kind prefix plus slot id.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{}{}", self.kind.prefix(), self.id.0),
        }
    }

    /// Whether compiled rows should fold this variable into their constant.
    pub(crate) fn is_folded(&self) -> bool {
        self.is_final_value || self.kind == VariableKind::Constant
    }

    pub(crate) fn set_strength(&mut self, strength: Strength) {
        self.strength = strength;
        self.strength_vector = StrengthVector::unit(strength);
    }

    pub(crate) fn set_computed_value(&mut self, value: f32) {
        self.computed_value = value;
    }

    pub(crate) fn pin(&mut self, value: f32) {
        self.computed_value = value;
        self.is_final_value = true;
    }

    pub(crate) fn unpin(&mut self) {
        self.is_final_value = false;
    }

    pub(crate) fn retain_fold(&mut self) {
        self.fold_count += 1;
    }

    pub(crate) fn release_fold(&mut self) {
        self.fold_count = self.fold_count.saturating_sub(1);
    }

    pub(crate) fn add_row_ref(&mut self, row: RowId) {
        if !self.row_refs.contains(&row) {
            self.row_refs.push(row);
        }
    }

    pub(crate) fn remove_row_ref(&mut self, row: RowId) {
        if let Some(pos) = self.row_refs.iter().position(|r| *r == row) {
            self.row_refs.swap_remove(pos);
        }
    }

    fn clear(&mut self) {
        self.name = None;
        self.kind = VariableKind::External;
        self.strength = Strength::None;
        self.strength_vector = StrengthVector::ZERO;
        self.computed_value = 0.0;
        self.is_final_value = false;
        self.fold_count = 0;
        self.definition_row = None;
        self.row_refs.clear();
    }
}

/// Arena allocator and recycler for variables.
///
/// The pool never checks whether a released variable is still referenced
/// by rows; the tableau retires rows before releasing their variables.
#[derive(Debug)]
pub struct VariablePool {
    slots: Vec<Variable>,
    live: Vec<bool>,
    free: BinaryHeap<Reverse<u32>>,
    live_count: usize,
    high_water: usize,
    growths: u64,
    /// Per-pool naming counter for caller-supplied prefixes.
    name_counter: u32,
}

impl VariablePool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            live: Vec::with_capacity(capacity),
            free: BinaryHeap::new(),
            live_count: 0,
            high_water: 0,
            growths: 0,
            name_counter: 0,
        }
    }

    /// Take a slot for a new variable of the given kind.
    pub fn acquire(&mut self, kind: VariableKind, name_prefix: Option<&str>) -> VariableId {
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
                self.slots.push(Variable::new(VariableId(index)));
                self.live.push(false);
                index
            }
        };

        let name = name_prefix.map(|prefix| {
            self.name_counter += 1;
            format!("{}{}", prefix, self.name_counter)
        });

        let slot = &mut self.slots[index as usize];
        slot.clear();
        slot.kind = kind;
        slot.name = name;
        self.live[index as usize] = true;
        self.live_count += 1;
        self.high_water = self.high_water.max(self.live_count);

        VariableId(index)
    }

    /// Return a slot to the pool, clearing its links and value.
    pub fn release(&mut self, id: VariableId) {
        let index = id.index();
        if !self.live.get(index).copied().unwrap_or(false) {
            return;
        }
        self.slots[index].clear();
        self.live[index] = false;
        self.live_count -= 1;
        self.free.push(Reverse(id.0));
    }

    /// Release every slot and rewind naming. Capacity is kept.
    pub fn reset(&mut self) {
        for (slot, live) in self.slots.iter_mut().zip(self.live.iter_mut()) {
            slot.clear();
            *live = false;
        }
        self.free.clear();
        self.free.extend((0..self.slots.len() as u32).map(Reverse));
        self.live_count = 0;
        self.name_counter = 0;
    }

    pub fn get(&self, id: VariableId) -> Option<&Variable> {
        if self.is_live(id) {
            self.slots.get(id.index())
        } else {
            None
        }
    }

    pub(crate) fn get_mut(&mut self, id: VariableId) -> Option<&mut Variable> {
        if self.is_live(id) {
            self.slots.get_mut(id.index())
        } else {
            None
        }
    }

    pub fn is_live(&self, id: VariableId) -> bool {
        self.live.get(id.index()).copied().unwrap_or(false)
    }

    /// Iterate over live variables in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.slots
            .iter()
            .zip(self.live.iter())
            .filter_map(|(slot, live)| live.then_some(slot))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Variable> {
        self.slots
            .iter_mut()
            .zip(self.live.iter())
            .filter_map(|(slot, live)| live.then_some(slot))
    }

    pub fn live_count(&self) -> usize {
        self.live_count
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Most slots ever live at once.
    pub fn high_water_mark(&self) -> usize {
        self.high_water
    }

    /// Number of times the backing storage was grown.
    pub fn growths(&self) -> u64 {
        self.growths
    }
}

impl std::ops::Index<VariableId> for VariablePool {
    type Output = Variable;

    fn index(&self, id: VariableId) -> &Variable {
        &self.slots[id.index()]
    }
}

impl std::ops::IndexMut<VariableId> for VariablePool {
    fn index_mut(&mut self, id: VariableId) -> &mut Variable {
        &mut self.slots[id.index()]
    }
}
