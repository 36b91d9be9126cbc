//! Arena of group slots indexed by nesting position.
//!
//! Slots are created eight at a time and then by doubling, and are reused
//! across open/close cycles: closing a group only clears the slot. Parent
//! links are slot indices, never pointers.

use crate::filter::FilterSet;
use crate::record::GroupRecord;
use crate::tags::TagSet;
use std::sync::Arc;

const INITIAL_CAPACITY: usize = 8;

/// One position of the group stack.
#[derive(Debug, Default)]
pub(crate) struct GroupSlot {
    /// Distinguishes successive groups opened in the same slot.
    pub(crate) serial: u64,
    pub(crate) open: bool,
    /// `None` when the open was rejected by the filter.
    pub(crate) record: Option<Arc<GroupRecord>>,
    pub(crate) saved_filter: FilterSet,
    pub(crate) saved_tags: TagSet,
    pub(crate) parent_unfiltered: Option<usize>,
    /// Topic to restore at close, set when the topic changes inside the group.
    pub(crate) previous_topic: Option<String>,
}

impl GroupSlot {
    fn clear(&mut self) {
        self.open = false;
        self.record = None;
        self.saved_tags = TagSet::default();
        self.parent_unfiltered = None;
        self.previous_topic = None;
    }
}

/// State taken out of a slot when its group closes.
#[derive(Debug)]
pub(crate) struct PoppedSlot {
    pub(crate) saved_filter: FilterSet,
    pub(crate) saved_tags: TagSet,
    pub(crate) previous_topic: Option<String>,
}

#[derive(Debug)]
pub(crate) struct GroupStack {
    slots: Vec<GroupSlot>,
    current: Option<usize>,
    current_unfiltered: Option<usize>,
    next_serial: u64,
}

impl Default for GroupStack {
    fn default() -> Self {
        Self {
            slots: std::iter::repeat_with(GroupSlot::default)
                .take(INITIAL_CAPACITY)
                .collect(),
            current: None,
            current_unfiltered: None,
            next_serial: 1,
        }
    }
}

impl GroupStack {
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of open groups, rejected ones included.
    pub(crate) fn open_count(&self) -> usize {
        self.current.map_or(0, |i| i + 1)
    }

    pub(crate) const fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub(crate) fn current_slot_mut(&mut self) -> Option<&mut GroupSlot> {
        self.current.map(|i| &mut self.slots[i])
    }

    pub(crate) fn current_record(&self) -> Option<&Arc<GroupRecord>> {
        self.current.and_then(|i| self.slots[i].record.as_ref())
    }

    /// Record of the nearest accepted group.
    pub(crate) fn current_unfiltered(&self) -> Option<&Arc<GroupRecord>> {
        self.current_unfiltered
            .and_then(|i| self.slots[i].record.as_ref())
    }

    pub(crate) fn is_open(&self, index: usize, serial: u64) -> bool {
        self.slots
            .get(index)
            .is_some_and(|slot| slot.open && slot.serial == serial)
    }

    /// Opens the next slot in the rejected state, saving the monitor state
    /// to restore at close. Returns `(index, serial)`.
    pub(crate) fn push(&mut self, saved_filter: FilterSet, saved_tags: TagSet) -> (usize, u64) {
        let index = self.open_count();
        if index == self.slots.len() {
            self.slots.resize_with(index * 2, GroupSlot::default);
        }
        let serial = self.next_serial;
        self.next_serial += 1;

        let parent_unfiltered = self.current_unfiltered;
        let slot = &mut self.slots[index];
        slot.serial = serial;
        slot.open = true;
        slot.record = None;
        slot.saved_filter = saved_filter;
        slot.saved_tags = saved_tags;
        slot.parent_unfiltered = parent_unfiltered;
        slot.previous_topic = None;
        self.current = Some(index);
        (index, serial)
    }

    /// Turns the slot just pushed into an accepted group.
    pub(crate) fn accept(&mut self, index: usize, record: Arc<GroupRecord>) {
        self.slots[index].record = Some(record);
        self.current_unfiltered = Some(index);
    }

    /// Closes the current slot. The caller has checked that one is open.
    pub(crate) fn pop(&mut self) -> Option<PoppedSlot> {
        let index = self.current?;
        let slot = &mut self.slots[index];
        let popped = PoppedSlot {
            saved_filter: slot.saved_filter,
            saved_tags: std::mem::take(&mut slot.saved_tags),
            previous_topic: slot.previous_topic.take(),
        };
        self.current_unfiltered = slot.parent_unfiltered;
        slot.clear();
        self.current = index.checked_sub(1);
        Some(popped)
    }
}
