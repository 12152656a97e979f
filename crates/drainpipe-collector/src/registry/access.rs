//! Recency ordering of live series.
//!
//! An index-addressed doubly linked list: records live in a `Vec` of slots,
//! freed slots are recycled through a free list, and a `HashMap` maps each
//! `SeriesId` to its slot. Promote-to-front and removal are O(1) and no
//! references into the list are ever handed out.
//!
//! Head is the most recently used record, tail the least. Every touch moves a
//! record to the head with a fresh timestamp, so timestamps never increase
//! from head to tail and an expiry sweep can stop at the first live record.

use std::collections::HashMap;
use std::time::Instant;

use drainpipe_core::series::MetricKind;
use drainpipe_core::SeriesId;

/// Last access of one live series.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessRecord {
    pub id: SeriesId,
    pub kind: MetricKind,
    pub last_access: Instant,
}

#[derive(Debug)]
struct Slot {
    record: Option<AccessRecord>,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug, Default)]
pub struct AccessList {
    slots: Vec<Slot>,
    free: Vec<usize>,
    index: HashMap<SeriesId, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl AccessList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get(&self, id: &SeriesId) -> Option<&AccessRecord> {
        let idx = *self.index.get(id)?;
        self.slots.get(idx)?.record.as_ref()
    }

    /// Refresh `id` to `now` and move it to the head, inserting it if new.
    /// Returns `true` when a record was created.
    pub fn touch(&mut self, id: &SeriesId, kind: MetricKind, now: Instant) -> bool {
        if let Some(&idx) = self.index.get(id) {
            if let Some(rec) = self.slots[idx].record.as_mut() {
                rec.last_access = now;
            }
            self.unlink(idx);
            self.push_front(idx);
            return false;
        }

        let record = AccessRecord {
            id: id.clone(),
            kind,
            last_access: now,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx].record = Some(record);
                idx
            }
            None => {
                self.slots.push(Slot {
                    record: Some(record),
                    prev: None,
                    next: None,
                });
                self.slots.len() - 1
            }
        };
        self.index.insert(id.clone(), idx);
        self.push_front(idx);
        true
    }

    pub fn remove(&mut self, id: &SeriesId) -> Option<AccessRecord> {
        let idx = self.index.remove(id)?;
        self.release(idx)
    }

    /// Least recently used record.
    pub fn peek_oldest(&self) -> Option<&AccessRecord> {
        self.tail.and_then(|idx| self.slots[idx].record.as_ref())
    }

    /// Records from most to least recently used.
    #[cfg(test)]
    fn iter(&self) -> impl Iterator<Item = &AccessRecord> + '_ {
        let mut cur = self.head;
        std::iter::from_fn(move || {
            let idx = cur?;
            let slot = &self.slots[idx];
            cur = slot.next;
            slot.record.as_ref()
        })
    }

    fn release(&mut self, idx: usize) -> Option<AccessRecord> {
        self.unlink(idx);
        self.free.push(idx);
        self.slots[idx].record.take()
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.tail = prev,
        }
        self.slots[idx].prev = None;
        self.slots[idx].next = None;
    }

    fn push_front(&mut self, idx: usize) {
        self.slots[idx].prev = None;
        self.slots[idx].next = self.head;
        if let Some(h) = self.head {
            self.slots[h].prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }
}
