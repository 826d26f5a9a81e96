// trajectory/mod.rs
// Per-entity position histories for one run.

use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};
use ultraviolet::DVec2;

use crate::error::{Result, VizError};
use crate::parser::TimestepRecord;


/// Append-only store of entity trajectories.
///
/// The first frame fixes the entity count and the id order. Every later frame
/// must match both exactly; nothing is ever resized, padded or reordered.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryStore {
    /// Entity ids in slot order.
    ids: Vec<u64>,
    slots: HashMap<u64, usize>,
    /// `histories[slot][frame]`
    histories: Vec<Vec<DVec2>>,
    timesteps: Vec<u64>,
}

impl TrajectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay a whole record stream into a fresh store.
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = Result<TimestepRecord>>,
    {
        let mut store = Self::new();
        for record in records {
            store.append_record(&record?)?;
        }
        if store.frame_count() == 0 {
            return Err(VizError::EmptyResult { what: "frames" });
        }
        info!(
            frames = store.frame_count(),
            entities = store.entity_count(),
            "trajectories loaded"
        );
        Ok(store)
    }

    /// Append one frame of positions in entity order. Ids are `0..N`.
    pub fn append(&mut self, timestep: u64, positions: &[DVec2]) -> Result<()> {
        if self.ids.is_empty() {
            let ids: Vec<u64> = (0..positions.len() as u64).collect();
            self.fix_entities(ids)?;
        } else {
            self.check_count(positions.len())?;
        }
        self.push_frame(timestep, positions.iter().copied());
        Ok(())
    }

    /// Append a parsed record, checking its ids against the first frame's.
    pub fn append_record(&mut self, record: &TimestepRecord) -> Result<()> {
        if record.entries.iter().any(|e| e.id.is_none()) {
            return self.append(record.timestep, &record.positions());
        }
        let ids = record.entries.iter().filter_map(|e| e.id);
        if self.ids.is_empty() {
            self.fix_entities(ids.collect())?;
        } else {
            self.check_count(record.entries.len())?;
            let frame = self.frame_count();
            for (slot, (expected, found)) in self.ids.iter().zip(ids).enumerate() {
                if *expected != found {
                    return Err(VizError::EntityOrderMismatch {
                        frame,
                        slot,
                        expected: *expected,
                        found,
                    });
                }
            }
        }
        self.push_frame(record.timestep, record.entries.iter().map(|e| e.position));
        Ok(())
    }

    fn fix_entities(&mut self, ids: Vec<u64>) -> Result<()> {
        if ids.is_empty() {
            return Err(VizError::EmptyResult {
                what: "entities in the first frame",
            });
        }
        let mut slots = HashMap::with_capacity(ids.len());
        for (slot, &id) in ids.iter().enumerate() {
            if slots.insert(id, slot).is_some() {
                return Err(VizError::DuplicateEntity { frame: 0, id });
            }
        }
        debug!(entities = ids.len(), "entity order fixed by first frame");
        self.histories = vec![Vec::new(); ids.len()];
        self.slots = slots;
        self.ids = ids;
        Ok(())
    }

    fn check_count(&self, found: usize) -> Result<()> {
        if found != self.ids.len() {
            return Err(VizError::EntityCountMismatch {
                frame: self.frame_count(),
                expected: self.ids.len(),
                found,
            });
        }
        Ok(())
    }

    fn push_frame(&mut self, timestep: u64, positions: impl Iterator<Item = DVec2>) {
        for (history, p) in self.histories.iter_mut().zip(positions) {
            history.push(p);
        }
        self.timesteps.push(timestep);
    }

    pub fn frame_count(&self) -> usize {
        self.timesteps.len()
    }

    pub fn entity_count(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timesteps.is_empty()
    }

    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    /// Timestep label of every stored frame, in append order.
    pub fn timesteps(&self) -> &[u64] {
        &self.timesteps
    }

    pub fn timestep(&self, frame: usize) -> Option<u64> {
        self.timesteps.get(frame).copied()
    }

    pub fn history(&self, id: u64) -> Option<&[DVec2]> {
        self.slots.get(&id).map(|&slot| self.histories[slot].as_slice())
    }

    /// History by slot (first-frame order) rather than by id.
    pub fn history_slot(&self, slot: usize) -> Option<&[DVec2]> {
        self.histories.get(slot).map(Vec::as_slice)
    }

    /// Most recent position of every entity.
    pub fn latest(&self) -> BTreeMap<u64, DVec2> {
        self.ids
            .iter()
            .zip(&self.histories)
            .filter_map(|(&id, h)| h.last().map(|&p| (id, p)))
            .collect()
    }

    /// Every stored position across all frames and entities.
    pub fn positions(&self) -> impl Iterator<Item = DVec2> + '_ {
        self.histories.iter().flatten().copied()
    }
}
