//! Packs per-side voices onto SIMD lanes.
//!
//! With only one side connected its voices fill lanes in order, four per
//! group. With both connected the sides are stacked: voice `p` puts its left
//! sample on global slot `2p` and its right sample on `2p + 1`, so a stereo
//! voice always shares a group.

use crate::constants::{MAX_POLY, N_LANE_SLOTS, SIMD_WIDTH};
use crate::filter_state::FilterStateStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left = 0,
    Right = 1,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Observed polyphony of one side: `None` when the cable is disconnected.
pub type Polyphony = Option<usize>;

/// Where one voice lives for the current epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LaneAddress {
    pub group: usize,
    pub lane: usize,
}

impl LaneAddress {
    pub fn from_slot(slot: usize) -> Self {
        Self {
            group: slot / SIMD_WIDTH,
            lane: slot % SIMD_WIDTH,
        }
    }

    /// Flat index into a lane-slot array.
    pub fn slot(&self) -> usize {
        self.group * SIMD_WIDTH + self.lane
    }
}

/// Complete voice-to-lane mapping for one epoch. Always built whole.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocationTable {
    lanes: [[Option<LaneAddress>; MAX_POLY]; 2],
    stereo_stacked: bool,
    n_voices: usize,
    n_simd_slots: usize,
}

impl AllocationTable {
    pub fn empty() -> Self {
        Self {
            lanes: [[None; MAX_POLY]; 2],
            stereo_stacked: false,
            n_voices: 0,
            n_simd_slots: 0,
        }
    }

    /// Build the table for the given per-side polyphony. Counts above
    /// `MAX_POLY` are clamped.
    pub fn build(left: Polyphony, right: Polyphony) -> Self {
        let mut table = Self::empty();
        let left = left.map(|p| p.min(MAX_POLY));
        let right = right.map(|p| p.min(MAX_POLY));

        match (left, right) {
            (None, None) => {}
            (Some(poly), None) | (None, Some(poly)) => {
                let side = if left.is_some() { Side::Left } else { Side::Right };
                for p in 0..poly {
                    table.lanes[side.index()][p] = Some(LaneAddress::from_slot(p));
                }
                table.n_voices = poly;
            }
            (Some(l), Some(r)) => {
                let poly = l.max(r);
                table.stereo_stacked = true;
                for p in 0..poly {
                    table.lanes[Side::Left.index()][p] = Some(LaneAddress::from_slot(p * 2));
                    table.lanes[Side::Right.index()][p] =
                        Some(LaneAddress::from_slot(p * 2 + 1));
                }
                table.n_voices = poly * 2;
            }
        }

        table.n_simd_slots = table.n_voices.div_ceil(SIMD_WIDTH);
        debug_assert!(table.n_voices <= N_LANE_SLOTS);
        table
    }

    pub fn lane(&self, side: Side, voice: usize) -> Option<LaneAddress> {
        self.lanes[side.index()].get(voice).copied().flatten()
    }

    pub fn assigned(&self, side: Side) -> impl Iterator<Item = (usize, LaneAddress)> + '_ {
        self.lanes[side.index()]
            .iter()
            .enumerate()
            .filter_map(|(voice, lane)| lane.map(|l| (voice, l)))
    }

    pub fn is_stereo_stacked(&self) -> bool {
        self.stereo_stacked
    }

    pub fn n_voices(&self) -> usize {
        self.n_voices
    }

    pub fn n_simd_slots(&self) -> usize {
        self.n_simd_slots
    }
}

impl Default for AllocationTable {
    fn default() -> Self {
        Self::empty()
    }
}

/// Tracks the last observed polyphony and rebuilds the table when it moves.
#[derive(Debug, Default)]
pub struct VoiceAllocator {
    last: Option<(Polyphony, Polyphony)>,
    table: AllocationTable,
}

impl VoiceAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self) -> &AllocationTable {
        &self.table
    }

    /// Last polyphony the table was built for.
    pub fn polyphony(&self, side: Side) -> Polyphony {
        self.last.and_then(|(l, r)| match side {
            Side::Left => l,
            Side::Right => r,
        })
    }

    /// True when `left`/`right` differ from what the table was built for.
    pub fn needs_restack(&self, left: Polyphony, right: Polyphony) -> bool {
        self.last != Some((left, right))
    }

    /// Rebuild the table and clear every unit of `store`, then mark the
    /// lanes that carry voices as active.
    pub fn restack(&mut self, left: Polyphony, right: Polyphony, store: &mut FilterStateStore) {
        self.last = Some((left, right));
        self.table = AllocationTable::build(left, right);

        store.reset_all();
        self.activate_lanes(store);
    }

    /// Mark every lane the table assigns as active in `store`.
    pub fn activate_lanes(&self, store: &mut FilterStateStore) {
        for side in Side::BOTH {
            for (_, address) in self.table.assigned(side) {
                store.activate_lane(address.group, address.lane);
            }
        }
    }
}
