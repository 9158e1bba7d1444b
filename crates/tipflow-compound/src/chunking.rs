//! Chunk planning: how much one tip carries per aspirate cycle.

use tipflow_core::Volume;
use tracing::debug;

/// Tolerance for comparing volumes computed by division.
const VOLUME_EPSILON: Volume = 1e-9;

/// How many wells of `volume` fit in one aspirate after reserving
/// `reserved` µL (air gap, disposal volume) from `capacity`.
///
/// Zero means not even one well fits.
pub fn max_wells_per_chunk(capacity: Volume, reserved: Volume, volume: Volume) -> usize {
    if volume <= 0.0 {
        return 0;
    }
    let usable = capacity - reserved;
    if usable < volume {
        return 0;
    }
    ((usable + VOLUME_EPSILON) / volume).floor() as usize
}

/// Number of aspirate cycles needed for `wells` wells.
pub fn chunk_count(wells: usize, per_chunk: usize) -> usize {
    if per_chunk == 0 {
        return 0;
    }
    wells.div_ceil(per_chunk)
}

/// Split one well-to-well `volume` into sub-transfers of at most
/// `capacity`.
///
/// Full-capacity sub-transfers come first. A remainder below `min_volume`
/// is merged with the preceding sub-transfer and the pair is split into
/// two equal halves.
pub fn split_volume(volume: Volume, capacity: Volume, min_volume: Volume) -> Vec<Volume> {
    if volume <= 0.0 || capacity <= 0.0 {
        return Vec::new();
    }
    if volume <= capacity + VOLUME_EPSILON {
        return vec![volume];
    }

    let full = (volume / capacity).floor() as usize;
    let remainder = volume - full as Volume * capacity;
    let mut parts = vec![capacity; full];
    if remainder > VOLUME_EPSILON {
        if remainder < min_volume {
            let half = (capacity + remainder) / 2.0;
            if let Some(last) = parts.last_mut() {
                *last = half;
            }
            parts.push(half);
        } else {
            parts.push(remainder);
        }
    }
    debug!(volume, capacity, parts = parts.len(), "split transfer volume");
    parts
}
