use glam::Vec3;
use serde::{Deserialize, Serialize};
use tickforge_common::CellKey;

/// Quantization layout for the spatial hash.
///
/// World positions quantize to integer cell coordinates at `cell_size`
/// granularity, and the three coordinates pack into disjoint bit fields of
/// one `u32` key. Coordinates are masked, not range-checked: positions far
/// outside the addressable span wrap around, which trades exactness at the
/// fringe for a branch-free key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    pub cell_size: f32,
    pub bits_x: u32,
    pub bits_y: u32,
    pub bits_z: u32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            cell_size: 2000.0,
            bits_x: 6,
            bits_y: 6,
            bits_z: 4,
        }
    }
}

impl GridLayout {
    /// Layout with explicit cell size and per-axis field widths. The
    /// widths must fit one `u32` and the cell size must be positive.
    pub fn new(cell_size: f32, bits_x: u32, bits_y: u32, bits_z: u32) -> Self {
        assert!(cell_size > 0.0, "cell size must be positive");
        assert!(
            bits_x + bits_y + bits_z <= 32,
            "packed cell key must fit in 32 bits"
        );
        assert!(bits_x > 0 && bits_y > 0 && bits_z > 0);
        Self {
            cell_size,
            bits_x,
            bits_y,
            bits_z,
        }
    }

    fn mask(bits: u32) -> u32 {
        if bits >= 32 { u32::MAX } else { (1 << bits) - 1 }
    }

    pub fn max_x(&self) -> u32 {
        Self::mask(self.bits_x)
    }

    pub fn max_y(&self) -> u32 {
        Self::mask(self.bits_y)
    }

    pub fn max_z(&self) -> u32 {
        Self::mask(self.bits_z)
    }

    /// Pack already-masked cell coordinates into a key.
    pub fn pack(&self, x: u32, y: u32, z: u32) -> CellKey {
        let key = (x & self.max_x())
            | ((y & self.max_y()) << self.bits_x)
            | ((z & self.max_z()) << (self.bits_x + self.bits_y));
        CellKey(key)
    }

    /// Split a key back into its per-axis field values.
    pub fn unpack(&self, key: CellKey) -> (u32, u32, u32) {
        let x = key.0 & self.max_x();
        let y = (key.0 >> self.bits_x) & self.max_y();
        let z = (key.0 >> (self.bits_x + self.bits_y)) & self.max_z();
        (x, y, z)
    }

    /// Cell key for a world position. Negative coordinates wrap through
    /// two's-complement masking, same as any other out-of-span value.
    pub fn cell_key(&self, position: Vec3) -> CellKey {
        let x = (position.x / self.cell_size).floor() as i64 as u32;
        let y = (position.y / self.cell_size).floor() as i64 as u32;
        let z = (position.z / self.cell_size).floor() as i64 as u32;
        self.pack(x, y, z)
    }

    /// Keys of the cell at `key` plus its direct neighbors.
    pub fn neighbor_cells(&self, key: CellKey) -> Vec<CellKey> {
        self.cell_cube(key, 1)
    }

    /// Keys of the cube of cells within `half` steps of `key` per axis,
    /// clamped to the packed range. At a boundary the cube shrinks instead
    /// of wrapping, so no key appears twice.
    pub fn cell_cube(&self, key: CellKey, half: u32) -> Vec<CellKey> {
        let (cx, cy, cz) = self.unpack(key);
        let side = (2 * half + 1) as usize;
        let mut cells = Vec::with_capacity(side * side * side);
        for x in cx.saturating_sub(half)..=cx.saturating_add(half).min(self.max_x()) {
            for y in cy.saturating_sub(half)..=cy.saturating_add(half).min(self.max_y()) {
                for z in cz.saturating_sub(half)..=cz.saturating_add(half).min(self.max_z()) {
                    cells.push(self.pack(x, y, z));
                }
            }
        }
        cells
    }
}
