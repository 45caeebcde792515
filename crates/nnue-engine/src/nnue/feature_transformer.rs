//! The feature transformer: the wide sparse-input affine layer maintained
//! incrementally across the position's state stack (§4.2).

use std::io::{self, Read, Write};
use std::marker::PhantomData;

use crate::nnue::accumulator::AlignedBox;
use crate::nnue::constants::TRANSFORMER_HALF_DIMENSIONS as H;
use crate::nnue::features::FeatureSet;
use crate::position::Position;
use crate::types::Color;

/// Owns `biases[H]` and `weights[FS::DIMENSIONS][H]`, column-major by
/// feature index, and exposes the single `transform` operation.
pub struct FeatureTransformer<FS: FeatureSet> {
    pub biases: AlignedBox<i16>,
    pub weights: AlignedBox<i16>,
    _feature_set: PhantomData<FS>,
}

impl<FS: FeatureSet> std::fmt::Debug for FeatureTransformer<FS> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureTransformer")
            .field("biases", &self.biases)
            .field("weights", &self.weights)
            .finish()
    }
}

impl<FS: FeatureSet> FeatureTransformer<FS> {
    pub fn zeroed() -> Self {
        FeatureTransformer {
            biases: AlignedBox::new_zeroed(H),
            weights: AlignedBox::new_zeroed(FS::DIMENSIONS * H),
            _feature_set: PhantomData,
        }
    }

    pub fn hash_value() -> u32 {
        0xFEAF_0000_u32 ^ FS::HASH_VALUE ^ (H as u32)
    }

    /// Dimensions the weight table actually holds, for the range check
    /// below. `FS::DIMENSIONS` is the same number, but computing it from
    /// the allocation itself is what the debug assertion is meant to
    /// police, so it doesn't lean on the trait being implemented correctly.
    fn dimensions(&self) -> usize {
        self.weights.len() / H
    }

    /// §7: an out-of-range `feature_index` indicates a bug or a corrupted
    /// `Position`. Debug builds catch it at the point of the contract
    /// violation; release builds saturate by skipping the update rather
    /// than indexing out of bounds.
    fn add_weights(&self, half: &mut [i16; H], feature_index: u32) {
        debug_assert!(
            (feature_index as usize) < self.dimensions(),
            "feature index {feature_index} out of range (dimensions = {})",
            self.dimensions()
        );
        if feature_index as usize >= self.dimensions() {
            return;
        }
        let base = feature_index as usize * H;
        for i in 0..H {
            half[i] += self.weights[base + i];
        }
    }

    fn sub_weights(&self, half: &mut [i16; H], feature_index: u32) {
        debug_assert!(
            (feature_index as usize) < self.dimensions(),
            "feature index {feature_index} out of range (dimensions = {})",
            self.dimensions()
        );
        if feature_index as usize >= self.dimensions() {
            return;
        }
        let base = feature_index as usize * H;
        for i in 0..H {
            half[i] -= self.weights[base + i];
        }
    }

    fn seed_from_bias(&self) -> [i16; H] {
        let mut half = [0i16; H];
        half.copy_from_slice(&self.biases);
        half
    }

    fn full_refresh_half(&self, pos: &Position, perspective: Color) -> [i16; H] {
        let mut half = self.seed_from_bias();
        for index in FS::collect_active(pos, perspective).iter() {
            self.add_weights(&mut half, index);
        }
        half
    }

    /// Step 2/3 of the algorithm for one perspective: differential when the
    /// parent is usable, full refresh otherwise.
    fn compute_half(&self, pos: &Position, perspective: Color, parent_half: Option<[i16; H]>) -> [i16; H] {
        match parent_half {
            Some(parent) => {
                let changed = FS::collect_changed(pos, perspective);
                if changed.reset {
                    self.full_refresh_half(pos, perspective)
                } else {
                    let mut half = parent;
                    for r in changed.removed.iter() {
                        self.sub_weights(&mut half, r);
                    }
                    for a in changed.added.iter() {
                        self.add_weights(&mut half, a);
                    }
                    half
                }
            }
            None => self.full_refresh_half(pos, perspective),
        }
    }

    /// Brings `pos`'s current accumulator up to date (incrementally if its
    /// parent is usable, by full refresh otherwise) and writes the
    /// side-to-move-ordered, clipped feature vector into `out`.
    pub fn transform(&self, pos: &mut Position, out: &mut [u8]) {
        if !pos.state().accumulator.computed_accumulation {
            let parent_half = pos.previous_state().and_then(|parent| {
                parent.accumulator.computed_accumulation.then_some(parent.accumulator.half)
            });

            let mut new_half = [[0i16; H]; Color::NUM];
            for &persp in &[Color::White, Color::Black] {
                new_half[persp.index()] =
                    self.compute_half(pos, persp, parent_half.map(|h| h[persp.index()]));
            }

            let acc = &mut pos.state_mut().accumulator;
            acc.half = new_half;
            acc.computed_accumulation = true;
        }
        pos.state().accumulator.clamp_into(pos.side_to_move(), out);
    }

    pub fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut ft = Self::zeroed();
        let mut bias_bytes = vec![0u8; H * 2];
        reader.read_exact(&mut bias_bytes)?;
        for (i, chunk) in bias_bytes.chunks_exact(2).enumerate() {
            ft.biases[i] = i16::from_le_bytes([chunk[0], chunk[1]]);
        }
        let mut weight_bytes = vec![0u8; FS::DIMENSIONS * H * 2];
        reader.read_exact(&mut weight_bytes)?;
        for (i, chunk) in weight_bytes.chunks_exact(2).enumerate() {
            ft.weights[i] = i16::from_le_bytes([chunk[0], chunk[1]]);
        }
        Ok(ft)
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for &b in self.biases.iter() {
            writer.write_all(&b.to_le_bytes())?;
        }
        for &w in self.weights.iter() {
            writer.write_all(&w.to_le_bytes())?;
        }
        Ok(())
    }
}
