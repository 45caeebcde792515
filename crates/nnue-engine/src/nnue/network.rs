//! The composed network: feature transformer plus the fixed HalfKP-256x2-32-32
//! dense stack, and the parameter file codec of §4.4.

use std::io::{Read, Write};

use crate::error::{NnueError, Result};
use crate::nnue::constants::{NNUE_VERSION, TRANSFORMER_HALF_DIMENSIONS as H};
use crate::nnue::feature_transformer::FeatureTransformer;
use crate::nnue::features::FeatureSet;
use crate::nnue::layers::{AffineTransform, ClippedReLU, InputSlice};
use crate::position::Position;

const DOUBLE_H: usize = 2 * H;

/// Human-readable architecture string embedded in the parameter file header.
/// Not verified on read — purely informational, per §4.4.
const ARCH_STRING: &str = "HalfKP(Friend)[41216->256x2]-32-32-1";

/// The fixed dense stack:
/// `AffineTransform<ClippedReLU<AffineTransform<ClippedReLU<AffineTransform<InputSlice<512>, 32>>, 32>>, 1>`
pub struct Network<FS: FeatureSet> {
    pub feature_transformer: FeatureTransformer<FS>,
    input_slice: InputSlice<DOUBLE_H, 0>,
    l1: AffineTransform<DOUBLE_H, 32>,
    relu1: ClippedReLU<32>,
    l2: AffineTransform<32, 32>,
    relu2: ClippedReLU<32>,
    l3: AffineTransform<32, 1>,
}

impl<FS: FeatureSet> std::fmt::Debug for Network<FS> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("feature_transformer", &self.feature_transformer)
            .field("input_slice", &self.input_slice)
            .field("l1", &self.l1)
            .field("relu1", &self.relu1)
            .field("l2", &self.l2)
            .field("relu2", &self.relu2)
            .field("l3", &self.l3)
            .finish()
    }
}

impl<FS: FeatureSet> Network<FS> {
    /// Scratch needed by the evaluator to hold one transformed feature
    /// vector ahead of `propagate`. The dense chain itself is built from
    /// fixed-size typed arrays rather than a raw offset-managed buffer (see
    /// DESIGN.md), so this is the only buffer callers must provide.
    pub const BUFFER_SIZE: usize = DOUBLE_H;

    pub fn zeroed() -> Self {
        Network {
            feature_transformer: FeatureTransformer::zeroed(),
            input_slice: InputSlice::new(),
            l1: AffineTransform::zeroed(),
            relu1: ClippedReLU,
            l2: AffineTransform::zeroed(),
            relu2: ClippedReLU,
            l3: AffineTransform::zeroed(),
        }
    }

    /// The statically composed architecture hash: every layer's own
    /// `HASH_VALUE`, XOR-folded leaf (input side) to root (output), folded
    /// with the feature transformer's hash.
    pub fn architecture_hash() -> u32 {
        FeatureTransformer::<FS>::hash_value()
            ^ InputSlice::<DOUBLE_H, 0>::HASH_VALUE
            ^ AffineTransform::<DOUBLE_H, 32>::HASH_VALUE
            ^ ClippedReLU::<32>::HASH_VALUE
            ^ AffineTransform::<32, 32>::HASH_VALUE
            ^ ClippedReLU::<32>::HASH_VALUE
            ^ AffineTransform::<32, 1>::HASH_VALUE
    }

    /// Runs the transformed feature vector through the dense stack,
    /// returning the single raw output before `FV_SCALE` division.
    pub fn propagate(&self, transformed: &[u8; DOUBLE_H]) -> i32 {
        let sliced = self.input_slice.propagate(transformed);
        let mut l1_out = [0i32; 32];
        self.l1.propagate(sliced, &mut l1_out);
        let mut relu1_out = [0u8; 32];
        self.relu1.propagate(&l1_out, &mut relu1_out);

        let mut l2_out = [0i32; 32];
        self.l2.propagate(&relu1_out, &mut l2_out);
        let mut relu2_out = [0u8; 32];
        self.relu2.propagate(&l2_out, &mut relu2_out);

        let mut l3_out = [0i32; 1];
        self.l3.propagate(&relu2_out, &mut l3_out);
        l3_out[0]
    }

    /// Full evaluation: transform, propagate, dequantize, clamp (§4.5).
    pub fn evaluate(&self, pos: &mut Position) -> i32 {
        let mut transformed = [0u8; DOUBLE_H];
        self.feature_transformer.transform(pos, &mut transformed);
        let raw = self.propagate(&transformed);
        self.finish(raw)
    }

    /// Same as `evaluate`, but writes the transformed feature vector into a
    /// caller-supplied buffer instead of a stack array owned by this call.
    /// Useful for callers that pool scratch buffers across positions (e.g.
    /// a search thread's per-node eval) rather than reinitializing one per
    /// call; rejects an undersized buffer instead of indexing past it.
    pub fn evaluate_into(&self, pos: &mut Position, buffer: &mut [u8]) -> Result<i32> {
        if buffer.len() < Self::BUFFER_SIZE {
            return Err(NnueError::BufferUndersized { needed: Self::BUFFER_SIZE, got: buffer.len() });
        }
        let transformed: &mut [u8; DOUBLE_H] = (&mut buffer[..Self::BUFFER_SIZE]).try_into().unwrap();
        self.feature_transformer.transform(pos, transformed);
        let raw = self.propagate(transformed);
        Ok(self.finish(raw))
    }

    fn finish(&self, raw: i32) -> i32 {
        let centipawns = raw / crate::nnue::constants::FV_SCALE;
        crate::types::Value::new(centipawns).clamp_to_eval_range().raw()
    }

    /// Behind the `nnue-train` feature: exposes the layer internals a
    /// trainer needs to mutate, without widening the default inference API
    /// (§9, "friend classes for training").
    #[cfg(feature = "nnue-train")]
    pub fn parameters_mut(&mut self) -> TrainableParameters<'_, FS> {
        TrainableParameters { network: self }
    }

    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path_str = path.as_ref().display().to_string();
        let file = std::fs::File::open(&path).map_err(|source| NnueError::Io { path: path_str.clone(), source })?;
        let mut reader = std::io::BufReader::new(file);
        Self::read(&mut reader, &path_str)
    }

    pub fn read<R: Read>(reader: &mut R, path: &str) -> Result<Self> {
        let version = read_u32(reader, path)?;
        if version != NNUE_VERSION {
            return Err(NnueError::ArchMismatch { path: path.to_string(), expected: NNUE_VERSION, found: version });
        }

        let expected_hash = Self::architecture_hash();
        let found_hash = read_u32(reader, path)?;
        if found_hash != expected_hash {
            return Err(NnueError::ArchMismatch { path: path.to_string(), expected: expected_hash, found: found_hash });
        }

        let arch_len = read_u32(reader, path)? as usize;
        let mut arch_string = vec![0u8; arch_len];
        read_exact(reader, &mut arch_string, path)?;

        let ft_hash = read_u32(reader, path)?;
        if ft_hash != FeatureTransformer::<FS>::hash_value() {
            return Err(NnueError::ArchMismatch {
                path: path.to_string(),
                expected: FeatureTransformer::<FS>::hash_value(),
                found: ft_hash,
            });
        }
        let feature_transformer = FeatureTransformer::read(reader).map_err(|source| NnueError::Io { path: path.to_string(), source })?;

        read_layer_hash::<_, InputSlice<DOUBLE_H, 0>>(reader, path)?;
        let input_slice = InputSlice::new();

        read_layer_hash::<_, AffineTransform<DOUBLE_H, 32>>(reader, path)?;
        let l1 = AffineTransform::read(reader).map_err(|source| NnueError::Io { path: path.to_string(), source })?;

        read_layer_hash::<_, ClippedReLU<32>>(reader, path)?;
        let relu1 = ClippedReLU;

        read_layer_hash::<_, AffineTransform<32, 32>>(reader, path)?;
        let l2 = AffineTransform::read(reader).map_err(|source| NnueError::Io { path: path.to_string(), source })?;

        read_layer_hash::<_, ClippedReLU<32>>(reader, path)?;
        let relu2 = ClippedReLU;

        read_layer_hash::<_, AffineTransform<32, 1>>(reader, path)?;
        let l3 = AffineTransform::read(reader).map_err(|source| NnueError::Io { path: path.to_string(), source })?;

        Ok(Network { feature_transformer, input_slice, l1, relu1, l2, relu2, l3 })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&NNUE_VERSION.to_le_bytes())?;
        writer.write_all(&Self::architecture_hash().to_le_bytes())?;
        writer.write_all(&(ARCH_STRING.len() as u32).to_le_bytes())?;
        writer.write_all(ARCH_STRING.as_bytes())?;

        writer.write_all(&FeatureTransformer::<FS>::hash_value().to_le_bytes())?;
        self.feature_transformer.write(writer)?;

        writer.write_all(&InputSlice::<DOUBLE_H, 0>::HASH_VALUE.to_le_bytes())?;
        writer.write_all(&AffineTransform::<DOUBLE_H, 32>::HASH_VALUE.to_le_bytes())?;
        self.l1.write(writer)?;
        writer.write_all(&ClippedReLU::<32>::HASH_VALUE.to_le_bytes())?;
        writer.write_all(&AffineTransform::<32, 32>::HASH_VALUE.to_le_bytes())?;
        self.l2.write(writer)?;
        writer.write_all(&ClippedReLU::<32>::HASH_VALUE.to_le_bytes())?;
        writer.write_all(&AffineTransform::<32, 1>::HASH_VALUE.to_le_bytes())?;
        self.l3.write(writer)?;
        Ok(())
    }
}

#[cfg(feature = "nnue-train")]
pub struct TrainableParameters<'a, FS: FeatureSet> {
    network: &'a mut Network<FS>,
}

#[cfg(feature = "nnue-train")]
impl<'a, FS: FeatureSet> TrainableParameters<'a, FS> {
    pub fn feature_transformer_mut(&mut self) -> &mut FeatureTransformer<FS> {
        &mut self.network.feature_transformer
    }

    pub fn l1_mut(&mut self) -> &mut AffineTransform<DOUBLE_H, 32> {
        &mut self.network.l1
    }

    pub fn l2_mut(&mut self) -> &mut AffineTransform<32, 32> {
        &mut self.network.l2
    }

    pub fn l3_mut(&mut self) -> &mut AffineTransform<32, 1> {
        &mut self.network.l3
    }
}

fn read_u32<R: Read>(reader: &mut R, path: &str) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_exact(reader, &mut buf, path)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], path: &str) -> Result<()> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(source) if source.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(NnueError::Truncated { path: path.to_string(), expected_at_least: buf.len(), found: 0 })
        }
        Err(source) => Err(NnueError::Io { path: path.to_string(), source }),
    }
}

/// Verifies one dense layer's embedded hash without needing an instance:
/// `ClippedReLU`/`InputSlice` have no parameters, only a section marker.
fn read_layer_hash<R: Read, L: LayerHash>(reader: &mut R, path: &str) -> Result<()> {
    let found = read_u32(reader, path)?;
    if found != L::HASH_VALUE {
        return Err(NnueError::ArchMismatch { path: path.to_string(), expected: L::HASH_VALUE, found });
    }
    Ok(())
}

trait LayerHash {
    const HASH_VALUE: u32;
}

impl<const OUT: usize, const OFFSET: usize> LayerHash for InputSlice<OUT, OFFSET> {
    const HASH_VALUE: u32 = InputSlice::<OUT, OFFSET>::HASH_VALUE;
}

impl<const IN: usize, const OUT: usize> LayerHash for AffineTransform<IN, OUT> {
    const HASH_VALUE: u32 = AffineTransform::<IN, OUT>::HASH_VALUE;
}

impl<const DIM: usize> LayerHash for ClippedReLU<DIM> {
    const HASH_VALUE: u32 = ClippedReLU::<DIM>::HASH_VALUE;
}
