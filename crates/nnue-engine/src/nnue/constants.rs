//! Quantization and architecture constants.
//!
//! Centralized per the design note in the source spec: changing any of
//! these invalidates every stored parameter file.

/// Right-shift applied after each dense affine layer (dequantization).
pub const WEIGHT_SCALE_BITS: u32 = 6;

/// Divisor applied to the final network output to produce centipawns.
pub const FV_SCALE: i32 = 16;

/// Upper saturation bound of `ClippedReLU`'s output domain.
pub const CLIPPED_RELU_MAX: i32 = 127;

/// Feature-transformer hidden width (`H` in the spec).
pub const TRANSFORMER_HALF_DIMENSIONS: usize = 256;

/// SIMD alignment width dense layers pad their input dimension to. The
/// scalar implementation in this crate does not use SIMD registers, but it
/// keeps the same padding contract so weight layouts and buffer alignment
/// remain interchangeable with a vectorized implementation.
pub const MAX_SIMD_WIDTH: usize = 32;

/// Cache-line size that weight and scratch buffers are aligned to.
pub const CACHE_LINE_SIZE: usize = 64;

/// Number of non-king BonaPiece values (`FE_END` in the spec), chess HalfKP:
/// 5 non-king piece types x 2 owners x 64 squares.
pub const FE_END: usize = super::bona_piece::FE_END;

/// Parameter file format version understood by this reader/writer.
pub const NNUE_VERSION: u32 = 0x7AF3_2F16;

/// Rounds `dim` up to the next multiple of `MAX_SIMD_WIDTH`.
#[inline]
pub const fn padded_input(dim: usize) -> usize {
    dim.div_ceil(MAX_SIMD_WIDTH) * MAX_SIMD_WIDTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_input_rounds_up() {
        assert_eq!(padded_input(32), 32);
        assert_eq!(padded_input(33), 64);
        assert_eq!(padded_input(0), 0);
    }
}
