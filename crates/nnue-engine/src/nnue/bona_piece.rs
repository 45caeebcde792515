//! BonaPiece: a (piece-type, square, owner) tuple normalized per perspective.
//!
//! Index 0 is reserved as "no piece" (`BonaPiece::ZERO`); real pieces occupy
//! `[1, FE_END)`. Kings do not get a BonaPiece at all — the king square is
//! the indexing key for HalfKP, not a feature value (see `FeatureSet`).

use crate::types::{Color, PieceType, Square};

/// Base offset of each (piece type, friend-or-enemy) block within the
/// BonaPiece range. Built once from `PieceType::NON_KING` so that adding a
/// piece type elsewhere can't silently desynchronize this table.
const fn piece_base(pt: PieceType, is_enemy: bool) -> u16 {
    let pt_index = pt as u16;
    1 + (pt_index * 2 + is_enemy as u16) * Square::NUM as u16
}

/// Number of BonaPiece values, including the reserved zero slot.
pub const FE_END: usize = 1 + PieceType::NON_KING.len() * 2 * Square::NUM;

const _: () = assert!(FE_END == piece_base(PieceType::Queen, true) as usize + Square::NUM);

/// A single BonaPiece value in `[0, FE_END)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct BonaPiece(pub u16);

impl BonaPiece {
    /// Sentinel meaning "no piece" (used by `append_changed` diffs and to
    /// mark a dirty-piece slot that has nothing on one side of the change).
    pub const ZERO: BonaPiece = BonaPiece(0);

    #[inline]
    pub const fn new(v: u16) -> BonaPiece {
        BonaPiece(v)
    }

    #[inline]
    pub const fn value(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// BonaPiece of a non-king piece as seen from `perspective`, given the
    /// piece's absolute color.
    ///
    /// Squares are normalized by inverting them (180-degree rotation) when
    /// `perspective` is `Black`, so the same feature-transformer weights are
    /// reused for both sides' views.
    pub fn from_piece_square(
        piece_type: PieceType,
        square: Square,
        owner: Color,
        perspective: Color,
    ) -> BonaPiece {
        debug_assert!(!piece_type.is_king());
        let is_enemy = owner != perspective;
        let normalized_square = match perspective {
            Color::White => square,
            Color::Black => square.inverse(),
        };
        BonaPiece(piece_base(piece_type, is_enemy) + normalized_square.index() as u16)
    }

    /// File-mirror involution (`mir` in the spec): flips the square the
    /// BonaPiece was built from while leaving the piece-type/owner block
    /// unchanged.
    pub fn mirror(self) -> BonaPiece {
        if self.is_none() {
            return self;
        }
        let offset = self.0 - 1;
        let block = offset / Square::NUM as u16;
        let within_block = offset % Square::NUM as u16;
        let sq = Square::new(within_block as u8).mirror();
        BonaPiece(1 + block * Square::NUM as u16 + sq.index() as u16)
    }

    /// Opponent-view involution (`inv` in the spec): the piece-type stays
    /// put but friend and enemy swap, and the square rotates 180 degrees —
    /// the same transform `from_piece_square` applies when it flips
    /// `perspective`. `ExtBonaPiece::from_board(..).fw.inv()` therefore
    /// always equals the same call's `.fb`.
    pub fn inv(self) -> BonaPiece {
        if self.is_none() {
            return self;
        }
        let offset = self.0 - 1;
        let block = offset / Square::NUM as u16;
        let within_block = offset % Square::NUM as u16;
        let pt_index = block / 2;
        let is_enemy = block % 2 == 1;
        let sq = Square::new(within_block as u8).inverse();
        let flipped_block = pt_index * 2 + (!is_enemy) as u16;
        BonaPiece(1 + flipped_block * Square::NUM as u16 + sq.index() as u16)
    }
}

/// A piece's BonaPiece precomputed for both perspectives at once, mirroring
/// how a `DirtyPiece` record stores enough information for either side's
/// `append_changed` to consume without recomputing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtBonaPiece {
    /// BonaPiece as seen by White.
    pub fw: BonaPiece,
    /// BonaPiece as seen by Black.
    pub fb: BonaPiece,
}

impl ExtBonaPiece {
    pub const NONE: ExtBonaPiece = ExtBonaPiece {
        fw: BonaPiece::ZERO,
        fb: BonaPiece::ZERO,
    };

    pub fn from_board(piece_type: PieceType, square: Square, owner: Color) -> ExtBonaPiece {
        debug_assert!(!piece_type.is_king());
        ExtBonaPiece {
            fw: BonaPiece::from_piece_square(piece_type, square, owner, Color::White),
            fb: BonaPiece::from_piece_square(piece_type, square, owner, Color::Black),
        }
    }

    #[inline]
    pub fn for_perspective(self, perspective: Color) -> BonaPiece {
        match perspective {
            Color::White => self.fw,
            Color::Black => self.fb,
        }
    }
}

/// `HalfKP` feature index for a given king square and BonaPiece.
#[inline]
pub fn halfkp_index(king_square: Square, bona_piece: BonaPiece) -> usize {
    king_square.index() * FE_END + bona_piece.value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fe_end_matches_chess_layout() {
        // 5 non-king piece types x 2 owners x 64 squares, plus the zero slot.
        assert_eq!(FE_END, 1 + 5 * 2 * 64);
    }

    #[test]
    fn zero_is_none() {
        assert!(BonaPiece::ZERO.is_none());
        assert_eq!(ExtBonaPiece::NONE.fw, BonaPiece::ZERO);
    }

    #[test]
    fn distinct_squares_give_distinct_bona_pieces() {
        let a = BonaPiece::from_piece_square(PieceType::Rook, Square::new(0), Color::White, Color::White);
        let b = BonaPiece::from_piece_square(PieceType::Rook, Square::new(1), Color::White, Color::White);
        assert_ne!(a, b);
    }

    #[test]
    fn friend_and_enemy_occupy_disjoint_ranges() {
        let friend = BonaPiece::from_piece_square(PieceType::Pawn, Square::new(10), Color::White, Color::White);
        let enemy = BonaPiece::from_piece_square(PieceType::Pawn, Square::new(10), Color::Black, Color::White);
        assert_ne!(friend, enemy);
    }

    #[test]
    fn perspective_flip_mirrors_owner_role() {
        // A white pawn is "friend" from White's perspective and "enemy" from Black's.
        let sq = Square::new(20);
        let from_white = BonaPiece::from_piece_square(PieceType::Pawn, sq, Color::White, Color::White);
        let from_black = BonaPiece::from_piece_square(PieceType::Pawn, sq, Color::White, Color::Black);
        assert_ne!(from_white, from_black);
    }

    #[test]
    fn mirror_is_involution() {
        for raw in 0..FE_END as u16 {
            let bp = BonaPiece::new(raw);
            assert_eq!(bp.mirror().mirror(), bp);
        }
    }

    #[test]
    fn inv_is_involution() {
        for raw in 0..FE_END as u16 {
            let bp = BonaPiece::new(raw);
            assert_eq!(bp.inv().inv(), bp);
        }
    }

    #[test]
    fn inv_matches_opponent_perspective() {
        let sq = Square::new(20);
        let ext = ExtBonaPiece::from_board(PieceType::Pawn, sq, Color::White);
        assert_eq!(ext.fw.inv(), ext.fb);
    }

    #[test]
    fn halfkp_index_is_dense_in_fe_end_blocks() {
        let k0 = halfkp_index(Square::new(0), BonaPiece::new(5));
        let k1 = halfkp_index(Square::new(1), BonaPiece::new(5));
        assert_eq!(k1 - k0, FE_END);
    }
}
