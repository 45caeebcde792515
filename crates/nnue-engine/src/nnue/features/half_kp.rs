//! HalfKP: (king square, non-king piece BonaPiece) pairs, one half per
//! perspective. Parameterized over which king anchors the index
//! (`Friend` — the perspective's own king, the standard scheme — or
//! `Enemy` — the opposing king, rotated 180 degrees).

use super::{Feature, TriggerEvent, MAX_ACTIVE_FEATURES};
use crate::nnue::accumulator::IndexList;
use crate::nnue::bona_piece::{halfkp_index, BonaPiece, ExtBonaPiece};
use crate::nnue::constants::FE_END;
use crate::position::Position;
use crate::types::{Color, Square};

/// Which king's square anchors a `HalfKp` feature.
pub trait KingAssociation {
    const REFRESH_TRIGGER: TriggerEvent;

    fn king_square(pos: &Position, perspective: Color) -> Square;

    /// Which color's king move, if any, invalidates this perspective.
    fn triggering_color(perspective: Color) -> Color;
}

/// The standard scheme: index by the perspective's own king.
pub struct Friend;

impl KingAssociation for Friend {
    const REFRESH_TRIGGER: TriggerEvent = TriggerEvent::FriendKingMoved;

    fn king_square(pos: &Position, perspective: Color) -> Square {
        pos.king_square(perspective)
    }

    fn triggering_color(perspective: Color) -> Color {
        perspective
    }
}

/// Index by the opposing king, rotated 180 degrees into the perspective's
/// own frame of reference.
pub struct Enemy;

impl KingAssociation for Enemy {
    const REFRESH_TRIGGER: TriggerEvent = TriggerEvent::EnemyKingMoved;

    fn king_square(pos: &Position, perspective: Color) -> Square {
        pos.king_square(perspective.opponent()).inverse()
    }

    fn triggering_color(perspective: Color) -> Color {
        perspective.opponent()
    }
}

/// `idx = sq_k * FE_END + p`.
pub struct HalfKp<K>(std::marker::PhantomData<K>);

impl<K: KingAssociation> Feature for HalfKp<K> {
    const DIMENSIONS: usize = Square::NUM * FE_END;
    const MAX_ACTIVE: usize = MAX_ACTIVE_FEATURES;
    const REFRESH_TRIGGER: TriggerEvent = K::REFRESH_TRIGGER;

    fn append_active(pos: &Position, perspective: Color, out: &mut IndexList<MAX_ACTIVE_FEATURES>) {
        let king_sq = K::king_square(pos, perspective);
        for (piece_type, square, owner) in pos.pieces() {
            let bp = BonaPiece::from_piece_square(piece_type, square, owner, perspective);
            out.push(halfkp_index(king_sq, bp) as u32);
        }
    }

    fn append_changed(
        pos: &Position,
        perspective: Color,
        removed: &mut IndexList<MAX_ACTIVE_FEATURES>,
        added: &mut IndexList<MAX_ACTIVE_FEATURES>,
    ) -> bool {
        let dirty = &pos.state().dirty_piece;
        if dirty.king_moved[K::triggering_color(perspective).index()] {
            return true;
        }

        let king_sq = K::king_square(pos, perspective);
        for changed in &dirty.changed_piece[..dirty.dirty_num] {
            push_if_present(removed, king_sq, changed.old_piece, perspective);
            push_if_present(added, king_sq, changed.new_piece, perspective);
        }
        false
    }
}

fn push_if_present(
    list: &mut IndexList<MAX_ACTIVE_FEATURES>,
    king_sq: Square,
    piece: ExtBonaPiece,
    perspective: Color,
) {
    let bp = piece.for_perspective(perspective);
    if !bp.is_none() {
        list.push(halfkp_index(king_sq, bp) as u32);
    }
}
