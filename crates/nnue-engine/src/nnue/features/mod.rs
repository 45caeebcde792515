//! Feature indexers and the `FeatureSet` aggregation they compose under.

mod half_kp;

pub use half_kp::{Enemy, Friend, HalfKp, KingAssociation};

use crate::nnue::accumulator::IndexList;
use crate::position::Position;
use crate::types::Color;

/// Bound on how many feature indices a single `append_active`/`append_changed`
/// call can emit: the number of non-king pieces on a chess board never
/// exceeds 30 (32 minus the two kings).
pub const MAX_ACTIVE_FEATURES: usize = 30;

/// The event that forces a perspective to be fully recomputed rather than
/// differentially updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    None,
    FriendKingMoved,
    EnemyKingMoved,
    AnyKingMoved,
    AnyPieceMoved,
}

/// The result of diffing a position against its parent for one perspective.
#[derive(Debug, Clone)]
pub struct ChangedFeatures {
    pub removed: IndexList<MAX_ACTIVE_FEATURES>,
    pub added: IndexList<MAX_ACTIVE_FEATURES>,
    /// True when the perspective must be fully recomputed instead of
    /// patched with `removed`/`added`.
    pub reset: bool,
}

/// A single feature indexer (`K`, `P`, `HalfKP<Friend|Enemy>`, ...).
pub trait Feature {
    const DIMENSIONS: usize;
    const MAX_ACTIVE: usize;
    const REFRESH_TRIGGER: TriggerEvent;

    fn append_active(pos: &Position, perspective: Color, out: &mut IndexList<MAX_ACTIVE_FEATURES>);

    /// Returns `true` (reset) when `REFRESH_TRIGGER`'s event occurred on the
    /// ply that produced `pos`; otherwise populates `removed`/`added`.
    fn append_changed(
        pos: &Position,
        perspective: Color,
        removed: &mut IndexList<MAX_ACTIVE_FEATURES>,
        added: &mut IndexList<MAX_ACTIVE_FEATURES>,
    ) -> bool;
}

/// The aggregation of one or more `Feature`s into the transformer's input
/// space. Dimensions concatenate; indices are offset by the cumulative
/// dimension count of the features ahead of them; the hash XOR-folds each
/// component's hash with the running dimension count; the refresh-trigger
/// set is the deduplicated union.
pub trait FeatureSet {
    const DIMENSIONS: usize;
    const HASH_VALUE: u32;

    fn collect_active(pos: &Position, perspective: Color) -> IndexList<MAX_ACTIVE_FEATURES>;
    fn collect_changed(pos: &Position, perspective: Color) -> ChangedFeatures;
}

/// Every `Feature` is trivially a one-element `FeatureSet`.
impl<F: Feature> FeatureSet for F {
    const DIMENSIONS: usize = F::DIMENSIONS;
    const HASH_VALUE: u32 = feature_hash::<F>();

    fn collect_active(pos: &Position, perspective: Color) -> IndexList<MAX_ACTIVE_FEATURES> {
        let mut out = IndexList::new();
        F::append_active(pos, perspective, &mut out);
        out
    }

    fn collect_changed(pos: &Position, perspective: Color) -> ChangedFeatures {
        let mut removed = IndexList::new();
        let mut added = IndexList::new();
        let reset = F::append_changed(pos, perspective, &mut removed, &mut added);
        ChangedFeatures { removed, added, reset }
    }
}

/// Concatenation of two feature indexers into a single aggregated input
/// space, offsetting `B`'s indices by `A::DIMENSIONS`.
pub struct ConcatFeatureSet<A, B>(std::marker::PhantomData<(A, B)>);

impl<A: Feature, B: Feature> FeatureSet for ConcatFeatureSet<A, B> {
    const DIMENSIONS: usize = A::DIMENSIONS + B::DIMENSIONS;
    const HASH_VALUE: u32 = feature_hash::<A>() ^ feature_hash::<B>() ^ (Self::DIMENSIONS as u32);

    fn collect_active(pos: &Position, perspective: Color) -> IndexList<MAX_ACTIVE_FEATURES> {
        let mut out = IndexList::new();
        let mut a = IndexList::new();
        A::append_active(pos, perspective, &mut a);
        for i in a.iter() {
            out.push(i);
        }
        let mut b = IndexList::new();
        B::append_active(pos, perspective, &mut b);
        for i in b.iter() {
            out.push(i + A::DIMENSIONS as u32);
        }
        out
    }

    fn collect_changed(pos: &Position, perspective: Color) -> ChangedFeatures {
        let mut removed = IndexList::new();
        let mut added = IndexList::new();
        let mut a_removed = IndexList::new();
        let mut a_added = IndexList::new();
        let a_reset = A::append_changed(pos, perspective, &mut a_removed, &mut a_added);
        let mut b_removed = IndexList::new();
        let mut b_added = IndexList::new();
        let b_reset = B::append_changed(pos, perspective, &mut b_removed, &mut b_added);

        let reset = a_reset || b_reset;
        if !reset {
            for i in a_removed.iter() {
                removed.push(i);
            }
            for i in b_removed.iter() {
                removed.push(i + A::DIMENSIONS as u32);
            }
            for i in a_added.iter() {
                added.push(i);
            }
            for i in b_added.iter() {
                added.push(i + A::DIMENSIONS as u32);
            }
        }
        ChangedFeatures { removed, added, reset }
    }
}

/// A feature's own hash: an arbitrary but fixed fingerprint of its identity
/// and dimension, used to compose the architecture hash (§4.4).
const fn feature_hash<F: Feature>() -> u32 {
    // `F::DIMENSIONS` alone would collide between features of equal size;
    // fold in `MAX_ACTIVE` as a cheap second axis of identity.
    (F::DIMENSIONS as u32).wrapping_mul(0x9E37_79B9) ^ (F::MAX_ACTIVE as u32)
}
