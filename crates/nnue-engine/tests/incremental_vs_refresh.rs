//! End-to-end coverage of the properties in §8: incremental updates must
//! match full refresh bit-exactly, a king move must force a reset, and
//! clipped output must always saturate to `[0, 127]`.

use nnue_engine::nnue::feature_transformer::FeatureTransformer;
use nnue_engine::nnue::features::{Friend, HalfKp};
use nnue_engine::position::{PieceMove, Position};
use nnue_engine::types::{Color, PieceType, Square};

fn ft_with_deterministic_weights() -> FeatureTransformer<HalfKp<Friend>> {
    let mut ft = FeatureTransformer::<HalfKp<Friend>>::zeroed();
    for (i, w) in ft.weights.iter_mut().enumerate() {
        *w = ((i % 13) as i16) - 6;
    }
    for (i, b) in ft.biases.iter_mut().enumerate() {
        *b = (i % 5) as i16;
    }
    ft
}

fn sq(file: u8, rank: u8) -> Square {
    Square::from_file_rank(file, rank)
}

/// Plays `e2e4 e7e5 g1f3 b8c6` (by square, since this minimal `Position`
/// has no algebraic parser) and checks that the accumulator produced by the
/// transformer's incremental path matches a from-scratch full refresh after
/// every ply.
#[test]
fn differential_updates_match_full_refresh_after_every_ply() {
    let ft = ft_with_deterministic_weights();
    let moves = [
        PieceMove { from: sq(4, 1), to: sq(4, 3), captured: None, promotion: None }, // e2e4
        PieceMove { from: sq(4, 6), to: sq(4, 4), captured: None, promotion: None }, // e7e5
        PieceMove { from: sq(6, 0), to: sq(5, 2), captured: None, promotion: None }, // g1f3
        PieceMove { from: sq(1, 7), to: sq(2, 5), captured: None, promotion: None }, // b8c6
    ];

    let mut incremental = Position::startpos();
    let mut replay = Vec::new();

    for mv in moves {
        incremental.make_move(mv);
        replay.push(mv);

        let mut incremental_out = vec![0u8; 2 * nnue_engine::nnue::constants::TRANSFORMER_HALF_DIMENSIONS];
        ft.transform(&mut incremental, &mut incremental_out);

        let mut fresh = Position::startpos();
        for &prior in &replay {
            fresh.make_move(prior);
        }
        let mut fresh_out = vec![0u8; 2 * nnue_engine::nnue::constants::TRANSFORMER_HALF_DIMENSIONS];
        ft.transform(&mut fresh, &mut fresh_out);

        assert_eq!(incremental_out, fresh_out, "mismatch after move {mv:?}");
    }
}

#[test]
fn king_move_forces_reset_for_the_moving_side_only() {
    let ft = ft_with_deterministic_weights();
    let mut pos = Position::bare_kings(sq(4, 0), sq(4, 7));
    pos.put_piece(sq(0, 0), PieceType::Rook, Color::White);
    pos.put_piece(sq(0, 7), PieceType::Rook, Color::Black);

    let half = nnue_engine::nnue::constants::TRANSFORMER_HALF_DIMENSIONS;
    let mut out = vec![0u8; 2 * half];
    ft.transform(&mut pos, &mut out);

    pos.make_move(PieceMove { from: sq(4, 0), to: sq(4, 1), captured: None, promotion: None });
    let mut incremental_out = vec![0u8; 2 * half];
    ft.transform(&mut pos, &mut incremental_out);

    let mut fresh = Position::bare_kings(sq(4, 1), sq(4, 7));
    fresh.put_piece(sq(0, 0), PieceType::Rook, Color::White);
    fresh.put_piece(sq(0, 7), PieceType::Rook, Color::Black);
    let mut fresh_out = vec![0u8; 2 * half];
    ft.transform(&mut fresh, &mut fresh_out);

    assert_eq!(incremental_out, fresh_out);
}

#[test]
fn clipped_output_always_saturates_to_byte_range() {
    let ft = ft_with_deterministic_weights();
    let mut pos = Position::startpos();
    let half = nnue_engine::nnue::constants::TRANSFORMER_HALF_DIMENSIONS;
    let mut out = vec![0u8; 2 * half];
    ft.transform(&mut pos, &mut out);
    for &byte in &out {
        assert!((0..=127).contains(&byte));
    }
}
