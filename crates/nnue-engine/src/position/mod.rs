//! A minimal, non-legality-checking position model.
//!
//! This is *not* a chess rules engine: it trusts its caller to supply valid
//! moves. It exists only to drive the NNUE core through the `Position` view
//! the evaluator actually consumes (side to move, king squares, non-king
//! piece enumeration, and a state stack carrying one `Accumulator` and one
//! `DirtyPiece` per ply) — see `nnue::evaluator` for the consumer.

mod state;

pub use state::{ChangedBonaPiece, DirtyPiece, State};

use crate::nnue::bona_piece::ExtBonaPiece;
use crate::types::{Color, PieceType, Square};

const STARTPOS_LAYOUT: [(PieceType, u8); 8] = [
    (PieceType::Rook, 0),
    (PieceType::Knight, 1),
    (PieceType::Bishop, 2),
    (PieceType::Queen, 3),
    (PieceType::King, 4),
    (PieceType::Bishop, 5),
    (PieceType::Knight, 6),
    (PieceType::Rook, 7),
];

/// A move applied through `Position::make_move`. Deliberately narrow: no
/// legality checking, no SAN, just enough to drive differential updates in
/// tests and the CLI demo.
#[derive(Debug, Clone, Copy)]
pub struct PieceMove {
    pub from: Square,
    pub to: Square,
    /// Set for a capture: the piece type that was removed from `to`.
    pub captured: Option<PieceType>,
    /// Set for a pawn promotion: the piece type the mover becomes.
    pub promotion: Option<PieceType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Occupant {
    piece_type: PieceType,
    color: Color,
}

/// A position with an explicit state stack, as the NNUE core expects.
pub struct Position {
    board: [Option<Occupant>; Square::NUM],
    side_to_move: Color,
    king_squares: [Square; Color::NUM],
    states: Vec<State>,
    current: usize,
}

impl Position {
    /// The standard chess starting position.
    pub fn startpos() -> Position {
        let mut board = [None; Square::NUM];
        for &(piece_type, file) in &STARTPOS_LAYOUT {
            board[Square::from_file_rank(file, 0).index()] = Some(Occupant { piece_type, color: Color::White });
            board[Square::from_file_rank(file, 7).index()] = Some(Occupant { piece_type, color: Color::Black });
        }
        for file in 0..8 {
            board[Square::from_file_rank(file, 1).index()] = Some(Occupant { piece_type: PieceType::Pawn, color: Color::White });
            board[Square::from_file_rank(file, 6).index()] = Some(Occupant { piece_type: PieceType::Pawn, color: Color::Black });
        }
        Position {
            board,
            side_to_move: Color::White,
            king_squares: [Square::from_file_rank(4, 0), Square::from_file_rank(4, 7)],
            states: vec![State::root()],
            current: 0,
        }
    }

    /// An empty board with only the two kings placed; useful for
    /// constructing focused fixtures.
    pub fn bare_kings(white_king: Square, black_king: Square) -> Position {
        let mut board = [None; Square::NUM];
        board[white_king.index()] = Some(Occupant { piece_type: PieceType::King, color: Color::White });
        board[black_king.index()] = Some(Occupant { piece_type: PieceType::King, color: Color::Black });
        Position {
            board,
            side_to_move: Color::White,
            king_squares: [white_king, black_king],
            states: vec![State::root()],
            current: 0,
        }
    }

    /// Places a non-king piece on an empty square (fixture helper; panics
    /// if the square is occupied or the move would place a second king).
    pub fn put_piece(&mut self, square: Square, piece_type: PieceType, color: Color) {
        assert!(!piece_type.is_king(), "use bare_kings to place kings");
        assert!(self.board[square.index()].is_none());
        self.board[square.index()] = Some(Occupant { piece_type, color });
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn king_square(&self, color: Color) -> Square {
        self.king_squares[color.index()]
    }

    /// Non-king pieces as `(piece_type, square, color)` triples, in board
    /// order. The feature indexer further projects each into a BonaPiece
    /// per perspective.
    pub fn pieces(&self) -> impl Iterator<Item = (PieceType, Square, Color)> + '_ {
        self.board.iter().enumerate().filter_map(|(i, occ)| {
            occ.and_then(|o| {
                if o.piece_type.is_king() {
                    None
                } else {
                    Some((o.piece_type, Square::new(i as u8), o.color))
                }
            })
        })
    }

    /// The piece (if any) on `square`, kings included. Used by callers that
    /// need to inspect a square directly rather than enumerate non-king
    /// pieces, e.g. detecting a capture before calling `make_move`.
    pub fn piece_at(&self, square: Square) -> Option<(PieceType, Color)> {
        self.board[square.index()].map(|o| (o.piece_type, o.color))
    }

    pub fn state(&self) -> &State {
        &self.states[self.current]
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.states[self.current]
    }

    /// Resolves `state().previous` through the owning stack (see the note
    /// on `State::previous`).
    pub fn previous_state(&self) -> Option<&State> {
        self.state().previous.map(|i| &self.states[i])
    }

    /// The current state's index into the owning stack, for callers (the
    /// feature transformer) that need to read the parent's accumulator
    /// while independently mutating the current one.
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn state_at(&self, index: usize) -> &State {
        &self.states[index]
    }

    /// Applies `mv`, pushing a new state computed from it. Does not
    /// validate legality.
    pub fn make_move(&mut self, mv: PieceMove) {
        let mover = self.board[mv.from.index()].expect("make_move: no piece on `from`");
        let mut dirty = DirtyPiece::NONE;

        if let Some(captured_type) = mv.captured {
            let captured_ext = ExtBonaPiece::from_board(captured_type, mv.to, mover.color.opponent());
            dirty.push(captured_ext, ExtBonaPiece::NONE);
        }

        if mover.piece_type.is_king() {
            dirty.king_moved[mover.color.index()] = true;
            self.king_squares[mover.color.index()] = mv.to;
        } else {
            let new_type = mv.promotion.unwrap_or(mover.piece_type);
            let old_ext = ExtBonaPiece::from_board(mover.piece_type, mv.from, mover.color);
            let new_ext = ExtBonaPiece::from_board(new_type, mv.to, mover.color);
            dirty.push(old_ext, new_ext);
        }

        self.board[mv.from.index()] = None;
        self.board[mv.to.index()] = Some(Occupant {
            piece_type: mv.promotion.unwrap_or(mover.piece_type),
            color: mover.color,
        });

        let parent_index = self.current;
        self.states.push(State::child_of(parent_index, dirty));
        self.current = self.states.len() - 1;
        self.side_to_move = self.side_to_move.opponent();
    }

    /// Pops the most recent state, restoring the board to before the last
    /// `make_move`. Test/demo helper only; a real engine's undo also
    /// restores the board, which this delegates to the caller keeping its
    /// own move log since this minimal model does not capture full undo
    /// metadata (that lives outside the NNUE core's scope).
    pub fn pop_state(&mut self) {
        assert!(self.state().previous.is_some(), "cannot pop the root state");
        self.current = self.state().previous.unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_has_32_pieces_and_both_kings() {
        let pos = Position::startpos();
        assert_eq!(pos.pieces().count(), 30);
        assert_eq!(pos.king_square(Color::White), Square::from_file_rank(4, 0));
        assert_eq!(pos.king_square(Color::Black), Square::from_file_rank(4, 7));
    }

    #[test]
    fn make_move_advances_state_stack() {
        let mut pos = Position::startpos();
        assert!(pos.previous_state().is_none());
        pos.make_move(PieceMove {
            from: Square::from_file_rank(4, 1),
            to: Square::from_file_rank(4, 3),
            captured: None,
            promotion: None,
        });
        assert!(pos.previous_state().is_some());
        assert_eq!(pos.side_to_move(), Color::Black);
    }

    #[test]
    fn piece_at_reports_occupant_including_kings() {
        let pos = Position::startpos();
        assert_eq!(pos.piece_at(Square::from_file_rank(4, 0)), Some((PieceType::King, Color::White)));
        assert_eq!(pos.piece_at(Square::from_file_rank(0, 1)), Some((PieceType::Pawn, Color::White)));
        assert_eq!(pos.piece_at(Square::from_file_rank(0, 3)), None);
    }

    #[test]
    fn king_move_sets_king_moved_flag() {
        let mut pos = Position::bare_kings(Square::from_file_rank(4, 0), Square::from_file_rank(4, 7));
        pos.make_move(PieceMove {
            from: Square::from_file_rank(4, 0),
            to: Square::from_file_rank(4, 1),
            captured: None,
            promotion: None,
        });
        assert!(pos.state().dirty_piece.king_moved[Color::White.index()]);
        assert!(!pos.state().dirty_piece.king_moved[Color::Black.index()]);
        assert_eq!(pos.king_square(Color::White), Square::from_file_rank(4, 1));
    }
}
