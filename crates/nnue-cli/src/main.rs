//! Loads an NNUE parameter file and prints the evaluation of the starting
//! position, or of a position reached from it by a `--moves` list (or, with
//! `--zero`, of a zero-initialized network, for smoke testing without a
//! real parameter file).

use anyhow::{bail, Context, Result};
use clap::Parser;
use nnue_engine::nnue::evaluator;
use nnue_engine::position::{PieceMove, Position};
use nnue_engine::types::{PieceType, Square};
use nnue_engine::EvalConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the NNUE parameter file. Defaults to the build-embedded name.
    #[arg(long)]
    eval_file: Option<String>,

    /// Skip loading a parameter file and evaluate with zero-initialized
    /// parameters instead (every position scores 0).
    #[arg(long)]
    zero: bool,

    /// Space-separated UCI-style moves to play from the startpos before
    /// evaluating, e.g. `"e2e4 e7e5 g1f3"`. Promotions append the piece
    /// letter (`e7e8q`). Omit to evaluate the startpos itself.
    #[arg(long)]
    moves: Option<String>,

    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,
}

/// Parses a single square in `[a-h][1-8]` form, e.g. `"e4"`.
fn parse_square(token: &str) -> Result<Square> {
    let bytes = token.as_bytes();
    if bytes.len() != 2 {
        bail!("invalid square `{token}`");
    }
    let file = bytes[0];
    let rank = bytes[1];
    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'9').contains(&rank) {
        bail!("invalid square `{token}`");
    }
    let rank = rank - b'1';
    if rank > 7 {
        bail!("invalid square `{token}`");
    }
    Ok(Square::from_file_rank(file - b'a', rank))
}

fn parse_promotion(ch: u8) -> Result<PieceType> {
    match ch {
        b'q' => Ok(PieceType::Queen),
        b'r' => Ok(PieceType::Rook),
        b'b' => Ok(PieceType::Bishop),
        b'n' => Ok(PieceType::Knight),
        other => bail!("invalid promotion piece `{}`", other as char),
    }
}

/// Parses one `e2e4`/`e7e8q`-style token into a `PieceMove`, filling in
/// `captured` from whatever already sits on the destination square.
fn parse_move(pos: &Position, token: &str) -> Result<PieceMove> {
    let bytes = token.as_bytes();
    if bytes.len() != 4 && bytes.len() != 5 {
        bail!("invalid move `{token}`");
    }
    let from = parse_square(&token[0..2]).with_context(|| format!("in move `{token}`"))?;
    let to = parse_square(&token[2..4]).with_context(|| format!("in move `{token}`"))?;
    let promotion = if bytes.len() == 5 { Some(parse_promotion(bytes[4])?) } else { None };
    let captured = pos.piece_at(to).map(|(piece_type, _)| piece_type);
    Ok(PieceMove { from, to, captured, promotion })
}

fn apply_moves(pos: &mut Position, moves: &str) -> Result<()> {
    for token in moves.split_whitespace() {
        let mv = parse_move(pos, token)?;
        pos.make_move(mv);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, log_level))
        .init();

    let config = EvalConfig {
        eval_file: args.eval_file,
        skip_loading_eval: args.zero,
        ..EvalConfig::default()
    };
    evaluator::load(&config)?;

    let mut pos = Position::startpos();
    if let Some(moves) = &args.moves {
        apply_moves(&mut pos, moves)?;
    }
    let score = evaluator::evaluate(&mut pos);
    println!("score: {score} cp");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_quiet_move_list() {
        let mut pos = Position::startpos();
        apply_moves(&mut pos, "e2e4 e7e5 g1f3 b8c6").unwrap();
        assert_eq!(pos.side_to_move(), nnue_engine::types::Color::White);
    }

    #[test]
    fn detects_a_capture_from_board_state() {
        let mut pos = Position::startpos();
        apply_moves(&mut pos, "e2e4 d7d5").unwrap();
        let mv = parse_move(&pos, "e4d5").unwrap();
        assert_eq!(mv.captured, Some(PieceType::Pawn));
    }

    #[test]
    fn rejects_a_malformed_token() {
        let pos = Position::startpos();
        assert!(parse_move(&pos, "e2e9").is_err());
        assert!(parse_move(&pos, "xyz").is_err());
    }
}
