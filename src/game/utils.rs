use chess::{Board, Color, Piece, Rank, Square, ALL_SQUARES};
use std::str::FromStr;

use crate::error::MoveError;

/// Parse an algebraic square name such as `e4`.
pub fn parse_square(name: &str) -> Result<Square, MoveError> {
    let name = name.trim().to_lowercase();
    if name.len() != 2 {
        return Err(MoveError::InvalidSquare(name));
    }
    Square::from_str(&name).map_err(|_| MoveError::InvalidSquare(name))
}

/// True when `square` is the rank a pawn of `color` promotes on.
pub fn is_last_rank(square: Square, color: Color) -> bool {
    match color {
        Color::White => square.get_rank() == Rank::Eighth,
        Color::Black => square.get_rank() == Rank::First,
    }
}

/// Check if the board has insufficient material for checkmate
pub fn has_insufficient_material(board: &Board) -> bool {
    // (piece, owner, square shade) for every knight and bishop
    let mut minors = Vec::new();

    for square in ALL_SQUARES {
        let piece = match board.piece_on(square) {
            Some(piece) => piece,
            None => continue,
        };
        match piece {
            Piece::King => {}
            Piece::Knight | Piece::Bishop => {
                let shade = (square.get_rank().to_index() + square.get_file().to_index()) % 2;
                minors.push((piece, board.color_on(square), shade));
            }
            // Any pawn, rook or queen can still mate
            _ => return false,
        }
    }

    match minors.as_slice() {
        // King vs king, or a lone minor piece
        [] | [_] => true,
        // One bishop each, both on the same square colour
        [(Piece::Bishop, owner_a, shade_a), (Piece::Bishop, owner_b, shade_b)] => {
            owner_a != owner_b && shade_a == shade_b
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(fen: &str) -> Board {
        Board::from_str(fen).unwrap()
    }

    #[test]
    fn parses_squares_case_insensitively() {
        assert_eq!(parse_square("E2").unwrap(), Square::E2);
        assert!(matches!(parse_square("z9"), Err(MoveError::InvalidSquare(_))));
        assert!(matches!(parse_square("e22"), Err(MoveError::InvalidSquare(_))));
    }

    #[test]
    fn last_rank_depends_on_colour() {
        assert!(is_last_rank(Square::A8, Color::White));
        assert!(!is_last_rank(Square::A8, Color::Black));
        assert!(is_last_rank(Square::H1, Color::Black));
    }

    #[test]
    fn bare_kings_and_lone_minors_are_insufficient() {
        assert!(has_insufficient_material(&board("4k3/8/8/8/8/8/8/4K3 w - - 0 1")));
        assert!(has_insufficient_material(&board("4k3/8/8/8/8/8/8/2N1K3 w - - 0 1")));
        assert!(has_insufficient_material(&board("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1")));
    }

    #[test]
    fn same_shade_bishops_are_insufficient() {
        // c1 and f8 are both dark squares
        assert!(has_insufficient_material(&board("4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1")));
        // c1 dark, c8 light
        assert!(!has_insufficient_material(&board("2b1k3/8/8/8/8/8/8/2B1K3 w - - 0 1")));
    }

    #[test]
    fn pawns_and_majors_are_sufficient() {
        assert!(!has_insufficient_material(&board("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1")));
        assert!(!has_insufficient_material(&board("4k3/8/8/8/8/8/8/R3K3 w - - 0 1")));
        assert!(!has_insufficient_material(&Board::default()));
    }
}
