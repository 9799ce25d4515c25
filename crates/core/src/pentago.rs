use crate::error::{GameError, Result};
use crate::lines::WinLines;
use crate::state::{ActionMask, Cell, GameState, Player};
use crate::{check_distribution, check_symmetry, GameRules};

const SIZE: usize = 6;
const QUADRANT: usize = 3;
const CELLS: usize = SIZE * SIZE;
const ACTIONS_PER_CELL: usize = 8;
const ACTION_SIZE: usize = CELLS * ACTIONS_PER_CELL;
const IN_A_ROW: usize = 5;
const SYMMETRIES: usize = 8;

/// Direction in which a quadrant is twisted after placing a stone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

/// Pentago on a 6x6 board: place a stone, then twist one 3x3 quadrant.
///
/// Action layout is `cell * 8 + quadrant * 2 + direction` where quadrants are
/// numbered 0 top-left, 1 top-right, 2 bottom-left, 3 bottom-right and
/// direction 0 is clockwise. Five in a row wins; when a twist completes lines
/// for both players at once the mover is awarded the game.
#[derive(Debug, Clone)]
pub struct Pentago {
    lines: WinLines,
}

impl Pentago {
    pub fn new() -> Self {
        Self {
            lines: WinLines::new(SIZE, SIZE, IN_A_ROW),
        }
    }

    /// Pack a (cell, quadrant, rotation) triple into an action index
    pub fn encode_action(cell: usize, quadrant: usize, rotation: Rotation) -> usize {
        let dir = match rotation {
            Rotation::Clockwise => 0,
            Rotation::CounterClockwise => 1,
        };
        cell * ACTIONS_PER_CELL + quadrant * 2 + dir
    }

    /// Unpack an action index into (cell, quadrant, rotation)
    pub fn decode_action(action: usize) -> (usize, usize, Rotation) {
        let cell = action / ACTIONS_PER_CELL;
        let quadrant = (action % ACTIONS_PER_CELL) / 2;
        let rotation = if action % 2 == 0 {
            Rotation::Clockwise
        } else {
            Rotation::CounterClockwise
        };
        (cell, quadrant, rotation)
    }

    fn rotate_quadrant(board: &mut [Cell], quadrant: usize, rotation: Rotation) {
        let r0 = (quadrant / 2) * QUADRANT;
        let c0 = (quadrant % 2) * QUADRANT;
        let mut local = [None; QUADRANT * QUADRANT];
        for r in 0..QUADRANT {
            for c in 0..QUADRANT {
                local[r * QUADRANT + c] = board[(r0 + r) * SIZE + c0 + c];
            }
        }
        for r in 0..QUADRANT {
            for c in 0..QUADRANT {
                let (nr, nc) = match rotation {
                    Rotation::Clockwise => (c, QUADRANT - 1 - r),
                    Rotation::CounterClockwise => (QUADRANT - 1 - c, r),
                };
                board[(r0 + nr) * SIZE + c0 + nc] = local[r * QUADRANT + c];
            }
        }
    }

    /// Image of a cell index under a board symmetry.
    ///
    /// Symmetries 0..4 rotate the board clockwise that many times; 4..8
    /// mirror left-right first and then rotate.
    fn map_cell(symmetry: usize, cell: usize) -> usize {
        let (mut r, mut c) = (cell / SIZE, cell % SIZE);
        if symmetry >= 4 {
            c = SIZE - 1 - c;
        }
        for _ in 0..symmetry % 4 {
            (r, c) = (c, SIZE - 1 - r);
        }
        r * SIZE + c
    }

    fn map_action(symmetry: usize, action: usize) -> usize {
        let (cell, quadrant, rotation) = Self::decode_action(action);

        // Track a quadrant through its centre cell
        let centre = ((quadrant / 2) * QUADRANT + 1) * SIZE + (quadrant % 2) * QUADRANT + 1;
        let mapped_centre = Self::map_cell(symmetry, centre);
        let mapped_quadrant = (mapped_centre / SIZE / QUADRANT) * 2 + (mapped_centre % SIZE) / QUADRANT;

        // Mirroring reverses the sense of rotation
        let mapped_rotation = match (symmetry >= 4, rotation) {
            (false, r) => r,
            (true, Rotation::Clockwise) => Rotation::CounterClockwise,
            (true, Rotation::CounterClockwise) => Rotation::Clockwise,
        };

        Self::encode_action(Self::map_cell(symmetry, cell), mapped_quadrant, mapped_rotation)
    }
}

impl Default for Pentago {
    fn default() -> Self {
        Self::new()
    }
}

impl GameRules for Pentago {
    fn board_shape(&self) -> (usize, usize) {
        (SIZE, SIZE)
    }

    fn action_size(&self) -> usize {
        ACTION_SIZE
    }

    fn start_state(&self) -> GameState {
        GameState::from_parts(vec![None; CELLS], Player::Zero, None)
    }

    fn next_state(&self, state: &GameState, action: usize) -> Result<GameState> {
        if self.is_terminal(state) {
            return Err(GameError::TerminalState);
        }
        if action >= ACTION_SIZE {
            return Err(GameError::ActionOutOfRange {
                action,
                size: ACTION_SIZE,
            });
        }
        let (cell, quadrant, rotation) = Self::decode_action(action);
        if state.board()[cell].is_some() {
            return Err(GameError::IllegalAction { action });
        }

        let mover = state.player();
        let mut board = state.board().to_vec();
        board[cell] = Some(mover);
        Self::rotate_quadrant(&mut board, quadrant, rotation);

        // A twist moves several stones, so every line is checked
        let winner = if self.lines.has_line(&board, mover) {
            Some(mover)
        } else if self.lines.has_line(&board, mover.other()) {
            Some(mover.other())
        } else {
            None
        };

        Ok(GameState::from_parts(board, mover.other(), winner))
    }

    fn action_mask(&self, state: &GameState) -> Result<ActionMask> {
        if self.is_terminal(state) {
            return Err(GameError::TerminalState);
        }
        let mut mask = ActionMask::empty(ACTION_SIZE);
        for (cell, content) in state.board().iter().enumerate() {
            if content.is_none() {
                for offset in 0..ACTIONS_PER_CELL {
                    mask.set(cell * ACTIONS_PER_CELL + offset);
                }
            }
        }
        Ok(mask)
    }

    fn symmetry_count(&self) -> usize {
        SYMMETRIES
    }

    fn transform_state(&self, state: &GameState, symmetry: usize) -> Result<GameState> {
        check_symmetry(symmetry, SYMMETRIES)?;
        let mut board = vec![None; CELLS];
        for (cell, &content) in state.board().iter().enumerate() {
            board[Self::map_cell(symmetry, cell)] = content;
        }
        Ok(GameState::from_parts(board, state.player(), state.winner()))
    }

    fn transform_distribution(&self, distribution: &[f32], symmetry: usize) -> Result<Vec<f32>> {
        check_symmetry(symmetry, SYMMETRIES)?;
        check_distribution(distribution, ACTION_SIZE)?;
        let mut out = vec![0.0; ACTION_SIZE];
        for (action, &p) in distribution.iter().enumerate() {
            out[Self::map_action(symmetry, action)] = p;
        }
        Ok(out)
    }

    fn inverse_symmetry(&self, symmetry: usize) -> Result<usize> {
        check_symmetry(symmetry, SYMMETRIES)?;
        // Mirror-then-rotate elements are involutions
        Ok(if symmetry < 4 { (4 - symmetry) % 4 } else { symmetry })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(r: usize, c: usize) -> usize {
        r * SIZE + c
    }

    /// A position with stones spread over all four quadrants
    fn sample_state(game: &Pentago) -> GameState {
        let moves = [
            Pentago::encode_action(cell(0, 0), 3, Rotation::Clockwise),
            Pentago::encode_action(cell(1, 4), 2, Rotation::CounterClockwise),
            Pentago::encode_action(cell(5, 2), 1, Rotation::Clockwise),
            Pentago::encode_action(cell(3, 5), 0, Rotation::Clockwise),
        ];
        moves.iter().fold(game.start_state(), |s, &a| {
            game.next_state(&s, a).unwrap()
        })
    }

    #[test]
    fn test_action_codec() {
        for action in 0..ACTION_SIZE {
            let (c, q, r) = Pentago::decode_action(action);
            assert_eq!(Pentago::encode_action(c, q, r), action);
        }
    }

    #[test]
    fn test_place_and_rotate_clockwise() {
        let game = Pentago::new();
        let state = game.start_state();
        // Top-left corner of quadrant 0 moves to its top-right corner
        let action = Pentago::encode_action(cell(0, 0), 0, Rotation::Clockwise);
        let next = game.next_state(&state, action).unwrap();

        assert_eq!(next.board()[cell(0, 2)], Some(Player::Zero));
        assert_eq!(next.board()[cell(0, 0)], None);
        assert_eq!(next.player(), Player::One);

        let action = Pentago::encode_action(cell(0, 0), 0, Rotation::CounterClockwise);
        let next = game.next_state(&state, action).unwrap();
        assert_eq!(next.board()[cell(2, 0)], Some(Player::Zero));
    }

    #[test]
    fn test_occupied_cell_is_illegal() {
        let game = Pentago::new();
        let action = Pentago::encode_action(cell(1, 1), 0, Rotation::Clockwise);
        // The centre of a quadrant does not move when it is twisted
        let state = game.next_state(&game.start_state(), action).unwrap();

        let mask = game.action_mask(&state).unwrap();
        assert_eq!(mask.count(), (CELLS - 1) * ACTIONS_PER_CELL);
        assert!(!mask.is_legal(action));
        assert_eq!(
            game.next_state(&state, action),
            Err(GameError::IllegalAction { action })
        );
    }

    #[test]
    fn test_five_in_a_row_wins() {
        let game = Pentago::new();
        let mut state = game.start_state();
        // Player zero fills row 1 of quadrants 0 and 1 using centre-preserving
        // twists of the bottom quadrants; player one plays into row 5.
        let zero_cells = [cell(1, 1), cell(1, 4), cell(1, 0), cell(1, 2), cell(1, 3)];
        let one_cells = [cell(5, 0), cell(5, 1), cell(5, 3), cell(5, 4)];

        for i in 0..5 {
            // Twist quadrant 2 back and forth so rows 0-2 are untouched
            let rot = if i % 2 == 0 {
                Rotation::Clockwise
            } else {
                Rotation::CounterClockwise
            };
            state = game
                .next_state(&state, Pentago::encode_action(zero_cells[i], 2, rot))
                .unwrap();
            if i < 4 {
                assert_eq!(state.winner(), None);
                state = game
                    .next_state(&state, Pentago::encode_action(one_cells[i], 3, rot))
                    .unwrap();
            }
        }

        assert_eq!(state.winner(), Some(Player::Zero));
        assert!(game.is_terminal(&state));
    }

    #[test]
    fn test_symmetry_round_trip() {
        let game = Pentago::new();
        let state = sample_state(&game);

        for sym in game.all_symmetries() {
            let image = game.apply_symmetries(&state, &[sym]).unwrap().remove(0);
            let inverse = game.inverse_symmetry(sym).unwrap();
            let back = game.apply_symmetries(&image, &[inverse]).unwrap().remove(0);
            assert_eq!(back, state, "symmetry {sym}");
        }
    }

    #[test]
    fn test_distribution_round_trip() {
        let game = Pentago::new();
        let dist: Vec<f32> = (0..ACTION_SIZE).map(|a| a as f32).collect();

        for sym in game.all_symmetries() {
            let image = game.transform_distribution(&dist, sym).unwrap();
            let inverse = game.inverse_symmetry(sym).unwrap();
            let back = game.transform_distribution(&image, inverse).unwrap();
            assert_eq!(back, dist, "symmetry {sym}");
        }
    }

    #[test]
    fn test_moves_commute_with_symmetries() {
        let game = Pentago::new();
        let state = sample_state(&game);
        let mask = game.action_mask(&state).unwrap();

        for sym in game.all_symmetries() {
            let sym_state = game.transform_state(&state, sym).unwrap();
            for action in mask.iter_legal().step_by(7) {
                let expected = game
                    .transform_state(&game.next_state(&state, action).unwrap(), sym)
                    .unwrap();
                let actual = game
                    .next_state(&sym_state, Pentago::map_action(sym, action))
                    .unwrap();
                assert_eq!(actual, expected, "symmetry {sym}, action {action}");
            }
        }
    }
}
