use crate::state::{Cell, Player};

/// Precomputed index table of every k-in-a-row line on a rows x cols board.
///
/// Built once per game and reused for every terminal check.
#[derive(Debug, Clone)]
pub struct WinLines {
    lines: Vec<Vec<usize>>,
    /// For each cell, the indices of the lines passing through it
    through: Vec<Vec<usize>>,
}

impl WinLines {
    pub fn new(rows: usize, cols: usize, k: usize) -> Self {
        let mut lines: Vec<Vec<usize>> = Vec::new();

        // (row step, col step): horizontal, vertical, down-right, down-left
        let directions: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

        for (dr, dc) in directions {
            for row in 0..rows as isize {
                for col in 0..cols as isize {
                    let end_r = row + dr * (k as isize - 1);
                    let end_c = col + dc * (k as isize - 1);
                    if end_r < 0 || end_r >= rows as isize || end_c < 0 || end_c >= cols as isize {
                        continue;
                    }
                    let line: Vec<usize> = (0..k as isize)
                        .map(|i| ((row + dr * i) * cols as isize + (col + dc * i)) as usize)
                        .collect();
                    lines.push(line);
                }
            }
        }

        // With k == 1 every direction yields the same single-cell line
        if k == 1 {
            lines.sort();
            lines.dedup();
        }

        let mut through = vec![Vec::new(); rows * cols];
        for (idx, line) in lines.iter().enumerate() {
            for &cell in line {
                through[cell].push(idx);
            }
        }

        Self { lines, through }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether `player` owns a full line passing through `cell`
    pub fn completes_through(&self, board: &[Cell], cell: usize, player: Player) -> bool {
        self.through[cell]
            .iter()
            .any(|&idx| self.owns_line(board, idx, player))
    }

    /// Whether `player` owns any full line on the board
    pub fn has_line(&self, board: &[Cell], player: Player) -> bool {
        (0..self.lines.len()).any(|idx| self.owns_line(board, idx, player))
    }

    fn owns_line(&self, board: &[Cell], idx: usize, player: Player) -> bool {
        self.lines[idx].iter().all(|&c| board[c] == Some(player))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_count_connect_four() {
        // 24 horizontal + 21 vertical + 12 + 12 diagonals
        let lines = WinLines::new(6, 7, 4);
        assert_eq!(lines.len(), 69);
    }

    #[test]
    fn test_line_count_pentago() {
        // 12 horizontal + 12 vertical + 4 + 4 diagonals
        let lines = WinLines::new(6, 6, 5);
        assert_eq!(lines.len(), 32);
    }

    #[test]
    fn test_single_cell_lines_are_unique() {
        let lines = WinLines::new(2, 2, 1);
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_completes_through_only_checks_local_lines() {
        let lines = WinLines::new(3, 3, 3);
        let mut board: Vec<Cell> = vec![None; 9];
        board[0] = Some(Player::One);
        board[1] = Some(Player::One);
        board[2] = Some(Player::One);

        assert!(lines.completes_through(&board, 1, Player::One));
        assert!(!lines.completes_through(&board, 4, Player::One));
        assert!(lines.has_line(&board, Player::One));
        assert!(!lines.has_line(&board, Player::Zero));
    }
}
