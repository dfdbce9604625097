use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::{Board, BoardError, ParseBoardError};

impl Board {
    /// Reads a board file: a `<rows>x<cols>` line, followed by one card value
    /// per line in row-major order.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ParseBoardError> {
        std::fs::read_to_string(path)?.parse()
    }

    /// Creates a `rows` by `cols` board with the `values` repeated in as equal
    /// numbers as possible, in random order.
    ///
    /// Every value appears `rows * cols / values.len()` times. The remaining
    /// cells are filled with values drawn independently from `values`.
    pub fn generate_random<R: Rng>(
        rows: usize,
        cols: usize,
        values: &BTreeSet<String>,
        rng: &mut R,
    ) -> Result<Self, BoardError> {
        if values.is_empty() {
            return Err(BoardError::NoCardValues);
        }
        if rows == 0 || cols == 0 {
            return Err(BoardError::ZeroDimension { rows, cols });
        }
        let total = rows.saturating_mul(cols);
        let repetitions = total / values.len();

        let mut cards = Vec::with_capacity(total);
        for value in values {
            cards.extend(std::iter::repeat(value).take(repetitions).cloned());
        }
        let values: Vec<&String> = values.iter().collect();
        while cards.len() < total {
            cards.push(values[rng.gen_range(0..values.len())].clone());
        }
        cards.shuffle(rng);
        Board::new(rows, cols, cards)
    }
}

impl FromStr for Board {
    type Err = ParseBoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines = s.lines();
        let header = lines.next().ok_or(ParseBoardError::MissingSizeHeader)?;
        let (rows, cols) =
            parse_size(header).ok_or_else(|| ParseBoardError::MalformedSizeHeader {
                line: String::from(header),
            })?;

        let mut values = Vec::new();
        for row in 0..rows {
            for col in 0..cols {
                let line = lines.next().ok_or(ParseBoardError::MissingCard { row, col })?;
                if line.is_empty() {
                    return Err(ParseBoardError::EmptyCard { row, col });
                }
                values.push(String::from(line));
            }
        }
        Ok(Board::new(rows, cols, values)?)
    }
}

fn parse_size(line: &str) -> Option<(usize, usize)> {
    let (rows, cols) = line.trim().split_once('x')?;
    Some((rows.parse().ok()?, cols.parse().ok()?))
}
