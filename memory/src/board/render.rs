use crate::{Board, PlayerId};

impl Board {
    /// The board as seen by `viewer`: a `<rows>x<cols>` line followed by one
    /// line per card in row-major order, each one of `none`, `down`,
    /// `up <value>` or `my <value>`.
    ///
    /// Cards are locked one at a time, so this is a consistent snapshot of
    /// each card but not of the board as a whole.
    pub fn render_for(&self, viewer: &PlayerId) -> String {
        let mut result = format!("{}x{}\n", self.rows(), self.cols());
        for card in self.cards() {
            let state = card.snapshot();
            if state.is_removed() {
                result += "none\n";
            } else if !state.is_face_up() {
                result += "down\n";
            } else if state.is_owned_by(viewer) {
                result += &format!("my {}\n", card.value());
            } else {
                result += &format!("up {}\n", card.value());
            }
        }
        result
    }
}

/// The canonical rendering with every card's value, regardless of its state.
impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Board Size: {}x{}", self.rows(), self.cols())?;
        for row in self.cards().chunks(self.cols()) {
            let mut line = String::new();
            for (col, card) in row.iter().enumerate() {
                if col > 0 {
                    line.push(' ');
                }
                line.push_str(card.value());
            }
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
