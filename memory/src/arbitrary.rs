/// A single flip in a [`FlipScript`].
///
/// Coordinates range over one more row and column than the 3x3 test board,
/// so that flips outside of the board are covered too.
#[derive(Clone, Debug)]
pub struct ScriptedFlip {
    pub player: usize,
    pub row: usize,
    pub col: usize,
}

/// A sequence of flips by up to three players on a 3x3 board.
#[derive(Clone, Debug)]
pub struct FlipScript {
    pub flips: Vec<ScriptedFlip>,
}

impl quickcheck::Arbitrary for ScriptedFlip {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        Self {
            player: (u8::arbitrary(g) % 3) as usize,
            row: (u8::arbitrary(g) % 4) as usize,
            col: (u8::arbitrary(g) % 4) as usize,
        }
    }
}

impl quickcheck::Arbitrary for FlipScript {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        Self {
            flips: Vec::<ScriptedFlip>::arbitrary(g),
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        Box::new(
            quickcheck::Arbitrary::shrink(&self.flips).map(|flips| FlipScript { flips }),
        )
    }
}
