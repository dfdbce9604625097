/// The error type for constructing a [`Board`](crate::Board) from card values.
#[derive(Debug, PartialEq, Eq)]
pub enum BoardError {
    ZeroDimension { rows: usize, cols: usize },
    WrongCardCount { expected: usize, found: usize },
    NoCardValues,
}

impl std::error::Error for BoardError {}

impl std::fmt::Display for BoardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoardError::ZeroDimension { rows, cols } =>
                write!(f, "A board must have at least one row and one column, but the requested size was {}x{}", rows, cols),
            BoardError::WrongCardCount { expected, found } =>
                write!(f, "Expected {} cards to fill the board, but got {}", expected, found),
            BoardError::NoCardValues =>
                write!(f, "Cannot generate a random board without any card values"),
        }
    }
}

/// The error type for reading a board file.
#[derive(Debug)]
pub enum ParseBoardError {
    Io(std::io::Error),
    MissingSizeHeader,
    MalformedSizeHeader { line: String },
    MissingCard { row: usize, col: usize },
    EmptyCard { row: usize, col: usize },
    InvalidBoard(BoardError),
}

impl std::error::Error for ParseBoardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseBoardError::Io(err) => Some(err),
            ParseBoardError::InvalidBoard(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParseBoardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseBoardError::Io(_) => write!(f, "Could not read the board file"),
            ParseBoardError::MissingSizeHeader => write!(f, "The board file is empty"),
            ParseBoardError::MalformedSizeHeader { line } =>
                write!(f, "Expected a size line of the form <rows>x<cols>, found '{}'", line),
            ParseBoardError::MissingCard { row, col } =>
                write!(f, "The board file ends before the card at ({}, {})", row, col),
            ParseBoardError::EmptyCard { row, col } =>
                write!(f, "The card at ({}, {}) is an empty line", row, col),
            ParseBoardError::InvalidBoard(_) => write!(f, "The board file describes an invalid board"),
        }
    }
}

impl From<std::io::Error> for ParseBoardError {
    fn from(err: std::io::Error) -> Self {
        ParseBoardError::Io(err)
    }
}

impl From<BoardError> for ParseBoardError {
    fn from(err: BoardError) -> Self {
        ParseBoardError::InvalidBoard(err)
    }
}
