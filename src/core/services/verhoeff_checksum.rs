use thiserror::Error;

// Cayley table of the dihedral group D5
const MULTIPLICATION: [[u8; 10]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 2, 3, 4, 0, 6, 7, 8, 9, 5],
    [2, 3, 4, 0, 1, 7, 8, 9, 5, 6],
    [3, 4, 0, 1, 2, 8, 9, 5, 6, 7],
    [4, 0, 1, 2, 3, 9, 5, 6, 7, 8],
    [5, 9, 8, 7, 6, 0, 4, 3, 2, 1],
    [6, 5, 9, 8, 7, 1, 0, 4, 3, 2],
    [7, 6, 5, 9, 8, 2, 1, 0, 4, 3],
    [8, 7, 6, 5, 9, 3, 2, 1, 0, 4],
    [9, 8, 7, 6, 5, 4, 3, 2, 1, 0],
];

const PERMUTATION: [[u8; 10]; 8] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 5, 7, 6, 2, 8, 3, 0, 9, 4],
    [5, 8, 0, 3, 7, 9, 6, 1, 4, 2],
    [8, 9, 1, 6, 0, 4, 3, 5, 2, 7],
    [9, 4, 5, 3, 1, 2, 6, 8, 7, 0],
    [4, 2, 8, 6, 5, 7, 3, 9, 0, 1],
    [2, 7, 9, 3, 8, 0, 6, 4, 1, 5],
    [7, 0, 4, 6, 9, 1, 3, 2, 5, 8],
];

const INVERSE: [u8; 10] = [0, 4, 3, 2, 1, 5, 6, 7, 8, 9];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChecksumError {
    #[error("checksum input is empty")]
    Empty,
    #[error("checksum input has non-digit {character:?} at position {position}")]
    NonDigit { character: char, position: usize },
}

fn parse_digits(input: &str) -> Result<Vec<u8>, ChecksumError> {
    if input.is_empty() {
        return Err(ChecksumError::Empty);
    }

    input
        .chars()
        .enumerate()
        .map(|(position, character)| match character.to_digit(10) {
            Some(value) => Ok(value as u8),
            None => Err(ChecksumError::NonDigit {
                character,
                position,
            }),
        })
        .collect()
}

fn fold_reversed(digits: &[u8], offset: usize) -> u8 {
    digits
        .iter()
        .rev()
        .enumerate()
        .fold(0u8, |accumulator, (position, &digit)| {
            let permuted = PERMUTATION[(position + offset) % 8][digit as usize];
            MULTIPLICATION[accumulator as usize][permuted as usize]
        })
}

/// Length is not checked. A one-digit string is evaluated like any other.
pub fn validate(digits: &str) -> Result<bool, ChecksumError> {
    let parsed = parse_digits(digits)?;
    Ok(fold_reversed(&parsed, 0) == 0)
}

pub fn compute_check_digit(payload: &str) -> Result<u8, ChecksumError> {
    let parsed = parse_digits(payload)?;
    Ok(INVERSE[fold_reversed(&parsed, 1) as usize])
}
