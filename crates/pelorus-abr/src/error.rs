use thiserror::Error;

#[derive(Debug, Error)]
pub enum AbrError {
    #[error("Representation ladder is empty")]
    EmptyLadder,

    #[error("Unknown representation: {0}")]
    UnknownRepresentation(String),
}

pub type AbrResult<T> = Result<T, AbrError>;
