use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum Error {
    #[error("raw is too small for a fragment header")]
    ErrHeaderTooSmall,
    #[error("datagram length {len} != header + fragment size {expected}")]
    ErrDatagramUnexpectedLength { len: usize, expected: usize },
    #[error("invalid code parameters: K {k} must satisfy 1 <= K < N {n}")]
    ErrInvalidCodeParams { k: u16, n: u16 },
    #[error("fragment index {frag_idx} out of range for N {n}")]
    ErrFragmentIndexOutOfRange { frag_idx: u16, n: u16 },
    #[error("block index {block_idx} out of range for num_blocks {num_blocks}")]
    ErrBlockIndexOutOfRange { block_idx: u32, num_blocks: u16 },
    #[error("fragment K/N/num_blocks {got_k}/{got_n}/{got_num_blocks} disagree with message {expected_k}/{expected_n}/{expected_num_blocks}")]
    ErrInconsistentMessageParams {
        expected_k: u16,
        expected_n: u16,
        expected_num_blocks: u16,
        got_k: u16,
        got_n: u16,
        got_num_blocks: u16,
    },
    #[error("fragment padlen {got} disagrees with block padlen {expected}")]
    ErrInconsistentBlockParams { expected: u32, got: u32 },
    #[error("duplicate fragment {frag_idx} in block {block_idx}")]
    ErrDuplicateFragment { block_idx: u32, frag_idx: u16 },
    #[error("block {block_idx} of message {message_id} failed to decode: {reason}")]
    ErrBlockDecodeFailed {
        message_id: u32,
        block_idx: u32,
        reason: String,
    },

    #[error("reconstructed payload too short to carry an image length")]
    ErrPayloadTooShort,
    #[error("image length {image_len} exceeds reconstructed payload length {payload_len}")]
    ErrImageLengthOutOfRange { image_len: usize, payload_len: usize },

    #[error("no (K, N) candidate satisfies the code bounds")]
    ErrParameterSearchFailed,
    #[error("payload requires {num_blocks} blocks, more than the wire format can carry")]
    ErrPayloadTooLarge { num_blocks: usize },
    #[error("encoder produced {got} fragments, expected {want}")]
    ErrEncoderFragmentCount { got: usize, want: usize },
    #[error("encoder produced a fragment of {got} bytes, expected {want}")]
    ErrEncoderFragmentLength { got: usize, want: usize },
    #[error("block of {got} bytes does not match block payload size {want}")]
    ErrBlockLengthMismatch { got: usize, want: usize },

    #[error("{0}")]
    Other(String),
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Other(error.to_string())
    }
}

impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        io::Error::new(io::ErrorKind::Other, error.to_string())
    }
}
