use common::{NodeError, ValueError};
use thiserror::Error;

/// Failures raised while encoding or decoding a volume snapshot.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The underlying stream failed.
    #[error("stream error: {0}")]
    Io(#[source] std::io::Error),

    /// The stream ended before the declared content was fully read.
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// The stream does not start with the snapshot magic.
    #[error("bad magic {found:?}, expected {expected:?}", expected = crate::MAGIC)]
    BadMagic { found: [u8; 4] },

    /// The snapshot was written by a newer format revision.
    #[error(
        "format version {version} is newer than the supported version {supported}",
        supported = crate::FORMAT_VERSION
    )]
    UnsupportedVersion { version: u8 },

    /// A value carries a type marker outside the known table.
    #[error("unknown type marker {marker}")]
    UnknownMarker { marker: u8 },

    /// A node's stored checksum does not match its content.
    #[error("node checksum mismatch, data corrupted")]
    Corrupted,

    /// A declared length exceeds what a value payload may hold.
    #[error("declared length of {len} bytes exceeds the payload limit")]
    OversizedLength { len: u64 },

    /// A name or key in the stream is not valid UTF-8.
    #[error("stream contains a non-UTF-8 name or key")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// A child name in the stream is not a legal node name.
    #[error("stream contains an invalid node name")]
    InvalidName(#[from] NodeError),

    /// A payload in the stream violates the value size invariant.
    #[error(transparent)]
    Value(#[from] ValueError),
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            CodecError::UnexpectedEof
        } else {
            CodecError::Io(err)
        }
    }
}
