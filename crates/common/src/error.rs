use thiserror::Error;

use crate::MAX_PAYLOAD_BYTES;

/// Failures raised while constructing a [`Value`](crate::Value).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// String or blob payload exceeds the single-I/O size limit.
    #[error("payload of {size} bytes exceeds the {limit} byte limit", limit = MAX_PAYLOAD_BYTES)]
    TooLarge { size: usize },
}

/// Failures raised by the tree-shape operations shared by both node families.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// Node names must be non-empty; only roots carry the reserved name "/".
    #[error("node name must not be empty")]
    EmptyName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_large_names_the_offending_size() {
        let err = ValueError::TooLarge { size: 4096 };
        assert!(err.to_string().contains("4096 bytes"));
    }
}
