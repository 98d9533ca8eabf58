use thiserror::Error;

/// Failures raised while establishing mounts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MountError {
    /// A mount set must contain at least one volume.
    #[error("cannot mount zero volumes")]
    NoVolumes,
}
