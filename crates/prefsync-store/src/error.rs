//! Store errors

/// Local store failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No preference set has been loaded yet
    #[error("preferences have not been loaded")]
    NotLoaded,
}
