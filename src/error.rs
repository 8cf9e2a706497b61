use thiserror::Error;

/// Misuse errors surfaced to the caller. These signal programming errors, not
/// recoverable runtime conditions; the engine never attempts partial recovery.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClusterError {
    /// The engine was constructed without any appearance provider, so an
    /// aggregate with more than one member could never be materialized.
    #[error("neither a cluster options provider nor an icon data provider is configured")]
    NoAppearanceProvider,

    /// An un-clustering zoom query was made for a marker the engine is not
    /// currently tracking as a visible standalone marker.
    #[error("marker is not tracked as a visible standalone marker")]
    MarkerNotTracked,
}
