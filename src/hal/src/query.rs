//! Query pool types.

/// The kind of values a query pool produces.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QueryType {
    /// Number of samples that passed depth/stencil testing.
    SamplesPassed,
    /// Whether any sample passed, where precise counts are not needed.
    AnySamplesPassed,
    /// A GPU timestamp in nanoseconds.
    Timestamp,
}
