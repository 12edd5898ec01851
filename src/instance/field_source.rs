//! Replacement for the source's `d='d'` sentinel-string overloading (spec.md §9):
//! each instance field is either [`FieldSource::Supplied`] with a caller-provided
//! value, or [`FieldSource::Synthesize`], asking [`crate::instance::Instance`] to
//! generate a default value per the distributions in spec.md §6.

/// A value an [`crate::instance::Instance`] field may take: either provided by
/// the caller, or synthesized from the default random generators.
#[derive(Debug, Clone)]
pub enum FieldSource<T> {
    Supplied(T),
    Synthesize,
}

impl<T> FieldSource<T> {
    /// Resolves to the supplied value, or lazily synthesizes one.
    pub fn resolve_with(self, synth: impl FnOnce() -> T) -> T {
        match self {
            FieldSource::Supplied(v) => v,
            FieldSource::Synthesize => synth(),
        }
    }
}

impl<T> Default for FieldSource<T> {
    fn default() -> Self {
        FieldSource::Synthesize
    }
}
