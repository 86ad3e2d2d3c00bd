//! Output seam.

use crate::types::{Dimensions, OutputRecord, PipelineError};

/// Consumes the ordered records of one pipeline run.
///
/// Implementations render records to some output format. The core never
/// performs I/O itself; emitters decide whether `Output` is a string,
/// bytes, or a side effect.
pub trait Emitter<C> {
    /// What a successful emit produces.
    type Output;
    /// Emitter-specific failure.
    type Error;

    /// Render `records` (ordered largest first) for a grid of
    /// `dimensions`.
    ///
    /// # Errors
    ///
    /// Implementation-defined.
    fn emit(
        &mut self,
        records: &[OutputRecord<C>],
        dimensions: Dimensions,
    ) -> Result<Self::Output, Self::Error>;
}

/// Collects records into a `Vec`, cloning them.
#[derive(Debug)]
pub struct CollectEmitter<C> {
    /// Everything emitted so far, in emit order.
    pub records: Vec<OutputRecord<C>>,
}

impl<C> Default for CollectEmitter<C> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<C: Clone> Emitter<C> for CollectEmitter<C> {
    type Output = usize;
    type Error = PipelineError;

    fn emit(
        &mut self,
        records: &[OutputRecord<C>],
        _dimensions: Dimensions,
    ) -> Result<usize, Self::Error> {
        self.records.extend_from_slice(records);
        Ok(records.len())
    }
}
