use toych_core::ToychError;

/// Indexed collection of samples.
///
/// `Item` is one sample, usually an `(input, target)` pair of tensors.
pub trait Dataset {
    type Item: Send + 'static;

    /// Returns the sample at `index`.
    ///
    /// # Errors
    /// `IndexOutOfBounds` if `index >= len()`, or whatever building the sample raises.
    fn get(&self, index: usize) -> Result<Self::Item, ToychError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
