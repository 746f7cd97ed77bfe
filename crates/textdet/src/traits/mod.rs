use crate::types::{BinaryMask, Contour, ProbabilityMap};

/// Trait for turning a probability map into a binary mask
pub trait Binarizer: Send + Sync {
    /// Produce a mask of 0 / 255 bytes with the same dimensions as `map`
    fn binarize(&self, map: &ProbabilityMap) -> BinaryMask;
}

/// Trait for contour extraction algorithms
pub trait ContourExtractor: Send + Sync {
    /// Extract the boundaries of every connected foreground region
    fn extract_contours(&self, mask: &BinaryMask) -> Vec<Contour>;
}
