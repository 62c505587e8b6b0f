/// Step sizes for the compression loops
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionSettings {
    /// JPEG quality of the first attempt
    pub initial_quality: u8,
    /// Quality floor
    pub min_quality: u8,
    /// Amount quality drops per attempt
    pub quality_step: u8,
    /// Quality restored after each dimension reduction
    pub rescale_quality: u8,
    /// Factor applied to both dimensions per reduction
    pub scale_step: f64,
    /// Reduction stops once either side is at or below this
    pub min_dimension: u32,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            initial_quality: 90,
            min_quality: 10,
            quality_step: 10,
            rescale_quality: 80,
            scale_step: 0.8,
            min_dimension: 100,
        }
    }
}

impl CompressionSettings {
    /// Next quality down, clamped to the floor
    pub(crate) fn lower(&self, quality: u8) -> u8 {
        quality.saturating_sub(self.quality_step).max(self.min_quality)
    }

    /// Whether both sides are still above the dimension floor
    pub(crate) const fn can_shrink(&self, width: u32, height: u32) -> bool {
        width > self.min_dimension && height > self.min_dimension
    }

    /// Scale one side by `scale_step`, rounding down but never to zero
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub(crate) fn shrink(&self, side: u32) -> u32 {
        ((f64::from(side) * self.scale_step).floor() as u32).max(1)
    }
}
