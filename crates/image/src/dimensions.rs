//! Output dimension arithmetic.
//!
//! Every helper here preserves aspect ratio and never upscales.

/// Fit an image inside a square bound on its longer side.
///
/// # Arguments
/// * `width` - Current width
/// * `height` - Current height
/// * `max_side` - Cap on the longer side (0 disables the cap)
///
/// # Returns
/// (new_width, new_height); unchanged when already within the cap
///
/// # Example
/// ```
/// use shrink_image::fit_within;
///
/// assert_eq!(fit_within(4000, 3000, 1920), (1920, 1440));
/// assert_eq!(fit_within(3000, 4000, 1920), (1440, 1920));
/// assert_eq!(fit_within(800, 600, 1920), (800, 600));
/// ```
pub fn fit_within(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    let longer = width.max(height);
    if max_side == 0 || longer <= max_side {
        return (width, height);
    }

    let ratio = f64::from(max_side) / f64::from(longer);
    scaled(width, height, ratio)
}

/// Scale both sides by `factor`, keeping each at least one pixel.
pub fn scale_by(width: u32, height: u32, factor: f64) -> (u32, u32) {
    if factor >= 1.0 {
        return (width, height);
    }
    scaled(width, height, factor)
}

fn scaled(width: u32, height: u32, ratio: f64) -> (u32, u32) {
    let w = (f64::from(width) * ratio).round() as u32;
    let h = (f64::from(height) * ratio).round() as u32;
    (w.max(1), h.max(1))
}
