use image::imageops::FilterType;
use ndarray::Array3;

/// Spatial size every classifier expects.
pub const INPUT_SIZE: (u32, u32) = (224, 224);

/// Image resampled to a fixed spatial size, RGB channels scaled to [0, 1].
/// Shape is (height, width, 3).
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub pixels: Array3<f32>,
}

/// Decodes arbitrary image bytes and normalizes them for inference:
/// convert to RGB, Lanczos resample to `target_size`, rescale to [0, 1].
pub fn normalize(
    bytes: &[u8],
    target_size: (u32, u32),
) -> Result<NormalizedImage, image::ImageError> {
    let decoded = image::load_from_memory(bytes)?;
    let rgb = decoded.to_rgb8();
    let resized = image::imageops::resize(&rgb, target_size.0, target_size.1, FilterType::Lanczos3);

    let (width, height) = (target_size.0 as usize, target_size.1 as usize);
    let mut pixels = Array3::<f32>::zeros((height, width, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for channel in 0..3 {
            pixels[[y as usize, x as usize, channel]] = pixel.0[channel] as f32 / 255.0;
        }
    }

    Ok(NormalizedImage { pixels })
}
