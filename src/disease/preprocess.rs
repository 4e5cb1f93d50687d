//! Image preprocessing for the crop disease classifier
//!
//! The model expects a `(1, 224, 224, 3)` float tensor with values in
//! `[-1, 1]`.

use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;

/// Model input edge length
pub const INPUT_SIZE: u32 = 224;

/// Tensor shape fed to the model (batch, height, width, channels)
pub const INPUT_SHAPE: [usize; 4] = [1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3];

/// Convert an image of any size and color type into the model input tensor
///
/// The image is converted to RGB (dropping alpha), scaled to cover a
/// 224x224 square with Lanczos3 and center-cropped, then each channel is
/// mapped with `v / 127.5 - 1`.
pub fn preprocess(image: &DynamicImage) -> Array4<f32> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let fitted = rgb
        .resize_to_fill(INPUT_SIZE, INPUT_SIZE, FilterType::Lanczos3)
        .to_rgb8();

    let mut tensor = Array4::<f32>::zeros(INPUT_SHAPE);
    for (x, y, pixel) in fitted.enumerate_pixels() {
        for (c, value) in pixel.0.iter().enumerate() {
            tensor[[0, y as usize, x as usize, c]] = (*value as f32 / 127.5) - 1.0;
        }
    }

    tensor
}

/// Decode image bytes (jpg / jpeg / png) and preprocess them
pub fn preprocess_bytes(bytes: &[u8]) -> image::ImageResult<Array4<f32>> {
    let image = image::load_from_memory(bytes)?;
    Ok(preprocess(&image))
}
