use image::DynamicImage;

const MIN_OCR_WIDTH: u32 = 1200;
const MAX_OCR_WIDTH: u32 = 4000;
const MAX_SCALE: u32 = 3;

/// Flattens alpha onto white, converts to luma, upscales small images and stretches contrast.
pub(super) fn preprocess_for_ocr(image: DynamicImage, scale: u32) -> DynamicImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut luma = image::GrayImage::new(width, height);

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as f32 / 255.0;
        let r = (r as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        let g = (g as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        let b = (b as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        let value = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32).round() as u8;
        luma.put_pixel(x, y, image::Luma([value]));
    }

    let resized = if scale > 1 {
        image::imageops::resize(
            &luma,
            width.saturating_mul(scale),
            height.saturating_mul(scale),
            image::imageops::FilterType::Lanczos3,
        )
    } else {
        luma
    };

    DynamicImage::ImageLuma8(contrast_stretch(&resized))
}

/// Upscale factor for narrow images; wide scans are left alone.
pub(super) fn ocr_scale(width: u32) -> u32 {
    if width == 0 || width >= MIN_OCR_WIDTH {
        return 1;
    }
    let mut scale = MIN_OCR_WIDTH.div_ceil(width).min(MAX_SCALE);
    while scale > 1 && width.saturating_mul(scale) > MAX_OCR_WIDTH {
        scale -= 1;
    }
    scale.max(1)
}

fn contrast_stretch(image: &image::GrayImage) -> image::GrayImage {
    let mut min = 255u8;
    let mut max = 0u8;
    for pixel in image.pixels() {
        let value = pixel[0];
        min = min.min(value);
        max = max.max(value);
    }

    if max <= min {
        return image.clone();
    }

    let scale = 255.0 / (max as f32 - min as f32);
    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        let value = pixel[0];
        pixel[0] = ((value.saturating_sub(min)) as f32 * scale).round() as u8;
    }
    output
}
