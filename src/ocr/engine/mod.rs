mod preprocess;
mod tesseract;
mod text;

use anyhow::{anyhow, Context, Result};
use image::{DynamicImage, GenericImageView};
use std::io::Write;
use tracing::info;

use super::{OcrOptions, OcrText};

pub use tesseract::list_tesseract_languages;

/// Checks the upload is a PNG/JPEG and decodes it.
pub fn decode_image(image_bytes: &[u8]) -> Result<DynamicImage> {
    super::detect_image_mime(image_bytes)?;
    let image =
        image::load_from_memory(image_bytes).with_context(|| "failed to decode image for OCR")?;
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(anyhow!("image has no pixels"));
    }
    Ok(image)
}

/// Runs tesseract over an uploaded PNG/JPEG and returns the recognized text.
pub fn extract_text(image_bytes: &[u8], options: &OcrOptions) -> Result<OcrText> {
    recognize(decode_image(image_bytes)?, options)
}

/// Runs tesseract over an already decoded image.
pub fn recognize(image: DynamicImage, options: &OcrOptions) -> Result<OcrText> {
    let (width, height) = image.dimensions();
    let languages = tesseract::normalize_ocr_languages(&options.command, &options.languages)?;

    let ocr_image = if options.preprocess {
        preprocess::preprocess_for_ocr(image, preprocess::ocr_scale(width))
    } else {
        image
    };

    let mut tmp = tempfile::Builder::new()
        .prefix("indic-translator-ocr-")
        .suffix(".png")
        .tempfile()
        .with_context(|| "failed to create temp file for OCR")?;
    ocr_image
        .write_to(&mut tmp, image::ImageFormat::Png)
        .with_context(|| "failed to write temp image for OCR")?;
    tmp.flush().ok();

    let raw = tesseract::run_tesseract_text(&options.command, tmp.path(), &languages, options.psm)?;
    let text = text::normalize_ocr_text(&raw);
    info!(
        "ocr: {}x{} image, {} chars extracted ({})",
        width,
        height,
        text.chars().count(),
        languages
    );

    Ok(OcrText {
        text,
        width,
        height,
    })
}
