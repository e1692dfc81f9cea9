use std::io::Cursor;

/// A small white PNG.
pub(crate) fn png_bytes() -> Vec<u8> {
    let image = image::RgbImage::from_pixel(8, 8, image::Rgb([255, 255, 255]));
    let mut bytes = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("encode png");
    bytes.into_inner()
}

/// Silent 16-bit PCM.
pub(crate) fn wav_bytes(sample_rate: u32, channels: u16, frames: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("writer");
        for _ in 0..frames * u32::from(channels) {
            writer.write_sample(0i16).expect("sample");
        }
        writer.finalize().expect("finalize");
    }
    cursor.into_inner()
}

/// Stand-in for tesseract: lists `eng` and prints `output` for every image.
#[cfg(unix)]
pub(crate) fn fake_tesseract(dir: &std::path::Path, output: &str) -> String {
    let output_path = dir.join("ocr-output.txt");
    std::fs::write(&output_path, output).expect("write ocr output");
    write_script(
        &dir.join("fake-tesseract"),
        &format!(
            "if [ \"$1\" = \"--list-langs\" ]; then\n  printf 'List of available languages in \"/fake/tessdata/\" (2):\\neng\\nosd\\n'\n  exit 0\nfi\ncat '{}'\n",
            output_path.display()
        ),
    )
}

/// Stand-in for espeak: records its arguments and copies `wav` to the `-w` target.
#[cfg(unix)]
pub(crate) fn fake_espeak(dir: &std::path::Path, wav: &[u8]) -> String {
    let fixture = dir.join("fixture.wav");
    std::fs::write(&fixture, wav).expect("write wav fixture");
    write_script(
        &dir.join("fake-espeak"),
        &format!(
            "printf '%s\\n' \"$@\" > '{args}'\nwhile [ \"$#\" -gt 0 ]; do\n  if [ \"$1\" = \"-w\" ]; then\n    cp '{wav}' \"$2\"\n    exit 0\n  fi\n  shift\ndone\n",
            args = dir.join("espeak-args.txt").display(),
            wav = fixture.display()
        ),
    )
}

#[cfg(unix)]
fn write_script(path: &std::path::Path, body: &str) -> String {
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    {
        let mut file = std::fs::File::create(path).expect("create script");
        file.write_all(format!("#!/bin/sh\n{}", body).as_bytes())
            .expect("write script");
        file.sync_all().expect("sync script");
    }
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    path.to_string_lossy().to_string()
}
