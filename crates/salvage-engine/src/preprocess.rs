use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{ColorType, DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use salvage_contracts::analysis::ImageDescriptor;
use uuid::Uuid;

/// Longest side of a preprocessed image, in pixels.
pub const MAX_DIMENSION: u32 = 1024;
pub const JPEG_QUALITY: u8 = 85;

/// Outcome of [`prepare_image`]. `path` is always usable downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedImage {
    pub path: PathBuf,
    pub failure: Option<String>,
}

/// Normalizes `source` for the vision call, falling back to the untouched
/// original on any failure.
pub fn prepare_image(source: &Path, processed_dir: &Path) -> PreparedImage {
    match preprocess_image(source, processed_dir) {
        Ok(path) => PreparedImage {
            path,
            failure: None,
        },
        Err(err) => PreparedImage {
            path: source.to_path_buf(),
            failure: Some(format!("{err:#}")),
        },
    }
}

/// Orientation-corrects, flattens to RGB or luma, downsizes so neither side
/// exceeds [`MAX_DIMENSION`], and writes `processed_<uuid>.jpg` at quality 85.
pub fn preprocess_image(source: &Path, processed_dir: &Path) -> Result<PathBuf> {
    let reader = ImageReader::open(source)
        .with_context(|| format!("failed opening {}", source.display()))?
        .with_guessed_format()
        .with_context(|| format!("failed sniffing {}", source.display()))?;
    let mut decoder = reader
        .into_decoder()
        .with_context(|| format!("unsupported image {}", source.display()))?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut image = DynamicImage::from_decoder(decoder)
        .with_context(|| format!("failed decoding {}", source.display()))?;
    image.apply_orientation(orientation);

    let image = flatten_color(image);
    let (width, height) = target_dimensions(image.width(), image.height(), MAX_DIMENSION);
    let image = if (width, height) == (image.width(), image.height()) {
        image
    } else {
        image.resize_exact(width, height, FilterType::Lanczos3)
    };

    fs::create_dir_all(processed_dir)
        .with_context(|| format!("failed creating {}", processed_dir.display()))?;
    let target = processed_dir.join(format!("processed_{}.jpg", Uuid::new_v4().simple()));
    write_jpeg(&image, &target)?;
    Ok(target)
}

/// Encodes `image` to `target`. A partially written file is removed on error.
fn write_jpeg(image: &DynamicImage, target: &Path) -> Result<()> {
    let file = File::create(target)
        .with_context(|| format!("failed creating {}", target.display()))?;
    let encoded = encode_into(image, file)
        .with_context(|| format!("failed encoding {}", target.display()));
    if encoded.is_err() {
        let _ = fs::remove_file(target);
    }
    encoded
}

fn encode_into(image: &DynamicImage, file: File) -> Result<()> {
    let mut writer = BufWriter::new(file);
    image.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY))?;
    writer.flush()?;
    Ok(())
}

/// Dimensions and format of the file at `path`, read from its header.
pub fn describe_image(path: &Path) -> Option<ImageDescriptor> {
    read_descriptor(path).ok()
}

fn read_descriptor(path: &Path) -> Result<ImageDescriptor> {
    let file_size_bytes = fs::metadata(path)?.len();
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader
        .format()
        .map(format_name)
        .unwrap_or_else(|| "UNKNOWN".to_string());
    let decoder = reader.into_decoder()?;
    let (width, height) = decoder.dimensions();
    Ok(ImageDescriptor {
        width,
        height,
        color_mode: color_mode_name(decoder.color_type()).to_string(),
        format,
        file_size_bytes,
    })
}

/// Alpha is dropped, not composited. 16-bit grayscale narrows to 8-bit.
fn flatten_color(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => image,
        DynamicImage::ImageLuma16(_) => DynamicImage::ImageLuma8(image.to_luma8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Scales the longer side down to `max`, keeping aspect ratio. Never upscales.
fn target_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }
    let scale = f64::from(max) / f64::from(width.max(height));
    let scaled = |side: u32| ((f64::from(side) * scale).round() as u32).clamp(1, max);
    (scaled(width), scaled(height))
}

fn color_mode_name(color: ColorType) -> &'static str {
    match (color.has_color(), color.has_alpha()) {
        (false, false) => "L",
        (false, true) => "LA",
        (true, false) => "RGB",
        (true, true) => "RGBA",
    }
}

fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "JPEG".to_string(),
        ImageFormat::Png => "PNG".to_string(),
        ImageFormat::Gif => "GIF".to_string(),
        ImageFormat::WebP => "WEBP".to_string(),
        other => format!("{other:?}").to_uppercase(),
    }
}
