use base64::prelude::*;
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use crate::error::EncodingError;

const DATA_URL_SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";
const MIN_DIMENSION: u32 = 256;

/// Formats a stored QR image can be downloaded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    Jpg,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::Jpg => "jpg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg | ExportFormat::Jpg => "image/jpeg",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            ExportFormat::Png => ImageFormat::Png,
            ExportFormat::Jpeg | ExportFormat::Jpg => ImageFormat::Jpeg,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpeg" => Ok(ExportFormat::Jpeg),
            "jpg" => Ok(ExportFormat::Jpg),
            other => Err(format!(
                "unsupported image format '{other}' (expected png, jpeg or jpg)"
            )),
        }
    }
}

/// An encoded QR image. Created once per record and never regenerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrImage {
    bytes: Vec<u8>,
}

/// Render `url` as a PNG QR code.
///
/// Fails without producing any artifact when the URL exceeds QR capacity.
pub fn encode_qr_image(url: &str) -> Result<QrImage, EncodingError> {
    let code = QrCode::new(url.as_bytes())?;
    let pixels = code
        .render::<Luma<u8>>()
        .min_dimensions(MIN_DIMENSION, MIN_DIMENSION)
        .quiet_zone(true)
        .build();

    let bytes = write_image(&DynamicImage::ImageLuma8(pixels), ImageFormat::Png)?;
    Ok(QrImage { bytes })
}

impl QrImage {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Self-contained `data:image/png;base64,...` form kept on the record.
    pub fn to_data_url(&self) -> String {
        format!(
            "{DATA_URL_SCHEME}image/png{BASE64_MARKER}{}",
            BASE64_STANDARD.encode(&self.bytes)
        )
    }

    pub fn from_data_url(data_url: &str) -> Result<Self, EncodingError> {
        let rest = data_url
            .strip_prefix(DATA_URL_SCHEME)
            .ok_or_else(|| EncodingError::DataUrl("missing 'data:' scheme".to_string()))?;
        let (media_type, payload) = rest
            .split_once(BASE64_MARKER)
            .ok_or_else(|| EncodingError::DataUrl("payload is not base64 encoded".to_string()))?;
        if !media_type.starts_with("image/") {
            return Err(EncodingError::DataUrl(format!(
                "unexpected media type '{media_type}'"
            )));
        }

        let bytes = BASE64_STANDARD
            .decode(payload.trim())
            .map_err(|e| EncodingError::DataUrl(e.to_string()))?;
        Ok(Self { bytes })
    }

    /// Re-encode the image for download.
    pub fn export(&self, format: ExportFormat) -> Result<Vec<u8>, EncodingError> {
        let decoded = image::load_from_memory(&self.bytes)?;
        // JPEG has no alpha channel; QR codes are monochrome anyway.
        let decoded = match format {
            ExportFormat::Png => decoded,
            ExportFormat::Jpeg | ExportFormat::Jpg => DynamicImage::ImageLuma8(decoded.to_luma8()),
        };
        write_image(&decoded, format.image_format())
    }

    /// `{name}-qr-code.{ext}`, safe to use as a single path component.
    pub fn download_file_name(record_name: &str, format: ExportFormat) -> String {
        let name: String = record_name
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();
        format!("{}-qr-code.{}", name, format.extension())
    }
}

fn write_image(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, EncodingError> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format)?;
    Ok(buffer.into_inner())
}
