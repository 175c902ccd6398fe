//! Tile image encodings and conversion between them.

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use image::{DynamicImage, ImageFormat};
use thiserror::Error;

/// How tile bytes are encoded in a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileEncoding {
    #[default]
    Png,
    Jpeg,
    /// Whatever the upstream server returns, stored verbatim
    Server,
}

/// Errors converting tile bytes between encodings.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("Unknown tile format '{0}' (expected png, jpg or server)")]
    UnknownFormat(String),

    #[error("Failed to decode tile image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode tile image as {format}: {source}")]
    Encode {
        format: TileEncoding,
        #[source]
        source: image::ImageError,
    },
}

impl TileEncoding {
    /// Concrete image format, `None` for [`TileEncoding::Server`].
    pub fn image_format(&self) -> Option<ImageFormat> {
        match self {
            Self::Png => Some(ImageFormat::Png),
            Self::Jpeg => Some(ImageFormat::Jpeg),
            Self::Server => None,
        }
    }

    /// File extension used by folder stores.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Self::Png => Some("png"),
            Self::Jpeg => Some("jpg"),
            Self::Server => None,
        }
    }

    /// Detects the concrete encoding of image bytes.
    pub fn detect(bytes: &[u8]) -> Option<TileEncoding> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            _ => None,
        }
    }

    pub fn is_concrete(&self) -> bool {
        !matches!(self, Self::Server)
    }
}

impl fmt::Display for TileEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Png => write!(f, "png"),
            Self::Jpeg => write!(f, "jpg"),
            Self::Server => write!(f, "server"),
        }
    }
}

impl FromStr for TileEncoding {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "server" => Ok(Self::Server),
            other => Err(EncodingError::UnknownFormat(other.to_string())),
        }
    }
}

/// Encodes a decoded image.
pub fn encode(image: &DynamicImage, encoding: TileEncoding) -> Result<Vec<u8>, EncodingError> {
    let Some(format) = encoding.image_format() else {
        // Server stores take whatever they get; PNG is lossless
        return encode(image, TileEncoding::Png);
    };

    let mut buf = Vec::new();
    let result = match format {
        // JPEG has no alpha channel
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8())
            .write_to(&mut Cursor::new(&mut buf), format),
        _ => image.write_to(&mut Cursor::new(&mut buf), format),
    };
    result.map_err(|source| EncodingError::Encode { format: encoding, source })?;
    Ok(buf)
}

/// Converts tile bytes from one encoding to another.
///
/// Bytes are copied verbatim into [`TileEncoding::Server`] stores and when
/// they already are in the target format. Otherwise they are decoded and
/// re-encoded. Bytes from a server store are taken for what they actually
/// are, so a PNG served upstream still becomes a JPEG in a JPEG store.
pub fn convert(
    bytes: &[u8],
    from: TileEncoding,
    to: TileEncoding,
) -> Result<Vec<u8>, EncodingError> {
    if !to.is_concrete() || (from == to && from.is_concrete()) {
        return Ok(bytes.to_vec());
    }
    if TileEncoding::detect(bytes) == Some(to) {
        return Ok(bytes.to_vec());
    }
    let image = image::load_from_memory(bytes).map_err(EncodingError::Decode)?;
    encode(&image, to)
}

/// MIME type for serving tile bytes.
pub fn content_type(encoding: TileEncoding, bytes: &[u8]) -> &'static str {
    let concrete = match encoding {
        TileEncoding::Server => TileEncoding::detect(bytes),
        other => Some(other),
    };
    match concrete {
        Some(TileEncoding::Png) => "image/png",
        Some(TileEncoding::Jpeg) => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Small solid-color test tile.
    pub(crate) fn sample_image(seed: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([seed, 128, 255 - seed])))
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("png".parse::<TileEncoding>().unwrap(), TileEncoding::Png);
        assert_eq!("JPEG".parse::<TileEncoding>().unwrap(), TileEncoding::Jpeg);
        assert_eq!("jpg".parse::<TileEncoding>().unwrap(), TileEncoding::Jpeg);
        assert_eq!("server".parse::<TileEncoding>().unwrap(), TileEncoding::Server);
        assert!("gif".parse::<TileEncoding>().is_err());
        assert_eq!(TileEncoding::Jpeg.to_string(), "jpg");
    }

    #[test]
    fn test_convert_png_to_jpeg() {
        let png = encode(&sample_image(10), TileEncoding::Png).unwrap();
        assert_eq!(TileEncoding::detect(&png), Some(TileEncoding::Png));

        let jpeg = convert(&png, TileEncoding::Png, TileEncoding::Jpeg).unwrap();
        assert_eq!(TileEncoding::detect(&jpeg), Some(TileEncoding::Jpeg));
    }

    #[test]
    fn test_convert_same_encoding_is_verbatim() {
        let png = encode(&sample_image(20), TileEncoding::Png).unwrap();
        assert_eq!(convert(&png, TileEncoding::Png, TileEncoding::Png).unwrap(), png);
    }

    #[test]
    fn test_convert_into_server_is_verbatim() {
        let bytes = b"not an image".to_vec();
        assert_eq!(
            convert(&bytes, TileEncoding::Png, TileEncoding::Server).unwrap(),
            bytes
        );
    }

    #[test]
    fn test_convert_from_server_detects_format() {
        let png = encode(&sample_image(30), TileEncoding::Png).unwrap();
        let jpeg = convert(&png, TileEncoding::Server, TileEncoding::Jpeg).unwrap();
        assert_eq!(TileEncoding::detect(&jpeg), Some(TileEncoding::Jpeg));
        assert_eq!(convert(&png, TileEncoding::Server, TileEncoding::Png).unwrap(), png);

        let result = convert(b"<html>", TileEncoding::Server, TileEncoding::Jpeg);
        assert!(matches!(result, Err(EncodingError::Decode(_))));
    }

    #[test]
    fn test_convert_garbage_fails() {
        let result = convert(b"garbage", TileEncoding::Png, TileEncoding::Jpeg);
        assert!(matches!(result, Err(EncodingError::Decode(_))));
    }

    #[test]
    fn test_content_type() {
        let png = encode(&sample_image(1), TileEncoding::Png).unwrap();
        assert_eq!(content_type(TileEncoding::Server, &png), "image/png");
        assert_eq!(content_type(TileEncoding::Jpeg, &png), "image/jpeg");
        assert_eq!(
            content_type(TileEncoding::Server, b"??"),
            "application/octet-stream"
        );
    }
}
