//! # Image Loading
//!
//! Turns a logo reference (a file path or a `data:image/...;base64,` URI)
//! into pixel data the PDF writer can embed as-is.
//!
//! JPEG files are kept compressed and embedded with DCTDecode; only their
//! header is read. PNG files are decoded to RGB with a separate alpha plane
//! for the soft mask. Generated bitmaps (the QR code) are 8-bit greyscale.

use std::io::Cursor;
use std::path::PathBuf;

use image::codecs::jpeg::JpegDecoder;
use image::{ColorType, ImageDecoder, ImageFormat};
use thiserror::Error;

/// An image ready for PDF embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImagePixelData {
    /// Untouched JPEG stream.
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    /// 3 bytes per pixel, plus one alpha byte per pixel when any pixel is
    /// not fully opaque.
    Decoded {
        rgb: Vec<u8>,
        alpha: Option<Vec<u8>>,
    },
    /// One luminance byte per pixel.
    Gray { luma: Vec<u8> },
}

/// /ColorSpace of an embedded JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
}

impl LoadedImage {
    /// Width over height, for fitting into a cell.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height_px == 0 {
            1.0
        } else {
            self.width_px as f64 / self.height_px as f64
        }
    }
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed data URI: {0}")]
    DataUri(String),
    #[error("unsupported image format (expected PNG or JPEG)")]
    Unsupported,
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Where the image bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    File(PathBuf),
    /// Base64 payload of a `data:` URI.
    DataUri(String),
}

impl ImageSource {
    pub fn parse(src: &str) -> Self {
        match src.strip_prefix("data:") {
            Some(rest) => ImageSource::DataUri(rest.to_string()),
            None => ImageSource::File(PathBuf::from(src)),
        }
    }

    fn bytes(&self) -> Result<Vec<u8>, ImageError> {
        match self {
            ImageSource::File(path) => std::fs::read(path).map_err(|source| ImageError::Read {
                path: path.clone(),
                source,
            }),
            ImageSource::DataUri(rest) => {
                use base64::Engine;
                let (header, payload) = rest
                    .split_once(',')
                    .ok_or_else(|| ImageError::DataUri("missing ','".to_string()))?;
                if !header.starts_with("image/") || !header.ends_with(";base64") {
                    return Err(ImageError::DataUri(format!(
                        "expected image/...;base64, got '{}'",
                        header
                    )));
                }
                base64::engine::general_purpose::STANDARD
                    .decode(payload.trim())
                    .map_err(|e| ImageError::DataUri(e.to_string()))
            }
        }
    }
}

/// Load a logo from a path or data URI.
pub fn load_image(src: &str) -> Result<LoadedImage, ImageError> {
    decode_image_bytes(ImageSource::parse(src).bytes()?)
}

fn decode_image_bytes(data: Vec<u8>) -> Result<LoadedImage, ImageError> {
    match image::guess_format(&data) {
        Ok(ImageFormat::Jpeg) => jpeg_passthrough(data),
        Ok(ImageFormat::Png) => decode_png(&data),
        _ => Err(ImageError::Unsupported),
    }
}

fn jpeg_passthrough(data: Vec<u8>) -> Result<LoadedImage, ImageError> {
    let (width_px, height_px, color_space) = {
        let decoder = JpegDecoder::new(Cursor::new(data.as_slice()))?;
        let (w, h) = decoder.dimensions();
        let color_space = match decoder.color_type() {
            ColorType::L8 | ColorType::L16 => JpegColorSpace::DeviceGray,
            _ => JpegColorSpace::DeviceRGB,
        };
        (w, h, color_space)
    };
    Ok(LoadedImage {
        pixel_data: ImagePixelData::Jpeg { data, color_space },
        width_px,
        height_px,
    })
}

fn decode_png(data: &[u8]) -> Result<LoadedImage, ImageError> {
    let rgba = image::load_from_memory_with_format(data, ImageFormat::Png)?.into_rgba8();
    let (width_px, height_px) = rgba.dimensions();

    let (rgb, alpha): (Vec<[u8; 3]>, Vec<u8>) = rgba
        .pixels()
        .map(|p| ([p[0], p[1], p[2]], p[3]))
        .unzip();
    let opaque = alpha.iter().all(|&a| a == 255);

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Decoded {
            rgb: rgb.concat(),
            alpha: (!opaque).then_some(alpha),
        },
        width_px,
        height_px,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(pixel: [u8; 4]) -> Vec<u8> {
        let mut img = image::RgbaImage::new(1, 1);
        img.put_pixel(0, 0, image::Rgba(pixel));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_source_parsing() {
        assert_eq!(ImageSource::parse("assets/logo.png"), ImageSource::File("assets/logo.png".into()));
        assert_eq!(
            ImageSource::parse("data:image/png;base64,AAAA"),
            ImageSource::DataUri("image/png;base64,AAAA".into())
        );
    }

    #[test]
    fn test_rejects_unknown_bytes() {
        assert!(matches!(decode_image_bytes(vec![0, 1, 2, 3, 4]), Err(ImageError::Unsupported)));
    }

    #[test]
    fn test_malformed_data_uri() {
        assert!(matches!(load_image("data:image/png;base64"), Err(ImageError::DataUri(_))));
        assert!(matches!(load_image("data:text/plain;base64,AAAA"), Err(ImageError::DataUri(_))));
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = load_image("assets/definitely-not-here.png").unwrap_err();
        assert!(matches!(err, ImageError::Read { .. }));
        assert!(err.to_string().contains("definitely-not-here.png"));
    }

    #[test]
    fn test_opaque_png_has_no_alpha() {
        let loaded = decode_image_bytes(png([255, 0, 0, 255])).unwrap();
        assert_eq!((loaded.width_px, loaded.height_px), (1, 1));
        assert_eq!(
            loaded.pixel_data,
            ImagePixelData::Decoded {
                rgb: vec![255, 0, 0],
                alpha: None
            }
        );
    }

    #[test]
    fn test_translucent_png_keeps_alpha() {
        let loaded = decode_image_bytes(png([0, 0, 255, 128])).unwrap();
        match loaded.pixel_data {
            ImagePixelData::Decoded { alpha, .. } => assert_eq!(alpha, Some(vec![128])),
            other => panic!("expected decoded pixels, got {:?}", other),
        }
    }

    #[test]
    fn test_jpeg_is_not_reencoded() {
        let img = image::RgbImage::from_fn(2, 2, |_, _| image::Rgb([0, 128, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
            .unwrap();

        let loaded = decode_image_bytes(buf.clone()).unwrap();
        assert_eq!((loaded.width_px, loaded.height_px), (2, 2));
        assert_eq!(
            loaded.pixel_data,
            ImagePixelData::Jpeg {
                data: buf,
                color_space: JpegColorSpace::DeviceRGB
            }
        );
    }

    #[test]
    fn test_data_uri_png() {
        use base64::Engine;
        let b64 = base64::engine::general_purpose::STANDARD.encode(png([0, 255, 0, 255]));
        let loaded = load_image(&format!("data:image/png;base64,{}", b64)).unwrap();
        assert_eq!(loaded.width_px, 1);
    }
}
