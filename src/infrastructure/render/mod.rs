//! Scannable code rendering
//!
//! Turns a reservation token into PNG bytes. Rendering is pure: the same
//! token always yields the same image.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};

use crate::support::errors::InfraError;

/// Renders a token into raw image bytes
pub trait CodeRenderer: Send + Sync {
    fn render(&self, token: &str) -> Result<Vec<u8>, InfraError>;

    /// MIME type of the rendered bytes
    fn content_type(&self) -> &'static str {
        "image/png"
    }
}

/// QR code (error correction level L), black on white, PNG encoded
#[derive(Debug, Clone)]
pub struct QrPngRenderer {
    /// Pixels per QR module
    pub module_size: u32,
    /// Surround the code with the standard 4-module quiet zone
    pub quiet_zone: bool,
}

impl QrPngRenderer {
    pub fn new(module_size: u32, quiet_zone: bool) -> Self {
        Self {
            module_size: module_size.max(1),
            quiet_zone,
        }
    }
}

impl Default for QrPngRenderer {
    fn default() -> Self {
        Self::new(10, true)
    }
}

impl CodeRenderer for QrPngRenderer {
    fn render(&self, token: &str) -> Result<Vec<u8>, InfraError> {
        let code = QrCode::with_error_correction_level(token.as_bytes(), EcLevel::L)
            .map_err(|e| InfraError::Render(e.to_string()))?;

        let img = code
            .render::<Luma<u8>>()
            .quiet_zone(self.quiet_zone)
            .module_dimensions(self.module_size, self.module_size)
            .build();

        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| InfraError::Render(e.to_string()))?;
        Ok(bytes)
    }
}
