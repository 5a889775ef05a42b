// QR module matrix generation for verification codes

use qrcode::{Color, EcLevel, QrCode};

use crate::RenderError;

/// A rendered QR symbol as a square matrix of dark/light modules.
///
/// The matrix excludes the quiet zone; placement code is responsible for
/// leaving blank space around the symbol.
#[derive(Debug, Clone)]
pub struct QrMatrix {
    width: usize,
    modules: Vec<bool>,
}

impl QrMatrix {
    /// Encodes `data` as a QR symbol at error correction level M.
    ///
    /// Level M survives roughly 15% module damage, which is the usual choice
    /// for printed codes that get photographed rather than scanned flat.
    pub fn encode(data: &str) -> Result<Self, RenderError> {
        let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)
            .map_err(|e| RenderError::Qr(e.to_string()))?;
        let width = code.width();
        let modules = code
            .to_colors()
            .into_iter()
            .map(|c| c == Color::Dark)
            .collect();
        Ok(Self { width, modules })
    }

    /// Width (and height) of the symbol in modules.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the module at column `x`, row `y` is dark. Row 0 is the top.
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.modules[y * self.width + x]
    }
}
