use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use caldera_core::CoreError;
use qrcode::{Color, EcLevel, QrCode};
use uuid::Uuid;

/// Check-in payload for a booking.
pub fn booking_payload(booking_id: Uuid) -> String {
    format!("booking:{booking_id}")
}

pub fn payment_payload(tx_ref: &str) -> String {
    format!("payment:{tx_ref}")
}

pub fn user_payload(user_id: Uuid) -> String {
    format!("user:{user_id}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCorrection {
    L,
    M,
    Q,
    H,
}

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => EcLevel::L,
            ErrorCorrection::M => EcLevel::M,
            ErrorCorrection::Q => EcLevel::Q,
            ErrorCorrection::H => EcLevel::H,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QrOptions {
    pub width: u32,
    /// Light border around the symbol, in modules.
    pub margin: u32,
    pub dark: String,
    pub light: String,
    pub error_correction: ErrorCorrection,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            width: 256,
            margin: 1,
            dark: "#000000".to_string(),
            light: "#FFFFFF".to_string(),
            error_correction: ErrorCorrection::M,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QrArtifact {
    pub data_url: String,
    pub size: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum QrError {
    #[error("Failed to generate QR code: {0}")]
    Encode(#[from] qrcode::types::QrError),
}

impl From<QrError> for CoreError {
    fn from(err: QrError) -> Self {
        CoreError::InternalError(err.to_string())
    }
}

/// Renders QR codes as SVG data URLs.
#[derive(Debug, Clone, Default)]
pub struct QrGenerator {
    options: QrOptions,
}

impl QrGenerator {
    pub fn new(options: QrOptions) -> Self {
        Self { options }
    }

    pub fn generate(&self, data: &str) -> Result<QrArtifact, QrError> {
        let opts = &self.options;
        let code = QrCode::with_error_correction_level(data.as_bytes(), opts.error_correction.into())?;

        let image = render_svg(&code, opts);

        Ok(QrArtifact {
            data_url: format!("data:image/svg+xml;base64,{}", STANDARD.encode(image)),
            size: opts.width,
        })
    }

    pub fn for_booking(&self, booking_id: Uuid) -> Result<QrArtifact, QrError> {
        self.generate(&booking_payload(booking_id))
    }
}

/// Draws the symbol on a `modules + 2 * margin` grid scaled to `opts.width`.
fn render_svg(code: &QrCode, opts: &QrOptions) -> String {
    let modules = code.width();
    let margin = opts.margin as usize;
    let grid = modules + 2 * margin;

    let mut path = String::new();
    for (i, color) in code.to_colors().into_iter().enumerate() {
        if color == Color::Dark {
            let (x, y) = (i % modules + margin, i / modules + margin);
            path.push_str(&format!("M{x} {y}h1v1h-1z"));
        }
    }

    format!(
        "<?xml version=\"1.0\" standalone=\"yes\"?>\
         <svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{w}\" height=\"{w}\" \
         viewBox=\"0 0 {grid} {grid}\" shape-rendering=\"crispEdges\">\
         <rect x=\"0\" y=\"0\" width=\"{grid}\" height=\"{grid}\" fill=\"{light}\"/>\
         <path fill=\"{dark}\" d=\"{path}\"/></svg>",
        w = opts.width,
        light = opts.light,
        dark = opts.dark,
    )
}
