// Single-page PDF assembly for certificate artifacts
//
// The artifact is a hand-assembled PDF 1.4 document: one A4 page, built-in
// Helvetica fonts, uncompressed content stream, QR modules drawn as filled
// rectangles. Keeping the writer in-tree makes the output byte-for-byte
// deterministic for a given document, which the integrity story depends on.

use crate::qr::QrMatrix;
use crate::{CertificateDocument, RenderError};

/// A4 page width in PDF points.
const PAGE_WIDTH: f32 = 595.0;
/// A4 page height in PDF points.
const PAGE_HEIGHT: f32 = 842.0;
/// Side length of the rendered QR symbol, quiet zone excluded.
const QR_SIZE: f32 = 120.0;
/// Left edge of the QR symbol.
const QR_X: f32 = 60.0;
/// Bottom edge of the QR symbol.
const QR_Y: f32 = 72.0;

#[derive(Clone, Copy)]
enum Font {
    Bold,
    Regular,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Bold => "/F1",
            Font::Regular => "/F2",
        }
    }

    // Approximate Helvetica advance per character; centering tolerates a few
    // points of error.
    fn advance_factor(self) -> f32 {
        match self {
            Font::Bold => 0.56,
            Font::Regular => 0.52,
        }
    }
}

/// Renders a certificate document to PDF bytes.
///
/// All fields except `expires_at` must be non-blank; a blank field fails with
/// [`RenderError::MissingField`] naming the offender. The embedded QR symbol
/// encodes `verify_url` at error correction level M.
///
/// Text is emitted in WinAnsi encoding, so Latin-1 text renders verbatim and
/// anything outside it is substituted with `?`.
pub fn render_certificate(doc: &CertificateDocument) -> Result<Vec<u8>, RenderError> {
    doc.require_complete()?;

    let qr = QrMatrix::encode(&doc.verify_url)?;
    let content = page_content(doc, &qr);
    let content_bytes = latin1_bytes(&content);

    let objects: Vec<Vec<u8>> = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec(),
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 4 0 R /F2 5 0 R >> >> /Contents 6 0 R >>"
        )
        .into_bytes(),
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_vec(),
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_vec(),
        stream_object(&content_bytes),
    ];

    Ok(assemble(&objects))
}

/// Builds the page content stream: frame, headline, claim block, dates, and
/// the QR footer.
fn page_content(doc: &CertificateDocument, qr: &QrMatrix) -> String {
    let mut ops = String::with_capacity(4096);

    // Double frame
    ops.push_str("1.5 w\n30 30 535 782 re S\n");
    ops.push_str("0.5 w\n36 36 523 770 re S\n");

    // Headline
    centered_text(&mut ops, Font::Bold, 22.0, 760.0, &doc.issuer_name);
    centered_text(
        &mut ops,
        Font::Regular,
        13.0,
        728.0,
        "Certificate of Achievement",
    );
    ops.push_str("0.8 w\n80 712 m\n515 712 l\nS\n");

    // Claim block
    muted(&mut ops, true);
    centered_text(&mut ops, Font::Regular, 11.0, 668.0, "This certifies that");
    muted(&mut ops, false);
    centered_text(&mut ops, Font::Bold, 26.0, 632.0, &doc.full_name);
    muted(&mut ops, true);
    centered_text(
        &mut ops,
        Font::Regular,
        11.0,
        598.0,
        "has successfully completed",
    );
    muted(&mut ops, false);
    centered_text(&mut ops, Font::Bold, 17.0, 568.0, &doc.program);
    muted(&mut ops, true);
    centered_text(&mut ops, Font::Regular, 11.0, 540.0, "in the field of");
    muted(&mut ops, false);
    centered_text(&mut ops, Font::Regular, 15.0, 514.0, &doc.field_of_study);

    // Dates
    centered_text(
        &mut ops,
        Font::Regular,
        12.0,
        470.0,
        &format!("Issued on {}", doc.issued_at),
    );
    if let Some(expires_at) = &doc.expires_at {
        centered_text(
            &mut ops,
            Font::Regular,
            12.0,
            448.0,
            &format!("Valid until {expires_at}"),
        );
    }

    // QR footer
    qr_modules(&mut ops, qr);
    text_at(
        &mut ops,
        Font::Bold,
        10.0,
        200.0,
        152.0,
        "Scan to verify this certificate",
    );
    text_at(&mut ops, Font::Regular, 8.0, 200.0, 136.0, &doc.verify_url);
    muted(&mut ops, true);
    text_at(
        &mut ops,
        Font::Regular,
        8.0,
        200.0,
        120.0,
        &format!("Certificate ID: {}", doc.certificate_id),
    );
    muted(&mut ops, false);

    ops
}

/// Emits the QR symbol as one filled path of dark-module rectangles.
fn qr_modules(ops: &mut String, qr: &QrMatrix) {
    let module = QR_SIZE / qr.width() as f32;
    for y in 0..qr.width() {
        for x in 0..qr.width() {
            if qr.is_dark(x, y) {
                let px = QR_X + x as f32 * module;
                // Row 0 of the matrix is the top of the symbol
                let py = QR_Y + QR_SIZE - (y + 1) as f32 * module;
                ops.push_str(&format!("{px:.2} {py:.2} {module:.2} {module:.2} re\n"));
            }
        }
    }
    ops.push_str("f\n");
}

fn text_at(ops: &mut String, font: Font, size: f32, x: f32, y: f32, text: &str) {
    ops.push_str(&format!(
        "BT\n{} {size} Tf\n{x:.2} {y:.2} Td\n({}) Tj\nET\n",
        font.resource(),
        escape_text(text)
    ));
}

fn centered_text(ops: &mut String, font: Font, size: f32, y: f32, text: &str) {
    let width = text.chars().count() as f32 * size * font.advance_factor();
    let x = ((PAGE_WIDTH - width) / 2.0).max(40.0);
    text_at(ops, font, size, x, y, text);
}

/// Switches the fill gray used for label text on and off.
fn muted(ops: &mut String, on: bool) {
    ops.push_str(if on { "0.45 g\n" } else { "0 g\n" });
}

/// Escapes a string for a PDF literal string. Parentheses and backslashes
/// get backslash escapes; line breaks collapse to spaces; other control
/// characters are dropped.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\\' => out.push_str("\\\\"),
            '\r' | '\n' => out.push(' '),
            c if (c as u32) < 0x20 => {}
            c => out.push(c),
        }
    }
    out
}

/// Narrows a content stream to single-byte WinAnsi-compatible output.
/// Characters beyond Latin-1 have no slot in the built-in fonts and become
/// `?`.
fn latin1_bytes(content: &str) -> Vec<u8> {
    content
        .chars()
        .map(|c| {
            let code = c as u32;
            if code <= 0xFF {
                code as u8
            } else {
                b'?'
            }
        })
        .collect()
}

fn stream_object(content: &[u8]) -> Vec<u8> {
    let mut obj = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
    obj.extend_from_slice(content);
    obj.extend_from_slice(b"\nendstream");
    obj
}

/// Concatenates numbered objects into a complete PDF file with a correct
/// cross-reference table. Object `i` in the slice becomes object `i + 1` in
/// the document; object 1 must be the catalog.
fn assemble(objects: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8192);
    out.extend_from_slice(b"%PDF-1.4\n");
    // Binary marker comment per the PDF spec
    out.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_position = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_position}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> CertificateDocument {
        CertificateDocument {
            certificate_id: "7a4a7908-31bc-4f4a-8dc1-3e0a0f6f55d1".to_string(),
            full_name: "Jane Doe".to_string(),
            program: "Bachelor of Science".to_string(),
            field_of_study: "Computer Science".to_string(),
            issued_at: "2025-06-01".to_string(),
            expires_at: None,
            issuer_name: "Aurora Technical University".to_string(),
            verify_url: "https://attesta.example/verify?certificateId=7a4a7908-31bc-4f4a-8dc1-3e0a0f6f55d1"
                .to_string(),
        }
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn test_renders_valid_pdf_shell() {
        let bytes = render_certificate(&sample_document()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4\n"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert!(contains(&bytes, b"/Type /Catalog"));
        assert!(contains(&bytes, b"/MediaBox [0 0 595 842]"));
    }

    #[test]
    fn test_xref_offset_points_at_xref_table() {
        let bytes = render_certificate(&sample_document()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        let start = text.rfind("startxref\n").expect("startxref present");
        let offset: usize = text[start + "startxref\n".len()..]
            .lines()
            .next()
            .expect("offset line")
            .trim()
            .parse()
            .expect("numeric offset");
        assert_eq!(&bytes[offset..offset + 4], b"xref");
    }

    #[test]
    fn test_page_carries_claim_text() {
        let bytes = render_certificate(&sample_document()).unwrap();
        assert!(contains(&bytes, b"(Jane Doe) Tj"));
        assert!(contains(&bytes, b"(Bachelor of Science) Tj"));
        assert!(contains(&bytes, b"(Computer Science) Tj"));
        assert!(contains(&bytes, b"(Aurora Technical University) Tj"));
        assert!(contains(&bytes, b"(Issued on 2025-06-01) Tj"));
    }

    #[test]
    fn test_expiry_line_is_optional() {
        let without = render_certificate(&sample_document()).unwrap();
        assert!(!contains(&without, b"Valid until"));

        let mut doc = sample_document();
        doc.expires_at = Some("2030-06-01".to_string());
        let with = render_certificate(&doc).unwrap();
        assert!(contains(&with, b"(Valid until 2030-06-01) Tj"));
    }

    #[test]
    fn test_parentheses_in_names_are_escaped() {
        let mut doc = sample_document();
        doc.full_name = "Jane (Janie) Doe".to_string();
        let bytes = render_certificate(&doc).unwrap();
        assert!(contains(&bytes, b"(Jane \\(Janie\\) Doe) Tj"));
    }

    #[test]
    fn test_latin1_names_survive_encoding() {
        let mut doc = sample_document();
        doc.full_name = "Jos\u{e9} Garc\u{ed}a".to_string();
        let bytes = render_certificate(&doc).unwrap();
        assert!(contains(&bytes, &[b'(', b'J', b'o', b's', 0xE9]));
    }

    #[test]
    fn test_blank_field_is_rejected() {
        let mut doc = sample_document();
        doc.full_name = "   ".to_string();
        let err = render_certificate(&doc).unwrap_err();
        assert!(matches!(err, RenderError::MissingField("full_name")));
    }

    #[test]
    fn test_qr_rectangles_are_emitted() {
        let bytes = render_certificate(&sample_document()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        let rect_count = text.matches(" re\n").count();
        // Two frame rectangles plus several hundred QR modules
        assert!(rect_count > 200, "only {rect_count} rectangles emitted");
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let a = render_certificate(&sample_document()).unwrap();
        let b = render_certificate(&sample_document()).unwrap();
        assert_eq!(a, b);
    }
}
