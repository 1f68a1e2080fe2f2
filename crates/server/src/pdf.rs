//! Packing slip rendering.
//!
//! A pure function from structured shipment data to PDF bytes. The document
//! is deliberately plain: one font family, uncompressed content streams, no
//! images. No crate in our stack covers PDF output, so the small object
//! graph (catalog, page tree, two font resources, one content stream per
//! page) is emitted directly.

use qbridge_core::OrderId;

const PAGE_WIDTH: f32 = 612.0; // US Letter, points
const PAGE_HEIGHT: f32 = 792.0;
const BOTTOM_MARGIN: f32 = 80.0;
const MAX_LINE_CHARS: usize = 110;

/// Shipping destination block for the slip.
#[derive(Debug, Clone, Default)]
pub struct ShipTo {
    pub name: String,
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: String,
}

/// One item line on the slip.
#[derive(Debug, Clone)]
pub struct SlipItem {
    pub qty: i64,
    pub sku_code: String,
    pub title: String,
}

/// Text placement on a page, in PDF points from the bottom-left origin.
struct TextOp {
    x: f32,
    y: f32,
    bold: bool,
    size: u32,
    text: String,
}

/// Build a packing slip PDF for an order.
#[must_use]
pub fn build_packing_slip(order_id: OrderId, ship_to: &ShipTo, items: &[SlipItem]) -> Vec<u8> {
    let mut pages: Vec<Vec<TextOp>> = vec![Vec::new()];
    let mut y = PAGE_HEIGHT - 50.0;

    let mut put = |pages: &mut Vec<Vec<TextOp>>, x: f32, y: f32, bold: bool, size: u32, text: &str| {
        if let Some(page) = pages.last_mut() {
            page.push(TextOp {
                x,
                y,
                bold,
                size,
                text: text.to_string(),
            });
        }
    };

    put(&mut pages, 50.0, y, true, 16, &format!("Packing Slip - Order #{order_id}"));
    y -= 30.0;

    put(&mut pages, 50.0, y, false, 10, "Ship To:");
    y -= 14.0;
    let address_lines = [
        ship_to.name.clone(),
        ship_to.line1.clone(),
        ship_to.line2.clone(),
        format!(
            "{}, {} {}",
            ship_to.city, ship_to.province, ship_to.postal_code
        ),
        ship_to.country.clone(),
    ];
    for line in address_lines {
        if !line.trim().is_empty() {
            put(&mut pages, 70.0, y, false, 10, &line);
            y -= 12.0;
        }
    }

    y -= 10.0;
    put(&mut pages, 50.0, y, true, 10, "Items");
    y -= 16.0;

    for item in items {
        let mut line = format!("{} x {}  {}", item.qty, item.sku_code, item.title);
        if line.len() > MAX_LINE_CHARS {
            line = line.chars().take(MAX_LINE_CHARS).collect();
        }
        put(&mut pages, 50.0, y, false, 10, &line);
        y -= 12.0;
        if y < BOTTOM_MARGIN {
            pages.push(Vec::new());
            y = PAGE_HEIGHT - 60.0;
        }
    }

    serialize(&pages)
}

/// Escape a string for a PDF literal string.
fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Serialize pages into the PDF object graph.
///
/// Object layout: 1 catalog, 2 page tree, 3 regular font, 4 bold font, then
/// alternating content-stream and page objects per page.
fn serialize(pages: &[Vec<TextOp>]) -> Vec<u8> {
    let page_count = pages.len();
    let first_page_obj = 5;

    let mut objects: Vec<String> = Vec::new();

    let kids: Vec<String> = (0..page_count)
        .map(|i| format!("{} 0 R", first_page_obj + i * 2 + 1))
        .collect();
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        page_count
    ));
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold >>".to_string());

    for (i, ops) in pages.iter().enumerate() {
        let mut stream = String::new();
        for op in ops {
            let font = if op.bold { "/F2" } else { "/F1" };
            stream.push_str(&format!(
                "BT {font} {} Tf {} {} Td ({}) Tj ET\n",
                op.size,
                op.x,
                op.y,
                escape(&op.text)
            ));
        }
        objects.push(format!(
            "<< /Length {} >>\nstream\n{stream}endstream",
            stream.len()
        ));
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
            first_page_obj + i * 2
        ));
    }

    let mut buf: Vec<u8> = Vec::new();
    buf.extend_from_slice(b"%PDF-1.4\n");

    let mut offsets: Vec<usize> = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(buf.len());
        buf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", index + 1).as_bytes());
    }

    let xref_offset = buf.len();
    buf.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    buf.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        buf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    buf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ship_to() -> ShipTo {
        ShipTo {
            name: String::new(),
            line1: "100 Queen St W".to_string(),
            line2: String::new(),
            city: "Toronto".to_string(),
            province: "ON".to_string(),
            postal_code: "M5H 2N2".to_string(),
            country: "Canada".to_string(),
        }
    }

    fn item(qty: i64) -> SlipItem {
        SlipItem {
            qty,
            sku_code: "RED-M".to_string(),
            title: "Red Shirt (M)".to_string(),
        }
    }

    #[test]
    fn test_pdf_envelope() {
        let bytes = build_packing_slip(OrderId::new(7), &sample_ship_to(), &[item(2)]);
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));
    }

    #[test]
    fn test_slip_contains_order_and_items() {
        let bytes = build_packing_slip(OrderId::new(7), &sample_ship_to(), &[item(2)]);
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("Packing Slip - Order #7"));
        assert!(text.contains("2 x RED-M  Red Shirt \\(M\\)"));
        assert!(text.contains("Toronto, ON M5H 2N2"));
    }

    #[test]
    fn test_blank_address_lines_skipped() {
        let bytes = build_packing_slip(OrderId::new(1), &sample_ship_to(), &[]);
        let text = String::from_utf8_lossy(&bytes);
        // name and line2 are empty and must not appear as stray text ops
        assert!(!text.contains("() Tj"));
    }

    #[test]
    fn test_long_item_list_paginates() {
        let items: Vec<SlipItem> = (0..120).map(|_| item(1)).collect();
        let bytes = build_packing_slip(OrderId::new(9), &sample_ship_to(), &items);
        let text = String::from_utf8_lossy(&bytes);
        let page_objects = text.matches("/Type /Page ").count();
        assert!(page_objects >= 2, "expected multiple pages, got {page_objects}");
    }

    #[test]
    fn test_item_lines_truncated() {
        let long_title = "x".repeat(300);
        let items = [SlipItem {
            qty: 1,
            sku_code: "SKU".to_string(),
            title: long_title,
        }];
        let bytes = build_packing_slip(OrderId::new(3), &sample_ship_to(), &items);
        let text = String::from_utf8_lossy(&bytes);
        assert!(!text.contains(&"x".repeat(200)));
    }
}
