//! Shopping list PDF export.
//!
//! Renders an A4 document with the builtin Helvetica faces: a title, a
//! column header, one row per item and a right-aligned grand total. Long
//! titles wrap within their column and rows flow onto new pages, repeating
//! the header.

use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};
use thiserror::Error;

use price_comparer_core::ListItem;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const BOTTOM_MARGIN: f32 = 20.0;
const LINE_HEIGHT: f32 = 5.5;
const ROW_GAP: f32 = 2.0;

const TITLE_SIZE: f32 = 18.0;
const BODY_SIZE: f32 = 10.0;

/// Column x offsets (mm): description, store, qty, price, total.
const COLUMNS: [f32; 5] = [MARGIN, 110.0, 148.0, 162.0, 182.0];
const HEADERS: [&str; 5] = ["Item Description", "Store", "Qty", "Price", "Total"];

/// Characters per description line at the body size.
const DESCRIPTION_WRAP: usize = 48;
/// Characters of the store name kept before truncation.
const STORE_WIDTH: usize = 20;

/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;
const PT_TO_MM: f32 = 0.3528;

/// Errors producing a PDF.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The PDF library failed.
    #[error("PDF render failed: {0}")]
    Render(String),
}

impl From<printpdf::Error> for ExportError {
    fn from(err: printpdf::Error) -> Self {
        Self::Render(err.to_string())
    }
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Writes rows top to bottom, adding pages as needed.
struct Cursor<'a> {
    doc: &'a PdfDocumentReference,
    fonts: &'a Fonts,
    layer: PdfLayerReference,
    y: f32,
    pages: usize,
}

impl Cursor<'_> {
    fn text(&self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { &self.fonts.bold } else { &self.fonts.regular };
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    /// Start a new page when `height` more millimetres won't fit.
    fn reserve(&mut self, height: f32) {
        if self.y - height >= BOTTOM_MARGIN {
            return;
        }
        self.pages += 1;
        let (page, layer) = self.doc.add_page(
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            format!("Layer {}", self.pages),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
        self.header();
    }

    fn header(&mut self) {
        for (x, title) in COLUMNS.iter().zip(HEADERS) {
            self.text(title, BODY_SIZE, *x, true);
        }
        self.y -= LINE_HEIGHT + ROW_GAP;
    }

    fn row(&mut self, item: &ListItem) {
        let description = wrap(&item.title, DESCRIPTION_WRAP);
        #[allow(clippy::cast_precision_loss)]
        let height = description.len() as f32 * LINE_HEIGHT;
        self.reserve(height);

        let cells = [
            truncate(item.store_label(), STORE_WIDTH),
            item.qty.to_string(),
            item.price.to_string(),
            item.line_total().to_string(),
        ];
        for (x, cell) in COLUMNS[1..].iter().zip(&cells) {
            self.text(cell, BODY_SIZE, *x, false);
        }
        for line in &description {
            self.text(line, BODY_SIZE, COLUMNS[0], false);
            self.y -= LINE_HEIGHT;
        }
        self.y -= ROW_GAP;
    }
}

/// Render `items` as a PDF.
///
/// An empty list still produces a valid document with the title, header and
/// a zero grand total.
///
/// # Errors
///
/// Returns `ExportError::Render` if the PDF library fails.
pub fn render_shopping_list(items: &[ListItem]) -> Result<Vec<u8>, ExportError> {
    let (doc, page, layer) =
        PdfDocument::new("Shopping List", Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold)?,
    };

    let mut cursor = Cursor {
        doc: &doc,
        fonts: &fonts,
        layer: doc.get_page(page).get_layer(layer),
        y: PAGE_HEIGHT - MARGIN - 5.0,
        pages: 1,
    };

    cursor.text("Shopping List", TITLE_SIZE, MARGIN, true);
    cursor.y -= 12.0;
    cursor.header();

    for item in items {
        cursor.row(item);
    }

    let total = format!("Grand Total: {}", ListItem::grand_total(items));
    cursor.reserve(LINE_HEIGHT * 2.0);
    cursor.y -= LINE_HEIGHT;
    let x = PAGE_WIDTH - MARGIN - text_width(&total, BODY_SIZE + 2.0);
    cursor.text(&total, BODY_SIZE + 2.0, x, true);

    tracing::debug!(items = items.len(), pages = cursor.pages, "Rendered shopping list PDF");

    Ok(doc.save_to_bytes()?)
}

/// Approximate rendered width in millimetres.
#[allow(clippy::cast_precision_loss)]
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH_WIDTH * PT_TO_MM
}

/// Greedy word wrap; words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(title: &str, store: &str, price: f64, qty: u32) -> ListItem {
        serde_json::from_value(serde_json::json!({
            "title": title,
            "store": store,
            "price": price,
            "qty": qty,
        }))
        .unwrap()
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("Large brown eggs", 10), vec!["Large", "brown eggs"]);
        assert_eq!(wrap("short", 10), vec!["short"]);
        assert_eq!(wrap("", 10), vec![""]);
        assert_eq!(wrap("abcdefghijkl xy", 5), vec!["abcde", "fghij", "kl xy"]);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("walmart.com", 20), "walmart.com");
        assert_eq!(truncate("a-very-long-store-name.example", 10), "a-very-...");
    }

    #[test]
    fn test_empty_list_renders_pdf() {
        let bytes = render_shopping_list(&[]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_long_list_paginates() {
        let items: Vec<ListItem> = (0..120)
            .map(|i| {
                item(
                    &format!("Item {i} with a long description that wraps onto a second line"),
                    if i % 2 == 0 { "" } else { "target.com" },
                    1.25,
                    2,
                )
            })
            .collect();

        let bytes = render_shopping_list(&items).unwrap();
        let single = render_shopping_list(&items[..1]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > single.len());
    }
}
