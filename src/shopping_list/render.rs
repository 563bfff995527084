//! Shopping list PDF rendering
//!
//! [`layout`] decides what goes on which page; [`render_pdf`] draws it on A4
//! with embedded DejaVu Sans, so names in any script keep their glyphs.

use std::io::BufWriter;

use printpdf::*;

use super::aggregate::ShoppingItem;

// ============================================================================
// Page geometry (mm)
// ============================================================================

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_TOP: f32 = 20.0;
const MARGIN_BOTTOM: f32 = 20.0;
const MARGIN_LEFT: f32 = 20.0;
const LINE_SPACING: f32 = 8.0;
/// Room taken by the title on the first page
const TITLE_BLOCK: f32 = 16.0;

const TITLE_SIZE: f32 = 18.0;
const LINE_SIZE: f32 = 12.0;

static FONT_REGULAR: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
static FONT_BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

const COLOR_TITLE: (u8, u8, u8) = (34, 102, 51);
const COLOR_BLACK: (u8, u8, u8) = (0, 0, 0);

/// Printed after the last ingredient
pub const CLOSING_MESSAGE: &str = "Happy shopping!";

/// Content of one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLayout {
    /// Only the first page carries the title
    pub heading: Option<String>,
    pub lines: Vec<String>,
}

/// One numbered ingredient line, counting from 1
pub fn format_line(n: usize, item: &ShoppingItem) -> String {
    format!(
        "{}. {} ({}) — {}",
        n, item.name, item.measurement_unit, item.amount
    )
}

fn lines_per_page(first: bool) -> usize {
    let mut usable = PAGE_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    if first {
        usable -= TITLE_BLOCK;
    }
    (usable / LINE_SPACING).floor() as usize
}

/// Split the numbered lines and closing message into pages
pub fn layout(title: &str, items: &[ShoppingItem]) -> Vec<PageLayout> {
    let all_lines = items
        .iter()
        .enumerate()
        .map(|(i, item)| format_line(i + 1, item))
        .chain(std::iter::once(CLOSING_MESSAGE.to_string()));

    let mut pages = vec![PageLayout {
        heading: Some(title.to_string()),
        lines: Vec::new(),
    }];
    let mut capacity = lines_per_page(true);

    for line in all_lines {
        let full = pages.last().map_or(true, |p| p.lines.len() >= capacity);
        if full {
            pages.push(PageLayout {
                heading: None,
                lines: Vec::new(),
            });
            capacity = lines_per_page(false);
        }
        if let Some(page) = pages.last_mut() {
            page.lines.push(line);
        }
    }
    pages
}

fn rgb_to_printpdf(color: (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(
        color.0 as f32 / 255.0,
        color.1 as f32 / 255.0,
        color.2 as f32 / 255.0,
        None,
    ))
}

fn add_text(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    y: f32,
    size: f32,
    color: (u8, u8, u8),
) {
    layer.set_fill_color(rgb_to_printpdf(color));
    layer.use_text(text, size, Mm(MARGIN_LEFT), Mm(y), font);
}

fn draw_page(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    font_bold: &IndirectFontRef,
    page: &PageLayout,
) {
    let mut y = PAGE_HEIGHT - MARGIN_TOP;
    if let Some(ref heading) = page.heading {
        add_text(layer, font_bold, heading, y, TITLE_SIZE, COLOR_TITLE);
        y -= TITLE_BLOCK;
    }
    for line in &page.lines {
        add_text(layer, font, line, y, LINE_SIZE, COLOR_BLACK);
        y -= LINE_SPACING;
    }
}

/// Render the aggregated list to PDF bytes
pub fn render_pdf(title: &str, items: &[ShoppingItem]) -> Result<Vec<u8>, String> {
    let pages = layout(title, items);

    let (doc, page1, layer1) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = doc
        .add_external_font(FONT_REGULAR)
        .map_err(|e| e.to_string())?;
    let font_bold = doc
        .add_external_font(FONT_BOLD)
        .map_err(|e| e.to_string())?;

    for (i, page) in pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (page_idx, layer_idx) = doc.add_page(
                Mm(PAGE_WIDTH),
                Mm(PAGE_HEIGHT),
                format!("Page {}", i + 1),
            );
            doc.get_page(page_idx).get_layer(layer_idx)
        };
        draw_page(&layer, &font, &font_bold, page);
    }

    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer).map_err(|e| e.to_string())?;
    writer.into_inner().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, unit: &str, amount: i64) -> ShoppingItem {
        ShoppingItem {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn test_format_line() {
        assert_eq!(format_line(1, &item("egg", "pcs", 3)), "1. egg (pcs) — 3");
        assert_eq!(
            format_line(12, &item("Flour T55", "g", 150)),
            "12. Flour T55 (g) — 150"
        );
    }

    #[test]
    fn test_empty_layout_has_title_and_closing() {
        let pages = layout("Shopping list", &[]);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].heading.as_deref(), Some("Shopping list"));
        assert_eq!(pages[0].lines, vec![CLOSING_MESSAGE.to_string()]);
    }

    #[test]
    fn test_layout_spills_onto_new_pages_in_order() {
        let items: Vec<_> = (0..70).map(|i| item(&format!("item{:02}", i), "g", 1)).collect();
        let pages = layout("List", &items);

        assert!(pages.len() > 1);
        assert!(pages.iter().skip(1).all(|p| p.heading.is_none()));
        assert_eq!(pages[0].lines.len(), lines_per_page(true));

        let flat: Vec<&String> = pages.iter().flat_map(|p| p.lines.iter()).collect();
        assert_eq!(flat.len(), 71);
        assert_eq!(flat[0], "1. item00 (g) — 1");
        assert_eq!(flat[69], "70. item69 (g) — 1");
        assert_eq!(flat[70], CLOSING_MESSAGE);
    }

    #[test]
    fn test_closing_moves_to_fresh_page_when_full() {
        let n = lines_per_page(true);
        let items: Vec<_> = (0..n).map(|i| item(&format!("i{}", i), "g", 1)).collect();
        let pages = layout("List", &items);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].lines, vec![CLOSING_MESSAGE.to_string()]);
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes = render_pdf("Shopping list", &[item("egg", "pcs", 3)]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let empty = render_pdf("Shopping list", &[]).unwrap();
        assert!(empty.starts_with(b"%PDF"));
    }
}
