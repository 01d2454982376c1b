//! PDF rendering of a computed layout via `printpdf`.

use std::io::BufWriter;

use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rect,
    Rgb,
};

use super::layout::{Element, FontWeight, ReportLayout, RgbColor, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use super::{ReportError, ReportResult};

/// Render every page of `layout`. Returns the PDF bytes.
pub fn render_pdf(layout: &ReportLayout, title: &str) -> ReportResult<Vec<u8>> {
    let (doc, page1, layer1) =
        PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::Render(format!("Font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReportError::Render(format!("Font error: {e}")))?;

    for (index, page) in layout.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (p, l) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            doc.get_page(p).get_layer(l)
        };

        for element in &page.elements {
            draw(&layer, element, &regular, &bold);
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ReportError::Render(format!("PDF save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ReportError::Render(format!("PDF buffer error: {e}")))
}

fn draw(
    layer: &PdfLayerReference,
    element: &Element,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    match element {
        Element::Text {
            text,
            x,
            y,
            size,
            weight,
            color,
        } => {
            let font = match weight {
                FontWeight::Regular => regular,
                FontWeight::Bold => bold,
            };
            layer.set_fill_color(pdf_color(*color));
            layer.use_text(text.as_str(), *size, Mm(*x), flip(*y), font);
        }
        Element::Rule {
            x1,
            x2,
            y,
            thickness,
            color,
        } => {
            layer.set_outline_color(pdf_color(*color));
            layer.set_outline_thickness(*thickness);
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(*x1), flip(*y)), false),
                    (Point::new(Mm(*x2), flip(*y)), false),
                ],
                is_closed: false,
            });
        }
        Element::Fill {
            x,
            y,
            width,
            height,
            color,
        } => {
            layer.set_fill_color(pdf_color(*color));
            layer.add_rect(
                Rect::new(Mm(*x), flip(*y + *height), Mm(*x + *width), flip(*y))
                    .with_mode(PaintMode::Fill),
            );
        }
    }
}

/// Top-down layout coordinates to PDF's bottom-up axis.
fn flip(y: f32) -> Mm {
    Mm(PAGE_HEIGHT_MM - y)
}

fn pdf_color(RgbColor(r, g, b): RgbColor) -> Color {
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}
