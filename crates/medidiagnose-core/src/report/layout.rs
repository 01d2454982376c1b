//! Report layout as data.
//!
//! Positions are in millimetres measured from the top-left corner of an A4
//! page, with `y` at the text baseline. The renderer flips the axis.

use crate::models::AnalysisSummary;

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 15.0;
pub const CONTENT_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
pub const LINE_HEIGHT_MM: f32 = 4.0;
pub const SECTION_SPACING_MM: f32 = 4.0;
pub const HEADER_BAND_MM: f32 = 25.0;
/// Cursor position after the header has been drawn.
pub const CONTENT_TOP_MM: f32 = 23.0;
/// Content may not extend past this line; the rest is the bottom margin.
pub const SAFE_BOTTOM_MM: f32 = PAGE_HEIGHT_MM - MARGIN_MM;

pub const REPORT_TITLE: &str = "MediDiagnose Medical Report";
pub const BRAND_LABEL: &str = "MediDiagnose";
pub const TAGLINE: &str = "MediDiagnose - AI-Powered Health Diagnostics";
pub const INTRO: &str =
    "Based on the provided image and symptoms, the following diagnosis has been determined:";
pub const DISCLAIMER: &str = "Disclaimer: This report is generated by MediDiagnose AI and should not be considered a substitute for professional medical advice. Always consult a qualified healthcare provider for diagnosis and treatment.";
pub const CONTACT: &str = "Contact: support@medidiagnose.com | Website: www.medidiagnose.com";
pub const UNKNOWN_CONDITION: &str = "Unknown Condition";

const BODY_PT: f32 = 10.0;
const HEADING_PT: f32 = 12.0;
const FOOTER_PT: f32 = 8.0;
const NUMBER_INDENT_MM: f32 = 5.0;
const PT_TO_MM: f32 = 0.352_778;

/// Height reserved before each heading so it is never orphaned.
const PATIENT_RESERVE_MM: f32 = 15.0;
const NARRATIVE_RESERVE_MM: f32 = 30.0;
const LIST_RESERVE_MM: f32 = 50.0;
const FOOTER_RESERVE_MM: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor(pub u8, pub u8, pub u8);

pub const PRIMARY: RgbColor = RgbColor(33, 150, 243);
pub const BAND: RgbColor = RgbColor(240, 240, 240);
pub const ACCENT: RgbColor = RgbColor(100, 100, 100);
pub const INK: RgbColor = RgbColor(0, 0, 0);
pub const WHITE: RgbColor = RgbColor(255, 255, 255);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// One drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        weight: FontWeight,
        color: RgbColor,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
        thickness: f32,
        color: RgbColor,
    },
    Fill {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: RgbColor,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaidOutPage {
    pub elements: Vec<Element>,
}

impl LaidOutPage {
    /// Text content of the page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| match e {
            Element::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportLayout {
    pub pages: Vec<LaidOutPage>,
}

impl ReportLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Everything the layout needs, already resolved to display strings.
#[derive(Debug, Clone)]
pub struct LayoutInput<'a> {
    pub patient_name: &'a str,
    pub generated_at: &'a str,
    /// `None` renders as "Not Available"
    pub analyzed_at: Option<&'a str>,
    pub summary: &'a AnalysisSummary,
    pub selected_symptoms: &'a [String],
    pub description: &'a str,
}

/// Lay out the full report. Text is expected to be sanitized already.
pub fn layout_report(input: &LayoutInput<'_>) -> ReportLayout {
    let mut builder = LayoutBuilder::new();
    let summary = input.summary;

    builder.paragraph(
        &format!("Report Generated: {}", input.generated_at),
        TextStyle::body(),
    );
    builder.paragraph(TAGLINE, TextStyle::body());
    builder.space(SECTION_SPACING_MM);

    builder.heading("Patient Information", PATIENT_RESERVE_MM, 40.0);
    builder.paragraph(&format!("Name: {}", input.patient_name), TextStyle::body());
    builder.paragraph(
        &format!(
            "Date of Analysis: {}",
            input.analyzed_at.unwrap_or("Not Available")
        ),
        TextStyle::body(),
    );
    builder.space(SECTION_SPACING_MM);

    let diagnosis = if summary.diagnosis.is_empty() {
        UNKNOWN_CONDITION
    } else {
        summary.diagnosis.as_str()
    };
    builder.heading("Diagnosis Overview", NARRATIVE_RESERVE_MM, 40.0);
    builder.paragraph(INTRO, TextStyle::body());
    builder.paragraph(&format!("Condition: {}", diagnosis), TextStyle::body());
    builder.paragraph(&summary.description, TextStyle::body());
    builder.space(SECTION_SPACING_MM);

    builder.heading("Reported Symptoms", NARRATIVE_RESERVE_MM, 40.0);
    builder.paragraph(
        &format!(
            "Symptoms Reported by Patient: {}.",
            input.selected_symptoms.join(", ")
        ),
        TextStyle::body(),
    );
    builder.paragraph(
        &format!("Analyzed Symptoms: {}", summary.analyzed_symptoms),
        TextStyle::body(),
    );
    builder.space(SECTION_SPACING_MM);

    builder.heading("Patient's Description of Problem", NARRATIVE_RESERVE_MM, 50.0);
    builder.paragraph(input.description, TextStyle::body());
    builder.space(SECTION_SPACING_MM);

    builder.heading("Possible Causes", LIST_RESERVE_MM, 30.0);
    builder.numbered(&summary.causes);
    builder.space(SECTION_SPACING_MM);

    builder.heading("Recommendations", LIST_RESERVE_MM, 30.0);
    builder.numbered(&summary.recommendations);
    builder.space(SECTION_SPACING_MM);

    builder.ensure_space(FOOTER_RESERVE_MM);
    builder.paragraph(DISCLAIMER, TextStyle::footer());
    builder.paragraph(CONTACT, TextStyle::footer());

    builder.finish()
}

#[derive(Debug, Clone, Copy)]
struct TextStyle {
    size: f32,
    weight: FontWeight,
    color: RgbColor,
}

impl TextStyle {
    fn body() -> Self {
        Self {
            size: BODY_PT,
            weight: FontWeight::Regular,
            color: INK,
        }
    }

    fn footer() -> Self {
        Self {
            size: FOOTER_PT,
            weight: FontWeight::Regular,
            color: ACCENT,
        }
    }
}

struct LayoutBuilder {
    pages: Vec<LaidOutPage>,
    cursor: f32,
}

impl LayoutBuilder {
    fn new() -> Self {
        let mut builder = Self {
            pages: Vec::new(),
            cursor: 0.0,
        };
        builder.start_page();
        builder
    }

    fn finish(self) -> ReportLayout {
        ReportLayout { pages: self.pages }
    }

    fn push(&mut self, element: Element) {
        if let Some(page) = self.pages.last_mut() {
            page.elements.push(element);
        }
    }

    fn start_page(&mut self) {
        self.pages.push(LaidOutPage::default());
        self.draw_header();
        self.cursor = CONTENT_TOP_MM;
    }

    fn draw_header(&mut self) {
        self.push(Element::Fill {
            x: 0.0,
            y: 0.0,
            width: PAGE_WIDTH_MM,
            height: HEADER_BAND_MM,
            color: BAND,
        });
        self.push(Element::Fill {
            x: MARGIN_MM,
            y: 5.0,
            width: 30.0,
            height: 15.0,
            color: ACCENT,
        });
        self.push(Element::Text {
            text: BRAND_LABEL.to_string(),
            x: MARGIN_MM + 3.0,
            y: 13.5,
            size: FOOTER_PT,
            weight: FontWeight::Bold,
            color: WHITE,
        });
        self.push(Element::Text {
            text: REPORT_TITLE.to_string(),
            x: MARGIN_MM + 35.0,
            y: 15.0,
            size: HEADING_PT,
            weight: FontWeight::Bold,
            color: PRIMARY,
        });
        self.push(Element::Rule {
            x1: MARGIN_MM,
            x2: PAGE_WIDTH_MM - MARGIN_MM,
            y: 20.0,
            thickness: 0.2,
            color: PRIMARY,
        });
    }

    /// Start a new page unless `needed` more millimetres fit on this one.
    fn ensure_space(&mut self, needed: f32) {
        if self.cursor + needed > SAFE_BOTTOM_MM {
            self.start_page();
        }
    }

    fn space(&mut self, mm: f32) {
        self.cursor += mm;
    }

    fn heading(&mut self, title: &str, reserve: f32, underline: f32) {
        self.ensure_space(reserve);
        self.push(Element::Text {
            text: title.to_string(),
            x: MARGIN_MM,
            y: self.cursor,
            size: HEADING_PT,
            weight: FontWeight::Bold,
            color: PRIMARY,
        });
        self.push(Element::Rule {
            x1: MARGIN_MM,
            x2: MARGIN_MM + underline,
            y: self.cursor + 1.0,
            thickness: 0.2,
            color: PRIMARY,
        });
        self.cursor += LINE_HEIGHT_MM + 2.0;
    }

    /// Wrapped text block. Kept on one page when it fits on a fresh page,
    /// otherwise continued line by line across pages.
    fn paragraph(&mut self, text: &str, style: TextStyle) {
        let lines = wrap_to_width(text, CONTENT_WIDTH_MM, style.size);
        self.emit_lines(&lines, MARGIN_MM, style, None);
    }

    fn numbered(&mut self, items: &[String]) {
        let style = TextStyle::body();
        for (index, item) in items.iter().enumerate() {
            let lines = wrap_to_width(item, CONTENT_WIDTH_MM - 10.0, style.size);
            let number = format!("{}.", index + 1);
            self.emit_lines(&lines, MARGIN_MM + NUMBER_INDENT_MM, style, Some(number));
        }
    }

    fn emit_lines(&mut self, lines: &[String], x: f32, style: TextStyle, number: Option<String>) {
        let needed = LINE_HEIGHT_MM * lines.len() as f32;
        let per_line = needed > SAFE_BOTTOM_MM - CONTENT_TOP_MM;
        if !per_line {
            self.ensure_space(needed);
        }

        for (i, line) in lines.iter().enumerate() {
            if per_line {
                self.ensure_space(LINE_HEIGHT_MM);
            }
            if i == 0 {
                if let Some(number) = &number {
                    self.push(Element::Text {
                        text: number.clone(),
                        x: MARGIN_MM,
                        y: self.cursor,
                        size: style.size,
                        weight: FontWeight::Bold,
                        color: style.color,
                    });
                }
            }
            self.push(Element::Text {
                text: line.clone(),
                x,
                y: self.cursor,
                size: style.size,
                weight: style.weight,
                color: style.color,
            });
            self.cursor += LINE_HEIGHT_MM;
        }
    }
}

/// Approximate Helvetica advance width in thousandths of an em.
fn glyph_width(c: char) -> u32 {
    match c {
        'i' | 'j' | 'l' | '\'' | '|' => 222,
        ' ' | ',' | '.' | '!' | ':' | ';' | '/' | 'I' | 'f' | 't' | '[' | ']' => 278,
        'r' | '-' | '(' | ')' | '`' => 333,
        'm' => 833,
        'M' => 833,
        'W' => 944,
        'w' => 722,
        '@' => 1015,
        '%' => 889,
        'A'..='Z' => 667,
        _ => 556,
    }
}

/// Estimated rendered width of `text` in millimetres.
pub fn text_width_mm(text: &str, size_pt: f32) -> f32 {
    let units: u32 = text.chars().map(glyph_width).sum();
    units as f32 / 1000.0 * size_pt * PT_TO_MM
}

/// Greedy word wrap to a width. Always yields at least one (possibly empty) line.
pub fn wrap_to_width(text: &str, max_width_mm: f32, size_pt: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if !current.is_empty() && text_width_mm(&candidate, size_pt) > max_width_mm {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
