//! Page geometry and decoration settings for exported answers.
//!
//! A [`PageLayout`] is plain data: it describes the header title, the footer
//! format and the measurements the page decorator in [`crate::builder`]
//! applies to every page.  Lengths are stored in millimetres as `f64` and only
//! turned into `genpdf` units when a document is built.

use genpdf::{Margins, Mm, Size};

/// Title printed at the top of every page of an exported answer.
pub const DEFAULT_HEADER_TEXT: &str = "Team O1A1 Learning AI Assistant - Response";

/// Footer format; `{n}` is replaced with the 1-based page number.
pub const DEFAULT_FOOTER_FORMAT: &str = "Page {n}";

const PAGE_NUMBER_PLACEHOLDER: &str = "{n}";

/// Page margins in millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarginsMm {
    /// Distance from the top edge to the header.
    pub top: f64,
    /// Right body margin.
    pub right: f64,
    /// Distance from the bottom edge to the footer band.
    pub bottom: f64,
    /// Left body margin.
    pub left: f64,
}

/// Decoration and spacing applied to every page of the document.
#[derive(Clone, Debug, PartialEq)]
pub struct PageLayout {
    /// Centered bold title at the top of each page.
    pub header_text: String,
    /// Centered italic footer; `{n}` expands to the page number.
    pub footer_format: String,
    /// Outer page margins.
    pub margins: MarginsMm,
    /// Font size of the body text in points.
    pub body_font_size: u8,
    /// Font size of the header title in points.
    pub header_font_size: u8,
    /// Font size of the footer in points.
    pub footer_font_size: u8,
    /// Vertical gap between the header title and the body.
    pub header_spacing_mm: f64,
    /// Height reserved for the footer at the bottom of each page.
    pub footer_height_mm: f64,
    /// Line height multiplier for body rows.
    pub line_spacing: f64,
    /// Paper size in millimetres (width, height).
    pub paper_size_mm: (f64, f64),
}

impl Default for PageLayout {
    /// A4 pages with a 10 mm frame, a 15 mm header band and a 15 mm footer
    /// band, 12 pt body text on double-spaced rows.
    fn default() -> Self {
        Self {
            header_text: DEFAULT_HEADER_TEXT.to_string(),
            footer_format: DEFAULT_FOOTER_FORMAT.to_string(),
            margins: MarginsMm {
                top: 10.0,
                right: 10.0,
                bottom: 5.0,
                left: 10.0,
            },
            body_font_size: 12,
            header_font_size: 12,
            footer_font_size: 8,
            header_spacing_mm: 5.0,
            footer_height_mm: 15.0,
            line_spacing: 2.0,
            paper_size_mm: (210.0, 297.0),
        }
    }
}

impl PageLayout {
    /// Sets the header title and returns the updated layout.
    pub fn with_header_text(mut self, header_text: impl Into<String>) -> Self {
        self.header_text = header_text.into();
        self
    }

    /// Sets the footer format and returns the updated layout.
    pub fn with_footer_format(mut self, footer_format: impl Into<String>) -> Self {
        self.footer_format = footer_format.into();
        self
    }

    /// Sets the body font size and returns the updated layout.
    pub fn with_body_font_size(mut self, size: u8) -> Self {
        self.body_font_size = size;
        self
    }

    /// Footer text for the given 1-based page number.
    pub fn footer_text(&self, page: usize) -> String {
        self.footer_format
            .replace(PAGE_NUMBER_PLACEHOLDER, &page.to_string())
    }

    /// Width available to body text between the left and right margins.
    pub fn text_width_mm(&self) -> f64 {
        self.paper_size_mm.0 - self.margins.left - self.margins.right
    }

    pub(crate) fn genpdf_margins(&self) -> Margins {
        Margins::trbl(
            mm_from_f64(self.margins.top),
            mm_from_f64(self.margins.right),
            mm_from_f64(self.margins.bottom),
            mm_from_f64(self.margins.left),
        )
    }

    pub(crate) fn genpdf_paper_size(&self) -> Size {
        let (width, height) = self.paper_size_mm;
        Size::new(mm_from_f64(width), mm_from_f64(height))
    }
}

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}
