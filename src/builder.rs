//! Paginated PDF rendering of sanitized answers.
//!
//! [`PdfBuilder`] turns one block of text into a `genpdf` document: every
//! input line becomes a paragraph wrapped between the page margins, blank
//! lines become empty rows, and a page decorator draws the header title and
//! the `Page {n}` footer configured in [`PageLayout`].  The result is kept in
//! memory; nothing is written to disk.
//!
//! The exported text must fit ISO-8859-1.  The builder does not sanitize; it
//! checks the text up front and fails with [`EncodingError`] instead.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use genpdf::elements::{Break, Paragraph};
use genpdf::error::{Error, ErrorKind};
use genpdf::style::{Style, StyledString};
use genpdf::{self, Alignment, Element, PageDecorator, Position};
use log::{debug, info, warn};

use crate::fonts;
use crate::layout::{mm_from_f64, PageLayout};

const MM_PER_POINT: f64 = 25.4 / 72.0;
/// Widest Latin-1 advance of the supported families, in em, rounded up.
/// Arial and its metric clone Liberation Sans reach about 1.015 em (`@`);
/// DejaVu Sans stays at or below 1.0 em.
const MAX_GLYPH_WIDTH_EM: f64 = 1.1;
const LATIN1_MAX: u32 = 0xFF;

/// A character that cannot be written with the single-byte PDF text encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodingError {
    character: char,
    byte_offset: usize,
}

impl EncodingError {
    /// The offending character.
    pub fn character(&self) -> char {
        self.character
    }

    /// Byte offset of the character in the rejected text.
    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "character {:?} (U+{:04X}) at byte {} cannot be encoded as ISO-8859-1",
            self.character, self.character as u32, self.byte_offset
        )
    }
}

impl std::error::Error for EncodingError {}

/// Checks that every character of `text` has a single-byte encoding.
pub fn ensure_encodable(text: &str) -> Result<(), EncodingError> {
    match text
        .char_indices()
        .find(|(_, ch)| u32::from(*ch) > LATIN1_MAX)
    {
        Some((byte_offset, character)) => Err(EncodingError {
            character,
            byte_offset,
        }),
        None => Ok(()),
    }
}

/// Errors produced while building an answer PDF.
#[derive(Debug)]
pub enum PdfBuildError {
    /// The text contains a character outside the supported encoding.
    Encoding(EncodingError),
    /// No usable font family could be loaded.
    FontLoad(Error),
    /// `genpdf` failed while laying out or serializing the document.
    Render(Error),
}

impl fmt::Display for PdfBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encoding(err) => write!(f, "Text cannot be exported to PDF: {err}"),
            Self::FontLoad(err) => write!(f, "Failed to load fonts: {err}"),
            Self::Render(err) => write!(f, "Failed to render PDF: {err}"),
        }
    }
}

impl std::error::Error for PdfBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encoding(err) => Some(err),
            Self::FontLoad(err) | Self::Render(err) => Some(err),
        }
    }
}

impl From<EncodingError> for PdfBuildError {
    fn from(err: EncodingError) -> Self {
        Self::Encoding(err)
    }
}

/// A rendered document held in memory.
#[derive(Clone, Debug)]
pub struct RenderedPdf {
    /// Serialized PDF file contents.
    pub bytes: Vec<u8>,
    /// Number of pages the text was laid out on.
    pub page_count: usize,
}

/// Builder for a single-answer PDF document.
#[derive(Clone, Debug)]
pub struct PdfBuilder {
    text: String,
    layout: PageLayout,
}

impl PdfBuilder {
    /// Creates a builder for `text` using the default [`PageLayout`].
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            layout: PageLayout::default(),
        }
    }

    /// Replaces the page layout and returns the updated builder.
    pub fn with_layout(mut self, layout: PageLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Returns the layout the document will be rendered with.
    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    /// Lays out the text and serializes the document.
    pub fn render(self) -> Result<RenderedPdf, PdfBuildError> {
        ensure_encodable(&self.layout.header_text)?;
        ensure_encodable(&self.layout.footer_format)?;
        ensure_encodable(&self.text)?;

        let font_family = fonts::default_font_family().map_err(PdfBuildError::FontLoad)?;
        let mut document = genpdf::Document::new(font_family);
        document.set_title(self.layout.header_text.clone());
        document.set_paper_size(self.layout.genpdf_paper_size());
        document.set_font_size(self.layout.body_font_size);
        document.set_line_spacing(self.layout.line_spacing);

        let pages = Rc::new(Cell::new(0));
        document.set_page_decorator(AnswerPageDecorator::new(
            self.layout.clone(),
            Rc::clone(&pages),
        ));

        let max_word_chars = max_unbroken_chars(&self.layout);
        for line in self.text.lines() {
            if line.trim().is_empty() {
                document.push(Break::new(1));
            } else {
                document.push(Paragraph::new(break_long_words(line, max_word_chars)));
            }
        }

        let mut bytes = Vec::new();
        document.render(&mut bytes).map_err(|err| {
            warn!("PDF rendering failed: {}", err);
            PdfBuildError::Render(err)
        })?;

        let page_count = pages.get();
        info!("Rendered PDF with {} page(s)", page_count);
        debug!("PDF size: {} bytes", bytes.len());

        Ok(RenderedPdf { bytes, page_count })
    }
}

/// Renders `text` with the default layout and returns the PDF bytes.
///
/// The text must already be sanitized; see [`crate::sanitize::sanitize`].
pub fn render(text: &str) -> Result<Vec<u8>, PdfBuildError> {
    PdfBuilder::new(text).render().map(|pdf| pdf.bytes)
}

/// Longest run of characters that is guaranteed to fit on one body line,
/// assuming no glyph is wider than [`MAX_GLYPH_WIDTH_EM`].
fn max_unbroken_chars(layout: &PageLayout) -> usize {
    let glyph_mm = f64::from(layout.body_font_size.max(1)) * MM_PER_POINT * MAX_GLYPH_WIDTH_EM;
    let chars = (layout.text_width_mm() / glyph_mm).floor();
    if chars >= 1.0 {
        chars as usize
    } else {
        1
    }
}

/// Splits words longer than `max_chars` so the line wrapper can place them.
fn break_long_words(line: &str, max_chars: usize) -> String {
    line.split(' ')
        .map(|word| {
            if word.chars().count() <= max_chars {
                word.to_string()
            } else {
                word.chars()
                    .collect::<Vec<_>>()
                    .chunks(max_chars)
                    .map(|chunk| chunk.iter().collect::<String>())
                    .collect::<Vec<_>>()
                    .join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

struct AnswerPageDecorator {
    layout: PageLayout,
    pages: Rc<Cell<usize>>,
}

impl AnswerPageDecorator {
    fn new(layout: PageLayout, pages: Rc<Cell<usize>>) -> Self {
        Self { layout, pages }
    }

    fn header(&self) -> Paragraph {
        let mut style = Style::new();
        style.set_bold();
        style.set_font_size(self.layout.header_font_size);
        centered(StyledString::new(self.layout.header_text.clone(), style))
    }

    fn footer(&self, page: usize) -> Paragraph {
        let mut style = Style::new();
        style.set_italic();
        style.set_font_size(self.layout.footer_font_size);
        centered(StyledString::new(self.layout.footer_text(page), style))
    }
}

fn centered(text: StyledString) -> Paragraph {
    let mut paragraph = Paragraph::new(text);
    paragraph.set_alignment(Alignment::Center);
    paragraph
}

impl PageDecorator for AnswerPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        let page = self.pages.get() + 1;
        self.pages.set(page);

        area.add_margins(self.layout.genpdf_margins());

        let mut header = self.header();
        let result = header.render(context, area.clone(), style)?;
        area.add_offset(Position::new(
            0,
            result.size.height + mm_from_f64(self.layout.header_spacing_mm),
        ));

        let footer_height = mm_from_f64(self.layout.footer_height_mm);
        let available = area.size().height;
        if footer_height > available {
            return Err(Error::new(
                "Footer height exceeds available space",
                ErrorKind::InvalidData,
            ));
        }

        let mut footer_area = area.clone();
        footer_area.add_offset(Position::new(0, available - footer_height));
        let mut footer = self.footer(page);
        let result = footer.render(context, footer_area, style)?;
        if result.has_more {
            return Err(Error::new(
                "Footer does not fit into the reserved space",
                ErrorKind::PageSizeExceeded,
            ));
        }

        area.set_height(available - footer_height);
        Ok(area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn latin1_text_is_encodable() {
        assert_eq!(ensure_encodable(""), Ok(()));
        assert_eq!(ensure_encodable("Step 1 -> add 2 + 2"), Ok(()));
        assert_eq!(ensure_encodable("café, 100°C, ½, ÿ"), Ok(()));
    }

    #[test]
    fn reports_first_unencodable_character() {
        let err = ensure_encodable("a → b → c").unwrap_err();
        assert_eq!(err.character(), '→');
        assert_eq!(err.byte_offset(), 2);
        assert!(err.to_string().contains("U+2192"));
    }

    #[test]
    fn render_rejects_unencodable_text_before_loading_fonts() {
        let err = render("Smart “quotes”").unwrap_err();
        match err {
            PdfBuildError::Encoding(inner) => assert_eq!(inner.character(), '“'),
            other => panic!("expected encoding error, got {other}"),
        }
    }

    #[test]
    fn render_rejects_unencodable_header() {
        let layout = PageLayout::default().with_header_text("Answers ✓");
        let err = PdfBuilder::new("fine").with_layout(layout).render().unwrap_err();
        assert!(matches!(err, PdfBuildError::Encoding(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn long_words_are_split() {
        assert_eq!(break_long_words("short words stay", 5), "short words stay");
        assert_eq!(break_long_words("abcdefghij xy", 4), "abcd efgh ij xy");
        assert_eq!(break_long_words("", 4), "");
    }

    #[test]
    fn unbroken_limit_follows_font_size() {
        let default_limit = max_unbroken_chars(&PageLayout::default());
        assert_eq!(default_limit, 40);
        let larger = max_unbroken_chars(&PageLayout::default().with_body_font_size(24));
        assert!(larger < default_limit);
    }

    #[test]
    fn unbroken_limit_fits_widest_glyphs() {
        // `@` in Arial-metric fonts is 2079/2048 em wide.
        let widest_em = 2079.0 / 2048.0;
        for size in [8, 10, 12, 14, 18, 24, 36] {
            let layout = PageLayout::default().with_body_font_size(size);
            let run_mm = max_unbroken_chars(&layout) as f64
                * f64::from(size)
                * MM_PER_POINT
                * widest_em;
            assert!(
                run_mm <= layout.text_width_mm(),
                "{size} pt: {run_mm} mm exceeds {} mm",
                layout.text_width_mm()
            );
        }
    }

    #[test]
    fn builder_keeps_layout() {
        let layout = PageLayout::default().with_header_text("Detailed");
        let builder = PdfBuilder::new("text").with_layout(layout.clone());
        assert_eq!(builder.layout(), &layout);
    }
}
