use learning_assistant::builder::{render, PdfBuildError, PdfBuilder};
use learning_assistant::fonts;
use learning_assistant::layout::PageLayout;
use learning_assistant::sanitize;
use sha2::{Digest, Sha256};

const SKIP_HINT: &str =
    "no font family available. Set LEARNING_ASSISTANT_FONTS_DIR or install Liberation Sans or DejaVu Sans.";

const SAMPLE_ANSWER: &str = "Step 1: Count two apples.\n\nStep 2: Add two more apples.\n\nStep 3: You now have 4 apples.";

fn fonts_or_skip(test: &str) -> bool {
    if fonts::default_fonts_available() {
        true
    } else {
        eprintln!("Skipping {test}: {SKIP_HINT}");
        false
    }
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() {
                    let byte = data[cursor];
                    if byte == terminator {
                        break;
                    }
                    if terminator == b')' {
                        data[cursor] = b'0';
                    } else if !matches!(byte, b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t') {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while offset + start.len() < data.len() {
            let Some(start_pos) = data[offset..]
                .windows(start.len())
                .position(|window| window == start)
            else {
                break;
            };
            let start_index = offset + start_pos + start.len();
            let Some(end_pos) = data[start_index..]
                .windows(end.len())
                .position(|window| window == end)
            else {
                break;
            };
            for byte in &mut data[start_index..start_index + end_pos] {
                if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                    *byte = b'0';
                }
            }
            offset = start_index + end_pos + end.len();
        }
    }

    let mut normalized = bytes.to_vec();
    scrub_segment(&mut normalized, b"/CreationDate(", b')');
    scrub_segment(&mut normalized, b"/ModDate(", b')');
    scrub_segment(&mut normalized, b"/ID[", b']');
    scrub_segment(&mut normalized, b"/Producer(", b')');
    scrub_xml(&mut normalized, b"<xmp:CreateDate>", b"</xmp:CreateDate>");
    scrub_xml(&mut normalized, b"<xmp:ModifyDate>", b"</xmp:ModifyDate>");
    scrub_xml(&mut normalized, b"<xmp:MetadataDate>", b"</xmp:MetadataDate>");
    scrub_xml(&mut normalized, b"<xmpMM:DocumentID>", b"</xmpMM:DocumentID>");
    scrub_xml(&mut normalized, b"<xmpMM:InstanceID>", b"</xmpMM:InstanceID>");
    scrub_xml(&mut normalized, b"<xmpMM:VersionID>", b"</xmpMM:VersionID>");
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    let normalized = scrub_pdf(bytes);
    let digest = Sha256::digest(&normalized);
    digest.into()
}

#[test]
fn renders_non_empty_pdf() {
    if !fonts_or_skip("renders_non_empty_pdf") {
        return;
    }

    let bytes = render(SAMPLE_ANSWER).expect("render sample answer");
    assert!(bytes.starts_with(b"%PDF"), "output should be a PDF file");
}

#[test]
fn rendering_is_deterministic() {
    if !fonts_or_skip("rendering_is_deterministic") {
        return;
    }

    let bytes_a = render(SAMPLE_ANSWER).expect("first render");
    let bytes_b = render(SAMPLE_ANSWER).expect("second render");

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&bytes_a),
        normalized_hash(&bytes_b),
        "PDF renders must be deterministic after metadata normalization"
    );
}

#[test]
fn empty_text_renders_single_decorated_page() {
    if !fonts_or_skip("empty_text_renders_single_decorated_page") {
        return;
    }

    let text = sanitize("**##---**");
    assert_eq!(text, "");

    let pdf = PdfBuilder::new(text).render().expect("render empty answer");
    assert!(!pdf.bytes.is_empty());
    assert_eq!(pdf.page_count, 1);
}

#[test]
fn long_answers_flow_onto_more_pages() {
    if !fonts_or_skip("long_answers_flow_onto_more_pages") {
        return;
    }

    let paragraph = "Fractions describe parts of a whole. When a pizza is cut into eight equal slices, each slice is one eighth of the pizza.";
    let text = vec![paragraph; 60].join("\n\n");

    let pdf = PdfBuilder::new(text).render().expect("render long answer");
    assert!(pdf.page_count > 1, "expected several pages, got {}", pdf.page_count);
}

#[test]
fn unbroken_text_wider_than_the_page_still_renders() {
    if !fonts_or_skip("unbroken_text_wider_than_the_page_still_renders") {
        return;
    }

    let text = "x".repeat(500);
    let pdf = PdfBuilder::new(text).render().expect("render long word");
    assert!(pdf.page_count >= 1);
}

#[test]
fn sanitized_typographic_answer_renders() {
    if !fonts_or_skip("sanitized_typographic_answer_renders") {
        return;
    }

    let raw = "## Adding fractions\n\n**Step 1** — find a common denominator…\r\n\r\n\r\n• “Half” + ‘quarter’ → three quarters";
    let pdf = PdfBuilder::new(sanitize(raw))
        .with_layout(PageLayout::default().with_header_text("Detailed answer"))
        .render()
        .expect("render sanitized answer");
    assert!(pdf.bytes.starts_with(b"%PDF"));
}

#[test]
fn latin1_text_never_fails_on_encoding() {
    let result = render("Température: 25°C, ½ cup, naïve façade");
    if fonts::default_fonts_available() {
        assert!(result.is_ok(), "Latin-1 text should render: {:?}", result.err());
    } else {
        assert!(matches!(result, Err(PdfBuildError::FontLoad(_))));
    }
}
