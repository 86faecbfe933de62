//! # PDF Writer
//!
//! A small PDF 1.4 writer covering what receipts need: Unicode text in one
//! embedded TrueType face, lines, filled rectangles and one embedded RGB
//! image.
//!
//! ## File Layout
//! ```text
//! %PDF-1.4
//! 1 0 obj  Catalog
//! 2 0 obj  Pages (kids)
//! 3 0 obj  Font /F1 Type0, Identity-H
//! 4 0 obj  CIDFontType2 (glyph widths)
//! 5 0 obj  ToUnicode CMap
//! 6 0 obj  FontDescriptor
//! 7 0 obj  FontFile2 (the TrueType program)
//! 8 0 obj  Image /Im1                (optional, raw RGB)
//! n 0 obj  Page, n+1 0 obj content stream   ... per page
//! xref
//! trailer
//! %%EOF
//! ```
//!
//! Text is written as two-byte glyph ids (`<0041...> Tj`), so any character
//! the face covers renders: Latin, Cyrillic, Greek. The ToUnicode map keeps
//! it searchable and copyable. Bold is drawn by stroking the outline.

pub mod layout;

use std::collections::BTreeMap;
use std::fmt::Write as _;

use thiserror::Error;
use ttf_parser::{Face, GlyphId};

/// A4 portrait, in points.
pub const A4_WIDTH: f32 = 595.28;
pub const A4_HEIGHT: f32 = 841.89;

/// DejaVu Sans, see `assets/fonts/LICENSE`.
static DEJAVU_SANS: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
const BASE_FONT: &str = "DejaVuSans";

/// Outline stroke of bold text, relative to the font size.
const BOLD_STROKE: f32 = 0.035;

/// Millimetres to points.
pub fn mm(value: f32) -> f32 {
    value * 72.0 / 25.4
}

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Unreadable font: {0}")]
    Font(String),
}

pub type PdfResult<T> = Result<T, PdfError>;

/// Text weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

/// Raw 8-bit RGB pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbImage {
    /// `None` unless `pixels` holds exactly `width * height` RGB triples.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(3)?;
        (width > 0 && height > 0 && pixels.len() == expected).then_some(RgbImage {
            width,
            height,
            pixels,
        })
    }
}

// =============================================================================
// Typeface
// =============================================================================

/// The TrueType face embedded into every document.
pub struct Typeface {
    data: &'static [u8],
    face: Face<'static>,
    /// Font units to 1/1000 em.
    scale: f32,
}

impl std::fmt::Debug for Typeface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Typeface")
            .field("size", &self.data.len())
            .field("units_per_em", &self.face.units_per_em())
            .finish()
    }
}

impl Typeface {
    /// The face shipped with the server.
    pub fn bundled() -> PdfResult<Self> {
        Self::parse(DEJAVU_SANS)
    }

    fn parse(data: &'static [u8]) -> PdfResult<Self> {
        let face = Face::parse(data, 0).map_err(|e| PdfError::Font(e.to_string()))?;
        let scale = 1000.0 / f32::from(face.units_per_em());
        Ok(Typeface { data, face, scale })
    }

    /// True when `c` has its own glyph.
    #[cfg(test)]
    pub(crate) fn covers(&self, c: char) -> bool {
        self.face.glyph_index(c).is_some()
    }

    /// The glyph drawn for `c` and the character it actually shows.
    ///
    /// Control characters show as spaces, uncovered ones as `?`.
    fn resolve(&self, c: char) -> (GlyphId, char) {
        let c = if c.is_control() { ' ' } else { c };
        match self.face.glyph_index(c) {
            Some(glyph) => (glyph, c),
            None => (self.face.glyph_index('?').unwrap_or(GlyphId(0)), '?'),
        }
    }

    /// Advance of `glyph` in 1/1000 em.
    fn advance(&self, glyph: GlyphId) -> f32 {
        self.face
            .glyph_hor_advance(glyph)
            .map_or(0.0, |units| f32::from(units) * self.scale)
    }

    fn units(&self, value: i16) -> i32 {
        (f32::from(value) * self.scale).round() as i32
    }

    /// Rendered width of `text` in points.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: f32 = text.chars().map(|c| self.advance(self.resolve(c).0)).sum();
        units * size / 1000.0
    }

    /// Cuts `text` so it fits into `max_width`, ending with `...` when cut.
    pub fn fit_text(&self, text: &str, max_width: f32, size: f32) -> String {
        if self.text_width(text, size) <= max_width {
            return text.to_string();
        }
        let mut fitted: String = text.to_string();
        while !fitted.is_empty() {
            fitted.pop();
            let candidate = format!("{}...", fitted.trim_end());
            if self.text_width(&candidate, size) <= max_width {
                return candidate;
            }
        }
        String::new()
    }

    /// Glyph ids of `text` as the hex string body shown with `Tj`.
    #[cfg(test)]
    pub(crate) fn glyph_hex(&self, text: &str) -> String {
        let mut hex = String::with_capacity(text.len() * 4);
        for c in text.chars() {
            let _ = write!(hex, "{:04X}", self.resolve(c).0 .0);
        }
        hex
    }
}

// =============================================================================
// Page
// =============================================================================

/// One page and its content stream.
#[derive(Debug)]
pub struct Page<'f> {
    font: &'f Typeface,
    width: f32,
    height: f32,
    content: String,
    /// Glyphs drawn on this page and the character each one shows.
    glyphs: BTreeMap<u16, char>,
    uses_image: bool,
}

impl<'f> Page<'f> {
    pub fn new(font: &'f Typeface, width: f32, height: f32) -> Self {
        Page {
            font,
            width,
            height,
            content: String::new(),
            glyphs: BTreeMap::new(),
            uses_image: false,
        }
    }

    fn text_width(&self, text: &str, size: f32) -> f32 {
        self.font.text_width(text, size)
    }

    pub fn fit_text(&self, text: &str, max_width: f32, size: f32) -> String {
        self.font.fit_text(text, max_width, size)
    }

    /// Text with its baseline starting at `(x, y)`.
    pub fn text(&mut self, x: f32, y: f32, size: f32, weight: Weight, text: &str) {
        let mut hex = String::with_capacity(text.len() * 4);
        for c in text.chars() {
            let (glyph, shown) = self.font.resolve(c);
            self.glyphs.entry(glyph.0).or_insert(shown);
            let _ = write!(hex, "{:04X}", glyph.0);
        }

        let render = match weight {
            Weight::Regular => "0 Tr".to_string(),
            Weight::Bold => format!("2 Tr {} w", num(size * BOLD_STROKE)),
        };
        let _ = writeln!(
            self.content,
            "BT /F1 {} Tf {} {} {} Td <{}> Tj ET",
            num(size),
            render,
            num(x),
            num(y),
            hex
        );
    }

    /// Text ending at `right`.
    pub fn text_right(&mut self, right: f32, y: f32, size: f32, weight: Weight, text: &str) {
        let x = right - self.text_width(text, size);
        self.text(x, y, size, weight, text);
    }

    /// Text centred on `center`.
    pub fn text_center(&mut self, center: f32, y: f32, size: f32, weight: Weight, text: &str) {
        let x = center - self.text_width(text, size) / 2.0;
        self.text(x, y, size, weight, text);
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32) {
        let _ = writeln!(
            self.content,
            "{} w {} {} m {} {} l S",
            num(width),
            num(x1),
            num(y1),
            num(x2),
            num(y2)
        );
    }

    /// A rectangle filled with a gray level (0 black, 1 white).
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, gray: f32) {
        let _ = writeln!(
            self.content,
            "{} g {} {} {} {} re f 0 g",
            num(gray.clamp(0.0, 1.0)),
            num(x),
            num(y),
            num(w),
            num(h)
        );
    }

    /// Draws the document image into the box with lower-left `(x, y)`.
    pub fn image(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.uses_image = true;
        let _ = writeln!(
            self.content,
            "q {} 0 0 {} {} {} cm /Im1 Do Q",
            num(w),
            num(h),
            num(x),
            num(y)
        );
    }
}

// =============================================================================
// Document
// =============================================================================

/// A document under construction.
#[derive(Debug)]
pub struct Document<'f> {
    font: &'f Typeface,
    pages: Vec<Page<'f>>,
    image: Option<RgbImage>,
}

impl<'f> Document<'f> {
    pub fn new(font: &'f Typeface) -> Self {
        Document {
            font,
            pages: Vec::new(),
            image: None,
        }
    }

    /// A blank page in this document's face.
    pub fn page(&self, width: f32, height: f32) -> Page<'f> {
        Page::new(self.font, width, height)
    }

    /// Sets the image pages draw with [`Page::image`].
    pub fn set_image(&mut self, image: RgbImage) {
        self.image = Some(image);
    }

    pub fn image_size(&self) -> Option<(u32, u32)> {
        self.image.as_ref().map(|i| (i.width, i.height))
    }

    pub fn push_page(&mut self, page: Page<'f>) {
        self.pages.push(page);
    }

    /// Serializes the document.
    pub fn finish(self) -> Vec<u8> {
        let font = self.font;
        let mut pages = self.pages;
        if pages.is_empty() {
            pages.push(Page::new(font, A4_WIDTH, A4_HEIGHT));
        }

        let mut glyphs: BTreeMap<u16, char> = BTreeMap::new();
        for page in &pages {
            for (&glyph, &c) in &page.glyphs {
                glyphs.entry(glyph).or_insert(c);
            }
        }

        let mut out: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = Vec::new();

        out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        let image_id = self.image.as_ref().map(|_| 8usize);
        let first_page_id = if image_id.is_some() { 9 } else { 8 };
        let page_ids: Vec<usize> = (0..pages.len()).map(|i| first_page_id + i * 2).collect();

        // 1: catalog
        begin_object(&mut out, &mut offsets, 1);
        out.extend_from_slice(b"<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

        // 2: page tree
        begin_object(&mut out, &mut offsets, 2);
        let kids: Vec<String> = page_ids.iter().map(|id| format!("{id} 0 R")).collect();
        out.extend_from_slice(
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
                kids.join(" "),
                pages.len()
            )
            .as_bytes(),
        );

        write_font(&mut out, &mut offsets, font, &glyphs);

        // 8: image
        if let (Some(id), Some(image)) = (image_id, &self.image) {
            begin_object(&mut out, &mut offsets, id);
            out.extend_from_slice(
                format!(
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8 /Length {} >>\nstream\n",
                    image.width,
                    image.height,
                    image.pixels.len()
                )
                .as_bytes(),
            );
            out.extend_from_slice(&image.pixels);
            out.extend_from_slice(b"\nendstream\nendobj\n");
        }

        // pages + content streams
        for (page, page_id) in pages.iter().zip(&page_ids) {
            let content_id = page_id + 1;
            let xobject = match image_id {
                Some(id) if page.uses_image => format!(" /XObject << /Im1 {id} 0 R >>"),
                _ => String::new(),
            };

            begin_object(&mut out, &mut offsets, *page_id);
            out.extend_from_slice(
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                     /Resources << /Font << /F1 3 0 R >>{} >> /Contents {} 0 R >>\nendobj\n",
                    num(page.width),
                    num(page.height),
                    xobject,
                    content_id
                )
                .as_bytes(),
            );

            begin_object(&mut out, &mut offsets, content_id);
            out.extend_from_slice(
                format!("<< /Length {} >>\nstream\n", page.content.len()).as_bytes(),
            );
            out.extend_from_slice(page.content.as_bytes());
            out.extend_from_slice(b"\nendstream\nendobj\n");
        }

        let xref_offset = out.len();
        let size = offsets.len() + 1;
        let mut xref = format!("xref\n0 {size}\n0000000000 65535 f \n");
        for offset in &offsets {
            let _ = writeln!(xref, "{offset:010} 00000 n ");
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {size} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
        );
        out.extend_from_slice(xref.as_bytes());

        out
    }
}

/// Objects 3..=7: the composite font and everything it points at.
fn write_font(out: &mut Vec<u8>, offsets: &mut Vec<usize>, font: &Typeface, glyphs: &BTreeMap<u16, char>) {
    begin_object(out, offsets, 3);
    out.extend_from_slice(
        format!(
            "<< /Type /Font /Subtype /Type0 /BaseFont /{BASE_FONT} /Encoding /Identity-H \
             /DescendantFonts [4 0 R] /ToUnicode 5 0 R >>\nendobj\n"
        )
        .as_bytes(),
    );

    let mut widths = String::new();
    for &glyph in glyphs.keys() {
        let _ = write!(widths, "{} [{}] ", glyph, font.advance(GlyphId(glyph)).round() as i32);
    }
    begin_object(out, offsets, 4);
    out.extend_from_slice(
        format!(
            "<< /Type /Font /Subtype /CIDFontType2 /BaseFont /{BASE_FONT} \
             /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> \
             /FontDescriptor 6 0 R /CIDToGIDMap /Identity /DW 1000 /W [{}] >>\nendobj\n",
            widths.trim_end()
        )
        .as_bytes(),
    );

    let cmap = to_unicode_cmap(glyphs);
    begin_object(out, offsets, 5);
    out.extend_from_slice(format!("<< /Length {} >>\nstream\n", cmap.len()).as_bytes());
    out.extend_from_slice(cmap.as_bytes());
    out.extend_from_slice(b"\nendstream\nendobj\n");

    let face = &font.face;
    let bbox = face.global_bounding_box();
    let ascent = font.units(face.ascender());
    begin_object(out, offsets, 6);
    out.extend_from_slice(
        format!(
            "<< /Type /FontDescriptor /FontName /{BASE_FONT} /Flags 32 \
             /FontBBox [{} {} {} {}] /ItalicAngle 0 /Ascent {} /Descent {} \
             /CapHeight {} /StemV 80 /FontFile2 7 0 R >>\nendobj\n",
            font.units(bbox.x_min),
            font.units(bbox.y_min),
            font.units(bbox.x_max),
            font.units(bbox.y_max),
            ascent,
            font.units(face.descender()),
            face.capital_height().map_or(ascent, |h| font.units(h)),
        )
        .as_bytes(),
    );

    begin_object(out, offsets, 7);
    out.extend_from_slice(
        format!("<< /Length {0} /Length1 {0} >>\nstream\n", font.data.len()).as_bytes(),
    );
    out.extend_from_slice(font.data);
    out.extend_from_slice(b"\nendstream\nendobj\n");
}

/// Maps every used glyph back to its character.
fn to_unicode_cmap(glyphs: &BTreeMap<u16, char>) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );

    let entries: Vec<(&u16, &char)> = glyphs.iter().collect();
    // at most 100 entries per block
    for chunk in entries.chunks(100) {
        let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
        for (glyph, c) in chunk {
            let mut units = [0u16; 2];
            let utf16: String = c
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{u:04X}"))
                .collect();
            let _ = writeln!(cmap, "<{glyph:04X}> <{utf16}>");
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend");
    cmap
}

/// Records the byte offset of object `id`. Objects are written in id order.
fn begin_object(out: &mut Vec<u8>, offsets: &mut Vec<usize>, id: usize) {
    debug_assert_eq!(offsets.len() + 1, id);
    offsets.push(out.len());
    out.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
}

/// Numbers with at most two decimals and no trailing zeros.
fn num(value: f32) -> String {
    let s = format!("{value:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" || s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Keeps byte offsets: every non-ASCII byte becomes one `?`.
#[cfg(test)]
pub(crate) fn as_text(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect()
}

/// Every text run of a document, decoded through its ToUnicode map.
#[cfg(test)]
pub(crate) fn shown_text(pdf: &[u8]) -> Vec<String> {
    use std::collections::HashMap;

    let text = as_text(pdf);
    let mut to_unicode: HashMap<u16, String> = HashMap::new();
    let mut in_block = false;
    for line in text.lines() {
        if line.ends_with("beginbfchar") {
            in_block = true;
        } else if line == "endbfchar" {
            in_block = false;
        } else if in_block {
            let mut parts = line.split_whitespace();
            let (Some(glyph), Some(unicode)) = (parts.next(), parts.next()) else {
                continue;
            };
            let glyph = u16::from_str_radix(glyph.trim_matches(|c| c == '<' || c == '>'), 16).unwrap();
            let units: Vec<u16> = unicode
                .trim_matches(|c| c == '<' || c == '>')
                .as_bytes()
                .chunks(4)
                .map(|h| u16::from_str_radix(std::str::from_utf8(h).unwrap(), 16).unwrap())
                .collect();
            to_unicode.insert(glyph, String::from_utf16(&units).unwrap());
        }
    }

    text.lines()
        .filter(|l| l.starts_with("BT ") && l.ends_with("> Tj ET"))
        .map(|l| {
            let start = l.rfind('<').unwrap() + 1;
            let hex = &l[start..l.len() - "> Tj ET".len()];
            hex.as_bytes()
                .chunks(4)
                .map(|h| {
                    let glyph = u16::from_str_radix(std::str::from_utf8(h).unwrap(), 16).unwrap();
                    to_unicode.get(&glyph).cloned().unwrap_or_default()
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font() -> Typeface {
        Typeface::bundled().unwrap()
    }

    #[test]
    fn test_minimal_document_structure() {
        let font = font();
        let mut doc = Document::new(&font);
        let mut page = doc.page(A4_WIDTH, A4_HEIGHT);
        page.text(50.0, 800.0, 12.0, Weight::Bold, "Receipt (copy)");
        doc.push_page(page);

        let bytes = doc.finish();
        let text = as_text(&bytes);

        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(text.trim_end().ends_with("%%EOF"));
        assert!(text.contains("/Subtype /Type0 /BaseFont /DejaVuSans /Encoding /Identity-H"));
        assert!(text.contains("/FontFile2 7 0 R"));
        assert!(text.contains("2 Tr"));
        assert!(text.contains("/Count 1"));
        assert_eq!(shown_text(&bytes), vec!["Receipt (copy)".to_string()]);
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let font = font();
        let mut doc = Document::new(&font);
        doc.push_page(doc.page(100.0, 100.0));
        let bytes = doc.finish();
        let text = as_text(&bytes);

        let tail = text.rfind("startxref\n").unwrap() + "startxref\n".len();
        let xref_at: usize = text[tail..].lines().next().unwrap().parse().unwrap();
        assert!(text[xref_at..].starts_with("xref\n0 10\n"));

        let entries: Vec<usize> = text[xref_at..]
            .lines()
            .skip(3)
            .take_while(|l| l.ends_with(" n "))
            .map(|l| l[..10].parse().unwrap())
            .collect();

        assert_eq!(entries.len(), 9);
        for (i, offset) in entries.iter().enumerate() {
            let header = format!("{} 0 obj", i + 1);
            assert!(text[*offset..].starts_with(&header), "object {} misplaced", i + 1);
        }
    }

    #[test]
    fn test_image_object_and_reference() {
        let font = font();
        let mut doc = Document::new(&font);
        doc.set_image(RgbImage::new(2, 1, vec![255, 0, 0, 0, 0, 255]).unwrap());
        let mut page = doc.page(100.0, 100.0);
        page.image(10.0, 10.0, 20.0, 10.0);
        doc.push_page(page);

        let text = as_text(&doc.finish());
        assert!(text.contains("/Subtype /Image /Width 2 /Height 1"));
        assert!(text.contains("/XObject << /Im1 8 0 R >>"));
        assert!(text.contains("/Im1 Do"));
    }

    #[test]
    fn test_rgb_image_size_checked() {
        assert!(RgbImage::new(2, 2, vec![0; 12]).is_some());
        assert!(RgbImage::new(2, 2, vec![0; 11]).is_none());
        assert!(RgbImage::new(0, 2, vec![]).is_none());
    }

    #[test]
    fn test_cyrillic_text_keeps_its_glyphs() {
        let font = font();
        let sample = "Кава Лате, Іван Петренко, ґ є ї";
        assert!(sample.chars().all(|c| c == ' ' || c == ',' || font.covers(c)));

        let mut doc = Document::new(&font);
        let mut page = doc.page(A4_WIDTH, A4_HEIGHT);
        page.text(50.0, 800.0, 10.0, Weight::Regular, sample);
        doc.push_page(page);
        let bytes = doc.finish();
        let text = as_text(&bytes);

        assert!(text.contains(&format!("<{}> Tj", font.glyph_hex(sample))));
        assert!(!font.glyph_hex("К").is_empty());
        assert_ne!(font.glyph_hex("К"), font.glyph_hex("?"));
        assert!(text.contains(" <041A>\n"));
        assert_eq!(shown_text(&bytes), vec![sample.to_string()]);
    }

    #[test]
    fn test_uncovered_characters_fall_back() {
        let font = font();
        assert_eq!(font.glyph_hex("\u{10FFFD}"), font.glyph_hex("?"));
        assert_eq!(font.glyph_hex("\t"), font.glyph_hex(" "));
    }

    #[test]
    fn test_to_unicode_blocks_hold_at_most_100_entries() {
        let glyphs: BTreeMap<u16, char> = (0..250u16).map(|g| (g + 1, 'a')).collect();
        let cmap = to_unicode_cmap(&glyphs);
        assert!(cmap.contains("100 beginbfchar"));
        assert!(cmap.contains("50 beginbfchar"));
        assert_eq!(cmap.matches("endbfchar").count(), 3);
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(num(12.0), "12");
        assert_eq!(num(12.5), "12.5");
        assert_eq!(num(595.28), "595.28");
        assert_eq!(num(0.0), "0");
        assert_eq!(num(-0.001), "0");
    }

    #[test]
    fn test_text_metrics() {
        let font = font();
        assert!(font.text_width("0", 10.0) > 0.0);
        assert!(font.text_width("WWW", 10.0) > font.text_width("iii", 10.0));
        assert!(font.text_width("Щ", 10.0) > 0.0);

        let fitted = font.fit_text("A very long product name indeed", 60.0, 10.0);
        assert!(fitted.ends_with("..."));
        assert!(font.text_width(&fitted, 10.0) <= 60.0);
        assert_eq!(font.fit_text("Tea", 60.0, 10.0), "Tea");
        assert!(font.fit_text("Довга назва товару для чека", 60.0, 10.0).starts_with("Дов"));
    }
}
