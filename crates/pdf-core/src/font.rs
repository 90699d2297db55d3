//! Font handling for PDF documents
//!
//! Two kinds of fonts can be used to draw text:
//! - the PDF base-14 standard fonts (no embedding, metrics built in)
//! - TrueType fonts embedded as Type0/CIDFontType2 with Identity-H encoding

use crate::{PdfError, Result};
use lopdf::{Dictionary, Object, Stream};
use std::collections::HashSet;

/// Capability to measure the rendered width of a string
///
/// This is the only thing the layout code needs to know about a font.
pub trait TextMeasure {
    /// Width of `text` in points when drawn at `font_size`
    fn text_width(&self, text: &str, font_size: f32) -> f64;
}

/// Standard (non-embedded) PDF fonts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StandardFont {
    #[default]
    Helvetica,
    Courier,
}

/// Helvetica advance widths (1/1000 em) for U+0020..=U+007E
const HELVETICA_ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // :;<=>?@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // [\]^_`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // {|}~
];

/// Helvetica advance widths for WinAnsi bytes 0xA0..=0xFF
const HELVETICA_LATIN1_WIDTHS: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333, // A0-AF
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611, // B0-BF
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // C0-CF
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // D0-DF
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, // E0-EF
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500, // F0-FF
];

/// WinAnsi 0x80..=0x9F: code point, byte and Helvetica width
const WIN_ANSI_SPECIALS: [(char, u8, u16); 27] = [
    ('\u{20AC}', 0x80, 556),
    ('\u{201A}', 0x82, 222),
    ('\u{0192}', 0x83, 556),
    ('\u{201E}', 0x84, 333),
    ('\u{2026}', 0x85, 1000),
    ('\u{2020}', 0x86, 556),
    ('\u{2021}', 0x87, 556),
    ('\u{02C6}', 0x88, 333),
    ('\u{2030}', 0x89, 1000),
    ('\u{0160}', 0x8A, 667),
    ('\u{2039}', 0x8B, 333),
    ('\u{0152}', 0x8C, 1000),
    ('\u{017D}', 0x8E, 611),
    ('\u{2018}', 0x91, 222),
    ('\u{2019}', 0x92, 222),
    ('\u{201C}', 0x93, 333),
    ('\u{201D}', 0x94, 333),
    ('\u{2022}', 0x95, 350),
    ('\u{2013}', 0x96, 556),
    ('\u{2014}', 0x97, 1000),
    ('\u{02DC}', 0x98, 333),
    ('\u{2122}', 0x99, 1000),
    ('\u{0161}', 0x9A, 500),
    ('\u{203A}', 0x9B, 333),
    ('\u{0153}', 0x9C, 944),
    ('\u{017E}', 0x9E, 500),
    ('\u{0178}', 0x9F, 667),
];

impl StandardFont {
    /// PostScript name used as /BaseFont
    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::Courier => "Courier",
        }
    }

    /// Advance width of a character in 1/1000 em
    ///
    /// Characters without a WinAnsi byte measure as a digit; they cannot be
    /// drawn anyway.
    fn char_width(&self, c: char) -> u16 {
        match self {
            StandardFont::Courier => 600,
            StandardFont::Helvetica => match Self::win_ansi_byte(c) {
                Some(byte @ 0x20..=0x7E) => HELVETICA_ASCII_WIDTHS[(byte - 0x20) as usize],
                Some(byte @ 0xA0..=0xFF) => HELVETICA_LATIN1_WIDTHS[(byte - 0xA0) as usize],
                Some(byte) => WIN_ANSI_SPECIALS
                    .iter()
                    .find(|(_, b, _)| *b == byte)
                    .map_or(556, |(_, _, width)| *width),
                None => 556,
            },
        }
    }

    /// Map a character to its WinAnsiEncoding byte
    fn win_ansi_byte(c: char) -> Option<u8> {
        let code = c as u32;
        if (0x20..=0x7E).contains(&code) || (0xA0..=0xFF).contains(&code) {
            return Some(code as u8);
        }
        WIN_ANSI_SPECIALS
            .iter()
            .find(|(ch, _, _)| *ch == c)
            .map(|(_, byte, _)| *byte)
    }

    /// Encode text as a hex string for the Tj operator
    ///
    /// Fails on the first character WinAnsiEncoding cannot represent. Such
    /// text needs an embedded TrueType font.
    pub fn encode_text_hex(&self, text: &str) -> Result<String> {
        let mut result = String::with_capacity(text.len() * 2 + 2);
        result.push('<');
        for c in text.chars() {
            let byte = Self::win_ansi_byte(c).ok_or_else(|| PdfError::UnencodableText {
                character: c,
                font: self.base_font().to_string(),
            })?;
            result.push_str(&format!("{byte:02X}"));
        }
        result.push('>');
        Ok(result)
    }

    /// Font dictionary for this standard font
    pub fn to_pdf_dict(&self) -> Dictionary {
        Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "Type1".into()),
            ("BaseFont", Object::Name(self.base_font().as_bytes().to_vec())),
            ("Encoding", "WinAnsiEncoding".into()),
        ])
    }
}

impl TextMeasure for StandardFont {
    fn text_width(&self, text: &str, font_size: f32) -> f64 {
        let units: u32 = text.chars().map(|c| self.char_width(c) as u32).sum();
        units as f64 / 1000.0 * font_size as f64
    }
}

/// Font data structure for embedded TrueType fonts
#[derive(Debug, Clone)]
pub struct FontData {
    /// Font name/identifier
    pub name: String,
    /// Raw TTF data
    pub ttf_data: Vec<u8>,
    /// Characters used (for the widths array and ToUnicode map)
    pub used_chars: HashSet<char>,
    /// Parsed font face
    face: Option<ttf_parser::Face<'static>>,
}

/// PDF objects generated for font embedding
pub struct FontObjects {
    /// Type0 font dictionary
    pub type0_font: Dictionary,
    /// CIDFont Type2 dictionary
    pub cid_font: Dictionary,
    /// Font descriptor dictionary
    pub font_descriptor: Dictionary,
    /// Font file stream (TTF data)
    pub font_file_stream: Stream,
    /// ToUnicode CMap stream
    pub tounicode_stream: Stream,
}

impl FontData {
    /// Create font data from TTF bytes
    ///
    /// # Arguments
    /// * `name` - Font identifier
    /// * `ttf_data` - TrueType font file bytes
    pub fn from_ttf(name: &str, ttf_data: &[u8]) -> Result<Self> {
        let data = ttf_data.to_vec();

        // The face borrows its bytes for the document lifetime
        let static_data: &'static [u8] = Box::leak(data.clone().into_boxed_slice());

        let face = ttf_parser::Face::parse(static_data, 0)
            .map_err(|e| PdfError::FontParseError(format!("{e:?}")))?;

        Ok(Self {
            name: name.to_string(),
            ttf_data: data,
            used_chars: HashSet::new(),
            face: Some(face),
        })
    }

    /// Add characters to the used set
    pub fn add_chars(&mut self, text: &str) {
        self.used_chars.extend(text.chars());
    }

    /// Get glyph ID for a character
    pub fn glyph_id(&self, c: char) -> Option<u16> {
        self.face
            .as_ref()
            .and_then(|face| face.glyph_index(c).map(|id| id.0))
    }

    /// Get glyph advance width in font units
    pub fn glyph_advance(&self, c: char) -> Option<u16> {
        self.face.as_ref().and_then(|face| {
            let glyph_id = face.glyph_index(c)?;
            face.glyph_hor_advance(glyph_id)
        })
    }

    /// Get font units per em
    pub fn units_per_em(&self) -> u16 {
        self.face
            .as_ref()
            .map(|face| face.units_per_em())
            .unwrap_or(1000)
    }

    /// Get font ascender
    pub fn ascender(&self) -> i16 {
        self.face
            .as_ref()
            .map(|face| face.ascender())
            .unwrap_or(800)
    }

    /// Get font descender
    pub fn descender(&self) -> i16 {
        self.face
            .as_ref()
            .map(|face| face.descender())
            .unwrap_or(-200)
    }

    /// Calculate text width in font units
    pub fn text_width_units(&self, text: &str) -> u32 {
        text.chars()
            .filter_map(|c| self.glyph_advance(c))
            .map(|w| w as u32)
            .sum()
    }

    /// Encode text as glyph-id hex string for the Tj operator
    pub fn encode_text_hex(&self, text: &str) -> String {
        let mut result = String::new();
        for c in text.chars() {
            let gid = self.glyph_id(c).unwrap_or(0);
            result.push_str(&format!("{gid:04X}"));
        }
        format!("<{result}>")
    }

    /// Generate all PDF objects needed to embed this font
    ///
    /// Object references between the returned dictionaries are placeholders;
    /// the document fills them in when the objects are added.
    pub fn to_pdf_objects(&self) -> FontObjects {
        let font_name = Object::Name(self.name.clone().into_bytes());

        let tounicode_content = self.generate_tounicode_cmap();
        let tounicode_stream = Stream::new(
            Dictionary::from_iter(vec![("Type", "CMap".into())]),
            tounicode_content.into_bytes(),
        );

        let font_file_stream = Stream::new(
            Dictionary::from_iter(vec![("Length1", (self.ttf_data.len() as i64).into())]),
            self.ttf_data.clone(),
        );

        let units_per_em = self.units_per_em() as i64;
        let ascender = self.ascender() as i64;
        let descender = self.descender() as i64;

        let font_descriptor = Dictionary::from_iter(vec![
            ("Type", "FontDescriptor".into()),
            ("FontName", font_name.clone()),
            ("Flags", 4.into()),
            (
                "FontBBox",
                vec![0.into(), descender.into(), units_per_em.into(), ascender.into()].into(),
            ),
            ("ItalicAngle", 0.into()),
            ("Ascent", ascender.into()),
            ("Descent", descender.into()),
            ("CapHeight", ascender.into()),
            ("StemV", 80.into()),
            ("FontFile2", Object::Reference((0, 0))),
        ]);

        let cid_system_info = Dictionary::from_iter(vec![
            ("Registry", Object::string_literal("Adobe")),
            ("Ordering", Object::string_literal("Identity")),
            ("Supplement", 0.into()),
        ]);

        let cid_font = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "CIDFontType2".into()),
            ("BaseFont", font_name.clone()),
            ("CIDSystemInfo", cid_system_info.into()),
            ("FontDescriptor", Object::Reference((0, 0))),
            ("W", self.generate_widths_array().into()),
            ("DW", 1000.into()),
        ]);

        let type0_font = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "Type0".into()),
            ("BaseFont", font_name),
            ("Encoding", "Identity-H".into()),
            ("DescendantFonts", vec![Object::Reference((0, 0))].into()),
            ("ToUnicode", Object::Reference((0, 0))),
        ]);

        FontObjects {
            type0_font,
            cid_font,
            font_descriptor,
            font_file_stream,
            tounicode_stream,
        }
    }

    /// Generate /W array for the glyphs in use, scaled to 1/1000 em
    fn generate_widths_array(&self) -> Vec<Object> {
        let mut widths = Vec::new();
        let Some(face) = &self.face else {
            return widths;
        };

        let mut gids: Vec<u16> = self
            .used_chars
            .iter()
            .filter_map(|&c| self.glyph_id(c))
            .collect();
        gids.sort_unstable();
        gids.dedup();

        let scale = 1000.0 / self.units_per_em() as f64;
        for gid in gids {
            let advance = face
                .glyph_hor_advance(ttf_parser::GlyphId(gid))
                .unwrap_or(0);
            widths.push((gid as i64).into());
            widths.push(vec![((advance as f64 * scale).round() as i64).into()].into());
        }

        widths
    }

    /// Generate ToUnicode CMap stream content
    fn generate_tounicode_cmap(&self) -> String {
        let mut cmap = String::new();

        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n");
        cmap.push_str("<0000> <FFFF>\n");
        cmap.push_str("endcodespacerange\n");

        let mut char_list: Vec<char> = self.used_chars.iter().copied().collect();
        char_list.sort_by_key(|c| *c as u32);

        // bfchar sections are limited to 100 entries each
        for chunk in char_list.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for c in chunk {
                let gid = self.glyph_id(*c).unwrap_or(0);
                let unicode = *c as u32;
                cmap.push_str(&format!("<{gid:04X}> <{unicode:04X}>\n"));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\n");
        cmap.push_str("end\n");

        cmap
    }
}

impl TextMeasure for FontData {
    fn text_width(&self, text: &str, font_size: f32) -> f64 {
        let width = self.text_width_units(text) as f64;
        width / self.units_per_em() as f64 * font_size as f64
    }
}

/// A font registered with a document
#[derive(Debug, Clone)]
pub enum LoadedFont {
    Standard(StandardFont),
    TrueType(FontData),
}

impl LoadedFont {
    /// Encode text for the Tj operator using this font's encoding
    pub fn encode_text_hex(&self, text: &str) -> Result<String> {
        match self {
            LoadedFont::Standard(font) => font.encode_text_hex(text),
            LoadedFont::TrueType(font) => Ok(font.encode_text_hex(text)),
        }
    }

    /// Record characters drawn with this font
    pub fn add_chars(&mut self, text: &str) {
        if let LoadedFont::TrueType(font) = self {
            font.add_chars(text);
        }
    }
}

impl TextMeasure for LoadedFont {
    fn text_width(&self, text: &str, font_size: f32) -> f64 {
        match self {
            LoadedFont::Standard(font) => font.text_width(text, font_size),
            LoadedFont::TrueType(font) => font.text_width(text, font_size),
        }
    }
}
