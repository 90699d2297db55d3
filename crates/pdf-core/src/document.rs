//! PDF Document wrapper

use crate::font::{LoadedFont, StandardFont, TextMeasure};
use crate::image::{generate_image_operators, ImageXObject};
use crate::pages::{self, PageSelection};
use crate::text::{aligned_x, generate_text_operators, TextRenderContext};
use crate::{data_uri, Align, FontData, PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use tracing::debug;

/// A4 portrait in points, used when a page declares no MediaBox
const A4: [f64; 4] = [0.0, 0.0, 595.28, 841.89];

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }
}

/// PDF Document wrapper providing high-level operations
///
/// Drawing calls are buffered per page and written when the document is
/// serialized, so each touched page receives exactly one new content stream.
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Registered fonts by identifier
    fonts: BTreeMap<String, LoadedFont>,
    /// Current font identifier
    current_font: Option<String>,
    /// Current font size
    current_font_size: f32,
    /// Page font resources (page number -> font name -> resource name)
    page_font_resources: BTreeMap<usize, BTreeMap<String, String>>,
    /// Next font resource number
    next_font_resource: u32,
    /// Embedded images (data hash -> PDF object ID)
    embedded_images: HashMap<u64, ObjectId>,
    /// Page image resources (page number -> image name -> object ID)
    page_image_resources: BTreeMap<usize, BTreeMap<String, ObjectId>>,
    /// Next image resource number
    next_image_resource: u32,
    /// Buffered content operators per page (page number -> operators)
    page_content_buffer: BTreeMap<usize, Vec<u8>>,
}

impl PdfDocument {
    fn from_document(inner: Document) -> Self {
        Self {
            inner,
            fonts: BTreeMap::new(),
            current_font: None,
            current_font_size: 12.0,
            page_font_resources: BTreeMap::new(),
            next_font_resource: 1,
            embedded_images: HashMap::new(),
            page_image_resources: BTreeMap::new(),
            next_image_resource: 1,
            page_content_buffer: BTreeMap::new(),
        }
    }

    /// Open a PDF document from bytes
    ///
    /// # Arguments
    /// * `data` - PDF file bytes
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(data).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Ok(Self::from_document(inner))
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Register one of the built-in standard fonts
    ///
    /// # Example
    /// ```ignore
    /// doc.use_standard_font("body", StandardFont::Helvetica)?;
    /// doc.set_font("body", 12.0)?;
    /// ```
    pub fn use_standard_font(&mut self, name: &str, font: StandardFont) -> Result<()> {
        self.register_font(name, LoadedFont::Standard(font))
    }

    /// Add a TrueType font to the document
    ///
    /// # Arguments
    /// * `name` - Font identifier (used in set_font)
    /// * `ttf_data` - TrueType font file bytes
    pub fn add_font(&mut self, name: &str, ttf_data: &[u8]) -> Result<()> {
        if self.fonts.contains_key(name) {
            return Err(PdfError::FontAlreadyExists(name.to_string()));
        }
        let font_data = FontData::from_ttf(name, ttf_data)?;
        self.register_font(name, LoadedFont::TrueType(font_data))
    }

    fn register_font(&mut self, name: &str, font: LoadedFont) -> Result<()> {
        if self.fonts.contains_key(name) {
            return Err(PdfError::FontAlreadyExists(name.to_string()));
        }
        self.fonts.insert(name.to_string(), font);
        Ok(())
    }

    /// Set the current font and size
    pub fn set_font(&mut self, name: &str, size: f32) -> Result<()> {
        if !self.fonts.contains_key(name) {
            return Err(PdfError::FontNotFound(name.to_string()));
        }

        self.current_font = Some(name.to_string());
        self.current_font_size = size;

        Ok(())
    }

    /// Set only the font size (keeps the current font)
    pub fn set_font_size(&mut self, size: f32) -> Result<()> {
        if self.current_font.is_none() {
            return Err(PdfError::FontNotFound("No font set".to_string()));
        }

        self.current_font_size = size;
        Ok(())
    }

    /// The current font, usable as a [`TextMeasure`]
    pub fn current_font(&self) -> Result<&LoadedFont> {
        let name = self
            .current_font
            .as_ref()
            .ok_or_else(|| PdfError::FontNotFound("No font set".to_string()))?;
        self.fonts
            .get(name)
            .ok_or_else(|| PdfError::FontNotFound(name.clone()))
    }

    /// Width of `text` in points with the current font and size
    pub fn text_width(&self, text: &str) -> Result<f64> {
        Ok(self
            .current_font()?
            .text_width(text, self.current_font_size))
    }

    /// Page width and height in points
    ///
    /// Honors a MediaBox inherited from a parent Pages node and falls back to
    /// A4 when none is declared.
    pub fn page_size(&self, page: usize) -> Result<(f64, f64)> {
        let [x1, y1, x2, y2] = self.page_box(page)?;
        Ok((x2 - x1, y2 - y1))
    }

    /// Insert text at a specific position
    ///
    /// # Arguments
    /// * `text` - Text to insert
    /// * `page` - Page number (1-indexed)
    /// * `x` - Anchor X coordinate in points
    /// * `y` - Baseline Y coordinate in points (from top)
    /// * `align` - Which end of the text sits on the anchor
    pub fn insert_text(
        &mut self,
        text: &str,
        page: usize,
        x: f64,
        y: f64,
        align: Align,
    ) -> Result<()> {
        let page_id = self.page_id(page)?;

        // Skip empty text - nothing to render
        if text.is_empty() {
            return Ok(());
        }

        let font_name = self
            .current_font
            .clone()
            .ok_or_else(|| PdfError::FontNotFound("No font set".to_string()))?;
        let font_size = self.current_font_size;

        let (text_hex, text_width) = {
            let font = self
                .fonts
                .get_mut(&font_name)
                .ok_or_else(|| PdfError::FontNotFound(font_name.clone()))?;
            let text_hex = font.encode_text_hex(text)?;
            font.add_chars(text);
            (text_hex, font.text_width(text, font_size))
        };

        let font_resource_name = self.get_or_create_font_ref(&font_name, page);

        // Convert Y coordinate from top-origin to PDF bottom-origin
        let top = self.page_box_by_id(page_id)?[3];
        let pdf_y = top - y;
        let start_x = aligned_x(x, text_width, align);

        let ctx = TextRenderContext {
            font_name: font_resource_name,
            font_size,
            color: Color::black(),
        };
        let operators = generate_text_operators(&text_hex, start_x, pdf_y, &ctx);
        self.buffer_content(page, &operators);

        debug!(page, x = start_x, y = pdf_y, size = font_size, "text queued");
        Ok(())
    }

    /// Insert an image at a specific position, stretched to the given size
    ///
    /// # Arguments
    /// * `data` - Image file bytes (JPEG or PNG)
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate in points
    /// * `y` - Y coordinate of the upper edge in points (from top)
    /// * `width` - Image width in points
    /// * `height` - Image height in points
    pub fn insert_image(
        &mut self,
        data: &[u8],
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        let page_id = self.page_id(page)?;
        let image_resource_name = self.get_or_create_image_ref(data, page)?;

        // Convert Y coordinate from top-origin to PDF bottom-origin
        let top = self.page_box_by_id(page_id)?[3];
        let pdf_y = top - y - height;

        let operators = generate_image_operators(&image_resource_name, x, pdf_y, width, height);
        self.buffer_content(page, &operators);

        debug!(page, width, height, "image queued");
        Ok(())
    }

    /// Add a blank page of the given size at the end of the document
    ///
    /// # Returns
    /// New page number (1-indexed)
    pub fn add_blank_page(&mut self, width: f64, height: f64) -> Result<usize> {
        let contents_id = self
            .inner
            .add_object(Object::Stream(Stream::new(Dictionary::new(), vec![])));

        let mut page_dict = Dictionary::new();
        page_dict.set(b"Type", Object::Name(b"Page".to_vec()));
        page_dict.set(
            b"MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width as f32),
                Object::Real(height as f32),
            ]),
        );
        page_dict.set(b"Resources", Object::Dictionary(Dictionary::new()));
        page_dict.set(b"Contents", Object::Reference(contents_id));

        let new_page_id = self.inner.add_object(Object::Dictionary(page_dict));
        pages::push_pages(&mut self.inner, &[new_page_id])?;

        let page = self.page_count();
        debug!(page, width, height, "blank page added");
        Ok(page)
    }

    /// Append pages of another PDF to the end of this document
    ///
    /// # Returns
    /// Number of pages appended
    pub fn append_pages(&mut self, data: &[u8], selection: PageSelection) -> Result<usize> {
        let source = Document::load_mem(data).map_err(|e| PdfError::OpenError(e.to_string()))?;
        let appended = pages::append_pages(&mut self.inner, source, selection)?;

        debug!(count = appended.len(), ?selection, "pages appended");
        Ok(appended.len())
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.finalize()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        Ok(buffer)
    }

    /// Save the document as a `data:application/pdf;base64,` URI
    pub fn to_data_uri(&mut self) -> Result<String> {
        Ok(data_uri(&self.to_bytes()?))
    }

    /// Write buffered content streams and font resources into the document
    fn finalize(&mut self) -> Result<()> {
        self.flush_content_buffers()?;
        self.embed_fonts()
    }

    /// Embed every font referenced from a page and wire it into page resources
    fn embed_fonts(&mut self) -> Result<()> {
        let page_resources = std::mem::take(&mut self.page_font_resources);

        let mut embedded: BTreeMap<String, ObjectId> = BTreeMap::new();
        for font_name in page_resources.values().flat_map(|fonts| fonts.keys()) {
            if !embedded.contains_key(font_name) {
                let id = self.embed_font_object(font_name)?;
                embedded.insert(font_name.clone(), id);
            }
        }

        for (page, fonts) in page_resources {
            let entries: Vec<(String, ObjectId)> = fonts
                .into_iter()
                .map(|(font_name, resource_name)| (resource_name, embedded[&font_name]))
                .collect();
            self.add_page_resources(page, b"Font", &entries)?;
        }

        Ok(())
    }

    /// Embed a single font object into the PDF
    fn embed_font_object(&mut self, font_name: &str) -> Result<ObjectId> {
        let font = self
            .fonts
            .get(font_name)
            .ok_or_else(|| PdfError::FontNotFound(font_name.to_string()))?;

        let font_data = match font {
            LoadedFont::Standard(standard) => {
                let dict = standard.to_pdf_dict();
                return Ok(self.inner.add_object(dict));
            }
            LoadedFont::TrueType(font_data) => font_data,
        };

        let font_objects = font_data.to_pdf_objects();

        let font_file_id = self.inner.add_object(font_objects.font_file_stream);

        let mut font_descriptor = font_objects.font_descriptor;
        font_descriptor.set("FontFile2", Object::Reference(font_file_id));
        let font_descriptor_id = self.inner.add_object(font_descriptor);

        let mut cid_font = font_objects.cid_font;
        cid_font.set("FontDescriptor", Object::Reference(font_descriptor_id));
        let cid_font_id = self.inner.add_object(cid_font);

        let mut type0_font = font_objects.type0_font;
        type0_font.set(
            "DescendantFonts",
            Object::Array(vec![Object::Reference(cid_font_id)]),
        );

        let tounicode_id = self.inner.add_object(font_objects.tounicode_stream);
        type0_font.set("ToUnicode", Object::Reference(tounicode_id));

        Ok(self.inner.add_object(type0_font))
    }

    /// Get or create the resource name (e.g., "F1") of a font on a page
    ///
    /// The font object itself is embedded at save time.
    fn get_or_create_font_ref(&mut self, font_name: &str, page: usize) -> String {
        let page_resources = self.page_font_resources.entry(page).or_default();

        if let Some(resource_name) = page_resources.get(font_name) {
            return resource_name.clone();
        }

        let resource_name = format!("F{}", self.next_font_resource);
        self.next_font_resource += 1;
        page_resources.insert(font_name.to_string(), resource_name.clone());

        resource_name
    }

    /// Get or create an image reference for a specific page
    ///
    /// Returns the resource name (e.g., "Im1") and original pixel dimensions.
    /// Images are deduplicated by hash of their data.
    fn get_or_create_image_ref(&mut self, data: &[u8], page: usize) -> Result<String> {
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        let data_hash = hasher.finish();

        let object_id = match self.embedded_images.get(&data_hash) {
            Some(&object_id) => object_id,
            None => {
                let xobject = ImageXObject::from_bytes(data)?;
                let object_id = self.inner.add_object(xobject.to_pdf_stream());
                self.embedded_images.insert(data_hash, object_id);
                object_id
            }
        };

        let page_resources = self.page_image_resources.entry(page).or_default();
        if let Some((name, _)) = page_resources.iter().find(|(_, id)| **id == object_id) {
            return Ok(name.clone());
        }

        let resource_name = format!("Im{}", self.next_image_resource);
        self.next_image_resource += 1;
        page_resources.insert(resource_name.clone(), object_id);

        self.add_page_resources(page, b"XObject", &[(resource_name.clone(), object_id)])?;

        Ok(resource_name)
    }

    /// Add named references to one category of a page's Resources
    ///
    /// Resources that are inherited or stored behind a reference are copied
    /// onto the page first, so shared resource dictionaries are never touched.
    fn add_page_resources(
        &mut self,
        page: usize,
        category: &[u8],
        entries: &[(String, ObjectId)],
    ) -> Result<()> {
        let page_id = self.page_id(page)?;

        let mut resources = pages::inherited_attribute(&self.inner, page_id, b"Resources")
            .map(|obj| self.resolve_dict(&obj))
            .unwrap_or_default();
        let mut category_dict = resources
            .get(category)
            .map(|obj| self.resolve_dict(obj))
            .unwrap_or_default();

        for (resource_name, object_id) in entries {
            category_dict.set(resource_name.as_bytes(), Object::Reference(*object_id));
        }
        resources.set(category, Object::Dictionary(category_dict));

        let page_dict = self
            .inner
            .get_object_mut(page_id)?
            .as_dict_mut()
            .map_err(|_| PdfError::SaveError("Page object is not a dictionary".to_string()))?;
        page_dict.set(b"Resources", Object::Dictionary(resources));

        Ok(())
    }

    /// Clone a dictionary, following one level of indirection
    fn resolve_dict(&self, obj: &Object) -> Dictionary {
        match obj {
            Object::Dictionary(dict) => dict.clone(),
            Object::Reference(id) => self
                .inner
                .get_object(*id)
                .and_then(Object::as_dict)
                .cloned()
                .unwrap_or_default(),
            _ => Dictionary::new(),
        }
    }

    fn page_id(&self, page: usize) -> Result<ObjectId> {
        let pages = self.inner.get_pages();
        if page == 0 {
            return Err(PdfError::InvalidPage(page, pages.len()));
        }
        pages
            .get(&(page as u32))
            .copied()
            .ok_or(PdfError::InvalidPage(page, pages.len()))
    }

    fn page_box(&self, page: usize) -> Result<[f64; 4]> {
        let page_id = self.page_id(page)?;
        self.page_box_by_id(page_id)
    }

    /// MediaBox (or CropBox) as `[x1, y1, x2, y2]`
    fn page_box_by_id(&self, page_id: ObjectId) -> Result<[f64; 4]> {
        let media_box = pages::inherited_attribute(&self.inner, page_id, b"MediaBox")
            .or_else(|| pages::inherited_attribute(&self.inner, page_id, b"CropBox"));

        let Some(media_box) = media_box else {
            return Ok(A4);
        };

        let array = match media_box {
            Object::Array(arr) => arr,
            Object::Reference(ref_id) => self
                .inner
                .get_object(ref_id)?
                .as_array()
                .map_err(|_| PdfError::ParseError("MediaBox reference is not an array".to_string()))?
                .clone(),
            _ => return Err(PdfError::ParseError("MediaBox is not an array".to_string())),
        };

        if array.len() < 4 {
            return Err(PdfError::ParseError("Invalid MediaBox format".to_string()));
        }

        let mut values = [0.0; 4];
        for (value, obj) in values.iter_mut().zip(&array) {
            *value = number(obj)
                .ok_or_else(|| PdfError::ParseError("Invalid MediaBox value".to_string()))?;
        }
        Ok(values)
    }

    /// Buffer content operators for a page (written at save time)
    fn buffer_content(&mut self, page: usize, content: &[u8]) {
        self.page_content_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(content);
    }

    /// Flush all buffered content to page streams
    fn flush_content_buffers(&mut self) -> Result<()> {
        let buffers = std::mem::take(&mut self.page_content_buffer);

        for (page, content) in buffers {
            if !content.is_empty() {
                self.append_to_content_stream(page, content)?;
            }
        }

        Ok(())
    }

    /// Append content to a page as an extra content stream
    ///
    /// Existing streams are kept as they are (compressed or not). They are
    /// wrapped in `q`/`Q` so graphics state they leave behind does not leak
    /// into the appended operators.
    fn append_to_content_stream(&mut self, page: usize, content: Vec<u8>) -> Result<()> {
        let page_id = self.page_id(page)?;

        let existing: Vec<Object> = {
            let page_dict = self
                .inner
                .get_object(page_id)?
                .as_dict()
                .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?;

            match page_dict.get(b"Contents") {
                Ok(Object::Reference(id)) => match self.inner.get_object(*id) {
                    Ok(Object::Array(arr)) => arr.clone(),
                    _ => vec![Object::Reference(*id)],
                },
                Ok(Object::Array(arr)) => arr.clone(),
                _ => Vec::new(),
            }
        };

        let mut contents = Vec::with_capacity(existing.len() + 2);
        let new_content = if existing.is_empty() {
            content
        } else {
            let save_id = self
                .inner
                .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            contents.push(Object::Reference(save_id));
            contents.extend(existing);

            let mut restored = b"Q\n".to_vec();
            restored.extend_from_slice(&content);
            restored
        };

        let stream_id = self
            .inner
            .add_object(Stream::new(Dictionary::new(), new_content));
        contents.push(Object::Reference(stream_id));

        let page_dict = self
            .inner
            .get_object_mut(page_id)?
            .as_dict_mut()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?;
        page_dict.set(b"Contents", Object::Array(contents));

        Ok(())
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;
    use pretty_assertions::assert_eq;

    /// Single-page document whose page inherits a Letter MediaBox and keeps
    /// its Resources behind a reference
    fn letter_template() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let resources_id = doc.add_object(dictionary! {
            "ProcSet" => vec![Object::Name(b"PDF".to_vec())],
        });
        let content_id = doc.add_object(Stream::new(dictionary! {}, b"0 0 m 10 10 l S".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn page_dict(doc: &Document, page: u32) -> Dictionary {
        let id = doc.get_pages()[&page];
        doc.get_object(id).unwrap().as_dict().unwrap().clone()
    }

    #[test]
    fn test_page_size_inherited() {
        let doc = PdfDocument::open_from_bytes(&letter_template()).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.page_size(1).unwrap(), (612.0, 792.0));
        assert!(matches!(doc.page_size(2), Err(PdfError::InvalidPage(2, 1))));
    }

    #[test]
    fn test_open_garbage() {
        assert!(matches!(
            PdfDocument::open_from_bytes(b"not a pdf"),
            Err(PdfError::OpenError(_))
        ));
    }

    #[test]
    fn test_font_registration() {
        let mut doc = PdfDocument::open_from_bytes(&letter_template()).unwrap();
        assert!(matches!(doc.set_font_size(10.0), Err(PdfError::FontNotFound(_))));
        assert!(matches!(doc.set_font("body", 10.0), Err(PdfError::FontNotFound(_))));

        doc.use_standard_font("body", StandardFont::Helvetica).unwrap();
        assert!(matches!(
            doc.use_standard_font("body", StandardFont::Courier),
            Err(PdfError::FontAlreadyExists(_))
        ));

        doc.set_font("body", 10.0).unwrap();
        doc.set_font_size(8.0).unwrap();
        assert!((doc.text_width("Hello").unwrap() - 18.224).abs() < 1e-6);
    }

    #[test]
    fn test_insert_text_writes_stream_and_font() {
        let mut doc = PdfDocument::open_from_bytes(&letter_template()).unwrap();
        doc.use_standard_font("body", StandardFont::Helvetica).unwrap();
        doc.set_font("body", 12.0).unwrap();
        doc.insert_text("Hi", 1, 100.0, 92.0, Align::Left).unwrap();
        doc.insert_text("", 1, 100.0, 92.0, Align::Left).unwrap();

        let bytes = doc.to_bytes().unwrap();
        let saved = Document::load_mem(&bytes).unwrap();
        let page = page_dict(&saved, 1);

        // Original stream is kept, wrapped by q / Q
        let contents = page.get(b"Contents").unwrap().as_array().unwrap();
        assert_eq!(contents.len(), 3);

        let content = saved.get_page_content(saved.get_pages()[&1]).unwrap();
        let text = String::from_utf8_lossy(&content);
        assert!(text.contains("0 0 m 10 10 l S"));
        assert!(text.contains("/F1 12 Tf"));
        assert!(text.contains("100 700 Td"));
        assert!(text.contains("<4869> Tj"));
        assert_eq!(text.matches(" Tj").count(), 1);

        // Resources were copied off the shared reference and extended
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        assert!(resources.get(b"ProcSet").is_ok());
        let font_ref = resources
            .get(b"Font")
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"F1")
            .unwrap()
            .as_reference()
            .unwrap();
        let font = saved.get_object(font_ref).unwrap().as_dict().unwrap();
        assert_eq!(font.get(b"BaseFont").unwrap().as_name().unwrap(), b"Helvetica");
    }

    #[test]
    fn test_insert_text_rejects_unencodable_standard_text() {
        let mut doc = PdfDocument::open_from_bytes(&letter_template()).unwrap();
        doc.use_standard_font("body", StandardFont::Helvetica).unwrap();
        doc.set_font("body", 12.0).unwrap();

        let err = doc
            .insert_text("Łukasz Żółć", 1, 100.0, 92.0, Align::Left)
            .unwrap_err();
        assert!(matches!(err, PdfError::UnencodableText { character: 'Ł', .. }));
        assert!(doc.page_content_buffer.is_empty());

        doc.insert_text("Renée – café", 1, 100.0, 92.0, Align::Left)
            .unwrap();
        assert_eq!(doc.page_content_buffer.len(), 1);
    }

    #[test]
    fn test_insert_text_alignment() {
        let mut doc = PdfDocument::open_from_bytes(&letter_template()).unwrap();
        doc.use_standard_font("body", StandardFont::Courier).unwrap();
        doc.set_font("body", 10.0).unwrap();
        // Courier: 4 chars x 6pt = 24pt
        doc.insert_text("ABCD", 1, 100.0, 92.0, Align::Right).unwrap();
        doc.insert_text("ABCD", 1, 100.0, 192.0, Align::Center).unwrap();

        let bytes = doc.to_bytes().unwrap();
        let saved = Document::load_mem(&bytes).unwrap();
        let content = saved.get_page_content(saved.get_pages()[&1]).unwrap();
        let text = String::from_utf8_lossy(&content);
        assert!(text.contains("76 700 Td"));
        assert!(text.contains("88 600 Td"));
    }

    #[test]
    fn test_insert_text_invalid_page() {
        let mut doc = PdfDocument::open_from_bytes(&letter_template()).unwrap();
        doc.use_standard_font("body", StandardFont::Helvetica).unwrap();
        doc.set_font("body", 12.0).unwrap();
        assert!(matches!(
            doc.insert_text("x", 0, 0.0, 0.0, Align::Left),
            Err(PdfError::InvalidPage(0, 1))
        ));
        assert!(matches!(
            doc.insert_text("x", 3, 0.0, 0.0, Align::Left),
            Err(PdfError::InvalidPage(3, 1))
        ));
    }

    #[test]
    fn test_add_blank_page() {
        let mut doc = PdfDocument::open_from_bytes(&letter_template()).unwrap();
        let page = doc.add_blank_page(300.0, 400.0).unwrap();
        assert_eq!(page, 2);
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.page_size(2).unwrap(), (300.0, 400.0));

        let dict = page_dict(&doc.inner, 2);
        assert!(dict.get(b"Parent").is_ok());
    }

    #[test]
    fn test_append_pages_and_reopen() {
        let mut doc = PdfDocument::open_from_bytes(&letter_template()).unwrap();
        let added = doc
            .append_pages(&letter_template(), PageSelection::All)
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.page_size(2).unwrap(), (612.0, 792.0));

        let bytes = doc.to_bytes().unwrap();
        assert_eq!(Document::load_mem(&bytes).unwrap().get_pages().len(), 2);
    }

    #[test]
    fn test_append_pages_rejects_garbage() {
        let mut doc = PdfDocument::open_from_bytes(&letter_template()).unwrap();
        assert!(matches!(
            doc.append_pages(b"%PDF-garbage", PageSelection::All),
            Err(PdfError::OpenError(_))
        ));
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn test_to_data_uri() {
        let mut doc = PdfDocument::open_from_bytes(&letter_template()).unwrap();
        let uri = doc.to_data_uri().unwrap();
        assert!(uri.starts_with("data:application/pdf;base64,JVBERi0"));
    }
}
