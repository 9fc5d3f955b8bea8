//! Builders for extraction results and file selections.

#![allow(dead_code)]

use serde_json::{json, Value};
use tailormate::extraction::ExtractionResult;
use tailormate::intake::SelectedFile;

/// Builder for `ExtractionResult`. Structured fields go through the same
/// deserializer the extraction client uses.
pub struct ResultBuilder {
    file_name: String,
    raw_text: String,
    structured: serde_json::Map<String, Value>,
}

impl ResultBuilder {
    pub fn new(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            raw_text: String::new(),
            structured: serde_json::Map::new(),
        }
    }

    pub fn raw_text(mut self, text: &str) -> Self {
        self.raw_text = text.to_string();
        self
    }

    pub fn full_name(mut self, name: &str) -> Self {
        self.structured.insert("full_name".to_string(), json!(name));
        self
    }

    pub fn email(mut self, email: &str) -> Self {
        self.structured.insert("email".to_string(), json!(email));
        self
    }

    pub fn measurements(mut self, measurements: Value) -> Self {
        self.structured
            .insert("measurements".to_string(), measurements);
        self
    }

    pub fn notes(mut self, notes: &[&str]) -> Self {
        self.structured.insert("notes".to_string(), json!(notes));
        self
    }

    pub fn order_items(mut self, items: Value) -> Self {
        self.structured.insert("order_items".to_string(), items);
        self
    }

    pub fn build(self) -> ExtractionResult {
        serde_json::from_value(json!({
            "fileName": self.file_name,
            "rawText": self.raw_text,
            "structured": Value::Object(self.structured),
        }))
        .expect("Invalid extraction result")
    }
}

/// A small valid PNG so previews are exercised.
pub fn png_bytes() -> Vec<u8> {
    let image = image::RgbImage::from_pixel(4, 3, image::Rgb([200, 180, 160]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("Failed to encode test PNG");
    bytes
}

pub fn image_file(name: &str) -> SelectedFile {
    SelectedFile::new(name, png_bytes())
}

pub fn pdf_file(name: &str) -> SelectedFile {
    SelectedFile::new(name, b"%PDF-1.4 order form".to_vec())
}
