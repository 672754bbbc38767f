//! Document text annotations
//!
//! The Page → Block → Paragraph → Word → Symbol tree produced by document
//! text detection. Field names follow the OCR service's camelCase JSON so a
//! `fullTextAnnotation` payload deserializes straight into [`OcrResponse`].

use serde::{Deserialize, Serialize};

/// A bounding-box corner in pixel coordinates
///
/// The service omits zero coordinates, hence the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Vertex {
    pub x: i32,
    pub y: i32,
}

impl Vertex {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Ordered polygon (normally 4 vertices, clockwise from top-left)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundingBox {
    pub vertices: Vec<Vertex>,
}

impl BoundingBox {
    /// Axis-aligned box from position and size
    pub fn from_rect(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            vertices: vec![
                Vertex::new(x, y),
                Vertex::new(x + width, y),
                Vertex::new(x + width, y + height),
                Vertex::new(x, y + height),
            ],
        }
    }
}

/// Kind of break detected after a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakType {
    #[default]
    Unknown,
    Space,
    SureSpace,
    EolSureSpace,
    Hyphen,
    LineBreak,
}

/// Break detected after a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetectedBreak {
    #[serde(rename = "type")]
    pub break_type: BreakType,
    pub is_prefix: bool,
}

/// Extra per-symbol information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextProperty {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_break: Option<DetectedBreak>,
}

/// A single recognized character
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Symbol {
    pub text: String,
    pub bounding_box: BoundingBox,
    pub confidence: f32,
    pub property: TextProperty,
}

impl Symbol {
    /// Break type following this symbol, `Unknown` when none was detected
    pub fn break_type(&self) -> BreakType {
        self.property
            .detected_break
            .map(|b| b.break_type)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Word {
    pub bounding_box: BoundingBox,
    pub confidence: f32,
    pub symbols: Vec<Symbol>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Paragraph {
    pub bounding_box: BoundingBox,
    /// Recognition confidence (0.0 - 1.0)
    pub confidence: f32,
    pub words: Vec<Word>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Block {
    pub bounding_box: BoundingBox,
    pub confidence: f32,
    pub paragraphs: Vec<Paragraph>,
}

/// One page of annotations
///
/// `width`/`height` describe the tile the page was recognized on. Pages from
/// the service carry no bounding box of their own.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Page {
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    pub confidence: f32,
    pub blocks: Vec<Block>,
}

/// Full document annotation for an image or a merged set of tiles
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OcrResponse {
    #[serde(rename = "text")]
    pub full_text: String,
    pub pages: Vec<Page>,
}

impl OcrResponse {
    /// True when no text was found
    pub fn is_empty(&self) -> bool {
        self.full_text.is_empty() && self.pages.is_empty()
    }

    /// Every bounding box in the tree, pages first, depth-first
    pub fn bounding_boxes(&self) -> Vec<&BoundingBox> {
        let mut boxes = Vec::new();
        for page in &self.pages {
            boxes.extend(page.bounding_box.as_ref());
            for block in &page.blocks {
                boxes.push(&block.bounding_box);
                for paragraph in &block.paragraphs {
                    boxes.push(&paragraph.bounding_box);
                    for word in &paragraph.words {
                        boxes.push(&word.bounding_box);
                        boxes.extend(word.symbols.iter().map(|s| &s.bounding_box));
                    }
                }
            }
        }
        boxes
    }

    /// Number of recognized symbols across all pages
    pub fn symbol_count(&self) -> usize {
        self.pages
            .iter()
            .flat_map(|p| &p.blocks)
            .flat_map(|b| &b.paragraphs)
            .flat_map(|p| &p.words)
            .map(|w| w.symbols.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "text": "Main St\n",
        "pages": [{
            "width": 640,
            "height": 480,
            "blocks": [{
                "boundingBox": {"vertices": [{"x": 10, "y": 5}, {"x": 90, "y": 5}, {"x": 90, "y": 30}, {"y": 30}]},
                "paragraphs": [{
                    "confidence": 0.97,
                    "boundingBox": {"vertices": [{"x": 10, "y": 5}, {"x": 90, "y": 5}, {"x": 90, "y": 30}, {"x": 10, "y": 30}]},
                    "words": [{
                        "boundingBox": {"vertices": [{"x": 10, "y": 5}, {"x": 50, "y": 5}, {"x": 50, "y": 30}, {"x": 10, "y": 30}]},
                        "symbols": [
                            {"text": "M", "boundingBox": {"vertices": [{"x": 10, "y": 5}]}},
                            {"text": "n", "property": {"detectedBreak": {"type": "SPACE"}}, "boundingBox": {"vertices": [{"x": 40, "y": 5}]}}
                        ]
                    }]
                }]
            }]
        }]
    }"#;

    #[test]
    fn test_deserialize_service_payload() {
        let response: OcrResponse = serde_json::from_str(SAMPLE).unwrap();

        assert_eq!(response.full_text, "Main St\n");
        assert_eq!(response.pages.len(), 1);
        assert_eq!(response.pages[0].width, 640);
        assert!(response.pages[0].bounding_box.is_none());

        let block = &response.pages[0].blocks[0];
        // Omitted coordinates default to zero
        assert_eq!(block.bounding_box.vertices[3], Vertex::new(0, 30));

        let paragraph = &block.paragraphs[0];
        assert!((paragraph.confidence - 0.97).abs() < 1e-6);

        let symbols = &paragraph.words[0].symbols;
        assert_eq!(symbols[0].break_type(), BreakType::Unknown);
        assert_eq!(symbols[1].break_type(), BreakType::Space);
        assert_eq!(response.symbol_count(), 2);
    }

    #[test]
    fn test_bounding_boxes_walks_whole_tree() {
        let response: OcrResponse = serde_json::from_str(SAMPLE).unwrap();
        // block + paragraph + word + 2 symbols
        assert_eq!(response.bounding_boxes().len(), 5);
    }

    #[test]
    fn test_empty_response() {
        let response: OcrResponse = serde_json::from_str("{}").unwrap();
        assert!(response.is_empty());
        assert_eq!(response.symbol_count(), 0);
    }

    #[test]
    fn test_from_rect() {
        let bbox = BoundingBox::from_rect(5, 10, 20, 30);
        assert_eq!(
            bbox.vertices,
            vec![
                Vertex::new(5, 10),
                Vertex::new(25, 10),
                Vertex::new(25, 40),
                Vertex::new(5, 40),
            ]
        );
    }
}
