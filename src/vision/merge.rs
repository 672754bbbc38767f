//! Response merging
//!
//! Stitches the OCR responses of two sibling tiles back into one response in
//! the parent tile's coordinate space. The second tile's annotations are
//! shifted by the split offset; the first tile already starts at 0 along the
//! split axis and is kept as is.
//!
//! Text recognized inside the overlap band shows up in both tiles and is not
//! deduplicated.

use super::annotation::{
    Block, BoundingBox, OcrResponse, Page, Paragraph, Symbol, Vertex, Word,
};
use super::tiling::Axis;

/// Shift geometry along an axis, producing a new value
pub trait Translate: Sized {
    fn translate(self, axis: Axis, offset: u32) -> Self;
}

impl Translate for Vertex {
    fn translate(self, axis: Axis, offset: u32) -> Self {
        match axis {
            Axis::Horizontal => Vertex {
                x: self.x.saturating_add_unsigned(offset),
                ..self
            },
            Axis::Vertical => Vertex {
                y: self.y.saturating_add_unsigned(offset),
                ..self
            },
        }
    }
}

impl Translate for BoundingBox {
    fn translate(self, axis: Axis, offset: u32) -> Self {
        BoundingBox {
            vertices: self
                .vertices
                .into_iter()
                .map(|v| v.translate(axis, offset))
                .collect(),
        }
    }
}

impl Translate for Symbol {
    fn translate(self, axis: Axis, offset: u32) -> Self {
        Symbol {
            bounding_box: self.bounding_box.translate(axis, offset),
            ..self
        }
    }
}

impl Translate for Word {
    fn translate(self, axis: Axis, offset: u32) -> Self {
        Word {
            bounding_box: self.bounding_box.translate(axis, offset),
            symbols: translate_all(self.symbols, axis, offset),
            ..self
        }
    }
}

impl Translate for Paragraph {
    fn translate(self, axis: Axis, offset: u32) -> Self {
        Paragraph {
            bounding_box: self.bounding_box.translate(axis, offset),
            words: translate_all(self.words, axis, offset),
            ..self
        }
    }
}

impl Translate for Block {
    fn translate(self, axis: Axis, offset: u32) -> Self {
        Block {
            bounding_box: self.bounding_box.translate(axis, offset),
            paragraphs: translate_all(self.paragraphs, axis, offset),
            ..self
        }
    }
}

impl Translate for Page {
    fn translate(self, axis: Axis, offset: u32) -> Self {
        Page {
            bounding_box: self.bounding_box.map(|b| b.translate(axis, offset)),
            blocks: translate_all(self.blocks, axis, offset),
            ..self
        }
    }
}

impl Translate for OcrResponse {
    fn translate(self, axis: Axis, offset: u32) -> Self {
        OcrResponse {
            pages: translate_all(self.pages, axis, offset),
            ..self
        }
    }
}

fn translate_all<T: Translate>(items: Vec<T>, axis: Axis, offset: u32) -> Vec<T> {
    items
        .into_iter()
        .map(|item| item.translate(axis, offset))
        .collect()
}

/// Merge two sibling responses into one
///
/// `first` belongs to the tile at offset 0, `second` to the tile starting at
/// `offset` along `axis`. Text is joined with a single space and the pages of
/// `second` follow those of `first`.
pub fn merge(offset: u32, first: OcrResponse, second: OcrResponse, axis: Axis) -> OcrResponse {
    let full_text = format!("{} {}", first.full_text, second.full_text);

    let mut pages = first.pages;
    pages.extend(second.translate(axis, offset).pages);

    OcrResponse { full_text, pages }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Response with one page whose every level shares the same box
    fn tile_response(text: &str, x: i32, y: i32, width: i32, height: i32) -> OcrResponse {
        let bbox = BoundingBox::from_rect(x, y, width, height);
        let symbol = Symbol {
            text: text.chars().next().map(String::from).unwrap_or_default(),
            bounding_box: bbox.clone(),
            ..Default::default()
        };
        let word = Word {
            bounding_box: bbox.clone(),
            symbols: vec![symbol],
            ..Default::default()
        };
        let paragraph = Paragraph {
            bounding_box: bbox.clone(),
            confidence: 0.95,
            words: vec![word],
        };
        let block = Block {
            bounding_box: bbox.clone(),
            paragraphs: vec![paragraph],
            ..Default::default()
        };
        OcrResponse {
            full_text: text.to_string(),
            pages: vec![Page {
                width: 100,
                height: 50,
                bounding_box: Some(bbox),
                blocks: vec![block],
                ..Default::default()
            }],
        }
    }

    fn page_boxes(response: &OcrResponse, page: usize) -> Vec<BoundingBox> {
        let single = OcrResponse {
            full_text: String::new(),
            pages: vec![response.pages[page].clone()],
        };
        single.bounding_boxes().into_iter().cloned().collect()
    }

    #[test]
    fn test_merge_concatenates_text_with_space() {
        let merged = merge(
            40,
            tile_response("Elm Street", 0, 0, 10, 10),
            tile_response("Springfield", 0, 0, 10, 10),
            Axis::Horizontal,
        );
        assert_eq!(merged.full_text, "Elm Street Springfield");
        assert_eq!(merged.pages.len(), 2);
    }

    #[test]
    fn test_merge_horizontal_shifts_only_second_x() {
        let merged = merge(
            150,
            tile_response("a", 10, 20, 30, 5),
            tile_response("b", 10, 20, 30, 5),
            Axis::Horizontal,
        );

        for bbox in page_boxes(&merged, 0) {
            assert_eq!(bbox, BoundingBox::from_rect(10, 20, 30, 5));
        }
        let boxes = page_boxes(&merged, 1);
        // page + block + paragraph + word + symbol
        assert_eq!(boxes.len(), 5);
        for bbox in boxes {
            assert_eq!(bbox, BoundingBox::from_rect(160, 20, 30, 5));
        }
    }

    #[test]
    fn test_merge_vertical_shifts_only_second_y() {
        let merged = merge(
            75,
            tile_response("a", 10, 20, 30, 5),
            tile_response("b", 10, 20, 30, 5),
            Axis::Vertical,
        );

        for bbox in page_boxes(&merged, 0) {
            assert_eq!(bbox, BoundingBox::from_rect(10, 20, 30, 5));
        }
        for bbox in page_boxes(&merged, 1) {
            assert_eq!(bbox, BoundingBox::from_rect(10, 95, 30, 5));
        }
    }

    #[test]
    fn test_merge_keeps_non_geometric_fields() {
        let merged = merge(
            10,
            OcrResponse::default(),
            tile_response("x", 0, 0, 1, 1),
            Axis::Horizontal,
        );

        let page = &merged.pages[0];
        assert_eq!((page.width, page.height), (100, 50));
        let paragraph = &page.blocks[0].paragraphs[0];
        assert!((paragraph.confidence - 0.95).abs() < 1e-6);
        assert_eq!(paragraph.words[0].symbols[0].text, "x");
    }

    #[test]
    fn test_zero_offset_is_identity() {
        let response = tile_response("same", 3, 4, 5, 6);
        let merged = merge(0, OcrResponse::default(), response.clone(), Axis::Horizontal);

        assert_eq!(merged.pages, response.pages);
        assert_eq!(response.clone().translate(Axis::Vertical, 0), response);
    }

    #[test]
    fn test_nested_merges_accumulate_offsets() {
        // Root split at x=100; its right tile is split again at local x=50,
        // so the innermost right tile sits at x=150 in the root.
        let inner = merge(
            50,
            tile_response("b", 0, 0, 10, 10),
            tile_response("c", 0, 0, 10, 10),
            Axis::Horizontal,
        );
        let root = merge(100, tile_response("a", 0, 0, 10, 10), inner, Axis::Horizontal);

        assert_eq!(root.full_text, "a b c");
        let starts: Vec<i32> = root
            .pages
            .iter()
            .map(|p| p.bounding_box.as_ref().unwrap().vertices[0].x)
            .collect();
        assert_eq!(starts, vec![0, 100, 150]);

        // Same as applying each tile's total offset once
        let direct = tile_response("c", 0, 0, 10, 10).translate(Axis::Horizontal, 150);
        assert_eq!(root.pages[2], direct.pages[0]);
    }

    #[test]
    fn test_mixed_axis_nesting() {
        // Bottom tile at y=60 inside a right tile at x=200
        let inner = merge(
            60,
            tile_response("top", 0, 0, 10, 10),
            tile_response("bottom", 0, 0, 10, 10),
            Axis::Vertical,
        );
        let root = merge(200, tile_response("left", 0, 0, 10, 10), inner, Axis::Horizontal);

        let corner = root.pages[2].blocks[0].bounding_box.vertices[0];
        assert_eq!(corner, Vertex::new(200, 60));
        let corner = root.pages[1].blocks[0].bounding_box.vertices[0];
        assert_eq!(corner, Vertex::new(200, 0));
    }

    #[test]
    fn test_merge_of_empty_tiles() {
        let merged = merge(
            10,
            OcrResponse::default(),
            OcrResponse::default(),
            Axis::Horizontal,
        );
        assert_eq!(merged.full_text, " ");
        assert!(merged.pages.is_empty());
    }

    #[test]
    fn test_translate_saturates() {
        let vertex = Vertex::new(i32::MAX - 1, 0).translate(Axis::Horizontal, 10);
        assert_eq!(vertex.x, i32::MAX);
    }
}
