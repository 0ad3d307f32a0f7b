use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Notion rejects text objects longer than this many characters.
pub const MAX_TEXT_CHARS: usize = 2000;

/// Notion rejects rich text arrays longer than this.
pub const MAX_RICH_TEXT_ITEMS: usize = 100;

// --- Rich text ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RichText {
    Text { text: TextContent },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
}

impl RichText {
    pub fn plain(content: impl Into<String>) -> Self {
        RichText::Text {
            text: TextContent {
                content: content.into(),
            },
        }
    }

    /// Split `text` into consecutive text objects that each respect the
    /// per-object character limit. Anything past the array limit is dropped.
    pub fn chunked(text: &str) -> Vec<RichText> {
        let chars: Vec<char> = text.chars().collect();
        chars
            .chunks(MAX_TEXT_CHARS)
            .take(MAX_RICH_TEXT_ITEMS)
            .map(|chunk| RichText::plain(chunk.iter().collect::<String>()))
            .collect()
    }

    pub fn content(&self) -> &str {
        match self {
            RichText::Text { text } => &text.content,
        }
    }
}

// --- Page properties ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Title(Vec<RichText>),
    RichText(Vec<RichText>),
}

impl PropertyValue {
    pub fn title(text: &str) -> Self {
        PropertyValue::Title(RichText::chunked(text))
    }

    pub fn rich_text(text: &str) -> Self {
        PropertyValue::RichText(RichText::chunked(text))
    }
}

// --- Blocks ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    object: &'static str,
    #[serde(flatten)]
    pub body: BlockBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum BlockBody {
    #[serde(rename = "heading_1")]
    Heading1 { heading_1: TextBlock },
    #[serde(rename = "heading_2")]
    Heading2 { heading_2: TextBlock },
    #[serde(rename = "paragraph")]
    Paragraph { paragraph: TextBlock },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlock {
    pub rich_text: Vec<RichText>,
}

impl Block {
    fn new(body: BlockBody) -> Self {
        Self {
            object: "block",
            body,
        }
    }

    pub fn heading_1(text: &str) -> Self {
        Self::new(BlockBody::Heading1 {
            heading_1: TextBlock {
                rich_text: RichText::chunked(text),
            },
        })
    }

    pub fn heading_2(text: &str) -> Self {
        Self::new(BlockBody::Heading2 {
            heading_2: TextBlock {
                rich_text: RichText::chunked(text),
            },
        })
    }

    pub fn paragraph(text: &str) -> Self {
        Self::new(BlockBody::Paragraph {
            paragraph: TextBlock {
                rich_text: RichText::chunked(text),
            },
        })
    }
}

// --- Requests / responses ---

#[derive(Debug, Clone, Serialize)]
pub struct Parent {
    pub database_id: String,
}

/// Body for `POST /v1/pages`.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePageRequest {
    pub parent: Parent,
    pub properties: BTreeMap<String, PropertyValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,
}

impl CreatePageRequest {
    pub fn in_database(database_id: impl Into<String>) -> Self {
        Self {
            parent: Parent {
                database_id: database_id.into(),
            },
            properties: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn child(mut self, block: Block) -> Self {
        self.children.push(block);
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub id: String,
    pub url: String,
}

/// Error body returned with any non-2xx response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
