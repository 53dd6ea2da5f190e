//! # Metadata Extractor
//!
//! Pulls the cover image, title and artist out of a photo page using three
//! fixed structural lookups. All three are required; there is no fallback.

use domains::{ExtractedMetadata, ExtractionError, MetadataField};
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

pub const DEFAULT_IMAGE_PREFIX: &str = "https://live.staticflickr.com";
pub const DEFAULT_TITLE_SELECTOR: &str = ".photo-title";
pub const DEFAULT_ARTIST_SELECTOR: &str = ".owner-name";

/// A configured selector could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid selector `{selector}`: {reason}")]
pub struct InvalidSelector {
    pub selector: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    image_prefix: String,
    meta: Selector,
    title: Selector,
    artist: Selector,
}

impl MetadataExtractor {
    pub fn new(
        image_prefix: impl Into<String>,
        title_selector: &str,
        artist_selector: &str,
    ) -> Result<Self, InvalidSelector> {
        Ok(Self {
            image_prefix: image_prefix.into(),
            meta: parse_selector("meta[content]")?,
            title: parse_selector(title_selector)?,
            artist: parse_selector(artist_selector)?,
        })
    }

    /// The Flickr photo-page layout.
    pub fn with_defaults() -> Result<Self, InvalidSelector> {
        Self::new(DEFAULT_IMAGE_PREFIX, DEFAULT_TITLE_SELECTOR, DEFAULT_ARTIST_SELECTOR)
    }

    /// Runs the three lookups in the order image, title, artist.
    pub fn extract(&self, html: &str) -> Result<ExtractedMetadata, ExtractionError> {
        let document = Html::parse_document(html);

        let image = document
            .select(&self.meta)
            .filter_map(|meta| meta.value().attr("content"))
            .find(|content| content.starts_with(&self.image_prefix))
            .map(str::to_string)
            .ok_or(ExtractionError::MissingField(MetadataField::Image))?;

        let title = first_text(&document, &self.title)
            .ok_or(ExtractionError::MissingField(MetadataField::Title))?;

        let artist = first_text(&document, &self.artist)
            .ok_or(ExtractionError::MissingField(MetadataField::Artist))?;

        Ok(ExtractedMetadata {
            image,
            title,
            artist,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector, InvalidSelector> {
    Selector::parse(selector).map_err(|e| InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Trimmed text of the first match; an empty element counts as absent.
fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    let element: ElementRef<'_> = document.select(selector).next()?;
    let text: String = element.text().collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
