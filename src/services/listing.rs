// src/services/listing.rs

//! Workshop listing page fetcher and parser.
//!
//! The browse page has no stable API, so entries are pulled out of the markup
//! with patterns grouped into a [`PageSchema`]. When the upstream layout
//! changes the parser fails loudly and a new schema version is needed.

use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{EntryDetails, ListingEntry, ListingItem, WorkshopConfig};
use crate::utils::http::fetch_text;
use crate::utils::text::decode_entities;

/// Patterns describing one revision of the browse page markup.
#[derive(Debug, Clone)]
pub struct PageSchema {
    pub version: &'static str,
    entry: Regex,
    image: Selector,
    image_attr: &'static str,
}

impl PageSchema {
    /// Browse page layout with author anchors followed by hover-card JSON.
    pub fn v1() -> Result<Self> {
        let entry = Regex::new(
            r#"(?s)workshopItemAuthorName">by&nbsp;<a href=".+?(id|profiles)/(.+?)/.+?">(.*?)</a>.+?SharedFileBindMouseHover\(.+?(\{)"#,
        )
        .map_err(|e| AppError::config(format!("Invalid entry pattern: {e}")))?;
        let image = Self::parse_selector("img.workshopItemPreviewImage[src]")?;

        Ok(Self {
            version: "v1",
            entry,
            image,
            image_attr: "src",
        })
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::config(format!("Invalid selector '{s}': {e:?}")))
    }
}

/// Extracts entries and preview images from a listing page.
#[derive(Debug, Clone)]
pub struct ListingParser {
    schema: PageSchema,
}

impl ListingParser {
    pub fn new(schema: PageSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &PageSchema {
        &self.schema
    }

    /// Parse a page into entries paired with their images in discovery order.
    ///
    /// Fails with [`AppError::Consistency`] when the page yields a different
    /// number of entries and images, since pairing would then be unreliable.
    pub fn parse(&self, page: &str) -> Result<Vec<ListingItem>> {
        let entries = self.parse_entries(page)?;
        let images = self.parse_images(page)?;

        if entries.len() != images.len() {
            return Err(AppError::Consistency {
                entries: entries.len(),
                images: images.len(),
            });
        }

        Ok(entries
            .into_iter()
            .zip(images)
            .map(|(entry, image)| ListingItem { entry, image })
            .collect())
    }

    /// Extract listing entries in discovery order: ascending numeric id,
    /// oldest upload first. A card listed twice keeps its last occurrence.
    ///
    /// Cards whose hover JSON does not decode are skipped.
    pub fn parse_entries(&self, page: &str) -> Result<Vec<ListingEntry>> {
        let mut matched = 0;
        let mut entries: Vec<ListingEntry> = Vec::new();

        for caps in self.schema.entry.captures_iter(page) {
            matched += 1;
            let Some(json) = caps.get(4) else {
                continue;
            };
            let details = match decode_details(&page[json.start()..]) {
                Ok(details) => details,
                Err(e) => {
                    log::error!(
                        "Failed to decode a workshop entry ({}), skipping; scraped contents were: {}",
                        e,
                        snippet(&page[json.start()..])
                    );
                    continue;
                }
            };

            let entry = ListingEntry {
                id: details.id,
                title: decode_entities(&details.title),
                description: decode_entities(&details.description),
                steam_id: format!("{}/{}", &caps[1], &caps[2]),
                author_name: decode_entities(caps[3].trim()),
            };
            match entries.iter_mut().find(|seen| seen.id == entry.id) {
                Some(seen) => *seen = entry,
                None => entries.push(entry),
            }
        }

        if matched == 0 {
            return Err(AppError::structure(format!(
                "No workshop entries found (page schema {})",
                self.schema.version
            )));
        }

        log::info!("Found {} workshop entry matches", matched);
        // Non-numeric ids keep their relative order after the numeric ones.
        entries.sort_by_key(|entry| entry.id.parse::<u64>().map_or((1, 0), |id| (0, id)));
        Ok(entries)
    }

    /// Extract preview image URLs, aligned with entry order.
    ///
    /// The page lists previews newest-last, so document order is reversed.
    pub fn parse_images(&self, page: &str) -> Result<Vec<String>> {
        let document = Html::parse_document(page);
        let mut images: Vec<String> = document
            .select(&self.schema.image)
            .filter_map(|img| img.value().attr(self.schema.image_attr))
            .map(str::to_string)
            .collect();

        if images.is_empty() {
            return Err(AppError::structure(format!(
                "No workshop preview images found (page schema {})",
                self.schema.version
            )));
        }

        log::info!("Found {} workshop image entry matches", images.len());
        images.reverse();
        Ok(images)
    }
}

/// Decode the first JSON object at the start of `source`, ignoring whatever
/// markup follows it.
fn decode_details(source: &str) -> serde_json::Result<EntryDetails> {
    EntryDetails::deserialize(&mut serde_json::Deserializer::from_str(source))
}

fn snippet(source: &str) -> &str {
    let end = source
        .char_indices()
        .nth(200)
        .map_or(source.len(), |(index, _)| index);
    &source[..end]
}

/// Fetches raw listing pages.
#[derive(Debug, Clone)]
pub struct ListingFetcher {
    client: Client,
    workshop: WorkshopConfig,
}

impl ListingFetcher {
    pub fn new(client: Client, workshop: WorkshopConfig) -> Self {
        Self { client, workshop }
    }

    /// Fetch one page of the most recent listings.
    pub async fn fetch(&self, page_index: u32) -> Result<String> {
        let url = format!("{}/workshop/browse/", self.workshop.root());
        log::info!("Beginning scrape of page {}", page_index);

        let request = self.client.get(&url).query(&[
            ("appid", self.workshop.app_id.to_string()),
            ("browsesort", self.workshop.sort_mode.clone()),
            ("section", self.workshop.section.clone()),
            ("actualsort", self.workshop.sort_mode.clone()),
            ("p", page_index.to_string()),
            ("numperpage", self.workshop.page_size.to_string()),
        ]);

        let body = fetch_text(request).await.inspect_err(|e| {
            log::error!("Failed to retrieve the workshop page {}: {}", page_index, e);
        })?;

        log::info!("Received workshop page {}", page_index);
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BROWSE_PAGE: &str = include_str!("../../tests/fixtures/browse_page.html");

    fn parser() -> ListingParser {
        ListingParser::new(PageSchema::v1().unwrap())
    }

    /// One card as the browse page renders it, preview image inline.
    fn card(id: &str, title: &str) -> String {
        let hover = serde_json::json!({ "id": id, "title": title, "description": "" });
        format!(
            r#"<div class="workshopItem">
<a href="https://steamcommunity.com/sharedfiles/filedetails/?id={id}"><div class="workshopItemPreviewHolder"><img class="workshopItemPreviewImage " src="https://img/{id}.jpg"></div></a>
<div class="workshopItemAuthorName">by&nbsp;<a href="https://steamcommunity.com/id/author{id}/myworkshopfiles/">author{id}</a></div>
</div>
<script>SharedFileBindMouseHover( "sharedfile_{id}", false, {hover} );</script>"#
        )
    }

    fn page(cards: &[String]) -> String {
        format!("<html><body>{}</body></html>", cards.join("\n"))
    }

    #[test]
    fn test_parse_entries_from_fixture() {
        let entries = parser().parse_entries(BROWSE_PAGE).unwrap();

        assert_eq!(
            entries,
            vec![
                ListingEntry {
                    id: "1001".to_string(),
                    title: "Deluxe Chess".to_string(),
                    description: "A \"fancy\" chess set".to_string(),
                    steam_id: "id/alice".to_string(),
                    author_name: "alice".to_string(),
                },
                ListingEntry {
                    id: "1002".to_string(),
                    title: "Tom & Jerry's Checkers".to_string(),
                    description: "Checkers<br>with cats".to_string(),
                    steam_id: "profiles/76561198000000002".to_string(),
                    author_name: String::new(),
                },
                ListingEntry {
                    id: "1003".to_string(),
                    title: "Go Board".to_string(),
                    description: String::new(),
                    steam_id: "id/carol".to_string(),
                    author_name: "Carol & Co".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_images_reverses_document_order() {
        let images = parser().parse_images(BROWSE_PAGE).unwrap();
        assert_eq!(
            images,
            vec![
                "https://images.example.com/1001.jpg",
                "https://images.example.com/1002.jpg",
                "https://images.example.com/1003.jpg",
            ]
        );
    }

    #[test]
    fn test_parse_pairs_entries_with_images() {
        let items = parser().parse(BROWSE_PAGE).unwrap();
        assert_eq!(items.len(), 3);
        for item in &items {
            assert_eq!(
                item.image,
                format!("https://images.example.com/{}.jpg", item.entry.id)
            );
        }
    }

    #[test]
    fn test_newest_first_cards_pair_with_their_own_images() {
        let page = page(&[card("3003", "C"), card("3002", "B"), card("3001", "A")]);
        let items = parser().parse(&page).unwrap();

        let ids: Vec<&str> = items.iter().map(|item| item.entry.id.as_str()).collect();
        assert_eq!(ids, vec!["3001", "3002", "3003"]);
        for item in &items {
            assert_eq!(item.image, format!("https://img/{}.jpg", item.entry.id));
            assert_eq!(item.entry.author_name, format!("author{}", item.entry.id));
        }
    }

    #[test]
    fn test_entries_order_by_numeric_id() {
        let page = page(&[card("20", "B"), card("100", "C"), card("9", "A")]);
        let entries = parser().parse_entries(&page).unwrap();

        let ids: Vec<&str> = entries.iter().map(|entry| entry.id.as_str()).collect();
        assert_eq!(ids, vec!["9", "20", "100"]);
    }

    #[test]
    fn test_repeated_card_keeps_last_occurrence() {
        let page = page(&[card("3002", "Old title"), card("3001", "A"), card("3002", "New title")]);
        let entries = parser().parse_entries(&page).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].id, "3002");
        assert_eq!(entries[1].title, "New title");
    }

    #[test]
    fn test_braces_inside_hover_strings_decode() {
        let page = page(&[card("3002", "Dice {d6} pack"), card("3001", "Plain")]);
        let items = parser().parse(&page).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[1].entry.title, "Dice {d6} pack");
        assert_eq!(items[1].image, "https://img/3002.jpg");
    }

    #[test]
    fn test_layout_drift_is_structural() {
        let err = parser()
            .parse("<html><body>Nothing to see</body></html>")
            .unwrap_err();
        assert!(matches!(err, AppError::Structure(_)));
    }

    #[test]
    fn test_missing_images_is_structural() {
        let page = BROWSE_PAGE.replace("workshopItemPreviewImage", "somethingElse");
        let err = parser().parse(&page).unwrap_err();
        assert!(matches!(err, AppError::Structure(_)));
    }

    #[test]
    fn test_count_mismatch_is_consistency_error() {
        let page = BROWSE_PAGE.replacen(
            r#"<img class="workshopItemPreviewImage " src="https://images.example.com/1002.jpg">"#,
            "",
            1,
        );
        let err = parser().parse(&page).unwrap_err();
        assert!(matches!(
            err,
            AppError::Consistency {
                entries: 3,
                images: 2
            }
        ));
    }

    #[test]
    fn test_undecodable_card_is_skipped() {
        let page = BROWSE_PAGE.replace(r#"{"id":"1003""#, r#"{"id":1003,,"#);
        let entries = parser().parse_entries(&page).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(matches!(
            parser().parse(&page).unwrap_err(),
            AppError::Consistency {
                entries: 2,
                images: 3
            }
        ));
    }
}
