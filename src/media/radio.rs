//! Internet radio streams.

use crate::error::{Error, Result};

use super::item::{
    Item, ItemMeta, ItemType, MediaContext, Readiness, display_title, hash_id, make_keywords,
};
use super::record::ItemRecord;
use super::registry::{ItemArgs, ItemHandler};

pub(crate) const HANDLER: ItemHandler = ItemHandler {
    build,
    load,
    make_id,
};

#[derive(Debug, Clone, PartialEq)]
pub struct RadioItem {
    pub meta: ItemMeta,
    pub url: String,
}

/// Target of the first `href="..."` in chat markup.
fn href_target(input: &str) -> Option<&str> {
    let start = input.to_ascii_lowercase().find("href=\"")? + "href=\"".len();
    let rest = &input[start..];
    rest.find('"').map(|end| &rest[..end])
}

/// Accept `http(s)://host/...` (bare or inside a link) and lower-case the
/// scheme and host.
pub fn parse_stream_url(input: &str) -> Result<String> {
    let mut input = input.trim();
    if !input.to_ascii_lowercase().starts_with("http") {
        input = href_target(input).unwrap_or(input).trim();
    }
    let (scheme, rest) = input
        .split_once("://")
        .ok_or_else(|| Error::InvalidUrl(input.to_string()))?;
    let scheme = scheme.to_ascii_lowercase();
    if scheme != "http" && scheme != "https" {
        return Err(Error::InvalidUrl(input.to_string()));
    }

    let (host, path) = match rest.find('/') {
        Some(i) => rest.split_at(i),
        None => (rest, "/"),
    };
    if host.is_empty() || host.chars().any(char::is_whitespace) {
        return Err(Error::InvalidUrl(input.to_string()));
    }
    Ok(format!("{scheme}://{}{path}", host.to_ascii_lowercase()))
}

fn radio_id(url: &str) -> String {
    hash_id(&["radio", url])
}

impl RadioItem {
    pub fn format_title(&self) -> String {
        display_title(&self.meta.title, None, &self.url)
    }

    pub fn to_record(&self) -> ItemRecord {
        ItemRecord {
            url: Some(self.url.clone()),
            keywords: make_keywords(&[Some(&self.meta.title), Some(&self.url)]),
            ..self.meta.base_record(ItemType::Radio)
        }
    }

    /// Streams have no duration; only the URL shape can be checked offline.
    pub fn validate(&mut self) -> Result<()> {
        let readiness = match parse_stream_url(&self.url) {
            Ok(_) => Readiness::Ready,
            Err(e) => Readiness::Failed(e.to_string()),
        };
        let failure = match &readiness {
            Readiness::Failed(reason) => Some(reason.clone()),
            _ => None,
        };
        if self.meta.set_readiness(readiness) {
            self.meta.version += 1;
        }
        match failure {
            Some(reason) => Err(Error::ValidationFailed(reason)),
            None => Ok(()),
        }
    }
}

fn build(args: &ItemArgs, _ctx: &MediaContext) -> Result<Item> {
    let raw = args.require_url()?;
    let (url, readiness) = match parse_stream_url(raw) {
        Ok(url) => (url, Readiness::Ready),
        Err(e) => (raw.trim().to_string(), Readiness::Failed(e.to_string())),
    };
    let title = args.title.clone().unwrap_or_default();
    let mut meta = ItemMeta::new(radio_id(&url), title);
    meta.readiness = readiness;
    Ok(Item::Radio(RadioItem { meta, url }))
}

fn load(record: &ItemRecord, _ctx: &MediaContext) -> Result<Item> {
    let url = record.url.clone().ok_or_else(|| Error::MissingField {
        item_type: record.item_type.clone(),
        field: "url",
    })?;
    let mut item = RadioItem {
        meta: ItemMeta::from_record(record),
        url,
    };
    // A malformed url leaves the item failed.
    let _ = item.validate();
    Ok(Item::Radio(item))
}

fn make_id(args: &ItemArgs, _ctx: &MediaContext) -> Result<String> {
    let raw = args.require_url()?;
    let url = parse_stream_url(raw).unwrap_or_else(|_| raw.trim().to_string());
    Ok(radio_id(&url))
}
