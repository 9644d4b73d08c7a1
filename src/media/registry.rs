//! Per-type construction strategies, keyed by item type tag.
//!
//! A [`Registry`] is built once at startup and handed to the cache. Each tag
//! maps to an [`ItemHandler`] bundling three pure functions: build a fresh
//! item from raw arguments, load one from a catalog record, and derive the id
//! without constructing anything.

use std::collections::HashMap;

use crate::error::{Error, Result};

use super::item::{Item, MediaContext};
use super::record::ItemRecord;
use super::{file, radio};

/// Raw construction arguments, as produced by commands or shortlists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemArgs {
    pub item_type: String,
    pub path: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
}

impl ItemArgs {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            item_type: "file".to_string(),
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn radio(url: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            item_type: "radio".to_string(),
            url: Some(url.into()),
            title: name.map(str::to_string),
            ..Self::default()
        }
    }

    pub(crate) fn require_path(&self) -> Result<&str> {
        self.path.as_deref().ok_or_else(|| Error::MissingField {
            item_type: self.item_type.clone(),
            field: "path",
        })
    }

    pub(crate) fn require_url(&self) -> Result<&str> {
        self.url.as_deref().ok_or_else(|| Error::MissingField {
            item_type: self.item_type.clone(),
            field: "url",
        })
    }
}

impl From<&ItemRecord> for ItemArgs {
    fn from(record: &ItemRecord) -> Self {
        Self {
            item_type: record.item_type.clone(),
            path: record.path.clone(),
            url: record.url.clone(),
            title: Some(record.title.clone()).filter(|t| !t.is_empty()),
        }
    }
}

pub type BuildFn = fn(&ItemArgs, &MediaContext) -> Result<Item>;
pub type LoadFn = fn(&ItemRecord, &MediaContext) -> Result<Item>;
pub type IdFn = fn(&ItemArgs, &MediaContext) -> Result<String>;

#[derive(Debug, Clone, Copy)]
pub struct ItemHandler {
    pub build: BuildFn,
    pub load: LoadFn,
    pub make_id: IdFn,
}

#[derive(Debug, Clone)]
pub struct Registry {
    handlers: HashMap<String, ItemHandler>,
    context: MediaContext,
}

impl Registry {
    /// Registry with no handlers.
    pub fn empty(context: MediaContext) -> Self {
        Self {
            handlers: HashMap::new(),
            context,
        }
    }

    /// Registry knowing the built-in `file` and `radio` kinds.
    pub fn new(context: MediaContext) -> Self {
        let mut registry = Self::empty(context);
        registry.register("file", file::HANDLER);
        registry.register("radio", radio::HANDLER);
        registry
    }

    /// Add or replace the handler for `tag`.
    pub fn register(&mut self, tag: &str, handler: ItemHandler) {
        self.handlers.insert(tag.to_string(), handler);
    }

    pub fn context(&self) -> &MediaContext {
        &self.context
    }

    pub fn handler(&self, tag: &str) -> Result<&ItemHandler> {
        self.handlers
            .get(tag)
            .ok_or_else(|| Error::UnknownItemType(tag.to_string()))
    }

    pub fn build(&self, args: &ItemArgs) -> Result<Item> {
        (self.handler(&args.item_type)?.build)(args, &self.context)
    }

    pub fn load(&self, record: &ItemRecord) -> Result<Item> {
        (self.handler(&record.item_type)?.load)(record, &self.context)
    }

    pub fn make_id(&self, args: &ItemArgs) -> Result<String> {
        (self.handler(&args.item_type)?.make_id)(args, &self.context)
    }
}
