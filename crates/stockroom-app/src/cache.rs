// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Bounded working set over the server's cursor-paginated item list.
//!
//! The cache keeps the first page it loaded and the newest page it merged,
//! and trims whatever sits between them once the cap is reached. Loads run
//! in two phases (`begin_*` then [`ItemCache::complete`]) so a caller can
//! perform the HTTP request elsewhere while the cache still refuses to start
//! a second pagination request.

use anyhow::{Result, bail};
use std::collections::{BTreeSet, HashSet};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::{Item, ItemId, ItemPage, ItemsApi};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_MAX_ITEMS: usize = 500;
pub const DEFAULT_MAX_LOAD_FAILURES: u32 = 3;
pub const TAIL_WINDOW: usize = 100;
pub const FIRST_CURSOR: i64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub page_size: usize,
    pub max_items: usize,
    /// Consecutive `load_more` failures tolerated before pagination stops
    /// until the next refresh.
    pub max_load_failures: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_items: DEFAULT_MAX_ITEMS,
            max_load_failures: DEFAULT_MAX_LOAD_FAILURES,
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            bail!("cache page size must be positive");
        }
        if self.max_items < self.page_size.saturating_mul(2) {
            bail!(
                "cache max_items ({}) must be at least twice the page size ({}) to hold the first and newest pages",
                self.max_items,
                self.page_size
            );
        }
        if self.max_load_failures == 0 {
            bail!("cache max_load_failures must be at least 1");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Initial,
    More,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub token: u64,
    pub kind: LoadKind,
    pub take: usize,
    pub cursor: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    More,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A load was already pending or no more pages exist.
    Skipped,
    Replaced {
        loaded: usize,
    },
    Appended {
        added: usize,
        evicted: usize,
    },
    /// The server answered with an empty page.
    Exhausted,
    Failed {
        error: String,
        exhausted: bool,
    },
    /// The response belongs to a request a refresh has since replaced.
    Stale,
}

#[derive(Debug, Clone)]
pub struct ItemCache {
    config: CacheConfig,
    items: Vec<Item>,
    first_window: BTreeSet<ItemId>,
    cursor: i64,
    availability: Availability,
    in_flight: Option<PageRequest>,
    last_token: u64,
    consecutive_failures: u32,
    loaded_at: Option<OffsetDateTime>,
}

impl Default for ItemCache {
    fn default() -> Self {
        Self {
            config: CacheConfig::default(),
            items: Vec::new(),
            first_window: BTreeSet::new(),
            cursor: FIRST_CURSOR,
            availability: Availability::More,
            in_flight: None,
            last_token: 0,
            consecutive_failures: 0,
            loaded_at: None,
        }
    }
}

impl ItemCache {
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.position(id).map(|index| &self.items[index])
    }

    pub fn has_more(&self) -> bool {
        self.availability == Availability::More
    }

    pub fn availability(&self) -> Availability {
        self.availability
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<PageRequest> {
        self.in_flight
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn first_window(&self) -> &BTreeSet<ItemId> {
        &self.first_window
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn loaded_at(&self) -> Option<OffsetDateTime> {
        self.loaded_at
    }

    /// Starts a first-page load unless one is already pending. A pending
    /// `load_more` does not block this; its response will come back stale.
    pub fn begin_initial_load(&mut self) -> Option<PageRequest> {
        if matches!(self.in_flight, Some(request) if request.kind == LoadKind::Initial) {
            return None;
        }
        Some(self.issue(LoadKind::Initial, FIRST_CURSOR))
    }

    pub fn begin_load_more(&mut self) -> Option<PageRequest> {
        if self.in_flight.is_some() || self.availability == Availability::Exhausted {
            return None;
        }
        Some(self.issue(LoadKind::More, self.cursor))
    }

    pub fn complete(&mut self, request: PageRequest, result: Result<ItemPage>) -> LoadOutcome {
        if self.in_flight != Some(request) {
            debug!(token = request.token, "dropping superseded page response");
            return LoadOutcome::Stale;
        }
        self.in_flight = None;

        match request.kind {
            LoadKind::Initial => self.finish_initial(result),
            LoadKind::More => self.finish_more(request, result),
        }
    }

    pub fn initial_load<A: ItemsApi + ?Sized>(&mut self, api: &A) -> LoadOutcome {
        let Some(request) = self.begin_initial_load() else {
            return LoadOutcome::Skipped;
        };
        let result = api.fetch_items(request.take, request.cursor);
        self.complete(request, result)
    }

    pub fn load_more<A: ItemsApi + ?Sized>(&mut self, api: &A) -> LoadOutcome {
        let Some(request) = self.begin_load_more() else {
            return LoadOutcome::Skipped;
        };
        let result = api.fetch_items(request.take, request.cursor);
        self.complete(request, result)
    }

    pub fn refresh<A: ItemsApi + ?Sized>(&mut self, api: &A) -> LoadOutcome {
        self.initial_load(api)
    }

    /// Swaps in the server's copy of an item, keeping its position. Returns
    /// false when the item is not in the working set.
    pub fn update_item_in_state(&mut self, item: Item) -> bool {
        match self.position(item.id) {
            Some(index) => {
                self.items[index] = item;
                true
            }
            None => false,
        }
    }

    fn position(&self, id: ItemId) -> Option<usize> {
        self.items.binary_search_by_key(&id, |item| item.id).ok()
    }

    fn issue(&mut self, kind: LoadKind, cursor: i64) -> PageRequest {
        self.last_token = self.last_token.wrapping_add(1);
        let request = PageRequest {
            token: self.last_token,
            kind,
            take: self.config.page_size,
            cursor,
        };
        self.in_flight = Some(request);
        request
    }

    fn finish_initial(&mut self, result: Result<ItemPage>) -> LoadOutcome {
        match result {
            Ok(page) => {
                let mut seen = HashSet::new();
                let mut items = page
                    .items
                    .into_iter()
                    .filter(|item| seen.insert(item.id))
                    .collect::<Vec<_>>();
                items.sort_by_key(|item| item.id);
                items.truncate(self.config.max_items);

                self.first_window = items.iter().map(|item| item.id).collect();
                self.items = items;
                self.consecutive_failures = 0;
                self.loaded_at = Some(OffsetDateTime::now_utc());
                self.apply_cursor(page.next_cursor);
                debug!(
                    loaded = self.items.len(),
                    has_more = self.has_more(),
                    "first page loaded"
                );
                LoadOutcome::Replaced {
                    loaded: self.items.len(),
                }
            }
            Err(error) => {
                let error = format!("{error:#}");
                warn!(%error, "initial item load failed");
                self.items.clear();
                self.first_window.clear();
                self.cursor = FIRST_CURSOR;
                self.availability = Availability::Exhausted;
                LoadOutcome::Failed {
                    error,
                    exhausted: true,
                }
            }
        }
    }

    fn finish_more(&mut self, request: PageRequest, result: Result<ItemPage>) -> LoadOutcome {
        match result {
            Ok(page) => {
                self.consecutive_failures = 0;
                if page.items.is_empty() {
                    self.availability = Availability::Exhausted;
                    debug!(cursor = request.cursor, "empty page; pagination exhausted");
                    return LoadOutcome::Exhausted;
                }
                let (added, evicted) = self.merge_page(page.items);
                self.apply_cursor(page.next_cursor);
                debug!(
                    cursor = request.cursor,
                    added,
                    evicted,
                    total = self.items.len(),
                    "page merged"
                );
                LoadOutcome::Appended { added, evicted }
            }
            Err(error) => {
                let error = format!("{error:#}");
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                let exhausted = self.consecutive_failures >= self.config.max_load_failures;
                if exhausted {
                    self.availability = Availability::Exhausted;
                }
                warn!(
                    %error,
                    cursor = request.cursor,
                    failures = self.consecutive_failures,
                    exhausted,
                    "loading next item page failed"
                );
                LoadOutcome::Failed { error, exhausted }
            }
        }
    }

    fn apply_cursor(&mut self, next_cursor: Option<i64>) {
        match next_cursor {
            Some(cursor) => {
                self.cursor = cursor;
                self.availability = Availability::More;
            }
            None => {
                self.availability = Availability::Exhausted;
            }
        }
    }

    fn merge_page(&mut self, page: Vec<Item>) -> (usize, usize) {
        let mut known = self.items.iter().map(|item| item.id).collect::<HashSet<_>>();
        let fresh = page
            .into_iter()
            .filter(|item| known.insert(item.id))
            .collect::<Vec<_>>();
        if fresh.is_empty() {
            return (0, 0);
        }

        let added = fresh.len();
        let mut fresh_ids = fresh.iter().map(|item| item.id).collect::<Vec<_>>();
        fresh_ids.sort_unstable();
        let tail = fresh_ids[added - added.min(TAIL_WINDOW)..]
            .iter()
            .copied()
            .collect::<HashSet<_>>();

        self.items.extend(fresh);
        self.items.sort_by_key(|item| item.id);
        let evicted = self.evict_middle(&tail);
        (added, evicted)
    }

    fn evict_middle(&mut self, tail: &HashSet<ItemId>) -> usize {
        let before = self.items.len();
        if before <= self.config.max_items {
            return 0;
        }

        let first_window = &self.first_window;
        let mut excess = before - self.config.max_items;
        self.items.retain(|item| {
            if excess == 0 || first_window.contains(&item.id) || tail.contains(&item.id) {
                return true;
            }
            excess -= 1;
            false
        });

        // Pages larger than requested can leave the protected rows alone over
        // the cap; the oldest tail rows go next, the first window never does.
        if excess > 0 {
            self.items.retain(|item| {
                if excess == 0 || first_window.contains(&item.id) {
                    return true;
                }
                excess -= 1;
                false
            });
        }

        before - self.items.len()
    }
}
