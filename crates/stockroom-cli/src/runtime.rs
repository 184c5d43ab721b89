// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::sync::mpsc::Sender;
use std::thread;
use stockroom_app::{Category, Item, ItemId, ItemPage, ItemPatch, ItemStatus, ItemsApi, PageRequest};
use stockroom_tui::InternalEvent;
use tracing::debug;

/// Wires an inventory backend into the UI. Edits and bulk updates run on the
/// UI thread; page fetches run on a short-lived worker so scrolling stays
/// responsive.
pub struct ApiRuntime<A> {
    api: A,
}

impl<A> ApiRuntime<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }
}

impl<A: ItemsApi> ItemsApi for ApiRuntime<A> {
    fn fetch_items(&self, take: usize, cursor: i64) -> Result<ItemPage> {
        self.api.fetch_items(take, cursor)
    }

    fn update_item(&self, id: ItemId, patch: &ItemPatch) -> Result<Item> {
        self.api.update_item(id, patch)
    }

    fn bulk_update_status(&self, ids: &[ItemId], status: ItemStatus) -> Result<()> {
        self.api.bulk_update_status(ids, status)
    }

    fn fetch_categories(&self) -> Result<Vec<Category>> {
        self.api.fetch_categories()
    }
}

impl<A> stockroom_tui::AppRuntime for ApiRuntime<A>
where
    A: ItemsApi + Clone + Send + 'static,
{
    fn spawn_page_fetch(&mut self, request: PageRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let api = self.api.clone();
        thread::Builder::new()
            .name("page-fetch".to_owned())
            .spawn(move || {
                let result = api
                    .fetch_items(request.take, request.cursor)
                    .map_err(|error| format!("{error:#}"));
                if tx.send(InternalEvent::PageLoaded { request, result }).is_err() {
                    debug!(token = request.token, "ui gone; dropping page");
                }
            })
            .context("spawn page fetch worker")?;
        Ok(())
    }
}
