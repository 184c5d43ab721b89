// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

use crate::{Category, Item, ItemId, ItemPage, ItemPatch, ItemStatus};

/// The four REST calls the inventory screen depends on.
pub trait ItemsApi {
    /// `GET /items?take=<take>&cursor=<cursor>`
    fn fetch_items(&self, take: usize, cursor: i64) -> Result<ItemPage>;

    /// `PUT /items/{id}`; returns the server's full copy of the item.
    fn update_item(&self, id: ItemId, patch: &ItemPatch) -> Result<Item>;

    /// `PATCH /items/bulk/status`
    fn bulk_update_status(&self, ids: &[ItemId], status: ItemStatus) -> Result<()>;

    /// `GET /categories`
    fn fetch_categories(&self) -> Result<Vec<Category>>;
}
