// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use stockroom_app::{
    Category, CategoryId, Item, ItemId, ItemPage, ItemPatch, ItemStatus, ItemsApi,
};

static CATEGORIES: [(&str, [&str; 3]); 8] = [
    ("Shirts", ["Oxford Shirt", "Tee", "Henley"]),
    ("Pants", ["Chino", "Jean", "Jogger"]),
    ("Jackets", ["Parka", "Bomber", "Field Jacket"]),
    ("Dresses", ["Midi Dress", "Wrap Dress", "Slip Dress"]),
    ("Shoes", ["Sneaker", "Loafer", "Boot"]),
    ("Hats", ["Beanie", "Cap", "Bucket Hat"]),
    ("Bags", ["Tote", "Backpack", "Duffel"]),
    ("Accessories", ["Belt", "Scarf", "Wallet"]),
];

const BRANDS: [&str; 12] = [
    "Northwind",
    "Cedar & Co",
    "Atlas",
    "Harbor",
    "Lumen",
    "Fieldstone",
    "Alder",
    "Kestrel",
    "Marlow",
    "Tidewater",
    "Quarry",
    "Juniper",
];

const ADJECTIVES: [&str; 12] = [
    "Classic", "Relaxed", "Slim", "Vintage", "Everyday", "Heavyweight", "Linen", "Wool", "Denim",
    "Canvas", "Quilted", "Ribbed",
];

const SIZES: [&str; 6] = ["XS", "S", "M", "L", "XL", "One Size"];

const COLORS: [&str; 10] = [
    "Black", "White", "Navy", "Olive", "Rust", "Sand", "Charcoal", "Cream", "Forest", "Burgundy",
];

struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator of plausible inventory rows.
pub struct InventoryFaker {
    rng: DeterministicRng,
}

impl InventoryFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn categories(&self) -> Vec<Category> {
        CATEGORIES
            .iter()
            .zip(1_i64..)
            .map(|((name, _), id)| Category {
                id: CategoryId::new(id),
                name: (*name).to_owned(),
            })
            .collect()
    }

    pub fn item(&mut self, id: ItemId, categories: &[Category]) -> Item {
        let category = if categories.is_empty() {
            None
        } else {
            Some(&categories[self.rng.int_n(categories.len())])
        };
        let category_name = category.map(|c| c.name.as_str()).unwrap_or("Misc");
        let nouns = CATEGORIES
            .iter()
            .find(|(name, _)| *name == category_name)
            .map(|(_, nouns)| nouns.as_slice())
            .unwrap_or(&["Item"]);
        let noun = self.pick(nouns);

        // Mostly in stock, with a tail of scarce and sold-out rows.
        let status = match self.rng.int_n(10) {
            0..=5 => ItemStatus::InStock,
            6..=8 => ItemStatus::LastUnits,
            _ => ItemStatus::OutOfStock,
        };
        let cents = 500 + self.rng.int_n(49_500) as i64;

        Item {
            id,
            name: format!("{} {}", self.pick(&ADJECTIVES), noun),
            brand: self.pick(&BRANDS).to_owned(),
            size: self.pick(&SIZES).to_owned(),
            color: self.pick(&COLORS).to_owned(),
            category: category_name.to_owned(),
            category_id: category.map(|c| c.id).unwrap_or_default(),
            price: cents as f64 / 100.0,
            status: status.into(),
        }
    }

    /// Items with ids `1..=count`.
    pub fn inventory(&mut self, count: usize, categories: &[Category]) -> Vec<Item> {
        (1..=count as i64)
            .map(|id| self.item(ItemId::new(id), categories))
            .collect()
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }
}

/// The two partial rows a minimal mock server hands back: only id, name,
/// brand, price and status are present.
pub fn sample_items() -> Vec<Item> {
    vec![
        Item {
            id: ItemId::new(1),
            name: "Item 1".to_owned(),
            brand: "Brand 1".to_owned(),
            price: 100.0,
            status: ItemStatus::InStock.into(),
            ..Item::default()
        },
        Item {
            id: ItemId::new(2),
            name: "Item 2".to_owned(),
            brand: "Brand 2".to_owned(),
            price: 200.0,
            status: ItemStatus::LastUnits.into(),
            ..Item::default()
        },
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    FetchItems,
    UpdateItem,
    BulkUpdateStatus,
    FetchCategories,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    FetchItems { take: usize, cursor: i64 },
    UpdateItem { id: ItemId, patch: ItemPatch },
    BulkUpdateStatus { ids: Vec<ItemId>, status: ItemStatus },
    FetchCategories,
}

impl ApiCall {
    pub fn kind(&self) -> CallKind {
        match self {
            Self::FetchItems { .. } => CallKind::FetchItems,
            Self::UpdateItem { .. } => CallKind::UpdateItem,
            Self::BulkUpdateStatus { .. } => CallKind::BulkUpdateStatus,
            Self::FetchCategories => CallKind::FetchCategories,
        }
    }
}

#[derive(Default)]
struct InventoryState {
    items: BTreeMap<ItemId, Item>,
    categories: Vec<Category>,
    calls: Vec<ApiCall>,
    failures: HashMap<CallKind, usize>,
}

/// In-memory server behind [`ItemsApi`]. Cursors are the id of the last item
/// returned, so pages stay stable while other rows change. Clones share one
/// inventory.
#[derive(Clone, Default)]
pub struct MemoryInventory {
    state: Arc<Mutex<InventoryState>>,
}

impl MemoryInventory {
    pub fn new(items: Vec<Item>, categories: Vec<Category>) -> Self {
        let state = InventoryState {
            items: items.into_iter().map(|item| (item.id, item)).collect(),
            categories,
            ..InventoryState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn seeded(seed: u64, count: usize) -> Self {
        let mut faker = InventoryFaker::new(seed);
        let categories = faker.categories();
        let items = faker.inventory(count, &categories);
        Self::new(items, categories)
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn item(&self, id: ItemId) -> Option<Item> {
        self.lock().items.get(&id).cloned()
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    pub fn calls_of(&self, kind: CallKind) -> Vec<ApiCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.kind() == kind)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Makes the next `times` calls of `kind` fail with a server error.
    pub fn fail_next(&self, kind: CallKind, times: usize) {
        *self.lock().failures.entry(kind).or_default() += times;
    }

    fn lock(&self) -> MutexGuard<'_, InventoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InventoryState {
    fn record(&mut self, call: ApiCall) -> Result<()> {
        let kind = call.kind();
        self.calls.push(call);
        if let Some(remaining) = self.failures.get_mut(&kind)
            && *remaining > 0
        {
            *remaining -= 1;
            bail!("server error (503): injected {kind:?} failure");
        }
        Ok(())
    }
}

impl ItemsApi for MemoryInventory {
    fn fetch_items(&self, take: usize, cursor: i64) -> Result<ItemPage> {
        let mut state = self.lock();
        state.record(ApiCall::FetchItems { take, cursor })?;

        let mut remaining = state
            .items
            .range(ItemId::new(cursor.saturating_add(1))..)
            .map(|(_, item)| item);
        let items = remaining.by_ref().take(take).cloned().collect::<Vec<_>>();
        let next_cursor = match (items.last(), remaining.next()) {
            (Some(last), Some(_)) => Some(last.id.get()),
            _ => None,
        };
        Ok(ItemPage { items, next_cursor })
    }

    fn update_item(&self, id: ItemId, patch: &ItemPatch) -> Result<Item> {
        let mut state = self.lock();
        state.record(ApiCall::UpdateItem {
            id,
            patch: patch.clone(),
        })?;

        let category_name = patch.category_id.and_then(|category_id| {
            state
                .categories
                .iter()
                .find(|category| category.id == category_id)
                .map(|category| category.name.clone())
        });
        let Some(item) = state.items.get_mut(&id) else {
            bail!("server error (404): item {id} not found");
        };
        if let Some(name) = &patch.name {
            item.name = name.clone();
        }
        if let Some(brand) = &patch.brand {
            item.brand = brand.clone();
        }
        if let Some(size) = &patch.size {
            item.size = size.clone();
        }
        if let Some(color) = &patch.color {
            item.color = color.clone();
        }
        if let Some(category_id) = patch.category_id {
            item.category_id = category_id;
            item.category = category_name.unwrap_or_default();
        }
        if let Some(price) = patch.price {
            item.price = price;
        }
        if let Some(status) = patch.status {
            item.status = status.into();
        }
        Ok(item.clone())
    }

    fn bulk_update_status(&self, ids: &[ItemId], status: ItemStatus) -> Result<()> {
        let mut state = self.lock();
        state.record(ApiCall::BulkUpdateStatus {
            ids: ids.to_vec(),
            status,
        })?;
        for id in ids {
            if let Some(item) = state.items.get_mut(id) {
                item.status = status.into();
            }
        }
        Ok(())
    }

    fn fetch_categories(&self) -> Result<Vec<Category>> {
        let mut state = self.lock();
        state.record(ApiCall::FetchCategories)?;
        Ok(state.categories.clone())
    }
}
