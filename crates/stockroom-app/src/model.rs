// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::ids::*;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    InStock,
    LastUnits,
    OutOfStock,
}

impl ItemStatus {
    pub const ALL: [Self; 3] = [Self::InStock, Self::LastUnits, Self::OutOfStock];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InStock => "in_stock",
            Self::LastUnits => "last_units",
            Self::OutOfStock => "out_of_stock",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in_stock" => Some(Self::InStock),
            "last_units" => Some(Self::LastUnits),
            "out_of_stock" => Some(Self::OutOfStock),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::InStock => "in stock",
            Self::LastUnits => "last units",
            Self::OutOfStock => "out of stock",
        }
    }
}

/// Status as stored on an item. Servers may send values outside
/// [`ItemStatus::ALL`]; those are kept verbatim so the row still loads and
/// shows the raw text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusValue {
    Known(ItemStatus),
    Other(String),
}

impl StatusValue {
    pub fn known(&self) -> Option<ItemStatus> {
        match self {
            Self::Known(status) => Some(*status),
            Self::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(status) => status.as_str(),
            Self::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Known(status) => status.label(),
            Self::Other(raw) => raw,
        }
    }
}

impl Default for StatusValue {
    fn default() -> Self {
        Self::Known(ItemStatus::default())
    }
}

impl From<ItemStatus> for StatusValue {
    fn from(status: ItemStatus) -> Self {
        Self::Known(status)
    }
}

impl From<String> for StatusValue {
    fn from(raw: String) -> Self {
        match ItemStatus::parse(&raw) {
            Some(status) => Self::Known(status),
            None => Self::Other(raw),
        }
    }
}

impl From<StatusValue> for String {
    fn from(value: StatusValue) -> Self {
        match value {
            StatusValue::Known(status) => status.as_str().to_owned(),
            StatusValue::Other(raw) => raw,
        }
    }
}

impl PartialEq<ItemStatus> for StatusValue {
    fn eq(&self, other: &ItemStatus) -> bool {
        self.known() == Some(*other)
    }
}

/// One row of the inventory as the server returns it.
///
/// Fields missing from the payload decode to their defaults so partial
/// responses still render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub brand: String,
    pub size: String,
    pub color: String,
    pub category: String,
    pub category_id: CategoryId,
    pub price: f64,
    pub status: StatusValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A single `GET /items` response. `next_cursor == None` means the
/// collection is exhausted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPage {
    #[serde(default)]
    pub items: Vec<Item>,
    pub next_cursor: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemField {
    Name,
    Brand,
    Size,
    Color,
    Category,
    Price,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Category,
    Status,
}

impl ItemField {
    /// Wire name of the field inside an item payload.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Brand => "brand",
            Self::Size => "size",
            Self::Color => "color",
            Self::Category => "categoryId",
            Self::Price => "price",
            Self::Status => "status",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Brand => "brand",
            Self::Size => "size",
            Self::Color => "color",
            Self::Category => "category",
            Self::Price => "price",
            Self::Status => "status",
        }
    }

    pub const fn kind(self) -> FieldKind {
        match self {
            Self::Name | Self::Brand | Self::Size | Self::Color => FieldKind::Text,
            Self::Price => FieldKind::Number,
            Self::Category => FieldKind::Category,
            Self::Status => FieldKind::Status,
        }
    }

    pub fn value_of(self, item: &Item) -> FieldValue {
        match self {
            Self::Name => FieldValue::Text(item.name.clone()),
            Self::Brand => FieldValue::Text(item.brand.clone()),
            Self::Size => FieldValue::Text(item.size.clone()),
            Self::Color => FieldValue::Text(item.color.clone()),
            Self::Category => FieldValue::Category(item.category_id),
            Self::Price => FieldValue::Number(item.price),
            Self::Status => FieldValue::Status(item.status.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Category(CategoryId),
    Status(StatusValue),
}

/// Partial item body for `PUT /items/{id}`. Unset fields are omitted from
/// the JSON entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
}

impl ItemPatch {
    pub fn single(field: ItemField, value: FieldValue) -> Result<Self> {
        let mut patch = Self::default();
        match (field, value) {
            (ItemField::Name, FieldValue::Text(text)) => patch.name = Some(text),
            (ItemField::Brand, FieldValue::Text(text)) => patch.brand = Some(text),
            (ItemField::Size, FieldValue::Text(text)) => patch.size = Some(text),
            (ItemField::Color, FieldValue::Text(text)) => patch.color = Some(text),
            (ItemField::Category, FieldValue::Category(id)) => patch.category_id = Some(id),
            (ItemField::Price, FieldValue::Number(price)) => patch.price = Some(price),
            (ItemField::Status, FieldValue::Status(StatusValue::Known(status))) => {
                patch.status = Some(status);
            }
            (field, value) => {
                bail!("value {value:?} does not fit field {}", field.as_str());
            }
        }
        Ok(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldValue, Item, ItemField, ItemPage, ItemPatch, ItemStatus, StatusValue};
    use crate::{CategoryId, ItemId};
    use anyhow::Result;

    #[test]
    fn status_round_trips_through_wire_names() {
        for status in ItemStatus::ALL {
            assert_eq!(ItemStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ItemStatus::parse("discontinued"), None);
    }

    #[test]
    fn item_decodes_camel_case_payload() -> Result<()> {
        let item: Item = serde_json::from_str(
            r#"{"id":7,"name":"Tee","brand":"Acme","size":"M","color":"Blue","category":"Shirts","categoryId":3,"price":49.9,"status":"last_units"}"#,
        )?;
        assert_eq!(item.id, ItemId::new(7));
        assert_eq!(item.category_id, CategoryId::new(3));
        assert_eq!(item.status, ItemStatus::LastUnits);
        assert_eq!(item.price, 49.9);
        Ok(())
    }

    #[test]
    fn partial_item_payload_fills_defaults() -> Result<()> {
        let item: Item = serde_json::from_str(r#"{"id":1,"price":150}"#)?;
        assert_eq!(item.id, ItemId::new(1));
        assert_eq!(item.price, 150.0);
        assert!(item.name.is_empty());
        assert_eq!(item.status, ItemStatus::InStock);
        Ok(())
    }

    #[test]
    fn page_with_null_cursor_decodes_as_none() -> Result<()> {
        let page: ItemPage = serde_json::from_str(r#"{"items":[],"nextCursor":null}"#)?;
        assert!(page.items.is_empty());
        assert_eq!(page.next_cursor, None);
        Ok(())
    }

    #[test]
    fn patch_serializes_only_the_changed_field() -> Result<()> {
        let patch = ItemPatch::single(ItemField::Name, FieldValue::Text("New Value".to_owned()))?;
        assert_eq!(serde_json::to_string(&patch)?, r#"{"name":"New Value"}"#);

        let patch =
            ItemPatch::single(ItemField::Category, FieldValue::Category(CategoryId::new(4)))?;
        assert_eq!(serde_json::to_string(&patch)?, r#"{"categoryId":4}"#);
        Ok(())
    }

    #[test]
    fn patch_rejects_mismatched_value_kind() {
        let error = ItemPatch::single(ItemField::Price, FieldValue::Text("ten".to_owned()))
            .expect_err("text price should be rejected");
        assert!(error.to_string().contains("price"));
    }

    #[test]
    fn field_value_of_reads_each_column() {
        let item = Item {
            id: ItemId::new(2),
            name: "Boot".to_owned(),
            price: 10.5,
            status: ItemStatus::OutOfStock.into(),
            ..Item::default()
        };
        assert_eq!(
            ItemField::Name.value_of(&item),
            FieldValue::Text("Boot".to_owned())
        );
        assert_eq!(ItemField::Price.value_of(&item), FieldValue::Number(10.5));
        assert_eq!(
            ItemField::Status.value_of(&item),
            FieldValue::Status(StatusValue::Known(ItemStatus::OutOfStock))
        );
    }

    #[test]
    fn unknown_status_survives_page_decode() -> Result<()> {
        let page: ItemPage = serde_json::from_str(
            r#"{"items":[{"id":1,"name":"A","status":"in_stock"},{"id":2,"name":"B","status":"discontinued"}],"nextCursor":null}"#,
        )?;
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].status, ItemStatus::InStock);
        assert_eq!(
            page.items[1].status,
            StatusValue::Other("discontinued".to_owned())
        );
        assert_eq!(page.items[1].status.label(), "discontinued");
        assert_eq!(page.items[1].status.known(), None);

        let encoded = serde_json::to_value(&page.items[1])?;
        assert_eq!(encoded["status"], "discontinued");
        let encoded = serde_json::to_value(&page.items[0])?;
        assert_eq!(encoded["status"], "in_stock");
        Ok(())
    }

    #[test]
    fn unknown_status_cannot_become_a_patch() {
        let value = FieldValue::Status(StatusValue::Other("discontinued".to_owned()));
        let error = ItemPatch::single(ItemField::Status, value)
            .expect_err("only known statuses can be sent");
        assert!(error.to_string().contains("status"));

        let value = FieldValue::Status(ItemStatus::LastUnits.into());
        let patch = ItemPatch::single(ItemField::Status, value).expect("known status fits");
        assert_eq!(patch.status, Some(ItemStatus::LastUnits));
    }
}
