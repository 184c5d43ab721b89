// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use tracing::{debug, warn};

use crate::{
    Category, FieldKind, FieldValue, Item, ItemCache, ItemField, ItemId, ItemPatch, ItemStatus,
    ItemsApi,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceOption {
    pub value: FieldValue,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorInput {
    Text(String),
    Choice {
        options: Vec<ChoiceOption>,
        index: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    InvalidNumber,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditDecision {
    Cancel(CancelReason),
    Unchanged,
    Submit(ItemPatch),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    Unchanged,
    Cancelled(CancelReason),
    Updated(Item),
    Failed(String),
}

/// Editor for one cell of one item. Text and price cells take typed input;
/// category and status cells pick from a fixed option list.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEditor {
    item_id: ItemId,
    field: ItemField,
    original: FieldValue,
    input: EditorInput,
}

impl FieldEditor {
    pub fn open(item: &Item, field: ItemField, categories: &[Category]) -> Result<Self> {
        let original = field.value_of(item);
        let input = match field.kind() {
            FieldKind::Text | FieldKind::Number => EditorInput::Text(render_value(&original)),
            FieldKind::Category => {
                if categories.is_empty() {
                    bail!("no categories loaded; cannot edit the category of item {}", item.id);
                }
                let options = categories
                    .iter()
                    .map(|category| ChoiceOption {
                        value: FieldValue::Category(category.id),
                        label: category.name.clone(),
                    })
                    .collect::<Vec<_>>();
                let index = options
                    .iter()
                    .position(|option| option.value == original)
                    .unwrap_or(0);
                EditorInput::Choice { options, index }
            }
            FieldKind::Status => {
                let options = ItemStatus::ALL
                    .into_iter()
                    .map(|status| ChoiceOption {
                        value: FieldValue::Status(status.into()),
                        label: status.label().to_owned(),
                    })
                    .collect::<Vec<_>>();
                let index = options
                    .iter()
                    .position(|option| option.value == original)
                    .unwrap_or(0);
                EditorInput::Choice { options, index }
            }
        };

        Ok(Self {
            item_id: item.id,
            field,
            original,
            input,
        })
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn field(&self) -> ItemField {
        self.field
    }

    pub fn input(&self) -> &EditorInput {
        &self.input
    }

    pub fn is_choice(&self) -> bool {
        matches!(self.input, EditorInput::Choice { .. })
    }

    /// What the cell shows while the editor is open.
    pub fn display(&self) -> String {
        match &self.input {
            EditorInput::Text(text) => text.clone(),
            EditorInput::Choice { options, index } => options
                .get(*index)
                .map(|option| option.label.clone())
                .unwrap_or_default(),
        }
    }

    pub fn push_char(&mut self, ch: char) {
        if let EditorInput::Text(text) = &mut self.input {
            text.push(ch);
        }
    }

    pub fn backspace(&mut self) {
        if let EditorInput::Text(text) = &mut self.input {
            text.pop();
        }
    }

    pub fn clear(&mut self) {
        if let EditorInput::Text(text) = &mut self.input {
            text.clear();
        }
    }

    pub fn cycle(&mut self, delta: isize) {
        if let EditorInput::Choice { options, index } = &mut self.input
            && !options.is_empty()
        {
            let len = options.len() as isize;
            *index = (*index as isize + delta).rem_euclid(len) as usize;
        }
    }

    /// Parsed value of the current input. `None` when a price does not parse
    /// as a finite number.
    pub fn pending_value(&self) -> Option<FieldValue> {
        match &self.input {
            EditorInput::Text(text) if self.field.kind() == FieldKind::Number => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|price| price.is_finite())
                .map(FieldValue::Number),
            EditorInput::Text(text) => Some(FieldValue::Text(text.clone())),
            EditorInput::Choice { options, index } => {
                options.get(*index).map(|option| option.value.clone())
            }
        }
    }

    pub fn decide(&self) -> Result<EditDecision> {
        let Some(value) = self.pending_value() else {
            return Ok(EditDecision::Cancel(CancelReason::InvalidNumber));
        };
        if value == self.original {
            return Ok(EditDecision::Unchanged);
        }
        Ok(EditDecision::Submit(ItemPatch::single(self.field, value)?))
    }

    /// Sends the change, if any, and adopts the server's item into `cache`.
    /// A failed update leaves the cached item untouched.
    pub fn submit<A: ItemsApi + ?Sized>(&self, cache: &mut ItemCache, api: &A) -> EditOutcome {
        let patch = match self.decide() {
            Ok(EditDecision::Submit(patch)) => patch,
            Ok(EditDecision::Unchanged) => return EditOutcome::Unchanged,
            Ok(EditDecision::Cancel(reason)) => {
                debug!(
                    item = %self.item_id,
                    field = self.field.as_str(),
                    ?reason,
                    "edit cancelled"
                );
                return EditOutcome::Cancelled(reason);
            }
            Err(error) => return EditOutcome::Failed(format!("{error:#}")),
        };

        match api.update_item(self.item_id, &patch) {
            Ok(item) => {
                if !cache.update_item_in_state(item.clone()) {
                    debug!(item = %item.id, "updated item is no longer cached");
                }
                EditOutcome::Updated(item)
            }
            Err(error) => {
                let error = format!("{error:#}");
                warn!(
                    item = %self.item_id,
                    field = self.field.as_str(),
                    %error,
                    "item update failed"
                );
                EditOutcome::Failed(error)
            }
        }
    }
}

fn render_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(text) => text.clone(),
        FieldValue::Number(number) => number.to_string(),
        FieldValue::Category(id) => id.to_string(),
        FieldValue::Status(status) => status.as_str().to_owned(),
    }
}
