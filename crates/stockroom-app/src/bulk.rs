// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::{info, warn};

use crate::{ItemCache, ItemStatus, ItemsApi, LoadOutcome, SelectionSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome {
    /// Nothing was selected, so no request was sent.
    Skipped,
    Applied {
        count: usize,
        status: ItemStatus,
        refresh: LoadOutcome,
    },
    Failed(String),
}

/// State of the bulk status modal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkEditor {
    open: bool,
    status: ItemStatus,
}

impl BulkEditor {
    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub fn set_status(&mut self, status: ItemStatus) {
        self.status = status;
    }

    pub fn cycle_status(&mut self, delta: isize) {
        let all = ItemStatus::ALL;
        let current = all
            .iter()
            .position(|status| *status == self.status)
            .unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(all.len() as isize) as usize;
        self.status = all[next];
    }

    /// Applies the chosen status to every selected item. On success the
    /// modal closes, the selection empties and the cache reloads from the
    /// first page; on failure nothing changes.
    pub fn submit<A: ItemsApi + ?Sized>(
        &mut self,
        selection: &mut SelectionSet,
        cache: &mut ItemCache,
        api: &A,
    ) -> BulkOutcome {
        if selection.is_empty() {
            return BulkOutcome::Skipped;
        }

        let ids = selection.ids();
        match api.bulk_update_status(&ids, self.status) {
            Ok(()) => {
                info!(count = ids.len(), status = self.status.as_str(), "bulk status applied");
                self.close();
                selection.clear();
                let refresh = cache.refresh(api);
                BulkOutcome::Applied {
                    count: ids.len(),
                    status: self.status,
                    refresh,
                }
            }
            Err(error) => {
                let error = format!("{error:#}");
                warn!(
                    count = ids.len(),
                    status = self.status.as_str(),
                    %error,
                    "bulk status update failed"
                );
                BulkOutcome::Failed(error)
            }
        }
    }
}
