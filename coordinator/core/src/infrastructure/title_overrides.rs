// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// In-Memory Release Title Overrides
//
// Backing store for the display titles operators give locally uploaded
// images. The merge reduction consults this when rewriting `custom`
// release titles.

use crate::domain::osystem::ReleaseTitleOverrides;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct InMemoryTitleOverrides {
    titles: RwLock<HashMap<String, String>>,
}

impl InMemoryTitleOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the display title for an uploaded release.
    pub fn set_title(&self, release: impl Into<String>, title: impl Into<String>) {
        self.titles.write().insert(release.into(), title.into());
    }

    /// Forget the override for `release`, e.g. when its image is deleted.
    pub fn remove_title(&self, release: &str) {
        self.titles.write().remove(release);
    }
}

impl ReleaseTitleOverrides for InMemoryTitleOverrides {
    fn title_for(&self, release_name: &str) -> Option<String> {
        self.titles.read().get(release_name).cloned()
    }
}
