// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element store - the registered element set in registration order

use ifc_clash_model::{ClashError, Element, ElementId, GeometryIssue, Result};
use rustc_hash::FxHashMap;

/// Element rejected during registration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkippedElement {
    pub id: ElementId,
    pub issue: GeometryIssue,
}

/// Outcome of a registration
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegistrationReport {
    /// Elements accepted into the store
    pub indexed: usize,
    /// Elements dropped because their geometry cannot be indexed
    pub skipped: Vec<SkippedElement>,
    /// Elements that replaced an earlier element with the same id
    pub replaced: usize,
}

impl RegistrationReport {
    /// Whether every element was accepted
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Turn the first skipped element into an error
    ///
    /// Registration never fails on bad geometry; hosts that want to reject
    /// such models outright can use this after the fact.
    pub fn ensure_clean(&self) -> Result<()> {
        match self.skipped.first() {
            Some(skipped) => Err(ClashError::invalid_geometry(skipped.id, skipped.issue)),
            None => Ok(()),
        }
    }
}

/// Registered elements, addressable by id or by slot
///
/// Slots are dense indices in registration order and are what the spatial
/// index stores.
#[derive(Clone, Debug, Default)]
pub struct ElementStore {
    elements: Vec<Element>,
    by_id: FxHashMap<ElementId, usize>,
}

impl ElementStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store, skipping elements whose bbox cannot be indexed
    ///
    /// A later element with an id already present replaces the earlier one
    /// but keeps its registration slot.
    pub fn from_elements(elements: impl IntoIterator<Item = Element>) -> (Self, RegistrationReport) {
        let mut store = Self::new();
        let mut report = RegistrationReport::default();

        for element in elements {
            if let Err(issue) = element.bbox.validate() {
                log::warn!("Skipping element {}: {}", element.id, issue);
                report.skipped.push(SkippedElement {
                    id: element.id,
                    issue,
                });
                continue;
            }

            match store.by_id.get(&element.id) {
                Some(&slot) => {
                    log::warn!("Duplicate element id {}, replacing earlier entry", element.id);
                    store.elements[slot] = element;
                    report.replaced += 1;
                }
                None => {
                    store.by_id.insert(element.id, store.elements.len());
                    store.elements.push(element);
                }
            }
        }

        report.indexed = store.elements.len();
        (store, report)
    }

    /// Look up an element by id
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.by_id.get(&id).map(|&slot| &self.elements[slot])
    }

    /// Slot of an element id
    pub fn slot_of(&self, id: ElementId) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    /// Element at a slot
    pub fn at(&self, slot: usize) -> Option<&Element> {
        self.elements.get(slot)
    }

    /// All elements in registration order
    pub fn as_slice(&self) -> &[Element] {
        &self.elements
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
