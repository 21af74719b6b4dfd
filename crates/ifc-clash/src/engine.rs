// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Clash engine - per-model service object
//!
//! Owns the current [`ClashScene`] and the result of the last complete
//! detection run. `register` replaces everything wholesale; there is no
//! incremental insert or remove.

use crate::config::ClashConfig;
use crate::detector::{sort_by_severity, ClashScene, DetectOptions, DetectionOutcome};
use crate::store::RegistrationReport;
use ifc_clash_model::{Clash, Element, ElementId, Result};
use std::sync::Arc;

/// Engine lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// Index built, no cached results
    Idle,
    /// Walking elements and collecting clashes
    Scanning,
    /// Ordering collected clashes by severity
    Sorting,
    /// Results of the last complete run are cached
    Cached,
}

/// Clash detection engine for one loaded model
///
/// # Example
///
/// ```ignore
/// use ifc_clash::{ClashConfig, ClashEngine, DetectOptions};
///
/// let mut engine = ClashEngine::new(ClashConfig::default())?;
/// engine.register(elements);
/// let clashes = engine.detect(&DetectOptions::default())?;
/// println!("{} clashes", clashes.len());
/// ```
#[derive(Debug)]
pub struct ClashEngine {
    config: ClashConfig,
    scene: Arc<ClashScene>,
    state: EngineState,
    cache: Vec<Clash>,
}

impl ClashEngine {
    /// Create an engine with no elements
    pub fn new(config: ClashConfig) -> Result<Self> {
        config.validate()?;
        let scene = Arc::new(ClashScene::empty(&config));
        Ok(Self {
            config,
            scene,
            state: EngineState::Idle,
            cache: Vec::new(),
        })
    }

    /// Replace all elements and rebuild the index
    ///
    /// Elements with unusable bounding boxes are skipped and listed in the
    /// report. Cached results are discarded.
    pub fn register(&mut self, elements: impl IntoIterator<Item = Element>) -> RegistrationReport {
        let (scene, report) = ClashScene::build_unchecked(elements, &self.config);
        log::info!(
            "Registered {} elements for clash analysis ({} skipped, {} cells)",
            report.indexed,
            report.skipped.len(),
            scene.grid().cell_count()
        );
        self.scene = Arc::new(scene);
        self.cache.clear();
        self.state = EngineState::Idle;
        report
    }

    /// Run detection and cache the result
    pub fn detect(&mut self, options: &DetectOptions) -> Result<Vec<Clash>> {
        Ok(self.detect_with_status(options)?.clashes)
    }

    /// Run detection, reporting whether it completed
    ///
    /// A cancelled run returns its partial results but leaves the cache
    /// empty and the engine idle.
    pub fn detect_with_status(&mut self, options: &DetectOptions) -> Result<DetectionOutcome> {
        options.validate()?;
        self.begin_scan();
        let scene = Arc::clone(&self.scene);
        let outcome = scene.scan(options);
        self.complete_scan(outcome)
    }

    /// Async variant of [`detect_with_status`](Self::detect_with_status)
    ///
    /// Yields to the executor after every progress batch.
    pub async fn detect_async(&mut self, options: &DetectOptions) -> Result<DetectionOutcome> {
        options.validate()?;
        self.begin_scan();
        let scene = Arc::clone(&self.scene);
        let outcome = scene.scan_async(options).await;
        self.complete_scan(outcome)
    }

    fn begin_scan(&mut self) {
        self.cache.clear();
        self.state = EngineState::Scanning;
        log::debug!("Clash scan started over {} elements", self.scene.store().len());
    }

    fn complete_scan(&mut self, outcome: Result<DetectionOutcome>) -> Result<DetectionOutcome> {
        let mut outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                self.state = EngineState::Idle;
                return Err(e);
            }
        };

        if !outcome.is_complete() {
            sort_by_severity(&mut outcome.clashes);
            self.state = EngineState::Idle;
            return Ok(outcome);
        }

        self.state = EngineState::Sorting;
        sort_by_severity(&mut outcome.clashes);
        self.cache = outcome.clashes.clone();
        self.state = EngineState::Cached;
        log::info!("Found {} clashes", self.cache.len());
        Ok(outcome)
    }

    /// Clashes from the last complete run, empty if none
    pub fn cached(&self) -> &[Clash] {
        &self.cache
    }

    /// Drop cached results, keeping the index
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.state = EngineState::Idle;
    }

    /// Shared handle to the current scene
    ///
    /// The scene is immutable; detections on the handle can run on other
    /// threads while this engine stays usable.
    pub fn scene(&self) -> Arc<ClashScene> {
        Arc::clone(&self.scene)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &ClashConfig {
        &self.config
    }

    /// Look up a registered element
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.scene.store().get(id)
    }

    /// Registered elements in registration order
    pub fn elements(&self) -> &[Element] {
        self.scene.store().as_slice()
    }

    pub fn len(&self) -> usize {
        self.scene.store().len()
    }

    pub fn is_empty(&self) -> bool {
        self.scene.store().is_empty()
    }
}
