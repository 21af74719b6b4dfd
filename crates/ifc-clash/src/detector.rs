// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Detection orchestrator
//!
//! A [`ClashScene`] bundles an element store with the spatial hash built from
//! it. Scenes are immutable once built, so any number of detections can run
//! against one scene concurrently through an `Arc`.
//!
//! A scan visits elements in registration order, queries candidates from the
//! grid, analyses each pair once (only from the element registered first) and
//! finally sorts the clashes by severity with a stable sort, so discovery
//! order is kept within a tier.

use crate::config::ClashConfig;
use crate::grid::SpatialHash;
use crate::narrow::NarrowPhase;
use crate::store::{ElementStore, RegistrationReport};
use ifc_clash_model::{Clash, ClashError, Element, ElementType, Result};
use parking_lot::Mutex;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::Poll;

/// Default minimum intersection volume (1 litre)
pub const DEFAULT_MIN_VOLUME: f64 = 0.001;

/// Progress callback receiving a percentage in `0.0..=100.0`
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Cooperative cancellation flag shared between a caller and a running scan
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; the scan stops at its next progress checkpoint
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Options for one detection run
#[derive(Clone)]
pub struct DetectOptions {
    /// Element types excluded both as scanned elements and as candidates
    pub ignore_types: FxHashSet<ElementType>,
    /// Intersections below this volume (m³) are dropped
    pub min_volume: f64,
    /// Invoked with a non-decreasing percentage as the scan advances
    pub progress: Option<ProgressCallback>,
    /// Checked at the same cadence as progress reporting
    pub cancel: Option<CancellationToken>,
    /// Analyse elements on the rayon thread pool
    pub parallel: bool,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            ignore_types: FxHashSet::default(),
            min_volume: DEFAULT_MIN_VOLUME,
            progress: None,
            cancel: None,
            parallel: false,
        }
    }
}

impl fmt::Debug for DetectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectOptions")
            .field("ignore_types", &self.ignore_types)
            .field("min_volume", &self.min_volume)
            .field("progress", &self.progress.is_some())
            .field("cancel", &self.cancel)
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl DetectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude an element type
    pub fn ignore(mut self, element_type: ElementType) -> Self {
        self.ignore_types.insert(element_type);
        self
    }

    /// Set the minimum reported intersection volume in m³
    pub fn min_volume(mut self, min_volume: f64) -> Self {
        self.min_volume = min_volume;
        self
    }

    /// Set the progress callback
    pub fn on_progress(mut self, callback: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Attach a cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run the scan on the rayon thread pool
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Reject option values that indicate a caller bug
    pub fn validate(&self) -> Result<()> {
        if !(self.min_volume.is_finite() && self.min_volume >= 0.0) {
            return Err(ClashError::invalid_option(
                "min_volume",
                format!("must be a non-negative finite volume, got {}", self.min_volume),
            ));
        }
        Ok(())
    }

    fn is_ignored(&self, element: &Element) -> bool {
        self.ignore_types.contains(&element.element_type)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

/// How a detection run ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionStatus {
    /// Every element was scanned
    Complete,
    /// Stopped early through a [`CancellationToken`]; results are partial
    Cancelled { processed: usize, total: usize },
}

/// Result of a detection run
#[derive(Clone, Debug)]
pub struct DetectionOutcome {
    /// Clashes ordered critical, major, minor
    pub clashes: Vec<Clash>,
    pub status: DetectionStatus,
    /// Candidate pairs handed to the narrow phase
    pub pairs_tested: usize,
}

impl DetectionOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == DetectionStatus::Complete
    }
}

/// Stable sort by severity tier
pub fn sort_by_severity(clashes: &mut [Clash]) {
    clashes.sort_by_key(|c| c.severity);
}

/// Serialises progress reports and keeps them non-decreasing
struct ProgressReporter {
    callback: Option<ProgressCallback>,
    last: Mutex<f64>,
}

impl ProgressReporter {
    fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            last: Mutex::new(0.0),
        }
    }

    fn report(&self, done: usize, total: usize) {
        let Some(callback) = &self.callback else {
            return;
        };
        let pct = if total == 0 {
            100.0
        } else {
            done as f64 / total as f64 * 100.0
        };
        let mut last = self.last.lock();
        if pct >= *last {
            *last = pct;
            callback(pct);
        }
    }
}

/// Registered elements plus the spatial hash built from them
#[derive(Clone, Debug)]
pub struct ClashScene {
    store: ElementStore,
    grid: SpatialHash,
    narrow: NarrowPhase,
    progress_interval: usize,
    progress_stride: usize,
}

impl ClashScene {
    /// Validate `config`, store the indexable elements and build the grid
    pub fn build(
        elements: impl IntoIterator<Item = Element>,
        config: &ClashConfig,
    ) -> Result<(Self, RegistrationReport)> {
        config.validate()?;
        Ok(Self::build_unchecked(elements, config))
    }

    pub(crate) fn build_unchecked(
        elements: impl IntoIterator<Item = Element>,
        config: &ClashConfig,
    ) -> (Self, RegistrationReport) {
        let (store, report) = ElementStore::from_elements(elements);
        let mut grid = SpatialHash::new(config.grid_size, config.index_mode, config.margin());
        grid.build(store.as_slice());

        let scene = Self {
            store,
            grid,
            narrow: NarrowPhase::new(config.margin()),
            progress_interval: config.progress_interval,
            progress_stride: config.progress_stride(),
        };
        (scene, report)
    }

    /// Scene with no elements
    pub fn empty(config: &ClashConfig) -> Self {
        Self::build_unchecked(Vec::new(), config).0
    }

    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    pub fn grid(&self) -> &SpatialHash {
        &self.grid
    }

    /// Candidate slots for the element at `slot`, excluding itself
    pub fn candidates(&self, slot: usize) -> Vec<usize> {
        match self.store.at(slot) {
            Some(element) => self
                .grid
                .query(element)
                .into_iter()
                .filter(|&s| s != slot)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Detect clashes, sorted by severity
    pub fn detect(&self, options: &DetectOptions) -> Result<DetectionOutcome> {
        let mut outcome = self.scan(options)?;
        sort_by_severity(&mut outcome.clashes);
        Ok(outcome)
    }

    /// Detect clashes, yielding to the executor between batches
    ///
    /// Output is identical to [`detect`](Self::detect) run sequentially;
    /// `options.parallel` is ignored.
    pub async fn detect_async(&self, options: &DetectOptions) -> Result<DetectionOutcome> {
        let mut outcome = self.scan_async(options).await?;
        sort_by_severity(&mut outcome.clashes);
        Ok(outcome)
    }

    /// Async scan without sorting
    pub async fn scan_async(&self, options: &DetectOptions) -> Result<DetectionOutcome> {
        options.validate()?;
        let mut scan = Scan::new(self, options);
        while scan.step() {
            yield_now().await;
        }
        Ok(scan.finish())
    }

    /// Scan without sorting; clashes are in discovery order
    pub fn scan(&self, options: &DetectOptions) -> Result<DetectionOutcome> {
        options.validate()?;
        if options.parallel {
            return Ok(self.scan_parallel(options));
        }
        let mut scan = Scan::new(self, options);
        while scan.step() {}
        Ok(scan.finish())
    }

    /// Analyse every candidate of one element
    ///
    /// Pairs are only analysed from the lower slot, so each unordered pair
    /// is considered once per run.
    fn scan_element(
        &self,
        slot: usize,
        options: &DetectOptions,
        candidates: &mut Vec<usize>,
        seen: &mut FxHashSet<usize>,
        clashes: &mut Vec<Clash>,
    ) -> usize {
        let a = &self.store.as_slice()[slot];
        if options.is_ignored(a) {
            return 0;
        }

        self.grid.query_into(a, candidates, seen);
        let mut tested = 0;
        for &other in candidates.iter() {
            if other <= slot {
                continue;
            }
            let b = &self.store.as_slice()[other];
            if options.is_ignored(b) {
                continue;
            }
            tested += 1;
            if let Some(clash) = self.narrow.analyze(a, b) {
                if clash.intersection_volume >= options.min_volume {
                    clashes.push(clash);
                }
            }
        }
        tested
    }

    fn scan_parallel(&self, options: &DetectOptions) -> DetectionOutcome {
        let total = self.store.len();
        let stride = self.progress_stride;
        let reporter = ProgressReporter::new(options.progress.clone());
        let done = AtomicUsize::new(0);

        reporter.report(0, total);
        let per_element: Vec<Option<(Vec<Clash>, usize)>> = (0..total)
            .into_par_iter()
            .map_init(
                || (Vec::new(), FxHashSet::default()),
                |(candidates, seen), slot| {
                    if options.is_cancelled() {
                        return None;
                    }
                    let mut clashes = Vec::new();
                    let tested = self.scan_element(slot, options, candidates, seen, &mut clashes);
                    let finished = done.fetch_add(1, Ordering::AcqRel) + 1;
                    if finished % stride == 0 {
                        reporter.report(finished, total);
                    }
                    Some((clashes, tested))
                },
            )
            .collect();

        let processed = per_element.iter().filter(|r| r.is_some()).count();
        let mut clashes = Vec::new();
        let mut pairs_tested = 0;
        for (found, tested) in per_element.into_iter().flatten() {
            clashes.extend(found);
            pairs_tested += tested;
        }

        let status = if processed == total {
            reporter.report(total, total);
            DetectionStatus::Complete
        } else {
            log::info!("Clash scan cancelled after {}/{} elements", processed, total);
            DetectionStatus::Cancelled { processed, total }
        };
        log::debug!(
            "Parallel scan tested {} pairs, {} clashes",
            pairs_tested,
            clashes.len()
        );

        DetectionOutcome {
            clashes,
            status,
            pairs_tested,
        }
    }
}

/// Sequential scan, advanced one batch of `progress_interval` elements at a time
///
/// Cancellation is checked between batches; progress is reported every
/// `progress_stride` elements within them.
struct Scan<'a> {
    scene: &'a ClashScene,
    options: &'a DetectOptions,
    reporter: ProgressReporter,
    next: usize,
    clashes: Vec<Clash>,
    pairs_tested: usize,
    candidates: Vec<usize>,
    seen: FxHashSet<usize>,
    cancelled: bool,
}

impl<'a> Scan<'a> {
    fn new(scene: &'a ClashScene, options: &'a DetectOptions) -> Self {
        Self {
            scene,
            options,
            reporter: ProgressReporter::new(options.progress.clone()),
            next: 0,
            clashes: Vec::new(),
            pairs_tested: 0,
            candidates: Vec::new(),
            seen: FxHashSet::default(),
            cancelled: false,
        }
    }

    /// Process one batch; returns whether work remains
    fn step(&mut self) -> bool {
        let total = self.scene.store.len();
        if self.next >= total {
            return false;
        }
        if self.options.is_cancelled() {
            self.cancelled = true;
            return false;
        }

        let end = (self.next + self.scene.progress_interval).min(total);
        for slot in self.next..end {
            if slot % self.scene.progress_stride == 0 {
                self.reporter.report(slot, total);
            }
            self.pairs_tested += self.scene.scan_element(
                slot,
                self.options,
                &mut self.candidates,
                &mut self.seen,
                &mut self.clashes,
            );
        }
        self.next = end;
        self.next < total
    }

    fn finish(self) -> DetectionOutcome {
        let total = self.scene.store.len();
        let status = if self.cancelled {
            log::info!("Clash scan cancelled after {}/{} elements", self.next, total);
            DetectionStatus::Cancelled {
                processed: self.next,
                total,
            }
        } else {
            self.reporter.report(total, total);
            DetectionStatus::Complete
        };
        log::debug!(
            "Scan tested {} pairs, {} clashes",
            self.pairs_tested,
            self.clashes.len()
        );

        DetectionOutcome {
            clashes: self.clashes,
            status,
            pairs_tested: self.pairs_tested,
        }
    }
}

/// Yield once to the executor
async fn yield_now() {
    let mut yielded = false;
    futures_util::future::poll_fn(|cx| {
        if yielded {
            Poll::Ready(())
        } else {
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    })
    .await
}
