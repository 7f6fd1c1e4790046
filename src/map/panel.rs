use std::time::{Duration, Instant};

use egui::{Ui, Vec2};
use tokio::sync::mpsc;

use crate::geo::atlas::{AtlasError, WorldAtlas};
use crate::geo::microstates::MicroState;
use crate::geo::projection::AzimuthalProjection;
use crate::geo::roster::AllianceRoster;
use crate::map::config::{MapConfig, BUILD_RETRY_DELAY, MAX_BUILD_ATTEMPTS, RESIZE_DEBOUNCE};
use crate::map::scene::MapScene;
use crate::map::widget::AllianceMap;
use crate::net::atlas_retriever::AtlasRetriever;
use crate::util::debounce::Debouncer;
use crate::util::retry::{RetryOutcome, RetrySchedule};

type FetchResult = Result<WorldAtlas, AtlasError>;
type ReadyCallback = Box<dyn FnMut(&AzimuthalProjection)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapPhase {
    Uninitialized,
    LoadingData,
    AwaitingContainer,
    Building,
    Ready,
    Failed,
}

/// Owns the whole lifecycle of the alliance map: the one-shot atlas
/// fetch, the bounded build-retry loop while the container has no size,
/// the debounced resize rebuilds, and teardown.
pub struct MapPanel {
    config: MapConfig,
    roster: AllianceRoster,
    micro_states: Vec<MicroState>,
    phase: MapPhase,
    atlas: Option<WorldAtlas>,
    scene: Option<MapScene>,
    receiver: mpsc::UnboundedReceiver<FetchResult>,
    retry: RetrySchedule,
    debounce: Debouncer,
    observed_size: Vec2,
    layout_requested: bool,
    on_ready: Option<ReadyCallback>,
}

impl MapPanel {
    /// Spawns the atlas fetch on the given runtime and starts the panel
    /// in `LoadingData`. The fetch result comes back over a channel and
    /// wakes the UI through `request_repaint`.
    pub fn new(
        retriever: AtlasRetriever,
        runtime: &tokio::runtime::Runtime,
        egui_ctx: egui::Context,
        config: MapConfig,
        roster: AllianceRoster,
        micro_states: Vec<MicroState>,
    ) -> Self {
        if roster.is_empty() {
            log::warn!("alliance roster is empty; every country will render in the base color");
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        runtime.spawn(async move {
            let result = retriever.fetch_atlas().await;
            if sender.send(result).is_err() {
                log::warn!("atlas fetch finished after map teardown, discarding result");
            }
            egui_ctx.request_repaint();
        });

        Self {
            config,
            roster,
            micro_states,
            phase: MapPhase::LoadingData,
            atlas: None,
            scene: None,
            receiver,
            retry: RetrySchedule::new(MAX_BUILD_ATTEMPTS, BUILD_RETRY_DELAY),
            debounce: Debouncer::new(RESIZE_DEBOUNCE),
            observed_size: Vec2::ZERO,
            layout_requested: false,
            on_ready: None,
        }
    }

    pub fn phase(&self) -> MapPhase {
        self.phase
    }

    /// The projection in use once the scene is built, for parents that
    /// want to anchor their own overlay content to the same transform.
    pub fn projection(&self) -> Option<&AzimuthalProjection> {
        self.scene.as_ref().map(|scene| &scene.projection)
    }

    /// Called once when the scene is first built.
    pub fn set_on_ready(&mut self, callback: ReadyCallback) {
        self.on_ready = Some(callback);
    }

    /// Manual layout recompute, for parents that need one outside the
    /// automatic size observation. Idempotent under a stable size.
    pub fn request_layout(&mut self) {
        self.layout_requested = true;
    }

    /// Drops every held resource: scene, atlas, pending debounce
    /// deadline, ready callback, and the fetch channel. Safe to call in
    /// any phase and more than once.
    pub fn teardown(&mut self) {
        self.scene = None;
        self.atlas = None;
        self.debounce.cancel();
        self.on_ready = None;
        self.receiver.close();
        self.phase = MapPhase::Uninitialized;
    }

    /// Drives the state machine for this frame, then renders whatever the
    /// current phase allows.
    pub fn ui(&mut self, ui: &mut Ui) -> Option<egui::Response> {
        let measured = ui.available_size();
        if let Some(wake) = self.advance(Instant::now(), measured) {
            ui.ctx().request_repaint_after(wake);
        }

        match self.phase {
            MapPhase::LoadingData => {
                ui.centered_and_justified(|ui| ui.spinner());
                None
            }
            MapPhase::Failed => {
                ui.centered_and_justified(|ui| ui.label("world map unavailable"));
                None
            }
            _ => self
                .scene
                .as_ref()
                .map(|scene| ui.add(AllianceMap::new(scene, self.config.tooltip_offset))),
        }
    }

    /// One step of the lifecycle. Returns how soon another step is due,
    /// if a retry or debounce deadline is pending.
    fn advance(&mut self, now: Instant, measured: Vec2) -> Option<Duration> {
        self.poll_fetch();

        match self.phase {
            MapPhase::Uninitialized | MapPhase::LoadingData | MapPhase::Failed => None,
            MapPhase::AwaitingContainer | MapPhase::Building => self.try_build(now, measured),
            MapPhase::Ready => self.maintain(now, measured),
        }
    }

    fn poll_fetch(&mut self) {
        while let Ok(result) = self.receiver.try_recv() {
            if self.phase != MapPhase::LoadingData {
                log::debug!("ignoring atlas fetch result in phase {:?}", self.phase);
                continue;
            }
            match result {
                Ok(atlas) => {
                    self.atlas = Some(atlas);
                    self.phase = MapPhase::AwaitingContainer;
                }
                Err(err) => {
                    log::error!("world atlas load failed: {err}");
                    self.phase = MapPhase::Failed;
                }
            }
        }
    }

    fn try_build(&mut self, now: Instant, measured: Vec2) -> Option<Duration> {
        if !self.retry.ready(now) {
            return self.retry.remaining(now);
        }
        let Some(atlas) = &self.atlas else {
            return None;
        };

        self.phase = MapPhase::Building;
        match MapScene::build(atlas, &self.micro_states, &self.roster, &self.config, measured) {
            Ok(scene) => {
                self.observed_size = measured;
                self.scene = Some(scene);
                self.phase = MapPhase::Ready;
                log::info!(
                    "map scene built at {:.0}x{:.0} after {} failed attempts",
                    measured.x,
                    measured.y,
                    self.retry.attempts()
                );
                if let (Some(callback), Some(scene)) = (&mut self.on_ready, &self.scene) {
                    callback(&scene.projection);
                }
                None
            }
            Err(err) => match self.retry.record_failure(now) {
                RetryOutcome::Retry => {
                    log::debug!("map construction attempt failed, will retry: {err}");
                    self.retry.remaining(now)
                }
                RetryOutcome::Exhausted => {
                    log::error!(
                        "map construction failed after {} attempts: {err}",
                        self.retry.attempts()
                    );
                    self.phase = MapPhase::Failed;
                    None
                }
            },
        }
    }

    fn maintain(&mut self, now: Instant, measured: Vec2) -> Option<Duration> {
        if self.layout_requested {
            self.layout_requested = false;
            self.debounce.cancel();
            self.rebuild(measured);
            return None;
        }

        let current = self.scene.as_ref().map(|s| s.size).unwrap_or(Vec2::ZERO);
        if (measured - current).length() > 0.5 && measured != self.observed_size {
            self.debounce.notify(now);
        }
        self.observed_size = measured;

        if self.debounce.fire(now) {
            self.rebuild(self.observed_size);
        }
        self.debounce.remaining(now)
    }

    fn rebuild(&mut self, size: Vec2) {
        let Some(atlas) = &self.atlas else { return };
        match MapScene::build(atlas, &self.micro_states, &self.roster, &self.config, size) {
            Ok(scene) => self.scene = Some(scene),
            // Keep the previous scene; the next size change tries again.
            Err(err) => log::warn!("layout recompute failed: {err}"),
        }
    }

    #[cfg(test)]
    fn with_atlas(atlas: WorldAtlas) -> Self {
        let (_sender, receiver) = mpsc::unbounded_channel();
        Self {
            config: MapConfig::default(),
            roster: AllianceRoster::from_names(["Norway", "Sweden"]),
            micro_states: vec![MicroState::new("Monaco", 7.42, 43.73)],
            phase: MapPhase::AwaitingContainer,
            atlas: Some(atlas),
            scene: None,
            receiver,
            retry: RetrySchedule::new(MAX_BUILD_ATTEMPTS, BUILD_RETRY_DELAY),
            debounce: Debouncer::new(RESIZE_DEBOUNCE),
            observed_size: Vec2::ZERO,
            layout_requested: false,
            on_ready: None,
        }
    }
}

impl Drop for MapPanel {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::atlas::{CountryFeature, PolygonRings};
    use egui::vec2;

    fn test_atlas() -> WorldAtlas {
        WorldAtlas {
            features: vec![CountryFeature {
                name: "Norway".to_owned(),
                polygons: vec![PolygonRings {
                    exterior: vec![
                        (5.0, 58.0),
                        (15.0, 58.0),
                        (15.0, 68.0),
                        (5.0, 68.0),
                        (5.0, 58.0),
                    ],
                    holes: vec![],
                }],
            }],
        }
    }

    #[test]
    fn builds_once_the_container_gains_size() {
        let mut panel = MapPanel::with_atlas(test_atlas());
        let mut now = Instant::now();

        panel.advance(now, Vec2::ZERO);
        assert_ne!(panel.phase(), MapPhase::Ready);

        now += BUILD_RETRY_DELAY;
        panel.advance(now, vec2(800.0, 600.0));
        assert_eq!(panel.phase(), MapPhase::Ready);
        assert!(panel.projection().is_some());
    }

    #[test]
    fn zero_size_forever_exhausts_the_attempt_bound() {
        let mut panel = MapPanel::with_atlas(test_atlas());
        let mut now = Instant::now();

        for _ in 0..MAX_BUILD_ATTEMPTS {
            panel.advance(now, Vec2::ZERO);
            now += BUILD_RETRY_DELAY;
        }
        assert_eq!(panel.phase(), MapPhase::Failed);

        // Terminal: a late size change does not revive it.
        panel.advance(now, vec2(800.0, 600.0));
        assert_eq!(panel.phase(), MapPhase::Failed);
    }

    #[test]
    fn resize_burst_collapses_to_one_rebuild_at_final_size() {
        let mut panel = MapPanel::with_atlas(test_atlas());
        let mut now = Instant::now();
        panel.advance(now, vec2(800.0, 600.0));
        assert_eq!(panel.phase(), MapPhase::Ready);
        let initial = panel.scene.as_ref().unwrap().projection.clone();

        for i in 1..=5 {
            now += Duration::from_millis(20);
            panel.advance(now, vec2(800.0 - 10.0 * i as f32, 600.0));
            // Still the old scene while the debounce window is open.
            assert_eq!(panel.scene.as_ref().unwrap().projection, initial);
        }

        now += RESIZE_DEBOUNCE;
        panel.advance(now, vec2(750.0, 600.0));
        let rebuilt = panel.scene.as_ref().unwrap();
        assert_eq!(rebuilt.size, vec2(750.0, 600.0));
        assert_ne!(rebuilt.projection, initial);
        assert!(!panel.debounce.pending());
    }

    #[test]
    fn manual_recompute_is_idempotent_under_stable_size() {
        let mut panel = MapPanel::with_atlas(test_atlas());
        let now = Instant::now();
        let size = vec2(640.0, 480.0);
        panel.advance(now, size);

        panel.request_layout();
        panel.advance(now + Duration::from_millis(1), size);
        let first = panel.scene.as_ref().unwrap().clone();

        panel.request_layout();
        panel.advance(now + Duration::from_millis(2), size);
        let second = panel.scene.as_ref().unwrap();

        assert_eq!(first.projection, second.projection);
        for (a, b) in first.countries.iter().zip(&second.countries) {
            assert_eq!(a.rings, b.rings);
        }
    }

    #[test]
    fn failed_rebuild_keeps_previous_scene_and_phase() {
        let mut panel = MapPanel::with_atlas(test_atlas());
        let mut now = Instant::now();
        panel.advance(now, vec2(800.0, 600.0));
        assert_eq!(panel.phase(), MapPhase::Ready);
        let before = panel.scene.as_ref().unwrap().projection.clone();

        // Container collapses; the debounced rebuild fails.
        now += Duration::from_millis(20);
        panel.advance(now, Vec2::ZERO);
        now += RESIZE_DEBOUNCE;
        panel.advance(now, Vec2::ZERO);

        assert_eq!(panel.phase(), MapPhase::Ready);
        let after = panel.scene.as_ref().unwrap();
        assert_eq!(after.projection, before);
        assert_eq!(after.size, vec2(800.0, 600.0));
        assert!(!panel.debounce.pending());

        // Still zero: no further rebuild attempt is armed.
        now += Duration::from_millis(20);
        panel.advance(now, Vec2::ZERO);
        assert!(!panel.debounce.pending());

        // A manual recompute against the collapsed container keeps the
        // scene as well.
        panel.request_layout();
        now += Duration::from_millis(20);
        panel.advance(now, Vec2::ZERO);
        assert_eq!(panel.phase(), MapPhase::Ready);
        assert_eq!(panel.scene.as_ref().unwrap().projection, before);
    }

    #[test]
    fn ready_event_fires_once_with_the_projection() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut panel = MapPanel::with_atlas(test_atlas());
        let fired = Rc::new(Cell::new(0u32));
        let seen = fired.clone();
        panel.set_on_ready(Box::new(move |projection| {
            assert!(projection.scale() > 0.0);
            seen.set(seen.get() + 1);
        }));

        let now = Instant::now();
        panel.advance(now, vec2(800.0, 600.0));
        panel.advance(now + Duration::from_millis(10), vec2(800.0, 600.0));
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn teardown_is_idempotent_and_reachable_from_any_phase() {
        let mut panel = MapPanel::with_atlas(test_atlas());
        panel.advance(Instant::now(), vec2(800.0, 600.0));
        assert_eq!(panel.phase(), MapPhase::Ready);

        panel.teardown();
        assert_eq!(panel.phase(), MapPhase::Uninitialized);
        assert!(panel.scene.is_none());
        assert!(panel.atlas.is_none());
        assert!(!panel.debounce.pending());

        panel.teardown();
        assert_eq!(panel.phase(), MapPhase::Uninitialized);
    }
}
