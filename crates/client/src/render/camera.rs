use glam::Vec2;
use racer::Snapshot;

/// Follows the midpoint of all players with a first-order low-pass filter.
///
/// The filter advances once per `update`, i.e. once per received snapshot, so
/// how fast the view settles depends on the server's broadcast rate.
#[derive(Debug, Clone)]
pub struct CameraController {
    offset: Vec2,
    viewport: Vec2,
    smoothing: f32,
}

impl CameraController {
    pub fn new(viewport: Vec2, smoothing: f32) -> Self {
        Self {
            offset: Vec2::ZERO,
            viewport,
            smoothing,
        }
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// The translation that would centre `snapshot`'s players in the view.
    pub fn target(&self, snapshot: &Snapshot) -> Option<Vec2> {
        snapshot
            .mean_player_position()
            .map(|mean| self.viewport * 0.5 - mean)
    }

    pub fn update(&mut self, snapshot: &Snapshot) {
        let Some(target) = self.target(snapshot) else {
            return;
        };
        self.offset += (target - self.offset) * self.smoothing;
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use racer::{Player, PlayerId};

    fn snapshot_at(points: &[(f32, f32)]) -> Snapshot {
        Snapshot {
            players: points
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| Player {
                    id: PlayerId::new((i + 1).to_string()),
                    x,
                    y,
                    angle: 0.0,
                    checkpoint: 0,
                    speed: 0.0,
                    finished: false,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn target_centres_player_midpoint() {
        let camera = CameraController::new(Vec2::new(800.0, 600.0), 0.1);
        let snapshot = snapshot_at(&[(100.0, 200.0), (300.0, 400.0)]);

        assert_eq!(camera.target(&snapshot), Some(Vec2::new(200.0, 0.0)));
    }

    #[test]
    fn converges_geometrically() {
        let mut camera = CameraController::new(Vec2::new(800.0, 600.0), 0.1);
        let snapshot = snapshot_at(&[(100.0, 100.0)]);
        let target = camera.target(&snapshot).unwrap();
        let origin = camera.offset();

        for n in 1..=50 {
            camera.update(&snapshot);
            let expected = target - (target - origin) * 0.9_f32.powi(n);
            assert!(
                (camera.offset() - expected).length() < 1e-2,
                "step {n}: {:?} vs {:?}",
                camera.offset(),
                expected
            );
            assert_ne!(camera.offset(), target);
        }
    }

    #[test]
    fn empty_snapshot_leaves_offset_unchanged() {
        let mut camera = CameraController::new(Vec2::new(800.0, 600.0), 0.1);
        camera.update(&snapshot_at(&[(0.0, 0.0)]));
        let before = camera.offset();

        camera.update(&Snapshot::default());
        assert_eq!(camera.offset(), before);
    }
}
