//! Gated obstacles: spawning on a cadence, leftward drift, eviction.

use std::collections::VecDeque;

use rand::Rng;

use crate::config::GameConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    /// Frame number the obstacle was spawned on. Unique within a run.
    pub id: u64,
    /// Left edge.
    pub x: f64,
    /// Height of the upper pipe; the gap spans `gap_top..gap_top + gap_size`.
    pub gap_top: u32,
    pub scored: bool,
}

impl Obstacle {
    pub fn right(&self, width: f64) -> f64 {
        self.x + width
    }
}

/// Obstacles in spawn order. Spawn order is left-to-right order because
/// every obstacle drifts at the same speed, so the front is always the
/// leftmost.
#[derive(Debug, Clone, Default)]
pub struct Obstacles {
    queue: VecDeque<Obstacle>,
}

impl Obstacles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.queue.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Obstacle> {
        self.queue.iter_mut()
    }

    pub fn as_deque(&self) -> &VecDeque<Obstacle> {
        &self.queue
    }

    /// Spawns at the right edge of the world when `frame` lands on the
    /// cadence. Returns the new obstacle's id.
    pub fn maybe_spawn(
        &mut self,
        config: &GameConfig,
        frame: u64,
        cadence: u32,
        rng: &mut impl Rng,
    ) -> Option<u64> {
        if cadence == 0 || frame % cadence as u64 != 0 {
            return None;
        }
        let gap_top = rng.gen_range(config.min_gap_top..=config.max_gap_top());
        self.queue.push_back(Obstacle {
            id: frame,
            x: config.world_width,
            gap_top,
            scored: false,
        });
        Some(frame)
    }

    pub fn advance(&mut self, speed: f64) {
        for obstacle in &mut self.queue {
            obstacle.x -= speed;
        }
    }

    /// Drops expired obstacles from the front. With spawn spacing wider than
    /// one tick of travel this removes at most one, but it keeps going in
    /// case the ramp ever allows more.
    pub fn evict_expired(&mut self, width: f64) -> usize {
        let mut evicted = 0;
        while self
            .queue
            .front()
            .is_some_and(|front| front.right(width) < 0.0)
        {
            self.queue.pop_front();
            evicted += 1;
        }
        evicted
    }

    #[cfg(test)]
    pub(crate) fn push(&mut self, obstacle: Obstacle) {
        self.queue.push_back(obstacle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn create_test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(12345)
    }

    fn obstacle(id: u64, x: f64) -> Obstacle {
        Obstacle {
            id,
            x,
            gap_top: 100,
            scored: false,
        }
    }

    #[test]
    fn spawns_only_on_cadence() {
        let config = GameConfig::default();
        let mut rng = create_test_rng();
        let mut obstacles = Obstacles::new();

        for frame in 1..100 {
            assert_eq!(obstacles.maybe_spawn(&config, frame, 100, &mut rng), None);
        }
        assert_eq!(obstacles.maybe_spawn(&config, 100, 100, &mut rng), Some(100));
        assert_eq!(obstacles.len(), 1);

        let spawned = obstacles.iter().next().unwrap();
        assert_eq!(spawned.x, config.world_width);
        assert!(!spawned.scored);
    }

    #[test]
    fn gap_top_stays_within_bounds() {
        let config = GameConfig::default();
        let mut rng = create_test_rng();
        let mut obstacles = Obstacles::new();

        for frame in 1..=500 {
            obstacles.maybe_spawn(&config, frame, 1, &mut rng);
        }
        for o in obstacles.iter() {
            assert!(o.gap_top >= config.min_gap_top);
            assert!(o.gap_top <= config.max_gap_top());
            assert!((o.gap_top + config.gap_size) as f64 <= config.sky_height());
        }
    }

    #[test]
    fn advance_moves_every_obstacle() {
        let mut obstacles = Obstacles::new();
        obstacles.push(obstacle(1, 100.0));
        obstacles.push(obstacle(2, 300.0));

        obstacles.advance(3.5);

        let xs: Vec<f64> = obstacles.iter().map(|o| o.x).collect();
        assert_eq!(xs, vec![96.5, 296.5]);
    }

    #[test]
    fn evicts_once_right_edge_is_off_screen() {
        let mut obstacles = Obstacles::new();
        obstacles.push(obstacle(1, -50.0));
        obstacles.push(obstacle(2, 150.0));

        // Right edge exactly on the boundary stays.
        assert_eq!(obstacles.evict_expired(50.0), 0);

        obstacles.advance(0.5);
        assert_eq!(obstacles.evict_expired(50.0), 1);
        assert_eq!(obstacles.iter().next().map(|o| o.id), Some(2));
    }

    #[test]
    fn evicts_every_expired_front_obstacle() {
        let mut obstacles = Obstacles::new();
        obstacles.push(obstacle(1, -90.0));
        obstacles.push(obstacle(2, -60.0));
        obstacles.push(obstacle(3, 10.0));

        assert_eq!(obstacles.evict_expired(50.0), 2);
        assert_eq!(obstacles.len(), 1);
    }
}
