//! Hit testing and scoring against the bird's inset hitbox.

use crate::config::GameConfig;
use crate::obstacles::{Obstacle, Obstacles};
use crate::physics::Bird;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hitbox {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Hitbox {
    /// The sprite square shrunk by `hitbox_inset` on every side, so grazing a
    /// pipe with a feather doesn't end the run.
    pub fn of(bird: &Bird, config: &GameConfig) -> Self {
        let inset = config.hitbox_inset;
        Self {
            left: config.bird_x + inset,
            right: config.bird_x + config.bird_size - inset,
            top: bird.y + inset,
            bottom: bird.y + config.bird_size - inset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crash {
    Ground,
    Ceiling,
    /// Hit the obstacle with this id.
    Obstacle(u64),
}

/// Touching the ground line or the top of the screen counts.
pub fn world_bounds(hitbox: &Hitbox, config: &GameConfig) -> Option<Crash> {
    if hitbox.bottom >= config.sky_height() {
        Some(Crash::Ground)
    } else if hitbox.top <= 0.0 {
        Some(Crash::Ceiling)
    } else {
        None
    }
}

/// Horizontal overlap is strict; only the open interior of the gap is safe,
/// so a hitbox tangent to either gap edge collides.
pub fn hits_obstacle(hitbox: &Hitbox, obstacle: &Obstacle, config: &GameConfig) -> bool {
    let overlaps = hitbox.right > obstacle.x && hitbox.left < obstacle.right(config.obstacle_width);
    if !overlaps {
        return false;
    }
    let gap_top = obstacle.gap_top as f64;
    let gap_bottom = gap_top + config.gap_size as f64;
    hitbox.top <= gap_top || hitbox.bottom >= gap_bottom
}

pub fn first_obstacle_hit(
    hitbox: &Hitbox,
    obstacles: &Obstacles,
    config: &GameConfig,
) -> Option<Crash> {
    obstacles
        .iter()
        .find(|o| hits_obstacle(hitbox, o, config))
        .map(|o| Crash::Obstacle(o.id))
}

/// Marks every obstacle the hitbox has fully cleared. Returns the points
/// earned; an obstacle can only ever pay out once.
pub fn award_passes(hitbox: &Hitbox, obstacles: &mut Obstacles, config: &GameConfig) -> u32 {
    let mut points = 0;
    for obstacle in obstacles.iter_mut() {
        if !obstacle.scored && hitbox.left > obstacle.right(config.obstacle_width) {
            obstacle.scored = true;
            points += 1;
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GameConfig {
        GameConfig::default()
    }

    fn pipe(x: f64, gap_top: u32) -> Obstacle {
        Obstacle {
            id: 7,
            x,
            gap_top,
            scored: false,
        }
    }

    #[test]
    fn hitbox_is_inset() {
        let config = config();
        let hb = Hitbox::of(&Bird::at_rest(100.0), &config);
        assert_eq!(
            hb,
            Hitbox {
                left: 56.0,
                right: 74.0,
                top: 106.0,
                bottom: 124.0
            }
        );
    }

    #[test]
    fn ground_and_ceiling() {
        let config = config();
        // bottom = y + 24 touches 550
        let on_ground = Hitbox::of(&Bird::at_rest(526.0), &config);
        assert_eq!(world_bounds(&on_ground, &config), Some(Crash::Ground));

        let on_ceiling = Hitbox::of(&Bird::at_rest(-6.0), &config);
        assert_eq!(world_bounds(&on_ceiling, &config), Some(Crash::Ceiling));

        let flying = Hitbox::of(&Bird::at_rest(300.0), &config);
        assert_eq!(world_bounds(&flying, &config), None);
    }

    #[test]
    fn inside_gap_is_safe() {
        let config = config();
        // Gap 200..360; hitbox 250..268
        let hb = Hitbox::of(&Bird::at_rest(244.0), &config);
        assert!(!hits_obstacle(&hb, &pipe(40.0, 200), &config));
    }

    #[test]
    fn tangent_to_gap_edges_collides() {
        let config = config();
        let top_tangent = Hitbox::of(&Bird::at_rest(194.0), &config);
        assert_eq!(top_tangent.top, 200.0);
        assert!(hits_obstacle(&top_tangent, &pipe(40.0, 200), &config));

        let bottom_tangent = Hitbox::of(&Bird::at_rest(336.0), &config);
        assert_eq!(bottom_tangent.bottom, 360.0);
        assert!(hits_obstacle(&bottom_tangent, &pipe(40.0, 200), &config));
    }

    #[test]
    fn no_overlap_no_hit() {
        let config = config();
        let hb = Hitbox::of(&Bird::at_rest(0.0), &config);
        // Pipe starts exactly at the hitbox's right edge: strict overlap says no.
        assert!(!hits_obstacle(&hb, &pipe(74.0, 200), &config));
        // Pipe ends exactly at the hitbox's left edge.
        assert!(!hits_obstacle(&hb, &pipe(6.0, 200), &config));
        assert!(hits_obstacle(&hb, &pipe(73.0, 200), &config));
    }

    #[test]
    fn first_hit_reports_obstacle_id() {
        let config = config();
        let mut obstacles = Obstacles::new();
        obstacles.push(pipe(200.0, 100));
        obstacles.push(Obstacle { id: 9, ..pipe(50.0, 300) });
        let hb = Hitbox::of(&Bird::at_rest(100.0), &config);
        assert_eq!(
            first_obstacle_hit(&hb, &obstacles, &config),
            Some(Crash::Obstacle(9))
        );
    }

    #[test]
    fn passes_pay_out_once() {
        let config = config();
        let mut obstacles = Obstacles::new();
        obstacles.push(pipe(0.0, 200));
        let hb = Hitbox::of(&Bird::at_rest(250.0), &config);

        // Right edge at 50, hitbox left at 56.
        assert_eq!(award_passes(&hb, &mut obstacles, &config), 1);
        assert_eq!(award_passes(&hb, &mut obstacles, &config), 0);
        assert!(obstacles.iter().all(|o| o.scored));
    }

    #[test]
    fn right_edge_level_with_hitbox_is_not_a_pass() {
        let config = config();
        let mut obstacles = Obstacles::new();
        obstacles.push(pipe(6.0, 200));
        let hb = Hitbox::of(&Bird::at_rest(250.0), &config);
        assert_eq!(award_passes(&hb, &mut obstacles, &config), 0);
    }
}
