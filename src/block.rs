//! Block physics: gravity, ground snap, landing on stable blocks.
//!
//! World units are "pixels" of an 800x600 playfield; y grows downwards.

/// World width.
pub const SCREEN_WIDTH: f32 = 800.0;
/// World height.
pub const SCREEN_HEIGHT: f32 = 600.0;
/// Ground strip at the bottom of the world.
pub const GROUND_HEIGHT: f32 = 50.0;
/// y of the ground line (top of the ground strip).
pub const GROUND_LINE: f32 = SCREEN_HEIGHT - GROUND_HEIGHT;

pub const BLOCK_WIDTH: f32 = 80.0;
pub const BLOCK_HEIGHT: f32 = 40.0;

/// Velocity added per tick while falling.
pub const GRAVITY: f32 = 0.5;
/// Terminal fall speed per tick.
pub const FALL_SPEED_LIMIT: f32 = 15.0;

/// How far below the world a block's top edge may go before it counts as lost.
pub const OFF_SCREEN_MARGIN: f32 = 100.0;

/// Minimum share of the falling block's width that must rest on the block below.
const STABLE_OVERLAP_RATIO: f32 = 0.3;

/// One rectangle in the tower.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Palette index; only the renderer cares.
    pub color_index: u8,
    pub velocity_y: f32,
    pub is_placed: bool,
    pub is_stable: bool,
}

impl Block {
    pub fn new(x: f32, y: f32, color_index: u8) -> Self {
        Self::with_size(x, y, BLOCK_WIDTH, BLOCK_HEIGHT, color_index)
    }

    pub fn with_size(x: f32, y: f32, width: f32, height: f32, color_index: u8) -> Self {
        Self {
            x,
            y,
            width,
            height,
            color_index,
            velocity_y: 0.0,
            is_placed: false,
            is_stable: false,
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// True if the world point lies inside this block.
    #[inline]
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.left() && px < self.right() && py >= self.top() && py < self.bottom()
    }

    /// One physics step. `others` is the placed pool (it may contain a copy of this block).
    ///
    /// Lands on the first colliding stable block in pool order, not the highest one.
    pub fn update(&mut self, others: &[Block]) {
        if !self.is_placed || self.is_stable {
            return;
        }

        self.velocity_y = (self.velocity_y + GRAVITY).min(FALL_SPEED_LIMIT);
        self.y += self.velocity_y;

        // Ground wins over block landings in the same tick.
        if self.bottom() >= GROUND_LINE {
            self.y = GROUND_LINE - self.height;
            self.velocity_y = 0.0;
            self.is_stable = true;
            log::debug!("block at x={:.0} landed on ground", self.x);
            return;
        }

        // A copy of self in `others` is never stable here, so the stability filter skips it.
        let Some(support) = others
            .iter()
            .find(|other| other.is_stable && self.check_collision(other))
        else {
            return;
        };

        self.y = support.top() - self.height;
        self.velocity_y = 0.0;
        let overlap = self.horizontal_overlap(support);
        self.is_stable = overlap > self.width * STABLE_OVERLAP_RATIO;
        log::debug!(
            "block at x={:.0} hit block at x={:.0}, overlap {:.1}, stable={}",
            self.x,
            support.x,
            overlap,
            self.is_stable
        );
    }

    /// Rectangle intersection, evaluated from the falling block's side.
    pub fn check_collision(&self, other: &Block) -> bool {
        self.top() < other.bottom()
            && self.bottom() > other.top()
            && self.left() < other.right()
            && self.right() > other.left()
    }

    /// Width of the shared x-range; 0 when the blocks do not overlap horizontally.
    pub fn horizontal_overlap(&self, other: &Block) -> f32 {
        let left = self.left().max(other.left());
        let right = self.right().min(other.right());
        (right - left).max(0.0)
    }

    pub fn is_off_screen(&self) -> bool {
        self.y > SCREEN_HEIGHT + OFF_SCREEN_MARGIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn falling(x: f32, y: f32) -> Block {
        let mut b = Block::new(x, y, 0);
        b.is_placed = true;
        b
    }

    fn stable(x: f32, y: f32) -> Block {
        let mut b = falling(x, y);
        b.is_stable = true;
        b
    }

    #[test]
    fn new_block_is_at_rest_and_unplaced() {
        let b = Block::new(100.0, 100.0, 3);
        assert_eq!(b.width, BLOCK_WIDTH);
        assert_eq!(b.height, BLOCK_HEIGHT);
        assert_eq!(b.velocity_y, 0.0);
        assert!(!b.is_placed);
        assert!(!b.is_stable);
    }

    #[test]
    fn unplaced_block_does_not_move() {
        let mut b = Block::new(100.0, 100.0, 0);
        let before = b;
        b.update(&[]);
        assert_eq!(b, before);
    }

    #[test]
    fn stable_block_is_frozen() {
        let mut b = stable(100.0, 200.0);
        let before = b;
        b.update(&[]);
        assert_eq!(b, before);
    }

    #[test]
    fn free_fall_accelerates_by_gravity() {
        let mut b = falling(100.0, 100.0);
        b.update(&[]);
        assert_eq!(b.velocity_y, GRAVITY);
        assert_eq!(b.y, 100.0 + GRAVITY);

        b.update(&[]);
        assert_eq!(b.velocity_y, 2.0 * GRAVITY);
        assert_eq!(b.y, 100.0 + 3.0 * GRAVITY);
    }

    #[test]
    fn fall_speed_is_clamped() {
        let mut b = falling(100.0, 0.0);
        b.velocity_y = FALL_SPEED_LIMIT - 0.25;
        b.update(&[]);
        assert_eq!(b.velocity_y, FALL_SPEED_LIMIT);
        assert_eq!(b.y, FALL_SPEED_LIMIT);
    }

    #[test]
    fn ground_snap_stabilises_block() {
        let mut b = falling(100.0, GROUND_LINE - BLOCK_HEIGHT - 1.0);
        b.velocity_y = 5.0;
        b.update(&[]);
        assert_eq!(b.bottom(), GROUND_LINE);
        assert_eq!(b.velocity_y, 0.0);
        assert!(b.is_stable);
    }

    #[test]
    fn ground_takes_priority_over_block_landing() {
        // A stable block sitting on the ground overlaps the faller's path.
        let base = stable(100.0, GROUND_LINE - BLOCK_HEIGHT);
        let mut b = falling(100.0, GROUND_LINE - BLOCK_HEIGHT - 0.25);
        b.update(&[base]);
        assert_eq!(b.bottom(), GROUND_LINE);
        assert!(b.is_stable);
    }

    #[test]
    fn lands_on_stable_block_with_enough_overlap() {
        let base = stable(100.0, GROUND_LINE - BLOCK_HEIGHT);
        let mut b = falling(120.0, base.top() - BLOCK_HEIGHT - 0.25);
        b.update(&[base]);
        assert_eq!(b.bottom(), base.top());
        assert_eq!(b.velocity_y, 0.0);
        assert!(b.is_stable);
    }

    #[test]
    fn ignores_unstable_blocks() {
        let mut other = falling(100.0, 300.0);
        other.is_stable = false;
        let mut b = falling(100.0, 300.0 - BLOCK_HEIGHT);
        b.update(&[other]);
        assert!(!b.is_stable);
        assert_eq!(b.y, 300.0 - BLOCK_HEIGHT + GRAVITY);
    }

    #[test]
    fn overlap_at_threshold_is_not_stable() {
        let base = stable(100.0, GROUND_LINE - BLOCK_HEIGHT);
        // 24 units of overlap is exactly 30% of 80.
        let mut b = falling(100.0 + BLOCK_WIDTH - 24.0, base.top() - BLOCK_HEIGHT - 0.25);
        b.update(&[base]);
        assert_eq!(b.horizontal_overlap(&base), 24.0);
        assert_eq!(b.bottom(), base.top());
        assert_eq!(b.velocity_y, 0.0);
        assert!(!b.is_stable);
    }

    #[test]
    fn overlap_just_above_threshold_is_stable() {
        let base = stable(100.0, GROUND_LINE - BLOCK_HEIGHT);
        let mut b = falling(100.0 + BLOCK_WIDTH - 24.5, base.top() - BLOCK_HEIGHT - 0.25);
        b.update(&[base]);
        assert!(b.is_stable);
    }

    #[test]
    fn lands_on_first_stable_block_in_pool_order() {
        let low = stable(100.0, 400.0);
        let high = stable(100.0, 380.0);
        let mut b = falling(100.0, 346.0);
        b.velocity_y = 14.5;
        // After integration the faller spans 361..401 and touches both.
        b.update(&[low, high]);
        assert_eq!(b.bottom(), low.top());
    }

    #[test]
    fn collision_requires_both_axes() {
        let a = Block::new(100.0, 100.0, 0);
        assert!(a.check_collision(&Block::new(110.0, 110.0, 1)));
        assert!(!a.check_collision(&Block::new(200.0, 100.0, 1)));
        assert!(!a.check_collision(&Block::new(100.0, 140.0, 1)));
    }

    #[test]
    fn horizontal_overlap_examples() {
        let a = Block::new(100.0, 100.0, 0);
        let b = Block::new(120.0, 100.0, 0);
        let c = Block::new(200.0, 100.0, 0);
        assert_eq!(a.horizontal_overlap(&b), 60.0);
        assert_eq!(b.horizontal_overlap(&a), 60.0);
        assert_eq!(a.horizontal_overlap(&c), 0.0);
        assert_eq!(c.horizontal_overlap(&a), 0.0);
    }

    #[test]
    fn off_screen_uses_position_margin() {
        let mut b = Block::new(0.0, SCREEN_HEIGHT + OFF_SCREEN_MARGIN, 0);
        assert!(!b.is_off_screen());
        b.y += 0.5;
        assert!(b.is_off_screen());
    }
}
