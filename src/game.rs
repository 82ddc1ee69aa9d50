//! Game session: placed blocks, current block, score, screen state.

use crate::GameConfig;
use crate::block::{BLOCK_WIDTH, Block, GROUND_LINE, SCREEN_WIDTH};
use crate::highscores::HighScoreStore;
use crate::input::InputFrame;
use crate::theme::PALETTE_LEN;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fmt;

/// Points for one placed block before the height multiplier.
pub const BASE_SCORE: u32 = 10;

/// Every full 100 units of tower height adds one to the multiplier.
const HEIGHT_STEP: f32 = 100.0;

/// Spawn row (top edge) of a new current block.
const SPAWN_Y: f32 = 50.0;
/// Keep spawns this far from either side wall.
const SPAWN_MARGIN: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    MaxBlocks,
    FellOffScreen,
}

impl fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MaxBlocks => "Maximum blocks reached!",
            Self::FellOffScreen => "Block fell off screen!",
        })
    }
}

pub struct Session {
    config: GameConfig,
    store: Box<dyn HighScoreStore>,
    rng: StdRng,
    /// Placed blocks in placement order (also draw order).
    pub blocks: Vec<Block>,
    /// Block under player control; never placed.
    pub current: Option<Block>,
    pub score: u32,
    pub high_score: u32,
    pub screen: Screen,
    pub game_over_reason: Option<GameOverReason>,
    /// Set when the last game over beat the stored high score.
    pub new_high_score: bool,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("blocks", &self.blocks.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("high_score", &self.high_score)
            .field("screen", &self.screen)
            .field("game_over_reason", &self.game_over_reason)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Starts on the menu with the stored high score loaded.
    pub fn new(config: GameConfig, store: Box<dyn HighScoreStore>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let high_score = store.load_high_score();
        Self {
            config,
            store,
            rng,
            blocks: Vec::new(),
            current: None,
            score: 0,
            high_score,
            screen: Screen::Menu,
            game_over_reason: None,
            new_high_score: false,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Fresh tower; the screen is left to the caller.
    pub fn reset(&mut self) {
        self.blocks.clear();
        self.current = None;
        self.score = 0;
        self.game_over_reason = None;
        self.new_high_score = false;
        self.spawn_new_block();
    }

    /// Reset and switch to Playing.
    pub fn start(&mut self) {
        self.screen = Screen::Playing;
        self.reset();
        log::info!("new game started (high score {})", self.high_score);
    }

    pub fn spawn_new_block(&mut self) {
        if self.blocks.len() >= self.config.max_blocks {
            self.game_over(GameOverReason::MaxBlocks);
            return;
        }
        let max_x = (SCREEN_WIDTH - BLOCK_WIDTH) as u32 - SPAWN_MARGIN;
        let x = self.rng.gen_range(SPAWN_MARGIN..=max_x);
        let color_index = self.rng.gen_range(0..PALETTE_LEN);
        self.current = Some(Block::new(x as f32, SPAWN_Y, color_index));
    }

    /// Hand the current block to the simulation and score it. No-op without a current block.
    pub fn place_block(&mut self) {
        let Some(mut block) = self.current.take() else {
            return;
        };
        block.is_placed = true;
        self.blocks.push(block);

        let multiplier = 1 + (self.tower_height() / HEIGHT_STEP).floor() as u32;
        self.score += BASE_SCORE * multiplier;

        self.spawn_new_block();
    }

    /// Distance from the ground line to the highest stable top edge; 0 without stable blocks.
    pub fn tower_height(&self) -> f32 {
        self.blocks
            .iter()
            .filter(|b| b.is_stable)
            .map(Block::top)
            .min_by(f32::total_cmp)
            .map_or(0.0, |top| (GROUND_LINE - top).max(0.0))
    }

    /// One fixed-rate step: screen transitions from the one-shot requests, then `tick`.
    pub fn step(&mut self, input: &InputFrame) {
        match self.screen {
            Screen::Menu => {
                if input.place {
                    self.start();
                }
            }
            Screen::Playing => {
                if input.menu {
                    log::info!("game abandoned at score {}", self.score);
                    self.screen = Screen::Menu;
                    return;
                }
                if input.place {
                    self.place_block();
                }
            }
            Screen::GameOver => {
                if input.menu {
                    self.screen = Screen::Menu;
                } else if input.place {
                    self.start();
                }
            }
        }
        self.tick(input);
    }

    /// Physics step; only runs while Playing.
    pub fn tick(&mut self, input: &InputFrame) {
        if self.screen != Screen::Playing {
            return;
        }

        if let Some(block) = self.current.as_mut().filter(|b| !b.is_placed) {
            if input.left {
                block.x -= self.config.move_speed;
            }
            if input.right {
                block.x += self.config.move_speed;
            }
            block.x = block.x.clamp(0.0, SCREEN_WIDTH - BLOCK_WIDTH);
        }

        for i in 0..self.blocks.len() {
            let mut block = self.blocks[i];
            block.update(&self.blocks);
            self.blocks[i] = block;

            if block.is_off_screen() {
                self.blocks.remove(i);
                self.game_over(GameOverReason::FellOffScreen);
                return;
            }
        }
    }

    pub fn game_over(&mut self, reason: GameOverReason) {
        self.screen = Screen::GameOver;
        self.game_over_reason = Some(reason);
        log::info!("game over: {reason} (score {})", self.score);

        // A tie still earns the banner; only a strict improvement is written.
        self.new_high_score = self.score >= self.high_score;
        if self.score > self.high_score {
            self.high_score = self.score;
            log::info!("new high score {}", self.high_score);
            self.store.save_high_score(self.high_score);
        }
    }
}
