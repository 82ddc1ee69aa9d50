//! Tower Builder: stack falling blocks as high as you can, in the terminal.

mod app;
mod block;
mod game;
mod highscores;
mod input;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

/// Options derived from CLI that affect the simulation.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Placed-block ceiling; reaching it ends the game.
    pub max_blocks: usize,
    /// Horizontal speed of the current block, world units per tick.
    pub move_speed: f32,
    /// Seed for spawn positions and colours; random when unset.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_blocks: 50,
            move_speed: 3.0,
            seed: None,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = args.log_file.as_deref() {
        init_logging(path)?;
    }
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        log::warn!("could not load theme: {e}");
        theme::Theme::default()
    });
    let config = GameConfig {
        max_blocks: args.max_blocks,
        move_speed: args.move_speed,
        seed: args.seed,
    };
    let store = args
        .high_score_file
        .clone()
        .map(highscores::JsonFileStore::new)
        .unwrap_or_default();
    log::info!("high scores at {}", store.path().display());
    let mut app = App::new(&args, config, theme, Box::new(store));
    app.run()?;
    Ok(())
}

/// The terminal belongs to the game, so logs only go to a file.
fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("could not open log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Arcade tower-stacking game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "tower-builder",
    version,
    about = "Arcade tower-stacking game in the terminal. Drop blocks onto the stack and build as high as you can.",
    long_about = "Tower Builder is a small arcade stacking game.\n\n\
        A block hovers at the top of the screen. Move it left and right, then drop it; it falls \
        under gravity and lands on the ground or on the tower. A block needs more than 30% of its \
        width resting on the block below to stay put. Higher towers score more per block.\n\n\
        CONTROLS:\n  Left/Right or h/l  Move    Space/Enter  Place / start\n  Esc  Menu    q  Quit"
)]
pub struct Args {
    /// Maximum number of placed blocks; reaching it ends the game.
    #[arg(long, default_value = "50", value_name = "N")]
    pub max_blocks: usize,

    /// Horizontal speed of the current block (world units per tick; the world is 800 wide).
    #[arg(long, default_value = "3.0", value_name = "SPEED")]
    pub move_speed: f32,

    /// Simulation steps per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub tick_rate: f64,

    /// Seed for block positions and colours (random if not set).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// High score file. Defaults to $XDG_CONFIG_HOME/tower-builder/high_score.json.
    #[arg(long, value_name = "FILE")]
    pub high_score_file: Option<PathBuf>,

    /// Path to theme file (btop-style theme[key]=\"value\"; keys sky, ground, block0..block5, title, main_fg).
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Block colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Skip main menu and start playing immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Disable the game-over flash.
    #[arg(long)]
    pub no_animation: bool,

    /// Write logs to this file (filter with RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_rules() {
        let args = Args::try_parse_from(["tower-builder"]).unwrap();
        assert_eq!(args.max_blocks, 50);
        assert_eq!(args.move_speed, 3.0);
        assert_eq!(args.tick_rate, 60.0);
        assert_eq!(args.palette, Palette::Normal);
        assert!(args.seed.is_none());
        assert!(!args.no_menu);
    }

    #[test]
    fn parses_overrides() {
        let args = Args::try_parse_from([
            "tower-builder",
            "--max-blocks",
            "5",
            "--seed",
            "42",
            "--palette",
            "contrast",
            "--high-score-file",
            "/tmp/hs.json",
            "--no-menu",
        ])
        .unwrap();
        assert_eq!(args.max_blocks, 5);
        assert_eq!(args.seed, Some(42));
        assert_eq!(args.palette, Palette::HighContrast);
        assert_eq!(args.high_score_file, Some(PathBuf::from("/tmp/hs.json")));
        assert!(args.no_menu);
    }

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
