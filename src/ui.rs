//! Layout and drawing: menu, scene, sidebar, game over.

use crate::block::{Block, GROUND_LINE, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::game::{Screen, Session};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block as Panel, Borders, Clear, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

const SIDEBAR_WIDTH: u16 = 24;

/// World aspect (4:3) in half-block cells: one terminal row holds two square pixels.
const BOARD_COLS_PER_ROW: f32 = 2.0 * SCREEN_WIDTH / SCREEN_HEIGHT;

/// Game-over flash (TachyonFX fade from white to the dimmed scene).
const GAME_OVER_FLASH_MS: u32 = 450;

/// Brightness of the scene behind the game-over popup.
const GAME_OVER_DIM: f32 = 0.5;

/// Board size in terminal cells (without border) that keeps the 4:3 world aspect.
pub fn board_size_for_terminal(term_cols: u16, term_rows: u16) -> (u16, u16) {
    let max_w = term_cols.saturating_sub(2).saturating_sub(SIDEBAR_WIDTH);
    let max_h = term_rows.saturating_sub(2);
    let h = (max_h as f32).min(max_w as f32 / BOARD_COLS_PER_ROW).floor().max(1.0);
    let w = (h * BOARD_COLS_PER_ROW).floor().max(1.0);
    (w as u16, h as u16)
}

/// Outer board rect (with border) and sidebar rect, centred in `area`.
fn layout(area: Rect) -> (Rect, Rect) {
    let (bw, bh) = board_size_for_terminal(area.width, area.height);
    let total_w = bw + 2 + SIDEBAR_WIDTH;
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(bh + 2),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(bw + 2), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    (inner[0], inner[1])
}

/// Draw the current screen. On game over, the flash effect in `flash` is created on
/// first use and advanced by the time since `flash_time`.
pub fn draw(
    frame: &mut Frame,
    session: &Session,
    theme: &Theme,
    flash: &mut Option<Effect>,
    flash_time: &mut Option<Instant>,
    now: Instant,
    no_animation: bool,
) {
    let area = frame.area();
    let (board_outer, sidebar) = layout(area);
    let board = draw_board_frame(frame.buffer_mut(), theme, board_outer);

    match session.screen {
        Screen::Menu => {
            draw_scene(frame.buffer_mut(), theme, board, &[], None, 1.0);
            draw_sidebar(frame.buffer_mut(), session, theme, sidebar);
            draw_menu(frame.buffer_mut(), session, theme, area);
        }
        Screen::Playing => {
            draw_scene(
                frame.buffer_mut(),
                theme,
                board,
                &session.blocks,
                session.current.as_ref(),
                1.0,
            );
            draw_sidebar(frame.buffer_mut(), session, theme, sidebar);
        }
        Screen::GameOver => {
            draw_scene(
                frame.buffer_mut(),
                theme,
                board,
                &session.blocks,
                None,
                GAME_OVER_DIM,
            );
            if !no_animation {
                apply_game_over_flash(frame, board, flash, flash_time, now);
            }
            draw_sidebar(frame.buffer_mut(), session, theme, sidebar);
            draw_game_over(frame.buffer_mut(), session, theme, area);
        }
    }
}

fn draw_board_frame(buf: &mut Buffer, theme: &Theme, outer: Rect) -> Rect {
    let panel = Panel::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.panel_bg));
    let inner = panel.inner(outer);
    panel.render(outer, buf);
    inner
}

/// Scale an RGB colour; named colours are approximated first.
fn shade(color: Color, factor: f32) -> Color {
    let (r, g, b) = match color {
        Color::Rgb(r, g, b) => (r, g, b),
        Color::Red => (255, 0, 0),
        Color::Green => (0, 255, 0),
        Color::Yellow => (255, 255, 0),
        Color::Blue => (0, 0, 255),
        Color::Magenta => (255, 0, 255),
        Color::Cyan => (0, 255, 255),
        Color::White => (255, 255, 255),
        Color::Black => (0, 0, 0),
        _ => (128, 128, 128),
    };
    let scale = |c: u8| (c as f32 * factor).clamp(0.0, 255.0) as u8;
    Color::Rgb(scale(r), scale(g), scale(b))
}

/// Top strip of a block is lit, the bottom edge darker; reads as the bevel of the desktop version.
fn block_pixel(theme: &Theme, block: &Block, wy: f32) -> Color {
    let base = theme.block_color(block.color_index);
    let local = (wy - block.top()) / block.height;
    if local < 0.3 {
        shade(base, 1.2)
    } else if local > 0.8 {
        shade(base, 0.75)
    } else {
        base
    }
}

/// Colour of one world point. Later blocks draw over earlier ones; the current block over all.
fn world_pixel(
    theme: &Theme,
    blocks: &[Block],
    current: Option<&Block>,
    wx: f32,
    wy: f32,
) -> Color {
    if let Some(b) = current.filter(|b| b.contains(wx, wy)) {
        return block_pixel(theme, b, wy);
    }
    if let Some(b) = blocks.iter().rev().find(|b| b.contains(wx, wy)) {
        return block_pixel(theme, b, wy);
    }
    if wy >= GROUND_LINE {
        theme.ground
    } else {
        theme.sky
    }
}

/// Render the world into `board` with half-blocks (▀): two world samples per terminal cell.
fn draw_scene(
    buf: &mut Buffer,
    theme: &Theme,
    board: Rect,
    blocks: &[Block],
    current: Option<&Block>,
    brightness: f32,
) {
    if board.width == 0 || board.height == 0 {
        return;
    }
    let sx = SCREEN_WIDTH / board.width as f32;
    let sy = SCREEN_HEIGHT / (board.height as f32 * 2.0);
    for row in 0..board.height {
        let top_y = (row as f32 * 2.0 + 0.5) * sy;
        let bot_y = (row as f32 * 2.0 + 1.5) * sy;
        for col in 0..board.width {
            let wx = (col as f32 + 0.5) * sx;
            let mut top = world_pixel(theme, blocks, current, wx, top_y);
            let mut bot = world_pixel(theme, blocks, current, wx, bot_y);
            if brightness < 1.0 {
                top = shade(top, brightness);
                bot = shade(bot, brightness);
            }
            buf[(board.x + col, board.y + row)]
                .set_symbol("▀")
                .set_style(Style::default().fg(top).bg(bot));
        }
    }
}

fn draw_sidebar(buf: &mut Buffer, session: &Session, theme: &Theme, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let hint_style = Style::default().fg(theme.inactive_fg);
    let stat = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value, fg_style),
        ])
    };
    let lines = vec![
        Line::from(""),
        stat(" Score:  ", session.score.to_string()),
        stat(" Height: ", format!("{:.0}", session.tower_height())),
        stat(" High:   ", session.high_score.to_string()),
        stat(
            " Blocks: ",
            format!("{}/{}", session.blocks.len(), session.config().max_blocks),
        ),
        Line::from(""),
        Line::from(Span::styled(" ← →    Move", hint_style)),
        Line::from(Span::styled(" Space  Place", hint_style)),
        Line::from(Span::styled(" Esc    Menu", hint_style)),
        Line::from(Span::styled(" Q      Quit", hint_style)),
    ];
    Paragraph::new(Text::from(lines))
        .style(Style::default().bg(theme.panel_bg))
        .block(
            Panel::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.panel_bg))
                .title(Span::styled(" Tower Builder ", title_style)),
        )
        .render(area, buf);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_popup(buf: &mut Buffer, theme: &Theme, area: Rect, width: u16, lines: Vec<Line>) {
    let popup = centered(area, width, lines.len() as u16 + 2);
    Clear.render(popup, buf);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(theme.panel_bg))
        .block(
            Panel::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.panel_bg)),
        )
        .render(popup, buf);
}

fn draw_menu(buf: &mut Buffer, session: &Session, theme: &Theme, area: Rect) {
    let fg = Style::default().fg(theme.main_fg);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " TOWER BUILDER ",
            Style::default()
                .fg(theme.title)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("Build the tallest tower you can!", fg)),
        Line::from(""),
        Line::from(Span::styled("Controls:", fg)),
        Line::from(Span::styled("← → : Move block left/right", fg)),
        Line::from(Span::styled("SPACE : Place block", fg)),
        Line::from(Span::styled("Q : Quit", fg)),
        Line::from(""),
        Line::from(Span::styled(
            "Press SPACE to start",
            Style::default()
                .fg(theme.title)
                .add_modifier(Modifier::BOLD),
        )),
    ];
    if session.high_score > 0 {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("High Score: {}", session.high_score),
            Style::default().fg(Color::Yellow),
        )));
    }
    lines.push(Line::from(""));
    draw_popup(buf, theme, area, 40, lines);
}

fn draw_game_over(buf: &mut Buffer, session: &Session, theme: &Theme, area: Rect) {
    let reason = session
        .game_over_reason
        .map(|r| r.to_string())
        .unwrap_or_default();
    let record = if session.new_high_score {
        Span::styled(
            "NEW HIGH SCORE!",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(
            format!("High Score: {}", session.high_score),
            Style::default().fg(theme.main_fg),
        )
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " GAME OVER ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(reason, Style::default().fg(theme.main_fg))),
        Line::from(""),
        Line::from(Span::styled(
            format!("Final Score: {}", session.score),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(record),
        Line::from(""),
        Line::from(Span::styled(
            "Press SPACE to play again",
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            "Press ESC for menu",
            Style::default().fg(theme.inactive_fg),
        )),
        Line::from(""),
    ];
    draw_popup(buf, theme, area, 36, lines);
}

/// Create or advance the game-over flash over the board.
fn apply_game_over_flash(
    frame: &mut Frame,
    board: Rect,
    flash: &mut Option<Effect>,
    flash_time: &mut Option<Instant>,
    now: Instant,
) {
    let delta = flash_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *flash_time = Some(now);

    let effect = flash.get_or_insert_with(|| {
        fx::fade_from(
            Color::White,
            Color::White,
            (GAME_OVER_FLASH_MS, Interpolation::Linear),
        )
    });
    if !effect.done() {
        frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
    }
}
