use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::{
    io::stdout,
    time::{Duration, Instant},
};

use blockfall::{
    BlockColor, Game, GameEvent, Intents, PreviewQueue, RandomShapeSource, Settings, ShapeKind,
};

type TerminalGame = Game<PreviewQueue<RandomShapeSource>>;

// ============================================================================
// Command Line
// ============================================================================

/// Falling-block puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(name = "blockfall", version)]
struct Args {
    /// Seed for the shape sequence; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Initial gravity interval in milliseconds.
    #[arg(long, value_name = "MS")]
    gravity_ms: Option<u64>,

    /// Number of upcoming shapes shown in the preview panel.
    #[arg(long, default_value = "3", value_name = "N")]
    preview: usize,
}

impl Args {
    fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        if let Some(ms) = self.gravity_ms {
            settings.gravity_interval = Duration::from_millis(ms);
        }
        settings
    }
}

// ============================================================================
// Visual Constants
// ============================================================================

const CELL_WIDTH: u16 = 2;
const BLOCK_CHAR: &str = "██";
const EMPTY_CHAR: &str = "  ";
const FRAME: Duration = Duration::from_millis(16);
// Terminals only report presses; soft drop counts as held while repeats keep arriving.
const SOFT_DROP_HOLD: Duration = Duration::from_millis(500);

fn block_color(color: BlockColor) -> Color {
    match color {
        BlockColor::Purple => Color::Magenta,
        BlockColor::Yellow => Color::Yellow,
        BlockColor::Blue => Color::Blue,
        BlockColor::Orange => Color::Rgb(255, 165, 0),
        BlockColor::Cyan => Color::Cyan,
        BlockColor::Green => Color::Green,
        BlockColor::Red => Color::Red,
    }
}

// ============================================================================
// Rendering
// ============================================================================

struct View {
    paused: bool,
    last_clear: Option<u32>,
}

fn render(frame: &mut Frame, game: &TerminalGame, view: &View) {
    let area = frame.size();
    render_game(frame, game, view, area);

    if game.is_game_over() {
        render_game_over(frame, game, area);
    } else if view.paused {
        render_paused(frame, area);
    }
}

fn render_game(frame: &mut Frame, game: &TerminalGame, view: &View, area: Rect) {
    let settings = game.settings();
    let grid_display_width = (settings.columns as u16 * CELL_WIDTH) + 2;
    let grid_display_height = settings.rows as u16 + 2;
    let side_width = 14;
    let total_width = grid_display_width + side_width * 2 + 4;
    let total_height = grid_display_height + 3;

    let main_area = centered_rect(total_width, total_height, area);

    let vertical = Layout::vertical([
        Constraint::Length(grid_display_height),
        Constraint::Fill(1),
    ])
    .split(main_area);
    let game_row = vertical[0];

    let horizontal = Layout::horizontal([
        Constraint::Length(grid_display_width),
        Constraint::Length(side_width),
        Constraint::Length(side_width),
    ])
    .split(game_row);

    render_grid(frame, game, horizontal[0]);
    render_preview(frame, game, horizontal[1]);
    render_info(frame, game, view, horizontal[2]);

    let controls_area = Rect {
        x: area.x,
        y: game_row.y + game_row.height,
        width: area.width,
        height: 2,
    };
    if controls_area.y + 1 < area.height {
        let controls = Paragraph::new(vec![Line::from(
            "←→/AD: Move | ↑/W: Rotate | ↓/S: Soft drop | P: Pause | Q/ESC: Quit",
        )])
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(controls, controls_area);
    }
}

fn render_grid(frame: &mut Frame, game: &TerminalGame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Blockfall ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = game
        .render_grid()
        .into_iter()
        .map(|row| {
            let spans: Vec<Span> = row
                .into_iter()
                .map(|cell| match cell {
                    Some(color) => Span::styled(BLOCK_CHAR, Style::default().fg(block_color(color))),
                    None => Span::raw(EMPTY_CHAR),
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn shape_lines(shape: ShapeKind) -> Vec<Line<'static>> {
    let offsets = shape.offsets();
    let min_x = offsets.iter().map(|(x, _)| *x).min().unwrap_or(0);
    let min_y = offsets.iter().map(|(_, y)| *y).min().unwrap_or(0);
    let max_y = offsets.iter().map(|(_, y)| *y).max().unwrap_or(0);
    let style = Style::default().fg(block_color(shape.color()));

    (min_y..=max_y)
        .map(|y| {
            let mut spans = vec![Span::raw(" ")];
            for x in min_x..min_x + 3 {
                if offsets.contains(&(x, y)) {
                    spans.push(Span::styled(BLOCK_CHAR, style));
                } else {
                    spans.push(Span::raw(EMPTY_CHAR));
                }
            }
            Line::from(spans)
        })
        .collect()
}

fn render_preview(frame: &mut Frame, game: &TerminalGame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Next ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();
    for (i, shape) in game.shapes().upcoming().enumerate() {
        if i > 0 {
            lines.push(Line::from(""));
        }
        lines.extend(shape_lines(shape));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_info(frame: &mut Frame, game: &TerminalGame, view: &View, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let score = game.score();
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("Score", Style::default().fg(Color::Yellow))),
        Line::from(format!("{}", score.score)),
        Line::from(""),
        Line::from(Span::styled("Level", Style::default().fg(Color::Green))),
        Line::from(format!("{}", score.level)),
        Line::from(""),
        Line::from(Span::styled("Lines", Style::default().fg(Color::Cyan))),
        Line::from(format!("{}", score.lines)),
    ];
    if let Some(cleared) = view.last_clear {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("+{cleared} lines"),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

fn render_game_over(frame: &mut Frame, game: &TerminalGame, area: Rect) {
    let score = game.score();
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("GAME OVER", Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(format!("Score: {}", score.score)),
        Line::from(format!("Lines: {}", score.lines)),
        Line::from(format!("Level: {}", score.level)),
        Line::from(""),
        Line::from(Span::styled(
            "Press ESC to quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Game Over ")
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
    );

    frame.render_widget(paragraph, centered_rect(24, 12, area));
}

fn render_paused(frame: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("PAUSED", Style::default().fg(Color::Yellow))),
        Line::from(""),
        Line::from(Span::styled(
            "Press P to continue",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Paused ")
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
    );

    frame.render_widget(paragraph, centered_rect(24, 8, area));
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

// ============================================================================
// Main Loop
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    let source = match args.seed {
        Some(seed) => RandomShapeSource::seeded(seed),
        None => RandomShapeSource::new(),
    };
    let mut game = Game::new(args.settings(), PreviewQueue::new(source, args.preview))?;

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let result = run(&mut game);

    // Restore terminal even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    result
}

fn run(game: &mut TerminalGame) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut view = View {
        paused: false,
        last_clear: None,
    };
    let mut soft_drop_seen: Option<Instant> = None;
    let mut last_frame = Instant::now();

    loop {
        terminal.draw(|frame| render(frame, game, &view))?;

        let mut intents = Intents::default();
        let deadline = last_frame + FRAME;
        while let Some(timeout) = deadline.checked_duration_since(Instant::now()) {
            if !event::poll(timeout)? {
                break;
            }
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind == KeyEventKind::Release {
                continue;
            }
            match key.code {
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                KeyCode::Char('p') | KeyCode::Char('P') if key.kind == KeyEventKind::Press => {
                    view.paused = !view.paused;
                }
                KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => intents.move_left = true,
                KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => {
                    intents.move_right = true;
                }
                KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => intents.rotate = true,
                KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => {
                    soft_drop_seen = Some(Instant::now());
                }
                _ => {}
            }
        }
        intents.soft_drop = soft_drop_seen.is_some_and(|seen| seen.elapsed() < SOFT_DROP_HOLD);

        let dt = last_frame.elapsed();
        last_frame = Instant::now();
        if view.paused {
            continue;
        }

        game.update(intents, dt)?;
        for event in game.take_events() {
            if let GameEvent::LinesCleared(lines) = event {
                view.last_clear = Some(lines);
            }
        }
    }
}
