use std::time::Duration;

use barrage_core::Host;
use barrage_protocol::{
    HostCommand, ItemConfig, ItemId, LaneOccupant, Progress, SurfaceSize, travel_offset,
};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
};

const PALETTE: [Color; 6] = [
    Color::Cyan,
    Color::Yellow,
    Color::LightGreen,
    Color::LightMagenta,
    Color::LightBlue,
    Color::White,
];

/// One bullet on the terminal.
#[derive(Debug)]
struct Sprite {
    id: ItemId,
    text: String,
    /// Width in cells.
    width: f64,
    lane: usize,
    top: f64,
    config: ItemConfig,
    /// Unpaused play time so far.
    played: Duration,
    paused: bool,
    hidden: bool,
    /// Leading edge, once the transit has started.
    x: Option<f64>,
    visible_sent: bool,
}

/// Host signals raised by one animation step.
#[derive(Debug, Default)]
pub struct Signals {
    pub visible: Vec<ItemId>,
    pub completed: Vec<ItemId>,
}

/// Terminal-cell renderer. Lanes are rows; widths and gaps are cells.
#[derive(Debug)]
pub struct TerminalHost {
    surface: SurfaceSize,
    gap: f64,
    sprites: Vec<Sprite>,
}

impl TerminalHost {
    pub fn new(cols: u16, rows: u16, gap: f64) -> Self {
        Self {
            surface: SurfaceSize::new(f64::from(cols), f64::from(rows)),
            gap,
            sprites: Vec::new(),
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.surface = SurfaceSize::new(f64::from(cols), f64::from(rows));
    }

    /// Move every running bullet forward by `dt` and collect the signals the
    /// scheduler needs: fully visible (with `gap` cells free behind it) and
    /// finished.
    pub fn advance(&mut self, dt: Duration) -> Signals {
        let mut signals = Signals::default();
        let surface_width = self.surface.width;

        for sprite in &mut self.sprites {
            if !sprite.paused {
                sprite.played += dt;
            }
            match sprite.config.timing.progress_at(sprite.played.as_secs_f64()) {
                Progress::Pending => sprite.x = None,
                Progress::Running(p) => {
                    let x = travel_offset(surface_width, sprite.width, p);
                    sprite.x = Some(x);
                    if !sprite.visible_sent
                        && x >= 0.0
                        && x + sprite.width + self.gap <= surface_width
                    {
                        sprite.visible_sent = true;
                        signals.visible.push(sprite.id);
                    }
                }
                Progress::Finished => {
                    sprite.x = None;
                    signals.completed.push(sprite.id);
                }
            }
        }
        signals
    }

    /// The topmost bullet covering cell (`col`, `row`), surface-relative.
    pub fn hit(&self, col: u16, row: u16) -> Option<ItemId> {
        let (col, row) = (f64::from(col), f64::from(row));
        self.sprites
            .iter()
            .rev()
            .filter(|s| !s.hidden && s.top.floor() == row)
            .find(|s| s.x.is_some_and(|x| col >= x.floor() && col < x + s.width))
            .map(|s| s.id)
    }

    pub fn is_paused(&self, id: ItemId) -> bool {
        self.sprites.iter().any(|s| s.id == id && s.paused)
    }

    pub fn draw(&self, area: Rect, buf: &mut Buffer) {
        for sprite in self.sprites.iter().filter(|s| !s.hidden) {
            let Some(x) = sprite.x else {
                continue;
            };
            let row = sprite.top.floor();
            if row < 0.0 || row >= f64::from(area.height) {
                continue;
            }
            let y = area.y + row as u16;
            let color = PALETTE[(sprite.id.get() % PALETTE.len() as u64) as usize];
            let style = if sprite.paused {
                Style::default().fg(Color::Black).bg(color)
            } else {
                Style::default().fg(color)
            };

            let start = x.floor() as i64;
            for (i, ch) in sprite.text.chars().enumerate() {
                let col = start + i as i64;
                if col < 0 || col >= i64::from(area.width) {
                    continue;
                }
                buf[(area.x + col as u16, y)].set_char(ch).set_style(style);
            }
        }
    }
}

impl Host for TerminalHost {
    type Content = String;

    fn measure(&self) -> Option<SurfaceSize> {
        (self.surface.width > 0.0 && self.surface.height > 0.0).then_some(self.surface)
    }

    fn occupancy(&self) -> Vec<LaneOccupant> {
        self.sprites
            .iter()
            .map(|s| LaneOccupant::new(s.id, s.lane, s.width))
            .collect()
    }

    fn apply(&mut self, command: HostCommand<String>) {
        match command {
            HostCommand::Render {
                id,
                lane,
                top,
                config,
                hidden,
                content,
            } => {
                self.sprites.push(Sprite {
                    id,
                    width: content.chars().count() as f64,
                    text: content,
                    lane,
                    top,
                    config,
                    played: Duration::ZERO,
                    paused: false,
                    hidden,
                    x: None,
                    visible_sent: false,
                });
                tracing::trace!(%id, lane, "sprite created");
            }
            HostCommand::Remove { id } => self.sprites.retain(|s| s.id != id),
            HostCommand::SetPlayState { id, state } => {
                if let Some(s) = self.sprites.iter_mut().find(|s| s.id == id) {
                    s.paused = state.is_paused();
                }
            }
            HostCommand::SetHidden { id, hidden } => {
                if let Some(s) = self.sprites.iter_mut().find(|s| s.id == id) {
                    s.hidden = hidden;
                }
            }
        }
    }
}
