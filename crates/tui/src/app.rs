use std::time::Duration;

use anyhow::Result;
use barrage_core::{BulletScreen, Clock, MonotonicClock};
use barrage_protocol::{ItemId, Options, ScreenEvent};
use crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Paragraph},
};
use tracing::{debug, info};

use crate::renderer::TerminalHost;

const SAMPLES: &[&str] = &[
    "hello from the back row",
    "first!",
    "this part again",
    "lol",
    "can't believe that worked",
    "subtitles please",
    "who else is here at 3am",
    "that jump cut",
    "+1",
    "wait what just happened",
    "encore",
    "the bass line though",
];

/// Demo driver: feeds sample bullets every `send_rate` ms and relays terminal
/// input to the screen.
pub struct App<K: Clock = MonotonicClock> {
    screen: BulletScreen<TerminalHost, K>,
    rate: Duration,
    since_push: Duration,
    pushed: usize,
    hovered: Option<ItemId>,
}

impl App {
    pub fn new(options: Options, cols: u16, rows: u16) -> Result<Self> {
        Self::with_clock(options, cols, rows, MonotonicClock::new())
    }
}

impl<K: Clock> App<K> {
    /// `rows` is the whole terminal; the top row is the status header.
    pub fn with_clock(options: Options, cols: u16, rows: u16, clock: K) -> Result<Self> {
        let rate = Duration::from_millis(options.send_rate);
        let host = TerminalHost::new(cols, rows.saturating_sub(1), options.gap);
        let screen = BulletScreen::new(host, clock, options)?;
        info!(lanes = screen.lane_count(), cols, rows, "screen ready");
        Ok(Self {
            screen,
            rate,
            since_push: rate,
            pushed: 0,
            hovered: None,
        })
    }

    pub fn screen(&self) -> &BulletScreen<TerminalHost, K> {
        &self.screen
    }

    /// Advance the animation by `dt`, relay host signals and feed the next
    /// sample when one is due.
    pub fn step(&mut self, dt: Duration) {
        let signals = self.screen.host_mut().advance(dt);
        for id in signals.visible {
            self.screen.notify_visible(id);
        }
        for id in signals.completed {
            self.screen.notify_completed(id);
        }
        self.screen.tick();

        if !self.screen.is_paused() {
            self.since_push += dt;
            if self.since_push >= self.rate {
                self.since_push = Duration::ZERO;
                let text = SAMPLES[self.pushed % SAMPLES.len()];
                self.pushed += 1;
                self.screen.push(text.to_owned());
            }
        }

        for event in self.screen.drain_events() {
            match event {
                ScreenEvent::Queued { id } => debug!(%id, "queued"),
                ScreenEvent::Started { id, lane } => debug!(%id, lane, "started"),
                ScreenEvent::Ended { id } => {
                    if self.hovered == Some(id) {
                        self.hovered = None;
                    }
                    debug!(%id, "ended");
                }
            }
        }
    }

    /// Returns `false` when the key asks to quit.
    pub fn key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Char(' ') => {
                if self.screen.is_paused() {
                    self.screen.resume_all();
                } else {
                    self.screen.pause_all();
                }
            }
            KeyCode::Char('h') => {
                if self.screen.is_hidden() {
                    self.screen.show();
                } else {
                    self.screen.hide();
                }
            }
            KeyCode::Char('c') => {
                self.hovered = None;
                self.screen.clear();
            }
            _ => {}
        }
        true
    }

    pub fn mouse(&mut self, mouse: MouseEvent) {
        // Row 0 is the header.
        let target = mouse
            .row
            .checked_sub(1)
            .and_then(|row| self.screen.host().hit(mouse.column, row));

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(id) = target {
                    self.screen.click(id);
                }
            }
            MouseEventKind::Moved => {
                if target == self.hovered {
                    return;
                }
                if let Some(old) = self.hovered.take() {
                    self.screen.hover(old, false);
                }
                if let Some(new) = target {
                    self.screen.hover(new, true);
                }
                self.hovered = target;
            }
            _ => {}
        }
    }

    /// A resize changes the lane count, so the screen starts over.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.screen.host_mut().resize(cols, rows.saturating_sub(1));
        self.hovered = None;
        self.screen.clear();
    }

    pub fn draw(&self, frame: &mut Frame) {
        let area = frame.area();

        let status = format!(
            " barrage | lanes {} | live {} | queued {} | {}{} | space pause  h hide  c clear  q quit",
            self.screen.lane_count(),
            self.screen.live_len(),
            self.screen.queue_len(),
            if self.screen.is_paused() { "paused" } else { "running" },
            if self.screen.is_hidden() { ", hidden" } else { "" },
        );
        let header =
            Paragraph::new(status).style(Style::default().fg(Color::White).bg(Color::DarkGray));
        frame.render_widget(header, Rect::new(area.x, area.y, area.width, 1));

        let surface = Rect::new(
            area.x,
            area.y + 1,
            area.width,
            area.height.saturating_sub(1),
        );
        frame.render_widget(
            Block::default().style(Style::default().bg(Color::Black)),
            surface,
        );
        self.screen.host().draw(surface, frame.buffer_mut());
    }
}
