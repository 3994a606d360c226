//! Rendering toolkit boundary
//!
//! The shell only needs to show and hide its screens, hand out containers
//! for apps and let the toolkit run its timers. [`CanvasToolkit`] is the
//! built-in implementation: a software RGB565 canvas drawn with
//! `embedded-graphics` and flushed whole-frame into a [`FlushTarget`].

use core::convert::Infallible;
use std::time::Duration;

use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::{OriginDimensions, Point as EgPoint, Size};
use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::{IntoStorage, Rgb565, RgbColor};
use embedded_graphics::primitives::{Circle, Primitive, PrimitiveStyle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use embedded_graphics::{Drawable, Pixel};
use log::{debug, warn};

use roundel_core::geometry::{Point, Rect, CENTER_X, CENTER_Y, HEIGHT, SAFE_RADIUS, WIDTH};
use roundel_core::layout::ICON_SIZE;
use roundel_drivers::FlushTarget;

/// Handle to an app container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId(pub u32);

/// Something the shell can show or hide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Home,
    Launcher,
    App(ContainerId),
}

/// One launcher icon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherEntry {
    pub name: String,
    pub position: Point,
}

/// What the shell needs from a rendering toolkit
pub trait Toolkit {
    fn set_visible(&mut self, layer: Layer, visible: bool);
    fn is_visible(&self, layer: Layer) -> bool;

    /// New hidden container for an app
    fn create_container(&mut self, title: &str) -> ContainerId;
    fn destroy_container(&mut self, id: ContainerId);

    fn set_launcher_entries(&mut self, entries: Vec<LauncherEntry>);

    /// Re-read the time of day for the home clock
    fn refresh_clock(&mut self);

    /// Run pending rendering work; returns the delay the toolkit asks for
    /// before the next call
    fn timer_handler(&mut self) -> Duration;
}

const FRAME_INTERVAL: Duration = Duration::from_millis(30);

pub const BACKGROUND: Rgb565 = Rgb565::BLACK;
pub const FOREGROUND: Rgb565 = Rgb565::WHITE;
pub const ACCENT: Rgb565 = Rgb565::new(0, 40, 31);

/// Full-screen RGB565 pixel buffer
struct Canvas {
    pixels: Vec<u16>,
}

impl Canvas {
    fn new() -> Self {
        Self {
            pixels: vec![0; WIDTH as usize * HEIGHT as usize],
        }
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, color) in pixels {
            if p.x >= 0 && p.y >= 0 && p.x < WIDTH as i32 && p.y < HEIGHT as i32 {
                self.pixels[p.y as usize * WIDTH as usize + p.x as usize] = color.into_storage();
            }
        }
        Ok(())
    }
}

fn eg(p: Point) -> EgPoint {
    EgPoint::new(p.x as i32, p.y as i32)
}

struct Container {
    id: ContainerId,
    title: String,
    visible: bool,
}

/// Software toolkit drawing the home clock, the launcher ring and app
/// container titles
pub struct CanvasToolkit<D: FlushTarget> {
    target: D,
    canvas: Canvas,
    home: bool,
    launcher: bool,
    containers: Vec<Container>,
    next_container: u32,
    entries: Vec<LauncherEntry>,
    clock_text: String,
    dirty: bool,
}

impl<D: FlushTarget> CanvasToolkit<D> {
    pub fn new(target: D) -> Self {
        Self {
            target,
            canvas: Canvas::new(),
            home: false,
            launcher: false,
            containers: Vec::new(),
            next_container: 1,
            entries: Vec::new(),
            clock_text: String::new(),
            dirty: true,
        }
    }

    pub fn target(&self) -> &D {
        &self.target
    }

    pub fn clock_text(&self) -> &str {
        &self.clock_text
    }

    fn render(&mut self) -> Result<(), Infallible> {
        self.canvas.clear(BACKGROUND)?;
        let centre = EgPoint::new(CENTER_X as i32, CENTER_Y as i32);
        let centred = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Middle)
            .build();

        // Topmost visible layer wins
        if let Some(app) = self.containers.iter().rev().find(|c| c.visible) {
            Circle::with_center(centre, SAFE_RADIUS as u32 * 2)
                .into_styled(PrimitiveStyle::with_stroke(ACCENT, 2))
                .draw(&mut self.canvas)?;
            let style = MonoTextStyle::new(&FONT_10X20, FOREGROUND);
            Text::with_text_style(&app.title, centre, style, centred).draw(&mut self.canvas)?;
        } else if self.launcher {
            let fill = PrimitiveStyle::with_fill(ACCENT);
            let label = MonoTextStyle::new(&FONT_6X10, BACKGROUND);
            for entry in &self.entries {
                let at = eg(entry.position);
                Circle::with_center(at, ICON_SIZE as u32)
                    .into_styled(fill)
                    .draw(&mut self.canvas)?;
                let initial: String = entry.name.chars().take(1).collect();
                Text::with_text_style(&initial, at, label, centred).draw(&mut self.canvas)?;
            }
        } else if self.home {
            let style = MonoTextStyle::new(&FONT_10X20, FOREGROUND);
            Text::with_text_style(&self.clock_text, centre, style, centred).draw(&mut self.canvas)?;
        }
        Ok(())
    }
}

impl<D: FlushTarget> Toolkit for CanvasToolkit<D> {
    fn set_visible(&mut self, layer: Layer, visible: bool) {
        let slot = match layer {
            Layer::Home => &mut self.home,
            Layer::Launcher => &mut self.launcher,
            Layer::App(id) => match self.containers.iter_mut().find(|c| c.id == id) {
                Some(c) => &mut c.visible,
                None => {
                    warn!("No container {:?}", id);
                    return;
                }
            },
        };
        if *slot != visible {
            *slot = visible;
            self.dirty = true;
        }
    }

    fn is_visible(&self, layer: Layer) -> bool {
        match layer {
            Layer::Home => self.home,
            Layer::Launcher => self.launcher,
            Layer::App(id) => self.containers.iter().any(|c| c.id == id && c.visible),
        }
    }

    fn create_container(&mut self, title: &str) -> ContainerId {
        let id = ContainerId(self.next_container);
        self.next_container = self.next_container.wrapping_add(1);
        self.containers.push(Container {
            id,
            title: title.to_string(),
            visible: false,
        });
        debug!("Created container {:?} for {}", id, title);
        id
    }

    fn destroy_container(&mut self, id: ContainerId) {
        let before = self.containers.len();
        self.containers.retain(|c| c.id != id);
        if self.containers.len() != before {
            self.dirty = true;
        }
    }

    fn set_launcher_entries(&mut self, entries: Vec<LauncherEntry>) {
        self.entries = entries;
        self.dirty = true;
    }

    fn refresh_clock(&mut self) {
        let text = chrono::Local::now().format("%H:%M").to_string();
        if text != self.clock_text {
            self.clock_text = text;
            self.dirty |= self.home;
        }
    }

    fn timer_handler(&mut self) -> Duration {
        if self.dirty {
            self.render().unwrap_or_else(|never| match never {});
            if let Err(e) = self.target.flush(Rect::full(), &self.canvas.pixels) {
                warn!("Frame flush failed: {}", e);
            }
            self.dirty = false;
        }
        FRAME_INTERVAL
    }
}
