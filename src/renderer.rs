//! SDL2 window for the feed player.
//!
//! Draws the current video frame aspect-fit above a transport strip, and
//! turns key presses into [`KeyEvent`]s for the keyboard hub.

use crate::gst_element::VideoFrame;
use crate::keyboard::{Key, KeyEvent, KeyboardHub};
use crate::panes::MediaPane;
use anyhow::{Context, Result};
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::{Color, PixelFormatEnum};
use sdl2::rect::Rect;
use sdl2::render::Canvas;
use sdl2::video::Window;

const STRIP_HEIGHT: u32 = 48;
const BUTTON_SIZE: u32 = 24;

/// Result of processing events.
pub enum EventResult {
    Continue,
    Quit,
}

pub struct Renderer {
    canvas: Canvas<Window>,
    event_pump: sdl2::EventPump,
}

fn key_for(keycode: Keycode) -> Option<Key> {
    match keycode {
        Keycode::Right => Some(Key::ArrowRight),
        Keycode::Left => Some(Key::ArrowLeft),
        Keycode::Up => Some(Key::ArrowUp),
        Keycode::Down => Some(Key::ArrowDown),
        Keycode::Space => Some(Key::Space),
        Keycode::M => Some(Key::Char('m')),
        _ => None,
    }
}

impl Renderer {
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self> {
        let sdl_context = sdl2::init().map_err(|e| anyhow::anyhow!("SDL init failed: {}", e))?;

        let video_subsystem = sdl_context
            .video()
            .map_err(|e| anyhow::anyhow!("SDL video init failed: {}", e))?;

        tracing::info!("Creating window: {}x{}", width, height);

        let window = video_subsystem
            .window(title, width, height)
            .position_centered()
            .resizable()
            .build()
            .context("Failed to create window")?;

        let mut canvas = window
            .into_canvas()
            .accelerated()
            .present_vsync()
            .build()
            .context("Failed to create canvas")?;

        canvas.set_draw_color(Color::RGB(0, 0, 0));
        canvas.clear();
        canvas.present();

        let event_pump = sdl_context
            .event_pump()
            .map_err(|e| anyhow::anyhow!("Failed to get event pump: {}", e))?;

        Ok(Self { canvas, event_pump })
    }

    /// Forward key presses to `hub`. Returns Quit on window close, Escape
    /// or Q.
    pub fn process_events(&mut self, hub: &KeyboardHub) -> EventResult {
        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => return EventResult::Quit,
                Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                }
                | Event::KeyDown {
                    keycode: Some(Keycode::Q),
                    ..
                } => return EventResult::Quit,
                Event::KeyDown {
                    keycode: Some(keycode),
                    ..
                } => {
                    if let Some(key) = key_for(keycode) {
                        hub.dispatch(KeyEvent::new(key));
                    }
                }
                _ => {}
            }
        }
        EventResult::Continue
    }

    /// Aspect-fit rectangle inside the video area.
    fn fit(area: Rect, img_width: u32, img_height: u32) -> Rect {
        if img_width == 0 || img_height == 0 || area.height() == 0 {
            return area;
        }
        let area_ratio = area.width() as f32 / area.height() as f32;
        let img_ratio = img_width as f32 / img_height as f32;

        let (fit_width, fit_height) = if img_ratio > area_ratio {
            (area.width(), (area.width() as f32 / img_ratio) as u32)
        } else {
            ((area.height() as f32 * img_ratio) as u32, area.height())
        };

        let x = area.x() + ((area.width() - fit_width) / 2) as i32;
        let y = area.y() + ((area.height() - fit_height) / 2) as i32;
        Rect::new(x, y, fit_width.max(1), fit_height.max(1))
    }

    fn draw_frame(&mut self, frame: &VideoFrame, area: Rect) -> Result<()> {
        let texture_creator = self.canvas.texture_creator();
        let mut texture = texture_creator
            .create_texture_streaming(PixelFormatEnum::ABGR8888, frame.width, frame.height)
            .context("Failed to create texture")?;

        let row_bytes = frame.width as usize * 4;
        texture
            .with_lock(None, |buffer: &mut [u8], pitch: usize| {
                for y in 0..frame.height as usize {
                    let src = y * row_bytes;
                    let dst = y * pitch;
                    if src + row_bytes > frame.pixels.len() {
                        break;
                    }
                    buffer[dst..dst + row_bytes].copy_from_slice(&frame.pixels[src..src + row_bytes]);
                }
            })
            .map_err(|e| anyhow::anyhow!("Failed to update texture: {}", e))?;

        let dest = Self::fit(area, frame.width, frame.height);
        self.canvas
            .copy(&texture, None, dest)
            .map_err(|e| anyhow::anyhow!("Failed to render frame: {}", e))
    }

    fn fill(&mut self, color: Color, rect: Rect) -> Result<()> {
        self.canvas.set_draw_color(color);
        self.canvas
            .fill_rect(rect)
            .map_err(|e| anyhow::anyhow!("Failed to draw: {}", e))
    }

    /// Render one frame of the media pane.
    pub fn render(&mut self, frame: Option<&VideoFrame>, pane: &MediaPane) -> Result<()> {
        let (width, height) = self.canvas.output_size().map_err(|e| anyhow::anyhow!(e))?;
        let video_height = height.saturating_sub(STRIP_HEIGHT).max(1);
        let video_area = Rect::new(0, 0, width.max(1), video_height);

        self.canvas.set_draw_color(Color::RGB(0, 0, 0));
        self.canvas.clear();

        if let Some(frame) = frame {
            self.draw_frame(frame, video_area)?;
        }

        let strip_y = video_height as i32;
        self.fill(Color::RGB(24, 24, 24), Rect::new(0, strip_y, width.max(1), STRIP_HEIGHT))?;

        if pane.error.is_some() {
            self.fill(Color::RGB(180, 40, 40), Rect::new(0, strip_y, width.max(1), 4))?;
        }

        if let Some(transport) = &pane.transport {
            let filled = (width as f64 * transport.progress / 100.0) as u32;
            if filled > 0 {
                self.fill(Color::RGB(80, 160, 255), Rect::new(0, strip_y, filled, 4))?;
            }

            let play_color = if transport.play_label == "Pause" {
                Color::RGB(80, 200, 120)
            } else {
                Color::RGB(200, 200, 200)
            };
            let mute_color = if transport.mute_label == "Unmute" {
                Color::RGB(200, 120, 40)
            } else {
                Color::RGB(200, 200, 200)
            };
            let button_y = strip_y + 14;
            self.fill(play_color, Rect::new(16, button_y, BUTTON_SIZE, BUTTON_SIZE))?;
            self.fill(mute_color, Rect::new(48, button_y, BUTTON_SIZE, BUTTON_SIZE))?;
        }

        let nav_y = strip_y + 14;
        let nav_color = |disabled: bool| {
            if disabled {
                Color::RGB(70, 70, 70)
            } else {
                Color::RGB(230, 230, 230)
            }
        };
        let right = width as i32;
        self.fill(
            nav_color(pane.previous.disabled),
            Rect::new(right - 80, nav_y, BUTTON_SIZE, BUTTON_SIZE),
        )?;
        self.fill(
            nav_color(pane.next.disabled),
            Rect::new(right - 48, nav_y, BUTTON_SIZE, BUTTON_SIZE),
        )?;

        self.canvas.present();
        Ok(())
    }
}
