// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The slide viewer: page navigation, search, slideshow and drawing.

use std::path::PathBuf;
use std::process::Command;

use lectern_core::canvas::Canvas;
use lectern_core::context::{Context, StatusLine};
use lectern_core::event::{Button, Modifiers};
use lectern_core::time::Duration;
use lectern_core::viewer::Viewer;

use crate::deck::{Deck, DeckError};
use crate::font::{self, GLYPH_HEIGHT};

/// Slideshow interval used by `a` when none was given on the command line.
const DEFAULT_ADVANCE: Duration = Duration::from_secs(5);
const NOT_FOUND_DURATION: Duration = Duration::from_secs(2);

const BACKGROUNDS: [u32; 4] = [0x0020_3040, 0x0030_2040, 0x0020_4030, 0x0040_3020];
const PAGE_COLOR: u32 = 0x00f4_f1e8;
const SHADOW_COLOR: u32 = 0x0010_1010;
const TEXT_COLOR: u32 = 0x0020_2020;
const PROGRESS_COLOR: u32 = 0x00e0_a040;
const STATUS_BG: u32 = 0x0018_1818;
const STATUS_COPIED_BG: u32 = 0x0030_6030;
const STATUS_TEXT: u32 = 0x00e0_e0e0;

/// Startup options for [`SlideDeck`].
#[derive(Clone, Debug, Default)]
pub(crate) struct Options {
    pub(crate) password: Option<String>,
    /// 1-based page to open.
    pub(crate) page: Option<usize>,
    /// Slideshow interval; starts the slideshow when set.
    pub(crate) advance: Option<Duration>,
    /// Pixel size of one font dot.
    pub(crate) scale: u32,
}

/// A slide deck shown one slide at a time.
#[derive(Debug)]
pub(crate) struct SlideDeck {
    path: PathBuf,
    password: Option<String>,
    deck: Deck,
    page: usize,
    scale: u32,
    advance: Option<Duration>,
    /// Search text being typed; `Some` while searching.
    search: Option<String>,
    last_search: Option<String>,
}

impl SlideDeck {
    /// Opens the deck at `path`.
    pub(crate) fn open(path: PathBuf, options: Options) -> Result<Self, DeckError> {
        let deck = Deck::load(&path, options.password.as_deref())?;
        Ok(Self::with_deck(path, deck, options))
    }

    /// Shows `deck`, which was read from `path`.
    pub(crate) fn with_deck(path: PathBuf, deck: Deck, options: Options) -> Self {
        let last = deck.len() - 1;
        let page = options.page.map_or(0, |p| p.saturating_sub(1).min(last));
        Self {
            path,
            password: options.password,
            deck,
            page,
            scale: options.scale.max(1),
            advance: options.advance,
            search: None,
            last_search: None,
        }
    }

    /// Schedules the first slideshow advance, if a slideshow was requested.
    pub(crate) fn start(&self, cx: &mut Context) {
        cx.set_title(&self.title());
        if let Some(interval) = self.advance {
            cx.schedule_advance(interval);
        }
    }

    /// Sets the pixel size of one font dot.
    pub(crate) fn set_scale(&mut self, scale: u32) {
        self.scale = scale.max(1);
    }

    /// Current page, 0-based.
    pub(crate) fn page(&self) -> usize {
        self.page
    }

    fn title(&self) -> String {
        let name = self
            .path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().into_owned());
        format!("{name} ({}/{})", self.page + 1, self.deck.len())
    }

    fn goto(&mut self, cx: &mut Context, page: usize) {
        let page = page.min(self.deck.len() - 1);
        if page != self.page {
            self.page = page;
            cx.set_title(&self.title());
            cx.request_repaint();
        }
    }

    fn next(&mut self, cx: &mut Context) {
        self.goto(cx, self.page + 1);
    }

    fn previous(&mut self, cx: &mut Context) {
        self.goto(cx, self.page.saturating_sub(1));
    }

    fn search_key(&mut self, cx: &mut Context, code: char) {
        let Some(query) = self.search.as_mut() else {
            return;
        };
        match code {
            '\x1b' => self.search = None,
            '\r' => {
                let query = std::mem::take(query);
                self.search = None;
                if !query.is_empty() {
                    self.find(cx, &query);
                    self.last_search = Some(query);
                }
            }
            '\x08' => {
                query.pop();
            }
            c if !c.is_control() => query.push(c),
            _ => return,
        }
        cx.request_status_repaint();
    }

    fn find(&mut self, cx: &mut Context, query: &str) {
        match self.deck.find_from(self.page, query) {
            Some(page) => self.goto(cx, page),
            None => cx.show_message(format!("not found: {query}"), NOT_FOUND_DURATION),
        }
    }

    fn open_link(&self, cx: &mut Context) {
        let Some(url) = self.deck.get(self.page).and_then(|s| s.first_url()) else {
            cx.show_message("no link on this slide", NOT_FOUND_DURATION);
            return;
        };
        let browser = std::env::var("BROWSER").unwrap_or_else(|_| "xdg-open".to_owned());
        match launch(&browser, url) {
            Ok(()) => log::info!("opened {url} with {browser}"),
            Err(err) => cx.warn(&format!("cannot run {browser}: {err}")),
        }
    }

    fn status_text(&self, cx: &Context) -> Option<String> {
        if let Some(query) = &self.search {
            return Some(format!("/{query}_"));
        }
        match cx.status() {
            StatusLine::Hidden => None,
            StatusLine::PageNumber => {
                Some(format!("page {} of {}", self.page + 1, self.deck.len()))
            }
            StatusLine::Message(text) => Some(text.clone()),
        }
    }

    fn draw_page(&self, canvas: &mut Canvas, content_height: u32) {
        let (w, h) = (canvas.width(), content_height);
        canvas.fill_rect(0, 0, w, h, BACKGROUNDS[self.page % BACKGROUNDS.len()]);

        let margin = (w.min(h) / 16).max(4);
        let progress_height = 2 * self.scale;
        let frame_w = w.saturating_sub(2 * margin);
        let frame_h = h.saturating_sub(3 * margin + progress_height);
        let shadow = 2 * self.scale;
        canvas.fill_rect(
            px(margin + shadow),
            px(margin + shadow),
            frame_w,
            frame_h,
            SHADOW_COLOR,
        );
        canvas.fill_rect(px(margin), px(margin), frame_w, frame_h, PAGE_COLOR);

        let Some(slide) = self.deck.get(self.page) else {
            return;
        };
        let pad = margin / 2 + self.scale * 2;
        let left = px(margin + pad);
        let mut y = margin + pad;
        let title_scale = self.scale * 2;
        font::draw_text(canvas, left, px(y), &slide.title, title_scale, TEXT_COLOR);
        y += (GLYPH_HEIGHT + 4) * title_scale;
        let line_height = (GLYPH_HEIGHT + 3) * self.scale;
        for line in &slide.body {
            if y + line_height > margin + frame_h {
                break;
            }
            font::draw_text(canvas, left, px(y), line, self.scale, TEXT_COLOR);
            y += line_height;
        }

        let track = frame_w;
        let done = progress(track, self.page + 1, self.deck.len());
        let bar_y = px(h.saturating_sub(margin + progress_height));
        canvas.fill_rect(px(margin), bar_y, track, progress_height, SHADOW_COLOR);
        canvas.fill_rect(px(margin), bar_y, done, progress_height, PROGRESS_COLOR);
    }

    fn draw_status(&self, cx: &Context, canvas: &mut Canvas) {
        let bar = cx.status_bar_height().min(canvas.height());
        let top = canvas.height() - bar;
        let bg = if cx.just_copied() {
            STATUS_COPIED_BG
        } else {
            STATUS_BG
        };
        canvas.fill_rect(0, px(top), canvas.width(), bar, bg);
        let text = if cx.just_copied() && self.search.is_none() {
            Some("copied".to_owned())
        } else {
            self.status_text(cx)
        };
        if let Some(text) = text {
            let scale = (bar / (GLYPH_HEIGHT + 2)).clamp(1, self.scale);
            let y = top + bar.saturating_sub(GLYPH_HEIGHT * scale) / 2;
            font::draw_text(canvas, px(scale * 4), px(y), &text, scale, STATUS_TEXT);
        }
    }
}

fn px(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

/// Filled length of a progress track of `track` pixels after `done` of
/// `total` pages.
fn progress(track: u32, done: usize, total: usize) -> u32 {
    let done = u64::try_from(done).unwrap_or(u64::MAX);
    let total = u64::try_from(total.max(1)).unwrap_or(u64::MAX);
    u32::try_from(u64::from(track) * done.min(total) / total).unwrap_or(track)
}

impl Viewer for SlideDeck {
    type Error = DeckError;

    fn render(&mut self, cx: &Context, canvas: &mut Canvas) -> Result<(), DeckError> {
        let content = canvas.height().saturating_sub(cx.status_bar_height());
        self.draw_page(canvas, content);
        self.draw_status(cx, canvas);
        Ok(())
    }

    fn render_status_bar(&mut self, cx: &Context, canvas: &mut Canvas) -> Result<(), DeckError> {
        self.draw_status(cx, canvas);
        Ok(())
    }

    fn handle_key(&mut self, cx: &mut Context, code: char, modifiers: Modifiers) {
        if self.search.is_some() {
            self.search_key(cx, code);
            return;
        }
        if modifiers.ctrl {
            return;
        }
        match code {
            ' ' | 'j' | '.' | '\r' => self.next(cx),
            'b' | 'k' | ',' | '\x08' => self.previous(cx),
            'g' => self.goto(cx, 0),
            'G' => self.goto(cx, usize::MAX),
            'a' => {
                cx.schedule_advance(self.advance.unwrap_or(DEFAULT_ADVANCE));
                cx.show_message("slideshow", NOT_FOUND_DURATION);
            }
            'n' => {
                if let Some(query) = self.last_search.clone() {
                    self.find(cx, &query);
                }
            }
            'r' => self.reload(cx),
            'f' => cx.set_fullscreen(),
            'o' => self.open_link(cx),
            'q' | '\x1b' => cx.close(),
            '/' => {
                self.search = Some(String::new());
                cx.request_status_repaint();
            }
            _ => {}
        }
    }

    fn handle_pointer(
        &mut self,
        cx: &mut Context,
        _x: i32,
        _y: i32,
        button: Option<Button>,
        _modifiers: Modifiers,
        pressed: bool,
    ) {
        if !pressed {
            return;
        }
        match button {
            Some(Button::Left | Button::WheelDown | Button::WheelRight) => self.next(cx),
            Some(Button::Right | Button::WheelUp | Button::WheelLeft) => self.previous(cx),
            Some(Button::Middle) | None => {}
        }
    }

    fn resize(&mut self, cx: &mut Context, _width: u32, _height: u32) {
        cx.request_repaint();
    }

    fn reload(&mut self, cx: &mut Context) {
        match Deck::load(&self.path, self.password.as_deref()) {
            Ok(deck) => {
                self.deck = deck;
                self.page = self.page.min(self.deck.len() - 1);
                cx.set_title(&self.title());
                cx.show_message("reloaded", NOT_FOUND_DURATION);
                log::info!("reloaded {}", self.path.display());
            }
            Err(err) => cx.warn(&format!("reload failed: {err}")),
        }
    }

    fn copy_selection(&mut self, _cx: &Context) -> Option<String> {
        self.deck.get(self.page).map(|slide| slide.text())
    }

    fn is_searching(&self) -> bool {
        self.search.is_some()
    }

    fn advance_timer_elapsed(&mut self, cx: &mut Context) {
        if self.page + 1 < self.deck.len() {
            self.next(cx);
            cx.schedule_advance(self.advance.unwrap_or(DEFAULT_ADVANCE));
        }
    }
}

/// Starts `browser url` without blocking the viewer. A named thread waits
/// on the child so it is reaped when it exits.
fn launch(browser: &str, url: &str) -> std::io::Result<()> {
    let mut child = Command::new(browser).arg(url).spawn()?;
    std::thread::Builder::new()
        .name("browser-reaper".into())
        .spawn(move || {
            if let Err(err) = child.wait() {
                log::warn!("waiting for browser: {err}");
            }
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_core::config::LoopConfig;

    fn deck(options: Options) -> SlideDeck {
        let deck = Deck::parse("One\n---\nTwo needle\n---\nThree https://x.test\n", None).unwrap();
        SlideDeck::with_deck(PathBuf::from("/tmp/talk.txt"), deck, options)
    }

    fn cx() -> Context {
        Context::new(LoopConfig::new())
    }

    fn type_keys(viewer: &mut SlideDeck, cx: &mut Context, keys: &str) {
        for c in keys.chars() {
            viewer.handle_key(cx, c, Modifiers::NONE);
        }
    }

    #[test]
    fn initial_page_is_one_based_and_clamped() {
        let opened = deck(Options {
            page: Some(2),
            ..Options::default()
        });
        assert_eq!(opened.page(), 1);
        let clamped = deck(Options {
            page: Some(99),
            ..Options::default()
        });
        assert_eq!(clamped.page(), 2);
    }

    #[test]
    fn navigation_keys_move_and_clamp() {
        let mut viewer = deck(Options::default());
        let mut cx = cx();
        type_keys(&mut viewer, &mut cx, " j");
        assert_eq!(viewer.page(), 2);
        type_keys(&mut viewer, &mut cx, ".");
        assert_eq!(viewer.page(), 2, "already on last page");
        type_keys(&mut viewer, &mut cx, "g");
        assert_eq!(viewer.page(), 0);
        type_keys(&mut viewer, &mut cx, "b");
        assert_eq!(viewer.page(), 0, "already on first page");
        type_keys(&mut viewer, &mut cx, "G");
        assert_eq!(viewer.page(), 2);
    }

    #[test]
    fn search_jumps_to_match_and_consumes_keys() {
        let mut viewer = deck(Options::default());
        let mut cx = cx();
        type_keys(&mut viewer, &mut cx, "/needlq");
        assert!(viewer.is_searching());
        assert_eq!(viewer.page(), 0, "keys typed into the query do not navigate");
        type_keys(&mut viewer, &mut cx, "\x08e\r");
        assert!(!viewer.is_searching());
        assert_eq!(viewer.page(), 1);
    }

    #[test]
    fn missing_search_shows_message() {
        let mut viewer = deck(Options::default());
        let mut cx = cx();
        type_keys(&mut viewer, &mut cx, "/zzz\r");
        assert_eq!(viewer.page(), 0);
        assert_eq!(
            cx.status(),
            &StatusLine::Message("not found: zzz".to_owned())
        );
    }

    #[test]
    fn escape_cancels_search_then_quits() {
        let mut viewer = deck(Options::default());
        let mut cx = cx();
        type_keys(&mut viewer, &mut cx, "/abc\x1b");
        assert!(!viewer.is_searching());
        assert!(!cx.is_closing(), "first escape only cancels the search");
        type_keys(&mut viewer, &mut cx, "\x1b");
        assert!(cx.is_closing());
    }

    #[test]
    fn pointer_buttons_page() {
        let mut viewer = deck(Options::default());
        let mut cx = cx();
        let mut press = |viewer: &mut SlideDeck, button, pressed| {
            viewer.handle_pointer(&mut cx, 0, 0, Some(button), Modifiers::NONE, pressed);
        };
        press(&mut viewer, Button::Left, true);
        press(&mut viewer, Button::Left, false);
        assert_eq!(viewer.page(), 1, "release does nothing");
        press(&mut viewer, Button::WheelDown, true);
        assert_eq!(viewer.page(), 2);
        press(&mut viewer, Button::Right, true);
        assert_eq!(viewer.page(), 1);
    }

    #[test]
    fn slideshow_rearms_only_from_the_timer() {
        let mut viewer = deck(Options {
            advance: Some(Duration::from_secs(3)),
            ..Options::default()
        });
        let mut cx = cx();
        viewer.start(&mut cx);
        assert!(cx.advance_pending());

        cx.cancel_advance();
        viewer.advance_timer_elapsed(&mut cx);
        assert_eq!(viewer.page(), 1);
        assert!(cx.advance_pending(), "timer-driven turn re-arms");

        cx.cancel_advance();
        viewer.advance_timer_elapsed(&mut cx);
        assert_eq!(viewer.page(), 2);
        cx.cancel_advance();
        viewer.advance_timer_elapsed(&mut cx);
        assert!(!cx.advance_pending(), "slideshow stops on the last slide");
    }

    #[test]
    fn a_resumes_slideshow() {
        let mut viewer = deck(Options::default());
        let mut cx = cx();
        type_keys(&mut viewer, &mut cx, "a");
        assert!(cx.advance_pending());
    }

    #[test]
    fn copy_returns_slide_text() {
        let mut viewer = deck(Options {
            page: Some(2),
            ..Options::default()
        });
        let cx = cx();
        assert_eq!(
            viewer.copy_selection(&cx).as_deref(),
            Some("Three https://x.test")
        );
    }

    #[test]
    fn open_reports_missing_file() {
        let err = SlideDeck::open(PathBuf::from("/nonexistent/talk.txt"), Options::default())
            .unwrap_err();
        assert!(matches!(err, DeckError::Io { .. }), "got {err:?}");
    }

    #[test]
    fn failed_reload_warns_and_keeps_deck() {
        let mut viewer = deck(Options::default());
        viewer.path = PathBuf::from("/nonexistent/talk.txt");
        let mut cx = cx();
        viewer.reload(&mut cx);
        assert_eq!(viewer.deck.len(), 3);
        assert!(
            matches!(cx.status(), StatusLine::Message(m) if m.starts_with("warning: reload failed")),
            "got {:?}",
            cx.status()
        );
    }

    #[test]
    fn render_fills_status_bar() {
        let mut viewer = deck(Options {
            scale: 1,
            ..Options::default()
        });
        let mut cx = cx();
        cx.show_message("hello", Duration::from_secs(1));
        let mut canvas = Canvas::new(200, 150);
        viewer.render(&cx, &mut canvas).unwrap();
        let bar_top = 150 - cx.status_bar_height();
        assert_eq!(canvas.pixel(199, bar_top), Some(STATUS_BG));
        assert_eq!(canvas.pixel(0, 0), Some(BACKGROUNDS[0]));
        assert!(
            (0..200).any(|x| canvas.pixel(x, bar_top + 12) == Some(STATUS_TEXT)),
            "message text drawn"
        );
    }

    #[test]
    fn progress_is_proportional() {
        assert_eq!(progress(300, 1, 3), 100);
        assert_eq!(progress(300, 3, 3), 300);
        assert_eq!(progress(300, 5, 3), 300);
    }

    /// Children of this process that exited but were never waited on.
    #[cfg(target_os = "linux")]
    fn zombie_children() -> usize {
        let me = std::process::id().to_string();
        std::fs::read_dir("/proc")
            .unwrap()
            .filter_map(|entry| std::fs::read_to_string(entry.ok()?.path().join("stat")).ok())
            .filter(|stat| {
                // Fields after the parenthesized command: state, ppid, ...
                let Some((_, rest)) = stat.rsplit_once(')') else {
                    return false;
                };
                let mut fields = rest.split_whitespace();
                fields.next() == Some("Z") && fields.next() == Some(me.as_str())
            })
            .count()
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn launched_browser_is_reaped() {
        launch("true", "https://x.test").unwrap();
        // Let `true` exit, then allow the reaper time to collect it.
        std::thread::sleep(std::time::Duration::from_millis(300));
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while zombie_children() > 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert_eq!(zombie_children(), 0);
    }

    #[test]
    fn missing_browser_is_reported() {
        assert!(launch("/nonexistent/lectern-browser", "https://x.test").is_err());
    }
}
