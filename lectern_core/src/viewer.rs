// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contract for the document collaborator.
//!
//! The run loop knows nothing about documents. A [`Viewer`] owns the open
//! document, draws it into the [`Canvas`], and turns semantic input into page
//! changes. Opening the document is the viewer's own constructor; the loop
//! only ever sees an already-open viewer.

use alloc::string::String;

use crate::canvas::Canvas;
use crate::context::Context;
use crate::event::{Button, Modifiers};

/// The rendering and application-state collaborator driven by the run loop.
///
/// All callbacks run on the loop thread. Callbacks that change what is on
/// screen must call [`Context::request_repaint`] (or
/// [`Context::request_status_repaint`]); the loop never repaints on its own
/// initiative except after a resize or a dismissed message.
///
/// # Callback order within one loop iteration
///
/// ```text
/// handle_key / handle_pointer / reload     (drained events, in order)
/// resize                                   (canvas reallocated)
/// render, render_status_bar, post_blit     (only if dirty and gate open)
/// advance_timer_elapsed / message_timer_elapsed
/// ```
pub trait Viewer {
    /// Error returned when drawing fails. Drawing errors stop the loop.
    type Error: core::error::Error + 'static;

    /// Draws the current view into `canvas`, status bar area included.
    fn render(&mut self, cx: &Context, canvas: &mut Canvas) -> Result<(), Self::Error>;

    /// Draws only the status bar, the bottom
    /// [`Context::status_bar_height`] rows of `canvas`.
    fn render_status_bar(&mut self, cx: &Context, canvas: &mut Canvas)
    -> Result<(), Self::Error>;

    /// A key was pressed.
    fn handle_key(&mut self, cx: &mut Context, code: char, modifiers: Modifiers);

    /// The pointer moved (`button` is `None`) or a button changed state.
    fn handle_pointer(
        &mut self,
        cx: &mut Context,
        x: i32,
        y: i32,
        button: Option<Button>,
        modifiers: Modifiers,
        pressed: bool,
    );

    /// The canvas was reallocated at a new size.
    fn resize(&mut self, cx: &mut Context, width: u32, height: u32);

    /// Re-reads the document from its source.
    ///
    /// Failures should be reported with [`Context::warn`].
    fn reload(&mut self, cx: &mut Context);

    /// The text to place on the clipboard, if anything is selected.
    fn copy_selection(&mut self, cx: &Context) -> Option<String>;

    /// Called after a frame was handed to the display.
    fn post_blit(&mut self, cx: &mut Context) {
        let _ = cx;
    }

    /// Returns `true` while the viewer is taking search input from the
    /// keyboard.
    fn is_searching(&self) -> bool {
        false
    }

    /// The auto-advance deadline fired.
    ///
    /// The deadline is not re-armed; call [`Context::schedule_advance`] to
    /// keep a slideshow going. Defaults to a synthetic next-page key.
    fn advance_timer_elapsed(&mut self, cx: &mut Context) {
        self.handle_key(cx, ' ', Modifiers::NONE);
    }

    /// The message deadline fired. The loop has already hidden the status
    /// line and requested a repaint.
    fn message_timer_elapsed(&mut self, cx: &mut Context) {
        let _ = cx;
    }
}
