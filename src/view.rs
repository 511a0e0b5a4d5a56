//! The mounted feed view.
//!
//! Ties the controller, the media surface and the keyboard listener
//! together for the lifetime of one mount. The owning event loop calls
//! [`FeedView::pump`] once per tick.

use crate::controller::{Command, FeedController, FeedState};
use crate::keyboard::{command_for, KeyboardHub, ListenerGuard};
use crate::model::FeedItem;
use crate::panes::{DetailsPane, MediaPane};
use crate::surface::{Intent, MediaElement, MediaError, MediaSurface};
use tokio::sync::mpsc;

pub struct FeedView<E: MediaElement> {
    controller: FeedController,
    surface: MediaSurface<E>,
    key_commands: mpsc::UnboundedReceiver<Command>,
    _listener: ListenerGuard,
}

impl<E: MediaElement> FeedView<E> {
    /// Mount the view: installs one key listener on `hub` that lives until
    /// the view is dropped.
    pub fn mount(hub: &KeyboardHub, controller: FeedController, element: E) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let listener = hub.add_listener(move |event| match command_for(event) {
            Some(command) => {
                let _ = tx.send(command);
                true
            }
            None => false,
        });

        tracing::debug!("Feed view mounted");
        Self {
            controller,
            surface: MediaSurface::new(element),
            key_commands: rx,
            _listener: listener,
        }
    }

    /// Forward playback errors to `callback` in addition to showing them.
    pub fn on_error(&mut self, callback: impl FnMut(&MediaError) + 'static) {
        self.surface.on_error(callback);
    }

    pub fn load(&mut self, items: Vec<FeedItem>) {
        self.dispatch(Command::Load(items));
    }

    /// Run one command to completion and push the new intent to the surface.
    pub fn dispatch(&mut self, command: Command) {
        self.controller.dispatch(command);
        self.sync();
    }

    /// One event-loop step: queued shortcuts, then element events.
    pub fn pump(&mut self) {
        while let Ok(command) = self.key_commands.try_recv() {
            self.controller.dispatch(command);
        }
        self.sync();

        // Sync after every element command so a source switch happens
        // before anything else reaches the controller.
        for command in self.surface.poll() {
            self.dispatch(command);
        }
    }

    fn sync(&mut self) {
        let intent = Intent::from_state(self.controller.state());
        self.surface.sync(&intent);
    }

    pub fn state(&self) -> &FeedState {
        self.controller.state()
    }

    pub fn controller(&self) -> &FeedController {
        &self.controller
    }

    pub fn surface(&self) -> &MediaSurface<E> {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut MediaSurface<E> {
        &mut self.surface
    }

    pub fn details(&self) -> DetailsPane<'_> {
        DetailsPane::new(self.controller.state())
    }

    pub fn media_pane(&self) -> MediaPane {
        MediaPane::new(self.controller.state(), self.surface.error())
    }
}

impl<E: MediaElement> Drop for FeedView<E> {
    fn drop(&mut self) {
        tracing::debug!("Feed view unmounted");
    }
}
