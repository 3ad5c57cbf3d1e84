use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::info;

use crate::clock::Clock;
use crate::detection::{HeadControl, HeadPose};
use crate::runtime::AppEvent;
use crate::session::FocusSession;

/// What the event loop should do after handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Redraw,
    Idle,
    Quit,
}

/// Everything the terminal front end drives: the session plus the optional
/// handle steering a simulated camera.
#[derive(Debug)]
pub struct App<C: Clock> {
    pub session: FocusSession<C>,
    pub head: Option<HeadControl>,
}

impl<C: Clock> App<C> {
    pub fn new(session: FocusSession<C>, head: Option<HeadControl>) -> Self {
        Self { session, head }
    }

    pub fn head_pose(&self) -> Option<HeadPose> {
        self.head.as_ref().map(HeadControl::get)
    }

    pub fn handle_event(&mut self, event: AppEvent) -> Flow {
        match event {
            AppEvent::Tick => match self.session.on_tick() {
                Some(_) => Flow::Redraw,
                None => Flow::Idle,
            },
            AppEvent::Resize => Flow::Redraw,
            AppEvent::Detection { at_ms, result } => {
                let before = self.session.status().clone();
                let transition = self.session.observe_frame(at_ms, result);
                if transition.is_some() || &before != self.session.status() {
                    Flow::Redraw
                } else {
                    Flow::Idle
                }
            }
            AppEvent::Key(key) => self.handle_key(key),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Char('s') | KeyCode::Enter => {
                self.session.start();
            }
            KeyCode::Char('p') | KeyCode::Char(' ') => {
                self.session.toggle_pause();
            }
            KeyCode::Char('r') => self.session.reset(),
            KeyCode::Char('f') => {
                if let Some(head) = &self.head {
                    let pose = head.toggle_tilt();
                    info!(%pose, "simulated head moved");
                }
            }
            KeyCode::Char('d') => {
                if let Some(head) = &self.head {
                    let pose = head.toggle_presence();
                    info!(%pose, "simulated head moved");
                }
            }
            _ => return Flow::Idle,
        }
        Flow::Redraw
    }
}
