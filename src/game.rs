use crate::audio::AudioManager;
use crate::config::ArenaConfig;
use crate::controller::InputState;
use crate::error::SetupError;
use crate::marquee::Marquee;
use crate::play::PlaySession;
use crate::render::Renderer;
use crate::types::CombatEvent;
use log::{error, info};
use macroquad::prelude::{get_frame_time, next_frame};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    PreMarquee,
    Marquee,
    Play,
}

/// The active top-level mode and the state it owns
pub enum Mode {
    /// Title card waiting for a first key press
    PreMarquee,
    Marquee(Marquee),
    Play(Box<PlaySession>),
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::PreMarquee => ModeKind::PreMarquee,
            Mode::Marquee(_) => ModeKind::Marquee,
            Mode::Play(_) => ModeKind::Play,
        }
    }
}

/// Owns exactly one active mode and switches between them
pub struct GameStateMachine {
    config: ArenaConfig,
    mode: Mode,
    last_error: Option<SetupError>,
    quit_requested: bool,
}

impl GameStateMachine {
    pub fn new(config: ArenaConfig) -> Self {
        GameStateMachine {
            config,
            mode: Mode::PreMarquee,
            last_error: None,
            quit_requested: false,
        }
    }

    pub fn kind(&self) -> ModeKind {
        self.mode.kind()
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn session(&self) -> Option<&PlaySession> {
        match &self.mode {
            Mode::Play(session) => Some(session),
            _ => None,
        }
    }

    /// Why the last attempt to start a match failed, if it did
    pub fn last_error(&self) -> Option<&SetupError> {
        self.last_error.as_ref()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Leaves the current mode, then enters `next`. A match that cannot be
    /// set up leaves the machine in Marquee.
    pub fn transition(&mut self, next: ModeKind) {
        let previous = std::mem::replace(&mut self.mode, Mode::PreMarquee);
        let from = previous.kind();
        Self::on_exit(previous);
        self.mode = self.on_enter(next);
        crate::debug_state!("{:?} -> {:?}", from, self.kind());
    }

    fn on_exit(mode: Mode) {
        if let Mode::Play(mut session) = mode {
            session.on_exit();
        }
    }

    fn on_enter(&mut self, next: ModeKind) -> Mode {
        match next {
            ModeKind::PreMarquee => Mode::PreMarquee,
            ModeKind::Marquee => Mode::Marquee(Marquee::tour(self.config.half_extent())),
            ModeKind::Play => match PlaySession::new(&self.config) {
                Ok(session) => {
                    self.last_error = None;
                    info!("Match started");
                    Mode::Play(Box::new(session))
                }
                Err(e) => {
                    error!("Could not start a match: {}", e);
                    self.last_error = Some(e);
                    Mode::Marquee(Marquee::tour(self.config.half_extent()))
                }
            },
        }
    }

    /// Runs the active mode for one frame and applies any transition it asks for.
    pub fn update(&mut self, dt: f32, input: &InputState) -> Vec<CombatEvent> {
        let mut events = Vec::new();
        let next = match &mut self.mode {
            Mode::PreMarquee => {
                if input.back {
                    self.quit_requested = true;
                }
                input.start.then_some(ModeKind::Marquee)
            }
            Mode::Marquee(marquee) => {
                marquee.update(dt);
                if input.back {
                    self.quit_requested = true;
                }
                input.start.then_some(ModeKind::Play)
            }
            Mode::Play(session) => {
                events = session.update(dt, input);
                let leave = input.back || (session.is_over() && input.start);
                leave.then_some(ModeKind::Marquee)
            }
        };
        if let Some(next) = next {
            self.transition(next);
        }
        events
    }

    /// Main loop: poll input, update the active mode, play sounds, draw.
    pub async fn run(&mut self, renderer: &Renderer, audio: &AudioManager) {
        info!("Starting main loop...");
        while !Renderer::window_should_close() && !self.quit_requested {
            let input = InputState::poll();
            let events = self.update(get_frame_time(), &input);
            for event in &events {
                audio.react(event);
            }
            renderer.draw_frame(self);
            next_frame().await;
        }
        if let Mode::Play(session) = &mut self.mode {
            session.on_exit();
        }
        info!("Exiting Tank Arena.");
    }
}
