//! BeatBox - a GUI drum machine.
//!
//! Presents the 16x16 step grid and the transport buttons, and routes every
//! action to [`ApplicationState`]. Sound goes out through a MIDI output port
//! (preferring IAC Driver on macOS).

mod ui;

use iced::widget::{button, column, row, text, text_input, Button};
use iced::{Element, Fill, Length, Theme};
use tracing::{error, info};

use beatbox::app::{default_pattern_path, ApplicationState};
use beatbox::config::BeatBoxConfig;
use beatbox::midi::MidiOut;
use beatbox::pattern::Pattern;
use beatbox::playback::PlaybackState;
use beatbox::sequencer::MidiSequencer;

use ui::grid::view_grid;

fn main() -> iced::Result {
    beatbox::init_logging();

    iced::application(BeatBox::new, BeatBox::update, BeatBox::view)
        .title("BeatBox")
        .theme(BeatBox::theme)
        .run()
}

type MidiApp = ApplicationState<MidiSequencer<MidiOut>>;

struct BeatBox {
    /// None when the sound backend could not be opened
    app: Option<MidiApp>,
    /// Shown instead of the live pattern when there is no backend
    empty: Pattern,
    pattern_path: String,
    status: String,
}

#[derive(Debug, Clone)]
enum Message {
    Toggle(usize, usize),
    Start,
    Stop,
    TempoUp,
    TempoDown,
    Clear,
    Save,
    Load,
    PathChanged(String),
}

impl BeatBox {
    fn new() -> Self {
        let (config, config_status) = match BeatBoxConfig::load(BeatBoxConfig::default_path()) {
            Ok(config) => (config, None),
            Err(e) => {
                error!("{:#}", e);
                (BeatBoxConfig::default(), Some(format!("Config ignored: {:#}", e)))
            }
        };

        let pattern_path = config.pattern_file.clone().unwrap_or_default();

        match MidiSequencer::connect(config.output_device.as_deref()) {
            Ok(sequencer) => Self {
                app: Some(ApplicationState::new(sequencer, &config)),
                empty: Pattern::new(),
                pattern_path,
                status: config_status.unwrap_or_else(|| "Ready".to_string()),
            },
            Err(e) => {
                error!(error = %e, "cannot start without a sound backend");
                Self {
                    app: None,
                    empty: Pattern::new(),
                    pattern_path,
                    status: e.to_string(),
                }
            }
        }
    }

    fn update(&mut self, message: Message) {
        if let Message::PathChanged(path) = message {
            self.pattern_path = path;
            return;
        }

        let Some(app) = self.app.as_mut() else {
            return;
        };

        let result = match message {
            Message::Toggle(instrument, step) => app.toggle(instrument, step),
            Message::Start => app.start(),
            Message::Stop => {
                app.stop();
                Ok(())
            }
            Message::TempoUp => {
                app.tempo_up();
                Ok(())
            }
            Message::TempoDown => {
                app.tempo_down();
                Ok(())
            }
            Message::Clear => {
                app.clear();
                Ok(())
            }
            Message::Save => {
                if self.pattern_path.trim().is_empty() {
                    let dir = std::env::current_dir().unwrap_or_else(|_| ".".into());
                    self.pattern_path = default_pattern_path(&dir).display().to_string();
                }
                app.save_pattern(self.pattern_path.trim())
                    .map(|_| info!(path = %self.pattern_path, "saved from UI"))
            }
            Message::Load => app.load_pattern(self.pattern_path.trim()),
            Message::PathChanged(_) => Ok(()),
        };

        self.status = match result {
            Ok(()) => match app.playback_state() {
                PlaybackState::Playing => format!("Playing at {:.1} BPM", app.effective_bpm()),
                PlaybackState::Stopped => "Stopped".to_string(),
            },
            Err(e) => {
                error!(error = %e, "action failed");
                e.to_string()
            }
        };
    }

    fn view(&self) -> Element<'_, Message> {
        let pattern = self
            .app
            .as_ref()
            .map(|app| app.pattern())
            .unwrap_or(&self.empty);

        let enabled = self.app.is_some();
        let controls = column![
            action_button("Start", Message::Start, enabled),
            action_button("Stop", Message::Stop, enabled),
            action_button("Tempo Up", Message::TempoUp, enabled),
            action_button("Tempo Down", Message::TempoDown, enabled),
            action_button("Clear", Message::Clear, enabled),
            action_button("Save", Message::Save, enabled),
            action_button("Load", Message::Load, enabled),
        ]
        .spacing(6)
        .width(Length::Fixed(140.0));

        let path_input = text_input("pattern file (.yaml)", &self.pattern_path)
            .on_input(Message::PathChanged)
            .size(14);

        column![
            text("BeatBox").size(32),
            row![view_grid(pattern, Message::Toggle), controls].spacing(12),
            path_input,
            text(&self.status).size(14),
        ]
        .spacing(10)
        .padding(12)
        .into()
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Buttons stay inert without a sound backend.
fn enabled_action(enabled: bool, message: Message) -> Option<Message> {
    enabled.then_some(message)
}

fn action_button(label: &str, message: Message, enabled: bool) -> Button<'_, Message> {
    button(label)
        .on_press_maybe(enabled_action(enabled, message))
        .width(Fill)
}

impl Default for BeatBox {
    fn default() -> Self {
        Self::new()
    }
}
