use iced::keyboard::{self, key, Key};
use iced::widget::{button, column, container, image, row, slider, text, text_input};
use iced::{window, Element, Length, Subscription, Task};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use video_viewer::{Config, Icon, PlaybackController, PlaybinEngine, Prompt, ViewIntent, ViewModel};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "m4v", "wmv", "webm", "flv"];

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load().unwrap_or_else(|err| {
        log::warn!("ignoring config: {err}");
        Config::default()
    });
    let engine = match PlaybinEngine::new() {
        Ok(engine) => engine,
        Err(err) => {
            log::error!("cannot initialise GStreamer: {err}");
            std::process::exit(1);
        }
    };

    iced::application("Video Viewer", App::update, App::view)
        .subscription(App::subscription)
        .run_with(move || (App::new(engine, config), Task::none()))
}

#[derive(Clone, Debug)]
enum Message {
    Poll,
    NextFrame,
    OpenFile,
    UrlInputChanged(String),
    OpenUrl,
    PlayPause,
    Stop,
    Seek(f64),
    SeekRelease,
    Volume(f64),
    Rate(f64),
    Save,
    SaveAs,
    Delete,
    DismissError,
    ToggleFullscreen,
    ExitFullscreen,
}

struct App {
    controller: PlaybackController<PlaybinEngine, ViewModel>,
    frame: Option<image::Handle>,
    url_input: String,
    dragging: Option<u64>,
    fullscreen: bool,
    config: Config,
}

impl App {
    fn new(engine: PlaybinEngine, config: Config) -> Self {
        App {
            controller: PlaybackController::new(engine, ViewModel::new(), &config.playback),
            frame: None,
            url_input: String::new(),
            dragging: None,
            fullscreen: false,
            config,
        }
    }

    fn dispatch(&mut self, intent: ViewIntent) {
        self.controller.handle_intent(intent, &mut Dialogs);
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Task<Message> {
        if self.fullscreen == fullscreen {
            return Task::none();
        }
        self.fullscreen = fullscreen;

        let mode = window_mode(fullscreen);
        window::get_latest().and_then(move |id| window::change_mode(id, mode))
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ToggleFullscreen => return self.set_fullscreen(!self.fullscreen),
            Message::ExitFullscreen => return self.set_fullscreen(false),
            Message::Poll => {
                for notification in self.controller.engine_mut().poll() {
                    self.controller.handle_engine_event(notification);
                }
                if self.controller.session().is_none() {
                    self.frame = None;
                }
            }
            Message::NextFrame => {
                if let Some(frame) = self.controller.engine().take_frame() {
                    self.frame = Some(image::Handle::from_rgba(
                        frame.width,
                        frame.height,
                        frame.pixels,
                    ));
                }
            }
            Message::OpenFile => {
                let picked = rfd::FileDialog::new()
                    .set_title("Open video")
                    .add_filter("Video", VIDEO_EXTENSIONS)
                    .add_filter("All files", &["*"])
                    .pick_file();
                if let Some(path) = picked {
                    self.frame = None;
                    self.dispatch(ViewIntent::OpenFile(path));
                }
            }
            Message::UrlInputChanged(text) => {
                self.url_input = text;
            }
            Message::OpenUrl => {
                if !self.url_input.trim().is_empty() {
                    self.frame = None;
                    self.dispatch(ViewIntent::OpenUrl(self.url_input.clone()));
                }
            }
            Message::PlayPause => self.dispatch(ViewIntent::PlayPause),
            Message::Stop => self.dispatch(ViewIntent::Stop),
            Message::Seek(value) => {
                if self.dragging.is_none() {
                    self.dispatch(ViewIntent::SliderDragStarted);
                }
                let value = value.max(0.0) as u64;
                self.dragging = Some(value);
                self.dispatch(ViewIntent::SliderDragged(value));
            }
            Message::SeekRelease => {
                if let Some(value) = self.dragging.take() {
                    self.dispatch(ViewIntent::SliderDragEnded(value));
                }
            }
            Message::Volume(volume) => {
                self.dispatch(ViewIntent::VolumeChanged(volume.round() as i32));
            }
            Message::Rate(rate) => {
                self.dispatch(ViewIntent::RateChanged((rate * 100.0).round() / 100.0));
            }
            Message::Save => self.dispatch(ViewIntent::Save),
            Message::SaveAs => {
                let suggested = self
                    .controller
                    .session()
                    .and_then(|session| session.source().local_path())
                    .and_then(Path::file_name)
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "video.mp4".to_owned());
                if let Some(path) = Dialogs.save_destination(&suggested) {
                    self.dispatch(ViewIntent::SaveAs(path));
                }
            }
            Message::Delete => self.dispatch(ViewIntent::Delete),
            Message::DismissError => self.controller.view_mut().dismiss_error(),
        }
        Task::none()
    }

    fn view(&self) -> Element<Message> {
        let model = self.controller.view();

        let toolbar = row![
            button(text("Open…")).on_press(Message::OpenFile),
            text_input("https://example.com/stream.m3u8", &self.url_input)
                .on_input(Message::UrlInputChanged)
                .on_submit(Message::OpenUrl)
                .width(Length::Fixed(320.0)),
            button(text("Open URL")).on_press(Message::OpenUrl),
            button(text("Save")).on_press(Message::Save),
            button(text("Save as…")).on_press(Message::SaveAs),
            button(text("Delete…")).on_press(Message::Delete),
        ]
        .spacing(5)
        .padding(5)
        .align_y(iced::alignment::Vertical::Center);

        let video: Element<Message> = match &self.frame {
            Some(handle) => image(handle.clone())
                .width(Length::Fill)
                .height(Length::Fill)
                .content_fit(iced::ContentFit::Contain)
                .into(),
            None => text("Open a file or a URL to start").into(),
        };

        let seek_bar = container(
            slider(
                0.0..=model.slider_max.max(1) as f64,
                model.slider_value as f64,
                Message::Seek,
            )
            .step(100.0)
            .on_release(Message::SeekRelease),
        )
        .padding(iced::Padding::new(5.0).left(10.0).right(10.0));

        let playback = &self.config.playback;
        let controls = row![
            button(text(match model.icon {
                Icon::Play => "Play",
                Icon::Pause => "Pause",
            }))
            .width(80.0)
            .on_press(Message::PlayPause),
            button(text("Stop")).width(80.0).on_press(Message::Stop),
            button(text(if self.fullscreen {
                "Windowed"
            } else {
                "Fullscreen"
            }))
            .on_press(Message::ToggleFullscreen),
            text(model.time_label.as_str()).width(Length::Fill),
            text("Volume"),
            slider(0.0..=100.0, f64::from(model.volume), Message::Volume).width(120.0),
            text(format!("Speed {:.2}x", model.rate)),
            slider(playback.min_rate..=playback.max_rate, model.rate, Message::Rate)
                .step(0.05)
                .width(120.0),
        ]
        .spacing(5)
        .align_y(iced::alignment::Vertical::Center)
        .padding(iced::Padding::new(10.0).top(0.0));

        let mut content = column![]
            .push_maybe((!self.fullscreen).then_some(toolbar))
            .push(
                container(video)
                    .align_x(iced::Alignment::Center)
                    .align_y(iced::Alignment::Center)
                    .width(Length::Fill)
                    .height(Length::Fill),
            )
            .push(seek_bar)
            .push(controls);

        if let Some(error) = &model.error {
            content = content.push(
                row![
                    text(error.as_str()).width(Length::Fill),
                    button(text("Dismiss")).on_press(Message::DismissError),
                ]
                .spacing(10)
                .padding(5)
                .align_y(iced::alignment::Vertical::Center),
            );
        }
        content
            .push(text(model.status.as_deref().unwrap_or_default()).size(12))
            .padding(5)
            .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        let poll = iced::time::every(self.config.engine.poll_interval).map(|_| Message::Poll);
        let keys = keyboard::on_key_press(|key, _modifiers| shortcut(key.as_ref()));

        if self.controller.state().is_live() {
            let frames = iced::time::every(FRAME_INTERVAL).map(|_| Message::NextFrame);
            Subscription::batch([poll, keys, frames])
        } else {
            Subscription::batch([poll, keys])
        }
    }
}

fn shortcut(key: Key<&str>) -> Option<Message> {
    match key {
        Key::Named(key::Named::Space) => Some(Message::PlayPause),
        Key::Character("s") => Some(Message::Stop),
        Key::Character("f") => Some(Message::ToggleFullscreen),
        Key::Named(key::Named::Escape) => Some(Message::ExitFullscreen),
        _ => None,
    }
}

fn window_mode(fullscreen: bool) -> window::Mode {
    if fullscreen {
        window::Mode::Fullscreen
    } else {
        window::Mode::Windowed
    }
}

/// Native dialogs backing the controller's questions.
struct Dialogs;

impl Prompt for Dialogs {
    fn save_destination(&mut self, suggested_name: &str) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Save copy as")
            .set_file_name(suggested_name)
            .save_file()
    }

    fn confirm_delete(&mut self, path: &Path) -> bool {
        let answer = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Warning)
            .set_title("Delete file")
            .set_description(format!("Are you sure you want to delete:\n{}", path.display()))
            .set_buttons(rfd::MessageButtons::YesNo)
            .show();
        matches!(answer, rfd::MessageDialogResult::Yes)
    }
}
