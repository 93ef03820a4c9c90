mod common;

use common::{controller, video_file, Command, ScriptedPrompt};
use video_viewer::{
    EngineEvent, EngineNotification, EngineState, Error, Icon, Locator, PlaybackState, ViewIntent,
};

#[test]
fn open_then_duration_then_position() {
    let dir = tempfile::tempdir().unwrap();
    let path = video_file(dir.path(), "a.mp4");
    let mut controller = controller();

    let id = controller.open_file(&path).unwrap();
    assert_eq!(controller.session().unwrap().duration_ms(), 0);
    assert_eq!(controller.view().time_label, "00:00 / 00:00");

    controller.on_engine_duration_changed(id, 125_000);
    assert_eq!(controller.view().slider_max, 125_000);
    assert_eq!(controller.view().time_label, "00:00 / 02:05");

    controller.on_engine_state_changed(id, EngineState::Playing);
    controller.on_engine_position_changed(id, 65_000);
    assert_eq!(controller.view().time_label, "01:05 / 02:05");
    assert_eq!(controller.view().slider_value, 65_000);
    assert_eq!(controller.view().icon, Icon::Pause);
    assert_eq!(controller.state(), PlaybackState::Playing);
}

#[test]
fn open_loads_applies_settings_and_plays_without_waiting() {
    let dir = tempfile::tempdir().unwrap();
    let path = video_file(dir.path(), "a.mp4");
    let mut controller = controller();

    let id = controller.open_file(&path).unwrap();

    assert_eq!(
        controller.engine_mut().take(),
        vec![
            Command::Load(id, Locator::LocalFile(path.clone())),
            Command::Volume(50),
            Command::Rate(1.0),
            Command::Play,
        ]
    );
    assert_eq!(controller.state(), PlaybackState::Stopped);
    assert!(controller
        .view()
        .status
        .as_deref()
        .unwrap()
        .starts_with("Opened: "));
}

#[test]
fn dragging_holds_the_slider_but_not_the_label() {
    let mut controller = controller();
    let id = controller
        .open(Locator::parse("http://example.com/a.mp4").unwrap())
        .unwrap();
    controller.on_engine_duration_changed(id, 600_000);
    controller.on_engine_position_changed(id, 10_000);

    controller.slider_drag_started();
    controller.slider_dragged(300_000).unwrap();
    assert!(controller.is_seeking());

    for position in [11_000, 12_000, 13_000] {
        controller.on_engine_position_changed(id, position);
        assert_eq!(controller.view().slider_value, 300_000);
    }
    assert_eq!(controller.view().time_label, "00:13 / 10:00");
    assert_eq!(controller.session().unwrap().position_ms(), 13_000);

    controller.slider_drag_ended(310_000).unwrap();
    assert!(!controller.is_seeking());
    let commands = controller.engine_mut().take();
    assert!(commands.ends_with(&[Command::Seek(300_000), Command::Seek(310_000)]));

    controller.on_engine_position_changed(id, 310_500);
    assert_eq!(controller.view().slider_value, 310_500);
}

#[test]
fn callbacks_from_a_superseded_session_are_ignored() {
    let mut controller = controller();
    let old = controller
        .open(Locator::parse("http://example.com/old.mp4").unwrap())
        .unwrap();
    let new = controller
        .open(Locator::parse("http://example.com/new.mp4").unwrap())
        .unwrap();
    assert_ne!(old, new);

    let before = controller.view().clone();
    for event in [
        EngineEvent::DurationChanged(90_000),
        EngineEvent::PositionChanged(45_000),
        EngineEvent::StateChanged(EngineState::Playing),
        EngineEvent::Error("old source vanished".into()),
        EngineEvent::EndOfStream,
    ] {
        controller.handle_engine_event(EngineNotification::new(old, event));
    }

    assert_eq!(controller.view(), &before);
    assert_eq!(controller.state(), PlaybackState::Stopped);
    assert_eq!(controller.session().unwrap().id(), new);

    controller.handle_engine_event(EngineNotification::new(
        new,
        EngineEvent::DurationChanged(90_000),
    ));
    assert_eq!(controller.view().slider_max, 90_000);
}

#[test]
fn toggle_on_idle_is_a_quiet_no_op() {
    let mut controller = controller();

    controller.toggle_play_pause().unwrap();

    assert_eq!(controller.state(), PlaybackState::Idle);
    assert!(controller.engine_mut().take().is_empty());
    assert_eq!(controller.view().status.as_deref(), Some("No media loaded"));
    assert_eq!(controller.view().error, None);
}

#[test]
fn toggle_follows_engine_state() {
    let mut controller = controller();
    let id = controller
        .open(Locator::parse("http://example.com/a.mp4").unwrap())
        .unwrap();
    controller.engine_mut().take();

    controller.toggle_play_pause().unwrap();
    controller.on_engine_state_changed(id, EngineState::Playing);
    controller.toggle_play_pause().unwrap();
    controller.on_engine_state_changed(id, EngineState::Paused);
    assert_eq!(controller.view().icon, Icon::Play);
    controller.toggle_play_pause().unwrap();

    assert_eq!(
        controller.engine_mut().take(),
        vec![Command::Play, Command::Pause, Command::Play]
    );
}

#[test]
fn stop_rewinds_and_resets_controls() {
    let mut controller = controller();
    let id = controller
        .open(Locator::parse("http://example.com/a.mp4").unwrap())
        .unwrap();
    controller.on_engine_duration_changed(id, 125_000);
    controller.on_engine_state_changed(id, EngineState::Playing);
    controller.on_engine_position_changed(id, 65_000);
    controller.engine_mut().take();

    controller.stop().unwrap();

    assert_eq!(controller.engine_mut().take(), vec![Command::Stop]);
    assert_eq!(controller.state(), PlaybackState::Stopped);
    assert_eq!(controller.session().unwrap().position_ms(), 0);
    assert_eq!(controller.view().slider_value, 0);
    assert_eq!(controller.view().icon, Icon::Play);
    assert_eq!(controller.view().time_label, "00:00 / 02:05");
}

#[test]
fn seek_is_clamped_to_the_duration() {
    let mut controller = controller();
    controller.seek(5_000).unwrap();
    assert!(controller.engine_mut().take().is_empty());

    let id = controller
        .open(Locator::parse("http://example.com/a.mp4").unwrap())
        .unwrap();
    controller.on_engine_duration_changed(id, 10_000);
    controller.engine_mut().take();

    controller.seek(50_000).unwrap();
    controller.seek(2_500).unwrap();
    assert_eq!(
        controller.engine_mut().take(),
        vec![Command::Seek(10_000), Command::Seek(2_500)]
    );
}

#[test]
fn invalid_url_leaves_the_session_alone() {
    let mut controller = controller();
    let id = controller
        .open(Locator::parse("http://example.com/a.mp4").unwrap())
        .unwrap();
    controller.engine_mut().take();

    let result = controller.open_url("not a url");

    assert!(matches!(result, Err(Error::InvalidSource(_))));
    assert_eq!(controller.session().unwrap().id(), id);
    assert!(controller.engine_mut().take().is_empty());
}

#[test]
fn engine_error_parks_the_session_until_reopen() {
    let mut controller = controller();
    let id = controller
        .open(Locator::parse("http://example.com/a.mp4").unwrap())
        .unwrap();
    controller.on_engine_state_changed(id, EngineState::Playing);
    controller.engine_mut().take();

    controller.on_engine_error(id, "could not demultiplex stream");

    assert_eq!(controller.state(), PlaybackState::Errored);
    assert_eq!(
        controller.view().error.as_deref(),
        Some("could not demultiplex stream")
    );
    assert_eq!(controller.view().icon, Icon::Play);

    controller.toggle_play_pause().unwrap();
    controller.stop().unwrap();
    controller.seek(1_000).unwrap();
    controller.on_engine_state_changed(id, EngineState::Playing);
    assert!(controller.engine_mut().take().is_empty());
    assert_eq!(controller.state(), PlaybackState::Errored);

    let reopened = controller
        .open(Locator::parse("http://example.com/b.mp4").unwrap())
        .unwrap();
    controller.on_engine_state_changed(reopened, EngineState::Playing);
    assert_eq!(controller.state(), PlaybackState::Playing);
}

#[test]
fn failed_load_marks_the_new_session_errored() {
    let mut controller = controller();
    controller.engine_mut().fail_load = true;

    let result = controller.open(Locator::parse("http://example.com/a.xyz").unwrap());

    assert!(matches!(result, Err(Error::Engine(ref m)) if m == "no decoder for this format"));
    assert_eq!(controller.state(), PlaybackState::Errored);
    assert!(!controller.engine_mut().take().contains(&Command::Play));
}

#[test]
fn end_of_stream_stops() {
    let mut controller = controller();
    let id = controller
        .open(Locator::parse("http://example.com/a.mp4").unwrap())
        .unwrap();
    controller.on_engine_state_changed(id, EngineState::Playing);

    controller.handle_engine_event(EngineNotification::new(id, EngineEvent::EndOfStream));

    assert_eq!(controller.state(), PlaybackState::Stopped);
    assert_eq!(controller.view().icon, Icon::Play);
    assert_eq!(controller.view().status.as_deref(), Some("Finished"));
}

#[test]
fn volume_outside_range_never_reaches_the_engine() {
    let mut controller = controller();

    assert!(matches!(
        controller.set_volume(101),
        Err(Error::InvalidParameter(_))
    ));
    assert!(matches!(
        controller.set_volume(-1),
        Err(Error::InvalidParameter(_))
    ));
    assert!(controller.engine_mut().take().is_empty());

    controller.set_volume(80).unwrap();
    assert_eq!(controller.engine_mut().take(), vec![Command::Volume(80)]);
    assert_eq!(controller.view().volume, 80);
    assert_eq!(controller.volume(), 80);
}

#[test]
fn rate_is_bounded_and_carried_into_the_next_session() {
    let mut controller = controller();

    assert!(matches!(
        controller.set_rate(3.0),
        Err(Error::InvalidParameter(_))
    ));
    assert!(matches!(
        controller.set_rate(f64::NAN),
        Err(Error::InvalidParameter(_))
    ));

    controller.set_rate(1.5).unwrap();
    assert!(controller.engine_mut().take().is_empty());
    assert_eq!(controller.view().rate, 1.5);

    controller
        .open(Locator::parse("http://example.com/a.mp4").unwrap())
        .unwrap();
    assert!(controller.engine_mut().take().contains(&Command::Rate(1.5)));

    controller.set_rate(0.75).unwrap();
    assert_eq!(controller.engine_mut().take(), vec![Command::Rate(0.75)]);
}

#[test]
fn long_duration_keeps_short_position_format() {
    let mut controller = controller();
    let id = controller
        .open(Locator::parse("http://example.com/film.mkv").unwrap())
        .unwrap();

    controller.on_engine_duration_changed(id, 5_400_000);
    controller.on_engine_position_changed(id, 65_000);

    assert_eq!(controller.view().time_label, "01:05 / 01:30:00");
}

#[test]
fn intents_surface_errors_in_the_view() {
    let mut controller = controller();
    let mut prompt = ScriptedPrompt::default();

    controller.handle_intent(ViewIntent::OpenUrl("not a url".into()), &mut prompt);
    assert!(controller
        .view()
        .error
        .as_deref()
        .unwrap()
        .starts_with("invalid source"));
    assert_eq!(controller.state(), PlaybackState::Idle);

    controller.handle_intent(ViewIntent::VolumeChanged(150), &mut prompt);
    assert!(controller
        .view()
        .error
        .as_deref()
        .unwrap()
        .starts_with("invalid parameter"));
}

#[test]
fn intents_drive_a_drag() {
    let mut controller = controller();
    let mut prompt = ScriptedPrompt::default();
    controller.handle_intent(
        ViewIntent::OpenUrl("https://example.com/a.mp4".into()),
        &mut prompt,
    );
    let id = controller.session().unwrap().id();
    controller.on_engine_duration_changed(id, 60_000);
    controller.engine_mut().take();

    controller.handle_intent(ViewIntent::SliderDragStarted, &mut prompt);
    controller.handle_intent(ViewIntent::SliderDragged(20_000), &mut prompt);
    controller.on_engine_position_changed(id, 1_000);
    assert_eq!(controller.view().slider_value, 20_000);
    controller.handle_intent(ViewIntent::SliderDragEnded(25_000), &mut prompt);

    assert_eq!(
        controller.engine_mut().take(),
        vec![Command::Seek(20_000), Command::Seek(25_000)]
    );
    assert_eq!(controller.view().slider_value, 25_000);
    assert_eq!(controller.view().error, None);
}

#[test]
fn save_intent_on_a_stream_reports_no_local_file() {
    let mut controller = controller();
    let mut prompt = ScriptedPrompt::default();
    controller.handle_intent(
        ViewIntent::OpenUrl("https://example.com/live.m3u8".into()),
        &mut prompt,
    );

    controller.handle_intent(ViewIntent::Save, &mut prompt);

    assert_eq!(
        controller.view().error.as_deref(),
        Some(Error::NoLocalSource.to_string().as_str())
    );
    assert!(prompt.save_questions.is_empty());
    assert!(controller.session().is_some());
}

#[test]
fn declined_delete_intent_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = video_file(dir.path(), "a.mp4");
    let mut controller = controller();
    let mut prompt = ScriptedPrompt::default();
    controller.handle_intent(ViewIntent::OpenFile(path.clone()), &mut prompt);
    controller.engine_mut().take();

    controller.handle_intent(ViewIntent::Delete, &mut prompt);

    assert_eq!(controller.view().error, None);
    assert_eq!(controller.view().status.as_deref(), Some("Delete cancelled"));
    assert_eq!(prompt.delete_questions, vec![path.clone()]);
    assert!(path.exists());
    assert!(controller.engine_mut().take().is_empty());
}
