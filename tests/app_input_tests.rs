use mangaview::main_app::{App, DIRECTION_CHANGED, FrameRequest, Mode, run_app_with_event_source};
use mangaview::notification::NotificationLevel;
use mangaview::settings::Settings;
use mangaview::test_utils::test_helpers::{TestScenarioBuilder, write_folder, write_pdf_with_counts};
use mangaview::{ReadingDirection, ReadingSession, TempWorkspace};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use tempfile::TempDir;

const WIDTH: u16 = 80;

struct Fixture {
    _scratch: TempDir,
    folder: TempDir,
    app: App,
}

fn app_with_pages(count: usize, settings: &Settings) -> Fixture {
    let scratch = TempDir::new().unwrap();
    let folder = TempDir::new().unwrap();
    let names: Vec<String> = (1..=count).map(|i| format!("{i:02}.png")).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    write_folder(folder.path(), &names);

    let workspace = TempWorkspace::new_in(scratch.path()).unwrap();
    let session = ReadingSession::with_display(workspace, FrameRequest::default());
    let mut app = App::new(session, settings);
    assert!(app.open_source(folder.path()));
    Fixture {
        _scratch: scratch,
        folder,
        app,
    }
}

fn run(app: &mut App, builder: TestScenarioBuilder) -> Terminal<TestBackend> {
    let mut terminal = Terminal::new(TestBackend::new(WIDTH, 24)).unwrap();
    let mut events = builder.quit().build();
    run_app_with_event_source(&mut terminal, app, &mut events).unwrap();
    terminal
}

fn screen_text(terminal: &Terminal<TestBackend>) -> String {
    let buffer = terminal.backend().buffer();
    buffer
        .content()
        .chunks(buffer.area.width as usize)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn arrow_keys_turn_pages_left_to_right() {
    let mut fixture = app_with_pages(5, &Settings::default());

    run(
        &mut fixture.app,
        TestScenarioBuilder::new().press_right(3).press_left(1),
    );

    assert_eq!(fixture.app.session.current_index(), Some(2));
}

#[test]
fn arrow_keys_are_inverted_right_to_left() {
    let settings = Settings {
        reading_direction: ReadingDirection::RightToLeft,
        ..Settings::default()
    };
    let mut fixture = app_with_pages(5, &settings);

    run(&mut fixture.app, TestScenarioBuilder::new().press_left(3));
    assert_eq!(fixture.app.session.current_index(), Some(3));

    run(&mut fixture.app, TestScenarioBuilder::new().press_right(10));
    assert_eq!(fixture.app.session.current_index(), Some(0));
}

#[test]
fn wheel_down_advances_and_wheel_up_goes_back() {
    let mut fixture = app_with_pages(4, &Settings::default());

    run(
        &mut fixture.app,
        TestScenarioBuilder::new()
            .scroll_down()
            .scroll_down()
            .scroll_down()
            .scroll_up(),
    );

    assert_eq!(fixture.app.session.current_index(), Some(2));
}

#[test]
fn taps_follow_screen_halves_and_direction() {
    let mut fixture = app_with_pages(4, &Settings::default());

    run(
        &mut fixture.app,
        TestScenarioBuilder::new().tap(WIDTH - 1).tap(WIDTH / 2).tap(0),
    );
    assert_eq!(fixture.app.session.current_index(), Some(1));

    run(
        &mut fixture.app,
        TestScenarioBuilder::new().toggle_direction().tap(0).tap(1),
    );
    assert_eq!(fixture.app.session.current_index(), Some(3));
}

#[test]
fn toggling_direction_keeps_page_and_notifies() {
    let mut fixture = app_with_pages(4, &Settings::default());

    let terminal = run(
        &mut fixture.app,
        TestScenarioBuilder::new().press_right(2).toggle_direction(),
    );

    assert_eq!(fixture.app.session.current_index(), Some(2));
    assert_eq!(
        fixture.app.session.direction(),
        ReadingDirection::RightToLeft
    );
    let notification = fixture.app.notifications.current().unwrap();
    assert_eq!(notification.message, DIRECTION_CHANGED);
    assert_eq!(notification.level, NotificationLevel::Info);
    assert!(screen_text(&terminal).contains(DIRECTION_CHANGED));
}

#[test]
fn screen_shows_current_page_position() {
    let mut fixture = app_with_pages(3, &Settings::default());

    let terminal = run(&mut fixture.app, TestScenarioBuilder::new().press_right(1));

    let text = screen_text(&terminal);
    assert!(text.contains("02.png"));
    assert!(text.contains("Page 2 / 3"));
}

#[test]
fn open_prompt_loads_a_pdf() {
    let mut fixture = app_with_pages(2, &Settings::default());
    let pdf = fixture.folder.path().join("volume.pdf");
    write_pdf_with_counts(&pdf, &[1, 1, 1]);

    run(
        &mut fixture.app,
        TestScenarioBuilder::new().press_right(1).open_path(&pdf),
    );

    assert_eq!(fixture.app.mode, Mode::Viewing);
    assert_eq!(fixture.app.session.sequence_len(), 3);
    assert_eq!(fixture.app.session.current_index(), Some(0));
}

#[test]
fn opening_something_else_keeps_current_sequence() {
    let mut fixture = app_with_pages(2, &Settings::default());
    let notes = fixture.folder.path().join("notes.txt");
    std::fs::write(&notes, b"hello").unwrap();

    assert!(!fixture.app.open_source(&notes));
    assert_eq!(fixture.app.session.sequence_len(), 2);
    assert_eq!(
        fixture.app.notifications.current().unwrap().level,
        NotificationLevel::Error
    );
}

#[test]
fn quit_key_ends_the_loop_and_shutdown_cleans_up() {
    let mut fixture = app_with_pages(1, &Settings::default());
    let pdf = fixture.folder.path().join("volume.pdf");
    write_pdf_with_counts(&pdf, &[1]);
    assert!(fixture.app.open_source(&pdf));
    let root = fixture
        .app
        .session
        .workspace()
        .path()
        .unwrap()
        .to_path_buf();

    run(&mut fixture.app, TestScenarioBuilder::new());
    fixture.app.shutdown();

    assert!(!root.exists());
    assert_eq!(fixture.app.session.sequence_len(), 0);
}
