use mangaview::test_utils::test_helpers::{
    FIXTURE_JPEG, FixtureImage, RecordingDisplay, file_names, write_folder, write_pdf,
    write_pdf_with_counts,
};
use mangaview::{FolderSource, IngestError, PdfImageExtractor, ReadingSession, TempWorkspace};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn session_in(scratch: &TempDir) -> ReadingSession<RecordingDisplay> {
    let workspace = TempWorkspace::new_in(scratch.path()).unwrap();
    ReadingSession::with_display(workspace, RecordingDisplay::default())
}

#[test]
fn folder_listing_filters_and_sorts_by_name() {
    let dir = TempDir::new().unwrap();
    write_folder(dir.path(), &["b.png", "a.jpg", "c.txt", "A.JPG", "d.webp", "e.jpeg"]);
    fs::create_dir(dir.path().join("nested.png")).unwrap();

    let sequence = FolderSource::new().scan(dir.path()).unwrap();

    assert_eq!(
        file_names(&sequence),
        vec!["A.JPG", "a.jpg", "b.png", "d.webp", "e.jpeg"]
    );
}

#[test]
fn missing_folder_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = FolderSource::new()
        .scan(&dir.path().join("absent"))
        .unwrap_err();
    assert!(err.is_io());
}

#[test]
fn pdf_images_follow_page_then_image_order() {
    let scratch = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    let pdf = docs.path().join("book.pdf");
    write_pdf_with_counts(&pdf, &[2, 1]);

    let mut session = session_in(&scratch);
    session.load_pdf(&pdf).unwrap();

    let names = file_names(session.sequence());
    assert_eq!(names.len(), 3);
    assert!(names[0].starts_with("page_0_0_"));
    assert!(names[1].starts_with("page_0_1_"));
    assert!(names[2].starts_with("page_1_0_"));
    assert!(names.iter().all(|n| n.ends_with(".png")));

    let root = session.workspace().path().unwrap();
    for image in session.sequence() {
        assert!(image.as_path().starts_with(root));
        assert!(image.as_path().is_file());
    }
    assert_eq!(session.current_index(), Some(0));
}

#[test]
fn mixed_encodings_are_written_with_matching_extensions() {
    let scratch = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    let pdf = docs.path().join("mixed.pdf");
    write_pdf(
        &pdf,
        &[vec![FixtureImage::Jpeg, FixtureImage::FlateGray, FixtureImage::RawRgb]],
    );

    let workspace = TempWorkspace::new_in(scratch.path()).unwrap();
    let sequence = PdfImageExtractor::new().extract(&pdf, &workspace).unwrap();

    let paths: Vec<&Path> = sequence.iter().map(|p| p.as_path()).collect();
    assert_eq!(paths.len(), 3);
    assert_eq!(paths[0].extension().unwrap(), "jpg");
    assert_eq!(fs::read(paths[0]).unwrap(), FIXTURE_JPEG);

    let gray = image::open(paths[1]).unwrap();
    assert_eq!((gray.width(), gray.height()), (2, 2));
    let rgb = image::open(paths[2]).unwrap().to_rgb8();
    assert_eq!(rgb.get_pixel(1, 1).0, [80, 0, 255]);
}

#[test]
fn reloading_a_pdf_replaces_the_previous_extraction() {
    let scratch = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    let first = docs.path().join("first.pdf");
    let second = docs.path().join("second.pdf");
    write_pdf_with_counts(&first, &[1, 1, 1]);
    write_pdf_with_counts(&second, &[1]);

    let mut session = session_in(&scratch);
    session.load_pdf(&first).unwrap();
    let old_root = session.workspace().path().unwrap().to_path_buf();
    let old_files: Vec<_> = session
        .sequence()
        .iter()
        .map(|p| p.as_path().to_path_buf())
        .collect();

    session.load_pdf(&second).unwrap();

    assert!(!old_root.exists());
    assert!(old_files.iter().all(|p| !p.exists()));
    assert_eq!(session.sequence_len(), 1);
    assert!(session.current_image().unwrap().as_path().is_file());
}

#[test]
fn pdf_without_images_loads_as_empty_sequence() {
    let scratch = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    let pdf = docs.path().join("text-only.pdf");
    write_pdf_with_counts(&pdf, &[0, 0]);

    let mut session = session_in(&scratch);
    session.load_pdf(&pdf).unwrap();

    assert_eq!(session.sequence_len(), 0);
    assert!(session.current_image().is_none());
    assert_eq!(session.current_index(), None);
    assert_eq!(session.display().refreshes.last(), Some(&(None, None)));
}

#[test]
fn corrupt_pdf_is_a_parse_error_with_empty_sequence() {
    let scratch = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    let pdf = docs.path().join("broken.pdf");
    fs::write(&pdf, b"this is not a pdf").unwrap();

    let mut session = session_in(&scratch);
    let err = session.load_pdf(&pdf).unwrap_err();

    assert!(matches!(err, IngestError::Parse { .. }));
    assert_eq!(err.path(), pdf.as_path());
    assert_eq!(session.sequence_len(), 0);
    assert_eq!(session.current_index(), None);
}

#[test]
fn missing_pdf_is_an_io_error() {
    let scratch = TempDir::new().unwrap();
    let mut session = session_in(&scratch);
    let err = session.load_pdf(scratch.path().join("nope.pdf")).unwrap_err();
    assert!(err.is_io());
}

#[test]
fn extraction_failure_keeps_images_written_so_far() {
    let scratch = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    let pdf = docs.path().join("partial.pdf");
    write_pdf(
        &pdf,
        &[
            vec![FixtureImage::RawRgb],
            vec![FixtureImage::Unsupported, FixtureImage::RawRgb],
        ],
    );

    let mut session = session_in(&scratch);
    let err = session.load_pdf(&pdf).unwrap_err();

    assert!(err.is_parse());
    assert_eq!(session.sequence_len(), 1);
    assert!(file_names(session.sequence())[0].starts_with("page_0_0_"));
    assert_eq!(session.current_index(), Some(0));
}

#[test]
fn cleanup_releases_extracted_files_and_is_repeatable() {
    let scratch = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    let pdf = docs.path().join("book.pdf");
    write_pdf_with_counts(&pdf, &[1, 2]);

    let mut session = session_in(&scratch);
    session.load_pdf(&pdf).unwrap();
    let root = session.workspace().path().unwrap().to_path_buf();

    session.cleanup_workspace();
    assert!(!root.exists());
    assert_eq!(session.sequence_len(), 0);
    assert!(session.workspace().path().is_none());

    session.cleanup_workspace();
    assert!(!root.exists());
}

#[test]
fn dropping_the_workspace_removes_it() {
    let scratch = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    let pdf = docs.path().join("book.pdf");
    write_pdf_with_counts(&pdf, &[1]);

    let root = {
        let mut session = session_in(&scratch);
        session.load_pdf(&pdf).unwrap();
        session.workspace().path().unwrap().to_path_buf()
    };

    assert!(!root.exists());
}

#[test]
fn folder_sequence_survives_workspace_cleanup() {
    let scratch = TempDir::new().unwrap();
    let folder = TempDir::new().unwrap();
    write_folder(folder.path(), &["1.png", "2.png"]);

    let mut session = session_in(&scratch);
    session.load_folder(folder.path()).unwrap();
    session.cleanup_workspace();

    assert_eq!(session.sequence_len(), 2);
}
