pub mod test_helpers {
    use crate::event_source::{
        Event, KeyCode, KeyModifiers, MouseButton, MouseEventKind, SimulatedEventSource,
    };
    use crate::navigation::ReadingDirection;
    use crate::session::{PageDisplay, PageView};
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use lopdf::{Document, Object, Stream, dictionary};
    use std::fs;
    use std::io::Write;
    use std::path::{Path, PathBuf};

    /// Builder for creating test scenarios with simulated user input
    #[derive(Default)]
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self { events: Vec::new() }
        }

        pub fn press_key(mut self, code: KeyCode) -> Self {
            self.events
                .push(SimulatedEventSource::key_event(code, KeyModifiers::empty()));
            self
        }

        pub fn press_char(self, c: char) -> Self {
            self.press_key(KeyCode::Char(c))
        }

        pub fn press_right(self, times: usize) -> Self {
            (0..times).fold(self, |builder, _| builder.press_key(KeyCode::Right))
        }

        pub fn press_left(self, times: usize) -> Self {
            (0..times).fold(self, |builder, _| builder.press_key(KeyCode::Left))
        }

        pub fn scroll_down(mut self) -> Self {
            self.events.push(SimulatedEventSource::mouse_event(
                MouseEventKind::ScrollDown,
                0,
                0,
            ));
            self
        }

        pub fn scroll_up(mut self) -> Self {
            self.events.push(SimulatedEventSource::mouse_event(
                MouseEventKind::ScrollUp,
                0,
                0,
            ));
            self
        }

        /// Left click at a terminal column
        pub fn tap(mut self, column: u16) -> Self {
            self.events.push(SimulatedEventSource::mouse_event(
                MouseEventKind::Down(MouseButton::Left),
                column,
                5,
            ));
            self
        }

        /// Toggle reading direction (press 'd')
        pub fn toggle_direction(self) -> Self {
            self.press_char('d')
        }

        /// Open the path prompt, type `path` and confirm
        pub fn open_path(self, path: &Path) -> Self {
            let typed = path
                .to_string_lossy()
                .chars()
                .fold(self.press_char('o'), |builder, c| builder.press_char(c));
            typed.press_key(KeyCode::Enter)
        }

        pub fn quit(self) -> Self {
            self.press_char('q')
        }

        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }

    /// Display that records every refresh it receives
    #[derive(Debug, Default)]
    pub struct RecordingDisplay {
        pub refreshes: Vec<(Option<PathBuf>, Option<usize>)>,
        pub directions: Vec<ReadingDirection>,
    }

    impl PageDisplay for RecordingDisplay {
        fn refresh(&mut self, view: PageView<'_>) {
            self.refreshes
                .push((view.image.map(|i| i.as_path().to_path_buf()), view.index));
        }

        fn direction_changed(&mut self, direction: ReadingDirection) {
            self.directions.push(direction);
        }
    }

    /// How a fixture image is stored inside the PDF
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum FixtureImage {
        /// Uncompressed 2x2 RGB pixels
        RawRgb,
        /// Flate-compressed 2x2 grayscale pixels
        FlateGray,
        /// Bytes passed through as a JPEG stream
        Jpeg,
        /// A filter the extractor cannot decode
        Unsupported,
    }

    pub const FIXTURE_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9];

    /// Write a PDF where page `p` carries the images listed in `pages[p]`
    pub fn write_pdf(path: &Path, pages: &[Vec<FixtureImage>]) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), b"q Q".to_vec()));

        let mut kids = Vec::new();
        for images in pages {
            let mut xobjects = lopdf::Dictionary::new();
            for (index, kind) in images.iter().enumerate() {
                let image_id = doc.add_object(fixture_stream(*kind, index));
                xobjects.set(format!("Im{index}"), image_id);
            }
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(100),
                    Object::Integer(100),
                ],
                "Resources" => dictionary! { "XObject" => xobjects },
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).expect("failed to write fixture PDF");
    }

    /// Write a PDF with `per_page[p]` raw RGB images on page `p`
    pub fn write_pdf_with_counts(path: &Path, per_page: &[usize]) {
        let pages: Vec<Vec<FixtureImage>> = per_page
            .iter()
            .map(|count| vec![FixtureImage::RawRgb; *count])
            .collect();
        write_pdf(path, &pages);
    }

    fn fixture_stream(kind: FixtureImage, index: usize) -> Stream {
        let shade = (index as u8).wrapping_mul(40);
        match kind {
            FixtureImage::RawRgb => Stream::new(
                image_dict(2, 2, "DeviceRGB"),
                [shade, 0, 255].repeat(4),
            ),
            FixtureImage::FlateGray => {
                let mut dict = image_dict(2, 2, "DeviceGray");
                dict.set("Filter", "FlateDecode");
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder
                    .write_all(&[shade, 255, 255, shade])
                    .expect("zlib write");
                Stream::new(dict, encoder.finish().expect("zlib finish"))
            }
            FixtureImage::Jpeg => {
                let mut dict = image_dict(2, 2, "DeviceRGB");
                dict.set("Filter", "DCTDecode");
                Stream::new(dict, FIXTURE_JPEG.to_vec())
            }
            FixtureImage::Unsupported => {
                let mut dict = image_dict(2, 2, "DeviceGray");
                dict.set("Filter", "JBIG2Decode");
                Stream::new(dict, vec![0; 4])
            }
        }
    }

    fn image_dict(width: i64, height: i64, color_space: &str) -> lopdf::Dictionary {
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
        }
    }

    /// Create empty files with the given names inside `dir`
    pub fn write_folder(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), b"").expect("failed to write fixture file");
        }
    }

    pub fn file_names<'a>(paths: impl IntoIterator<Item = &'a crate::ImagePath>) -> Vec<String> {
        paths
            .into_iter()
            .map(|p| p.file_name().into_owned())
            .collect()
    }
}
