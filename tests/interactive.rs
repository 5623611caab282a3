//! Interactive session driven by scripted dialogs.

mod common;

use calamine::{open_workbook, Data, Reader, Xlsx};
use common::{table, write_fake_pdf, FakeExtractor, Script};
use pdf2sheet::{
    Dialogs, ExtractionMode, InteractiveSession, OutputFormat, Pdf2SheetError, SessionState,
};
use std::cell::RefCell;
use std::path::PathBuf;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Shown {
    Info(String, String),
    Warning(String, String),
    Error(String, String),
}

#[derive(Default)]
struct RecordingDialogs {
    pick: RefCell<Option<PathBuf>>,
    shown: RefCell<Vec<Shown>>,
}

impl RecordingDialogs {
    fn picking(path: PathBuf) -> Self {
        Self {
            pick: RefCell::new(Some(path)),
            ..Self::default()
        }
    }

    fn shown(&self) -> Vec<Shown> {
        self.shown.borrow().clone()
    }
}

impl Dialogs for RecordingDialogs {
    fn pick_pdf(&self) -> Option<PathBuf> {
        self.pick.borrow_mut().take()
    }

    fn info(&self, title: &str, message: &str) {
        self.shown
            .borrow_mut()
            .push(Shown::Info(title.into(), message.into()));
    }

    fn warning(&self, title: &str, message: &str) {
        self.shown
            .borrow_mut()
            .push(Shown::Warning(title.into(), message.into()));
    }

    fn error(&self, title: &str, message: &str) {
        self.shown
            .borrow_mut()
            .push(Shown::Error(title.into(), message.into()));
    }
}

#[tokio::test]
async fn convert_without_a_file_warns_and_does_nothing() {
    let fake = FakeExtractor::new().into_arc();
    let mut session = InteractiveSession::with_extractor(fake.clone());
    let dialogs = RecordingDialogs::default();

    let err = session.convert(&dialogs).await.unwrap_err();

    assert!(matches!(err, Pdf2SheetError::NoFileSelected));
    assert!(fake.calls().is_empty());
    assert_eq!(
        dialogs.shown(),
        vec![Shown::Warning(
            "No file".into(),
            "Please select a PDF file first.".into()
        )]
    );
    assert_eq!(session.state(), &SessionState::NoFile);
}

#[tokio::test]
async fn converts_first_table_per_page_next_to_source() {
    let dir = TempDir::new().unwrap();
    let pdf = write_fake_pdf(dir.path(), "invoice.pdf");
    let fake = FakeExtractor::new()
        .with(
            "invoice.pdf",
            Script::Tables(vec![
                table(1, &["Sku", "Price"], &[&["A-1", "9.50"], &["B-2", "3"]]),
                table(2, &["Sku", "Price"], &[&["C-3", "1.25"]]),
            ]),
        )
        .into_arc();
    let mut session = InteractiveSession::with_extractor(fake.clone());
    session.set_format(OutputFormat::Csv);
    let dialogs = RecordingDialogs::picking(pdf.clone());

    assert_eq!(session.choose_file(&dialogs), Some(pdf.as_path()));
    let conversion = session.convert(&dialogs).await.unwrap();

    let expected = dir.path().join("invoice.csv");
    assert_eq!(conversion.output_path, expected);
    assert_eq!(conversion.rows, 3);
    assert_eq!(
        std::fs::read_to_string(&expected).unwrap(),
        "Sku,Price\nA-1,9.50\nB-2,3\nC-3,1.25\n"
    );
    assert_eq!(fake.calls(), vec![(pdf.clone(), ExtractionMode::FirstTablePerPage)]);
    assert_eq!(
        session.state(),
        &SessionState::Converted {
            source: pdf,
            output: expected.clone()
        }
    );

    let shown = dialogs.shown();
    assert_eq!(shown.len(), 1);
    match &shown[0] {
        Shown::Info(title, message) => {
            assert_eq!(title, "Success");
            assert!(message.contains(&expected.display().to_string()));
        }
        other => panic!("unexpected dialog: {other:?}"),
    }
}

#[tokio::test]
async fn default_format_is_xlsx() {
    let dir = TempDir::new().unwrap();
    let pdf = write_fake_pdf(dir.path(), "sheet.pdf");
    let fake = FakeExtractor::new()
        .with(
            "sheet.pdf",
            Script::Tables(vec![table(1, &["K", "V"], &[&["a", "1"]])]),
        )
        .into_arc();
    let mut session = InteractiveSession::with_extractor(fake);
    assert_eq!(session.format(), OutputFormat::Xlsx);

    session.select_file(&pdf);
    let conversion = session.convert(&RecordingDialogs::default()).await.unwrap();

    assert_eq!(conversion.output_path, dir.path().join("sheet.xlsx"));
    let mut workbook: Xlsx<_> = open_workbook(&conversion.output_path).unwrap();
    let range = workbook.worksheet_range("Sheet1").unwrap();
    assert_eq!(range.get_size(), (2, 2));
    assert_eq!(range.get_value((0, 0)), Some(&Data::String("K".into())));
    assert_eq!(range.get_value((1, 0)), Some(&Data::String("a".into())));
    assert_eq!(range.get_value((1, 1)), Some(&Data::Float(1.0)));
}

#[tokio::test]
async fn no_tables_shows_a_warning_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let pdf = write_fake_pdf(dir.path(), "letter.pdf");
    let fake = FakeExtractor::new().into_arc();
    let mut session = InteractiveSession::with_extractor(fake);
    session.select_file(&pdf);
    let dialogs = RecordingDialogs::default();

    let err = session.convert(&dialogs).await.unwrap_err();

    assert!(matches!(err, Pdf2SheetError::NoTablesFound { .. }));
    assert!(matches!(dialogs.shown().as_slice(), [Shown::Warning(..)]));
    assert!(!dir.path().join("letter.xlsx").exists());
    assert_eq!(session.state(), &SessionState::FileSelected(pdf));
}

#[tokio::test]
async fn extraction_failure_shows_an_error_dialog() {
    let dir = TempDir::new().unwrap();
    let pdf = write_fake_pdf(dir.path(), "broken.pdf");
    let fake = FakeExtractor::new()
        .with("broken.pdf", Script::Corrupt("no trailer".into()))
        .into_arc();
    let mut session = InteractiveSession::with_extractor(fake);
    session.select_file(&pdf);
    let dialogs = RecordingDialogs::default();

    let err = session.convert(&dialogs).await.unwrap_err();

    assert!(matches!(err, Pdf2SheetError::CorruptPdf { .. }));
    match dialogs.shown().as_slice() {
        [Shown::Error(title, message)] => {
            assert_eq!(title, "Error");
            assert!(message.contains("no trailer"), "got: {message}");
        }
        other => panic!("unexpected dialogs: {other:?}"),
    }
}

#[tokio::test]
async fn mismatched_pages_are_reported_before_success() {
    let dir = TempDir::new().unwrap();
    let pdf = write_fake_pdf(dir.path(), "mixed.pdf");
    let fake = FakeExtractor::new()
        .with(
            "mixed.pdf",
            Script::Tables(vec![
                table(1, &["A", "B"], &[&["1", "2"]]),
                table(2, &["A", "C"], &[&["3", "4"]]),
            ]),
        )
        .into_arc();
    let mut session = InteractiveSession::with_extractor(fake);
    session.set_format(OutputFormat::Csv);
    session.select_file(&pdf);
    let dialogs = RecordingDialogs::default();

    let conversion = session.convert(&dialogs).await.unwrap();
    assert_eq!(conversion.mismatched_tables, vec![1]);

    let shown = dialogs.shown();
    assert_eq!(shown.len(), 2);
    assert!(matches!(&shown[0], Shown::Info(title, _) if title == "Columns aligned"));
    assert!(matches!(&shown[1], Shown::Info(title, _) if title == "Success"));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("mixed.csv")).unwrap(),
        "A,B,C\n1,2,\n3,,4\n"
    );
}

#[tokio::test]
async fn cancelled_pick_keeps_previous_selection() {
    let dir = TempDir::new().unwrap();
    let pdf = write_fake_pdf(dir.path(), "keep.pdf");
    let mut session = InteractiveSession::with_extractor(FakeExtractor::new().into_arc());
    session.select_file(&pdf);

    let dialogs = RecordingDialogs::default();
    assert_eq!(session.choose_file(&dialogs), Some(pdf.as_path()));
    assert_eq!(session.state(), &SessionState::FileSelected(pdf));
}

#[tokio::test]
async fn refuses_to_write_over_the_source_file() {
    let dir = TempDir::new().unwrap();
    let source = write_fake_pdf(dir.path(), "data.csv");
    let fake = FakeExtractor::new()
        .with(
            "data.csv",
            Script::Tables(vec![table(1, &["K", "V"], &[&["a", "1"]])]),
        )
        .into_arc();
    let mut session = InteractiveSession::with_extractor(fake.clone());
    session.set_format(OutputFormat::Csv);
    session.select_file(&source);
    let dialogs = RecordingDialogs::default();

    let err = session.convert(&dialogs).await.unwrap_err();

    assert!(matches!(err, Pdf2SheetError::OutputIsSource { .. }), "got: {err}");
    assert!(fake.calls().is_empty());
    assert_eq!(
        std::fs::read(&source).unwrap(),
        b"%PDF-1.7\n%fake\n".to_vec(),
        "source must be untouched"
    );
    assert!(matches!(dialogs.shown().as_slice(), [Shown::Error(..)]));
}

#[tokio::test]
async fn source_extension_match_ignores_case() {
    let dir = TempDir::new().unwrap();
    let source = write_fake_pdf(dir.path(), "Book.XLSX");
    let mut session = InteractiveSession::with_extractor(FakeExtractor::new().into_arc());
    session.select_file(&source);

    let err = session
        .convert(&RecordingDialogs::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Pdf2SheetError::OutputIsSource { .. }));
    assert!(std::fs::read(&source).unwrap().starts_with(b"%PDF"));
}
