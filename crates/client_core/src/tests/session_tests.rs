use super::*;
use crate::types::SelectedFileSummary;

fn pdf(name: &str) -> FileCandidate {
    FileCandidate::new(name, Some("application/pdf"), b"%PDF-1.7".to_vec())
}

fn text_file(name: &str) -> FileCandidate {
    FileCandidate::new(name, Some("text/plain"), b"do re mi".to_vec())
}

fn nocturne() -> AnalysisResult {
    AnalysisResult {
        title: Some("Nocturne".into()),
        visualization_type: Some("Abstract".into()),
        image_base64: Some("iVBOR".into()),
        narration: Some("A <strong>gentle</strong> opening".into()),
        ..AnalysisResult::default()
    }
}

#[test]
fn fresh_session_is_idle() {
    let session = UploadSession::new();
    assert_eq!(session.processing_state(), ProcessingState::Idle);
    assert_eq!(session.snapshot(), ControllerSnapshot::default());
}

#[test]
fn valid_selection_becomes_pending_auto() {
    let mut session = UploadSession::new();
    let outcome = session.select_file(pdf("score.pdf"));

    assert_eq!(outcome, SelectOutcome::Accepted(SelectionId(1)));
    assert_eq!(session.processing_state(), ProcessingState::PendingAuto);
    assert_eq!(session.pending_auto_submit(), Some(SelectionId(1)));
    assert_eq!(
        session.snapshot().selected_file,
        Some(SelectedFileSummary {
            id: SelectionId(1),
            name: "score.pdf".into(),
            size_bytes: 8,
        })
    );
}

#[test]
fn rejected_selection_sets_message_and_clears_file() {
    let mut session = UploadSession::new();
    session.select_file(pdf("score.pdf"));

    let outcome = session.select_file(text_file("notes.txt"));

    assert_eq!(outcome, SelectOutcome::Rejected);
    assert!(session.selected_file().is_none());
    assert_eq!(session.error_message(), Some(REJECTION_MESSAGE));
    assert!(!session.is_loading());
    assert_eq!(session.processing_state(), ProcessingState::Error);
}

#[test]
fn rejected_selection_keeps_displayed_result() {
    let mut session = UploadSession::new();
    session.select_file(pdf("score.pdf"));
    session.begin_submit(SubmitMode::Initial).expect("request");
    session.settle(SubmitMode::Initial, Ok(nocturne()));

    session.select_file(text_file("notes.txt"));

    assert_eq!(session.result(), Some(&nocturne()));
    assert_eq!(session.processing_state(), ProcessingState::HasResult);
    assert_eq!(session.error_message(), Some(REJECTION_MESSAGE));
}

#[test]
fn auto_submit_is_due_once_per_selection() {
    let mut session = UploadSession::new();
    session.select_file(pdf("score.pdf"));
    let id = session.pending_auto_submit().expect("due");
    session.mark_auto_submitted(id);
    assert_eq!(session.pending_auto_submit(), None);

    // Re-picking the same file is a new selection.
    session.select_file(pdf("score.pdf"));
    assert_eq!(session.pending_auto_submit(), Some(SelectionId(2)));
}

#[test]
fn initial_submit_without_file_is_a_no_op() {
    let mut session = UploadSession::new();
    assert_eq!(session.begin_submit(SubmitMode::Initial), None);
    assert!(!session.is_loading());
    assert_eq!(session.processing_state(), ProcessingState::Idle);
}

#[test]
fn begin_submit_clears_error_and_enters_loading() {
    let mut session = UploadSession::new();
    session.select_file(text_file("notes.txt"));
    session.select_file(pdf("score.pdf"));
    session.settle(
        SubmitMode::Regenerate,
        Err(ClientError::Transport("offline".into())),
    );
    assert!(session.error_message().is_some());

    let request = session.begin_submit(SubmitMode::Initial).expect("request");

    assert!(matches!(request, SubmitRequest::Initial(ref file) if file.name == "score.pdf"));
    assert!(session.is_loading());
    assert_eq!(session.in_flight(), Some(SubmitMode::Initial));
    assert_eq!(session.error_message(), None);
    assert_eq!(session.processing_state(), ProcessingState::Loading);
}

#[test]
fn second_submit_while_loading_is_refused() {
    let mut session = UploadSession::new();
    session.select_file(pdf("score.pdf"));
    session.begin_submit(SubmitMode::Initial).expect("request");

    assert_eq!(session.begin_submit(SubmitMode::Regenerate), None);
    assert_eq!(session.in_flight(), Some(SubmitMode::Initial));
}

#[test]
fn failed_initial_clears_file_and_leaves_no_result() {
    let mut session = UploadSession::new();
    session.select_file(pdf("score.pdf"));
    session.begin_submit(SubmitMode::Initial).expect("request");

    session.settle(
        SubmitMode::Initial,
        Err(ClientError::Application("Failed to extract structured musical features.".into())),
    );

    assert!(session.selected_file().is_none());
    assert!(session.result().is_none());
    assert!(!session.is_loading());
    assert_eq!(
        session.error_message(),
        Some("Processing failed: Failed to extract structured musical features.")
    );
    assert_eq!(session.processing_state(), ProcessingState::Error);
}

#[test]
fn failed_regenerate_keeps_result_as_overlay() {
    let mut session = UploadSession::new();
    session.select_file(pdf("score.pdf"));
    session.begin_submit(SubmitMode::Initial).expect("request");
    session.settle(SubmitMode::Initial, Ok(nocturne()));

    session.begin_submit(SubmitMode::Regenerate).expect("request");
    session.settle(
        SubmitMode::Regenerate,
        Err(ClientError::Status {
            status: 500,
            message: None,
        }),
    );

    assert_eq!(session.result(), Some(&nocturne()));
    assert!(session.selected_file().is_some());
    assert_eq!(
        session.error_message(),
        Some("Processing failed: Server error during regeneration.")
    );
    assert_eq!(session.processing_state(), ProcessingState::HasResult);
}

#[test]
fn new_valid_selection_clears_previous_result() {
    let mut session = UploadSession::new();
    session.select_file(pdf("score.pdf"));
    session.begin_submit(SubmitMode::Initial).expect("request");
    session.settle(SubmitMode::Initial, Ok(nocturne()));

    session.select_file(pdf("etude.pdf"));

    assert!(session.result().is_none());
    assert_eq!(session.processing_state(), ProcessingState::PendingAuto);
}
