use lockstep::services::jobs::{Job, JobStatus};
use lockstep::services::transcribe::AlignmentResponse;
use lockstep::services::tts::Voice;

#[test]
fn alignment_response_parses_camel_case() {
    let body = r#"{
        "segments": [
            {"line": "ship", "start": 0.0, "end": 1.2},
            {"line": "sheep", "start": 1.4, "end": 2.6}
        ],
        "rawWords": [
            {"word": "ship", "start": 0.1, "end": 1.1}
        ]
    }"#;

    let parsed: AlignmentResponse = serde_json::from_str(body).unwrap();
    assert_eq!(parsed.segments.len(), 2);
    assert_eq!(parsed.segments[1].line, "sheep");
    assert_eq!(parsed.raw_words.unwrap().len(), 1);
}

#[test]
fn alignment_response_tolerates_missing_fields() {
    let parsed: AlignmentResponse = serde_json::from_str("{}").unwrap();
    assert!(parsed.segments.is_empty());
    assert!(parsed.raw_words.is_none());
}

#[test]
fn job_parses_with_and_without_optionals() {
    let full: Job = serde_json::from_str(
        r#"{"id": "j1", "status": "processing", "progress": 0.4, "error": null}"#,
    )
    .unwrap();
    assert_eq!(full.id, "j1");
    assert_eq!(full.status, JobStatus::Processing);
    assert_eq!(full.progress, Some(0.4));

    let bare: Job = serde_json::from_str(r#"{"id": "j2", "status": "failed"}"#).unwrap();
    assert_eq!(bare.status, JobStatus::Failed);
    assert!(bare.progress.is_none());
    assert!(bare.error.is_none());
}

#[test]
fn only_completed_and_failed_are_terminal() {
    assert!(!JobStatus::Pending.is_terminal());
    assert!(!JobStatus::Processing.is_terminal());
    assert!(JobStatus::Completed.is_terminal());
    assert!(JobStatus::Failed.is_terminal());
}

#[test]
fn voices_parse_case_insensitively() {
    assert_eq!("nova".parse::<Voice>().unwrap(), Voice::Nova);
    assert_eq!("Alloy".parse::<Voice>().unwrap(), Voice::Alloy);
    assert!("robot".parse::<Voice>().is_err());
    assert_eq!(Voice::default(), Voice::Nova);
}
