use chrono::NaiveDateTime;
use retell::audit::{AUDIT_HEADER, AuditLogger};
use retell::core::models::{ConversationId, LogRecord, Modality};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_initialize_creates_directory_and_header() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/logs/bot.csv");
    let logger = AuditLogger::new(&path);

    logger.initialize().unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, "chat_id,datetime,message,message_type,ai_response\n");
    assert_eq!(AUDIT_HEADER.join(","), content.trim_end());
}

#[test]
fn test_initialize_twice_keeps_single_header_and_rows() {
    let dir = TempDir::new().unwrap();
    let logger = AuditLogger::new(dir.path().join("bot.csv"));

    logger.initialize().unwrap();
    logger
        .record(ConversationId(1), "hi", Modality::Text, "hello")
        .unwrap();
    logger.initialize().unwrap();

    let content = fs::read_to_string(logger.path()).unwrap();
    assert_eq!(content.matches("chat_id,datetime").count(), 1);
    assert_eq!(content.lines().count(), 2);
}

#[test]
fn test_rows_are_quoted_csv() {
    let dir = TempDir::new().unwrap();
    let logger = AuditLogger::new(dir.path().join("bot.csv"));
    logger.initialize().unwrap();

    logger
        .append(&LogRecord {
            chat_id: -100,
            datetime: "2024-05-01 12:00:00".to_string(),
            message: "line one\nline, two".to_string(),
            message_type: "text".to_string(),
            ai_response: "said \"ok\"".to_string(),
        })
        .unwrap();

    let mut reader = csv::Reader::from_path(logger.path()).unwrap();
    let row = reader.records().next().unwrap().unwrap();
    assert_eq!(&row[0], "-100");
    assert_eq!(&row[2], "line one\nline, two");
    assert_eq!(&row[4], "said \"ok\"");
}

#[test]
fn test_record_stamps_local_time() {
    let dir = TempDir::new().unwrap();
    let logger = AuditLogger::new(dir.path().join("bot.csv"));
    logger.initialize().unwrap();

    logger
        .record(ConversationId(9), "voice note", Modality::Voice, "reply")
        .unwrap();

    let mut reader = csv::Reader::from_path(logger.path()).unwrap();
    let row = reader.records().next().unwrap().unwrap();
    assert!(NaiveDateTime::parse_from_str(&row[1], "%Y-%m-%d %H:%M:%S").is_ok());
    assert_eq!(&row[3], "voice");
}
