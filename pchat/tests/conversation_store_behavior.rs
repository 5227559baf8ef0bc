use std::sync::Arc;

use chrono::{Duration, Local, TimeZone};
use pchat::{
    ChatErrorKind, ConversationId, ConversationStore, ExportFormat, FileConversationRepository,
    ManualClock,
};
use pprovider::{ProviderKind, Role};

struct Fixture {
    _dir: tempfile::TempDir,
    clock: Arc<ManualClock>,
    store: ConversationStore,
    repository: Arc<FileConversationRepository>,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let start = Local
        .with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
        .single()
        .expect("valid time");
    let clock = Arc::new(ManualClock::new(start));
    let repository = Arc::new(FileConversationRepository::new(dir.path().join("conversations")));
    let store = ConversationStore::new(repository.clone(), dir.path().join("exports"))
        .with_clock(clock.clone());

    Fixture {
        _dir: dir,
        clock,
        store,
        repository,
    }
}

#[test]
fn persisted_conversation_round_trips_in_order() {
    let mut fx = fixture();
    let conversation = fx
        .store
        .start_new(ProviderKind::Anthropic, "claude-3-opus-20240229")
        .expect("started");

    fx.store.append_message(Role::User, "first").expect("append");
    fx.clock.advance(Duration::seconds(3));
    fx.store
        .append_message(Role::Assistant, "second")
        .expect("append");
    assert_eq!(fx.store.persist(None), Ok(true));

    let loaded = fx.store.load(&conversation.id).expect("loads");
    assert_eq!(loaded.provider, ProviderKind::Anthropic);
    assert_eq!(loaded.model, "claude-3-opus-20240229");
    let contents: Vec<(Role, &str)> = loaded
        .messages
        .iter()
        .map(|message| (message.role, message.content.as_str()))
        .collect();
    assert_eq!(
        contents,
        vec![(Role::User, "first"), (Role::Assistant, "second")]
    );
    assert!(loaded.messages[0].timestamp < loaded.messages[1].timestamp);
    assert!(fx.repository.record_path(&conversation.id).exists());
}

#[test]
fn starting_new_conversation_saves_the_previous_one() {
    let mut fx = fixture();
    let first = fx
        .store
        .start_new(ProviderKind::OpenAi, "gpt-4")
        .expect("started");
    fx.store.append_message(Role::User, "unsaved").expect("append");

    fx.clock.advance(Duration::minutes(1));
    let second = fx
        .store
        .start_new(ProviderKind::Mistral, "mistral-small")
        .expect("started");

    assert_ne!(first.id, second.id);
    assert_eq!(fx.store.active().map(|c| &c.id), Some(&second.id));
    let saved = fx.store.load(&first.id).expect("previous saved");
    assert_eq!(saved.messages.len(), 1);
    assert_eq!(saved.messages[0].content, "unsaved");
}

#[test]
fn list_orders_by_creation_time_descending() {
    let mut fx = fixture();
    let mut ids = Vec::new();
    for _ in 0..3 {
        let conversation = fx
            .store
            .start_new(ProviderKind::Google, "gemini-pro")
            .expect("started");
        fx.store.persist(None).expect("persisted");
        ids.push(conversation.id);
        fx.clock.advance(Duration::hours(1));
    }

    let listed: Vec<ConversationId> = fx
        .store
        .list()
        .expect("lists")
        .into_iter()
        .map(|conversation| conversation.id)
        .collect();
    assert_eq!(listed, vec![ids[2].clone(), ids[1].clone(), ids[0].clone()]);
}

#[test]
fn records_with_offsetless_timestamps_load_and_list() {
    let fx = fixture();
    let id = ConversationId::new("20240105_142233");
    std::fs::create_dir_all(fx.repository.dir()).expect("conversation dir");
    std::fs::write(
        fx.repository.record_path(&id),
        r#"{"id":"20240105_142233","provider":"openai","model":"gpt-4","timestamp":"2024-01-05T14:22:33.123456","messages":[{"role":"user","content":"hi","timestamp":"2024-01-05T14:22:40.000001"}]}"#,
    )
    .expect("record written");

    let loaded = fx.store.load(&id).expect("offset-less record loads");
    assert_eq!(loaded.provider, ProviderKind::OpenAi);
    assert_eq!(
        loaded.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        "2024-01-05 14:22:33"
    );
    assert_eq!(loaded.messages.len(), 1);
    assert!(loaded.messages[0].timestamp > loaded.created_at);

    let listed = fx.store.list().expect("lists");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
}

#[test]
fn loading_unknown_id_is_not_found() {
    let fx = fixture();
    let error = fx
        .store
        .load(&ConversationId::new("20000101_000000"))
        .expect_err("unknown id");
    assert_eq!(error.kind, ChatErrorKind::NotFound);
    assert!(error.message.contains("20000101_000000"));
}

#[test]
fn export_writes_both_formats_into_export_dir() {
    let mut fx = fixture();
    let conversation = fx
        .store
        .start_new(ProviderKind::OpenRouter, "openrouter/auto")
        .expect("started");
    fx.store
        .append_message(Role::User, "export me")
        .expect("append");

    let text_path = fx
        .store
        .export(&conversation.id, ExportFormat::PlainText)
        .expect("plain export");
    let document_path = fx
        .store
        .export(&conversation.id, ExportFormat::Document)
        .expect("document export");

    assert_eq!(text_path.parent(), Some(fx.store.exports_dir()));
    assert_eq!(
        text_path.file_name().and_then(|name| name.to_str()),
        Some("conversation_20240101_120000.txt")
    );
    assert_eq!(
        document_path.file_name().and_then(|name| name.to_str()),
        Some("conversation_20240101_120000_document.txt")
    );

    let text = std::fs::read_to_string(&text_path).expect("readable");
    assert!(text.contains("User:\nexport me"));
    let document = std::fs::read_to_string(&document_path).expect("readable");
    assert!(document.contains("Page 1 of 1"));

    let missing = fx
        .store
        .export(&ConversationId::new("19990101_000000"), ExportFormat::PlainText)
        .expect_err("unknown id");
    assert_eq!(missing.kind, ChatErrorKind::NotFound);
}
