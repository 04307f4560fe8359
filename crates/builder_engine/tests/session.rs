use std::sync::Once;

use builder_core::{ParserOptions, ParserPhase};
use builder_engine::{ChatMessage, ChatSession};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(builder_logging::initialize_for_tests);
}

const REPLY: &str = r#"Creating it.<boltArtifact id="todo" title="Todo app"><boltAction type="file" filePath="app.js">render()</boltAction></boltArtifact> Done."#;

#[test]
fn rendered_text_accumulates_per_message_index() {
    init_logging();
    let mut session = ChatSession::new();
    let mut messages = vec![
        ChatMessage::user("u1", "build a todo app"),
        ChatMessage::assistant("a1", &REPLY[..20]),
    ];

    session.parse_messages(&messages);
    assert_eq!(session.rendered(1), Some("Creating it."));
    assert_eq!(session.rendered(0), None);

    messages[1].content = REPLY.to_string();
    let rendered = session.parse_messages(&messages);
    assert_eq!(rendered.get(&1).map(String::as_str), Some("Creating it. Done."));
    assert_eq!(session.workbench().files().file_content("app.js"), Some("render()"));
}

#[test]
fn reparsing_the_same_messages_adds_nothing() {
    init_logging();
    let mut session = ChatSession::new();
    let messages = vec![ChatMessage::assistant("a1", REPLY)];

    session.parse_messages(&messages);
    session.parse_messages(&messages);
    assert_eq!(session.rendered(0), Some("Creating it. Done."));
    assert_eq!(session.workbench().actions().count(), 1);
}

#[test]
fn finish_releases_a_dangling_angle_bracket() {
    init_logging();
    let mut session = ChatSession::new();
    let message = ChatMessage::assistant("a1", "I <3 Rust <");

    session.parse_messages(std::slice::from_ref(&message));
    assert_eq!(session.rendered(0), Some("I <3 Rust "));
    assert_eq!(session.finish_message(0, &message), "I <3 Rust <");
}

#[test]
fn reset_forgets_parser_state_but_keeps_files() {
    init_logging();
    let mut session = ChatSession::new();
    let messages = vec![ChatMessage::assistant("a1", REPLY)];
    session.parse_messages(&messages);

    session.reset();
    assert_eq!(session.rendered(0), None);
    assert_eq!(session.parser().phase("a1"), ParserPhase::Idle);
    assert!(session.parser().message_state("a1").is_none());
    assert_eq!(session.workbench().files().file_count(), 1);

    session.parse_messages(&messages);
    assert_eq!(session.rendered(0), Some("Creating it. Done."));
}

#[test]
fn placeholder_option_reaches_the_rendered_text() {
    init_logging();
    let mut session = ChatSession::with_options(ParserOptions {
        emit_artifact_placeholder: true,
        ..ParserOptions::default()
    });
    session.parse_messages(&[ChatMessage::assistant("a1", REPLY)]);

    let rendered = session.rendered(0).unwrap_or_default();
    assert!(rendered.contains(r#"data-message-id="a1""#));
    assert!(rendered.ends_with(" Done."));
}

#[test]
fn context_setters_are_visible_to_the_workbench() {
    let session = ChatSession::new();
    session.context().set_user_id("u");
    session.context().set_chat_id("c");

    let scope = session.workbench().context().scope().unwrap();
    assert_eq!(scope.user_id, "u");
    assert_eq!(scope.chat_id, "c");
}
