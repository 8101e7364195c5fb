//! Conversation orchestrator integration tests
//!
//! Runs whole turns against scripted backends, synthetic cameras and a
//! recording speaker.

use std::sync::Arc;
use std::time::Duration;

use iris_assistant::conversation::Role;
use iris_assistant::language::Language;
use iris_assistant::orchestrator::{ANALYZE_REQUEST, LOOK_PLACEHOLDER, search_followup};
use iris_assistant::prompts::{SEARCH_ASSISTANT_PROMPT, system_prompt};
use iris_assistant::{Backend, Error, status};

mod common;

use common::{
    ScriptedAdapter, ScriptedFactory, failing_rig, orchestrator, orchestrator_on,
    recording_status, synthetic_rig,
};

#[tokio::test]
async fn test_plain_turn_is_spoken_in_backend_voice() {
    let chatgpt = ScriptedAdapter::new("ChatGPT", &[Ok("Hello there!")]);
    let factory = ScriptedFactory::default().with(Backend::ChatGpt, chatgpt.clone());
    let (orchestrator, speaker) = orchestrator(factory, iris_assistant::camera::CameraRig::empty());

    let answer = orchestrator.respond("hi", status::silent()).await;

    assert_eq!(answer, "Hello there!");
    let spoken = speaker.spoken();
    assert_eq!(spoken.len(), 1);
    assert_eq!(spoken[0].voice, "nova");
    assert_eq!(spoken[0].language, Language::English);
    assert_eq!(chatgpt.calls()[0].model_hint.as_deref(), Some("gpt-4o"));
}

#[tokio::test]
async fn test_camera_directive_adds_four_messages() {
    let dir = tempfile::tempdir().unwrap();
    let chatgpt = ScriptedAdapter::new(
        "ChatGPT",
        &[
            Ok("Sure, let me take a look.\n\n{\"camera\": \"1\"}"),
            Ok("I can see a brown table."),
        ],
    );
    let factory = ScriptedFactory::default().with(Backend::ChatGpt, chatgpt.clone());
    let (orchestrator, speaker) = orchestrator(factory, synthetic_rig(1, dir.path()));
    let (status, seen) = recording_status();

    let answer = orchestrator.respond("describe the room", status).await;

    assert_eq!(answer, "I can see a brown table.");

    let history = orchestrator.history().await;
    assert_eq!(history.len(), 1 + 4);
    assert_eq!(history[1].role, Role::User);
    assert_eq!(history[1].text(), "describe the room");
    assert!(history[1].content.image().is_none());
    assert_eq!(history[2].text(), LOOK_PLACEHOLDER);
    assert_eq!(history[3].text(), ANALYZE_REQUEST);
    assert!(history[3].content.image().is_some());
    assert_eq!(history[4].text(), "I can see a brown table.");

    let calls = chatgpt.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].has_image);
    assert_eq!(calls[1].model_hint.as_deref(), Some("gpt-4o-mini"));

    assert!(dir.path().join("camera1.jpg").exists());
    assert!(
        seen.lock()
            .unwrap()
            .contains(&"Capturing image from camera 1...".to_string())
    );
    assert_eq!(speaker.spoken().len(), 1);
}

#[tokio::test]
async fn test_only_one_directive_per_turn() {
    let dir = tempfile::tempdir().unwrap();
    let second = "Here it is. {\"camera\": \"1\"}";
    let chatgpt = ScriptedAdapter::new("ChatGPT", &[Ok("{\"camera\": \"1\"}"), Ok(second)]);
    let factory = ScriptedFactory::default().with(Backend::ChatGpt, chatgpt.clone());
    let (orchestrator, _) = orchestrator(factory, synthetic_rig(1, dir.path()));

    let answer = orchestrator.respond("look around", status::silent()).await;

    assert_eq!(answer, second);
    assert_eq!(chatgpt.calls().len(), 2);
}

#[tokio::test]
async fn test_directive_for_missing_camera() {
    let dir = tempfile::tempdir().unwrap();
    let chatgpt = ScriptedAdapter::new("ChatGPT", &[Ok("Checking the rear. {\"camera\": \"2\"}")]);
    let factory = ScriptedFactory::default().with(Backend::ChatGpt, chatgpt);
    let (orchestrator, speaker) = orchestrator(factory, synthetic_rig(1, dir.path()));

    let answer = orchestrator.respond("what is behind me?", status::silent()).await;

    assert_eq!(answer, "Error: Requested camera not initialized");
    assert_eq!(orchestrator.history().await.len(), 2);
    assert!(speaker.spoken().is_empty());
}

#[tokio::test]
async fn test_directive_capture_failure() {
    let dir = tempfile::tempdir().unwrap();
    let chatgpt = ScriptedAdapter::new("ChatGPT", &[Ok("{\"camera\": \"1\"}")]);
    let factory = ScriptedFactory::default().with(Backend::ChatGpt, chatgpt);
    let (orchestrator, _) = orchestrator(factory, failing_rig(1, dir.path()));

    let answer = orchestrator.respond("look", status::silent()).await;

    assert_eq!(answer, "Error capturing image");
}

#[tokio::test]
async fn test_analyze_intent_attaches_image() {
    let dir = tempfile::tempdir().unwrap();
    let chatgpt = ScriptedAdapter::new("ChatGPT", &[Ok("That is a wall.")]);
    let factory = ScriptedFactory::default().with(Backend::ChatGpt, chatgpt.clone());
    let (orchestrator, _) = orchestrator(factory, synthetic_rig(1, dir.path()));

    let answer = orchestrator.respond("What is that?", status::silent()).await;

    assert_eq!(answer, "That is a wall.");
    let history = orchestrator.history().await;
    assert_eq!(history.len(), 3);
    assert!(history[1].content.image().is_some());

    let calls = chatgpt.calls();
    assert!(calls[0].has_image);
    assert_eq!(calls[0].model_hint.as_deref(), Some("gpt-4o-mini"));
}

#[tokio::test]
async fn test_analyze_with_absent_and_broken_camera() {
    let dir = tempfile::tempdir().unwrap();
    let chatgpt = ScriptedAdapter::new("ChatGPT", &[]);
    let factory = ScriptedFactory::default().with(Backend::ChatGpt, chatgpt.clone());
    let (absent, _) = orchestrator(factory, iris_assistant::camera::CameraRig::empty());
    assert_eq!(
        absent.respond("what is this", status::silent()).await,
        "Error: Camera not initialized"
    );

    let factory = ScriptedFactory::default().with(Backend::ChatGpt, chatgpt.clone());
    let (broken, _) = orchestrator(factory, failing_rig(2, dir.path()));
    assert_eq!(
        broken.respond("what is this", status::silent()).await,
        "Error: failed to capture image"
    );

    assert!(chatgpt.calls().is_empty());
}

#[tokio::test]
async fn test_take_photo_skips_backend() {
    let dir = tempfile::tempdir().unwrap();
    let chatgpt = ScriptedAdapter::new("ChatGPT", &[]);
    let factory = ScriptedFactory::default().with(Backend::ChatGpt, chatgpt.clone());
    let (orchestrator, speaker) = orchestrator(factory, synthetic_rig(2, dir.path()));

    let answer = orchestrator
        .respond("Take a photo from camera 2", status::silent())
        .await;

    assert!(answer.starts_with("Photo saved to: "), "{answer}");
    assert!(answer.contains("Camera2_"));
    assert_eq!(orchestrator.history().await.len(), 1);
    assert!(chatgpt.calls().is_empty());
    assert!(speaker.spoken().is_empty());
}

#[tokio::test]
async fn test_take_photo_failure() {
    let dir = tempfile::tempdir().unwrap();
    let factory =
        ScriptedFactory::default().with(Backend::ChatGpt, ScriptedAdapter::new("ChatGPT", &[]));
    let (orchestrator, _) = orchestrator(factory, failing_rig(1, dir.path()));

    assert_eq!(
        orchestrator.respond("take photo from camera 1", status::silent()).await,
        "Error taking photo"
    );
}

#[tokio::test]
async fn test_search_directive_round_trip() {
    let chatgpt = ScriptedAdapter::new(
        "ChatGPT",
        &[
            Ok("Let me look that up. {\"Online search\": \"weather in Tokyo today\"}"),
            Ok("It is sunny in Tokyo."),
        ],
    );
    let perplexity = ScriptedAdapter::new("Perplexity", &[Ok("Sunny, 25C")]);
    let factory = ScriptedFactory::default()
        .with(Backend::ChatGpt, chatgpt.clone())
        .with(Backend::Perplexity, perplexity.clone());
    let (orchestrator, speaker) = orchestrator(factory, iris_assistant::camera::CameraRig::empty());
    let (status, seen) = recording_status();

    let answer = orchestrator.respond("how is the weather in Tokyo?", status).await;

    assert_eq!(answer, "It is sunny in Tokyo.");

    let search = perplexity.calls();
    assert_eq!(search.len(), 1);
    assert_eq!(search[0].history.len(), 2);
    assert_eq!(search[0].history[0].text(), SEARCH_ASSISTANT_PROMPT);
    assert_eq!(search[0].history[1].text(), "weather in Tokyo today");

    let history = orchestrator.history().await;
    assert_eq!(history.len(), 4);
    assert_eq!(
        history[2].text(),
        search_followup("how is the weather in Tokyo?", "weather in Tokyo today", "Sunny, 25C")
    );
    assert_eq!(history[3].text(), "It is sunny in Tokyo.");

    assert!(
        seen.lock()
            .unwrap()
            .contains(&"Searching for: weather in Tokyo today".to_string())
    );
    assert_eq!(speaker.spoken().len(), 1);
}

#[tokio::test]
async fn test_search_failure_is_reported_not_spoken() {
    let chatgpt = ScriptedAdapter::new("ChatGPT", &[Ok("{\"Online search\": \"latest news\"}")]);
    let factory = ScriptedFactory::default().with(Backend::ChatGpt, chatgpt);
    let (orchestrator, speaker) = orchestrator(factory, iris_assistant::camera::CameraRig::empty());
    let (status, seen) = recording_status();

    let answer = orchestrator.respond("any news?", status).await;

    assert!(
        answer.starts_with("I encountered an error while searching"),
        "{answer}"
    );
    assert_eq!(seen.lock().unwrap().last(), Some(&answer));
    assert!(speaker.spoken().is_empty());
}

#[tokio::test]
async fn test_adapter_failure_keeps_only_user_message() {
    let chatgpt = ScriptedAdapter::new("ChatGPT", &[Err("rate limited")]);
    let factory = ScriptedFactory::default().with(Backend::ChatGpt, chatgpt);
    let (orchestrator, speaker) = orchestrator(factory, iris_assistant::camera::CameraRig::empty());
    let (status, seen) = recording_status();

    let answer = orchestrator.respond("hello", status).await;

    assert!(answer.starts_with("Error: "), "{answer}");
    assert!(answer.contains("rate limited"));
    assert_eq!(seen.lock().unwrap().last(), Some(&answer));

    let history = orchestrator.history().await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].role, Role::User);
    assert!(speaker.spoken().is_empty());
}

#[tokio::test]
async fn test_switch_to_other_backend_resets_history() {
    let factory = ScriptedFactory::default()
        .with(Backend::ChatGpt, ScriptedAdapter::new("ChatGPT", &[]))
        .with(Backend::Claude, ScriptedAdapter::new("Claude", &[Ok("Hi from Claude")]));
    let (orchestrator, speaker) = orchestrator(factory, iris_assistant::camera::CameraRig::empty());

    orchestrator.respond("first", status::silent()).await;
    assert_eq!(orchestrator.history().await.len(), 3);

    orchestrator.switch_backend(Backend::Claude).await.unwrap();

    let history = orchestrator.history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].text(), system_prompt(Backend::Claude));
    assert_eq!(orchestrator.backend().await, Backend::Claude);

    orchestrator.respond("second", status::silent()).await;
    assert_eq!(speaker.spoken().last().unwrap().voice, "alloy");
}

#[tokio::test]
async fn test_switch_to_default_backend_keeps_history() {
    let factory = ScriptedFactory::default()
        .with(Backend::ChatGpt, ScriptedAdapter::new("ChatGPT", &[]))
        .with(Backend::Gemini, ScriptedAdapter::new("Gemini", &[Ok("Hello")]));
    let (orchestrator, _) =
        orchestrator_on(Backend::Gemini, factory, iris_assistant::camera::CameraRig::empty());

    orchestrator.respond("hi", status::silent()).await;
    orchestrator.switch_backend(Backend::ChatGpt).await.unwrap();

    let history = orchestrator.history().await;
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].text(), system_prompt(Backend::ChatGpt));
    assert_eq!(history[1].text(), "hi");
}

#[tokio::test]
async fn test_failed_switch_changes_nothing() {
    let factory =
        ScriptedFactory::default().with(Backend::ChatGpt, ScriptedAdapter::new("ChatGPT", &[]));
    let (orchestrator, _) = orchestrator(factory, iris_assistant::camera::CameraRig::empty());
    orchestrator.respond("hi", status::silent()).await;

    let result = orchestrator.switch_backend(Backend::Grok).await;

    assert!(matches!(result, Err(Error::Config(_))));
    assert_eq!(orchestrator.backend().await, Backend::ChatGpt);
    let history = orchestrator.history().await;
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].text(), system_prompt(Backend::ChatGpt));
}

#[tokio::test]
async fn test_clear_history_keeps_system_prompt() {
    let factory =
        ScriptedFactory::default().with(Backend::ChatGpt, ScriptedAdapter::new("ChatGPT", &[]));
    let (orchestrator, _) = orchestrator(factory, iris_assistant::camera::CameraRig::empty());
    orchestrator.respond("hi", status::silent()).await;

    orchestrator.clear_history().await;

    let history = orchestrator.history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, Role::System);
}

#[tokio::test]
async fn test_concurrent_turns_never_interleave() {
    let chatgpt = ScriptedAdapter::with_delay(
        "ChatGPT",
        &[Ok("first answer"), Ok("second answer")],
        Duration::from_millis(50),
    );
    let factory = ScriptedFactory::default().with(Backend::ChatGpt, chatgpt.clone());
    let (orchestrator, _) = orchestrator(factory, iris_assistant::camera::CameraRig::empty());

    let (a, b) = tokio::join!(
        orchestrator.respond("question a", status::silent()),
        orchestrator.respond("question b", status::silent()),
    );

    assert_eq!(chatgpt.max_in_flight(), 1);
    assert_ne!(a, b);

    let history = orchestrator.history().await;
    assert_eq!(history.len(), 5);
    let roles: Vec<Role> = history.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
}

#[tokio::test]
async fn test_try_respond_rejects_while_busy() {
    let chatgpt = ScriptedAdapter::with_delay("ChatGPT", &[Ok("slow")], Duration::from_millis(200));
    let factory = ScriptedFactory::default().with(Backend::ChatGpt, chatgpt);
    let (orchestrator, _) = orchestrator(factory, iris_assistant::camera::CameraRig::empty());
    let orchestrator = Arc::new(orchestrator);

    let busy = Arc::clone(&orchestrator);
    let first = tokio::spawn(async move { busy.respond("slow question", status::silent()).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    let rejected = orchestrator.try_respond("impatient", status::silent()).await;
    assert!(matches!(rejected, Err(Error::TurnInProgress)));

    assert_eq!(first.await.unwrap(), "slow");
    assert_eq!(
        orchestrator.try_respond("now", status::silent()).await.unwrap(),
        "ChatGPT reply"
    );
}

#[tokio::test]
async fn test_reply_language_drives_speech() {
    let chatgpt = ScriptedAdapter::new("ChatGPT", &[Ok("こんにちは、元気です。")]);
    let factory = ScriptedFactory::default().with(Backend::ChatGpt, chatgpt);
    let (orchestrator, speaker) = orchestrator(factory, iris_assistant::camera::CameraRig::empty());

    orchestrator.respond("元気ですか", status::silent()).await;

    assert_eq!(speaker.spoken()[0].language, Language::Japanese);
}

#[tokio::test]
async fn test_stop_speech_reaches_speaker() {
    let factory =
        ScriptedFactory::default().with(Backend::ChatGpt, ScriptedAdapter::new("ChatGPT", &[]));
    let (orchestrator, speaker) = orchestrator(factory, iris_assistant::camera::CameraRig::empty());

    orchestrator.stop_speech();

    assert_eq!(speaker.stops(), 1);
}
