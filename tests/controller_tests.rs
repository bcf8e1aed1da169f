mod common;

use std::time::Duration;

use tokio::time::Instant;

use common::{click, idle, move_to, type_text, Harness, InputCall};

use gridzoom::agent_engine::state::{AgentEvent, LoopConfig, SessionEnd, StepOutcome, ZoomState};
use gridzoom::errors::GridZoomError;
use gridzoom::perception::types::{Region, ScreenPoint};

fn region(x: u32, y: u32, w: u32, h: u32) -> Region {
    Region::new(x, y, w, h).unwrap()
}

#[tokio::test]
async fn move_on_full_hd_narrows_to_bottom_left_quadrant() {
    let mut s = Harness::new((1920, 1080)).start(vec![move_to(3)]).await;
    assert_eq!(s.controller.zoom_state(), ZoomState::Full);

    let outcome = s.controller.step().await.unwrap();

    assert_eq!(
        outcome,
        StepOutcome::Narrowed {
            point: ScreenPoint { x: 480.0, y: 810.0 },
            region: region(0, 540, 960, 540),
        }
    );
    assert_eq!(s.controller.current_region(), region(0, 540, 960, 540));
    assert_eq!(s.controller.zoom_state(), ZoomState::Narrowed { depth: 1 });
    assert_eq!(s.input_calls(), vec![InputCall::Move(480, 810)]);
}

#[tokio::test]
async fn pointer_target_is_scaled_to_the_display() {
    // HiDPI: capture is twice the size of the interactive screen.
    let mut s = Harness::new((200, 100)).display((100, 50)).start(vec![move_to(2)]).await;
    assert_eq!(s.controller.scale().sx, 0.5);
    assert_eq!(s.controller.scale().sy, 0.5);

    let outcome = s.controller.step().await.unwrap();

    // Cell 2 of 200x100 is (100,0,100,50), centred at (150,25).
    match outcome {
        StepOutcome::Narrowed { point, region: r } => {
            assert_eq!(point, ScreenPoint { x: 75.0, y: 12.5 });
            assert_eq!(r, region(100, 0, 100, 50));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(s.input_calls(), vec![InputCall::Move(75, 12)]);
}

#[tokio::test]
async fn moves_keep_narrowing_inside_the_previous_region() {
    let mut s = Harness::new((1920, 1080))
        .start(vec![move_to(4), move_to(1), move_to(2)])
        .await;

    let mut previous = s.controller.current_region();
    for depth in 1..=3 {
        s.controller.step().await.unwrap();
        let current = s.controller.current_region();
        assert!(previous.contains_region(&current));
        assert!(current.area() < previous.area());
        assert_eq!(s.controller.zoom_state(), ZoomState::Narrowed { depth });
        previous = current;
    }

    // 4 → (960,540,960,540), 1 → (960,540,480,270), 2 → (1200,540,240,135)
    assert_eq!(s.controller.current_region(), region(1200, 540, 240, 135));
    assert_eq!(s.input_calls().len(), 3);
}

#[tokio::test]
async fn type_commits_and_resets_to_full_screen() {
    let mut s = Harness::new((200, 100))
        .start(vec![move_to(3), type_text("Pink Floyd")])
        .await;

    s.controller.step().await.unwrap();
    assert_ne!(s.controller.current_region(), s.controller.full_region());

    let outcome = s.controller.step().await.unwrap();
    assert_eq!(outcome, StepOutcome::Reset);
    assert_eq!(s.controller.current_region(), s.controller.full_region());
    assert_eq!(s.controller.zoom_state(), ZoomState::Full);
    assert_eq!(
        s.input_calls(),
        vec![InputCall::Move(50, 75), InputCall::Type("Pink Floyd".into())]
    );
}

#[tokio::test]
async fn click_commits_and_resets_to_full_screen() {
    let mut s = Harness::new((200, 100)).start(vec![move_to(1), move_to(4), click()]).await;

    s.controller.step().await.unwrap();
    s.controller.step().await.unwrap();
    assert_eq!(s.controller.zoom_state(), ZoomState::Narrowed { depth: 2 });

    assert_eq!(s.controller.step().await.unwrap(), StepOutcome::Reset);
    assert_eq!(s.controller.zoom_state(), ZoomState::Full);
    assert_eq!(s.input_calls().last(), Some(&InputCall::Click));
}

#[tokio::test]
async fn none_leaves_region_and_pointer_alone() {
    let mut s = Harness::new((200, 100)).start(vec![move_to(2), idle()]).await;

    s.controller.step().await.unwrap();
    let narrowed = s.controller.current_region();

    assert_eq!(s.controller.step().await.unwrap(), StepOutcome::Idle);
    assert_eq!(s.controller.current_region(), narrowed);
    assert_eq!(s.input_calls().len(), 1);
}

#[tokio::test]
async fn out_of_range_cell_is_rejected_and_view_resets() {
    let mut s = Harness::new((200, 100)).start(vec![move_to(1), move_to(9)]).await;

    s.controller.step().await.unwrap();
    let outcome = s.controller.step().await.unwrap();

    assert!(matches!(outcome, StepOutcome::Rejected { .. }));
    assert_eq!(s.controller.zoom_state(), ZoomState::Full);
    // Only the first, valid move reached the input driver.
    assert_eq!(s.input_calls(), vec![InputCall::Move(50, 25)]);
}

#[tokio::test]
async fn unknown_action_is_rejected_without_input() {
    let reply = r#"{"reasoning":"hmm","action":"scroll","actionValue":3}"#.to_string();
    let mut s = Harness::new((200, 100)).start(vec![reply]).await;

    let outcome = s.controller.step().await.unwrap();
    match outcome {
        StepOutcome::Rejected { reason } => assert!(reason.contains("scroll")),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(s.input_calls().is_empty());
}

#[tokio::test]
async fn unparseable_reply_is_fatal_and_sends_no_input() {
    let mut s = Harness::new((200, 100))
        .start(vec!["I think cell 3 looks right".to_string()])
        .await;

    let err = s.controller.step().await.unwrap_err();
    assert!(matches!(err, GridZoomError::DecisionParse { .. }));
    assert!(s.input_calls().is_empty());
}

#[tokio::test]
async fn conversation_grows_by_two_turns_per_iteration() {
    let replies = vec![move_to(1), move_to(99), type_text("hello"), idle()];
    let n = replies.len();
    let mut s = Harness::new((200, 100)).start(replies).await;
    assert_eq!(s.controller.conversation().unwrap().len(), 1);

    for i in 1..=n {
        s.controller.step().await.unwrap();
        let conversation = s.controller.conversation().unwrap();
        assert_eq!(conversation.len(), 1 + 2 * i);
        assert_eq!(conversation.exchanges(), i);
    }
    assert_eq!(s.controller.iterations(), n as u32);
}

#[tokio::test]
async fn every_step_takes_a_fresh_capture() {
    let mut s = Harness::new((200, 100)).start(vec![move_to(1), idle()]).await;
    let after_start = s.captures.load(std::sync::atomic::Ordering::SeqCst);

    s.controller.step().await.unwrap();
    s.controller.step().await.unwrap();

    assert_eq!(s.captures.load(std::sync::atomic::Ordering::SeqCst), after_start + 2);
}

#[tokio::test]
async fn zoom_floor_moves_then_ends_the_session() {
    let s = Harness::new((16, 16))
        .min_cell_px(4)
        .start(vec![move_to(1), move_to(1), idle()])
        .await;
    let calls = s.calls.clone();

    let report = s.controller.run().await.unwrap();

    assert_eq!(report.end, SessionEnd::ZoomFloorReached);
    assert_eq!(report.iterations, 2);
    // The second move still happened before the session stopped.
    assert_eq!(
        calls.lock().unwrap().clone(),
        vec![InputCall::Move(4, 4), InputCall::Move(2, 2)]
    );
}

#[tokio::test]
async fn run_stops_at_the_iteration_limit() {
    let cfg = LoopConfig {
        max_iterations: Some(2),
        ..Default::default()
    };
    let s = Harness::new((200, 100))
        .loop_config(cfg)
        .start(vec![idle(), idle(), idle()])
        .await;

    let report = s.controller.run().await.unwrap();

    assert_eq!(report.end, SessionEnd::IterationLimit);
    assert_eq!(report.iterations, 2);
    assert_eq!(report.conversation_turns, 5);
}

#[tokio::test]
async fn run_stops_after_consecutive_invalid_decisions() {
    let cfg = LoopConfig {
        max_consecutive_failures: Some(2),
        ..Default::default()
    };
    let s = Harness::new((200, 100))
        .loop_config(cfg)
        .start(vec![move_to(7), move_to(8), idle()])
        .await;

    let report = s.controller.run().await.unwrap();

    assert_eq!(report.end, SessionEnd::FailureLimit);
    assert_eq!(report.iterations, 2);
}

#[tokio::test]
async fn stop_event_ends_the_session_before_the_next_iteration() {
    let (tx, rx) = tokio::sync::mpsc::channel(1);
    tx.send(AgentEvent::Stop).await.unwrap();
    let s = Harness::new((200, 100)).start_with_events(vec![idle()], Some(rx)).await;
    let calls = s.calls.clone();

    let report = s.controller.run().await.unwrap();

    assert_eq!(report.end, SessionEnd::Stopped);
    assert_eq!(report.iterations, 0);
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn provider_failure_terminates_the_run() {
    // One scripted reply, then the provider errors.
    let s = Harness::new((200, 100)).start(vec![idle()]).await;

    let err = s.controller.run().await.unwrap_err();
    assert!(matches!(err, GridZoomError::LlmProvider(_)));
}

#[tokio::test]
async fn non_string_action_is_rejected_and_the_session_continues() {
    let reply = r#"{"reasoning":"r","action":5,"actionValue":1}"#.to_string();
    let mut s = Harness::new((200, 100)).start(vec![move_to(2), reply, idle()]).await;

    s.controller.step().await.unwrap();
    let outcome = s.controller.step().await.unwrap();
    assert!(matches!(outcome, StepOutcome::Rejected { .. }), "{outcome:?}");
    assert_eq!(s.controller.zoom_state(), ZoomState::Full);

    assert_eq!(s.controller.step().await.unwrap(), StepOutcome::Idle);
    assert_eq!(s.input_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn settle_follows_only_os_affecting_actions() {
    let settle = Duration::from_millis(1000);
    let mut s = Harness::new((200, 100))
        .settle(settle)
        .start(vec![move_to(1), idle(), move_to(42), click(), type_text("Pink Floyd")])
        .await;

    let mut waited = Vec::new();
    for _ in 0..5 {
        let before = Instant::now();
        s.controller.step().await.unwrap();
        waited.push(before.elapsed());
    }

    // move, none, rejected, click, type
    assert!(waited[0] >= settle, "{waited:?}");
    assert_eq!(waited[1], Duration::ZERO);
    assert_eq!(waited[2], Duration::ZERO);
    assert!(waited[3] >= settle, "{waited:?}");
    assert!(waited[4] >= settle, "{waited:?}");
    assert_eq!(s.controller.zoom_state(), ZoomState::Full);
}

#[tokio::test]
async fn each_iteration_is_written_to_the_history_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = Harness::new((200, 100))
        .history_dir(dir.path().to_path_buf())
        .start(vec![move_to(4), click()])
        .await;

    s.controller.step().await.unwrap();
    s.controller.step().await.unwrap();

    let id = s.controller.session_id().unwrap().to_string();
    let text = std::fs::read_to_string(dir.path().join(format!("session_{id}.jsonl"))).unwrap();
    let entries: Vec<serde_json::Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["iteration"], 1);
    assert_eq!(entries[0]["outcome"]["outcome"], "narrowed");
    assert_eq!(entries[1]["action"], "click");
    assert_eq!(entries[1]["region"]["x"], 100);
}
