mod common;

use std::time::Duration;

use common::{doc_in, python_doc, success, Harness, RecordingEditor, ScriptedRunner, ONE_STEP};
use stepviz_core::{CoreError, DecorationKind, HostMessage, PanelMessage, RunResult};
use stepviz_host::config::VisualizerConfig;
use stepviz_host::error::HostError;
use stepviz_host::event::HostEvent;
use stepviz_host::host::Host;
use stepviz_host::panel::{ChannelPanel, PanelEvent, PANEL_TITLE, PANEL_VIEW_TYPE};
use stepviz_host::session::SessionState;
use tokio::time::Instant;

fn update(message: &HostMessage) -> &stepviz_core::UpdateTrace {
    match message {
        HostMessage::UpdateTrace(update) => update,
        other => panic!("expected updateTrace, got {:?}", other),
    }
}

#[tokio::test]
async fn start_opens_panel_and_runs_immediately() {
    let mut h = Harness::new(ScriptedRunner::new(vec![success(ONE_STEP)]));
    let doc = python_doc("a.py", "n = input()\nprint(n)\n");

    h.session.handle(HostEvent::Start(Some(doc.clone()))).unwrap();
    assert_eq!(h.session.state(), SessionState::Loading);
    assert_eq!(
        h.drain_panel(),
        vec![
            PanelEvent::Open {
                view_type: PANEL_VIEW_TYPE.to_string(),
                title: PANEL_TITLE.to_string(),
            },
            PanelEvent::Post {
                message: HostMessage::ShowLoading
            },
        ]
    );

    h.pump().await;
    assert_eq!(h.session.state(), SessionState::Ready);

    let requests = h.runner.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].stdin_text, "");
    assert_eq!(requests[0].seed, 42);
    assert_eq!(requests[0].source_path, doc.path);

    let messages = h.drain_messages();
    assert_eq!(messages.len(), 1);
    let update = update(&messages[0]);
    assert_eq!(update.source_code, doc.text);
    assert_eq!(update.trace_data, ONE_STEP);
    assert_eq!(update.error_data, None);
    assert!(update.show_input_box);
    assert!(!update.has_randomness);

    let session = h.session.session().unwrap();
    assert_eq!(session.step_index, 0);
    assert_eq!(session.in_flight, None);
}

#[tokio::test]
async fn loading_is_posted_before_the_run_is_dispatched() {
    let mut h = Harness::new(ScriptedRunner::new(vec![]));
    h.session
        .handle(HostEvent::Start(Some(python_doc("a.py", "x = 1"))))
        .unwrap();

    // The run task has not been polled yet on this single-threaded runtime.
    assert!(h.runner.requests().is_empty());
    assert_eq!(h.drain_messages(), vec![HostMessage::ShowLoading]);
}

#[tokio::test]
async fn start_rejects_other_languages() {
    let mut h = Harness::new(ScriptedRunner::new(vec![]));
    let err = h
        .session
        .handle(HostEvent::Start(Some(doc_in("json", "a.json"))))
        .unwrap_err();

    assert!(matches!(
        err,
        HostError::Core(CoreError::UnsupportedLanguage { .. })
    ));
    assert!(err.is_user_facing());
    assert_eq!(h.session.state(), SessionState::Closed);
    assert!(h.drain_panel().is_empty());
}

#[tokio::test]
async fn start_without_editor_is_rejected() {
    let mut h = Harness::new(ScriptedRunner::new(vec![]));
    let err = h.session.handle(HostEvent::Start(None)).unwrap_err();
    assert!(matches!(err, HostError::NoActiveEditor));
    assert!(!h.session.is_panel_open());
}

#[tokio::test]
async fn second_start_only_reveals_the_panel() {
    let mut h = Harness::new(ScriptedRunner::new(vec![]));
    h.session
        .handle(HostEvent::Start(Some(python_doc("a.py", "x = 1"))))
        .unwrap();
    h.pump().await;
    h.session
        .handle(HostEvent::Panel(PanelMessage::Rerun {
            text: "5".to_string(),
            seed: Some(9),
        }))
        .unwrap();
    h.pump().await;
    h.drain_panel();
    let before = h.session.session().cloned().unwrap();

    h.session
        .handle(HostEvent::Start(Some(python_doc("b.py", "y = 2"))))
        .unwrap();

    assert_eq!(h.drain_panel(), vec![PanelEvent::Reveal]);
    let after = h.session.session().unwrap();
    assert_eq!(after.id, before.id);
    assert_eq!(after.document, before.document);
    assert_eq!(after.input_text, "5");
    assert_eq!(after.seed, 9);
    assert_eq!(after.step_index, before.step_index);
    assert_eq!(h.runner.requests().len(), 2);
}

#[tokio::test]
async fn syntax_error_only_clears_loading() {
    let mut h = Harness::new(ScriptedRunner::new(vec![
        success(ONE_STEP),
        RunResult::SyntaxError,
    ]));
    h.session
        .handle(HostEvent::Start(Some(python_doc("a.py", "x = 1"))))
        .unwrap();
    h.pump().await;
    h.drain_panel();

    h.session
        .handle(HostEvent::Panel(PanelMessage::Rerun {
            text: String::new(),
            seed: None,
        }))
        .unwrap();
    h.pump().await;

    assert_eq!(
        h.drain_messages(),
        vec![HostMessage::ShowLoading, HostMessage::HideLoading]
    );
    let session = h.session.session().unwrap();
    assert_eq!(session.state, SessionState::Ready);
    assert_eq!(session.step_index, 0, "previous trace stays selected");
}

#[tokio::test]
async fn failures_are_reported_with_a_banner() {
    let mut h = Harness::new(ScriptedRunner::new(vec![
        RunResult::RuntimeError {
            partial: stepviz_core::Trace::from_raw(ONE_STEP),
            message: "ZeroDivisionError: division by zero".to_string(),
        },
        RunResult::Timeout { limit_ms: 10_000 },
        RunResult::unexpected_exit(7, "weird"),
    ]));
    h.session
        .handle(HostEvent::Start(Some(python_doc("a.py", "1 / 0"))))
        .unwrap();
    h.pump().await;

    let messages = h.drain_messages();
    let runtime = update(&messages[1]);
    assert_eq!(runtime.trace_data, ONE_STEP);
    assert_eq!(
        runtime.error_data.as_deref(),
        Some("ZeroDivisionError: division by zero")
    );
    assert_eq!(h.session.session().unwrap().step_index, 0);

    for _ in 0..2 {
        h.session
            .handle(HostEvent::Panel(PanelMessage::Rerun {
                text: String::new(),
                seed: None,
            }))
            .unwrap();
        h.pump().await;
    }
    let messages = h.drain_messages();
    let timeout = update(&messages[1]);
    assert_eq!(timeout.trace_data, "[]");
    assert!(timeout.error_data.as_deref().unwrap().contains("timed out"));

    let unexpected = update(&messages[3]);
    assert_eq!(unexpected.trace_data, "[]");
    assert_eq!(
        unexpected.error_data.as_deref(),
        Some("Tracer exited with unexpected code 7: weird")
    );
    assert_eq!(h.session.session().unwrap().step_index, -1);
}

#[tokio::test]
async fn rerun_updates_input_and_keeps_seed_when_absent() {
    let mut h = Harness::new(ScriptedRunner::new(vec![]));
    h.session
        .handle(HostEvent::Start(Some(python_doc("a.py", "n = input()"))))
        .unwrap();
    h.pump().await;

    h.session
        .handle(HostEvent::Panel(PanelMessage::Rerun {
            text: "3\n4".to_string(),
            seed: Some(1234),
        }))
        .unwrap();
    h.pump().await;
    h.session
        .handle(HostEvent::Panel(PanelMessage::Rerun {
            text: "5".to_string(),
            seed: None,
        }))
        .unwrap();
    h.pump().await;

    let requests = h.runner.requests();
    assert_eq!(requests[1].stdin_text, "3\n4");
    assert_eq!(requests[1].seed, 1234);
    assert_eq!(requests[2].stdin_text, "5");
    assert_eq!(requests[2].seed, 1234);

    let messages = h.drain_messages();
    let last = update(messages.last().unwrap());
    assert_eq!(last.current_inputs, "5");
    assert_eq!(last.current_seed, 1234);
}

#[tokio::test]
async fn switching_editors_rebinds_and_resets_the_seed() {
    let mut h = Harness::new(ScriptedRunner::new(vec![]));
    h.session
        .handle(HostEvent::Start(Some(python_doc("a.py", "x = 1"))))
        .unwrap();
    h.pump().await;
    h.session
        .handle(HostEvent::Panel(PanelMessage::Rerun {
            text: "abc".to_string(),
            seed: Some(7),
        }))
        .unwrap();
    h.pump().await;

    let other = python_doc("b.py", "y = 2");
    h.session
        .handle(HostEvent::ActiveEditorChanged(Some(other.clone())))
        .unwrap();
    h.pump().await;

    let requests = h.runner.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[2].source_path, other.path);
    assert_eq!(requests[2].source_code, "y = 2");
    assert_eq!(requests[2].seed, 42);
    assert_eq!(requests[2].stdin_text, "abc");
    assert_eq!(h.session.session().unwrap().document.id, other.id);
}

#[tokio::test(start_paused = true)]
async fn irrelevant_editor_changes_do_not_run() {
    let mut h = Harness::new(ScriptedRunner::new(vec![]));
    let doc = python_doc("a.py", "x = 1");
    h.session.handle(HostEvent::Start(Some(doc.clone()))).unwrap();
    h.pump().await;
    h.drain_panel();

    for active in [None, Some(doc_in("json", "b.json")), Some(doc)] {
        h.session
            .handle(HostEvent::ActiveEditorChanged(active))
            .unwrap();
    }
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(h.runner.requests().len(), 1);
    assert!(h.events.try_recv().is_err());
    assert!(h.drain_panel().is_empty());
}

#[tokio::test]
async fn editor_changes_without_a_panel_are_ignored() {
    let mut h = Harness::new(ScriptedRunner::new(vec![]));
    h.session
        .handle(HostEvent::ActiveEditorChanged(Some(python_doc("a.py", "x"))))
        .unwrap();
    assert_eq!(h.session.state(), SessionState::Closed);
    assert!(h.drain_panel().is_empty());
}

#[tokio::test(start_paused = true)]
async fn burst_of_edits_runs_once_after_quiet_period() {
    let mut h = Harness::new(ScriptedRunner::new(vec![]));
    h.session
        .handle(HostEvent::Start(Some(python_doc("a.py", "x = 0"))))
        .unwrap();
    h.pump().await;
    h.drain_panel();

    for i in 1..=4 {
        h.session
            .handle(HostEvent::DocumentChanged(python_doc(
                "a.py",
                &format!("x = {}", i),
            )))
            .unwrap();
        tokio::time::advance(Duration::from_millis(200)).await;
    }
    let last_edit = Instant::now() - Duration::from_millis(200);
    assert_eq!(h.runner.requests().len(), 1);
    assert!(h.events.try_recv().is_err());

    let settled = h.pump().await;
    assert!(matches!(settled, HostEvent::EditsSettled(_)));
    assert_eq!(last_edit.elapsed(), Duration::from_millis(750));

    h.pump().await;
    let requests = h.runner.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].source_code, "x = 4");
    assert_eq!(h.session.session().unwrap().document.text, "x = 4");

    let messages = h.drain_messages();
    assert_eq!(messages[0], HostMessage::ShowLoading);
    assert_eq!(update(&messages[1]).source_code, "x = 4");
}

#[tokio::test(start_paused = true)]
async fn edits_to_other_documents_are_ignored() {
    let mut h = Harness::new(ScriptedRunner::new(vec![]));
    h.session
        .handle(HostEvent::Start(Some(python_doc("a.py", "x = 0"))))
        .unwrap();
    h.pump().await;

    h.session
        .handle(HostEvent::DocumentChanged(python_doc("b.py", "y = 1")))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(h.events.try_recv().is_err());
    assert_eq!(h.runner.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn result_after_close_is_dropped() {
    let runner = ScriptedRunner::with_delay(vec![success(ONE_STEP)], Duration::from_secs(2));
    let mut h = Harness::new(runner);
    h.session
        .handle(HostEvent::Start(Some(python_doc("a.py", "x = 1"))))
        .unwrap();
    h.drain_panel();

    h.session.handle(HostEvent::PanelDisposed).unwrap();
    let late = h.pump().await;

    assert!(matches!(late, HostEvent::RunFinished(_)));
    assert!(h.drain_panel().is_empty());
    assert_eq!(h.session.state(), SessionState::Closed);
}

#[tokio::test(start_paused = true)]
async fn result_from_a_previous_panel_is_not_shown_in_a_new_one() {
    let runner = ScriptedRunner::with_delay(
        vec![success(ONE_STEP), success("[]")],
        Duration::from_secs(2),
    );
    let mut h = Harness::new(runner);
    h.session
        .handle(HostEvent::Start(Some(python_doc("a.py", "old"))))
        .unwrap();
    h.session.handle(HostEvent::PanelDisposed).unwrap();
    tokio::time::advance(Duration::from_millis(500)).await;
    h.session
        .handle(HostEvent::Start(Some(python_doc("a.py", "new"))))
        .unwrap();
    h.drain_panel();

    // The first run finishes first and belongs to the closed panel.
    h.pump().await;
    assert!(h.drain_panel().is_empty());
    assert_eq!(h.session.state(), SessionState::Loading);

    h.pump().await;
    let messages = h.drain_messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(update(&messages[0]).source_code, "new");
    assert_eq!(h.session.state(), SessionState::Ready);
}

#[tokio::test(start_paused = true)]
async fn superseded_run_finishing_last_is_dropped() {
    let runner = ScriptedRunner::timed(vec![
        (RunResult::Timeout { limit_ms: 10_000 }, Duration::from_secs(10)),
        (success(ONE_STEP), Duration::from_millis(100)),
    ]);
    let mut h = Harness::new(runner);
    h.session
        .handle(HostEvent::Start(Some(python_doc("a.py", "x = 1"))))
        .unwrap();
    h.session
        .handle(HostEvent::Panel(PanelMessage::Rerun {
            text: String::new(),
            seed: None,
        }))
        .unwrap();

    // The rerun finishes first and is shown.
    h.pump().await;
    let messages = h.drain_messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(update(&messages[2]).trace_data, ONE_STEP);
    assert_eq!(update(&messages[2]).error_data, None);

    // The first run times out afterwards and must not replace it.
    let late = h.pump().await;
    assert!(matches!(late, HostEvent::RunFinished(_)));
    assert!(h.drain_panel().is_empty());

    let session = h.session.session().unwrap();
    assert_eq!(session.state, SessionState::Ready);
    assert_eq!(session.step_index, 0);
    assert_eq!(session.in_flight, None);
}

#[tokio::test(start_paused = true)]
async fn closing_cancels_a_pending_edit() {
    let mut h = Harness::new(ScriptedRunner::new(vec![]));
    h.session
        .handle(HostEvent::Start(Some(python_doc("a.py", "x = 0"))))
        .unwrap();
    h.pump().await;

    h.session
        .handle(HostEvent::DocumentChanged(python_doc("a.py", "x = 1")))
        .unwrap();
    h.session.handle(HostEvent::PanelDisposed).unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(h.events.try_recv().is_err());
    assert_eq!(h.runner.requests().len(), 1);
}

#[tokio::test]
async fn sync_and_toggle_drive_decorations() {
    let mut h = Harness::new(ScriptedRunner::new(vec![]));
    h.session
        .handle(HostEvent::Start(Some(python_doc("a.py", "a\nb\nc\nd\ne"))))
        .unwrap();
    h.pump().await;

    h.session
        .handle(HostEvent::Panel(PanelMessage::SyncLine {
            line: 5,
            prev_line: Some(4),
        }))
        .unwrap();
    assert_eq!(h.session.session().unwrap().current_line, Some(5));
    let arrows = h.editor().rows.clone();
    assert_eq!(arrows.get(&DecorationKind::NextToExecute), Some(&5));
    assert_eq!(arrows.get(&DecorationKind::JustExecuted), Some(&4));
    assert_eq!(h.editor().revealed, vec![5]);

    h.session
        .handle(HostEvent::Panel(PanelMessage::ToggleArrows { enabled: false }))
        .unwrap();
    assert!(!h.session.arrows_enabled());
    assert_eq!(h.editor().rows.len(), 1);
    assert_eq!(h.editor().rows.get(&DecorationKind::Neutral), Some(&5));

    h.session
        .handle(HostEvent::Panel(PanelMessage::ToggleArrows { enabled: true }))
        .unwrap();
    assert_eq!(h.editor().rows, arrows);
    assert_eq!(h.editor().revealed, vec![5]);

    // A new result starts the panel over at step 0.
    h.session
        .handle(HostEvent::Panel(PanelMessage::Rerun {
            text: String::new(),
            seed: None,
        }))
        .unwrap();
    h.pump().await;
    let session = h.session.session().unwrap();
    assert_eq!(session.current_line, None);
    assert_eq!(session.step_index, 0);
}

#[tokio::test]
async fn closing_clears_decorations_and_restores_arrows() {
    let mut h = Harness::new(ScriptedRunner::new(vec![]));
    h.session
        .handle(HostEvent::Start(Some(python_doc("a.py", "a\nb"))))
        .unwrap();
    h.pump().await;
    h.session
        .handle(HostEvent::Panel(PanelMessage::SyncLine {
            line: 2,
            prev_line: Some(1),
        }))
        .unwrap();
    h.session
        .handle(HostEvent::Panel(PanelMessage::ToggleArrows { enabled: false }))
        .unwrap();

    h.session.handle(HostEvent::PanelDisposed).unwrap();

    assert!(h.editor().rows.is_empty());
    assert!(h.session.arrows_enabled());
    assert_eq!(h.session.state(), SessionState::Closed);
}

#[tokio::test]
async fn panel_messages_without_a_panel_do_nothing() {
    let mut h = Harness::new(ScriptedRunner::new(vec![]));
    h.session
        .handle(HostEvent::Panel(PanelMessage::SyncLine {
            line: 3,
            prev_line: None,
        }))
        .unwrap();
    h.session
        .handle(HostEvent::Panel(PanelMessage::Rerun {
            text: "x".to_string(),
            seed: None,
        }))
        .unwrap();

    assert!(h.editor().rows.is_empty());
    assert!(h.drain_panel().is_empty());
    assert!(h.runner.requests().is_empty());
}

#[tokio::test]
async fn custom_seed_and_language_come_from_config() {
    let config = VisualizerConfig {
        default_seed: 7,
        language_id: "ruby".to_string(),
        ..VisualizerConfig::default()
    };
    let mut h = Harness::with_config(config, ScriptedRunner::new(vec![]));
    assert!(h
        .session
        .handle(HostEvent::Start(Some(python_doc("a.py", "x"))))
        .is_err());

    h.session
        .handle(HostEvent::Start(Some(doc_in("ruby", "a.rb"))))
        .unwrap();
    h.pump().await;
    assert_eq!(h.runner.requests()[0].seed, 7);
}

#[tokio::test]
async fn host_loop_reports_rejections_and_stops_on_shutdown() {
    let (panel, mut panel_rx) = ChannelPanel::new();
    let (host, handle) = Host::new(
        VisualizerConfig::default(),
        ScriptedRunner::new(vec![]),
        panel,
        RecordingEditor::default(),
    );
    handle
        .send(HostEvent::Start(Some(doc_in("json", "a.json"))))
        .unwrap();
    handle.send(HostEvent::Start(None)).unwrap();
    handle.send(HostEvent::Shutdown).unwrap();

    let session = host.run().await;

    let errors = &session.sink().errors;
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("json"));
    assert!(errors[1].contains("no active editor"));
    assert!(panel_rx.try_recv().is_err());
}

#[tokio::test]
async fn shutdown_disposes_an_open_panel() {
    let (panel, mut panel_rx) = ChannelPanel::new();
    let (host, handle) = Host::new(
        VisualizerConfig::default(),
        ScriptedRunner::new(vec![]),
        panel,
        RecordingEditor::default(),
    );
    handle
        .send(HostEvent::Start(Some(python_doc("a.py", "x = 1"))))
        .unwrap();
    handle.send(HostEvent::Shutdown).unwrap();

    let session = host.run().await;
    assert!(!session.is_panel_open());

    let mut events = Vec::new();
    while let Ok(event) = panel_rx.try_recv() {
        events.push(event);
    }
    assert!(matches!(events.first(), Some(PanelEvent::Open { .. })));
    assert_eq!(events.last(), Some(&PanelEvent::Dispose));
}
