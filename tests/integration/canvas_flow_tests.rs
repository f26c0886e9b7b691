//! Integration tests for the Window → Gateway → device resume flows.
//!
//! Every test drives a real `Canvas` against the recording `MockLink`; the
//! `ScriptedDevice` produces the replies a device would send.

use crate::mock_link::{LinkCall, ScriptedDevice, canvas, run_device};

use wristlink::app::events::CanvasEvent;
use wristlink::canvas::{Layer, PendingOp};
use wristlink::error::{Error, GatewayError, LinkError, ProtocolError, ResourceError};
use wristlink::rpc::dict::Dictionary;
use wristlink::rpc::protocol::{ErrorCode, Key, Method, Status};

// ── Allocation on first use ──────────────────────────────────

#[test]
fn update_on_unallocated_window_allocates_once_and_resumes_once() {
    let (canvas, link) = canvas();
    let gw = canvas.gateway();
    let window = canvas.create_window();
    let text = canvas.text_layer();
    text.set_text("Hello");
    window.add_layer(text.clone());

    window.request_update(gw).unwrap();
    assert_eq!(link.methods(), vec![Method::NewWindow]);
    assert_eq!(window.pending_ops(), vec![PendingOp::Update]);
    assert!(gw.is_busy());

    let mut device = ScriptedDevice::new();
    let mut events = Vec::new();
    let reply = device.answer_next(&link).unwrap();
    canvas.dispatch(reply, &mut events).unwrap();

    assert_eq!(window.id(), Some(1));
    assert_eq!(events, vec![CanvasEvent::Completed { transaction_id: 1 }]);

    // The single parked update was retried: it started the layer allocation
    // and parked itself again to wait for it.
    assert_eq!(link.methods(), vec![Method::NewWindow, Method::NewTextLayer]);
    let (tid, request) = link.last_sent().unwrap();
    assert_eq!(tid, 2);
    assert_eq!(request.uint(Key::WindowId), Some(1));
    assert_eq!(window.pending_ops(), vec![PendingOp::Update]);
}

#[test]
fn push_on_unallocated_window_allocates_then_pushes() {
    let (canvas, link) = canvas();
    let gw = canvas.gateway();
    let window = canvas.create_window();

    window.request_push(gw).unwrap();
    assert_eq!(link.methods(), vec![Method::NewWindow]);
    assert_eq!(window.pending_ops(), vec![PendingOp::Push]);

    let mut device = ScriptedDevice::new();
    let mut events = Vec::new();
    let reply = device.answer_next(&link).unwrap();
    canvas.dispatch(reply, &mut events).unwrap();

    assert_eq!(link.methods(), vec![Method::NewWindow, Method::PushWindow]);
    let (_, push) = link.last_sent().unwrap();
    assert_eq!(push.uint(Key::WindowId), Some(1));
    assert!(window.pending_ops().is_empty());
    assert_eq!(gw.in_flight(), vec![2]);

    run_device(&canvas, &link, &mut device, &mut events);
    assert!(!gw.is_busy());
}

// ── Attribute round-trip ─────────────────────────────────────

#[test]
fn hello_world_round_trip_leaves_layer_clean() {
    let (canvas, link) = canvas();
    let gw = canvas.gateway();
    let window = canvas.create_window();
    let text = canvas.text_layer();
    window.add_layer(text.clone());

    text.set_text("Hello, World!");
    assert!(text.has_changes());
    window.request_update(gw).unwrap();

    let mut device = ScriptedDevice::new();
    let mut events = Vec::new();
    assert_eq!(run_device(&canvas, &link, &mut device, &mut events), 3);

    assert_eq!(
        link.methods(),
        vec![
            Method::NewWindow,
            Method::NewTextLayer,
            Method::ApplyAttributes
        ]
    );
    let (_, apply) = link.last_sent().unwrap();
    assert_eq!(apply.bytes(Key::Text), Some(&b"Hello, World!"[..]));
    assert_eq!(apply.uint(Key::TextLayerId), Some(10));
    assert_eq!(apply.uint(Key::WindowId), Some(1));
    // Only the changed field travels.
    assert!(!apply.contains(Key::ForegroundColor));
    assert!(!apply.contains(Key::Font));

    assert!(!text.has_changes());
    assert_eq!(text.id(), Some(10));
    assert!(window.pending_ops().is_empty());
    assert!(!gw.is_busy());
    assert_eq!(events.len(), 3);

    // Setting the confirmed value again, twice, is not a change.
    text.set_text("Hello, World!");
    text.set_text("Hello, World!");
    assert!(!text.has_changes());
}

#[test]
fn device_disagreement_keeps_field_dirty_and_resyncs() {
    let (canvas, link) = canvas();
    let gw = canvas.gateway();
    let window = canvas.create_window();
    let text = canvas.text_layer();
    window.add_layer(text.clone());
    text.set_text("Hello, World!");
    window.request_update(gw).unwrap();

    let mut device = ScriptedDevice::new();
    let mut events = Vec::new();
    for _ in 0..2 {
        let reply = device.answer_next(&link).unwrap();
        canvas.dispatch(reply, &mut events).unwrap();
    }
    let (tid, _) = link.last_sent().unwrap();
    device.drop_next();

    // Device confirms a truncated text.
    let mut echo = Dictionary::new();
    echo.insert_uint(Key::Status, Status::Ok as u32);
    echo.insert_uint(Key::TransactionId, tid);
    echo.insert_str(Key::Text, "Hello");
    let frame = device.frame(echo);
    canvas.dispatch(frame, &mut events).unwrap();

    assert!(text.has_changes());
    assert_eq!(link.methods().last(), Some(&Method::ApplyAttributes));
    assert_eq!(link.methods().len(), 4);

    run_device(&canvas, &link, &mut device, &mut events);
    assert!(!text.has_changes());
}

#[test]
fn busy_link_defers_sync_without_sending() {
    let (canvas, link) = canvas();
    let gw = canvas.gateway();
    let window = canvas.create_window();
    let text = canvas.text_layer();
    window.add_layer(text.clone());
    text.set_text("a");
    window.request_update(gw).unwrap();

    let mut device = ScriptedDevice::new();
    let mut events = Vec::new();
    run_device(&canvas, &link, &mut device, &mut events);
    let before = link.sent().len();

    // Someone else holds the link.
    gw.send(Dictionary::new(), None).unwrap();
    text.set_text("b");

    let direct = text.clone().synchronize(&window, gw).unwrap_err();
    assert!(direct.is_busy());
    window.request_update(gw).unwrap();

    assert_eq!(link.sent().len(), before + 1);
    assert!(text.has_changes());
    assert_eq!(window.pending_ops(), vec![PendingOp::Update]);

    // The blocker's reply frees the link; the idle sweep resumes the window.
    run_device(&canvas, &link, &mut device, &mut events);
    assert_eq!(link.methods().last(), Some(&Method::ApplyAttributes));
    let (_, apply) = link.last_sent().unwrap();
    assert_eq!(apply.bytes(Key::Text), Some(&b"b"[..]));
    assert!(!text.has_changes());
    assert!(window.pending_ops().is_empty());
}

// ── Pending-stack ordering ───────────────────────────────────

#[test]
fn nested_deferral_drains_update_before_push() {
    let (canvas, link) = canvas();
    let gw = canvas.gateway();
    let window = canvas.create_window();
    let text = canvas.text_layer();
    window.add_layer(text.clone());
    text.set_text("a");
    window.request_update(gw).unwrap();

    let mut device = ScriptedDevice::new();
    let mut events = Vec::new();
    run_device(&canvas, &link, &mut device, &mut events);

    gw.send(Dictionary::new(), None).unwrap();
    window.request_push(gw).unwrap();
    text.set_text("b");
    window.request_update(gw).unwrap();
    assert_eq!(
        window.pending_ops(),
        vec![PendingOp::Push, PendingOp::Update]
    );

    // Free the link through the gateway alone so nothing resumes implicitly.
    gw.on_receive(device.answer_next(&link).unwrap()).unwrap();
    assert!(!gw.is_busy());

    // First resume takes UPDATING: the diff goes out, PUSH still waits.
    window.resume(gw).unwrap();
    assert_eq!(link.methods().last(), Some(&Method::ApplyAttributes));
    assert_eq!(
        window.pending_ops(),
        vec![PendingOp::Push, PendingOp::Update]
    );

    // The diff's completion resumes again and reaches PUSH.
    gw.on_receive(device.answer_next(&link).unwrap()).unwrap();
    assert_eq!(link.methods().last(), Some(&Method::PushWindow));
    assert!(window.pending_ops().is_empty());
}

#[test]
fn update_then_push_follows_stack_order() {
    let (canvas, link) = canvas();
    let gw = canvas.gateway();
    let window = canvas.create_window();
    let text = canvas.text_layer();
    window.add_layer(text.clone());
    text.set_text("Hello, World!");

    window.request_update(gw).unwrap();
    window.request_push(gw).unwrap();
    assert_eq!(
        window.pending_ops(),
        vec![PendingOp::Update, PendingOp::Push]
    );

    let mut device = ScriptedDevice::new();
    let mut events = Vec::new();
    run_device(&canvas, &link, &mut device, &mut events);

    // The push parked last runs first; the fire-and-forget push reply lets
    // the idle sweep pick the update back up.
    assert_eq!(
        link.methods(),
        vec![
            Method::NewWindow,
            Method::PushWindow,
            Method::NewTextLayer,
            Method::ApplyAttributes
        ]
    );
    assert!(!text.has_changes());
    assert!(window.pending_ops().is_empty());
}

// ── Failures ─────────────────────────────────────────────────

#[test]
fn allocation_failure_is_recorded_and_markers_stay() {
    let (canvas, link) = canvas();
    let gw = canvas.gateway();
    let window = canvas.create_window();
    window.request_update(gw).unwrap();
    window.request_push(gw).unwrap();

    let mut device = ScriptedDevice::new();
    let mut events = Vec::new();
    let err = device.err(1, ErrorCode::NoMemory.as_u32());
    device.drop_next();
    canvas.dispatch(err, &mut events).unwrap();

    assert_eq!(
        events,
        vec![CanvasEvent::DeviceError {
            transaction_id: 1,
            code: ErrorCode::NoMemory
        }]
    );
    assert_eq!(
        window.last_error(),
        Some(ResourceError::Device(ErrorCode::NoMemory))
    );
    assert_eq!(
        window.pending_ops(),
        vec![PendingOp::Update, PendingOp::Push]
    );
    assert_eq!(window.id(), None);
    assert!(!gw.is_busy());
    assert_eq!(canvas.resume_idle(), 0);
    assert_eq!(link.methods(), vec![Method::NewWindow]);

    // An explicit retry allocates again; success clears the failure and the
    // stuck markers drain.
    window.request_update(gw).unwrap();
    run_device(&canvas, &link, &mut device, &mut events);
    assert_eq!(window.id(), Some(1));
    assert_eq!(window.last_error(), None);
    assert!(window.pending_ops().is_empty());
    assert_eq!(
        link.methods(),
        vec![Method::NewWindow, Method::NewWindow, Method::PushWindow]
    );
}

#[test]
fn apply_failure_keeps_flags_and_stops() {
    let (canvas, link) = canvas();
    let gw = canvas.gateway();
    let window = canvas.create_window();
    let text = canvas.text_layer();
    window.add_layer(text.clone());
    text.set_text("x");
    window.request_update(gw).unwrap();

    let mut device = ScriptedDevice::new();
    let mut events = Vec::new();
    for _ in 0..2 {
        let reply = device.answer_next(&link).unwrap();
        canvas.dispatch(reply, &mut events).unwrap();
    }
    let (tid, _) = link.last_sent().unwrap();
    device.drop_next();
    let err = device.err(tid, ErrorCode::NoLayer.as_u32());
    canvas.dispatch(err, &mut events).unwrap();

    assert_eq!(
        window.last_error(),
        Some(ResourceError::Device(ErrorCode::NoLayer))
    );
    assert!(text.has_changes());
    assert_eq!(window.pending_ops(), vec![PendingOp::Update]);
    assert!(!gw.is_busy());
    assert_eq!(link.sent().len(), 3);
}

#[test]
fn lost_reply_keeps_link_busy_until_resend() {
    let (canvas, link) = canvas();
    let gw = canvas.gateway();
    let first = canvas.create_window();
    let second = canvas.create_window();

    first.request_update(gw).unwrap();
    let mut device = ScriptedDevice::new();
    let mut events = Vec::new();
    device.drop_next();

    second.request_push(gw).unwrap();
    assert_eq!(second.pending_ops(), vec![PendingOp::Push]);
    assert_eq!(canvas.resume_idle(), 0);
    assert!(gw.is_busy());
    assert_eq!(gw.in_flight(), vec![1]);

    gw.resend(1).unwrap();
    let sent = link.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);

    run_device(&canvas, &link, &mut device, &mut events);
    assert_eq!(first.id(), Some(1));
    assert_eq!(second.id(), Some(2));
    assert!(second.pending_ops().is_empty());
    assert_eq!(
        link.methods(),
        vec![
            Method::NewWindow,
            Method::NewWindow,
            Method::NewWindow,
            Method::PushWindow
        ]
    );
    assert!(!gw.is_busy());
}

#[test]
fn transport_failure_keeps_record_for_resend() {
    let (canvas, link) = canvas();
    let gw = canvas.gateway();
    let window = canvas.create_window();

    link.set_fail_sends(true);
    assert_eq!(
        window.request_update(gw),
        Err(Error::Gateway(GatewayError::Link(LinkError::Disconnected)))
    );
    assert_eq!(gw.in_flight(), vec![1]);
    assert_eq!(window.pending_ops(), vec![PendingOp::Update]);

    link.set_fail_sends(false);
    gw.resend(1).unwrap();
    assert_eq!(gw.resend(9), Err(GatewayError::UnknownTransaction(9)));

    let mut device = ScriptedDevice::new();
    let mut events = Vec::new();
    device.drop_next();
    run_device(&canvas, &link, &mut device, &mut events);
    assert_eq!(window.id(), Some(1));
    assert!(window.pending_ops().is_empty());
}

// ── Inbound classification ───────────────────────────────────

#[test]
fn malformed_reply_is_nacked_without_callback() {
    let (canvas, link) = canvas();
    let gw = canvas.gateway();
    let window = canvas.create_window();
    window.request_update(gw).unwrap();

    let mut device = ScriptedDevice::new();
    let mut events = Vec::new();
    let frame = device.status(Status::Ok);
    let frame_id = frame.frame_id;
    assert_eq!(
        canvas.dispatch(frame, &mut events),
        Err(Error::Protocol(ProtocolError::MalformedReply {
            status: Status::Ok
        }))
    );

    assert_eq!(link.nacks(), vec![frame_id]);
    assert_eq!(gw.in_flight(), vec![1]);
    assert_eq!(window.id(), None);
    assert_eq!(
        events,
        vec![CanvasEvent::Rejected(ProtocolError::MalformedReply {
            status: Status::Ok
        })]
    );

    let mut odd = Dictionary::new();
    odd.insert_uint(Key::Status, 9);
    let frame = device.frame(odd);
    assert_eq!(
        canvas.dispatch(frame, &mut events),
        Err(Error::Protocol(ProtocolError::UnknownStatus(9)))
    );
    assert_eq!(link.nacks().len(), 2);
    assert_eq!(gw.in_flight(), vec![1]);
}

#[test]
fn lifecycle_and_orphan_frames_are_acked() {
    let (canvas, link) = canvas();
    let gw = canvas.gateway();
    let mut device = ScriptedDevice::new();
    let mut events = Vec::new();

    gw.start_app().unwrap();
    let started = device.status(Status::Started);
    canvas.dispatch(started, &mut events).unwrap();
    assert!(gw.device_running());
    let stopped = device.status(Status::Stopped);
    canvas.dispatch(stopped, &mut events).unwrap();
    assert!(!gw.device_running());

    let orphan = device.ok(77);
    canvas.dispatch(orphan, &mut events).unwrap();

    canvas.set_connected(false, &mut events);
    canvas.set_connected(false, &mut events);
    gw.stop_app().unwrap();

    assert_eq!(
        events,
        vec![
            CanvasEvent::DeviceStarted,
            CanvasEvent::DeviceStopped,
            CanvasEvent::Orphaned { transaction_id: 77 },
            CanvasEvent::ConnectionChanged(false),
        ]
    );
    assert_eq!(link.acks().len(), 3);
    assert!(link.nacks().is_empty());
    assert_eq!(link.calls().first(), Some(&LinkCall::Start));
    assert_eq!(link.calls().last(), Some(&LinkCall::Stop));
}
