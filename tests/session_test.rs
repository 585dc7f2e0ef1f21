//! Integration tests for the session lifecycle

mod common;

use common::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use vvcsession::{
    AccessUnitBuffer, ChromaFormat, Config, ErrorCode, Frame, MessageLevel, Plane, Session,
    SessionState,
};

fn picture() -> TestPicture {
    TestPicture::new(64, 64, ChromaFormat::Cf420, 0)
}

/// Encode with a real frame, returning the done flag
fn push(session: &mut Session, pic: &TestPicture, payload: &mut [u8]) -> vvcsession::Result<bool> {
    let mut out = AccessUnitBuffer::new(payload);
    session.encode(Some(&pic.frame()), &mut out)
}

fn flush(session: &mut Session, payload: &mut [u8]) -> vvcsession::Result<bool> {
    let mut out = AccessUnitBuffer::new(payload);
    session.encode(None, &mut out)
}

#[test]
fn test_state_transitions() {
    let (mut session, _) = scripted_session(Behavior::Normal);
    let pic = picture();
    let mut payload = vec![0u8; 1024];

    assert_eq!(session.state(), SessionState::Uninitialized);
    session.init(&small_config()).unwrap();
    assert_eq!(session.state(), SessionState::Initialized);

    assert!(!push(&mut session, &pic, &mut payload).unwrap());
    assert_eq!(session.state(), SessionState::Encoding);

    assert!(flush(&mut session, &mut payload).unwrap());
    assert_eq!(session.state(), SessionState::Finalized);

    session.uninit().unwrap();
    assert_eq!(session.state(), SessionState::Uninitialized);
}

#[test]
fn test_encode_after_finalize_requires_restart() {
    let (mut session, _) = scripted_session(Behavior::Normal);
    let pic = picture();
    let mut payload = vec![0u8; 1024];

    session.init(&small_config()).unwrap();
    push(&mut session, &pic, &mut payload).unwrap();
    assert!(flush(&mut session, &mut payload).unwrap());

    let err = flush(&mut session, &mut payload).unwrap_err();
    assert_eq!(err.code(), ErrorCode::RestartRequired);
    assert_eq!(session.last_error(), "encoder already flushed, please reinit.");

    let err = push(&mut session, &pic, &mut payload).unwrap_err();
    assert_eq!(err.code(), ErrorCode::RestartRequired);
}

#[test]
fn test_real_frame_while_flushing_is_rejected() {
    let pic = picture();
    let mut payload = vec![0u8; 1 << 16];

    // the synthetic engine holds back a GOP, so one flush step does not finish
    let mut session = Session::default();
    session.init(&small_config()).unwrap();
    for _ in 0..4 {
        push(&mut session, &pic, &mut payload).unwrap();
    }
    assert!(!flush(&mut session, &mut payload).unwrap());
    assert_eq!(session.state(), SessionState::Flushing);

    let err = push(&mut session, &pic, &mut payload).unwrap_err();
    assert_eq!(err.code(), ErrorCode::RestartRequired);
    assert_eq!(
        session.last_error(),
        "encoder already received flush indication, please reinit."
    );
    assert_eq!(session.state(), SessionState::Flushing);

    while !flush(&mut session, &mut payload).unwrap() {}
    assert_eq!(session.state(), SessionState::Finalized);
}

#[test]
fn test_init_pass_rules() {
    let (mut session, _) = scripted_session(Behavior::Normal);
    assert_eq!(session.init_pass(0).unwrap_err().code(), ErrorCode::Initialize);

    session.init(&small_config()).unwrap();

    let err = session.init_pass(2).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotSupported);
    assert!(session.last_error().contains("no support for pass 2"));

    let err = session.init_pass(1).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Initialize);
    assert!(session.last_error().contains("without having flushed the last pass"));

    let pic = picture();
    let mut payload = vec![0u8; 1024];
    push(&mut session, &pic, &mut payload).unwrap();
    assert_eq!(session.init_pass(1).unwrap_err().code(), ErrorCode::Initialize);

    assert!(flush(&mut session, &mut payload).unwrap());
    session.init_pass(1).unwrap();
    assert_eq!(session.state(), SessionState::Initialized);

    // a finished second pass may be restarted from pass 0
    session.init_pass(0).unwrap();
}

#[test]
fn test_uninit_without_init() {
    let (mut session, _) = scripted_session(Behavior::Normal);
    assert_eq!(session.uninit().unwrap_err().code(), ErrorCode::Initialize);
    assert_eq!(session.last_error(), ErrorCode::Initialize.message());
}

#[test]
fn test_reinit_after_uninit() {
    let (mut session, _) = scripted_session(Behavior::Normal);
    session.init(&small_config()).unwrap();
    session.uninit().unwrap();
    assert!(session.config().is_err());

    session.init(&Config::new(128, 64)).unwrap();
    assert_eq!(session.config().unwrap().source_width, 128);
}

#[test]
fn test_done_suppressed_outside_flushing() {
    let (mut session, _) = scripted_session(Behavior::AlwaysDone);
    let pic = picture();
    let mut payload = vec![0u8; 1024];

    session.init(&small_config()).unwrap();

    // flush before any frame: the session never entered Encoding
    assert!(!flush(&mut session, &mut payload).unwrap());
    assert_eq!(session.state(), SessionState::Initialized);

    for _ in 0..3 {
        assert!(!push(&mut session, &pic, &mut payload).unwrap());
        assert_eq!(session.state(), SessionState::Encoding);
    }

    assert!(flush(&mut session, &mut payload).unwrap());
    assert_eq!(session.state(), SessionState::Finalized);
}

#[test]
fn test_geometry_rejected_before_engine_call() {
    let (mut session, calls) = scripted_session(Behavior::Normal);
    let mut payload = vec![0u8; 1024];
    session.init(&small_config()).unwrap();

    let wide = TestPicture::new(96, 64, ChromaFormat::Cf420, 0);
    let err = push(&mut session, &wide, &mut payload).unwrap_err();

    // geometry problems keep the generic code rather than Parameter
    assert_eq!(err.code(), ErrorCode::Unspecified);
    assert_ne!(err.code(), ErrorCode::Parameter);
    assert_eq!(session.last_error(), "InputPicture: unsupported width");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(session.state(), SessionState::Initialized);
}

#[test]
fn test_validation_order() {
    let (mut session, calls) = scripted_session(Behavior::Normal);
    let mut payload = vec![0u8; 1024];
    session.init(&small_config()).unwrap();
    let pic = picture();

    let cases: Vec<(Frame<'_>, &str)> = vec![
        (Frame::default(), "InputPicture: invalid input buffers"),
        (
            Frame::luma_only(Plane::new(&pic.y, 64, 64, 64)),
            "InputPicture: invalid input buffers for chroma",
        ),
        (
            Frame::new([
                Plane::new(&pic.y, 64, 32, 64),
                Plane::new(&pic.cb, 32, 32, 32),
                Plane::new(&pic.cr, 32, 32, 32),
            ]),
            "InputPicture: unsupported height",
        ),
        (
            Frame::new([
                Plane::new(&pic.y, 64, 64, 48),
                Plane::new(&pic.cb, 32, 32, 32),
                Plane::new(&pic.cr, 32, 32, 32),
            ]),
            "InputPicture: unsupported width stride combination",
        ),
        (
            Frame::new([
                Plane::new(&pic.y, 64, 64, 64),
                Plane::new(&pic.cb, 32, 32, 16),
                Plane::new(&pic.cr, 32, 32, 32),
            ]),
            "InputPicture: unsupported width cstride combination for 2nd plane",
        ),
        (
            Frame::new([
                Plane::new(&pic.y, 64, 64, 64),
                Plane::new(&pic.cb, 32, 32, 32),
                Plane::new(&pic.cr, 32, 32, 16),
            ]),
            "InputPicture: unsupported width cstride combination for 3rd plane",
        ),
    ];

    for (frame, message) in cases {
        let mut out = AccessUnitBuffer::new(&mut payload);
        let err = session.encode(Some(&frame), &mut out).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unspecified, "{}", message);
        assert_eq!(session.last_error(), message);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_engine_fault_is_unspecified() {
    let (mut session, calls) = scripted_session(Behavior::Fault);
    let pic = picture();
    let mut payload = vec![0u8; 1024];
    session.init(&small_config()).unwrap();

    let err = push(&mut session, &pic, &mut payload).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Unspecified);
    assert_eq!(session.last_error(), "scripted engine fault");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_engine_panic_is_contained() {
    let (mut session, _) = scripted_session(Behavior::Panic);
    let pic = picture();
    let mut payload = vec![0u8; 1024];
    session.init(&small_config()).unwrap();

    let err = push(&mut session, &pic, &mut payload).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Unspecified);
    assert_eq!(session.last_error(), "scripted engine panic");

    // the session is still usable for teardown
    session.uninit().unwrap();
}

#[test]
fn test_failing_factory_leaves_session_uninitialized() {
    let mut session = Session::new(
        |_cfg: &Config, _log: &vvcsession::Logger| -> vvcsession::EngineResult<Box<dyn vvcsession::Engine>> {
            Err(vvcsession::EngineFault::new("no engine today"))
        },
    );
    let err = session.init(&small_config()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Unspecified);
    assert_eq!(session.last_error(), "no engine today");
    assert!(!session.is_initialized());
}

#[test]
fn test_failed_init_keeps_previous_verbosity() {
    let mut session = Session::new(
        |_cfg: &Config, _log: &vvcsession::Logger| -> vvcsession::EngineResult<Box<dyn vvcsession::Engine>> {
            Err(vvcsession::EngineFault::new("nope"))
        },
    );
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    session.register_message_callback(Some(Arc::new(move |level: MessageLevel, msg: &str| {
        sink.lock().unwrap().push((level, msg.to_string()));
    })));

    let mut cfg = small_config();
    cfg.verbosity = MessageLevel::Details;
    assert!(session.init(&cfg).is_err());
    assert!(session.init_pass(0).is_err());
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_output_buffer_checks() {
    let (mut session, calls) = scripted_session_with_payload(Behavior::Normal, 32);
    let pic = picture();
    session.init(&small_config()).unwrap();

    let err = push(&mut session, &pic, &mut []).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotEnoughMemory);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let mut small = vec![0xEEu8; 16];
    let mut out = AccessUnitBuffer::new(&mut small);
    let err = session.encode(Some(&pic.frame()), &mut out).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotEnoughMemory);
    assert_eq!(out.used_size(), 0);
    assert_eq!(
        session.last_error(),
        "access unit payload size is too small to store data (payload size: 16, needed 36)"
    );
    drop(out);
    assert!(small.iter().all(|&b| b == 0xEE));
}

#[test]
fn test_reconfig_not_supported() {
    let (mut session, _) = scripted_session(Behavior::Normal);
    let cfg = small_config();
    assert_eq!(session.reconfig(&cfg).unwrap_err().code(), ErrorCode::Initialize);
    session.init(&cfg).unwrap();
    assert_eq!(session.reconfig(&cfg).unwrap_err().code(), ErrorCode::NotSupported);
}

#[test]
fn test_last_error_is_kept_after_success() {
    let (mut session, _) = scripted_session(Behavior::Normal);
    let pic = picture();
    let mut payload = vec![0u8; 1024];

    assert_eq!(session.last_error(), "");
    session.init(&small_config()).unwrap();
    assert_eq!(session.init_pass(5).unwrap_err().code(), ErrorCode::NotSupported);
    push(&mut session, &pic, &mut payload).unwrap();
    assert!(session.last_error().contains("pass 5"));
}

#[test]
fn test_message_callback_and_summary() {
    let (mut session, _) = scripted_session(Behavior::Normal);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    session.register_message_callback(Some(Arc::new(move |level: MessageLevel, msg: &str| {
        sink.lock().unwrap().push((level, msg.to_string()));
    })));

    let mut cfg = small_config();
    cfg.verbosity = MessageLevel::Info;
    session.init(&cfg).unwrap();
    session.print_summary().unwrap();

    let seen = seen.lock().unwrap();
    assert!(seen
        .iter()
        .any(|(level, msg)| *level == MessageLevel::Info && msg == "scripted engine: 0 pictures"));
    assert!(seen.iter().all(|(level, _)| *level <= MessageLevel::Info));
}

#[test]
fn test_post_call_hook_runs_after_encode_and_uninit() {
    let (mut session, _) = scripted_session(Behavior::Normal);
    let hooks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hooks);
    session.set_post_call_hook(Some(Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })));

    let pic = picture();
    let mut payload = vec![0u8; 1024];
    session.init(&small_config()).unwrap();
    assert_eq!(hooks.load(Ordering::SeqCst), 0);

    push(&mut session, &pic, &mut payload).unwrap();
    flush(&mut session, &mut payload).unwrap();
    session.uninit().unwrap();
    assert_eq!(hooks.load(Ordering::SeqCst), 3);
}

#[test]
fn test_recon_callback_requires_init() {
    let mut session = Session::default();
    let err = session
        .set_recon_callback(Some(Box::new(|_: &Frame<'_>| {})))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Initialize);
}

#[test]
fn test_recon_callback_panic_is_contained() {
    let (mut session, _) = scripted_session(Behavior::ReconPanic);
    session.init(&small_config()).unwrap();

    let err = session.set_recon_callback(None).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Unspecified);
    assert_eq!(session.last_error(), "recon install failed");

    // the session stays usable
    let mut payload = vec![0u8; 1024];
    push(&mut session, &picture(), &mut payload).unwrap();
    assert_eq!(session.state(), SessionState::Encoding);
}

#[test]
fn test_recon_callback_runs_inside_encode() {
    let mut session = Session::default();
    let mut cfg = small_config();
    cfg.gop_size = 1;
    session.init(&cfg).unwrap();

    let recon = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&recon);
    session
        .set_recon_callback(Some(Box::new(move |frame: &Frame<'_>| {
            sink.lock().unwrap().push(frame.planes[0].row(0)[0]);
        })))
        .unwrap();

    let mut payload = vec![0u8; 1 << 16];
    for n in 0..3 {
        let pic = TestPicture::new(64, 64, ChromaFormat::Cf420, n);
        push(&mut session, &pic, &mut payload).unwrap();
        assert_eq!(recon.lock().unwrap().len(), n as usize + 1);
    }
}

#[test]
fn test_lead_and_trail_frames() {
    let mut cfg = small_config();
    cfg.temporal_filter.mode = vvcsession::FilterMode::On;
    cfg.temporal_filter.lead_frames = 2;
    cfg.temporal_filter.trail_frames = 3;

    let mut session = Session::default();
    assert_eq!(session.num_lead_frames(), 0);
    session.init(&cfg).unwrap();
    assert_eq!(session.num_lead_frames(), 2);
    assert_eq!(session.num_trail_frames(), 3);
}

#[test]
fn test_two_pass_run() {
    let mut cfg = small_config();
    cfg.num_passes = 2;
    cfg.target_bitrate = 500_000;

    let mut session = Session::default();
    session.init(&cfg).unwrap();
    let mut payload = vec![0u8; 1 << 16];

    for pass in 0..2 {
        session.init_pass(pass).unwrap();
        let mut pocs = Vec::new();
        for n in 0..10 {
            let pic = TestPicture::new(64, 64, ChromaFormat::Cf420, n);
            let mut out = AccessUnitBuffer::new(&mut payload);
            session.encode(Some(&pic.frame()), &mut out).unwrap();
            if out.used_size() > 0 {
                pocs.push(out.poc);
            }
        }
        loop {
            let mut out = AccessUnitBuffer::new(&mut payload);
            let done = session.encode(None, &mut out).unwrap();
            if out.used_size() > 0 {
                pocs.push(out.poc);
            }
            if done {
                break;
            }
        }
        assert_eq!(pocs, (0..10).collect::<Vec<i64>>(), "pass {}", pass);
        assert_eq!(session.state(), SessionState::Finalized);
    }
}
