use super::*;
use crate::encode::sink::InMemorySink;
use crate::foundation::core::Canvas;
use crate::session::shutter::ShutterPhase;

fn cfg() -> RenderSessionConfig {
    RenderSessionConfig::new(
        Canvas {
            width: 4,
            height: 4,
        },
        Fps { num: 30, den: 1 },
    )
}

/// Records every call and fills the target with a value derived from the sample count.
#[derive(Default)]
struct Recorder {
    calls: Vec<(f64, Vec2)>,
    fail_on_call: Option<usize>,
}

impl CameraPoseProvider for Recorder {
    fn render_frame_at(
        &mut self,
        time_secs: f64,
        jitter_px: Vec2,
        target: &mut FrameRGBA,
    ) -> RenderResult<()> {
        if self.fail_on_call == Some(self.calls.len()) {
            return Err(RenderError::camera("device lost"));
        }
        self.calls.push((time_secs, jitter_px));
        let v = (self.calls.len() % 256) as u8;
        target.fill([v, v, v, 255]);
        Ok(())
    }
}

#[test]
fn jitter_only_applies_with_antialiasing_and_motion_blur() {
    let mut c = cfg().with_motion_blur(0);
    c.antialiasing = true;
    let s = RenderSession::new(c, InMemorySink::new()).unwrap();
    let table = jitter_table(8).unwrap();
    assert_eq!(s.jitter_for(3), table[3] * JITTER_RADIUS_PX);
    assert!(s.jitter_for(3).hypot() <= JITTER_RADIUS_PX);

    let s = RenderSession::new(cfg().with_motion_blur(0), InMemorySink::new()).unwrap();
    assert_eq!(s.jitter_for(3), Vec2::ZERO);

    let mut c = cfg();
    c.antialiasing = true;
    let s = RenderSession::new(c, InMemorySink::new()).unwrap();
    assert_eq!(s.jitter_for(0), Vec2::ZERO);
}

#[test]
fn camera_receives_jittered_sample_times() {
    let mut c = cfg().with_motion_blur(0);
    c.antialiasing = true;
    let mut s = RenderSession::new(c, InMemorySink::new()).unwrap();
    let mut cam = Recorder::default();
    for _ in 0..16 {
        s.on_tick(&mut cam).unwrap();
    }
    assert_eq!(cam.calls.len(), 8);
    let distinct: std::collections::BTreeSet<_> = cam
        .calls
        .iter()
        .map(|(_, j)| ((j.x * 1e4) as i64, (j.y * 1e4) as i64))
        .collect();
    assert_eq!(distinct.len(), 8);
    assert!(cam.calls.windows(2).all(|w| w[1].0 > w[0].0));
}

#[test]
fn emitted_frame_averages_samples() {
    let mut s = RenderSession::new(cfg().with_motion_blur(0), InMemorySink::new()).unwrap();
    let mut cam = Recorder::default();
    let mut frames = Vec::new();
    for _ in 0..8 {
        if let Some(f) = s.on_tick(&mut cam).unwrap().into_frame() {
            frames.push(f);
        }
    }
    assert_eq!(frames.len(), 1);
    // Samples were filled with 1..=8, whose mean is 4.5.
    assert!(frames[0].pixels.data[0] == 4 || frames[0].pixels.data[0] == 5);
    assert_eq!(frames[0].pixels.data[3], 255);
    assert_eq!(s.sink().frames()[0].1, frames[0].pixels);
}

#[test]
fn camera_failure_is_terminal() {
    let mut s = RenderSession::new(cfg(), InMemorySink::new()).unwrap();
    let mut cam = Recorder {
        fail_on_call: Some(2),
        ..Recorder::default()
    };
    s.on_tick(&mut cam).unwrap();
    s.on_tick(&mut cam).unwrap();
    assert!(matches!(s.on_tick(&mut cam), Err(RenderError::Camera(_))));
    assert!(matches!(s.on_tick(&mut cam), Err(RenderError::SessionFailed)));
    assert!(matches!(
        s.on_audio_samples(&[0.0, 0.0], 1),
        Err(RenderError::SessionFailed)
    ));
    assert!(s.progress().failed);
    assert_eq!(s.sink().frames().len(), 2);
}

#[test]
fn failed_flag_survives_shutdown() {
    let mut s = RenderSession::new(cfg(), InMemorySink::failing_after(0)).unwrap();
    let mut cam = Recorder::default();
    assert!(matches!(s.on_tick(&mut cam), Err(RenderError::SinkWrite(_))));
    assert!(s.progress().failed);

    s.shutdown().unwrap();
    let p = s.progress();
    assert!(p.failed);
    assert!(!p.complete);
    assert!(s.sink().is_ended());
    assert!(matches!(s.on_tick(&mut cam), Err(RenderError::SessionClosed)));
}

#[test]
fn shutdown_discards_partial_frame_and_is_idempotent() {
    let mut s = RenderSession::new(cfg().with_motion_blur(1), InMemorySink::new()).unwrap();
    let mut cam = Recorder::default();
    for _ in 0..20 {
        s.on_tick(&mut cam).unwrap();
    }
    for _ in 0..12 {
        s.on_tick(&mut cam).unwrap();
    }
    assert_eq!(s.shutter().phase(), ShutterPhase::Open);
    for _ in 0..5 {
        s.on_tick(&mut cam).unwrap();
    }
    assert!(s.shutter().is_mid_frame());

    s.shutdown().unwrap();
    s.shutdown().unwrap();
    assert_eq!(s.sink().frames().len(), 1);
    assert!(s.sink().is_ended());
    assert!(s.progress().complete);
    assert!(matches!(s.on_tick(&mut cam), Err(RenderError::SessionClosed)));
}

#[test]
fn audio_sync_is_consumed_by_next_buffer() {
    let mut s = RenderSession::new(cfg().with_motion_blur(0), InMemorySink::new()).unwrap();
    let mut cam = Recorder::default();
    assert_eq!(s.pending_audio_sync(), None);
    s.on_tick(&mut cam).unwrap();
    assert_eq!(s.pending_audio_sync(), Some(FrameIndex(0)));
    s.on_tick(&mut cam).unwrap();
    assert_eq!(s.pending_audio_sync(), Some(FrameIndex(0)));

    s.on_audio_samples(&[0.25; 8], 4).unwrap();
    assert_eq!(s.pending_audio_sync(), None);
    assert_eq!(s.audio_samples_forwarded(), 4);
    assert_eq!(s.sink().audio(), &[0.25; 8]);
}

#[test]
fn audio_length_mismatch_fails_session() {
    let mut s = RenderSession::new(cfg(), InMemorySink::new()).unwrap();
    assert!(matches!(
        s.on_audio_samples(&[0.0; 3], 2),
        Err(RenderError::SinkWrite(_))
    ));
    assert!(s.progress().failed);
}

#[test]
fn progress_uses_source_duration() {
    let mut c = cfg();
    c.source_duration_secs = Some(1.0);
    let mut s = RenderSession::new(c, InMemorySink::new()).unwrap();
    let mut cam = Recorder::default();
    for _ in 0..15 {
        s.on_tick(&mut cam).unwrap();
    }
    let p = s.progress();
    assert_eq!(p.frames_emitted, 15);
    assert_eq!(p.estimated_total_frames, Some(30));
    assert_eq!(p.fraction(), Some(0.5));
    s.shutdown().unwrap();
    assert_eq!(s.progress().fraction(), Some(1.0));
}

#[test]
fn required_host_fps_follows_motion_blur() {
    let s = RenderSession::new(cfg().with_motion_blur(2), InMemorySink::new()).unwrap();
    assert_eq!(s.required_host_fps().unwrap(), Fps { num: 1920, den: 1 });
}
