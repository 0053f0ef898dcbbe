use super::*;
use crate::foundation::core::Canvas;

fn cfg() -> RenderSessionConfig {
    RenderSessionConfig::new(
        Canvas {
            width: 8,
            height: 8,
        },
        Fps { num: 30, den: 1 },
    )
}

fn plan(a: TickAction) -> SamplePlan {
    match a {
        TickAction::RenderAndAccumulate(p) => p,
        TickAction::SkipTick => panic!("expected a render tick"),
    }
}

#[test]
fn disabled_motion_blur_renders_one_frame_per_tick() {
    let mut s = ShutterState::new(&cfg());
    for i in 0..90u64 {
        let p = plan(s.step());
        assert_eq!(p.output_frame, FrameIndex(i));
        assert_eq!(p.sample_index_in_frame, 0);
        assert!(p.is_last_sample_of_frame);
        assert!(p.is_audio_sync_frame);
        assert!((p.sample_time_secs - i as f64 / 30.0).abs() < 1e-12);
    }
    assert_eq!(s.output_frame_index(), 90);
}

#[test]
fn quality_one_opens_for_sixteen_then_closes_for_sixteen() {
    let mut s = ShutterState::new(&cfg().with_motion_blur(1));
    let mut emitted_at = Vec::new();
    for tick in 1..=32u32 {
        match s.step() {
            TickAction::RenderAndAccumulate(p) => {
                assert!(tick <= 16);
                if p.is_last_sample_of_frame {
                    emitted_at.push(tick);
                }
            }
            TickAction::SkipTick => assert!(tick > 16),
        }
    }
    assert_eq!(emitted_at, vec![16]);
    assert_eq!(s.phase(), ShutterPhase::Open);
    let p = plan(s.step());
    assert_eq!(p.output_frame, FrameIndex(1));
    assert_eq!(p.sample_index_in_frame, 0);
}

#[test]
fn render_count_between_emits_matches_time_steps() {
    for q in 0..=2u8 {
        let c = cfg().with_motion_blur(q);
        let n = motion_blur_time_steps(&c);
        let mut s = ShutterState::new(&c);
        let mut renders = 0;
        let mut emits = 0;
        for _ in 0..(2 * n * 5) {
            if let TickAction::RenderAndAccumulate(p) = s.step() {
                renders += 1;
                if p.is_last_sample_of_frame {
                    assert_eq!(renders, n);
                    renders = 0;
                    emits += 1;
                }
            }
        }
        assert_eq!(emits, 5);
    }
}

#[test]
fn any_window_has_half_duty_cycle() {
    let c = cfg().with_motion_blur(0);
    let n = motion_blur_time_steps(&c) as usize;
    let mut s = ShutterState::new(&c);
    let rendered: Vec<bool> = (0..n * 8)
        .map(|_| matches!(s.step(), TickAction::RenderAndAccumulate(_)))
        .collect();
    for window in rendered.windows(2 * n) {
        assert_eq!(window.iter().filter(|r| **r).count(), n);
    }
}

#[test]
fn exactly_one_audio_sync_per_frame() {
    let c = cfg().with_motion_blur(2);
    let n = motion_blur_time_steps(&c);
    let mut s = ShutterState::new(&c);
    let mut syncs_per_frame = std::collections::BTreeMap::<u64, u32>::new();
    for _ in 0..(2 * n * 4) {
        if let TickAction::RenderAndAccumulate(p) = s.step() {
            let e = syncs_per_frame.entry(p.output_frame.0).or_default();
            if p.is_audio_sync_frame {
                assert_eq!(p.sample_index_in_frame, 0);
                *e += 1;
            }
        }
    }
    assert_eq!(syncs_per_frame.len(), 4);
    assert!(syncs_per_frame.values().all(|&c| c == 1));
}

#[test]
fn sample_times_span_half_a_frame_around_frame_start() {
    let c = cfg().with_motion_blur(0);
    let mut s = ShutterState::new(&c);
    // Skip frame 0 so the second frame's timing is checked too.
    for _ in 0..16 {
        s.step();
    }
    let times: Vec<f64> = (0..8).map(|_| plan(s.step()).sample_time_secs).collect();
    let frame_start = 1.0 / 30.0;
    let shutter = 0.5 / 30.0;
    assert!((times[0] - (frame_start - shutter / 2.0)).abs() < 1e-12);
    for w in times.windows(2) {
        assert!((w[1] - w[0] - shutter / 8.0).abs() < 1e-12);
    }
}

#[test]
fn counters_respect_bounds() {
    let c = cfg().with_motion_blur(1);
    let mut s = ShutterState::new(&c);
    for _ in 0..200 {
        s.step();
        assert!(s.current_sample_index() < s.samples_per_frame());
        assert!(s.current_time_step() <= s.time_steps());
    }
}

#[test]
fn mid_frame_tracks_open_span() {
    let mut s = ShutterState::new(&cfg().with_motion_blur(0));
    assert!(!s.is_mid_frame());
    s.step();
    assert!(s.is_mid_frame());
    for _ in 0..7 {
        s.step();
    }
    assert!(!s.is_mid_frame());
    assert_eq!(s.phase(), ShutterPhase::Closed);
}
