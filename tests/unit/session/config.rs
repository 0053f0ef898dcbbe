use super::*;

fn base() -> RenderSessionConfig {
    RenderSessionConfig::new(
        Canvas {
            width: 64,
            height: 36,
        },
        Fps { num: 30, den: 1 },
    )
}

#[test]
fn defaults_validate() {
    base().validate().unwrap();
}

#[test]
fn zero_fps_is_a_configuration_error() {
    let mut cfg = base();
    cfg.fps = Fps { num: 0, den: 1 };
    assert!(cfg.validate().unwrap_err().is_configuration());
    cfg.fps = Fps { num: 30, den: 0 };
    assert!(cfg.validate().unwrap_err().is_configuration());
}

#[test]
fn zero_canvas_is_rejected() {
    let mut cfg = base();
    cfg.canvas.height = 0;
    assert!(matches!(
        cfg.validate(),
        Err(RenderError::Configuration(_))
    ));
}

#[test]
fn quality_three_fails_closed_when_motion_blur_enabled() {
    let cfg = base().with_motion_blur(3);
    assert!(matches!(
        cfg.validate(),
        Err(RenderError::UnsupportedSampleCount(64))
    ));

    // Without motion blur the quality level is inert.
    let mut cfg = base();
    cfg.motion_blur.quality = 3;
    cfg.validate().unwrap();
}

#[test]
fn quality_above_maximum_is_rejected() {
    let cfg = base().with_motion_blur(4);
    assert!(matches!(
        cfg.validate(),
        Err(RenderError::Configuration(_))
    ));
}

#[test]
fn encoding_quality_and_duration_bounds() {
    let mut cfg = base();
    cfg.encoding_quality = 101;
    assert!(cfg.validate().is_err());

    let mut cfg = base();
    cfg.source_duration_secs = Some(f64::NAN);
    assert!(cfg.validate().is_err());
}

#[test]
fn parses_json_with_defaults() {
    let cfg = RenderSessionConfig::from_json_str(
        r#"{
            "canvas": { "width": 1280, "height": 720 },
            "fps": { "num": 60, "den": 1 },
            "motion_blur": { "enabled": true, "quality": 1 },
            "codec": "hevc",
            "source_duration_secs": 2.5
        }"#,
    )
    .unwrap();
    assert_eq!(cfg.codec, VideoCodec::Hevc);
    assert_eq!(cfg.encoding_quality, 80);
    assert!(!cfg.antialiasing);
    assert_eq!(cfg.audio, AudioFormat::default());
    assert_eq!(cfg.estimated_total_frames(), Some(150));
    cfg.validate().unwrap();
}

#[test]
fn unknown_fields_are_rejected() {
    let err = RenderSessionConfig::from_json_str(
        r#"{ "canvas": { "width": 8, "height": 8 }, "fps": { "num": 30, "den": 1 }, "dof": true }"#,
    )
    .unwrap_err();
    assert!(err.is_configuration());
}
