use super::*;

fn canvas() -> Canvas {
    Canvas {
        width: 3,
        height: 2,
    }
}

fn push(acc: &mut AccumulationBuffer, k: u32, rgba: [u8; 4]) {
    acc.begin_sample().fill(rgba);
    acc.blend_sample(running_weight(k), k == 0).unwrap();
}

#[test]
fn running_weight_is_reciprocal() {
    assert_eq!(running_weight(0), 1.0);
    assert_eq!(running_weight(1), 0.5);
    assert_eq!(running_weight(3), 0.25);
}

#[test]
fn identical_samples_do_not_drift() {
    for n in [1u32, 2, 3, 7, 8, 16, 32, 64] {
        for v in [0u8, 1, 77, 128, 254, 255] {
            let mut acc = AccumulationBuffer::new(canvas()).unwrap();
            for k in 0..n {
                push(&mut acc, k, [v, v, v, v]);
            }
            let out = acc.finalize().unwrap();
            assert!(out.data.iter().all(|&b| b == v), "n={n} v={v}");
        }
    }
}

#[test]
fn samples_contribute_equally() {
    let mut acc = AccumulationBuffer::new(canvas()).unwrap();
    for (k, v) in [0u8, 100, 200, 100].into_iter().enumerate() {
        push(&mut acc, k as u32, [v, 0, 255, 255]);
    }
    let out = acc.finalize().unwrap();
    assert_eq!(&out.data[..4], &[100, 0, 255, 255]);
}

#[test]
fn first_sample_overwrites_previous_frame() {
    let mut acc = AccumulationBuffer::new(canvas()).unwrap();
    push(&mut acc, 0, [200, 200, 200, 255]);
    push(&mut acc, 1, [100, 100, 100, 255]);
    acc.end_frame();
    push(&mut acc, 0, [10, 20, 30, 40]);
    let out = acc.finalize().unwrap();
    assert_eq!(&out.data[..4], &[10, 20, 30, 40]);
}

#[test]
fn active_index_flips_every_blend() {
    let mut acc = AccumulationBuffer::new(canvas()).unwrap();
    assert_eq!(acc.active_index(), 0);
    push(&mut acc, 0, [1, 1, 1, 1]);
    assert_eq!(acc.active_index(), 1);
    push(&mut acc, 1, [1, 1, 1, 1]);
    assert_eq!(acc.active_index(), 0);
}

#[test]
fn begin_sample_leaves_accumulation_untouched() {
    let mut acc = AccumulationBuffer::new(canvas()).unwrap();
    push(&mut acc, 0, [50, 50, 50, 50]);
    acc.begin_sample().fill([255, 255, 255, 255]);
    let out = acc.finalize().unwrap();
    assert!(out.data.iter().all(|&b| b == 50));
}

#[test]
fn finalize_before_first_blend_fails() {
    let mut acc = AccumulationBuffer::new(canvas()).unwrap();
    assert!(matches!(acc.finalize(), Err(RenderError::InvalidState(_))));
    push(&mut acc, 0, [9, 9, 9, 9]);
    acc.clear_to_black();
    assert!(matches!(acc.finalize(), Err(RenderError::InvalidState(_))));
}

#[test]
fn non_first_blend_into_empty_frame_is_rejected() {
    let mut acc = AccumulationBuffer::new(canvas()).unwrap();
    acc.begin_sample().fill([1, 2, 3, 4]);
    assert!(matches!(
        acc.blend_sample(0.5, false),
        Err(RenderError::InvalidState(_))
    ));
}

#[test]
fn resized_scratch_is_rejected() {
    let mut acc = AccumulationBuffer::new(canvas()).unwrap();
    acc.begin_sample().data.truncate(4);
    assert!(matches!(
        acc.blend_sample(1.0, true),
        Err(RenderError::Camera(_))
    ));
}

#[test]
fn release_drops_storage() {
    let mut acc = AccumulationBuffer::new(canvas()).unwrap();
    acc.release();
    assert!(acc.is_released());
    assert!(acc.finalize().is_err());
}

#[test]
fn empty_canvas_fails_allocation() {
    let err = AccumulationBuffer::new(Canvas {
        width: 0,
        height: 4,
    })
    .unwrap_err();
    assert!(matches!(err, RenderError::ResourceAllocation(_)));
}
