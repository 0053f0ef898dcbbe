use crate::encode::sink::{AudioSink, FrameSink, SinkConfig, check_audio_len, check_frame_order};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{RenderError, RenderResult};
use crate::render::frame::FrameRGBA;
use crate::session::config::{MAX_ENCODING_QUALITY, VideoCodec};
use std::fs::File;
use std::io::{BufWriter, Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

/// Options for [`FfmpegSink`] output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output video file path.
    pub out_path: PathBuf,
    /// Overwrite output file if it already exists.
    pub overwrite: bool,
}

impl FfmpegSinkOpts {
    /// Create options for writing a video to `out_path`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
        }
    }
}

/// Muxed-video sink that spawns the system `ffmpeg` and streams raw frames to its stdin.
///
/// Video is encoded into a sibling temporary file while audio is spooled to raw `f32le`. On
/// [`FrameSink::end`] the two are muxed into `out_path` with a second `ffmpeg` pass, or the video
/// is moved into place when no audio arrived.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    audio_spool: Option<BufWriter<File>>,
    audio_samples: u64,

    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
    finalized: bool,
}

impl FfmpegSink {
    /// Create a new sink that streams into `ffmpeg`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            audio_spool: None,
            audio_samples: 0,
            cfg: None,
            last_idx: None,
            finalized: true,
        }
    }

    fn video_tmp_path(&self) -> PathBuf {
        sibling_path(&self.opts.out_path, "video", &output_extension(&self.opts.out_path))
    }

    fn audio_tmp_path(&self) -> PathBuf {
        sibling_path(&self.opts.out_path, "audio", "f32le")
    }

    /// Stop a running encoder and remove temporary files left by an unfinished session.
    fn abandon(&mut self) {
        drop(self.stdin.take());
        drop(self.audio_spool.take());
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                tracing::debug!(error = %e, "ffmpeg already exited");
            }
            if let Err(e) = child.wait() {
                tracing::warn!(error = %e, "failed to reap ffmpeg");
            }
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
        for path in [self.video_tmp_path(), self.audio_tmp_path()] {
            if path.exists() {
                remove_quietly(&path);
            }
        }
        self.cfg = None;
        self.finalized = true;
        tracing::warn!(
            out = %self.opts.out_path.display(),
            "ffmpeg sink dropped before end; discarded partial output"
        );
    }

    fn mux_audio(&self, cfg: &SinkConfig, video: &Path, audio: &Path) -> RenderResult<()> {
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(video)
            .args([
                "-f",
                "f32le",
                "-ar",
                &cfg.audio.sample_rate.to_string(),
                "-ac",
                &cfg.audio.channels.to_string(),
                "-i",
            ])
            .arg(audio)
            .args(["-c:v", "copy", "-c:a", "aac", "-shortest", "-movflags", "+faststart"])
            .arg(&self.opts.out_path);

        let out = cmd
            .output()
            .map_err(|e| RenderError::sink_write(format!("failed to spawn ffmpeg mux pass: {e}")))?;
        if !out.status.success() {
            return Err(RenderError::sink_write(format!(
                "ffmpeg mux pass exited with status {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> RenderResult<()> {
        cfg.fps.validate()?;
        if cfg.width == 0 || cfg.height == 0 {
            return Err(RenderError::configuration(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(RenderError::configuration(
                "ffmpeg sink width/height must be even (required for yuv420p output)",
            ));
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(RenderError::configuration(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(RenderError::sink_write(
                "ffmpeg is required for muxed video output, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .arg("-y");

        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0", "-an"]);
        cmd.args(encoder_args(cfg.codec, cfg.encoding_quality));
        cmd.arg(self.video_tmp_path());

        let mut child = cmd.spawn().map_err(|e| {
            RenderError::sink_write(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RenderError::sink_write("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| RenderError::sink_write("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(
            out = %self.opts.out_path.display(),
            codec = ?cfg.codec,
            quality = cfg.encoding_quality,
            "spawned ffmpeg encoder"
        );

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.audio_spool = None;
        self.audio_samples = 0;
        self.cfg = Some(cfg);
        self.last_idx = None;
        self.finalized = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> RenderResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| RenderError::sink_write("ffmpeg sink not started"))?;
        check_frame_order(self.last_idx, idx)?;
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(RenderError::sink_write(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(RenderError::sink_write("ffmpeg sink is already finalized"));
        };
        stdin.write_all(&frame.data).map_err(|e| {
            RenderError::sink_write(format!("failed to write frame to ffmpeg stdin: {e}"))
        })
    }

    fn end(&mut self) -> RenderResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| RenderError::sink_write("ffmpeg sink not started"))?;
        let cfg = self
            .cfg
            .take()
            .ok_or_else(|| RenderError::sink_write("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            RenderError::sink_write(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| RenderError::sink_write("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| RenderError::sink_write(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(RenderError::sink_write(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        let video = self.video_tmp_path();
        let audio = self.audio_tmp_path();
        if let Some(mut spool) = self.audio_spool.take() {
            spool
                .flush()
                .map_err(|e| RenderError::sink_write(format!("failed to flush audio spool: {e}")))?;
            drop(spool);
            self.mux_audio(&cfg, &video, &audio)?;
            remove_quietly(&video);
            remove_quietly(&audio);
        } else {
            std::fs::rename(&video, &self.opts.out_path).map_err(|e| {
                RenderError::sink_write(format!(
                    "failed to move '{}' to '{}': {e}",
                    video.display(),
                    self.opts.out_path.display()
                ))
            })?;
        }

        self.finalized = true;
        tracing::info!(
            out = %self.opts.out_path.display(),
            frames = self.last_idx.map_or(0, |i| i.0 + 1),
            audio_samples = self.audio_samples,
            "ffmpeg output finalized"
        );
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if !self.finalized {
            self.abandon();
        }
    }
}

impl AudioSink for FfmpegSink {
    fn push_audio(&mut self, samples: &[f32], sample_count: usize) -> RenderResult<()> {
        let channels = self
            .cfg
            .as_ref()
            .map(|c| c.audio.channels)
            .ok_or_else(|| RenderError::sink_write("ffmpeg sink not started"))?;
        check_audio_len(samples, sample_count, channels)?;

        if self.audio_spool.is_none() {
            let path = self.audio_tmp_path();
            let file = File::create(&path).map_err(|e| {
                RenderError::sink_write(format!(
                    "failed to create audio spool '{}': {e}",
                    path.display()
                ))
            })?;
            self.audio_spool = Some(BufWriter::new(file));
        }
        let Some(spool) = self.audio_spool.as_mut() else {
            return Err(RenderError::sink_write("audio spool unavailable"));
        };
        for &s in samples {
            spool
                .write_all(&s.to_le_bytes())
                .map_err(|e| RenderError::sink_write(format!("failed to spool audio: {e}")))?;
        }
        self.audio_samples += sample_count as u64;
        Ok(())
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` sets the input framerate as an exact rational.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// Encoder arguments for `codec`, mapping quality `[0, 100]` onto the encoder's CRF scale.
pub(crate) fn encoder_args(codec: VideoCodec, quality: u8) -> Vec<String> {
    let (encoder, crf_max, extra): (&str, u32, &[&str]) = match codec {
        VideoCodec::H264 => ("libx264", 51, &[]),
        VideoCodec::Hevc => ("libx265", 51, &["-tag:v", "hvc1"]),
        VideoCodec::Vp9 => ("libvpx-vp9", 63, &["-b:v", "0"]),
    };
    let q = u32::from(quality.min(MAX_ENCODING_QUALITY));
    let crf = crf_max - (q * crf_max + 50) / 100;

    let mut args: Vec<String> = vec![
        "-c:v".into(),
        encoder.into(),
        "-crf".into(),
        crf.to_string(),
        "-pix_fmt".into(),
        "yuv420p".into(),
    ];
    args.extend(extra.iter().map(|s| s.to_string()));
    args
}

fn output_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp4")
        .to_string()
}

fn sibling_path(out: &Path, tag: &str, ext: &str) -> PathBuf {
    let stem = out
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    out.with_file_name(format!(".{stem}.{tag}.{ext}"))
}

fn remove_quietly(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove temporary file");
    }
}

fn ensure_parent_dir(path: &Path) -> RenderResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
