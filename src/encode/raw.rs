use crate::encode::sink::{AudioSink, FrameSink, SinkConfig, check_audio_len, check_frame_order};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{RenderError, RenderResult};
use crate::render::frame::FrameRGBA;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// File name of the wave file written next to the image sequence.
pub const RAW_AUDIO_FILE_NAME: &str = "audio.wav";

/// File name of the PNG written for output frame `idx`.
pub fn raw_frame_file_name(idx: FrameIndex) -> String {
    format!("frame_{:06}.png", idx.0)
}

/// Raw export sink: one PNG per output frame plus a 32-bit float WAV of the audio stream.
pub struct RawExportSink {
    dir: PathBuf,
    wav: Option<hound::WavWriter<BufWriter<File>>>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl RawExportSink {
    /// Create a sink writing into directory `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            wav: None,
            cfg: None,
            last_idx: None,
        }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FrameSink for RawExportSink {
    fn begin(&mut self, cfg: SinkConfig) -> RenderResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            RenderError::sink_write(format!(
                "failed to create export directory '{}': {e}",
                self.dir.display()
            ))
        })?;

        let wav_path = self.dir.join(RAW_AUDIO_FILE_NAME);
        let spec = hound::WavSpec {
            channels: cfg.audio.channels,
            sample_rate: cfg.audio.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let wav = hound::WavWriter::create(&wav_path, spec).map_err(|e| {
            RenderError::sink_write(format!(
                "failed to create wave file '{}': {e}",
                wav_path.display()
            ))
        })?;

        self.wav = Some(wav);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> RenderResult<()> {
        if self.cfg.is_none() {
            return Err(RenderError::sink_write("raw export sink not started"));
        }
        check_frame_order(self.last_idx, idx)?;
        self.last_idx = Some(idx);

        let path = self.dir.join(raw_frame_file_name(idx));
        image::save_buffer_with_format(
            &path,
            &frame.data,
            frame.width,
            frame.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .map_err(|e| {
            RenderError::sink_write(format!("failed to write png '{}': {e}", path.display()))
        })
    }

    fn end(&mut self) -> RenderResult<()> {
        self.cfg = None;
        let Some(wav) = self.wav.take() else {
            return Err(RenderError::sink_write("raw export sink not started"));
        };
        wav.finalize()
            .map_err(|e| RenderError::sink_write(format!("failed to finalize wave file: {e}")))?;
        tracing::info!(
            dir = %self.dir.display(),
            frames = self.last_idx.map_or(0, |i| i.0 + 1),
            "raw export finalized"
        );
        Ok(())
    }
}

impl AudioSink for RawExportSink {
    fn push_audio(&mut self, samples: &[f32], sample_count: usize) -> RenderResult<()> {
        let channels = self
            .cfg
            .as_ref()
            .map(|c| c.audio.channels)
            .ok_or_else(|| RenderError::sink_write("raw export sink not started"))?;
        check_audio_len(samples, sample_count, channels)?;
        let Some(wav) = self.wav.as_mut() else {
            return Err(RenderError::sink_write("raw export sink not started"));
        };
        for &s in samples {
            wav.write_sample(s)
                .map_err(|e| RenderError::sink_write(format!("failed to append audio: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/raw.rs"]
mod tests;
