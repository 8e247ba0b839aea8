// src/source/mod.rs

//! Single-channel sample stream decoded from an audio file.

use anyhow::{anyhow, bail, Context, Result};
use log::warn;
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

/// Stream facts known up front from the container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceInfo {
    pub sample_rate: u32,
    pub channels: usize,
    /// Frames per channel, when the container declares it.
    pub total_frames: Option<u64>,
}

impl SourceInfo {
    pub fn duration_secs(&self) -> Option<f64> {
        self.total_frames
            .map(|n| n as f64 / self.sample_rate.max(1) as f64)
    }
}

/// Forward-only iterator over one channel of a decoded file.
///
/// Finite and single-pass: once drained it stays empty, and reading again
/// means opening the file again.
pub struct FileSource {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    channel: usize,
    info: SourceInfo,
    sample_buf: Option<SampleBuffer<f32>>,
    sample_buf_frames: usize,
    pending: Vec<f32>,
    pos: usize,
    skip: u64,
    done: bool,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>, channel: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }
        let probed = get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| anyhow!("no default audio track in {}", path.display()))?;
        let track_id = track.id;
        let params = &track.codec_params;

        let channels = params.channels.map(|c| c.count()).unwrap_or(0);
        if channels > 0 && channel >= channels {
            bail!("channel {channel} out of range ({channels} channels)");
        }
        let info = SourceInfo {
            sample_rate: params.sample_rate.unwrap_or(44100),
            channels,
            total_frames: params.n_frames,
        };
        let decoder = get_codecs().make(params, &DecoderOptions::default())?;

        Ok(Self {
            format,
            decoder,
            track_id,
            channel,
            info,
            sample_buf: None,
            sample_buf_frames: 0,
            pending: Vec::new(),
            pos: 0,
            skip: 0,
            done: false,
        })
    }

    /// Opens the file positioned at absolute frame `start`.
    pub fn open_at(path: impl AsRef<Path>, channel: usize, start: u64) -> Result<Self> {
        let mut source = Self::open(path, channel)?;
        if start > 0 {
            source.seek_to(start)?;
        }
        Ok(source)
    }

    pub fn info(&self) -> SourceInfo {
        self.info
    }

    pub fn channel(&self) -> usize {
        self.channel
    }

    fn seek_to(&mut self, frame: u64) -> Result<()> {
        let seeked = self.format.seek(
            SeekMode::Accurate,
            SeekTo::TimeStamp {
                ts: frame,
                track_id: self.track_id,
            },
        )?;
        self.decoder.reset();
        self.pending.clear();
        self.pos = 0;
        // The reader may land before the target; drop the difference.
        self.skip = seeked.required_ts.saturating_sub(seeked.actual_ts);
        Ok(())
    }

    /// Decodes the next packet of our track into `pending`.
    fn refill(&mut self) {
        self.pending.clear();
        self.pos = 0;

        let packet = match self.format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(_)) | Err(SymphoniaError::ResetRequired) => {
                self.done = true;
                return;
            }
            Err(e) => {
                warn!("stopping decode: {e}");
                self.done = true;
                return;
            }
        };
        if packet.track_id() != self.track_id {
            return;
        }

        let decoded = match self.decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::IoError(_)) | Err(SymphoniaError::DecodeError(_)) => {
                warn!("skipping undecodable packet at ts {}", packet.ts());
                return;
            }
            Err(e) => {
                warn!("stopping decode: {e}");
                self.done = true;
                return;
            }
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count();
        if self.channel >= channels {
            warn!("channel {} missing from packet with {channels} channels", self.channel);
            self.done = true;
            return;
        }
        if decoded.capacity() > self.sample_buf_frames || self.sample_buf.is_none() {
            self.sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
            self.sample_buf_frames = decoded.capacity();
        }
        let Some(buf) = self.sample_buf.as_mut() else {
            return;
        };
        buf.copy_interleaved_ref(decoded);
        self.pending.extend(
            buf.samples()
                .iter()
                .skip(self.channel)
                .step_by(channels)
                .copied(),
        );

        if self.skip > 0 {
            let drop = (self.skip as usize).min(self.pending.len());
            self.pos = drop;
            self.skip -= drop as u64;
        }
    }
}

impl Iterator for FileSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        loop {
            if let Some(&s) = self.pending.get(self.pos) {
                self.pos += 1;
                return Some(s);
            }
            if self.done {
                return None;
            }
            self.refill();
        }
    }
}

/// Reads the container header only.
pub fn probe(path: impl AsRef<Path>) -> Result<SourceInfo> {
    Ok(FileSource::open(path, 0)?.info())
}

/// Up to `count` raw samples of `channel` starting at absolute frame
/// `offset`. Used when a zoom is finer than the pyramid's leaf.
pub fn read_window(path: impl AsRef<Path>, channel: usize, offset: u64, count: usize) -> Result<Vec<f32>> {
    let mut source = FileSource::open(path, channel)?;
    if source.info().total_frames.is_some_and(|n| offset >= n) {
        return Ok(Vec::new());
    }
    if offset > 0 {
        source.seek_to(offset)?;
    }
    Ok(source.take(count).collect())
}
