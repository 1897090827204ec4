// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Background music is an opaque collaborator: the engine calls `play`
//! once, `stop` once, and otherwise never looks at it again. A missing or
//! unsupported audio file is never a [`crate::error::ClipError`] — playback
//! degrades to silence.

pub trait AudioSink: Send + Sync {
    fn play(&self);
    fn stop(&self);
}

/// The default sink when no `--music` path was given, or the `audio`
/// feature isn't compiled in.
pub struct NullAudioSink;

impl AudioSink for NullAudioSink {
    fn play(&self) {}
    fn stop(&self) {}
}

#[cfg(feature = "audio")]
pub struct RodioAudioSink {
    _stream: rodio::OutputStream,
    sink: rodio::Sink,
}

#[cfg(feature = "audio")]
impl RodioAudioSink {
    pub fn try_new(path: &std::path::Path) -> std::io::Result<Self> {
        let (stream, handle) = rodio::OutputStream::try_default()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        let sink = rodio::Sink::try_new(&handle).map_err(|e| std::io::Error::other(e.to_string()))?;
        let file = std::fs::File::open(path)?;
        let source = rodio::Decoder::new(std::io::BufReader::new(file))
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        sink.append(source);
        sink.pause();
        Ok(Self { _stream: stream, sink })
    }
}

#[cfg(feature = "audio")]
impl AudioSink for RodioAudioSink {
    fn play(&self) {
        self.sink.play();
    }

    fn stop(&self) {
        self.sink.stop();
    }
}

/// Builds the best available sink for `music_path`: a real decoder when the
/// `audio` feature is on and a path was given, otherwise silence. Any
/// failure to open/decode the file is logged and swallowed.
#[must_use]
pub fn build(music_path: Option<&std::path::Path>) -> Box<dyn AudioSink> {
    #[cfg(feature = "audio")]
    {
        if let Some(path) = music_path {
            match RodioAudioSink::try_new(path) {
                Ok(sink) => return Box::new(sink),
                Err(error) => {
                    tracing::warn!(%error, path = %path.display(), "failed to open audio track; continuing without sound");
                }
            }
        }
    }
    #[cfg(not(feature = "audio"))]
    {
        if music_path.is_some() {
            tracing::debug!("music path given but built without the `audio` feature; ignoring");
        }
    }
    Box::new(NullAudioSink)
}
