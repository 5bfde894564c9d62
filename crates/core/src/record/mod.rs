use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use serde::{Deserialize, Serialize};

use crate::{render::Renderer, FieldError, Result};

/// Configuration options for the recording subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSettings {
    pub output_path: PathBuf,
    /// Only every n-th presented frame is written.
    pub every_nth: u32,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("frames.jsonl"),
            every_nth: 1,
        }
    }
}

#[derive(Serialize)]
struct RecordedFrame<'a, F> {
    frame: u64,
    data: &'a F,
}

/// Writes presented frames as JSON lines so a run can be replayed or
/// inspected offline.
#[derive(Debug)]
pub struct Recorder {
    settings: RecordingSettings,
    writer: Option<BufWriter<File>>,
    presented: u64,
    written: u64,
}

impl Recorder {
    pub fn new(settings: RecordingSettings) -> Self {
        Self {
            settings,
            writer: None,
            presented: 0,
            written: 0,
        }
    }

    pub fn start(&mut self) -> Result<()> {
        if self.settings.every_nth == 0 {
            return Err(FieldError::InvalidInput("every_nth must be at least 1"));
        }
        let file = File::create(&self.settings.output_path)?;
        self.writer = Some(BufWriter::new(file));
        self.presented = 0;
        self.written = 0;
        tracing::info!(path = %self.settings.output_path.display(), "recording started");
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            tracing::info!(frames = self.written, "recording stopped");
        }
        Ok(())
    }

    pub fn is_recording(&self) -> bool {
        self.writer.is_some()
    }

    pub fn frames_written(&self) -> u64 {
        self.written
    }
}

impl<F: Serialize> Renderer<F> for Recorder {
    fn present(&mut self, frame: &F) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        let index = self.presented;
        self.presented += 1;
        if index % u64::from(self.settings.every_nth) != 0 {
            return Ok(());
        }

        serde_json::to_writer(&mut *writer, &RecordedFrame { frame: index, data: frame })?;
        writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            tracing::warn!(%err, "failed to flush recording");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DrawList;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("unity-field-{}-{name}.jsonl", std::process::id()))
    }

    #[test]
    fn writes_every_nth_frame_as_json_lines() {
        let path = temp_path("nth");
        let mut recorder = Recorder::new(RecordingSettings {
            output_path: path.clone(),
            every_nth: 2,
        });
        recorder.start().unwrap();
        for _ in 0..5 {
            recorder.present(&DrawList::new()).unwrap();
        }
        recorder.stop().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let frames: Vec<u64> = contents
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                value["frame"].as_u64().unwrap()
            })
            .collect();
        assert_eq!(frames, vec![0, 2, 4]);
        assert_eq!(recorder.frames_written(), 3);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn ignores_frames_when_not_recording() {
        let mut recorder = Recorder::new(RecordingSettings {
            output_path: temp_path("idle"),
            every_nth: 1,
        });
        recorder.present(&DrawList::new()).unwrap();
        assert!(!recorder.is_recording());
        assert_eq!(recorder.frames_written(), 0);
    }

    #[test]
    fn rejects_zero_stride() {
        let mut recorder = Recorder::new(RecordingSettings {
            output_path: temp_path("zero"),
            every_nth: 0,
        });
        assert!(matches!(recorder.start(), Err(FieldError::InvalidInput(_))));
    }
}
