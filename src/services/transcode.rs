use crate::services::batch_downloader::{PipelineError, TrackPipeline};
use crate::services::cover_art::CoverArtFetcher;
use crate::types::{MediaRef, TrackDescriptor};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};

/// Fixed audio-output configuration. The table below is the complete set;
/// preset names arriving in requests must match one of these.
pub(crate) struct QualityPreset {
    pub(crate) name: &'static str,
    /// Output container format: `mp3`, `flac` or `wav`.
    pub(crate) format: &'static str,
    pub(crate) quality: &'static str,
    /// Format hint passed to the downloader.
    pub(crate) ytdl_format: &'static str,
    pub(crate) ffmpeg_options: &'static [&'static str],
}

pub(crate) const DEFAULT_PRESET_NAME: &str = "mp3-320";

pub(crate) const QUALITY_PRESETS: &[QualityPreset] = &[
    QualityPreset {
        name: "mp3-320",
        format: "mp3",
        quality: "320k",
        ytdl_format: "bestaudio",
        ffmpeg_options: &["-c:a", "libmp3lame", "-b:a", "320k"],
    },
    QualityPreset {
        name: "mp3-256",
        format: "mp3",
        quality: "256k",
        ytdl_format: "bestaudio",
        ffmpeg_options: &["-c:a", "libmp3lame", "-b:a", "256k"],
    },
    QualityPreset {
        name: "mp3-192",
        format: "mp3",
        quality: "192k",
        ytdl_format: "bestaudio",
        ffmpeg_options: &["-c:a", "libmp3lame", "-b:a", "192k"],
    },
    QualityPreset {
        name: "flac-24-44",
        format: "flac",
        quality: "24bit-44.1kHz",
        ytdl_format: "bestaudio[acodec=flac]/bestaudio",
        ffmpeg_options: &[
            "-c:a",
            "flac",
            "-compression_level",
            "8",
            "-ar",
            "44100",
            "-sample_fmt",
            "s32",
        ],
    },
    QualityPreset {
        name: "flac-16-44",
        format: "flac",
        quality: "16bit-44.1kHz",
        ytdl_format: "bestaudio",
        ffmpeg_options: &[
            "-c:a",
            "flac",
            "-compression_level",
            "8",
            "-ar",
            "44100",
            "-sample_fmt",
            "s16",
        ],
    },
    QualityPreset {
        name: "wav-24-44",
        format: "wav",
        quality: "24bit-44.1kHz",
        ytdl_format: "bestaudio",
        ffmpeg_options: &["-c:a", "pcm_s24le", "-ar", "44100"],
    },
];

pub(crate) fn find_preset(name: &str) -> Option<&'static QualityPreset> {
    QUALITY_PRESETS.iter().find(|preset| preset.name == name)
}

/// Discovery view of the preset table, exposed through `/config`.
#[derive(Debug, Serialize)]
pub(crate) struct PresetSummary {
    pub(crate) name: &'static str,
    pub(crate) format: &'static str,
    pub(crate) quality: &'static str,
}

pub(crate) fn preset_summaries() -> Vec<PresetSummary> {
    QUALITY_PRESETS
        .iter()
        .map(|preset| PresetSummary {
            name: preset.name,
            format: preset.format,
            quality: preset.quality,
        })
        .collect()
}

/// WAV has no standard attached-picture tag, so artwork is only embedded
/// into mp3 and flac outputs.
fn supports_embedded_art(format: &str) -> bool {
    matches!(format, "mp3" | "flac")
}

fn tag_or_unknown(value: &str) -> &str {
    if value.is_empty() {
        "Unknown"
    } else {
        value
    }
}

/// Builds the full ffmpeg argument list for one track. When `artwork` is
/// present the image goes in as input 1, mapped alongside the audio and
/// flagged as the attached cover picture.
fn build_ffmpeg_args(
    raw_audio: &Path,
    artwork: Option<&Path>,
    preset: &QualityPreset,
    track: &TrackDescriptor,
    output_path: &Path,
) -> Vec<String> {
    let mut args = vec!["-i".to_string(), raw_audio.to_string_lossy().to_string()];

    if let Some(artwork) = artwork {
        args.push("-i".to_string());
        args.push(artwork.to_string_lossy().to_string());
    }

    args.extend(preset.ffmpeg_options.iter().map(|opt| opt.to_string()));

    args.push("-metadata".to_string());
    args.push(format!("title={}", tag_or_unknown(&track.title)));
    args.push("-metadata".to_string());
    args.push(format!("artist={}", tag_or_unknown(&track.artist)));
    args.push("-metadata".to_string());
    args.push(format!("album={}", tag_or_unknown(&track.album)));
    args.push("-metadata".to_string());
    args.push(format!("date={}", track.year));
    args.push("-metadata".to_string());
    args.push(format!(
        "track={}",
        track
            .track_number
            .map(|n| n.to_string())
            .unwrap_or_default()
    ));

    if artwork.is_some() {
        args.extend(
            [
                "-map",
                "0:a",
                "-map",
                "1:0",
                "-c:v",
                "mjpeg",
                "-disposition:v",
                "attached_pic",
            ]
            .map(String::from),
        );
    }

    args.push("-y".to_string());
    args.push(output_path.to_string_lossy().to_string());

    args
}

async fn remove_quietly(path: &Path) {
    if let Err(error) = tokio::fs::remove_file(path).await {
        if !matches!(error.kind(), std::io::ErrorKind::NotFound) {
            warn!(?error, path = %path.display(), "Unable to remove temporary file");
        }
    }
}

/// Fetches raw audio via yt-dlp, then transcodes and tags it with ffmpeg.
/// Temporary artifacts are removed on every exit path.
pub(crate) struct TranscodePipeline {
    cover_art: CoverArtFetcher,
}

impl TranscodePipeline {
    pub(crate) fn new(cover_art: CoverArtFetcher) -> Self {
        Self { cover_art }
    }

    async fn download_raw_audio(
        &self,
        media: &MediaRef,
        preset: &QualityPreset,
        temp_path: &Path,
    ) -> Result<PathBuf, PipelineError> {
        let output = Command::new("yt-dlp")
            .arg("-f")
            .arg(preset.ytdl_format)
            .arg("--extract-audio")
            .arg("--audio-format")
            .arg("best")
            .arg("--no-playlist")
            .arg("-o")
            .arg(temp_path)
            .arg(&media.0)
            .output()
            .await?;

        if !output.status.success() {
            // A failed download may still have left partial files behind.
            for leftover in self.matching_temp_files(temp_path).await.unwrap_or_default() {
                remove_quietly(&leftover).await;
            }

            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(PipelineError::DownloadFailed(stderr));
        }

        // yt-dlp may append a format extension to the requested name, so the
        // actual file is whichever one starts with the temp prefix.
        self.matching_temp_files(temp_path)
            .await?
            .into_iter()
            .next()
            .ok_or(PipelineError::DownloadedFileNotFound)
    }

    async fn matching_temp_files(&self, temp_path: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        let directory = temp_path
            .parent()
            .ok_or(PipelineError::DownloadedFileNotFound)?;
        let prefix = temp_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or(PipelineError::DownloadedFileNotFound)?
            .to_string();

        let mut matches = vec![];
        let mut dir_reader = tokio::fs::read_dir(directory).await?;

        while let Some(entry) = dir_reader.next_entry().await? {
            let file_name = entry.file_name().to_str().unwrap_or_default().to_string();
            if file_name.starts_with(&prefix) {
                matches.push(directory.join(file_name));
            }
        }

        Ok(matches)
    }

    async fn run_transcoder(
        &self,
        raw_audio: &Path,
        artwork: Option<&Path>,
        preset: &QualityPreset,
        track: &TrackDescriptor,
        output_path: &Path,
    ) -> Result<(), PipelineError> {
        let args = build_ffmpeg_args(raw_audio, artwork, preset, track, output_path);

        debug!(?args, "Invoking transcoder");

        let output = Command::new("ffmpeg").args(&args).output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(PipelineError::TranscodeFailed(stderr));
        }

        Ok(())
    }
}

#[async_trait]
impl TrackPipeline for TranscodePipeline {
    async fn produce(
        &self,
        media: &MediaRef,
        track: &TrackDescriptor,
        preset: &QualityPreset,
        output_path: &Path,
    ) -> Result<PathBuf, PipelineError> {
        let temp_path = output_path.with_extension("temp");

        let raw_audio = self.download_raw_audio(media, preset, &temp_path).await?;

        let artwork = if supports_embedded_art(preset.format) {
            let artwork_path = output_path.with_extension("artwork");
            match self
                .cover_art
                .fetch(track.art_url.as_deref(), &artwork_path)
                .await
            {
                Ok(artwork) => artwork,
                Err(error) => {
                    warn!(?error, title = track.title, "Proceeding without cover art");
                    None
                }
            }
        } else {
            None
        };

        let result = self
            .run_transcoder(&raw_audio, artwork.as_deref(), preset, track, output_path)
            .await;

        remove_quietly(&raw_audio).await;
        if let Some(artwork) = &artwork {
            remove_quietly(artwork).await;
        }

        result.map(|_| output_path.to_path_buf())
    }
}
