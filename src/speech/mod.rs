mod command;

use anyhow::{anyhow, Context, Result};
use std::ffi::OsString;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::tempdir;
use tracing::info;

use crate::languages::Language;
use crate::settings::Settings;

use command::command_exists;

pub const WAV_MIME: &str = "audio/wav";

const ENGINE_CANDIDATES: &[&str] = &["espeak-ng", "espeak"];

#[derive(Debug, Clone)]
pub struct SpeechAudio {
    pub wav: Vec<u8>,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_ms: u64,
}

/// Configured engine, or the first espeak flavour found on `PATH`.
pub fn resolve_engine(settings: &Settings) -> Result<String> {
    if let Some(engine) = settings.speech_engine.as_deref() {
        if command_exists(engine) {
            return Ok(engine.to_string());
        }
        return Err(anyhow!("speech engine '{}' not found on PATH", engine));
    }
    ENGINE_CANDIDATES
        .iter()
        .find(|candidate| command_exists(candidate))
        .map(|candidate| candidate.to_string())
        .ok_or_else(|| anyhow!("no TTS engine found (install 'espeak-ng' or 'espeak')"))
}

pub fn voice_for(language: Language, settings: &Settings) -> String {
    settings
        .speech_voices
        .get(language.code())
        .cloned()
        .unwrap_or_else(|| language.espeak_voice().to_string())
}

/// Reads the text aloud on this machine.
pub fn speak(text: &str, language: Language, settings: &Settings) -> Result<()> {
    let text = require_text(text)?;
    let engine = resolve_engine(settings)?;
    let voice = voice_for(language, settings);
    info!("speech: {} voice {} ({} chars)", engine, voice, text.chars().count());
    run_engine(&engine, engine_args(&voice, settings.speech_rate, None, text))
}

/// Renders the text to WAV for playback elsewhere (e.g. the browser).
pub fn synthesize(text: &str, language: Language, settings: &Settings) -> Result<SpeechAudio> {
    let text = require_text(text)?;
    let engine = resolve_engine(settings)?;
    let voice = voice_for(language, settings);

    let dir = tempdir().with_context(|| "failed to create temp dir for speech")?;
    let out_wav = dir.path().join("speech.wav");
    run_engine(
        &engine,
        engine_args(&voice, settings.speech_rate, Some(&out_wav), text),
    )?;
    let wav = fs::read(&out_wav)
        .with_context(|| format!("failed to read synthesized audio: {}", out_wav.display()))?;
    let audio = inspect_wav(wav)?;
    info!(
        "speech: synthesized {} ms at {} Hz with {} voice {}",
        audio.duration_ms, audio.sample_rate, engine, voice
    );
    Ok(audio)
}

pub fn write_wav(audio: &SpeechAudio, path: &Path) -> Result<()> {
    fs::write(path, &audio.wav)
        .with_context(|| format!("failed to write audio: {}", path.display()))
}

pub(crate) fn inspect_wav(wav: Vec<u8>) -> Result<SpeechAudio> {
    let (spec, frames) = {
        let reader = hound::WavReader::new(Cursor::new(wav.as_slice()))
            .with_context(|| "engine produced invalid WAV")?;
        (reader.spec(), u64::from(reader.duration()))
    };
    if spec.sample_rate == 0 || spec.channels == 0 {
        return Err(anyhow!("engine produced WAV without samples"));
    }
    let duration_ms = frames * 1000 / u64::from(spec.sample_rate);
    Ok(SpeechAudio {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        duration_ms,
        wav,
    })
}

fn require_text(text: &str) -> Result<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(anyhow!("nothing to speak"));
    }
    Ok(text)
}

fn engine_args(voice: &str, rate: u32, out_wav: Option<&Path>, text: &str) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-v".into(),
        voice.into(),
        "-s".into(),
        rate.to_string().into(),
    ];
    if let Some(path) = out_wav {
        args.push("-w".into());
        args.push(path.as_os_str().to_os_string());
    }
    // Keeps leading dashes in the text from being read as flags.
    args.push("--".into());
    args.push(text.into());
    args
}

fn run_engine(engine: &str, args: Vec<OsString>) -> Result<()> {
    let output = Command::new(engine)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("failed to run {}", engine))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("{} failed to synthesize audio: {}", engine, stderr.trim()));
    }
    Ok(())
}
