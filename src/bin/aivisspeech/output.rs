use std::io::Write;
use std::path::Path;

use aivisspeech_node::WavSummary;
use serde::Serialize;

/// Writes audio to `path`, or to stdout when no path is given.
pub(crate) fn write_audio(wav: &[u8], path: Option<&Path>) -> anyhow::Result<()> {
    match WavSummary::read(wav) {
        Ok(summary) => log::info!(
            "Audio: {} Hz, {} ch, {:.2} s",
            summary.sample_rate,
            summary.channels,
            summary.duration_seconds
        ),
        Err(e) => log::warn!("Engine returned audio that is not a readable WAV: {}", e),
    }

    match path {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::write(path, wav)?;
            log::info!("Wrote {} bytes to {}", wav.len(), path.display());
        },
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(wav)?;
            stdout.flush()?;
        },
    }

    Ok(())
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    std::io::stdout().write_all(json.as_bytes())?;
    Ok(())
}
