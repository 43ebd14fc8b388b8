//! Source metadata via ffprobe: native dimensions and nominal frame
//! rate, queried once at session start.

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, Context, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// Probe the first video stream of `input`. Expects compact key=val
/// output, e.g. `width=640,height=480,r_frame_rate=30000/1001`.
pub fn probe_metadata(input: &Path) -> Result<VideoMetadata> {
    let output = Command::new("ffprobe")
        .args(["-v", "error"])
        .args(["-select_streams", "v:0"])
        .args(["-show_entries", "stream=width,height,r_frame_rate"])
        .args(["-print_format", "compact=print_section=0:item_sep=,"])
        .arg(input)
        .output()
        .context("failed to run ffprobe")?;

    if !output.status.success() {
        return Err(anyhow!(
            "ffprobe failed for {}: {}",
            input.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    let stdout = String::from_utf8(output.stdout).context("ffprobe output was not UTF-8")?;
    parse_probe_output(&stdout)
        .with_context(|| format!("unexpected ffprobe output for {}", input.display()))
}

fn parse_probe_output(output: &str) -> Result<VideoMetadata> {
    let mut fields = HashMap::new();
    for part in output.trim().replace('\n', ",").split(',') {
        if let Some((key, value)) = part.split_once('=') {
            fields.insert(key.trim().to_owned(), value.trim().to_owned());
        }
    }

    let width = fields
        .get("width")
        .ok_or_else(|| anyhow!("missing width"))?
        .parse::<u32>()
        .context("bad width")?;
    let height = fields
        .get("height")
        .ok_or_else(|| anyhow!("missing height"))?
        .parse::<u32>()
        .context("bad height")?;
    let fps = parse_frame_rate(
        fields
            .get("r_frame_rate")
            .ok_or_else(|| anyhow!("missing r_frame_rate"))?,
    )?;

    if width == 0 || height == 0 {
        return Err(anyhow!("zero-sized video stream ({width}x{height})"));
    }

    Ok(VideoMetadata { width, height, fps })
}

/// ffprobe reports the rate as a fraction, e.g. `30/1` or `30000/1001`.
fn parse_frame_rate(value: &str) -> Result<f64> {
    let (num, den) = value
        .split_once('/')
        .ok_or_else(|| anyhow!("frame rate '{value}' is not a fraction"))?;
    let num = num.parse::<f64>().context("bad frame rate numerator")?;
    let den = den.parse::<f64>().context("bad frame rate denominator")?;
    if den <= 0.0 || num <= 0.0 {
        return Err(anyhow!("non-positive frame rate '{value}'"));
    }
    Ok(num / den)
}
