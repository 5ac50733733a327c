// ---------------------------------------------------------------------------
// native/dominant_colors.rs — Dominant color extraction
// ---------------------------------------------------------------------------

use std::collections::{HashMap, HashSet};

use image::GenericImageView;
use serde::Serialize;
use serde_json::{json, Value};

use crate::provider::{Descriptor, ParamSpec, ProviderError};

pub const NAME: &str = "dominantColors";

/// Larger images are downsampled before analysis.
const ANALYSIS_EDGE: u32 = 256;

/// Bits kept per channel when grouping similar colors.
const QUANT_BITS: u8 = 4;

pub fn descriptor() -> Result<Descriptor, ProviderError> {
    Descriptor::new(
        NAME,
        Some("Finds the most frequent colors of an image"),
        vec![
            ParamSpec::file("image").describe("PNG or JPEG image, uploaded or given as a URL"),
            ParamSpec::ranged("count", 1.0, 4.0, 16.0).describe("Number of colors to return"),
        ],
        json!({
            "type": "object",
            "properties": {
                "frameSize": { "type": "object" },
                "uniqueColors": { "type": "integer" },
                "reducedColors": { "type": "integer" },
                "dominantColors": { "type": "array" }
            }
        }),
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DominantColor {
    color: [u8; 3],
    html: String,
    total_pixels: u64,
}

#[derive(Default)]
struct Bucket {
    pixels: u64,
    sum: [u64; 3],
}

/// Decode `data` and return its `count` most frequent quantized colors.
/// CPU bound; run it off the async runtime.
pub fn analyze(data: &[u8], count: usize) -> Result<Value, ProviderError> {
    let img = image::load_from_memory(data).map_err(|e| ProviderError::InvalidArgument {
        name: "image".to_string(),
        reason: e.to_string(),
    })?;
    let (width, height) = img.dimensions();

    let sample = if width > ANALYSIS_EDGE || height > ANALYSIS_EDGE {
        img.thumbnail(ANALYSIS_EDGE, ANALYSIS_EDGE)
    } else {
        img
    };
    let rgb = sample.to_rgb8();

    let mut unique = HashSet::new();
    let mut buckets: HashMap<[u8; 3], Bucket> = HashMap::new();
    let shift = 8 - QUANT_BITS;
    for px in rgb.pixels() {
        let [r, g, b] = px.0;
        unique.insert([r, g, b]);
        let bucket = buckets.entry([r >> shift, g >> shift, b >> shift]).or_default();
        bucket.pixels += 1;
        bucket.sum[0] += u64::from(r);
        bucket.sum[1] += u64::from(g);
        bucket.sum[2] += u64::from(b);
    }

    let reduced = buckets.len();
    let mut ranked: Vec<([u8; 3], Bucket)> = buckets.into_iter().collect();
    ranked.sort_by(|a, b| b.1.pixels.cmp(&a.1.pixels).then(a.0.cmp(&b.0)));

    let colors: Vec<DominantColor> = ranked
        .into_iter()
        .take(count)
        .map(|(_, bucket)| {
            let mean = |i: usize| (bucket.sum[i] / bucket.pixels) as u8;
            let color = [mean(0), mean(1), mean(2)];
            DominantColor {
                html: format!("#{:02X}{:02X}{:02X}", color[0], color[1], color[2]),
                color,
                total_pixels: bucket.pixels,
            }
        })
        .collect();

    Ok(json!({
        "frameSize": { "width": width, "height": height },
        "uniqueColors": unique.len(),
        "reducedColors": reduced,
        "dominantColors": colors,
    }))
}
