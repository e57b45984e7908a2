//! Run the detectors over a PNG screenshot with the stock profile.
//!
//! Usage: `probe <screenshot.png> [annotated.png]`
//!
//! Prints every bar, label and marker it finds; with a second path, writes a
//! copy of the screenshot with the detections outlined. Meant for tuning
//! colors and regions against stills captured from the client.

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use vision::mobs::{detect_mobs, MobProfile};
use vision::vitals::{BarPalettes, Vitals};
use vision::{Color, Frame};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let input = args
        .next()
        .context("usage: probe <screenshot.png> [annotated.png]")?;
    let annotated = args.next();

    let bytes = std::fs::read(&input).with_context(|| format!("read {input}"))?;
    let mut frame = Frame::from_png(&bytes)?;
    info!(width = frame.width(), height = frame.height(), "loaded {input}");

    let now = Instant::now();
    let mut vitals = Vitals::new(BarPalettes::default());
    vitals.refresh(&frame, now);

    for bar in [
        &vitals.hp,
        &vitals.mp,
        &vitals.fp,
        &vitals.target_hp,
        &vitals.target_mp,
    ] {
        info!(
            bar = bar.kind().name(),
            detected = bar.is_detected(),
            percent = bar.percent(),
            bounds = ?bar.last_bounds(),
            "bar"
        );
    }
    info!(alive = ?vitals.alive(), "player");

    match vitals.target_marker() {
        Some(m) => info!(centroid = ?m.centroid, pixels = m.pixels, "marker"),
        None => info!("no marker"),
    }

    let profile = MobProfile::default();
    let mobs = detect_mobs(&frame, &profile);
    info!(count = mobs.len(), "labels");
    for mob in &mobs {
        info!(kind = mob.kind.name(), bounds = ?mob.bounds, anchor = ?mob.attack_anchor(), "label");
    }

    if let Some(path) = annotated {
        for mob in &mobs {
            frame.draw_rect(mob.bounds.grown(2), Color::WHITE);
        }
        for bar in [
            &vitals.hp,
            &vitals.mp,
            &vitals.fp,
            &vitals.target_hp,
            &vitals.target_mp,
        ] {
            if let Some(b) = bar.last_bounds() {
                frame.draw_rect(b.grown(2), Color::BLACK);
            }
        }
        frame.save_png(&path)?;
        info!("annotated copy written to {path}");
    }

    Ok(())
}
