mod sample;

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use flipbook_engine::image::DecodeQueue;
use flipbook_engine::logging::{init_logging, LoggingConfig};
use flipbook_engine::sprite::{FramesSpec, SizeSpec, SpriteManifest, SpriteResource};
use flipbook_engine::time::{FrameScheduler, HostClock, ManualHost, SchedulerOptions};

/// Plays a sprite sheet headlessly and logs the animation.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// Image file of the sprite sheet.
    #[arg(long, value_name = "PATH")]
    src: Option<String>,

    /// JSON sprite manifest (`src` plus options). Flags override its values.
    #[arg(long, value_name = "PATH")]
    manifest: Option<PathBuf>,

    #[arg(long)]
    fps: Option<f64>,

    /// Frame count ("4") or play order ("0,1,2,1").
    #[arg(long, value_parser = parse_frames)]
    frames: Option<FramesSpec>,

    /// Tile size: "32" or "WIDTHxHEIGHT".
    #[arg(long, value_parser = parse_size)]
    size: Option<SizeSpec>,

    /// Do not decode until playback needs the image.
    #[arg(long)]
    lazy: bool,

    /// How long to play, in seconds.
    #[arg(long, default_value_t = 3.0)]
    seconds: f64,

    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    refresh_hz: u32,

    /// Report ticks per second once a second.
    #[arg(long)]
    measure_fps: bool,

    /// Log filter, e.g. "debug" or "flipbook_engine::sprite=trace".
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,

    /// Write a generated sample sheet to PATH and play it.
    #[arg(long, value_name = "PATH")]
    write_sample: Option<PathBuf>,
}

fn parse_frames(text: &str) -> Result<FramesSpec, String> {
    if text.contains(',') {
        text.split(',')
            .map(|frame| {
                frame
                    .trim()
                    .parse::<u32>()
                    .map_err(|e| format!("invalid frame '{frame}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(FramesSpec::from)
    } else {
        text.trim()
            .parse::<u32>()
            .map(FramesSpec::from)
            .map_err(|e| format!("invalid frame count '{text}': {e}"))
    }
}

fn parse_size(text: &str) -> Result<SizeSpec, String> {
    match text.split_once('x') {
        Some((width, height)) => Ok(SizeSpec::dimensions(height.trim(), width.trim())),
        None => Ok(SizeSpec::from(text.trim())),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        env_filter: cli.log.clone(),
        ..LoggingConfig::default()
    });

    if !cli.seconds.is_finite() || cli.seconds < 0.0 {
        bail!("--seconds must be a non-negative number (got {})", cli.seconds);
    }

    let queue = DecodeQueue::from_files();
    let sprite = Rc::new(RefCell::new(build_sprite(&cli, &queue)?));

    preload(&sprite, &queue)?;
    play(&cli, &sprite, &queue)
}

fn build_sprite(cli: &Cli, queue: &DecodeQueue) -> Result<SpriteResource> {
    let mut manifest = match &cli.manifest {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading manifest {}", path.display()))?;
            SpriteManifest::parse(&text)
                .with_context(|| format!("parsing manifest {}", path.display()))?
        }
        None => SpriteManifest::default(),
    };

    if let Some(path) = &cli.write_sample {
        sample::write_strip(path, sample::SAMPLE_FRAMES, sample::SAMPLE_TILE)
            .with_context(|| format!("writing sample sheet {}", path.display()))?;
        log::info!("sample sheet written to {}", path.display());

        manifest.src = path.display().to_string();
        let options = &mut manifest.options;
        options.fps.get_or_insert(8.0.into());
        options.frames.get_or_insert(sample::SAMPLE_FRAMES.into());
        options.size.get_or_insert(sample::SAMPLE_TILE.into());
    }

    if let Some(src) = &cli.src {
        manifest.src = src.clone();
    }

    let options = &mut manifest.options;
    if let Some(fps) = cli.fps {
        options.fps = Some(fps.into());
    }
    if let Some(frames) = &cli.frames {
        options.frames = Some(frames.clone());
    }
    if let Some(size) = &cli.size {
        options.size = Some(size.clone());
    }
    if cli.lazy {
        options.lazy = Some(true);
    }

    if manifest.src.is_empty() {
        bail!("no sprite source; pass --src, --manifest or --write-sample");
    }

    log::debug!("sprite manifest: {manifest:?}");
    manifest
        .into_sprite(queue.image())
        .context("invalid sprite options")
}

/// Loads the sheet before playback so the first ticks have something to draw.
fn preload(sprite: &RefCell<SpriteResource>, queue: &DecodeQueue) -> Result<()> {
    let handle = {
        let mut sprite = sprite.borrow_mut();
        if sprite.options().lazy() {
            log::info!("lazy sprite; loading before playback");
        }
        sprite.load();
        sprite.ready()
    };

    queue.process();
    if !handle.is_settled() {
        bail!("sprite load did not complete");
    }

    let dims = pollster::block_on(handle).context("loading sprite sheet")?;

    let sprite = sprite.borrow();
    log::info!(
        "loaded '{}' ({}x{}): {} frame(s) x {} layer(s), animation {}",
        sprite.src(),
        dims.width,
        dims.height,
        sprite.image_frame_count().map_or("?".to_string(), |n| n.to_string()),
        sprite.image_layer_count().map_or("?".to_string(), |n| n.to_string()),
        if sprite.has_animation() { "on" } else { "off" },
    );
    Ok(())
}

fn play(cli: &Cli, sprite: &Rc<RefCell<SpriteResource>>, queue: &DecodeQueue) -> Result<()> {
    let host = ManualHost::new();

    let mut options = SchedulerOptions::new()
        .frame_pump(host.clone())
        .on_start(|| log::info!("playback starting"))
        .on_started(|| log::debug!("first frame requested"))
        .on_fps_change(|fps| match fps {
            Some(fps) => log::info!("fps: {fps}"),
            None => log::info!("fps measurement off"),
        });
    if cli.measure_fps {
        options = options.fps_timer(host.clone()).measure_fps(true);
    }

    let ticked = sprite.clone();
    let scheduler = FrameScheduler::new(
        move |step| {
            let mut sprite = ticked.borrow_mut();
            let before = sprite.frame_index();
            sprite.update(step);
            if sprite.frame_index() != before {
                log::debug!(
                    "frame {} (x = {}px)",
                    sprite.frame_index(),
                    sprite.current_frame_px()
                );
            }
        },
        options,
    )
    .context("building scheduler")?;

    scheduler.start();

    let budget_ms = cli.seconds * 1000.0;
    let mut clock = HostClock::with_refresh_rate(cli.refresh_hz);
    loop {
        let now = clock.wait_for_next_frame();
        queue.process();
        host.advance_to(now);
        if now >= budget_ms {
            break;
        }
    }

    let sprite = sprite.borrow();
    log::info!(
        "played {:.2}s: {} ticks over {} refreshes, ended on frame {} (x = {}px)",
        host.now() / 1000.0,
        scheduler.tick_count(),
        clock.frame_index(),
        sprite.frame_index(),
        sprite.current_frame_px(),
    );
    Ok(())
}
