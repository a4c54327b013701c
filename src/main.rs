use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::{ error, info, warn };

use ellipsoid_raycaster::Result;
use ellipsoid_raycaster::scene::Scene;
use ellipsoid_raycaster::camera::{ Camera, CancelToken, ViewConfig };
use ellipsoid_raycaster::light::DotProductPolicy;
use ellipsoid_raycaster::parallel::parallel_render;
use ellipsoid_raycaster::canvas::Canvas;
use ellipsoid_raycaster::consts::{ CANVAS_WIDTH, CANVAS_HEIGHT, NUM_THREADS,
    OUT_FILE, SCENE_LOAD_TIMEOUT_MS };

/// Raycasts a scene of ellipsoids with Blinn-Phong shading.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Scene description: a JSON list of ellipsoids, or an object with
    /// `ellipsoids` and `view`.
    #[clap(short, long)]
    scene: PathBuf,

    /// Eye and light configuration, overriding any view in the scene file.
    #[clap(long)]
    view: Option<PathBuf>,

    #[clap(long, default_value_t = CANVAS_WIDTH)]
    width: usize,

    #[clap(long, default_value_t = CANVAS_HEIGHT)]
    height: usize,

    /// Worker threads; 1 renders on the main thread.
    #[clap(short, long, default_value_t = NUM_THREADS)]
    threads: usize,

    /// Output image; `.png` writes PNG, anything else PPM.
    #[clap(short, long, default_value = OUT_FILE)]
    output: PathBuf,

    /// How long to wait for the scene file before giving up.
    #[clap(long, default_value_t = SCENE_LOAD_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Use the dot products unfloored, letting surfaces facing away from the
    /// light subtract their diffuse term.
    #[clap(long)]
    raw_dot_products: bool,
}

fn run(args: &Args) -> Result<()> {
    let timeout = Duration::from_millis(args.timeout_ms);
    let mut scene = Scene::load_with_timeout(args.scene.clone(), timeout)?;

    if let Some(path) = &args.view {
        let view: ViewConfig = serde_json::from_reader(
            BufReader::new(File::open(path)?))?;
        scene.view = view;
    }

    let policy = if args.raw_dot_products {
        DotProductPolicy::Raw
    } else {
        DotProductPolicy::Floored
    };

    let world = scene.world(policy);
    let camera = Camera::new(args.width, args.height, scene.view.eye);
    let cancel = CancelToken::new();

    let (canvas, report) = if args.threads <= 1 {
        let mut canvas = Canvas::new(args.width, args.height);
        let report = camera.render_frame(&world, &mut canvas, &cancel);
        (canvas, report)
    } else {
        parallel_render(world, camera, args.threads, &cancel)?
    };

    if !report.skipped.is_empty() {
        warn!("{} pixels could not be written", report.skipped.len());
    }

    canvas.save(&args.output)?;
    info!("Saved render to {}.", args.output.display());

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}
