mod cli;

use anyhow::Context;
use clap::Parser;
use cli::Args;
use glam::DVec3;
use log::{info, LevelFilter};
use raytracer::{
    camera::Camera,
    config::RenderConfig,
    geometry::BasePlane,
    light::Light,
    material::{Surface, WHITE},
    primitives::{Plane, Sphere, Triangle, AABB},
    render::render,
    space::Space,
    textures::{GridTexture, UniformTexture},
};
use std::{sync::Arc, time::Instant};

// A checkered floor, a mirror disk, glass and matte spheres and a small pyramid
fn demo_scene(config: &RenderConfig) -> Space {
    let mut space = Space::new(config.trace.clone(), config.kdtree.clone());

    let floor = Arc::new(GridTexture::new(
        1.0,
        Surface::matte(DVec3::new(0.9, 0.9, 0.9)),
        Surface::matte(DVec3::new(0.2, 0.2, 0.25)),
    ));
    space.add_obj(Plane::infinite(BasePlane::new(DVec3::ZERO, DVec3::Z), floor));

    let mirror = Arc::new(UniformTexture::new(Surface::mirror(DVec3::new(0.8, 0.8, 0.9))));
    space.add_obj(Plane::disk(
        DVec3::new(0.0, 4.0, 2.0),
        DVec3::new(0.0, -1.0, 0.3),
        1.8,
        mirror,
    ));

    let glass = Arc::new(UniformTexture::new(Surface::glass()));
    space.add_obj(Sphere::with_density(DVec3::new(0.0, 0.0, 1.0), 1.0, 1.5, glass));

    let colors = [
        DVec3::new(0.8, 0.2, 0.2),
        DVec3::new(0.2, 0.7, 0.3),
        DVec3::new(0.2, 0.3, 0.8),
        DVec3::new(0.8, 0.7, 0.2),
    ];
    for (i, color) in colors.iter().enumerate() {
        let angle = i as f64 * std::f64::consts::FRAC_PI_2 + 0.4;
        let center = DVec3::new(2.5 * angle.cos(), 2.5 * angle.sin(), 0.5);
        let texture = Arc::new(UniformTexture::new(Surface::matte(*color)));
        space.add_obj(Sphere::new(center, 0.5, texture));
    }

    let stone = Arc::new(UniformTexture::new(Surface::matte(DVec3::new(0.6, 0.5, 0.4))));
    let apex = DVec3::new(-3.0, 2.0, 1.5);
    let base = [
        DVec3::new(-3.8, 1.2, 0.0),
        DVec3::new(-2.2, 1.2, 0.0),
        DVec3::new(-2.2, 2.8, 0.0),
        DVec3::new(-3.8, 2.8, 0.0),
    ];
    for i in 0..base.len() {
        space.add_obj(Triangle::new(base[i], base[(i + 1) % base.len()], apex, stone.clone()));
    }

    space.set_bound(AABB::new(DVec3::new(-6.0, -6.0, 0.0), DVec3::new(6.0, 6.0, 5.0)));
    space.add_light(Light::new(DVec3::new(4.0, -4.0, 8.0), WHITE, 0.8));
    space.add_light(Light::new(DVec3::new(-5.0, -2.0, 6.0), DVec3::new(1.0, 0.9, 0.8), 0.5));
    space.init();

    space
}

fn init_logger(level: LevelFilter) {
    env_logger::Builder::from_default_env().filter_level(level).init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger(args.log_level.into());

    let mut config = match &args.config {
        Some(path) => RenderConfig::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => RenderConfig::default(),
    };
    args.apply(&mut config);
    let (width, height) = (config.output.width, config.output.height);

    let space = demo_scene(&config);
    let camera = Camera::from_config(&config.camera, width as f64 / height as f64);

    let start = Instant::now();
    let (frame, stats) = render(&space, &camera, width, height);
    let duration = start.elapsed();

    let rays = stats.rays as f64 / 1_000_000.0;
    info!(
        "Time elapsed: {:.2?}, total rays: {:.2}M, rays per second: {:.2}M, deepest bounce: {}",
        duration,
        rays,
        rays / duration.as_secs_f64(),
        stats.max_depth
    );

    frame
        .save_png(&config.output.path)
        .with_context(|| format!("saving {}", config.output.path.display()))?;
    info!("Saved {}", config.output.path.display());

    Ok(())
}
