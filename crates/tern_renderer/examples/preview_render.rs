//! Direct lighting preview.
//!
//! Loads a JSON scene (or a built-in one), traces one camera ray per pixel
//! sample in parallel, shades hits with one light sample and writes a PPM.
//!
//! ```text
//! cargo run --example preview_render -- [scene.json] [output.ppm]
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;

use anyhow::Context;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tern_core::SceneConfig;
use tern_renderer::{
    Camera, Intersection, PixelSample, Resolution, Scene, ShadingFrame, Spectrum, SpectrumExt,
    Vec2,
};

const SAMPLES_PER_PIXEL: u32 = 16;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SceneConfig::from_path(&path).with_context(|| format!("loading {}", path))?,
        None => SceneConfig::from_json_str(BUILTIN_SCENE)?,
    };
    let output = args.next().unwrap_or_else(|| "preview.ppm".to_string());

    let start = Instant::now();
    let mut scene = Scene::new();
    scene.load_scene(&config)?;
    scene.preprocess();
    log::info!("Scene ready in {:?}", start.elapsed());

    let resolution = Resolution::new(config.resolution[0], config.resolution[1]);
    let mut camera = Camera::from_config(&config.camera);
    camera.preprocess(&resolution);

    log::info!(
        "Rendering {}x{} @ {} spp...",
        resolution.width,
        resolution.height,
        SAMPLES_PER_PIXEL
    );
    let start = Instant::now();
    let pixels = render(&scene, &camera, resolution);
    log::info!("Rendered in {:?}", start.elapsed());

    save_ppm(&pixels, resolution, &output).with_context(|| format!("writing {}", output))?;
    log::info!("Saved to {}", output);
    Ok(())
}

fn render(scene: &Scene, camera: &Camera, resolution: Resolution) -> Vec<Spectrum> {
    (0..resolution.height)
        .into_par_iter()
        .flat_map_iter(|y| {
            // One generator per row keeps the image independent of thread count
            let mut rng = StdRng::seed_from_u64(y as u64);
            (0..resolution.width)
                .map(|x| {
                    let mut sum = Spectrum::ZERO;
                    for pass in 0..SAMPLES_PER_PIXEL {
                        let sample = PixelSample::random(&mut rng);
                        sum += radiance(scene, camera, pass, x, y, &sample, &mut rng);
                    }
                    sum / SAMPLES_PER_PIXEL as f32
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Emitted sky plus one light sample at the first hit.
fn radiance(
    scene: &Scene,
    camera: &Camera,
    pass: u32,
    x: u32,
    y: u32,
    sample: &PixelSample,
    rng: &mut StdRng,
) -> Spectrum {
    let ray = camera.generate_ray(pass, x, y, sample);
    let mut rec = Intersection::default();
    if !scene.get_intersect(&ray, &mut rec) {
        return scene.le(&ray);
    }

    let Some(material) = scene.material_at(&rec) else {
        return Spectrum::ZERO;
    };
    let Some((light, light_pdf)) = scene.sample_light(rng.gen()) else {
        return Spectrum::ZERO;
    };
    let Some(li) = light.sample_li(rec.point, Vec2::new(rng.gen(), rng.gen())) else {
        return Spectrum::ZERO;
    };
    if li.pdf <= 0.0 || li.radiance.is_black() || !li.visibility.is_unoccluded(scene) {
        return Spectrum::ZERO;
    }

    let frame = ShadingFrame::from_normal(rec.shading_normal);
    let wo = frame.to_local(-ray.direction);
    let wi = frame.to_local(li.wi);
    let f = material.bxdf.f(wo, wi);
    f * li.radiance * wi.z.abs() / (li.pdf * light_pdf)
}

/// Gamma 2 and clamp to a byte.
fn to_byte(linear: f32) -> u8 {
    (255.0 * linear.max(0.0).sqrt().clamp(0.0, 1.0)) as u8
}

fn save_ppm(pixels: &[Spectrum], resolution: Resolution, filename: &str) -> std::io::Result<()> {
    let file = File::create(filename)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "P3")?;
    writeln!(writer, "{} {}", resolution.width, resolution.height)?;
    writeln!(writer, "255")?;

    for color in pixels {
        writeln!(writer, "{} {} {}", to_byte(color.x), to_byte(color.y), to_byte(color.z))?;
    }

    writer.flush()
}

const BUILTIN_SCENE: &str = r#"{
    "name": "preview",
    "resolution": [320, 240],
    "camera": { "eye": [0.0, 1.2, 4.5], "target": [0.0, 0.6, 0.0], "fov_degrees": 45.0, "lens_radius": 0.03 },
    "materials": [
        { "name": "white", "base_color": [0.75, 0.75, 0.75] },
        { "name": "orange", "base_color": [0.8, 0.4, 0.1] }
    ],
    "meshes": [
        {
            "name": "ground",
            "positions": [[-5.0, 0.0, 5.0], [5.0, 0.0, 5.0], [5.0, 0.0, -5.0], [-5.0, 0.0, -5.0]],
            "indices": [0, 1, 2, 0, 2, 3],
            "material": "white"
        },
        {
            "name": "card",
            "positions": [[-0.6, 0.0, 0.0], [0.6, 0.0, 0.0], [0.6, 1.2, 0.0], [-0.6, 1.2, 0.0]],
            "indices": [0, 1, 2, 0, 2, 3],
            "material": "orange",
            "transform": { "rotation_degrees": [0.0, -25.0, 0.0] }
        }
    ],
    "lights": [
        { "type": "spot", "position": [2.0, 3.0, 2.0], "target": [0.0, 0.5, 0.0],
          "intensity": [30.0, 28.0, 25.0], "cone_degrees": 35.0, "falloff_degrees": 25.0 },
        { "type": "distant", "direction": [-0.3, -1.0, -0.4], "radiance": [0.6, 0.6, 0.7] },
        { "type": "sky", "radiance": [0.15, 0.2, 0.3] }
    ]
}"#;
