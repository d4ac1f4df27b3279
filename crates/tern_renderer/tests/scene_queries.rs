//! End-to-end queries against scenes loaded from configuration.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde_json::json;
use tern_core::{AcceleratorKind, SceneConfig};
use tern_renderer::{
    Camera, Intersection, Light, PixelSample, PointLight, Ray, Resolution, Scene, Spectrum,
    SpectrumExt, Vec2, Vec3,
};

fn box_room() -> SceneConfig {
    SceneConfig::from_value(json!({
        "name": "room",
        "resolution": [80, 60],
        "camera": { "eye": [0.0, 1.0, 4.0], "target": [0.0, 1.0, 0.0], "fov_degrees": 50.0 },
        "materials": [
            { "name": "white", "base_color": [0.8, 0.8, 0.8] },
            { "name": "red", "base_color": [0.8, 0.1, 0.1] }
        ],
        "meshes": [
            {
                "name": "floor",
                "positions": [[-2.0, 0.0, 2.0], [2.0, 0.0, 2.0], [2.0, 0.0, -2.0], [-2.0, 0.0, -2.0]],
                "indices": [0, 1, 2, 0, 2, 3],
                "material": "white"
            },
            {
                "name": "back",
                "positions": [[-2.0, 0.0, -2.0], [2.0, 0.0, -2.0], [2.0, 3.0, -2.0], [-2.0, 3.0, -2.0]],
                "indices": [0, 1, 2, 0, 2, 3],
                "material": "red"
            },
            {
                "name": "block",
                "positions": [[-0.5, 0.0, 0.0], [0.5, 0.0, 0.0], [0.5, 1.0, 0.0], [-0.5, 1.0, 0.0]],
                "indices": [0, 1, 2, 0, 2, 3],
                "material": "white",
                "transform": { "translation": [0.0, 0.0, -1.0], "rotation_degrees": [0.0, 30.0, 0.0] }
            }
        ],
        "lights": [
            { "type": "point", "position": [0.0, 2.5, 0.0], "intensity": [4.0, 4.0, 4.0] },
            { "type": "point", "position": [1.0, 2.5, 1.0], "intensity": [1.0, 1.0, 1.0] },
            { "type": "spot", "position": [-1.0, 2.5, 1.0], "target": [0.0, 0.0, 0.0],
              "intensity": [10.0, 10.0, 10.0], "cone_degrees": 40.0, "falloff_degrees": 30.0 }
        ]
    }))
    .unwrap()
}

fn loaded(config: &SceneConfig) -> (Scene, Camera) {
    let mut scene = Scene::new();
    scene.load_scene(config).unwrap();
    scene.preprocess();

    let mut camera = Camera::from_config(&config.camera);
    camera.preprocess(&Resolution::new(config.resolution[0], config.resolution[1]));
    (scene, camera)
}

#[test]
fn test_load_scene_summary() {
    let config = box_room();
    let (scene, _) = loaded(&config);

    assert_eq!(scene.get_file_name(), "room");
    assert_eq!(scene.primitive_count(), 6);
    assert_eq!(scene.light_num(), 3);
    assert!(scene.get_sky_light().is_none());
    assert_eq!(scene.get_material(1).map(|m| m.name.as_str()), Some("red"));
    assert!(scene.get_tri_mesh("block").is_some());

    let bbox = scene.get_bbox();
    assert!((bbox.min().x + 2.0).abs() < 1e-3);
    assert!((bbox.max().y - 3.0).abs() < 1e-3);
}

#[test]
fn test_axis_aligned_triangle_analytic_hit() {
    let config = SceneConfig::from_value(json!({
        "meshes": [{
            "name": "tri",
            "positions": [[0.0, 0.0, -3.0], [2.0, 0.0, -3.0], [0.0, 2.0, -3.0]],
            "indices": [0, 1, 2]
        }]
    }))
    .unwrap();
    let (scene, _) = loaded(&config);

    let origin = Vec3::new(0.5, 0.5, 1.0);
    let dir = Vec3::new(0.0, 0.0, -1.0);
    let mut rec = Intersection::default();
    assert!(scene.get_intersect(&Ray::new(origin, dir), &mut rec));
    assert!((rec.t - 4.0).abs() < 1e-5);
    assert!((rec.point - Vec3::new(0.5, 0.5, -3.0)).length() < 1e-5);
    assert_eq!(rec.primitive, Some(0));

    // Oblique ray: t is the distance over a unit direction
    let dir = Vec3::new(0.3, 0.0, -1.0).normalize();
    let mut rec = Intersection::default();
    assert!(scene.get_intersect(&Ray::new(origin, dir), &mut rec));
    let expected = 4.0 / -dir.z;
    assert!((rec.t - expected).abs() < 1e-4);

    // Misses beside the hypotenuse and behind the origin
    let mut rec = Intersection::default();
    assert!(!scene.get_intersect(&Ray::new(Vec3::new(1.5, 1.5, 1.0), Vec3::new(0.0, 0.0, -1.0)), &mut rec));
    assert!(!scene.get_intersect(&Ray::new(origin, Vec3::Z), &mut rec));
    assert!(!rec.is_hit());
}

#[test]
fn test_bvh_and_brute_force_agree() {
    let mut config = box_room();
    let (bvh_scene, _) = loaded(&config);
    config.accelerator = AcceleratorKind::None;
    let (brute_scene, _) = loaded(&config);

    let mut rng = StdRng::seed_from_u64(2024);
    let mut hits = 0;
    for _ in 0..2000 {
        let origin = Vec3::new(rng.gen_range(-1.5..1.5), rng.gen_range(0.1..2.5), rng.gen_range(-1.5..3.0));
        let dir = Vec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
        if dir.length_squared() < 1e-4 {
            continue;
        }
        let ray = Ray::new(origin, dir.normalize());

        let mut a = Intersection::default();
        let mut b = Intersection::default();
        let hit_a = bvh_scene.get_intersect(&ray, &mut a);
        let hit_b = brute_scene.get_intersect(&ray, &mut b);

        assert_eq!(hit_a, hit_b);
        assert_eq!(bvh_scene.intersect_p(&ray), brute_scene.intersect_p(&ray));
        if hit_a {
            hits += 1;
            assert!((a.t - b.t).abs() < 1e-4);
        }
    }
    assert!(hits > 100);
}

#[test]
fn test_pinhole_pixel_round_trip_hits_point() {
    let config = box_room();
    let (scene, camera) = loaded(&config);
    let mut rng = StdRng::seed_from_u64(8);

    // Points on the back wall visible from the camera
    for point in [Vec3::new(0.0, 2.0, -2.0), Vec3::new(-1.2, 2.5, -2.0), Vec3::new(1.5, 0.5, -2.0)] {
        let coord = camera.get_screen_coord(point, &mut rng);
        assert!(coord.pixel.x >= 0 && coord.pixel.x < 80);
        assert!(coord.pixel.y >= 0 && coord.pixel.y < 60);
        assert!(coord.visibility.is_unoccluded(&scene));

        let frac = coord.raster - coord.pixel.as_vec2();
        let ray = camera.generate_ray(0, coord.pixel.x as u32, coord.pixel.y as u32, &PixelSample::new(frac.x, frac.y, 0.5, 0.5));
        assert!((ray.direction.length() - 1.0).abs() < 1e-5);

        let mut rec = Intersection::default();
        assert!(scene.get_intersect(&ray, &mut rec));
        assert!((rec.point - point).length() < 1e-2, "{} vs {}", rec.point, point);
    }
}

#[test]
fn test_occluded_point_is_not_visible() {
    let config = box_room();
    let (scene, camera) = loaded(&config);
    let mut rng = StdRng::seed_from_u64(10);

    // Floor point hidden behind the block as seen from the eye
    let hidden = Vec3::new(0.0, 0.0, -1.6);
    let coord = camera.get_screen_coord(hidden, &mut rng);
    let through_block = Ray::new(camera.eye(), (hidden - camera.eye()).normalize());
    let mut rec = Intersection::default();
    assert!(scene.get_intersect(&through_block, &mut rec));

    // The block is hit well before the floor point
    assert!(rec.t < (hidden - camera.eye()).length() - 0.1);
    assert!(!coord.visibility.is_unoccluded(&scene));

    let open = camera.get_screen_coord(Vec3::new(1.5, 0.0, 1.0), &mut rng);
    assert!(open.visibility.is_unoccluded(&scene));
}

#[test]
fn test_light_selection_frequency_matches_power() {
    let config = box_room();
    let (scene, _) = loaded(&config);

    let powers: Vec<f32> = scene.get_lights().iter().map(|l| l.power().intensity()).collect();
    let total: f32 = powers.iter().sum();

    let mut counts = vec![0usize; scene.light_num()];
    let mut rng = StdRng::seed_from_u64(77);
    let draws = 200_000;
    for _ in 0..draws {
        let (light, pdf) = scene.sample_light(rng.gen()).unwrap();
        // Every light in the room has a distinct power
        let index = powers.iter().position(|&p| p == light.power().intensity()).unwrap();
        assert!((pdf - scene.light_probability(index)).abs() < 1e-6);
        counts[index] += 1;
    }

    for (i, &count) in counts.iter().enumerate() {
        let expected = powers[i] / total;
        let observed = count as f32 / draws as f32;
        assert!((observed - expected).abs() < 0.01, "light {}: {} vs {}", i, observed, expected);
    }
}

#[test]
fn test_shadow_ray_towards_light() {
    let config = box_room();
    let (scene, _) = loaded(&config);
    let Some(light) = scene.get_light(0) else {
        panic!("room has lights");
    };

    // Floor in front of the block sees the ceiling light
    let lit = light.sample_li(Vec3::new(0.0, 0.0, 1.0), Vec2::ZERO).unwrap();
    assert!(lit.visibility.is_unoccluded(&scene));

    // Right behind the block is in its shadow for a light behind the camera
    let behind = PointLight::new(Vec3::new(0.0, 0.5, 3.0), Spectrum::ONE);
    let shadowed = behind.sample_li(Vec3::new(0.0, 0.5, -1.9), Vec2::ZERO).unwrap();
    assert!(!shadowed.visibility.is_unoccluded(&scene));
}

#[test]
fn test_concurrent_queries_match_serial() {
    let config = box_room();
    let (scene, camera) = loaded(&config);
    let (width, height) = camera.resolution();

    let pixels: Vec<(u32, u32)> = (0..height).flat_map(|y| (0..width).map(move |x| (x, y))).collect();
    let trace = |&(x, y): &(u32, u32)| {
        let ray = camera.generate_ray(0, x, y, &PixelSample::center());
        let mut rec = Intersection::default();
        let hit = scene.get_intersect(&ray, &mut rec);
        let light = scene.sample_light((x as f32 + 0.5) / width as f32).map(|(_, pdf)| pdf);
        (hit, rec.t, light)
    };

    let serial: Vec<_> = pixels.iter().map(trace).collect();
    let parallel: Vec<_> = pixels.par_iter().map(trace).collect();
    assert_eq!(serial, parallel);

    let rays: Vec<Ray> = pixels
        .iter()
        .map(|&(x, y)| camera.generate_ray(0, x, y, &PixelSample::center()))
        .collect();
    let batch = scene.get_intersect_batch(&rays);
    for (rec, (hit, t, _)) in batch.iter().zip(&serial) {
        assert_eq!(rec.is_some(), *hit);
        if let Some(rec) = rec {
            assert_eq!(rec.t, *t);
        }
    }
}

#[test]
fn test_load_replaces_previous_scene() {
    let mut scene = Scene::new();
    scene.load_scene(&box_room()).unwrap();
    scene.load_scene(&SceneConfig::from_value(json!({ "name": "empty" })).unwrap()).unwrap();
    scene.preprocess();

    assert_eq!(scene.get_file_name(), "empty");
    assert_eq!(scene.primitive_count(), 0);
    assert!(scene.sample_light(0.3).is_none());
}
