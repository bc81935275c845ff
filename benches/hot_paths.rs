use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::DVec2;

use tui_geoedit::map::{geo_to_tile_frac, tile_frac_to_geo, GeoBox, GeoPoint, Viewport};
use tui_geoedit::persist::MemoryBackend;
use tui_geoedit::shapes::{ShapeKind, ShapeStore};

fn santiago() -> GeoBox {
    GeoBox::new(GeoPoint::new(-70.70, -33.50), GeoPoint::new(-70.60, -33.60))
}

fn bench_projection(c: &mut Criterion) {
    c.bench_function("geo_to_tile_frac", |b| {
        b.iter(|| geo_to_tile_frac(black_box(-70.65), black_box(-33.55), black_box(14)))
    });
    let frac = geo_to_tile_frac(-70.65, -33.55, 14);
    c.bench_function("tile_frac_to_geo", |b| b.iter(|| tile_frac_to_geo(black_box(frac), 14)));
}

fn bench_visible_tiles(c: &mut Criterion) {
    let mut vp = Viewport::new(santiago(), 16, 12, 18, Some(DVec2::new(-640.0, -480.0)));
    vp.set_size(1920.0, 1080.0);
    c.bench_function("visible_tiles_1080p_z16", |b| b.iter(|| black_box(&vp).visible_tiles().count()));
}

fn bench_project_all(c: &mut Criterion) {
    let mut store = ShapeStore::new();
    let mut backend = MemoryBackend::new("bench");
    for i in 0..500 {
        let t = f64::from(i) / 500.0;
        let ring = vec![
            GeoPoint::new(-70.70 + t * 0.1, -33.50 - t * 0.1),
            GeoPoint::new(-70.69 + t * 0.1, -33.50 - t * 0.1),
            GeoPoint::new(-70.69 + t * 0.1, -33.51 - t * 0.1),
            GeoPoint::new(-70.70 + t * 0.1, -33.51 - t * 0.1),
        ];
        if let Ok(pending) = store.create_from_draw(ShapeKind::Polygon, vec![ring]) {
            let _ = store.commit(pending, &mut backend);
        }
    }
    let origin = DVec2::new(9948.0, 19623.0);
    c.bench_function("project_all_500_polygons", |b| b.iter(|| store.project_all(black_box(15), origin)));
}

criterion_group!(benches, bench_projection, bench_visible_tiles, bench_project_all);
criterion_main!(benches);
