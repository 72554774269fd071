use criterion::{black_box, criterion_group, criterion_main, Criterion};
use detection::Detection;
use signal_control::{ControlConfig, FrameAnalyzer, ZoneConfig};

fn busy_frame(n: usize) -> Vec<Detection> {
    (0..n)
        .map(|i| {
            let x = (i % 32) as f32 * 40.0;
            let y = (i / 32) as f32 * 40.0;
            Detection::new("car", 0.5 + (i % 5) as f32 * 0.1, [x, y, x + 35.0, y + 30.0].into())
        })
        .collect()
}

fn bench_analyze(c: &mut Criterion) {
    let config = ControlConfig {
        zones: vec![
            ZoneConfig::new("lane_a", [0.0, 0.0, 640.0, 720.0]),
            ZoneConfig::new("lane_b", [640.0, 0.0, 1280.0, 720.0]),
        ],
        ..ControlConfig::default()
    };
    let analyzer = FrameAnalyzer::new(&config).unwrap();
    let vehicles = busy_frame(300);

    c.bench_function("analyze_300_vehicles_2_zones", |b| {
        b.iter(|| analyzer.analyze(black_box(&vehicles), black_box(&[])))
    });
}

criterion_group!(benches, bench_analyze);
criterion_main!(benches);
