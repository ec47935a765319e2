use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use pcm_voice_bridge::audio::buffer::playback_ring;
use pcm_voice_bridge::audio::scheduler::{playback_channel, PlaybackStrategy};
use pcm_voice_bridge::codec::{resample, to_float, to_int16};
use pcm_voice_bridge::config::PlaybackConfig;

fn bench_ring_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_drain");
    for frames in [256usize, 1024, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(frames), &frames, |b, &frames| {
            let (writer, mut reader) = playback_ring(48000 * 60);
            let block = vec![0.25f32; frames];
            let mut out = vec![0.0f32; frames];
            b.iter(|| {
                writer.write(&block);
                black_box(reader.drain_into(&mut out));
            });
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    for strategy in [PlaybackStrategy::RingBuffer, PlaybackStrategy::ClockScheduled] {
        c.bench_function(&format!("render_{:?}", strategy), |b| {
            let config = PlaybackConfig {
                strategy,
                ..PlaybackConfig::default()
            };
            let (mut scheduler, mut renderer) = playback_channel(&config, 48000);
            let mut out = vec![0.0f32; 1024];
            b.iter(|| {
                scheduler.enqueue(vec![0.1; 512]);
                black_box(renderer.render_interleaved(&mut out, 2));
            });
        });
    }
}

fn bench_resample(c: &mut Criterion) {
    let capture: Vec<f32> = (0..4800).map(|i| (i as f32 * 0.01).sin()).collect();
    let playback: Vec<f32> = (0..2400).map(|i| (i as f32 * 0.01).sin()).collect();

    c.bench_function("resample_48k_to_16k", |b| {
        b.iter(|| black_box(resample(black_box(&capture), 48000, 16000)))
    });
    c.bench_function("resample_24k_to_48k", |b| {
        b.iter(|| black_box(resample(black_box(&playback), 24000, 48000)))
    });
}

fn bench_pcm(c: &mut Criterion) {
    let samples: Vec<f32> = (0..1600).map(|i| (i as f32 * 0.01).sin()).collect();
    let bytes = to_int16(&samples);

    c.bench_function("to_int16_1600", |b| b.iter(|| black_box(to_int16(black_box(&samples)))));
    c.bench_function("to_float_1600", |b| b.iter(|| black_box(to_float(black_box(&bytes)))));
}

criterion_group!(benches, bench_ring_drain, bench_render, bench_resample, bench_pcm);
criterion_main!(benches);
