use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rtusniff_core::{encoder::FrameBuilder, pipeline::decode_bursts, PipelineConfig};

fn make_bursts(num_sessions: usize, registers: usize) -> Vec<Vec<u8>> {
    let values: Vec<u16> = (0..registers as u16).collect();
    let mut bursts = Vec::with_capacity(num_sessions * 2);

    for i in 0..num_sessions {
        let slave = (i % 247) as u8 + 1;
        bursts.push(
            FrameBuilder::write_request(slave, 0, &values)
                .build()
                .unwrap()
                .to_vec(),
        );
        let mut response = FrameBuilder::read_response(slave, &values)
            .build()
            .unwrap()
            .to_vec();
        if i % 10 == 0 {
            // line noise in front of every tenth response
            response.splice(0..0, [0x00, 0xFF, 0xFE]);
        }
        bursts.push(response);
    }
    bursts
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    for &registers in &[2usize, 12, 120] {
        let bursts = make_bursts(500, registers);
        let total: usize = bursts.iter().map(Vec::len).sum();
        group.throughput(Throughput::Bytes(total as u64));

        group.bench_with_input(
            BenchmarkId::new("decode_bursts", registers),
            &bursts,
            |b, bursts| {
                b.iter(|| {
                    let res = decode_bursts(bursts, PipelineConfig::default());
                    criterion::black_box(res).ok();
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
