use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ringdeque::{CapacityPolicy, RingBuffer};

fn bench_push_pop(c: &mut Criterion) {
    c.bench_function("push_back_grow", |b| {
        b.iter(|| {
            let mut buf: RingBuffer<u64> = RingBuffer::new();
            for i in 0..1024 {
                buf.push_back(black_box(i));
            }
            buf
        })
    });

    c.bench_function("queue_cycle", |b| {
        let mut buf: RingBuffer<u64> = (0..1024).collect();
        b.iter(|| {
            for i in 0..1024 {
                buf.push_back(black_box(i));
                black_box(buf.pop_front());
            }
        })
    });

    c.bench_function("push_front_grow", |b| {
        b.iter(|| {
            let mut buf: RingBuffer<u64> = RingBuffer::new();
            for i in 0..1024 {
                buf.push_front(black_box(i));
            }
            buf
        })
    });
}

fn bench_bulk(c: &mut Criterion) {
    let payload: Vec<u64> = (0..256).collect();

    c.bench_function("insert_many_middle", |b| {
        b.iter(|| {
            let mut buf: RingBuffer<u64> = (0..1024).collect();
            buf.insert_many(512, payload.clone());
            buf
        })
    });

    c.bench_function("replace_range_middle", |b| {
        b.iter(|| {
            let mut buf: RingBuffer<u64> = (0..1024).collect();
            buf.replace_range(384..640, payload.clone());
            buf
        })
    });

    c.bench_function("drain_middle", |b| {
        b.iter(|| {
            let mut buf: RingBuffer<u64> = (0..1024).collect();
            black_box(buf.drain(384..640).count());
            buf
        })
    });
}

fn bench_wrapped_iter(c: &mut Criterion) {
    // Rotate so the contents straddle the physical seam.
    let mut buf: RingBuffer<u64> = RingBuffer::with_capacity_policy(1024, CapacityPolicy::Exact);
    for i in 0..512 {
        buf.push_back(i);
        buf.pop_front();
    }
    buf.extend(0..1024);

    c.bench_function("iter_wrapped_sum", |b| {
        b.iter(|| buf.iter().sum::<u64>())
    });
}

criterion_group!(benches, bench_push_pop, bench_bulk, bench_wrapped_iter);
criterion_main!(benches);
