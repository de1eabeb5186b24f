use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fw_mem::{Fifo, Pipe};

fn pipe_write_read(c: &mut Criterion) {
    let data = [0xA5u8; 48];
    c.bench_function("pipe_write_read_48", |b| {
        let mut pipe: Fifo<256> = Pipe::new();
        let mut out = [0u8; 48];
        b.iter(|| {
            pipe.write(black_box(&data));
            black_box(pipe.read(&mut out));
        })
    });
}

fn pipe_delete_middle(c: &mut Criterion) {
    c.bench_function("pipe_delete_middle", |b| {
        let mut pipe: Fifo<256> = Pipe::new();
        b.iter(|| {
            pipe.reset();
            pipe.write(&[1u8; 200]);
            black_box(pipe.delete(black_box(100)));
        })
    });
}

criterion_group!(benches, pipe_write_read, pipe_delete_middle);
criterion_main!(benches);
