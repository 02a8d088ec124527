use std::hint::black_box;
use std::net::{TcpListener, TcpStream};

use criterion::{criterion_group, criterion_main, Criterion};
use tcpvitals::{read_rtt, TransportSnapshot};

fn bench_capture(c: &mut Criterion) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
    let (_server, _) = listener.accept().unwrap();

    c.bench_function("capture_loopback", |b| {
        b.iter(|| black_box(TransportSnapshot::capture(&client, 1_000_000)))
    });

    c.bench_function("read_rtt_loopback", |b| {
        b.iter(|| black_box(read_rtt(&client)))
    });
}

criterion_group!(benches, bench_capture);
criterion_main!(benches);
