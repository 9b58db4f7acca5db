// Benchmarks for parsing and lock analysis
//
// Dumps are synthetic: `n` worker threads, every fourth one holding a lock the
// next three wait on, with JDK 17 style frames and ownable-synchronizer lists.
//
// Run all benchmarks:
//   cargo bench --bench parse
//
// Run one group:
//   cargo bench --bench parse parse_dump

use std::fmt::Write as _;
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use jstack_tree::locks::{LockGraph, render_forest};
use jstack_tree::styling::RenderConfig;

const THREAD_COUNTS: &[usize] = &[100, 1_000, 10_000];

fn synthetic_dump(threads: usize) -> String {
    let mut out = String::from(
        "2024-03-01 10:15:30\nFull thread dump OpenJDK 64-Bit Server VM (17.0.2+8-86 mixed mode, sharing):\n\n",
    );

    for i in 0..threads {
        let holder = i - i % 4;
        let oid = format!("0x00000007{holder:08x}");
        writeln!(
            out,
            "\"worker-{i}\" #{} prio=5 os_prio=0 cpu=1.00ms elapsed=10.00s tid=0x00007f{i:010x} nid=0x{i:x} waiting for monitor entry  [0x00007f3a8bffe000]",
            i + 10
        )
        .unwrap();
        if i == holder {
            out.push_str("   java.lang.Thread.State: RUNNABLE\n");
            out.push_str("\tat java.net.SocketInputStream.socketRead0(java.base@17.0.2/Native Method)\n");
            out.push_str("\tat com.example.Service.call(Service.java:120)\n");
            writeln!(out, "\t- locked <{oid}> (a com.example.Resource)").unwrap();
        } else {
            out.push_str("   java.lang.Thread.State: BLOCKED (on object monitor)\n");
            out.push_str("\tat com.example.Service.call(Service.java:118)\n");
            writeln!(out, "\t- waiting to lock <{oid}> (a com.example.Resource)").unwrap();
        }
        for depth in 0..20 {
            writeln!(
                out,
                "\tat com.example.Layer{depth}.invoke(Layer{depth}.java:{})",
                depth + 30
            )
            .unwrap();
        }
        out.push_str("\tat java.lang.Thread.run(java.base@17.0.2/Thread.java:833)\n\n");
        out.push_str("   Locked ownable synchronizers:\n\t- None\n\n");
    }

    out.push_str("JNI global refs: 15, weak refs: 0\n");
    out
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_dump");
    for &threads in THREAD_COUNTS {
        let text = synthetic_dump(threads);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &text, |b, text| {
            b.iter(|| jstack_tree::dump::parse_dump(black_box(text)).unwrap());
        });
    }
    group.finish();
}

fn bench_lock_forest(c: &mut Criterion) {
    let mut group = c.benchmark_group("lock_forest");
    for &threads in THREAD_COUNTS {
        let dump = jstack_tree::analyze(&synthetic_dump(threads)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(threads), &dump, |b, dump| {
            b.iter(|| {
                let graph = LockGraph::build(black_box(dump));
                render_forest(graph.roots(), &RenderConfig::PLAIN)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_lock_forest);
criterion_main!(benches);
