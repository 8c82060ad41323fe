// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use libdd_crash_report::test_utils::PeImageBuilder;
use libdd_crash_report::{
    read_debug_record, sanitize_stack_trace, CapturedException, CrashReportConfiguration,
    DiagnosticLog, ExceptionCollector, LogLevel, NativeFrame, SnapshotMemory,
};
use std::sync::Arc;

const IMAGE_BASES: [u64; 4] = [
    0x7ff6_0000_0000,
    0x7ffa_1000_0000,
    0x7ffa_2000_0000,
    0x7ffa_3000_0000,
];

const WRAPPER_FRAMES: &str = "\n   at Sdk.Internal.Rethrow()";

struct NoLog;

impl DiagnosticLog for NoLog {
    fn log(&self, _level: LogLevel, _message: &str) {}
}

fn mapped_images() -> SnapshotMemory {
    IMAGE_BASES
        .iter()
        .enumerate()
        .fold(SnapshotMemory::new(), |memory, (i, base)| {
            memory.with_region(
                *base,
                PeImageBuilder::new()
                    .with_age(i as u32 + 1)
                    .with_pdb_path(&format!("C:\\build\\module{i}.pdb"))
                    .build(),
            )
        })
}

fn exception_with_frames(depth: u64) -> CapturedException {
    (0..depth).fold(
        CapturedException::new("System.AggregateException", "benchmark")
            .with_stack_trace(format!("   at App.Main(){WRAPPER_FRAMES}")),
        |exception, i| {
            let base = IMAGE_BASES[(i % IMAGE_BASES.len() as u64) as usize];
            exception.with_frame(NativeFrame::new(base + 0x1000 + i * 0x10, base))
        },
    )
}

fn bench_debug_record(c: &mut Criterion) {
    let memory = mapped_images();
    c.bench_function("read_debug_record", |b| {
        b.iter(|| black_box(read_debug_record(&memory, black_box(IMAGE_BASES[0]))))
    });
}

fn bench_collect(c: &mut Criterion) {
    let config = CrashReportConfiguration::new(true, Some(WRAPPER_FRAMES.to_string()), None)
        .unwrap_or_default();
    let collector = ExceptionCollector::new(config)
        .with_log(Arc::new(NoLog))
        .with_memory(Arc::new(mapped_images()));
    let mut group = c.benchmark_group("collect");
    for depth in [4u64, 64, 512] {
        let exception = exception_with_frames(depth);
        group.throughput(Throughput::Elements(depth));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &exception, |b, exception| {
            b.iter(|| black_box(collector.collect(Some(exception))))
        });
    }
    group.finish();
}

fn bench_sanitize(c: &mut Criterion) {
    let body = "   at App.Worker.Run()\n".repeat(200);
    let trace = format!("{body}{WRAPPER_FRAMES}");
    c.bench_function("sanitize_stack_trace", |b| {
        b.iter(|| black_box(sanitize_stack_trace(black_box(&trace), WRAPPER_FRAMES)))
    });
}

pub fn collector_benches(c: &mut Criterion) {
    bench_debug_record(c);
    bench_collect(c);
    bench_sanitize(c);
}
