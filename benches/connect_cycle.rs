//! Connection lifecycle benchmarks.
//!
//! Measures a full connect → ready → disconnect cycle against a loopback
//! WebSocket server, for one manager and for many managers in parallel.
//!
//! Run with: cargo bench --bench connect_cycle
//! Results saved to: target/criterion/

use std::net::SocketAddr;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use futures_util::StreamExt;
use rosbridge_connection::{BridgeSettings, ConnectionManager};
use tokio::net::TcpListener;
use tokio::runtime::Runtime;

// ============================================================================
// Benchmark Parameters
// ============================================================================

const MANAGER_COUNTS: &[usize] = &[1, 10, 50];

// ============================================================================
// Loopback Bridge
// ============================================================================

async fn spawn_bridge() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                while let Some(Ok(message)) = ws.next().await {
                    if message.is_close() {
                        break;
                    }
                }
            });
        }
    });

    addr
}

fn settings_for(addr: SocketAddr) -> BridgeSettings {
    BridgeSettings::builder()
        .host(addr.ip().to_string())
        .port(addr.port())
        .build()
        .unwrap()
}

async fn cycle(manager: &ConnectionManager) {
    manager.connect().await;
    manager.wait_connected().await.unwrap();
    manager.disconnect().await;
}

// ============================================================================
// Benchmark: Single Manager
// ============================================================================

fn bench_single_cycle(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let addr = rt.block_on(spawn_bridge());
    let manager = ConnectionManager::new(settings_for(addr));

    c.bench_function("connect_cycle/single", |b| {
        b.to_async(&rt).iter(|| cycle(&manager));
    });
}

// ============================================================================
// Benchmark: Parallel Managers
// ============================================================================

fn bench_parallel_cycles(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let addr = rt.block_on(spawn_bridge());

    let mut group = c.benchmark_group("connect_cycle/parallel");
    group.sample_size(20);

    for &count in MANAGER_COUNTS {
        let managers: Vec<Arc<ConnectionManager>> = (0..count)
            .map(|_| Arc::new(ConnectionManager::new(settings_for(addr))))
            .collect();

        group.bench_with_input(BenchmarkId::new("managers", count), &managers, |b, managers| {
            b.to_async(&rt).iter(|| async {
                let tasks: Vec<_> = managers
                    .iter()
                    .map(|manager| {
                        let manager = Arc::clone(manager);
                        tokio::spawn(async move { cycle(&manager).await })
                    })
                    .collect();

                for task in tasks {
                    task.await.unwrap();
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_cycle, bench_parallel_cycles);
criterion_main!(benches);
