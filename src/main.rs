// lendpool - thread-safe bounded resource pool
// This is just a quick-demo binary; the actual library is in lib.rs.

use std::time::Duration;

use lendpool::{PoolConfig, Reaper, ResourceLifecycle, ResourcePool};

struct Buffer(Vec<u8>);

struct BufferLifecycle;

impl ResourceLifecycle for BufferLifecycle {
    type Resource = Buffer;
    type Error = std::io::Error;

    fn create(&self) -> Result<Buffer, Self::Error> {
        Ok(Buffer(vec![0; 4096]))
    }

    fn destroy(&self, _buffer: Buffer) {}

    fn describe(&self) -> String {
        "demo buffer pool".to_string()
    }
}

fn main() {
    println!("=== lendpool demo ===");

    let config = PoolConfig::new()
        .with_max_active(4)
        .with_max_idle(2)
        .with_max_idle_time(Duration::from_secs(30))
        .with_reap_interval(Duration::from_secs(10));
    let pool = ResourcePool::new(BufferLifecycle, config);
    let reaper = Reaper::spawn(&pool);

    {
        let buffer = pool.acquire().unwrap();
        println!("  borrowed a {} byte buffer", buffer.0.len());
    }

    let status = pool.status();
    println!(
        "  status: {} idle, {} active, {} waiting",
        status.idle, status.active, status.waiting
    );

    reaper.stop();
    pool.shutdown();
}
