use criterion::{Criterion, criterion_group, criterion_main};
use lendpool::{PoolConfig, ResourceLifecycle, ResourcePool};

struct Slot;

struct SlotLifecycle;

impl ResourceLifecycle for SlotLifecycle {
    type Resource = Slot;
    type Error = std::io::Error;

    fn create(&self) -> Result<Slot, Self::Error> {
        Ok(Slot)
    }

    fn destroy(&self, _slot: Slot) {}
}

fn acquire_release(c: &mut Criterion) {
    let pool = ResourcePool::new(SlotLifecycle, PoolConfig::new().with_max_active(16));

    c.bench_function("acquire_release_warm", |b| {
        b.iter(|| {
            let slot = pool.acquire().unwrap();
            pool.release(slot).unwrap();
        })
    });
}

criterion_group!(benches, acquire_release);
criterion_main!(benches);
