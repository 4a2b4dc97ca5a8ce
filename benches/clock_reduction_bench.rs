//! Benchmarks the prune/split/merge pipeline on synthetic templates of
//! increasing clock count, tracking peak memory (via a `GlobalAlloc`
//! wrapper) alongside `criterion`'s wall time.

use atac_nta::template::Template;
use criterion::{criterion_group, criterion_main, BenchmarkGroup, Criterion};
use criterion::measurement::WallTime;
use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, Ordering};

pub struct Trallocator<A: GlobalAlloc> {
    alloc: A,
    allocated: AtomicU64,
    freed: AtomicU64,
    max_size: AtomicU64,
}

unsafe impl<A: GlobalAlloc> GlobalAlloc for Trallocator<A> {
    unsafe fn alloc(&self, l: Layout) -> *mut u8 {
        self.allocated.fetch_add(l.size() as u64, Ordering::SeqCst);
        self.calc_size();
        self.alloc.alloc(l)
    }
    unsafe fn dealloc(&self, ptr: *mut u8, l: Layout) {
        self.alloc.dealloc(ptr, l);
        self.freed.fetch_add(l.size() as u64, Ordering::SeqCst);
        self.calc_size();
    }
}

impl<A: GlobalAlloc> Trallocator<A> {
    pub const fn new(a: A) -> Self {
        Trallocator {
            alloc: a,
            allocated: AtomicU64::new(0),
            freed: AtomicU64::new(0),
            max_size: AtomicU64::new(0),
        }
    }

    pub fn reset(&self) {
        self.freed.store(0, Ordering::SeqCst);
        self.max_size.store(0, Ordering::SeqCst);
        self.allocated.store(0, Ordering::SeqCst);
    }

    fn calc_size(&self) {
        if let Some(size) = self
            .allocated
            .load(Ordering::SeqCst)
            .checked_sub(self.freed.load(Ordering::SeqCst))
        {
            if size > self.max_size.load(Ordering::SeqCst) {
                self.max_size.store(size, Ordering::SeqCst);
            }
        }
    }

    pub fn get_max_size(&self) -> u64 {
        self.max_size.load(Ordering::SeqCst)
    }
}

#[global_allocator]
static GLOBAL: Trallocator<System> = Trallocator::new(System);
static SAMPLES: u64 = 10;

/// Builds a cyclic template of `n` locations, each transition guarded and
/// reset by its own clock, which is the shape that most exercises the
/// split/merge stages (every clock starts as its own single-reset,
/// single-guard candidate).
fn build_template(n: usize) -> Template {
    let locations: Vec<String> = (0..n).map(|i| format!("L{i}")).collect();
    let mut t = Template::create("Bench", locations.clone(), "L0").unwrap();
    for i in 0..n {
        let src = locations[i].clone();
        let dst = locations[(i + 1) % n].clone();
        let ids = t.create_transition(&[src], &[dst], None, None).unwrap();
        t.create_clock(Some((&ids, " > 1".to_string())), None, &ids, &[], false).unwrap();
    }
    t
}

fn add_benchmark(group: &mut BenchmarkGroup<WallTime>, id: &str, locations: usize) {
    GLOBAL.reset();
    group.bench_function(id, |b| {
        b.iter(|| {
            let mut t = build_template(locations);
            t.finalize().unwrap();
        });
    });
    println!("{id}: peak {} bytes", GLOBAL.get_max_size());
}

fn bench_clock_reduction(c: &mut Criterion) {
    let mut group = c.benchmark_group("Clock Reduction");
    add_benchmark(&mut group, "16 locations", 16);
    add_benchmark(&mut group, "64 locations", 64);
    add_benchmark(&mut group, "256 locations", 256);
    group.finish();
}

criterion_group! {
    name = clock_reduction_bench;
    config = Criterion::default().sample_size(SAMPLES as usize);
    targets = bench_clock_reduction
}
criterion_main!(clock_reduction_bench);
