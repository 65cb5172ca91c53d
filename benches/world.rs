#[macro_use]
extern crate criterion;

use criterion::{BatchSize, Bencher, Criterion};
use rand::prelude::*;

use sparsecs::prelude::*;

#[derive(Clone, Debug)]
struct CompInt(i32);

impl Component for CompInt {}

#[derive(Clone, Debug)]
struct CompVec([f32; 3]);

impl Component for CompVec {}

#[derive(Clone, Debug)]
struct CompBool(bool);

impl Component for CompBool {}

fn world_build(b: &mut Bencher) {
    b.iter(|| World::new(1024));
}

fn create_empty(b: &mut Bencher) {
    b.iter_batched(
        || World::new(1024),
        |mut w| {
            w.create_entity();
        },
        BatchSize::SmallInput,
    );
}

fn create_with_components(b: &mut Bencher) {
    b.iter_batched(
        || World::new(1024),
        |mut w| {
            w.create_entity_with((CompInt(0), CompVec([0.0; 3])));
        },
        BatchSize::SmallInput,
    );
}

fn destroy(b: &mut Bencher) {
    b.iter_batched(
        || {
            let mut w = World::new(1024);
            let eids: Vec<_> = (0..100)
                .map(|i| w.create_entity_with((CompInt(i), CompVec([0.0; 3]))))
                .collect();
            (w, eids)
        },
        |(mut w, mut eids)| {
            if let Some(e) = eids.pop() {
                w.destroy_entity(e).unwrap();
            }
        },
        BatchSize::SmallInput,
    );
}

fn add_remove_churn(b: &mut Bencher) {
    b.iter_batched(
        || {
            let mut w = World::new(1024);
            let e = w.create_entity();
            (w, e)
        },
        |(mut w, e)| {
            w.add_component(e, CompInt(7)).unwrap();
            w.remove_component::<CompInt>(e).unwrap();
        },
        BatchSize::SmallInput,
    );
}

fn create_after_delete(b: &mut Bencher) {
    let mut rng = thread_rng();
    b.iter_batched(
        || {
            let mut w = World::new(1024);
            let eids: Vec<_> = (0..1000).map(|_| w.create_entity()).collect();

            (0..1000)
                .choose_multiple(&mut rng, 100)
                .into_iter()
                .for_each(|i| {
                    w.destroy_entity(eids[i])
                        .expect("failed deleting entity in 'create after delete' setup");
                });

            w
        },
        |mut w| {
            for _ in 0..100 {
                w.create_entity();
            }
        },
        BatchSize::SmallInput,
    )
}

fn maintained_system_insert(b: &mut Bencher) {
    b.iter_batched(
        || {
            let mut w = World::new(4096);
            let s = System::builder().with::<CompInt>().build(&mut w);
            let eids: Vec<_> = (0..1000).map(|_| w.create_entity()).collect();
            (w, s, eids)
        },
        |(mut w, s, eids)| {
            for (i, e) in eids.iter().enumerate() {
                w.add_component(*e, CompInt(i as i32)).unwrap();
            }
            assert_eq!(s.len(), eids.len());
        },
        BatchSize::SmallInput,
    );
}

fn iterate_matching(b: &mut Bencher) {
    let mut w = World::new(8192);
    let s = System::builder()
        .with::<CompInt>()
        .without_any::<CompBool>()
        .build(&mut w);

    for i in 0..5000 {
        if i % 4 == 0 {
            w.create_entity_with((CompInt(i), CompBool(true)));
        } else {
            w.create_entity_with((CompInt(i),));
        }
    }

    b.iter(|| {
        let mut sum = 0i64;
        let view = w.components_of::<CompInt>();
        for &index in s.matching_entities().iter() {
            if let Some(c) = view.get(index) {
                sum += i64::from(c.0);
            }
        }
        criterion::black_box(sum)
    })
}

fn iterate_view(b: &mut Bencher) {
    let mut w = World::new(8192);
    for i in 0..5000 {
        w.create_entity_with((CompVec([i as f32, 0.0, 0.0]),));
    }

    b.iter(|| {
        let mut sum = 0f32;
        for (_, v) in world_view(&w).iter() {
            sum += v.0[0];
        }
        criterion::black_box(sum)
    })
}

fn world_view(w: &World) -> Components<'_, CompVec> {
    w.components_of::<CompVec>()
}

fn world_benchmarks(c: &mut Criterion) {
    c.bench_function("world build", world_build)
        .bench_function("create empty", create_empty)
        .bench_function("create with components", create_with_components)
        .bench_function("destroy", destroy)
        .bench_function("add remove churn", add_remove_churn)
        .bench_function("create after delete", create_after_delete)
        .bench_function("maintained system insert", maintained_system_insert)
        .bench_function("iterate matching", iterate_matching)
        .bench_function("iterate view", iterate_view);
}

criterion_group!(world, world_benchmarks);

criterion_main!(world);
