#![cfg(feature = "criterion-bench")]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use futures::executor::block_on;
use rs_backoffice::{
    Actor, AuditLog, CollectionName, Console, Decision, EngineBuilder, EntityStore, Permission,
    PermissionSet, PrincipalId, RoleName,
};

fn setup_console(tag_count: usize) -> (Console, PrincipalId, Permission) {
    let console = Console::builder().enable_wildcard(false).build();
    let admin = PrincipalId::try_from("admin_bench").unwrap();
    let clerk = PrincipalId::try_from("clerk_bench").unwrap();
    let role = RoleName::try_from("clerk").unwrap();

    console
        .provision_principal(admin.clone(), "Admin", RoleName::try_from("admin").unwrap())
        .unwrap();
    let tags: Vec<String> = (0..tag_count).map(|i| format!("panel_{i}")).collect();
    let permissions = PermissionSet::parse(tags.iter().map(String::as_str)).unwrap();
    block_on(console.create_role(&admin, role.clone(), permissions)).unwrap();
    console
        .provision_principal(clerk.clone(), "Clerk", role)
        .unwrap();

    let required = Permission::try_from(format!("panel_{}", tag_count - 1).as_str()).unwrap();
    (console, clerk, required)
}

fn bench_authorize(c: &mut Criterion) {
    let mut group = c.benchmark_group("authorize_tag_count");
    group.sample_size(30);
    group.throughput(Throughput::Elements(1));

    for tag_count in [1usize, 8, 32, 128] {
        let (console, principal, required) = setup_console(tag_count);
        let engine = EngineBuilder::new(console.engine().store().clone()).build();
        assert_eq!(
            block_on(engine.authorize(&principal, &required)).unwrap(),
            Decision::Allow
        );

        let id = BenchmarkId::from_parameter(tag_count);
        group.bench_with_input(id, &tag_count, |b, _| {
            b.iter(|| {
                let decision = block_on(engine.authorize(&principal, &required)).unwrap();
                black_box(decision);
            });
        });
    }

    group.finish();
}

fn bench_trash_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("trash_cycle");
    group.sample_size(30);
    group.throughput(Throughput::Elements(1));

    let store = EntityStore::new(AuditLog::new());
    let collection = CollectionName::ads();
    let entity = store.insert(&Actor::System, &collection, "bench ad".to_string());

    group.bench_function("soft_delete_restore", |b| {
        b.iter(|| {
            store
                .soft_delete(&Actor::System, &collection, &entity.id)
                .unwrap();
            let restored = store
                .restore(&Actor::System, &collection, &entity.id)
                .unwrap();
            black_box(restored);
        });
    });

    group.bench_function("insert_purge", |b| {
        b.iter(|| {
            let fresh = store.insert(&Actor::System, &collection, "bench ad".to_string());
            store
                .soft_delete(&Actor::System, &collection, &fresh.id)
                .unwrap();
            let purged = store.purge(&Actor::System, &collection, &fresh.id).unwrap();
            black_box(purged);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_authorize, bench_trash_cycle);
criterion_main!(benches);
