use bitgit_loose::LooseObjectStore;
use bitgit_object::ObjectType;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn scratch_store() -> (tempfile::TempDir, LooseObjectStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = LooseObjectStore::open(dir.path().join("objects"));
    (dir, store)
}

fn bench_write(c: &mut Criterion) {
    let (_dir, store) = scratch_store();
    let mut i = 0u64;
    c.bench_function("write_new_blob", |b| {
        b.iter(|| {
            i += 1;
            let content = format!("benchmark content {i}");
            store.write_raw(ObjectType::Blob, content.as_bytes()).unwrap();
        })
    });

    let oid_content = b"already stored\n";
    store.write_raw(ObjectType::Blob, oid_content).unwrap();
    c.bench_function("write_existing_blob", |b| {
        b.iter(|| store.write_raw(ObjectType::Blob, black_box(oid_content)).unwrap())
    });
}

fn bench_read(c: &mut Criterion) {
    let (_dir, store) = scratch_store();
    let content = vec![b'x'; 64 * 1024];
    let oid = store.write_raw(ObjectType::Blob, &content).unwrap();

    let mut group = c.benchmark_group("read");
    group.throughput(Throughput::Bytes(content.len() as u64));
    group.bench_function("verified_64k_blob", |b| b.iter(|| store.read(black_box(&oid)).unwrap()));
    group.bench_function("header_only", |b| {
        b.iter(|| store.read_header(black_box(&oid)).unwrap())
    });
    group.finish();
}

criterion_group!(loose, bench_write, bench_read);
criterion_main!(loose);
