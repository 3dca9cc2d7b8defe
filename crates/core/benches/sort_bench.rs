//! Folder sorting benchmarks

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sort_core::{
    CriteriaConfigurator, NewItem, RootFolder, SortEngine, SortScope, TreeSorter, TreeStore,
};
use std::sync::Arc;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz ";

fn random_title(rng: &mut ChaCha8Rng) -> String {
    let len = rng.gen_range(4..24);
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// A menu of `bookmarks` shuffled bookmarks, with a folder and separator every 50
fn build_tree(bookmarks: usize) -> (Arc<TreeStore>, TreeSorter) {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5047);
    let store = Arc::new(TreeStore::default());
    let menu = RootFolder::Menu.id();

    for i in 0..bookmarks {
        let title = random_title(&mut rng);
        let url = format!("https://example.com/{}", rng.gen::<u32>());
        store.add(menu, None, NewItem::bookmark(title, url)).unwrap();
        if i % 50 == 49 {
            store
                .add(menu, None, NewItem::folder(random_title(&mut rng)))
                .unwrap();
            store.add(menu, None, NewItem::separator()).unwrap();
        }
    }

    let sorter = TreeSorter::new(Arc::clone(&store));
    sorter.set_scope(SortScope::default());
    (store, sorter)
}

fn bench_sort_folder(c: &mut Criterion) {
    let menu = RootFolder::Menu.id();

    for size in [100usize, 1_000] {
        c.bench_function(&format!("sort_folder_{}", size), |b| {
            b.iter_batched(
                || build_tree(size),
                |(_store, sorter)| sorter.sort_folder(black_box(menu)).unwrap(),
                BatchSize::LargeInput,
            );
        });
    }
}

fn bench_sort_all_by_date(c: &mut Criterion) {
    let criteria = CriteriaConfigurator::default()
        .build(4, true, 0, false)
        .unwrap();

    c.bench_function("sort_all_1k_date_added_desc", |b| {
        b.iter_batched(
            || {
                let (store, sorter) = build_tree(1_000);
                sorter.set_criteria(criteria);
                (store, sorter)
            },
            |(_store, sorter)| sorter.sort_all().unwrap(),
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_sort_folder, bench_sort_all_by_date);
criterion_main!(benches);
