//! Property tests for train/validation splitting and batching.

use std::collections::HashSet;
use std::sync::Arc;

use ndarray::Array2;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use ocd_core::config::{LoaderArgs, SplitSettings, ValSize};
use ocd_data::{random_split, DataLoader, OcdDataset, Subset};
use ocd_scm::{CausalDag, Samples};

fn dataset(len: usize) -> Arc<OcdDataset> {
    let values = Array2::from_shape_fn((len, 2), |(r, c)| (r * 2 + c) as f64);
    let samples = Samples::new(values, vec!["x0".into(), "x1".into()]);
    Arc::new(OcdDataset::new(samples, Arc::new(CausalDag::new(2)), None, "d"))
}

fn settings(batch_size: usize, shuffle: bool, drop_last: bool) -> SplitSettings {
    SplitSettings {
        batch_size,
        shuffle,
        num_workers: 0,
        pin_memory: false,
        loader_args: LoaderArgs {
            drop_last,
            seed: None,
        },
    }
}

proptest! {
    #[test]
    fn integer_val_size_splits_are_disjoint_and_complete(
        len in 1_usize..200,
        val in 0_usize..200,
        seed in any::<u64>(),
    ) {
        prop_assume!(val <= len);
        let d = dataset(len);
        let train_len = ValSize::Count(val).train_len(d.name(), len).unwrap();
        prop_assert_eq!(train_len, len - val);

        let (t, v) = random_split(&d, train_len, &mut StdRng::seed_from_u64(seed)).unwrap();
        let ts: HashSet<_> = t.indices().iter().copied().collect();
        let vs: HashSet<_> = v.indices().iter().copied().collect();
        prop_assert!(ts.is_disjoint(&vs));
        prop_assert_eq!(ts.len() + vs.len(), len);
        prop_assert_eq!(v.len(), val);
    }

    #[test]
    fn fractional_val_size_floors(len in 1_usize..500, f in 0.01_f64..0.99) {
        let train_len = ValSize::Fraction(f).train_len("d", len).unwrap();
        prop_assert_eq!(train_len, (len as f64 * (1.0 - f)).floor() as usize);
        prop_assert!(train_len <= len);
    }

    #[test]
    fn an_epoch_visits_every_row_once(
        len in 1_usize..120,
        batch_size in 1_usize..40,
        shuffle in any::<bool>(),
    ) {
        let loader = DataLoader::new(Subset::full(dataset(len)), settings(batch_size, shuffle, false), 3).unwrap();
        let mut seen: Vec<usize> = loader.iter().flat_map(|b| b.indices).collect();
        prop_assert_eq!(seen.len(), len);
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..len).collect::<Vec<_>>());
    }
}

#[test]
fn batches_carry_the_selected_rows() {
    let d = dataset(10);
    let subset = Subset::new(Arc::clone(&d), vec![9, 2, 4]).unwrap();
    let loader = DataLoader::new(subset, settings(2, false, false), 0).unwrap();
    let batches: Vec<_> = loader.iter().collect();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].indices, vec![9, 2]);
    assert_eq!(batches[0].samples.row(0).to_vec(), vec![18.0, 19.0]);
    assert_eq!(batches[1].len(), 1);
}

#[test]
fn shuffled_epochs_differ_but_replay_deterministically() {
    let loader = DataLoader::new(Subset::full(dataset(64)), settings(64, true, false), 5).unwrap();
    let first = loader.iter().next().unwrap().indices;
    let second = loader.iter().next().unwrap().indices;
    assert_ne!(first, second);
    assert_eq!(loader.iter_epoch(0).next().unwrap().indices, first);
}

#[test]
fn prefetch_on_workers_matches_sequential_iteration() {
    let mut s = settings(7, true, true);
    s.num_workers = 3;
    let parallel = DataLoader::new(Subset::full(dataset(50)), s, 1).unwrap();
    let sequential = DataLoader::new(Subset::full(dataset(50)), settings(7, true, true), 1).unwrap();
    let a = parallel.prefetch();
    let b: Vec<_> = sequential.iter().collect();
    assert_eq!(a.len(), 7);
    assert_eq!(a, b);
}

#[test]
fn zero_batch_size_is_rejected() {
    assert!(DataLoader::new(Subset::full(dataset(5)), settings(0, false, false), 0).is_err());
}

#[test]
fn subset_rejects_out_of_range_indices() {
    assert!(Subset::new(dataset(3), vec![0, 3]).is_err());
}
