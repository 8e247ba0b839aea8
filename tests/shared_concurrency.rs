use std::thread;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use wave_pyramid::pyramid::{OwnedSlice, Pyramid, SharedPyramid};

#[test]
fn readers_see_growing_prefixes_while_ingesting() {
    let mut rng = StdRng::seed_from_u64(42);
    let samples: Vec<f32> = (0..200_000).map(|_| rng.random_range(-1.0f32..=1.0)).collect();

    let shared = SharedPyramid::new(Pyramid::from_factors(&[16, 64, 256]).unwrap());
    let writer = shared.spawn_ingest(samples.clone());

    let readers: Vec<_> = [16.0, 64.0, 1024.0]
        .into_iter()
        .map(|zoom| {
            let shared = shared.clone();
            thread::spawn(move || {
                let mut snapshots = Vec::new();
                let mut last_len = 0;
                loop {
                    let done = shared.samples_ingested() == 200_000;
                    let OwnedSlice::Level { entries, .. } = shared.query_owned(zoom, 0, usize::MAX) else {
                        panic!("zoom {zoom} is coarser than the leaf");
                    };
                    assert!(entries.len() >= last_len, "length went backwards");
                    assert!(entries.iter().all(|e| e.min <= e.max));
                    last_len = entries.len();
                    snapshots.push(entries);
                    if done {
                        break;
                    }
                    thread::yield_now();
                }
                (zoom, snapshots)
            })
        })
        .collect();

    assert_eq!(writer.join().unwrap(), 200_000);

    let mut reference = Pyramid::from_factors(&[16, 64, 256]).unwrap();
    reference.extend(samples);

    for reader in readers {
        let (zoom, snapshots) = reader.join().unwrap();
        let level = reference.select_level(zoom).unwrap();
        let full = reference.level(level).unwrap().values();
        for snap in &snapshots {
            assert_eq!(snap.as_slice(), &full[..snap.len()]);
        }
        assert_eq!(snapshots.last().map(Vec::len), Some(full.len()));
    }
}
