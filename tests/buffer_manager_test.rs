//! Integration tests for the buffer manager: replacement, pinning and the
//! frame index.

use std::sync::Arc;

use heapstore::buffer::{BufferManager, FrameState};
use heapstore::{Error, FileId, FrameId, PageId, PagedFile};
use proptest::prelude::*;
use tempfile::tempdir;

const MARK_OFFSET: usize = 100;

fn create_file(dir: &tempfile::TempDir, name: &str, id: u32) -> Arc<PagedFile> {
    Arc::new(PagedFile::create(dir.path().join(name), FileId::new(id), name).unwrap())
}

fn create_bpm(capacity: usize) -> (BufferManager, Arc<PagedFile>, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let file = create_file(&dir, "test.db", 1);
    (BufferManager::new(capacity), file, dir)
}

/// Allocate a page, stamp it with `mark`, and keep it pinned.
fn pinned_page(bpm: &BufferManager, file: &Arc<PagedFile>, mark: u8) -> (PageId, FrameId) {
    let (page_no, frame) = bpm.allocate_page(file).unwrap();
    bpm.page_mut(frame).as_mut_slice()[MARK_OFFSET] = mark;
    (page_no, frame)
}

// ============================================================================
// Eviction
// ============================================================================

#[test]
fn test_data_survives_eviction_cycles() {
    let (bpm, file, _dir) = create_bpm(2);

    let pages: Vec<PageId> = (0u8..6)
        .map(|i| {
            let (page_no, _) = pinned_page(&bpm, &file, i * 7);
            bpm.release_page(&file, page_no, true).unwrap();
            page_no
        })
        .collect();

    for (i, &page_no) in pages.iter().enumerate() {
        let frame = bpm.fetch_page(&file, page_no).unwrap();
        assert_eq!(bpm.page(frame).as_slice()[MARK_OFFSET], i as u8 * 7);
        bpm.release_page(&file, page_no, false).unwrap();
    }
    assert!(bpm.stats().snapshot().evictions >= 4);
    bpm.verify_index().unwrap();
}

#[test]
fn test_pinned_frames_never_evicted() {
    let n = 4;
    let (bpm, file, _dir) = create_bpm(n);

    let pinned: Vec<(PageId, FrameId)> =
        (0..n - 1).map(|i| pinned_page(&bpm, &file, i as u8)).collect();
    let sole_free = FrameId::new(n - 1);

    for round in 0..10u8 {
        let (page_no, frame) = pinned_page(&bpm, &file, 100 + round);
        assert_eq!(frame, sole_free, "round {round}");
        bpm.release_page(&file, page_no, true).unwrap();
    }

    for (i, &(page_no, frame)) in pinned.iter().enumerate() {
        assert_eq!(bpm.frame_of(&file, page_no), Some(frame));
        assert_eq!(bpm.page(frame).as_slice()[MARK_OFFSET], i as u8);
    }
}

#[test]
fn test_second_chance_survives_one_sweep() {
    let (bpm, file, _dir) = create_bpm(3);

    let pages: Vec<PageId> = (0..3)
        .map(|i| {
            let (page_no, _) = pinned_page(&bpm, &file, i);
            bpm.release_page(&file, page_no, true).unwrap();
            page_no
        })
        .collect();
    let (a, b, c) = (pages[0], pages[1], pages[2]);

    // The first sweep clears every reference bit and takes frame 0
    let (d, _) = pinned_page(&bpm, &file, 3);
    bpm.release_page(&file, d, true).unwrap();
    assert_eq!(bpm.frame_of(&file, a), None);

    // Touch b so it carries a reference bit again
    bpm.fetch_page(&file, b).unwrap();
    bpm.release_page(&file, b, false).unwrap();

    let (e, _) = pinned_page(&bpm, &file, 4);
    bpm.release_page(&file, e, true).unwrap();
    assert!(bpm.frame_of(&file, b).is_some(), "referenced page was evicted");
    assert_eq!(bpm.frame_of(&file, c), None);

    // Without a new reference b goes on the next pass
    let (f, _) = pinned_page(&bpm, &file, 5);
    bpm.release_page(&file, f, true).unwrap();
    assert_eq!(bpm.frame_of(&file, b), None);
}

#[test]
fn test_capacity_exceeded_leaves_state_intact() {
    let (bpm, file, _dir) = create_bpm(3);
    let pinned: Vec<_> = (0..3).map(|i| pinned_page(&bpm, &file, i)).collect();

    let before = bpm.frames();
    assert!(matches!(
        bpm.fetch_page(&file, PageId::new(1)),
        Ok(frame) if frame == pinned[0].1
    ));
    bpm.release_page(&file, pinned[0].0, false).unwrap();

    let extra = file.allocate_page().unwrap();
    assert!(matches!(
        bpm.fetch_page(&file, extra),
        Err(Error::CapacityExceeded)
    ));
    let after = bpm.frames();
    for (x, y) in before.iter().zip(&after) {
        assert_eq!((x.file, x.page_no, x.pin_count), (y.file, y.page_no, y.pin_count));
    }
    assert!(after.iter().all(|info| info.state == FrameState::Pinned));
    bpm.verify_index().unwrap();
}

#[test]
fn test_pages_of_two_files_share_the_pool() {
    let dir = tempdir().unwrap();
    let a = create_file(&dir, "a.db", 1);
    let b = create_file(&dir, "b.db", 2);
    let bpm = BufferManager::new(2);

    let (pa, _) = pinned_page(&bpm, &a, 0xA);
    let (pb, _) = pinned_page(&bpm, &b, 0xB);
    // Same page number, different files
    assert_eq!(pa, pb);
    bpm.release_page(&a, pa, true).unwrap();
    bpm.release_page(&b, pb, true).unwrap();

    bpm.flush_file(&a).unwrap();
    assert_eq!(bpm.frame_of(&a, pa), None);
    assert!(bpm.frame_of(&b, pb).is_some());

    let frame = bpm.fetch_page(&a, pa).unwrap();
    assert_eq!(bpm.page(frame).as_slice()[MARK_OFFSET], 0xA);
    bpm.release_page(&a, pa, false).unwrap();
    bpm.verify_index().unwrap();
}

#[test]
fn test_flush_and_reload_across_instances() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("persist.db");
    let data = b"persistent!";

    let page_no = {
        let file = Arc::new(PagedFile::create(&path, FileId::new(1), "persist.db").unwrap());
        let bpm = BufferManager::new(4);
        let mut guard = bpm.new_page(&file).unwrap();
        guard.as_mut_slice()[MARK_OFFSET..MARK_OFFSET + data.len()].copy_from_slice(data);
        let page_no = guard.page_id();
        drop(guard);
        bpm.flush_file(&file).unwrap();
        page_no
    };

    let file = Arc::new(PagedFile::open(&path, FileId::new(9), "persist.db").unwrap());
    let bpm = BufferManager::new(4);
    let guard = bpm.fetch_page_read(&file, page_no).unwrap();
    assert_eq!(&guard.as_slice()[MARK_OFFSET..MARK_OFFSET + data.len()], data);
}

// ============================================================================
// Properties
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Fetch(usize),
    Release(usize),
    Write(usize, u8),
}

fn op_strategy(pages: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..pages).prop_map(Op::Fetch),
        (0..pages).prop_map(Op::Release),
        (0..pages, any::<u8>()).prop_map(|(p, b)| Op::Write(p, b)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Random fetch/release/write sequences: content always matches the last
    /// write, capacity failures only happen with every frame pinned, and the
    /// frame index stays a bijection with the valid frames.
    #[test]
    fn prop_fetch_release_model(
        capacity in 1usize..5,
        ops in prop::collection::vec(op_strategy(8), 1..80),
    ) {
        let (bpm, file, _dir) = create_bpm(capacity);
        let pages: Vec<PageId> = (0..8).map(|_| file.allocate_page().unwrap()).collect();
        let mut pins = vec![0u32; pages.len()];
        let mut content = vec![0u8; pages.len()];

        for op in ops {
            match op {
                Op::Fetch(i) => match bpm.fetch_page(&file, pages[i]) {
                    Ok(frame) => {
                        pins[i] += 1;
                        prop_assert_eq!(bpm.page(frame).as_slice()[MARK_OFFSET], content[i]);
                    }
                    Err(Error::CapacityExceeded) => {
                        prop_assert!(bpm.frames().iter().all(|f| f.pin_count > 0));
                    }
                    Err(e) => prop_assert!(false, "unexpected error {e}"),
                },
                Op::Release(i) => {
                    let result = bpm.release_page(&file, pages[i], false);
                    if pins[i] > 0 {
                        prop_assert!(result.is_ok());
                        pins[i] -= 1;
                    } else {
                        prop_assert!(matches!(
                            result,
                            Err(Error::NotFound { .. }) | Err(Error::PageNotPinned { .. })
                        ), "unexpected release result {:?}", result);
                    }
                }
                Op::Write(i, byte) => {
                    if pins[i] > 0 {
                        let frame = bpm.frame_of(&file, pages[i]).unwrap();
                        bpm.page_mut(frame).as_mut_slice()[MARK_OFFSET] = byte;
                        bpm.release_page(&file, pages[i], true).unwrap();
                        pins[i] -= 1;
                        content[i] = byte;
                    }
                }
            }
            prop_assert!(bpm.verify_index().is_ok());
            for (i, &page_no) in pages.iter().enumerate() {
                let resident = bpm.pin_count(&file, page_no);
                prop_assert!(pins[i] == 0 || resident == Some(pins[i]));
            }
        }

        for (i, &page_no) in pages.iter().enumerate() {
            for _ in 0..pins[i] {
                bpm.release_page(&file, page_no, false).unwrap();
            }
        }
        for (i, &page_no) in pages.iter().enumerate() {
            let frame = bpm.fetch_page(&file, page_no).unwrap();
            prop_assert_eq!(bpm.page(frame).as_slice()[MARK_OFFSET], content[i]);
            bpm.release_page(&file, page_no, false).unwrap();
        }
    }

    /// Allocation fails with `CapacityExceeded` exactly when every frame is
    /// pinned.
    #[test]
    fn prop_capacity_exceeded_iff_all_pinned(capacity in 1usize..7, pinned in 0usize..7) {
        let pinned = pinned.min(capacity);
        let (bpm, file, _dir) = create_bpm(capacity);

        for i in 0..capacity {
            let (page_no, _) = pinned_page(&bpm, &file, i as u8);
            if i >= pinned {
                bpm.release_page(&file, page_no, false).unwrap();
            }
        }

        let result = bpm.allocate_page(&file);
        if pinned == capacity {
            prop_assert!(matches!(result, Err(Error::CapacityExceeded)));
        } else {
            prop_assert!(result.is_ok());
        }
        prop_assert!(bpm.verify_index().is_ok());
    }
}
