use glam::IVec2;

use super::*;
use crate::blob::BlobId;
use crate::refine::{RefineError, UnavailableRefiner};

fn rect_blob(id: u64, left: i32, top: i32, w: usize, h: usize) -> Blob {
    Blob::from_mask(
        BlobId::from_raw(id),
        Bbox::new(top, left, w as i32, h as i32),
        &Mask::new_filled(w, h, 1),
    )
    .unwrap()
}

fn classified(mut blob: Blob) -> Blob {
    blob.class_name = "Porites".to_string();
    blob.class_color = [0, 200, 0];
    blob
}

fn line(from: (i32, i32), to: (i32, i32)) -> Vec<IVec2> {
    vec![IVec2::new(from.0, from.1), IVec2::new(to.0, to.1)]
}

// ============================================================================
// blobs_from_mask
// ============================================================================

#[test]
fn test_blobs_from_mask_square() {
    let mut raw = Mask::new_default(10, 10);
    for y in 3..7 {
        for x in 3..7 {
            raw[(x, y)] = 1;
        }
    }
    let mut ids = ProgressiveId::default();
    let blobs = blobs_from_mask(&raw, IVec2::ZERO, 16.0, &Config::default(), &mut ids);

    assert_eq!(blobs.len(), 1);
    assert_eq!(blobs[0].area(), 16);
    assert_eq!(blobs[0].bbox(), Bbox::new(3, 3, 4, 4));
    assert_eq!(ids.peek(), BlobId::from_raw(1));
}

#[test]
fn test_blobs_from_mask_fills_holes_and_filters() {
    let raw = Mask::from_rows(&[
        [1u8, 1, 1, 0, 0, 0],
        [1, 0, 1, 0, 0, 0],
        [1, 1, 1, 0, 0, 1],
    ]);
    let mut ids = ProgressiveId::default();
    // threshold 0.2 * 10 = 2: the ring (9 after filling) stays, the single
    // pixel goes.
    let blobs = blobs_from_mask(&raw, IVec2::new(100, 50), 10.0, &Config::default(), &mut ids);

    assert_eq!(blobs.len(), 1);
    assert_eq!(blobs[0].area(), 9);
    assert_eq!(blobs[0].bbox(), Bbox::new(50, 100, 3, 3));
    assert!(blobs[0].inner_contours().is_empty());
}

#[test]
fn test_blobs_from_mask_merges_diagonals() {
    let mut raw = Mask::new_default(8, 8);
    for i in 0..8 {
        raw[(i, i)] = 1;
    }
    let mut ids = ProgressiveId::default();
    let blobs = blobs_from_mask(&raw, IVec2::ZERO, 0.0, &Config::default(), &mut ids);
    assert_eq!(blobs.len(), 1);
    assert_eq!(blobs[0].area(), 8);
}

#[test]
fn test_blobs_from_zero_sized_mask() {
    let mut ids = ProgressiveId::default();
    for (w, h) in [(0, 5), (5, 0)] {
        let raw = Mask::new_default(w, h);
        let blobs = blobs_from_mask(&raw, IVec2::ZERO, 0.0, &Config::default(), &mut ids);
        assert!(blobs.is_empty());
    }
    assert_eq!(ids.peek(), BlobId::from_raw(0));
}

// ============================================================================
// union / subtract
// ============================================================================

#[test]
fn test_union_of_one_is_identity() {
    let blob = Blob::from_mask(
        BlobId::from_raw(3),
        Bbox::new(2, 2, 3, 3),
        &Mask::from_rows(&[[1u8, 1, 0], [0, 1, 0], [0, 1, 1]]),
    )
    .unwrap();

    let merged = union(&[&blob]).unwrap();
    assert_eq!(merged.mask(), blob.mask());
    assert_eq!(merged.bbox(), blob.bbox());
    assert_eq!(merged.id(), blob.id());
}

#[test]
fn test_union_of_disjoint_squares() {
    let a = classified(rect_blob(1, 0, 0, 3, 3));
    let b = rect_blob(2, 5, 5, 3, 3);

    let merged = union(&[&a, &b]).unwrap();
    assert_eq!(merged.area(), 18);
    assert_eq!(merged.mask().count_nonzero(), 18);
    assert_eq!(merged.bbox(), Bbox::new(0, 0, 8, 8));
    assert_eq!(merged.id(), a.id());
    assert_eq!(merged.class_name, "Porites");
    assert!(merged.contains(6, 6));
    assert!(!merged.contains(4, 4));
}

#[test]
fn test_union_of_nothing() {
    assert!(union(&[]).is_none());
}

#[test]
fn test_subtract_self_fails_and_keeps_blob() {
    let mut a = rect_blob(1, 0, 0, 4, 4);
    let copy = a.clone();
    assert!(!subtract(&mut a, &copy));
    assert_eq!(a, copy);
}

#[test]
fn test_subtract_never_grows() {
    let mut a = rect_blob(1, 0, 0, 6, 6);
    let b = rect_blob(2, 3, 3, 6, 6);
    assert!(subtract(&mut a, &b));
    assert_eq!(a.area(), 36 - 9);
    assert_eq!(a.mask().count_nonzero(), a.area());
    assert_eq!(a.bbox(), Bbox::new(0, 0, 6, 6));

    let mut c = rect_blob(3, 0, 0, 4, 4);
    let far = rect_blob(4, 10, 10, 2, 2);
    assert!(subtract(&mut c, &far));
    assert_eq!(c.area(), 16);
}

// ============================================================================
// cut
// ============================================================================

#[test]
fn test_cut_splits_and_accounts_for_pixels() {
    common::log_setup::setup_test_logging();
    let blob = classified(rect_blob(0, 0, 0, 20, 10));
    let mut ids = ProgressiveId::starting_at(10);

    let pieces = cut(&blob, &[line((10, -2), (10, 12))], &Config::default(), &mut ids);

    assert_eq!(pieces.len(), 2);
    // Interior carved pixels join the neighbouring piece with the highest
    // label id (the right piece); the two on the mask border stay carved.
    assert_eq!(pieces[0].area(), 100);
    assert_eq!(pieces[1].area(), 98);
    let total: usize = pieces.iter().map(Blob::area).sum();
    assert_eq!(total + 2, blob.area());

    assert_eq!(pieces[0].id(), BlobId::from_raw(10));
    assert_eq!(pieces[1].id(), BlobId::from_raw(11));
    assert!(pieces.iter().all(|p| p.class_name == "Porites"));
    assert_eq!(blob.area(), 200);
}

#[test]
fn test_cut_threshold_is_strict() {
    let blob = rect_blob(0, 0, 0, 62, 1);
    let mut ids = ProgressiveId::default();
    let pieces = cut(&blob, &[line((30, -1), (30, 1))], &Config::default(), &mut ids);

    assert_eq!(pieces.len(), 1);
    assert_eq!(pieces[0].area(), 31);
    assert_eq!(pieces[0].bbox().left, 31);
}

#[test]
fn test_cut_with_empty_stroke_creates_nothing() {
    let blob = rect_blob(0, 0, 0, 10, 10);
    let mut ids = ProgressiveId::default();
    assert!(cut(&blob, &[], &Config::default(), &mut ids).is_empty());
    assert!(cut(&blob, &[Vec::new()], &Config::default(), &mut ids).is_empty());
    assert_eq!(ids.peek(), BlobId::from_raw(0));
}

// ============================================================================
// split
// ============================================================================

fn gray_image(w: usize, h: usize) -> RgbRaster {
    RgbRaster::new_filled(w, h, [90, 90, 90])
}

#[test]
fn test_split_two_seeds() {
    let blob = rect_blob(0, 0, 0, 40, 10);
    let config = Config {
        split_marker_half_width: 2,
        ..Default::default()
    };
    let mut ids = ProgressiveId::starting_at(1);

    let pieces = split_blob(
        &gray_image(100, 100),
        &blob,
        &[IVec2::new(5, 5), IVec2::new(34, 5)],
        &config,
        &mut ids,
    );

    assert_eq!(pieces.len(), 2);
    let total: usize = pieces.iter().map(Blob::area).sum();
    assert_eq!(total, 400);
    assert!(pieces[0].contains(5, 5));
    assert!(pieces[1].contains(34, 5));
    assert_eq!(ids.peek(), BlobId::from_raw(3));
}

#[test]
fn test_split_overlapping_markers_merge() {
    let blob = rect_blob(0, 10, 10, 40, 10);
    let mut ids = ProgressiveId::default();
    // Default half-width 39 covers the whole blob from either seed.
    let pieces = split_blob(
        &gray_image(20, 20),
        &blob,
        &[IVec2::new(15, 15), IVec2::new(40, 15)],
        &Config::default(),
        &mut ids,
    );
    assert_eq!(pieces.len(), 1);
    assert_eq!(pieces[0].area(), 400);
}

#[test]
fn test_split_one_seed_spanning_two_lobes_is_one_marker() {
    // U shape: arms over columns 0..5 and 15..20, joined by rows 25..30.
    let mut mask = Mask::new_default(20, 30);
    for y in 0..30 {
        for x in 0..20 {
            if x < 5 || x >= 15 || y >= 25 {
                mask[(x, y)] = 1;
            }
        }
    }
    let blob = Blob::from_mask(BlobId::from_raw(0), Bbox::new(0, 0, 20, 30), &mask).unwrap();
    let config = Config {
        split_marker_half_width: 8,
        ..Default::default()
    };
    let mut ids = ProgressiveId::default();

    // The seed square covers both arms but not the gap between them.
    let pieces = split_blob(
        &gray_image(40, 40),
        &blob,
        &[IVec2::new(10, 5)],
        &config,
        &mut ids,
    );

    assert_eq!(pieces.len(), 1);
    assert_eq!(pieces[0].area(), 350);
}

#[test]
fn test_split_without_seeds() {
    let blob = rect_blob(0, 0, 0, 10, 10);
    let mut ids = ProgressiveId::default();
    let pieces = split_blob(&gray_image(10, 10), &blob, &[], &Config::default(), &mut ids);
    assert!(pieces.is_empty());
}

// ============================================================================
// crack
// ============================================================================

/// 70x40 field with a bright vertical band over columns 25..35.
fn band_field() -> Raster<f32> {
    let pixels = (0..70 * 40)
        .map(|i| if (25..35).contains(&(i % 70)) { 10.0 } else { 0.0 })
        .collect();
    Raster::new(70, 40, pixels)
}

#[test]
fn test_crack_preview_carves_band() {
    let blob = rect_blob(0, 100, 200, 70, 40);
    let mut ids = ProgressiveId::default();
    let outcome = create_crack(
        &blob,
        &band_field(),
        IVec2::new(129, 220),
        5.0,
        true,
        &Config::default(),
        &mut ids,
    )
    .unwrap();

    let CrackOutcome::Preview(carved) = outcome else {
        panic!("expected a preview");
    };
    assert_eq!(carved.count_nonzero(), 60 * 40);
    assert_eq!(carved[(30, 10)], 0);
    assert_eq!(carved[(24, 10)], 1);
    assert_eq!(ids.peek(), BlobId::from_raw(0));
}

#[test]
fn test_crack_commit_applies_strict_threshold() {
    let blob = classified(rect_blob(0, 100, 200, 70, 40));
    let mut ids = ProgressiveId::default();
    let outcome = create_crack(
        &blob,
        &band_field(),
        IVec2::new(129, 220),
        5.0,
        false,
        &Config::default(),
        &mut ids,
    )
    .unwrap();

    let CrackOutcome::Created(pieces) = outcome else {
        panic!("expected created blobs");
    };
    // Left piece is exactly 1000 pixels and is dropped.
    assert_eq!(pieces.len(), 1);
    assert_eq!(pieces[0].area(), 1400);
    assert_eq!(pieces[0].bbox().left, 135);
    assert_eq!(pieces[0].class_name, "Porites");
}

#[test]
fn test_crack_rejects_bad_inputs() {
    let blob = rect_blob(0, 0, 0, 70, 40);
    let mut ids = ProgressiveId::default();
    let config = Config::default();

    let small = Raster::new_filled(10, 10, 0.0f32);
    let err = create_crack(&blob, &small, IVec2::new(1, 1), 1.0, true, &config, &mut ids)
        .unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { .. }));

    let err = create_crack(&blob, &band_field(), IVec2::new(70, 5), 1.0, true, &config, &mut ids)
        .unwrap_err();
    assert!(matches!(err, Error::SeedOutOfBounds { x: 70, y: 5, .. }));
}

// ============================================================================
// edit border
// ============================================================================

#[test]
fn test_edit_border_retrace_keeps_mask() {
    let mask = Mask::from_rows(&[
        [1u8, 1, 1, 1, 1, 1],
        [1, 1, 1, 1, 1, 1],
        [1, 1, 0, 0, 1, 1],
        [1, 1, 0, 0, 1, 1],
        [1, 1, 1, 1, 1, 1],
        [1, 1, 1, 1, 0, 0],
    ]);
    let mut blob = Blob::from_mask(BlobId::from_raw(0), Bbox::new(7, 3, 6, 6), &mask).unwrap();
    let before = blob.clone();
    let stroke = blob.contour().to_vec();

    assert!(!edit_border(&mut blob, &[stroke], &Config::default()));
    assert_eq!(blob, before);
}

#[test]
fn test_edit_border_cuts_off_smaller_side() {
    common::log_setup::setup_test_logging();
    let mut blob = rect_blob(0, 0, 0, 20, 10);
    assert!(edit_border(&mut blob, &[line((15, -3), (15, 12))], &Config::default()));

    assert_eq!(blob.area(), 150);
    assert_eq!(blob.bbox(), Bbox::new(0, 0, 15, 10));
    assert_eq!(blob.mask().count_nonzero(), blob.area());
}

#[test]
fn test_edit_border_grows_through_outside_loop() {
    let mut blob = rect_blob(0, 0, 0, 10, 10);
    let stroke = vec![
        IVec2::new(5, 5),
        IVec2::new(5, 15),
        IVec2::new(8, 15),
        IVec2::new(8, 5),
    ];
    assert!(edit_border(&mut blob, &[stroke], &Config::default()));

    // The pocket enclosed by the loop joins the blob; the loop itself,
    // including the two border pixels it starts and ends on, does not.
    assert_eq!(blob.area(), 108);
    assert!(blob.contains(6, 14));
    assert!(blob.contains(6, 9));
    assert!(!blob.contains(5, 12));
    assert!(!blob.contains(5, 9));
    assert!(!blob.contains(8, 9));
}

#[test]
fn test_edit_border_grows_hole_through_inner_loop() {
    // 20x20 square with a 6x6 hole over columns and rows 7..13.
    let mut mask = Mask::new_filled(20, 20, 1);
    for y in 7..13 {
        for x in 7..13 {
            mask[(x, y)] = 0;
        }
    }
    let mut blob = Blob::from_mask(BlobId::from_raw(0), Bbox::new(0, 0, 20, 20), &mask).unwrap();
    assert_eq!(blob.inner_contours().len(), 1);

    // Leaves the hole through its top border, loops through the region and
    // comes back.
    let stroke = vec![
        IVec2::new(9, 9),
        IVec2::new(9, 3),
        IVec2::new(11, 3),
        IVec2::new(11, 9),
    ];
    assert!(edit_border(&mut blob, &[stroke], &Config::default()));

    // The hole takes the pocket x = 10, y 4..7; the loop stays region.
    assert_eq!(blob.area(), 361);
    assert_eq!(blob.area(), blob.mask().count_nonzero());
    assert_eq!(blob.bbox(), Bbox::new(0, 0, 20, 20));
    for y in 4..7 {
        assert!(!blob.contains(10, y));
    }
    assert!(blob.contains(10, 3));
    assert!(blob.contains(9, 6));
    assert!(blob.contains(11, 6));
    assert!(!blob.contains(7, 7));
    assert_eq!(blob.inner_contours().len(), 1);
}

#[test]
fn test_edit_border_ignores_distant_strokes() {
    let mut blob = rect_blob(0, 0, 0, 10, 10);
    let before = blob.clone();
    assert!(!edit_border(&mut blob, &[line((30, 30), (40, 30))], &Config::default()));
    assert!(!edit_border(&mut blob, &[], &Config::default()));
    assert_eq!(blob, before);
}

#[test]
fn test_snap_stroke_rules() {
    let blob = rect_blob(0, 0, 0, 10, 10);
    let region = crate::contour::ContourRegion::new(blob.contour()).unwrap();

    // Entering and leaving: kept from the first contact to the last.
    let crossing = draw_line(&line((5, -5), (5, 15)));
    let snapped = snap_stroke(&region, &crossing).unwrap();
    assert_eq!(snapped.first(), Some(&IVec2::new(5, 0)));
    assert_eq!(snapped.last(), Some(&IVec2::new(5, 9)));

    // A single touch does not snap.
    let poke = draw_line(&line((5, -5), (5, 0)));
    assert!(snap_stroke(&region, &poke).is_none());

    // Running along the contour does.
    let along = draw_line(&line((2, 0), (6, 0)));
    assert_eq!(snap_stroke(&region, &along).map(<[IVec2]>::len), Some(5));

    // Fully inside never snaps.
    let inside = draw_line(&line((2, 2), (6, 6)));
    assert!(snap_stroke(&region, &inside).is_none());
}

// ============================================================================
// refine border
// ============================================================================

/// Replaces the proposal with a fixed rectangle.
struct RectRefiner;

impl BorderRefiner for RectRefiner {
    fn refine(
        &self,
        _image: &RgbRaster,
        mask: &mut Mask,
        _bias_strength: f32,
        _conservative: f32,
        _grow: f32,
        _radius: f32,
    ) -> std::result::Result<(), RefineError> {
        mask.fill(0);
        for y in 2..8 {
            for x in 1..7 {
                mask[(x, y)] = 1;
            }
        }
        Ok(())
    }
}

#[test]
fn test_refine_border_extracts_refined_pieces() {
    let blob = classified(rect_blob(0, 0, 0, 5, 5));
    let image = gray_image(12, 10);
    let proposal = Mask::new_filled(12, 10, 1);
    let mut ids = ProgressiveId::starting_at(4);

    let pieces = refine_border(
        &blob,
        Bbox::new(20, 30, 12, 10),
        &image,
        &proposal,
        0.0,
        &RectRefiner,
        &Config::default(),
        &mut ids,
    )
    .unwrap();

    assert_eq!(pieces.len(), 1);
    assert_eq!(pieces[0].area(), 36);
    assert_eq!(pieces[0].bbox(), Bbox::new(22, 31, 6, 6));
    assert_eq!(pieces[0].id(), BlobId::from_raw(4));
    assert_eq!(pieces[0].class_name, "Porites");
}

#[test]
fn test_refine_border_failure_draws_no_ids() {
    let blob = rect_blob(0, 0, 0, 5, 5);
    let mut ids = ProgressiveId::starting_at(4);
    let err = refine_border(
        &blob,
        Bbox::new(0, 0, 6, 6),
        &gray_image(6, 6),
        &Mask::new_filled(6, 6, 1),
        0.0,
        &UnavailableRefiner,
        &Config::default(),
        &mut ids,
    )
    .unwrap_err();

    assert!(matches!(err, Error::Refinement(RefineError::Unavailable)));
    assert_eq!(ids.peek(), BlobId::from_raw(4));
}

#[test]
fn test_refine_border_checks_dimensions() {
    let blob = rect_blob(0, 0, 0, 5, 5);
    let mut ids = ProgressiveId::default();
    let err = refine_border(
        &blob,
        Bbox::new(0, 0, 6, 6),
        &gray_image(6, 6),
        &Mask::new_filled(5, 6, 1),
        0.0,
        &RectRefiner,
        &Config::default(),
        &mut ids,
    )
    .unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { .. }));
}
