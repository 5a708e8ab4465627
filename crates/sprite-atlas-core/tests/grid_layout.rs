use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sprite_atlas_core::prelude::*;

#[test]
fn grid_side_is_ceil_sqrt() {
    let cases = [(1, 1), (2, 2), (3, 2), (4, 2), (5, 3), (9, 3), (10, 4), (16, 4), (17, 5), (100, 10)];
    for (n, side) in cases {
        let plan = plan_grid(n, 16, 16, 0);
        assert_eq!((plan.rows, plan.cols), (side, side), "n={}", n);
    }
}

#[test]
fn random_counts_always_fit_in_square_grid() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..500 {
        let n: usize = rng.gen_range(1..=20_000);
        let cw: u32 = rng.gen_range(1..=128);
        let ch: u32 = rng.gen_range(1..=128);
        let pad: u32 = rng.gen_range(0..=8);
        let plan = plan_grid(n, cw, ch, pad);
        assert_eq!(plan.rows, plan.cols);
        assert!(plan.capacity() >= n, "n={} plan={:?}", n, plan);
        let smaller = (plan.rows as usize - 1) * (plan.cols as usize - 1);
        assert!(smaller < n, "grid is not minimal for n={}", n);
        assert_eq!(plan.width, plan.cols * (cw + pad));
        assert_eq!(plan.height, plan.rows * (ch + pad));
    }
}

#[test]
fn cells_tile_inside_atlas_without_overlap() {
    let plan = plan_grid(23, 20, 12, 3);
    let bounds = Rect::new(0, 0, plan.width, plan.height);
    let cells: Vec<Rect> = (0..plan.capacity()).map(|i| plan.cell_rect(i)).collect();
    for (i, a) in cells.iter().enumerate() {
        assert!(bounds.contains(a), "cell {} out of bounds: {:?}", i, a);
        for b in &cells[i + 1..] {
            assert!(!a.intersects(b), "cells overlap: {:?} {:?}", a, b);
        }
    }
    // neighbours are exactly one cell + padding apart
    let (x0, y0) = plan.coordinate_for(0);
    let (x1, _) = plan.coordinate_for(1);
    let (_, y_next_row) = plan.coordinate_for(plan.cols as usize);
    assert_eq!((x0, y0), (3, 3));
    assert_eq!(x1 - x0, 20 + 3);
    assert_eq!(y_next_row - y0, 12 + 3);
}

#[test]
fn four_items_with_padding_two() {
    let plan = plan_grid(4, 32, 32, 2);
    assert_eq!((plan.rows, plan.cols), (2, 2));
    assert_eq!((plan.width, plan.height), (68, 68));
    let coords: Vec<(u32, u32)> = (0..4).map(|i| plan.coordinate_for(i)).collect();
    assert_eq!(coords, vec![(2, 2), (36, 2), (2, 36), (36, 36)]);
}

#[test]
fn zero_items_plan_is_empty() {
    let plan = plan_grid(0, 32, 32, 2);
    assert_eq!(plan.capacity(), 0);
    assert_eq!((plan.width, plan.height), (0, 0));
}

#[test]
fn huge_cells_saturate_instead_of_overflowing() {
    let plan = plan_grid(2, u32::MAX, 8, 1);
    assert_eq!(plan.width, u32::MAX);
    assert_eq!(plan.coordinate_for(0), (1, 1));
    assert_eq!(plan.coordinate_for(1), (u32::MAX, 1));
    assert_eq!(plan.coordinate_for(3), (u32::MAX, 10));
}
