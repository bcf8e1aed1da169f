use gridzoom::perception::grid_mapper::{all_cells, can_partition, cell_to_point, cell_to_subregion};
use gridzoom::perception::types::{GridAddress, Region, ScaleFactor};

const REGIONS: &[(u32, u32, u32, u32)] = &[
    (0, 0, 1920, 1080),
    (0, 0, 1366, 768),
    (0, 0, 3024, 1964),
    (960, 540, 960, 540),
    (7, 13, 101, 57),
    (1200, 540, 241, 135),
    (0, 0, 5, 3),
];

fn regions() -> impl Iterator<Item = Region> {
    REGIONS.iter().map(|&(x, y, w, h)| Region::new(x, y, w, h).unwrap())
}

#[test]
fn cells_tile_the_region_exactly() {
    for grid in [2, 3, 4] {
        for region in regions().filter(|r| can_partition(r, grid, 1)) {
            let cells = all_cells(&region, grid);
            assert_eq!(cells.len(), (grid * grid) as usize);

            let total: u64 = cells.iter().map(|(_, r)| r.area()).sum();
            assert_eq!(total, region.area(), "grid {grid} over {region}");

            for (i, (_, a)) in cells.iter().enumerate() {
                assert!(region.contains_region(a));
                for (_, b) in &cells[i + 1..] {
                    let disjoint = a.right() <= b.x()
                        || b.right() <= a.x()
                        || a.bottom() <= b.y()
                        || b.bottom() <= a.y();
                    assert!(disjoint, "{a} overlaps {b}");
                }
            }
        }
    }
}

#[test]
fn cells_are_numbered_row_major_from_one() {
    let region = Region::full(300, 300).unwrap();
    let cells = all_cells(&region, 3);
    let numbers: Vec<u32> = cells.iter().map(|(a, _)| a.cell()).collect();
    assert_eq!(numbers, (1..=9).collect::<Vec<_>>());

    let (_, sixth) = cells[5];
    assert_eq!(sixth, Region::new(200, 100, 100, 100).unwrap());
}

#[test]
fn target_point_falls_inside_the_chosen_cell() {
    for grid in [2, 3] {
        for region in regions().filter(|r| can_partition(r, grid, 1)) {
            for cell in 1..=grid * grid {
                let addr = GridAddress::new(cell, grid).unwrap();
                let sub = cell_to_subregion(addr, &region, grid);
                let p = cell_to_point(addr, &region, grid, ScaleFactor::IDENTITY);
                assert!(sub.contains_point(p.x, p.y), "{p:?} outside {sub}");
            }
        }
    }
}

#[test]
fn scale_is_applied_linearly() {
    let region = Region::full(3024, 1964).unwrap();
    let scale = ScaleFactor::between((1512, 982), region.size()).unwrap();
    for cell in 1..=4 {
        let addr = GridAddress::new(cell, 2).unwrap();
        let unscaled = cell_to_point(addr, &region, 2, ScaleFactor::IDENTITY);
        let scaled = cell_to_point(addr, &region, 2, scale);
        assert_eq!(scaled.x, unscaled.x * scale.sx);
        assert_eq!(scaled.y, unscaled.y * scale.sy);
    }
}

#[test]
fn tiny_regions_cannot_be_partitioned() {
    let region = Region::new(0, 0, 5, 3).unwrap();
    assert!(can_partition(&region, 2, 1));
    assert!(!can_partition(&region, 2, 2));
    assert!(!can_partition(&region, 4, 1));
}
