use hexmap::{
    FlatNoise, GeneratorSettings, GridSettings, HexCell, HexDirection, HexGrid, MapGenerator,
    Mover, read_map, standard_move_cost, write_map,
};
use proptest::prelude::*;
use std::collections::HashSet;

struct Walker;

impl Mover for Walker {
    fn speed(&self) -> i32 {
        1000
    }

    fn is_valid_destination(&self, cell: &HexCell) -> bool {
        !cell.is_underwater()
    }

    fn move_cost(&self, from: &HexCell, to: &HexCell, direction: HexDirection) -> Option<i32> {
        standard_move_cost(from, to, direction)
    }
}

fn grid(width: i32, height: i32, wrapping: bool) -> HexGrid {
    HexGrid::new(&GridSettings {
        width,
        height,
        wrapping,
    })
    .unwrap()
}

fn generated(seed: u64) -> (HexGrid, GeneratorSettings) {
    let settings = GeneratorSettings {
        seed: Some(seed),
        ..GeneratorSettings::default()
    };
    let mut g = grid(20, 15, false);
    let noise = FlatNoise::default();
    MapGenerator::new(settings.clone(), &noise)
        .generate(&mut g)
        .unwrap();
    (g, settings)
}

proptest! {
    #[test]
    fn neighbours_are_symmetric(chunks_x in 1i32..5, chunks_z in 1i32..5, wrapping: bool) {
        let g = grid(chunks_x * 5, chunks_z * 5, wrapping);
        for cell in g.cells() {
            for direction in HexDirection::ALL {
                if let Some(n) = cell.neighbor(direction) {
                    prop_assert_eq!(g.cell(n).neighbor(direction.opposite()), Some(cell.index()));
                }
            }
        }
    }

    #[test]
    fn flat_paths_are_straight(
        ax in 0i32..15, az in 0i32..15,
        bx in 0i32..15, bz in 0i32..15,
    ) {
        let mut g = grid(15, 15, false);
        let a = g.cell_at_offset(ax, az).unwrap();
        let b = g.cell_at_offset(bx, bz).unwrap();
        let path = g.find_path(a, b, &Walker);
        prop_assert_eq!(path.len() as i32, g.distance(a, b) + 1);
        for pair in path.windows(2) {
            prop_assert_eq!(g.distance(pair[0], pair[1]), 1);
        }
    }

    #[test]
    fn moated_destination_is_unreachable(bx in 2i32..13, bz in 2i32..13) {
        let mut g = grid(15, 15, false);
        let b = g.cell_at_offset(bx, bz).unwrap();
        for direction in HexDirection::ALL {
            let n = g.neighbor(b, direction).unwrap();
            g.set_water_level(n, 1);
        }
        let a = if bx < 7 { g.cell_at_offset(14, 14) } else { g.cell_at_offset(0, 0) }.unwrap();
        prop_assert!(g.find_path(a, b, &Walker).is_empty());
    }

    #[test]
    fn wider_range_sees_at_least_as_much(
        elevations in proptest::collection::vec(0i32..4, 400),
        range in 1i32..5,
    ) {
        let mut g = grid(20, 20, false);
        for (index, &elevation) in elevations.iter().enumerate() {
            g.set_elevation(index, elevation);
        }
        let origin = g.cell_at_offset(10, 10).unwrap();
        let near: HashSet<usize> = g.visible_cells(origin, range).into_iter().collect();
        let far: HashSet<usize> = g.visible_cells(origin, range + 1).into_iter().collect();
        prop_assert!(near.is_subset(&far));
    }

    #[test]
    fn explored_outlives_visibility(x in 1i32..19, z in 1i32..19, range in 1i32..4) {
        let mut g = grid(20, 20, false);
        let origin = g.cell_at_offset(x, z).unwrap();
        let seen = g.visible_cells(origin, range);
        g.increase_visibility(origin, range);
        g.decrease_visibility(origin, range);
        for index in seen {
            prop_assert!(g.cell(index).is_explored());
            prop_assert!(!g.cell(index).is_visible());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn generated_rivers_never_flow_uphill(seed in any::<u64>()) {
        let (g, settings) = generated(seed);
        for cell in g.cells() {
            prop_assert!(cell.elevation() <= settings.elevation_maximum);
            let Some(direction) = cell.outgoing_river() else {
                continue;
            };
            let next = g.cell(cell.neighbor(direction).unwrap());
            prop_assert!(cell.is_valid_river_destination(next));
            prop_assert_eq!(next.incoming_river(), Some(direction.opposite()));
        }
    }

    #[test]
    fn generated_maps_survive_saving(seed in any::<u64>()) {
        let (g, _) = generated(seed);
        let mut bytes = Vec::new();
        write_map(&g, &mut bytes).unwrap();
        let loaded = read_map(&mut bytes.as_slice()).unwrap();
        let mut again = Vec::new();
        write_map(&loaded, &mut again).unwrap();
        prop_assert_eq!(bytes, again);
    }

    #[test]
    fn seed_fixes_the_map(seed in any::<u64>()) {
        let (a, _) = generated(seed);
        let (b, _) = generated(seed);
        let mut first = Vec::new();
        let mut second = Vec::new();
        write_map(&a, &mut first).unwrap();
        write_map(&b, &mut second).unwrap();
        prop_assert_eq!(first, second);
    }
}
