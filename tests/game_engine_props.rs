use battlebots::{BattleshipsGame, Game, ShipCell, ShotCell, BOARD_SIZE, TOTAL_SHIP_CELLS};
use proptest::prelude::*;

const CELLS: usize = BOARD_SIZE * BOARD_SIZE;

fn shuffled_cells() -> impl Strategy<Value = Vec<usize>> {
    Just((0..CELLS).collect::<Vec<_>>()).prop_shuffle()
}

fn play(seed: u64, order: &[usize], count: usize) -> BattleshipsGame {
    let mut game = BattleshipsGame::new(seed);
    for i in order.iter().take(count) {
        if game.is_complete() {
            break;
        }
        assert!(game.apply_response(&i.to_string()));
    }
    game
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn revealed_cells_are_rejected_without_change(
        seed in any::<u64>(),
        order in shuffled_cells(),
        count in 1..60usize,
    ) {
        let mut game = play(seed, &order, count);
        let before = game.state();
        let revealed: Vec<usize> = (0..CELLS)
            .filter(|&i| game.shots().cells()[i] != ShotCell::Unknown)
            .collect();
        prop_assert!(!revealed.is_empty());
        for i in revealed {
            prop_assert!(!game.apply_response(&i.to_string()));
        }
        prop_assert!(!game.apply_response("not a number"));
        prop_assert!(!game.apply_response(&CELLS.to_string()));
        prop_assert_eq!(game.state(), before);
    }

    #[test]
    fn ships_sink_only_when_every_cell_is_hit(
        seed in any::<u64>(),
        order in shuffled_cells(),
        count in 0..CELLS,
    ) {
        let game = play(seed, &order, count);
        let ships = game.ships().cells();
        let shots = game.shots().cells();
        for ship in 0..5 {
            let cells: Vec<usize> = (0..CELLS).filter(|&i| ships[i] == ShipCell::Ship(ship)).collect();
            let all_found = cells.iter().all(|&i| shots[i] != ShotCell::Unknown);
            let any_sunk = cells.iter().any(|&i| shots[i] == ShotCell::Sunk);
            let all_sunk = cells.iter().all(|&i| shots[i] == ShotCell::Sunk);
            prop_assert_eq!(all_found, all_sunk);
            prop_assert_eq!(any_sunk, all_sunk);
        }
        for i in 0..CELLS {
            if ships[i] == ShipCell::Sea {
                prop_assert!(matches!(shots[i], ShotCell::Unknown | ShotCell::Miss));
            }
        }
    }

    #[test]
    fn score_is_bounded_and_follows_move_count(seed in any::<u64>(), order in shuffled_cells()) {
        let game = play(seed, &order, CELLS);
        prop_assert!(game.is_complete());
        let moves = game.moves();
        prop_assert!((TOTAL_SHIP_CELLS..=CELLS).contains(&moves));
        let max_misses = (CELLS - TOTAL_SHIP_CELLS) as f64;
        let expected = (max_misses - (moves - TOTAL_SHIP_CELLS) as f64) / max_misses;
        let score = game.score();
        prop_assert!((0.0..=1.0).contains(&score));
        prop_assert!((score - expected).abs() < 1e-12);
    }
}

#[test]
fn completion_needs_every_ship_sunk() {
    let mut game = BattleshipsGame::new(5);
    let ships: Vec<usize> = (0..CELLS)
        .filter(|&i| game.ships().cells()[i] != ShipCell::Sea)
        .collect();
    let (last, rest) = ships.split_last().unwrap();
    for i in rest {
        game.apply_response(&i.to_string());
    }
    assert!(!game.is_complete());
    assert!(game.apply_response(&last.to_string()));
    assert!(game.is_complete());
    // complete is terminal
    let free = (0..CELLS).find(|&i| game.shots().cells()[i] == ShotCell::Unknown).unwrap();
    assert!(!game.apply_response(&free.to_string()));
}

#[test]
fn state_is_a_detached_copy() {
    let mut game = BattleshipsGame::new(9);
    let snapshot = game.state();
    game.apply_response("0");
    assert_eq!(snapshot.moves, 0);
    assert!(snapshot.shots.iter().all(|&c| c == 0));
    assert_eq!(game.state().moves, 1);
}
