//! Engine tests
//!
//! Test categories:
//! - Frame updates, cooldowns and soft drop
//! - Lock, row clear and respawn
//! - Scoring and leveling
//! - Game over
//! - Construction errors and snapshots

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use blockfall::{
    game::test_helpers::*, Block, BlockColor, EngineError, Field, Game, GameEvent, GameStatus,
    Intents, Position, ScoreState, SequenceShapeSource, Settings, ShapeKind, Tetromino,
};

const MS: Duration = Duration::from_millis(1);

fn shapes(symbols: &str) -> SequenceShapeSource {
    SequenceShapeSource::from_symbols(symbols).unwrap()
}

fn game_with(field: Field, piece: Tetromino) -> Game<SequenceShapeSource> {
    Game::with_field(Settings::default(), shapes("T"), field, piece).unwrap()
}

fn xs(game: &Game<SequenceShapeSource>) -> Vec<i32> {
    game.tetromino().positions().iter().map(|pos| pos.x).collect()
}

fn ys(game: &Game<SequenceShapeSource>) -> Vec<i32> {
    game.tetromino().positions().iter().map(|pos| pos.y).collect()
}

fn close_to(actual: Duration, expected_ms: f64) -> bool {
    (actual.as_secs_f64() * 1000.0 - expected_ms).abs() < 1e-3
}

// ============================================================================
// Frame Update Tests
// ============================================================================

mod frame_update {
    use super::*;

    #[test]
    fn gravity_moves_piece_each_interval() {
        let mut game = Game::new(Settings::default(), shapes("O")).unwrap();

        game.update(Intents::default(), MS * 199).unwrap();
        assert_eq!(ys(&game), vec![-1, -2, -1, -2]);

        game.update(Intents::default(), MS).unwrap();
        assert_eq!(ys(&game), vec![0, -1, 0, -1]);
    }

    #[test]
    fn horizontal_move_respects_cooldown() {
        let mut game = Game::new(Settings::default(), shapes("O")).unwrap();
        let left = Intents {
            move_left: true,
            ..Intents::default()
        };

        game.update(left, Duration::ZERO).unwrap();
        assert_eq!(xs(&game), vec![4, 4, 5, 5]);

        game.update(left, MS * 100).unwrap();
        assert_eq!(xs(&game), vec![4, 4, 5, 5]);

        // Cooldown expires at the end of this frame.
        game.update(left, MS * 100).unwrap();
        assert_eq!(xs(&game), vec![4, 4, 5, 5]);

        game.update(left, Duration::ZERO).unwrap();
        assert_eq!(xs(&game), vec![3, 3, 4, 4]);
    }

    #[test]
    fn rotate_intent_rotates_once_per_cooldown() {
        let piece = Tetromino::new_at(ShapeKind::T, 4, 5);
        let mut game = game_with(empty_field(), piece);
        let rotate = Intents {
            rotate: true,
            ..Intents::default()
        };

        game.update(rotate, Duration::ZERO).unwrap();
        let once = game.tetromino().positions();
        game.update(rotate, MS * 10).unwrap();

        assert_eq!(game.tetromino().positions(), once);
        assert_eq!(game.take_events(), vec![GameEvent::PieceRotated]);
    }

    #[test]
    fn soft_drop_speeds_gravity_while_held() {
        let mut game = Game::new(Settings::default(), shapes("O")).unwrap();
        let held = Intents {
            soft_drop: true,
            ..Intents::default()
        };

        game.update(held, Duration::ZERO).unwrap();
        assert!(close_to(game.gravity_interval(), 60.0));

        // Still held: interval stays fast.
        game.update(held, MS).unwrap();
        assert!(close_to(game.gravity_interval(), 60.0));

        game.update(Intents::default(), MS).unwrap();
        assert_eq!(game.gravity_interval(), MS * 200);
    }

    #[test]
    fn soft_drop_moves_piece_on_fast_interval() {
        let mut game = Game::new(Settings::default(), shapes("O")).unwrap();
        let held = Intents {
            soft_drop: true,
            ..Intents::default()
        };

        game.update(held, MS * 61).unwrap();

        assert_eq!(ys(&game), vec![0, -1, 0, -1]);
    }
}

// ============================================================================
// Lock And Spawn Tests
// ============================================================================

mod lock_and_spawn {
    use super::*;

    #[test]
    fn i_piece_locks_at_floor_and_next_spawns() {
        let mut game = Game::new(Settings::default(), shapes("IZ")).unwrap();

        for _ in 0..19 {
            game.move_down().unwrap();
        }
        assert_eq!(game.field().occupied_count(), 0);

        game.move_down().unwrap();

        assert_eq!(game.field().occupied_count(), 4);
        assert!(occupied(game.field(), 5, 19));
        assert_eq!(game.tetromino().shape(), ShapeKind::Z);
        assert_eq!(
            game.tetromino().positions(),
            Tetromino::new(ShapeKind::Z, game.settings()).positions()
        );
        assert_eq!(
            game.take_events(),
            vec![GameEvent::PieceLocked, GameEvent::PieceSpawned(ShapeKind::Z)]
        );
    }

    #[test]
    fn o_piece_fills_gap_and_clears_row() {
        let mut field = empty_field();
        for x in (0..10).filter(|x| *x != 4 && *x != 5) {
            field.settle(Block::new(Position::new(x, 19), BlockColor::Red));
        }
        let piece = Tetromino::new_at(ShapeKind::O, 4, 18);
        let mut game = game_with(field, piece);

        game.move_down().unwrap();
        let before_lock = game.field().occupied_count();
        game.move_down().unwrap();

        // The O added four cells, the cleared row removed ten.
        assert_eq!(game.field().occupied_count(), before_lock + 4 - 10);
        assert!(occupied(game.field(), 4, 19));
        assert!(occupied(game.field(), 5, 19));
        assert!(!game.field().is_row_full(19));
        assert_eq!(game.score().score, 40);
        assert_eq!(game.score().lines, 1);
        assert!(game.take_events().contains(&GameEvent::LinesCleared(1)));
    }

    #[test]
    fn gravity_drives_piece_to_lock() {
        let mut game = Game::new(Settings::default(), shapes("O")).unwrap();

        // 20 steps to reach the floor, one more to lock.
        for _ in 0..21 {
            game.update(Intents::default(), MS * 200).unwrap();
        }

        assert_eq!(game.field().occupied_count(), 4);
        assert!(occupied(game.field(), 5, 19));
        assert!(occupied(game.field(), 6, 18));
        assert_eq!(game.status(), GameStatus::Playing);
    }

    #[test]
    fn render_grid_overlays_active_piece() {
        let mut field = empty_field();
        fill_row(&mut field, 19);
        let piece = Tetromino::new_at(ShapeKind::I, 0, 5);
        let game = game_with(field, piece);

        let grid = game.render_grid();

        assert_eq!(grid[5][0], Some(BlockColor::Cyan));
        assert_eq!(grid[19][0], Some(BlockColor::Purple));
        assert_eq!(grid[10][0], None);
        assert_eq!(game.snapshot().cells[5][0], None);
    }
}

// ============================================================================
// Scoring Tests
// ============================================================================

mod scoring {
    use super::*;

    /// Rows 18 and 19 full except column 5, with an I ready to drop in.
    fn double_setup() -> Game<SequenceShapeSource> {
        let mut field = empty_field();
        fill_row_with_gap(&mut field, 18, 5);
        fill_row_with_gap(&mut field, 19, 5);
        game_with(field, Tetromino::new_at(ShapeKind::I, 5, 17))
    }

    #[test]
    fn double_line_scores_table_times_level() {
        let mut game = double_setup();

        game.move_down().unwrap();
        game.move_down().unwrap();

        assert_eq!(
            game.score(),
            ScoreState {
                score: 100,
                level: 1,
                lines: 2
            }
        );
        // The top half of the I dropped by two rows.
        assert_eq!(game.field().occupied_count(), 2);
        assert!(occupied(game.field(), 5, 18));
        assert!(occupied(game.field(), 5, 19));
    }

    #[test]
    fn four_lines_score_without_level_up() {
        let mut field = empty_field();
        for y in 16..20 {
            fill_row_with_gap(&mut field, y, 5);
        }
        let mut game = game_with(field, Tetromino::new_at(ShapeKind::I, 5, 17));

        game.move_down().unwrap();
        game.move_down().unwrap();

        assert_eq!(game.score().score, 1200);
        assert_eq!(game.score().lines, 4);
        assert_eq!(game.score().level, 1);
        assert_eq!(game.field().occupied_count(), 0);
    }

    #[test]
    fn score_listener_called_once_per_clear() {
        let mut game = double_setup();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        game.on_score_changed(move |state| sink.borrow_mut().push(state));

        game.move_down().unwrap();
        assert!(seen.borrow().is_empty());
        game.move_down().unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![ScoreState {
                score: 100,
                level: 1,
                lines: 2
            }]
        );
    }

    #[test]
    fn lock_without_clear_leaves_score() {
        let mut game = game_with(empty_field(), Tetromino::new_at(ShapeKind::O, 4, 19));
        let seen = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&seen);
        game.on_score_changed(move |_| *sink.borrow_mut() += 1);

        game.move_down().unwrap();

        assert_eq!(game.score(), ScoreState::default());
        assert_eq!(*seen.borrow(), 0);
    }

    #[test]
    fn level_up_multiplies_later_clears() {
        let settings = Settings {
            lines_per_level: 1,
            ..Settings::default()
        };
        let mut field = empty_field();
        fill_row_with_gap(&mut field, 19, 5);
        for x in (1..10).filter(|x| *x != 5) {
            field.settle(Block::new(Position::new(x, 18), BlockColor::Red));
        }
        let piece = Tetromino::new_at(ShapeKind::I, 5, 18);
        let mut game = Game::with_field(settings, shapes("I"), field, piece).unwrap();

        // First I sits in the column 5 gap and locks at once.
        game.move_down().unwrap();
        assert_eq!(game.score().level, 2);
        assert_eq!(game.score().score, 40);

        // Row 18 dropped to 19 and now only misses column 0.
        for _ in 0..5 {
            assert!(game.move_horizontal(-1));
        }
        for _ in 0..20 {
            game.move_down().unwrap();
        }

        assert_eq!(
            game.score(),
            ScoreState {
                score: 40 + 40 * 2,
                level: 3,
                lines: 2
            }
        );
        assert!(close_to(game.gravity_interval(), 112.5));
    }

    #[test]
    fn each_level_up_applies_deceleration() {
        let settings = Settings {
            lines_per_level: 1,
            ..Settings::default()
        };
        let mut field = empty_field();
        fill_row_with_gap(&mut field, 19, 5);
        let piece = Tetromino::new_at(ShapeKind::I, 5, 18);
        let mut game = Game::with_field(settings, shapes("I"), field, piece).unwrap();

        // I covers rows 16..=19 and already sits in the gap.
        game.move_down().unwrap();

        assert_eq!(game.score().lines, 1);
        assert_eq!(game.score().level, 2);
        assert_eq!(game.score().score, 40);
        assert!(close_to(game.gravity_interval(), 150.0));
        assert!(game.take_events().contains(&GameEvent::LevelUp(2)));
    }
}

// ============================================================================
// Game Over Tests
// ============================================================================

mod game_over {
    use super::*;

    fn blocked_spawn() -> Game<SequenceShapeSource> {
        let mut field = empty_field();
        field.settle(Block::new(Position::new(5, 0), BlockColor::Red));
        Game::with_field(
            Settings::default(),
            shapes("O"),
            field,
            Tetromino::new(ShapeKind::O, &Settings::default()),
        )
        .unwrap()
    }

    #[test]
    fn lock_above_field_ends_game() {
        let mut game = blocked_spawn();

        game.update(Intents::default(), MS * 200).unwrap();

        assert_eq!(game.status(), GameStatus::GameOver);
        assert!(game.is_game_over());
        assert_eq!(
            game.take_events(),
            vec![GameEvent::PieceLocked, GameEvent::GameOver]
        );
    }

    #[test]
    fn updates_after_game_over_are_noops() {
        let mut game = blocked_spawn();
        game.move_down().unwrap();
        assert!(game.is_game_over());
        game.take_events();
        let frozen = game.snapshot();

        let everything = Intents {
            move_left: true,
            move_right: true,
            rotate: true,
            soft_drop: true,
        };
        for _ in 0..5 {
            game.update(everything, Duration::from_secs(1)).unwrap();
        }
        game.move_down().unwrap();

        assert_eq!(game.snapshot(), frozen);
        assert!(!game.move_horizontal(1));
        assert!(!game.rotate());
        assert!(game.take_events().is_empty());
    }

    #[test]
    fn game_over_skips_row_clear() {
        let mut field = empty_field();
        fill_row_with_gap(&mut field, 2, 5);
        field.settle(Block::new(Position::new(5, 3), BlockColor::Red));
        // I covers column 5, rows -1..=2.
        let piece = Tetromino::new_at(ShapeKind::I, 5, 1);
        let mut game = game_with(field, piece);

        game.move_down().unwrap();

        assert!(game.is_game_over());
        assert!(game.field().is_row_full(2));
        assert_eq!(game.score(), ScoreState::default());
    }
}

// ============================================================================
// Construction Tests
// ============================================================================

mod construction {
    use super::*;

    #[test]
    fn first_piece_comes_from_source() {
        let game = Game::new(Settings::default(), shapes("LJ")).unwrap();

        assert_eq!(game.tetromino().shape(), ShapeKind::L);
        assert_eq!(game.status(), GameStatus::Playing);
        assert_eq!(game.score(), ScoreState::default());
    }

    #[test]
    fn unknown_symbol_is_configuration_error() {
        let result = SequenceShapeSource::from_symbols("IOX");
        assert!(matches!(result, Err(EngineError::UnknownShape('X'))));
    }

    #[test]
    fn invalid_settings_rejected() {
        let settings = Settings {
            columns: 0,
            ..Settings::default()
        };
        let result = Game::new(settings, shapes("I"));
        assert!(matches!(result, Err(EngineError::Configuration(_))));
    }

    #[test]
    fn field_size_must_match_settings() {
        let result = Game::with_field(
            Settings::default(),
            shapes("I"),
            Field::with_size(8, 20),
            Tetromino::new_at(ShapeKind::I, 4, 4),
        );
        assert!(matches!(result, Err(EngineError::Configuration(_))));
    }

    #[test]
    fn custom_field_size_is_respected() {
        let settings = Settings {
            columns: 6,
            rows: 8,
            spawn_offset: (3, -1),
            ..Settings::default()
        };
        let mut game = Game::new(settings, shapes("I")).unwrap();

        for _ in 0..8 {
            game.move_down().unwrap();
        }

        assert_eq!(game.field().occupied_count(), 4);
        assert!(occupied(game.field(), 3, 7));
    }
}
