//! Property tests for the solver and the drag lifecycle.
//!
//! - Every solved width stays inside its column's bounds
//! - Fixed layout keeps the container total exact
//! - Solving is deterministic
//! - Store versions only increase
//! - Cancelling a drag restores the pre-drag widths exactly

use grid_resize::{
    Column, ColumnConfig, EngineOptions, LayoutMode, Point, ResizeDelta, WidthMap,
    create_resize_engine, solve,
};
use proptest::prelude::*;

fn arb_column(index: usize) -> impl Strategy<Value = ColumnConfig> {
    (40u32..240, 0u32..40, prop::option::of(0u32..120), any::<bool>()).prop_map(
        move |(width, slack_below, slack_above, growable)| {
            let mut config = ColumnConfig::new(format!("c{index}"), width)
                .with_min(width.saturating_sub(slack_below).max(1))
                .growable(growable);
            if let Some(above) = slack_above {
                config = config.with_max(width + above);
            }
            config
        },
    )
}

fn arb_columns() -> impl Strategy<Value = Vec<ColumnConfig>> {
    (2usize..7).prop_flat_map(|count| {
        (0..count).map(arb_column).collect::<Vec<_>>()
    })
}

fn arb_strategy() -> impl Strategy<Value = grid_resize::Strategy> {
    prop_oneof![
        Just(grid_resize::Strategy::Independent),
        Just(grid_resize::Strategy::Proportional),
    ]
}

fn resolve(configs: &[ColumnConfig]) -> Vec<Column> {
    Column::resolve_all(configs, 40, 150).unwrap()
}

fn anchor_of(columns: &[Column]) -> WidthMap {
    WidthMap::from_pairs(columns.iter().map(|c| (c.id.clone(), c.default_width)))
}

proptest! {
    /// Property: solved widths respect min and max
    #[test]
    fn prop_widths_stay_in_bounds(
        configs in arb_columns(),
        target in any::<prop::sample::Index>(),
        delta in -400.0f64..400.0,
        strategy in arb_strategy(),
        fixed in any::<bool>(),
    ) {
        let columns = resolve(&configs);
        let anchor = anchor_of(&columns);
        let container = u32::try_from(anchor.total()).unwrap();
        let target = &columns[target.index(columns.len())];
        let layout = if fixed { LayoutMode::Fixed } else { LayoutMode::Auto };

        let delta = ResizeDelta::new(target.id.clone(), delta);
        let out = solve(&anchor, &columns, &delta, strategy, container, layout).unwrap();
        for column in &columns {
            let width = out.get(&column.id).unwrap();
            prop_assert!(column.contains(width), "{} = {} outside bounds", column.id, width);
        }
    }

    /// Property: fixed layout never changes the total
    #[test]
    fn prop_fixed_total_is_preserved(
        configs in arb_columns(),
        target in any::<prop::sample::Index>(),
        delta in -400.0f64..400.0,
        strategy in arb_strategy(),
    ) {
        let columns = resolve(&configs);
        let anchor = anchor_of(&columns);
        let container = u32::try_from(anchor.total()).unwrap();
        let target = &columns[target.index(columns.len())];

        let delta = ResizeDelta::new(target.id.clone(), delta);
        let out = solve(&anchor, &columns, &delta, strategy, container, LayoutMode::Fixed).unwrap();
        prop_assert_eq!(out.total(), anchor.total());
    }

    /// Property: identical inputs give identical outputs
    #[test]
    fn prop_solve_is_deterministic(
        configs in arb_columns(),
        target in any::<prop::sample::Index>(),
        delta in -400.0f64..400.0,
        strategy in arb_strategy(),
    ) {
        let columns = resolve(&configs);
        let anchor = anchor_of(&columns);
        let container = u32::try_from(anchor.total()).unwrap();
        let delta = ResizeDelta::new(columns[target.index(columns.len())].id.clone(), delta);

        let first = solve(&anchor, &columns, &delta, strategy, container, LayoutMode::Fixed).unwrap();
        let second = solve(&anchor, &columns, &delta, strategy, container, LayoutMode::Fixed).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Property: every successful write yields a larger version
    #[test]
    fn prop_versions_increase(
        configs in arb_columns(),
        writes in prop::collection::vec((any::<prop::sample::Index>(), 1u32..400), 1..20),
    ) {
        let mut engine = create_resize_engine(&configs, EngineOptions::default()).unwrap();
        let mut last = engine.store().version();
        for (index, width) in writes {
            let id = configs[index.index(configs.len())].id.clone();
            let version = engine.set_column_width(&id, width).unwrap();
            prop_assert!(version > last);
            last = version;
        }
    }

    /// Property: cancel leaves the widths exactly as they were before the drag
    #[test]
    fn prop_cancel_restores_exactly(
        configs in arb_columns(),
        target in any::<prop::sample::Index>(),
        moves in prop::collection::vec(-300i32..300, 1..30),
        strategy in arb_strategy(),
    ) {
        let options = EngineOptions::default().with_strategy(strategy);
        let mut engine = create_resize_engine(&configs, options).unwrap();
        let before = engine.state().widths.clone();
        let id = configs[target.index(configs.len())].id.clone();

        engine.begin_drag(&id, Point::new(0, 0)).unwrap();
        for x in moves {
            engine.update_drag(Point::new(x, 0)).unwrap();
        }
        engine.cancel_drag().unwrap();

        prop_assert_eq!(&engine.state().widths, &before);
        prop_assert!(engine.active_column().is_none());
    }
}
