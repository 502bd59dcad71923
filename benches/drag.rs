use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use grid_resize::logging::{LogEvent, LogSink};
use grid_resize::{
    ColumnConfig, EngineOptions, FrameQueue, LayoutSink, LayoutSynchronizer, Logger,
    LoggingResult, Point, ResizeEngine, Result, SizingState, Strategy, create_resize_engine,
};

#[derive(Clone, Default)]
struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _event: &LogEvent) -> LoggingResult<()> {
        Ok(())
    }
}

struct NullLayout;

impl LayoutSink for NullLayout {
    fn apply_layout(&mut self, state: &SizingState) -> Result<()> {
        black_box(state.total());
        Ok(())
    }
}

const COLUMNS: usize = 12;
const MOVES: i32 = 400;

fn drag_independent(c: &mut Criterion) {
    c.bench_function("drag_independent_400_moves", |b| {
        b.iter(|| {
            let mut engine = build_engine(Strategy::Independent).expect("engine");
            run_drag(&mut engine, None).expect("drag");
        });
    });
}

fn drag_proportional(c: &mut Criterion) {
    c.bench_function("drag_proportional_400_moves", |b| {
        b.iter(|| {
            let mut engine = build_engine(Strategy::Proportional).expect("engine");
            run_drag(&mut engine, None).expect("drag");
        });
    });
}

fn drag_with_synchronizer(c: &mut Criterion) {
    c.bench_function("drag_coalesced_frames", |b| {
        b.iter(|| {
            let mut engine = build_engine(Strategy::Independent).expect("engine");
            let queue = Arc::new(FrameQueue::new());
            let mut sync = LayoutSynchronizer::new(queue.clone(), NullLayout)
                .with_logger(Logger::new(NullSink));
            sync.attach(&engine.store());
            run_drag(&mut engine, Some(&queue)).expect("drag");
            black_box(sync.passes());
        });
    });
}

fn build_engine(strategy: Strategy) -> Result<ResizeEngine> {
    let columns: Vec<ColumnConfig> = (0..COLUMNS)
        .map(|idx| ColumnConfig::new(format!("col{idx}"), 120).with_min(24))
        .collect();
    let options = EngineOptions::default()
        .with_strategy(strategy)
        .with_logger(Logger::new(NullSink));
    create_resize_engine(&columns, options)
}

/// Sweep the third column's edge out and back, draining one frame every
/// eight moves when a queue is given.
fn run_drag(engine: &mut ResizeEngine, frames: Option<&FrameQueue>) -> Result<()> {
    let start = Point::new(360, 0);
    engine.begin_drag("col2", start)?;
    for step in 0..MOVES {
        let offset = if step < MOVES / 2 { step } else { MOVES - step };
        engine.update_drag(Point::new(start.x + black_box(offset), 0))?;
        if let Some(queue) = frames {
            if step % 8 == 0 {
                queue.run_frame();
            }
        }
    }
    engine.end_drag()?;
    if let Some(queue) = frames {
        queue.run_frame();
    }
    Ok(())
}

criterion_group!(benches, drag_independent, drag_proportional, drag_with_synchronizer);
criterion_main!(benches);
