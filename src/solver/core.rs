use crate::error::{ResizeError, Result};
use crate::model::{Column, LayoutMode, ResizeDelta, Strategy, WidthMap};

const EPSILON: f64 = 1e-9;

/// Apply `delta` to the anchor widths under `strategy`.
///
/// Under [`LayoutMode::Fixed`] the result always sums to `container_width`
/// exactly; the anchor is fit to the container first when it does not.
pub fn solve(
    anchor: &WidthMap,
    columns: &[Column],
    delta: &ResizeDelta,
    strategy: Strategy,
    container_width: u32,
    layout_mode: LayoutMode,
) -> Result<WidthMap> {
    if strategy == Strategy::Auto && layout_mode == LayoutMode::Fixed {
        return Err(ResizeError::IncompatibleStrategy {
            strategy,
            layout_mode,
        });
    }
    check_alignment(anchor, columns)?;

    let target = columns
        .iter()
        .position(|column| column.id == delta.column_id)
        .ok_or_else(|| ResizeError::UnknownColumn(delta.column_id.clone()))?;

    let base = match layout_mode {
        LayoutMode::Fixed => fit_to_container(anchor, columns, container_width)?,
        LayoutMode::Auto => anchor.clone(),
    };
    let mut segments = build_segments(&base, columns);

    let start = segments[target].width;
    let desired = segments[target].clamp(start + delta.delta_pixels);
    let requested = desired - start;

    if layout_mode == LayoutMode::Auto || strategy == Strategy::Auto {
        segments[target].width = desired;
        return Ok(finalize(columns, &segments, None, &[target]));
    }

    let (order, unabsorbed) = if strategy == Strategy::Proportional {
        absorb_proportionally(&mut segments, target, -requested)
    } else {
        absorb_by_neighbor(&mut segments, target, -requested)
    };

    // Whatever the neighbors could not take comes back off the target.
    segments[target].width = start + requested + unabsorbed;

    // Target goes first so the residual lands on the redistribution order.
    let mut correction_order = vec![target];
    correction_order.extend(order);
    Ok(finalize(
        columns,
        &segments,
        Some(i64::from(container_width)),
        &correction_order,
    ))
}

/// Grow or shrink widths so they sum to `container`.
///
/// Slack goes to growable columns first, then any resizable column, then
/// any column at all, each in proportion to its current width and clamped to
/// its bounds.
pub fn fit_to_container(widths: &WidthMap, columns: &[Column], container: u32) -> Result<WidthMap> {
    check_alignment(widths, columns)?;

    let min_total: u64 = columns.iter().map(|c| u64::from(c.min_width)).sum();
    let max_total: Option<u64> = columns
        .iter()
        .map(|c| c.max_width.map(u64::from))
        .sum::<Option<u64>>();
    let container_total = u64::from(container);
    if container_total < min_total || max_total.is_some_and(|max| container_total > max) {
        return Err(ResizeError::InfeasibleLayout {
            container,
            min: min_total,
            max: max_total.unwrap_or(u64::MAX),
        });
    }

    let mut segments = build_segments(widths, columns);
    for segment in segments.iter_mut() {
        segment.width = segment.clamp(segment.width);
    }

    let current: f64 = segments.iter().map(|s| s.width).sum();
    let mut remaining = f64::from(container) - current;

    let tiers: [fn(&Segment) -> bool; 3] = [
        |s| s.growable && s.can_resize,
        |s| s.can_resize,
        |_| true,
    ];
    for tier in tiers {
        if remaining.abs() <= EPSILON {
            break;
        }
        let members: Vec<usize> = (0..segments.len())
            .filter(|&idx| tier(&segments[idx]))
            .collect();
        remaining = spread(&mut segments, &members, remaining);
    }

    let order: Vec<usize> = (0..segments.len()).collect();
    Ok(finalize(
        columns,
        &segments,
        Some(i64::from(container)),
        &order,
    ))
}

#[derive(Debug, Clone)]
struct Segment {
    width: f64,
    min: f64,
    max: f64,
    weight: f64,
    can_resize: bool,
    growable: bool,
}

impl Segment {
    fn clamp(&self, width: f64) -> f64 {
        width.max(self.min).min(self.max)
    }

    fn room(&self, direction: f64) -> f64 {
        if direction > 0.0 {
            self.max - self.width
        } else {
            self.width - self.min
        }
    }
}

fn check_alignment(widths: &WidthMap, columns: &[Column]) -> Result<()> {
    if widths.len() != columns.len() {
        return Err(ResizeError::InvalidConstraint(format!(
            "{} widths supplied for {} columns",
            widths.len(),
            columns.len()
        )));
    }
    for column in columns {
        if !widths.contains(&column.id) {
            return Err(ResizeError::MissingWidth(column.id.clone()));
        }
    }
    Ok(())
}

fn build_segments(widths: &WidthMap, columns: &[Column]) -> Vec<Segment> {
    columns
        .iter()
        .map(|column| {
            let width = f64::from(widths.get(&column.id).unwrap_or(column.default_width));
            Segment {
                width,
                min: f64::from(column.min_width),
                max: column.max_or_unbounded(),
                weight: width,
                can_resize: column.can_resize,
                growable: column.growable,
            }
        })
        .collect()
}

/// Independent strategy: the nearest resizable neighbor takes the slack,
/// spilling further out once it hits a bound. Returns the visit order and the
/// signed amount nobody could absorb.
fn absorb_by_neighbor(segments: &mut [Segment], target: usize, amount: f64) -> (Vec<usize>, f64) {
    let order: Vec<usize> = if target + 1 < segments.len() {
        (target + 1..segments.len()).collect()
    } else {
        (0..target).rev().collect()
    };

    let mut remaining = amount;
    let mut visited = Vec::new();
    for &idx in &order {
        if remaining.abs() <= EPSILON {
            break;
        }
        let segment = &mut segments[idx];
        if !segment.can_resize {
            continue;
        }
        let next = segment.clamp(segment.width + remaining);
        remaining -= next - segment.width;
        segment.width = next;
        visited.push(idx);
    }

    (visited, remaining)
}

/// Proportional strategy: every other growable, resizable column takes a share
/// of the slack weighted by its anchor width.
fn absorb_proportionally(
    segments: &mut [Segment],
    target: usize,
    amount: f64,
) -> (Vec<usize>, f64) {
    let members: Vec<usize> = (0..segments.len())
        .filter(|&idx| idx != target && segments[idx].growable && segments[idx].can_resize)
        .collect();
    let remaining = spread(segments, &members, amount);
    (members, remaining)
}

/// Water-fill `amount` across `members`, weighted by anchor width. Members
/// that saturate drop out and the rest is re-split among the others until
/// nothing is left or nobody has room. Returns the unabsorbed remainder.
fn spread(segments: &mut [Segment], members: &[usize], amount: f64) -> f64 {
    let mut remaining = amount;
    let mut active: Vec<usize> = members
        .iter()
        .copied()
        .filter(|&idx| segments[idx].room(remaining) > EPSILON)
        .collect();

    while remaining.abs() > EPSILON && !active.is_empty() {
        let total_weight: f64 = active.iter().map(|&idx| segments[idx].weight).sum();
        let equal_share = total_weight <= EPSILON;
        let round_amount = remaining;
        let mut saturated = false;

        for &idx in &active {
            let segment = &mut segments[idx];
            let share = if equal_share {
                round_amount / active.len() as f64
            } else {
                round_amount * segment.weight / total_weight
            };
            let next = segment.clamp(segment.width + share);
            if (next - (segment.width + share)).abs() > EPSILON {
                saturated = true;
            }
            remaining -= next - segment.width;
            segment.width = next;
        }

        if !saturated {
            break;
        }
        active.retain(|&idx| segments[idx].room(remaining) > EPSILON);
    }

    remaining
}

/// Round once to integers and, when a total is required, push the rounding
/// residual onto the last column in `correction_order` that has room.
fn finalize(
    columns: &[Column],
    segments: &[Segment],
    expected_total: Option<i64>,
    correction_order: &[usize],
) -> WidthMap {
    let mut rounded: Vec<i64> = segments
        .iter()
        .map(|segment| segment.width.round() as i64)
        .collect();

    if let Some(expected) = expected_total {
        let mut residual = expected - rounded.iter().sum::<i64>();
        for &idx in correction_order.iter().rev() {
            if residual == 0 {
                break;
            }
            let column = &columns[idx];
            let current = rounded[idx];
            let bounded = if residual > 0 {
                let ceiling = column.max_width.map(i64::from).unwrap_or(i64::MAX);
                (current + residual).min(ceiling)
            } else {
                (current + residual).max(i64::from(column.min_width))
            };
            residual -= bounded - current;
            rounded[idx] = bounded;
        }
    }

    WidthMap::from_pairs(
        columns
            .iter()
            .zip(rounded)
            .map(|(column, width)| (column.id.clone(), width.clamp(0, i64::from(u32::MAX)) as u32)),
    )
}
