// Nearest-point resolution - time bisection and a screen-space grid partition
use crate::domain::sample::{SampleField, SampleRecord};

/// Index of the sample closest in time to `ts`. The earlier neighbour only
/// wins when strictly closer; ties go to the later sample.
pub fn nearest_sample(samples: &[SampleRecord], ts: i64) -> Option<usize> {
    match samples.len() {
        0 => None,
        1 => Some(0),
        len => {
            let n = samples.partition_point(|s| s.ts < ts).clamp(1, len - 1);
            let before = ts.saturating_sub(samples[n - 1].ts);
            let after = samples[n].ts.saturating_sub(ts);
            Some(if before < after { n - 1 } else { n })
        }
    }
}

/// A rendered data point in chart-local screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
    pub sample: usize,
    pub series: SampleField,
}

impl ScreenPoint {
    fn dist2(&self, x: f64, y: f64) -> f64 {
        let (dx, dy) = (self.x - x, self.y - y);
        dx * dx + dy * dy
    }
}

/// Uniform grid over the rendered points, roughly one point per cell.
#[derive(Debug, Clone)]
pub struct PointGrid {
    points: Vec<ScreenPoint>,
    cells: Vec<Vec<usize>>,
    cols: usize,
    rows: usize,
    origin: (f64, f64),
    cell: (f64, f64),
}

impl PointGrid {
    /// Builds the partition; points with non-finite coordinates (null
    /// values) are left out.
    pub fn build(points: impl IntoIterator<Item = ScreenPoint>) -> Self {
        let points: Vec<ScreenPoint> = points
            .into_iter()
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .collect();

        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in &points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        if points.is_empty() {
            (min_x, min_y, max_x, max_y) = (0.0, 0.0, 0.0, 0.0);
        }

        let side = ((points.len() as f64).sqrt().ceil() as usize).max(1);
        let span = |lo: f64, hi: f64| if hi > lo { (hi - lo) / side as f64 } else { 1.0 };

        let mut grid = Self {
            points: Vec::new(),
            cells: vec![Vec::new(); side * side],
            cols: side,
            rows: side,
            origin: (min_x, min_y),
            cell: (span(min_x, max_x), span(min_y, max_y)),
        };
        for (i, p) in points.iter().enumerate() {
            let (cx, cy) = grid.cell_of(p.x, p.y);
            grid.cells[cy * grid.cols + cx].push(i);
        }
        grid.points = points;
        grid
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> Option<&ScreenPoint> {
        self.points.get(index)
    }

    fn cell_of(&self, x: f64, y: f64) -> (usize, usize) {
        let clamp = |v: f64, origin: f64, size: f64, n: usize| {
            let c = ((v - origin) / size).floor();
            if c <= 0.0 { 0 } else { (c as usize).min(n - 1) }
        };
        (
            clamp(x, self.origin.0, self.cell.0, self.cols),
            clamp(y, self.origin.1, self.cell.1, self.rows),
        )
    }

    /// Squared distance from (x, y) to the nearest edge of the block of
    /// cells within `ring` of (cx, cy); zero if the query lies outside it.
    fn ring_bound2(&self, x: f64, y: f64, (cx, cy): (usize, usize), ring: usize) -> f64 {
        let left = self.origin.0 + (cx as f64 - ring as f64) * self.cell.0;
        let right = self.origin.0 + (cx + ring + 1) as f64 * self.cell.0;
        let top = self.origin.1 + (cy as f64 - ring as f64) * self.cell.1;
        let bottom = self.origin.1 + (cy + ring + 1) as f64 * self.cell.1;
        let d = (x - left).min(right - x).min(y - top).min(bottom - y);
        if d > 0.0 { d * d } else { 0.0 }
    }

    /// Index of the point nearest to (x, y). `hint` (usually the previous
    /// answer) only seeds the search bound; any hint, stale or out of
    /// range, gives the same distance as a cold query.
    pub fn find(&self, x: f64, y: f64, hint: Option<usize>) -> Option<usize> {
        if self.points.is_empty() || !x.is_finite() || !y.is_finite() {
            return None;
        }
        let mut best = hint
            .filter(|i| *i < self.points.len())
            .map(|i| (i, self.points[i].dist2(x, y)));

        let center = self.cell_of(x, y);
        let max_ring = self.cols.max(self.rows);
        for ring in 0..=max_ring {
            self.scan_ring(x, y, center, ring, &mut best);
            if let Some((_, d2)) = best {
                if self.ring_bound2(x, y, center, ring) >= d2 {
                    break;
                }
            }
        }
        best.map(|(i, _)| i)
    }

    fn scan_ring(&self, x: f64, y: f64, (cx, cy): (usize, usize), ring: usize, best: &mut Option<(usize, f64)>) {
        let (cx, cy, r) = (cx as isize, cy as isize, ring as isize);
        for gy in (cy - r)..=(cy + r) {
            if gy < 0 || gy >= self.rows as isize {
                continue;
            }
            for gx in (cx - r)..=(cx + r) {
                let on_ring = gy == cy - r || gy == cy + r || gx == cx - r || gx == cx + r;
                if !on_ring || gx < 0 || gx >= self.cols as isize {
                    continue;
                }
                for &i in &self.cells[gy as usize * self.cols + gx as usize] {
                    let d2 = self.points[i].dist2(x, y);
                    if best.is_none_or(|(_, b)| d2 < b) {
                        *best = Some((i, d2));
                    }
                }
            }
        }
    }
}

/// Match for one cursor position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestMatch {
    pub sample: usize,
    pub series: Option<SampleField>,
}

/// Per-render resolver: owns the grid and the last-found point.
#[derive(Debug, Clone)]
pub struct NearestResolver {
    grid: PointGrid,
    last: Option<usize>,
}

impl NearestResolver {
    pub fn new(points: impl IntoIterator<Item = ScreenPoint>) -> Self {
        let grid = PointGrid::build(points);
        tracing::debug!("Built nearest-point grid over {} points", grid.len());
        Self { grid, last: None }
    }

    pub fn grid(&self) -> &PointGrid {
        &self.grid
    }

    /// Nearest series at (x, y), reusing the previous answer as a hint.
    pub fn nearest_series(&mut self, x: f64, y: f64) -> Option<SampleField> {
        let found = self.grid.find(x, y, self.last)?;
        self.last = Some(found);
        self.grid.point(found).map(|p| p.series)
    }

    /// Resolves the time-nearest sample for `ts` and the space-nearest
    /// series for (x, y).
    pub fn resolve(&mut self, samples: &[SampleRecord], ts: i64, x: f64, y: f64) -> Option<NearestMatch> {
        let sample = nearest_sample(samples, ts)?;
        Some(NearestMatch {
            sample,
            series: self.nearest_series(x, y),
        })
    }
}
