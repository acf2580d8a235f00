//! Decision-boundary extraction (marching squares).
//!
//! A classifier is turned into a [`ScalarField`] whose zero level-set is its
//! decision boundary. The field is sampled on a regular `(steps + 1) x (steps + 1)`
//! grid over a rectangular [`Domain`] and every grid cell contributes zero, one or
//! two independent [`Segment`]s.
//!
//! Segments are not stitched into polylines: consumers must not assume they are
//! contiguous or ordered.
//!
//! Saddle cells (diagonal corners agreeing, adjacent corners disagreeing) are
//! resolved by a fixed table entry, not by sampling the cell center.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::check_steps;
use crate::{Error, Result};

/// Below this magnitude a linear field's second coefficient is treated as zero
/// and its boundary is drawn as a vertical line.
pub const DEGENERATE_SLOPE_EPS: f64 = 1e-6;

/// A point in domain coordinates.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One straight piece of a boundary.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    #[inline]
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn length(&self) -> f64 {
        (self.end.x - self.start.x).hypot(self.end.y - self.start.y)
    }
}

/// Axis-aligned rectangle the field is sampled over.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Default for Domain {
    fn default() -> Self {
        Self::square(1.5)
    }
}

impl Domain {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Result<Self> {
        let domain = Self {
            x_min,
            x_max,
            y_min,
            y_max,
        };
        domain.validate()?;
        Ok(domain)
    }

    /// `[-half, half] x [-half, half]`.
    pub const fn square(half: f64) -> Self {
        Self {
            x_min: -half,
            x_max: half,
            y_min: -half,
            y_max: half,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let all_finite = [self.x_min, self.x_max, self.y_min, self.y_max]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(Error::InvalidConfig("domain bounds must be finite".to_owned()));
        }
        if self.x_min >= self.x_max || self.y_min >= self.y_max {
            return Err(Error::InvalidConfig(format!(
                "domain must have min < max on both axes, got x [{}, {}], y [{}, {}]",
                self.x_min, self.x_max, self.y_min, self.y_max
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        (self.x_min..=self.x_max).contains(&p.x) && (self.y_min..=self.y_max).contains(&p.y)
    }
}

/// A signed "distance from the boundary" function of two inputs.
///
/// Any `Fn(f64, f64) -> f64` closure is a field.
pub trait ScalarField {
    fn value(&self, x1: f64, x2: f64) -> f64;

    /// The coefficients, when the field is known to be linear.
    fn as_linear(&self) -> Option<LinearField> {
        None
    }
}

impl<F> ScalarField for F
where
    F: Fn(f64, f64) -> f64,
{
    #[inline]
    fn value(&self, x1: f64, x2: f64) -> f64 {
        self(x1, x2)
    }
}

/// `w0 * x1 + w1 * x2 + b`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearField {
    pub w0: f64,
    pub w1: f64,
    pub b: f64,
}

impl ScalarField for LinearField {
    #[inline]
    fn value(&self, x1: f64, x2: f64) -> f64 {
        self.w0.mul_add(x1, self.w1.mul_add(x2, self.b))
    }

    fn as_linear(&self) -> Option<LinearField> {
        Some(*self)
    }
}

impl LinearField {
    pub const fn new(w0: f64, w1: f64, b: f64) -> Self {
        Self { w0, w1, b }
    }

    /// Builds the field from a 2-element weight vector.
    pub fn from_weights(w: &[f64], b: f64) -> Result<Self> {
        match *w {
            [w0, w1] => Ok(Self::new(w0, w1, b)),
            _ => Err(Error::DimensionMismatch {
                expected: 2,
                got: w.len(),
            }),
        }
    }

    #[inline]
    pub fn is_vertical(&self) -> bool {
        self.w1.abs() < DEGENERATE_SLOPE_EPS
    }

    /// The boundary as one closed-form segment spanning the domain's x range.
    ///
    /// When the field is vertical the line is `x = -b / w0`, spanning the y range;
    /// `None` if `w0 == 0` too or the line falls outside the domain. The
    /// non-vertical case is not clipped against the y range.
    pub fn line(&self, domain: &Domain) -> Option<Segment> {
        if self.is_vertical() {
            if self.w0 == 0.0 {
                return None;
            }
            let x = -self.b / self.w0;
            if !(domain.x_min..=domain.x_max).contains(&x) {
                return None;
            }
            return Some(Segment::new(
                Point::new(x, domain.y_min),
                Point::new(x, domain.y_max),
            ));
        }

        let y_at = |x: f64| -(self.w0 * x + self.b) / self.w1;
        Some(Segment::new(
            Point::new(domain.x_min, y_at(domain.x_min)),
            Point::new(domain.x_max, y_at(domain.x_max)),
        ))
    }
}

/// Sampling settings used by the boundary views.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourConfig {
    pub domain: Domain,
    pub steps: usize,
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            domain: Domain::default(),
            steps: 48,
        }
    }
}

impl ContourConfig {
    pub fn validate(&self) -> Result<()> {
        check_steps(self.steps)?;
        self.domain.validate()
    }

    pub fn extract<F: ScalarField + ?Sized>(&self, field: &F) -> Result<Vec<Segment>> {
        extract_contour(field, &self.domain, self.steps)
    }
}

/// Samples `field` on the `(steps + 1) x (steps + 1)` grid.
///
/// `grid[j][i]` is the value at `(x_min + i * dx, y_min + j * dy)`, so rows run
/// bottom to top.
pub fn sample_grid<F: ScalarField + ?Sized>(
    field: &F,
    domain: &Domain,
    steps: usize,
) -> Result<Vec<Vec<f64>>> {
    check_steps(steps)?;
    domain.validate()?;

    let dx = (domain.x_max - domain.x_min) / steps as f64;
    let dy = (domain.y_max - domain.y_min) / steps as f64;
    let grid = (0..=steps)
        .map(|j| {
            let y = domain.y_min + j as f64 * dy;
            (0..=steps)
                .map(|i| field.value(domain.x_min + i as f64 * dx, y))
                .collect()
        })
        .collect();
    Ok(grid)
}

/// Extracts the zero level-set of `field` as independent line segments.
///
/// Linear fields whose second coefficient is within [`DEGENERATE_SLOPE_EPS`] of
/// zero skip the grid and return their vertical line directly.
pub fn extract_contour<F: ScalarField + ?Sized>(
    field: &F,
    domain: &Domain,
    steps: usize,
) -> Result<Vec<Segment>> {
    check_steps(steps)?;
    domain.validate()?;

    if let Some(linear) = field.as_linear() {
        if linear.is_vertical() {
            return Ok(linear.line(domain).into_iter().collect());
        }
    }

    let grid = sample_grid(field, domain, steps)?;
    let dx = (domain.x_max - domain.x_min) / steps as f64;
    let dy = (domain.y_max - domain.y_min) / steps as f64;

    let mut segments = Vec::new();
    for j in 0..steps {
        let y0 = domain.y_min + j as f64 * dy;
        let y1 = domain.y_min + (j + 1) as f64 * dy;
        for i in 0..steps {
            let x0 = domain.x_min + i as f64 * dx;
            let x1 = domain.x_min + (i + 1) as f64 * dx;
            let cell = Cell {
                x0,
                y0,
                x1,
                y1,
                tl: grid[j + 1][i],
                tr: grid[j + 1][i + 1],
                br: grid[j][i + 1],
                bl: grid[j][i],
            };
            for &(a, b) in CASES[cell.case_index()] {
                segments.push(Segment::new(cell.crossing(a), cell.crossing(b)));
            }
        }
    }

    tracing::trace!(steps, segments = segments.len(), "contour extracted");
    Ok(segments)
}

/// Cell edges, named by the corners they join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    /// TL - TR, at `y1`.
    Top,
    /// TR - BR, at `x1`.
    Right,
    /// BR - BL, at `y0`.
    Bottom,
    /// BL - TL, at `x0`.
    Left,
}

use Edge::{Bottom, Left, Right, Top};

/// Edge pairs crossed by the contour, indexed by `TL=8 | TR=4 | BR=2 | BL=1`
/// (bit set when the corner value is `>= 0`).
///
/// 5 and 10 are the saddle cases.
const CASES: [&[(Edge, Edge)]; 16] = [
    &[],
    &[(Left, Bottom)],
    &[(Bottom, Right)],
    &[(Left, Right)],
    &[(Top, Right)],
    &[(Top, Left), (Bottom, Right)],
    &[(Top, Bottom)],
    &[(Top, Left)],
    &[(Top, Left)],
    &[(Top, Bottom)],
    &[(Top, Right), (Bottom, Left)],
    &[(Top, Right)],
    &[(Right, Left)],
    &[(Bottom, Right)],
    &[(Left, Bottom)],
    &[],
];

struct Cell {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    tl: f64,
    tr: f64,
    br: f64,
    bl: f64,
}

impl Cell {
    fn case_index(&self) -> usize {
        let bit = |v: f64, weight: usize| if v >= 0.0 { weight } else { 0 };
        bit(self.tl, 8) | bit(self.tr, 4) | bit(self.br, 2) | bit(self.bl, 1)
    }

    fn crossing(&self, edge: Edge) -> Point {
        match edge {
            Top => Point::new(interp(self.x0, self.x1, self.tl, self.tr), self.y1),
            Right => Point::new(self.x1, interp(self.y1, self.y0, self.tr, self.br)),
            Bottom => Point::new(interp(self.x1, self.x0, self.br, self.bl), self.y0),
            Left => Point::new(self.x0, interp(self.y0, self.y1, self.bl, self.tl)),
        }
    }
}

/// Zero crossing between `a` (value `va`) and `b` (value `vb`).
#[inline]
fn interp(a: f64, b: f64, va: f64, vb: f64) -> f64 {
    if va == vb {
        return 0.5 * (a + b);
    }
    a + (b - a) * (va / (va - vb))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Domain {
        Domain::square(1.0)
    }

    #[test]
    fn case_table_pairs_match_corner_signs() {
        // Every edge listed for a case must join one inside and one outside corner.
        for (idx, pairs) in CASES.iter().enumerate() {
            let inside = |bit: usize| idx & bit != 0;
            let crosses = |e: Edge| match e {
                Top => inside(8) != inside(4),
                Right => inside(4) != inside(2),
                Bottom => inside(2) != inside(1),
                Left => inside(1) != inside(8),
            };
            for &(a, b) in *pairs {
                assert!(crosses(a) && crosses(b), "case {idx}: {a:?}/{b:?}");
            }
            let crossed = [Top, Right, Bottom, Left]
                .into_iter()
                .filter(|&e| crosses(e))
                .count();
            assert_eq!(crossed, pairs.len() * 2, "case {idx}");
        }
    }

    #[test]
    fn positive_field_has_no_boundary() {
        let segs = extract_contour(&|_: f64, _: f64| 1.0, &unit(), 10).unwrap();
        assert!(segs.is_empty());
    }

    #[test]
    fn vertical_line_from_sampled_field() {
        let segs = extract_contour(&|x1: f64, _: f64| x1, &unit(), 4).unwrap();
        assert_eq!(segs.len(), 4);
        for s in &segs {
            assert!(s.start.x.abs() < 1e-12);
            assert!(s.end.x.abs() < 1e-12);
        }
        let covered: f64 = segs.iter().map(Segment::length).sum();
        assert!((covered - 2.0).abs() < 1e-9);
    }

    #[test]
    fn diagonal_field_crossings_lie_on_the_line() {
        let field = LinearField::new(1.0, 1.0, -0.25);
        let segs = extract_contour(&field, &unit(), 12).unwrap();
        assert!(!segs.is_empty());
        for s in segs {
            for p in [s.start, s.end] {
                assert!(field.value(p.x, p.y).abs() < 1e-9, "{p:?}");
            }
        }
    }

    #[test]
    fn degenerate_slope_returns_direct_vertical_line() {
        let field = LinearField::new(2.0, 1e-9, -1.0);
        let segs = extract_contour(&field, &unit(), 8).unwrap();
        assert_eq!(
            segs,
            vec![Segment::new(Point::new(0.5, -1.0), Point::new(0.5, 1.0))]
        );

        // Both coefficients zero: constant field, nothing to draw.
        let flat = LinearField::new(0.0, 0.0, 0.3);
        assert!(extract_contour(&flat, &unit(), 8).unwrap().is_empty());

        // Vertical line outside the domain.
        let far = LinearField::new(1.0, 0.0, -5.0);
        assert!(far.line(&unit()).is_none());
    }

    #[test]
    fn non_vertical_line_spans_x_range() {
        let line = LinearField::new(1.0, 2.0, 0.0).line(&unit()).unwrap();
        assert_eq!(line.start, Point::new(-1.0, 0.5));
        assert_eq!(line.end, Point::new(1.0, -0.5));
    }

    #[test]
    fn circle_contour_stays_near_radius() {
        let circle = |x: f64, y: f64| 0.5 - (x * x + y * y).sqrt();
        let segs = extract_contour(&circle, &unit(), 40).unwrap();
        assert!(segs.len() > 20);
        for s in segs {
            let r = s.start.x.hypot(s.start.y);
            assert!((r - 0.5).abs() < 0.05, "r = {r}");
        }
    }

    #[test]
    fn saddle_cell_uses_fixed_table_entry() {
        // TL +, TR -, BR +, BL -: case 10, no center sampling.
        let cell = Cell {
            x0: 0.0,
            y0: 0.0,
            x1: 1.0,
            y1: 1.0,
            tl: 1.0,
            tr: -1.0,
            br: 1.0,
            bl: -1.0,
        };
        assert_eq!(cell.case_index(), 10);
        assert_eq!(CASES[10], &[(Top, Right), (Bottom, Left)]);
        assert_eq!(cell.crossing(Top), Point::new(0.5, 1.0));
        assert_eq!(cell.crossing(Right), Point::new(1.0, 0.5));
        assert_eq!(cell.crossing(Bottom), Point::new(0.5, 0.0));
        assert_eq!(cell.crossing(Left), Point::new(0.0, 0.5));
    }

    #[test]
    fn equal_corner_values_interpolate_to_midpoint() {
        assert_eq!(interp(0.0, 1.0, 0.0, 0.0), 0.5);
        assert_eq!(interp(0.0, 1.0, 1.0, -1.0), 0.5);
        assert_eq!(interp(0.0, 1.0, -1.0, 3.0), 0.25);
    }

    #[test]
    fn invalid_grid_settings() {
        assert!(matches!(
            extract_contour(&|x: f64, _: f64| x, &unit(), 1),
            Err(Error::InvalidConfig(_))
        ));
        let bad = Domain::square(-1.0);
        assert!(extract_contour(&|x: f64, _: f64| x, &bad, 4).is_err());
        assert!(Domain::new(0.0, f64::NAN, 0.0, 1.0).is_err());
    }

    #[test]
    fn sample_grid_rows_run_bottom_to_top() {
        let grid = sample_grid(&|_: f64, y: f64| y, &unit(), 2).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[0], vec![-1.0, -1.0, -1.0]);
        assert_eq!(grid[2], vec![1.0, 1.0, 1.0]);
    }
}
