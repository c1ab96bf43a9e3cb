//! Expanding ring search for walkable landing cells.

use delve_common::LocalCoord;

use crate::chunk::TileGrid;

/// Default search radius used by the navigator.
pub const DEFAULT_RING_RADIUS: u8 = 4;

/// Distance metric that defines a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RingMetric {
    /// Square rings: `max(|dx|, |dy|) == r`
    #[default]
    Chebyshev,
    /// Diamond rings: `|dx| + |dy| == r`
    Manhattan,
}

impl RingMetric {
    const fn distance(self, dx: i32, dy: i32) -> u32 {
        let (ax, ay) = (dx.unsigned_abs(), dy.unsigned_abs());
        match self {
            Self::Chebyshev => {
                if ax > ay {
                    ax
                } else {
                    ay
                }
            },
            Self::Manhattan => ax + ay,
        }
    }
}

/// Offsets of rings 1..=max, ring by ring, each ordered by `dy` then `dx`.
#[derive(Debug, Clone)]
pub struct RingOffsets {
    metric: RingMetric,
    max_radius: i32,
    radius: i32,
    dy: i32,
    dx: i32,
}

impl RingOffsets {
    /// Creates the iterator.
    #[must_use]
    pub fn new(max_radius: u8, metric: RingMetric) -> Self {
        Self {
            metric,
            max_radius: i32::from(max_radius),
            radius: 1,
            dy: -1,
            dx: -1,
        }
    }
}

impl Iterator for RingOffsets {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        while self.radius <= self.max_radius {
            let r = self.radius;
            while self.dy <= r {
                while self.dx <= r {
                    let (dx, dy) = (self.dx, self.dy);
                    self.dx += 1;
                    if self.metric.distance(dx, dy) == r.unsigned_abs() {
                        return Some((dx, dy));
                    }
                }
                self.dy += 1;
                self.dx = -r;
            }
            self.radius += 1;
            self.dy = -self.radius;
            self.dx = -self.radius;
        }
        None
    }
}

/// First walkable in-bounds cell around `origin`, searching rings `1..=max_radius`.
///
/// The origin itself is not considered.
#[must_use]
pub fn nearest_walkable(
    grid: &TileGrid,
    origin: LocalCoord,
    max_radius: u8,
    metric: RingMetric,
) -> Option<LocalCoord> {
    let (ox, oy) = (i32::from(origin.x), i32::from(origin.y));
    RingOffsets::new(max_radius, metric)
        .map(|(dx, dy)| (ox + dx, oy + dy))
        .find(|&(x, y)| grid.is_walkable(x, y))
        .and_then(|(x, y)| grid.size().local(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Tile;
    use delve_common::GridSize;
    use proptest::prelude::*;

    #[test]
    fn test_first_ring_order() {
        let ring: Vec<_> = RingOffsets::new(1, RingMetric::Chebyshev).collect();
        assert_eq!(
            ring,
            vec![(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)]
        );
    }

    #[test]
    fn test_ring_sizes() {
        let cheb: Vec<_> = RingOffsets::new(4, RingMetric::Chebyshev).collect();
        assert_eq!(cheb.len(), 8 + 16 + 24 + 32);
        let manh: Vec<_> = RingOffsets::new(2, RingMetric::Manhattan).collect();
        assert_eq!(manh.len(), 4 + 8);
        assert_eq!(manh[0], (0, -1));
    }

    #[test]
    fn test_nearest_walkable_skips_out_of_bounds() {
        let mut grid = TileGrid::walls(GridSize::new(10, 6));
        grid.set(2, 0, Tile::Floor);
        let found = nearest_walkable(&grid, LocalCoord::new(0, 0), 4, RingMetric::Chebyshev);
        assert_eq!(found, Some(LocalCoord::new(2, 0)));
    }

    #[test]
    fn test_nearest_walkable_none_beyond_radius() {
        let mut grid = TileGrid::walls(GridSize::new(20, 10));
        grid.set(15, 5, Tile::Floor);
        assert_eq!(
            nearest_walkable(&grid, LocalCoord::new(0, 5), 4, RingMetric::Chebyshev),
            None
        );
    }

    proptest! {
        #[test]
        fn rings_are_exact(radius in 1u8..8) {
            for metric in [RingMetric::Chebyshev, RingMetric::Manhattan] {
                let mut last = 0;
                for (dx, dy) in RingOffsets::new(radius, metric) {
                    let d = metric.distance(dx, dy);
                    prop_assert!(d >= 1 && d <= u32::from(radius));
                    prop_assert!(d >= last);
                    last = d;
                }
            }
        }
    }
}
