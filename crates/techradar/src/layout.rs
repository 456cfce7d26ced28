//! Deterministic placement of blips on the radar canvas.
//!
//! Blips are grouped by quadrant and ring. Within a group, members are
//! spread evenly across the sector's angular span and pushed into a small
//! number of radial lanes around the ring band's midline, so blips sharing
//! a sector do not land on the same point.
//!
//! The lanes are a heuristic. Members of a group always get distinct
//! angles, so points never coincide, but large groups can still sit close
//! enough together to overlap visually once drawn. The same input (blip set
//! and order) always yields bit-identical coordinates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::blip::{Quadrant, RadarBlip, Ring};
use crate::config::LayoutConfig;

/// Degrees in one quadrant wedge of the full radar.
const QUADRANT_SPAN_DEG: f64 = 90.0;

/// Radial extent of one ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RingBand {
    /// Inner radius.
    pub inner: f64,
    /// Outer radius.
    pub outer: f64,
}

impl RingBand {
    /// Band of `ring` when the radar has radius `max_radius`.
    ///
    /// The four rings split the radius into equal-width bands by ring index.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn of(ring: Ring, max_radius: f64) -> Self {
        let rings = Ring::ALL.len() as f64;
        let index = ring.index() as f64;
        Self {
            inner: index / rings * max_radius,
            outer: (index + 1.0) / rings * max_radius,
        }
    }

    /// Radius halfway through the band.
    #[must_use]
    pub fn mid(&self) -> f64 {
        (self.inner + self.outer) / 2.0
    }

    /// Width of the band.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.outer - self.inner
    }

    /// Whether `radius` lies within the band, bounds included.
    #[must_use]
    pub fn contains(&self, radius: f64) -> bool {
        radius >= self.inner && radius <= self.outer
    }
}

/// Origin and extent of a radar drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// X coordinate of the radar origin.
    pub center_x: f64,
    /// Y coordinate of the radar origin.
    pub center_y: f64,
    /// Radius of the outermost ring.
    pub max_radius: f64,
}

impl Frame {
    /// Frame of the full four-quadrant radar on a square canvas.
    #[must_use]
    pub fn full_radar(config: &LayoutConfig) -> Self {
        let center = config.canvas_size / 2.0;
        Self {
            center_x: center,
            center_y: center,
            max_radius: (center - config.margin).max(0.0),
        }
    }

    /// Frame of the single-quadrant half-arc view.
    ///
    /// The origin sits on the left edge, vertically centred.
    #[must_use]
    pub fn half_arc(config: &LayoutConfig) -> Self {
        let center_y = config.half_arc_height / 2.0;
        let horizontal = config.half_arc_width - config.half_arc_origin_x;
        let max_radius = (horizontal.min(center_y) - config.half_arc_padding).max(0.0);
        Self {
            center_x: config.half_arc_origin_x,
            center_y,
            max_radius,
        }
    }

    /// Band of `ring` in this frame.
    #[must_use]
    pub fn ring_band(&self, ring: Ring) -> RingBand {
        RingBand::of(ring, self.max_radius)
    }

    /// Distance of a point from the origin.
    #[must_use]
    pub fn radius_of(&self, x: f64, y: f64) -> f64 {
        (x - self.center_x).hypot(y - self.center_y)
    }

    fn point(&self, angle_deg: f64, radius: f64) -> (f64, f64) {
        let rad = angle_deg.to_radians();
        (
            self.center_x + radius * rad.cos(),
            self.center_y + radius * rad.sin(),
        )
    }
}

/// Computed position of one blip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlipPosition {
    /// The placed blip.
    pub blip_id: i64,
    /// Canvas x coordinate.
    pub x: f64,
    /// Canvas y coordinate.
    pub y: f64,
    /// Polar angle in degrees, clockwise from the positive x axis.
    pub angle_deg: f64,
    /// Distance from the frame origin.
    pub radius: f64,
}

/// Lane tuning for one view mode.
#[derive(Debug, Clone, Copy)]
struct Lanes {
    count: usize,
    fraction: f64,
    max_offset: f64,
}

impl Lanes {
    /// Radial displacement of lane `lane` for a band of `band_width`.
    ///
    /// Lane positions are spaced evenly across `[-j, +j]` and handed out
    /// outermost first, alternating sides: with three lanes the offsets
    /// are `-j, +j, 0`.
    #[allow(clippy::cast_precision_loss)]
    fn offset(self, lane: usize, band_width: f64) -> f64 {
        if self.count <= 1 {
            return 0.0;
        }
        let reach = (band_width * self.fraction).min(self.max_offset).max(0.0);
        let slot = if lane % 2 == 0 {
            lane / 2
        } else {
            self.count - 1 - lane / 2
        };
        let step = 2.0 * reach / (self.count - 1) as f64;
        -reach + slot as f64 * step
    }
}

/// Place blips on the full four-quadrant radar.
///
/// Each quadrant owns a 90° wedge by quadrant index, shrunk by the
/// configured edge margin on both sides. Positions come back in input order.
#[must_use]
pub fn full_radar_layout<B: AsRef<RadarBlip>>(
    blips: &[B],
    config: &LayoutConfig,
) -> Vec<BlipPosition> {
    let frame = Frame::full_radar(config);
    let lanes = Lanes {
        count: config.lanes,
        fraction: config.lane_fraction,
        max_offset: config.max_lane_offset,
    };
    let members: Vec<&RadarBlip> = blips.iter().map(AsRef::as_ref).collect();

    place(&members, &frame, lanes, |quadrant| {
        #[allow(clippy::cast_precision_loss)]
        let base = quadrant.index() as f64 * QUADRANT_SPAN_DEG;
        (
            base + config.edge_margin_deg,
            base + QUADRANT_SPAN_DEG - config.edge_margin_deg,
        )
    })
}

/// Place the blips of one quadrant on the half-arc detail view.
///
/// Blips from other quadrants are skipped. The arc spans the configured
/// angle either side of the horizontal axis through the left-edge origin.
#[must_use]
pub fn half_arc_layout<B: AsRef<RadarBlip>>(
    blips: &[B],
    quadrant: Quadrant,
    config: &LayoutConfig,
) -> Vec<BlipPosition> {
    let frame = Frame::half_arc(config);
    let lanes = Lanes {
        count: config.lanes,
        fraction: config.half_arc_lane_fraction,
        max_offset: config.half_arc_max_lane_offset,
    };
    let members: Vec<&RadarBlip> = blips
        .iter()
        .map(AsRef::as_ref)
        .filter(|b| b.quadrant == quadrant)
        .collect();
    let span = config.half_arc_span_deg;

    place(&members, &frame, lanes, |_| (-span, span))
}

#[allow(clippy::cast_precision_loss)]
fn place<F>(blips: &[&RadarBlip], frame: &Frame, lanes: Lanes, span_of: F) -> Vec<BlipPosition>
where
    F: Fn(Quadrant) -> (f64, f64),
{
    let mut groups: BTreeMap<(Quadrant, Ring), Vec<usize>> = BTreeMap::new();
    for (i, blip) in blips.iter().enumerate() {
        groups.entry((blip.quadrant, blip.ring)).or_default().push(i);
    }

    let mut positions: Vec<Option<BlipPosition>> = vec![None; blips.len()];
    for ((quadrant, ring), members) in &groups {
        let band = frame.ring_band(*ring);
        let (start, end) = span_of(*quadrant);
        let spread = end - start;
        let count = members.len();

        for (rank, &i) in members.iter().enumerate() {
            let (angle_deg, offset) = if count == 1 {
                (start + spread / 2.0, 0.0)
            } else {
                (
                    start + rank as f64 / (count - 1) as f64 * spread,
                    lanes.offset(rank % lanes.count.max(1), band.width()),
                )
            };
            let radius = band.mid() + offset;
            let (x, y) = frame.point(angle_deg, radius);
            positions[i] = Some(BlipPosition {
                blip_id: blips[i].id,
                x,
                y,
                angle_deg,
                radius,
            });
        }
    }

    positions.into_iter().flatten().collect()
}
