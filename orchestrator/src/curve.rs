use std::fmt::Write;

use api::types::{Epoch, FullResults};

use crate::configs::Palette;

/// Share of the canvas height a value of `1.0` reaches.
pub const VERTICAL_SCALE: f64 = 0.8;

/// Which metric a curve plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Loss,
    Accuracy,
}

impl Metric {
    pub fn of(self, epoch: &Epoch) -> f64 {
        match self {
            Self::Loss => epoch.loss,
            Self::Accuracy => epoch.accuracy,
        }
    }
}

/// The drawing area of a curve, `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 200.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Maps epochs onto the canvas.
///
/// Epochs are spread evenly across the width, values are inverted so that
/// higher is up. Values above `1.0` are not clamped and may leave the canvas.
pub fn points(epochs: &[Epoch], metric: Metric, canvas: Canvas) -> Vec<Point> {
    let span = epochs.len().saturating_sub(1).max(1) as f64;

    epochs
        .iter()
        .enumerate()
        .map(|(idx, epoch)| Point {
            x: idx as f64 / span * canvas.width,
            y: canvas.height - metric.of(epoch) * canvas.height * VERTICAL_SCALE,
        })
        .collect()
}

/// `(epoch, value)` pairs, as chart widgets expect them.
pub fn series(epochs: &[Epoch], metric: Metric) -> Vec<(f64, f64)> {
    epochs
        .iter()
        .map(|e| (e.epoch as f64, metric.of(e)))
        .collect()
}

/// Builds a smoothed SVG path through `points`.
///
/// Every segment is a quadratic curve to the midpoint with the previous
/// point's x as control, followed by a smooth continuation towards the next
/// midpoint. An empty slice yields an empty path.
pub fn svg_path(points: &[Point]) -> String {
    let Some(first) = points.first() else {
        return String::new();
    };

    let mut path = format!("M{},{}", first.x, first.y);
    for (i, pair) in points.windows(2).enumerate() {
        let (prev, curr) = (pair[0], pair[1]);
        let mid_x = (prev.x + curr.x) / 2.0;
        let _ = write!(path, " Q{},{} {},{}", prev.x, curr.y, mid_x, curr.y);

        match points.get(i + 2) {
            Some(next) => {
                let next_mid_x = (curr.x + next.x) / 2.0;
                let _ = write!(path, " T{},{}", next_mid_x, next.y);
            }
            None => {
                let _ = write!(path, " T{},{}", curr.x, curr.y);
            }
        }
    }

    path
}

/// Renders every peer's loss and accuracy curves as a standalone SVG document.
///
/// Loss curves are solid, accuracy curves dashed; peers are coloured by
/// their position in the snapshot.
pub fn render_svg(results: &FullResults, palette: &Palette, canvas: Canvas) -> String {
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}">"#,
        w = canvas.width,
        h = canvas.height,
    );
    let _ = write!(
        svg,
        "\n  <title>session {}</title>",
        escape(&results.session_id)
    );

    for (idx, (peer_id, peer)) in results.peers.iter().enumerate() {
        if peer.epochs.is_empty() {
            continue;
        }

        let color = palette.color(idx).hex();
        let peer_id = escape(peer_id);

        for (metric, dash) in [(Metric::Loss, ""), (Metric::Accuracy, r#" stroke-dasharray="4 3""#)] {
            let path = svg_path(&points(&peer.epochs, metric, canvas));
            let _ = write!(
                svg,
                "\n  <path data-peer=\"{peer_id}\" data-metric=\"{}\" d=\"{path}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"2\"{dash}/>",
                match metric {
                    Metric::Loss => "loss",
                    Metric::Accuracy => "accuracy",
                },
            );
        }
    }

    svg.push_str("\n</svg>\n");
    svg
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use api::types::{PeerData, SessionStatus};

    use super::*;

    fn epochs(values: &[(f64, f64)]) -> Vec<Epoch> {
        values
            .iter()
            .enumerate()
            .map(|(i, &(loss, accuracy))| Epoch {
                epoch: i as u32 + 1,
                loss,
                accuracy,
            })
            .collect()
    }

    #[test]
    fn points_span_the_canvas() {
        let pts = points(&epochs(&[(1.0, 0.0), (0.5, 0.5), (0.0, 1.0)]), Metric::Loss, Canvas::default());
        assert_eq!(pts.len(), 3);
        assert_eq!(pts[0], Point { x: 0.0, y: 40.0 });
        assert_eq!(pts[1], Point { x: 200.0, y: 120.0 });
        assert_eq!(pts[2], Point { x: 400.0, y: 200.0 });
    }

    #[test]
    fn single_point_sits_on_the_left_edge() {
        let pts = points(&epochs(&[(0.2, 0.5)]), Metric::Accuracy, Canvas::default());
        assert_eq!(pts, vec![Point { x: 0.0, y: 120.0 }]);
    }

    #[test]
    fn accuracy_above_one_is_not_clamped() {
        let pts = points(&epochs(&[(0.0, 1.5)]), Metric::Accuracy, Canvas::default());
        assert!(pts[0].y < 0.0);
    }

    #[test]
    fn empty_input_has_no_path() {
        assert_eq!(svg_path(&[]), "");
        assert!(points(&[], Metric::Loss, Canvas::default()).is_empty());
    }

    #[test]
    fn two_point_path() {
        let pts = points(&epochs(&[(1.0, 0.0), (0.5, 0.0)]), Metric::Loss, Canvas::default());
        assert_eq!(svg_path(&pts), "M0,40 Q0,120 200,120 T400,120");
    }

    #[test]
    fn inner_segments_head_for_the_next_midpoint() {
        let pts = [
            Point { x: 0.0, y: 10.0 },
            Point { x: 10.0, y: 20.0 },
            Point { x: 20.0, y: 30.0 },
        ];
        assert_eq!(
            svg_path(&pts),
            "M0,10 Q0,20 5,20 T15,30 Q10,30 15,30 T20,30"
        );
    }

    #[test]
    fn series_uses_epoch_numbers() {
        let data = epochs(&[(0.9, 0.1), (0.7, 0.3)]);
        assert_eq!(series(&data, Metric::Accuracy), vec![(1.0, 0.1), (2.0, 0.3)]);
    }

    #[test]
    fn svg_skips_syncing_peers() {
        let mut peers = BTreeMap::new();
        peers.insert(
            "peer<a>".to_string(),
            PeerData {
                hyperparameters: None,
                epochs: epochs(&[(1.0, 0.5), (0.5, 0.7)]),
            },
        );
        peers.insert("quiet".to_string(), PeerData::default());

        let results = FullResults {
            session_id: "s-1".into(),
            status: SessionStatus::Running,
            peers,
        };

        let svg = render_svg(&results, &Palette::default(), Canvas::default());
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains("peer&lt;a&gt;"));
        assert!(!svg.contains("quiet"));
        assert!(svg.contains("#f97316"));
    }
}
