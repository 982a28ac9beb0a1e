//! Pointer sampling
//!
//! Whatever the host offers (global taps, polling, compositor events) is
//! reduced to a stream of screen-space points. Gaps in the stream are simply
//! "no news" for the coordinator.

use anyhow::Result;
use tracing::trace;

use crate::geometry::Point;

/// Host-specific source of pointer positions
pub trait PointerSource {
    /// Current pointer position, or `None` when the host cannot tell right now
    fn sample(&mut self) -> Result<Option<Point>>;
}

/// Pulls from a [`PointerSource`] and drops samples that did not move
#[derive(Debug)]
pub struct PointerSampler<S> {
    source: S,
    last: Option<Point>,
}

impl<S: PointerSource> PointerSampler<S> {
    pub fn new(source: S) -> Self {
        Self { source, last: None }
    }

    /// Next sample worth forwarding to the coordinator
    pub fn poll(&mut self) -> Result<Option<Point>> {
        let Some(point) = self.source.sample()? else {
            return Ok(None);
        };
        if self.last == Some(point) {
            return Ok(None);
        }
        trace!(x = point.x, y = point.y, "pointer moved");
        self.last = Some(point);
        Ok(Some(point))
    }

    /// Forget the last position so the next sample is forwarded even if
    /// unchanged (used after config reloads that move the trigger band)
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Scripted(VecDeque<Result<Option<Point>>>);

    impl PointerSource for Scripted {
        fn sample(&mut self) -> Result<Option<Point>> {
            self.0.pop_front().unwrap_or(Ok(None))
        }
    }

    fn scripted(samples: Vec<Option<(f64, f64)>>) -> PointerSampler<Scripted> {
        PointerSampler::new(Scripted(
            samples
                .into_iter()
                .map(|s| Ok(s.map(|(x, y)| Point::new(x, y))))
                .collect(),
        ))
    }

    #[test]
    fn test_forwards_movement() {
        let mut sampler = scripted(vec![Some((1.0, 2.0)), Some((3.0, 4.0))]);
        assert_eq!(sampler.poll().unwrap(), Some(Point::new(1.0, 2.0)));
        assert_eq!(sampler.poll().unwrap(), Some(Point::new(3.0, 4.0)));
    }

    #[test]
    fn test_drops_repeated_position() {
        let mut sampler = scripted(vec![Some((1.0, 2.0)), Some((1.0, 2.0)), Some((1.0, 3.0))]);
        assert!(sampler.poll().unwrap().is_some());
        assert_eq!(sampler.poll().unwrap(), None);
        assert_eq!(sampler.poll().unwrap(), Some(Point::new(1.0, 3.0)));
    }

    #[test]
    fn test_gap_is_not_a_sample() {
        let mut sampler = scripted(vec![Some((1.0, 2.0)), None, Some((1.0, 2.0))]);
        assert!(sampler.poll().unwrap().is_some());
        assert_eq!(sampler.poll().unwrap(), None);
        // Same spot after a gap is still not movement
        assert_eq!(sampler.poll().unwrap(), None);
    }

    #[test]
    fn test_reset_forwards_same_position_again() {
        let mut sampler = scripted(vec![Some((5.0, 5.0)), Some((5.0, 5.0))]);
        assert!(sampler.poll().unwrap().is_some());
        sampler.reset();
        assert_eq!(sampler.poll().unwrap(), Some(Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_source_errors_propagate() {
        let mut sampler = PointerSampler::new(Scripted(VecDeque::from([Err(anyhow::anyhow!(
            "connection lost"
        ))])));
        assert!(sampler.poll().is_err());
    }
}
