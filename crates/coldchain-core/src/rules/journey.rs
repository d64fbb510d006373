use crate::domain::{JourneyPoint, PointStatus, ShipmentRecord, TemperatureReading};

/// Anything placed on the shipment timeline.
pub trait Timed {
    fn timestamp(&self) -> i64;
    fn set_status(&mut self, status: PointStatus);
}

impl Timed for JourneyPoint {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn set_status(&mut self, status: PointStatus) {
        self.status = status;
    }
}

impl Timed for TemperatureReading {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn set_status(&mut self, status: PointStatus) {
        self.status = status;
    }
}

/// Sorts by timestamp and classifies each item relative to `now_utc`.
///
/// The earliest item at or after `now_utc` is current, everything before it
/// completed and everything after it upcoming. When every item is in the past
/// the last one is current. At most one item is ever current.
pub fn derive_statuses<T: Timed>(items: &mut [T], now_utc: i64) {
    items.sort_by_key(|item| item.timestamp());

    let current = items
        .iter()
        .position(|item| item.timestamp() >= now_utc)
        .or_else(|| items.len().checked_sub(1));

    for (index, item) in items.iter_mut().enumerate() {
        let status = match current {
            Some(current) if index < current => PointStatus::Completed,
            Some(current) if index == current => PointStatus::Current,
            _ => PointStatus::Upcoming,
        };
        item.set_status(status);
    }
}

pub fn derive_journey(mut points: Vec<JourneyPoint>, now_utc: i64) -> Vec<JourneyPoint> {
    derive_statuses(&mut points, now_utc);
    points
}

/// Re-derives reading and journey statuses of a stored shipment at `now_utc`.
pub fn refresh_statuses(shipment: &mut ShipmentRecord, now_utc: i64) {
    derive_statuses(&mut shipment.temperature_history, now_utc);
    derive_statuses(&mut shipment.journey, now_utc);
}

/// Builds one waypoint per location from the reading history. A location
/// seen more than once keeps its first slot but takes the later reading.
pub fn waypoints_from_readings(readings: &[TemperatureReading]) -> Vec<JourneyPoint> {
    let mut points: Vec<JourneyPoint> = Vec::new();
    for reading in readings {
        let point = JourneyPoint {
            location: reading.location.clone(),
            timestamp: reading.timestamp,
            temperature: reading.value,
            status: PointStatus::Upcoming,
        };
        match points.iter_mut().find(|p| p.location == point.location) {
            Some(existing) => *existing = point,
            None => points.push(point),
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::{derive_journey, waypoints_from_readings};
    use crate::domain::{JourneyPoint, PointStatus, TemperatureReading};

    const HOUR: i64 = 3_600;
    const NOW: i64 = 1_746_093_600;

    fn point(location: &str, timestamp: i64) -> JourneyPoint {
        JourneyPoint {
            location: location.to_string(),
            timestamp,
            temperature: 4.0,
            status: PointStatus::Upcoming,
        }
    }

    fn statuses(points: &[JourneyPoint]) -> Vec<PointStatus> {
        points.iter().map(|p| p.status).collect()
    }

    #[test]
    fn classifies_around_now() {
        let points = vec![
            point("c", NOW + HOUR),
            point("a", NOW - 2 * HOUR),
            point("d", NOW + 2 * HOUR),
            point("b", NOW - HOUR),
        ];
        let journey = derive_journey(points, NOW);
        let locations: Vec<_> = journey.iter().map(|p| p.location.as_str()).collect();
        assert_eq!(locations, ["a", "b", "c", "d"]);
        assert_eq!(
            statuses(&journey),
            [
                PointStatus::Completed,
                PointStatus::Completed,
                PointStatus::Current,
                PointStatus::Upcoming
            ]
        );
    }

    #[test]
    fn point_at_now_is_current() {
        let journey = derive_journey(vec![point("a", NOW - HOUR), point("b", NOW)], NOW);
        assert_eq!(
            statuses(&journey),
            [PointStatus::Completed, PointStatus::Current]
        );
    }

    #[test]
    fn all_past_promotes_last() {
        let journey = derive_journey(
            vec![point("a", NOW - 3 * HOUR), point("b", NOW - 2 * HOUR), point("c", NOW - HOUR)],
            NOW,
        );
        assert_eq!(
            statuses(&journey),
            [
                PointStatus::Completed,
                PointStatus::Completed,
                PointStatus::Current
            ]
        );
    }

    #[test]
    fn all_future_makes_first_current() {
        let journey = derive_journey(vec![point("a", NOW + HOUR), point("b", NOW + 2 * HOUR)], NOW);
        assert_eq!(
            statuses(&journey),
            [PointStatus::Current, PointStatus::Upcoming]
        );
    }

    #[test]
    fn exactly_one_current_for_any_now() {
        let points: Vec<_> = (0..6).map(|i| point(&i.to_string(), NOW + i * HOUR)).collect();
        for offset in -2..9 {
            let journey = derive_journey(points.clone(), NOW + offset * HOUR);
            let current = journey
                .iter()
                .filter(|p| p.status == PointStatus::Current)
                .count();
            assert_eq!(current, 1, "offset {offset}");
        }
    }

    #[test]
    fn empty_journey_stays_empty() {
        assert!(derive_journey(Vec::new(), NOW).is_empty());
    }

    #[test]
    fn waypoints_collapse_repeated_locations() {
        let reading = |location: &str, timestamp: i64, value: f64| TemperatureReading {
            timestamp,
            location: location.to_string(),
            value,
            value_f: TemperatureReading::celsius_to_fahrenheit(value),
            status: PointStatus::Upcoming,
        };
        let readings = [
            reading("Boston", 1, 4.0),
            reading("Providence", 2, 4.5),
            reading("Boston", 3, 5.0),
        ];
        let points = waypoints_from_readings(&readings);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].location, "Boston");
        assert_eq!(points[0].timestamp, 3);
        assert_eq!(points[0].temperature, 5.0);
    }
}
