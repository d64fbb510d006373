pub mod admission;
pub mod excursion;
pub mod journey;

pub use admission::{admit_alert, append_alert, ALERT_DEDUP_WINDOW_SECS};
pub use excursion::{
    detect_excursions, evaluate_latest, Excursion, ExcursionDetector, ExcursionState,
};
pub use journey::{
    derive_journey, derive_statuses, refresh_statuses, waypoints_from_readings, Timed,
};
