use crate::domain::Alert;

/// Look-back for duplicate unread critical temperature alerts.
pub const ALERT_DEDUP_WINDOW_SECS: i64 = 3_600;

/// Decides whether `candidate` may join `existing`.
///
/// Only critical temperature alerts are gated: one is refused when an unread
/// critical temperature alert is newer than `candidate.timestamp` minus the
/// window. That includes alerts stamped after the candidate. Everything else
/// is always admitted.
pub fn admit_alert(existing: &[Alert], candidate: &Alert) -> bool {
    if !candidate.is_temperature_critical() {
        return true;
    }
    !existing.iter().any(|alert| {
        alert.is_temperature_critical()
            && !alert.read
            && alert.timestamp > candidate.timestamp - ALERT_DEDUP_WINDOW_SECS
    })
}

/// Appends `candidate` when admitted. Returns whether it was kept.
pub fn append_alert(alerts: &mut Vec<Alert>, candidate: Alert) -> bool {
    if admit_alert(alerts, &candidate) {
        alerts.push(candidate);
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::{append_alert, ALERT_DEDUP_WINDOW_SECS};
    use crate::domain::{Alert, AlertId, AlertKind, Thresholds};

    fn alert(kind: AlertKind, timestamp: i64) -> Alert {
        Alert {
            id: AlertId::new(),
            kind,
            message: "Temperature above maximum threshold: 9°C".to_string(),
            timestamp,
            location: None,
            read: false,
            temperature: Some(9.0),
            threshold: Some(Thresholds::new(2.0, 8.0).unwrap()),
        }
    }

    #[test]
    fn duplicate_critical_inside_window_is_refused() {
        let mut alerts = vec![alert(AlertKind::Critical, 1_000)];
        assert!(!append_alert(&mut alerts, alert(AlertKind::Critical, 1_000 + 600)));
        assert_eq!(alerts.len(), 1);
    }

    #[test]
    fn critical_outside_window_is_kept() {
        let mut alerts = vec![alert(AlertKind::Critical, 1_000)];
        assert!(append_alert(
            &mut alerts,
            alert(AlertKind::Critical, 1_000 + ALERT_DEDUP_WINDOW_SECS)
        ));
        assert_eq!(alerts.len(), 2);
    }

    #[test]
    fn future_stamped_unread_critical_blocks() {
        let mut alerts = vec![alert(AlertKind::Critical, 1_000 + 4 * ALERT_DEDUP_WINDOW_SECS)];
        assert!(!append_alert(&mut alerts, alert(AlertKind::Critical, 1_000)));
        assert_eq!(alerts.len(), 1);
    }

    #[test]
    fn read_alerts_do_not_block() {
        let mut first = alert(AlertKind::Critical, 1_000);
        first.read = true;
        let mut alerts = vec![first];
        assert!(append_alert(&mut alerts, alert(AlertKind::Critical, 1_100)));
    }

    #[test]
    fn info_alerts_are_never_gated() {
        let mut alerts = vec![alert(AlertKind::Critical, 1_000)];
        assert!(append_alert(&mut alerts, alert(AlertKind::Info, 1_001)));
    }
}
