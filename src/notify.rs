use crate::logs::Conclusion;

/// Summary line for the completion notification.
pub fn completion_summary(conclusion: Option<Conclusion>) -> &'static str {
    match conclusion {
        Some(Conclusion::Success) => "CI Passed",
        Some(Conclusion::Failure | Conclusion::TimedOut | Conclusion::StartupFailure) => {
            "CI Failed"
        }
        Some(Conclusion::Cancelled) => "CI Cancelled",
        _ => "CI Finished",
    }
}

/// Shows the completion notification. Returns an error message on failure so the caller
/// can surface it in the UI.
#[cfg(feature = "desktop-notify")]
pub fn send_desktop(title: &str, conclusion: Option<Conclusion>) -> Option<String> {
    use notify_rust::{Notification, Urgency};

    let (icon, urgency) = match conclusion {
        Some(Conclusion::Failure | Conclusion::TimedOut | Conclusion::StartupFailure) => {
            ("dialog-error", Urgency::Critical)
        }
        _ => ("dialog-information", Urgency::Normal),
    };

    match Notification::new()
        .summary(completion_summary(conclusion))
        .body(title)
        .icon(icon)
        .urgency(urgency)
        .show()
    {
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("desktop notification failed: {e}");
            Some(format!("Notification failed: {e}"))
        }
    }
}

#[cfg(not(feature = "desktop-notify"))]
pub fn send_desktop(title: &str, conclusion: Option<Conclusion>) -> Option<String> {
    tracing::debug!(
        title,
        summary = completion_summary(conclusion),
        "desktop notifications disabled at build time"
    );
    None
}
