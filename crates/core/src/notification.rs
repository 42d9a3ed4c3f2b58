//! Player activity notifications.
//!
//! [`NotificationFormatter`] is pure: it turns a join/leave diff into a
//! transport-neutral [`NotificationPayload`]. Channel adapters decide how to
//! render it (Discord embed, plain text).

use chrono::{Local, NaiveTime};
use std::collections::HashSet;

pub const NOTIFICATION_TITLE: &str = "🎮 Player Activity Update";

/// Visual emphasis of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    /// At least one player joined
    Positive,
    /// Players only left
    Caution,
}

impl Emphasis {
    /// RGB color (green / orange)
    pub fn color(self) -> u32 {
        match self {
            Self::Positive => 0x2ECC71,
            Self::Caution => 0xE67E22,
        }
    }
}

/// One titled block of the notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadSection {
    pub name: String,
    pub value: String,
}

/// Structured notification, independent of the chat platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub title: String,
    /// Wall-clock time of the change, e.g. "`[14:02:11]`"
    pub description: String,
    pub emphasis: Emphasis,
    pub sections: Vec<PayloadSection>,
    pub footer: String,
}

impl NotificationPayload {
    /// Plain-text rendering for text-only channels and the CLI
    pub fn to_plain_text(&self) -> String {
        let mut out = format!("{}\n{}\n", self.title, self.description);
        for section in &self.sections {
            out.push('\n');
            out.push_str(&section.name);
            out.push('\n');
            out.push_str(&section.value);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.footer);
        out
    }
}

/// Builds notifications for one monitored server
#[derive(Debug, Clone)]
pub struct NotificationFormatter {
    server_label: String,
}

impl NotificationFormatter {
    pub fn new(server_label: impl Into<String>) -> Self {
        Self {
            server_label: server_label.into(),
        }
    }

    /// Format with the current local time
    pub fn format(
        &self,
        joined: &HashSet<String>,
        left: &HashSet<String>,
        player_count: u64,
    ) -> NotificationPayload {
        self.format_at(joined, left, player_count, Local::now().time())
    }

    pub fn format_at(
        &self,
        joined: &HashSet<String>,
        left: &HashSet<String>,
        player_count: u64,
        at: NaiveTime,
    ) -> NotificationPayload {
        let emphasis = if joined.is_empty() {
            Emphasis::Caution
        } else {
            Emphasis::Positive
        };

        let mut sections = Vec::with_capacity(3);
        if !joined.is_empty() {
            sections.push(PayloadSection {
                name: format!("✅ Joined ({})", joined.len()),
                value: bullet_list(joined),
            });
        }
        if !left.is_empty() {
            sections.push(PayloadSection {
                name: format!("🚪 Left ({})", left.len()),
                value: bullet_list(left),
            });
        }
        sections.push(PayloadSection {
            name: "📊 Current Status".to_string(),
            value: format!("**Total Players:** {}", player_count),
        });

        NotificationPayload {
            title: NOTIFICATION_TITLE.to_string(),
            description: format!("`[{}]`", at.format("%H:%M:%S")),
            emphasis,
            sections,
            footer: format!("Server: {}", self.server_label),
        }
    }
}

fn bullet_list(names: &HashSet<String>) -> String {
    let mut sorted: Vec<&String> = names.iter().collect();
    sorted.sort();
    sorted
        .into_iter()
        .map(|name| format!("• {}", name))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 3, 4).unwrap()
    }

    #[test]
    fn join_and_leave_sections() {
        let formatter = NotificationFormatter::new("abc123");
        let payload = formatter.format_at(&set(&["Carol"]), &set(&["Alice"]), 2, noon());

        assert_eq!(payload.title, NOTIFICATION_TITLE);
        assert_eq!(payload.description, "`[12:03:04]`");
        assert_eq!(payload.emphasis, Emphasis::Positive);
        assert_eq!(payload.footer, "Server: abc123");
        assert_eq!(
            payload.sections,
            vec![
                PayloadSection {
                    name: "✅ Joined (1)".to_string(),
                    value: "• Carol".to_string(),
                },
                PayloadSection {
                    name: "🚪 Left (1)".to_string(),
                    value: "• Alice".to_string(),
                },
                PayloadSection {
                    name: "📊 Current Status".to_string(),
                    value: "**Total Players:** 2".to_string(),
                },
            ]
        );
    }

    #[test]
    fn names_are_sorted() {
        let formatter = NotificationFormatter::new("abc123");
        let joined = set(&["zed", "Mallory", "alice", "Bob"]);
        let payload = formatter.format_at(&joined, &HashSet::new(), 4, noon());

        assert_eq!(payload.sections[0].name, "✅ Joined (4)");
        assert_eq!(payload.sections[0].value, "• Bob\n• Mallory\n• alice\n• zed");
    }

    #[test]
    fn leave_only_is_caution() {
        let formatter = NotificationFormatter::new("abc123");
        let payload = formatter.format_at(&HashSet::new(), &set(&["Bob", "Alice"]), 0, noon());

        assert_eq!(payload.emphasis, Emphasis::Caution);
        assert_eq!(payload.sections.len(), 2);
        assert_eq!(payload.sections[0].name, "🚪 Left (2)");
        assert_eq!(payload.sections[0].value, "• Alice\n• Bob");
        assert_eq!(payload.sections[1].value, "**Total Players:** 0");
    }

    #[test]
    fn total_uses_reported_count() {
        let formatter = NotificationFormatter::new("abc123");
        let payload = formatter.format_at(&set(&["Alice"]), &HashSet::new(), 7, noon());
        assert_eq!(payload.sections.last().unwrap().value, "**Total Players:** 7");
    }

    #[test]
    fn plain_text_contains_every_section() {
        let formatter = NotificationFormatter::new("abc123");
        let text = formatter
            .format_at(&set(&["Carol"]), &set(&["Alice"]), 2, noon())
            .to_plain_text();

        assert!(text.starts_with(NOTIFICATION_TITLE));
        assert!(text.contains("✅ Joined (1)\n• Carol"));
        assert!(text.contains("🚪 Left (1)\n• Alice"));
        assert!(text.contains("**Total Players:** 2"));
        assert!(text.ends_with("Server: abc123"));
    }
}
