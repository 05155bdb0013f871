//! Wire protocol text
//!
//! Everything the relay writes to a client is plain text. Fragments are
//! flushed to the transport only when they end in a newline.

/// Name registration question (no trailing newline)
pub const NAME_PROMPT: &str = "What's your name? ";

/// Farewell written straight to a leaving session's transport
pub const FAREWELL: &str = "Bye.\n";

/// Marker placed between sender name and body of a direct message
pub const DM_MARKER: &str = "(DM): ";

/// Line terminator closing every logical message
pub const TERMINATOR: &str = "\n";

/// Prefix distinguishing commands from plain chat lines
pub const COMMAND_PREFIX: char = '.';

/// Label prepended to a broadcast chat message
pub fn label(name: &str) -> String {
    format!("{}: ", name)
}

/// Announcement broadcast when a session joins
pub fn joined(name: &str) -> String {
    format!("{} joined.\n", name)
}

/// Announcement broadcast when a session leaves
pub fn left(name: &str) -> String {
    format!("{} left.\n", name)
}

/// Whether a fragment completes a line and should be flushed
pub fn ends_line(fragment: &str) -> bool {
    fragment.ends_with(TERMINATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_announcements() {
        assert_eq!(joined("alice"), "alice joined.\n");
        assert_eq!(left("alice"), "alice left.\n");
        assert_eq!(label("alice"), "alice: ");
    }

    #[test]
    fn test_ends_line() {
        assert!(ends_line("hi\n"));
        assert!(!ends_line("alice: "));
        assert!(!ends_line(NAME_PROMPT));
    }
}
