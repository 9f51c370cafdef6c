//! Preserving hand-written trigger logic across regenerations.
//!
//! A previously generated trigger body looks like
//!
//! ```text
//! BEGIN
//!   insert into `users_audit`(...) values(...);
//!
//! <user logic>
//!  END
//! ```
//!
//! The injected statement is recognized by the audit table name appearing in
//! the line. SQL comments cannot serve as markers because the `mysql` client
//! strips them before the trigger body reaches the server.
//!
//! A user line that mentions the audit table name (even inside a comment) is
//! dropped as well. That is a known limitation of the marker.

use audit_core::{ExistingTrigger, TriggerEvent};

const BLOCK_BEGIN: &str = "begin";
const BLOCK_END: &str = "end";

/// Strip a leading `begin` and a trailing `end` token, case-insensitively.
///
/// The catalog stores the full `BEGIN ... END` block for compound trigger
/// bodies and the bare statement otherwise; both are accepted.
pub fn strip_block_wrapper(body: &str) -> &str {
    let mut body = body.trim();

    if let Some(head) = body.get(..BLOCK_BEGIN.len()) {
        let boundary = body[BLOCK_BEGIN.len()..]
            .chars()
            .next()
            .map_or(true, |c| c.is_whitespace());
        if head.eq_ignore_ascii_case(BLOCK_BEGIN) && boundary {
            body = &body[BLOCK_BEGIN.len()..];
        }
    }

    if body.len() >= BLOCK_END.len() {
        let split = body.len() - BLOCK_END.len();
        if let (Some(rest), Some(tail)) = (body.get(..split), body.get(split..)) {
            let boundary = rest
                .chars()
                .next_back()
                .map_or(true, |c| c.is_whitespace() || c == ';');
            if tail.eq_ignore_ascii_case(BLOCK_END) && boundary {
                body = rest;
            }
        }
    }

    body
}

/// Whether a trigger body line is an audit insert injected by a previous run.
pub fn is_injected_line(line: &str, audit_table: &str) -> bool {
    line.contains(audit_table)
}

/// The user logic left in `body` once the wrapper and every injected audit
/// statement are removed. Remaining lines keep their order and text.
pub fn residual_body(body: &str, audit_table: &str) -> String {
    strip_block_wrapper(body)
        .lines()
        .filter(|line| !is_injected_line(line, audit_table))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Residual logic of every existing trigger for `event`, in catalog order.
///
/// MySQL 5.7+ allows several triggers per event; all of them are dropped
/// during regeneration, so their residuals are concatenated into the single
/// canonical trigger.
pub(crate) fn merged_residual(
    triggers: &[ExistingTrigger],
    event: TriggerEvent,
    audit_table: &str,
) -> String {
    triggers
        .iter()
        .filter(|t| t.event == event)
        .map(|t| residual_body(&t.action_body, audit_table))
        .filter(|r| !r.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUDIT: &str = "users_audit";

    #[test]
    fn test_strip_block_wrapper() {
        assert_eq!(strip_block_wrapper("BEGIN\n  set @a = 1;\nEND").trim(), "set @a = 1;");
        assert_eq!(strip_block_wrapper("begin set @a = 1; end").trim(), "set @a = 1;");
        assert_eq!(strip_block_wrapper("set @a = 1").trim(), "set @a = 1");
        assert_eq!(strip_block_wrapper(""), "");
    }

    #[test]
    fn test_strip_block_wrapper_respects_token_boundaries() {
        assert_eq!(
            strip_block_wrapper("beginning_total = 1"),
            "beginning_total = 1"
        );
        assert_eq!(strip_block_wrapper("call backend"), "call backend");
        assert_eq!(strip_block_wrapper("BEGIN set @a=1;END").trim(), "set @a=1;");
    }

    #[test]
    fn test_residual_removes_exactly_the_marker_line() {
        let body = "BEGIN\n  insert into `users_audit`(`id`) values(NEW.`id`);\n\nset @x = 1;\nupdate counters set n = n + 1;\n END";
        assert_eq!(
            residual_body(body, AUDIT),
            "set @x = 1;\nupdate counters set n = n + 1;"
        );
    }

    #[test]
    fn test_residual_preserves_lines_verbatim_and_in_order() {
        let body = "BEGIN\n  if NEW.a > 0 then\n    set @y = 2;\n  insert into users_audit(a) values(NEW.a);\n  end if;\nEND";
        assert_eq!(
            residual_body(body, AUDIT),
            "if NEW.a > 0 then\n    set @y = 2;\n  end if;"
        );
    }

    #[test]
    fn test_residual_of_generated_only_body_is_empty() {
        let body = "BEGIN\n  insert into `users_audit`(`id`) values(OLD.`id`);\n\n\n END";
        assert_eq!(residual_body(body, AUDIT), "");
        assert_eq!(residual_body("", AUDIT), "");
    }

    #[test]
    fn test_line_mentioning_audit_table_is_dropped() {
        // documented limitation of the substring marker
        let body = "BEGIN\n-- keep users_audit in sync\nset @z = 3;\nEND";
        assert_eq!(residual_body(body, AUDIT), "set @z = 3;");
    }

    #[test]
    fn test_other_audit_tables_are_not_markers() {
        assert!(is_injected_line("insert into users_audit values()", AUDIT));
        assert!(!is_injected_line("insert into orders_audit values()", AUDIT));
    }

    #[test]
    fn test_merged_residual_joins_triggers_for_one_event() {
        let triggers = vec![
            ExistingTrigger::new("a", TriggerEvent::Insert, "BEGIN\nset @a = 1;\nEND"),
            ExistingTrigger::new("b", TriggerEvent::Update, "set @b = 1"),
            ExistingTrigger::new("c", TriggerEvent::Insert, "set @c = 1"),
        ];
        assert_eq!(
            merged_residual(&triggers, TriggerEvent::Insert, AUDIT),
            "set @a = 1;\nset @c = 1"
        );
        assert_eq!(
            merged_residual(&triggers, TriggerEvent::Update, AUDIT),
            "set @b = 1"
        );
        assert_eq!(merged_residual(&triggers, TriggerEvent::Delete, AUDIT), "");
    }
}
