//! Tag-safety helpers: turn call arguments into span tag values without
//! surprises (no panics, no unbounded payloads, no credentials).

use std::fmt::Display;
use std::time::Duration;

use cooper_client::{Durability, PersistTo, ReplicateTo};
use wiretap_trace::Span;

/// Render an optional value, spelling absence out as `"null"`.
pub fn display_or_null<T: Display>(value: Option<&T>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "null".to_owned(),
    }
}

/// The runtime type name of a value. Used for arguments whose content is
/// large or not worth rendering, e.g. query objects.
pub fn type_name_of<T: ?Sized>(_value: &T) -> &'static str {
    std::any::type_name::<T>()
}

/// Comma-join a collection's elements.
pub fn join_display<T: Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Tag a timeout and its unit, when one was given.
pub fn tag_timeout(span: &mut dyn Span, timeout: Option<Duration>) {
    if let Some(timeout) = timeout {
        span.set_tag("timeout", (timeout.as_millis() as i64).into());
        span.set_tag("timeout_unit", "ms".into());
    }
}

/// Tag the durability levels a mutation asked for, when it asked for any.
pub fn tag_durability(span: &mut dyn Span, durability: Durability) {
    if durability.persist_to != PersistTo::None {
        span.set_tag("persist_to", durability.persist_to.to_string().into());
    }
    if durability.replicate_to != ReplicateTo::None {
        span.set_tag("replicate_to", durability.replicate_to.to_string().into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use wiretap_trace::{RecordingTracer, SpanBuilder, TagValue, Tracer};

    #[test]
    fn display_or_null_spells_out_absence() {
        assert_eq!(display_or_null(Some(&"report-7")), "report-7");
        assert_eq!(display_or_null::<&str>(None), "null");
    }

    #[test]
    fn join_display_is_comma_separated() {
        assert_eq!(join_display(&[1, 2, 3]), "1, 2, 3");
        assert_eq!(join_display::<i32>(&[]), "");
    }

    #[test]
    fn type_name_names_the_concrete_type() {
        let query = cooper_client::Query::simple("SELECT 1");
        assert!(type_name_of(&query).ends_with("Query"));
    }

    fn tag_map(f: impl FnOnce(&mut dyn wiretap_trace::Span)) -> BTreeMap<String, TagValue> {
        let tracer = RecordingTracer::new();
        let mut span = tracer.start_span(SpanBuilder::new("probe"));
        f(span.as_mut());
        span.finish();
        tracer.finished_spans().remove(0).tags
    }

    #[test]
    fn timeout_tags_carry_unit() {
        let tags = tag_map(|span| tag_timeout(span, Some(Duration::from_millis(2500))));
        assert_eq!(tags.get("timeout"), Some(&TagValue::Int(2500)));
        assert_eq!(tags.get("timeout_unit"), Some(&TagValue::String("ms".into())));

        let tags = tag_map(|span| tag_timeout(span, None));
        assert!(!tags.contains_key("timeout"));
    }

    #[test]
    fn durability_tags_only_requested_levels() {
        let tags = tag_map(|span| tag_durability(span, Durability::NONE));
        assert!(!tags.contains_key("persist_to"));
        assert!(!tags.contains_key("replicate_to"));

        let durability = Durability::new(PersistTo::Active, ReplicateTo::None);
        let tags = tag_map(|span| tag_durability(span, durability));
        assert_eq!(tags.get("persist_to"), Some(&TagValue::String("active".into())));
        assert!(!tags.contains_key("replicate_to"));
    }
}
