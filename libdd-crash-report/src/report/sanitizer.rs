// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Removes the wrapper frames `suffix` from the end of the textual trace `raw`.
///
/// Only a trailing occurrence is removed, i.e. one followed by nothing but whitespace. When the
/// wrapper was applied more than once, the whole trailing run of copies goes. Occurrences earlier
/// in the trace belong to user code and are kept, and so is every other character of `raw`,
/// including its trailing whitespace. Applying the function twice gives the same result as
/// applying it once.
pub fn sanitize_stack_trace(raw: &str, suffix: &str) -> String {
    let suffix = suffix.trim_end();
    if suffix.trim_start().is_empty() {
        return raw.to_string();
    }

    let content_len = raw.trim_end().len();
    let mut body = &raw[..content_len];
    let mut stripped = false;
    while let Some(rest) = body.strip_suffix(suffix) {
        stripped = true;
        body = rest;
        // Whitespace between two copies goes with them, any other whitespace stays.
        let trimmed = rest.trim_end();
        if !trimmed.ends_with(suffix) {
            break;
        }
        body = trimmed;
    }

    if stripped {
        format!("{body}{}", &raw[content_len..])
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WRAPPER: &str = "\n   at Sdk.Internal.Rethrow()";

    #[test]
    fn test_trailing_wrapper_is_removed() {
        let raw = format!("Boom\n   at App.Main(){WRAPPER}");
        assert_eq!(sanitize_stack_trace(&raw, WRAPPER), "Boom\n   at App.Main()");

        let raw = format!("Boom\n   at App.Main(){WRAPPER}\n");
        assert_eq!(sanitize_stack_trace(&raw, WRAPPER), "Boom\n   at App.Main()\n");
    }

    #[test]
    fn test_only_the_wrapper_is_removed() {
        let raw = format!("Boom\n\n\n{WRAPPER}");
        assert_eq!(sanitize_stack_trace(&raw, WRAPPER), "Boom\n\n\n");

        let raw = "A\n\n\n   at X()";
        let once = sanitize_stack_trace(raw, "\n   at X()");
        assert_eq!(once, "A\n\n");
        assert_eq!(sanitize_stack_trace(&once, "\n   at X()"), once);
    }

    #[test]
    fn test_absent_wrapper_is_a_no_op() {
        let raw = "Boom\n   at App.Main()  \n";
        assert_eq!(sanitize_stack_trace(raw, WRAPPER), raw);
        assert_eq!(sanitize_stack_trace("", WRAPPER), "");
    }

    #[test]
    fn test_earlier_occurrence_is_kept() {
        let raw = format!("Boom{WRAPPER}\n   at App.Main()");
        assert_eq!(sanitize_stack_trace(&raw, WRAPPER), raw);

        let raw = format!("Boom{WRAPPER}\n   at App.Main(){WRAPPER}");
        assert_eq!(
            sanitize_stack_trace(&raw, WRAPPER),
            format!("Boom{WRAPPER}\n   at App.Main()")
        );
    }

    #[test]
    fn test_trailing_run_is_removed() {
        let raw = format!("Boom\n   at App.Main(){WRAPPER}{WRAPPER} \n{WRAPPER}");
        assert_eq!(sanitize_stack_trace(&raw, WRAPPER), "Boom\n   at App.Main()");
    }

    #[test]
    fn test_blank_suffix_is_ignored() {
        assert_eq!(sanitize_stack_trace("a \n", " \n"), "a \n");
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn fuzz_sanitize_is_idempotent() {
        bolero::check!()
            .with_type::<(String, u8)>()
            .for_each(|(raw, copies)| {
                let mut raw = raw.clone();
                for _ in 0..(copies % 4) {
                    raw.push_str(WRAPPER);
                }
                let once = sanitize_stack_trace(&raw, WRAPPER);
                assert!(!once.trim_end().ends_with(WRAPPER.trim_end()));
                assert_eq!(sanitize_stack_trace(&once, WRAPPER), once);
            });
    }
}
