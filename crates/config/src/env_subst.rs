//! `${VAR}` and `${VAR:-fallback}` expansion for raw config text.

/// Expand placeholders against the process environment.
///
/// Unknown variables without a fallback are left untouched so validation can
/// report the field instead of silently seeing an empty string.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

pub(crate) fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated: keep the remainder verbatim.
            out.push_str(&rest[start..]);
            return out;
        };

        let body = &after[..end];
        let (name, fallback) = match body.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (body, None),
        };

        match (name.is_empty(), lookup(name), fallback) {
            (false, Some(value), _) => out.push_str(&value),
            (false, None, Some(fallback)) => out.push_str(fallback),
            _ => {
                out.push_str("${");
                out.push_str(body);
                out.push('}');
            },
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "COURIER_TOKEN" => Some("secret".to_string()),
            "COURIER_GUILD" => Some("42".to_string()),
            _ => None,
        }
    }

    #[test]
    fn expands_known_variables() {
        assert_eq!(
            substitute_env_with("token = \"${COURIER_TOKEN}\" # ${COURIER_GUILD}", lookup),
            "token = \"secret\" # 42"
        );
    }

    #[test]
    fn uses_fallback_for_unknown_variables() {
        assert_eq!(
            substitute_env_with("path = \"${COURIER_DB:-subs.json}\"", lookup),
            "path = \"subs.json\""
        );
        assert_eq!(substitute_env_with("${COURIER_GUILD:-7}", lookup), "42");
    }

    #[test]
    fn leaves_unknown_and_malformed_placeholders() {
        assert_eq!(substitute_env_with("${NOPE}", lookup), "${NOPE}");
        assert_eq!(substitute_env_with("${}", lookup), "${}");
        assert_eq!(substitute_env_with("a ${COURIER_TOKEN", lookup), "a ${COURIER_TOKEN");
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(substitute_env("subscribe_prefix = \"!sub\""), "subscribe_prefix = \"!sub\"");
    }
}
