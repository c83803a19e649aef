//! Attribute name conversion between snake_case schema names and Graph camelCase

/// `display_name` -> `displayName`
pub fn snake_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;

    for ch in name.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }

    out
}

/// `displayName` -> `display_name`, `@odata.type` keys are left alone
pub fn camel_to_snake(name: &str) -> String {
    if name.starts_with('@') || name.contains('@') {
        return name.to_string();
    }

    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;

    for ch in name.chars() {
        if ch.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            prev_lower = false;
        } else {
            out.push(ch);
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_to_camel() {
        assert_eq!(snake_to_camel("display_name"), "displayName");
        assert_eq!(snake_to_camel("id"), "id");
        assert_eq!(
            snake_to_camel("password_minimum_character_set_count"),
            "passwordMinimumCharacterSetCount"
        );
        assert_eq!(snake_to_camel("_leading"), "leading");
    }

    #[test]
    fn test_camel_to_snake() {
        assert_eq!(camel_to_snake("displayName"), "display_name");
        assert_eq!(camel_to_snake("osMinimumVersion"), "os_minimum_version");
        assert_eq!(camel_to_snake("@odata.type"), "@odata.type");
        assert_eq!(camel_to_snake("members@odata.bind"), "members@odata.bind");
    }
}
