use crate::error::ServiceError;

/// Replace every `{{KEY}}` with its value in one left-to-right pass.
/// Inserted values are never rescanned; a token with no value, or an
/// unterminated `{{`, is an error.
pub fn render(template: &str, vars: &[(&str, &str)]) -> Result<String, ServiceError> {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let close = match after.find("}}") {
            Some(close) => close,
            None => return Err(ServiceError::UnresolvedPlaceholder(after.to_string())),
        };

        let key = &after[..close];
        match vars.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => rendered.push_str(value),
            None => return Err(ServiceError::UnresolvedPlaceholder(key.to_string())),
        }
        rest = &after[close + 2..];
    }

    rendered.push_str(rest);
    Ok(rendered)
}
