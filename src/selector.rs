use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorAttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
    StartsWith { key: String, value: String },
    EndsWith { key: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorStep {
    pub(crate) tag: Option<String>,
    pub(crate) universal: bool,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<SelectorAttrCondition>,
}

impl SelectorStep {
    pub(crate) fn id_only(&self) -> Option<&str> {
        if !self.universal && self.tag.is_none() && self.classes.is_empty() && self.attrs.is_empty()
        {
            self.id.as_deref()
        } else {
            None
        }
    }

    fn is_empty(&self) -> bool {
        !self.universal
            && self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SelectorCombinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    pub(crate) step: SelectorStep,
    // Relation to the part on its left.
    pub(crate) combinator: Option<SelectorCombinator>,
}

pub(crate) fn parse_selector_groups(selector: &str) -> Result<Vec<Vec<SelectorPart>>> {
    let groups = split_selector_groups(selector)?;
    let mut parsed = Vec::with_capacity(groups.len());
    for group in groups {
        parsed.push(parse_selector_chain(&group)?);
    }
    Ok(parsed)
}

fn parse_selector_chain(selector: &str) -> Result<Vec<SelectorPart>> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    let tokens = tokenize_selector(selector)?;
    let mut steps = Vec::new();
    let mut pending_combinator: Option<SelectorCombinator> = None;

    for token in tokens {
        if token == ">" {
            if pending_combinator.is_some() || steps.is_empty() {
                return Err(Error::UnsupportedSelector(selector.into()));
            }
            pending_combinator = Some(SelectorCombinator::Child);
            continue;
        }

        let step = parse_selector_step(&token)?;
        let combinator = if steps.is_empty() {
            None
        } else {
            Some(
                pending_combinator
                    .take()
                    .unwrap_or(SelectorCombinator::Descendant),
            )
        };
        steps.push(SelectorPart { step, combinator });
    }

    if steps.is_empty() || pending_combinator.is_some() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    Ok(steps)
}

fn split_selector_groups(selector: &str) -> Result<Vec<String>> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;

    for ch in selector.chars() {
        match ch {
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                if bracket_depth == 0 {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                bracket_depth -= 1;
                current.push(ch);
            }
            ',' if bracket_depth == 0 => {
                let trimmed = current.trim();
                if trimmed.is_empty() {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                groups.push(trimmed.to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if bracket_depth != 0 {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    let trimmed = current.trim();
    if trimmed.is_empty() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }
    groups.push(trimmed.to_string());
    Ok(groups)
}

fn tokenize_selector(selector: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;

    for ch in selector.chars() {
        match ch {
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                if bracket_depth == 0 {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                bracket_depth -= 1;
                current.push(ch);
            }
            '>' if bracket_depth == 0 => {
                if !current.trim().is_empty() {
                    tokens.push(current.trim().to_string());
                }
                current.clear();
                tokens.push(ch.to_string());
            }
            ch if ch.is_ascii_whitespace() && bracket_depth == 0 => {
                if !current.trim().is_empty() {
                    tokens.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if bracket_depth != 0 {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    if !current.trim().is_empty() {
        tokens.push(current.trim().to_string());
    }

    Ok(tokens)
}

fn parse_selector_step(part: &str) -> Result<SelectorStep> {
    let part = part.trim();
    if part.is_empty() {
        return Err(Error::UnsupportedSelector(part.into()));
    }

    let bytes = part.as_bytes();
    let mut i = 0usize;
    let mut step = SelectorStep::default();

    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if step.universal || !step.is_empty() {
                    return Err(Error::UnsupportedSelector(part.into()));
                }
                step.universal = true;
                i += 1;
            }
            b'#' => {
                let Some((id, next)) = parse_selector_ident(part, i + 1) else {
                    return Err(Error::UnsupportedSelector(part.into()));
                };
                if step.id.replace(id).is_some() {
                    return Err(Error::UnsupportedSelector(part.into()));
                }
                i = next;
            }
            b'.' => {
                let Some((class_name, next)) = parse_selector_ident(part, i + 1) else {
                    return Err(Error::UnsupportedSelector(part.into()));
                };
                step.classes.push(class_name);
                i = next;
            }
            b'[' => {
                let (attr, next) = parse_selector_attr_condition(part, i)?;
                step.attrs.push(attr);
                i = next;
            }
            _ => {
                if !step.is_empty() {
                    return Err(Error::UnsupportedSelector(part.into()));
                }
                let Some((tag, next)) = parse_selector_ident(part, i) else {
                    return Err(Error::UnsupportedSelector(part.into()));
                };
                step.tag = Some(tag.to_ascii_lowercase());
                i = next;
            }
        }
    }

    Ok(step)
}

fn parse_selector_ident(src: &str, start: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    let mut end = start;
    while end < bytes.len() && is_selector_ident_char(bytes[end]) {
        end += 1;
    }
    if end == start {
        return None;
    }
    Some((src.get(start..end)?.to_string(), end))
}

fn is_selector_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn parse_selector_attr_condition(src: &str, open: usize) -> Result<(SelectorAttrCondition, usize)> {
    let unsupported = || Error::UnsupportedSelector(src.into());
    let close = src
        .get(open..)
        .and_then(|rest| rest.find(']'))
        .map(|offset| open + offset)
        .ok_or_else(unsupported)?;
    let body = src.get(open + 1..close).ok_or_else(unsupported)?.trim();

    let Some(eq) = body.find('=') else {
        let key = body.to_ascii_lowercase();
        if key.is_empty() || !key.bytes().all(is_selector_ident_char) {
            return Err(unsupported());
        }
        return Ok((SelectorAttrCondition::Exists { key }, close + 1));
    };

    let before_eq = eq.checked_sub(1).and_then(|idx| body.as_bytes().get(idx));
    let (raw_key, operator) = match before_eq {
        Some(b'^') => (&body[..eq - 1], "^="),
        Some(b'$') => (&body[..eq - 1], "$="),
        _ => (&body[..eq], "="),
    };
    let key = raw_key.trim().to_ascii_lowercase();
    if key.is_empty() || !key.bytes().all(is_selector_ident_char) {
        return Err(unsupported());
    }

    let raw_value = body[eq + 1..].trim();
    let value = match raw_value.as_bytes() {
        [b'"', .., b'"'] | [b'\'', .., b'\''] if raw_value.len() >= 2 => {
            raw_value[1..raw_value.len() - 1].to_string()
        }
        _ => raw_value.to_string(),
    };

    let condition = match operator {
        "^=" => SelectorAttrCondition::StartsWith { key, value },
        "$=" => SelectorAttrCondition::EndsWith { key, value },
        _ => SelectorAttrCondition::Eq { key, value },
    };
    Ok((condition, close + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_step_with_classes_and_attrs() -> Result<()> {
        let groups = parse_selector_groups("button.do-sort[id^='do-']")?;
        assert_eq!(groups.len(), 1);
        let step = &groups[0][0].step;
        assert_eq!(step.tag.as_deref(), Some("button"));
        assert_eq!(step.classes, vec!["do-sort".to_string()]);
        assert_eq!(
            step.attrs,
            vec![SelectorAttrCondition::StartsWith {
                key: "id".into(),
                value: "do-".into(),
            }]
        );
        Ok(())
    }

    #[test]
    fn id_only_step_is_detected() -> Result<()> {
        let groups = parse_selector_groups("#result-quicksort")?;
        assert_eq!(groups[0][0].step.id_only(), Some("result-quicksort"));

        let groups = parse_selector_groups("span#result-quicksort")?;
        assert_eq!(groups[0][0].step.id_only(), None);
        Ok(())
    }

    #[test]
    fn child_combinator_is_recorded_on_right_part() -> Result<()> {
        let groups = parse_selector_groups("body > .do-sort")?;
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[0][0].combinator, None);
        assert_eq!(groups[0][1].combinator, Some(SelectorCombinator::Child));

        let groups = parse_selector_groups("body .do-sort")?;
        assert_eq!(
            groups[0][1].combinator,
            Some(SelectorCombinator::Descendant)
        );
        Ok(())
    }

    #[test]
    fn rejects_unsupported_selectors() {
        for selector in [
            "", " , a", "a >", "> a", "a[id", "a:hover", "#", "a*", "[=x]",
        ] {
            assert!(
                matches!(
                    parse_selector_groups(selector),
                    Err(Error::UnsupportedSelector(_))
                ),
                "selector should be rejected: {selector:?}"
            );
        }
    }
}
