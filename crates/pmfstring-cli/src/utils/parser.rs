use pmfstring::core::energy::spring::{Axis, DEFAULT_EXPONENT, Spring};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid spring specification '{0}'. Expected 'axis:stiffness:equilibrium[:exponent]' (e.g., 'x:10.0:0.0').")]
    InvalidSpringFormat(String),

    #[error("Invalid axis '{0}' in spring specification. Expected 'x' or 'y'.")]
    InvalidAxis(String),

    #[error("Component '{component}' of '{input}' is not a valid number.")]
    InvalidNumber {
        component: &'static str,
        input: String,
    },

    #[error("Invalid setting '{0}'. Expected KEY=VALUE.")]
    InvalidSetting(String),
}

/// Parses `axis:stiffness:equilibrium[:exponent]` into a [`Spring`].
pub fn parse_spring(s: &str) -> Result<Spring, ParseError> {
    let parts: Vec<&str> = s.split(':').map(str::trim).collect();
    if !(3..=4).contains(&parts.len()) {
        return Err(ParseError::InvalidSpringFormat(s.to_string()));
    }

    let axis: Axis = parts[0]
        .parse()
        .map_err(|_| ParseError::InvalidAxis(parts[0].to_string()))?;
    let number = |component: &'static str, value: &str| {
        value.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
            component,
            input: s.to_string(),
        })
    };

    let stiffness = number("stiffness", parts[1])?;
    let equilibrium = number("equilibrium", parts[2])?;
    let exponent = match parts.get(3) {
        Some(value) => number("exponent", value)?,
        None => DEFAULT_EXPONENT,
    };

    Ok(Spring::new(stiffness, equilibrium, axis).with_exponent(exponent))
}

/// Splits a `KEY=VALUE` override at the first `=`.
pub fn parse_setting(s: &str) -> Result<(&str, &str), ParseError> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(ParseError::InvalidSetting(s.to_string())),
    }
}
