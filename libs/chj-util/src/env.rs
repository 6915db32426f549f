//! Reading configuration from environment variables.

use std::{env, fmt::Display, str::FromStr};

/// Parse the env var `varname` if it is set. Gives an error if it is
/// set but can't be decoded or parsed.
pub fn opt_get_env<T: FromStr>(varname: &str) -> Result<Option<T>, String>
    where T::Err: Display
{
    match env::var(varname) {
        Ok(s) => {
            Ok(Some(s.parse().map_err(
                |e| format!("could not parse {varname:?} env var with contents {s:?}: {e}"))?))
        },
        Err(e) => match e {
            env::VarError::NotPresent => Ok(None),
            env::VarError::NotUnicode(_) =>
                Err(format!("could not decode {varname:?} env var: {e}"))
        }
    }
}

/// Whether a flag value counts as switched on. Unset, empty, "0",
/// "off", "false" and "no" are off, anything else is on.
pub fn is_truthy_flag(val: Option<&str>) -> bool {
    match val {
        Some(v) => match v {
            "0" | "" | "off" | "false" | "no" => false,
            _ => true
        }
        None => false
    }
}

/// Read `varname` as a flag (see `is_truthy_flag`). A value that is
/// not valid unicode counts as off.
pub fn env_flag(varname: &str) -> bool {
    is_truthy_flag(env::var(varname).ok().as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_is_truthy_flag() {
        assert!(!is_truthy_flag(None));
        assert!(!is_truthy_flag(Some("")));
        assert!(!is_truthy_flag(Some("0")));
        assert!(!is_truthy_flag(Some("off")));
        assert!(!is_truthy_flag(Some("no")));
        assert!(is_truthy_flag(Some("1")));
        assert!(is_truthy_flag(Some("yes")));
    }

    #[test]
    fn t_opt_get_env_missing() {
        let v: Option<u32> = opt_get_env("CHJ_UTIL_SURELY_NOT_SET_4711").unwrap();
        assert_eq!(v, None);
    }
}
