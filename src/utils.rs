use std::env::var;

/// Value of an environment variable, or the fallback when it is unset or empty
pub fn env_var_or_else<F>(var_name: &str, or_else: F) -> String
where
    F: FnOnce() -> String,
{
    match var(var_name) {
        Ok(value) if !value.is_empty() => value,
        _ => or_else(),
    }
}
