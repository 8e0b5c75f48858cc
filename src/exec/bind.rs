// src/exec/bind.rs

use std::sync::LazyLock;

use regex::Regex;

static BIND_FAILURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(address already in use|port \d+ (is|was) already in use|BindException|EADDRINUSE)",
    )
    .expect("bind-failure regex is valid")
});

/// True if `line` looks like a server failing to bind its port.
pub fn is_bind_failure(line: &str) -> bool {
    BIND_FAILURE.is_match(line)
}
