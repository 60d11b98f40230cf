//! Command-line rewriting for explicit-module compiles.

/// Rewrites an original compile command line to be dependency-free.
///
/// Drops the program name (argument 0), removes flags that only affect
/// implicit-module caching (meaningless once every module is resolved
/// explicitly), and appends the flags that disable implicit module
/// discovery. Explicit `-fmodule-file=` flags are appended separately by
/// the aggregator once module outputs are known.
pub fn without_implicit_module_flags(original: &[String]) -> Vec<String> {
    let mut args: Vec<String> = original
        .iter()
        .skip(1)
        .filter(|arg| !is_implicit_cache_flag(arg))
        .cloned()
        .collect();

    args.push("-fno-implicit-modules".to_string());
    args.push("-fno-implicit-module-maps".to_string());
    args
}

/// Returns `true` for flags that only steer the implicit module cache:
/// cache path, pruning controls, and build-session validation.
fn is_implicit_cache_flag(arg: &str) -> bool {
    if let Some(rest) = arg.strip_prefix("-fmodules-") {
        return rest.starts_with("cache-path=")
            || rest.starts_with("prune-interval=")
            || rest.starts_with("prune-after=")
            || rest == "validate-once-per-build-session";
    }
    arg.starts_with("-fbuild-session-file=")
}
