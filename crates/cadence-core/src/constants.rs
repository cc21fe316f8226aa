/// Provenance marker stamped on every occurrence the engine generates.
///
/// The application layer uses it to tell generated instances apart from
/// tasks a user created by hand.
pub const GENERATED_FROM_REPEAT: &str = "generated-from-repeat";

/// Default upper bound on evaluator steps per expansion call.
///
/// A misconfigured rule combined with a stuck cursor must never be allowed
/// to loop indefinitely.
pub const DEFAULT_MAX_STEPS: usize = 10_000;
