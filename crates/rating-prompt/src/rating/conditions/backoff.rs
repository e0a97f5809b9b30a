/// Sentinel for "prompt again no matter how many times the user already responded".
pub const UNLIMITED_RECURRING_PROMPTS: u32 = u32::MAX;

/// Days to wait after the most recent of `times_recorded` responses before prompting again.
///
/// Without a factor the base wait applies unchanged. With one, the wait grows as
/// `base * factor^(n - 1)`, truncated toward zero, so a base of 7 with factor 2.0 yields
/// 7, 14, 28, ... for the first, second, third response. A factor that is not a finite
/// positive number is ignored, so the wait never drops below zero.
pub fn effective_wait_days(base_days: u32, back_off_factor: Option<f64>, times_recorded: usize) -> i64 {
    let Some(factor) = back_off_factor.filter(|factor| factor.is_finite() && *factor > 0.0) else {
        return i64::from(base_days);
    };

    let exponent = times_recorded.saturating_sub(1) as f64;
    // `as` saturates on overflow and maps NaN to zero.
    (f64::from(base_days) * factor.powf(exponent)) as i64
}

/// True once more prompts were answered than the initial one plus `max_recurring_prompts`.
pub(crate) fn recurring_cap_reached(times_recorded: usize, max_recurring_prompts: u32) -> bool {
    times_recorded.saturating_sub(1) as u64 > u64::from(max_recurring_prompts)
}
