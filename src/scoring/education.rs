//! Education tips derived from the signal set.

use crate::verdict::Signals;

pub const TIP_TRUSTED: &str =
    "High-quality sources support this claim. Always check official sites.";
pub const TIP_CORROBORATED: &str = "Multiple sources agree, which increases reliability.";
pub const TIP_DEFAULT: &str = "Check dates and confirm across multiple independent sources.";

/// Pick a tip: strong sources first, then corroboration, else the generic advice.
pub fn tip_for(signals: &Signals) -> &'static str {
    if signals.sr > 0.7 {
        TIP_TRUSTED
    } else if signals.cc > 0.5 {
        TIP_CORROBORATED
    } else {
        TIP_DEFAULT
    }
}
