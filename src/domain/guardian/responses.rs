//! Fixed response fragments used by the guardian.

/// Corrective clause prepended when medical or diagnostic advice is detected.
pub const MEDICAL_CORRECTIVE: &str = "I can't offer medical or diagnostic advice; \
for health concerns, please talk with a qualified professional.";

/// Corrective clause prepended when judgmental tone is detected.
pub const JUDGMENTAL_CORRECTIVE: &str = "Let me say that more kindly - \
what you're feeling makes sense, and there's no blame here.";

/// Mandatory disclaimer for sensitive topics and high burnout risk.
///
/// Insertion is idempotent: the filter checks for its presence before
/// prepending, so repeated passes never duplicate it.
pub const SAFETY_DISCLAIMER: &str = "If things ever feel like too much, please \
consider reaching out to someone you trust or a professional support line.";

/// Generic safe response used when the filter cannot complete.
///
/// Returned instead of the unfiltered candidate whenever classification
/// fails or exceeds its time budget.
pub const FALLBACK_RESPONSE: &str = "I'm here with you. I wasn't able to finish \
preparing my reply just now, so let me simply say: take things one small step \
at a time, and be gentle with yourself.";
