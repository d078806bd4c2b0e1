//! Fixed message texts and the milestone table.
//!
//! Everything the bot ever says lives here; the rest of the crate only
//! formats counts into these templates.

/// Substring that triggers a count (exact match, case-sensitive).
pub const DEFAULT_TRIGGER_WORD: &str = "よあくんOD";

/// Acknowledgement sent for every accepted trigger.
pub const ACK_MESSAGE: &str = "ｺﾞｯｸﾝ💊";

/// Status phrases for every tenth count, 10 through 100.
const MILESTONE_PHRASES: [(u64, &str); 10] = [
    (10, "まだイける"),
    (20, "ちょっとしんどい"),
    (30, "そろそろやめよ？"),
    (40, "気分悪くなってきた"),
    (50, "しんどい"),
    (60, "だいぶやばい"),
    (70, "吐きそう"),
    (80, "ｵｪｪｪェ゙ェ゙ｯ"),
    (90, "待って死ぬ"),
    (100, "@#%&▲◯■!!!"),
];

/// Look up the milestone phrase for a count. Defined only for exact
/// multiples of ten between 10 and 100.
pub fn phrase_for(count: u64) -> Option<&'static str> {
    MILESTONE_PHRASES
        .iter()
        .find(|(at, _)| *at == count)
        .map(|(_, phrase)| *phrase)
}

/// Second message sent when a count lands on a milestone.
pub fn format_milestone(count: u64, phrase: &str) -> String {
    format!("💊 {}回目\n{}", count, phrase)
}

/// Daily announcement of the previous day's total.
pub fn format_daily_total(count: u64) -> String {
    format!("今日は💊 {}回飲みました笑笑", count)
}
