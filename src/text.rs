use crate::flag::FlagType;

pub const QUEUE_EXCERPT_LENGTH: usize = 240;
pub const ACTIVITY_EXCERPT_LENGTH: usize = 180;

/// Collapse whitespace and cut to `max_length` characters, ending with an
/// ellipsis when shortened.
pub fn summarize_comment_text(text: Option<&str>, max_length: usize) -> String {
    let Some(text) = text else {
        return String::new();
    };

    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.chars().count() <= max_length {
        return normalized;
    }

    let cut: String = normalized
        .chars()
        .take(max_length.saturating_sub(1))
        .collect();
    format!("{}…", cut.trim_end())
}

/// Human-facing name of a flag type, as used in breakdowns and the feed.
pub fn flag_type_label(flag_type: &FlagType) -> &str {
    match flag_type {
        FlagType::ManualReport => "Manual reports",
        FlagType::ManualHide => "Manual hides",
        FlagType::AutoBannedPhrase => "Banned phrases",
        FlagType::AutoLinkSpam => "Link spam",
        FlagType::AutoDislikeThreshold => "Dislike threshold",
        FlagType::Unknown(raw) => raw,
    }
}

pub fn humanize_slug(slug: &str) -> String {
    slug.replace(['-', '_'], " ")
}
