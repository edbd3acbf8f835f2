pub mod formatter;

pub use formatter::{
    format_breakdown, format_participation, format_progress, format_rankings,
    format_sample_choice, format_score, format_submission_count, format_submissions, format_tsv,
    should_use_colors,
};
