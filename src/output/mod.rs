pub mod formatter;

pub use formatter::{
    format_breakdown, format_estimate, format_json, format_money, format_question_list,
    should_use_colors,
};
