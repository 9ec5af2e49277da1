pub mod drill_report;
pub mod drill_stats;
pub mod essay_pane;
pub mod menu;
pub mod progress_bar;
pub mod result_card;
pub mod select_list;
pub mod typing_area;
